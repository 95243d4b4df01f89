//! Task templates of the travel crew.
//!
//! Each template uses the `{origin}`, `{cities}`, `{travel_dates}` and
//! `{interests}` placeholders; they are filled from a
//! [`TripRequest`](super::TripRequest) at kickoff.

use std::sync::Arc;

use crate::agent::Agent;
use crate::crew::Task;

const TIP_SECTION: &str = "If you do your BEST WORK, I'll tip you $100!";

/// Builds the three travel tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelTasks;

impl TravelTasks {
    /// Choose the destination among the candidate cities.
    #[must_use]
    pub fn identify_city(agent: Arc<Agent>) -> Task {
        Task::new(format!(
            "Analyze and select the best city for the trip based on specific criteria \
             such as weather patterns, seasonal events, and travel costs. This task \
             involves comparing multiple cities, considering factors like current \
             weather conditions, upcoming cultural or seasonal events, and overall \
             travel expenses.\n\n\
             Traveling from: {{origin}}\n\
             City options: {{cities}}\n\
             Trip date: {{travel_dates}}\n\
             Traveler interests: {{interests}}\n\n{TIP_SECTION}"
        ))
        .name("identify_city")
        .expected_output(
            "A detailed report on the chosen city and everything you found out about it, \
             including the actual flight costs, the weather forecast and the attractions.",
        )
        .agent(agent)
    }

    /// Compile an in-depth guide for the chosen city.
    #[must_use]
    pub fn gather_city_info(agent: Arc<Agent>) -> Task {
        Task::new(format!(
            "As a local expert on this city you must compile an in-depth guide for \
             someone traveling there and wanting to have THE BEST trip ever! Gather \
             information about key attractions, local customs, special events, and \
             daily activity recommendations. Find the best spots to go to, the kind \
             of place only a local would know.\n\n\
             Trip date: {{travel_dates}}\n\
             Traveling from: {{origin}}\n\
             Traveler interests: {{interests}}\n\n{TIP_SECTION}"
        ))
        .name("gather_city_info")
        .expected_output(
            "A comprehensive city guide with hidden gems, cultural hotspots, must-visit \
             landmarks, weather forecasts, and high level costs.",
        )
        .agent(agent)
    }

    /// Expand the guide into a full 7-day itinerary.
    #[must_use]
    pub fn plan_itinerary(agent: Arc<Agent>) -> Task {
        Task::new(format!(
            "Expand the city guide into a full 7-day travel itinerary with detailed \
             per-day plans, including weather forecasts, places to eat, packing \
             suggestions, and a budget breakdown. Suggest actual places to visit, \
             actual hotels to stay at and actual restaurants to go to. The plan must \
             cover every day of the trip and explain why each place was picked.\n\n\
             Trip date: {{travel_dates}}\n\
             Traveling from: {{origin}}\n\
             Traveler interests: {{interests}}\n\n{TIP_SECTION}"
        ))
        .name("plan_itinerary")
        .expected_output(
            "Your final answer MUST be a complete expanded travel plan, formatted as \
             markdown, encompassing a daily schedule, anticipated weather conditions, \
             recommended clothing and items to pack, and a detailed budget.",
        )
        .agent(agent)
    }

    /// The three tasks in execution order: pick the city, research it, plan it.
    #[must_use]
    pub fn all(
        city_selection_expert: Arc<Agent>,
        local_tour_guide: Arc<Agent>,
        expert_travel_agent: Arc<Agent>,
    ) -> Vec<Task> {
        vec![
            Self::identify_city(city_selection_expert),
            Self::gather_city_info(local_tour_guide),
            Self::plan_itinerary(expert_travel_agent),
        ]
    }
}
