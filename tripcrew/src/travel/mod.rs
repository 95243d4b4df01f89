//! The travel planning crew.
//!
//! - [`TripRequest`]: origin, candidate cities, dates and interests
//! - [`TravelAgents`]: the agent registry (expert travel agent, city
//!   selection expert, local tour guide, and a manager)
//! - [`TravelTasks`]: `identify_city`, `gather_city_info`, `plan_itinerary`
//! - [`TripCrew`]: builds the crew for a process and runs it

mod agents;
mod request;
mod tasks;
mod trip_crew;

pub use agents::{
    CITY_SELECTION_EXPERT, DEFAULT_TEMPERATURE, EXPERT_TRAVEL_AGENT, LOCAL_TOUR_GUIDE,
    ModelHandle, TRAVEL_MANAGER, TravelAgents,
};
pub use request::{CITIES, INTERESTS, ORIGIN, TRAVEL_DATES, TripRequest};
pub use tasks::TravelTasks;
pub use trip_crew::TripCrew;
