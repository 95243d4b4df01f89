//! Wires the travel agents and tasks into a crew and runs it.

use std::fmt;

use tracing::info;

use crate::callback::SharedRunHooks;
use crate::cancel::CancelSignal;
use crate::crew::{Crew, CrewOutput, Process};
use crate::error::Result;

use super::agents::TravelAgents;
use super::request::TripRequest;
use super::tasks::TravelTasks;

/// A travel planning run.
///
/// # Example
///
/// ```rust,ignore
/// let agents = TravelAgents::new(ModelHandle::new(provider));
/// let request = TripRequest::new("Berlin", "Lisbon, Porto", "May 3-10", "food, surfing");
///
/// let output = TripCrew::new(agents, request).run(Process::Sequential).await?;
/// println!("{output}");
/// ```
#[derive(Clone)]
pub struct TripCrew {
    agents: TravelAgents,
    request: TripRequest,
    hooks: Option<SharedRunHooks>,
    cancel: CancelSignal,
}

impl fmt::Debug for TripCrew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripCrew")
            .field("agents", &self.agents)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl TripCrew {
    /// Create a run for `request`.
    #[must_use]
    pub fn new(agents: TravelAgents, request: TripRequest) -> Self {
        Self {
            agents,
            request,
            hooks: None,
            cancel: CancelSignal::new(),
        }
    }

    /// Observe the run with lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: SharedRunHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Use an existing cancellation signal.
    #[must_use]
    pub fn cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the trip request.
    #[must_use]
    pub const fn request(&self) -> &TripRequest {
        &self.request
    }

    /// Build the crew for `process` without running it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an agent cannot be built, or a crew
    /// error if the wiring is invalid.
    pub fn crew(&self, process: Process) -> Result<Crew> {
        let expert = self.agents.expert_travel_agent()?;
        let city = self.agents.city_selection_expert()?;
        let guide = self.agents.local_tour_guide()?;

        let mut builder = Crew::builder()
            .agents([expert.clone(), city.clone(), guide.clone()])
            .tasks(TravelTasks::all(city, guide, expert))
            .process(process)
            .cancel_signal(self.cancel.clone());
        if process.needs_manager() {
            builder = builder.manager(self.agents.travel_manager()?);
        }
        if let Some(hooks) = &self.hooks {
            builder = builder.hooks(hooks.clone());
        }
        Ok(builder.build()?)
    }

    /// Plan the trip.
    ///
    /// # Errors
    ///
    /// Propagates every fatal error of the run; see [`Crew::kickoff`].
    pub async fn run(&self, process: Process) -> Result<CrewOutput> {
        let crew = self.crew(process)?;
        info!(process = %process, trip = %self.request, "Planning trip");
        crew.kickoff(&self.request.to_inputs()).await
    }
}
