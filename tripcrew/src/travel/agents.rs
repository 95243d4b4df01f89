//! The travel agent registry.
//!
//! [`TravelAgents`] builds the crew's personas. It holds two model handles:
//! the primary one drives the expert travel agent, the advanced one drives
//! the city selection expert and the local tour guide. Both may point at the
//! same provider. The manager persona uses its own handle when one is set,
//! and the advanced one otherwise.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{Agent, AgentBuilder, DEFAULT_MAX_STEPS, DEFAULT_TOOL_TIMEOUT};
use crate::chat::SharedChatProvider;
use crate::error::ConfigError;
use crate::tool::SharedTool;
use crate::tools::{CalculatorTool, SearchInternetTool};

/// Sampling temperature used unless a handle sets its own.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Role of the expert travel agent.
pub const EXPERT_TRAVEL_AGENT: &str = "Expert Travel Agent";
/// Role of the city selection expert.
pub const CITY_SELECTION_EXPERT: &str = "City Selection Expert";
/// Role of the local tour guide.
pub const LOCAL_TOUR_GUIDE: &str = "Local Tour Guide";
/// Role of the hierarchical manager.
pub const TRAVEL_MANAGER: &str = "Travel Crew Manager";

/// A provider plus the model and temperature to use with it.
#[derive(Clone)]
pub struct ModelHandle {
    provider: SharedChatProvider,
    model: String,
    temperature: f32,
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ModelHandle {
    /// Use the provider's default model at the default temperature.
    #[must_use]
    pub fn new(provider: SharedChatProvider) -> Self {
        let model = provider.default_model().to_owned();
        Self {
            provider,
            model,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Use a specific model. A blank name keeps the provider default.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn apply(&self, builder: AgentBuilder) -> AgentBuilder {
        builder
            .provider(Arc::clone(&self.provider))
            .model(self.model.clone())
            .temperature(self.temperature)
    }
}

/// Builds the travel crew's agents.
#[derive(Clone)]
pub struct TravelAgents {
    primary: ModelHandle,
    advanced: ModelHandle,
    manager: Option<ModelHandle>,
    search: SharedTool,
    calculator: SharedTool,
    max_steps: usize,
    tool_timeout: Duration,
}

impl fmt::Debug for TravelAgents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TravelAgents")
            .field("primary", &self.primary)
            .field("advanced", &self.advanced)
            .field("manager", &self.manager)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl TravelAgents {
    /// Create a registry where every agent uses `primary`.
    #[must_use]
    pub fn new(primary: ModelHandle) -> Self {
        Self {
            advanced: primary.clone(),
            primary,
            manager: None,
            search: Arc::new(SearchInternetTool::new()),
            calculator: Arc::new(CalculatorTool),
            max_steps: DEFAULT_MAX_STEPS,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Use a separate model for the city expert and the tour guide.
    #[must_use]
    pub fn with_advanced(mut self, advanced: ModelHandle) -> Self {
        self.advanced = advanced;
        self
    }

    /// Use a separate model for the manager.
    #[must_use]
    pub fn with_manager_model(mut self, manager: ModelHandle) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Replace the search tool shared by every agent.
    #[must_use]
    pub fn with_search_tool(mut self, search: SharedTool) -> Self {
        self.search = search;
        self
    }

    /// Set the step limit of every agent.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the tool time budget of every agent.
    #[must_use]
    pub const fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    fn base(&self, role: &str) -> AgentBuilder {
        Agent::builder(role)
            .max_steps(self.max_steps)
            .tool_timeout(self.tool_timeout)
    }

    /// Plans the itinerary: budget, packing and safety included.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the agent cannot be built.
    pub fn expert_travel_agent(&self) -> Result<Arc<Agent>, ConfigError> {
        self.primary
            .apply(self.base(EXPERT_TRAVEL_AGENT))
            .goal(
                "Create a 7-day travel itinerary with detailed per-day plans, \
                 include budget, packing suggestions, and safety tips.",
            )
            .backstory(
                "Expert in travel planning and logistics. \
                 I have decades of experience making travel itineraries.",
            )
            .shared_tool(Arc::clone(&self.search))
            .shared_tool(Arc::clone(&self.calculator))
            .build_shared()
    }

    /// Picks the destination.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the agent cannot be built.
    pub fn city_selection_expert(&self) -> Result<Arc<Agent>, ConfigError> {
        self.advanced
            .apply(self.base(CITY_SELECTION_EXPERT))
            .goal(
                "Select the best cities based on weather, season, prices, \
                 and traveler interests",
            )
            .backstory("Expert at analyzing travel data to pick ideal destinations")
            .shared_tool(Arc::clone(&self.search))
            .build_shared()
    }

    /// Knows the chosen city.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the agent cannot be built.
    pub fn local_tour_guide(&self) -> Result<Arc<Agent>, ConfigError> {
        self.advanced
            .apply(self.base(LOCAL_TOUR_GUIDE))
            .goal("Provide the BEST insights about the selected city")
            .backstory(
                "Knowledgeable local guide with extensive information \
                 about the city, its attractions and customs",
            )
            .shared_tool(Arc::clone(&self.search))
            .build_shared()
    }

    /// Coordinates the others under the hierarchical process. Has no tools
    /// of its own; the crew hands it the delegation tools.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the agent cannot be built.
    pub fn travel_manager(&self) -> Result<Arc<Agent>, ConfigError> {
        self.manager
            .as_ref()
            .unwrap_or(&self.advanced)
            .apply(self.base(TRAVEL_MANAGER))
            .goal(
                "Deliver a complete, coherent 7-day travel plan by coordinating the \
                 city selection expert, the local tour guide and the expert travel agent",
            )
            .backstory(
                "Seasoned travel operations lead who runs a team of specialists. \
                 You never do the research yourself: you delegate, check the results, \
                 and write the final plan in a warm, well-structured voice.",
            )
            .allow_delegation(true)
            .build_shared()
    }

    /// The three workers in declared order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised while building them.
    pub fn workers(&self) -> Result<Vec<Arc<Agent>>, ConfigError> {
        Ok(vec![
            self.expert_travel_agent()?,
            self.city_selection_expert()?,
            self.local_tour_guide()?,
        ])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::llms::MockProvider;

    fn handle(model: &str) -> ModelHandle {
        ModelHandle::new(Arc::new(MockProvider::new())).model(model)
    }

    #[test]
    fn personas_and_tools() {
        let agents = TravelAgents::new(handle("gemini-2.0-flash"));

        let expert = agents.expert_travel_agent().unwrap();
        assert_eq!(expert.role(), EXPERT_TRAVEL_AGENT);
        assert_eq!(expert.tools().names(), vec!["search_internet", "calculate"]);
        assert!(expert.goal().starts_with("Create a 7-day travel itinerary"));

        let city = agents.city_selection_expert().unwrap();
        assert_eq!(city.tools().names(), vec!["search_internet"]);

        let guide = agents.local_tour_guide().unwrap();
        assert_eq!(guide.role(), LOCAL_TOUR_GUIDE);
        assert_eq!(guide.temperature(), Some(DEFAULT_TEMPERATURE));
    }

    #[test]
    fn advanced_model_drives_city_expert_and_guide() {
        let agents = TravelAgents::new(handle("primary"))
            .with_advanced(handle("advanced").temperature(0.2));

        assert_eq!(agents.expert_travel_agent().unwrap().model(), "primary");
        assert_eq!(agents.city_selection_expert().unwrap().model(), "advanced");
        assert_eq!(agents.local_tour_guide().unwrap().temperature(), Some(0.2));
        assert_eq!(agents.travel_manager().unwrap().model(), "advanced");
    }

    #[test]
    fn manager_is_not_a_worker() {
        let agents = TravelAgents::new(handle("m")).with_manager_model(handle("boss"));
        let manager = agents.travel_manager().unwrap();
        assert_eq!(manager.model(), "boss");
        assert!(manager.tools().is_empty());
        assert!(manager.allow_delegation());
        assert!(
            agents
                .workers()
                .unwrap()
                .iter()
                .all(|w| !w.same_role(&manager))
        );
    }

    #[test]
    fn shared_settings_apply_to_every_agent() {
        let agents = TravelAgents::new(handle("m"))
            .with_max_steps(4)
            .with_tool_timeout(Duration::from_secs(9));
        for agent in agents.workers().unwrap() {
            assert_eq!(agent.max_steps(), 4);
            assert_eq!(agent.tool_timeout(), Duration::from_secs(9));
        }
    }

    #[test]
    fn blank_model_keeps_provider_default() {
        let handle = ModelHandle::new(Arc::new(MockProvider::new().with_model("mock-1"))).model(" ");
        assert_eq!(handle.model_name(), "mock-1");
    }
}
