//! Built-in tools available to travel agents.
//!
//! - [`CalculatorTool`]: restricted arithmetic evaluation
//! - [`SearchInternetTool`]: web search through `DuckDuckGo`

pub mod calculator;
pub mod search;

pub use calculator::{CalcError, CalculateArgs, CalculatorTool, evaluate};
pub use search::{SearchArgs, SearchInternetTool, SearchResult};
