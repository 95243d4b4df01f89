//! Task orchestration.
//!
//! A [`Crew`] binds agents to an ordered list of [`Task`]s and runs them
//! under a [`Process`]:
//!
//! - **Sequential**: tasks run in declared order; each task sees the output
//!   of the earlier tasks (or the ones it names) as context.
//! - **Hierarchical**: a manager agent receives the whole backlog plus the
//!   [`DelegateWorkTool`] and [`AskQuestionTool`], hands work to coworkers
//!   one delegation at a time, and compiles the final answer itself.
//!
//! Every run produces a [`CrewOutput`] with the final text, each unit of
//! work, the ordered invocation log and summed token usage.

mod config;
mod delegation;
mod hierarchical;
mod output;
mod process;
mod sequential;
mod task;

pub use config::{Crew, CrewBuilder};
pub use delegation::{AskQuestionArgs, AskQuestionTool, DelegateWorkArgs, DelegateWorkTool};
pub use output::{CrewOutput, Invocation, Purpose, TaskOutput};
pub use process::Process;
pub use task::{Task, interpolate, placeholders};
