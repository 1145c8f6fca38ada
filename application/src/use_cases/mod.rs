//! Use cases (application services)
//!
//! - [`shared_interface`]: forum, chat and registry rules over the store
//! - [`run_pass`]: one agent pass: prompt, decision call, state update
//! - [`tool_dispatch`]: executing validated tool commands
//! - [`orchestrator`]: the population and its round loop

pub mod orchestrator;
pub mod run_pass;
pub mod shared_interface;
pub mod tool_dispatch;
