//! MANET scenario simulator
//!
//! Loads a scenario description, builds the network it describes, runs it
//! and condenses the resulting event trace into a summary.

pub mod runner;
pub mod scenario;
pub mod stats;

pub use runner::ManetRunner;
pub use scenario::ScenarioFile;
