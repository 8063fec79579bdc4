pub mod announcer;
pub mod capture;
pub mod cli;
pub mod judge;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod settings;
pub mod utils;

pub use orchestrator::{Orchestrator, RunSummary, StartupError};
pub use settings::AppConfig;
