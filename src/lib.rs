pub mod app;
pub mod auth;
pub mod calendar;
pub mod cli;
pub mod clock;
pub mod command_processor;
pub mod config;
pub mod contacts;
pub mod env_manager;
pub mod parser;
pub mod time_parser;

pub use app::init_logger;

// Re-export commonly used types
pub use config::Config;
pub use command_processor::{QueryOutcome, QueryProcessor};
