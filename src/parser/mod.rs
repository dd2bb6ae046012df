pub mod gemini;
/// Intent extraction
///
/// Turns free-text requests into structured [`Intent`]s via a language model.
pub mod traits;
pub mod utils;

use crate::config::LanguageModelConfig;
use log::info;

pub use gemini::GeminiParser;
pub use traits::{Intent, IntentParser, ParserError, SCHEDULE_MEETING_TASK};

/// Factory for creating the configured parser
pub struct ParserFactory;

impl ParserFactory {
    pub fn create_parser(config: &LanguageModelConfig) -> Box<dyn IntentParser> {
        info!("Creating Gemini parser for model {}", config.model);
        Box::new(GeminiParser::new(config))
    }
}
