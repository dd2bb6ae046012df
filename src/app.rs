use crate::calendar::MeetingScheduler;
use crate::clock::{Clock, SystemClock};
use crate::command_processor::{preprocess_input, QueryProcessor};
use crate::config::Config;
use crate::contacts::ContactBook;
use crate::parser::ParserFactory;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

pub const QUERY_PROMPT: &str = "Please enter your query (or type 'exit' to quit): ";
pub const CONTINUE_PROMPT: &str = "Do you need anything else? (yes/no): ";
pub const FAREWELL: &str = "Goodbye!";

/// Line-oriented console input.
pub trait Console {
    /// `Ok(None)` once the user has ended input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive terminal backed by rustyline.
pub struct TerminalConsole {
    editor: DefaultEditor,
}

impl TerminalConsole {
    pub fn new() -> Result<Self> {
        Ok(Self { editor: DefaultEditor::new()? })
    }
}

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                Ok(None)
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub struct Application {
    processor: QueryProcessor,
}

impl Application {
    pub fn new(processor: QueryProcessor) -> Self {
        Self { processor }
    }

    /// Wire the Gemini parser, the contact table and Google Calendar together.
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let parser = ParserFactory::create_parser(&config.language_model);
        let contacts = ContactBook::new(&config.contacts.csv_file);
        let scheduler = MeetingScheduler::from_config(config, clock)?;
        Ok(Self::new(QueryProcessor::new(parser, contacts, scheduler)))
    }

    pub fn processor(&self) -> &QueryProcessor {
        &self.processor
    }

    /// Prompt, process, ask to continue; repeat until the user stops.
    pub async fn run(&self, console: &mut dyn Console) -> Result<()> {
        log::info!("Starting meeting assistant");

        loop {
            let Some(query) = console.read_line(QUERY_PROMPT)? else {
                break;
            };
            if preprocess_input(&query) == "exit" {
                log::info!("Exit command detected");
                break;
            }

            if let Err(err) = self.processor.process(query.trim()).await {
                log::error!("Failed to process query: {:#}", err);
            }

            match console.read_line(CONTINUE_PROMPT)? {
                Some(answer) if preprocess_input(&answer) == "yes" => continue,
                _ => break,
            }
        }

        println!("{}", FAREWELL);
        Ok(())
    }
}

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}
