use crate::app::{Application, TerminalConsole};
use crate::auth::Authorizer;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::contacts::ContactBook;
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// meetbot - schedule Google Calendar meetings from plain-English requests
#[derive(Debug, Parser)]
#[command(name = "meetbot")]
#[command(about = "Schedule Google Calendar meetings from natural language requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute (if not specified, enters the interactive prompt)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process a single request and exit
    Ask {
        /// The request, e.g. "Schedule a meeting with Bob tomorrow at 10am"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Look up a contact's email address
    #[command(alias = "lookup")]
    Contact {
        /// Exact contact name as written in the contact table
        name: String,
    },

    /// Authorize calendar access, running the browser consent flow if needed
    Auth,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        None => {
            let app = Application::from_config(&config)?;
            let mut console = TerminalConsole::new()?;
            app.run(&mut console).await
        }
        Some(Commands::Ask { query }) => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                bail!("Query must not be empty");
            }
            let app = Application::from_config(&config)?;
            app.processor().process(&query).await?;
            Ok(())
        }
        Some(Commands::Contact { name }) => {
            let contacts = ContactBook::new(&config.contacts.csv_file);
            println!("{}", contact_line(&contacts, &name)?);
            Ok(())
        }
        Some(Commands::Auth) => {
            let authorizer = Authorizer::from_config(&config.google, Arc::new(SystemClock))?;
            let credential = authorizer.authorize().await?;
            match credential.expiry {
                Some(expiry) => println!("Calendar access authorized (token valid until {})", expiry),
                None => println!("Calendar access authorized"),
            }
            println!("Credential stored at {}", config.google.token_path.display());
            Ok(())
        }
    }
}

/// One line of output for the `contact` subcommand.
fn contact_line(contacts: &ContactBook, name: &str) -> Result<String> {
    Ok(match contacts.lookup(name)? {
        Some(email) => format!("{} <{}>", name, email),
        None => format!("Error: Email not found. No '{}' in {}", name, contacts.path().display()),
    })
}
