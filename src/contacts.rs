//! Contact lookup against a flat CSV table.
//!
//! The table needs a header row with at least `Name` and `Email` columns.
//! It is read fresh on every lookup so edits are picked up without a restart.

use log::{debug, info};
use std::path::{Path, PathBuf};

const NAME_COLUMN: &str = "Name";
const EMAIL_COLUMN: &str = "Email";

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Failed to read contact table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Contact table {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ContactBook {
    path: PathBuf,
}

impl ContactBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the table.
    pub fn load(&self) -> Result<Vec<Contact>, ContactError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let column = |column: &'static str| {
            headers.iter().position(|h| h == column).ok_or_else(|| ContactError::MissingColumn {
                path: self.path.clone(),
                column,
            })
        };
        let name_idx = column(NAME_COLUMN)?;
        let email_idx = column(EMAIL_COLUMN)?;

        let mut contacts = Vec::new();
        for record in reader.records() {
            let record = record?;
            contacts.push(Contact {
                name: record.get(name_idx).unwrap_or_default().to_string(),
                email: record.get(email_idx).unwrap_or_default().to_string(),
            });
        }
        debug!("Loaded {} contacts from {}", contacts.len(), self.path.display());
        Ok(contacts)
    }

    /// Email of the first row whose name equals `name` exactly.
    ///
    /// Matching is case-sensitive. Duplicate names resolve to the first row;
    /// rows without an email are skipped.
    pub fn lookup(&self, name: &str) -> Result<Option<String>, ContactError> {
        let email = self
            .load()?
            .into_iter()
            .find(|contact| contact.name == name && !contact.email.trim().is_empty())
            .map(|contact| contact.email);

        match &email {
            Some(email) => info!("Resolved contact '{}' to {}", name, email),
            None => info!("No contact named '{}' in {}", name, self.path.display()),
        }
        Ok(email)
    }
}
