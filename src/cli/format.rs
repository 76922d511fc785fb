//! `--format` handling for commands that list checkpoints.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// How a listing is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for a terminal
    #[default]
    Text,
    /// The stored metadata as a pretty-printed JSON array, for scripts
    Json,
}

impl OutputFormat {
    /// Prints `items` as JSON, or passes them to `text` for the column view.
    pub fn print<T: Serialize>(self, items: &[T], text: impl FnOnce(&[T])) -> Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
            OutputFormat::Text => text(items),
        }
        Ok(())
    }
}
