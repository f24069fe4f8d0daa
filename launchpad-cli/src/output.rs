//! Command output
//!
//! Handlers build JSON views of pools, quotes, trades and balances and hand
//! them to a `Report`, which renders them in the `--format` the user picked
//! and writes them through an `Output` sink. Status notices ("Created pool
//! 3") are table-mode only so JSON output stays machine-readable.

use clap::ValueEnum;
use serde_json::{Map, Value};

use crate::error::CliResult;

/// Values of `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Sink for rendered views and status notices
pub trait Output: Send + Sync {
    fn view(&self, text: &str) -> CliResult<()>;

    fn notice(&self, text: &str) -> CliResult<()>;
}

/// Writes to the terminal
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn view(&self, text: &str) -> CliResult<()> {
        println!("{}", text.trim_end());
        Ok(())
    }

    fn notice(&self, text: &str) -> CliResult<()> {
        println!("{}", text);
        Ok(())
    }
}

/// An `Output` bound to the selected format
pub struct Report<'a> {
    output: &'a dyn Output,
    format: OutputFormat,
}

impl<'a> Report<'a> {
    pub fn new(output: &'a dyn Output, format: OutputFormat) -> Self {
        Self { output, format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render one view and write it
    pub fn show(&self, view: &Value) -> CliResult<()> {
        self.output.view(&render_view(view, self.format)?)
    }

    /// Completed action
    pub fn done(&self, msg: &str) -> CliResult<()> {
        self.notify(&format!("✅ {}", msg))
    }

    /// Anything else worth telling a human
    pub fn note(&self, msg: &str) -> CliResult<()> {
        self.notify(&format!("ℹ️  {}", msg))
    }

    fn notify(&self, text: &str) -> CliResult<()> {
        match self.format {
            OutputFormat::Table => self.output.notice(text),
            OutputFormat::Json => Ok(()),
        }
    }
}

/// Render a view as pretty JSON or as aligned `key value` rows
///
/// Arrays of objects become numbered blocks, one per pool or trade.
pub fn render_view(view: &Value, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Table => Ok(match view {
            Value::Object(fields) => table_rows(fields),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(fields) => format!("[{}]\n{}", i, table_rows(fields)),
                    other => format!("[{}] {}\n", i, plain(other)),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => plain(other),
        }),
    }
}

fn table_rows(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{:<20} {}\n", key, plain(value)))
        .collect()
}

// Amounts arrive as decimal strings; print them bare
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
