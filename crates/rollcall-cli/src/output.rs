use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        self.status(Stream::Stdout, style("✓").green(), "success", message);
    }

    pub fn info(&self, message: impl Display) {
        self.status(Stream::Stdout, style("ℹ").blue(), "info", message);
    }

    pub fn warning(&self, message: impl Display) {
        self.status(Stream::Stderr, style("⚠").yellow(), "warning", message);
    }

    pub fn error(&self, message: impl Display) {
        self.status(Stream::Stderr, style("✗").red(), "error", message);
    }

    /// Human mode only; JSON callers emit the same rows through `result`
    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.is_json() {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Structured payload: bare JSON for humans, wrapped in a status envelope for `--json`
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let rendered = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(&data)?,
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "status": "success",
                "data": data,
            }))?,
        };
        println!("{}", rendered);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    fn status(&self, stream: Stream, symbol: StyledObject<&str>, status: &str, message: impl Display) {
        let line = match self.format {
            OutputFormat::Human => format!("{} {}", symbol.bold(), message),
            OutputFormat::Json => {
                let body = serde_json::json!({
                    "status": status,
                    "message": message.to_string(),
                });
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
            }
        };
        match stream {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line),
        }
    }
}
