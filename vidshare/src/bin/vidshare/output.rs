use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;
use std::io::Write;

use crate::theme::{BULLET, PALETTE, Tone};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be rendered as a table or a one-line summary
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// A table with the themed preset and a bold header row.
pub fn themed_table(options: &GlobalOptions, headers: &[&str]) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| {
            let cell = Cell::new(h).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
    table
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    fn is_structured(&self) -> bool {
        matches!(self.options.output_format, OutputFormat::Json)
    }

    fn line(&self, tone: Tone, message: &str) -> String {
        if self.options.no_color {
            format!("{} {message}", tone.glyph())
        } else {
            format!("{} {}", tone.glyph().color(tone.color()), message.color(tone.color()))
        }
    }

    pub fn success(&self, message: &str) {
        if !self.options.quiet && !self.is_structured() {
            println!("{}", self.line(Tone::Done, message));
        }
    }

    /// Errors are always shown, on stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(Tone::Failed, message));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            eprintln!("{}", self.line(Tone::Caution, message));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet && !self.is_structured() {
            println!("{}", self.line(Tone::Note, message));
        }
    }

    /// Only shown with `--verbose`
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.line(Tone::Trace, message));
        }
    }

    pub fn heading(&self, text: &str) {
        if self.options.quiet || self.is_structured() {
            return;
        }
        let output = if self.options.no_color {
            format!("\n{text}\n{}", "=".repeat(text.len()))
        } else {
            format!("\n{}", text.color(PALETTE.heading).bold())
        };
        println!("{output}");
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.options.quiet || self.is_structured() {
            return;
        }
        let output = if self.options.no_color {
            format!("{key}: {value}")
        } else {
            format!("{}: {}", key.color(PALETTE.label).bold(), value.color(PALETTE.value))
        };
        println!("{output}");
    }

    pub fn bullet(&self, text: &str) {
        if self.options.quiet || self.is_structured() {
            return;
        }
        let output = if self.options.no_color {
            format!("  {BULLET} {text}")
        } else {
            format!("  {} {text}", BULLET.color(PALETTE.bullet))
        };
        println!("{output}");
    }

    pub fn progress(&self, message: &str) {
        if self.options.quiet || self.is_structured() {
            return;
        }

        let output = if self.options.no_color {
            format!("{} {message}...", Tone::Working.glyph())
        } else {
            format!(
                "{} {}...",
                Tone::Working.glyph().color(Tone::Working.color()).bold(),
                message.color(Tone::Working.color())
            )
        };

        print!("\r{output}");
        std::io::stdout().flush().ok();
    }

    /// Clear the current line after a progress indicator
    pub fn clear_line(&self) {
        if self.options.quiet || self.is_structured() {
            return;
        }

        print!("\r{}", " ".repeat(80));
        print!("\r");
        std::io::stdout().flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    impl TableDisplay for TestData {
        fn to_table(&self, options: &GlobalOptions) -> Table {
            let mut table = themed_table(options, &["Name", "Value"]);
            table.add_row(vec![Cell::new(&self.name), Cell::new(self.value.to_string())]);
            table
        }

        fn to_compact(&self) -> String {
            format!("{}={}", self.name, self.value)
        }
    }

    fn data() -> TestData {
        TestData {
            name: "test".to_string(),
            value: 42,
        }
    }

    #[test]
    fn displays_in_every_format() {
        for output_format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Compact] {
            let manager = OutputManager::new(GlobalOptions {
                output_format,
                no_color: true,
                ..Default::default()
            });
            assert!(manager.display(&data()).is_ok());
        }
    }

    #[test]
    fn quiet_suppresses_display() {
        let manager = OutputManager::new(GlobalOptions {
            quiet: true,
            ..Default::default()
        });
        assert!(manager.display(&data()).is_ok());
    }

    #[test]
    fn themed_table_has_header() {
        let table = themed_table(&GlobalOptions::default(), &["A", "B"]);
        let rendered = table.to_string();
        assert!(rendered.contains('A'));
        assert!(rendered.contains('B'));
    }
}
