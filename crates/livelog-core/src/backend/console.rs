//! Console backend.
//!
//! Formats events as `[timestamp ]level [key] message data` and prints them
//! on a [`Terminal`], either as plain lines above the live block or into the
//! live region a write is addressed to.

use std::sync::Arc;

use colored::{ColoredString, Colorize};
use serde_json::Value;

use super::terminal::Terminal;
use super::{Backend, LiveRegion};
use crate::level::Level;

/// Backend printing formatted lines to a terminal.
pub struct ConsoleBackend {
    terminal: Terminal,
    timestamp_format: Option<String>,
    colors: bool,
}

impl ConsoleBackend {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            terminal,
            timestamp_format: None,
            colors: true,
        }
    }

    /// Console backend on standard output.
    pub fn stdout() -> Self {
        Self::new(Terminal::stdout())
    }

    /// Prefix every line with the local time in this `chrono` format.
    pub fn with_timestamp(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    fn paint(&self, text: &str, level: Option<Level>) -> String {
        if !self.colors {
            return text.to_string();
        }

        let painted: ColoredString = match level {
            Some(Level::Debug) | None => text.bright_black(),
            Some(Level::Info) => text.cyan(),
            Some(Level::Warn) => text.yellow(),
            Some(Level::Error) => text.red(),
            Some(Level::Fatal) => text.magenta(),
        };
        painted.to_string()
    }

    /// Render one event as a console line.
    pub fn format(
        &self,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) -> String {
        let mut line = String::new();

        if let Some(format) = &self.timestamp_format {
            let stamp = chrono::Local::now().format(format).to_string();
            line.push_str(&self.paint(&stamp, None));
            line.push(' ');
        }

        line.push_str(&self.paint(level.as_str(), Some(level)));
        line.push_str(&" ".repeat(Level::MAX_NAME_LEN + 1 - level.as_str().len()));

        if let Some(key) = key {
            let key = if self.colors {
                key.green().to_string()
            } else {
                key.to_string()
            };
            line.push('[');
            line.push_str(&key);
            line.push_str("] ");
        }

        line.push_str(message);

        if let Some(data) = data {
            let rendered = serde_json::to_string(data).unwrap_or_else(|_| data.to_string());
            line.push(' ');
            line.push_str(&self.paint(&rendered, None));
        }

        line
    }
}

impl Backend for ConsoleBackend {
    fn write(&self, key: Option<&str>, level: Level, message: &str, data: Option<&Value>) {
        self.terminal.println(&self.format(key, level, message, data));
    }

    fn write_live(
        &self,
        region: &Arc<dyn LiveRegion>,
        replace: bool,
        key: Option<&str>,
        level: Level,
        message: &str,
        data: Option<&Value>,
    ) {
        let line = self.format(key, level, message, data);
        if replace {
            region.write(&line);
        } else {
            region.append(&line);
        }
    }

    fn create_live(&self) -> Option<Arc<dyn LiveRegion>> {
        Some(Arc::new(self.terminal.create_region()))
    }
}
