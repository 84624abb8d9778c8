//! Severity‑colored console messages for the driver: info in cyan, script
//! failures as yellow warnings, unusable input as red critical messages.
//! Colors are dropped when stderr is not a color terminal or `NO_COLOR` is
//! set.

use owo_colors::OwoColorize;
use std::sync::OnceLock;
use supports_color::Stream;

static ANSI_ENABLED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Critical,
}

pub fn info(message: &str) -> String {
    paint(Level::Info, message, ansi_enabled())
}

pub fn warning(message: &str) -> String {
    paint(Level::Warning, message, ansi_enabled())
}

pub fn critical(message: &str) -> String {
    paint(Level::Critical, message, ansi_enabled())
}

pub fn paint(level: Level, message: &str, ansi: bool) -> String {
    if !ansi {
        return message.to_string();
    }

    match level {
        Level::Info => format!("{}", message.cyan()),
        Level::Warning => format!("{}", message.bright_yellow()),
        Level::Critical => format!("{}", message.bright_red()),
    }
}

fn ansi_enabled() -> bool {
    *ANSI_ENABLED.get_or_init(detect_ansi)
}

fn detect_ansi() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    supports_color::on_cached(Stream::Stderr).is_some()
}
