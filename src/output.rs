//! # Terminal Output
//!
//! Colour and emoji policy for the `docbuilder` CLI. The `--color` flag wins
//! when it is `always` or `never`; in `auto` mode the environment decides:
//!
//! - `NO_COLOR` (any value, even empty) disables colour
//! - `CLICOLOR=0` disables colour
//! - `CLICOLOR_FORCE` (non-empty, not `0`) enables colour without a TTY
//! - `TERM=dumb` disables colour
//! - otherwise colour follows whether stdout is a colour-capable terminal
//!
//! Emoji follow the same decision, with a bracketed plain-text fallback such
//! as `[OK]`.

use std::env;

/// Value of the `--color` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
    Auto,
}

impl ColorMode {
    /// Unrecognised values fall back to `Auto`.
    pub fn from_flag(flag: &str) -> Self {
        match flag.to_ascii_lowercase().as_str() {
            "always" => ColorMode::Always,
            "never" => ColorMode::Never,
            _ => ColorMode::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolve the colour decision from the `--color` flag and the environment,
    /// and apply it to the `console` crate's styling.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match ColorMode::from_flag(color_flag) {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => env_allows_color(),
        };
        console::set_colors_enabled(use_color);
        console::set_colors_enabled_stderr(use_color);
        Self { use_color }
    }
}

fn env_allows_color() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| !v.is_empty() && v != "0") {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}

/// `emoji_str` when colour is on, otherwise the plain-text marker.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
