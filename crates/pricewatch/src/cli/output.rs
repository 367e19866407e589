//! Output mode flags and small printing helpers shared by the commands.
//!
//! Global flags are exported as environment variables by `main` so every
//! command can check them without threading them through.

use serde::Serialize;

pub fn is_json() -> bool {
    flag("PRICEWATCH_JSON")
}

pub fn is_quiet() -> bool {
    flag("PRICEWATCH_QUIET")
}

pub fn is_verbose() -> bool {
    flag("PRICEWATCH_VERBOSE")
}

fn flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

/// Pretty-print a JSON value to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// Status symbols, plain when color is disabled.
pub struct Styled {
    color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            color: !flag("PRICEWATCH_NO_COLOR") && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn ok_sym(&self) -> &'static str {
        if self.color {
            "\x1b[32m✓\x1b[0m"
        } else {
            "[OK]"
        }
    }

    pub fn warn_sym(&self) -> &'static str {
        if self.color {
            "\x1b[33m!\x1b[0m"
        } else {
            "[!!]"
        }
    }

    pub fn err_sym(&self) -> &'static str {
        if self.color {
            "\x1b[31m✗\x1b[0m"
        } else {
            "[XX]"
        }
    }
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}
