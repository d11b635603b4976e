//! Terminal output helpers for the CLI.

use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;

/// Whether stderr decorations may use ANSI colors.
pub fn color_enabled() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stderr().is_terminal()
}

const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    pub fn ok_sym(&self) -> String {
        self.paint(GREEN, "\u{2713}", "OK")
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s, s)
    }

    fn paint(&self, code: &str, colored: &str, plain: &str) -> String {
        if self.use_color {
            format!("{code}{colored}{RESET}")
        } else {
            plain.to_string()
        }
    }
}

/// Serialize `value` as compact or pretty JSON.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Human-readable elapsed time, e.g. "850ms" or "2.4s".
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(850)), "850ms");
        assert_eq!(format_elapsed(Duration::from_millis(2_400)), "2.4s");
        assert_eq!(format_elapsed(Duration::from_secs(135)), "2m 15s");
    }

    #[test]
    fn test_plain_symbols() {
        let s = Styled::plain();
        assert_eq!(s.ok_sym(), "OK");
        assert_eq!(s.dim("x"), "x");
    }

    #[test]
    fn test_to_json() {
        let value = json!({ "a": 1 });
        assert_eq!(to_json(&value, false).unwrap(), r#"{"a":1}"#);
        assert_eq!(to_json(&value, true).unwrap(), "{\n  \"a\": 1\n}");
    }
}
