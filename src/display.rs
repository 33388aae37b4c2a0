//! Terminal rendering of upload outcomes.
//!
//! The formatting contract is fixed: one line of text plus a color, the
//! same three shapes for every capture attempt.

use std::io::IsTerminal;

use crate::verdict::Verdict;

/// Text shown when the upload itself fails or the reply is unusable.
pub const UPLOAD_FAILED_TEXT: &str = "Upload failed.";

const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Color of a result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultColor {
    Green,
    Red,
}

impl ResultColor {
    fn ansi(self) -> &'static str {
        match self {
            ResultColor::Green => ANSI_GREEN,
            ResultColor::Red => ANSI_RED,
        }
    }
}

/// A fully formatted result line, ready to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub text: String,
    pub color: ResultColor,
}

impl ResultLine {
    /// The line wrapped in ANSI color codes.
    pub fn colored(&self) -> String {
        format!("{}{}{}", self.color.ansi(), self.text, ANSI_RESET)
    }
}

/// Format a verdict the way the result panel shows it.
///
/// Recognized vehicles render as `Vehicle: {number} | Status: {status}`
/// in green when authorized and red otherwise; server errors render as
/// `Error: {message}` in red.
pub fn verdict_line(verdict: &Verdict) -> ResultLine {
    match verdict {
        Verdict::Rejected { message } => ResultLine {
            text: format!("Error: {}", message),
            color: ResultColor::Red,
        },
        Verdict::Recognized { number, status } => ResultLine {
            text: format!("Vehicle: {} | Status: {}", number, status),
            color: if verdict.is_authorized() {
                ResultColor::Green
            } else {
                ResultColor::Red
            },
        },
    }
}

/// The fixed line shown for any transport or parse failure.
pub fn failure_line() -> ResultLine {
    ResultLine {
        text: UPLOAD_FAILED_TEXT.to_string(),
        color: ResultColor::Red,
    }
}

/// Print a result line to stdout, colored when stdout is a terminal.
pub fn print_result(line: &ResultLine) {
    if std::io::stdout().is_terminal() {
        println!("{}", line.colored());
    } else {
        println!("{}", line.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_vehicle_is_green() {
        let verdict = Verdict::Recognized {
            number: "ABC123".to_string(),
            status: "Authorized".to_string(),
        };
        let line = verdict_line(&verdict);
        assert_eq!(line.text, "Vehicle: ABC123 | Status: Authorized");
        assert_eq!(line.color, ResultColor::Green);
    }

    #[test]
    fn test_denied_vehicle_is_red() {
        let verdict = Verdict::Recognized {
            number: "XYZ999".to_string(),
            status: "Denied".to_string(),
        };
        let line = verdict_line(&verdict);
        assert_eq!(line.text, "Vehicle: XYZ999 | Status: Denied");
        assert_eq!(line.color, ResultColor::Red);
    }

    #[test]
    fn test_unauthorized_status_is_red() {
        // Any status other than the exact literal renders red
        let verdict = Verdict::Recognized {
            number: "UP65AB1234".to_string(),
            status: "Unauthorized".to_string(),
        };
        assert_eq!(verdict_line(&verdict).color, ResultColor::Red);
    }

    #[test]
    fn test_status_comparison_is_case_sensitive() {
        let verdict = Verdict::Recognized {
            number: "ABC123".to_string(),
            status: "authorized".to_string(),
        };
        assert_eq!(verdict_line(&verdict).color, ResultColor::Red);
    }

    #[test]
    fn test_server_error_is_red() {
        let verdict = Verdict::Rejected {
            message: "no plate detected".to_string(),
        };
        let line = verdict_line(&verdict);
        assert_eq!(line.text, "Error: no plate detected");
        assert_eq!(line.color, ResultColor::Red);
    }

    #[test]
    fn test_failure_line_is_fixed() {
        let line = failure_line();
        assert_eq!(line.text, "Upload failed.");
        assert_eq!(line.color, ResultColor::Red);
    }

    #[test]
    fn test_colored_wraps_with_ansi_codes() {
        let line = ResultLine {
            text: "hello".to_string(),
            color: ResultColor::Green,
        };
        assert_eq!(line.colored(), "\x1b[32mhello\x1b[0m");

        let line = ResultLine {
            text: "hello".to_string(),
            color: ResultColor::Red,
        };
        assert_eq!(line.colored(), "\x1b[31mhello\x1b[0m");
    }
}
