use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputUnreadable,
    ConfigParseError,
    InvalidDelimiter,
    NoCycleFound,
    FetchFailed,
    FetchEmpty,
    FetchHtmlPage,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputUnreadable => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidDelimiter => "E1003",
            Self::NoCycleFound => "E2001",
            Self::FetchFailed => "E3001",
            Self::FetchEmpty => "E3002",
            Self::FetchHtmlPage => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputUnreadable => "Input file unreadable",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidDelimiter => "Invalid field delimiter",
            Self::NoCycleFound => "No cycles found",
            Self::FetchFailed => "Remote fetch failed",
            Self::FetchEmpty => "Downloaded file is empty",
            Self::FetchHtmlPage => "Downloaded file is an HTML page",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputUnreadable => {
                Some("Check that the path exists, is readable, and is UTF-8 text.")
            }
            Self::ConfigParseError => Some("Fix syntax in the routecycle config.toml and retry."),
            Self::InvalidDelimiter => Some("Use exactly one character, e.g. `|`."),
            Self::NoCycleFound => None,
            Self::FetchFailed => Some("Check the URL and network connectivity, then retry."),
            Self::FetchEmpty => Some("Verify the remote file is not empty."),
            Self::FetchHtmlPage => {
                Some("The link served a web page; make the file public or use a direct link.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
