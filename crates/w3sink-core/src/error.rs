use std::fmt;

/// Machine-readable error codes for scripts and CI checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    SourceReadFailed,
    UnknownSourceFormat,
    MalformedHeader,
    SyntaxError,
    UnknownDirective,
    InvalidJsonLog,
    MalformedJsonEvent,
    OutputWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    pub const ALL: [Self; 10] = [
        Self::ConfigParseError,
        Self::SourceReadFailed,
        Self::UnknownSourceFormat,
        Self::MalformedHeader,
        Self::SyntaxError,
        Self::UnknownDirective,
        Self::InvalidJsonLog,
        Self::MalformedJsonEvent,
        Self::OutputWriteFailed,
        Self::InternalUnexpected,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::SourceReadFailed => "E1002",
            Self::UnknownSourceFormat => "E1003",
            Self::MalformedHeader => "E2001",
            Self::SyntaxError => "E2002",
            Self::UnknownDirective => "E2003",
            Self::InvalidJsonLog => "E3001",
            Self::MalformedJsonEvent => "E3002",
            Self::OutputWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::SourceReadFailed => "Could not read source file",
            Self::UnknownSourceFormat => "Unknown source format",
            Self::MalformedHeader => "Malformed DGS header",
            Self::SyntaxError => "DGS syntax error",
            Self::UnknownDirective => "Unknown DGS directive",
            Self::InvalidJsonLog => "Invalid JSON event log",
            Self::MalformedJsonEvent => "Malformed JSON event",
            Self::OutputWriteFailed => "Output write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .w3sink/config.toml and retry."),
            Self::SourceReadFailed => Some("Check that the path exists and is readable."),
            Self::UnknownSourceFormat => {
                Some("Use a .dgs or .json file, or pass --input-format dgs|json.")
            }
            Self::MalformedHeader => {
                Some("A DGS file starts with `DGS00N` and a `name nodes edges` line.")
            }
            Self::SyntaxError => Some("Check quoting and bracket balance on the reported line."),
            Self::UnknownDirective => {
                Some("Valid directives are an, cn, dn, ae, ce, de, cg, st and cl.")
            }
            Self::InvalidJsonLog => Some("Expected an object with an \"events\" array."),
            Self::MalformedJsonEvent => {
                Some("Each event is an array starting with a directive code, e.g. [\"an\", \"A\"].")
            }
            Self::OutputWriteFailed => Some("Check free disk space and write permissions."),
            Self::InternalUnexpected => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ErrorCode::ALL {
            let code = code.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_is_the_code() {
        assert_eq!(ErrorCode::SyntaxError.to_string(), "E2002");
    }
}
