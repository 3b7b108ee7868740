use std::fmt;
use std::path::PathBuf;

/// Errors that abort router construction.
///
/// Per-request failures never surface here; they are turned into responses
/// by the router itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupError {
    /// No web root was given and `ROUTER_WEB_ROOT` is unset
    MissingWebRoot,
    /// A configuration file could not be read or parsed
    ConfigLoad {
        path: PathBuf,
        reason: String,
    },
    /// `ignoreUrl` is not a valid regular expression
    InvalidIgnorePattern {
        pattern: String,
        reason: String,
    },
    /// `<filter>.pattern` is not a valid regular expression
    InvalidFilterPattern {
        filter: String,
        pattern: String,
        reason: String,
    },
    /// No factory is registered for the filter's type
    UnknownFilterType {
        filter: String,
        filter_type: String,
    },
    /// The filter factory rejected its configuration
    FilterInit {
        filter: String,
        reason: String,
    },
    /// Handler discovery under the work base failed
    HandlerDiscovery {
        work_base: String,
        reason: String,
    },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::MissingWebRoot => write!(
                f,
                "web root is not defined: pass it to the router builder or set ROUTER_WEB_ROOT"
            ),
            StartupError::ConfigLoad { path, reason } => {
                write!(f, "failed to load config '{}': {}", path.display(), reason)
            }
            StartupError::InvalidIgnorePattern { pattern, reason } => {
                write!(f, "invalid ignoreUrl pattern '{pattern}': {reason}")
            }
            StartupError::InvalidFilterPattern {
                filter,
                pattern,
                reason,
            } => write!(
                f,
                "invalid pattern '{pattern}' for filter '{filter}': {reason}"
            ),
            StartupError::UnknownFilterType {
                filter,
                filter_type,
            } => write!(
                f,
                "filter '{filter}' has unknown type '{filter_type}'"
            ),
            StartupError::FilterInit { filter, reason } => {
                write!(f, "filter '{filter}' failed to initialize: {reason}")
            }
            StartupError::HandlerDiscovery { work_base, reason } => {
                write!(f, "handler discovery under '{work_base}' failed: {reason}")
            }
        }
    }
}

impl std::error::Error for StartupError {}
