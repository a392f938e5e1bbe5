use thiserror::Error;

use crate::map::MapError;
use crate::position::PositionError;

/// Convenient result alias for the campus navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a place name does not match any campus location.
    #[error("unknown location: {name}{}", format_suggestions(.suggestions))]
    UnknownLocation {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when the directions provider produced no usable route.
    #[error("no route available: {reason}")]
    RouteUnavailable { reason: String },

    /// Raised when the directions provider answered with a non-success status.
    #[error("directions provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Raised when the provider response could not be interpreted.
    #[error("malformed directions response: {message}")]
    MalformedResponse { message: String },

    /// Raised when a location catalog is empty or otherwise unusable.
    #[error("invalid location catalog: {message}")]
    LocationCatalog { message: String },

    /// Raised when a configuration value could not be parsed.
    #[error("invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    /// Raised when the navigation controller task is no longer running.
    #[error("navigation controller has shut down")]
    ControllerClosed,

    /// Wrapper for device position failures.
    #[error(transparent)]
    Geolocation(#[from] PositionError),

    /// Wrapper for map presentation failures.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
