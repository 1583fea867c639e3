//! Error types and handling for the `MotoPlan` application

use std::fmt;

use thiserror::Error;

/// External service that produced a remote error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Geocoding,
    Routing,
    Weather,
    Insight,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Geocoding => "Geocoding",
            Service::Routing => "Routing",
            Service::Weather => "Weather API",
            Service::Insight => "Gemini API",
        };
        f.write_str(name)
    }
}

/// Main error type for the `MotoPlan` application
#[derive(Error, Debug)]
pub enum MotoPlanError {
    /// The geocoder had no candidate for a place name
    #[error("Could not find location: {query}")]
    NotFound { query: String },

    /// No saved route with this id in the user's collection
    #[error("No saved route with id {id}")]
    UnknownRoute { id: String },

    /// Non-success response or unexpected payload from an external service
    #[error("{service} Error: {message}")]
    Remote {
        service: Service,
        status: Option<u16>,
        message: String,
    },

    /// Request could not be sent or its body could not be read
    #[error("{service} request failed: {message}")]
    Transport { service: Service, message: String },

    /// A credential is missing locally
    #[error("{message}")]
    Auth { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Saved-route storage errors
    #[error("Storage error: {message}")]
    Store { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MotoPlanError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(query: S) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Create a new remote error
    pub fn remote<S: Into<String>>(service: Service, status: Option<u16>, message: S) -> Self {
        Self::Remote {
            service,
            status,
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(service: Service, message: S) -> Self {
        Self::Transport {
            service,
            message: message.into(),
        }
    }

    /// Create a new credential error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// The message reported by the remote service, if this is a remote error
    #[must_use]
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            MotoPlanError::Remote { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the user should be pointed at their API keys
    #[must_use]
    pub fn is_credential_problem(&self) -> bool {
        match self {
            MotoPlanError::Auth { .. } => true,
            MotoPlanError::Remote {
                status: Some(401 | 403),
                ..
            } => true,
            MotoPlanError::Remote { message, .. } => message.to_lowercase().contains("key"),
            _ => false,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            MotoPlanError::NotFound { query } => format!("Could not find location: {query}"),
            MotoPlanError::UnknownRoute { .. }
            | MotoPlanError::Remote { .. }
            | MotoPlanError::Auth { .. } => self.to_string(),
            MotoPlanError::Transport { service, .. } => format!(
                "Unable to reach the {service} service. Please check your internet connection."
            ),
            MotoPlanError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            MotoPlanError::Validation { message } => message.clone(),
            MotoPlanError::Store { .. } => {
                "Saved routes are unavailable. Please check the store location.".to_string()
            }
            MotoPlanError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
