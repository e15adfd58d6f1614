use thiserror::Error;

pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error ({}): {body}", describe_status(.status))]
    Transport { status: Option<u16>, body: String },

    #[error("Authentication error (401): {body}")]
    Authentication { body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config loading error: {0}")]
    Config(#[from] config::ConfigError),
}

fn describe_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "no response".to_string())
}

impl IntegrationError {
    /// HTTP status reported by the vendor, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            IntegrationError::Transport { status, .. } => *status,
            IntegrationError::Authentication { .. } => Some(401),
            _ => None,
        }
    }

    /// Local failures never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            IntegrationError::Configuration(_)
                | IntegrationError::Validation(_)
                | IntegrationError::Serialization(_)
                | IntegrationError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = IntegrationError::Transport {
            status: Some(500),
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Transport error (500): boom");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_local());

        let err = IntegrationError::Transport {
            status: None,
            body: "connection refused".into(),
        };
        assert_eq!(err.to_string(), "Transport error (no response): connection refused");
    }

    #[test]
    fn test_authentication_is_401() {
        let err = IntegrationError::Authentication {
            body: "invalid key".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(IntegrationError::Validation("x".into()).is_local());
    }
}
