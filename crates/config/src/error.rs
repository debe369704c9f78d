use thiserror::Error;

/// Errors raised while resolving a profile or the session settings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("Unsupported output width: {0}px")]
    UnsupportedResolution(u32),

    #[error("Invalid setting {key}={value}")]
    InvalidSetting { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_error_display() {
        let err = ProfileError::UnknownProfile("turbo".to_string());
        assert_eq!(err.to_string(), "Unknown profile: turbo");

        let err = ProfileError::InvalidSetting {
            key: "OUTPUT_WIDTH".to_string(),
            value: "wide".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid setting OUTPUT_WIDTH=wide");
    }
}
