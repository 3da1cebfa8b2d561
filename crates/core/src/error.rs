/// Result alias that carries the custom [`VizError`] type.
pub type Result<T> = std::result::Result<T, VizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// The audio input could not be opened. The engine stays inactive and a
    /// fresh `start` is required.
    #[error("audio input unavailable: {0}")]
    Acquisition(String),
    /// A configuration value was rejected, either by range validation or by
    /// the sample provider. The previous configuration is retained.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// The sample provider has not been acquired yet (or was released).
    #[error("sample provider is not ready")]
    ProviderNotReady,
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("wav input failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

impl VizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Shorthand for [`VizError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<&str> for VizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
