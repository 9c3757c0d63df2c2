use crate::TimeMode;

/// Result alias that carries the custom [`GlowGridError`] type.
pub type Result<T> = std::result::Result<T, GlowGridError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum GlowGridError {
    /// Free-form failure, mostly used for poisoned locks and for errors
    /// bubbling up from collaborators outside this crate (image encoding,
    /// the external video encoder).
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or protocol payload that failed to (de)serialize.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The loop duration handed to a capture driver cannot produce a frame
    /// sequence. Capture must abort before writing anything.
    #[error("loop duration must be finite and positive, got {0} ms")]
    InvalidLoopDuration(f64),
    #[error("operation requires the {expected:?} time mode")]
    ModeMismatch { expected: TimeMode },
    #[error("an export bridge is already registered on this host")]
    BridgeAlreadyRegistered,
    #[error("no export bridge is registered")]
    BridgeNotRegistered,
    /// The host's bridge writes to some other view's time source, so every
    /// sampled frame would be stale.
    #[error("export host is not bridged to this view")]
    HostMismatch,
}

impl GlowGridError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for GlowGridError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for GlowGridError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
