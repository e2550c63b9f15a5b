//! Unified error type for m4bforge.
//!
//! Every crate funnels its failures into [`Error`], which carries enough
//! context for the HTTP layer to derive a status code via
//! [`Error::http_status`].

/// Unified error type covering all failure modes in m4bforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A time value could not be resolved to seconds.
    #[error("Invalid time format: {0}. Use seconds (e.g., 390) or MM:SS (e.g., \"6:30\")")]
    InvalidFormat(String),

    /// Request or argument data failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The uploaded or given file is not a supported media type.
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    /// An upload exceeded the configured size limit.
    #[error("File too large. Maximum size is {limit_mb}MB.")]
    PayloadTooLarge {
        /// The configured limit in megabytes.
        limit_mb: u64,
    },

    /// A required external tool could not be located.
    #[error("Tool not found: {tool}")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// An external tool (ffmpeg) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidFormat(_) => 400,
            Error::InvalidInput(_) => 400,
            Error::Unsupported(_) => 400,
            Error::PayloadTooLarge { .. } => 413,
            Error::ToolNotFound { .. } => 503,
            Error::Tool { .. } => 502,
            Error::Io { .. } => 500,
            Error::Json(_) => 400,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidFormat(_) => "invalid_format",
            Error::InvalidInput(_) => "validation_error",
            Error::Unsupported(_) => "unsupported",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::ToolNotFound { .. } => "tool_not_found",
            Error::Tool { .. } => "tool_error",
            Error::Io { .. } => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::InvalidFormat`].
    pub fn invalid_format(input: impl Into<String>) -> Self {
        Error::InvalidFormat(input.into())
    }

    /// Convenience constructor for [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Convenience constructor for [`Error::ToolNotFound`].
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Error::ToolNotFound { tool: tool.into() }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
