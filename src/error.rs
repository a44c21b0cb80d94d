use thiserror::Error;

/// Failures reported by the host's notification / push capabilities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("push notifications are not supported on this host")]
    Unsupported,

    #[error("service worker is not available")]
    WorkerUnavailable,

    #[error("notification permission was not granted")]
    PermissionDenied,

    #[error("platform rejected the request: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}")]
    Status {
        status: u16,
        detail: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// `detail` sent by the backend alongside a non-2xx status, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("settings store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("application server key is empty")]
    Empty,

    #[error("application server key is not valid base64: {0}")]
    Malformed(String),
}
