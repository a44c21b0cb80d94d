use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Notification permission as seen by the host, collapsed to four states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Default,
    Unsupported,
}

impl PermissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Default => "default",
            Self::Unsupported => "unsupported",
        }
    }

    /// `granted` and `denied` are sticky: hosts refuse to prompt again.
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Granted | Self::Denied)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            "default" | "prompt" => Ok(Self::Default),
            "unsupported" => Ok(Self::Unsupported),
            other => Err(format!("unknown permission state: {other}")),
        }
    }
}
