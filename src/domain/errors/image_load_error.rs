//! Errors surfaced to image load callbacks.

use thiserror::Error;

use crate::domain::entities::Bitmap;

/// Status code reported when no HTTP status is available.
pub const UNKNOWN_STATUS: i32 = -1;

/// Terminal result delivered to a load callback.
pub type LoadOutcome = Result<Bitmap, ImageLoadError>;

/// Image load failure variants.
///
/// Cancellation is never represented here; superseded and cancelled
/// requests produce no outcome at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageLoadError {
    /// Network, timeout or DNS failure.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the underlying transport failure.
        message: String,
    },

    /// Non-2xx status or a payload that is not a decodable image.
    #[error("decode error (status {}): {message}", .status.map_or(UNKNOWN_STATUS, i32::from))]
    Decode {
        /// HTTP status if the response carried one.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },
}

fn status_label(status: Option<u16>) -> i32 {
    status.map_or(UNKNOWN_STATUS, i32::from)
}

impl ImageLoadError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Decode {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed response, or `-1` if unavailable.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Transport { .. } => UNKNOWN_STATUS,
            Self::Decode { status, .. } => status_label(*status),
        }
    }

    /// Returns whether error came from the transport.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
