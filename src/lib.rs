#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod focus;
pub mod geocode;
pub mod model;
pub mod object_url;
pub mod record;
pub mod view;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;

/// Duration of the front/back flip transition. The `animating` guard in
/// [`model::CardUiState`] holds for exactly this window.
pub const FLIP_DURATION_MS: u64 = 500;
/// Wait after an address first becomes known before issuing a lookup, so
/// rapid upstream data changes don't fan out into wasted requests.
pub const GEOCODE_DEBOUNCE_MS: u64 = 3_000;
pub const GEOCODE_TIMEOUT_MS: u64 = 10_000;
pub const FETCH_TIMEOUT_MS: u64 = 30_000;
pub const GEOCODE_CACHE_CAPACITY: usize = 16;
pub const GEOCODE_RESULT_LIMIT: u8 = 1;
pub const DESCRIPTION_PREVIEW_LENGTH: usize = 120;
pub const PLACEHOLDER_IMAGE: &str = "/assets/img/record-placeholder.svg";

/// Map center shown when an address cannot be resolved.
pub const FALLBACK_MAP_CENTER: LatLon = LatLon {
    lat: 48.7758,
    lon: 9.1829,
};
pub const FALLBACK_MAP_ZOOM: f64 = 11.0;
pub const RESOLVED_MAP_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Worth retrying: the condition is expected to clear on its own.
    Transient,
    /// Retrying cannot help; the user gets a terminal message instead.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    RateLimited,
    Server,
    NotFound,
    Deserialization,
    Cancelled,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server => {
                ErrorSeverity::Transient
            }
            Self::NotFound | Self::Deserialization | Self::Cancelled | Self::Unknown => {
                ErrorSeverity::Fatal
            }
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server
        )
    }
}

/// The error the card surfaces for a failed record fetch. Geocoding and
/// image failures never become a `CardError`; they degrade silently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl CardError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && matches!(self.severity, ErrorSeverity::Transient)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::RateLimited => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            ErrorKind::Server => {
                "The server could not process the request. Please try again later.".into()
            }
            ErrorKind::NotFound => {
                "This record could not be found. It may have been removed.".into()
            }
            ErrorKind::Deserialization => {
                "The record data could not be read. Please contact support if this persists."
                    .into()
            }
            ErrorKind::Cancelled => "The request was cancelled.".into(),
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.".into(),
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            404 | 410 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message)
    }
}

impl std::fmt::Display for CardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for CardError {}

impl From<&capabilities::HttpError> for CardError {
    fn from(e: &capabilities::HttpError) -> Self {
        use capabilities::HttpError;
        let kind = match e {
            HttpError::Timeout { .. } => ErrorKind::Timeout,
            HttpError::Dns { .. } | HttpError::Connection { .. } | HttpError::Tls { .. } => {
                ErrorKind::Network
            }
            HttpError::Cancelled { .. } => ErrorKind::Cancelled,
            HttpError::InvalidResponse { .. } => ErrorKind::Deserialization,
            _ => ErrorKind::Unknown,
        };
        Self::new(kind, e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(String),
    #[error("longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(String),
    #[error("coordinate value is not finite")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat.to_string()));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon.to_string()));
        }
        Ok(Self { lat, lon })
    }
}

/// Explicit timestamp unit, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn elapsed_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a locally selected binary (a handle, never the bytes).
/// Object-URL bookkeeping keys on this, so "same handle" means "same id"
/// rather than "same content".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl BlobId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
