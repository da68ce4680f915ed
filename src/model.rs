//! Per-card-instance state. Created at mount, destroyed at unmount; nothing
//! here is persisted. All mutation goes through `update()` in [`crate::app`].

use serde::{Deserialize, Serialize};

use crate::focus::FocusState;
use crate::geocode::{GeocodeScope, GeocodeState};
use crate::object_url::ObjectUrlCache;
use crate::record::{PartialRecord, Record};
use crate::{
    CardError, LatLon, RecordId, FALLBACK_MAP_CENTER, FALLBACK_MAP_ZOOM, FETCH_TIMEOUT_MS,
    FLIP_DURATION_MS, GEOCODE_DEBOUNCE_MS, GEOCODE_TIMEOUT_MS, PLACEHOLDER_IMAGE,
    RESOLVED_MAP_ZOOM,
};

/// Capability/config struct handed to the card by the embedding page.
/// Read-only after initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub record_base_url: String,
    pub geocode_base_url: String,
    pub geocode_scope: GeocodeScope,
    pub flip_duration_ms: u64,
    pub geocode_debounce_ms: u64,
    pub geocode_timeout_ms: u64,
    pub fetch_timeout_ms: u64,
    pub fallback_center: LatLon,
    pub fallback_zoom: f64,
    pub resolved_zoom: f64,
    pub placeholder_image: String,
    /// Set by preview/embedded contexts: the card must not navigate at all.
    pub navigation_disabled: bool,
    /// Global kill-switch for editing, independent of per-user permissions.
    pub editing_disabled: bool,
    pub permissions: Permissions,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            record_base_url: "https://portal.example/api".into(),
            geocode_base_url: "https://geocode.example".into(),
            geocode_scope: GeocodeScope::default(),
            flip_duration_ms: FLIP_DURATION_MS,
            geocode_debounce_ms: GEOCODE_DEBOUNCE_MS,
            geocode_timeout_ms: GEOCODE_TIMEOUT_MS,
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            fallback_center: FALLBACK_MAP_CENTER,
            fallback_zoom: FALLBACK_MAP_ZOOM,
            resolved_zoom: RESOLVED_MAP_ZOOM,
            placeholder_image: PLACEHOLDER_IMAGE.into(),
            navigation_disabled: false,
            editing_disabled: false,
            permissions: Permissions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    #[default]
    Overview,
    Description,
    Media,
    Location,
}

impl DetailTab {
    pub const ALL: [Self; 4] = [Self::Overview, Self::Description, Self::Media, Self::Location];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Description => "Description",
            Self::Media => "Media",
            Self::Location => "Location",
        }
    }
}

/// Correlates a flip-animation timer with the transition that started it.
/// Monotonic per card; a completion carrying an older token is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct FlipToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardUiState {
    pub flipped: bool,
    pub animating: bool,
    pub active_tab: DetailTab,
    pub quick_edit_visible: bool,
    pub image_error: bool,
    flip_token: FlipToken,
}

impl CardUiState {
    /// Start a flip. Returns the token for the animation-done timer, or
    /// `None` when a transition is already running; the call is dropped,
    /// not queued, so rapid input can never double-toggle.
    pub fn begin_flip(&mut self) -> Option<FlipToken> {
        if self.animating {
            return None;
        }
        self.flipped = !self.flipped;
        self.animating = true;
        self.flip_token = FlipToken(self.flip_token.0 + 1);
        Some(self.flip_token)
    }

    /// Close the animation window. A stale token is ignored.
    pub fn finish_flip(&mut self, token: FlipToken) -> bool {
        if self.animating && token == self.flip_token {
            self.animating = false;
            true
        } else {
            false
        }
    }

    /// Returns whether the active tab changed. Accepted in any flip state;
    /// the selection only becomes visible once flipped.
    pub fn select_tab(&mut self, tab: DetailTab) -> bool {
        if self.active_tab == tab {
            false
        } else {
            self.active_tab = tab;
            true
        }
    }

    pub fn set_quick_edit_visible(&mut self, visible: bool) {
        self.quick_edit_visible = visible;
    }

    /// One-way in practice (stays on the placeholder for the mount), but a
    /// plain setter so tests can reset it.
    pub fn set_image_error(&mut self, failed: bool) {
        self.image_error = failed;
    }

    #[must_use]
    pub const fn flip_token(&self) -> FlipToken {
        self.flip_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed(CardError),
}

impl LoadState {
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching)
    }

    #[must_use]
    pub const fn error(&self) -> Option<&CardError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.error().is_some_and(CardError::is_retryable)
    }
}

pub struct Model {
    pub config: CardConfig,
    pub record_id: RecordId,
    /// Last upstream payload, kept so a later fallback change re-merges.
    pub source: Option<PartialRecord>,
    /// Always fully populated; the view renders this directly.
    pub record: Record,
    pub load: LoadState,
    pub ui: CardUiState,
    pub focus: FocusState,
    pub geocode: GeocodeState,
    pub object_urls: ObjectUrlCache,
    /// Cleared at unmount; late async completions check this and bail.
    pub mounted: bool,
    /// Shell-side timer handles; semantic staleness lives in `FlipToken`
    /// and the geocode generation, this only keeps ids unique.
    pub timer_seq: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: CardConfig::default(),
            record_id: RecordId::new("unknown"),
            source: None,
            record: Record::fallback(),
            load: LoadState::Idle,
            ui: CardUiState::default(),
            focus: FocusState::default(),
            geocode: GeocodeState::default(),
            object_urls: ObjectUrlCache::default(),
            mounted: false,
            timer_seq: 0,
        }
    }
}

impl Model {
    #[must_use]
    pub fn can_quick_edit(&self) -> bool {
        self.config.permissions.can_edit && !self.config.editing_disabled
    }
}
