//! The shell-facing view model. Everything the page needs to render both
//! card faces, wired so that accessibility state (tab order, listener
//! subscriptions, focus directives) always matches the flip state.

use serde::{Deserialize, Serialize};

use crate::focus::{FocusTarget, Subscriptions};
use crate::model::DetailTab;
use crate::record::{Badge, ContactBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFace {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeView {
    pub label: String,
    pub icon: String,
    pub color: String,
}

impl From<Badge> for BadgeView {
    fn from(badge: Badge) -> Self {
        Self {
            label: badge.label.into(),
            icon: badge.icon.into(),
            color: badge.color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
    pub person: String,
    pub phone: String,
    pub email: String,
    pub department: String,
    pub availability: String,
}

impl From<&ContactBlock> for ContactView {
    fn from(contact: &ContactBlock) -> Self {
        Self {
            person: contact.person.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            department: contact.department.clone(),
            availability: contact.availability.clone(),
        }
    }
}

/// An interactive element whose keyboard behavior the core dictates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlView {
    pub tab_index: i32,
    /// The shell must stop event propagation on activation so the front
    /// face's own click handler does not fire a second flip.
    pub stops_propagation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontFaceView {
    pub title: String,
    pub summary: String,
    /// Never an empty string: erroring or absent sources are substituted
    /// with the placeholder asset before this struct is built.
    pub image_url: String,
    pub image_is_placeholder: bool,
    pub category_badge: BadgeView,
    pub priority_badge: BadgeView,
    pub tags: Vec<String>,
    pub quick_edit_visible: bool,
    /// Delete is handled by the embedding page; the card only decides
    /// whether the affordance shows.
    pub quick_delete_visible: bool,
    pub details_control: ControlView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabView {
    pub tab: DetailTab,
    pub active: bool,
    pub tab_index: i32,
}

impl TabView {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.tab.label()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackFaceView {
    pub tabs: Vec<TabView>,
    pub content: TabContentView,
    pub close_tab_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItemView {
    pub url: String,
    pub is_local_preview: bool,
    /// Local preview whose display URL the shell has not minted yet.
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabContentView {
    Overview {
        short_description: String,
        features: String,
        category_badge: BadgeView,
        priority_badge: BadgeView,
        contact: ContactView,
    },
    Description {
        long_description: String,
    },
    Media {
        items: Vec<MediaItemView>,
    },
    Location {
        location: LocationView,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LocationView {
    /// The record has neither an address nor coordinates.
    NoData,
    /// A lookup is debouncing or on the wire.
    Pending { address: Option<String> },
    Resolved {
        lat: f64,
        lon: f64,
        zoom: f64,
        display_address: String,
    },
    /// Lookup failed; the map centers on the configured fallback.
    Fallback { lat: f64, lon: f64, zoom: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPanelView {
    pub title: String,
    pub message: String,
    pub can_retry: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub face: CardFace,
    pub animating: bool,
    pub flip_duration_ms: u64,
    pub front: FrontFaceView,
    pub back: BackFaceView,
    pub error: Option<ErrorPanelView>,
    pub is_loading: bool,
    pub subscriptions: Subscriptions,
    pub focus: Option<FocusTarget>,
}
