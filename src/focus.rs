//! Keyboard and focus policy for the flip interaction. The shell owns the
//! real DOM focus; this module owns the decisions (which elements are in
//! the tab order, which listeners are attached, where focus goes after a
//! transition) so they stay testable without a browser.

use serde::{Deserialize, Serialize};

use crate::model::CardUiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Other,
}

/// What caused a flip request. Open gestures act only on the front face,
/// dismiss gestures only on the back; `update()` enforces the direction so
/// a stray event can never toggle the wrong way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipTrigger {
    DetailsControl,
    FrontFace,
    CloseControl,
    EscapeKey,
    OutsideClick,
    PageScroll,
    HistoryNavigation,
}

impl FlipTrigger {
    #[must_use]
    pub const fn is_open_gesture(self) -> bool {
        matches!(self, Self::DetailsControl | Self::FrontFace)
    }

    #[must_use]
    pub const fn is_dismiss_gesture(self) -> bool {
        !self.is_open_gesture()
    }

    /// Keyboard-driven dismissals return focus to the control that opened
    /// the back face; pointer-driven ones leave focus where the user put it.
    #[must_use]
    pub const fn restores_focus(self) -> bool {
        matches!(self, Self::EscapeKey | Self::CloseControl)
    }
}

/// Where the shell should move focus after the current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    /// The "show details" control on the front face.
    DetailsControl,
    /// Into the back face (start of its tab cycle).
    BackFace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FocusState {
    /// Pending focus directive, replaced on each flip transition.
    pub directive: Option<FocusTarget>,
}

impl FocusState {
    pub fn on_flip(&mut self, now_flipped: bool, trigger: FlipTrigger) {
        self.directive = if now_flipped {
            Some(FocusTarget::BackFace)
        } else if trigger.restores_focus() {
            Some(FocusTarget::DetailsControl)
        } else {
            None
        };
    }
}

/// Translate a raw key press into a flip trigger, if any. Escape only acts
/// while the back face is showing.
#[must_use]
pub fn map_key(key: Key, flipped: bool) -> Option<FlipTrigger> {
    match key {
        Key::Escape if flipped => Some(FlipTrigger::EscapeKey),
        _ => None,
    }
}

/// Whether a key press on the details control activates it, mirroring a
/// pointer click. The control handles these itself; its activation must not
/// bubble into the front face's own click handler.
#[must_use]
pub const fn activates_details_control(key: Key) -> bool {
    matches!(key, Key::Enter | Key::Space)
}

/// Tab index for interactive elements inside the back face: reachable only
/// while flipped.
#[must_use]
pub const fn back_face_tab_index(flipped: bool) -> i32 {
    if flipped {
        0
    } else {
        -1
    }
}

/// Tab index for front-face controls: excluded from the tab order while
/// the back face is showing, completing the focus trap.
#[must_use]
pub const fn front_face_tab_index(flipped: bool) -> i32 {
    if flipped {
        -1
    } else {
        0
    }
}

/// Which document-level listeners the shell should have attached right now.
/// All of them exist only to dismiss the back face, so they are attached
/// while flipped and removed on flip-back or unmount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Subscriptions {
    pub escape_key: bool,
    pub outside_click: bool,
    pub scroll_dismiss: bool,
    pub history_dismiss: bool,
}

impl Subscriptions {
    #[must_use]
    pub const fn for_state(ui: &CardUiState) -> Self {
        Self {
            escape_key: ui.flipped,
            outside_click: ui.flipped,
            scroll_dismiss: ui.flipped,
            history_dismiss: ui.flipped,
        }
    }
}
