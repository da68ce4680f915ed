//! Everything that can happen to a mounted card: shell gestures, upstream
//! data arrivals, and async completions coming back from capabilities.
//! Completion payloads are boxed to keep the enum small.

use crate::capabilities::HttpResult;
use crate::focus::FlipTrigger;
use crate::model::{DetailTab, FlipToken};
use crate::record::PartialRecord;
use crate::{BlobId, RecordId};

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    /// The card entered the page. `record` carries upstream data when the
    /// embedding page already has it; otherwise the card fetches itself.
    Mounted {
        id: RecordId,
        record: Option<Box<PartialRecord>>,
    },
    /// Upstream delivered (new) record data after mount.
    RecordDataArrived { record: Box<PartialRecord> },
    Unmounted,

    FetchRequested,
    FetchResponse(Box<HttpResult>),
    /// User clicked the retry affordance. Exactly one re-fetch per click,
    /// never issued automatically.
    RetryRequested,

    FlipRequested { trigger: FlipTrigger },
    FlipAnimationDone { token: FlipToken },
    TabSelected(DetailTab),

    PointerEntered,
    PointerExited,
    ImageLoadFailed,

    GeocodeDebounceElapsed { generation: u64 },
    GeocodeResponse {
        key: String,
        result: Box<HttpResult>,
    },

    ObjectUrlCreated { blob_id: BlobId, url: String },
    LocalPreviewDiscarded { blob_id: BlobId },

    OpenRecordRequested,
    QuickEditRequested,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::Mounted { .. } => "mounted",
            Self::RecordDataArrived { .. } => "record_data_arrived",
            Self::Unmounted => "unmounted",
            Self::FetchRequested => "fetch_requested",
            Self::FetchResponse(_) => "fetch_response",
            Self::RetryRequested => "retry_requested",
            Self::FlipRequested { .. } => "flip_requested",
            Self::FlipAnimationDone { .. } => "flip_animation_done",
            Self::TabSelected(_) => "tab_selected",
            Self::PointerEntered => "pointer_entered",
            Self::PointerExited => "pointer_exited",
            Self::ImageLoadFailed => "image_load_failed",
            Self::GeocodeDebounceElapsed { .. } => "geocode_debounce_elapsed",
            Self::GeocodeResponse { .. } => "geocode_response",
            Self::ObjectUrlCreated { .. } => "object_url_created",
            Self::LocalPreviewDiscarded { .. } => "local_preview_discarded",
            Self::OpenRecordRequested => "open_record_requested",
            Self::QuickEditRequested => "quick_edit_requested",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RetryRequested
                | Self::FlipRequested { .. }
                | Self::TabSelected(_)
                | Self::PointerEntered
                | Self::PointerExited
                | Self::LocalPreviewDiscarded { .. }
                | Self::OpenRecordRequested
                | Self::QuickEditRequested
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}
