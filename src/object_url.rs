//! Bookkeeping for shell-minted display URLs. One URL per blob handle,
//! keyed by handle identity, with the full set released exactly once at
//! unmount. Leaking one of these leaks a browser-level resource.

use std::collections::{HashMap, HashSet};

use crate::record::MediaRef;
use crate::BlobId;

#[derive(Debug, Default)]
pub struct ObjectUrlCache {
    urls: HashMap<BlobId, String>,
    /// Creation requested from the shell but not yet answered. Guards
    /// against asking twice for the same handle across renders.
    pending: HashSet<BlobId>,
}

impl ObjectUrlCache {
    /// Display URL for a media reference. Remote URLs pass through
    /// untouched; they are already URLs and never enter the cache.
    #[must_use]
    pub fn display_url<'a>(&'a self, media: &'a MediaRef) -> Option<&'a str> {
        match media {
            MediaRef::Remote { url } => Some(url.as_str()),
            MediaRef::Local { blob } => self.urls.get(&blob.id).map(String::as_str),
        }
    }

    /// Whether a creation request should be issued for this handle.
    #[must_use]
    pub fn needs_url(&self, id: &BlobId) -> bool {
        !self.urls.contains_key(id) && !self.pending.contains(id)
    }

    pub fn mark_pending(&mut self, id: BlobId) {
        self.pending.insert(id);
    }

    /// Record the URL the shell minted. Idempotent: if a URL already exists
    /// for the handle, the first one wins and the newcomer is returned so
    /// the caller can revoke it instead of leaking it.
    pub fn insert(&mut self, id: BlobId, url: String) -> Option<String> {
        self.pending.remove(&id);
        if self.urls.contains_key(&id) {
            return Some(url);
        }
        self.urls.insert(id, url);
        None
    }

    /// Release one handle (e.g. removed from the media gallery), returning
    /// its URL for revocation.
    pub fn release(&mut self, id: &BlobId) -> Option<String> {
        self.pending.remove(id);
        self.urls.remove(id)
    }

    /// Release everything at unmount. Returns exactly the URLs that were
    /// created, no more and no fewer.
    pub fn release_all(&mut self) -> Vec<String> {
        self.pending.clear();
        self.urls.drain().map(|(_, url)| url).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
