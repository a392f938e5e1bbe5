//! Route candidate store: the current ranked alternatives, the user's
//! selection, the hover preview, and session bookmarks.

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::map::{FeatureKey, LineStyle, MapAdapter};
use crate::route::{RouteCandidate, TravelMode};

/// Session-unique bookmark identifier, independent of a candidate's rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BookmarkId(Uuid);

impl BookmarkId {
    fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A retained copy of a candidate route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookmarkEntry {
    pub id: BookmarkId,
    pub route: RouteCandidate,
}

impl BookmarkEntry {
    pub fn origin_label(&self) -> &str {
        &self.route.origin_label
    }

    pub fn destination_label(&self) -> &str {
        &self.route.destination_label
    }

    pub fn mode(&self) -> TravelMode {
        self.route.mode
    }
}

/// Result of [`CandidateStore::toggle_bookmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "lowercase")]
pub enum BookmarkToggle {
    Added(BookmarkId),
    Removed(BookmarkId),
}

#[derive(Debug, Clone, Default)]
pub struct CandidateStore {
    candidates: Vec<RouteCandidate>,
    selected: Option<usize>,
    panel_open: bool,
    preview: Option<usize>,
    bookmarks: Vec<BookmarkEntry>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[RouteCandidate] {
        &self.candidates
    }

    pub fn get(&self, id: usize) -> Option<&RouteCandidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }

    pub fn selected_id(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&RouteCandidate> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn preview_id(&self) -> Option<usize> {
        self.preview
    }

    pub fn bookmarks(&self) -> &[BookmarkEntry] {
        &self.bookmarks
    }

    /// Replace the whole result set. A non-empty set opens the panel with rank 0 selected.
    pub fn replace(&mut self, candidates: Vec<RouteCandidate>) {
        if candidates.is_empty() {
            self.clear();
            return;
        }
        debug!(count = candidates.len(), "storing route candidates");
        self.selected = candidates.first().map(|candidate| candidate.id);
        self.candidates = candidates;
        self.panel_open = true;
    }

    /// Drop the result set and selection and close the panel. Bookmarks are kept.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.selected = None;
        self.panel_open = false;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    /// Choose a candidate. Returns `false` if no candidate has that id.
    pub fn select(&mut self, id: usize) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Draw the low-emphasis hover line for `id`, replacing any earlier preview.
    pub fn preview<M: MapAdapter + ?Sized>(&mut self, id: usize, map: &mut M) -> bool {
        let Some(candidate) = self.get(id) else {
            return false;
        };
        if let Err(error) = map.draw_line(FeatureKey::PREVIEW, &candidate.path, &LineStyle::PREVIEW) {
            warn!(%error, route = id, "failed to draw route preview");
            return false;
        }
        self.preview = Some(id);
        true
    }

    pub fn clear_preview<M: MapAdapter + ?Sized>(&mut self, map: &mut M) {
        if self.preview.take().is_some() {
            if let Err(error) = map.remove(FeatureKey::PREVIEW) {
                warn!(%error, "failed to remove route preview");
            }
        }
    }

    /// Add a bookmark for `candidate`, or remove the existing one for the same route.
    pub fn toggle_bookmark(&mut self, candidate: &RouteCandidate) -> BookmarkToggle {
        if let Some(index) = self
            .bookmarks
            .iter()
            .position(|entry| entry.route.same_route(candidate))
        {
            let entry = self.bookmarks.remove(index);
            debug!(bookmark = %entry.id, "bookmark removed");
            return BookmarkToggle::Removed(entry.id);
        }

        let id = BookmarkId::generate();
        self.bookmarks.push(BookmarkEntry {
            id,
            route: candidate.clone(),
        });
        debug!(bookmark = %id, "bookmark added");
        BookmarkToggle::Added(id)
    }

    pub fn is_bookmarked(&self, candidate: &RouteCandidate) -> bool {
        self.bookmarks
            .iter()
            .any(|entry| entry.route.same_route(candidate))
    }
}
