//! Navigation state machine.
//!
//! [`Navigator`] owns the query inputs, the [`CandidateStore`], and the
//! [`NavigationSession`], and is the only component that talks to the map.
//! It performs no I/O and never waits: the [`controller`](crate::controller)
//! decides *when* to evaluate queries and feeds provider results back in.
//!
//! ```text
//! Idle ──routes──▶ CandidatesOpen ──confirm──▶ RouteActive
//!  ▲                    │                         │
//!  └──query invalid─────┘◀────cancel / arrive─────┘
//! ```
//!
//! Precondition failures are returned as [`Rejection`]s and leave every piece
//! of state untouched.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::candidates::{BookmarkEntry, BookmarkToggle, CandidateStore};
use crate::config::NavigatorConfig;
use crate::error::Error;
use crate::location::{is_current_location, Coordinates, LocationCatalog};
use crate::map::{
    BaseLayer, BoundingBox, FeatureKey, FeatureKind, FitOptions, MapAdapter, MapError, PointStyle,
};
use crate::route::{RouteCandidate, RouteQuery, TravelMode, TurnStep};

/// Label used for an origin taken from the live position.
pub const CURRENT_LOCATION_LABEL: &str = "My Location";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavState {
    #[default]
    Idle,
    CandidatesOpen,
    RouteActive,
}

/// Presentation of the turn-by-turn list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepView {
    #[default]
    AllSteps,
    OneAtATime,
}

impl StepView {
    pub fn toggled(self) -> Self {
        match self {
            StepView::AllSteps => StepView::OneAtATime,
            StepView::OneAtATime => StepView::AllSteps,
        }
    }
}

/// A refused transition. The message is meant for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    #[error("Please select a route to start.")]
    NoSelection,
    #[error("Unable to determine your current location. Please enter a start location.")]
    NoOrigin,
    #[error("Please enter a valid end location")]
    NoDestination,
    #[error("Route {} is not one of the current options.", .0 + 1)]
    UnknownRoute(usize),
    #[error("There is no active route.")]
    NotNavigating,
    #[error("The routes shown are for a different trip. Please wait for updated routes.")]
    RoutesOutdated,
}

/// Turn-by-turn progress along the confirmed route.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NavigationSession {
    pub active_candidate_id: Option<usize>,
    pub steps: Vec<TurnStep>,
    /// Index into `steps`; always 0 when `steps` is empty.
    pub step_cursor: usize,
    pub mode: TravelMode,
    pub is_active: bool,
    pub destination_label: String,
}

impl NavigationSession {
    fn idle(mode: TravelMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn current_step(&self) -> Option<&TurnStep> {
        self.steps.get(self.step_cursor)
    }

    fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// Text fields, travel mode, and live fix that a route query is built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryInputs {
    pub origin_text: String,
    pub destination_text: String,
    pub mode: TravelMode,
    pub live_fix: Option<Coordinates>,
}

/// Acknowledgment surfaced to the user on arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub destination_label: String,
}

impl std::fmt::Display for Arrival {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "You have arrived at {}.", self.destination_label)
    }
}

/// Read-only view of the navigator published to renderers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NavigationSnapshot {
    pub state: NavState,
    pub inputs: QueryInputs,
    pub panel_open: bool,
    pub candidates: Vec<RouteCandidate>,
    pub selected_id: Option<usize>,
    pub preview_id: Option<usize>,
    pub session: NavigationSession,
    pub step_view: StepView,
    pub bookmarks: Vec<BookmarkEntry>,
    pub base_layer: BaseLayer,
}

pub struct Navigator<M: MapAdapter> {
    catalog: Arc<LocationCatalog>,
    map: M,
    fit: FitOptions,
    initial_center: Coordinates,
    initial_zoom: f64,
    inputs: QueryInputs,
    store: CandidateStore,
    /// Query the stored candidates answer.
    results_query: Option<RouteQuery>,
    session: NavigationSession,
    state: NavState,
    step_view: StepView,
    base_layer: BaseLayer,
}

fn render(operation: &str, result: Result<(), MapError>) {
    if let Err(error) = result {
        warn!(%error, operation, "map update failed");
    }
}

impl<M: MapAdapter> Navigator<M> {
    pub fn new(catalog: Arc<LocationCatalog>, map: M, config: &NavigatorConfig) -> Self {
        Self {
            catalog,
            map,
            fit: config.fit_options(),
            initial_center: config.initial_center,
            initial_zoom: config.initial_zoom(),
            inputs: QueryInputs::default(),
            store: CandidateStore::new(),
            results_query: None,
            session: NavigationSession::default(),
            state: NavState::Idle,
            step_view: StepView::AllSteps,
            base_layer: BaseLayer::Standard,
        }
    }

    /// Centre the map on campus and draw a reference marker per location.
    pub fn initialize(&mut self) {
        render(
            "center",
            self.map
                .set_center(self.initial_center, Some(self.initial_zoom)),
        );
        render("base layer", self.map.set_base_layer(self.base_layer));
        for (index, location) in self.catalog.iter().enumerate() {
            render(
                "accessibility marker",
                self.map.upsert_point(
                    FeatureKey::accessibility(index as u32),
                    location.coordinates,
                    PointStyle::AccessibilityIcon,
                ),
            );
        }
        debug!(markers = self.catalog.len(), "map initialized");
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn inputs(&self) -> &QueryInputs {
        &self.inputs
    }

    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    pub fn catalog(&self) -> &LocationCatalog {
        &self.catalog
    }

    pub fn step_view(&self) -> StepView {
        self.step_view
    }

    pub fn base_layer(&self) -> BaseLayer {
        self.base_layer
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn current_step(&self) -> Option<&TurnStep> {
        self.session.current_step()
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            state: self.state,
            inputs: self.inputs.clone(),
            panel_open: self.store.is_panel_open(),
            candidates: self.store.candidates().to_vec(),
            selected_id: self.store.selected_id(),
            preview_id: self.store.preview_id(),
            session: self.session.clone(),
            step_view: self.step_view,
            bookmarks: self.store.bookmarks().to_vec(),
            base_layer: self.base_layer,
        }
    }

    // ---------------------------------------------------------------------
    // Query inputs. Each setter reports whether the change should schedule a
    // fresh (debounced) query evaluation.
    // ---------------------------------------------------------------------

    pub fn set_origin_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.inputs.origin_text == text {
            return false;
        }
        self.inputs.origin_text = text;
        self.accepts_queries()
    }

    pub fn set_destination_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.inputs.destination_text == text {
            return false;
        }
        self.inputs.destination_text = text;
        self.accepts_queries()
    }

    pub fn set_mode(&mut self, mode: TravelMode) -> bool {
        if self.inputs.mode == mode {
            return false;
        }
        self.inputs.mode = mode;
        if !self.session.is_active {
            self.session.mode = mode;
        }
        self.accepts_queries()
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.set_mode(self.inputs.mode.toggled())
    }

    /// Record a live fix, move the position marker, and follow it.
    pub fn on_position_fix(&mut self, fix: Coordinates) -> bool {
        self.inputs.live_fix = Some(fix);
        render(
            "user location",
            self.map
                .upsert_point(FeatureKey::USER_LOCATION, fix, PointStyle::UserLocation),
        );
        render("center", self.map.set_center(fix, None));

        self.accepts_queries() && is_current_location(&self.inputs.origin_text)
    }

    fn accepts_queries(&self) -> bool {
        self.state != NavState::RouteActive
    }

    fn resolve_origin(&self) -> Option<(Coordinates, String)> {
        if is_current_location(&self.inputs.origin_text) {
            return self
                .inputs
                .live_fix
                .map(|fix| (fix, CURRENT_LOCATION_LABEL.to_string()));
        }
        self.catalog
            .find(&self.inputs.origin_text)
            .map(|loc| (loc.coordinates, loc.name.clone()))
    }

    fn resolve_destination(&self) -> Option<(Coordinates, String)> {
        self.catalog
            .find(&self.inputs.destination_text)
            .map(|loc| (loc.coordinates, loc.name.clone()))
    }

    /// The query the current inputs describe, if both ends resolve.
    pub fn pending_query(&self) -> Option<RouteQuery> {
        let (destination, destination_label) = self.resolve_destination()?;
        let (origin, origin_label) = self.resolve_origin()?;
        Some(RouteQuery {
            origin,
            destination,
            mode: self.inputs.mode,
            origin_label,
            destination_label,
        })
    }

    /// Evaluate the inputs after the quiescence window.
    ///
    /// An incomplete query clears the candidate set and closes the panel.
    /// Nothing is evaluated while a route is active.
    pub fn evaluate_query(&mut self) -> Option<RouteQuery> {
        if !self.accepts_queries() {
            return None;
        }
        let query = self.pending_query();
        if query.is_none() {
            debug!("route query incomplete; clearing candidates");
            self.discard_candidates();
        }
        query
    }

    fn discard_candidates(&mut self) {
        self.store.clear_preview(&mut self.map);
        self.store.clear();
        self.results_query = None;
        if self.state == NavState::CandidatesOpen {
            self.state = NavState::Idle;
        }
    }

    /// Install the provider's answer to `query`. Returns `true` if the panel opened.
    pub fn apply_routes(&mut self, query: RouteQuery, candidates: Vec<RouteCandidate>) -> bool {
        if !self.accepts_queries() {
            debug!("ignoring route candidates while a route is active");
            return false;
        }
        if candidates.is_empty() {
            self.discard_candidates();
            return false;
        }
        self.store.clear_preview(&mut self.map);
        self.store.replace(candidates);
        self.results_query = Some(query);
        self.state = NavState::CandidatesOpen;
        true
    }

    /// Drop any stale candidates after a failed provider call.
    pub fn route_failed(&mut self, error: &Error) {
        warn!(%error, "route calculation failed");
        if self.accepts_queries() {
            self.discard_candidates();
        }
    }

    // ---------------------------------------------------------------------
    // Candidate panel
    // ---------------------------------------------------------------------

    pub fn select(&mut self, id: usize) -> Result<(), Rejection> {
        if self.store.select(id) {
            Ok(())
        } else {
            Err(Rejection::UnknownRoute(id))
        }
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    /// Draw the hover line for `id`. Only candidates on an open panel can be previewed.
    pub fn preview(&mut self, id: usize) -> Result<(), Rejection> {
        if self.state != NavState::CandidatesOpen || self.store.get(id).is_none() {
            return Err(Rejection::UnknownRoute(id));
        }
        self.store.preview(id, &mut self.map);
        Ok(())
    }

    pub fn clear_preview(&mut self) {
        self.store.clear_preview(&mut self.map);
    }

    pub fn toggle_bookmark(&mut self, id: usize) -> Result<BookmarkToggle, Rejection> {
        let candidate = self
            .store
            .get(id)
            .cloned()
            .ok_or(Rejection::UnknownRoute(id))?;
        Ok(self.store.toggle_bookmark(&candidate))
    }

    // ---------------------------------------------------------------------
    // Route lifecycle
    // ---------------------------------------------------------------------

    /// Start navigating the selected candidate.
    ///
    /// Markers and viewport follow the endpoints the candidates were computed
    /// for. If the inputs now describe a different trip, the confirmation is
    /// refused until the refreshed candidates arrive.
    pub fn confirm_selection(&mut self) -> Result<(), Rejection> {
        if self.state != NavState::CandidatesOpen {
            return Err(Rejection::NoSelection);
        }
        let candidate = self.store.selected().cloned().ok_or(Rejection::NoSelection)?;
        let (_, origin_label) = self.resolve_origin().ok_or(Rejection::NoOrigin)?;
        let (_, destination_label) = self.resolve_destination().ok_or(Rejection::NoDestination)?;
        let query = self
            .results_query
            .clone()
            .ok_or(Rejection::RoutesOutdated)?;
        if query.origin_label != origin_label
            || query.destination_label != destination_label
            || query.mode != self.inputs.mode
        {
            return Err(Rejection::RoutesOutdated);
        }
        let RouteQuery {
            origin,
            destination,
            destination_label,
            ..
        } = query;

        self.clear_route_features();
        self.store.clear_preview(&mut self.map);

        render(
            "start marker",
            self.map
                .upsert_point(FeatureKey::START_MARKER, origin, PointStyle::Start),
        );
        render(
            "end marker",
            self.map
                .upsert_point(FeatureKey::END_MARKER, destination, PointStyle::End),
        );
        render(
            "fit",
            self.map
                .fit_bounds(BoundingBox::spanning(origin, destination), &self.fit),
        );
        render(
            "route line",
            self.map.draw_line(
                FeatureKey::ROUTE_LINE,
                &candidate.path,
                &candidate.mode.line_style(),
            ),
        );

        info!(
            route = candidate.id,
            steps = candidate.steps.len(),
            mode = %candidate.mode,
            destination = %destination_label,
            "navigation started"
        );

        self.session = NavigationSession {
            active_candidate_id: Some(candidate.id),
            steps: candidate.steps,
            step_cursor: 0,
            mode: candidate.mode,
            is_active: true,
            destination_label,
        };
        self.step_view = StepView::AllSteps;
        self.store.close_panel();
        self.state = NavState::RouteActive;
        Ok(())
    }

    /// Abandon whatever is in progress and return to `Idle`.
    ///
    /// Accessibility and live-position markers stay on the map.
    pub fn cancel(&mut self) {
        self.clear_route_features();
        self.store.clear_preview(&mut self.map);
        self.store.clear();
        self.results_query = None;
        self.session = NavigationSession::idle(self.inputs.mode);
        self.step_view = StepView::AllSteps;
        self.inputs.origin_text.clear();
        self.inputs.destination_text.clear();
        if self.state != NavState::Idle {
            debug!(from = ?self.state, "navigation reset");
        }
        self.state = NavState::Idle;
    }

    pub fn arrive(&mut self) -> Result<Arrival, Rejection> {
        if self.state != NavState::RouteActive {
            return Err(Rejection::NotNavigating);
        }
        let arrival = Arrival {
            destination_label: self.session.destination_label.clone(),
        };
        info!(destination = %arrival.destination_label, "arrived");
        self.cancel();
        Ok(arrival)
    }

    fn clear_route_features(&mut self) {
        render("clear markers", self.map.remove_kind(FeatureKind::Marker));
        render("clear route", self.map.remove_kind(FeatureKind::RouteLine));
    }

    // ---------------------------------------------------------------------
    // Turn-by-turn
    // ---------------------------------------------------------------------

    /// Move to the next step. No-op on the last step.
    pub fn advance_step(&mut self) -> bool {
        if self.session.step_cursor < self.session.last_index() {
            self.session.step_cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous step. No-op on the first step.
    pub fn retreat_step(&mut self) -> bool {
        if self.session.step_cursor > 0 {
            self.session.step_cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn toggle_step_view(&mut self) -> StepView {
        self.step_view = self.step_view.toggled();
        self.step_view
    }

    pub fn toggle_base_layer(&mut self) -> BaseLayer {
        self.base_layer = self.base_layer.toggled();
        render("base layer", self.map.set_base_layer(self.base_layer));
        self.base_layer
    }
}
