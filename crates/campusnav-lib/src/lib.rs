//! Campus navigation library entry points.
//!
//! This crate resolves campus place names, requests accessible route
//! alternatives from a directions provider, and drives the navigation state
//! machine (candidate selection, turn-by-turn progress, cancel and arrival)
//! against an abstract map surface. Front ends (the CLI, or any other
//! renderer) should depend on the items exported here instead of
//! reimplementing behavior.
//!

pub mod candidates;
pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod map;
pub mod navigation;
pub mod position;
pub mod provider;
pub mod route;

pub use candidates::{BookmarkEntry, BookmarkId, BookmarkToggle, CandidateStore};
pub use config::NavigatorConfig;
pub use controller::{Command, ControllerHandle, NavigationController, Notice};
pub use error::{Error, Result};
pub use location::{is_current_location, Coordinates, Location, LocationCatalog};
pub use map::{BaseLayer, FeatureKey, FeatureKind, FeatureTable, MapAdapter, MapError};
pub use navigation::{
    Arrival, NavState, NavigationSession, NavigationSnapshot, Navigator, QueryInputs, Rejection,
    StepView,
};
pub use position::{
    start_tracking, PositionError, PositionOptions, PositionSource, PositionStream,
    ReplayPositionSource, TrackingHandle, UnavailablePositionSource,
};
pub use provider::{parse_directions, FixtureRouteProvider, OrsDirectionsClient, RouteProvider};
pub use route::{maneuver_name, RouteCandidate, RouteQuery, TravelMode, TurnStep};
