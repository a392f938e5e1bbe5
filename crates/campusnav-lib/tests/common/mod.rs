//! Common test utilities and fixture helpers.
//!
//! Provides the campus catalog, a saved two-route provider response, and a
//! scripted provider that records every query it receives.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campusnav_lib::position::FixResult;
use campusnav_lib::{
    parse_directions, ControllerHandle, Coordinates, Error, FeatureTable, LocationCatalog,
    NavigationController, Navigator, NavigatorConfig, PositionOptions, PositionSource,
    PositionStream, Result, RouteCandidate, RouteProvider, RouteQuery, TrackingHandle,
};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

#[allow(dead_code)]
pub fn catalog() -> Arc<LocationCatalog> {
    let path = fixtures_dir().join("campus_locations.json");
    Arc::new(LocationCatalog::from_path(&path).expect("load fixture campus_locations.json"))
}

#[allow(dead_code)]
pub fn two_routes_body() -> String {
    fs::read_to_string(fixtures_dir().join("ors_two_routes.geojson"))
        .expect("read fixture ors_two_routes.geojson")
}

/// One scripted provider answer.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Routes(Duration),
    Fail(Duration),
}

/// Provider that answers from the two-route fixture, following a script of
/// delays and failures, and records each query.
pub struct RecordingProvider {
    body: String,
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RouteQuery>>,
}

#[allow(dead_code)]
impl RecordingProvider {
    pub fn new() -> Arc<Self> {
        Self::scripted([])
    }

    /// Replies are consumed in call order; once exhausted, every call succeeds immediately.
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            body: two_routes_body(),
            script: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RouteQuery> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl RouteProvider for RecordingProvider {
    async fn request_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>> {
        self.calls.lock().expect("calls lock").push(query.clone());
        let reply = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Reply::Routes(Duration::ZERO));

        match reply {
            Reply::Routes(delay) => {
                tokio::time::sleep(delay).await;
                parse_directions(&self.body, query)
            }
            Reply::Fail(delay) => {
                tokio::time::sleep(delay).await;
                Err(Error::Provider {
                    status: 503,
                    message: "service unavailable".to_string(),
                })
            }
        }
    }
}

#[allow(dead_code)]
pub fn navigator() -> Navigator<FeatureTable> {
    let map = FeatureTable::mount(Some("map")).expect("mount map");
    Navigator::new(catalog(), map, &NavigatorConfig::default())
}

#[allow(dead_code)]
pub fn spawn(provider: Arc<RecordingProvider>) -> ControllerHandle<FeatureTable> {
    NavigationController::new(
        navigator(),
        provider,
        NavigatorConfig::default().debounce(),
    )
    .spawn()
}

#[allow(dead_code)]
pub fn spawn_tracking(
    provider: Arc<RecordingProvider>,
    stream: PositionStream,
    tracking: TrackingHandle,
) -> ControllerHandle<FeatureTable> {
    NavigationController::new(
        navigator(),
        provider,
        NavigatorConfig::default().debounce(),
    )
    .with_position(stream, tracking)
    .spawn()
}

/// Position source that walks east from Kennesaw Hall and counts every fix it produces.
#[allow(dead_code)]
pub struct CountingSource {
    remaining: usize,
    interval: Duration,
    emitted: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingSource {
    pub fn new(total: usize, interval: Duration) -> (Self, Arc<AtomicUsize>) {
        let emitted = Arc::new(AtomicUsize::new(0));
        let source = Self {
            remaining: total,
            interval,
            emitted: Arc::clone(&emitted),
        };
        (source, emitted)
    }
}

#[async_trait]
impl PositionSource for CountingSource {
    async fn next_fix(&mut self, _options: &PositionOptions) -> Option<FixResult> {
        if self.remaining == 0 {
            return None;
        }
        tokio::time::sleep(self.interval).await;
        self.remaining -= 1;
        let n = self.emitted.fetch_add(1, Ordering::SeqCst);
        Some(Ok(Coordinates::new(-84.5847 + n as f64 * 0.0001, 34.0379)))
    }
}
