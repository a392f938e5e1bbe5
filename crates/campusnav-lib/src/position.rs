//! Live device position tracking.
//!
//! A [`PositionSource`] yields fixes one at a time. [`start_tracking`] runs a
//! source on its own task and forwards fixes to a [`PositionStream`]; the
//! returned [`TrackingHandle`] must be cancelled (or dropped) on teardown so
//! the subscription does not outlive the navigation view.
//!
//! Any failure (no capability, permission denied, fix timeout) is logged and
//! ends the subscription. It never surfaces as a navigation error.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::location::Coordinates;

/// Subscription options passed to the platform position API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may return. Zero means always fresh.
    pub maximum_age: Duration,
    /// How long a single fix attempt may take.
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Reasons a position fix could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("geolocation is not supported on this platform")]
    Unsupported,
    #[error("permission to read the device location was denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out waiting for a position fix")]
    Timeout,
}

/// Outcome of a single fix attempt.
pub type FixResult = std::result::Result<Coordinates, PositionError>;

/// A device (or simulated) location provider.
#[async_trait]
pub trait PositionSource: Send + 'static {
    /// Wait for the next fix. `None` means the source has nothing more to report.
    async fn next_fix(&mut self, options: &PositionOptions) -> Option<FixResult>;
}

/// Receiving end of a tracking subscription.
#[derive(Debug)]
pub struct PositionStream {
    receiver: mpsc::Receiver<Coordinates>,
}

impl PositionStream {
    /// Next fix, or `None` once tracking has stopped.
    pub async fn recv(&mut self) -> Option<Coordinates> {
        self.receiver.recv().await
    }
}

/// Cancellation handle for a tracking subscription. Dropping it also cancels.
#[derive(Debug)]
pub struct TrackingHandle {
    task: Option<JoinHandle<()>>,
}

impl TrackingHandle {
    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("position tracking cancelled");
        }
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Start forwarding fixes from `source` until it fails, runs dry, or is cancelled.
pub fn start_tracking<S: PositionSource>(
    mut source: S,
    options: PositionOptions,
) -> (PositionStream, TrackingHandle) {
    let (sender, receiver) = mpsc::channel(16);

    let task = tokio::spawn(async move {
        loop {
            let fix = match tokio::time::timeout(options.timeout, source.next_fix(&options)).await
            {
                Ok(Some(fix)) => fix,
                Ok(None) => {
                    debug!("position source exhausted");
                    break;
                }
                Err(_) => Err(PositionError::Timeout),
            };

            match fix {
                Ok(coordinates) => {
                    if sender.send(coordinates).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "position tracking stopped");
                    break;
                }
            }
        }
    });

    (
        PositionStream { receiver },
        TrackingHandle { task: Some(task) },
    )
}

/// Replays a fixed list of fixes at a constant interval.
#[derive(Debug, Clone)]
pub struct ReplayPositionSource {
    fixes: VecDeque<Coordinates>,
    interval: Duration,
}

impl ReplayPositionSource {
    pub fn new(fixes: impl IntoIterator<Item = Coordinates>, interval: Duration) -> Self {
        Self {
            fixes: fixes.into_iter().collect(),
            interval,
        }
    }

    /// Read `lon,lat` pairs, one per line. Blank lines and `#` comments are skipped.
    pub fn from_path(path: &Path, interval: Duration) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut fixes = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            fixes.push(parse_fix(line).ok_or_else(|| {
                Error::Geolocation(PositionError::Unavailable(format!(
                    "line {} of {} is not a lon,lat pair",
                    index + 1,
                    path.display()
                )))
            })?);
        }
        Ok(Self::new(fixes, interval))
    }
}

fn parse_fix(line: &str) -> Option<Coordinates> {
    let (lon, lat) = line.split_once(',')?;
    let lon = lon.trim().parse().ok()?;
    let lat = lat.trim().parse().ok()?;
    Some(Coordinates::new(lon, lat))
}

#[async_trait]
impl PositionSource for ReplayPositionSource {
    async fn next_fix(&mut self, _options: &PositionOptions) -> Option<FixResult> {
        let fix = self.fixes.pop_front()?;
        tokio::time::sleep(self.interval).await;
        Some(Ok(fix))
    }
}

/// Stand-in for a platform without location capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePositionSource;

#[async_trait]
impl PositionSource for UnavailablePositionSource {
    async fn next_fix(&mut self, _options: &PositionOptions) -> Option<FixResult> {
        Some(Err(PositionError::Unsupported))
    }
}
