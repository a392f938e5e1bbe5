//! Asynchronous driver for a [`Navigator`].
//!
//! The controller runs on its own task and is the single owner of the
//! navigator. It serializes user commands, live position fixes, debounce
//! expiries, and provider responses into one event loop, so no two events
//! ever touch navigation state concurrently.
//!
//! Every route request is tagged with a sequence number. Any relevant input
//! change, confirm, cancel, or arrival advances the sequence, so a response is
//! applied only if the inputs still describe the query it answers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::candidates::BookmarkToggle;
use crate::error::{Error, Result};
use crate::location::Coordinates;
use crate::map::MapAdapter;
use crate::navigation::{Arrival, NavigationSnapshot, Navigator, Rejection};
use crate::position::{PositionStream, TrackingHandle};
use crate::provider::RouteProvider;
use crate::route::{RouteCandidate, RouteQuery, TravelMode};

/// User intent delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetOrigin(String),
    SetDestination(String),
    SetMode(TravelMode),
    ToggleMode,
    Select(usize),
    ClearSelection,
    Preview(usize),
    ClearPreview,
    ToggleBookmark(usize),
    Confirm,
    Cancel,
    Arrive,
    NextStep,
    PreviousStep,
    ToggleStepView,
    ToggleBaseLayer,
    /// A position fix injected by the caller rather than a tracking source.
    PositionFix(Coordinates),
}

/// Event surfaced to the user interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "kebab-case")]
pub enum Notice {
    Rejected { rejection: Rejection, message: String },
    RoutesReady { count: usize },
    RouteUnavailable { message: String },
    NavigationStarted { route: usize },
    Arrived { destination: String, message: String },
    Bookmark { toggle: BookmarkToggle },
}

impl Notice {
    fn rejected(rejection: Rejection) -> Self {
        Notice::Rejected {
            rejection,
            message: rejection.to_string(),
        }
    }

    fn arrived(arrival: Arrival) -> Self {
        Notice::Arrived {
            message: arrival.to_string(),
            destination: arrival.destination_label,
        }
    }
}

/// What a command asks of the event loop after it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Nothing,
    /// Orphan in-flight requests and restart the quiescence window.
    Schedule,
    /// Disarm the window and orphan every in-flight request.
    Invalidate,
}

type RouteOutcome = (u64, RouteQuery, Result<Vec<RouteCandidate>>);

pub struct NavigationController<M: MapAdapter> {
    navigator: Navigator<M>,
    provider: Arc<dyn RouteProvider>,
    debounce: Duration,
    position: Option<(PositionStream, TrackingHandle)>,
}

impl<M> NavigationController<M>
where
    M: MapAdapter + Send + 'static,
{
    pub fn new(navigator: Navigator<M>, provider: Arc<dyn RouteProvider>, debounce: Duration) -> Self {
        Self {
            navigator,
            provider,
            debounce,
            position: None,
        }
    }

    /// Feed fixes from a tracking subscription. The subscription is cancelled on shutdown.
    pub fn with_position(mut self, stream: PositionStream, tracking: TrackingHandle) -> Self {
        self.position = Some((stream, tracking));
        self
    }

    /// Draw the initial map and start the event loop on the current tokio runtime.
    pub fn spawn(mut self) -> ControllerHandle<M> {
        self.navigator.initialize();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(self.navigator.snapshot());

        let task = tokio::spawn(self.run(command_rx, notice_tx, snapshot_tx));

        ControllerHandle {
            commands: command_tx,
            notices: notice_rx,
            snapshots: snapshot_rx,
            task,
        }
    }

    async fn run(
        self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        notices: mpsc::UnboundedSender<Notice>,
        snapshots: watch::Sender<NavigationSnapshot>,
    ) -> Navigator<M> {
        let Self {
            mut navigator,
            provider,
            debounce,
            position,
        } = self;
        let (mut fixes, tracking) = match position {
            Some((stream, tracking)) => (Some(stream), Some(tracking)),
            None => (None, None),
        };

        let timer = tokio::time::sleep(debounce);
        tokio::pin!(timer);
        let mut armed = false;
        let mut seq: u64 = 0;
        let mut in_flight: JoinSet<RouteOutcome> = JoinSet::new();

        loop {
            let effect = tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("command channel closed");
                        break;
                    };
                    apply(&mut navigator, command, &notices)
                }
                fix = next_fix(&mut fixes), if fixes.is_some() => match fix {
                    Some(fix) if navigator.on_position_fix(fix) => Effect::Schedule,
                    Some(_) => Effect::Nothing,
                    None => {
                        debug!("position stream ended");
                        fixes = None;
                        Effect::Nothing
                    }
                },
                () = &mut timer, if armed => {
                    armed = false;
                    if let Some(query) = navigator.evaluate_query() {
                        debug!(
                            seq,
                            profile = query.mode.profile(),
                            origin = %query.origin_label,
                            destination = %query.destination_label,
                            "dispatching route query"
                        );
                        let provider = Arc::clone(&provider);
                        let request_seq = seq;
                        in_flight.spawn(async move {
                            let result = provider.request_routes(&query).await;
                            (request_seq, query, result)
                        });
                    }
                    Effect::Nothing
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match joined {
                        Ok((request_seq, _, _)) if request_seq != seq => {
                            debug!(request_seq, latest = seq, "discarding stale route response");
                        }
                        Ok((_, query, Ok(candidates))) => {
                            let count = candidates.len();
                            if navigator.apply_routes(query, candidates) {
                                notify(&notices, Notice::RoutesReady { count });
                            }
                        }
                        Ok((_, _, Err(error))) => {
                            navigator.route_failed(&error);
                            notify(&notices, Notice::RouteUnavailable { message: error.to_string() });
                        }
                        Err(error) => warn!(%error, "route request task failed"),
                    }
                    Effect::Nothing
                }
            };

            match effect {
                Effect::Nothing => {}
                Effect::Schedule => {
                    seq += 1;
                    timer.as_mut().reset(Instant::now() + debounce);
                    armed = true;
                }
                Effect::Invalidate => {
                    armed = false;
                    seq += 1;
                }
            }

            snapshots.send_replace(navigator.snapshot());
        }

        in_flight.abort_all();
        if let Some(tracking) = tracking {
            tracking.cancel();
        }
        info!("navigation controller stopped");
        navigator
    }
}

async fn next_fix(fixes: &mut Option<PositionStream>) -> Option<Coordinates> {
    match fixes {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}

fn notify(notices: &mpsc::UnboundedSender<Notice>, notice: Notice) {
    if notices.send(notice).is_err() {
        debug!("notice receiver dropped");
    }
}

fn reject(notices: &mpsc::UnboundedSender<Notice>, rejection: Rejection) -> Effect {
    info!(%rejection, "command rejected");
    notify(notices, Notice::rejected(rejection));
    Effect::Nothing
}

fn schedule_if(changed: bool) -> Effect {
    if changed {
        Effect::Schedule
    } else {
        Effect::Nothing
    }
}

fn apply<M: MapAdapter>(
    navigator: &mut Navigator<M>,
    command: Command,
    notices: &mpsc::UnboundedSender<Notice>,
) -> Effect {
    match command {
        Command::SetOrigin(text) => schedule_if(navigator.set_origin_text(text)),
        Command::SetDestination(text) => schedule_if(navigator.set_destination_text(text)),
        Command::SetMode(mode) => schedule_if(navigator.set_mode(mode)),
        Command::ToggleMode => schedule_if(navigator.toggle_mode()),
        Command::PositionFix(fix) => schedule_if(navigator.on_position_fix(fix)),
        Command::Select(id) => match navigator.select(id) {
            Ok(()) => Effect::Nothing,
            Err(rejection) => reject(notices, rejection),
        },
        Command::ClearSelection => {
            navigator.clear_selection();
            Effect::Nothing
        }
        Command::Preview(id) => match navigator.preview(id) {
            Ok(()) => Effect::Nothing,
            Err(rejection) => reject(notices, rejection),
        },
        Command::ClearPreview => {
            navigator.clear_preview();
            Effect::Nothing
        }
        Command::ToggleBookmark(id) => match navigator.toggle_bookmark(id) {
            Ok(toggle) => {
                notify(notices, Notice::Bookmark { toggle });
                Effect::Nothing
            }
            Err(rejection) => reject(notices, rejection),
        },
        Command::Confirm => match navigator.confirm_selection() {
            Ok(()) => {
                let route = navigator.session().active_candidate_id.unwrap_or_default();
                notify(notices, Notice::NavigationStarted { route });
                Effect::Invalidate
            }
            Err(rejection) => reject(notices, rejection),
        },
        Command::Cancel => {
            navigator.cancel();
            Effect::Invalidate
        }
        Command::Arrive => match navigator.arrive() {
            Ok(arrival) => {
                notify(notices, Notice::arrived(arrival));
                Effect::Invalidate
            }
            Err(rejection) => reject(notices, rejection),
        },
        Command::NextStep => {
            navigator.advance_step();
            Effect::Nothing
        }
        Command::PreviousStep => {
            navigator.retreat_step();
            Effect::Nothing
        }
        Command::ToggleStepView => {
            navigator.toggle_step_view();
            Effect::Nothing
        }
        Command::ToggleBaseLayer => {
            navigator.toggle_base_layer();
            Effect::Nothing
        }
    }
}

/// Caller side of a running [`NavigationController`].
pub struct ControllerHandle<M: MapAdapter> {
    commands: mpsc::UnboundedSender<Command>,
    notices: mpsc::UnboundedReceiver<Notice>,
    snapshots: watch::Receiver<NavigationSnapshot>,
    task: JoinHandle<Navigator<M>>,
}

impl<M: MapAdapter> ControllerHandle<M> {
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ControllerClosed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait until a published state satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&NavigationSnapshot) -> bool,
    ) -> Result<NavigationSnapshot> {
        let snapshot = self
            .snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| Error::ControllerClosed)?;
        Ok(snapshot.clone())
    }

    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    pub fn try_notice(&mut self) -> Option<Notice> {
        self.notices.try_recv().ok()
    }

    /// Stop the event loop, abandon pending requests, and cancel position tracking.
    pub async fn shutdown(self) -> Result<Navigator<M>> {
        let Self { commands, task, .. } = self;
        drop(commands);
        task.await.map_err(|error| {
            warn!(%error, "navigation controller task failed");
            Error::ControllerClosed
        })
    }
}
