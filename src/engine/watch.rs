//! File-watch-driven incremental rebuilds.
//!
//! Wraps a [`Session`] behind a filesystem-event source:
//!
//! ```text
//! IDLE ──(event)──► DEBOUNCING ──(quiet window)──► BUILDING ──(ok)──► IDLE
//!                        ▲                             │
//!                        └──────(event during build)───┘
//! ```
//!
//! Events are coalesced for the configured quiet window (default 100 ms);
//! any arrival resets the timer. Events arriving while a build runs mark the
//! session dirty and feed the next debounce round. A startup grace period
//! swallows the initial event flood some watch backends emit. Shutdown lets
//! the in-flight build finish, then the update stream ends.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use notify::{EventKind, RecursiveMode, Watcher};

use crate::engine::cancel::CancelToken;
use crate::engine::diagnostics::EngineError;
use crate::engine::session::{GenerateResult, Session};

/// Poll interval while idle, bounding shutdown latency.
const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub debounce: Duration,
    pub grace_period: Duration,
}

impl WatchOptions {
    fn from_session(session: &Session) -> Self {
        Self {
            debounce: Duration::from_millis(session.config().debounce_ms),
            grace_period: Duration::from_millis(session.config().grace_period_ms),
        }
    }
}

/// A running watch session. Manifests stream through [`WatchSession::updates`];
/// the stream ends when the session shuts down.
pub struct WatchSession {
    updates: Receiver<Arc<GenerateResult>>,
    shutdown: CancelToken,
    worker: Option<JoinHandle<()>>,
    // Dropping the watcher stops event delivery.
    _watcher: notify::RecommendedWatcher,
}

impl WatchSession {
    /// Start watching the session's source root.
    pub fn start(session: Arc<Session>) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = unbounded::<Vec<PathBuf>>();

        let mut watcher = notify::recommended_watcher(
            move |result: notify::Result<notify::Event>| {
                if let Ok(event) = result
                    && !matches!(event.kind, EventKind::Access(_))
                {
                    let _ = event_tx.send(event.paths);
                }
            },
        )
        .map_err(|e| EngineError::Initialization(format!("file watcher: {}", e)))?;

        watcher
            .watch(session.root(), RecursiveMode::Recursive)
            .map_err(|e| EngineError::Initialization(format!("file watcher: {}", e)))?;

        let (update_tx, update_rx) = unbounded();
        let shutdown = CancelToken::new();
        let options = WatchOptions::from_session(&session);

        let worker = {
            let shutdown = shutdown.clone();
            std::thread::Builder::new()
                .name("cemgen-watch".to_string())
                .spawn(move || run_loop(session, event_rx, update_tx, shutdown, options))
                .map_err(|e| EngineError::Initialization(format!("watch thread: {}", e)))?
        };

        Ok(Self {
            updates: update_rx,
            shutdown,
            worker: Some(worker),
            _watcher: watcher,
        })
    }

    /// The stream of published manifests. Iteration ends once the session
    /// has shut down.
    pub fn updates(&self) -> &Receiver<Arc<GenerateResult>> {
        &self.updates
    }

    /// Signal shutdown and wait for the loop (and any in-flight build) to
    /// finish.
    pub fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// The debounce/build state machine. Separated from the notify plumbing so
/// tests can drive it with a synthetic event channel.
pub(crate) fn run_loop(
    session: Arc<Session>,
    events: Receiver<Vec<PathBuf>>,
    updates: Sender<Arc<GenerateResult>>,
    shutdown: CancelToken,
    options: WatchOptions,
) {
    let started = Instant::now();
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();

    'idle: loop {
        if shutdown.is_cancelled() {
            return;
        }

        match events.recv_timeout(IDLE_POLL) {
            Ok(paths) => accept(&session, paths, &mut pending, started, options.grace_period),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        }
        if pending.is_empty() {
            continue;
        }

        // DEBOUNCING: coalesce until a full quiet window passes.
        loop {
            if shutdown.is_cancelled() {
                return;
            }

            match events.recv_timeout(options.debounce) {
                Ok(paths) => {
                    accept(&session, paths, &mut pending, started, options.grace_period);
                }
                Err(RecvTimeoutError::Timeout) => {
                    // BUILDING
                    let batch: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
                    let token = CancelToken::new();
                    match session.generate_with_changes(&batch, &token) {
                        Ok(result) => {
                            if updates.send(Arc::new(result)).is_err() {
                                return;
                            }
                        }
                        // A failed attempt leaves the previous manifest
                        // current; keep watching.
                        Err(_) => {}
                    }

                    // Events that arrived during the build: dirty, go
                    // straight back to debouncing with them.
                    while let Ok(paths) = events.try_recv() {
                        accept(&session, paths, &mut pending, started, options.grace_period);
                    }
                    if pending.is_empty() {
                        continue 'idle;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

/// Keep the paths the workspace cares about; drop the rest and anything
/// inside the startup grace period.
fn accept(
    session: &Session,
    paths: Vec<PathBuf>,
    pending: &mut BTreeSet<PathBuf>,
    started: Instant,
    grace_period: Duration,
) {
    if started.elapsed() < grace_period {
        return;
    }
    for path in paths {
        if session.watches_path(&path) {
            pending.insert(path);
        }
    }
}
