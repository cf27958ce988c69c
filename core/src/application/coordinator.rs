//! Reconciliation coordinator - keeps a change-set warm for a configuration document.
//!
//! The coordinator owns the current document, a cache entry keyed by the
//! document's SHA-256, and an optional background task that re-checks the
//! document once it has been stable for the debounce window. Callers read
//! the state between operations, the way a UI would poll it.
//!
//! # Cache invalidation
//! The cache entry is invalidated when the document changes, when fetching
//! the current mappings fails, and when an apply succeeds. Applying only
//! uses a change-set computed for the document that is current.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::applier::{remaining_changes, ApplyReport, PortChangeApplier};
use super::fetcher::fetch_current_ports;
use crate::config::{Settings, DEFAULT_DEBOUNCE_MS};
use crate::domain::{diff, PortChange};
use crate::error::{Error, Result};
use crate::extractor::extract_declared_ports;
use crate::ports::PortMappingPort;

/// What the coordinator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Checking,
    Applying,
    /// The last check or apply failed.
    Error,
}

/// Snapshot of the coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationState {
    pub phase: Phase,
    pub is_loading: bool,
    pub is_processing: bool,
    pub last_message: Option<String>,
    pub last_error: Option<String>,
    pub changes: PortChange,
    /// Key of the document `changes` was computed for; `None` once invalidated.
    pub last_checked_document: Option<String>,
}

/// Most notifications kept for a caller that never drains them; older ones are dropped.
pub const MAX_PENDING_NOTIFICATIONS: usize = 64;

/// User-facing events, drained with [`ReconciliationCoordinator::take_messages`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A check found ports to add or remove.
    ChangesDetected { changes: PortChange },
    /// A change-set was applied.
    ChangesApplied { report: ApplyReport },
    /// Fetching the current mappings failed.
    CheckFailed { message: String },
    /// Applying stopped part-way or failed outright.
    ApplyFailed { message: String },
}

/// Tuning for a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Quiet period before a background re-check runs.
    pub debounce: Duration,
    /// Serve a repeated check for an unchanged document from the cache.
    pub memoize_checks: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            memoize_checks: true,
        }
    }
}

impl From<&Settings> for CoordinatorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            debounce: settings.debounce(),
            memoize_checks: settings.memoize_checks,
        }
    }
}

/// Hex SHA-256 of a document, used as the cache key.
pub fn document_key(document: &str) -> String {
    hex::encode(Sha256::digest(document.as_bytes()))
}

#[derive(Debug, Clone)]
struct Document {
    text: Arc<str>,
    key: String,
}

impl Document {
    fn new(text: String) -> Self {
        let key = document_key(&text);
        Self {
            text: text.into(),
            key,
        }
    }
}

/// Cached change-set for one document.
#[derive(Debug, Default)]
struct CacheEntry {
    key: Option<String>,
    value: PortChange,
    valid: bool,
}

impl CacheEntry {
    /// Only a non-empty change-set for the same document short-circuits a check.
    fn hit(&self, key: &str) -> Option<&PortChange> {
        (self.valid && self.key.as_deref() == Some(key) && !self.value.is_empty())
            .then_some(&self.value)
    }

    /// The change-set computed for `key`, empty or not.
    fn current(&self, key: &str) -> Option<&PortChange> {
        (self.valid && self.key.as_deref() == Some(key)).then_some(&self.value)
    }

    fn store(&mut self, key: String, value: PortChange) {
        self.key = Some(key);
        self.value = value;
        self.valid = true;
    }

    fn invalidate(&mut self) {
        self.key = None;
        self.valid = false;
    }

    fn reset(&mut self) {
        self.invalidate();
        self.value = PortChange::default();
    }
}

#[derive(Debug, Default)]
struct Inner {
    cache: CacheEntry,
    checks_in_flight: usize,
    loading_requests: usize,
    is_processing: bool,
    last_message: Option<String>,
    last_error: Option<String>,
    /// Bumped whenever an apply finishes or the document changes, so checks
    /// that started earlier don't overwrite the cache left behind.
    generation: u64,
    notifications: VecDeque<Notification>,
}

impl Inner {
    fn notify(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_PENDING_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }

    fn phase(&self) -> Phase {
        if self.is_processing {
            Phase::Applying
        } else if self.checks_in_flight > 0 {
            Phase::Checking
        } else if self.last_error.is_some() {
            Phase::Error
        } else {
            Phase::Idle
        }
    }
}

struct Shared<P> {
    client: P,
    options: CoordinatorOptions,
    document: RwLock<Document>,
    revision: watch::Sender<u64>,
    inner: RwLock<Inner>,
}

/// Clears `is_processing` however the apply future ends.
struct ProcessingGuard<'a>(&'a RwLock<Inner>);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.write().is_processing = false;
    }
}

impl<P: PortMappingPort> Shared<P> {
    async fn check(&self, show_loading: bool, force: bool) -> PortChange {
        let (document, generation) = {
            let mut inner = self.inner.write();
            let document = self.document.read().clone();
            if !force && self.options.memoize_checks {
                if let Some(cached) = inner.cache.hit(&document.key) {
                    debug!("Document unchanged, using cached port changes");
                    return cached.clone();
                }
            }
            inner.checks_in_flight += 1;
            if show_loading {
                inner.loading_requests += 1;
            }
            (document, inner.generation)
        };

        let declared = extract_declared_ports(&document.text);
        let current = fetch_current_ports(&self.client).await;

        let mut inner = self.inner.write();
        inner.checks_in_flight -= 1;
        if show_loading {
            inner.loading_requests -= 1;
        }

        match current {
            Ok(current) => {
                let changes = diff(&declared, &current);
                if inner.generation == generation {
                    inner.cache.store(document.key, changes.clone());
                } else {
                    debug!("Document or port mappings changed during check, not caching result");
                }
                inner.last_error = None;
                if !changes.is_empty() {
                    inner.last_message = Some(format!("Port changes pending: {}", changes));
                    inner.notify(Notification::ChangesDetected {
                        changes: changes.clone(),
                    });
                }
                changes
            }
            Err(e) => {
                warn!("Port check failed: {}", e);
                inner.cache.invalidate();
                let message = e.to_string();
                inner.last_error = Some(message.clone());
                inner.notify(Notification::CheckFailed { message });
                PortChange::default()
            }
        }
    }

    async fn apply(&self) -> Result<ApplyReport> {
        let (key, changes) = {
            let mut inner = self.inner.write();
            let key = self.document.read().key.clone();
            let changes = match inner.cache.current(&key) {
                Some(changes) if !changes.is_empty() => changes.clone(),
                _ => {
                    debug!("No port changes checked for the current document, nothing to apply");
                    return Ok(ApplyReport::default());
                }
            };
            inner.is_processing = true;
            (key, changes)
        };
        let _processing = ProcessingGuard(&self.inner);

        let result = PortChangeApplier::new(&self.client).apply(&changes).await;

        let mut inner = self.inner.write();
        inner.generation += 1;

        match result {
            Ok(report) => {
                info!("Applied {} port change(s)", report.len());
                inner.cache.reset();
                inner.last_error = None;
                inner.last_message = Some(format!("Applied port changes: {}", changes));
                inner.notify(Notification::ChangesApplied {
                    report: report.clone(),
                });
                Ok(report)
            }
            Err(e) => {
                if let Error::Apply { applied, .. } = &e {
                    if inner.cache.current(&key).is_some() {
                        inner.cache.value = remaining_changes(&changes, applied);
                    }
                }
                let message = e.to_string();
                inner.last_error = Some(message.clone());
                inner.notify(Notification::ApplyFailed { message });
                Err(e)
            }
        }
    }
}

/// Background loop: re-check once the document has been stable for the debounce window.
async fn watch_document<P: PortMappingPort>(
    shared: Arc<Shared<P>>,
    mut revisions: watch::Receiver<u64>,
    cancel: CancellationToken,
) {
    let debounce = shared.options.debounce;

    loop {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                changed = revisions.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        debug!("Document stable for {:?}, re-checking ports", debounce);
        shared.check(false, false).await;

        tokio::select! {
            _ = cancel.cancelled() => return,
            changed = revisions.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Coordinates extract → fetch → diff → apply for one configuration document.
pub struct ReconciliationCoordinator<P: PortMappingPort + 'static> {
    shared: Arc<Shared<P>>,
    watcher: Mutex<Option<CancellationToken>>,
}

impl<P: PortMappingPort + 'static> ReconciliationCoordinator<P> {
    /// Create a coordinator with default options.
    pub fn new(client: P, document: impl Into<String>) -> Self {
        Self::with_options(client, document, CoordinatorOptions::default())
    }

    /// Create a coordinator with explicit options.
    pub fn with_options(client: P, document: impl Into<String>, options: CoordinatorOptions) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                client,
                options,
                document: RwLock::new(Document::new(document.into())),
                revision,
                inner: RwLock::new(Inner::default()),
            }),
            watcher: Mutex::new(None),
        }
    }

    /// The port-manager this coordinator talks to.
    pub fn client(&self) -> &P {
        &self.shared.client
    }

    /// Options the coordinator was created with.
    pub fn options(&self) -> CoordinatorOptions {
        self.shared.options
    }

    // MARK: - Document

    /// Replace the configuration document.
    ///
    /// A different text clears the cached change-set and, while watching,
    /// restarts the debounce timer.
    pub fn set_document(&self, document: impl Into<String>) {
        let document = Document::new(document.into());
        {
            let mut current = self.shared.document.write();
            if current.key == document.key {
                return;
            }
            *current = document;
        }

        {
            let mut inner = self.shared.inner.write();
            inner.cache.reset();
            inner.generation += 1;
        }
        self.shared.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    /// Current document text.
    pub fn document(&self) -> Arc<str> {
        Arc::clone(&self.shared.document.read().text)
    }

    // MARK: - Checking

    /// Compute the change-set for the current document.
    ///
    /// If the document is unchanged since the last check and that check found
    /// changes, the cached change-set is returned without contacting the
    /// port-manager. A fetch failure is recorded in the state and yields an
    /// empty change-set.
    pub async fn check_port_changes(&self, show_loading: bool) -> PortChange {
        self.shared.check(show_loading, false).await
    }

    /// Like [`check_port_changes`](Self::check_port_changes) but always
    /// fetches the current mappings.
    pub async fn refresh_port_changes(&self, show_loading: bool) -> PortChange {
        self.shared.check(show_loading, true).await
    }

    // MARK: - Applying

    /// Apply the cached change-set.
    ///
    /// Does nothing if the cache is empty or was computed for an earlier
    /// document. On success the cache is reset; if a
    /// call fails part-way, the cache keeps only the changes still outstanding.
    pub async fn apply_changes(&self) -> Result<ApplyReport> {
        self.shared.apply().await
    }

    // MARK: - Background re-check

    /// Start re-checking in the background whenever the document settles.
    ///
    /// Must be called from within a tokio runtime. Calling it twice is a no-op.
    pub fn start_watching(&self) {
        let mut watcher = self.watcher.lock();
        if watcher.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let revisions = self.shared.revision.subscribe();
        tokio::spawn(watch_document(
            Arc::clone(&self.shared),
            revisions,
            cancel.clone(),
        ));
        *watcher = Some(cancel);
    }

    /// Stop the background task. An in-flight check runs to completion.
    pub fn stop_watching(&self) {
        if let Some(cancel) = self.watcher.lock().take() {
            cancel.cancel();
        }
    }

    /// Check if the background task is running.
    pub fn is_watching(&self) -> bool {
        self.watcher.lock().is_some()
    }

    // MARK: - State

    /// Snapshot of the current state.
    pub fn state(&self) -> ReconciliationState {
        let inner = self.shared.inner.read();
        ReconciliationState {
            phase: inner.phase(),
            is_loading: inner.loading_requests > 0,
            is_processing: inner.is_processing,
            last_message: inner.last_message.clone(),
            last_error: inner.last_error.clone(),
            changes: inner.cache.value.clone(),
            last_checked_document: inner.cache.key.clone(),
        }
    }

    /// The cached change-set.
    pub fn changes(&self) -> PortChange {
        self.shared.inner.read().cache.value.clone()
    }

    /// Get and clear pending notifications.
    ///
    /// At most [`MAX_PENDING_NOTIFICATIONS`] are kept between drains.
    pub fn take_messages(&self) -> Vec<Notification> {
        self.shared.inner.write().notifications.drain(..).collect()
    }

    /// Check if there are pending notifications.
    pub fn has_pending_messages(&self) -> bool {
        !self.shared.inner.read().notifications.is_empty()
    }
}

impl<P: PortMappingPort + 'static> Drop for ReconciliationCoordinator<P> {
    fn drop(&mut self) {
        self.stop_watching();
    }
}
