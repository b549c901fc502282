//! Build engine shim.
//!
//! Tasks never call the logger directly: they report through a [`BuildEngine`],
//! which mirrors the MSBuild task-host surface (`LogMessage`, `LogWarning`,
//! `LogError`) and counts diagnostics for the final summary. The engine also
//! carries the dry-run switch and the cancellation signal shared with the
//! process executor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::log_collector::PARSED_TARGET;

/// Importance of an informational message, as in MSBuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageImportance {
    High,
    Normal,
    Low,
}

/// Cloneable handle that cancels the running task.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelHandle { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BuildEngine {
    task_name: String,
    dry_run: bool,
    warnings: AtomicUsize,
    errors: AtomicUsize,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl BuildEngine {
    /// `task_name` prefixes every line, e.g. `build/android`.
    pub fn new(task_name: impl Into<String>, dry_run: bool) -> Self {
        Self::with_cancel(task_name, dry_run, &CancelHandle::new())
    }

    /// Engine observing an existing cancellation handle.
    pub fn with_cancel(task_name: impl Into<String>, dry_run: bool, cancel: &CancelHandle) -> Self {
        BuildEngine {
            task_name: task_name.into(),
            dry_run,
            warnings: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            cancel_tx: Arc::clone(&cancel.tx),
            cancel_rx: cancel.tx.subscribe(),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn log_message(&self, importance: MessageImportance, message: impl AsRef<str>) {
        let message = message.as_ref();
        match importance {
            MessageImportance::High | MessageImportance::Normal => {
                log::info!("[{}] {}", self.task_name, message)
            }
            MessageImportance::Low => log::debug!("[{}] {}", self.task_name, message),
        }
    }

    /// High-importance message that also lands in the parsed log.
    pub fn milestone(&self, message: impl AsRef<str>) {
        log::info!(target: PARSED_TARGET, "[{}] {}", self.task_name, message.as_ref());
    }

    pub fn log_warning(&self, message: impl AsRef<str>) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
        log::warn!("[{}] {}", self.task_name, message.as_ref());
    }

    pub fn log_error(&self, message: impl AsRef<str>) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        log::error!("[{}] {}", self.task_name, message.as_ref());
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    /// Receiver that flips to `true` on cancellation.
    pub fn cancel_receiver(&self) -> watch::Receiver<bool> {
        self.cancel_rx.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }
}
