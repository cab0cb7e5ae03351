//! Worker session state
//!
//! One [`WorkerSession`] lives for the page's lifetime. It tracks the
//! init-once runtime handle state and the set of packages already
//! installed — the base list installed at bootstrap plus any
//! auto-detected per-cell dependencies. Packages are only ever added,
//! never removed. A bootstrap failure poisons the session: every later
//! request fails fast with the recorded condition until a fresh worker is
//! spawned.

use crate::runtime::{GuestRuntime, RuntimeError};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Worker-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Packages installed once at bootstrap, in order.
    pub base_packages: Vec<String>,
    /// Optional guest-language setup source run once at bootstrap, before
    /// the base packages install.
    pub setup_source: Option<String>,
    /// Whether `execute` requests first scan their source for importable
    /// package names and install them additively.
    pub detect_dependencies: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            base_packages: Vec::new(),
            setup_source: None,
            detect_dependencies: true,
        }
    }
}

/// Bootstrap lifecycle of a worker session.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Bootstrap has not run yet.
    Cold,
    /// The runtime handle is live and usable.
    Ready,
    /// Bootstrap failed; the session is permanently unusable.
    Poisoned(RuntimeError),
}

/// Process-wide state on the worker side.
pub struct WorkerSession<R> {
    id: Uuid,
    runtime: Arc<R>,
    state: SessionState,
    installed: IndexSet<String>,
    config: WorkerConfig,
}

impl<R: GuestRuntime> WorkerSession<R> {
    /// Create a cold session around an uninitialized runtime.
    pub fn new(runtime: Arc<R>, config: WorkerConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            runtime,
            state: SessionState::Cold,
            installed: IndexSet::new(),
            config,
        }
    }

    /// Session identifier, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The runtime handle. Callers must not execute against it before the
    /// session is [`SessionState::Ready`].
    pub fn runtime(&self) -> Arc<R> {
        Arc::clone(&self.runtime)
    }

    /// Worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current bootstrap state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Mark bootstrap complete.
    pub fn mark_ready(&mut self) {
        self.state = SessionState::Ready;
    }

    /// Record a fatal bootstrap failure. Not reversible.
    pub fn poison(&mut self, error: RuntimeError) {
        self.state = SessionState::Poisoned(error);
    }

    /// Whether a package has already been installed this session.
    pub fn is_installed(&self, package: &str) -> bool {
        self.installed.contains(package)
    }

    /// Record a successful install. Additive; packages never leave.
    pub fn record_installed(&mut self, package: impl Into<String>) {
        self.installed.insert(package.into());
    }

    /// Installed packages, in install order.
    pub fn installed(&self) -> impl Iterator<Item = &str> {
        self.installed.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Evaluation, HostCallbacks, Instruction};
    use async_trait::async_trait;

    struct NullRuntime;

    #[async_trait]
    impl GuestRuntime for NullRuntime {
        async fn initialize(&self) -> Result<(), RuntimeError> {
            Ok(())
        }
        fn bind_callbacks(&self, _callbacks: HostCallbacks) {}
        async fn install(&self, _package: &str) -> Result<(), RuntimeError> {
            Ok(())
        }
        async fn execute(&self, _instruction: Instruction) -> Result<Evaluation, RuntimeError> {
            Ok(Evaluation::Unit)
        }
    }

    #[test]
    fn installed_set_is_additive_and_deduplicated() {
        let mut session = WorkerSession::new(Arc::new(NullRuntime), WorkerConfig::default());
        session.record_installed("numpy");
        session.record_installed("pandas");
        session.record_installed("numpy");
        assert!(session.is_installed("numpy"));
        assert_eq!(session.installed().collect::<Vec<_>>(), ["numpy", "pandas"]);
    }

    #[test]
    fn poison_is_terminal() {
        let mut session = WorkerSession::new(Arc::new(NullRuntime), WorkerConfig::default());
        session.poison(RuntimeError::Initialization {
            reason: "wasm fetch failed".into(),
        });
        assert!(matches!(session.state(), SessionState::Poisoned(_)));
    }
}
