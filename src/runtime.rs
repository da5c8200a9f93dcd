//! Process-wide state: a one-time init/shutdown pair, the engine fault hook and
//! resource lifetime counters.
//!
//! Nothing in the crate requires [`init`] to have run. Without it, engine faults
//! are logged through `tracing` and returned to the caller as
//! [`GraphError::Internal`]; with it, they are also handed to the installed hook.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, const_mutex};

use crate::errors::GraphError;

pub type FaultHook = Arc<dyn Fn(&GraphError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct RuntimeConfig {
    pub fault_hook: Option<FaultHook>,
}

impl RuntimeConfig {
    pub fn with_fault_hook<F>(hook: F) -> Self
    where
        F: Fn(&GraphError) + Send + Sync + 'static,
    {
        Self {
            fault_hook: Some(Arc::new(hook)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifetimeStats {
    pub created: u64,
    pub released: u64,
}

impl LifetimeStats {
    pub fn live(&self) -> u64 {
        self.created.saturating_sub(self.released)
    }
}

enum Phase {
    Uninitialized,
    Active(Option<FaultHook>),
    ShutDown,
}

static RUNTIME: Mutex<Phase> = const_mutex(Phase::Uninitialized);
static CREATED: AtomicU64 = AtomicU64::new(0);
static RELEASED: AtomicU64 = AtomicU64::new(0);

/// Initializes the runtime. Succeeds at most once per process; there is no
/// re-initialization after [`shutdown`].
pub fn init(config: RuntimeConfig) -> Result<(), GraphError> {
    let mut phase = RUNTIME.lock();
    match *phase {
        Phase::Uninitialized => {
            *phase = Phase::Active(config.fault_hook);
            tracing::debug!("graph runtime initialized");
            Ok(())
        }
        Phase::Active(_) => Err(GraphError::invalid_operation(
            "runtime is already initialized",
        )),
        Phase::ShutDown => Err(GraphError::invalid_operation(
            "runtime was shut down and cannot be initialized again",
        )),
    }
}

pub fn shutdown() -> Result<(), GraphError> {
    let mut phase = RUNTIME.lock();
    match *phase {
        Phase::Active(_) => {
            *phase = Phase::ShutDown;
            let stats = stats();
            tracing::debug!(
                created = stats.created,
                released = stats.released,
                "graph runtime shut down"
            );
            Ok(())
        }
        _ => Err(GraphError::invalid_operation("runtime is not active")),
    }
}

pub fn is_initialized() -> bool {
    matches!(*RUNTIME.lock(), Phase::Active(_))
}

pub fn stats() -> LifetimeStats {
    LifetimeStats {
        created: CREATED.load(Ordering::Relaxed),
        released: RELEASED.load(Ordering::Relaxed),
    }
}

/// Reports an engine fault and returns it as an internal error.
pub(crate) fn fault<T: Into<String>>(msg: T) -> GraphError {
    let err = GraphError::internal(msg);
    report(&err);
    err
}

pub fn report(err: &GraphError) {
    let hook = match &*RUNTIME.lock() {
        Phase::Active(hook) => hook.clone(),
        _ => None,
    };
    match hook {
        Some(hook) => hook(err),
        None => tracing::warn!(error = %err, "graph engine fault"),
    }
}

pub(crate) fn note_created() {
    CREATED.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_released() {
    RELEASED.fetch_add(1, Ordering::Relaxed);
}
