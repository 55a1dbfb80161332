//! The activity logger: authorization, record construction, dispatch and
//! querying.
//!
//! Nothing in [`Logger`]'s public API returns an error or panics because of
//! the logging pipeline. Internal failures are reported through `tracing`
//! and, where possible, persisted as an `error` record.

use devtrail_core::DevtrailConfig;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::error::LogError;
use crate::fault::ErrorInfo;
use crate::gate::AccessGate;
use crate::query::RecordFilter;
use crate::record::{LogRecord, RESULT_ERROR, actions};
use crate::storage::{StorageBackend, create_backend};

/// How a single dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The record was stored.
    Persisted,
    /// The actor is not authorized; nothing was built or stored.
    Rejected,
    /// Storing the record failed, but an `error` record describing the
    /// failure was stored instead.
    Recovered,
    /// Neither the record nor the fallback `error` record could be stored.
    Dropped,
}

/// Whether a convenience dispatcher waits for the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Run the pipeline before returning.
    Inline,
    /// Launch the pipeline independently and return immediately.
    #[default]
    Detached,
}

/// The main activity logger.
///
/// Cloning is cheap; clones share the gate, the backend and the count of
/// detached dispatches still running.
#[derive(Clone)]
pub struct Logger {
    gate: Arc<AccessGate>,
    storage: Arc<dyn StorageBackend>,
    in_flight: Arc<InFlight>,
}

impl Logger {
    /// Create a logger with an explicit gate and backend.
    pub fn new(gate: AccessGate, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            gate: Arc::new(gate),
            storage,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Create a logger from configuration, selecting the backend once.
    pub fn from_config(config: &DevtrailConfig) -> Result<Self, LogError> {
        config.validate()?;
        let storage = create_backend(&config.storage)?;
        let gate = AccessGate::new(config.authorized_actors.iter().cloned());

        tracing::debug!(
            backend = storage.name(),
            authorized = gate.len(),
            "Logger initialized"
        );

        Ok(Self::new(gate, storage))
    }

    /// Whether `actor_id` may emit records.
    pub fn is_authorized(&self, actor_id: &str) -> bool {
        self.gate.is_authorized(actor_id)
    }

    /// Record an event, running the whole pipeline before returning.
    ///
    /// If building or storing the record fails (or panics), the failure is
    /// formatted and a second record with result `error` is attempted. A
    /// failure of that second attempt is only reported.
    pub async fn record_event(
        &self,
        actor_id: &str,
        action: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
    ) -> DispatchOutcome {
        if !self.gate.is_authorized(actor_id) {
            tracing::warn!(
                actor_id = %actor_id,
                action = %action,
                "Actor is not authorized to log actions"
            );
            return DispatchOutcome::Rejected;
        }

        let fault = match self
            .try_persist(actor_id, action, model, method, result, error)
            .await
        {
            None => return DispatchOutcome::Persisted,
            Some(fault) => fault,
        };

        tracing::warn!(
            backend = self.storage.name(),
            actor_id = %actor_id,
            error = %fault,
            "Failed to record event, recording the failure instead"
        );

        match self
            .try_persist(actor_id, action, model, method, RESULT_ERROR, Some(fault))
            .await
        {
            None => DispatchOutcome::Recovered,
            Some(secondary) => {
                tracing::error!(
                    backend = self.storage.name(),
                    actor_id = %actor_id,
                    error = %secondary,
                    "Failed to record error event, dropping it"
                );
                DispatchOutcome::Dropped
            }
        }
    }

    /// Record an event without waiting for it.
    ///
    /// The pipeline runs on a separate task (or, outside a tokio runtime, a
    /// separate thread). No result or error ever comes back; use
    /// [`Logger::wait_idle`] to wait for all detached dispatches.
    pub fn record_event_detached(
        &self,
        actor_id: &str,
        action: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
    ) {
        let logger = self.clone();
        let guard = self.in_flight.enter();
        let (actor_id, action, model, method, result) = (
            actor_id.to_string(),
            action.to_string(),
            model.to_string(),
            method.to_string(),
            result.to_string(),
        );

        let task = async move {
            let _guard = guard;
            let dispatch = logger.record_event(&actor_id, &action, &model, &method, &result, error);
            if let Err(payload) = AssertUnwindSafe(dispatch).catch_unwind().await {
                tracing::error!(
                    actor_id = %actor_id,
                    error = %ErrorInfo::from_panic(payload.as_ref()),
                    "Detached dispatch panicked"
                );
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name("devtrail-dispatch".to_string())
                    .spawn(move || {
                        match tokio::runtime::Builder::new_current_thread()
                            .enable_all()
                            .build()
                        {
                            Ok(runtime) => runtime.block_on(task),
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to start dispatch runtime")
                            }
                        }
                    });
                if let Err(e) = spawned {
                    tracing::error!(error = %e, "Failed to start dispatch thread");
                }
            }
        }
    }

    /// Wait until every detached dispatch launched so far has finished.
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Number of detached dispatches still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Record a method call, inline or detached per `mode`.
    pub async fn record_method_call(
        &self,
        actor_id: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
        mode: DispatchMode,
    ) {
        match mode {
            DispatchMode::Inline => {
                self.record_event(actor_id, actions::METHOD_CALL, model, method, result, error)
                    .await;
            }
            DispatchMode::Detached => {
                self.record_event_detached(
                    actor_id,
                    actions::METHOD_CALL,
                    model,
                    method,
                    result,
                    error,
                );
            }
        }
    }

    /// Record a database transaction. Always detached.
    pub fn record_transaction(
        &self,
        actor_id: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
    ) {
        self.record_event_detached(
            actor_id,
            actions::DATABASE_TRANSACTION,
            model,
            method,
            result,
            error,
        );
    }

    /// Record a model interaction. Always detached.
    pub fn record_model_interaction(
        &self,
        actor_id: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
    ) {
        self.record_event_detached(
            actor_id,
            actions::MODEL_INTERACTION,
            model,
            method,
            result,
            error,
        );
    }

    /// Read every stored record. Empty if the backend cannot be read.
    pub async fn read_logs(&self) -> Vec<LogRecord> {
        self.storage.read_all_or_empty().await
    }

    /// Read the records matching `filter`, in backend order.
    pub async fn query(&self, filter: &RecordFilter) -> Vec<LogRecord> {
        filter.apply(self.read_logs().await)
    }

    pub async fn filter_by_action(&self, action: &str) -> Vec<LogRecord> {
        self.query(&RecordFilter::by_action(action)).await
    }

    pub async fn filter_by_model(&self, model: &str) -> Vec<LogRecord> {
        self.query(&RecordFilter::by_model(model)).await
    }

    pub async fn filter_by_actor(&self, actor_id: &str) -> Vec<LogRecord> {
        self.query(&RecordFilter::by_actor(actor_id)).await
    }

    /// Build and store one record. Returns the fault if that failed.
    async fn try_persist(
        &self,
        actor_id: &str,
        action: &str,
        model: &str,
        method: &str,
        result: &str,
        error: Option<ErrorInfo>,
    ) -> Option<ErrorInfo> {
        let attempt = AssertUnwindSafe(async {
            let record = LogRecord::builder(actor_id, action, model, method)
                .result(result)
                .maybe_error(error)
                .build();
            self.storage.append(&record).await
        })
        .catch_unwind()
        .await;

        match attempt {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(ErrorInfo::capture(&e)),
            Err(payload) => Some(ErrorInfo::from_panic(payload.as_ref())),
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("gate", &self.gate)
            .field("backend", &self.storage.name())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Count of running detached dispatches.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            in_flight: Arc::clone(self),
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the count when the dispatch ends, including by panic.
struct InFlightGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}
