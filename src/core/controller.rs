//! Debounced conversion controller.
//!
//! The controller owns the amount and currency pair entered by the user. Every
//! edit (re)starts a debounce timer; when the timer fires with a valid amount a
//! conversion runs against the [`RateFetcher`]. State changes are published as
//! [`Snapshot`]s on a `watch` channel for the view to render.
//!
//! Each conversion attempt takes a ticket from a monotonically increasing
//! counter and only the most recent ticket may settle the status, so a slow
//! response can never overwrite a newer one. Any edit retires the attempts
//! already running, whose responses then answer a stale request. After [`ConversionController::shutdown`]
//! nothing mutates the state or notifies subscribers again.

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::core::conversion::{self, ConversionError, ConversionRequest, ConversionResult};
use crate::core::currency::Catalog;
use crate::core::rate::RateFetcher;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Result, error and loading state folded into one value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionStatus {
    Idle,
    /// A fetch is in flight; `previous` is the last successful result, if any.
    Loading {
        previous: Option<ConversionResult>,
    },
    Succeeded(ConversionResult),
    Failed(ConversionError),
}

impl ConversionStatus {
    pub fn result(&self) -> Option<&ConversionResult> {
        match self {
            ConversionStatus::Succeeded(result) => Some(result),
            ConversionStatus::Loading { previous } => previous.as_ref(),
            ConversionStatus::Idle | ConversionStatus::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ConversionError> {
        match self {
            ConversionStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ConversionStatus::Loading { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    Idle,
    Pending,
    Fetching,
}

/// What the view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub request: ConversionRequest,
    pub status: ConversionStatus,
    pub phase: DebouncePhase,
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub debounce: Duration,
    pub initial: ConversionRequest,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            debounce: DEFAULT_DEBOUNCE,
            initial: ConversionRequest::default(),
        }
    }
}

type Outcome = Result<ConversionResult, ConversionError>;

struct ControllerState {
    request: ConversionRequest,
    status: ConversionStatus,
    phase: DebouncePhase,
    timer: Option<AbortHandle>,
    timer_generation: u64,
    in_flight: Option<AbortHandle>,
    latest_ticket: u64,
    torn_down: bool,
}

impl ControllerState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            request: self.request.clone(),
            status: self.status.clone(),
            phase: self.phase,
        }
    }
}

struct Shared {
    fetcher: Arc<dyn RateFetcher>,
    debounce: Duration,
    state: Mutex<ControllerState>,
    updates: watch::Sender<Snapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ControllerState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Applies `apply` and, if it reports a change, restarts the debounce timer.
    ///
    /// A change also retires every attempt already running: their responses
    /// answer a request that no longer matches the inputs.
    fn edit(self: &Arc<Self>, apply: impl FnOnce(&mut ControllerState) -> bool) {
        let mut state = self.lock();
        if state.torn_down {
            debug!("Ignoring edit after teardown");
            return;
        }
        if !apply(&mut state) {
            return;
        }
        state.latest_ticket += 1;
        state.status = match std::mem::replace(&mut state.status, ConversionStatus::Idle) {
            ConversionStatus::Loading {
                previous: Some(result),
            } => ConversionStatus::Succeeded(result),
            ConversionStatus::Loading { previous: None } => ConversionStatus::Idle,
            status => status,
        };
        self.schedule(&mut state);
        self.publish(&state);
    }

    fn schedule(self: &Arc<Self>, state: &mut ControllerState) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer_generation += 1;
        let generation = state.timer_generation;
        let shared = Arc::clone(self);
        let delay = self.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire(generation).await;
        });
        state.timer = Some(task.abort_handle());
        state.phase = DebouncePhase::Pending;
        debug!(generation, ?delay, "Debounce timer scheduled");
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        {
            let mut state = self.lock();
            // A replacement timer may have been scheduled after this one woke up.
            if state.torn_down || state.timer_generation != generation {
                return;
            }
            if let Err(err) = state.request.parsed_amount() {
                debug!(amount = %state.request.amount, %err, "Debounce fired with invalid amount");
                state.timer = None;
                state.phase = DebouncePhase::Idle;
                self.publish(&state);
                return;
            }
            // The fetch runs on this task, teardown aborts it through this handle.
            state.in_flight = state.timer.take();
            state.phase = DebouncePhase::Fetching;
            self.publish(&state);
        }
        let _ = self.convert().await;
    }

    async fn convert(&self) -> Outcome {
        let (ticket, request, validated) = {
            let mut state = self.lock();
            if state.torn_down {
                debug!("Ignoring conversion after teardown");
                return Err(ConversionError::ShutDown);
            }
            state.latest_ticket += 1;
            let ticket = state.latest_ticket;
            let request = state.request.clone();
            let validated = request.parsed_amount();
            state.status = match &validated {
                Ok(_) => ConversionStatus::Loading {
                    previous: state.status.result().cloned(),
                },
                Err(err) => ConversionStatus::Failed(err.clone()),
            };
            match (&validated, state.phase) {
                (Ok(_), DebouncePhase::Idle) => state.phase = DebouncePhase::Fetching,
                (Err(_), DebouncePhase::Fetching) => state.phase = DebouncePhase::Idle,
                _ => {}
            }
            self.publish(&state);
            (ticket, request, validated)
        };

        let amount = match validated {
            Ok(amount) => amount,
            Err(err) => {
                debug!(amount = %request.amount, "Rejected conversion request");
                return Err(err);
            }
        };

        let mut guard = SettleGuard {
            shared: self,
            ticket,
            outcome: None,
        };
        let outcome = self.attempt(&request, amount).await;
        guard.outcome = Some(outcome.clone());
        drop(guard);
        outcome
    }

    async fn attempt(&self, request: &ConversionRequest, amount: Decimal) -> Outcome {
        debug!(source = %request.source, target = %request.target, "Fetching rate table");
        let table = self
            .fetcher
            .fetch_rates(&request.source)
            .await
            .map_err(|e| {
                warn!(error = %e, source = %request.source, "Failed to fetch exchange rates");
                ConversionError::NetworkFailure
            })?;

        let rate = table
            .rate_for(&request.target)
            .ok_or_else(|| ConversionError::CurrencyNotFound(request.target.clone()))?;

        conversion::compute(amount, rate)
    }

    fn settle(&self, ticket: u64, outcome: Outcome) {
        let mut state = self.lock();
        if state.torn_down {
            debug!(ticket, "Dropping response received after teardown");
            return;
        }
        if ticket != state.latest_ticket {
            debug!(
                ticket,
                latest = state.latest_ticket,
                "Discarding stale conversion response"
            );
            return;
        }
        state.status = match outcome {
            Ok(result) => ConversionStatus::Succeeded(result),
            Err(err) => ConversionStatus::Failed(err),
        };
        if state.phase == DebouncePhase::Fetching {
            state.phase = DebouncePhase::Idle;
        }
        self.publish(&state);
    }
}

/// Leaves the loading state however the attempt ends: normally, by panic, or
/// by the future being dropped mid-fetch.
struct SettleGuard<'a> {
    shared: &'a Shared,
    ticket: u64,
    outcome: Option<Outcome>,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(Err(ConversionError::NetworkFailure));
        self.shared.settle(self.ticket, outcome);
    }
}

/// Mediates between user edits and the rate fetcher.
///
/// Setters must be called from within a Tokio runtime since they spawn the
/// debounce timer. Dropping the controller tears it down.
pub struct ConversionController {
    shared: Arc<Shared>,
    catalog: Arc<Catalog>,
}

impl ConversionController {
    pub fn new(
        fetcher: Arc<dyn RateFetcher>,
        catalog: Arc<Catalog>,
        settings: ControllerSettings,
    ) -> Self {
        let state = ControllerState {
            request: settings.initial,
            status: ConversionStatus::Idle,
            phase: DebouncePhase::Idle,
            timer: None,
            timer_generation: 0,
            in_flight: None,
            latest_ticket: 0,
            torn_down: false,
        };
        let (updates, _) = watch::channel(state.snapshot());

        ConversionController {
            shared: Arc::new(Shared {
                fetcher,
                debounce: settings.debounce,
                state: Mutex::new(state),
                updates,
            }),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.updates.subscribe()
    }

    /// Schedules the first auto-conversion with the initial values.
    pub fn start(&self) {
        self.shared.edit(|_| true);
    }

    pub fn set_amount(&self, text: &str) {
        self.shared.edit(|state| {
            if state.request.amount == text {
                return false;
            }
            state.request.amount = text.to_string();
            true
        });
    }

    pub fn set_source_currency(&self, code: &str) {
        let code = self.checked_code(code);
        self.shared.edit(|state| {
            if state.request.source == code {
                return false;
            }
            state.request.source = code;
            true
        });
    }

    pub fn set_target_currency(&self, code: &str) {
        let code = self.checked_code(code);
        self.shared.edit(|state| {
            if state.request.target == code {
                return false;
            }
            state.request.target = code;
            true
        });
    }

    /// Exchanges source and target in one update and clears the status.
    pub fn swap(&self) {
        self.shared.edit(|state| {
            let request = &mut state.request;
            std::mem::swap(&mut request.source, &mut request.target);
            state.status = ConversionStatus::Idle;
            true
        });
    }

    /// Runs a conversion now with the current values and returns its outcome.
    ///
    /// The controller's status only reflects this outcome if no newer attempt
    /// started in the meantime.
    pub async fn convert(&self) -> Result<ConversionResult, ConversionError> {
        self.shared.convert().await
    }

    /// Cancels the pending timer and any in-flight fetch. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        for handle in [state.timer.take(), state.in_flight.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        state.phase = DebouncePhase::Idle;
        debug!("Conversion controller torn down");
    }

    fn checked_code(&self, code: &str) -> String {
        let code = conversion::normalize_code(code);
        if !self.catalog.contains(&code) {
            debug!(%code, "Currency code is not in the catalog");
        }
        code
    }
}

impl Drop for ConversionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
