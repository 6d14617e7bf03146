//! Run detail: one run plus its plan and apply output.
//!
//! The server owns run status. After an action succeeds the whole view is
//! fetched again; nothing is patched locally.

use super::pending::PendingGuard;
use crate::api::RunsApi;
use crate::error::{ApiError, ApiResult};
use crate::model::Run;
use crate::status::{RunAction, RunStatus};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Output of one phase, or the text shown in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogView {
    Text(String),
    Placeholder(&'static str),
}

impl LogView {
    pub fn text(&self) -> &str {
        match self {
            LogView::Text(t) => t,
            LogView::Placeholder(p) => p,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, LogView::Placeholder(_))
    }
}

pub fn plan_placeholder(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "Waiting for run to start...",
        RunStatus::Planning => "Plan is running...",
        _ => "No plan output available.",
    }
}

pub fn apply_placeholder(status: RunStatus) -> &'static str {
    match status {
        RunStatus::NeedsConfirmation => "Waiting for approval...",
        RunStatus::Applying => "Apply is running...",
        _ => "No apply output available.",
    }
}

fn log_view(
    fetched: ApiResult<String>,
    placeholder: &'static str,
    phase: &str,
    run_id: &str,
) -> LogView {
    match fetched {
        Ok(log) if !log.is_empty() => LogView::Text(log),
        Ok(_) => LogView::Placeholder(placeholder),
        Err(e) => {
            tracing::debug!(run_id, phase, error = %e, "log unavailable");
            LogView::Placeholder(placeholder)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunDetail {
    pub run: Run,
    pub plan_log: LogView,
    pub apply_log: LogView,
}

impl RunDetail {
    pub fn assemble(run: Run, plan: ApiResult<String>, apply: ApiResult<String>) -> Self {
        let plan_log = log_view(plan, plan_placeholder(run.status), "plan", &run.id);
        let apply_log = log_view(apply, apply_placeholder(run.status), "apply", &run.id);
        Self {
            run,
            plan_log,
            apply_log,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    pub fn available_actions(&self) -> Vec<RunAction> {
        self.run.status.available_actions()
    }
}

/// Result of an accepted action: the confirmation text and the re-fetched view.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: RunAction,
    pub message: &'static str,
    /// `None` when the view was closed while the refresh was in flight.
    pub detail: Option<RunDetail>,
}

pub struct RunDetailController<A> {
    api: Arc<A>,
    run_id: String,
    generation: AtomicU64,
    closed: AtomicBool,
    current: watch::Sender<Option<RunDetail>>,
    action: PendingGuard,
}

impl<A: RunsApi> RunDetailController<A> {
    pub fn new(api: Arc<A>, run_id: impl Into<String>) -> Self {
        Self {
            api,
            run_id: run_id.into(),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            current: watch::channel(None).0,
            action: PendingGuard::default(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn current(&self) -> Option<RunDetail> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RunDetail>> {
        self.current.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.action.is_busy()
    }

    /// Fetch the run, then both logs concurrently.
    ///
    /// Failing to fetch the run fails the load. Log failures degrade to
    /// placeholders. Returns `Ok(None)` when a newer load started or the view
    /// was closed before this one finished; such results are dropped.
    pub async fn load(&self) -> ApiResult<Option<RunDetail>> {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let run = match self.api.fetch_run(&self.run_id).await {
            Ok(run) => run,
            Err(e) if self.is_stale(generation) => {
                tracing::debug!(run_id = %self.run_id, error = %e, "dropping stale load error");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let (plan, apply) = tokio::join!(
            self.api.fetch_plan_log(&self.run_id),
            self.api.fetch_apply_log(&self.run_id),
        );
        let detail = RunDetail::assemble(run, plan, apply);

        if self.is_stale(generation) {
            tracing::debug!(run_id = %self.run_id, generation, "dropping stale load");
            return Ok(None);
        }
        self.check_progress(&detail);
        self.current.send_replace(Some(detail.clone()));
        Ok(Some(detail))
    }

    /// Log observations the server's state machine should never produce.
    fn check_progress(&self, next: &RunDetail) {
        let prev = self.current.borrow().as_ref().map(RunDetail::status);
        if let Some(prev) = prev {
            let next = next.status();
            if prev != next && !prev.can_transition_to(next) {
                tracing::warn!(run_id = %self.run_id, from = %prev, to = %next, "unexpected status transition");
            }
        }
        if !next.run.timeline_is_monotonic() {
            tracing::warn!(run_id = %self.run_id, "run timestamps go backwards");
        }
    }

    /// Trigger `action` against the last loaded status, then reload.
    pub async fn perform(&self, action: RunAction) -> ApiResult<ActionOutcome> {
        let status = self
            .current
            .borrow()
            .as_ref()
            .map(RunDetail::status)
            .unwrap_or(RunStatus::Unknown);
        if !action.is_legal_for(status) {
            return Err(ApiError::IllegalAction { action, status });
        }
        let _ticket = self.action.try_begin()?;

        let ack = self.api.perform_action(&self.run_id, action).await?;
        tracing::info!(run_id = %self.run_id, %action, server_message = %ack.message, "run action accepted");

        let detail = self.load().await?;
        Ok(ActionOutcome {
            action,
            message: action.success_message(),
            detail,
        })
    }

    /// Navigate away. Loads still in flight are discarded when they land.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.is_closed() || self.generation.load(Ordering::Acquire) != generation
    }
}
