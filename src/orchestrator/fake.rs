//! Scripted in-memory `RunsApi` for controller tests.

use crate::api::RunsApi;
use crate::error::{ApiError, ApiResult};
use crate::model::{fixtures, CreateRun, Message, Run, Workspace};
use crate::status::{RunAction, RunStatus};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn not_found(what: &str) -> ApiError {
    ApiError::Api {
        status: StatusCode::NOT_FOUND,
        message: format!("{what} not found"),
    }
}

#[derive(Default)]
pub(crate) struct FakeRunsApi {
    runs: Mutex<HashMap<String, Run>>,
    plan_logs: Mutex<HashMap<String, String>>,
    apply_logs: Mutex<HashMap<String, String>>,
    run_list: Mutex<Vec<Run>>,
    workspace: Mutex<Option<Workspace>>,
    next_status: Mutex<HashMap<RunAction, RunStatus>>,
    action_failure: Mutex<Option<(StatusCode, String)>>,
    actions: Mutex<Vec<RunAction>>,
    submitted: Mutex<Vec<CreateRun>>,
    lock_calls: Mutex<Vec<bool>>,
    unauthorized: AtomicBool,
    run_list_down: AtomicBool,
    fetch_run_calls: AtomicUsize,
    fetch_runs_calls: AtomicUsize,
    action_gate: Mutex<Option<Arc<Notify>>>,
    fetch_run_gate: Mutex<Option<Arc<Notify>>>,
    submit_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeRunsApi {
    pub(crate) fn with_run(id: &str, status: RunStatus) -> Self {
        let api = Self::default();
        api.put_run(fixtures::run(id, status));
        api
    }

    pub(crate) fn put_run(&self, run: Run) {
        self.runs.lock().unwrap().insert(run.id.clone(), run);
    }

    pub(crate) fn remove_run(&self, id: &str) {
        self.runs.lock().unwrap().remove(id);
    }

    pub(crate) fn set_status(&self, id: &str, status: RunStatus) {
        if let Some(run) = self.runs.lock().unwrap().get_mut(id) {
            run.status = status;
        }
    }

    pub(crate) fn set_plan_log(&self, id: &str, log: &str) {
        self.plan_logs.lock().unwrap().insert(id.into(), log.into());
    }

    pub(crate) fn set_apply_log(&self, id: &str, log: &str) {
        self.apply_logs.lock().unwrap().insert(id.into(), log.into());
    }

    pub(crate) fn set_run_list(&self, runs: Vec<Run>) {
        *self.run_list.lock().unwrap() = runs;
    }

    pub(crate) fn set_workspace(&self, ws: Workspace) {
        *self.workspace.lock().unwrap() = Some(ws);
    }

    /// Status the server moves the run to when `action` is accepted.
    pub(crate) fn on_action(&self, action: RunAction, next: RunStatus) {
        self.next_status.lock().unwrap().insert(action, next);
    }

    pub(crate) fn fail_actions(&self, status: StatusCode, message: &str) {
        *self.action_failure.lock().unwrap() = Some((status, message.into()));
    }

    /// Run list requests fail with a 500 from now on.
    pub(crate) fn break_run_list(&self) {
        self.run_list_down.store(true, Ordering::SeqCst);
    }

    pub(crate) fn expire_session(&self) {
        self.unauthorized.store(true, Ordering::SeqCst);
    }

    pub(crate) fn gate_actions(&self) -> Arc<Notify> {
        Self::install_gate(&self.action_gate)
    }

    pub(crate) fn gate_fetch_run(&self) -> Arc<Notify> {
        Self::install_gate(&self.fetch_run_gate)
    }

    pub(crate) fn gate_submit(&self) -> Arc<Notify> {
        Self::install_gate(&self.submit_gate)
    }

    fn install_gate(slot: &Mutex<Option<Arc<Notify>>>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *slot.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn pass(slot: &Mutex<Option<Arc<Notify>>>) {
        let gate = slot.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    pub(crate) fn actions(&self) -> Vec<RunAction> {
        self.actions.lock().unwrap().clone()
    }

    pub(crate) fn submitted(&self) -> Vec<CreateRun> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn lock_calls(&self) -> Vec<bool> {
        self.lock_calls.lock().unwrap().clone()
    }

    pub(crate) fn fetch_run_calls(&self) -> usize {
        self.fetch_run_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fetch_runs_calls(&self) -> usize {
        self.fetch_runs_calls.load(Ordering::SeqCst)
    }

    fn check_session(&self) -> ApiResult<()> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized {
                message: "Unauthorized".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RunsApi for FakeRunsApi {
    async fn fetch_run(&self, id: &str) -> ApiResult<Run> {
        self.fetch_run_calls.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.fetch_run_gate).await;
        self.check_session()?;
        self.runs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Run"))
    }

    async fn fetch_plan_log(&self, id: &str) -> ApiResult<String> {
        self.check_session()?;
        self.plan_logs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Plan log"))
    }

    async fn fetch_apply_log(&self, id: &str) -> ApiResult<String> {
        self.check_session()?;
        self.apply_logs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Apply log"))
    }

    async fn perform_action(&self, id: &str, action: RunAction) -> ApiResult<Message> {
        self.actions.lock().unwrap().push(action);
        Self::pass(&self.action_gate).await;
        self.check_session()?;
        let failure = self.action_failure.lock().unwrap().clone();
        if let Some((status, message)) = failure {
            return Err(ApiError::Api { status, message });
        }
        let next = self
            .next_status
            .lock()
            .unwrap()
            .get(&action)
            .copied()
            .unwrap_or(action.expected_next());
        self.set_status(id, next);
        Ok(Message {
            message: format!("{action} accepted"),
        })
    }

    async fn fetch_runs(&self, _ws_id: &str) -> ApiResult<Vec<Run>> {
        self.fetch_runs_calls.fetch_add(1, Ordering::SeqCst);
        self.check_session()?;
        if self.run_list_down.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to list runs".into(),
            });
        }
        Ok(self.run_list.lock().unwrap().clone())
    }

    async fn submit_run(&self, ws_id: &str, req: &CreateRun) -> ApiResult<Run> {
        self.submitted.lock().unwrap().push(req.clone());
        Self::pass(&self.submit_gate).await;
        self.check_session()?;
        let mut run = fixtures::run("r-new", RunStatus::Pending);
        run.workspace_id = ws_id.to_string();
        run.operation = req.operation;
        run.message = req.message.clone().unwrap_or_default();
        self.run_list.lock().unwrap().insert(0, run.clone());
        Ok(run)
    }

    async fn fetch_workspace(&self, ws_id: &str) -> ApiResult<Workspace> {
        self.check_session()?;
        self.workspace
            .lock()
            .unwrap()
            .clone()
            .filter(|ws| ws.id == ws_id)
            .ok_or_else(|| not_found("Workspace"))
    }

    async fn set_workspace_lock(&self, _ws_id: &str, locked: bool) -> ApiResult<Message> {
        self.lock_calls.lock().unwrap().push(locked);
        self.check_session()?;
        let mut ws = self.workspace.lock().unwrap();
        let ws = ws.as_mut().ok_or_else(|| not_found("Workspace"))?;
        if ws.locked == locked {
            return Err(ApiError::Api {
                status: StatusCode::CONFLICT,
                message: if locked {
                    "Workspace is already locked".into()
                } else {
                    "Workspace is not locked".into()
                },
            });
        }
        ws.locked = locked;
        Ok(Message {
            message: if locked {
                "Workspace locked".into()
            } else {
                "Workspace unlocked".into()
            },
        })
    }
}
