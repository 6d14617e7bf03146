//! Runs of one workspace, in the order the server returns them.

use super::pending::PendingGuard;
use crate::api::RunsApi;
use crate::error::ApiResult;
use crate::model::{CreateRun, Delta, Run, Workspace};
use crate::nav::Route;
use crate::status::{RunStatus, StatusMeta};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

/// One rendered row of the run list.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRow {
    pub id: String,
    pub title: &'static str,
    pub status: RunStatus,
    pub meta: StatusMeta,
    /// Non-zero resource counters only.
    pub deltas: Vec<Delta>,
    pub message: String,
    pub creator: String,
    pub created_at: OffsetDateTime,
}

impl From<&Run> for RunRow {
    fn from(run: &Run) -> Self {
        let message = if run.message.is_empty() {
            "No message".to_string()
        } else {
            run.message.clone()
        };
        Self {
            id: run.id.clone(),
            title: run.operation.short_title(),
            status: run.status,
            meta: run.status.meta(),
            deltas: run.deltas(),
            message,
            creator: run.creator_name().to_string(),
            created_at: run.created_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunListState {
    pub workspace: Option<Workspace>,
    pub runs: Vec<Run>,
    pub selected: usize,
}

pub struct WorkspaceRunList<A> {
    api: Arc<A>,
    ws_id: String,
    state: watch::Sender<RunListState>,
    create: PendingGuard,
    lock: PendingGuard,
}

impl<A: RunsApi> WorkspaceRunList<A> {
    pub fn new(api: Arc<A>, ws_id: impl Into<String>) -> Self {
        Self {
            api,
            ws_id: ws_id.into(),
            state: watch::channel(RunListState::default()).0,
            create: PendingGuard::default(),
            lock: PendingGuard::default(),
        }
    }

    pub fn workspace_id(&self) -> &str {
        &self.ws_id
    }

    pub fn subscribe(&self) -> watch::Receiver<RunListState> {
        self.state.subscribe()
    }

    /// Load the workspace and its runs together.
    pub async fn refresh(&self) -> ApiResult<()> {
        let (workspace, runs) = tokio::try_join!(
            self.api.fetch_workspace(&self.ws_id),
            self.api.fetch_runs(&self.ws_id),
        )?;
        self.state.send_modify(|s| {
            s.workspace = Some(workspace);
            s.runs = runs;
            s.selected = s.selected.min(s.runs.len().saturating_sub(1));
        });
        Ok(())
    }

    pub async fn refresh_runs(&self) -> ApiResult<()> {
        let runs = self.api.fetch_runs(&self.ws_id).await?;
        self.state.send_modify(|s| {
            s.runs = runs;
            s.selected = s.selected.min(s.runs.len().saturating_sub(1));
        });
        Ok(())
    }

    pub fn runs(&self) -> Vec<Run> {
        self.state.borrow().runs.clone()
    }

    pub fn rows(&self) -> Vec<RunRow> {
        self.state.borrow().runs.iter().map(RunRow::from).collect()
    }

    pub fn workspace(&self) -> Option<Workspace> {
        self.state.borrow().workspace.clone()
    }

    pub fn selected(&self) -> usize {
        self.state.borrow().selected
    }

    pub fn select_next(&self) {
        self.state.send_modify(|s| {
            if s.selected + 1 < s.runs.len() {
                s.selected += 1;
            }
        });
    }

    pub fn select_prev(&self) {
        self.state
            .send_modify(|s| s.selected = s.selected.saturating_sub(1));
    }

    pub fn selected_run_id(&self) -> Option<String> {
        let state = self.state.borrow();
        state.runs.get(state.selected).map(|r| r.id.clone())
    }

    /// Route to the detail view of the selected run.
    pub fn open_selected(&self) -> Option<Route> {
        self.selected_run_id().map(Route::Run)
    }

    /// Starting a run is not offered while the workspace is locked. The
    /// server still decides; this only hides the affordance.
    pub fn can_create_run(&self) -> bool {
        !self
            .state
            .borrow()
            .workspace
            .as_ref()
            .is_some_and(|ws| ws.locked)
    }

    pub fn is_creating(&self) -> bool {
        self.create.is_busy()
    }

    /// Submit a new run. A second submission while one is in flight fails
    /// with `Busy`. The list is reloaded after the server accepts the run.
    ///
    /// Once the server has accepted the run this returns it, even if the
    /// reload fails; the list then keeps its previous contents.
    pub async fn create_run(&self, req: &CreateRun) -> ApiResult<Run> {
        let _ticket = self.create.try_begin()?;
        let run = self.api.submit_run(&self.ws_id, req).await?;
        tracing::info!(ws_id = %self.ws_id, run_id = %run.id, operation = req.operation.as_str(), "run created");
        if let Err(e) = self.refresh_runs().await {
            tracing::warn!(ws_id = %self.ws_id, run_id = %run.id, error = %e, "run list reload after create failed");
        }
        Ok(run)
    }

    /// Lock or unlock, then re-read the workspace for the server's view.
    pub async fn set_locked(&self, locked: bool) -> ApiResult<Workspace> {
        let _ticket = self.lock.try_begin()?;
        self.api.set_workspace_lock(&self.ws_id, locked).await?;
        let ws = self.api.fetch_workspace(&self.ws_id).await?;
        self.state.send_modify(|s| s.workspace = Some(ws.clone()));
        Ok(ws)
    }

    /// Flip the lock relative to the last fetched workspace.
    pub async fn toggle_lock(&self) -> ApiResult<Workspace> {
        let locked = match self.workspace() {
            Some(ws) => ws.locked,
            None => self.api.fetch_workspace(&self.ws_id).await?.locked,
        };
        self.set_locked(!locked).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::{fixtures, RunOperation};
    use crate::orchestrator::fake::FakeRunsApi;

    fn list_with(runs: Vec<Run>, locked: bool) -> (Arc<FakeRunsApi>, WorkspaceRunList<FakeRunsApi>) {
        let api = Arc::new(FakeRunsApi::default());
        api.set_run_list(runs);
        api.set_workspace(fixtures::workspace("ws-1", locked));
        let list = WorkspaceRunList::new(api.clone(), "ws-1");
        (api, list)
    }

    #[tokio::test]
    async fn rows_keep_server_order_and_show_nonzero_deltas() {
        let mut older = fixtures::run("r-1", RunStatus::Applied);
        older.resources_added = 3;
        older.resources_deleted = 1;
        let mut newer = fixtures::run("r-2", RunStatus::NeedsConfirmation);
        newer.operation = RunOperation::Destroy;
        newer.message.clear();
        // Deliberately not chronological: the client must not re-sort.
        let (_, list) = list_with(vec![older, newer], false);
        list.refresh().await.unwrap();

        let rows = list.rows();
        assert_eq!(rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["r-1", "r-2"]);
        let deltas: Vec<String> = rows[0].deltas.iter().map(ToString::to_string).collect();
        assert_eq!(deltas, ["+3", "-1"]);
        assert_eq!(rows[0].meta.label, "Applied");
        assert_eq!(rows[1].title, "🗑️ Destroy");
        assert_eq!(rows[1].meta.short_label, "Needs Confirm");
        assert_eq!(rows[1].message, "No message");
        assert_eq!(rows[1].creator, "ada");
    }

    #[tokio::test]
    async fn selection_opens_run_route() {
        let runs = vec![
            fixtures::run("r-1", RunStatus::Applied),
            fixtures::run("r-2", RunStatus::Errored),
        ];
        let (_, list) = list_with(runs, false);
        list.refresh().await.unwrap();

        assert_eq!(list.open_selected(), Some(Route::Run("r-1".into())));
        list.select_next();
        list.select_next();
        assert_eq!(list.open_selected(), Some(Route::Run("r-2".into())));
        list.select_prev();
        assert_eq!(list.selected(), 0);
    }

    #[tokio::test]
    async fn empty_list_has_nothing_to_open() {
        let (_, list) = list_with(Vec::new(), false);
        list.refresh().await.unwrap();
        assert!(list.rows().is_empty());
        assert_eq!(list.open_selected(), None);
    }

    #[tokio::test]
    async fn create_run_refreshes_and_guards_double_submit() {
        let (api, list) = list_with(vec![fixtures::run("r-1", RunStatus::Applied)], false);
        let gate = api.gate_submit();
        let list = Arc::new(list);
        list.refresh().await.unwrap();

        let req = CreateRun {
            operation: RunOperation::Plan,
            message: Some("try it".into()),
            auto_apply: None,
        };
        let first = {
            let list = list.clone();
            let req = req.clone();
            tokio::spawn(async move { list.create_run(&req).await })
        };
        while !list.is_creating() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(list.create_run(&req).await, Err(ApiError::Busy)));

        gate.notify_one();
        let run = first.await.unwrap().unwrap();
        assert_eq!(run.operation, RunOperation::Plan);
        assert_eq!(api.submitted().len(), 1);
        assert_eq!(list.rows()[0].id, "r-new");
        assert_eq!(list.rows()[0].message, "try it");
        assert!(!list.is_creating());
    }

    #[tokio::test]
    async fn accepted_run_is_returned_when_reload_fails() {
        let (api, list) = list_with(vec![fixtures::run("r-1", RunStatus::Applied)], false);
        list.refresh().await.unwrap();
        api.break_run_list();

        let req = CreateRun {
            operation: RunOperation::PlanAndApply,
            message: None,
            auto_apply: None,
        };
        let run = list.create_run(&req).await.unwrap();
        assert_eq!(run.id, "r-new");
        assert_eq!(api.submitted().len(), 1);
        // Stale but intact.
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].id, "r-1");
        assert!(!list.is_creating());
    }

    #[tokio::test]
    async fn locked_workspace_hides_create() {
        let (_, list) = list_with(Vec::new(), true);
        assert!(list.can_create_run());
        list.refresh().await.unwrap();
        assert!(!list.can_create_run());
    }

    #[tokio::test]
    async fn toggle_lock_refetches_workspace() {
        let (api, list) = list_with(Vec::new(), false);
        list.refresh().await.unwrap();

        let ws = list.toggle_lock().await.unwrap();
        assert!(ws.locked);
        assert!(list.workspace().unwrap().locked);
        assert!(!list.can_create_run());

        let ws = list.toggle_lock().await.unwrap();
        assert!(!ws.locked);
        assert_eq!(api.lock_calls(), vec![true, false]);
    }

    #[tokio::test]
    async fn failed_lock_leaves_local_flag_untouched() {
        let (api, list) = list_with(Vec::new(), false);
        list.refresh().await.unwrap();
        let err = list.set_locked(false).await.unwrap_err();
        assert_eq!(err.user_message(), "Workspace is not locked");
        assert!(!list.workspace().unwrap().locked);
        assert_eq!(api.lock_calls(), vec![false]);
    }
}
