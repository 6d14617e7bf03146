use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{CreateRun, LogBody, Message, Run, Workspace};
use crate::status::RunAction;
use async_trait::async_trait;

impl ApiClient {
    pub async fn list_runs(&self, ws_id: &str) -> ApiResult<Vec<Run>> {
        self.get_list(&format!("/workspaces/{ws_id}/runs")).await
    }

    pub async fn create_run(&self, ws_id: &str, req: &CreateRun) -> ApiResult<Run> {
        self.post(&format!("/workspaces/{ws_id}/runs"), req).await
    }

    pub async fn get_run(&self, id: &str) -> ApiResult<Run> {
        self.get(&format!("/runs/{id}")).await
    }

    /// 404 until the plan phase has produced output.
    pub async fn plan_log(&self, id: &str) -> ApiResult<String> {
        let body: LogBody = self.get(&format!("/runs/{id}/plan-log")).await?;
        Ok(body.log)
    }

    pub async fn apply_log(&self, id: &str) -> ApiResult<String> {
        let body: LogBody = self.get(&format!("/runs/{id}/apply-log")).await?;
        Ok(body.log)
    }

    /// POST `/runs/:id/{approve,discard,cancel}`. No request body.
    pub async fn run_action(&self, id: &str, action: RunAction) -> ApiResult<Message> {
        self.post_empty(&format!("/runs/{id}/{}", action.as_str()))
            .await
    }
}

/// The slice of the API the run views depend on.
#[async_trait]
pub trait RunsApi: Send + Sync {
    async fn fetch_run(&self, id: &str) -> ApiResult<Run>;
    async fn fetch_plan_log(&self, id: &str) -> ApiResult<String>;
    async fn fetch_apply_log(&self, id: &str) -> ApiResult<String>;
    async fn perform_action(&self, id: &str, action: RunAction) -> ApiResult<Message>;
    async fn fetch_runs(&self, ws_id: &str) -> ApiResult<Vec<Run>>;
    async fn submit_run(&self, ws_id: &str, req: &CreateRun) -> ApiResult<Run>;
    async fn fetch_workspace(&self, ws_id: &str) -> ApiResult<Workspace>;
    async fn set_workspace_lock(&self, ws_id: &str, locked: bool) -> ApiResult<Message>;
}

#[async_trait]
impl RunsApi for ApiClient {
    async fn fetch_run(&self, id: &str) -> ApiResult<Run> {
        self.get_run(id).await
    }

    async fn fetch_plan_log(&self, id: &str) -> ApiResult<String> {
        self.plan_log(id).await
    }

    async fn fetch_apply_log(&self, id: &str) -> ApiResult<String> {
        self.apply_log(id).await
    }

    async fn perform_action(&self, id: &str, action: RunAction) -> ApiResult<Message> {
        self.run_action(id, action).await
    }

    async fn fetch_runs(&self, ws_id: &str) -> ApiResult<Vec<Run>> {
        self.list_runs(ws_id).await
    }

    async fn submit_run(&self, ws_id: &str, req: &CreateRun) -> ApiResult<Run> {
        self.create_run(ws_id, req).await
    }

    async fn fetch_workspace(&self, ws_id: &str) -> ApiResult<Workspace> {
        self.get_workspace(ws_id).await
    }

    async fn set_workspace_lock(&self, ws_id: &str, locked: bool) -> ApiResult<Message> {
        if locked {
            self.lock_workspace(ws_id).await
        } else {
            self.unlock_workspace(ws_id).await
        }
    }
}
