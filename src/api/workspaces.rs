use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{CreateWorkspace, Message, UpdateWorkspace, Workspace};

impl ApiClient {
    pub async fn list_workspaces(&self, project_id: &str) -> ApiResult<Vec<Workspace>> {
        self.get_list(&format!("/projects/{project_id}/workspaces"))
            .await
    }

    pub async fn create_workspace(
        &self,
        project_id: &str,
        req: &CreateWorkspace,
    ) -> ApiResult<Workspace> {
        self.post(&format!("/projects/{project_id}/workspaces"), req)
            .await
    }

    pub async fn get_workspace(&self, id: &str) -> ApiResult<Workspace> {
        self.get(&format!("/workspaces/{id}")).await
    }

    pub async fn update_workspace(&self, id: &str, req: &UpdateWorkspace) -> ApiResult<Workspace> {
        self.put(&format!("/workspaces/{id}"), req).await
    }

    pub async fn delete_workspace(&self, id: &str) -> ApiResult<Message> {
        self.delete(&format!("/workspaces/{id}")).await
    }

    pub async fn lock_workspace(&self, id: &str) -> ApiResult<Message> {
        self.post_empty(&format!("/workspaces/{id}/lock")).await
    }

    pub async fn unlock_workspace(&self, id: &str) -> ApiResult<Message> {
        self.post_empty(&format!("/workspaces/{id}/unlock")).await
    }
}
