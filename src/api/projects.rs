use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{CreateProject, Message, Project, UpdateProject};

impl ApiClient {
    pub async fn list_projects(&self, org_id: &str) -> ApiResult<Vec<Project>> {
        self.get_list(&format!("/organizations/{org_id}/projects"))
            .await
    }

    pub async fn create_project(&self, org_id: &str, req: &CreateProject) -> ApiResult<Project> {
        self.post(&format!("/organizations/{org_id}/projects"), req)
            .await
    }

    pub async fn get_project(&self, id: &str) -> ApiResult<Project> {
        self.get(&format!("/projects/{id}")).await
    }

    pub async fn update_project(&self, id: &str, req: &UpdateProject) -> ApiResult<Project> {
        self.put(&format!("/projects/{id}"), req).await
    }

    pub async fn delete_project(&self, id: &str) -> ApiResult<Message> {
        self.delete(&format!("/projects/{id}")).await
    }
}
