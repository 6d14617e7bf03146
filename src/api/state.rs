use super::ApiClient;
use crate::error::ApiResult;
use crate::model::StateVersion;

impl ApiClient {
    /// Raw Terraform state document of the latest version.
    pub async fn current_state(&self, ws_id: &str) -> ApiResult<serde_json::Value> {
        self.get(&format!("/workspaces/{ws_id}/state")).await
    }

    /// Newest first, capped by the server.
    pub async fn list_state_versions(&self, ws_id: &str) -> ApiResult<Vec<StateVersion>> {
        self.get_list(&format!("/workspaces/{ws_id}/state-versions"))
            .await
    }

    /// Raw state document stored for one version.
    pub async fn get_state_version(
        &self,
        ws_id: &str,
        version_id: &str,
    ) -> ApiResult<serde_json::Value> {
        self.get(&format!("/workspaces/{ws_id}/state-versions/{version_id}"))
            .await
    }

    pub async fn state_outputs(&self, ws_id: &str) -> ApiResult<serde_json::Value> {
        self.get(&format!("/workspaces/{ws_id}/outputs")).await
    }
}
