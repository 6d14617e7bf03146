use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{CreateVariable, Message, UpdateVariable, Variable};

impl ApiClient {
    pub async fn list_variables(&self, ws_id: &str) -> ApiResult<Vec<Variable>> {
        self.get_list(&format!("/workspaces/{ws_id}/variables"))
            .await
    }

    pub async fn create_variable(&self, ws_id: &str, req: &CreateVariable) -> ApiResult<Variable> {
        self.post(&format!("/workspaces/{ws_id}/variables"), req)
            .await
    }

    pub async fn update_variable(
        &self,
        ws_id: &str,
        var_id: &str,
        req: &UpdateVariable,
    ) -> ApiResult<Variable> {
        self.put(&format!("/workspaces/{ws_id}/variables/{var_id}"), req)
            .await
    }

    pub async fn delete_variable(&self, ws_id: &str, var_id: &str) -> ApiResult<Message> {
        self.delete(&format!("/workspaces/{ws_id}/variables/{var_id}"))
            .await
    }
}
