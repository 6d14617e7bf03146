use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{InstallResult, TfVersion};

impl ApiClient {
    /// Stable releases known upstream, newest first.
    pub async fn terraform_versions(&self) -> ApiResult<Vec<TfVersion>> {
        self.get_list("/terraform/versions").await
    }

    pub async fn installed_terraform_versions(&self) -> ApiResult<Vec<TfVersion>> {
        self.get_list("/terraform/versions/installed").await
    }

    pub async fn install_terraform(&self, version: &str) -> ApiResult<InstallResult> {
        self.post_empty(&format!("/terraform/versions/{version}/install"))
            .await
    }
}
