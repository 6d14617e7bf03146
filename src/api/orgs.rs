use super::ApiClient;
use crate::error::ApiResult;
use crate::model::{
    AddMember, CreateOrganization, Message, OrgMember, Organization, UpdateMember,
    UpdateOrganization,
};

impl ApiClient {
    pub async fn list_organizations(&self) -> ApiResult<Vec<Organization>> {
        self.get_list("/organizations").await
    }

    pub async fn create_organization(&self, req: &CreateOrganization) -> ApiResult<Organization> {
        self.post("/organizations", req).await
    }

    pub async fn get_organization(&self, id: &str) -> ApiResult<Organization> {
        self.get(&format!("/organizations/{id}")).await
    }

    pub async fn update_organization(
        &self,
        id: &str,
        req: &UpdateOrganization,
    ) -> ApiResult<Organization> {
        self.put(&format!("/organizations/{id}"), req).await
    }

    pub async fn delete_organization(&self, id: &str) -> ApiResult<Message> {
        self.delete(&format!("/organizations/{id}")).await
    }

    pub async fn list_members(&self, org_id: &str) -> ApiResult<Vec<OrgMember>> {
        self.get_list(&format!("/organizations/{org_id}/members")).await
    }

    pub async fn add_member(&self, org_id: &str, req: &AddMember) -> ApiResult<OrgMember> {
        self.post(&format!("/organizations/{org_id}/members"), req)
            .await
    }

    pub async fn update_member(
        &self,
        org_id: &str,
        member_id: &str,
        req: &UpdateMember,
    ) -> ApiResult<Message> {
        self.put(&format!("/organizations/{org_id}/members/{member_id}"), req)
            .await
    }

    pub async fn remove_member(&self, org_id: &str, member_id: &str) -> ApiResult<Message> {
        self.delete(&format!("/organizations/{org_id}/members/{member_id}"))
            .await
    }
}
