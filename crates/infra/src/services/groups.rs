//! Savings-group operations.

use std::sync::Arc;

use ajo_domain::{
    ApiResult, ContributionRequest, Group, GroupMember, JoinGroupResponse, NewGroup, Payment,
};

use crate::api::ApiClient;

/// Group browsing, membership, and contributions.
pub struct GroupsService {
    client: Arc<ApiClient>,
}

impl GroupsService {
    /// Create the service.
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// All groups open to the user.
    pub async fn groups(&self) -> ApiResult<Vec<Group>> {
        self.client.get("/groups").await
    }

    /// Groups the user belongs to.
    pub async fn my_groups(&self) -> ApiResult<Vec<Group>> {
        self.client.get("/groups/my-groups").await
    }

    /// A single group.
    pub async fn group(&self, group_id: &str) -> ApiResult<Group> {
        self.client.get(&format!("/groups/{group_id}")).await
    }

    /// Members of a group, in payout order.
    pub async fn members(&self, group_id: &str) -> ApiResult<Vec<GroupMember>> {
        self.client.get(&format!("/groups/{group_id}/members")).await
    }

    /// Create a group.
    pub async fn create(&self, group: &NewGroup) -> ApiResult<Group> {
        self.client.post("/groups", group).await
    }

    /// Join a group. Queued for replay when offline.
    pub async fn join(&self, group_id: &str) -> ApiResult<JoinGroupResponse> {
        self.client.post(&format!("/groups/{group_id}/join"), &serde_json::json!({})).await
    }

    /// Contribute to the current cycle. Queued for replay when offline.
    pub async fn contribute(&self, group_id: &str, amount: i64) -> ApiResult<Payment> {
        self.client
            .post(&format!("/groups/{group_id}/contributions"), &ContributionRequest { amount })
            .await
    }
}
