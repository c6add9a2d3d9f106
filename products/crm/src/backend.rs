use async_trait::async_trait;
use entity::{deal, lead, meeting, quotation};
use platform_api::{ApiResult, CrmClient};

/// Remote collections the pipeline board reads and mutates.
///
/// [`CrmClient`] is the production implementation; tests use
/// `FakeCrmBackend`.
#[async_trait]
pub trait CrmBackend: Send + Sync {
    async fn list_deals(&self) -> ApiResult<Vec<deal::Model>>;
    async fn create_deal(&self, body: &deal::NewDeal) -> ApiResult<()>;
    async fn update_deal_stage(&self, id: &str, patch: &deal::StagePatch) -> ApiResult<()>;
    async fn delete_deal(&self, id: &str) -> ApiResult<()>;
    async fn list_quotations(&self) -> ApiResult<Vec<quotation::Model>>;
    async fn create_quotation(&self, body: &quotation::NewQuotation) -> ApiResult<()>;
    async fn delete_quotation(&self, id: &str) -> ApiResult<()>;
    async fn list_leads(&self) -> ApiResult<Vec<lead::Model>>;
    async fn create_meeting(&self, body: &meeting::NewMeeting) -> ApiResult<()>;
    async fn restore_deal(&self, id: &str) -> ApiResult<()>;
}

#[async_trait]
impl CrmBackend for CrmClient {
    async fn list_deals(&self) -> ApiResult<Vec<deal::Model>> {
        CrmClient::list_deals(self).await
    }

    async fn create_deal(&self, body: &deal::NewDeal) -> ApiResult<()> {
        CrmClient::create_deal(self, body).await
    }

    async fn update_deal_stage(&self, id: &str, patch: &deal::StagePatch) -> ApiResult<()> {
        CrmClient::update_deal_stage(self, id, patch).await
    }

    async fn delete_deal(&self, id: &str) -> ApiResult<()> {
        CrmClient::delete_deal(self, id).await
    }

    async fn list_quotations(&self) -> ApiResult<Vec<quotation::Model>> {
        CrmClient::list_quotations(self).await
    }

    async fn create_quotation(&self, body: &quotation::NewQuotation) -> ApiResult<()> {
        CrmClient::create_quotation(self, body).await
    }

    async fn delete_quotation(&self, id: &str) -> ApiResult<()> {
        CrmClient::delete_quotation(self, id).await
    }

    async fn list_leads(&self) -> ApiResult<Vec<lead::Model>> {
        CrmClient::list_leads(self).await
    }

    async fn create_meeting(&self, body: &meeting::NewMeeting) -> ApiResult<()> {
        CrmClient::create_meeting(self, body).await
    }

    async fn restore_deal(&self, id: &str) -> ApiResult<()> {
        CrmClient::restore_deal(self, id).await
    }
}
