//! In-memory backend for tests.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use entity::{deal, lead, meeting, quotation};
use platform_api::{ApiError, ApiResult, StatusCode};
use tokio::sync::Semaphore;

use crate::backend::CrmBackend;

/// Recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    ListDeals,
    CreateDeal(deal::NewDeal),
    UpdateDealStage { id: String, patch: deal::StagePatch },
    DeleteDeal(String),
    ListQuotations,
    CreateQuotation(quotation::NewQuotation),
    DeleteQuotation(String),
    ListLeads,
    CreateMeeting(meeting::NewMeeting),
    RestoreDeal(String),
}

impl BackendCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            BackendCall::ListDeals | BackendCall::ListQuotations | BackendCall::ListLeads
        )
    }
}

/// Operations that can be told to fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FakeOp {
    ListDeals,
    CreateDeal,
    UpdateDealStage,
    DeleteDeal,
    ListQuotations,
    CreateQuotation,
    DeleteQuotation,
    ListLeads,
    CreateMeeting,
    RestoreDeal,
}

#[derive(Default)]
struct FakeState {
    deals: Vec<deal::Model>,
    quotations: Vec<quotation::Model>,
    leads: Vec<lead::Model>,
    meetings: Vec<meeting::NewMeeting>,
    calls: Vec<BackendCall>,
    failing: HashSet<FakeOp>,
    read_gate: Option<Arc<Semaphore>>,
    parked_reads: usize,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct FakeCrmBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCrmBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_deal(self, deal: deal::Model) -> Self {
        self.lock().deals.push(deal);
        self
    }

    pub fn with_quotation(self, quotation: quotation::Model) -> Self {
        self.lock().quotations.push(quotation);
        self
    }

    pub fn with_lead(self, lead: lead::Model) -> Self {
        self.lock().leads.push(lead);
        self
    }

    pub fn deals(&self) -> Vec<deal::Model> {
        self.lock().deals.clone()
    }

    pub fn quotations(&self) -> Vec<quotation::Model> {
        self.lock().quotations.clone()
    }

    pub fn meetings(&self) -> Vec<meeting::NewMeeting> {
        self.lock().meetings.clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn mutations(&self) -> Vec<BackendCall> {
        self.calls().into_iter().filter(BackendCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn fail(&self, op: FakeOp) {
        self.lock().failing.insert(op);
    }

    /// Hold list reads until [`FakeCrmBackend::release_reads`].
    pub fn pause_reads(&self) {
        self.lock().read_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Reads that have reached a paused gate so far.
    pub fn parked_reads(&self) -> usize {
        self.lock().parked_reads
    }

    pub fn release_reads(&self) {
        if let Some(gate) = self.lock().read_gate.take() {
            gate.close();
        }
    }

    fn record(&self, call: BackendCall, op: FakeOp) -> ApiResult<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&op) {
            return Err(ApiError::Status {
                endpoint: format!("{op:?}"),
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: format!("{op:?} unavailable"),
            });
        }
        Ok(state)
    }

    async fn wait_for_reads(&self) {
        let gate = {
            let mut state = self.lock();
            state.parked_reads += usize::from(state.read_gate.is_some());
            state.read_gate.clone()
        };
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

fn not_found(endpoint: &str, id: &str) -> ApiError {
    ApiError::Status {
        endpoint: format!("{endpoint}/{id}"),
        status: StatusCode::NOT_FOUND,
        message: format!("{id} not found"),
    }
}

#[async_trait]
impl CrmBackend for FakeCrmBackend {
    async fn list_deals(&self) -> ApiResult<Vec<deal::Model>> {
        self.wait_for_reads().await;
        let state = self.record(BackendCall::ListDeals, FakeOp::ListDeals)?;
        Ok(state.deals.clone())
    }

    async fn create_deal(&self, body: &deal::NewDeal) -> ApiResult<()> {
        let mut state = self.record(BackendCall::CreateDeal(body.clone()), FakeOp::CreateDeal)?;
        let id = state.next_id("deal");
        state.deals.push(deal::Model {
            id,
            name: body.name.clone(),
            lead_name: body.lead_name.clone(),
            stage: body.stage,
            amount: body.amount,
            scheduled_meeting: body.scheduled_meeting,
            quotation_no: body.quotation_no.clone(),
            quotation_id: body.quotation_id.clone(),
            move_to_folder: None,
        });
        Ok(())
    }

    async fn update_deal_stage(&self, id: &str, patch: &deal::StagePatch) -> ApiResult<()> {
        let call = BackendCall::UpdateDealStage {
            id: id.to_string(),
            patch: patch.clone(),
        };
        let mut state = self.record(call, FakeOp::UpdateDealStage)?;
        let deal = state
            .deals
            .iter_mut()
            .find(|deal| deal.id == id)
            .ok_or_else(|| not_found("PUT /dealmanagement", id))?;
        deal.stage = patch.stage;
        deal.move_to_folder = patch.move_to_folder.clone();
        Ok(())
    }

    async fn delete_deal(&self, id: &str) -> ApiResult<()> {
        let mut state = self.record(BackendCall::DeleteDeal(id.to_string()), FakeOp::DeleteDeal)?;
        let before = state.deals.len();
        state.deals.retain(|deal| deal.id != id);
        if state.deals.len() == before {
            return Err(not_found("DELETE /dealmanagement", id));
        }
        Ok(())
    }

    async fn list_quotations(&self) -> ApiResult<Vec<quotation::Model>> {
        self.wait_for_reads().await;
        let state = self.record(BackendCall::ListQuotations, FakeOp::ListQuotations)?;
        Ok(state.quotations.clone())
    }

    async fn create_quotation(&self, body: &quotation::NewQuotation) -> ApiResult<()> {
        let mut state = self.record(
            BackendCall::CreateQuotation(body.clone()),
            FakeOp::CreateQuotation,
        )?;
        let id = state.next_id("quote");
        state.quotations.push(quotation::Model {
            id,
            deal_name: body.deal_name.clone(),
            client_name: body.client_name.clone(),
            quotation_no: body.quotation_no.clone(),
            date: body.date.clone(),
            items: body.items.clone(),
            details: body.details.clone(),
        });
        Ok(())
    }

    async fn delete_quotation(&self, id: &str) -> ApiResult<()> {
        let mut state = self.record(
            BackendCall::DeleteQuotation(id.to_string()),
            FakeOp::DeleteQuotation,
        )?;
        let before = state.quotations.len();
        state.quotations.retain(|quotation| quotation.id != id);
        if state.quotations.len() == before {
            return Err(not_found("DELETE /newquotations", id));
        }
        Ok(())
    }

    async fn list_leads(&self) -> ApiResult<Vec<lead::Model>> {
        let state = self.record(BackendCall::ListLeads, FakeOp::ListLeads)?;
        Ok(state.leads.clone())
    }

    async fn create_meeting(&self, body: &meeting::NewMeeting) -> ApiResult<()> {
        let mut state = self.record(
            BackendCall::CreateMeeting(body.clone()),
            FakeOp::CreateMeeting,
        )?;
        state.meetings.push(body.clone());
        Ok(())
    }

    async fn restore_deal(&self, id: &str) -> ApiResult<()> {
        let mut state = self.record(BackendCall::RestoreDeal(id.to_string()), FakeOp::RestoreDeal)?;
        let deal = state
            .deals
            .iter_mut()
            .find(|deal| deal.id == id)
            .ok_or_else(|| not_found("POST /recyclebin/restore", id))?;
        deal.stage = entity::Stage::Qualified;
        deal.move_to_folder = None;
        Ok(())
    }
}
