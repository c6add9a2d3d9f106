//! Stage changes: drag-and-drop moves, qualification, archiving, and the
//! per-stage card actions.

use std::sync::Arc;

use entity::{Amount, Stage, deal};
use tracing::{error, info, warn};

use crate::{
    error::{PipelineError, PipelineResult},
    meetings::MeetingForm,
    modal::{Modal, ModalState},
    quotations::QuotationDraft,
    store::PipelineStore,
    view::Card,
};

pub const LEAD_ONLY_TO_CONTACTED: &str =
    "Deals in the 'Lead' stage can only be moved to 'Contacted'.";
pub const INVALID_QUALIFIED_AMOUNT: &str = "Please enter a valid amount for the Qualified stage.";

/// What a drop of `card` onto a column should do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropPlan {
    Move(Stage),
    /// Proposal -> Qualified; an amount has to be collected first.
    NeedsAmount,
    Reject(String),
}

/// Decide a drop without touching any state.
pub fn plan_drop(card: &Card, target: Stage) -> DropPlan {
    use Stage::*;

    match (card.stage, target) {
        (from, to) if from == to => DropPlan::Reject(format!("Deal is already in '{to}'.")),
        (Lead, Contacted) => DropPlan::Move(Contacted),
        (Lead, _) => DropPlan::Reject(LEAD_ONLY_TO_CONTACTED.to_string()),
        (_, Archived) => DropPlan::Reject("Use Archive to move a deal to the recycle bin.".into()),
        (Contacted, Proposal) => {
            DropPlan::Reject("Use Send Quotation to move a deal to 'Proposal'.".into())
        }
        (Proposal, Qualified) if card.is_quotation() => DropPlan::NeedsAmount,
        (from, to) => DropPlan::Reject(format!("Deals cannot be moved from '{from}' to '{to}'.")),
    }
}

#[derive(Debug)]
pub enum DropOutcome {
    Moved { to: Stage },
    /// Open this dialog, then hand it to [`StageTransitionEngine::qualify`].
    AwaitingAmount(Modal<Amount>),
}

pub struct StageTransitionEngine {
    store: Arc<PipelineStore>,
}

impl StageTransitionEngine {
    pub fn new(store: Arc<PipelineStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PipelineStore> {
        &self.store
    }

    /// Handle a drop. Rejected drops perform no request.
    pub async fn apply_drop(&self, id: &str, target: Stage) -> PipelineResult<DropOutcome> {
        let card = self.store.require_card(id).await?;
        match plan_drop(&card, target) {
            DropPlan::Reject(message) => {
                info!(card_id = %id, from = %card.stage, to = %target, "drop rejected");
                Err(PipelineError::Rejected(message))
            }
            DropPlan::NeedsAmount => {
                Ok(DropOutcome::AwaitingAmount(Modal::qualified_amount(&card)))
            }
            DropPlan::Move(to) => {
                self.store
                    .backend()
                    .update_deal_stage(&card.id, &deal::StagePatch::to(to))
                    .await
                    .inspect_err(|err| warn!(card_id = %id, error = %err, "stage update failed"))?;
                info!(card_id = %id, from = %card.stage, %to, "deal moved");
                self.store.refresh().await;
                Ok(DropOutcome::Moved { to })
            }
        }
    }

    /// Finish a Proposal -> Qualified move: delete the quotation, then record
    /// a Qualified deal with the entered amount.
    ///
    /// Input still being collected is submitted here. A refused or cancelled
    /// amount aborts before any request.
    pub async fn qualify(&self, id: &str, modal: &mut Modal<Amount>) -> PipelineResult<Amount> {
        let card = self.store.require_card(id).await?;
        if !card.is_quotation() {
            return Err(PipelineError::rejected(format!(
                "Deals cannot be moved from '{}' to 'Qualified'.",
                card.stage
            )));
        }
        let amount = confirmed_amount(modal)?;

        let backend = self.store.backend();
        backend
            .delete_quotation(&card.id)
            .await
            .inspect_err(|err| warn!(quotation_id = %id, error = %err, "quotation delete failed"))?;

        let body = deal::NewDeal {
            name: card.client_name.clone(),
            lead_name: card.deal_name.clone(),
            stage: Stage::Qualified,
            amount,
            scheduled_meeting: card.scheduled_meeting,
            quotation_no: card.quotation_no.clone(),
            quotation_id: None,
        };
        let created = backend.create_deal(&body).await;
        self.store.refresh().await;
        if let Err(err) = created {
            error!(
                quotation_id = %id,
                deal_name = %card.deal_name,
                error = %err,
                "quotation removed but qualified deal was not created"
            );
            return Err(err.into());
        }
        info!(quotation_id = %id, %amount, "deal qualified");
        Ok(amount)
    }

    /// Archive a deal-backed card once `confirm` holds a yes.
    pub async fn archive(&self, id: &str, confirm: &mut Modal<()>) -> PipelineResult<()> {
        let card = self.store.require_card(id).await?;
        if card.is_quotation() {
            return Err(PipelineError::rejected(
                "Quotations cannot be archived; qualify or delete the quotation instead.",
            ));
        }
        if card.stage == Stage::Archived {
            return Err(PipelineError::rejected("Deal is already archived."));
        }
        if confirm.take_confirmed().is_none() {
            return Err(PipelineError::Cancelled);
        }

        self.store
            .backend()
            .update_deal_stage(&card.id, &deal::StagePatch::archive())
            .await
            .inspect_err(|err| warn!(deal_id = %id, error = %err, "archive failed"))?;
        info!(deal_id = %id, folder = deal::ARCHIVE_FOLDER, "deal archived");
        self.store.remove_card(id).await;
        self.store.refresh().await;
        Ok(())
    }

    /// Contacted cards only. Reconciliation on the following load replaces
    /// the Contacted deal with the quotation's Proposal card.
    pub async fn send_quotation(&self, id: &str, draft: &QuotationDraft) -> PipelineResult<()> {
        let card = self.store.require_card(id).await?;
        if card.stage != Stage::Contacted {
            return Err(PipelineError::rejected(
                "Quotations can only be sent for deals in the 'Contacted' stage.",
            ));
        }
        let body = draft.validate()?;
        self.store
            .backend()
            .create_quotation(&body)
            .await
            .inspect_err(|err| warn!(deal_id = %id, error = %err, "quotation create failed"))?;
        let total: Amount = body.items.iter().map(|item| item.amount).sum();
        info!(deal_id = %id, quotation_no = %body.quotation_no, %total, "quotation sent");
        self.store.refresh().await;
        Ok(())
    }

    /// Lead cards only.
    pub async fn schedule_meeting(&self, id: &str, form: &MeetingForm) -> PipelineResult<()> {
        let card = self.store.require_card(id).await?;
        if card.stage != Stage::Lead {
            return Err(PipelineError::rejected(
                "Meetings can only be scheduled for deals in the 'Lead' stage.",
            ));
        }
        let body = form.validate()?;
        self.store
            .backend()
            .create_meeting(&body)
            .await
            .inspect_err(|err| warn!(deal_id = %id, error = %err, "meeting create failed"))?;
        info!(deal_id = %id, date = %body.date, "meeting scheduled");
        self.store.refresh().await;
        Ok(())
    }
}

fn confirmed_amount(modal: &mut Modal<Amount>) -> PipelineResult<Amount> {
    if let ModalState::CollectingInput { input, .. } = modal.state() {
        let parsed = Amount::parse_positive(input);
        modal.submit_amount();
        parsed?;
    }
    match (modal.cancel_reason().is_some(), modal.take_confirmed()) {
        (_, Some(amount)) => Ok(amount),
        (true, None) => Err(PipelineError::validation(INVALID_QUALIFIED_AMOUNT)),
        (false, None) => Err(PipelineError::Cancelled),
    }
}
