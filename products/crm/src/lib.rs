//! CRM pipeline board: Lead, Contacted, Proposal and Qualified columns built
//! from the deal and quotation collections of the CRM REST API.

pub mod backend;
pub mod board;
pub mod error;
pub mod leads;
pub mod meetings;
pub mod modal;
pub mod poller;
pub mod quotations;
pub mod reconcile;
pub mod recycle_bin;
pub mod store;
pub mod transition;
pub mod view;

#[cfg(test)]
mod fake;
#[cfg(test)]
mod testing;

pub use backend::CrmBackend;
pub use board::{BoardSettings, DEFAULT_POLL_INTERVAL, PipelineBoard};
pub use error::{PipelineError, PipelineResult};
pub use leads::{LeadSyncReport, PromotionLedger, promote_connected_leads};
pub use meetings::MeetingForm;
pub use modal::{Modal, ModalState};
pub use poller::{PollHandle, Poller};
pub use quotations::{DraftItem, QuotationDraft};
pub use reconcile::{ReconcileReport, Reconciler};
pub use recycle_bin::RecycleBin;
pub use store::{BoardSnapshot, LoadOutcome, PipelineStore};
pub use transition::{DropOutcome, DropPlan, StageTransitionEngine, plan_drop};
pub use view::{Card, CardSource, Column, PipelineView};
