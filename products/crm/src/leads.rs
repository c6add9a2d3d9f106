//! Promotion of connected contact-form leads into Lead-stage deals.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use entity::{Amount, Stage, deal, lead};
use tracing::{debug, info, warn};

use crate::{backend::CrmBackend, error::PipelineResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeadSyncReport {
    pub created: usize,
    /// Connected leads that already had a deal, a quotation or a ledger entry.
    pub skipped: usize,
    pub failures: usize,
}

/// Leads a board has already handled, and pairs whose deal was purged.
#[derive(Debug, Default)]
pub struct PromotionLedger {
    inner: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    settled_leads: HashSet<String>,
    retired_pairs: HashSet<(String, String)>,
}

impl PromotionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Never promote the (deal name, client) pair again.
    pub fn retire(&self, deal_name: &str, client: &str) {
        self.lock()
            .retired_pairs
            .insert((deal_name.to_string(), client.to_string()));
    }

    pub fn is_settled(&self, lead: &lead::Model) -> bool {
        let state = self.lock();
        state.settled_leads.contains(&lead.id)
            || state
                .retired_pairs
                .contains(&(lead.lead_name.clone(), lead.name.clone()))
    }

    fn settle(&self, lead_id: &str) {
        self.lock().settled_leads.insert(lead_id.to_string());
    }
}

/// Create a Lead deal for every connected lead not yet on the board.
///
/// A (deal name, client) pair present as a deal in any stage or as a
/// quotation is skipped, so repeated runs create nothing new. Leads the
/// `ledger` has settled are skipped as well, even once their deal is gone.
pub async fn promote_connected_leads(
    backend: &dyn CrmBackend,
    ledger: &PromotionLedger,
) -> PipelineResult<LeadSyncReport> {
    let (leads, deals, quotations) = tokio::try_join!(
        backend.list_leads(),
        backend.list_deals(),
        backend.list_quotations()
    )
    .inspect_err(|err| warn!(error = %err, "lead sync fetch failed"))?;

    let mut known: HashSet<(String, String)> = deals
        .iter()
        .map(|deal| (deal.lead_name.clone(), deal.name.clone()))
        .chain(
            quotations
                .iter()
                .map(|q| (q.deal_name.clone(), q.client_name.clone())),
        )
        .collect();

    let mut report = LeadSyncReport::default();
    for lead in leads.iter().filter(|lead| lead.is_connected()) {
        let pair = (lead.lead_name.clone(), lead.name.clone());
        if ledger.is_settled(lead) || known.contains(&pair) {
            ledger.settle(&lead.id);
            report.skipped += 1;
            continue;
        }
        let body = deal::NewDeal {
            name: lead.name.clone(),
            lead_name: lead.lead_name.clone(),
            stage: Stage::Lead,
            amount: Amount::ZERO,
            scheduled_meeting: Some(Utc::now()),
            quotation_no: None,
            quotation_id: None,
        };
        match backend.create_deal(&body).await {
            Ok(()) => {
                debug!(lead_id = %lead.id, client = %lead.name, "lead promoted");
                ledger.settle(&lead.id);
                known.insert(pair);
                report.created += 1;
            }
            Err(err) => {
                warn!(lead_id = %lead.id, error = %err, "failed to promote lead");
                report.failures += 1;
            }
        }
    }

    if report.created > 0 || report.failures > 0 {
        info!(
            created = report.created,
            skipped = report.skipped,
            failures = report.failures,
            "connected leads synced"
        );
    }
    Ok(report)
}
