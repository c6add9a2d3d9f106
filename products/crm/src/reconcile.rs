//! Cleanup pass run after every fetch: drops Lead/Contacted deals that a
//! quotation has superseded and keeps one Proposal mirror deal per quotation.

use std::collections::HashSet;

use entity::{Stage, deal, quotation};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::CrmBackend;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Deals deleted because a quotation now backs the same pair.
    pub duplicates_removed: Vec<String>,
    pub mirrors_created: usize,
    /// Proposal mirrors whose quotation is gone.
    pub mirrors_pruned: Vec<String>,
    pub failures: usize,
    /// Another pass was already running.
    pub skipped: bool,
}

impl ReconcileReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Deal ids that no longer exist remotely after this pass.
    pub fn removed_ids(&self) -> impl Iterator<Item = &str> {
        self.duplicates_removed
            .iter()
            .chain(self.mirrors_pruned.iter())
            .map(String::as_str)
    }

    pub fn is_noop(&self) -> bool {
        self.duplicates_removed.is_empty()
            && self.mirrors_created == 0
            && self.mirrors_pruned.is_empty()
            && self.failures == 0
    }
}

/// Single-flight guard around the reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciler {
    in_flight: Mutex<()>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best effort: failures are logged and counted, never retried.
    pub async fn run(
        &self,
        backend: &dyn CrmBackend,
        deals: &[deal::Model],
        quotations: &[quotation::Model],
    ) -> ReconcileReport {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("reconciliation already running; skipping pass");
            return ReconcileReport::skipped();
        };

        let mut report = ReconcileReport::default();
        remove_duplicates(backend, deals, quotations, &mut report).await;
        create_missing_mirrors(backend, deals, quotations, &mut report).await;
        prune_orphan_mirrors(backend, deals, quotations, &mut report).await;

        if !report.is_noop() {
            info!(
                duplicates_removed = report.duplicates_removed.len(),
                mirrors_created = report.mirrors_created,
                mirrors_pruned = report.mirrors_pruned.len(),
                failures = report.failures,
                "pipeline reconciled"
            );
        }
        report
    }
}

async fn remove_duplicates(
    backend: &dyn CrmBackend,
    deals: &[deal::Model],
    quotations: &[quotation::Model],
    report: &mut ReconcileReport,
) {
    let mut seen = HashSet::new();
    for quotation in quotations {
        let superseded = deals.iter().filter(|deal| {
            matches!(deal.stage, Stage::Lead | Stage::Contacted)
                && deal.same_pair(&quotation.deal_name, &quotation.client_name)
        });
        for deal in superseded {
            if !seen.insert(deal.id.as_str()) {
                continue;
            }
            match backend.delete_deal(&deal.id).await {
                Ok(()) => {
                    debug!(
                        deal_id = %deal.id,
                        quotation_id = %quotation.id,
                        "removed superseded deal"
                    );
                    report.duplicates_removed.push(deal.id.clone());
                }
                Err(err) => {
                    warn!(
                        deal_id = %deal.id,
                        deal_name = %quotation.deal_name,
                        client = %quotation.client_name,
                        error = %err,
                        "failed to remove superseded deal"
                    );
                    report.failures += 1;
                }
            }
        }
    }
}

async fn create_missing_mirrors(
    backend: &dyn CrmBackend,
    deals: &[deal::Model],
    quotations: &[quotation::Model],
    report: &mut ReconcileReport,
) {
    let mirrored: HashSet<&str> = deals
        .iter()
        .filter(|deal| deal.stage == Stage::Proposal)
        .filter_map(|deal| deal.quotation_id.as_deref())
        .collect();

    for quotation in quotations {
        if mirrored.contains(quotation.id.as_str()) {
            continue;
        }
        let body = deal::NewDeal {
            name: quotation.client_name.clone(),
            lead_name: quotation.deal_name.clone(),
            stage: Stage::Proposal,
            amount: quotation.total(),
            scheduled_meeting: None,
            quotation_no: Some(quotation.quotation_no.clone()).filter(|no| !no.is_empty()),
            quotation_id: Some(quotation.id.clone()),
        };
        match backend.create_deal(&body).await {
            Ok(()) => report.mirrors_created += 1,
            Err(err) => {
                warn!(quotation_id = %quotation.id, error = %err, "failed to mirror quotation");
                report.failures += 1;
            }
        }
    }
}

async fn prune_orphan_mirrors(
    backend: &dyn CrmBackend,
    deals: &[deal::Model],
    quotations: &[quotation::Model],
    report: &mut ReconcileReport,
) {
    let live: HashSet<&str> = quotations.iter().map(|q| q.id.as_str()).collect();
    let orphans = deals.iter().filter(|deal| {
        deal.stage == Stage::Proposal
            && deal
                .quotation_id
                .as_deref()
                .is_some_and(|id| !live.contains(id))
    });
    for deal in orphans {
        match backend.delete_deal(&deal.id).await {
            Ok(()) => report.mirrors_pruned.push(deal.id.clone()),
            Err(err) => {
                warn!(deal_id = %deal.id, error = %err, "failed to prune proposal mirror");
                report.failures += 1;
            }
        }
    }
}
