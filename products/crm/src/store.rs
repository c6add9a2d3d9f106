use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use entity::{deal, quotation};
use tokio::sync::{RwLock, watch};
use tracing::{Instrument, debug, info_span, warn};

use crate::{
    backend::CrmBackend,
    error::{PipelineError, PipelineResult},
    reconcile::{ReconcileReport, Reconciler},
    view::{Card, PipelineView},
};

/// Last successfully applied fetch.
#[derive(Clone, Debug, Default)]
pub struct BoardSnapshot {
    pub deals: Vec<deal::Model>,
    pub quotations: Vec<quotation::Model>,
    pub view: PipelineView,
    pub generation: u64,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Applied {
        generation: u64,
        report: ReconcileReport,
    },
    /// The store was detached while the fetch was in flight.
    Discarded,
}

/// In-memory pipeline state, refreshed from both remote collections.
pub struct PipelineStore {
    backend: Arc<dyn CrmBackend>,
    reconciler: Reconciler,
    state: RwLock<BoardSnapshot>,
    attached: AtomicBool,
    changes: watch::Sender<u64>,
}

impl PipelineStore {
    pub fn new(backend: Arc<dyn CrmBackend>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            backend,
            reconciler: Reconciler::new(),
            state: RwLock::new(BoardSnapshot::default()),
            attached: AtomicBool::new(true),
            changes,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CrmBackend> {
        &self.backend
    }

    /// Fetch deals and quotations together, reconcile, then publish.
    ///
    /// A failed fetch leaves the previous snapshot in place.
    pub async fn load(&self) -> PipelineResult<LoadOutcome> {
        if !self.is_attached() {
            return Err(PipelineError::Detached);
        }

        let span = info_span!("crm.pipeline.load");
        let fetched = async {
            tokio::try_join!(self.backend.list_deals(), self.backend.list_quotations())
        }
        .instrument(span.clone())
        .await;
        let (deals, quotations) = match fetched {
            Ok(pair) => pair,
            Err(err) => {
                warn!(parent: &span, error = %err, "pipeline fetch failed; keeping previous state");
                return Err(err.into());
            }
        };

        if !self.is_attached() {
            debug!(parent: &span, "store detached during fetch; discarding response");
            return Ok(LoadOutcome::Discarded);
        }

        let report = self
            .reconciler
            .run(self.backend.as_ref(), &deals, &quotations)
            .instrument(span.clone())
            .await;
        let removed: HashSet<&str> = report.removed_ids().collect();
        let deals: Vec<deal::Model> = deals
            .into_iter()
            .filter(|deal| !removed.contains(deal.id.as_str()))
            .collect();

        if !self.is_attached() {
            debug!(parent: &span, "store detached during reconciliation; discarding response");
            return Ok(LoadOutcome::Discarded);
        }

        let view = PipelineView::derive(&deals, &quotations);
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.deals = deals;
            state.quotations = quotations;
            state.view = view;
            state.generation
        };
        debug!(parent: &span, generation, "pipeline snapshot applied");
        self.changes.send_replace(generation);
        Ok(LoadOutcome::Applied { generation, report })
    }

    /// Re-fetch after a mutation; a failed refresh is logged, not returned.
    pub(crate) async fn refresh(&self) {
        match self.load().await {
            Ok(_) | Err(PipelineError::Detached) => {}
            Err(err) => warn!(error = %err, "refresh after mutation failed"),
        }
    }

    pub async fn snapshot(&self) -> BoardSnapshot {
        self.state.read().await.clone()
    }

    pub async fn view(&self) -> PipelineView {
        self.state.read().await.view.clone()
    }

    /// Recompute the view from the stored collections.
    pub async fn derive_view(&self) -> PipelineView {
        let state = self.state.read().await;
        PipelineView::derive(&state.deals, &state.quotations)
    }

    pub async fn card(&self, id: &str) -> Option<Card> {
        self.state.read().await.view.card(id).cloned()
    }

    pub(crate) async fn require_card(&self, id: &str) -> PipelineResult<Card> {
        self.card(id)
            .await
            .ok_or_else(|| PipelineError::CardNotFound(id.to_string()))
    }

    /// Optimistically drop a card (and its deal) from local state.
    pub async fn remove_card(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        state.deals.retain(|deal| deal.id != id);
        let removed = state.view.remove(id);
        if removed {
            state.generation += 1;
            self.changes.send_replace(state.generation);
        }
        removed
    }

    /// Notified with the snapshot generation whenever the view changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    /// Stop accepting fetch results; late responses are dropped.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}
