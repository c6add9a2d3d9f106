//! The pipeline board as a front-end sees it.

use std::{sync::Arc, time::Duration};

use entity::deal;
use tracing::{info, warn};

use crate::{
    backend::CrmBackend,
    error::PipelineResult,
    leads::{LeadSyncReport, PromotionLedger, promote_connected_leads},
    modal::Modal,
    poller::{PollHandle, Poller},
    recycle_bin::RecycleBin,
    store::{LoadOutcome, PipelineStore},
    transition::StageTransitionEngine,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct BoardSettings {
    pub poll_interval: Duration,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct PipelineBoard {
    store: Arc<PipelineStore>,
    engine: StageTransitionEngine,
    bin: RecycleBin,
    ledger: Arc<PromotionLedger>,
    settings: BoardSettings,
    poller: Option<PollHandle>,
}

impl PipelineBoard {
    pub fn new(backend: Arc<dyn CrmBackend>, settings: BoardSettings) -> Self {
        let store = Arc::new(PipelineStore::new(backend.clone()));
        let ledger = Arc::new(PromotionLedger::new());
        Self {
            engine: StageTransitionEngine::new(store.clone()),
            bin: RecycleBin::new(backend, ledger.clone()),
            ledger,
            store,
            settings,
            poller: None,
        }
    }

    pub fn store(&self) -> &Arc<PipelineStore> {
        &self.store
    }

    pub fn transitions(&self) -> &StageTransitionEngine {
        &self.engine
    }

    pub fn recycle_bin(&self) -> &RecycleBin {
        &self.bin
    }

    pub fn is_active(&self) -> bool {
        self.poller.as_ref().is_some_and(PollHandle::is_running)
    }

    /// Promote connected leads this board has not handled before.
    pub async fn sync_connected_leads(&self) -> PipelineResult<LeadSyncReport> {
        promote_connected_leads(self.store.backend().as_ref(), &self.ledger).await
    }

    /// A failed sync is logged and the board still opens.
    async fn sync_before_load(&self) {
        if let Err(err) = self.sync_connected_leads().await {
            warn!(error = %err, "lead sync failed");
        }
    }

    /// Sync leads, then load once without polling.
    pub async fn open(&self) -> PipelineResult<LoadOutcome> {
        self.store.attach();
        self.sync_before_load().await;
        self.store.load().await
    }

    /// Sync leads and start polling. Calling it again restarts the poller.
    pub async fn activate(&mut self) -> PipelineResult<()> {
        self.deactivate().await;
        self.store.attach();
        self.sync_before_load().await;
        let poller = Poller::start(self.store.clone(), self.settings.poll_interval)?;
        self.poller = Some(poller);
        info!(interval_secs = self.settings.poll_interval.as_secs(), "pipeline board active");
        Ok(())
    }

    /// Stop polling; responses still in flight are discarded.
    pub async fn deactivate(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
            info!("pipeline board inactive");
        }
    }

    /// Archive, then refresh the recycle bin so the deal shows up there.
    pub async fn archive(
        &self,
        id: &str,
        confirm: &mut Modal<()>,
    ) -> PipelineResult<Vec<deal::Model>> {
        self.engine.archive(id, confirm).await?;
        match self.bin.list_archived().await {
            Ok(archived) => Ok(archived),
            Err(err) => {
                warn!(error = %err, "recycle bin refresh failed after archive");
                Ok(self.bin.archived().await)
            }
        }
    }
}
