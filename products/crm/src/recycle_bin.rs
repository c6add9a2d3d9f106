use std::sync::Arc;

use entity::{Stage, deal};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{backend::CrmBackend, error::PipelineResult, leads::PromotionLedger};

/// Archived deals, restorable or permanently deletable.
pub struct RecycleBin {
    backend: Arc<dyn CrmBackend>,
    archived: RwLock<Vec<deal::Model>>,
    ledger: Arc<PromotionLedger>,
}

impl RecycleBin {
    /// Purged deals are retired in `ledger` so lead sync leaves them gone.
    pub fn new(backend: Arc<dyn CrmBackend>, ledger: Arc<PromotionLedger>) -> Self {
        Self {
            backend,
            archived: RwLock::new(Vec::new()),
            ledger,
        }
    }

    /// Fetch the deal collection and keep the archived ones.
    pub async fn list_archived(&self) -> PipelineResult<Vec<deal::Model>> {
        let deals = self
            .backend
            .list_deals()
            .await
            .inspect_err(|err| warn!(error = %err, "failed to fetch archived deals"))?;
        let archived: Vec<deal::Model> = deals
            .into_iter()
            .filter(|deal| deal.stage == Stage::Archived)
            .collect();
        *self.archived.write().await = archived.clone();
        Ok(archived)
    }

    /// Last fetched list, minus anything deleted since.
    pub async fn archived(&self) -> Vec<deal::Model> {
        self.archived.read().await.clone()
    }

    /// The server moves the deal back to Qualified. The local list is left
    /// as is until the next [`RecycleBin::list_archived`].
    pub async fn restore(&self, id: &str) -> PipelineResult<()> {
        self.backend
            .restore_deal(id)
            .await
            .inspect_err(|err| warn!(deal_id = %id, error = %err, "restore failed"))?;
        info!(deal_id = %id, "deal restored to Qualified");
        Ok(())
    }

    pub async fn delete_permanently(&self, id: &str) -> PipelineResult<()> {
        self.backend
            .delete_deal(id)
            .await
            .inspect_err(|err| warn!(deal_id = %id, error = %err, "permanent delete failed"))?;
        let mut archived = self.archived.write().await;
        if let Some(purged) = archived.iter().find(|deal| deal.id == id) {
            self.ledger.retire(&purged.lead_name, &purged.name);
        }
        archived.retain(|deal| deal.id != id);
        info!(deal_id = %id, "archived deal deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fake::{BackendCall, FakeCrmBackend, FakeOp},
        testing::{deal, lead},
    };

    fn bin_with(backend: &FakeCrmBackend) -> RecycleBin {
        RecycleBin::new(Arc::new(backend.clone()), Arc::default())
    }

    fn archived(id: &str) -> deal::Model {
        deal::Model {
            move_to_folder: Some(deal::ARCHIVE_FOLDER.into()),
            ..deal(id, "Acme", "Website", Stage::Archived)
        }
    }

    #[tokio::test]
    async fn lists_only_archived_deals() {
        let backend = FakeCrmBackend::new()
            .with_deal(archived("a1"))
            .with_deal(deal("d1", "Acme", "Website", Stage::Qualified));
        let bin = bin_with(&backend);

        let listed = bin.list_archived().await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "a1");
        assert_eq!(bin.archived().await, listed);
    }

    #[tokio::test]
    async fn deleted_items_stay_gone_after_refetch() {
        let backend = FakeCrmBackend::new().with_deal(archived("a1")).with_deal(archived("a2"));
        let bin = bin_with(&backend);
        bin.list_archived().await.unwrap();

        bin.delete_permanently("a1").await.unwrap();
        assert_eq!(bin.archived().await.len(), 1);

        let refetched = bin.list_archived().await.unwrap();
        assert!(refetched.iter().all(|deal| deal.id != "a1"));
        assert!(backend.deals().iter().all(|deal| deal.id != "a1"));
    }

    #[tokio::test]
    async fn purged_pairs_are_retired_from_lead_sync() {
        let backend = FakeCrmBackend::new().with_deal(archived("a1"));
        let ledger = Arc::new(PromotionLedger::new());
        let bin = RecycleBin::new(Arc::new(backend.clone()), ledger.clone());
        bin.list_archived().await.unwrap();

        bin.delete_permanently("a1").await.unwrap();

        assert!(ledger.is_settled(&lead("l9", "Acme", "Website", true)));
        assert!(!ledger.is_settled(&lead("l9", "Globex", "Website", true)));
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_local_item() {
        let backend = FakeCrmBackend::new().with_deal(archived("a1"));
        let bin = bin_with(&backend);
        bin.list_archived().await.unwrap();
        backend.fail(FakeOp::DeleteDeal);

        assert!(bin.delete_permanently("a1").await.is_err());
        assert_eq!(bin.archived().await.len(), 1);
    }

    #[tokio::test]
    async fn restore_does_not_touch_the_local_list() {
        let backend = FakeCrmBackend::new().with_deal(archived("a1"));
        let bin = bin_with(&backend);
        bin.list_archived().await.unwrap();

        bin.restore("a1").await.unwrap();

        assert!(backend.calls().contains(&BackendCall::RestoreDeal("a1".into())));
        assert_eq!(bin.archived().await.len(), 1);
        assert!(bin.list_archived().await.unwrap().is_empty());
    }
}
