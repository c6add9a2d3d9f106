use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    error::{PipelineError, PipelineResult},
    store::{LoadOutcome, PipelineStore},
};

/// Periodic re-fetch of the pipeline store.
pub struct Poller;

impl Poller {
    /// Load now, then every `period` until the handle is stopped or dropped.
    ///
    /// A zero `period` is refused.
    pub fn start(store: Arc<PipelineStore>, period: Duration) -> PipelineResult<PollHandle> {
        if period.is_zero() {
            return Err(PipelineError::validation("poll interval must be greater than zero"));
        }
        let (shutdown, mut stopped) = watch::channel(false);
        let task = tokio::spawn({
            let store = store.clone();
            async move {
                let mut ticks = interval(period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                info!(interval_secs = period.as_secs_f64(), "pipeline polling started");
                loop {
                    tokio::select! {
                        _ = stopped.changed() => break,
                        _ = ticks.tick() => match store.load().await {
                            Ok(LoadOutcome::Applied { generation, .. }) => {
                                debug!(generation, "poll applied");
                            }
                            Ok(LoadOutcome::Discarded) | Err(PipelineError::Detached) => break,
                            Err(err) => warn!(error = %err, "poll failed"),
                        },
                    }
                }
                debug!("pipeline polling stopped");
            }
        });
        Ok(PollHandle {
            store,
            shutdown,
            task: Some(task),
        })
    }
}

/// Owns the polling task; stopping or dropping it detaches the store.
pub struct PollHandle {
    store: Arc<PipelineStore>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the task, abandoning any load in flight.
    pub async fn stop(mut self) {
        self.halt();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "poll task ended abnormally");
                }
            }
        }
    }

    fn halt(&self) {
        self.store.detach();
        self.shutdown.send_replace(true);
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.halt();
        }
    }
}
