use crate::infra_memory::{InMemoryCache, InMemoryRefreshTokenStore};
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// In-process store whose expired entries linger until purged.
pub trait Purge: Send + Sync {
    fn name(&self) -> &'static str;

    fn purge(&self) -> usize;
}

impl Purge for InMemoryCache {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn purge(&self) -> usize {
        self.purge_expired()
    }
}

impl Purge for InMemoryRefreshTokenStore {
    fn name(&self) -> &'static str {
        "refresh_tokens"
    }

    fn purge(&self) -> usize {
        self.purge_expired()
    }
}

/// Periodically evicts expired entries from the in-memory stores until
/// `cancel` fires.
pub fn spawn_sweeper(
    targets: Vec<Arc<dyn Purge>>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for target in &targets {
                        let purged = target.purge();
                        if purged > 0 {
                            debug!(store = target.name(), purged, "purged expired entries");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("sweeper stopping");
                    break;
                }
            }
        }
    })
}
