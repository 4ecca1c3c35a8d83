//! In-memory asset store with simulated download latency

use std::collections::HashMap;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use rand::Rng;
use unit_lifecycle::prelude::*;

use crate::games::GameTemplate;

/// Extra random latency added to every load
const MAX_JITTER_MS: u64 = 40;

struct Bundle {
    title: &'static str,
    latency: Duration,
}

/// Asset store keyed by bundle path
pub struct MemoryStore {
    bundles: HashMap<AssetId, Bundle>,
}

impl MemoryStore {
    /// Store carrying every game in [`crate::games::catalog`]
    pub fn with_games() -> Self {
        let mut store = Self {
            bundles: HashMap::new(),
        };
        store.insert("bundles/sky_runner", "Sky Runner", 120);
        store.insert("bundles/tile_slide", "Tile Slide", 60);
        store.insert("bundles/trivia", "Trivia Night", 30);
        store.insert("bundles/marathon", "Marathon", 5_000);
        store
    }

    fn insert(&mut self, path: &str, title: &'static str, latency_ms: u64) {
        self.bundles.insert(
            AssetId::new(path),
            Bundle {
                title,
                latency: Duration::from_millis(latency_ms),
            },
        );
    }
}

impl ResourceLoader for MemoryStore {
    fn load<'a>(
        &'a self,
        asset_id: &'a AssetId,
        cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn Template>>> {
        Box::pin(async move {
            let bundle = self
                .bundles
                .get(asset_id)
                .ok_or_else(|| anyhow::anyhow!("bundle {} is not in the store", asset_id))?;

            let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
            let latency = bundle.latency + Duration::from_millis(jitter);
            log::debug!("Downloading {} ({:?})", asset_id, latency);

            tokio::select! {
                () = tokio::time::sleep(latency) => {}
                () = cancel.cancelled() => anyhow::bail!("download of {} aborted", asset_id),
            }

            let template: Box<dyn Template> = Box::new(GameTemplate::new(bundle.title));
            Ok(template)
        })
    }

    fn release(&self, asset_id: &AssetId, template: Box<dyn Template>) {
        drop(template);
        log::debug!("Evicted {} from memory", asset_id);
    }
}
