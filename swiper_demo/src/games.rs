//! Mini-games offered by the swiper feed

use std::time::Duration;

use futures::future::LocalBoxFuture;
use unit_lifecycle::prelude::*;

/// Time each game spends warming up after instantiation
const WARM_UP: Duration = Duration::from_millis(20);

/// Endless 3D runner, cheap to keep around
pub struct SkyRunner;
/// 2D sliding-tile puzzle
pub struct TileSlide;
/// Trivia card on a UI canvas
pub struct Trivia;
/// Huge 3D level that rarely loads in time
pub struct Marathon;

impl UnitKind for SkyRunner {
    const NAME: &'static str = "sky_runner";
    const CAPABILITIES: UnitCapabilities = UnitCapabilities::POOLABLE;
}

impl UnitKind for TileSlide {
    const NAME: &'static str = "tile_slide";
    const CATEGORY: UnitCategory = UnitCategory::World2D;
}

impl UnitKind for Trivia {
    const NAME: &'static str = "trivia";
    const CATEGORY: UnitCategory = UnitCategory::Ui;
}

impl UnitKind for Marathon {
    const NAME: &'static str = "marathon";
}

/// Catalog of every game the store carries
pub fn catalog() -> UnitCatalog {
    UnitCatalog::new()
        .with::<SkyRunner>("bundles/sky_runner")
        .with::<TileSlide>("bundles/tile_slide")
        .with::<Trivia>("bundles/trivia")
        .with::<Marathon>("bundles/marathon")
}

/// Games shown in the feed, top to bottom
pub fn feed() -> Vec<UnitTypeId> {
    vec![
        UnitTypeId::of::<SkyRunner>(),
        UnitTypeId::of::<TileSlide>(),
        UnitTypeId::of::<Trivia>(),
    ]
}

/// A playable game instance
pub struct MiniGame {
    title: String,
    runs: u32,
}

impl MiniGame {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            runs: 0,
        }
    }
}

impl Unit for MiniGame {
    fn preload<'a>(
        &'a mut self,
        _cancel: &'a CancellationToken,
    ) -> LocalBoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            tokio::time::sleep(WARM_UP).await;
            log::debug!("{} warmed up", self.title);
            Ok::<(), anyhow::Error>(())
        })
    }

    fn start(&mut self) {
        self.runs += 1;
        log::info!("{} started (run {})", self.title, self.runs);
    }

    fn pause(&mut self) {
        log::info!("{} paused", self.title);
    }

    fn resume(&mut self) {
        log::info!("{} resumed", self.title);
    }

    fn restart(&mut self) {
        log::info!("{} restarted", self.title);
    }

    fn stop(&mut self) {
        log::info!("{} stopped", self.title);
    }

    fn dispose(&mut self) {
        log::info!("{} disposed after {} run(s)", self.title, self.runs);
    }

    fn set_active(&mut self, active: bool) {
        log::debug!("{} visible: {}", self.title, active);
    }

    fn place(&mut self, placement: &Placement) -> anyhow::Result<()> {
        log::debug!("{} placed at {:?}", self.title, placement);
        Ok(())
    }
}

/// Loaded game bundle
pub struct GameTemplate {
    title: String,
}

impl GameTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

impl Template for GameTemplate {
    fn instantiate(&self) -> anyhow::Result<Box<dyn Instantiated>> {
        Ok(UnitObject::boxed(MiniGame::new(&self.title)))
    }
}
