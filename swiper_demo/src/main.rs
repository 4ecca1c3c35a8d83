//! Swiper demo: preload a feed of mini-games and swipe through it
//!
//! Usage: `swiper_demo [config.toml]`

mod games;
mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use unit_lifecycle::foundation::logging;
use unit_lifecycle::prelude::*;

use crate::games::Marathon;
use crate::store::MemoryStore;

// Session script
const SWIPES_DOWN: usize = 4;
const SWIPES_UP: usize = 2;
const LOAD_DEADLINE: Duration = Duration::from_millis(300);

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => LifecycleConfig::load_validated(&path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => LifecycleConfig::default(),
    };
    logging::init(&config.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(run_session(&config))
}

async fn run_session(config: &LifecycleConfig) -> anyhow::Result<()> {
    let catalog = Arc::new(games::catalog());
    let mut swiper = UnitOrchestrator::with_config(catalog, Box::new(MemoryStore::with_games()), config);
    let session = CancellationToken::new();

    swiper.preload_many(&games::feed(), &session).await?;
    log::info!(
        "Feed ready: {}",
        swiper
            .preloaded_types()
            .iter()
            .map(UnitTypeId::name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    for _ in 0..SWIPES_DOWN {
        let unit = swiper.load_next(&session).await?;
        log::info!("Swiped down to {} {}", unit.unit_type(), unit.id());
    }

    for _ in 0..SWIPES_UP {
        let unit = swiper.load_previous(&session).await?;
        log::info!("Swiped up to {} {}", unit.unit_type(), unit.id());
    }

    swiper.pause_current();
    swiper.resume_current();
    swiper.restart_current();

    open_with_deadline(&mut swiper, &session).await?;

    // back to the feed
    swiper.load_next(&session).await?;

    log::info!("Factory: {:?}", swiper.factory().stats());
    log::info!("Pool: {:?}", swiper.pool().stats());
    swiper.dispose();
    Ok(())
}

/// Try to open the slow game, giving up once the deadline passes
async fn open_with_deadline(
    swiper: &mut UnitOrchestrator,
    session: &CancellationToken,
) -> anyhow::Result<()> {
    let deadline = CancellationToken::new();
    let attempt = session.linked_with(&deadline);

    let timer = tokio::spawn(async move {
        tokio::time::sleep(LOAD_DEADLINE).await;
        deadline.cancel();
    });

    let result = swiper.load(UnitTypeId::of::<Marathon>(), &attempt).await.map(|unit| unit.id());
    timer.abort();

    match result {
        Ok(id) => log::info!("Marathon {} opened in time", id),
        Err(e) if e.is_cancelled() => {
            log::warn!("Marathon missed its {:?} deadline", LOAD_DEADLINE);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
