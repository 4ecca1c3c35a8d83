//! Cross-component behavior of the orchestrator, factory and pool

use std::sync::Arc;

use futures::executor::block_on;
use futures::FutureExt;

use super::UnitOrchestrator;
use crate::core::LifecycleConfig;
use crate::error::LifecycleError;
use crate::foundation::CancellationToken;
use crate::pool::PoolConfig;
use crate::test_support::{catalog, Flaky, MemoryLoader, Orphan, Puzzle, Quiz, Runner, Unmapped};
use crate::unit::{UnitState, UnitTypeId};

fn orchestrator(loader: &MemoryLoader) -> UnitOrchestrator {
    orchestrator_with_pool(loader, PoolConfig::default())
}

fn orchestrator_with_pool(loader: &MemoryLoader, pool: PoolConfig) -> UnitOrchestrator {
    UnitOrchestrator::with_config(
        Arc::new(catalog()),
        Box::new(loader.clone()),
        &LifecycleConfig::default().with_pool(pool),
    )
}

fn runner() -> UnitTypeId {
    UnitTypeId::of::<Runner>()
}

fn puzzle() -> UnitTypeId {
    UnitTypeId::of::<Puzzle>()
}

fn quiz() -> UnitTypeId {
    UnitTypeId::of::<Quiz>()
}

#[test]
fn test_preload_many_warms_poolable_types_only() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();

    assert_eq!(orch.preloaded_types(), &[runner(), puzzle(), quiz()]);
    assert_eq!(orch.cursor(), None);
    assert_eq!(orch.pool().pooled_count(runner()), 1);
    assert_eq!(orch.pool().pooled_count(quiz()), 1);
    assert_eq!(orch.pool().pooled_count(puzzle()), 0);
    assert_eq!(orch.factory().reference_count(puzzle()), Some(1));
    // warmed instances ran their preload hook
    assert_eq!(loader.counts().borrow().preloaded, 2);
}

#[test]
fn test_preload_many_skips_duplicates_and_failures() {
    let loader = MemoryLoader::standard();
    loader.fail("games/puzzle", "corrupt bundle");
    let mut orch = orchestrator(&loader);

    let types = [runner(), UnitTypeId::of::<Unmapped>(), puzzle(), runner(), quiz()];
    block_on(orch.preload_many(&types, &CancellationToken::new())).unwrap();

    assert_eq!(orch.preloaded_types(), &[runner(), quiz()]);
    assert_eq!(orch.factory().reference_count(runner()), Some(1));
    assert!(!orch.factory().is_cached(puzzle()));
}

#[test]
fn test_preload_many_keeps_type_when_warm_up_fails() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let flaky = UnitTypeId::of::<Flaky>();

    block_on(orch.preload_many(&[flaky, runner()], &CancellationToken::new())).unwrap();

    assert_eq!(orch.preloaded_types(), &[flaky, runner()]);
    assert_eq!(orch.pool().pooled_count(flaky), 0);
    // the instance whose hook failed was disposed, not leaked
    assert_eq!(loader.counts().borrow().disposed.len(), 1);
}

#[test]
fn test_preload_many_replaces_previous_list() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    block_on(orch.preload_many(&[runner(), puzzle()], &cancel)).unwrap();
    block_on(orch.load_next(&cancel)).unwrap();
    block_on(orch.preload_many(&[runner(), quiz()], &cancel)).unwrap();

    assert_eq!(orch.preloaded_types(), &[runner(), quiz()]);
    assert_eq!(orch.cursor(), None);
    assert_eq!(orch.factory().reference_count(runner()), Some(1));
    assert!(!orch.factory().is_cached(puzzle()));
    assert_eq!(loader.load_count("games/runner"), 1);
    assert_eq!(loader.release_count("games/puzzle"), 1);
}

#[test]
fn test_at_most_one_active_unit() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();

    for step in 0..7 {
        if step % 3 == 2 {
            block_on(orch.load_previous(&cancel)).unwrap();
        } else {
            block_on(orch.load_next(&cancel)).unwrap();
        }

        let c = loader.counts();
        let c = c.borrow();
        assert_eq!(c.started - c.stopped, 1, "step {}", step);
        assert_eq!(orch.current_unit().map(|u| u.state()), Some(UnitState::Active));
    }

    orch.stop_current();
    let c = loader.counts();
    let c = c.borrow();
    assert_eq!(c.started, c.stopped);
    assert!(orch.current_unit().is_none());
}

#[test]
fn test_navigation_wraps_forward() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle()], &cancel)).unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        let unit = block_on(orch.load_next(&cancel)).unwrap();
        seen.push(unit.unit_type());
    }

    assert_eq!(seen, vec![runner(), puzzle(), runner()]);
    assert_eq!(orch.cursor(), Some(0));
}

#[test]
fn test_navigation_previous_starts_at_end() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();

    let first = block_on(orch.load_previous(&cancel)).unwrap().unit_type();
    let second = block_on(orch.load_previous(&cancel)).unwrap().unit_type();

    assert_eq!(first, quiz());
    assert_eq!(second, puzzle());
    assert_eq!(orch.cursor(), Some(1));
}

#[test]
fn test_navigation_previous_wraps_from_first_entry() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();

    block_on(orch.load_next(&cancel)).unwrap();
    assert_eq!(orch.cursor(), Some(0));

    let previous = block_on(orch.load_previous(&cancel)).unwrap().unit_type();
    assert_eq!(previous, quiz());
    assert_eq!(orch.cursor(), Some(2));
}

#[test]
fn test_navigation_without_preloads_fails() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    let err = block_on(orch.load_next(&cancel)).unwrap_err();
    assert!(matches!(err, LifecycleError::NoPreloadedUnits));
    let err = block_on(orch.load_previous(&cancel)).unwrap_err();
    assert!(matches!(err, LifecycleError::NoPreloadedUnits));
}

#[test]
fn test_load_moves_cursor_to_preloaded_type() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();

    block_on(orch.load(puzzle(), &cancel)).unwrap();
    assert_eq!(orch.cursor(), Some(1));

    let next = block_on(orch.load_next(&cancel)).unwrap().unit_type();
    assert_eq!(next, quiz());
}

#[test]
fn test_load_of_unlisted_type_keeps_cursor() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner()], &cancel)).unwrap();

    block_on(orch.load(puzzle(), &cancel)).unwrap();
    assert_eq!(orch.cursor(), None);
    // on-demand template, no preload reference
    assert_eq!(orch.factory().reference_count(puzzle()), Some(0));
}

#[test]
fn test_pool_round_trip_preserves_identity() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle()], &cancel)).unwrap();

    let first = block_on(orch.load(runner(), &cancel)).unwrap().id();
    block_on(orch.load(puzzle(), &cancel)).unwrap();
    let again = block_on(orch.load(runner(), &cancel)).unwrap().id();

    assert_eq!(first, again);
    let c = loader.counts();
    let c = c.borrow();
    assert_eq!(c.unpooled, 2);
    // one warm-up plus one return to the pool
    assert_eq!(c.pooled, 2);
    // warmed runner and the fresh puzzle; the reused runner skips the hook
    assert_eq!(c.preloaded, 2);
    // the non-poolable puzzle was disposed when runner came back
    assert_eq!(c.disposed.len(), 1);
}

#[test]
fn test_load_creates_when_pool_is_empty() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    let id = block_on(orch.load(runner(), &cancel)).unwrap().id();
    orch.stop_current();
    assert_eq!(orch.pool().pooled_count(runner()), 1);

    let reused = block_on(orch.load(runner(), &cancel)).unwrap().id();
    assert_eq!(id, reused);
    assert_eq!(orch.factory().stats().units_created, 1);
}

#[test]
fn test_stop_current_evicts_when_pool_full() {
    let loader = MemoryLoader::standard();
    let pool = PoolConfig::default().with_capacity("runner", 1);
    let mut orch = orchestrator_with_pool(&loader, pool);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner()], &cancel)).unwrap();

    let first = block_on(orch.load(runner(), &cancel)).unwrap().id();
    assert_eq!(orch.pool().pooled_count(runner()), 0);

    // re-preloading warms a second runner while the first is checked out
    block_on(orch.preload_many(&[runner()], &cancel)).unwrap();
    assert_eq!(orch.pool().pooled_count(runner()), 1);

    orch.stop_current();
    assert_eq!(orch.pool().pooled_count(runner()), 1);
    assert_eq!(orch.pool().stats().evicted, 1);
    assert_eq!(loader.counts().borrow().disposed.len(), 1);

    let next = block_on(orch.load(runner(), &cancel)).unwrap().id();
    assert_ne!(next, first);
}

#[test]
fn test_failed_load_leaves_nothing_running() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    block_on(orch.load(puzzle(), &cancel)).unwrap();
    let err = block_on(orch.load(UnitTypeId::of::<Orphan>(), &cancel)).unwrap_err();

    assert!(err.is_configuration());
    assert!(orch.current_unit().is_none());
    assert_eq!(loader.counts().borrow().disposed.len(), 1);
}

#[test]
fn test_failed_navigation_still_advances_cursor() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    let flaky = UnitTypeId::of::<Flaky>();
    block_on(orch.preload_many(&[runner(), flaky, puzzle()], &cancel)).unwrap();

    block_on(orch.load_next(&cancel)).unwrap();
    let err = block_on(orch.load_next(&cancel)).unwrap_err();
    assert!(matches!(err, LifecycleError::UnitPreload { .. }));
    assert_eq!(orch.cursor(), Some(1));

    let next = block_on(orch.load_next(&cancel)).unwrap().unit_type();
    assert_eq!(next, puzzle());
}

#[test]
fn test_cancelled_preload_leaves_nothing_behind() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);

    let err = block_on(orch.preload_many(&[runner()], &CancellationToken::cancelled_token()))
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(orch.preloaded_types().is_empty());
    assert!(!orch.factory().is_cached(runner()));
    assert_eq!(orch.pool().pooled_count(runner()), 0);
    assert_eq!(orch.factory().stats().units_created, 0);
}

#[test]
fn test_cancellation_mid_batch_stops_remaining_types() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    loader.hang("games/puzzle");
    loader.on_load(move |asset| {
        if asset.as_str() == "games/puzzle" {
            trigger.cancel();
        }
    });

    let err = block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(orch.preloaded_types(), &[runner()]);
    assert!(!orch.factory().is_cached(puzzle()));
    assert_eq!(loader.load_count("games/quiz"), 0);
}

#[test]
fn test_shutdown_token_aborts_load() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let shutdown = orch.factory().shutdown_token();
    loader.hang("games/puzzle");
    loader.on_load(move |_| shutdown.cancel());

    let err = block_on(orch.load(puzzle(), &CancellationToken::new())).unwrap_err();

    assert!(err.is_cancelled());
    assert!(orch.current_unit().is_none());
    assert_eq!(loader.counts().borrow().started, 0);
}

#[test]
fn test_clear_preloaded_leaves_current_running() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), quiz()], &cancel)).unwrap();
    let current = block_on(orch.load(runner(), &cancel)).unwrap().id();

    orch.clear_preloaded();

    assert!(orch.preloaded_types().is_empty());
    assert_eq!(orch.cursor(), None);
    assert_eq!(orch.current_unit().map(|u| u.id()), Some(current));
    assert!(!orch.factory().is_cached(quiz()));
    // warmed quiz disposed; runner still checked out
    assert_eq!(loader.counts().borrow().disposed.len(), 1);

    // the retired runner is disposed instead of pooled
    orch.stop_current();
    assert_eq!(loader.counts().borrow().disposed.len(), 2);
    assert_eq!(orch.pool().pooled_count(runner()), 0);
}

#[test]
fn test_clear_preloaded_retires_freshly_created_current() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner()], &cancel)).unwrap();
    orch.clear_preloaded();

    // pool is empty, so this runner is created fresh
    let current = block_on(orch.load(runner(), &cancel)).unwrap().id();
    assert_eq!(orch.factory().stats().units_created, 2);
    assert_eq!(orch.pool().active_count(runner()), 1);

    block_on(orch.preload_many(&[runner()], &cancel)).unwrap();
    orch.clear_preloaded();
    assert_eq!(orch.current_unit().map(|u| u.id()), Some(current));

    // first warm-up, second warm-up, then the current runner on stop
    orch.stop_current();
    assert_eq!(orch.pool().pooled_count(runner()), 0);
    assert!(orch.pool().list_pooled_types().is_empty());
    assert_eq!(loader.counts().borrow().disposed.len(), 3);
}

#[test]
fn test_dropped_load_disposes_partial_unit() {
    let loader = MemoryLoader::standard();
    loader.stall_preload("games/puzzle");
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    assert!(orch.load(puzzle(), &cancel).now_or_never().is_none());

    assert!(orch.current_unit().is_none());
    let c = loader.counts();
    let c = c.borrow();
    assert_eq!(c.preloaded, 1);
    assert_eq!(c.started, 0);
    assert_eq!(c.disposed.len(), 1);
}

#[test]
fn test_pause_resume_restart_current() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();

    assert!(!orch.pause_current());

    block_on(orch.load(puzzle(), &cancel)).unwrap();
    assert!(orch.pause_current());
    assert_eq!(orch.current_unit().map(|u| u.state()), Some(UnitState::Paused));
    assert!(orch.resume_current());
    assert!(orch.restart_current());

    let c = loader.counts();
    let c = c.borrow();
    assert_eq!((c.paused, c.resumed, c.restarted), (1, 1, 1));
}

#[test]
fn test_dispose_is_idempotent() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    block_on(orch.preload_many(&[runner(), puzzle(), quiz()], &cancel)).unwrap();
    block_on(orch.load(puzzle(), &cancel)).unwrap();

    orch.dispose();
    orch.dispose();

    let disposed = loader.counts().borrow().disposed.clone();
    let mut unique = disposed.clone();
    unique.sort_unstable();
    unique.dedup();
    // puzzle, warmed runner, warmed quiz
    assert_eq!(disposed.len(), 3);
    assert_eq!(unique.len(), disposed.len());
    assert_eq!(loader.releases().len(), 3);

    assert!(orch.is_disposed());
    assert!(orch.factory().is_disposed());
    assert!(orch.pool().is_disposed());
}

#[test]
fn test_operations_after_dispose() {
    let loader = MemoryLoader::standard();
    let mut orch = orchestrator(&loader);
    let cancel = CancellationToken::new();
    orch.dispose();

    let err = block_on(orch.load(runner(), &cancel)).unwrap_err();
    assert!(matches!(err, LifecycleError::Disposed(_)));
    let err = block_on(orch.preload_many(&[runner()], &cancel)).unwrap_err();
    assert!(matches!(err, LifecycleError::Disposed(_)));

    orch.stop_current();
    orch.clear_preloaded();
    assert!(loader.loads().is_empty());
}

#[test]
fn test_drop_tears_down() {
    let loader = MemoryLoader::standard();
    {
        let mut orch = orchestrator(&loader);
        let cancel = CancellationToken::new();
        block_on(orch.preload_many(&[runner()], &cancel)).unwrap();
        block_on(orch.load(runner(), &cancel)).unwrap();
    }

    let c = loader.counts();
    let c = c.borrow();
    assert_eq!(c.stopped, 1);
    assert_eq!(c.disposed.len(), 1);
    assert_eq!(loader.release_count("games/runner"), 1);
}
