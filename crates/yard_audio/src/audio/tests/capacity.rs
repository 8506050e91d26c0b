//! Capacity bounds, reuse and steal behavior

use crate::audio::backend::simulated::SimulatedFactory;
use crate::audio::clip::AudioClip;
use crate::audio::pool::{PlaybackHandle, PlaybackPriority, PlaybackRequest, SourcePool};
use crate::audio::scheduler::TickScheduler;
use crate::audio::AudioError;
use crate::core::config::{CapacityPolicy, PoolConfig};
use crate::foundation::time::SharedClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const STEP: Duration = Duration::from_millis(100);

fn setup(config: PoolConfig) -> (SourcePool<SimulatedFactory>, Rc<TickScheduler>, SharedClock, SimulatedFactory) {
    let clock = SharedClock::new();
    let factory = SimulatedFactory::new(clock.clone());
    let scheduler = Rc::new(TickScheduler::new());
    let pool = SourcePool::new("capacity", config, factory.clone(), scheduler.clone()).unwrap();
    (pool, scheduler, clock, factory)
}

fn clip(ticks: u32) -> AudioClip {
    AudioClip::silent("spreader_lock", STEP * ticks)
}

#[test]
fn exhausted_pool_rejects_then_reuses_released_element() {
    let (pool, _, _, factory) = setup(PoolConfig::local().with_sizes(1, 2));
    assert_eq!(factory.created(), 1);

    let a = pool.checkout(PlaybackRequest::new(clip(10))).unwrap();
    assert_eq!(factory.created(), 1);
    let _b = pool.checkout(PlaybackRequest::new(clip(10))).unwrap();
    assert_eq!(factory.created(), 2);

    let c = pool.checkout(PlaybackRequest::new(clip(10)));
    assert!(matches!(c, Err(AudioError::CapacityExceeded { max_size: 2, .. })));
    assert_eq!(pool.len(), 2);

    let a_element = a.element();
    pool.release(a).unwrap();
    assert_eq!(pool.idle_count(), 1);

    let d = pool.checkout(PlaybackRequest::new(clip(10))).unwrap();
    assert_eq!(d.element(), a_element);
    assert_eq!(factory.created(), 2);
    assert_eq!(pool.stats().rejections, 1);
}

#[test]
fn stolen_checkout_never_reports_end() {
    let config = PoolConfig::local().with_sizes(1, 1).with_policy(CapacityPolicy::Steal);
    let (pool, scheduler, clock, _) = setup(config);
    let victim_ends = Rc::new(Cell::new(0));
    let ends = Rc::clone(&victim_ends);

    let victim = pool
        .checkout(
            PlaybackRequest::new(clip(2))
                .with_priority(PlaybackPriority::Low)
                .with_auto_remove(true)
                .on_end(move || ends.set(ends.get() + 1)),
        )
        .unwrap();
    let thief = pool.checkout(PlaybackRequest::new(clip(1)).with_auto_remove(true)).unwrap();
    assert_eq!(thief.element(), victim.element());

    for _ in 0..4 {
        clock.advance(STEP);
        scheduler.tick();
    }
    assert_eq!(victim_ends.get(), 0);
    assert_eq!(pool.stats().completions, 1);
    assert_eq!(pool.idle_count(), 1);
}

#[test]
fn random_traffic_stays_within_capacity() {
    let max_size = 4;
    let (pool, scheduler, clock, factory) = setup(PoolConfig::local().with_sizes(2, max_size));
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut held: Vec<PlaybackHandle> = Vec::new();

    for _ in 0..1_000 {
        match rng.gen_range(0..3) {
            0 => {
                let request = PlaybackRequest::new(clip(rng.gen_range(1..6))).with_auto_remove(rng.gen_bool(0.5));
                match pool.checkout(request) {
                    Ok(handle) => held.push(handle),
                    Err(AudioError::CapacityExceeded { .. }) => assert_eq!(pool.idle_count(), 0),
                    Err(e) => panic!("unexpected checkout error: {e}"),
                }
            }
            1 if !held.is_empty() => {
                let handle = held.swap_remove(rng.gen_range(0..held.len()));
                match pool.release(handle) {
                    Ok(()) | Err(AudioError::DoubleRelease) => {}
                    Err(e) => panic!("unexpected release error: {e}"),
                }
            }
            _ => {
                clock.advance(STEP);
                scheduler.tick();
            }
        }

        assert!(pool.len() <= max_size);
        assert_eq!(pool.active_count() + pool.idle_count(), pool.len());
        assert_eq!(factory.live(), pool.len());
    }

    let stats = pool.stats();
    assert!(stats.checkouts >= stats.releases);
    assert_eq!(stats.destroyed, 0);
}
