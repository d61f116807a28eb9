//! Randomized interleavings of error, success, progress and timeout events.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::crawler::test_helpers::{
    create_test_crawler, discovery, failed, resolved, resolving, status_batch,
};
use crate::types::{FetchHandle, FetchPhase, FetchStatus};

const CAPACITY: usize = 5;
const IDENTIFIERS: u8 = 12;

#[tokio::test]
async fn test_random_interleavings_release_each_slot_exactly_once() {
    for seed in 0..200u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut crawler, probe) = create_test_crawler(CAPACITY);
        let start = Instant::now();

        for _ in 0..40 {
            let submitted = probe.submitted();
            let action = rng.gen_range(0..6);
            match action {
                0 => {
                    let byte = rng.gen_range(0..IDENTIFIERS);
                    crawler.dispatch(vec![discovery(byte)]).await;
                }
                1..=3 if !submitted.is_empty() => {
                    let batch_len = rng.gen_range(1..=4);
                    let statuses: Vec<FetchStatus> = (0..batch_len)
                        .map(|_| {
                            let (info_hash, handle) =
                                submitted[rng.gen_range(0..submitted.len())];
                            match rng.gen_range(0..4) {
                                0 => failed(info_hash, handle),
                                1 => resolved(info_hash, handle),
                                2 => resolving(info_hash, handle),
                                _ => FetchStatus::new(handle, info_hash, FetchPhase::Other),
                            }
                        })
                        .collect();
                    crawler.dispatch(vec![status_batch(statuses)]).await;
                }
                _ => {
                    let offset = Duration::from_secs(rng.gen_range(0..120));
                    crawler.sweep(start + offset).await;
                }
            }

            assert!(
                crawler.active.pending() <= CAPACITY,
                "seed {}: pending entries exceed capacity",
                seed
            );
            assert_eq!(
                crawler.slots.active(),
                crawler.active.len(),
                "seed {}: slot count diverged from active set",
                seed
            );
        }

        crawler.sweep(start + Duration::from_secs(3600)).await;

        let mut cancels: HashMap<FetchHandle, usize> = HashMap::new();
        for handle in probe.cancelled() {
            *cancels.entry(handle).or_default() += 1;
        }
        for (info_hash, handle) in probe.submitted() {
            assert_eq!(
                cancels.get(&handle).copied(),
                Some(1),
                "seed {}: handle {} for {} not cancelled exactly once",
                seed,
                handle,
                info_hash
            );
        }

        let stats = crawler.stats();
        assert_eq!(stats.active, 0, "seed {}", seed);
        assert_eq!(stats.slots_reserved, stats.slots_released, "seed {}", seed);
        assert_eq!(
            stats.admitted,
            stats.completed + stats.failed + stats.timed_out + stats.malformed,
            "seed {}",
            seed
        );
        assert!(stats.registered <= IDENTIFIERS as usize);
    }
}
