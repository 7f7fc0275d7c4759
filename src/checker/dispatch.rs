// src/checker/dispatch.rs
// =============================================================================
// This module runs the probes concurrently.
//
// Two strategies (see config::Strategy):
//
// - Pool (the default): N long-lived tokio tasks share one bounded queue.
//   Each worker takes a URL, probes it, records the verdict, and takes the
//   next one. At most N requests are ever in flight, however big the input.
//
// - FanOut: one task per URL, all started at once. Fine for small inputs,
//   but a file with 50,000 links means 50,000 sockets at the same time.
//
// Either way, dispatch() returns only after every URL has a verdict in the
// ResultTable. Completion order is whatever the network makes it.
// =============================================================================

use super::extract::CandidateUrl;
use super::probe::Prober;
use super::results::{ResultTable, Verdict};
use crate::config::Strategy;
use futures::future::join_all;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("probe worker crashed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

// Probes every candidate and records one verdict per candidate into `table`
//
// Resolves once all of them are recorded.
pub async fn dispatch<P: Prober>(
    items: Vec<CandidateUrl>,
    strategy: Strategy,
    prober: Arc<P>,
    table: Arc<ResultTable>,
) -> Result<(), DispatchError> {
    info!(urls = items.len(), ?strategy, "dispatching probes");

    let handles = match strategy {
        Strategy::Pool { workers } => run_pool(items, workers, prober, table).await,
        Strategy::FanOut => fan_out(items, prober, table),
    };

    // The barrier: every task has finished (or crashed) after this
    for joined in join_all(handles).await {
        joined?;
    }

    Ok(())
}

// Starts the workers, feeds them every item, and hands back their handles
async fn run_pool<P: Prober>(
    items: Vec<CandidateUrl>,
    workers: NonZeroUsize,
    prober: Arc<P>,
    table: Arc<ResultTable>,
) -> Vec<JoinHandle<()>> {
    // Bounded queue: when it is full, send() waits instead of dropping
    let (tx, rx) = mpsc::channel::<CandidateUrl>(workers.get());
    let rx = Arc::new(Mutex::new(rx));

    let handles = (0..workers.get())
        .map(|worker_id| {
            let rx = Arc::clone(&rx);
            let prober = Arc::clone(&prober);
            let table = Arc::clone(&table);

            tokio::spawn(async move {
                let mut probed = 0usize;

                loop {
                    // The lock is held only while waiting for the next item
                    let next = rx.lock().await.recv().await;
                    let Some(candidate) = next else { break };

                    let outcome = prober.probe(&candidate.url).await;
                    table.record(Verdict::new(candidate, outcome));
                    probed += 1;
                }

                debug!(worker_id, probed, "worker finished");
            })
        })
        .collect();

    for item in items {
        // Only fails when every worker is gone (they all crashed);
        // the join in dispatch() reports that
        if tx.send(item).await.is_err() {
            break;
        }
    }
    // Closing the queue lets idle workers exit
    drop(tx);

    handles
}

fn fan_out<P: Prober>(
    items: Vec<CandidateUrl>,
    prober: Arc<P>,
    table: Arc<ResultTable>,
) -> Vec<JoinHandle<()>> {
    items
        .into_iter()
        .map(|candidate| {
            let prober = Arc::clone(&prober);
            let table = Arc::clone(&table);

            tokio::spawn(async move {
                let outcome = prober.probe(&candidate.url).await;
                table.record(Verdict::new(candidate, outcome));
            })
        })
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Arc?
//    - tokio::spawn needs 'static data: the task may outlive this function
//    - Arc (atomic reference count) lets every worker own a handle to the
//      same prober and the same result table
//
// 2. Why is the receiver behind a Mutex?
//    - mpsc means "multi-producer, single-consumer": only one task may call
//      recv() at a time
//    - The workers take turns through the lock, and release it as soon as
//      they have an item, so probes still run in parallel
//
// 3. What does a bounded channel buy us?
//    - send().await waits while the queue is full
//    - Memory stays flat no matter how many URLs the input has, and no URL
//      is ever thrown away
//
// 4. What is join_all?
//    - Waits for every JoinHandle; a JoinHandle resolves to Err if its
//      task panicked
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::probe::ProbeOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // Pretends to probe: sleeps a little and tracks how many calls overlap
    #[derive(Default)]
    struct SleepyProber {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Prober for SleepyProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(1)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if url.ends_with("/dead") {
                ProbeOutcome::UNREACHABLE
            } else {
                ProbeOutcome { alive: true, status_code: 200 }
            }
        }
    }

    struct PanickyProber;

    impl Prober for PanickyProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            if url.contains("boom") {
                panic!("prober exploded on {}", url);
            }
            ProbeOutcome { alive: true, status_code: 200 }
        }
    }

    fn candidates(count: usize) -> Vec<CandidateUrl> {
        (0..count)
            .map(|i| CandidateUrl {
                origin_key: i,
                position: 0,
                url: format!("http://host-{}.test/", i),
            })
            .collect()
    }

    fn pool(workers: usize) -> Strategy {
        Strategy::Pool {
            workers: NonZeroUsize::new(workers).unwrap(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_probes_each_item_once_within_limit() {
        let prober = Arc::new(SleepyProber::default());
        let table = Arc::new(ResultTable::new());

        dispatch(candidates(10_000), pool(5), Arc::clone(&prober), Arc::clone(&table))
            .await
            .unwrap();

        let all = table.all();
        assert_eq!(all.len(), 10_000);
        assert!(all.values().all(|verdicts| verdicts.len() == 1));
        assert_eq!(prober.calls.load(Ordering::SeqCst), 10_000);
        assert!(prober.max_in_flight.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_probes_everything() {
        let prober = Arc::new(SleepyProber::default());
        let table = Arc::new(ResultTable::new());

        let mut items = candidates(300);
        items.push(CandidateUrl {
            origin_key: 300,
            position: 0,
            url: "http://gone.test/dead".to_string(),
        });

        dispatch(items, Strategy::FanOut, Arc::clone(&prober), Arc::clone(&table))
            .await
            .unwrap();

        assert_eq!(table.len(), 301);
        assert_eq!(table.dead_count(), 1);
        assert_eq!(table.verdicts_for(300)[0].status_code, -1);
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let table = Arc::new(ResultTable::new());
        dispatch(Vec::new(), pool(3), Arc::new(SleepyProber::default()), Arc::clone(&table))
            .await
            .unwrap();
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_more_workers_than_items() {
        let table = Arc::new(ResultTable::new());
        dispatch(candidates(3), pool(50), Arc::new(SleepyProber::default()), Arc::clone(&table))
            .await
            .unwrap();
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn test_crashed_worker_is_reported() {
        let mut items = candidates(20);
        items[7].url = "http://boom.test/".to_string();

        let result = dispatch(
            items,
            pool(2),
            Arc::new(PanickyProber),
            Arc::new(ResultTable::new()),
        )
        .await;

        assert!(matches!(result, Err(DispatchError::Worker(_))));
    }
}
