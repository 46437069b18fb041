//! Fan-out / fan-in driver.
//!
//! Every cycle registers `workers` jobs on one shared `WaitGroup`, hands the
//! jobs to a thread pool and lets `observers` threads wait for them. A cycle
//! ends when all observers have returned, which is also the point where the
//! wait group may be reused.

use super::cli::BenchConfig;
use super::utils::busy_spin;
use anyhow::{anyhow, bail, Result};
use indicatif::ProgressBar;
use log::{debug, info};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use threadpool::ThreadPool;
use waitgroup::{WaitGroup, WaitGroupError};

const SC: Ordering = Ordering::SeqCst;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FanoutSummary {
    pub cycles: usize,
    pub jobs: usize,
    pub elapsed_s: f64,
    pub cycles_per_sec: f64,
    pub max_wait_us: f64,
}

pub fn run_fanout(config: &BenchConfig, pb: &ProgressBar) -> Result<FanoutSummary> {
    config.validate()?;
    let wg = Arc::new(WaitGroup::new());
    let pool = ThreadPool::new(config.threads);
    let (err_sender, err_receiver) = crossbeam::channel::unbounded::<WaitGroupError>();

    info!(
        "Running {} cycles of {} workers and {} observers on {} threads",
        config.cycles, config.workers, config.observers, config.threads
    );
    let start = Instant::now();
    let mut max_wait = Duration::ZERO;
    for cycle in 0..config.cycles {
        let cycle_start = Instant::now();
        let completed = Arc::new(AtomicUsize::new(0));
        wg.increment(config.workers as i32)?;

        let observers: Vec<_> = (0..config.observers)
            .map(|_| {
                let wg = wg.clone();
                let completed = completed.clone();
                thread::spawn(move || {
                    let t = Instant::now();
                    wg.wait();
                    (t.elapsed(), completed.load(SC))
                })
            })
            .collect();

        let work = Duration::from_micros(config.work_micros);
        for _ in 0..config.workers {
            let wg = wg.clone();
            let completed = completed.clone();
            let err_sender = err_sender.clone();
            pool.execute(move || {
                busy_spin(work);
                completed.fetch_add(1, SC);
                if let Err(e) = wg.decrement() {
                    let _ = err_sender.send(e);
                }
            });
        }

        for handle in observers {
            let (waited, seen) = handle
                .join()
                .map_err(|_| anyhow!("observer thread panicked in cycle {}", cycle))?;
            if seen != config.workers {
                bail!(
                    "observer returned after {} of {} jobs in cycle {}",
                    seen,
                    config.workers,
                    cycle
                );
            }
            metrics::histogram!("waitgroup.wait_latency_us").record(waited.as_secs_f64() * 1e6);
            max_wait = max_wait.max(waited);
        }
        pool.join();
        if let Ok(e) = err_receiver.try_recv() {
            return Err(e.into());
        }

        let cycle_time = cycle_start.elapsed();
        metrics::histogram!("waitgroup.cycle_duration_us").record(cycle_time.as_secs_f64() * 1e6);
        metrics::counter!("waitgroup.cycles").increment(1);
        metrics::counter!("waitgroup.jobs").increment(config.workers as u64);
        debug!("cycle {} done in {:?} state={:?}", cycle, cycle_time, wg);
        pb.inc(1);
    }

    let elapsed = start.elapsed();
    let summary = FanoutSummary {
        cycles: config.cycles,
        jobs: config.cycles * config.workers,
        elapsed_s: elapsed.as_secs_f64(),
        cycles_per_sec: config.cycles as f64 / elapsed.as_secs_f64(),
        max_wait_us: max_wait.as_secs_f64() * 1e6,
    };
    metrics::gauge!("waitgroup.cycles_per_sec").set(summary.cycles_per_sec);
    Ok(summary)
}
