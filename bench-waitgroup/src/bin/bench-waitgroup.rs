// Fan-out / fan-in benchmark for the wait group.
// Each cycle: increment(workers), workers decrement from a thread pool,
// observers wait() until the cycle drains.
use anyhow::{Context, Result};
use bench_waitgroup::common::{cli, fanout, utils};
use chrono::Utc;
use clap::Parser;
use log::info;
use serde_json::json;
use std::path::Path;

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> Result<()> {
    let args = cli::BenchmarkCli::parse();
    utils::init_logging(&args.log_level);
    let run_start_ts = Utc::now();
    let metrics_recorder = utils::MetricsRecorder::new()?;
    let config = cli::BenchConfig::from_cli(&args)?;

    let pb = indicatif::ProgressBar::new(config.cycles as u64);
    pb.set_style(
        indicatif::ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
        )?
        .progress_chars("##-"),
    );
    let summary = fanout::run_fanout(&config, &pb)?;
    pb.finish_with_message("cycles done");
    info!(
        "Completed {} jobs in {} cycles in {:.3}s, {:.1} cycles/s, max wait {:.1}us",
        summary.jobs,
        summary.cycles,
        summary.elapsed_s,
        summary.cycles_per_sec,
        summary.max_wait_us
    );

    if args.output.is_empty() {
        return Ok(());
    }
    let run_end_ts = Utc::now();
    let duration_secs = (run_end_ts - run_start_ts).num_milliseconds() as f64 / 1000.0;
    let output_json = json!({
        "cli": &args,
        "config": &config,
        "command": std::env::args().collect::<Vec<_>>().join(" "),
        "timestamps": {
            "start": run_start_ts.to_rfc3339(),
            "end": run_end_ts.to_rfc3339(),
            "duration_seconds": duration_secs
        },
        "summary": &summary,
        "metrics": metrics_recorder.snapshot_metrics()
    });

    info!("Dumping metrics to {}", args.output);
    if let Some(dir) = Path::new(&args.output).parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    std::fs::write(&args.output, serde_json::to_string_pretty(&output_json)?)
        .with_context(|| format!("cannot write {}", args.output))?;
    Ok(())
}
