use anyhow::{bail, Result};
use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug, Serialize, Clone)]
pub struct BenchmarkCli {
    /// Workers registered and completed in every cycle
    #[arg(long, default_value_t = 1024)]
    pub workers: usize,

    /// Observer threads calling wait() in every cycle
    #[arg(long, default_value_t = 4)]
    pub observers: usize,

    /// Number of fan-out / fan-in cycles to run on the same wait group
    #[arg(long, default_value_t = 1000)]
    pub cycles: usize,

    /// Busy-spin time of a single worker, in microseconds
    #[arg(long, default_value_t = 10)]
    pub work_micros: u64,

    /// Size of the worker thread pool
    #[arg(long, default_value_t = 8)]
    pub threads: usize,

    /// Output filename for metrics; nothing is written if empty
    #[arg(long, default_value = "")]
    pub output: String,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub workers: usize,
    pub observers: usize,
    pub cycles: usize,
    pub work_micros: u64,
    pub threads: usize,
}

impl BenchConfig {
    pub fn from_cli(args: &BenchmarkCli) -> Result<Self> {
        let config = Self {
            workers: args.workers,
            observers: args.observers,
            cycles: args.cycles,
            work_micros: args.work_micros,
            threads: args.threads,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 || self.observers == 0 || self.cycles == 0 || self.threads == 0 {
            bail!(
                "workers, observers, cycles and threads must all be positive: {:?}",
                self
            );
        }
        if self.workers > i32::MAX as usize {
            bail!("too many workers per cycle: {}", self.workers);
        }
        Ok(())
    }
}
