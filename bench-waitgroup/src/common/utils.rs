use anyhow::{anyhow, Result};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hint::spin_loop;
use std::time::{Duration, Instant};

pub fn init_logging(max_level: &str) {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(max_level));
}

/// Spins on the current thread for `d`, standing in for a unit of work.
pub fn busy_spin(d: Duration) {
    let deadline = Instant::now() + d;
    while Instant::now() < deadline {
        spin_loop();
    }
}

#[derive(Serialize, Debug)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Mapping from percentile label (e.g., "p90", "p999") to value.
    pub percentiles: BTreeMap<String, f64>,
}

impl HistogramStats {
    pub fn compute(samples: &[OrderedFloat<f64>]) -> Self {
        let len = samples.len();
        let mut values: Vec<f64> = samples.iter().map(|v| v.into_inner()).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if len == 0 {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                percentiles: BTreeMap::new(),
            };
        }

        let mean = values.iter().sum::<f64>() / len as f64;
        let percentile = |pct: f64| -> f64 {
            let idx = ((pct / 100.0) * (len as f64 - 1.0)).round() as usize;
            values[idx]
        };

        const PCTS: &[(f64, &str)] = &[
            (50.0, "p50"),
            (90.0, "p90"),
            (99.0, "p99"),
            (99.9, "p999"),
        ];
        let percentiles = PCTS
            .iter()
            .map(|(pct, label)| ((*label).to_string(), percentile(*pct)))
            .collect();

        Self {
            count: len,
            min: values[0],
            max: values[len - 1],
            mean,
            percentiles,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct MetricDump {
    pub name: String,
    /// For counters and gauges, holds the raw numeric value. `None` for histograms.
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<HistogramStats>,
}

/// Process-wide metrics sink. Only one can be installed per process.
pub struct MetricsRecorder {
    snapshotter: Snapshotter,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .map_err(|e| anyhow!("cannot install metrics recorder: {}", e))?;
        Ok(Self { snapshotter })
    }

    pub fn snapshot_metrics(&self) -> HashMap<String, MetricDump> {
        self.snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(ckey, _unit, _description, value)| {
                let name = ckey.key().name().to_owned();
                let (value, histogram) = match value {
                    DebugValue::Counter(v) => (Some(v.to_string()), None),
                    DebugValue::Gauge(v) => (Some(v.into_inner().to_string()), None),
                    DebugValue::Histogram(samples) => {
                        (None, Some(HistogramStats::compute(&samples)))
                    }
                };
                (
                    name.clone(),
                    MetricDump {
                        name,
                        value,
                        histogram,
                    },
                )
            })
            .collect()
    }
}
