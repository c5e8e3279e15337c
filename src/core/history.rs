//! Per-GPU metric history accumulated across polls
//!
//! The backend only reports the latest snapshot, so charts are built from
//! what we have seen so far. Each GPU keeps a bounded ring buffer.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace};

use super::model::{GpuSample, WorkstationGroup};
use crate::chart::{NamedSeries, Point};

/// Chartable GPU metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    GpuUtil,
    MemoryUtil,
    MemoryUsed,
    Temperature,
    MemoryTemperature,
    FanSpeed,
    PowerDraw,
    GraphicsClock,
}

impl Metric {
    pub const ALL: &'static [Metric] = &[
        Metric::GpuUtil,
        Metric::MemoryUtil,
        Metric::MemoryUsed,
        Metric::Temperature,
        Metric::MemoryTemperature,
        Metric::FanSpeed,
        Metric::PowerDraw,
        Metric::GraphicsClock,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::GpuUtil => "GPU utilization (%)",
            Metric::MemoryUtil => "Memory utilization (%)",
            Metric::MemoryUsed => "Memory used (MB)",
            Metric::Temperature => "Temperature (°C)",
            Metric::MemoryTemperature => "Memory temperature (°C)",
            Metric::FanSpeed => "Fan speed (%)",
            Metric::PowerDraw => "Power draw (W)",
            Metric::GraphicsClock => "Graphics clock (MHz)",
        }
    }

    pub fn value(self, gpu: &GpuSample) -> f64 {
        match self {
            Metric::GpuUtil => gpu.gpu_util_percent,
            Metric::MemoryUtil => gpu.memory_util_percent,
            Metric::MemoryUsed => gpu.memory_used_mb,
            Metric::Temperature => gpu.temp_c,
            Metric::MemoryTemperature => gpu.memory_temp_c,
            Metric::FanSpeed => gpu.fan_speed_percent,
            Metric::PowerDraw => gpu.power_draw_w,
            Metric::GraphicsClock => gpu.clock_mhz,
        }
    }
}

/// One observation of every metric for a GPU
#[derive(Debug, Clone)]
struct Sample {
    timestamp: f64,
    values: [f64; 8],
}

/// Metric history keyed by `workstation/uuid`
pub struct MetricHistory {
    gpus: BTreeMap<String, VecDeque<Sample>>,
    /// Maximum samples kept per GPU (ring buffer)
    capacity: usize,
}

impl MetricHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            gpus: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append the current snapshot of every GPU
    ///
    /// Returns the number of samples added. A workstation whose `last_seen`
    /// did not advance since the previous record contributes nothing. GPUs
    /// missing from the snapshot are forgotten along with their history.
    pub fn record(&mut self, groups: &[WorkstationGroup]) -> usize {
        let mut added = 0;
        let mut seen = BTreeSet::new();
        for ws in groups.iter().flat_map(|g| g.workstations.iter()) {
            for gpu in &ws.gpus {
                let key = format!("{}/{}", ws.name, gpu.uuid);
                seen.insert(key.clone());
                let capacity = self.capacity;
                let samples = self.gpus.entry(key).or_insert_with_key(|key| {
                    debug!(gpu = %key, "New GPU registered for history");
                    VecDeque::with_capacity(capacity.min(256))
                });

                if samples
                    .back()
                    .is_some_and(|last| last.timestamp >= ws.last_seen_seconds)
                {
                    continue;
                }

                if samples.len() >= capacity {
                    samples.pop_front();
                }

                let mut values = [0.0; 8];
                for (slot, metric) in values.iter_mut().zip(Metric::ALL) {
                    *slot = metric.value(gpu);
                }
                samples.push_back(Sample {
                    timestamp: ws.last_seen_seconds,
                    values,
                });
                added += 1;
            }
        }

        self.gpus.retain(|key, _| {
            let keep = seen.contains(key);
            if !keep {
                debug!(gpu = %key, "GPU left the pool, history dropped");
            }
            keep
        });
        trace!(added, gpus = self.gpus.len(), "History recorded");
        added
    }

    /// Number of GPUs seen
    pub fn gpu_count(&self) -> usize {
        self.gpus.len()
    }

    /// Length of the longest per-GPU history
    pub fn max_len(&self) -> usize {
        self.gpus.values().map(VecDeque::len).max().unwrap_or(0)
    }

    /// One series per GPU, ordered by key
    pub fn series(&self, metric: Metric) -> Vec<NamedSeries> {
        let slot = Metric::ALL
            .iter()
            .position(|&m| m == metric)
            .unwrap_or_default();
        self.gpus
            .iter()
            .map(|(key, samples)| {
                NamedSeries::new(
                    key.clone(),
                    samples
                        .iter()
                        .map(|s| Point::new(s.timestamp, s.values[slot]))
                        .collect(),
                )
            })
            .collect()
    }
}
