//! Percentile summaries over per-endpoint latency history.

use std::collections::HashMap;

use serde::Serialize;

use crate::endpoint::EndpointAddress;
use crate::probe::ResultRecord;

/// Order statistic with linear interpolation between ranks.
///
/// Returns `None` for an empty sample set. `p` is clamped to `[0, 100]`.
/// The input is copied and sorted on every call.
pub fn percentile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }

    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSnapshot {
    pub endpoint: EndpointAddress,
    pub p50: Option<f64>,
    pub p90: Option<f64>,
    pub p99: Option<f64>,
}

impl PercentileSnapshot {
    pub fn from_latencies(endpoint: EndpointAddress, latencies: &[f64]) -> Self {
        Self {
            endpoint,
            p50: percentile(latencies, 50.0),
            p90: percentile(latencies, 90.0),
            p99: percentile(latencies, 99.0),
        }
    }
}

/// Time-ordered records of a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSeries {
    endpoint: EndpointAddress,
    records: Vec<ResultRecord>,
}

impl EndpointSeries {
    pub fn new(endpoint: EndpointAddress) -> Self {
        Self {
            endpoint,
            records: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> &EndpointAddress {
        &self.endpoint
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Appends a record; returns it back if it belongs to another endpoint.
    pub fn push(&mut self, record: ResultRecord) -> Result<(), ResultRecord> {
        if record.endpoint != self.endpoint {
            return Err(record);
        }
        self.records.push(record);
        Ok(())
    }

    /// Latencies of successful probes only.
    pub fn latencies(&self) -> Vec<f64> {
        self.records.iter().filter_map(ResultRecord::elapsed_ms).collect()
    }

    pub fn snapshot(&self) -> PercentileSnapshot {
        PercentileSnapshot::from_latencies(self.endpoint.clone(), &self.latencies())
    }

    /// Fraction of probes that succeeded, `None` before the first probe.
    pub fn success_ratio(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let ok = self.records.iter().filter(|r| r.is_success()).count();
        Some(ok as f64 / self.records.len() as f64)
    }
}

/// Groups records per endpoint, keeping endpoints in first-seen order and
/// records in arrival order.
pub fn group_by_endpoint(records: impl IntoIterator<Item = ResultRecord>) -> Vec<EndpointSeries> {
    let mut series: Vec<EndpointSeries> = Vec::new();
    let mut index: HashMap<EndpointAddress, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.endpoint.clone()).or_insert_with(|| {
            series.push(EndpointSeries::new(record.endpoint.clone()));
            series.len() - 1
        });
        series[slot].records.push(record);
    }
    series
}
