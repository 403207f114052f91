//! Per-node wall/LLM/I/O timing accounting (spec §4.2).

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One node's timing breakdown for a single execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingRecord {
    pub node: String,
    pub tool_pipeline: String,
    pub wall_time_ms: u64,
    pub llm_time_ms: u64,
    pub io_time_ms: u64,
    pub overhead_ms: u64,
}

/// Wraps a node body, accumulating explicitly-marked LLM/IO sub-intervals
/// against the node's total wall time.
///
/// ```rust,ignore
/// let mut timer = NodeTimer::start("generate_sql", "sql");
/// let sql = timer.time_llm(|| llm.invoke(&prompt)).await?;
/// let record = timer.finish();
/// ```
pub struct NodeTimer {
    node: String,
    tool_pipeline: String,
    started: Instant,
    llm_ms: u64,
    io_ms: u64,
}

impl NodeTimer {
    pub fn start(node: impl Into<String>, tool_pipeline: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            tool_pipeline: tool_pipeline.into(),
            started: Instant::now(),
            llm_ms: 0,
            io_ms: 0,
        }
    }

    pub fn add_llm_ms(&mut self, ms: u64) {
        self.llm_ms += ms;
    }

    pub fn add_io_ms(&mut self, ms: u64) {
        self.io_ms += ms;
    }

    pub fn finish(self) -> TimingRecord {
        let wall = self.started.elapsed().as_millis() as u64;
        let overhead = wall.saturating_sub(self.llm_ms + self.io_ms);
        TimingRecord {
            node: self.node,
            tool_pipeline: self.tool_pipeline,
            wall_time_ms: wall,
            llm_time_ms: self.llm_ms,
            io_time_ms: self.io_ms,
            overhead_ms: overhead,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TimingSummary {
    pub by_pipeline_wall_ms: HashMap<String, u64>,
    pub total_wall_ms: u64,
    pub slowest_node: Option<String>,
    pub slowest_node_wall_ms: u64,
}

pub fn aggregate_timing(records: &[TimingRecord]) -> TimingSummary {
    let mut summary = TimingSummary::default();
    for record in records {
        *summary
            .by_pipeline_wall_ms
            .entry(record.tool_pipeline.clone())
            .or_insert(0) += record.wall_time_ms;
        summary.total_wall_ms += record.wall_time_ms;
        if record.wall_time_ms > summary.slowest_node_wall_ms {
            summary.slowest_node_wall_ms = record.wall_time_ms;
            summary.slowest_node = Some(record.node.clone());
        }
    }
    summary
}

/// p50/p90/p95 over a set of per-turn totals (e.g. one `total_wall_ms` per turn
/// across a run). Returns `(p50, p90, p95)`; `0` for each when `values` is empty.
pub fn percentiles(values: &[u64]) -> (u64, u64, u64) {
    if values.is_empty() {
        return (0, 0, 0);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let pick = |p: f64| -> u64 {
        let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    };
    (pick(0.50), pick(0.90), pick(0.95))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_computes_overhead_as_remainder() {
        let mut timer = NodeTimer::start("generate_sql", "sql");
        timer.add_llm_ms(5);
        timer.add_io_ms(2);
        std::thread::sleep(std::time::Duration::from_millis(10));
        let record = timer.finish();
        assert_eq!(record.llm_time_ms, 5);
        assert_eq!(record.io_time_ms, 2);
        assert_eq!(
            record.overhead_ms,
            record.wall_time_ms.saturating_sub(7)
        );
    }

    #[test]
    fn aggregate_timing_finds_slowest_node() {
        let records = vec![
            TimingRecord {
                node: "a".into(),
                tool_pipeline: "sql".into(),
                wall_time_ms: 10,
                llm_time_ms: 5,
                io_time_ms: 0,
                overhead_ms: 5,
            },
            TimingRecord {
                node: "b".into(),
                tool_pipeline: "sql".into(),
                wall_time_ms: 50,
                llm_time_ms: 40,
                io_time_ms: 0,
                overhead_ms: 10,
            },
        ];
        let summary = aggregate_timing(&records);
        assert_eq!(summary.slowest_node.as_deref(), Some("b"));
        assert_eq!(summary.total_wall_ms, 60);
    }

    #[test]
    fn percentiles_of_empty_slice_are_zero() {
        assert_eq!(percentiles(&[]), (0, 0, 0));
    }

    #[test]
    fn percentiles_of_uniform_values_equal_that_value() {
        assert_eq!(percentiles(&[7, 7, 7, 7]), (7, 7, 7));
    }
}
