// Per-Step JSONL Time Series Recorder
// One JSON line per driver step for independent analysis

use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct StepSnapshot {
    pub step: u64,
    pub wall_ms: u64,
    pub paused: bool,
    pub trades: u32,
    pub passes: u32,
    pub repriced: u32,
    pub skipped_unknown: u32,
    pub crossings: u32,
    pub mean_saturation: f64,
    pub max_saturation: f64,
    pub saturated_pairs: u32,
    /// Mean of price / base price over priced entries.
    pub mean_price_ratio: f64,
    pub min_stock: u32,
    pub news_lines: usize,
}

/// Accumulates snapshots and writes JSONL.
pub struct TimeSeriesRecorder {
    snapshots: Vec<StepSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, snapshot: StepSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for snapshot in &self.snapshots {
            writeln!(file, "{}", serde_json::to_string(snapshot)?)?;
        }
        file.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(step: u64) -> StepSnapshot {
        StepSnapshot {
            step,
            wall_ms: step * 1000,
            paused: false,
            trades: 2,
            passes: 1,
            repriced: 9,
            skipped_unknown: 1,
            crossings: 0,
            mean_saturation: 1.5,
            max_saturation: 4.0,
            saturated_pairs: 0,
            mean_price_ratio: 1.0,
            min_stock: 25,
            news_lines: 3,
        }
    }

    #[test]
    fn test_writes_one_line_per_step() {
        let mut rec = TimeSeriesRecorder::new();
        rec.record(snapshot(0));
        rec.record(snapshot(1));
        assert_eq!(rec.len(), 2);

        let path = std::env::temp_dir()
            .join(format!("market-drift-ts-{}", std::process::id()))
            .join("seed-0.jsonl");
        rec.write_jsonl(&path).expect("test: write");
        let body = std::fs::read_to_string(&path).expect("test: read");
        assert_eq!(body.lines().count(), 2);
        assert!(body.lines().all(|l| l.starts_with("{\"step\":")));
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
