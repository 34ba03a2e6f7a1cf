//! Per-disappearance outcome log
//!
//! Append-only: one record per completed disappearance cycle, in order.
//! Exported at session end as a header + rows CSV table (and JSON).

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::TrialType;

/// File name of the trial table inside the output directory
pub const TRIAL_DATA_FILE: &str = "trial_data.csv";
/// JSON copy of the trial table
pub const TRIAL_JSON_FILE: &str = "trial_data.json";

/// CSV column order
pub const CSV_HEADER: [&str; 4] = [
    "disappearance_number",
    "disappeared_in_corner",
    "reappearance_type",
    "reappeared_in_corner",
];

/// Outcome of one disappearance cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisappearanceRecord {
    /// 1-based cycle number within the session
    pub disappearance_number: u32,
    pub disappeared_in_corner: bool,
    pub reappearance_type: TrialType,
    pub reappeared_in_corner: bool,
}

/// Aggregate counts for the end-of-session narration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub total: usize,
    pub predictable: usize,
    pub unpredictable: usize,
    pub disappeared_in_corner: usize,
    pub reappeared_in_corner: usize,
}

/// Session-long record log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecorder {
    records: Vec<DisappearanceRecord>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record; records are never modified afterwards
    pub fn push(&mut self, record: DisappearanceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DisappearanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> RecordSummary {
        self.records
            .iter()
            .fold(RecordSummary::default(), |mut s, r| {
                s.total += 1;
                match r.reappearance_type {
                    TrialType::Predictable => s.predictable += 1,
                    TrialType::Unpredictable => s.unpredictable += 1,
                }
                s.disappeared_in_corner += r.disappeared_in_corner as usize;
                s.reappeared_in_corner += r.reappeared_in_corner as usize;
                s
            })
    }

    /// Write the table (header always present, even with no rows)
    pub fn write_csv<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        writeln!(out, "{}", CSV_HEADER.join(","))?;
        for r in &self.records {
            writeln!(
                out,
                "{},{},{},{}",
                r.disappearance_number,
                r.disappeared_in_corner,
                r.reappearance_type.as_str(),
                r.reappeared_in_corner
            )?;
        }
        out.flush()
    }

    /// Write `trial_data.csv` into `dir`, creating it if needed
    pub fn save_csv(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(TRIAL_DATA_FILE);
        let export_err = |source| Error::Export {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(export_err)?;
        let file = File::create(&path).map_err(export_err)?;
        self.write_csv(BufWriter::new(file)).map_err(export_err)?;

        log::info!("Trial data saved to {}", path.display());
        Ok(path)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Write `trial_data.json` into `dir`, creating it if needed
    pub fn save_json(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(TRIAL_JSON_FILE);
        let json = self.to_json()?;
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&path, json))
            .map_err(|source| Error::Export {
                path: path.clone(),
                source,
            })?;
        log::info!("Trial data (JSON) saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u32, kind: TrialType, out_corner: bool, in_corner: bool) -> DisappearanceRecord {
        DisappearanceRecord {
            disappearance_number: n,
            disappeared_in_corner: out_corner,
            reappearance_type: kind,
            reappeared_in_corner: in_corner,
        }
    }

    #[test]
    fn test_csv_layout() {
        let mut rec = SessionRecorder::new();
        rec.push(record(1, TrialType::Predictable, false, true));
        rec.push(record(2, TrialType::Unpredictable, true, false));

        let mut buf = Vec::new();
        rec.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "disappearance_number,disappeared_in_corner,reappearance_type,reappeared_in_corner\n\
             1,false,predictable,true\n\
             2,true,unpredictable,false\n"
        );
    }

    #[test]
    fn test_empty_log_still_has_header() {
        let rec = SessionRecorder::new();
        let mut buf = Vec::new();
        rec.write_csv(&mut buf).unwrap();
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let mut rec = SessionRecorder::new();
        rec.push(record(1, TrialType::Predictable, true, true));
        rec.push(record(2, TrialType::Predictable, false, false));
        rec.push(record(3, TrialType::Unpredictable, false, true));

        let s = rec.summary();
        assert_eq!(s.total, 3);
        assert_eq!(s.predictable, 2);
        assert_eq!(s.unpredictable, 1);
        assert_eq!(s.disappeared_in_corner, 1);
        assert_eq!(s.reappeared_in_corner, 2);
    }

    #[test]
    fn test_json_uses_lowercase_trial_type() {
        let mut rec = SessionRecorder::new();
        rec.push(record(1, TrialType::Unpredictable, false, false));
        let json = rec.to_json().unwrap();
        assert!(json.contains("\"reappearance_type\": \"unpredictable\""));
    }

    #[test]
    fn test_save_json_reads_back() {
        let mut rec = SessionRecorder::new();
        rec.push(record(1, TrialType::Predictable, true, false));
        rec.push(record(2, TrialType::Unpredictable, false, true));

        let dir = std::env::temp_dir().join(format!("occlusion-json-{}", std::process::id()));
        let path = rec.save_json(&dir).unwrap();
        assert!(path.ends_with(TRIAL_JSON_FILE));
        let back: Vec<DisappearanceRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, rec.records());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_failure_keeps_records() {
        let mut rec = SessionRecorder::new();
        rec.push(record(1, TrialType::Predictable, false, false));

        // A regular file where a directory is expected
        let blocker = std::env::temp_dir().join(format!("occlusion-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"x").unwrap();
        let result = rec.save_csv(&blocker.join("nested"));
        assert!(matches!(result, Err(Error::Export { .. })));
        assert_eq!(rec.len(), 1);
        let _ = std::fs::remove_file(&blocker);
    }
}
