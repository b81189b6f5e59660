//! Measurement export
//!
//! Writes a session snapshot as pretty-printed JSON, named after the local
//! time it was taken.

use crate::error::Result;
use chrono::{DateTime, Local};
use depthmeasure_core::{Pixel, Point3f, SessionSnapshot, SessionState};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// One exported measurement anchor
#[derive(Debug, Clone, Serialize)]
pub struct ExportedPoint {
    pub label: String,
    pub pixel: Pixel,
    /// Camera-space position in meters
    pub world: [f32; 3],
}

/// A measurement as written to disk
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementRecord {
    pub timestamp: String,
    pub state: SessionState,
    pub points: Vec<ExportedPoint>,
    pub distance_cm: Option<f32>,
    pub feedback: String,
}

impl MeasurementRecord {
    pub fn from_snapshot(snapshot: &SessionSnapshot, taken_at: DateTime<Local>) -> Self {
        let points = snapshot
            .points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let world: Point3f = point.world();
                ExportedPoint {
                    label: format!("P{}", i + 1),
                    pixel: point.pixel(),
                    world: [world.x, world.y, world.z],
                }
            })
            .collect();

        Self {
            timestamp: taken_at.to_rfc3339(),
            state: snapshot.state,
            points,
            distance_cm: snapshot.distance_cm,
            feedback: snapshot.feedback.clone(),
        }
    }
}

/// File name of the form `{prefix}_YYYYmmdd_HHMMSS.{extension}`
pub fn timestamped_name(prefix: &str, extension: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), extension)
}

/// Write `record` as JSON to `path`
pub fn write_record<P: AsRef<Path>>(record: &MeasurementRecord, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Export a snapshot into `dir` and return the written path
pub fn write_measurement_json<P: AsRef<Path>>(snapshot: &SessionSnapshot, dir: P) -> Result<PathBuf> {
    write_measurement_json_at(snapshot, dir, Local::now())
}

/// Export a snapshot taken at `taken_at`, which also names the file
pub fn write_measurement_json_at<P: AsRef<Path>>(
    snapshot: &SessionSnapshot,
    dir: P,
    taken_at: DateTime<Local>,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(timestamped_name("measurement", "json", taken_at));
    write_record(&MeasurementRecord::from_snapshot(snapshot, taken_at), &path)?;
    info!(path = %path.display(), "Measurement exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use depthmeasure_core::MeasurementSession;

    fn measured_snapshot() -> SessionSnapshot {
        let mut session = MeasurementSession::new();
        session.select_sample(Pixel::new(10, 20), &Ok(Point3f::new(0.0, 0.0, 1.0)));
        session.select_sample(Pixel::new(30, 20), &Ok(Point3f::new(0.0, 0.0, 2.0)));
        session.snapshot()
    }

    #[test]
    fn test_timestamped_name() {
        let at = Local.with_ymd_and_hms(2024, 4, 4, 9, 5, 30).unwrap();
        assert_eq!(timestamped_name("screenshot", "png", at), "screenshot_20240404_090530.png");
    }

    #[test]
    fn test_record_json_fields() {
        let at = Local.with_ymd_and_hms(2024, 4, 4, 9, 5, 30).unwrap();
        let record = MeasurementRecord::from_snapshot(&measured_snapshot(), at);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["state"], "Measured");
        assert_eq!(value["distance_cm"], 100.0);
        assert_eq!(value["points"][0]["label"], "P1");
        assert_eq!(value["points"][1]["pixel"]["u"], 30);
        assert_eq!(value["points"][1]["world"][2], 2.0);
        assert_eq!(value["feedback"], "Distance: 100.00 cm");
    }

    #[test]
    fn test_write_measurement_json() {
        let dir = std::env::temp_dir().join("depthmeasure_export_test");
        let path = write_measurement_json(&measured_snapshot(), &dir).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"distance_cm\": 100.0"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_measurement_json_at_fixed_time() {
        let dir = std::env::temp_dir().join("depthmeasure_export_at_test");
        let at = Local.with_ymd_and_hms(2024, 4, 4, 9, 5, 30).unwrap();
        let path = write_measurement_json_at(&measured_snapshot(), &dir, at).unwrap();
        assert_eq!(path, dir.join("measurement_20240404_090530.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["timestamp"], at.to_rfc3339());
        std::fs::remove_dir_all(&dir).ok();
    }
}
