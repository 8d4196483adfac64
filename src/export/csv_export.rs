//! CSV time-series export of a sampled trajectory.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

use crate::state::Trajectory;

/// CSV exporter for trajectory time series.
///
/// One row per sample: time followed by position and velocity components
/// of every node (anchor included), so the column set depends on the
/// node count.
pub struct CsvExporter {
    writer: csv::Writer<File>,
    /// Path to output file
    path: PathBuf,
}

impl CsvExporter {
    /// Create an exporter with an auto-generated timestamped filename.
    ///
    /// Creates the exports directory if it doesn't exist.
    pub fn new() -> Result<Self> {
        let dir = PathBuf::from("exports");
        std::fs::create_dir_all(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("trajectory_{}.csv", timestamp);
        Self::to_path(dir.join(filename))
    }

    /// Create an exporter writing to a specific path.
    pub fn to_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let writer = csv::Writer::from_writer(file);

        log::info!("CSV export started: {}", path.display());

        Ok(Self { writer, path })
    }

    /// Write the header and every sample of a trajectory.
    pub fn write_trajectory(&mut self, trajectory: &Trajectory) -> Result<()> {
        let node_count = trajectory.node_count();

        let mut header = vec!["time_sec".to_string()];
        for i in 0..node_count {
            for axis in ["x", "y", "z"] {
                header.push(format!("{}{}_m", axis, i));
            }
        }
        for i in 0..node_count {
            for axis in ["vx", "vy", "vz"] {
                header.push(format!("{}{}_m_per_sec", axis, i));
            }
        }
        self.writer.write_record(&header)?;

        let mut record = Vec::with_capacity(header.len());
        for sample in trajectory.iter() {
            record.clear();
            record.push(sample.time_sec.to_string());
            for pos in &sample.positions_m {
                record.push(pos.x.to_string());
                record.push(pos.y.to_string());
                record.push(pos.z.to_string());
            }
            for vel in &sample.velocities_m_per_sec {
                record.push(vel.x.to_string());
                record.push(vel.y.to_string());
                record.push(vel.z.to_string());
            }
            self.writer.write_record(&record)?;
        }
        Ok(())
    }

    /// Finish writing and return the output path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!("CSV export completed: {}", self.path.display());
        Ok(self.path)
    }

    /// Get the output path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TrajectorySample;
    use glam::DVec3;

    fn tiny_trajectory() -> Trajectory {
        let sample = |t: f64| TrajectorySample {
            time_sec: t,
            positions_m: vec![DVec3::ZERO, DVec3::new(1.0, 0.0, -2.0)],
            velocities_m_per_sec: vec![DVec3::ZERO, DVec3::new(0.0, 0.0, -0.5)],
        };
        Trajectory {
            samples: vec![sample(0.0), sample(0.02), sample(0.04)],
        }
    }

    #[test]
    fn test_csv_round_shape() {
        let path = std::env::temp_dir().join("tether_sim_csv_export_test.csv");
        let mut exporter = CsvExporter::to_path(&path).unwrap();
        exporter.write_trajectory(&tiny_trajectory()).unwrap();
        let written = exporter.finish().unwrap();

        let contents = std::fs::read_to_string(&written).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        // Header plus three samples.
        assert_eq!(lines.len(), 4);
        // time + 2 nodes × (3 position + 3 velocity) columns.
        assert_eq!(lines[0].split(',').count(), 13);
        assert!(lines[0].starts_with("time_sec,x0_m,y0_m,z0_m"));

        std::fs::remove_file(written).ok();
    }
}
