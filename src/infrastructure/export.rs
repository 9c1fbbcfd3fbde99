use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::domain::Segment;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write samples: {0}")]
    Io(#[from] io::Error),

    #[error("cannot write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct CsvRow {
    segment: usize,
    x: f64,
    y: f64,
}

#[derive(Serialize)]
struct SampledCurve<'a> {
    expression: &'a str,
    segments: &'a [Segment],
}

/// Writes sampled curves as CSV or JSON.
pub struct SampleExporter;

impl SampleExporter {
    /// One `segment,x,y` row per sample, segments numbered from zero.
    pub fn write_csv<W: Write>(segments: &[Segment], writer: W) -> Result<(), ExportError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (segment, points) in segments.iter().enumerate() {
            for point in points {
                csv_writer.serialize(CsvRow {
                    segment,
                    x: point.x,
                    y: point.y,
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// `{"expression": ..., "segments": [[{"x": .., "y": ..}, ..], ..]}`
    pub fn write_json<W: Write>(
        expression: &str,
        segments: &[Segment],
        writer: W,
    ) -> Result<(), ExportError> {
        let curve = SampledCurve { expression, segments };
        serde_json::to_writer_pretty(writer, &curve)?;
        Ok(())
    }

    pub fn export_csv(segments: &[Segment], path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        Self::write_csv(segments, BufWriter::new(file))?;
        info!("wrote {} segments to {}", segments.len(), path.display());
        Ok(())
    }

    pub fn export_json(expression: &str, segments: &[Segment], path: &Path) -> Result<(), ExportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_json(expression, segments, &mut writer)?;
        writer.flush()?;
        info!("wrote {} segments to {}", segments.len(), path.display());
        Ok(())
    }
}
