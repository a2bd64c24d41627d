use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use spring_core::{CSV_HEADER, DetectedOccurrence};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Header line plus one comma-separated row per detection
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

/// Streams detections to a writer, flushing after each one so downstream
/// consumers see them as soon as they are reported.
pub struct DetectionWriter<W: Write> {
    out: W,
    format: OutputFormat,
}

impl<W: Write> DetectionWriter<W> {
    pub fn new(out: W, format: OutputFormat, header: bool) -> Result<Self> {
        let mut writer = Self { out, format };
        if header && format == OutputFormat::Csv {
            writeln!(writer.out, "{CSV_HEADER}")?;
        }
        Ok(writer)
    }

    pub fn write(&mut self, occurrence: &DetectedOccurrence) -> Result<()> {
        match self.format {
            OutputFormat::Csv => writeln!(self.out, "{}", occurrence.to_csv_row())?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, occurrence)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
