//! Sample stream parsing.
//!
//! One sample per line, either `timestamp,value` or a bare `value` (the
//! timestamp is then the 1-based sample number). Blank lines and `#`
//! comments are skipped. A first line whose value does not parse is taken
//! as a header.

use std::io::BufRead;

use anyhow::{Context, Result, bail};

#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub timestamp: String,
    pub value: f64,
}

pub struct SampleReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    emitted: u64,
    seen_content: bool,
}

impl<R: BufRead> SampleReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            emitted: 0,
            seen_content: false,
        }
    }

    fn parse(&mut self, line: &str) -> Result<Option<Sample>> {
        let (timestamp, raw) = match line.rsplit_once(',') {
            Some((ts, v)) => (Some(ts.trim()), v.trim()),
            None => (None, line),
        };

        let first = !self.seen_content;
        self.seen_content = true;

        let value: f64 = match raw.parse() {
            Ok(v) => v,
            Err(_) if first => {
                tracing::debug!("skipping header line: {line}");
                return Ok(None);
            }
            Err(e) => bail!("line {}: invalid sample value '{raw}': {e}", self.line_no),
        };
        if !value.is_finite() {
            bail!("line {}: sample value must be finite, got {raw}", self.line_no);
        }

        self.emitted += 1;
        let timestamp = match timestamp {
            Some(ts) => ts.to_string(),
            None => self.emitted.to_string(),
        };
        Ok(Some(Sample { timestamp, value }))
    }
}

impl<R: BufRead> Iterator for SampleReader<R> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("failed to read line {}", self.line_no + 1)),
                    );
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match self.parse(trimmed) {
                Ok(Some(sample)) => return Some(Ok(sample)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
