//! Comma-separated rendering of detected occurrences.
//!
//! Column order and the derived duration/latency columns are a compatibility
//! surface for downstream parsers. Floating columns always carry a fractional
//! part (`4.0`, not `4`) and switch to `1.0E7` style scientific notation
//! outside `[1e-3, 1e7)`.

use crate::occurrence::DetectedOccurrence;

pub const CSV_HEADER: &str = "timeStart,startPosition,endPosition,durationInCycles,\
reportingPosition,latencyInCycles,finalDtwDistance,powerMax,powerMin,energy";

pub fn csv_header() -> &'static str {
    CSV_HEADER
}

impl DetectedOccurrence {
    /// One CSV line, no trailing newline.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.start_time(),
            self.start_cycle(),
            self.end_cycle(),
            self.duration(),
            self.report_cycle(),
            self.reporting_latency(),
            decimal(self.distance()),
            decimal(self.max_value()),
            decimal(self.min_value()),
            decimal(self.total_energy()),
        )
    }
}

/// Shortest round-trip rendering in the `Double.toString` layout used by the
/// upstream consumers: plain decimal with at least one fractional digit for
/// magnitudes in `[1e-3, 1e7)`, `d.dddE±n` outside it.
fn decimal(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = v.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return format!("{v:?}");
    }

    let sci = format!("{v:e}");
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_columns() {
        let cols: Vec<&str> = csv_header().split(',').collect();
        assert_eq!(
            cols,
            [
                "timeStart",
                "startPosition",
                "endPosition",
                "durationInCycles",
                "reportingPosition",
                "latencyInCycles",
                "finalDtwDistance",
                "powerMax",
                "powerMin",
                "energy",
            ]
        );
    }

    #[test]
    fn test_canonical_row() {
        let o = DetectedOccurrence::new("2", 2, 5, 7, 4.0, 12.0, 6.0, 34.0);
        assert_eq!(o.to_csv_row(), "2,2,5,4,7,2,4.0,12.0,6.0,34.0");
    }

    #[test]
    fn test_fractional_values() {
        let o = DetectedOccurrence::new("t", 10, 12, 15, 0.25, 3.5, -1.5, 7.75);
        assert_eq!(o.to_csv_row(), "t,10,12,3,15,3,0.25,3.5,-1.5,7.75");
    }

    #[test]
    fn test_decimal_plain_range() {
        assert_eq!(decimal(0.0), "0.0");
        assert_eq!(decimal(-0.0), "-0.0");
        assert_eq!(decimal(0.001), "0.001");
        assert_eq!(decimal(9999999.0), "9999999.0");
        assert_eq!(decimal(1234567.5), "1234567.5");
    }

    #[test]
    fn test_decimal_scientific_range() {
        assert_eq!(decimal(1e7), "1.0E7");
        assert_eq!(decimal(12345678.0), "1.2345678E7");
        assert_eq!(decimal(-3.5e12), "-3.5E12");
        assert_eq!(decimal(1e-4), "1.0E-4");
        assert_eq!(decimal(-2.5e-5), "-2.5E-5");
    }

    #[test]
    fn test_decimal_non_finite() {
        assert_eq!(decimal(f64::NAN), "NaN");
        assert_eq!(decimal(f64::INFINITY), "Infinity");
        assert_eq!(decimal(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_large_energy_row() {
        let o = DetectedOccurrence::new("1", 1, 400, 402, 2.5, 61000.0, 0.0, 1.25e7);
        assert!(o.to_csv_row().ends_with(",2.5,61000.0,0.0,1.25E7"));
    }

    #[test]
    fn test_row_matches_header_width() {
        let o = DetectedOccurrence::new("2026-03-01 10:00", 1, 1, 2, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(
            o.to_csv_row().split(',').count(),
            CSV_HEADER.split(',').count()
        );
    }
}
