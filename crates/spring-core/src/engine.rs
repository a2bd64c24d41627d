use std::sync::Arc;

use crate::cell::Cell;
use crate::config::SpringConfig;
use crate::debug::{DebugSink, Silent};
use crate::error::Result;
use crate::occurrence::DetectedOccurrence;
use crate::profile::Profile;

/// SPRING matcher: streaming subsequence DTW against one profile.
///
/// Each call to [`advance`](Self::advance) is one cycle. It fills one column
/// of the warping matrix in O(profile length) and reports the best candidate
/// once no reachable path can still improve on it while overlapping its span.
///
/// Cycles must be fed in strict temporal order with none skipped or
/// repeated; the engine cannot detect a broken sequence. One engine per
/// stream, no shared state between engines.
pub struct SpringEngine<S: DebugSink = Silent> {
    profile: Profile,
    config: SpringConfig,
    sink: S,
    cycle: u64,
    /// Double-buffered columns; `columns[active]` is written this cycle,
    /// the other one holds the previous cycle.
    columns: [Vec<Cell>; 2],
    active: usize,
    /// Lowest-distance complete match within threshold and the cycle it ended.
    best: Option<(Cell, u64)>,
}

impl SpringEngine<Silent> {
    pub fn new(profile: Profile, config: SpringConfig) -> Result<Self> {
        Self::with_sink(profile, config, Silent)
    }
}

impl<S: DebugSink> SpringEngine<S> {
    pub fn with_sink(profile: Profile, config: SpringConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let column = vec![Cell::unreached(); profile.len() + 1];
        Ok(Self {
            profile,
            config,
            sink,
            cycle: 0,
            columns: [column.clone(), column],
            active: 0,
            best: None,
        })
    }

    /// Back to cycle 0 with sentinel columns and no candidate.
    pub fn reset(&mut self) {
        self.cycle = 0;
        for column in &mut self.columns {
            column.fill(Cell::unreached());
        }
        self.active = 0;
        self.best = None;
    }

    /// Process one sample. Returns the occurrence concluded during this cycle, if any.
    pub fn advance(&mut self, sample: f64, timestamp: &str) -> Option<DetectedOccurrence> {
        self.cycle += 1;
        let cycle = self.cycle;
        let len = self.profile.len();

        if self.sink.enabled() {
            self.sink
                .emit(&format!("New cycle. Tick: {cycle}. input: {sample:?}"));
        }

        let [first, second] = &mut self.columns;
        let (current, previous) = if self.active == 0 {
            (first, &*second)
        } else {
            (second, &*first)
        };
        current[0] = Cell::seed(0.0, cycle, Arc::from(timestamp));

        let reference = self.profile.aligned();
        let mut still_possible = true;
        let mut surpass_count = 0;
        let mut detected = None;

        for i in 1..=len {
            let absolute_distance = (sample - reference[i]).abs();

            // ties keep the earlier candidate
            let mut predecessor = &current[i - 1];
            if predecessor.distance() > previous[i].distance() {
                predecessor = &previous[i];
            }
            if predecessor.distance() > previous[i - 1].distance() {
                predecessor = &previous[i - 1];
            }
            current[i] = Cell::extend(absolute_distance, sample, predecessor);

            if self.sink.enabled() {
                self.sink
                    .emit(&format!("Updated matrix on position {i}: {}", current[i]));
            }

            // Detection only; the column keeps filling after `still_possible` drops.
            let Some((candidate, end_cycle)) = &self.best else {
                continue;
            };
            if !still_possible {
                continue;
            }
            let end_cycle = *end_cycle;

            if current[i].distance() >= candidate.distance() || current[i].start_cycle() > end_cycle
            {
                surpass_count += 1;
            } else {
                still_possible = false;
            }

            let span = (end_cycle - candidate.start_cycle() + 1) as f64;
            if surpass_count == len
                && span >= self.config.sequence_length_minimum * len as f64
                && candidate.cumulative_sum()
                    >= self.config.sequence_energy_minimum * self.profile.total_energy()
            {
                let occurrence = DetectedOccurrence::from_candidate(candidate, end_cycle, cycle);
                if self.sink.enabled() {
                    self.sink.emit(&format!(
                        "Operating state found! dMin: {:?}, start: {}, end: {end_cycle}\n\tObserved state: {occurrence}",
                        candidate.distance(),
                        candidate.start_cycle(),
                    ));
                }

                for cell in current.iter_mut().skip(1) {
                    if cell.start_cycle() <= end_cycle {
                        *cell = cell.retired();
                    }
                }
                self.best = None;
                detected = Some(occurrence);
            }
        }

        let last = &current[len];
        let improves = match &self.best {
            Some((candidate, _)) => last.distance() < candidate.distance(),
            None => true,
        };
        if last.distance() <= self.config.threshold && improves {
            if self.sink.enabled() {
                self.sink.emit(&format!(
                    "Updated dMin: {:?}, start: {}, end: {cycle}",
                    last.distance(),
                    last.start_cycle(),
                ));
            }
            self.best = Some((last.clone(), cycle));
        }

        self.active ^= 1;
        detected
    }

    /// Feed `(sample, timestamp)` pairs in order, collecting every report.
    pub fn monitor<I, T>(&mut self, samples: I) -> Vec<DetectedOccurrence>
    where
        I: IntoIterator<Item = (f64, T)>,
        T: AsRef<str>,
    {
        samples
            .into_iter()
            .filter_map(|(sample, timestamp)| self.advance(sample, timestamp.as_ref()))
            .collect()
    }

    /// Write the engine parameters to the debug sink.
    pub fn report_initialization(&mut self) {
        if !self.sink.enabled() {
            return;
        }
        let line = format!(
            "SPRING algorithm initialised\n     Operating state profile length: {}\n     \
             Operating state profile SPRING threshold: {:?}\n     \
             Operating state profile total energy: {:?}",
            self.profile.len(),
            self.config.threshold,
            self.profile.total_energy()
        );
        self.sink.emit(&line);
    }

    /// Number of samples processed since construction or the last reset.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Current best candidate and the cycle at which it ends.
    pub fn best_candidate(&self) -> Option<(&Cell, u64)> {
        self.best.as_ref().map(|(cell, end)| (cell, *end))
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Column written by the most recent cycle.
    #[cfg(test)]
    fn last_column(&self) -> &[Cell] {
        &self.columns[self.active ^ 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::Recorder;
    use crate::error::ConfigError;

    const STREAM: [f64; 7] = [5.0, 12.0, 6.0, 10.0, 6.0, 5.0, 13.0];

    fn canonical_profile() -> Profile {
        Profile::new(1, vec![11.0, 6.0, 9.0, 4.0]).unwrap()
    }

    fn engine(config: SpringConfig) -> SpringEngine {
        SpringEngine::new(canonical_profile(), config).unwrap()
    }

    fn feed(engine: &mut SpringEngine<impl DebugSink>, stream: &[f64]) -> Vec<Option<DetectedOccurrence>> {
        stream
            .iter()
            .enumerate()
            .map(|(i, &x)| engine.advance(x, &(i + 1).to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_single_match() {
        let mut e = engine(SpringConfig::new(10.0));
        let results = feed(&mut e, &STREAM);

        assert!(results[..6].iter().all(Option::is_none));
        let o = results[6].as_ref().expect("reported on the 7th sample");
        assert_eq!(o, &DetectedOccurrence::new("2", 2, 5, 7, 4.0, 12.0, 6.0, 34.0));
        assert_eq!(o.duration(), 4);
        assert_eq!(o.reporting_latency(), 2);
    }

    #[test]
    fn test_best_candidate_tracking() {
        let mut e = engine(SpringConfig::new(10.0));
        feed(&mut e, &STREAM[..5]);
        let (cell, end) = e.best_candidate().expect("candidate after cycle 5");
        assert_eq!(cell.distance(), 4.0);
        assert_eq!(cell.start_cycle(), 2);
        assert_eq!(end, 5);
    }

    #[test]
    fn test_candidate_cleared_after_report() {
        let mut e = engine(SpringConfig::new(10.0));
        feed(&mut e, &STREAM);
        assert!(e.best_candidate().is_none());
        // every path overlapping the reported span is retired
        for cell in &e.last_column()[1..] {
            assert!(cell.start_cycle() > 5 || !cell.is_reached());
        }
    }

    #[test]
    fn test_column_zero_is_seeded_each_cycle() {
        let mut e = engine(SpringConfig::new(10.0));
        e.advance(5.0, "a");
        e.advance(7.0, "b");
        let col = e.last_column();
        assert_eq!(col.len(), 5);
        assert_eq!(col[0].distance(), 0.0);
        assert_eq!(col[0].start_cycle(), 2);
        assert_eq!(col[0].start_time(), "b");
    }

    #[test]
    fn test_first_cycle_column() {
        let mut e = engine(SpringConfig::new(10.0));
        e.advance(5.0, "1");
        let col = e.last_column();
        // only the path starting now is reachable: 6, 7, 11, 12
        let distances: Vec<f64> = col[1..].iter().map(Cell::distance).collect();
        assert_eq!(distances, [6.0, 7.0, 11.0, 12.0]);
        assert!(col[1..].iter().all(|c| c.start_cycle() == 1));
    }

    #[test]
    fn test_tie_prefers_current_column() {
        // all-zero profile and stream: every predecessor ties at 0 and the
        // path starting in the current cycle wins
        let p = Profile::new(1, vec![0.0, 0.0]).unwrap();
        let mut e = SpringEngine::new(p, SpringConfig::new(0.0)).unwrap();
        e.advance(0.0, "1");
        e.advance(0.0, "2");
        assert!(e.last_column()[1..].iter().all(|c| c.start_cycle() == 2));
    }

    #[test]
    fn test_energy_minimum_suppresses() {
        let mut e = engine(SpringConfig::new(10.0).with_energy_minimum(34.0 / 30.0 + 1e-9));
        assert!(feed(&mut e, &STREAM).iter().all(Option::is_none));

        let mut e = engine(SpringConfig::new(10.0).with_energy_minimum(1.0));
        assert_eq!(feed(&mut e, &STREAM).iter().flatten().count(), 1);
    }

    #[test]
    fn test_length_minimum_gates() {
        // the match covers exactly 4 cycles of a 4-sample profile
        let mut e = engine(SpringConfig::new(10.0).with_length_minimum(1.0));
        assert_eq!(feed(&mut e, &STREAM).iter().flatten().count(), 1);

        let mut e = engine(SpringConfig::new(10.0).with_length_minimum(1.01));
        assert!(feed(&mut e, &STREAM).iter().all(Option::is_none));
    }

    #[test]
    fn test_threshold_below_best_distance() {
        let mut e = engine(SpringConfig::new(3.9));
        assert!(feed(&mut e, &STREAM).iter().all(Option::is_none));
        assert_eq!(e.cycle(), 7);
    }

    #[test]
    fn test_still_possible_blocks_detection_not_fill() {
        let mut e = engine(SpringConfig::new(10.0));
        feed(&mut e, &STREAM[..5]);
        // cycle 6: position 1 restarts at distance 6 >= 4, but position 2 still
        // overlaps the candidate span with a smaller distance
        assert!(e.advance(5.0, "6").is_none());
        let col = e.last_column();
        assert!(col[2].distance() < 4.0 && col[2].start_cycle() <= 5);
        // the tail of the column was still filled this cycle
        assert_eq!(col[4].start_cycle(), 2);
        assert_eq!(col[4].distance(), 5.0);
        assert!(e.best_candidate().is_some());
    }

    #[test]
    fn test_reset_restarts_cycle_count() {
        let mut e = engine(SpringConfig::new(10.0));
        feed(&mut e, &STREAM[..5]);
        e.reset();
        assert_eq!(e.cycle(), 0);
        assert!(e.best_candidate().is_none());
        let results = feed(&mut e, &STREAM);
        assert_eq!(results.iter().flatten().count(), 1);
    }

    #[test]
    fn test_monitor_collects_reports() {
        let mut e = engine(SpringConfig::new(10.0));
        let samples = STREAM.iter().enumerate().map(|(i, &x)| (x, format!("{}", i + 1)));
        let found = e.monitor(samples);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].report_cycle(), 7);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = SpringEngine::new(canonical_profile(), SpringConfig::new(-1.0))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::InvalidThreshold(-1.0));
    }

    #[test]
    fn test_debug_lines() {
        let mut e =
            SpringEngine::with_sink(canonical_profile(), SpringConfig::new(10.0), Recorder::new("[p1] "))
                .unwrap();
        e.report_initialization();
        feed(&mut e, &STREAM);

        let lines = e.into_sink().lines().to_vec();
        assert!(lines[0].starts_with("[p1] SPRING algorithm initialised"));
        assert!(lines[0].contains("profile length: 4"));
        assert!(lines[0].contains("threshold: 10.0"));
        assert!(lines[0].contains("total energy: 30.0"));
        assert_eq!(lines[1], "[p1] New cycle. Tick: 1. input: 5.0");
        assert!(lines[2].starts_with("[p1] Updated matrix on position 1: Cell [startTime=1"));
        assert_eq!(lines.iter().filter(|l| l.contains("New cycle")).count(), 7);
        assert_eq!(lines.iter().filter(|l| l.contains("Updated matrix")).count(), 28);
        assert!(lines.iter().any(|l| l == "[p1] Updated dMin: 4.0, start: 2, end: 5"));
        let found: Vec<_> = lines.iter().filter(|l| l.contains("Operating state found!")).collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("dMin: 4.0, start: 2, end: 5"));
    }

    /// Disabled sink that counts what reaches it anyway.
    #[derive(Default)]
    struct Muted {
        emitted: usize,
    }

    impl DebugSink for Muted {
        fn enabled(&self) -> bool {
            false
        }

        fn emit(&mut self, _line: &str) {
            self.emitted += 1;
        }
    }

    #[test]
    fn test_disabled_sink_receives_nothing() {
        let mut e =
            SpringEngine::with_sink(canonical_profile(), SpringConfig::new(10.0), Muted::default())
                .unwrap();
        e.report_initialization();
        let results = feed(&mut e, &STREAM);
        assert!(results[6].is_some());
        assert_eq!(e.sink().emitted, 0);
    }

    #[test]
    fn test_borrowed_recorder() {
        let mut r = Recorder::new("");
        {
            let mut e =
                SpringEngine::with_sink(canonical_profile(), SpringConfig::new(10.0), &mut r).unwrap();
            e.advance(1.0, "1");
        }
        assert_eq!(r.lines().len(), 5);
    }
}
