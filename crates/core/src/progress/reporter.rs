//! Threshold-crossing progress events.

use std::time::{Duration, Instant};

use super::fraction_to_percent;

/// Emitted once for every threshold a stage's progress crosses.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Threshold crossed, in percent.
    pub percent: u32,
    /// Fraction actually observed when the threshold was crossed.
    pub fraction: f64,
    /// Rough time remaining, from the average rate so far.
    pub eta: Option<Duration>,
}

/// Turns a stream of progress fractions into threshold events.
///
/// With a step of 20, thresholds are 20, 40, 60, 80 and 100. Observing a
/// fraction that jumps over several thresholds yields one event for each of
/// them; no threshold is ever reported twice.
#[derive(Debug)]
pub struct ProgressReporter {
    step: u32,
    next: u32,
    started: Instant,
}

impl ProgressReporter {
    /// `step_pct` is clamped to `1..=100`.
    pub fn new(step_pct: u32) -> Self {
        let step = step_pct.clamp(1, 100);
        Self {
            step,
            next: step,
            started: Instant::now(),
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Feed the latest progress fraction (`0.0..=1.0`).
    pub fn observe(&mut self, fraction: f64) -> Vec<ProgressEvent> {
        if !fraction.is_finite() {
            return Vec::new();
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let percent = fraction_to_percent(fraction);
        let eta = self.eta(fraction);

        let mut events = Vec::new();
        while self.next <= 100 && percent >= self.next {
            events.push(ProgressEvent {
                percent: self.next,
                fraction,
                eta,
            });
            self.next += self.step;
        }
        events
    }

    /// Whether every threshold has been reported.
    pub fn is_finished(&self) -> bool {
        self.next > 100
    }

    fn eta(&self, fraction: f64) -> Option<Duration> {
        if fraction <= 0.0 || fraction >= 1.0 {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        let remaining = elapsed / fraction * (1.0 - fraction);
        Some(Duration::from_secs_f64(remaining))
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percents(events: &[ProgressEvent]) -> Vec<u32> {
        events.iter().map(|e| e.percent).collect()
    }

    #[test]
    fn test_one_event_per_threshold() {
        let mut reporter = ProgressReporter::default();
        assert!(reporter.observe(0.1).is_empty());
        assert_eq!(percents(&reporter.observe(0.2)), vec![20]);
        assert!(reporter.observe(0.25).is_empty());
        assert!(reporter.observe(0.39).is_empty());
        assert_eq!(percents(&reporter.observe(0.41)), vec![40]);
    }

    #[test]
    fn test_jump_emits_every_crossed_threshold() {
        let mut reporter = ProgressReporter::new(20);
        assert_eq!(percents(&reporter.observe(0.65)), vec![20, 40, 60]);
        assert_eq!(percents(&reporter.observe(1.0)), vec![80, 100]);
        assert!(reporter.is_finished());
        assert!(reporter.observe(1.0).is_empty());
    }

    #[test]
    fn test_regression_does_not_repeat() {
        let mut reporter = ProgressReporter::new(25);
        assert_eq!(percents(&reporter.observe(0.5)), vec![25, 50]);
        assert!(reporter.observe(0.3).is_empty());
        assert_eq!(percents(&reporter.observe(0.75)), vec![75]);
    }

    #[test]
    fn test_step_is_clamped() {
        assert_eq!(ProgressReporter::new(0).step(), 1);
        assert_eq!(ProgressReporter::new(500).step(), 100);
    }

    #[test]
    fn test_ignores_nan() {
        let mut reporter = ProgressReporter::default();
        assert!(reporter.observe(f64::NAN).is_empty());
        assert_eq!(percents(&reporter.observe(0.2)), vec![20]);
    }

    #[test]
    fn test_uneven_step() {
        let mut reporter = ProgressReporter::new(30);
        assert_eq!(percents(&reporter.observe(1.0)), vec![30, 60, 90]);
        assert!(reporter.is_finished());
    }

    #[test]
    fn test_fraction_rounding_keeps_threshold() {
        let mut reporter = ProgressReporter::new(1);
        assert_eq!(percents(&reporter.observe(0.29)), (1..=29).collect::<Vec<_>>());
        assert_eq!(percents(&reporter.observe(0.57)), (30..=57).collect::<Vec<_>>());
    }
}
