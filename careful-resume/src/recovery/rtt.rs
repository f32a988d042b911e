//! Windowed RTT min/max tracking and the hystart slow-start-exit test.

use std::time::Duration;

use crate::config::Config;

/// A fixed-depth window of RTT samples, used by hystart to detect the
/// delay increase that signals it's time to leave slow start.
///
/// Samples are admitted at most once per millisecond (see
/// [`RttFilter::test`]); within an admitted window of `scope` samples the
/// filter derives a floor (`rtt_filtered_min`) and counts how many
/// consecutive windows came in "too high" above that floor.
#[derive(Clone, Debug)]
pub struct RttFilter {
    samples: Vec<Duration>,
    scope: usize,
    cursor: usize,
    is_init: bool,
    sample_min: Duration,
    sample_max: Duration,
    rtt_filtered_min: Option<Duration>,
    nb_rtt_excess: u32,
    last_rtt_sample_time: Option<Duration>,
}

impl RttFilter {
    pub fn new(cfg: &Config) -> Self {
        RttFilter {
            samples: vec![Duration::ZERO; cfg.min_max_rtt_scope],
            scope: cfg.min_max_rtt_scope,
            cursor: 0,
            is_init: false,
            sample_min: Duration::ZERO,
            sample_max: Duration::ZERO,
            nb_rtt_excess: 0,
            rtt_filtered_min: None,
            last_rtt_sample_time: None,
        }
    }

    pub fn sample_min(&self) -> Duration {
        self.sample_min
    }

    pub fn sample_max(&self) -> Duration {
        self.sample_max
    }

    pub fn rtt_filtered_min(&self) -> Option<Duration> {
        self.rtt_filtered_min
    }

    /// Folds a new sample into the window and recomputes min/max over the
    /// samples currently held.
    fn observe(&mut self, rtt: Duration) {
        self.samples[self.cursor] = rtt;
        self.cursor += 1;
        if self.cursor >= self.scope {
            self.is_init = true;
            self.cursor = 0;
        }

        let filled = if self.is_init { self.scope } else { self.cursor };
        self.sample_min = self.samples[0];
        self.sample_max = self.samples[0];
        for sample in &self.samples[1..filled] {
            if *sample < self.sample_min {
                self.sample_min = *sample;
            } else if *sample > self.sample_max {
                self.sample_max = *sample;
            }
        }
    }

    /// The hystart RTT-increase test: admits a sample (at most once per
    /// millisecond), folds it into the window, and reports whether the
    /// RTT floor has been exceeded for `scope` consecutive windows.
    ///
    /// Returns `true` once that happens, signalling the caller should
    /// exit slow start.
    pub fn test(&mut self, rtt_measurement: Duration, now: Duration) -> bool {
        if let Some(last) = self.last_rtt_sample_time {
            if now <= last + Duration::from_millis(1) {
                return false;
            }
        }

        self.observe(rtt_measurement);
        self.last_rtt_sample_time = Some(now);

        if !self.is_init {
            return false;
        }

        let floor = match self.rtt_filtered_min {
            Some(floor) if floor <= self.sample_max => floor,
            _ => {
                self.rtt_filtered_min = Some(self.sample_max);
                self.sample_max
            },
        };
        let delta_max = floor / 4;

        if self.sample_min > floor {
            if self.sample_min > floor + delta_max {
                self.nb_rtt_excess += 1;
                return self.nb_rtt_excess >= self.scope as u32;
            }
        } else {
            self.nb_rtt_excess = 0;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_quiet_while_rtt_is_flat() {
        let cfg = Config::new().with_min_max_rtt_scope(4);
        let mut filter = RttFilter::new(&cfg);
        let mut now = Duration::from_millis(0);
        for _ in 0..40 {
            now += Duration::from_millis(5);
            assert!(!filter.test(Duration::from_millis(50), now));
        }
    }

    #[test]
    fn signals_after_scope_consecutive_excess_windows() {
        let cfg = Config::new().with_min_max_rtt_scope(4);
        let mut filter = RttFilter::new(&cfg);
        let mut now = Duration::from_millis(0);
        for _ in 0..4 {
            now += Duration::from_millis(5);
            filter.test(Duration::from_millis(50), now);
        }

        let mut signalled = false;
        for _ in 0..4 * 4 {
            now += Duration::from_millis(5);
            if filter.test(Duration::from_millis(90), now) {
                signalled = true;
            }
        }
        assert!(signalled);
    }

    #[test]
    fn samples_closer_than_a_millisecond_are_ignored() {
        let cfg = Config::new().with_min_max_rtt_scope(4);
        let mut filter = RttFilter::new(&cfg);
        filter.test(Duration::from_millis(50), Duration::from_millis(10));
        assert!(!filter.test(Duration::from_millis(200), Duration::from_millis(10)));
    }
}
