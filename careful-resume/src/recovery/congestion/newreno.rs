//! NewReno, with the Careful Resume overlay riding underneath it.
//!
//! Ported from the reference NewReno implementation: slow start doubles
//! the window until `ssthresh` (initially unset, the `None` here standing
//! in for the source's `UINT64_MAX` sentinel), then congestion avoidance
//! grows it by roughly one MTU per round trip. Hystart watches for an
//! RTT increase during slow start and exits early, before any real loss
//! is needed to discover the bottleneck.

use std::time::Duration;

use log::trace;

use crate::config::Config;
use crate::recovery::congestion::resume::Resume;
use crate::recovery::congestion::{CongestionController, NEWRENO_ID, NEWRENO_NUMERIC_ID};
use crate::recovery::rtt::RttFilter;
use crate::recovery::{Notification, PathView};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum AlgState {
    SlowStart,
    CongestionAvoidance,
}

#[derive(Debug)]
pub struct NewReno {
    alg_state: AlgState,
    ssthresh: Option<u64>,
    cwin: u64,
    residual_ack: u64,
    recovery_start: u64,
    recovery_sequence: u64,
    resume: Resume,
    rtt_filter: RttFilter,
    cfg: Config,
}

impl NewReno {
    pub fn new(cfg: Config, now: u64) -> Self {
        NewReno {
            alg_state: AlgState::SlowStart,
            ssthresh: None,
            cwin: cfg.initial_window,
            residual_ack: 0,
            recovery_start: now,
            recovery_sequence: 0,
            resume: Resume::new(now),
            rtt_filter: RttFilter::new(&cfg),
            cfg,
        }
    }

    fn in_slow_start(&self) -> bool {
        self.alg_state == AlgState::SlowStart && self.ssthresh.is_none()
    }

    /// CR governs the window while it's active; once it steps aside
    /// NewReno's own state takes over. This mirrors the source copying
    /// `cr_state.cwin`/`cr_state.ssthresh` back after every `picoquic_cr_notify`
    /// call, but expressed as "ask, don't track a duplicate".
    fn sync_from_resume(&mut self) {
        if let Some(cwin) = self.resume.cwin() {
            self.cwin = cwin;
        }
        if let Some(ssthresh) = self.resume.ssthresh() {
            self.ssthresh = Some(ssthresh);
        }
    }

    fn enter_recovery(&mut self, path: &PathView, is_timeout: bool, now: u64) {
        trace!("newreno enter_recovery cwin={} timeout={}", self.cwin, is_timeout);
        let mut ssthresh = self.cwin / 2;
        if ssthresh < self.cfg.cwin_minimum {
            ssthresh = self.cfg.cwin_minimum;
        }
        self.ssthresh = Some(ssthresh);

        if is_timeout {
            self.cwin = self.cfg.cwin_minimum;
            self.alg_state = AlgState::SlowStart;
        } else {
            self.cwin = ssthresh;
            self.alg_state = AlgState::CongestionAvoidance;
        }

        self.recovery_start = now;
        self.recovery_sequence = path.path_packet_number;
        self.residual_ack = 0;
    }

    fn on_congestion(&mut self, path: &mut PathView, notification: &Notification, now: u64) {
        let is_timeout = matches!(notification, Notification::Timeout);
        let lost_packet_number = match notification {
            Notification::Repeat { lost_packet_number } => *lost_packet_number,
            _ => path.path_packet_number,
        };

        if self.resume.cwin().is_none() && self.recovery_sequence <= lost_packet_number {
            self.enter_recovery(path, is_timeout, now);
        }

        self.resume.notify(&self.cfg, path, notification, now);
        self.sync_from_resume();
    }
}

impl CongestionController for NewReno {
    fn id(&self) -> &'static str {
        NEWRENO_ID
    }

    fn numeric_id(&self) -> u8 {
        NEWRENO_NUMERIC_ID
    }

    fn notify(&mut self, path: &mut PathView, notification: &Notification, now: u64) {
        match notification {
            Notification::Ack { bytes_acked, .. } => {
                match self.alg_state {
                    AlgState::SlowStart => {
                        // CR only suspends the controller's own growth while a
                        // jump or retreat is in flight (Unval/Retreat); it
                        // still lets growth run through Validate.
                        if !self.resume.growth_exempt() {
                            self.cwin += bytes_acked;
                            if self.cwin >= self.ssthresh.unwrap_or(u64::MAX) {
                                self.alg_state = AlgState::CongestionAvoidance;
                            }
                        }
                    },
                    AlgState::CongestionAvoidance => {
                        let complete_delta =
                            bytes_acked * path.send_mtu + self.residual_ack;
                        self.residual_ack = complete_delta % self.cwin;
                        self.cwin += complete_delta / self.cwin;
                    },
                }

                self.resume.notify(&self.cfg, path, notification, now);
                self.sync_from_resume();
            },
            Notification::EcnCe | Notification::Repeat { .. } | Notification::Timeout => {
                self.on_congestion(path, notification, now);
            },
            Notification::SpuriousRepeat { .. } => {
                if self.resume.cwin().is_none() {
                    let within_epoch = now.saturating_sub(self.recovery_start)
                        < path.smoothed_rtt.as_micros() as u64;
                    if within_epoch && self.recovery_sequence > path.path_packet_acked_number {
                        if let Some(ssthresh) = self.ssthresh {
                            if self.cwin < 2 * ssthresh {
                                self.cwin = 2 * ssthresh;
                                self.alg_state = AlgState::CongestionAvoidance;
                            }
                        }
                    }
                }
                path.is_ssthresh_initialized = true;
            },
            Notification::RttMeasurement { rtt, one_way_delay } => {
                if self.in_slow_start() && self.resume.cwin().is_none() {
                    let sample = one_way_delay.unwrap_or(*rtt);
                    if self.rtt_filter.test(sample, Duration::from_micros(now)) {
                        self.ssthresh = Some(self.cwin);
                        self.alg_state = AlgState::CongestionAvoidance;
                        path.is_ssthresh_initialized = true;
                    }
                }
                self.resume.notify(&self.cfg, path, notification, now);
                self.sync_from_resume();
            },
            Notification::Reset => {
                self.alg_state = AlgState::SlowStart;
                self.ssthresh = None;
                self.cwin = self.cfg.initial_window;
                self.residual_ack = 0;
                self.recovery_start = now;
                self.recovery_sequence = 0;
                self.resume.reset(now);
                self.rtt_filter = RttFilter::new(&self.cfg);
            },
            Notification::SeedCwin { .. } | Notification::CwinBlocked => {
                self.resume.notify(&self.cfg, path, notification, now);
                self.sync_from_resume();
            },
        }

        path.cwin = self.cwin;
    }

    fn observe(&self) -> (u64, u64) {
        (self.alg_state as u8 as u64, self.ssthresh.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::PathView;

    fn ack(bytes: u64) -> Notification {
        Notification::Ack { bytes_acked: bytes, lost_packet_number: None, rtt_measurement: None, one_way_delay: None }
    }

    #[test]
    fn slow_start_doubles_window_on_every_ack() {
        crate::init_test_logging();
        let cfg = Config::new();
        let mut nr = NewReno::new(cfg.clone(), 0);
        let mut path = PathView::new(cfg.initial_window, cfg.send_mtu);
        let start = path.cwin;
        nr.notify(&mut path, &ack(start), 1_000);
        assert_eq!(path.cwin, start * 2);
    }

    #[test]
    fn loss_halves_window_and_sets_ssthresh() {
        crate::init_test_logging();
        let cfg = Config::new();
        let mut nr = NewReno::new(cfg.clone(), 0);
        let mut path = PathView::new(cfg.initial_window, cfg.send_mtu);
        path.path_packet_number = 10;
        let before = path.cwin;
        nr.notify(&mut path, &Notification::Repeat { lost_packet_number: 1 }, 1_000);
        assert_eq!(path.cwin, (before / 2).max(cfg.cwin_minimum));
        assert!(nr.ssthresh.is_some());
    }

    #[test]
    fn timeout_drops_to_cwin_minimum_and_restarts_slow_start() {
        crate::init_test_logging();
        let cfg = Config::new();
        let mut nr = NewReno::new(cfg.clone(), 0);
        let mut path = PathView::new(cfg.initial_window, cfg.send_mtu);
        nr.notify(&mut path, &Notification::Timeout, 1_000);
        assert_eq!(path.cwin, cfg.cwin_minimum);
        assert_eq!(nr.alg_state, AlgState::SlowStart);
    }

    #[test]
    fn reset_restores_initial_state() {
        crate::init_test_logging();
        let cfg = Config::new();
        let mut nr = NewReno::new(cfg.clone(), 0);
        let mut path = PathView::new(cfg.initial_window, cfg.send_mtu);
        nr.notify(&mut path, &Notification::Timeout, 1_000);
        nr.notify(&mut path, &Notification::Reset, 2_000);
        assert_eq!(path.cwin, cfg.initial_window);
        assert!(nr.ssthresh.is_none());
    }

    #[test]
    fn hystart_exits_slow_start_on_sustained_rtt_increase() {
        crate::init_test_logging();
        let cfg = Config::new().with_min_max_rtt_scope(4);
        let mut nr = NewReno::new(cfg.clone(), 0);
        let mut path = PathView::new(cfg.initial_window, cfg.send_mtu);
        let mut now: u64 = 0;
        for _ in 0..8 {
            now += 5_000;
            nr.notify(&mut path, &Notification::RttMeasurement { rtt: Duration::from_millis(50), one_way_delay: None }, now);
        }
        let mut exited = false;
        for _ in 0..40 {
            now += 5_000;
            nr.notify(&mut path, &Notification::RttMeasurement { rtt: Duration::from_millis(90), one_way_delay: None }, now);
            if nr.alg_state == AlgState::CongestionAvoidance {
                exited = true;
                break;
            }
        }
        assert!(exited);
    }
}
