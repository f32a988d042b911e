//! CUBIC and its delay-based sibling dcubic.
//!
//! `W_cubic(t) = C*(t-K)^3 + W_max` grows the window as a cubic function
//! of time since the last congestion event, with a Reno-compatible floor
//! (`W_reno`) so CUBIC never falls behind plain AIMD on short RTTs.
//! `dcubic` shares the same curve but treats RTT increase, not packet
//! loss, as its primary congestion signal — a QUIC-only variant intended
//! for lossy satellite-style links where isolated loss is common and
//! uninformative.

use std::time::Duration;

use log::trace;

use crate::config::Config;
use crate::recovery::congestion::resume::Resume;
use crate::recovery::congestion::{CongestionController, CUBIC_ID, CUBIC_NUMERIC_ID, DCUBIC_ID, DCUBIC_NUMERIC_ID};
use crate::recovery::loss::LossCountFilter;
use crate::recovery::rtt::RttFilter;
use crate::recovery::{Notification, PathView};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CubicVariant {
    Cubic,
    DelayCubic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum AlgState {
    SlowStart,
    Recovery,
    CongestionAvoidance,
}

#[derive(Debug)]
pub struct Cubic {
    variant: CubicVariant,
    alg_state: AlgState,
    ssthresh: Option<u64>,
    w_max: f64,
    w_last_max: f64,
    w_reno: f64,
    c: f64,
    beta: f64,
    k: f64,
    start_of_epoch: u64,
    previous_start_of_epoch: u64,
    recovery_sequence: u64,
    rtt_filter: RttFilter,
    loss_filter: LossCountFilter,
    resume: Resume,
    cfg: Config,
}

/// Newton's method cube root, matching the source's bit-shift seeded
/// iteration rather than `f64::cbrt` so the curve shape stays identical
/// in edge cases (this crate has no libm dependency to call into).
fn cube_root(x: f64) -> f64 {
    let mut v = 1.0;
    let mut y = 1.0;

    while v > x * 8.0 {
        v /= 8.0;
        y /= 2.0;
    }
    while v < x {
        v *= 8.0;
        y *= 2.0;
    }

    for _ in 0..3 {
        let y2 = y * y;
        let y3 = y2 * y;
        y += (x - y3) / (3.0 * y2);
    }

    y
}

impl Cubic {
    pub fn new(cfg: Config, now: u64, variant: CubicVariant) -> Self {
        let send_mtu = cfg.send_mtu as f64;
        let w_last_max = u64::MAX as f64 / send_mtu;
        Cubic {
            variant,
            alg_state: AlgState::SlowStart,
            ssthresh: None,
            w_max: w_last_max,
            w_last_max,
            w_reno: cfg.initial_window as f64,
            c: 0.4,
            beta: 7.0 / 8.0,
            k: 0.0,
            start_of_epoch: now,
            previous_start_of_epoch: 0,
            recovery_sequence: 0,
            rtt_filter: RttFilter::new(&cfg),
            loss_filter: LossCountFilter::new(&cfg),
            resume: Resume::new(now),
            cfg,
        }
    }

    fn w_cubic(&self, now: u64) -> f64 {
        let delta_t_sec = (now.saturating_sub(self.start_of_epoch) as f64 / 1_000_000.0) - self.k;
        self.c * delta_t_sec.powi(3) + self.w_max
    }

    fn enter_avoidance(&mut self, now: u64) {
        self.k = cube_root(self.w_max * (1.0 - self.beta) / self.c);
        self.alg_state = AlgState::CongestionAvoidance;
        self.previous_start_of_epoch = self.start_of_epoch;
        self.start_of_epoch = now;
    }

    fn enter_recovery(&mut self, path: &PathView, is_timeout: bool, now: u64) {
        trace!("cubic enter_recovery cwin={} timeout={}", path.cwin, is_timeout);
        self.recovery_sequence = path.path_packet_number;
        self.w_max = path.cwin as f64 / self.cfg.send_mtu as f64;

        // Fast convergence: if the window shrank since the last event, back
        // off a little further so the curve converges faster to a fair share.
        if self.w_max < self.w_last_max {
            self.w_last_max = self.w_max;
            self.w_max *= self.beta;
        } else {
            self.w_last_max = self.w_max;
        }

        let ssthresh = (self.w_max * self.beta * self.cfg.send_mtu as f64) as u64;

        if ssthresh < self.cfg.cwin_minimum {
            self.alg_state = AlgState::SlowStart;
            self.ssthresh = None;
            self.previous_start_of_epoch = self.start_of_epoch;
            self.start_of_epoch = now;
            self.w_reno = self.cfg.cwin_minimum as f64;
        } else {
            self.ssthresh = Some(ssthresh);
            if is_timeout {
                self.previous_start_of_epoch = self.start_of_epoch;
                self.start_of_epoch = now;
                self.alg_state = AlgState::SlowStart;
            } else {
                self.alg_state = AlgState::Recovery;
            }
        }
    }

    fn recovery_window(&mut self, path: &PathView, is_timeout: bool, now: u64) -> u64 {
        self.enter_recovery(path, is_timeout, now);
        match self.alg_state {
            AlgState::SlowStart => self.cfg.cwin_minimum,
            _ => {
                let w_cubic = self.w_cubic(now);
                let win_cubic = (w_cubic * self.cfg.send_mtu as f64) as u64;
                self.w_reno = path.cwin as f64 / 2.0;
                win_cubic.max(self.w_reno as u64)
            },
        }
    }

    fn correct_spurious(&mut self, path: &mut PathView, now: u64) {
        let Some(_) = self.ssthresh else { return };
        // CR owns the window in Unval/Validate/Retreat; leave it alone.
        if self.resume.cwin().is_some() {
            return;
        }

        self.w_max = self.w_last_max;
        self.enter_avoidance(self.previous_start_of_epoch);
        let w_cubic = self.w_cubic(now);
        self.w_reno = w_cubic * self.cfg.send_mtu as f64;
        self.ssthresh = Some((self.w_max * self.beta * self.cfg.send_mtu as f64) as u64);
        path.cwin = self.w_reno as u64;
    }

    /// Whether CR currently owns the window tightly enough to suspend
    /// slow-start growth: true only in Unval/Retreat, not Validate (ยง4.3's
    /// growth increment still applies there, distinct from the
    /// {Observe, Recon, Normal} set `correct_spurious` gates on).
    fn hystart_increase_exempt(&self) -> bool {
        self.resume.growth_exempt()
    }

    fn sync_from_resume(&mut self, path: &mut PathView) {
        if let Some(cwin) = self.resume.cwin() {
            path.cwin = cwin;
        }
        if let Some(ssthresh) = self.resume.ssthresh() {
            self.ssthresh = Some(ssthresh);
        }
    }

    fn loss_worth_reacting_to(&mut self, notification: &Notification) -> bool {
        match notification {
            Notification::EcnCe => true,
            Notification::Repeat { lost_packet_number } => {
                self.loss_filter.on_repeat(*lost_packet_number, self.cfg.smoothed_loss_threshold)
            },
            Notification::Timeout => {
                self.loss_filter.on_timeout(0)
            },
            _ => false,
        }
    }

    fn notify_cubic(&mut self, path: &mut PathView, notification: &Notification, now: u64) {
        match self.alg_state {
            AlgState::SlowStart => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    if !self.hystart_increase_exempt() {
                        path.cwin += bytes_acked;
                    }
                    if path.cwin >= self.ssthresh.unwrap_or(u64::MAX) {
                        self.w_max = path.cwin as f64 / self.cfg.send_mtu as f64;
                        self.w_last_max = self.w_max;
                        self.w_reno = path.cwin as f64 / 2.0;
                        path.is_ssthresh_initialized = true;
                        self.enter_avoidance(now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Repeat { .. } | Notification::EcnCe | Notification::Timeout => {
                    let recent = now.saturating_sub(self.start_of_epoch) > path.smoothed_rtt.as_micros() as u64
                        || self.recovery_sequence <= path.path_packet_acked_number;
                    if self.loss_worth_reacting_to(notification) && recent {
                        self.ssthresh = Some(path.cwin);
                        self.w_max = path.cwin as f64 / self.cfg.send_mtu as f64;
                        self.w_last_max = self.w_max;
                        self.w_reno = path.cwin as f64;
                        path.is_ssthresh_initialized = true;
                        let is_timeout = matches!(notification, Notification::Timeout);
                        path.cwin = self.recovery_window(path, is_timeout, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::SpuriousRepeat { .. } => self.correct_spurious(path, now),
                Notification::RttMeasurement { rtt, one_way_delay } => {
                    if self.ssthresh.is_none() {
                        let sample = one_way_delay.unwrap_or(*rtt);
                        if self.rtt_filter.test(sample, Duration::from_micros(now)) {
                            self.ssthresh = Some(path.cwin);
                            self.w_max = path.cwin as f64 / self.cfg.send_mtu as f64;
                            self.w_last_max = self.w_max;
                            self.w_reno = path.cwin as f64;
                            path.is_ssthresh_initialized = true;
                            self.enter_avoidance(now);
                            self.pull_epoch_into_present(now);
                        }
                    }
                },
                Notification::CwinBlocked | Notification::SeedCwin { .. } => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Reset => self.do_reset(now),
            },
            AlgState::Recovery => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    self.alg_state = AlgState::SlowStart;
                    path.cwin += bytes_acked;
                    if path.cwin >= self.ssthresh.unwrap_or(u64::MAX) {
                        self.alg_state = AlgState::CongestionAvoidance;
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::SpuriousRepeat { .. } => self.correct_spurious(path, now),
                Notification::Repeat { .. } | Notification::EcnCe | Notification::Timeout => {
                    let lost_packet_number = match notification {
                        Notification::Repeat { lost_packet_number } => *lost_packet_number,
                        _ => path.path_packet_number,
                    };
                    if lost_packet_number >= self.recovery_sequence && self.loss_worth_reacting_to(notification) {
                        let is_timeout = matches!(notification, Notification::Timeout);
                        path.cwin = self.recovery_window(path, is_timeout, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::CwinBlocked | Notification::SeedCwin { .. } => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::RttMeasurement { .. } => {},
                Notification::Reset => self.do_reset(now),
            },
            AlgState::CongestionAvoidance => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    // Protection against limited senders: only grow while the
                    // most recently acked data was actually sent after the
                    // last application-limited period, and fold idle time out
                    // of the epoch rather than letting it count as growth time.
                    if path.last_time_acked_data_frame_sent > path.last_sender_limited_time {
                        if self.start_of_epoch < path.last_sender_limited_time {
                            self.start_of_epoch = path.last_sender_limited_time;
                        }
                        let win_cubic = (self.w_cubic(now) * self.cfg.send_mtu as f64) as u64;
                        self.w_reno += *bytes_acked as f64 * self.cfg.send_mtu as f64 / self.w_reno;
                        path.cwin = win_cubic.max(self.w_reno as u64);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Repeat { .. } | Notification::EcnCe | Notification::Timeout => {
                    let lost_packet_number = match notification {
                        Notification::Repeat { lost_packet_number } => *lost_packet_number,
                        _ => path.path_packet_number,
                    };
                    if lost_packet_number >= self.recovery_sequence && self.loss_worth_reacting_to(notification) {
                        let is_timeout = matches!(notification, Notification::Timeout);
                        path.cwin = self.recovery_window(path, is_timeout, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::SpuriousRepeat { .. } => self.correct_spurious(path, now),
                Notification::CwinBlocked | Notification::SeedCwin { .. } => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::RttMeasurement { .. } => {},
                Notification::Reset => self.do_reset(now),
            },
        }
    }

    /// Applies the correction the source makes when entering avoidance off
    /// the back of an RTT-triggered (rather than loss-triggered) exit from
    /// slow start: `K` is recomputed so the curve's test phase starts now
    /// rather than one real epoch into the future.
    fn pull_epoch_into_present(&mut self, now: u64) {
        let k_micro = (self.k * 1_000_000.0) as u64;
        if k_micro > now {
            self.k = now as f64 / 1_000_000.0;
            self.start_of_epoch = 0;
        } else {
            self.start_of_epoch = now - k_micro;
        }
    }

    fn dcubic_exit_slow_start(&mut self, path: &mut PathView, is_timeout: bool, now: u64) {
        if self.ssthresh.is_none() {
            path.is_ssthresh_initialized = true;
            self.ssthresh = Some(path.cwin);
            self.w_max = path.cwin as f64 / self.cfg.send_mtu as f64;
            self.w_last_max = self.w_max;
            self.w_reno = path.cwin as f64;
            self.enter_avoidance(now);
            self.pull_epoch_into_present(now);
        } else {
            let recent = now.saturating_sub(self.start_of_epoch) > path.smoothed_rtt.as_micros() as u64
                || self.recovery_sequence <= path.path_packet_acked_number;
            if recent {
                path.cwin = self.recovery_window(path, is_timeout, now);
            }
        }
    }

    fn long_rtt_floor(&self, path: &PathView) -> u64 {
        if path.rtt_min <= self.cfg.target_reno_rtt {
            return 0;
        }
        let capped_rtt = path.rtt_min.min(self.cfg.target_satellite_rtt);
        (self.cfg.initial_window as f64 * capped_rtt.as_secs_f64()
            / self.cfg.target_reno_rtt.as_secs_f64()) as u64
    }

    fn notify_dcubic(&mut self, path: &mut PathView, notification: &Notification, now: u64) {
        match self.alg_state {
            AlgState::SlowStart => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    if !self.hystart_increase_exempt() {
                        path.cwin += bytes_acked;
                    }
                    if path.cwin >= self.ssthresh.unwrap_or(u64::MAX) {
                        self.w_reno = path.cwin as f64 / 2.0;
                        self.enter_avoidance(now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Repeat { lost_packet_number } => {
                    if self.loss_filter.on_repeat(*lost_packet_number, self.cfg.smoothed_loss_threshold) {
                        self.dcubic_exit_slow_start(path, false, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Timeout => {
                    if self.loss_filter.on_timeout(0) {
                        self.dcubic_exit_slow_start(path, true, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::RttMeasurement { rtt, one_way_delay } => {
                    let floor = self.long_rtt_floor(path);
                    if self.ssthresh.is_none() && floor > path.cwin {
                        path.cwin = floor;
                    }
                    let sample = one_way_delay.unwrap_or(*rtt);
                    if self.rtt_filter.test(sample, Duration::from_micros(now)) {
                        self.dcubic_exit_slow_start(path, false, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::SeedCwin { seed_cwnd } => {
                    if self.ssthresh.is_none() && path.cwin < *seed_cwnd {
                        path.cwin = *seed_cwnd;
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::CwinBlocked => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::EcnCe | Notification::SpuriousRepeat { .. } => {},
                Notification::Reset => self.do_reset(now),
            },
            AlgState::Recovery => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    self.alg_state = AlgState::SlowStart;
                    path.cwin += bytes_acked;
                    if path.cwin >= self.ssthresh.unwrap_or(u64::MAX) {
                        self.alg_state = AlgState::CongestionAvoidance;
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::RttMeasurement { rtt, one_way_delay } => {
                    let floor = self.long_rtt_floor(path);
                    if self.ssthresh.is_none() && floor > path.cwin {
                        path.cwin = floor;
                    }
                    let sample = one_way_delay.unwrap_or(*rtt);
                    let recent = now.saturating_sub(self.start_of_epoch) > path.smoothed_rtt.as_micros() as u64
                        || self.recovery_sequence <= path.path_packet_acked_number;
                    if self.rtt_filter.test(sample, Duration::from_micros(now)) && recent {
                        path.cwin = self.recovery_window(path, false, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::CwinBlocked | Notification::SeedCwin { .. } => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Reset => self.do_reset(now),
                _ => {},
            },
            AlgState::CongestionAvoidance => match notification {
                Notification::Ack { bytes_acked, .. } => {
                    if path.last_time_acked_data_frame_sent > path.last_sender_limited_time {
                        if self.start_of_epoch < path.last_sender_limited_time {
                            self.start_of_epoch = path.last_sender_limited_time;
                        }
                        let win_cubic = (self.w_cubic(now) * self.cfg.send_mtu as f64) as u64;
                        self.w_reno += *bytes_acked as f64 * self.cfg.send_mtu as f64 / self.w_reno;
                        path.cwin = win_cubic.max(self.w_reno as u64);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Repeat { lost_packet_number } => {
                    if self.loss_filter.on_repeat(*lost_packet_number, self.cfg.smoothed_loss_threshold)
                        && *lost_packet_number > self.recovery_sequence
                    {
                        path.cwin = self.recovery_window(path, false, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::Timeout => {
                    if self.loss_filter.on_timeout(0) {
                        path.cwin = self.recovery_window(path, true, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::CwinBlocked | Notification::SeedCwin { .. } => {
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::RttMeasurement { rtt, one_way_delay } => {
                    let sample = one_way_delay.unwrap_or(*rtt);
                    let recent = now.saturating_sub(self.start_of_epoch) > path.smoothed_rtt.as_micros() as u64
                        || self.recovery_sequence <= path.path_packet_acked_number;
                    if self.rtt_filter.test(sample, Duration::from_micros(now)) && recent {
                        path.cwin = self.recovery_window(path, false, now);
                    }
                    self.resume.notify(&self.cfg, path, notification, now);
                    self.sync_from_resume(path);
                },
                Notification::EcnCe | Notification::SpuriousRepeat { .. } => {},
                Notification::Reset => self.do_reset(now),
            },
        }
    }

    fn do_reset(&mut self, now: u64) {
        let variant = self.variant;
        let cfg = self.cfg.clone();
        *self = Cubic::new(cfg, now, variant);
    }
}

impl CongestionController for Cubic {
    fn id(&self) -> &'static str {
        match self.variant {
            CubicVariant::Cubic => CUBIC_ID,
            CubicVariant::DelayCubic => DCUBIC_ID,
        }
    }

    fn numeric_id(&self) -> u8 {
        match self.variant {
            CubicVariant::Cubic => CUBIC_NUMERIC_ID,
            CubicVariant::DelayCubic => DCUBIC_NUMERIC_ID,
        }
    }

    fn notify(&mut self, path: &mut PathView, notification: &Notification, now: u64) {
        match self.variant {
            CubicVariant::Cubic => self.notify_cubic(path, notification, now),
            CubicVariant::DelayCubic => self.notify_dcubic(path, notification, now),
        }
    }

    fn observe(&self) -> (u64, u64) {
        (self.alg_state as u8 as u64, self.w_max as u64)
    }
}
