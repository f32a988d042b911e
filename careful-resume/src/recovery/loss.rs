//! Loss-rate smoothing filters used to tolerate isolated losses before a
//! controller backs off.

use crate::config::Config;

/// EWMA over packet-number gaps: `smoothed_drop_rate` decays towards zero
/// for every packet number that passed without being reported lost, and
/// steps up towards one for every loss.
///
/// This is what lets CUBIC (and NewReno's hystart-style exit) ignore a
/// single isolated loss while still reacting promptly to a real loss
/// burst.
#[derive(Clone, Debug)]
pub struct LossCountFilter {
    smoothed_drop_rate: f64,
    last_lost_packet_number: u64,
    factor: f64,
    scope: u64,
}

impl LossCountFilter {
    pub fn new(cfg: &Config) -> Self {
        LossCountFilter {
            smoothed_drop_rate: 0.0,
            last_lost_packet_number: 0,
            factor: cfg.smoothed_loss_factor,
            scope: cfg.smoothed_loss_scope,
        }
    }

    pub fn smoothed_drop_rate(&self) -> f64 {
        self.smoothed_drop_rate
    }

    /// Folds one more reported loss into the filter and reports whether
    /// the smoothed drop rate now exceeds `threshold`. A `lost_packet_number`
    /// at or before the last one seen is ignored (duplicate/out-of-order
    /// loss reports are common and must not double-count).
    pub fn on_repeat(&mut self, lost_packet_number: u64, threshold: f64) -> bool {
        if lost_packet_number <= self.last_lost_packet_number && self.last_lost_packet_number != 0 {
            return false;
        }
        self.fold_in_loss(lost_packet_number);
        self.smoothed_drop_rate > threshold
    }

    /// A timeout always counts as exceeding the threshold, regardless of
    /// the smoothed rate.
    pub fn on_timeout(&mut self, lost_packet_number: u64) -> bool {
        self.fold_in_loss(lost_packet_number);
        true
    }

    fn fold_in_loss(&mut self, lost_packet_number: u64) {
        let mut next = self.last_lost_packet_number;
        if next != 0 || lost_packet_number != 0 {
            if next + self.scope < lost_packet_number {
                next = lost_packet_number - self.scope;
            }
            while next < lost_packet_number {
                self.smoothed_drop_rate *= 1.0 - self.factor;
                next += 1;
            }
        }

        self.smoothed_drop_rate += (1.0 - self.smoothed_drop_rate) * self.factor;
        self.last_lost_packet_number = lost_packet_number;
    }
}

/// 16-tap decaying average of bytes lost vs. bytes sent, used by CUBIC's
/// ack path to decide whether the loss volume (not just loss count)
/// warrants backing off.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossVolumeFilter {
    smoothed_bytes_lost_16: f64,
    smoothed_bytes_sent_16: f64,
}

impl LossVolumeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(&mut self, nb_bytes_newly_acked: u64, nb_bytes_newly_lost: u64) -> f64 {
        self.smoothed_bytes_lost_16 -= self.smoothed_bytes_lost_16 / 16.0;
        self.smoothed_bytes_lost_16 += nb_bytes_newly_lost as f64;
        self.smoothed_bytes_sent_16 -= self.smoothed_bytes_sent_16 / 16.0;
        self.smoothed_bytes_sent_16 += (nb_bytes_newly_acked + nb_bytes_newly_lost) as f64;

        if self.smoothed_bytes_sent_16 > 0.0 {
            self.smoothed_bytes_lost_16 / self.smoothed_bytes_sent_16
        } else {
            0.0
        }
    }

    pub fn on_ack(&mut self, nb_bytes_newly_acked: u64, nb_bytes_newly_lost: u64, threshold: f64) -> bool {
        self.fold(nb_bytes_newly_acked, nb_bytes_newly_lost) > threshold
    }

    pub fn on_timeout(&mut self, nb_bytes_newly_acked: u64, nb_bytes_newly_lost: u64) -> bool {
        self.fold(nb_bytes_newly_acked, nb_bytes_newly_lost);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_isolated_loss_does_not_cross_threshold() {
        let cfg = Config::new();
        let mut filter = LossCountFilter::new(&cfg);
        assert!(!filter.on_repeat(1, cfg.smoothed_loss_threshold));
    }

    #[test]
    fn repeated_losses_eventually_cross_threshold() {
        let cfg = Config::new();
        let mut filter = LossCountFilter::new(&cfg);
        let mut tripped = false;
        for pkt in 1..200u64 {
            if filter.on_repeat(pkt, cfg.smoothed_loss_threshold) {
                tripped = true;
                break;
            }
        }
        assert!(tripped);
    }

    #[test]
    fn timeout_always_trips() {
        let cfg = Config::new();
        let mut filter = LossCountFilter::new(&cfg);
        assert!(filter.on_timeout(1));
    }

    #[test]
    fn loss_volume_trips_once_rate_exceeds_threshold() {
        let mut filter = LossVolumeFilter::new();
        let mut tripped = false;
        for _ in 0..64 {
            if filter.on_ack(100, 900, 0.10) {
                tripped = true;
            }
        }
        assert!(tripped);
    }

    #[test]
    fn loss_volume_quiet_when_nothing_lost() {
        let mut filter = LossVolumeFilter::new();
        for _ in 0..64 {
            assert!(!filter.on_ack(1_000, 0, 0.10));
        }
    }
}
