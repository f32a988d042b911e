use std::time::Duration;

use crate::error::ConfigError;

/// The numeric contract shared by every controller in this crate.
///
/// `Config::default()` matches the source implementation's compiled-in
/// constants. Hosts that need to tune the controllers for an unusual path
/// (satellite links, data-center fabrics, ...) build one with the
/// `with_*` setters and pass it to a controller's constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Default initial congestion window, in bytes. Typically 10 * MTU.
    pub initial_window: u64,
    /// Floor the congestion window never drops below. Typically 2 * MTU.
    pub cwin_minimum: u64,
    /// Depth of the RTT min/max sample window used by hystart.
    pub min_max_rtt_scope: usize,
    /// Drop-rate above which the loss filters signal "back off".
    pub smoothed_loss_threshold: f64,
    /// EWMA weight applied to the per-packet loss filter.
    pub smoothed_loss_factor: f64,
    /// Packet-number span the per-packet loss filter will walk in one
    /// update before giving up and jumping ahead (keeps `notify` O(1)
    /// rather than O(gap) on a single huge gap).
    pub smoothed_loss_scope: u64,
    /// Below this RTT, cubic/dcubic double the window on each RTT signal.
    pub target_reno_rtt: Duration,
    /// Above this RTT, growth is capped as if the path were this long.
    pub target_satellite_rtt: Duration,
    /// Default path MTU used when a controller isn't told otherwise.
    pub send_mtu: u64,
}

impl Default for Config {
    fn default() -> Self {
        let send_mtu = 1_200;
        Config {
            initial_window: 10 * send_mtu,
            cwin_minimum: 2 * send_mtu,
            min_max_rtt_scope: 8,
            smoothed_loss_threshold: 0.10,
            smoothed_loss_factor: 1.0 / 16.0,
            smoothed_loss_scope: 32,
            target_reno_rtt: Duration::from_millis(100),
            target_satellite_rtt: Duration::from_millis(600),
            send_mtu,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_window(mut self, bytes: u64) -> Self {
        self.initial_window = bytes;
        self
    }

    pub fn with_cwin_minimum(mut self, bytes: u64) -> Self {
        self.cwin_minimum = bytes;
        self
    }

    pub fn with_send_mtu(mut self, mtu: u64) -> Self {
        self.send_mtu = mtu;
        self
    }

    pub fn with_min_max_rtt_scope(mut self, scope: usize) -> Self {
        self.min_max_rtt_scope = scope;
        self
    }

    pub fn with_smoothed_loss_threshold(mut self, threshold: f64) -> Self {
        self.smoothed_loss_threshold = threshold;
        self
    }

    pub fn with_smoothed_loss_factor(mut self, factor: f64) -> Self {
        self.smoothed_loss_factor = factor;
        self
    }

    pub fn with_target_reno_rtt(mut self, rtt: Duration) -> Self {
        self.target_reno_rtt = rtt;
        self
    }

    pub fn with_target_satellite_rtt(mut self, rtt: Duration) -> Self {
        self.target_satellite_rtt = rtt;
        self
    }

    /// Checks the constants for internal consistency.
    ///
    /// Controllers do not call this implicitly: a host assembling a
    /// `Config` from untrusted or user-supplied values should call it once
    /// up front, the way the teacher validates its own `Config` before
    /// building a connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cwin_minimum > self.initial_window {
            return Err(ConfigError::CwinMinimumExceedsInitialWindow {
                cwin_minimum: self.cwin_minimum,
                initial_window: self.initial_window,
            });
        }

        if !(self.smoothed_loss_threshold > 0.0 && self.smoothed_loss_threshold <= 1.0) {
            return Err(ConfigError::InvalidLossThreshold(self.smoothed_loss_threshold));
        }

        if !(self.smoothed_loss_factor > 0.0 && self.smoothed_loss_factor <= 1.0) {
            return Err(ConfigError::InvalidLossFactor(self.smoothed_loss_factor));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        crate::init_test_logging();
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn cwin_minimum_above_initial_window_is_rejected() {
        crate::init_test_logging();
        let cfg = Config::new().with_initial_window(1_000).with_cwin_minimum(2_000);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::CwinMinimumExceedsInitialWindow {
                cwin_minimum: 2_000,
                initial_window: 1_000,
            })
        );
    }

    #[test]
    fn loss_threshold_out_of_range_is_rejected() {
        crate::init_test_logging();
        let cfg = Config::new().with_smoothed_loss_threshold(0.0);
        assert!(cfg.validate().is_err());
        let cfg = Config::new().with_smoothed_loss_threshold(1.5);
        assert!(cfg.validate().is_err());
    }
}
