//! Congestion control for QUIC senders, including a Careful Resume
//! overlay that lets a connection carry forward the congestion window
//! (and minimum RTT) validated on a previous connection to the same
//! destination instead of re-discovering it from slow start.
//!
//! Two controllers are provided, [`recovery::congestion::newreno::NewReno`]
//! and [`recovery::congestion::cubic::Cubic`] (which also implements the
//! delay-based `dcubic` variant); both embed the same
//! [`recovery::congestion::resume::Resume`] overlay. [`recovery::congestion::by_name`]
//! constructs either by its registered algorithm id.
//!
//! ```
//! use careful_resume::{by_name, Config, CongestionController, Notification};
//!
//! let cfg = Config::new();
//! cfg.validate().unwrap();
//! let mut cc = by_name("cubic", cfg, 0).unwrap();
//! let mut path = careful_resume::PathView::new(12_000, 1_200);
//! cc.notify(&mut path, &Notification::CwinBlocked, 0);
//! ```

mod config;
mod error;
pub mod recovery;

pub use config::Config;
pub use error::ConfigError;
pub use recovery::congestion::{by_name, CongestionController};
pub use recovery::{Notification, PathView, Seed};

/// Routes `trace!`/`debug!` output from the crate's own tests through
/// `env_logger` so `RUST_LOG=careful_resume=trace cargo test -- --nocapture`
/// shows phase transitions as they happen.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
