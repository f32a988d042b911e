//! The three registered congestion controllers and the capability they
//! share.

pub mod cubic;
pub mod newreno;
pub mod resume;

use crate::config::Config;
use crate::recovery::{Notification, PathView};

/// The contract every congestion controller in this crate satisfies.
///
/// The source expresses this as a function table (`{id_string,
/// numeric_id, init, notify, delete, observe}`) attached to a path by raw
/// pointer. Rust has no use for the `delete` slot: a controller's `Drop`
/// impl (the default, since none of them hold external resources) is the
/// deletion hook, and ownership rather than a pointer check is what
/// prevents notifying a deleted path. `init` becomes a plain constructor.
/// `id`/`numeric_id`/`notify`/`observe` remain as trait methods — capability
/// polymorphism via a trait object, not inheritance.
pub trait CongestionController: std::fmt::Debug {
    /// Short textual algorithm id, e.g. `"cubic"`.
    fn id(&self) -> &'static str;

    /// Numeric algorithm id, stable across versions.
    fn numeric_id(&self) -> u8;

    /// Applies one notification, in order, to this controller's state and
    /// to `path`.
    fn notify(&mut self, path: &mut PathView, notification: &Notification, now: u64);

    /// Returns `(phase_code, param)` for diagnostics: `param` is `W_max`
    /// for CUBIC/dcubic and `ssthresh` for NewReno.
    fn observe(&self) -> (u64, u64);
}

pub const NEWRENO_ID: &str = "newreno";
pub const NEWRENO_NUMERIC_ID: u8 = b'N';
pub const CUBIC_ID: &str = "cubic";
pub const CUBIC_NUMERIC_ID: u8 = b'C';
pub const DCUBIC_ID: &str = "dcubic";
pub const DCUBIC_NUMERIC_ID: u8 = b'D';

/// Constructs the named controller (`"newreno"`, `"cubic"`, or `"dcubic"`),
/// mirroring the source's algorithm registry lookup by id string.
pub fn by_name(name: &str, cfg: Config, now: u64) -> Option<Box<dyn CongestionController>> {
    match name {
        NEWRENO_ID => Some(Box::new(newreno::NewReno::new(cfg, now))),
        CUBIC_ID => Some(Box::new(cubic::Cubic::new(cfg, now, cubic::CubicVariant::Cubic))),
        DCUBIC_ID => Some(Box::new(cubic::Cubic::new(cfg, now, cubic::CubicVariant::DelayCubic))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_recognises_all_three_ids() {
        crate::init_test_logging();
        assert_eq!(by_name(NEWRENO_ID, Config::new(), 0).unwrap().id(), NEWRENO_ID);
        assert_eq!(by_name(CUBIC_ID, Config::new(), 0).unwrap().id(), CUBIC_ID);
        assert_eq!(by_name(DCUBIC_ID, Config::new(), 0).unwrap().id(), DCUBIC_ID);
        assert!(by_name("bbr", Config::new(), 0).is_none());
    }
}
