//! Congestion control: the Careful Resume overlay and the two loss-based
//! controllers (NewReno, CUBIC/dcubic) it rides on top of.

pub mod congestion;
pub mod loss;
pub mod rtt;

use std::time::Duration;

/// Read-mostly view of the path a controller is steering.
///
/// The host owns this; controllers borrow it mutably for the duration of
/// a single [`congestion::CongestionController::notify`] call and write
/// `cwin`/`ssthresh` back into it. Nothing else in this crate holds a
/// reference across calls.
#[derive(Clone, Debug)]
pub struct PathView {
    /// Current congestion window, in bytes.
    pub cwin: u64,
    /// Bytes currently in flight (unacknowledged).
    pub bytes_in_transit: u64,
    /// Cumulative bytes delivered (acknowledged) counter.
    pub delivered: u64,
    /// Path minimum RTT observed so far.
    pub rtt_min: Duration,
    /// Smoothed RTT estimate.
    pub smoothed_rtt: Duration,
    /// Path MTU.
    pub send_mtu: u64,
    /// Next packet sequence number to be used on this path.
    pub path_packet_number: u64,
    /// Largest packet number covered by the most recent ack.
    pub path_packet_acked_number: u64,
    /// Whether `ssthresh` has ever been set to a measured (non-default)
    /// value on this path.
    pub is_ssthresh_initialized: bool,
    /// Send time of the data frame covered by the most recent ack, in the
    /// same microsecond clock as `notify`'s `now`.
    pub last_time_acked_data_frame_sent: u64,
    /// Last time the path was application-limited (nothing to send), in
    /// the same clock. Used to mask idle intervals out of CUBIC's epoch
    /// so an application-limited period isn't mistaken for growth time.
    pub last_sender_limited_time: u64,
}

impl PathView {
    pub fn new(initial_window: u64, send_mtu: u64) -> Self {
        PathView {
            cwin: initial_window,
            bytes_in_transit: 0,
            delivered: 0,
            rtt_min: Duration::ZERO,
            smoothed_rtt: Duration::ZERO,
            send_mtu,
            path_packet_number: 0,
            path_packet_acked_number: 0,
            is_ssthresh_initialized: false,
            last_time_acked_data_frame_sent: 0,
            last_sender_limited_time: 0,
        }
    }
}

/// A previously observed `(cwnd, min_rtt)` pair for the same destination,
/// used to seed Careful Resume on a fresh connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seed {
    pub cwnd: u64,
    pub rtt: Duration,
}

/// Events delivered to a controller, in the order the host observed them.
///
/// `current_time` (a monotonic microsecond clock) accompanies every call
/// to [`congestion::CongestionController::notify`] rather than living on
/// the notification itself, matching the source's single clock parameter.
#[derive(Clone, Debug)]
pub enum Notification {
    /// An acknowledgement was processed.
    Ack {
        /// Bytes newly credited by this ack.
        bytes_acked: u64,
        /// Packet number of the most recent loss, if the loss filters
        /// need it carried alongside an otherwise unrelated ack.
        lost_packet_number: Option<u64>,
        /// RTT sample carried by this ack, if any.
        rtt_measurement: Option<Duration>,
        /// One-way delay sample, if timestamps are enabled.
        one_way_delay: Option<Duration>,
    },
    /// A loss was detected via retransmission timer / reordering threshold.
    Repeat { lost_packet_number: u64 },
    /// An ECN congestion-experienced mark was observed.
    EcnCe,
    /// A probe timeout (PTO) or retransmission timeout (RTO) fired.
    Timeout,
    /// A previously declared loss turned out to be spurious.
    SpuriousRepeat { lost_packet_number: u64 },
    /// A fresh RTT sample, independent of any particular ack.
    RttMeasurement { rtt: Duration, one_way_delay: Option<Duration> },
    /// The flight size has reached the congestion window.
    CwinBlocked,
    /// The controller should reset to its freshly-initialized state.
    Reset,
    /// Install a seed congestion window observed on a prior connection to
    /// this destination.
    SeedCwin { seed_cwnd: u64 },
}
