pub mod resume;

use serde::Deserialize;
use serde::Serialize;

use resume::CarefulResumePhaseUpdated;

/// The event payloads this crate knows how to serialize.
///
/// A full qlog implementation carries dozens of variants (packet sent,
/// packet received, metrics updated, ...); this one carries only the
/// careful-resume family, which is all the core controllers need.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "name")]
pub enum EventData {
    #[serde(rename = "resumption:careful_resume_phase_updated")]
    CarefulResumePhaseUpdated(CarefulResumePhaseUpdated),
}
