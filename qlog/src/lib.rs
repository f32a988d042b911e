//! Minimal qlog event model covering the events this workspace emits.
//!
//! This is a deliberately small slice of the full qlog schema: only the
//! congestion-control / careful-resume event family that `careful-resume`
//! needs to report on. A host application embedding a full qlog pipeline
//! would merge this into its own `EventData` enum; here it stands alone.

pub mod events;
