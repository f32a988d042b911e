use serde::Deserialize;
use serde::Serialize;

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CarefulResumePhaseUpdated {
    pub old: Option<CarefulResumePhase>,
    pub new: CarefulResumePhase,
    pub state_data: CarefulResumeStateParameters,
    pub restored_data: Option<CarefulResumeRestoredParameters>,
    pub trigger: Option<CarefulResumeTrigger>,
}

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum CarefulResumeTrigger {
    /// Loss triggers moving to safe retreat.
    PacketLoss,
    /// Trigger for moving to unvalidated.
    CwndLimited,
    /// Trigger for moving to validating or normal.
    CrMarkAcknowledged,
    /// Trigger for moving to normal, when CR is not allowed.
    RttNotValidated,
    /// Trigger for moving to safe retreat.
    EcnCe,
    /// Trigger for moving to normal one RTT after a congestion event.
    ExitRecovery,
}

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum CarefulResumePhase {
    Reconnaissance,
    Unvalidated,
    Validating,
    Normal,
    SafeRetreat,
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Debug)]
pub struct CarefulResumeStateParameters {
    pub pipesize: u64,
    pub cr_mark: u64,
    pub cwnd: Option<u64>,
    pub ssthresh: Option<u64>,
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Debug)]
pub struct CarefulResumeRestoredParameters {
    pub previous_cwnd: u64,
    pub previous_rtt: f32,
}
