/// Scheduler flags that govern diversion and planning depth.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiversionPolicy {
    /// The request's destination is revealed at submission.  When `false`
    /// only the pickup half of a trip is planned up front.
    pub destination_known: bool,
    /// Vehicles may be re-routed mid-drive.
    pub diversion_allowed: bool,
}

impl DiversionPolicy {
    /// Both flags must be set for a drive to be cut and re-routed.
    pub fn allows_diversion(&self) -> bool {
        self.destination_known && self.diversion_allowed
    }
}

impl Default for DiversionPolicy {
    fn default() -> Self {
        Self { destination_known: true, diversion_allowed: false }
    }
}
