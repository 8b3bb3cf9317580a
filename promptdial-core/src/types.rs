use serde::{Deserialize, Serialize};

pub const EQ_MIN: i32 = 0;
pub const EQ_MAX: i32 = 100;

/// The four user-adjustable knobs, each semantically in `[0, 100]`.
///
/// Fields are signed so corrupted persisted state (negative or oversized
/// values) still deserializes; consumers clamp instead of rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    pub creativity: i32,
    pub factuality: i32,
    pub sociability: i32,
    pub obedience: i32,
}

impl EqualizerSettings {
    pub fn new(creativity: i32, factuality: i32, sociability: i32, obedience: i32) -> Self {
        Self {
            creativity,
            factuality,
            sociability,
            obedience,
        }
    }

    /// All four knobs centered, matching the omnibox/default request.
    pub fn centered() -> Self {
        Self::new(50, 50, 50, 50)
    }

    pub fn clamped(self) -> Self {
        Self {
            creativity: self.creativity.clamp(EQ_MIN, EQ_MAX),
            factuality: self.factuality.clamp(EQ_MIN, EQ_MAX),
            sociability: self.sociability.clamp(EQ_MIN, EQ_MAX),
            obedience: self.obedience.clamp(EQ_MIN, EQ_MAX),
        }
    }
}
