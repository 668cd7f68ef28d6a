use serde::{Deserialize, Serialize};

/// Classification of the event that triggered persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Default/untriggered classification, serialized as `"NONE"`.
    #[default]
    None,
    /// Automatic trigger from the acceleration sensor.
    Sensor,
    /// Manual trigger from the user.
    Manual,
}

/// One record per trigger event. Immutable after creation.
///
/// Serializes to the canonical ordered JSON form
/// `{date, triggerType, triggerForceX, triggerForceY, triggerForceZ}`.
/// The decimal string of `date` is the tag used to name every artifact
/// of the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Trigger timestamp in epoch milliseconds. Unique per trigger.
    pub date: i64,
    #[serde(rename = "triggerType")]
    pub trigger_type: TriggerType,
    #[serde(rename = "triggerForceX")]
    pub trigger_force_x: f32,
    #[serde(rename = "triggerForceY")]
    pub trigger_force_y: f32,
    #[serde(rename = "triggerForceZ")]
    pub trigger_force_z: f32,
}

impl Metadata {
    /// Create a record stamped with the current wall-clock time.
    pub fn new(trigger_type: TriggerType, force: [f32; 3]) -> Self {
        Self::with_date(chrono::Utc::now().timestamp_millis(), trigger_type, force)
    }

    pub fn with_date(date: i64, trigger_type: TriggerType, force: [f32; 3]) -> Self {
        Self {
            date,
            trigger_type,
            trigger_force_x: force[0],
            trigger_force_y: force[1],
            trigger_force_z: force[2],
        }
    }

    /// Artifact-naming key, derived from the trigger timestamp.
    pub fn tag(&self) -> String {
        self.date.to_string()
    }

    /// 3-axis force reading at trigger time.
    pub fn force(&self) -> [f32; 3] {
        [self.trigger_force_x, self.trigger_force_y, self.trigger_force_z]
    }
}
