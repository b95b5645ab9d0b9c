use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// `detail.event_name` of the notification that starts a composition.
pub const PARTICIPANT_PUBLISHED: &str = "Participant Published";

/// A stage update as delivered by the event bus, one per invocation.
/// Only `resources` and `detail.event_name` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "detail-type", skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub resources: Vec<String>,
    pub detail: StageEventDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEventDetail {
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl StageNotification {
    /// The resource the event is about, the first entry of `resources`.
    pub fn resource(&self) -> Option<&str> {
        self.resources.first().map(String::as_str)
    }

    pub fn event_name(&self) -> &str {
        &self.detail.event_name
    }

    pub fn is_participant_published(&self) -> bool {
        self.detail.event_name == PARTICIPANT_PUBLISHED
    }
}
