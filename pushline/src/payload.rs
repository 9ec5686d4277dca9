//! Notification payload.
//!
//! Serializes to the JSON document the push service expects: an `aps`
//! dictionary plus any custom top-level keys. Unset fields are omitted.

use serde::Serialize;
use serde_json::{Map, Value};

/// Maximum payload size accepted by the push service, in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// A notification body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Payload {
    aps: Aps,
    #[serde(flatten)]
    custom: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct Aps {
    #[serde(skip_serializing_if = "Option::is_none")]
    alert: Option<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(rename = "thread-id", skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
    #[serde(
        rename = "content-available",
        skip_serializing_if = "is_unset",
        serialize_with = "as_flag"
    )]
    content_available: bool,
    #[serde(
        rename = "mutable-content",
        skip_serializing_if = "is_unset",
        serialize_with = "as_flag"
    )]
    mutable_content: bool,
}

fn is_unset(flag: &bool) -> bool {
    !*flag
}

// The service expects the integer 1, not a JSON boolean.
fn as_flag<S: serde::Serializer>(_: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(1)
}

/// The `alert` entry: either a bare string or a structured dictionary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Alert {
    Text(String),
    Structured(AlertBody),
}

impl From<&str> for Alert {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Alert {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<AlertBody> for Alert {
    fn from(body: AlertBody) -> Self {
        Self::Structured(body)
    }
}

/// Structured alert with optional localization keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlertBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_loc_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub title_loc_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc_key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loc_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_loc_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_image: Option<String>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert(mut self, alert: impl Into<Alert>) -> Self {
        self.aps.alert = Some(alert.into());
        self
    }

    pub fn badge(mut self, badge: u32) -> Self {
        self.aps.badge = Some(badge);
        self
    }

    pub fn sound(mut self, sound: impl Into<String>) -> Self {
        self.aps.sound = Some(sound.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.aps.category = Some(category.into());
        self
    }

    pub fn thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.aps.thread_id = Some(thread_id.into());
        self
    }

    /// Mark as a background update (`content-available: 1`).
    pub fn content_available(mut self) -> Self {
        self.aps.content_available = true;
        self
    }

    /// Allow a notification service extension to modify the content
    /// (`mutable-content: 1`).
    pub fn mutable_content(mut self) -> Self {
        self.aps.mutable_content = true;
        self
    }

    /// Add a custom top-level key. The reserved `aps` key is ignored.
    pub fn custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "aps" {
            self.custom.insert(key, value.into());
        }
        self
    }

    /// Compact UTF-8 JSON, non-ASCII characters left unescaped.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
