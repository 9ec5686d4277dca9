//! Units of work and delivery priority.

use crate::payload::Payload;

/// One notification addressed to one device token.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Hex-encoded device token. Also the key of the notification's batch result.
    pub token: String,
    pub payload: Payload,
}

impl Notification {
    pub fn new(token: impl Into<String>, payload: Payload) -> Self {
        Self {
            token: token.into(),
            payload,
        }
    }
}

/// Delivery priority, sent as the `apns-priority` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Deliver now. The service default; the header is omitted.
    #[default]
    Immediate,
    /// Deliver at a time that conserves power on the device.
    Delayed,
}

impl Priority {
    /// Wire value of the `apns-priority` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "10",
            Self::Delayed => "5",
        }
    }
}
