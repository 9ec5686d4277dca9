//! Wire request for a single notification.

use bytes::Bytes;

use crate::error::{Error, UnitError};
use crate::notification::{Notification, Priority};
use crate::payload::MAX_PAYLOAD_SIZE;

/// Header carrying the topic (usually the app's bundle ID).
pub const TOPIC_HEADER: &str = "apns-topic";
/// Header carrying a non-default priority.
pub const PRIORITY_HEADER: &str = "apns-priority";

/// A fully built push request, ready to be sent on a stream.
///
/// The method is always `POST`.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest {
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl PushRequest {
    pub const METHOD: &'static str = "POST";

    /// Build the request for `notification`.
    ///
    /// `apns-priority` is only included when it differs from the default;
    /// its absence means [`Priority::Immediate`].
    ///
    /// A token that cannot form a path or an oversized payload is reported
    /// as [`Error::Unit`]; a payload that fails to serialize as
    /// [`Error::Payload`].
    pub fn new(notification: &Notification, topic: &str, priority: Priority) -> Result<Self, Error> {
        check_token(&notification.token)?;

        let body = notification.payload.to_json()?;
        if body.len() > MAX_PAYLOAD_SIZE {
            return Err(UnitError::PayloadTooLarge {
                size: body.len(),
                max: MAX_PAYLOAD_SIZE,
            }
            .into());
        }

        let mut headers = vec![(TOPIC_HEADER, topic.to_string())];
        if priority != Priority::default() {
            headers.push((PRIORITY_HEADER, priority.as_str().to_string()));
        }

        Ok(Self {
            path: format!("/3/device/{}", notification.token),
            headers,
            body: Bytes::from(body),
        })
    }

    /// Get the first header value matching `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Tokens go into the path verbatim, so only unreserved URI characters
/// are accepted.
fn check_token(token: &str) -> Result<(), UnitError> {
    let valid = !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));
    if valid {
        Ok(())
    } else {
        Err(UnitError::InvalidToken(token.to_string()))
    }
}
