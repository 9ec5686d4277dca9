//! Result taxonomy: reason codes returned by the push service and the
//! classification of raw responses into outcomes.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::UnitError;

/// Reason codes the push service returns on non-200 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    PayloadEmpty,
    PayloadTooLarge,
    BadTopic,
    TopicDisallowed,
    BadMessageId,
    BadExpirationDate,
    BadPriority,
    MissingDeviceToken,
    BadDeviceToken,
    DeviceTokenNotForTopic,
    Unregistered,
    DuplicateHeaders,
    BadCertificateEnvironment,
    BadCertificate,
    Forbidden,
    BadPath,
    MethodNotAllowed,
    TooManyRequests,
    IdleTimeout,
    Shutdown,
    InternalServerError,
    ServiceUnavailable,
    MissingTopic,
}

/// Coarse grouping of reasons, for recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The notification's payload or headers were rejected.
    Payload,
    /// The device token is missing, malformed, or no longer valid.
    DeviceToken,
    /// Certificate or environment problem. Every later send on the same
    /// connection will usually fail the same way.
    Certificate,
    /// The request was malformed by this client.
    Protocol,
    /// Rate limiting or service availability. Retryable by the caller.
    Availability,
}

impl Reason {
    /// The reason code as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayloadEmpty => "PayloadEmpty",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::BadTopic => "BadTopic",
            Self::TopicDisallowed => "TopicDisallowed",
            Self::BadMessageId => "BadMessageId",
            Self::BadExpirationDate => "BadExpirationDate",
            Self::BadPriority => "BadPriority",
            Self::MissingDeviceToken => "MissingDeviceToken",
            Self::BadDeviceToken => "BadDeviceToken",
            Self::DeviceTokenNotForTopic => "DeviceTokenNotForTopic",
            Self::Unregistered => "Unregistered",
            Self::DuplicateHeaders => "DuplicateHeaders",
            Self::BadCertificateEnvironment => "BadCertificateEnvironment",
            Self::BadCertificate => "BadCertificate",
            Self::Forbidden => "Forbidden",
            Self::BadPath => "BadPath",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::TooManyRequests => "TooManyRequests",
            Self::IdleTimeout => "IdleTimeout",
            Self::Shutdown => "Shutdown",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::MissingTopic => "MissingTopic",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PayloadEmpty
            | Self::PayloadTooLarge
            | Self::BadTopic
            | Self::TopicDisallowed
            | Self::MissingTopic
            | Self::BadExpirationDate
            | Self::BadPriority => ErrorKind::Payload,
            Self::MissingDeviceToken
            | Self::BadDeviceToken
            | Self::DeviceTokenNotForTopic
            | Self::Unregistered => ErrorKind::DeviceToken,
            Self::BadCertificateEnvironment | Self::BadCertificate | Self::Forbidden => {
                ErrorKind::Certificate
            }
            Self::DuplicateHeaders | Self::BadMessageId | Self::BadPath | Self::MethodNotAllowed => {
                ErrorKind::Protocol
            }
            Self::TooManyRequests
            | Self::IdleTimeout
            | Self::Shutdown
            | Self::InternalServerError
            | Self::ServiceUnavailable => ErrorKind::Availability,
        }
    }

    /// Whether resending the same notification later may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Availability
    }
}

impl FromStr for Reason {
    type Err = UnitError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let reason = match code {
            "PayloadEmpty" => Self::PayloadEmpty,
            "PayloadTooLarge" => Self::PayloadTooLarge,
            "BadTopic" => Self::BadTopic,
            "TopicDisallowed" => Self::TopicDisallowed,
            "BadMessageId" => Self::BadMessageId,
            "BadExpirationDate" => Self::BadExpirationDate,
            "BadPriority" => Self::BadPriority,
            "MissingDeviceToken" => Self::MissingDeviceToken,
            "BadDeviceToken" => Self::BadDeviceToken,
            "DeviceTokenNotForTopic" => Self::DeviceTokenNotForTopic,
            "Unregistered" => Self::Unregistered,
            "DuplicateHeaders" => Self::DuplicateHeaders,
            "BadCertificateEnvironment" => Self::BadCertificateEnvironment,
            "BadCertificate" => Self::BadCertificate,
            "Forbidden" => Self::Forbidden,
            "BadPath" => Self::BadPath,
            "MethodNotAllowed" => Self::MethodNotAllowed,
            "TooManyRequests" => Self::TooManyRequests,
            "IdleTimeout" => Self::IdleTimeout,
            "Shutdown" => Self::Shutdown,
            "InternalServerError" => Self::InternalServerError,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            "MissingTopic" => Self::MissingTopic,
            other => return Err(UnitError::UnknownReason(other.to_string())),
        };
        Ok(reason)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Self::PayloadEmpty => "the message payload was empty",
            Self::PayloadTooLarge => "the message payload was larger than 4096 bytes",
            Self::BadTopic => "the apns-topic was invalid",
            Self::TopicDisallowed => "pushing to this topic is not allowed",
            Self::BadMessageId => "the apns-id value is bad",
            Self::BadExpirationDate => "the apns-expiration value is bad",
            Self::BadPriority => "the apns-priority value is bad",
            Self::MissingDeviceToken => "the device token is not specified in the request :path",
            Self::BadDeviceToken => "the specified device token was bad",
            Self::DeviceTokenNotForTopic => "the device token does not match the specified topic",
            Self::Unregistered => "the device token is inactive for the specified topic",
            Self::DuplicateHeaders => "one or more headers were repeated",
            Self::BadCertificateEnvironment => {
                "the client certificate was for the wrong environment"
            }
            Self::BadCertificate => "the certificate was bad",
            Self::Forbidden => "the specified action is not allowed",
            Self::BadPath => "the request contained a bad :path value",
            Self::MethodNotAllowed => "the specified :method was not POST",
            Self::TooManyRequests => {
                "too many requests were made consecutively to the same device token"
            }
            Self::IdleTimeout => "idle time out",
            Self::Shutdown => "the server is shutting down",
            Self::InternalServerError => "an internal server error occurred",
            Self::ServiceUnavailable => "the service is unavailable",
            Self::MissingTopic => "the apns-topic header was required but not specified",
        };
        write!(f, "{} ({description})", self.as_str())
    }
}

/// Final state of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(Reason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Turn a failure into an `Err` for callers that want `?` semantics.
    pub fn into_result(self) -> Result<(), Reason> {
        match self {
            Self::Success => Ok(()),
            Self::Failure(reason) => Err(reason),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    reason: String,
}

/// Classify a raw response.
///
/// Status 200 is a success whatever the body holds. Any other status must
/// carry a JSON body with a `reason` found in the taxonomy; anything else is
/// a [`UnitError`], never a guessed [`Reason`].
pub fn classify(status: u16, body: &[u8]) -> Result<Outcome, UnitError> {
    if status == 200 {
        return Ok(Outcome::Success);
    }

    let parsed: ErrorBody =
        serde_json::from_slice(body).map_err(|e| UnitError::MalformedResponse {
            status,
            detail: e.to_string(),
        })?;
    let reason = parsed.reason.parse::<Reason>()?;
    Ok(Outcome::Failure(reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Reason; 23] = [
        Reason::PayloadEmpty,
        Reason::PayloadTooLarge,
        Reason::BadTopic,
        Reason::TopicDisallowed,
        Reason::BadMessageId,
        Reason::BadExpirationDate,
        Reason::BadPriority,
        Reason::MissingDeviceToken,
        Reason::BadDeviceToken,
        Reason::DeviceTokenNotForTopic,
        Reason::Unregistered,
        Reason::DuplicateHeaders,
        Reason::BadCertificateEnvironment,
        Reason::BadCertificate,
        Reason::Forbidden,
        Reason::BadPath,
        Reason::MethodNotAllowed,
        Reason::TooManyRequests,
        Reason::IdleTimeout,
        Reason::Shutdown,
        Reason::InternalServerError,
        Reason::ServiceUnavailable,
        Reason::MissingTopic,
    ];

    #[test]
    fn every_code_parses_to_itself() {
        for reason in ALL {
            assert_eq!(reason.as_str().parse::<Reason>(), Ok(reason));
        }
    }

    #[test]
    fn success_ignores_body() {
        assert_eq!(classify(200, b""), Ok(Outcome::Success));
        assert_eq!(classify(200, b"not json"), Ok(Outcome::Success));
        assert_eq!(
            classify(200, br#"{"reason":"BadDeviceToken"}"#),
            Ok(Outcome::Success)
        );
    }

    #[test]
    fn failure_maps_reason() {
        let outcome = classify(410, br#"{"reason":"Unregistered","timestamp":1454402113}"#);
        assert_eq!(outcome, Ok(Outcome::Failure(Reason::Unregistered)));
    }

    #[test]
    fn unknown_reason_is_distinct() {
        let outcome = classify(400, br#"{"reason":"BrandNewReason"}"#);
        assert_eq!(
            outcome,
            Err(UnitError::UnknownReason("BrandNewReason".into()))
        );
    }

    #[test]
    fn missing_reason_is_malformed() {
        assert!(matches!(
            classify(500, b""),
            Err(UnitError::MalformedResponse { status: 500, .. })
        ));
        assert!(matches!(
            classify(400, br#"{"error":"x"}"#),
            Err(UnitError::MalformedResponse { status: 400, .. })
        ));
    }

    #[test]
    fn kinds() {
        assert_eq!(Reason::PayloadTooLarge.kind(), ErrorKind::Payload);
        assert_eq!(Reason::BadPriority.kind(), ErrorKind::Payload);
        assert_eq!(Reason::Unregistered.kind(), ErrorKind::DeviceToken);
        assert_eq!(Reason::BadCertificateEnvironment.kind(), ErrorKind::Certificate);
        assert_eq!(Reason::MethodNotAllowed.kind(), ErrorKind::Protocol);
        assert_eq!(Reason::ServiceUnavailable.kind(), ErrorKind::Availability);
        assert!(Reason::TooManyRequests.is_retryable());
        assert!(!Reason::BadDeviceToken.is_retryable());
    }

    #[test]
    fn display_includes_code() {
        assert_eq!(
            Reason::BadTopic.to_string(),
            "BadTopic (the apns-topic was invalid)"
        );
    }

    #[test]
    fn outcome_into_result() {
        assert_eq!(Outcome::Success.into_result(), Ok(()));
        assert_eq!(
            Outcome::Failure(Reason::Shutdown).into_result(),
            Err(Reason::Shutdown)
        );
        assert!(!Outcome::Failure(Reason::Shutdown).is_success());
    }
}
