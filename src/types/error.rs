use crate::types::attributes::AtClientErrorCode;

/// Wire-level failures raised while decoding or encoding EAP packets and
/// EAP-SIM/AKA type-data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EapError {
    #[error("Buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
    #[error("Invalid EAP code: {0}")]
    InvalidCode(u8),
    #[error("EAP length field {declared} does not fit a {actual} byte buffer")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("EAP code {0} requires type-data")]
    MissingTypeData(u8),
    #[error("EAP packet of {0} bytes exceeds the 16-bit length field")]
    MessageTooLong(usize),
    #[error("EAP code {0} must not carry type-data")]
    UnexpectedTypeData(u8),
    #[error("Invalid EAP-SIM/AKA subtype: {0}")]
    InvalidSubtype(u8),
    #[error("Invalid length {length} for attribute {tag}")]
    InvalidAttributeLength { tag: u8, length: usize },
    #[error("Attribute {0} exceeds type-data length")]
    AttributeOverrun(u8),
    #[error("Duplicate attribute {0}")]
    DuplicateAttribute(u8),
    #[error("Unsupported non-skippable attribute {0}")]
    UnsupportedAttribute(u8),
    #[error("Invalid value for attribute {tag}: {reason}")]
    InvalidAttributeValue { tag: u8, reason: &'static str },
}

impl EapError {
    /// Client-Error code sent to the server when a request fails to decode.
    /// Every wire failure is reported as "unable to process"; the remaining
    /// codes describe version and challenge checks, not malformed packets.
    pub fn client_error_code(&self) -> AtClientErrorCode {
        match self {
            EapError::BufferTooShort { .. }
            | EapError::InvalidCode(_)
            | EapError::LengthMismatch { .. }
            | EapError::MissingTypeData(_)
            | EapError::MessageTooLong(_)
            | EapError::UnexpectedTypeData(_)
            | EapError::InvalidSubtype(_)
            | EapError::InvalidAttributeLength { .. }
            | EapError::AttributeOverrun(_)
            | EapError::DuplicateAttribute(_)
            | EapError::UnsupportedAttribute(_)
            | EapError::InvalidAttributeValue { .. } => AtClientErrorCode::UnableToProcess,
        }
    }
}

/// Fatal outcomes. Any of these ends the authentication attempt; the state
/// machine never retries after returning one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EapSimAkaError {
    #[error("Subscriber identity for subId {0} not available")]
    IdentityUnavailable(i32),
    #[error("UICC authentication failed for challenge {0}")]
    UiccAuthenticationFailed(String),
    #[error("Malformed UICC authentication response: {0}")]
    InvalidUiccResponse(String),
    #[error("Received EAP-Success in the {0} state")]
    UnexpectedSuccess(&'static str),
    #[error("Received multiple EAP-SIM/AKA notifications")]
    MultipleNotifications,
    #[error("Expecting EAP-Failure, received EAP code {0}")]
    ExpectingEapFailure(u8),
    #[error("Expected EAP type {expected}, received {actual:?}")]
    UnexpectedMethodType { expected: u8, actual: Option<u8> },
    #[error("Session keys have already been derived")]
    KeysAlreadyDerived,
    #[error("Session keys have not been derived")]
    KeysNotDerived,
    #[error("Method state machine already reached its final state")]
    SessionFinished,
    #[error("Failed to build attribute: {0}")]
    InvalidAttribute(#[from] EapError),
}
