use crate::types::eap::EapMessage;
use crate::types::error::EapSimAkaError;

/// Outcome of handing one inbound EAP message to a method state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EapResult {
    /// Message to send back to the authenticator. Client-Error,
    /// Synchronization-Failure and Authentication-Reject responses are
    /// also delivered this way.
    Response(EapMessage),
    /// Authentication completed; keys for the outer framework.
    Success { msk: Vec<u8>, emsk: Vec<u8> },
    /// The authenticator ended the exchange with EAP-Failure.
    Failure,
    /// Unrecoverable local or protocol error; the attempt is over.
    Error(EapSimAkaError),
}

impl EapResult {
    pub fn response(&self) -> Option<&EapMessage> {
        match self {
            EapResult::Response(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EapResult::Error(_))
    }
}

impl From<EapSimAkaError> for EapResult {
    fn from(error: EapSimAkaError) -> Self {
        EapResult::Error(error)
    }
}
