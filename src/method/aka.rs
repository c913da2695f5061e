//! EAP-AKA peer state machine (RFC 4187): Created → Identity → Challenge →
//! Final. One instance serves exactly one authentication attempt.

use crate::clients::uicc::format_aka_challenge;
use crate::clients::{
    AuthType, RandChallengeResult, TelephonyProvider, UiccAuthenticator, UiccResponseError,
};
use crate::crypto::{aka_mk_input, SessionKeys};
use crate::logging::Redactor;
use crate::method::EapSimAkaMethod;
use crate::types::attributes::{
    AT_ANY_ID_REQ, AT_ENCR_DATA, AT_FULLAUTH_ID_REQ, AT_IV, AT_MAC, AT_PERMANENT_ID_REQ,
};
use crate::types::{
    AtClientErrorCode, EapAkaConfig, EapCode, EapMessage, EapMethod, EapResult,
    EapSimAkaAttribute, EapSimAkaError, EapSimAkaSubtype, EapSimAkaTypeData,
    EapSimAkaTypeDataCodec,
};

const ID_REQUEST_TAGS: [u8; 3] = [AT_PERMANENT_ID_REQ, AT_ANY_ID_REQ, AT_FULLAUTH_ID_REQ];
const FORBIDDEN_IDENTITY_TAGS: [u8; 3] = [AT_MAC, AT_IV, AT_ENCR_DATA];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AkaState {
    Created,
    /// `identity` is set once an AKA-Identity request has been answered.
    Identity { identity: Option<Vec<u8>> },
    /// `identity` feeds the master key derivation.
    Challenge { identity: Vec<u8> },
    Final,
}

impl AkaState {
    pub fn name(&self) -> &'static str {
        match self {
            AkaState::Created => "Created",
            AkaState::Identity { .. } => "Identity",
            AkaState::Challenge { .. } => "Challenge",
            AkaState::Final => "Final",
        }
    }
}

pub struct EapAkaMethodStateMachine {
    base: EapSimAkaMethod,
    telephony: Box<dyn TelephonyProvider>,
    config: EapAkaConfig,
    state: AkaState,
    had_successful_challenge: bool,
}

impl EapAkaMethodStateMachine {
    pub fn new(
        config: EapAkaConfig,
        uicc: Box<dyn UiccAuthenticator>,
        telephony: Box<dyn TelephonyProvider>,
    ) -> Self {
        let base = EapSimAkaMethod::new(
            EapMethod::Aka,
            config.app_type,
            Redactor::new(config.log_sensitive),
            uicc,
            Box::new(EapSimAkaTypeDataCodec),
        );
        Self {
            base,
            telephony,
            config,
            state: AkaState::Created,
            had_successful_challenge: false,
        }
    }

    pub fn state(&self) -> &AkaState {
        &self.state
    }

    pub fn config(&self) -> &EapAkaConfig {
        &self.config
    }

    pub fn had_successful_challenge(&self) -> bool {
        self.had_successful_challenge
    }

    pub fn is_expecting_eap_failure(&self) -> bool {
        self.base.is_expecting_eap_failure()
    }

    pub fn session_keys(&self) -> Option<&SessionKeys> {
        self.base.keys()
    }

    /// Identity currently bound to the session: the one sent in response to
    /// an AKA-Identity request if any, the configured EAP identity otherwise.
    pub fn identity(&self) -> &[u8] {
        match &self.state {
            AkaState::Identity {
                identity: Some(identity),
            }
            | AkaState::Challenge { identity } => identity,
            _ => &self.config.eap_identity,
        }
    }

    /// Handles one inbound message. A state may hand the same message to
    /// the state it transitions to, but never more than once per call.
    pub fn process(&mut self, message: &EapMessage) -> EapResult {
        let result = match self.state {
            AkaState::Created => self.process_created(message),
            AkaState::Identity { .. } => self.process_identity(message),
            AkaState::Challenge { .. } => self.process_challenge(message),
            AkaState::Final => {
                tracing::error!("Attempting to process an EapMessage in the Final state");
                return EapResult::Error(EapSimAkaError::SessionFinished);
            }
        };

        match &result {
            EapResult::Success { .. } | EapResult::Failure => self.transition(AkaState::Final),
            EapResult::Error(e) => {
                tracing::error!("EAP-AKA attempt failed in the {} state: {}", self.state.name(), e);
                self.transition(AkaState::Final);
            }
            EapResult::Response(_) => {}
        }
        result
    }

    fn transition(&mut self, next: AkaState) {
        tracing::info!(
            "EAP-AKA state transition: {} -> {}",
            self.state.name(),
            next.name()
        );
        self.state = next;
    }

    fn process_created(&mut self, message: &EapMessage) -> EapResult {
        if let Some(result) = self
            .base
            .handle_eap_success_failure_notification(self.state.name(), message)
        {
            return result;
        }

        let type_data = match self.base.decode_type_data(message) {
            Ok(type_data) => type_data,
            Err(client_error) => return client_error,
        };

        match type_data.subtype {
            EapSimAkaSubtype::AkaIdentity => {
                self.transition(AkaState::Identity { identity: None });
                self.handle_identity_request(message, &type_data)
            }
            EapSimAkaSubtype::AkaChallenge => {
                let identity = self.config.eap_identity.clone();
                self.transition(AkaState::Challenge { identity });
                self.handle_challenge(message, &type_data)
            }
            EapSimAkaSubtype::Notification => {
                self.base.handle_notification(true, message, &type_data)
            }
            other => self.unexpected_subtype(message.identifier, other),
        }
    }

    fn process_identity(&mut self, message: &EapMessage) -> EapResult {
        if let Some(result) = self
            .base
            .handle_eap_success_failure_notification(self.state.name(), message)
        {
            return result;
        }

        let type_data = match self.base.decode_type_data(message) {
            Ok(type_data) => type_data,
            Err(client_error) => return client_error,
        };

        match type_data.subtype {
            // servers may repeat the request, e.g. to ask for a stronger id
            EapSimAkaSubtype::AkaIdentity => self.handle_identity_request(message, &type_data),
            EapSimAkaSubtype::AkaChallenge => {
                let identity = self.identity().to_vec();
                self.transition(AkaState::Challenge { identity });
                self.handle_challenge(message, &type_data)
            }
            EapSimAkaSubtype::Notification => {
                self.base.handle_notification(true, message, &type_data)
            }
            other => self.unexpected_subtype(message.identifier, other),
        }
    }

    fn process_challenge(&mut self, message: &EapMessage) -> EapResult {
        if message.code == EapCode::Success && self.had_successful_challenge {
            return match self.base.keys() {
                Some(keys) => {
                    tracing::info!("EAP-AKA authentication succeeded");
                    EapResult::Success {
                        msk: keys.msk.to_vec(),
                        emsk: keys.emsk.to_vec(),
                    }
                }
                None => EapResult::Error(EapSimAkaError::KeysNotDerived),
            };
        }

        if let Some(result) = self
            .base
            .handle_eap_success_failure_notification(self.state.name(), message)
        {
            return result;
        }

        let type_data = match self.base.decode_type_data(message) {
            Ok(type_data) => type_data,
            Err(client_error) => return client_error,
        };

        match type_data.subtype {
            EapSimAkaSubtype::AkaChallenge => self.handle_challenge(message, &type_data),
            EapSimAkaSubtype::Notification => {
                self.base.handle_notification(false, message, &type_data)
            }
            other => self.unexpected_subtype(message.identifier, other),
        }
    }

    fn unexpected_subtype(&mut self, identifier: u8, subtype: EapSimAkaSubtype) -> EapResult {
        tracing::warn!(
            "Unexpected subtype {:?} in the {} state",
            subtype,
            self.state.name()
        );
        self.base
            .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess)
    }

    fn handle_identity_request(
        &mut self,
        message: &EapMessage,
        type_data: &EapSimAkaTypeData,
    ) -> EapResult {
        let identifier = message.identifier;

        let id_requests = ID_REQUEST_TAGS
            .iter()
            .filter(|tag| type_data.contains(**tag))
            .count();
        if id_requests != 1 {
            tracing::warn!(
                "AKA-Identity request must carry exactly one identity request, found {}",
                id_requests
            );
            return self
                .base
                .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        }
        if let Some(tag) = FORBIDDEN_IDENTITY_TAGS
            .iter()
            .find(|tag| type_data.contains(**tag))
        {
            tracing::warn!("AKA-Identity request carries forbidden attribute {}", tag);
            return self
                .base
                .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        }

        let Some(subscriber_id) = self.telephony.subscriber_id(self.config.sub_id) else {
            tracing::error!("No subscriber identity for sub_id={}", self.config.sub_id);
            return EapResult::Error(EapSimAkaError::IdentityUnavailable(self.config.sub_id));
        };
        let identity = match self.base.method().identity_prefix() {
            Some(prefix) => format!("{}{}", prefix, subscriber_id),
            None => subscriber_id,
        }
        .into_bytes();

        let attribute = match EapSimAkaAttribute::identity(&identity) {
            Ok(attribute) => attribute,
            Err(e) => return EapResult::Error(e.into()),
        };
        tracing::debug!("Responding with identity={}", self.base.redactor().bytes(&identity));

        if let AkaState::Identity { identity: slot } = &mut self.state {
            *slot = Some(identity);
        }
        self.base
            .build_response(identifier, EapSimAkaSubtype::AkaIdentity, vec![attribute])
    }

    fn handle_challenge(&mut self, message: &EapMessage, type_data: &EapSimAkaTypeData) -> EapResult {
        let identifier = message.identifier;

        let (Some(rand), Some(autn)) = (type_data.rand(), type_data.autn()) else {
            tracing::warn!("AKA-Challenge without AT_RAND or AT_AUTN");
            return self
                .base
                .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        };
        if !type_data.contains(AT_MAC) {
            tracing::warn!("AKA-Challenge without AT_MAC");
            return self
                .base
                .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        }

        let challenge = format_aka_challenge(rand, autn);
        let response = match self
            .base
            .process_uicc_authentication(AuthType::EapAka, &challenge)
        {
            Ok(response) => response,
            Err(e) => return EapResult::Error(e),
        };

        let (res, ik, ck) = match RandChallengeResult::parse(&response) {
            Ok(RandChallengeResult::Success { res, ik, ck }) => (res, ik, ck),
            Ok(RandChallengeResult::SynchronizationFailure { auts }) => {
                tracing::info!("UICC requested re-synchronization");
                return self.base.build_response(
                    identifier,
                    EapSimAkaSubtype::AkaSynchronizationFailure,
                    vec![EapSimAkaAttribute::Auts(auts)],
                );
            }
            Err(e @ (UiccResponseError::Empty | UiccResponseError::UnknownTag(_))) => {
                tracing::error!("Unusable UICC response: {}", e);
                return EapResult::Error(EapSimAkaError::InvalidUiccResponse(e.to_string()));
            }
            Err(e) => {
                tracing::warn!("Malformed UICC response: {}", e);
                return self
                    .base
                    .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
            }
        };
        tracing::debug!("UICC returned RES={}", self.base.redactor().bytes(&res));

        let identity = self.identity().to_vec();
        if let Err(e) = self.base.derive_keys(&aka_mk_input(&identity, &ik, &ck)) {
            return EapResult::Error(e);
        }

        // AKA full authentication MACs cover the EAP packet only
        match self.base.verify_mac(message, type_data, &[]) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("AKA-Challenge MAC verification failed");
                return self
                    .base
                    .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
            }
            Err(e) => return EapResult::Error(e),
        }

        let server_supports_aka_prime = type_data
            .bidding()
            .is_some_and(|bidding| bidding.does_server_support_aka_prime());
        if self.config.supports_eap_aka_prime && server_supports_aka_prime {
            tracing::warn!("Server supports EAP-AKA' but EAP-AKA was negotiated, rejecting");
            self.base.expect_eap_failure();
            return self.base.build_response(
                identifier,
                EapSimAkaSubtype::AkaAuthenticationReject,
                Vec::new(),
            );
        }

        let res = match EapSimAkaAttribute::res(&res) {
            Ok(attribute) => attribute,
            Err(e) => return EapResult::Error(e.into()),
        };
        self.had_successful_challenge = true;
        self.base
            .build_response_with_mac(identifier, EapSimAkaSubtype::AkaChallenge, &[], vec![res])
    }
}
