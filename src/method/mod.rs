//! Behaviour shared by the EAP-SIM and EAP-AKA peer state machines: key
//! derivation, AT_MAC handling, UICC invocation, response builders and
//! EAP-SIM/AKA Notification rounds.

pub mod aka;

use crate::clients::uicc::{decode_response, encode_challenge};
use crate::clients::{AuthType, UiccAppType, UiccAuthenticator};
use crate::crypto::{hmac_sha1_128, verify_hmac_sha1_128, SessionKeys};
use crate::logging::Redactor;
use crate::types::attributes::{AtMac, MAC_LEN, AT_MAC};
use crate::types::{
    AtClientErrorCode, EapCode, EapData, EapMessage, EapMethod, EapResult, EapSimAkaAttribute,
    EapSimAkaError, EapSimAkaSubtype, EapSimAkaTypeData, TypeDataCodec,
};

pub struct EapSimAkaMethod {
    method: EapMethod,
    app_type: UiccAppType,
    uicc: Box<dyn UiccAuthenticator>,
    codec: Box<dyn TypeDataCodec>,
    redactor: Redactor,
    keys: Option<SessionKeys>,
    has_received_notification: bool,
    is_expecting_eap_failure: bool,
}

impl EapSimAkaMethod {
    pub fn new(
        method: EapMethod,
        app_type: UiccAppType,
        redactor: Redactor,
        uicc: Box<dyn UiccAuthenticator>,
        codec: Box<dyn TypeDataCodec>,
    ) -> Self {
        Self {
            method,
            app_type,
            uicc,
            codec,
            redactor,
            keys: None,
            has_received_notification: false,
            is_expecting_eap_failure: false,
        }
    }

    pub fn method(&self) -> EapMethod {
        self.method
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn keys(&self) -> Option<&SessionKeys> {
        self.keys.as_ref()
    }

    pub fn is_expecting_eap_failure(&self) -> bool {
        self.is_expecting_eap_failure
    }

    /// After a Client-Error or Authentication-Reject the only acceptable
    /// next message is EAP-Failure.
    pub fn expect_eap_failure(&mut self) {
        self.is_expecting_eap_failure = true;
    }

    /// Derives K_encr, K_aut, MSK and EMSK from `mk_input`. Keys are set at
    /// most once per session.
    pub fn derive_keys(&mut self, mk_input: &[u8]) -> Result<(), EapSimAkaError> {
        if self.keys.is_some() {
            tracing::error!("Refusing to derive {:?} session keys twice", self.method);
            return Err(EapSimAkaError::KeysAlreadyDerived);
        }

        tracing::debug!("MK input={}", self.redactor.bytes(mk_input));
        let keys = SessionKeys::derive(mk_input);
        tracing::debug!(
            "K_aut={} MSK={} EMSK={}",
            self.redactor.bytes(&keys.k_aut),
            self.redactor.bytes(&keys.msk),
            self.redactor.bytes(&keys.emsk)
        );
        self.keys = Some(keys);
        Ok(())
    }

    /// HMAC-SHA1-128 keyed with K_aut over the EAP packet built from
    /// `type_data` with its AT_MAC value zeroed, followed by `extra_data`.
    pub fn compute_mac(
        &self,
        code: EapCode,
        identifier: u8,
        type_data: &EapSimAkaTypeData,
        extra_data: &[u8],
    ) -> Result<[u8; MAC_LEN], EapSimAkaError> {
        let keys = self.keys.as_ref().ok_or(EapSimAkaError::KeysNotDerived)?;
        let packet = self.mac_input_packet(code, identifier, type_data)?;
        Ok(hmac_sha1_128(&keys.k_aut, &[packet.as_slice(), extra_data]))
    }

    /// Checks the AT_MAC carried by `type_data`, which was decoded from
    /// `message`. A missing AT_MAC never verifies.
    pub fn verify_mac(
        &self,
        message: &EapMessage,
        type_data: &EapSimAkaTypeData,
        extra_data: &[u8],
    ) -> Result<bool, EapSimAkaError> {
        let Some(received) = type_data.mac() else {
            return Ok(false);
        };
        let keys = self.keys.as_ref().ok_or(EapSimAkaError::KeysNotDerived)?;
        let packet = self.mac_input_packet(message.code, message.identifier, type_data)?;
        Ok(verify_hmac_sha1_128(
            &keys.k_aut,
            &[packet.as_slice(), extra_data],
            &received.mac,
        ))
    }

    fn mac_input_packet(
        &self,
        code: EapCode,
        identifier: u8,
        type_data: &EapSimAkaTypeData,
    ) -> Result<Vec<u8>, EapSimAkaError> {
        let zeroed = self.codec.encode(&type_data.with_zeroed_mac())?;
        let packet = EapMessage {
            code,
            identifier,
            data: Some(EapData::new(self.method.into(), zeroed)),
        };
        Ok(packet.to_bytes()?)
    }

    pub fn build_response(
        &self,
        identifier: u8,
        subtype: EapSimAkaSubtype,
        attributes: Vec<EapSimAkaAttribute>,
    ) -> EapResult {
        let message = EapSimAkaTypeData::new(subtype, attributes)
            .and_then(|type_data| self.codec.encode(&type_data))
            .and_then(|bytes| {
                EapMessage::new(
                    EapCode::Response,
                    identifier,
                    Some(EapData::new(self.method.into(), bytes)),
                )
            });
        match message {
            Ok(message) => EapResult::Response(message),
            Err(e) => {
                tracing::error!("Failed to encode {:?} response: {}", subtype, e);
                EapResult::Error(e.into())
            }
        }
    }

    /// The only way to produce an authenticated response: appends AT_MAC,
    /// computes it over the final packet and substitutes the value.
    pub fn build_response_with_mac(
        &self,
        identifier: u8,
        subtype: EapSimAkaSubtype,
        extra_data: &[u8],
        attributes: Vec<EapSimAkaAttribute>,
    ) -> EapResult {
        match self.authenticated_response(identifier, subtype, extra_data, attributes) {
            Ok(message) => EapResult::Response(message),
            Err(e) => {
                tracing::error!("Failed to build authenticated {:?} response: {}", subtype, e);
                EapResult::Error(e)
            }
        }
    }

    fn authenticated_response(
        &self,
        identifier: u8,
        subtype: EapSimAkaSubtype,
        extra_data: &[u8],
        mut attributes: Vec<EapSimAkaAttribute>,
    ) -> Result<EapMessage, EapSimAkaError> {
        attributes.push(EapSimAkaAttribute::Mac(AtMac::new([0u8; MAC_LEN])));
        let type_data = EapSimAkaTypeData::new(subtype, attributes)?;
        let mac = self.compute_mac(EapCode::Response, identifier, &type_data, extra_data)?;
        let bytes = self.codec.encode(&type_data.with_mac(mac))?;
        Ok(EapMessage::response(identifier, self.method.into(), bytes))
    }

    pub fn build_client_error_response(
        &mut self,
        identifier: u8,
        code: AtClientErrorCode,
    ) -> EapResult {
        tracing::warn!("Sending {:?} Client-Error {:?}", self.method, code);
        self.expect_eap_failure();
        self.build_response(
            identifier,
            EapSimAkaSubtype::ClientError,
            vec![EapSimAkaAttribute::client_error_code(code)],
        )
    }

    /// EAP-level handling every state applies before looking at type-data.
    /// `None` means the message is a Request/Response of this method that
    /// the state itself must handle.
    pub fn handle_eap_success_failure_notification(
        &mut self,
        state: &'static str,
        message: &EapMessage,
    ) -> Option<EapResult> {
        match message.code {
            EapCode::Success => {
                // EAP-Success must be the last message of the exchange
                tracing::error!("Received premature EAP-Success in the {} state", state);
                return Some(EapResult::Error(EapSimAkaError::UnexpectedSuccess(state)));
            }
            EapCode::Failure => {
                tracing::info!("Received EAP-Failure in the {} state", state);
                return Some(EapResult::Failure);
            }
            EapCode::Request | EapCode::Response => {}
        }

        if message.eap_type() == Some(EapMethod::Notification.into()) {
            tracing::info!("Received EAP-Request/Notification in the {} state", state);
            return Some(EapResult::Response(EapMessage::notification_response(
                message.identifier,
            )));
        }

        if self.is_expecting_eap_failure {
            tracing::error!("Expecting EAP-Failure. Received non-Failure/Notification message");
            return Some(EapResult::Error(EapSimAkaError::ExpectingEapFailure(
                message.code.into(),
            )));
        }

        let expected: u8 = self.method.into();
        if message.eap_type() != Some(expected) {
            tracing::error!(
                "Expected {:?}, received EAP type {:?}",
                self.method,
                message.eap_type().and_then(EapMethod::from_type)
            );
            return Some(EapResult::Error(EapSimAkaError::UnexpectedMethodType {
                expected,
                actual: message.eap_type(),
            }));
        }

        None
    }

    /// Decodes the message's type-data. On failure the error carries the
    /// Client-Error response suggested by the decoder.
    pub fn decode_type_data(&mut self, message: &EapMessage) -> Result<EapSimAkaTypeData, EapResult> {
        let bytes = message.type_data().unwrap_or_default();
        match self.codec.decode(bytes) {
            Ok(type_data) => Ok(type_data),
            Err(e) => {
                tracing::warn!("Failed to decode {:?} type-data: {}", self.method, e);
                Err(self.build_client_error_response(message.identifier, e.client_error_code()))
            }
        }
    }

    /// Handles an EAP-SIM/AKA Notification round (RFC 4187 §6.1, §9.11).
    pub fn handle_notification(
        &mut self,
        is_pre_challenge_state: bool,
        message: &EapMessage,
        type_data: &EapSimAkaTypeData,
    ) -> EapResult {
        let identifier = message.identifier;

        // at most one notification round per exchange
        if self.has_received_notification {
            tracing::error!("Received multiple {:?} notifications", self.method);
            return EapResult::Error(EapSimAkaError::MultipleNotifications);
        }
        self.has_received_notification = true;

        let Some(notification) = type_data.notification().copied() else {
            tracing::warn!("Notification without AT_NOTIFICATION");
            return self.build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        };

        tracing::info!(
            "Received notification code={} success={} pre_challenge={}",
            notification.code,
            notification.is_success_code(),
            notification.is_pre_successful_challenge()
        );

        if notification.is_pre_successful_challenge() {
            if type_data.contains(AT_MAC) {
                tracing::warn!("AT_MAC included with pre-challenge notification");
                return self
                    .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
            }
            if !is_pre_challenge_state {
                tracing::warn!("Pre-challenge notification received after the challenge");
                return self
                    .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
            }
            return self.build_response(identifier, EapSimAkaSubtype::Notification, Vec::new());
        }

        if is_pre_challenge_state || !type_data.contains(AT_MAC) {
            tracing::warn!("Post-challenge notification without a usable AT_MAC");
            return self.build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
        }

        match self.verify_mac(message, type_data, &[]) {
            Ok(true) => {}
            Ok(false) | Err(EapSimAkaError::KeysNotDerived) => {
                tracing::warn!("Notification with invalid MAC");
                return self
                    .build_client_error_response(identifier, AtClientErrorCode::UnableToProcess);
            }
            Err(e) => return EapResult::Error(e),
        }

        self.build_response_with_mac(identifier, EapSimAkaSubtype::Notification, &[], Vec::new())
    }

    /// Sends `challenge` to the UICC and returns its decoded answer. No
    /// retries: a missing or undecodable answer ends the attempt.
    pub fn process_uicc_authentication(
        &self,
        auth_type: AuthType,
        challenge: &[u8],
    ) -> Result<Vec<u8>, EapSimAkaError> {
        let base64_challenge = encode_challenge(challenge);
        let response = self
            .uicc
            .authenticate(self.app_type, auth_type, &base64_challenge);
        let Some(base64_response) = response else {
            let challenge = self.redactor.bytes(challenge);
            tracing::error!("UICC authentication failed. Input: {}", challenge);
            return Err(EapSimAkaError::UiccAuthenticationFailed(challenge));
        };

        decode_response(&base64_response).map_err(|e| {
            tracing::error!("UICC returned invalid base64: {}", e);
            EapSimAkaError::InvalidUiccResponse(e.to_string())
        })
    }
}
