#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use eap_sim_aka::clients::uicc::encode_challenge;
use eap_sim_aka::crypto::{aka_mk_input, hmac_sha1_128, SessionKeys};
use eap_sim_aka::types::attributes::{AtBidding, AtMac};
use eap_sim_aka::types::{
    EapData, EapMethod, EapSimAkaAttribute, EapSimAkaSubtype, EapSimAkaTypeData,
    EapSimAkaTypeDataCodec, TypeDataCodec,
};
use eap_sim_aka::{
    AuthType, EapCode, EapMessage, EapResult, TelephonyProvider, UiccAppType, UiccAuthenticator,
};

/// UICC stand-in that answers challenges with canned base64 strings, in
/// order, repeating the last one, and records what it was asked.
#[derive(Clone, Default)]
pub struct FakeUicc {
    responses: Vec<String>,
    pub challenges: Arc<Mutex<Vec<(UiccAppType, AuthType, String)>>>,
}

impl FakeUicc {
    pub fn answering(response: &[u8]) -> Self {
        Self::answering_in_order(&[response])
    }

    pub fn answering_in_order(responses: &[&[u8]]) -> Self {
        Self {
            responses: responses.iter().map(|r| encode_challenge(r)).collect(),
            challenges: Arc::default(),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}

impl UiccAuthenticator for FakeUicc {
    fn authenticate(
        &self,
        app_type: UiccAppType,
        auth_type: AuthType,
        base64_challenge: &str,
    ) -> Option<String> {
        let mut challenges = self.challenges.lock().unwrap();
        let call = challenges.len();
        challenges.push((app_type, auth_type, base64_challenge.to_string()));
        self.responses
            .get(call)
            .or_else(|| self.responses.last())
            .cloned()
    }
}

pub struct FakeTelephony(pub Option<String>);

impl TelephonyProvider for FakeTelephony {
    fn subscriber_id(&self, _sub_id: i32) -> Option<String> {
        self.0.clone()
    }
}

/// `[0xDB][len][RES][len][CK][len][IK]`
pub fn uicc_success(res: &[u8], ck: &[u8], ik: &[u8]) -> Vec<u8> {
    let mut response = vec![0xDB];
    for field in [res, ck, ik] {
        response.push(field.len() as u8);
        response.extend_from_slice(field);
    }
    response
}

/// `[0xDC][len][AUTS]`
pub fn uicc_sync_failure(auts: &[u8]) -> Vec<u8> {
    let mut response = vec![0xDC, auts.len() as u8];
    response.extend_from_slice(auts);
    response
}

pub fn request(identifier: u8, type_data: &EapSimAkaTypeData) -> EapMessage {
    let bytes = EapSimAkaTypeDataCodec.encode(type_data).unwrap();
    EapMessage::new(
        EapCode::Request,
        identifier,
        Some(EapData::new(EapMethod::Aka.into(), bytes)),
    )
    .unwrap()
}

pub fn identity_request(identifier: u8, attributes: Vec<EapSimAkaAttribute>) -> EapMessage {
    let type_data = EapSimAkaTypeData::new(EapSimAkaSubtype::AkaIdentity, attributes).unwrap();
    request(identifier, &type_data)
}

/// Authenticator side of an AKA-Challenge: RAND, AUTN, optional AT_BIDDING
/// and an AT_MAC keyed with what the peer will derive from `identity`,
/// `ik` and `ck`.
pub struct ServerChallenge {
    pub keys: SessionKeys,
    pub rand: [u8; 16],
    pub autn: [u8; 16],
    pub bidding: Option<u16>,
}

impl ServerChallenge {
    pub fn new(identity: &[u8], ik: &[u8], ck: &[u8]) -> Self {
        Self {
            keys: SessionKeys::derive(&aka_mk_input(identity, ik, ck)),
            rand: [0u8; 16],
            autn: [0u8; 16],
            bidding: None,
        }
    }

    pub fn with_bidding(mut self, value: u16) -> Self {
        self.bidding = Some(value);
        self
    }

    pub fn mac(&self, code: EapCode, identifier: u8, type_data: &EapSimAkaTypeData) -> [u8; 16] {
        let zeroed = EapSimAkaTypeDataCodec
            .encode(&type_data.with_zeroed_mac())
            .unwrap();
        let packet = EapMessage::new(
            code,
            identifier,
            Some(EapData::new(EapMethod::Aka.into(), zeroed)),
        )
        .unwrap()
        .to_bytes()
        .unwrap();
        hmac_sha1_128(&self.keys.k_aut, &[packet.as_slice()])
    }

    pub fn request(&self, identifier: u8) -> EapMessage {
        let mut attributes = vec![
            EapSimAkaAttribute::Rand(self.rand),
            EapSimAkaAttribute::Autn(self.autn),
        ];
        if let Some(value) = self.bidding {
            attributes.push(EapSimAkaAttribute::Bidding(AtBidding { value }));
        }
        attributes.push(EapSimAkaAttribute::Mac(AtMac::new([0u8; 16])));

        let unsigned =
            EapSimAkaTypeData::new(EapSimAkaSubtype::AkaChallenge, attributes).unwrap();
        let mac = self.mac(EapCode::Request, identifier, &unsigned);
        request(identifier, &unsigned.with_mac(mac))
    }

    /// True when `message` carries an AT_MAC this server accepts.
    pub fn verifies(&self, message: &EapMessage) -> bool {
        let type_data = decode(message);
        match type_data.mac() {
            Some(at_mac) => self.mac(message.code, message.identifier, &type_data) == at_mac.mac,
            None => false,
        }
    }
}

pub fn decode(message: &EapMessage) -> EapSimAkaTypeData {
    EapSimAkaTypeDataCodec
        .decode(message.type_data().unwrap())
        .unwrap()
}

pub fn response_type_data(result: &EapResult) -> EapSimAkaTypeData {
    match result {
        EapResult::Response(message) => decode(message),
        other => panic!("expected a response, got {:?}", other),
    }
}

pub fn is_client_error(result: &EapResult) -> bool {
    matches!(result, EapResult::Response(_))
        && response_type_data(result).subtype == EapSimAkaSubtype::ClientError
}
