use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::types::attributes::{AUTS_LEN, MAX_RES_LEN, MIN_RES_LEN};

/// UICC application a challenge is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum UiccAppType {
    Sim = 1,
    Usim = 2,
    Ruim = 3,
    Csim = 4,
    Isim = 5,
}

impl UiccAppType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sim" => Some(UiccAppType::Sim),
            "usim" => Some(UiccAppType::Usim),
            "ruim" => Some(UiccAppType::Ruim),
            "csim" => Some(UiccAppType::Csim),
            "isim" => Some(UiccAppType::Isim),
            _ => None,
        }
    }
}

/// Authentication context requested from the UICC (3GPP TS 31.102 §7.1.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum AuthType {
    EapSim = 128,
    EapAka = 129,
}

/// The secure element that answers RAND/AUTN challenges.
///
/// `base64_challenge` and the returned string use the standard base64
/// alphabet. `None` means the UICC produced no answer at all, which the
/// state machine treats as a local failure.
pub trait UiccAuthenticator: Send + Sync {
    fn authenticate(
        &self,
        app_type: UiccAppType,
        auth_type: AuthType,
        base64_challenge: &str,
    ) -> Option<String>;
}

pub fn encode_challenge(challenge: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(challenge)
}

pub fn decode_response(response: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(response.trim())
}

/// `[len(RAND)][RAND][len(AUTN)][AUTN]`
pub fn format_aka_challenge(rand: &[u8], autn: &[u8]) -> Vec<u8> {
    let mut challenge = Vec::with_capacity(2 + rand.len() + autn.len());
    challenge.push(rand.len() as u8);
    challenge.extend_from_slice(rand);
    challenge.push(autn.len() as u8);
    challenge.extend_from_slice(autn);
    challenge
}

pub const KEY_LEN: usize = 16;

/// First byte of a successful AKA answer.
pub const SUCCESS_TAG: u8 = 0xDB;
/// First byte of an answer requesting re-synchronization.
pub const SYNCHRONIZATION_FAILURE_TAG: u8 = 0xDC;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UiccResponseError {
    #[error("Empty UICC response")]
    Empty,
    #[error("Invalid tag for UICC response: {0:#04X}")]
    UnknownTag(u8),
    #[error("UICC response truncated")]
    Truncated,
    #[error("Invalid {field} length {actual}")]
    InvalidLength { field: &'static str, actual: usize },
}

/// Parsed UICC answer to an AKA challenge. Only the validating constructors
/// build one, so field lengths always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandChallengeResult {
    Success {
        res: Vec<u8>,
        ik: [u8; KEY_LEN],
        ck: [u8; KEY_LEN],
    },
    SynchronizationFailure {
        auts: [u8; AUTS_LEN],
    },
}

impl RandChallengeResult {
    pub fn success(res: &[u8], ik: &[u8], ck: &[u8]) -> Result<Self, UiccResponseError> {
        if !(MIN_RES_LEN..=MAX_RES_LEN).contains(&res.len()) {
            return Err(UiccResponseError::InvalidLength {
                field: "RES",
                actual: res.len(),
            });
        }
        let ik: [u8; KEY_LEN] = ik.try_into().map_err(|_| UiccResponseError::InvalidLength {
            field: "IK",
            actual: ik.len(),
        })?;
        let ck: [u8; KEY_LEN] = ck.try_into().map_err(|_| UiccResponseError::InvalidLength {
            field: "CK",
            actual: ck.len(),
        })?;

        Ok(RandChallengeResult::Success {
            res: res.to_vec(),
            ik,
            ck,
        })
    }

    pub fn synchronization_failure(auts: &[u8]) -> Result<Self, UiccResponseError> {
        let auts = auts.try_into().map_err(|_| UiccResponseError::InvalidLength {
            field: "AUTS",
            actual: auts.len(),
        })?;
        Ok(RandChallengeResult::SynchronizationFailure { auts })
    }

    /// Parses `[0xDB][len][RES][len][CK][len][IK]` or `[0xDC][len][AUTS]`.
    pub fn parse(response: &[u8]) -> Result<Self, UiccResponseError> {
        let (&tag, mut rest) = response.split_first().ok_or(UiccResponseError::Empty)?;
        match tag {
            SUCCESS_TAG => {
                let res = take_length_prefixed(&mut rest)?;
                let ck = take_length_prefixed(&mut rest)?;
                let ik = take_length_prefixed(&mut rest)?;
                Self::success(res, ik, ck)
            }
            SYNCHRONIZATION_FAILURE_TAG => {
                let auts = take_length_prefixed(&mut rest)?;
                Self::synchronization_failure(auts)
            }
            other => Err(UiccResponseError::UnknownTag(other)),
        }
    }
}

fn take_length_prefixed<'a>(buffer: &mut &'a [u8]) -> Result<&'a [u8], UiccResponseError> {
    let (&len, rest) = buffer.split_first().ok_or(UiccResponseError::Truncated)?;
    let len = len as usize;
    if rest.len() < len {
        return Err(UiccResponseError::Truncated);
    }
    let (value, rest) = rest.split_at(len);
    *buffer = rest;
    Ok(value)
}
