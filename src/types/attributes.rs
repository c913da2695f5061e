use serde::{Deserialize, Serialize};

use crate::types::error::EapError;

pub const AT_RAND: u8 = 1;
pub const AT_AUTN: u8 = 2;
pub const AT_RES: u8 = 3;
pub const AT_AUTS: u8 = 4;
pub const AT_PERMANENT_ID_REQ: u8 = 10;
pub const AT_MAC: u8 = 11;
pub const AT_NOTIFICATION: u8 = 12;
pub const AT_ANY_ID_REQ: u8 = 13;
pub const AT_IDENTITY: u8 = 14;
pub const AT_FULLAUTH_ID_REQ: u8 = 17;
pub const AT_CLIENT_ERROR_CODE: u8 = 22;
pub const AT_IV: u8 = 129;
pub const AT_ENCR_DATA: u8 = 130;
pub const AT_BIDDING: u8 = 136;

/// Attributes with a tag at or above this value may be ignored by a peer
/// that does not understand them (RFC 4187 §8.1).
pub const SKIPPABLE_ATTRIBUTE_START: u8 = 128;

pub const RAND_LEN: usize = 16;
pub const AUTN_LEN: usize = 16;
pub const MAC_LEN: usize = 16;
pub const AUTS_LEN: usize = 14;
pub const MIN_RES_LEN: usize = 4;
pub const MAX_RES_LEN: usize = 16;

const ATTRIBUTE_HEADER_LEN: usize = 2;
const LENGTH_UNIT: usize = 4;
const MAX_ATTRIBUTE_LEN: usize = u8::MAX as usize * LENGTH_UNIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum AtClientErrorCode {
    UnableToProcess = 0,
    UnsupportedVersion = 1,
    InsufficientChallenges = 2,
    RandNotFresh = 3,
}

impl From<AtClientErrorCode> for u16 {
    fn from(code: AtClientErrorCode) -> Self {
        code as u16
    }
}

/// AT_NOTIFICATION code. Bit 15 (S) flags success, bit 14 (P) flags a
/// notification sent before a successful challenge round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtNotification {
    pub code: u16,
}

impl AtNotification {
    pub const SUCCESS_MASK: u16 = 0x8000;
    pub const PRE_SUCCESSFUL_CHALLENGE_MASK: u16 = 0x4000;

    pub const GENERAL_FAILURE_POST_CHALLENGE: u16 = 0;
    pub const GENERAL_FAILURE_PRE_CHALLENGE: u16 = 16384;
    pub const SUCCESS: u16 = 32768;
    pub const DENIED_ACCESS_POST_CHALLENGE: u16 = 1026;
    pub const USER_NOT_SUBSCRIBED_POST_CHALLENGE: u16 = 1031;

    pub fn new(code: u16) -> Self {
        Self { code }
    }

    pub fn is_success_code(&self) -> bool {
        self.code & Self::SUCCESS_MASK != 0
    }

    pub fn is_pre_successful_challenge(&self) -> bool {
        self.code & Self::PRE_SUCCESSFUL_CHALLENGE_MASK != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtBidding {
    pub value: u16,
}

impl AtBidding {
    pub const SUPPORTS_AKA_PRIME_MASK: u16 = 0x8000;

    pub fn does_server_support_aka_prime(&self) -> bool {
        self.value & Self::SUPPORTS_AKA_PRIME_MASK != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtMac {
    pub reserved: [u8; 2],
    pub mac: [u8; MAC_LEN],
}

impl AtMac {
    pub fn new(mac: [u8; MAC_LEN]) -> Self {
        Self {
            reserved: [0, 0],
            mac,
        }
    }

    pub fn zeroed(&self) -> Self {
        Self {
            reserved: self.reserved,
            mac: [0u8; MAC_LEN],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EapSimAkaAttribute {
    Rand([u8; RAND_LEN]),
    Autn([u8; AUTN_LEN]),
    Res(Vec<u8>),
    Auts([u8; AUTS_LEN]),
    PermanentIdReq,
    Mac(AtMac),
    Notification(AtNotification),
    AnyIdReq,
    Identity(Vec<u8>),
    FullauthIdReq,
    ClientErrorCode(u16),
    Bidding(AtBidding),
    /// Any other skippable attribute, carried unchanged so MACs over the
    /// received type-data still verify.
    Skippable { tag: u8, value: Vec<u8> },
}

impl EapSimAkaAttribute {
    pub fn res(res: &[u8]) -> Result<Self, EapError> {
        if !(MIN_RES_LEN..=MAX_RES_LEN).contains(&res.len()) {
            return Err(EapError::InvalidAttributeValue {
                tag: AT_RES,
                reason: "RES must be 4 to 16 bytes",
            });
        }
        Ok(EapSimAkaAttribute::Res(res.to_vec()))
    }

    pub fn identity(identity: &[u8]) -> Result<Self, EapError> {
        // 2 byte header + 2 byte actual-length field
        if identity.len() + 4 > MAX_ATTRIBUTE_LEN {
            return Err(EapError::InvalidAttributeValue {
                tag: AT_IDENTITY,
                reason: "identity too long",
            });
        }
        Ok(EapSimAkaAttribute::Identity(identity.to_vec()))
    }

    pub fn client_error_code(code: AtClientErrorCode) -> Self {
        EapSimAkaAttribute::ClientErrorCode(code.into())
    }

    pub fn tag(&self) -> u8 {
        match self {
            EapSimAkaAttribute::Rand(_) => AT_RAND,
            EapSimAkaAttribute::Autn(_) => AT_AUTN,
            EapSimAkaAttribute::Res(_) => AT_RES,
            EapSimAkaAttribute::Auts(_) => AT_AUTS,
            EapSimAkaAttribute::PermanentIdReq => AT_PERMANENT_ID_REQ,
            EapSimAkaAttribute::Mac(_) => AT_MAC,
            EapSimAkaAttribute::Notification(_) => AT_NOTIFICATION,
            EapSimAkaAttribute::AnyIdReq => AT_ANY_ID_REQ,
            EapSimAkaAttribute::Identity(_) => AT_IDENTITY,
            EapSimAkaAttribute::FullauthIdReq => AT_FULLAUTH_ID_REQ,
            EapSimAkaAttribute::ClientErrorCode(_) => AT_CLIENT_ERROR_CODE,
            EapSimAkaAttribute::Bidding(_) => AT_BIDDING,
            EapSimAkaAttribute::Skippable { tag, .. } => *tag,
        }
    }

    /// Attribute value as it appears after the tag and length bytes,
    /// without trailing padding.
    fn value_bytes(&self) -> Vec<u8> {
        match self {
            EapSimAkaAttribute::Rand(rand) => with_reserved(&[0, 0], rand),
            EapSimAkaAttribute::Autn(autn) => with_reserved(&[0, 0], autn),
            EapSimAkaAttribute::Res(res) => {
                with_reserved(&((res.len() * 8) as u16).to_be_bytes(), res)
            }
            EapSimAkaAttribute::Auts(auts) => auts.to_vec(),
            EapSimAkaAttribute::PermanentIdReq
            | EapSimAkaAttribute::AnyIdReq
            | EapSimAkaAttribute::FullauthIdReq => vec![0, 0],
            EapSimAkaAttribute::Mac(at_mac) => with_reserved(&at_mac.reserved, &at_mac.mac),
            EapSimAkaAttribute::Notification(n) => n.code.to_be_bytes().to_vec(),
            EapSimAkaAttribute::Identity(identity) => {
                with_reserved(&(identity.len() as u16).to_be_bytes(), identity)
            }
            EapSimAkaAttribute::ClientErrorCode(code) => code.to_be_bytes().to_vec(),
            EapSimAkaAttribute::Bidding(b) => b.value.to_be_bytes().to_vec(),
            EapSimAkaAttribute::Skippable { value, .. } => value.clone(),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<(), EapError> {
        let value = self.value_bytes();
        let unpadded = ATTRIBUTE_HEADER_LEN + value.len();
        let total = unpadded.div_ceil(LENGTH_UNIT) * LENGTH_UNIT;
        if total > MAX_ATTRIBUTE_LEN {
            return Err(EapError::InvalidAttributeLength {
                tag: self.tag(),
                length: total,
            });
        }

        out.push(self.tag());
        out.push((total / LENGTH_UNIT) as u8);
        out.extend_from_slice(&value);
        out.resize(out.len() + (total - unpadded), 0);
        Ok(())
    }

    /// Decodes one attribute from `value`, the bytes following its tag and
    /// length octets (including any padding).
    pub fn decode(tag: u8, value: &[u8]) -> Result<Self, EapError> {
        let invalid_length = || EapError::InvalidAttributeLength {
            tag,
            length: value.len() + ATTRIBUTE_HEADER_LEN,
        };

        match tag {
            AT_RAND => Ok(EapSimAkaAttribute::Rand(
                fixed_after_reserved(value).ok_or_else(invalid_length)?,
            )),
            AT_AUTN => Ok(EapSimAkaAttribute::Autn(
                fixed_after_reserved(value).ok_or_else(invalid_length)?,
            )),
            AT_MAC => {
                let mac = fixed_after_reserved(value).ok_or_else(invalid_length)?;
                Ok(EapSimAkaAttribute::Mac(AtMac {
                    reserved: [value[0], value[1]],
                    mac,
                }))
            }
            AT_AUTS => {
                let auts = value.try_into().map_err(|_| invalid_length())?;
                Ok(EapSimAkaAttribute::Auts(auts))
            }
            AT_RES => {
                let (bits, rest) = split_u16(value).ok_or_else(invalid_length)?;
                let bits = bits as usize;
                if bits % 8 != 0 {
                    return Err(EapError::InvalidAttributeValue {
                        tag,
                        reason: "RES length is not a whole number of bytes",
                    });
                }
                let res = rest.get(..bits / 8).ok_or_else(invalid_length)?;
                EapSimAkaAttribute::res(res)
            }
            AT_IDENTITY => {
                let (len, rest) = split_u16(value).ok_or_else(invalid_length)?;
                let identity = rest.get(..len as usize).ok_or_else(invalid_length)?;
                Ok(EapSimAkaAttribute::Identity(identity.to_vec()))
            }
            AT_PERMANENT_ID_REQ | AT_ANY_ID_REQ | AT_FULLAUTH_ID_REQ => {
                if value.len() != 2 {
                    return Err(invalid_length());
                }
                Ok(match tag {
                    AT_PERMANENT_ID_REQ => EapSimAkaAttribute::PermanentIdReq,
                    AT_ANY_ID_REQ => EapSimAkaAttribute::AnyIdReq,
                    _ => EapSimAkaAttribute::FullauthIdReq,
                })
            }
            AT_NOTIFICATION | AT_CLIENT_ERROR_CODE | AT_BIDDING => {
                if value.len() != 2 {
                    return Err(invalid_length());
                }
                let code = u16::from_be_bytes([value[0], value[1]]);
                Ok(match tag {
                    AT_NOTIFICATION => EapSimAkaAttribute::Notification(AtNotification::new(code)),
                    AT_CLIENT_ERROR_CODE => EapSimAkaAttribute::ClientErrorCode(code),
                    _ => EapSimAkaAttribute::Bidding(AtBidding { value: code }),
                })
            }
            tag if tag >= SKIPPABLE_ATTRIBUTE_START => Ok(EapSimAkaAttribute::Skippable {
                tag,
                value: value.to_vec(),
            }),
            tag => Err(EapError::UnsupportedAttribute(tag)),
        }
    }
}

fn with_reserved(prefix: &[u8], value: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(prefix.len() + value.len());
    bytes.extend_from_slice(prefix);
    bytes.extend_from_slice(value);
    bytes
}

fn fixed_after_reserved<const N: usize>(value: &[u8]) -> Option<[u8; N]> {
    if value.len() != 2 + N {
        return None;
    }
    value[2..].try_into().ok()
}

fn split_u16(value: &[u8]) -> Option<(u16, &[u8])> {
    if value.len() < 2 {
        return None;
    }
    Some((u16::from_be_bytes([value[0], value[1]]), &value[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(attribute: &EapSimAkaAttribute) -> Vec<u8> {
        let mut out = Vec::new();
        attribute.encode(&mut out).unwrap();
        out
    }

    #[test]
    fn test_encode_res_pads_to_word_boundary() {
        let attribute = EapSimAkaAttribute::res(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap();
        assert_eq!(
            encoded(&attribute),
            vec![AT_RES, 3, 0x00, 0x28, 0x01, 0x02, 0x03, 0x04, 0x05, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_res_length_bounds() {
        assert!(EapSimAkaAttribute::res(&[0u8; 3]).is_err());
        assert!(EapSimAkaAttribute::res(&[0u8; 4]).is_ok());
        assert!(EapSimAkaAttribute::res(&[0u8; 16]).is_ok());
        assert!(EapSimAkaAttribute::res(&[0u8; 17]).is_err());
    }

    #[test]
    fn test_encode_identity() {
        let attribute = EapSimAkaAttribute::identity(b"0123").unwrap();
        assert_eq!(
            encoded(&attribute),
            vec![AT_IDENTITY, 2, 0x00, 0x04, b'0', b'1', b'2', b'3']
        );
    }

    #[test]
    fn test_identity_too_long() {
        let identity = vec![b'1'; MAX_ATTRIBUTE_LEN];
        assert!(EapSimAkaAttribute::identity(&identity).is_err());
    }

    #[test]
    fn test_encode_auts_has_no_reserved_bytes() {
        let attribute = EapSimAkaAttribute::Auts([0xAA; AUTS_LEN]);
        let bytes = encoded(&attribute);
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..2], &[AT_AUTS, 4]);
        assert_eq!(&bytes[2..], &[0xAA; AUTS_LEN]);
    }

    #[test]
    fn test_decode_mac_keeps_reserved_bytes() {
        let mut value = vec![0x12, 0x34];
        value.extend_from_slice(&[0x55; MAC_LEN]);
        let attribute = EapSimAkaAttribute::decode(AT_MAC, &value).unwrap();
        match attribute {
            EapSimAkaAttribute::Mac(at_mac) => {
                assert_eq!(at_mac.reserved, [0x12, 0x34]);
                assert_eq!(at_mac.mac, [0x55; MAC_LEN]);
                assert_eq!(at_mac.zeroed().mac, [0u8; MAC_LEN]);
            }
            other => panic!("unexpected attribute {:?}", other),
        }
    }

    #[test]
    fn test_decode_rand_wrong_length() {
        let result = EapSimAkaAttribute::decode(AT_RAND, &[0u8; 10]);
        assert!(matches!(result, Err(EapError::InvalidAttributeLength { tag: AT_RAND, .. })));
    }

    #[test]
    fn test_decode_res_rejects_partial_bytes() {
        let result = EapSimAkaAttribute::decode(AT_RES, &[0x00, 0x21, 1, 2, 3, 4, 5, 0, 0, 0]);
        assert!(matches!(result, Err(EapError::InvalidAttributeValue { tag: AT_RES, .. })));
    }

    #[test]
    fn test_decode_unknown_non_skippable() {
        let result = EapSimAkaAttribute::decode(42, &[0, 0]);
        assert_eq!(result, Err(EapError::UnsupportedAttribute(42)));
    }

    #[test]
    fn test_decode_unknown_skippable() {
        let result = EapSimAkaAttribute::decode(AT_IV, &[0u8; 18]).unwrap();
        assert_eq!(result.tag(), AT_IV);
    }

    #[test]
    fn test_notification_bits() {
        let pre = AtNotification::new(AtNotification::GENERAL_FAILURE_PRE_CHALLENGE);
        assert!(pre.is_pre_successful_challenge());
        assert!(!pre.is_success_code());

        let success = AtNotification::new(AtNotification::SUCCESS);
        assert!(success.is_success_code());
        assert!(!success.is_pre_successful_challenge());
    }

    #[test]
    fn test_bidding_flag() {
        assert!(AtBidding { value: 0x8000 }.does_server_support_aka_prime());
        assert!(!AtBidding { value: 0x0000 }.does_server_support_aka_prime());
    }
}
