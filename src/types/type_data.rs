use serde::{Deserialize, Serialize};

use crate::types::attributes::{
    AtBidding, AtMac, AtNotification, EapSimAkaAttribute, AT_AUTN, AT_BIDDING, AT_MAC,
    AT_NOTIFICATION, AT_RAND, AUTN_LEN, MAC_LEN, RAND_LEN,
};
use crate::types::error::EapError;

const TYPE_DATA_HEADER_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EapSimAkaSubtype {
    AkaChallenge = 1,
    AkaAuthenticationReject = 2,
    AkaSynchronizationFailure = 4,
    AkaIdentity = 5,
    SimStart = 10,
    SimChallenge = 11,
    Notification = 12,
    Reauthentication = 13,
    ClientError = 14,
}

impl TryFrom<u8> for EapSimAkaSubtype {
    type Error = EapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EapSimAkaSubtype::AkaChallenge),
            2 => Ok(EapSimAkaSubtype::AkaAuthenticationReject),
            4 => Ok(EapSimAkaSubtype::AkaSynchronizationFailure),
            5 => Ok(EapSimAkaSubtype::AkaIdentity),
            10 => Ok(EapSimAkaSubtype::SimStart),
            11 => Ok(EapSimAkaSubtype::SimChallenge),
            12 => Ok(EapSimAkaSubtype::Notification),
            13 => Ok(EapSimAkaSubtype::Reauthentication),
            14 => Ok(EapSimAkaSubtype::ClientError),
            _ => Err(EapError::InvalidSubtype(value)),
        }
    }
}

impl From<EapSimAkaSubtype> for u8 {
    fn from(subtype: EapSimAkaSubtype) -> Self {
        subtype as u8
    }
}

/// Decoded EAP-SIM/AKA type-data: subtype plus an attribute map keyed by tag.
/// Wire order is preserved so that re-encoding reproduces the received bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapSimAkaTypeData {
    pub subtype: EapSimAkaSubtype,
    pub reserved: [u8; 2],
    attributes: Vec<EapSimAkaAttribute>,
}

impl EapSimAkaTypeData {
    pub fn new(
        subtype: EapSimAkaSubtype,
        attributes: Vec<EapSimAkaAttribute>,
    ) -> Result<Self, EapError> {
        let mut type_data = Self {
            subtype,
            reserved: [0, 0],
            attributes: Vec::with_capacity(attributes.len()),
        };
        for attribute in attributes {
            type_data.push(attribute)?;
        }
        Ok(type_data)
    }

    pub fn push(&mut self, attribute: EapSimAkaAttribute) -> Result<(), EapError> {
        if self.contains(attribute.tag()) {
            return Err(EapError::DuplicateAttribute(attribute.tag()));
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub fn attributes(&self) -> &[EapSimAkaAttribute] {
        &self.attributes
    }

    pub fn get(&self, tag: u8) -> Option<&EapSimAkaAttribute> {
        self.attributes.iter().find(|a| a.tag() == tag)
    }

    pub fn contains(&self, tag: u8) -> bool {
        self.get(tag).is_some()
    }

    pub fn rand(&self) -> Option<&[u8; RAND_LEN]> {
        match self.get(AT_RAND) {
            Some(EapSimAkaAttribute::Rand(rand)) => Some(rand),
            _ => None,
        }
    }

    pub fn autn(&self) -> Option<&[u8; AUTN_LEN]> {
        match self.get(AT_AUTN) {
            Some(EapSimAkaAttribute::Autn(autn)) => Some(autn),
            _ => None,
        }
    }

    pub fn mac(&self) -> Option<&AtMac> {
        match self.get(AT_MAC) {
            Some(EapSimAkaAttribute::Mac(at_mac)) => Some(at_mac),
            _ => None,
        }
    }

    pub fn notification(&self) -> Option<&AtNotification> {
        match self.get(AT_NOTIFICATION) {
            Some(EapSimAkaAttribute::Notification(n)) => Some(n),
            _ => None,
        }
    }

    pub fn bidding(&self) -> Option<&AtBidding> {
        match self.get(AT_BIDDING) {
            Some(EapSimAkaAttribute::Bidding(b)) => Some(b),
            _ => None,
        }
    }

    /// Copy of this type-data with the AT_MAC value replaced by `mac`.
    /// The attribute keeps its position and reserved bytes.
    pub fn with_mac(&self, mac: [u8; MAC_LEN]) -> Self {
        let attributes = self
            .attributes
            .iter()
            .map(|attribute| match attribute {
                EapSimAkaAttribute::Mac(at_mac) => EapSimAkaAttribute::Mac(AtMac {
                    reserved: at_mac.reserved,
                    mac,
                }),
                other => other.clone(),
            })
            .collect();

        Self {
            subtype: self.subtype,
            reserved: self.reserved,
            attributes,
        }
    }

    pub fn with_zeroed_mac(&self) -> Self {
        self.with_mac([0u8; MAC_LEN])
    }
}

pub type DecodeResult = Result<EapSimAkaTypeData, EapError>;

/// Converts between raw EAP type-data bytes and [`EapSimAkaTypeData`].
pub trait TypeDataCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> DecodeResult;
    fn encode(&self, type_data: &EapSimAkaTypeData) -> Result<Vec<u8>, EapError>;
}

/// RFC 4186/4187 §8.1 type-data layout: subtype, two reserved bytes, then
/// type-length-value attributes sized in 4-byte words.
#[derive(Debug, Default, Clone, Copy)]
pub struct EapSimAkaTypeDataCodec;

impl TypeDataCodec for EapSimAkaTypeDataCodec {
    fn decode(&self, bytes: &[u8]) -> DecodeResult {
        if bytes.len() < TYPE_DATA_HEADER_LEN {
            return Err(EapError::BufferTooShort {
                expected: TYPE_DATA_HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let subtype = EapSimAkaSubtype::try_from(bytes[0])?;
        let mut type_data = EapSimAkaTypeData::new(subtype, Vec::new())?;
        type_data.reserved = [bytes[1], bytes[2]];

        let mut pos = TYPE_DATA_HEADER_LEN;
        while pos < bytes.len() {
            if pos + 2 > bytes.len() {
                return Err(EapError::BufferTooShort {
                    expected: pos + 2,
                    actual: bytes.len(),
                });
            }

            let tag = bytes[pos];
            let length = bytes[pos + 1] as usize * 4;
            if length == 0 {
                return Err(EapError::InvalidAttributeLength { tag, length });
            }
            if pos + length > bytes.len() {
                return Err(EapError::AttributeOverrun(tag));
            }

            let attribute = EapSimAkaAttribute::decode(tag, &bytes[pos + 2..pos + length])?;
            type_data.push(attribute)?;

            pos += length;
        }

        Ok(type_data)
    }

    fn encode(&self, type_data: &EapSimAkaTypeData) -> Result<Vec<u8>, EapError> {
        let mut bytes = vec![
            type_data.subtype.into(),
            type_data.reserved[0],
            type_data.reserved[1],
        ];
        for attribute in type_data.attributes() {
            attribute.encode(&mut bytes)?;
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attributes::{AT_IDENTITY, AT_PERMANENT_ID_REQ};

    fn challenge_bytes() -> Vec<u8> {
        let mut bytes = vec![0x01, 0x00, 0x00];
        bytes.extend_from_slice(&[AT_RAND, 5, 0, 0]);
        bytes.extend_from_slice(&[0x11; 16]);
        bytes.extend_from_slice(&[AT_AUTN, 5, 0, 0]);
        bytes.extend_from_slice(&[0x22; 16]);
        bytes.extend_from_slice(&[AT_MAC, 5, 0, 0]);
        bytes.extend_from_slice(&[0x33; 16]);
        bytes
    }

    #[test]
    fn test_decode_challenge() {
        let type_data = EapSimAkaTypeDataCodec.decode(&challenge_bytes()).unwrap();
        assert_eq!(type_data.subtype, EapSimAkaSubtype::AkaChallenge);
        assert_eq!(type_data.rand(), Some(&[0x11; 16]));
        assert_eq!(type_data.autn(), Some(&[0x22; 16]));
        assert_eq!(type_data.mac().map(|m| m.mac), Some([0x33; 16]));
    }

    #[test]
    fn test_encode_reproduces_received_bytes() {
        let bytes = challenge_bytes();
        let type_data = EapSimAkaTypeDataCodec.decode(&bytes).unwrap();
        assert_eq!(EapSimAkaTypeDataCodec.encode(&type_data).unwrap(), bytes);
    }

    #[test]
    fn test_reserved_bytes_survive_re_encoding() {
        let mut bytes = challenge_bytes();
        bytes[1] = 0xA5;
        let type_data = EapSimAkaTypeDataCodec.decode(&bytes).unwrap();
        assert_eq!(type_data.reserved, [0xA5, 0x00]);
        assert_eq!(EapSimAkaTypeDataCodec.encode(&type_data).unwrap(), bytes);
    }

    #[test]
    fn test_with_zeroed_mac_leaves_original_untouched() {
        let type_data = EapSimAkaTypeDataCodec.decode(&challenge_bytes()).unwrap();
        let zeroed = type_data.with_zeroed_mac();
        assert_eq!(zeroed.mac().map(|m| m.mac), Some([0u8; 16]));
        assert_eq!(type_data.mac().map(|m| m.mac), Some([0x33; 16]));
        assert_eq!(zeroed.attributes().len(), type_data.attributes().len());
    }

    #[test]
    fn test_decode_rejects_duplicate_attribute() {
        let bytes = vec![
            0x05, 0x00, 0x00,
            AT_PERMANENT_ID_REQ, 1, 0, 0,
            AT_PERMANENT_ID_REQ, 1, 0, 0,
        ];
        let result = EapSimAkaTypeDataCodec.decode(&bytes);
        assert_eq!(result, Err(EapError::DuplicateAttribute(AT_PERMANENT_ID_REQ)));
    }

    #[test]
    fn test_decode_rejects_zero_length_attribute() {
        let bytes = vec![0x05, 0x00, 0x00, AT_IDENTITY, 0, 0, 0];
        let result = EapSimAkaTypeDataCodec.decode(&bytes);
        assert!(matches!(result, Err(EapError::InvalidAttributeLength { .. })));
    }

    #[test]
    fn test_decode_rejects_overrun() {
        let bytes = vec![0x05, 0x00, 0x00, AT_IDENTITY, 3, 0, 4, b'a'];
        let result = EapSimAkaTypeDataCodec.decode(&bytes);
        assert_eq!(result, Err(EapError::AttributeOverrun(AT_IDENTITY)));
    }

    #[test]
    fn test_decode_rejects_unknown_subtype() {
        let result = EapSimAkaTypeDataCodec.decode(&[0x63, 0x00, 0x00]);
        assert_eq!(result, Err(EapError::InvalidSubtype(0x63)));
    }

    #[test]
    fn test_decode_rejects_truncated_header() {
        let result = EapSimAkaTypeDataCodec.decode(&[0x01]);
        assert!(matches!(result, Err(EapError::BufferTooShort { .. })));
    }
}
