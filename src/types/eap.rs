use serde::{Deserialize, Serialize};

use crate::types::error::EapError;

pub const EAP_HEADER_LEN: usize = 4;
/// The length field is 16 bits and covers the whole packet.
pub const MAX_EAP_LEN: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EapCode {
    Request = 1,
    Response = 2,
    Success = 3,
    Failure = 4,
}

impl TryFrom<u8> for EapCode {
    type Error = EapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EapCode::Request),
            2 => Ok(EapCode::Response),
            3 => Ok(EapCode::Success),
            4 => Ok(EapCode::Failure),
            _ => Err(EapError::InvalidCode(value)),
        }
    }
}

impl From<EapCode> for u8 {
    fn from(code: EapCode) -> Self {
        code as u8
    }
}

/// EAP method types this crate speaks, plus the two EAP-level types the
/// method state machines must answer on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EapMethod {
    Identity = 1,
    Notification = 2,
    Sim = 18,
    Aka = 23,
    AkaPrime = 50,
}

impl EapMethod {
    pub fn from_type(value: u8) -> Option<Self> {
        match value {
            1 => Some(EapMethod::Identity),
            2 => Some(EapMethod::Notification),
            18 => Some(EapMethod::Sim),
            23 => Some(EapMethod::Aka),
            50 => Some(EapMethod::AkaPrime),
            _ => None,
        }
    }

    /// Leading character of the permanent identity (3GPP TS 23.003 §19.3.2).
    pub fn identity_prefix(&self) -> Option<char> {
        match self {
            EapMethod::Sim => Some('1'),
            EapMethod::Aka => Some('0'),
            EapMethod::AkaPrime => Some('6'),
            _ => None,
        }
    }
}

impl From<EapMethod> for u8 {
    fn from(method: EapMethod) -> Self {
        method as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EapData {
    pub eap_type: u8,
    pub type_data: Vec<u8>,
}

impl EapData {
    pub fn new(eap_type: u8, type_data: Vec<u8>) -> Self {
        Self { eap_type, type_data }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EapMessage {
    pub code: EapCode,
    pub identifier: u8,
    pub data: Option<EapData>,
}

impl EapMessage {
    pub fn new(code: EapCode, identifier: u8, data: Option<EapData>) -> Result<Self, EapError> {
        match (code, &data) {
            (EapCode::Request | EapCode::Response, None) => {
                return Err(EapError::MissingTypeData(code.into()));
            }
            (EapCode::Success | EapCode::Failure, Some(_)) => {
                return Err(EapError::UnexpectedTypeData(code.into()));
            }
            _ => {}
        }

        let message = Self {
            code,
            identifier,
            data,
        };
        if message.length() > MAX_EAP_LEN {
            return Err(EapError::MessageTooLong(message.length()));
        }
        Ok(message)
    }

    pub fn response(identifier: u8, eap_type: u8, type_data: Vec<u8>) -> Self {
        Self {
            code: EapCode::Response,
            identifier,
            data: Some(EapData::new(eap_type, type_data)),
        }
    }

    pub fn success(identifier: u8) -> Self {
        Self {
            code: EapCode::Success,
            identifier,
            data: None,
        }
    }

    pub fn failure(identifier: u8) -> Self {
        Self {
            code: EapCode::Failure,
            identifier,
            data: None,
        }
    }

    /// EAP-Response/Notification (RFC 3748 §5.2) carries no type-data.
    pub fn notification_response(identifier: u8) -> Self {
        Self::response(identifier, EapMethod::Notification.into(), Vec::new())
    }

    pub fn eap_type(&self) -> Option<u8> {
        self.data.as_ref().map(|d| d.eap_type)
    }

    pub fn type_data(&self) -> Option<&[u8]> {
        self.data.as_ref().map(|d| d.type_data.as_slice())
    }

    pub fn length(&self) -> usize {
        match &self.data {
            Some(data) => EAP_HEADER_LEN + 1 + data.type_data.len(),
            None => EAP_HEADER_LEN,
        }
    }

    /// Fails when the packet does not fit the 16-bit length field; the
    /// public fields allow building such a message directly.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EapError> {
        let length = self.length();
        let length_field = u16::try_from(length).map_err(|_| EapError::MessageTooLong(length))?;

        let mut bytes = Vec::with_capacity(length);
        bytes.push(self.code.into());
        bytes.push(self.identifier);
        bytes.extend_from_slice(&length_field.to_be_bytes());

        if let Some(data) = &self.data {
            bytes.push(data.eap_type);
            bytes.extend_from_slice(&data.type_data);
        }

        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EapError> {
        if bytes.len() < EAP_HEADER_LEN {
            return Err(EapError::BufferTooShort {
                expected: EAP_HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let code = EapCode::try_from(bytes[0])?;
        let identifier = bytes[1];
        let length = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;

        if length < EAP_HEADER_LEN || bytes.len() < length {
            return Err(EapError::LengthMismatch {
                declared: length,
                actual: bytes.len(),
            });
        }

        let data = match code {
            EapCode::Request | EapCode::Response => {
                if length < EAP_HEADER_LEN + 1 {
                    return Err(EapError::BufferTooShort {
                        expected: EAP_HEADER_LEN + 1,
                        actual: length,
                    });
                }
                Some(EapData::new(
                    bytes[EAP_HEADER_LEN],
                    bytes[EAP_HEADER_LEN + 1..length].to_vec(),
                ))
            }
            EapCode::Success | EapCode::Failure => None,
        };

        EapMessage::new(code, identifier, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_to_bytes() {
        let message = EapMessage::response(0x10, EapMethod::Aka.into(), vec![0x05, 0x00, 0x00]);
        assert_eq!(
            message.to_bytes().unwrap(),
            vec![0x02, 0x10, 0x00, 0x08, 0x17, 0x05, 0x00, 0x00]
        );
    }

    #[test]
    fn test_oversized_message_is_rejected() {
        let type_data = vec![0u8; MAX_EAP_LEN - EAP_HEADER_LEN];
        let message = EapMessage::response(1, EapMethod::Aka.into(), type_data.clone());
        assert_eq!(
            message.to_bytes(),
            Err(EapError::MessageTooLong(MAX_EAP_LEN + 1))
        );
        assert_eq!(
            EapMessage::new(EapCode::Response, 1, Some(EapData::new(23, type_data))),
            Err(EapError::MessageTooLong(MAX_EAP_LEN + 1))
        );

        let largest = vec![0u8; MAX_EAP_LEN - EAP_HEADER_LEN - 1];
        let message = EapMessage::response(1, EapMethod::Aka.into(), largest);
        let bytes = message.to_bytes().unwrap();
        assert_eq!(&bytes[2..4], &[0xFF, 0xFF]);
        assert_eq!(EapMessage::from_bytes(&bytes).unwrap(), message);
    }

    #[test]
    fn test_from_bytes_request() {
        let bytes = hex::decode("0101000817050000").unwrap();
        let message = EapMessage::from_bytes(&bytes).unwrap();
        assert_eq!(message.code, EapCode::Request);
        assert_eq!(message.identifier, 1);
        assert_eq!(message.eap_type(), Some(23));
        assert_eq!(message.type_data(), Some(&[0x05, 0x00, 0x00][..]));
    }

    #[test]
    fn test_from_bytes_success_has_no_data() {
        let message = EapMessage::from_bytes(&[0x03, 0x07, 0x00, 0x04]).unwrap();
        assert_eq!(message, EapMessage::success(7));
    }

    #[test]
    fn test_from_bytes_rejects_short_buffer() {
        let result = EapMessage::from_bytes(&[0x01, 0x01]);
        assert!(matches!(result, Err(EapError::BufferTooShort { .. })));
    }

    #[test]
    fn test_from_bytes_rejects_length_overrun() {
        let result = EapMessage::from_bytes(&[0x01, 0x01, 0x00, 0x10, 0x17]);
        assert!(matches!(result, Err(EapError::LengthMismatch { .. })));
    }

    #[test]
    fn test_from_bytes_rejects_unknown_code() {
        let result = EapMessage::from_bytes(&[0x09, 0x01, 0x00, 0x04]);
        assert_eq!(result, Err(EapError::InvalidCode(9)));
    }

    #[test]
    fn test_new_rejects_request_without_data() {
        assert!(EapMessage::new(EapCode::Request, 1, None).is_err());
        assert!(EapMessage::new(EapCode::Success, 1, Some(EapData::new(23, vec![]))).is_err());
    }

    #[test]
    fn test_identity_prefix() {
        assert_eq!(EapMethod::Aka.identity_prefix(), Some('0'));
        assert_eq!(EapMethod::AkaPrime.identity_prefix(), Some('6'));
        assert_eq!(EapMethod::Sim.identity_prefix(), Some('1'));
        assert_eq!(EapMethod::Notification.identity_prefix(), None);
    }
}
