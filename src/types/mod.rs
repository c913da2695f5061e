pub mod attributes;
pub mod config;
pub mod eap;
pub mod error;
pub mod result;
pub mod type_data;

pub use attributes::{AtClientErrorCode, AtNotification, EapSimAkaAttribute};
pub use config::EapAkaConfig;
pub use eap::{EapCode, EapData, EapMessage, EapMethod};
pub use error::{EapError, EapSimAkaError};
pub use result::EapResult;
pub use type_data::{
    DecodeResult, EapSimAkaSubtype, EapSimAkaTypeData, EapSimAkaTypeDataCodec, TypeDataCodec,
};
