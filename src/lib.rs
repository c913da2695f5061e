pub mod clients;
pub mod crypto;
pub mod logging;
pub mod method;
pub mod types;

pub use clients::{AuthType, TelephonyProvider, UiccAppType, UiccAuthenticator};
pub use method::aka::{AkaState, EapAkaMethodStateMachine};
pub use types::{EapAkaConfig, EapCode, EapMessage, EapResult, EapSimAkaError};
