pub mod telephony;
pub mod uicc;

pub use telephony::TelephonyProvider;
pub use uicc::{AuthType, RandChallengeResult, UiccAppType, UiccAuthenticator, UiccResponseError};
