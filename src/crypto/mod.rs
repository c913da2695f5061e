pub mod keys;
pub mod mac;
pub mod prf;

pub use keys::{aka_mk_input, master_key, SessionKeys};
pub use mac::{hmac_sha1_128, verify_hmac_sha1_128};
pub use prf::fips186_2_prf;
