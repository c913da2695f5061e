use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::types::attributes::MAC_LEN;

type HmacSha1 = Hmac<Sha1>;

/// HMAC-SHA1-128 over the concatenation of `parts`.
pub fn hmac_sha1_128(key: &[u8], parts: &[&[u8]]) -> [u8; MAC_LEN] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    let digest = mac.finalize().into_bytes();

    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&digest[..MAC_LEN]);
    out
}

/// Constant-time check of a truncated HMAC-SHA1 tag.
pub fn verify_hmac_sha1_128(key: &[u8], parts: &[&[u8]], expected: &[u8]) -> bool {
    if expected.len() != MAC_LEN {
        return false;
    }
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    for part in parts {
        mac.update(part);
    }
    mac.verify_truncated_left(expected).is_ok()
}
