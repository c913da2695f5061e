use sha1::{Digest, Sha1};

use crate::crypto::prf::{fips186_2_prf, SEED_LEN};

pub const K_ENCR_LEN: usize = 16;
pub const K_AUT_LEN: usize = 16;
pub const MSK_LEN: usize = 64;
pub const EMSK_LEN: usize = 64;

const KEY_MATERIAL_LEN: usize = K_ENCR_LEN + K_AUT_LEN + MSK_LEN + EMSK_LEN;

/// MK = SHA1(input)
pub fn master_key(mk_input: &[u8]) -> [u8; SEED_LEN] {
    let digest = Sha1::digest(mk_input);
    let mut mk = [0u8; SEED_LEN];
    mk.copy_from_slice(&digest);
    mk
}

/// Key material of one EAP-SIM/AKA full authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub k_encr: [u8; K_ENCR_LEN],
    pub k_aut: [u8; K_AUT_LEN],
    pub msk: [u8; MSK_LEN],
    pub emsk: [u8; EMSK_LEN],
}

impl SessionKeys {
    /// MK = SHA1(mk_input), then K_encr | K_aut | MSK | EMSK = PRF(MK).
    pub fn derive(mk_input: &[u8]) -> Self {
        let mk = master_key(mk_input);
        let material = fips186_2_prf(&mk, KEY_MATERIAL_LEN);

        let (k_encr, rest) = material.split_at(K_ENCR_LEN);
        let (k_aut, rest) = rest.split_at(K_AUT_LEN);
        let (msk, emsk) = rest.split_at(MSK_LEN);

        let mut keys = Self {
            k_encr: [0u8; K_ENCR_LEN],
            k_aut: [0u8; K_AUT_LEN],
            msk: [0u8; MSK_LEN],
            emsk: [0u8; EMSK_LEN],
        };
        keys.k_encr.copy_from_slice(k_encr);
        keys.k_aut.copy_from_slice(k_aut);
        keys.msk.copy_from_slice(msk);
        keys.emsk.copy_from_slice(emsk);
        keys
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

/// `identity || IK || CK`
pub fn aka_mk_input(identity: &[u8], ik: &[u8], ck: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(identity.len() + ik.len() + ck.len());
    input.extend_from_slice(identity);
    input.extend_from_slice(ik);
    input.extend_from_slice(ck);
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_is_sha1() {
        assert_eq!(
            hex::encode(master_key(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let input = aka_mk_input(b"0123456789", &[0x22; 16], &[0x11; 16]);
        let first = SessionKeys::derive(&input);
        let second = SessionKeys::derive(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_derive_splits_prf_output() {
        let input = aka_mk_input(b"0123456789", &[0x22; 16], &[0x11; 16]);
        let keys = SessionKeys::derive(&input);
        let material = fips186_2_prf(&master_key(&input), KEY_MATERIAL_LEN);
        assert_eq!(&material[..16], &keys.k_encr);
        assert_eq!(&material[16..32], &keys.k_aut);
        assert_eq!(&material[32..96], &keys.msk);
        assert_eq!(&material[96..], &keys.emsk);
    }

    #[test]
    fn test_derive_depends_on_ik_and_ck() {
        let base = SessionKeys::derive(&aka_mk_input(b"0123456789", &[0x22; 16], &[0x11; 16]));
        let other_ck = SessionKeys::derive(&aka_mk_input(b"0123456789", &[0x22; 16], &[0x12; 16]));
        let other_ik = SessionKeys::derive(&aka_mk_input(b"0123456789", &[0x23; 16], &[0x11; 16]));
        assert_ne!(base.k_aut, other_ck.k_aut);
        assert_ne!(base.msk, other_ck.msk);
        assert_ne!(base.k_aut, other_ik.k_aut);
        assert_ne!(base.emsk, other_ik.emsk);
    }

    #[test]
    fn test_debug_hides_key_material() {
        let keys = SessionKeys::derive(b"input");
        assert_eq!(format!("{:?}", keys), "SessionKeys { .. }");
    }
}
