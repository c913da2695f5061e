//! FIPS 186-2 pseudo-random function with change notice 1, as profiled by
//! RFC 4186 Appendix B and RFC 4187 §7.

pub const SEED_LEN: usize = 20;
const BLOCK_LEN: usize = 64;
const OUTPUT_PER_ROUND: usize = 2 * SEED_LEN;

const SHA1_INITIAL_STATE: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];

/// Expands `seed` (XKEY) into `output_len` bytes.
pub fn fips186_2_prf(seed: &[u8; SEED_LEN], output_len: usize) -> Vec<u8> {
    let rounds = output_len.div_ceil(OUTPUT_PER_ROUND);
    let mut output = Vec::with_capacity(rounds * OUTPUT_PER_ROUND);
    let mut xkey = *seed;

    for _ in 0..rounds {
        for _ in 0..2 {
            // XSEED is zero, so XVAL = XKEY
            let w = g(&xkey);
            add_one_plus(&mut xkey, &w);
            output.extend_from_slice(&w);
        }
    }

    output.truncate(output_len);
    output
}

/// SHA-1 compression of a single zero-padded block, no length padding.
fn g(xval: &[u8; SEED_LEN]) -> [u8; SEED_LEN] {
    let mut block = [0u8; BLOCK_LEN];
    block[..SEED_LEN].copy_from_slice(xval);

    let mut state = SHA1_INITIAL_STATE;
    sha1::compress(&mut state, &[block.into()]);

    let mut out = [0u8; SEED_LEN];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// XKEY = (1 + XKEY + w) mod 2^160
fn add_one_plus(xkey: &mut [u8; SEED_LEN], w: &[u8; SEED_LEN]) {
    let mut carry = 1u16;
    for i in (0..SEED_LEN).rev() {
        let sum = xkey[i] as u16 + w[i] as u16 + carry;
        xkey[i] = sum as u8;
        carry = sum >> 8;
    }
}
