//! Internet-style ones'-complement checksum.
//!
//! Words are summed big-endian with the carry folded back immediately, so
//! the accumulator never exceeds `0x1FFFE` between words. Partial sums
//! chain: `sum(b, sum(a, 0)) == sum(ab, 0)` for even-length `a`, which is
//! how the pseudo-header is prepended to the transport checksum.

/// Sums 16-bit big-endian words over `bytes`, continuing from `seed`.
/// An odd trailing byte counts as the high byte of a zero-padded word.
pub fn sum(bytes: &[u8], seed: u32) -> u32 {
    let mut acc = seed;
    let mut chunks = bytes.chunks_exact(2);
    for pair in &mut chunks {
        acc += u32::from(u16::from_be_bytes([pair[0], pair[1]]));
        if acc > 0xFFFF {
            acc -= 0xFFFF;
        }
    }
    if let [tail] = *chunks.remainder() {
        acc += u32::from(tail) << 8;
        if acc > 0xFFFF {
            acc -= 0xFFFF;
        }
    }
    acc
}

/// Ones'-complement of the low 16 bits of a partial sum; the value that
/// goes on the wire (big-endian, written by the codec).
pub fn finalize(partial: u32) -> u16 {
    !(partial as u16)
}
