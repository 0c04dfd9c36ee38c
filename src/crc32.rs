/// CRC32 combination (ISO 3309 / ITU-T V.42 / gzip).
///
/// Uses the standard polynomial 0xEDB88320 (bit-reversed 0x04C11DB7).
/// A CRC register is a polynomial over GF(2) stored reflected: bit 31
/// holds the x^0 coefficient and bit 0 holds x^31. Appending `n` zero
/// bytes to a message multiplies its CRC by x^(8n) mod P, so
/// `crc(A ++ B) = crc(A) * x^(8 * len(B)) mod P  xor  crc(B)`.
const CRC32_POLY: u32 = 0xEDB8_8320;

/// The polynomial `1` (x^0) in reflected form.
const X0: u32 = 1 << 31;

/// Multiply `a` by `b` modulo the CRC polynomial.
const fn multmodp(a: u32, mut b: u32) -> u32 {
    let mut m = X0;
    let mut p = 0u32;
    while m != 0 {
        if a & m != 0 {
            p ^= b;
        }
        m >>= 1;
        // b *= x
        b = if b & 1 != 0 {
            (b >> 1) ^ CRC32_POLY
        } else {
            b >> 1
        };
    }
    p
}

/// Pre-computed x^(8 * 2^k) mod P for k in 0..64, one entry per bit of
/// a 64-bit byte count.
const fn make_byte_powers() -> [u32; 64] {
    let mut table = [0u32; 64];
    // x^1, squared three times gives x^8 (one zero byte).
    let mut p: u32 = X0 >> 1;
    let mut i = 0;
    while i < 3 {
        p = multmodp(p, p);
        i += 1;
    }
    let mut k = 0;
    while k < 64 {
        table[k] = p;
        p = multmodp(p, p);
        k += 1;
    }
    table
}

static BYTE_POWERS: [u32; 64] = make_byte_powers();

/// x^(8 * len) mod P, by square-and-multiply over the bits of `len`.
fn x8nmodp(mut len: u64) -> u32 {
    let mut p = X0;
    let mut k = 0;
    while len != 0 {
        if len & 1 != 0 {
            p = multmodp(BYTE_POWERS[k], p);
        }
        len >>= 1;
        k += 1;
    }
    p
}

/// Combine two CRC32 values.
///
/// Given `crc1 = crc32(A)`, `crc2 = crc32(B)` and `len2 = len(B)`, returns
/// `crc32(A ++ B)` in O(log len2) time. A wrong `len2` is not detected; it
/// yields a well-defined but meaningless checksum.
pub fn crc32_combine(crc1: u32, crc2: u32, len2: u64) -> u32 {
    multmodp(x8nmodp(len2), crc1) ^ crc2
}

/// Pre-computed combine operator for a fixed second-range length.
///
/// Useful when many checksum pairs share the same `len2` (fixed-size
/// blocks): the O(log n) work happens once in [`Crc32CombineOp::new`] and
/// each [`apply`](Crc32CombineOp::apply) is a single 32-step multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32CombineOp {
    op: u32,
    len2: u64,
}

impl Crc32CombineOp {
    pub fn new(len2: u64) -> Self {
        let op = x8nmodp(len2);
        log::trace!("crc32 combine operator for len2={len2}: {op:#010x}");
        Self { op, len2 }
    }

    /// The second-range length this operator was built for.
    pub fn len2(&self) -> u64 {
        self.len2
    }

    pub fn apply(&self, crc1: u32, crc2: u32) -> u32 {
        multmodp(self.op, crc1) ^ crc2
    }
}
