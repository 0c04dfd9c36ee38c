/// Adler-32 combination (RFC 1950).
///
/// An Adler-32 value packs two sums modulo 65521: `a = 1 + sum(bytes)` in
/// the low 16 bits and `b = sum(a after each byte)` in the high 16 bits.
const ADLER_MOD: u32 = 65_521;

/// Combine two Adler-32 values.
///
/// Given `adler1 = adler32(A)`, `adler2 = adler32(B)` and `len2 = len(B)`,
/// returns `adler32(A ++ B)`. Every running `a` inside B is shifted by
/// `a1 - 1`, which gives:
///
/// ```text
/// a = a1 + a2 - 1
/// b = b1 + b2 + len2 * (a1 - 1)      (all mod 65521)
/// ```
///
/// Intermediates are kept non-negative by adding the modulus before
/// subtracting, then folded back with conditional subtraction.
pub fn adler32_combine(adler1: u32, adler2: u32, len2: u64) -> u32 {
    let rem = (len2 % u64::from(ADLER_MOD)) as u32;

    let a1 = (adler1 & 0xFFFF) % ADLER_MOD;
    let b1 = (adler1 >> 16) % ADLER_MOD;
    let a2 = (adler2 & 0xFFFF) % ADLER_MOD;
    let b2 = (adler2 >> 16) % ADLER_MOD;

    // < 3 * ADLER_MOD
    let mut a = a1 + a2 + ADLER_MOD - 1;
    if a >= ADLER_MOD {
        a -= ADLER_MOD;
    }
    if a >= ADLER_MOD {
        a -= ADLER_MOD;
    }

    // rem * a1 < 65521^2 fits in u32; the sum stays < 4 * ADLER_MOD
    let mut b = (rem * a1) % ADLER_MOD + b1 + b2 + ADLER_MOD - rem;
    if b >= ADLER_MOD << 1 {
        b -= ADLER_MOD << 1;
    }
    if b >= ADLER_MOD {
        b -= ADLER_MOD;
    }

    (b << 16) | a
}
