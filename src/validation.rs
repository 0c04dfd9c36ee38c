//! Validation tests for checksum combination.
//!
//! These tests verify:
//! 1. **Identity** - combining checksums of a split equals the checksum of the whole
//! 2. **Associativity** - every three-way split folds to the same value
//! 3. **Range** - outputs stay within 32 bits and Adler halves stay below the modulus
//! 4. **Gzip splicing** - injected members carry the trailer of the concatenated payload

/// Checksums over raw bytes are only needed here, to produce the inputs
/// and expected outputs; the library itself never computes them.
pub(crate) mod reference {
    const CRC32_POLY: u32 = 0xEDB8_8320;

    const fn make_table() -> [u32; 256] {
        let mut table = [0u32; 256];
        let mut i = 0u32;
        while i < 256 {
            let mut crc = i;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ CRC32_POLY;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i as usize] = crc;
            i += 1;
        }
        table
    }

    static TABLE: [u32; 256] = make_table();

    /// Bytewise table-driven CRC32.
    pub fn crc32(data: &[u8]) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        for &b in data {
            let idx = ((crc ^ b as u32) & 0xFF) as usize;
            crc = (crc >> 8) ^ TABLE[idx];
        }
        crc ^ 0xFFFF_FFFF
    }

    /// Straightforward Adler-32, reducing every byte.
    pub fn adler32(data: &[u8]) -> u32 {
        let (mut a, mut b) = (1u32, 0u32);
        for &byte in data {
            a = (a + byte as u32) % 65_521;
            b = (b + a) % 65_521;
        }
        (b << 16) | a
    }

    /// A gzip member whose DEFLATE body is a single final stored block.
    pub fn stored_member(payload: &[u8], flg: u8, optional: &[u8]) -> Vec<u8> {
        assert!(payload.len() <= 0xFFFF);
        let mut out = vec![0x1F, 0x8B, 8, flg, 0, 0, 0, 0, 0, 3];
        out.extend_from_slice(optional);
        out.extend_from_slice(&stored_block(payload, true));
        out.extend_from_slice(&crc32(payload).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out
    }

    /// A bare gzip header followed by one non-final stored block, the shape
    /// a sync-flushed compressor emits.
    pub fn stored_fragment(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x1F, 0x8B, 8, 0, 0, 0, 0, 0, 0, 3];
        out.extend_from_slice(&stored_block(payload, false));
        out
    }

    fn stored_block(payload: &[u8], last: bool) -> Vec<u8> {
        let len = payload.len() as u16;
        let mut out = vec![u8::from(last)];
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    /// Walk a run of byte-aligned stored blocks and return their payload.
    pub fn unstore(mut body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let last = body[0] & 1 != 0;
            assert_eq!(body[0] >> 1, 0, "not a stored block");
            let len = u16::from_le_bytes([body[1], body[2]]) as usize;
            let nlen = u16::from_le_bytes([body[3], body[4]]);
            assert_eq!(!(len as u16), nlen);
            out.extend_from_slice(&body[5..5 + len]);
            body = &body[5 + len..];
            if last {
                assert!(body.is_empty());
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::reference::{adler32, crc32, stored_fragment, stored_member, unstore};
    use crate::gzip::{self, GzipTrailer, InjectFragment};
    use crate::{adler32_combine, crc32_combine, Crc32CombineOp};

    // ---------------------------------------------------------------
    // Helper: generate diverse test vectors
    // ---------------------------------------------------------------

    /// Deterministic pseudo-random bytes (xorshift32).
    fn data_noise(n: usize, seed: u32) -> Vec<u8> {
        let mut x = seed | 1;
        (0..n)
            .map(|_| {
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                x as u8
            })
            .collect()
    }

    fn data_repeating_text() -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. ".repeat(100)
    }

    fn data_sawtooth(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 256) as u8).collect()
    }

    fn corpus() -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            vec![0u8],
            vec![0u8; 1000],
            vec![0xFFu8; 5553],
            data_noise(777, 7),
            data_repeating_text(),
            data_sawtooth(4096),
        ]
    }

    // ---------------------------------------------------------------
    // 1. Identity
    // ---------------------------------------------------------------

    #[test]
    fn test_identity_every_pair() {
        let corpus = corpus();
        for a in &corpus {
            for b in &corpus {
                let mut whole = a.clone();
                whole.extend_from_slice(b);
                let n = b.len() as u64;
                assert_eq!(crc32_combine(crc32(a), crc32(b), n), crc32(&whole));
                assert_eq!(adler32_combine(adler32(a), adler32(b), n), adler32(&whole));
            }
        }
    }

    #[test]
    fn test_identity_all_splits() {
        let data = data_noise(300, 0x5EED);
        let (crc, adler) = (crc32(&data), adler32(&data));
        for split in 0..=data.len() {
            let (a, b) = data.split_at(split);
            let n = b.len() as u64;
            assert_eq!(crc32_combine(crc32(a), crc32(b), n), crc, "crc split {split}");
            assert_eq!(
                adler32_combine(adler32(a), adler32(b), n),
                adler,
                "adler split {split}"
            );
        }
    }

    // ---------------------------------------------------------------
    // 2. Associativity
    // ---------------------------------------------------------------

    #[test]
    fn test_associativity_three_way_splits() {
        let data = data_repeating_text();
        let data = &data[..97];
        for i in 0..=data.len() {
            for j in (i..=data.len()).step_by(7) {
                let (a, b, c) = (&data[..i], &data[i..j], &data[j..]);
                let (lb, lc) = (b.len() as u64, c.len() as u64);

                let left = crc32_combine(crc32_combine(crc32(a), crc32(b), lb), crc32(c), lc);
                let right = crc32_combine(crc32(a), crc32_combine(crc32(b), crc32(c), lc), lb + lc);
                assert_eq!(left, right);
                assert_eq!(left, crc32(data));

                let left = adler32_combine(adler32_combine(adler32(a), adler32(b), lb), adler32(c), lc);
                let right =
                    adler32_combine(adler32(a), adler32_combine(adler32(b), adler32(c), lc), lb + lc);
                assert_eq!(left, right);
                assert_eq!(left, adler32(data));
            }
        }
    }

    #[test]
    fn test_fixed_block_fold_with_operator() {
        // Fold equal-sized blocks with one precomputed operator.
        let data = data_sawtooth(64 * 37);
        let op = Crc32CombineOp::new(64);
        let folded = data
            .chunks(64)
            .fold(0u32, |acc, block| op.apply(acc, crc32(block)));
        assert_eq!(folded, crc32(&data));
    }

    // ---------------------------------------------------------------
    // 3. Determinism and range
    // ---------------------------------------------------------------

    #[test]
    fn test_determinism() {
        for _ in 0..3 {
            assert_eq!(crc32_combine(0x3524_41C2, 0x3B6D_8E59, 4), 0x312A_6AA6);
            assert_eq!(adler32_combine(0x024D_0127, adler32(b"defg"), 4), 0x0ADB_02BD);
        }
    }

    #[test]
    fn test_adler_halves_in_range() {
        let values = [0u32, 1, 0xFFF0_FFF0, 0xFFF1_FFF1, 0xFFFF_FFFF, 0x8000_8000];
        let lens = [0u64, 1, 65_520, 65_521, 65_522, u64::MAX];
        for &x in &values {
            for &y in &values {
                for &n in &lens {
                    let r = adler32_combine(x, y, n);
                    assert!(r & 0xFFFF < 65_521);
                    assert!(r >> 16 < 65_521);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // 4. Gzip splicing
    // ---------------------------------------------------------------

    #[test]
    fn test_inject_matches_concatenated_payload() {
        let inject = b"<!doctype html><script>console.warn(\"hi\")</script>\n";
        let body = data_repeating_text();

        let fragment = InjectFragment::new(
            stored_fragment(inject),
            crc32(inject),
            inject.len() as u32,
        );
        let member = stored_member(&body, 0, &[]);
        let out = gzip::inject(&fragment, &member).unwrap();

        let mut expected = inject.to_vec();
        expected.extend_from_slice(&body);

        let (_, data_offset) = gzip::parse_header(&out).unwrap();
        let trailer = GzipTrailer::parse(&out[out.len() - 8..]).unwrap();
        assert_eq!(unstore(&out[data_offset..out.len() - 8]), expected);
        assert_eq!(trailer.crc32, crc32(&expected));
        assert_eq!(trailer.isize, expected.len() as u32);
    }

    #[test]
    fn test_inject_compressed_fragment_decodes() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let inject = b"<!doctype html><script>console.warn(\"Hi Jack\")</script>\n";
        let body = data_repeating_text();

        let fragment = InjectFragment::from_payload(inject).unwrap();
        assert_eq!(fragment.crc32, crc32(inject));
        assert_eq!(fragment.isize, inject.len() as u32);

        let out = gzip::inject(&fragment, &stored_member(&body, 0, &[])).unwrap();

        let mut expected = inject.to_vec();
        expected.extend_from_slice(&body);
        let trailer = GzipTrailer::parse(&out[out.len() - 8..]).unwrap();
        assert_eq!(trailer.crc32, crc32(&expected));
        assert_eq!(trailer.isize, expected.len() as u32);

        // The decoder checks CRC32 and ISIZE against what it inflates.
        let mut decoded = Vec::new();
        GzDecoder::new(&out[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_inject_skips_optional_header_fields() {
        let inject = b"prefix";
        let body = b"body bytes";
        // FEXTRA | FNAME | FCOMMENT | FHCRC
        let mut optional = vec![3, 0, b'x', b'y', b'z'];
        optional.extend_from_slice(b"index.html\0");
        optional.extend_from_slice(b"a comment\0");
        optional.extend_from_slice(&[0xAB, 0xCD]);
        let member = stored_member(body, 0b1_1110, &optional);

        let fragment = InjectFragment::new(stored_fragment(inject), crc32(inject), 6);
        let out = gzip::inject(&fragment, &member).unwrap();

        assert_eq!(unstore(&out[10..out.len() - 8]), b"prefixbody bytes");
        let trailer = GzipTrailer::parse(&out[out.len() - 8..]).unwrap();
        assert_eq!(trailer.crc32, crc32(b"prefixbody bytes"));
        assert_eq!(trailer.isize, 16);
    }

    #[test]
    fn test_trailer_combine_matches_members() {
        let a = data_noise(1234, 3);
        let b = data_noise(4321, 4);
        let ta = GzipTrailer::parse(&stored_member(&a, 0, &[])[10 + 5 + a.len()..]).unwrap();
        let tb = GzipTrailer::parse(&stored_member(&b, 0, &[])[10 + 5 + b.len()..]).unwrap();
        let mut whole = a.clone();
        whole.extend_from_slice(&b);
        assert_eq!(
            ta.combine(&tb),
            GzipTrailer {
                crc32: crc32(&whole),
                isize: whole.len() as u32,
            }
        );
    }
}
