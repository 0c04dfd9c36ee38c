//! C-callable FFI layer for pzcombine.
//!
//! Exposes the two combine primitives with plain fixed-width integer
//! arguments, plus gzip fragment injection over caller-owned buffers.
//! Lengths are always 64-bit, whatever the platform's `size_t`.

use std::slice;

use crate::gzip::{self, InjectFragment};

// Error codes matching the C API design
const PZ_OK: i32 = 0;
const PZ_ERROR_BUFFER_TOO_SMALL: i32 = -1;
const PZ_ERROR_INVALID_INPUT: i32 = -2;
const PZ_ERROR_UNSUPPORTED: i32 = -3;

/// Convert a [`PzError`](crate::PzError) to an FFI error code.
fn error_to_code(e: crate::PzError) -> i32 {
    match e {
        crate::PzError::BufferTooSmall => PZ_ERROR_BUFFER_TOO_SMALL,
        crate::PzError::InvalidInput => PZ_ERROR_INVALID_INPUT,
        crate::PzError::Unsupported => PZ_ERROR_UNSUPPORTED,
    }
}

/// CRC32 of the concatenation of two ranges, from their CRCs and the
/// length of the second range.
#[no_mangle]
pub extern "C" fn pz_crc32_combine(crc1: u32, crc2: u32, len2: u64) -> u32 {
    crate::crc32::crc32_combine(crc1, crc2, len2)
}

/// Adler-32 of the concatenation of two ranges, from their checksums and
/// the length of the second range.
#[no_mangle]
pub extern "C" fn pz_adler32_combine(adler1: u32, adler2: u32, len2: u64) -> u32 {
    crate::adler32::adler32_combine(adler1, adler2, len2)
}

/// Splice a pre-compressed fragment in front of a gzip member.
///
/// `head` holds a gzip header plus flushed, non-final DEFLATE blocks whose
/// uncompressed bytes have CRC32 `head_crc` and length `head_isize`.
/// On success writes the spliced member to `output`, stores its length in
/// `*output_len` and returns `PZ_OK`. If `output_cap` is too small,
/// `*output_len` receives the required size and
/// `PZ_ERROR_BUFFER_TOO_SMALL` is returned.
///
/// # Safety
///
/// - `head` must point to at least `head_len` readable bytes.
/// - `member` must point to at least `member_len` readable bytes.
/// - `output` must point to at least `output_cap` writable bytes; they
///   need not be initialized. Only the first `*output_len` are written.
/// - `output_len` must point to a writable `usize`.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn pz_gzip_inject(
    head: *const u8,
    head_len: usize,
    head_crc: u32,
    head_isize: u32,
    member: *const u8,
    member_len: usize,
    output: *mut u8,
    output_cap: usize,
    output_len: *mut usize,
) -> i32 {
    if head.is_null() || member.is_null() || output.is_null() || output_len.is_null() {
        return PZ_ERROR_INVALID_INPUT;
    }

    let head_slice = slice::from_raw_parts(head, head_len);
    let member_slice = slice::from_raw_parts(member, member_len);
    let fragment = InjectFragment::new(head_slice.to_vec(), head_crc, head_isize);

    match gzip::inject(&fragment, member_slice) {
        Ok(spliced) => {
            *output_len = spliced.len();
            if spliced.len() > output_cap {
                return PZ_ERROR_BUFFER_TOO_SMALL;
            }
            let output_slice = slice::from_raw_parts_mut(output, spliced.len());
            output_slice.copy_from_slice(&spliced);
            PZ_OK
        }
        Err(e) => error_to_code(e),
    }
}
