/// Gzip trailer arithmetic and fragment injection (RFC 1952).
///
/// A gzip member ends with an 8-byte trailer holding the CRC32 and the
/// length (mod 2^32) of the uncompressed data. Because both combine
/// without the data, a byte-aligned run of non-final DEFLATE blocks can
/// be spliced in front of another member's body and the result patched
/// into a single valid member, with no recompression.
use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;

use crate::crc32::crc32_combine;
use crate::{PzError, PzResult};

/// Gzip magic bytes.
const GZIP_ID1: u8 = 0x1F;
const GZIP_ID2: u8 = 0x8B;

/// Compression method: deflate.
const CM_DEFLATE: u8 = 8;

/// Flag bits in the FLG byte.
const FTEXT: u8 = 1 << 0;
const FHCRC: u8 = 1 << 1;
const FEXTRA: u8 = 1 << 2;
const FNAME: u8 = 1 << 3;
const FCOMMENT: u8 = 1 << 4;

/// Fixed header plus trailer.
const MIN_MEMBER_LEN: usize = 18;
const FIXED_HEADER_LEN: usize = 10;
pub const TRAILER_LEN: usize = 8;

/// Parsed gzip header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GzipHeader {
    /// Compression method (always 8 = deflate for gzip).
    pub method: u8,
    /// Whether the file is probably ASCII text (FTEXT flag).
    pub is_text: bool,
    /// Modification time as Unix timestamp (0 = not set).
    pub mtime: u32,
    /// Extra flags (XFL): 2 = max compression, 4 = fastest.
    pub extra_flags: u8,
    /// Raw OS byte (3 = Unix, 255 = unknown).
    pub os: u8,
    pub extra: Option<Vec<u8>>,
    /// Original filename (Latin-1, zero-terminated in file).
    pub filename: Option<String>,
    pub comment: Option<String>,
    /// Header CRC16 (lower 16 bits of CRC32 of header).
    pub header_crc: Option<u16>,
}

/// Gzip trailer: CRC32 and ISIZE of the uncompressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GzipTrailer {
    pub crc32: u32,
    /// Size of the original uncompressed data (mod 2^32).
    pub isize: u32,
}

impl GzipTrailer {
    /// Parse a trailer from the first 8 bytes of `data`.
    pub fn parse(data: &[u8]) -> PzResult<Self> {
        Ok(Self {
            crc32: read_u32_le(data, 0)?,
            isize: read_u32_le(data, 4)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; TRAILER_LEN] {
        let mut out = [0u8; TRAILER_LEN];
        out[..4].copy_from_slice(&self.crc32.to_le_bytes());
        out[4..].copy_from_slice(&self.isize.to_le_bytes());
        out
    }

    /// Trailer of `self`'s payload followed by `next`'s payload.
    ///
    /// ISIZE only records the length mod 2^32, so the CRC is exact only
    /// when `next` covers fewer than 4 GiB of uncompressed data.
    pub fn combine(&self, next: &GzipTrailer) -> GzipTrailer {
        GzipTrailer {
            crc32: crc32_combine(self.crc32, next.crc32, u64::from(next.isize)),
            isize: self.isize.wrapping_add(next.isize),
        }
    }
}

/// A pre-compressed piece to splice in front of a gzip member.
///
/// `head` is a gzip header followed by non-final DEFLATE blocks that end
/// on a byte boundary (what a compressor emits after a sync or full
/// flush, before it is finished). `crc32` and `isize` describe the
/// uncompressed bytes those blocks decode to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectFragment {
    pub head: Vec<u8>,
    pub crc32: u32,
    pub isize: u32,
}

impl InjectFragment {
    pub fn new(head: Vec<u8>, crc32: u32, isize: u32) -> Self {
        Self { head, crc32, isize }
    }

    /// Compress `payload` into a fragment.
    ///
    /// The encoder is sync-flushed and its output so far (header plus
    /// byte-aligned non-final blocks) becomes `head`. The encoder is then
    /// finished only to read the CRC32 and ISIZE back out of its trailer.
    pub fn from_payload(payload: &[u8]) -> PzResult<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(payload)
            .map_err(|_| PzError::InvalidInput)?;
        encoder.flush().map_err(|_| PzError::InvalidInput)?;
        let head = encoder.get_ref().clone();

        let member = encoder.finish().map_err(|_| PzError::InvalidInput)?;
        if member.len() < TRAILER_LEN {
            return Err(PzError::InvalidInput);
        }
        let trailer = GzipTrailer::parse(&member[member.len() - TRAILER_LEN..])?;
        debug!(
            "fragment: {} bytes -> {} byte head, crc {:#010x}",
            payload.len(),
            head.len(),
            trailer.crc32
        );
        Ok(Self::new(head, trailer.crc32, trailer.isize))
    }

    pub fn trailer(&self) -> GzipTrailer {
        GzipTrailer {
            crc32: self.crc32,
            isize: self.isize,
        }
    }
}

/// Check if data starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == GZIP_ID1 && data[1] == GZIP_ID2
}

fn read_u16_le(data: &[u8], offset: usize) -> PzResult<u16> {
    match data.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_le_bytes([b[0], b[1]])),
        None => Err(PzError::InvalidInput),
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> PzResult<u32> {
    match data.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(PzError::InvalidInput),
    }
}

/// Read a zero-terminated Latin-1 string at `offset`; returns it and the
/// offset just past the terminator.
fn read_cstr(data: &[u8], offset: usize) -> PzResult<(String, usize)> {
    let rest = data.get(offset..).ok_or(PzError::InvalidInput)?;
    let len = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(PzError::InvalidInput)?;
    let s = rest[..len].iter().map(|&b| b as char).collect();
    Ok((s, offset + len + 1))
}

/// Parse gzip header fields from `data`.
/// Returns the header and the byte offset where compressed data begins.
pub fn parse_header(data: &[u8]) -> PzResult<(GzipHeader, usize)> {
    if data.len() < MIN_MEMBER_LEN || !is_gzip(data) {
        return Err(PzError::InvalidInput);
    }

    let method = data[2];
    if method != CM_DEFLATE {
        return Err(PzError::Unsupported);
    }

    let flg = data[3];
    let mut pos = FIXED_HEADER_LEN;

    let extra = if flg & FEXTRA != 0 {
        let xlen = read_u16_le(data, pos)? as usize;
        pos += 2;
        let field = data.get(pos..pos + xlen).ok_or(PzError::InvalidInput)?;
        pos += xlen;
        Some(field.to_vec())
    } else {
        None
    };

    let filename = if flg & FNAME != 0 {
        let (name, next) = read_cstr(data, pos)?;
        pos = next;
        Some(name)
    } else {
        None
    };

    let comment = if flg & FCOMMENT != 0 {
        let (cmt, next) = read_cstr(data, pos)?;
        pos = next;
        Some(cmt)
    } else {
        None
    };

    let header_crc = if flg & FHCRC != 0 {
        let crc = read_u16_le(data, pos)?;
        pos += 2;
        Some(crc)
    } else {
        None
    };

    let header = GzipHeader {
        method,
        is_text: flg & FTEXT != 0,
        mtime: read_u32_le(data, 4)?,
        extra_flags: data[8],
        os: data[9],
        extra,
        filename,
        comment,
        header_crc,
    };

    Ok((header, pos))
}

/// Read the trailer of a single gzip member, checking its header first.
pub fn member_trailer(member: &[u8]) -> PzResult<GzipTrailer> {
    let (_, data_offset) = parse_header(member)?;
    if member.len() < data_offset + TRAILER_LEN {
        return Err(PzError::InvalidInput);
    }
    GzipTrailer::parse(&member[member.len() - TRAILER_LEN..])
}

/// Splice `fragment` in front of the body of `member`.
///
/// The output is `fragment.head`, then `member`'s DEFLATE data with its
/// header and trailer removed, then a trailer covering both payloads.
/// `member` must be a single gzip member; anything after its trailer
/// would be taken as compressed data.
pub fn inject(fragment: &InjectFragment, member: &[u8]) -> PzResult<Vec<u8>> {
    if fragment.head.len() < FIXED_HEADER_LEN || !is_gzip(&fragment.head) {
        return Err(PzError::InvalidInput);
    }

    let (header, data_offset) = parse_header(member)?;
    if let Some(extra) = &header.extra {
        debug!("FEXTRA len: {}", extra.len());
    }
    if let Some(name) = &header.filename {
        debug!("FNAME: {name}");
    }
    if let Some(comment) = &header.comment {
        debug!("FCOMMENT: {comment}");
    }
    if header.header_crc.is_some() {
        debug!("FHCRC");
    }

    if member.len() < data_offset + TRAILER_LEN {
        return Err(PzError::InvalidInput);
    }
    let trailer_offset = member.len() - TRAILER_LEN;
    let trailer = GzipTrailer::parse(&member[trailer_offset..])?;
    let combined = fragment.trailer().combine(&trailer);
    debug!(
        "crc {:#010x} -> {:#010x}, isize {} -> {}",
        trailer.crc32, combined.crc32, trailer.isize, combined.isize
    );

    let body = &member[data_offset..trailer_offset];
    let mut out = Vec::with_capacity(fragment.head.len() + body.len() + TRAILER_LEN);
    out.extend_from_slice(&fragment.head);
    out.extend_from_slice(body);
    out.extend_from_slice(&combined.to_bytes());
    Ok(out)
}
