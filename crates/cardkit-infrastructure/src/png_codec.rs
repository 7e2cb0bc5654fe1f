//! PNG metadata codec.
//!
//! Character cards embed their JSON payload as a base64-encoded `tEXt` chunk
//! (`ccv3` for current cards, `chara` for legacy ones) inside an otherwise
//! ordinary PNG. This codec works purely at the container chunk level: it
//! never touches pixel data, it only locates, strips, and splices metadata
//! chunks.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use cardkit_core::card::{CardEnvelope, RawEnvelope, SPEC_V2, SPEC_V3};
use cardkit_core::codec::{CardCodec, DecodedCard};
use cardkit_core::error::{CardError, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

const CHUNK_TEXT: [u8; 4] = *b"tEXt";
const CHUNK_IEND: [u8; 4] = *b"IEND";

const KEYWORD_V3: &[u8] = b"ccv3";
const KEYWORD_V2: &[u8] = b"chara";

/// Metadata codec over PNG byte streams.
#[derive(Debug, Default)]
pub struct PngCardCodec;

impl PngCardCodec {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CardCodec for PngCardCodec {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedCard> {
        let chunks = parse_chunks(bytes)?;

        let mut v3_payload = None;
        let mut v2_payload = None;
        for chunk in &chunks {
            if chunk.kind != CHUNK_TEXT {
                continue;
            }
            match text_keyword(chunk.data) {
                Some((keyword, text)) if keyword == KEYWORD_V3 => v3_payload = Some(text),
                Some((keyword, text)) if keyword == KEYWORD_V2 => v2_payload = Some(text),
                _ => {}
            }
        }

        // A card may carry both chunks; the v3 payload is authoritative.
        let (payload, fallback_spec, fallback_version) = match (v3_payload, v2_payload) {
            (Some(text), _) => (text, SPEC_V3, "3.0"),
            (None, Some(text)) => (text, SPEC_V2, "2.0"),
            (None, None) => {
                return Err(CardError::decode(
                    "no embedded character card metadata found",
                ));
            }
        };

        let json = STANDARD
            .decode(payload)
            .map_err(|e| CardError::decode(format!("metadata chunk is not valid base64: {e}")))?;
        let json = String::from_utf8(json)
            .map_err(|e| CardError::decode(format!("metadata chunk is not valid UTF-8: {e}")))?;
        let envelope = RawEnvelope::parse(&json)
            .map_err(|e| CardError::decode(format!("metadata payload is not a card: {e}")))?;

        Ok(DecodedCard {
            card: envelope.data.unwrap_or_default(),
            avatar: Some(to_data_url(bytes)),
            spec: envelope.spec.unwrap_or_else(|| fallback_spec.to_string()),
            spec_version: envelope
                .spec_version
                .unwrap_or_else(|| fallback_version.to_string()),
        })
    }

    async fn encode(&self, envelope: &CardEnvelope, avatar: Option<&str>) -> Result<Vec<u8>> {
        let container = match avatar {
            Some(url) => data_url_bytes(url)?,
            None => placeholder_png(),
        };
        let chunks = parse_chunks(&container)?;

        let payload = STANDARD.encode(serde_json::to_string(envelope)?);

        let mut out = Vec::with_capacity(container.len() + payload.len() * 2 + 64);
        out.extend_from_slice(&PNG_SIGNATURE);
        for chunk in &chunks {
            // Stale metadata chunks are dropped; fresh ones go in before IEND.
            if chunk.kind == CHUNK_TEXT
                && matches!(text_keyword(chunk.data), Some((k, _)) if k == KEYWORD_V3 || k == KEYWORD_V2)
            {
                continue;
            }
            if chunk.kind == CHUNK_IEND {
                write_text_chunk(&mut out, KEYWORD_V3, payload.as_bytes());
                write_text_chunk(&mut out, KEYWORD_V2, payload.as_bytes());
            }
            write_chunk(&mut out, &chunk.kind, chunk.data);
        }

        Ok(out)
    }
}

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
}

/// Walks the chunk stream. CRCs are not verified on read; only structural
/// bounds are.
fn parse_chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..8] != PNG_SIGNATURE {
        return Err(CardError::decode("not a PNG image"));
    }

    let mut chunks = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    while offset + 8 <= bytes.len() {
        let length =
            u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
                as usize;
        let kind = [
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ];
        let data_start = offset + 8;
        let Some(crc_end) = data_start.checked_add(length).and_then(|e| e.checked_add(4)) else {
            return Err(CardError::decode("corrupt PNG chunk length"));
        };
        if crc_end > bytes.len() {
            return Err(CardError::decode("truncated PNG chunk"));
        }
        chunks.push(Chunk {
            kind,
            data: &bytes[data_start..data_start + length],
        });
        offset = crc_end;
        if kind == CHUNK_IEND {
            break;
        }
    }

    if !chunks.iter().any(|c| c.kind == CHUNK_IEND) {
        return Err(CardError::decode("PNG stream has no IEND chunk"));
    }
    Ok(chunks)
}

/// Splits a tEXt chunk into its NUL-separated keyword and text.
fn text_keyword(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = data.iter().position(|&b| b == 0)?;
    Some((&data[..nul], &data[nul + 1..]))
}

fn write_text_chunk(out: &mut Vec<u8>, keyword: &[u8], text: &[u8]) {
    let mut data = Vec::with_capacity(keyword.len() + 1 + text.len());
    data.extend_from_slice(keyword);
    data.push(0);
    data.extend_from_slice(text);
    write_chunk(out, &CHUNK_TEXT, &data);
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc32(&[kind, data]).to_be_bytes());
}

fn data_url_bytes(url: &str) -> Result<Vec<u8>> {
    let (_, payload) = url
        .split_once(";base64,")
        .ok_or_else(|| CardError::decode("avatar is not a base64 data URL"))?;
    STANDARD
        .decode(payload)
        .map_err(|e| CardError::decode(format!("avatar data URL is not valid base64: {e}")))
}

fn to_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// A minimal 1x1 grayscale PNG used as the container when no avatar exists.
/// The IDAT holds a stored (uncompressed) zlib block, so no deflate
/// implementation is needed.
fn placeholder_png() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&PNG_SIGNATURE);

    // width 1, height 1, bit depth 8, color type 0 (grayscale)
    let ihdr = [0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0];
    write_chunk(&mut out, b"IHDR", &ihdr);

    // Raw scanline: filter byte 0 + one black pixel. Wrapped in a stored
    // deflate block; adler32 of [0, 0] is 0x0002_0001.
    let idat = [
        0x78, 0x01, // zlib header
        0x01, 0x02, 0x00, 0xFD, 0xFF, // stored block, len 2
        0x00, 0x00, // scanline
        0x00, 0x02, 0x00, 0x01, // adler32
    ];
    write_chunk(&mut out, b"IDAT", &idat);

    write_chunk(&mut out, b"IEND", &[]);
    out
}

// CRC-32 (ISO 3309) as required by the PNG chunk format. No crate in the
// dependency stack provides it, so the table lives here.

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

fn crc32(parts: &[&[u8]]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for part in parts {
        for &byte in *part {
            c = CRC_TABLE[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
        }
    }
    c ^ 0xFFFF_FFFF
}
