use bytes::{Bytes, BytesMut};

use crate::Error;

pub const HEADER_LEN: usize = 44;

const PCM_CODEC_TAG: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmSpec {
    pub fn bytes_per_second(&self) -> usize {
        self.sample_rate as usize * self.block_align()
    }

    pub fn block_align(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }
}

#[derive(Debug)]
pub struct ParsedWav<'a> {
    pub spec: PcmSpec,
    pub data: &'a [u8],
}

/// Walks the RIFF chunk list and returns the PCM spec plus the raw sample
/// region. Chunks other than `fmt ` and `data` (LIST, fact, ...) are skipped.
/// A `data` chunk whose declared size runs past the buffer is clipped to the
/// bytes actually present.
pub fn parse(buffer: &[u8]) -> Result<ParsedWav<'_>, Error> {
    if buffer.len() < 12 || &buffer[0..4] != b"RIFF" || &buffer[8..12] != b"WAVE" {
        return Err(Error::NotWav);
    }

    let mut spec: Option<PcmSpec> = None;
    let mut offset = 12;

    while offset + 8 <= buffer.len() {
        let id: [u8; 4] = buffer[offset..offset + 4].try_into().unwrap_or([0; 4]);
        let size =
            u32::from_le_bytes(buffer[offset + 4..offset + 8].try_into().unwrap_or([0; 4]))
                as usize;
        let body = offset + 8;

        match &id {
            b"fmt " => {
                if body + 16 > buffer.len() {
                    return Err(Error::TruncatedChunk("fmt "));
                }
                spec = Some(parse_fmt(&buffer[body..body + 16])?);
            }
            b"data" => {
                let spec = spec.ok_or(Error::MissingChunk("fmt "))?;
                let end = (body + size).min(buffer.len());
                return Ok(ParsedWav {
                    spec,
                    data: &buffer[body..end],
                });
            }
            _ => {}
        }

        // RIFF chunks are word aligned; odd sizes carry a pad byte.
        offset = body + size + (size & 1);
    }

    Err(Error::MissingChunk(if spec.is_none() { "fmt " } else { "data" }))
}

fn parse_fmt(body: &[u8]) -> Result<PcmSpec, Error> {
    let codec = u16::from_le_bytes([body[0], body[1]]);
    if codec != PCM_CODEC_TAG {
        return Err(Error::UnsupportedCodec(codec));
    }

    let channels = u16::from_le_bytes([body[2], body[3]]);
    if channels == 0 {
        return Err(Error::UnsupportedChannelCount { count: channels });
    }

    let sample_rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
    if sample_rate == 0 {
        return Err(Error::InvalidSampleRate(sample_rate));
    }

    let bits_per_sample = u16::from_le_bytes([body[14], body[15]]);
    if bits_per_sample != 16 {
        return Err(Error::UnsupportedBitDepth(bits_per_sample));
    }

    Ok(PcmSpec {
        sample_rate,
        channels,
        bits_per_sample,
    })
}

/// Canonical 44-byte header with the RIFF size (bytes 4..8) and data size
/// (bytes 40..44) reflecting `data_len`.
pub fn header_for(spec: PcmSpec, data_len: u32) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_CODEC_TAG.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&(spec.bytes_per_second() as u32).to_le_bytes());
    header[32..34].copy_from_slice(&(spec.block_align() as u16).to_le_bytes());
    header[34..36].copy_from_slice(&spec.bits_per_sample.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

pub fn with_header(spec: PcmSpec, data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(HEADER_LEN + data.len());
    out.extend_from_slice(&header_for(spec, data.len() as u32));
    out.extend_from_slice(data);
    out.freeze()
}
