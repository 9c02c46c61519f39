use bytes::Bytes;
use notula_audio_format::AudioFormat;

mod error;
mod pcm;
pub mod wav;

pub use error::*;
pub use pcm::*;
pub use wav::{HEADER_LEN, PcmSpec};

const DEFAULT_CHUNK_SECONDS: u32 = 58;
// ~128 kbps nominal bitrate for variable-bitrate sources.
const DEFAULT_COMPRESSED_BYTES_PER_SEC: usize = 16_000;

#[derive(Debug, Clone)]
pub struct ChunkPolicy {
    pub chunk_seconds: u32,
    pub compressed_bytes_per_sec: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_seconds: DEFAULT_CHUNK_SECONDS,
            compressed_bytes_per_sec: DEFAULT_COMPRESSED_BYTES_PER_SEC,
        }
    }
}

impl ChunkPolicy {
    pub fn pcm_chunk_bytes(&self, spec: PcmSpec) -> usize {
        let raw = spec.bytes_per_second() * self.chunk_seconds as usize;
        let align = spec.block_align().max(1);
        (raw - raw % align).max(align)
    }

    pub fn compressed_chunk_bytes(&self) -> usize {
        (self.compressed_bytes_per_sec * self.chunk_seconds as usize).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub index: usize,
    pub payload: Bytes,
    pub start_secs: f64,
    pub duration_secs: f64,
    header_len: usize,
}

impl AudioChunk {
    /// Sample region of the payload, excluding any synthesized header.
    pub fn data(&self) -> &[u8] {
        &self.payload[self.header_len.min(self.payload.len())..]
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[derive(Debug)]
pub struct ChunkedAudio {
    pub chunks: Vec<AudioChunk>,
    pub format: AudioFormat,
    /// Known only when the input carried a parseable WAV header.
    pub spec: Option<PcmSpec>,
}

/// Splits a buffer into provider-sized chunks. PCM input is split exactly on
/// frame boundaries with a rewritten header per chunk; compressed input is
/// split on an estimated byte budget; unrecognized input goes out whole.
pub fn split(data: &Bytes, format: AudioFormat, policy: &ChunkPolicy) -> ChunkedAudio {
    let chunked = match format {
        AudioFormat::Linear16 => match wav::parse(data) {
            Ok(parsed) => split_pcm(&parsed, policy),
            Err(err) => {
                tracing::warn!(%err, "wav_parse_failed_sending_single_chunk");
                single_chunk(data.clone(), format)
            }
        },
        AudioFormat::Unknown => single_chunk(data.clone(), format),
        _ => split_estimated(data, format, policy),
    };

    tracing::debug!(
        format = %chunked.format,
        chunks = chunked.chunks.len(),
        bytes = data.len(),
        "audio_chunked"
    );

    chunked
}

fn split_pcm(parsed: &wav::ParsedWav<'_>, policy: &ChunkPolicy) -> ChunkedAudio {
    let spec = parsed.spec;
    let bytes_per_sec = spec.bytes_per_second() as f64;
    let budget = policy.pcm_chunk_bytes(spec);
    let total = parsed.data.len();

    let mut chunks = Vec::with_capacity(total / budget + 1);
    let mut offset = 0;

    loop {
        let end = (offset + budget).min(total);
        let slice = &parsed.data[offset..end];
        chunks.push(AudioChunk {
            index: chunks.len(),
            payload: wav::with_header(spec, slice),
            start_secs: offset as f64 / bytes_per_sec,
            duration_secs: slice.len() as f64 / bytes_per_sec,
            header_len: wav::HEADER_LEN,
        });
        offset = end;
        if offset >= total {
            break;
        }
    }

    ChunkedAudio {
        chunks,
        format: AudioFormat::Linear16,
        spec: Some(spec),
    }
}

fn split_estimated(data: &Bytes, format: AudioFormat, policy: &ChunkPolicy) -> ChunkedAudio {
    let budget = policy.compressed_chunk_bytes();
    let bytes_per_sec = policy.compressed_bytes_per_sec.max(1) as f64;
    let total = data.len();

    let mut chunks = Vec::with_capacity(total / budget + 1);
    let mut offset = 0;

    loop {
        let end = (offset + budget).min(total);
        chunks.push(AudioChunk {
            index: chunks.len(),
            payload: data.slice(offset..end),
            start_secs: offset as f64 / bytes_per_sec,
            duration_secs: (end - offset) as f64 / bytes_per_sec,
            header_len: 0,
        });
        offset = end;
        if offset >= total {
            break;
        }
    }

    ChunkedAudio {
        chunks,
        format,
        spec: None,
    }
}

fn single_chunk(data: Bytes, format: AudioFormat) -> ChunkedAudio {
    let chunk = AudioChunk {
        index: 0,
        payload: data,
        start_secs: 0.0,
        duration_secs: 0.0,
        header_len: 0,
    };

    ChunkedAudio {
        chunks: vec![chunk],
        format,
        spec: None,
    }
}
