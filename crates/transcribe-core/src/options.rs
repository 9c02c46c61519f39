use std::time::Duration;

use notula_audio_chunk::ChunkPolicy;
use notula_speech_interface::{DEFAULT_LANGUAGE_CODE, DEFAULT_MODEL};

pub const DEFAULT_INTER_CHUNK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiarizationOptions {
    pub min_speakers: Option<u32>,
    pub max_speakers: Option<u32>,
}

/// Caller-facing knobs for one transcription request.
///
/// The provider-facing `RecognitionConfig` is derived from these plus what
/// the sniffer and the WAV header reveal about the audio itself.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub language_code: String,
    /// Overrides the per-format default; a parsed WAV header wins over both.
    pub sample_rate_hertz: Option<u32>,
    pub model: Option<String>,
    pub punctuation: bool,
    /// `Some` turns speaker attribution on.
    pub diarization: Option<DiarizationOptions>,
    pub boost_audio: bool,
    /// Declare LINEAR16 to the provider regardless of what was sniffed.
    pub force_linear16: bool,
    /// Original filename, used as a detection hint when the bytes are
    /// inconclusive.
    pub filename_hint: Option<String>,
    /// Keep speaker IDs stable across chunks for this long.
    pub speaker_context: Option<Duration>,
    pub chunking: ChunkPolicy,
    pub inter_chunk_delay: Duration,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            sample_rate_hertz: None,
            model: Some(DEFAULT_MODEL.to_string()),
            punctuation: true,
            diarization: None,
            boost_audio: false,
            force_linear16: false,
            filename_hint: None,
            speaker_context: None,
            chunking: ChunkPolicy::default(),
            inter_chunk_delay: DEFAULT_INTER_CHUNK_DELAY,
        }
    }
}

impl TranscribeOptions {
    pub fn diarized(&self) -> bool {
        self.diarization.is_some()
    }
}
