pub const DEFAULT_SAMPLE_RATE_HERTZ: u32 = 16000;
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
/// Provider model favoring short-utterance accuracy.
pub const DEFAULT_MODEL: &str = "default";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    #[strum(serialize = "ENCODING_UNSPECIFIED")]
    EncodingUnspecified,
    #[strum(serialize = "LINEAR16")]
    Linear16,
    #[strum(serialize = "FLAC")]
    Flac,
    #[strum(serialize = "MP3")]
    Mp3,
    #[strum(serialize = "OGG_OPUS")]
    OggOpus,
    #[strum(serialize = "WEBM_OPUS")]
    WebmOpus,
}

impl Default for AudioEncoding {
    fn default() -> Self {
        Self::Linear16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiarizationConfig {
    pub enable_speaker_diarization: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_speaker_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speaker_count: Option<u32>,
}

/// The provider's `config` object, serialized field for field. Anything the
/// pipeline needs that the provider must not see lives elsewhere.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: u32,
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_channel_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub enable_automatic_punctuation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarization_config: Option<DiarizationConfig>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_word_time_offsets: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_word_confidence: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::default(),
            sample_rate_hertz: DEFAULT_SAMPLE_RATE_HERTZ,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            audio_channel_count: None,
            model: Some(DEFAULT_MODEL.to_string()),
            enable_automatic_punctuation: true,
            diarization_config: None,
            enable_word_time_offsets: false,
            enable_word_confidence: false,
        }
    }
}

impl RecognitionConfig {
    pub fn diarization_enabled(&self) -> bool {
        self.diarization_config
            .map(|d| d.enable_speaker_diarization)
            .unwrap_or(false)
    }
}

fn is_false(value: &bool) -> bool {
    !value
}
