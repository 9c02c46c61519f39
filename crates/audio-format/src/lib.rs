const SNIFF_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
pub enum AudioFormat {
    #[strum(serialize = "linear16")]
    Linear16,
    #[strum(serialize = "mp3")]
    Mp3,
    #[strum(serialize = "ogg_opus")]
    OggOpus,
    #[strum(serialize = "flac")]
    Flac,
    #[strum(serialize = "webm")]
    WebmContainer,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl AudioFormat {
    pub fn default_sample_rate(&self) -> u32 {
        match self {
            Self::Linear16 | Self::Unknown => 16000,
            Self::OggOpus | Self::WebmContainer => 48000,
            Self::Mp3 | Self::Flac => 44100,
        }
    }

    /// Formats whose duration cannot be derived from byte length alone.
    pub fn is_compressed(&self) -> bool {
        matches!(
            self,
            Self::Mp3 | Self::OggOpus | Self::Flac | Self::WebmContainer
        )
    }
}

/// Classifies a buffer by its leading bytes. Only the first 16 bytes are
/// inspected; the extension hint is consulted only when no signature matches.
pub fn detect(data: &[u8], extension_hint: Option<&str>) -> AudioFormat {
    let head = &data[..data.len().min(SNIFF_LEN)];

    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return AudioFormat::WebmContainer;
    }
    if head.starts_with(b"RIFF") && head.len() >= 12 && &head[8..12] == b"WAVE" {
        return AudioFormat::Linear16;
    }
    if head.starts_with(b"OggS") {
        return AudioFormat::OggOpus;
    }
    if head.starts_with(b"ID3") || is_mpeg_frame_sync(head) {
        return AudioFormat::Mp3;
    }
    if head.starts_with(b"fLaC") {
        return AudioFormat::Flac;
    }

    match extension_hint {
        Some(ext) => from_extension(ext),
        None => AudioFormat::Unknown,
    }
}

pub fn from_extension(extension: &str) -> AudioFormat {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "wav" | "wave" => AudioFormat::Linear16,
        "mp3" => AudioFormat::Mp3,
        "ogg" | "opus" => AudioFormat::OggOpus,
        "flac" => AudioFormat::Flac,
        "webm" => AudioFormat::WebmContainer,
        _ => AudioFormat::Unknown,
    }
}

fn is_mpeg_frame_sync(head: &[u8]) -> bool {
    head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0
}
