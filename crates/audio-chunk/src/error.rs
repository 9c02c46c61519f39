#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("buffer is not a riff/wave file")]
    NotWav,
    #[error("wav is missing the `{0}` chunk")]
    MissingChunk(&'static str),
    #[error("wav `{0}` chunk is truncated")]
    TruncatedChunk(&'static str),
    #[error("unsupported wav codec tag {0}, expected pcm")]
    UnsupportedCodec(u16),
    #[error("unsupported bit depth {0}, expected 16")]
    UnsupportedBitDepth(u16),
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("unsupported channel count: {count}")]
    UnsupportedChannelCount { count: u16 },
}
