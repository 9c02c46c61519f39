use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use notula_audio_format::AudioFormat;

use crate::error::Error;

pub type TranscodeFuture<'a> = Pin<Box<dyn Future<Output = Result<Bytes, Error>> + Send + 'a>>;

/// Boundary to an external audio converter.
///
/// Compressed formats can only be split on estimated byte budgets; converting
/// them to PCM first buys exact, sample-aligned chunking. Implementations
/// typically shell out to a converter binary, which is why the call is
/// asynchronous and fallible.
pub trait Transcoder: Send + Sync {
    fn supports(&self, format: AudioFormat) -> bool;

    /// Converts the buffer to a 16-bit PCM mono WAV at `target_rate`.
    fn to_linear16<'a>(
        &'a self,
        audio: &'a [u8],
        format: AudioFormat,
        target_rate: u32,
    ) -> TranscodeFuture<'a>;
}

/// Default transcoder: declines every format, so compressed audio keeps
/// flowing through estimated chunking untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranscoder;

impl Transcoder for NoTranscoder {
    fn supports(&self, _format: AudioFormat) -> bool {
        false
    }

    fn to_linear16<'a>(
        &'a self,
        _audio: &'a [u8],
        format: AudioFormat,
        _target_rate: u32,
    ) -> TranscodeFuture<'a> {
        Box::pin(async move {
            Err(Error::Transcode(format!(
                "no transcoder available for {format}"
            )))
        })
    }
}
