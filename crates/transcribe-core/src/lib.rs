mod error;
mod options;
mod outcome;
mod transcode;

pub use error::{Error, format_user_friendly_error};
pub use options::{DEFAULT_INTER_CHUNK_DELAY, DiarizationOptions, TranscribeOptions};
pub use outcome::{ChunkFailure, ChunkOutcome, TranscriptionResult, TranscriptionStatus};
pub use transcode::{NoTranscoder, TranscodeFuture, Transcoder};

pub use notula_audio_chunk::ChunkPolicy;
pub use notula_audio_format::AudioFormat;
pub use notula_speech_client::{PollPolicy, RetryPolicy};
pub use notula_transcript::Speaker;

use std::time::Instant;

use bytes::Bytes;
use notula_audio_chunk::{DEFAULT_GAIN, PcmSpec, boost_gain, wav};
use notula_speech_client::RecognizeClient;
use notula_speech_interface::{
    AudioEncoding, DEFAULT_SAMPLE_RATE_HERTZ, DiarizationConfig, RawRecognitionResult,
    RecognitionConfig,
};
use notula_transcript::{SpeakerRegistry, reconstruct, reconstruct_with};
use tracing::Instrument;

pub const NO_SPEECH_MESSAGE: &str = "No speech detected";

/// Whole-file transcription pipeline: sniff the format, split the audio into
/// provider-sized chunks, recognize them in order, and assemble one
/// timestamped transcript.
pub struct Transcriber<T = NoTranscoder> {
    client: RecognizeClient,
    transcoder: T,
}

pub struct TranscriberBuilder<T = NoTranscoder> {
    api_base: Option<String>,
    api_key: Option<String>,
    retry: Option<RetryPolicy>,
    poll: Option<PollPolicy>,
    transcoder: T,
}

impl Default for TranscriberBuilder {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            retry: None,
            poll: None,
            transcoder: NoTranscoder,
        }
    }
}

impl<T: Transcoder> TranscriberBuilder<T> {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn poll(mut self, poll: PollPolicy) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn transcoder<U: Transcoder>(self, transcoder: U) -> TranscriberBuilder<U> {
        TranscriberBuilder {
            api_base: self.api_base,
            api_key: self.api_key,
            retry: self.retry,
            poll: self.poll,
            transcoder,
        }
    }

    pub fn build(self) -> Transcriber<T> {
        let mut client = RecognizeClient::builder();
        if let Some(api_base) = self.api_base {
            client = client.api_base(api_base);
        }
        if let Some(api_key) = self.api_key {
            client = client.api_key(api_key);
        }
        if let Some(retry) = self.retry {
            client = client.retry(retry);
        }
        if let Some(poll) = self.poll {
            client = client.poll(poll);
        }

        Transcriber {
            client: client.build(),
            transcoder: self.transcoder,
        }
    }
}

impl Transcriber {
    pub fn builder() -> TranscriberBuilder {
        TranscriberBuilder::default()
    }
}

impl<T: Transcoder> Transcriber<T> {
    /// Transcribes one recording end to end.
    ///
    /// Terminal recognition errors (credentials, rejected request) abort the
    /// whole run with `Err`. Per-chunk failures are recorded in the result
    /// instead, so one bad chunk costs its own text and nothing else.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        options: &TranscribeOptions,
    ) -> Result<TranscriptionResult, Error> {
        if audio.is_empty() {
            return Err(Error::EmptyAudio);
        }

        let span = request_span(uuid::Uuid::new_v4());
        self.run(audio, options).instrument(span).await
    }

    async fn run(
        &self,
        mut audio: Bytes,
        options: &TranscribeOptions,
    ) -> Result<TranscriptionResult, Error> {
        let hint = options.filename_hint.as_deref().and_then(extension_of);
        let mut format = notula_audio_format::detect(&audio, hint);
        tracing::info!(%format, hint, bytes = audio.len(), "audio_format_detected");

        if wants_pcm(&audio, format, options) && self.transcoder.supports(format) {
            let target_rate = options
                .sample_rate_hertz
                .unwrap_or(DEFAULT_SAMPLE_RATE_HERTZ);
            tracing::info!(%format, target_rate, "transcoding_to_linear16");

            match self.transcoder.to_linear16(&audio, format, target_rate).await {
                Ok(pcm) => {
                    audio = pcm;
                    format = AudioFormat::Linear16;
                }
                Err(err) => {
                    tracing::error!(error = %err, "transcode_failed");
                    return Ok(TranscriptionResult {
                        status: TranscriptionStatus::Failed,
                        text: String::new(),
                        speakers: Vec::new(),
                        errors: vec![ChunkFailure {
                            index: 0,
                            message: err.to_string(),
                        }],
                    });
                }
            }
        }

        if options.boost_audio && format == AudioFormat::Linear16 {
            if let Some(boosted) = boost_linear16(&audio) {
                audio = boosted;
            }
        }

        let chunked = notula_audio_chunk::split(&audio, format, &options.chunking);
        let config = recognition_config(options, chunked.format, chunked.spec);
        let total = chunked.chunks.len();

        let mut registry = options.speaker_context.map(SpeakerRegistry::new);
        let mut outcomes = Vec::with_capacity(total);
        let mut blocks: Vec<String> = Vec::new();
        let mut speakers: Vec<Speaker> = Vec::new();
        let mut errors: Vec<ChunkFailure> = Vec::new();

        for chunk in &chunked.chunks {
            if chunk.index > 0 {
                tokio::time::sleep(options.inter_chunk_delay).await;
            }

            tracing::info!(
                chunk = chunk.index + 1,
                of = total,
                bytes = chunk.len(),
                "chunk_recognition_started"
            );

            match self.client.recognize(&chunk.payload, &config).await {
                Ok(result) if result.is_no_speech() => {
                    tracing::info!(chunk = chunk.index + 1, of = total, "chunk_had_no_speech");
                    outcomes.push(ChunkOutcome::NoSpeech);
                }
                Ok(result) => {
                    let (block, roster) = render_chunk(
                        chunk.start_secs,
                        &result,
                        options.diarized(),
                        registry.as_mut(),
                    );
                    if let Some(block) = block {
                        blocks.push(block);
                    }
                    merge_speakers(&mut speakers, roster);
                    outcomes.push(ChunkOutcome::Success);
                }
                Err(err) if err.is_terminal() => {
                    tracing::error!(
                        chunk = chunk.index + 1,
                        of = total,
                        error = %err,
                        "transcription_aborted"
                    );
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!(
                        chunk = chunk.index + 1,
                        of = total,
                        error = %err,
                        "chunk_recognition_failed"
                    );
                    errors.push(ChunkFailure {
                        index: chunk.index,
                        message: err.to_string(),
                    });
                    outcomes.push(ChunkOutcome::Failed);
                }
            }
        }

        let status = TranscriptionStatus::from_outcomes(&outcomes);
        let text = if blocks.is_empty() && status == TranscriptionStatus::Complete {
            NO_SPEECH_MESSAGE.to_string()
        } else {
            blocks.join("\n\n")
        };

        tracing::info!(%status, chunks = total, failed = errors.len(), "transcription_finished");

        Ok(TranscriptionResult {
            status,
            text,
            speakers,
            errors,
        })
    }
}

fn request_span(request_id: uuid::Uuid) -> tracing::Span {
    tracing::info_span!("transcription", request_id = %request_id)
}

fn extension_of(filename: &str) -> Option<&str> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
}

/// Compressed audio is worth converting to PCM when chunk boundaries matter:
/// diarization needs clean word timing, and anything over one chunk budget
/// would otherwise be split at estimated byte offsets.
fn wants_pcm(audio: &Bytes, format: AudioFormat, options: &TranscribeOptions) -> bool {
    format.is_compressed()
        && (options.diarized() || audio.len() > options.chunking.compressed_chunk_bytes())
}

fn boost_linear16(audio: &Bytes) -> Option<Bytes> {
    match wav::parse(audio) {
        Ok(parsed) => {
            let mut data = parsed.data.to_vec();
            boost_gain(&mut data, DEFAULT_GAIN);
            Some(wav::with_header(parsed.spec, &data))
        }
        Err(err) => {
            tracing::warn!(%err, "gain_boost_skipped_unparseable_wav");
            None
        }
    }
}

fn recognition_config(
    options: &TranscribeOptions,
    format: AudioFormat,
    spec: Option<PcmSpec>,
) -> RecognitionConfig {
    let encoding = if options.force_linear16 {
        AudioEncoding::Linear16
    } else {
        wire_encoding(format)
    };

    let sample_rate_hertz = spec
        .map(|s| s.sample_rate)
        .or(options.sample_rate_hertz)
        .unwrap_or_else(|| format.default_sample_rate());

    let audio_channel_count = spec.and_then(|s| (s.channels > 1).then_some(s.channels as u32));

    let diarization_config = options.diarization.as_ref().map(|d| DiarizationConfig {
        enable_speaker_diarization: true,
        min_speaker_count: d.min_speakers,
        max_speaker_count: d.max_speakers,
    });
    let diarized = diarization_config.is_some();

    RecognitionConfig {
        encoding,
        sample_rate_hertz,
        language_code: options.language_code.clone(),
        audio_channel_count,
        model: options.model.clone(),
        enable_automatic_punctuation: options.punctuation,
        diarization_config,
        enable_word_time_offsets: diarized,
        enable_word_confidence: diarized,
    }
}

/// Encoding declared to the provider for each sniffed format. WebM input is
/// declared as `OGG_OPUS`: the provider decodes the embedded Opus stream
/// under that name.
fn wire_encoding(format: AudioFormat) -> AudioEncoding {
    match format {
        AudioFormat::Linear16 | AudioFormat::Unknown => AudioEncoding::Linear16,
        AudioFormat::Mp3 => AudioEncoding::Mp3,
        AudioFormat::OggOpus | AudioFormat::WebmContainer => AudioEncoding::OggOpus,
        AudioFormat::Flac => AudioEncoding::Flac,
    }
}

fn timestamp_marker(start_secs: f64) -> String {
    let total = start_secs.max(0.0) as u64;
    format!("[{:02}:{:02}]", total / 60, total % 60)
}

/// One chunk's contribution to the transcript: `None` when the chunk had
/// nothing to say, otherwise a timestamped block plus the speakers heard in
/// it.
fn render_chunk(
    start_secs: f64,
    result: &RawRecognitionResult,
    diarized: bool,
    registry: Option<&mut SpeakerRegistry>,
) -> (Option<String>, Vec<Speaker>) {
    let marker = timestamp_marker(start_secs);

    if diarized {
        let transcript = match registry {
            Some(registry) => {
                let tags = result.words.iter().filter_map(|w| w.speaker_tag);
                let map = registry.observe(tags, Instant::now());
                reconstruct_with(result, &map)
            }
            None => reconstruct(result),
        };

        if transcript.is_empty() {
            return (None, transcript.speakers);
        }

        return (
            Some(format!("{marker}\n{}", transcript.render())),
            transcript.speakers,
        );
    }

    let text = result.transcript.trim();
    if text.is_empty() {
        return (None, Vec::new());
    }

    (Some(format!("{marker} {text}")), Vec::new())
}

fn merge_speakers(merged: &mut Vec<Speaker>, roster: Vec<Speaker>) {
    for speaker in roster {
        if !merged.iter().any(|s| s.id == speaker.id) {
            merged.push(speaker);
        }
    }
    merged.sort_by_key(|s| s.id.parse::<u32>().unwrap_or(u32::MAX));
}
