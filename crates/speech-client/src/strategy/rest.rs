use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use notula_speech_interface::{RawRecognitionResult, RecognitionConfig, WordInfo, duration_secs};

use super::{RecognizeFuture, RecognizeStrategy, SYNC_RECOGNIZE_PATH, endpoint};
use crate::error::{classify_status, error_detail};

/// Synchronous recognition over the bare REST endpoint.
///
/// Second link in the chain. Sends the same request body as
/// [`StructuredSync`] but walks the response JSON by hand, taking whatever
/// fields are present instead of requiring the full documented shape.
///
/// [`StructuredSync`]: super::StructuredSync
#[derive(Debug, Default)]
pub struct DirectRest;

impl RecognizeStrategy for DirectRest {
    fn name(&self) -> &'static str {
        "direct_rest"
    }

    fn recognize<'a>(
        &'a self,
        http: &'a reqwest::Client,
        api_base: &'a str,
        api_key: &'a str,
        audio: &'a [u8],
        config: &'a RecognitionConfig,
    ) -> RecognizeFuture<'a> {
        Box::pin(async move {
            let url = endpoint(api_base, SYNC_RECOGNIZE_PATH, api_key)?;
            let body = serde_json::json!({
                "config": config,
                "audio": { "content": BASE64.encode(audio) },
            });

            let response = http
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&body)?)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if !status.is_success() {
                return Err(classify_status(status, error_detail(&text)));
            }

            let value: serde_json::Value = serde_json::from_str(&text)?;
            Ok(parse_response(&value))
        })
    }
}

/// Pulls a recognition result out of whatever the endpoint returned.
///
/// Results without alternatives are skipped, malformed word entries are
/// dropped, and an absent `results` array means no speech.
fn parse_response(value: &serde_json::Value) -> RawRecognitionResult {
    let mut transcripts: Vec<&str> = Vec::new();
    let mut words: Vec<WordInfo> = Vec::new();
    let mut confidence: Option<f64> = None;

    let results = value
        .get("results")
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    for result in results {
        let Some(alternative) = result
            .get("alternatives")
            .and_then(|a| a.as_array())
            .and_then(|a| a.first())
        else {
            continue;
        };

        if let Some(transcript) = alternative.get("transcript").and_then(|t| t.as_str()) {
            let trimmed = transcript.trim();
            if !trimmed.is_empty() {
                transcripts.push(trimmed);
            }
        }

        // Diarized responses repeat the word list cumulatively; whatever the
        // last result carries is the authoritative copy.
        confidence = alternative.get("confidence").and_then(|c| c.as_f64());
        words = alternative
            .get("words")
            .and_then(|w| w.as_array())
            .map(|entries| entries.iter().filter_map(parse_word).collect())
            .unwrap_or_default();
    }

    RawRecognitionResult {
        transcript: transcripts.join(" "),
        words,
        confidence,
    }
}

fn parse_word(value: &serde_json::Value) -> Option<WordInfo> {
    let word = value.get("word")?.as_str()?.to_string();

    Some(WordInfo {
        word,
        start_time: value
            .get("startTime")
            .and_then(|t| t.as_str())
            .and_then(duration_secs::parse),
        end_time: value
            .get("endTime")
            .and_then(|t| t.as_str())
            .and_then(duration_secs::parse),
        confidence: value.get("confidence").and_then(|c| c.as_f64()),
        speaker_tag: value
            .get("speakerTag")
            .and_then(|t| t.as_i64())
            .map(|t| t as i32),
    })
}
