use crate::RecognitionConfig;

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RecognitionAudio {
    /// Base64-encoded audio bytes.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognizeRequest {
    pub config: RecognitionConfig,
    pub audio: RecognitionAudio,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    #[serde(default)]
    pub word: String,
    #[serde(default, with = "duration_secs", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, with = "duration_secs", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_tag: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<WordInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
}

/// What one recognition call produced, independent of which strategy made it:
/// the flat transcript, and the word list when the provider attributed words
/// to speakers.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RawRecognitionResult {
    pub transcript: String,
    #[serde(default)]
    pub words: Vec<WordInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RawRecognitionResult {
    pub fn is_no_speech(&self) -> bool {
        self.transcript.is_empty() && self.words.is_empty()
    }

    pub fn has_speaker_tags(&self) -> bool {
        self.words.iter().any(|w| w.speaker_tag.is_some())
    }
}

impl From<RecognizeResponse> for RawRecognitionResult {
    fn from(mut response: RecognizeResponse) -> Self {
        let transcript = response
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        // With diarization on, the provider repeats the word list cumulatively;
        // the last result's first alternative carries the complete one.
        let last = response
            .results
            .pop()
            .and_then(|r| r.alternatives.into_iter().next());

        let (words, confidence) = match last {
            Some(alternative) => (alternative.words, alternative.confidence),
            None => (Vec::new(), None),
        };

        Self {
            transcript,
            words,
            confidence,
        }
    }
}

/// Serde for the provider's protobuf-JSON durations: seconds with a trailing
/// `s`, e.g. `"1.300s"`.
pub mod duration_secs {
    use serde::Deserialize;

    /// Parses `"1.300s"` (or a bare number string) into seconds.
    pub fn parse(text: &str) -> Option<f64> {
        text.trim().trim_end_matches('s').parse::<f64>().ok()
    }

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match value {
            Some(secs) => serializer.serialize_str(&format!("{:.3}s", secs)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(text) => parse(&text)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid duration {text:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diarized_response_json() -> serde_json::Value {
        serde_json::json!({
            "results": [
                {
                    "alternatives": [{
                        "transcript": "hello there",
                        "confidence": 0.92
                    }]
                },
                {
                    "alternatives": [{
                        "transcript": "general kenobi",
                        "confidence": 0.87,
                        "words": [
                            { "word": "hello", "startTime": "0s", "endTime": "0.400s", "speakerTag": 3 },
                            { "word": "there", "startTime": "0.400s", "endTime": "0.900s", "speakerTag": 3 },
                            { "word": "general", "startTime": "1.200s", "endTime": "1.700s", "speakerTag": 1 },
                            { "word": "kenobi", "startTime": "1.700s", "endTime": "2.300s", "speakerTag": 1 }
                        ]
                    }]
                }
            ]
        })
    }

    #[test]
    fn deserializes_provider_response() {
        let response: RecognizeResponse =
            serde_json::from_value(diarized_response_json()).unwrap();

        assert_eq!(response.results.len(), 2);
        let words = &response.results[1].alternatives[0].words;
        assert_eq!(words.len(), 4);
        assert_eq!(words[0].word, "hello");
        assert_eq!(words[0].start_time, Some(0.0));
        assert_eq!(words[1].end_time, Some(0.9));
        assert_eq!(words[2].speaker_tag, Some(1));
    }

    #[test]
    fn raw_result_joins_transcripts_and_takes_last_words() {
        let response: RecognizeResponse =
            serde_json::from_value(diarized_response_json()).unwrap();
        let raw = RawRecognitionResult::from(response);

        assert_eq!(raw.transcript, "hello there general kenobi");
        assert_eq!(raw.words.len(), 4);
        assert_eq!(raw.confidence, Some(0.87));
        assert!(raw.has_speaker_tags());
        assert!(!raw.is_no_speech());
    }

    #[test]
    fn empty_results_mean_no_speech() {
        let response: RecognizeResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let raw = RawRecognitionResult::from(response);

        assert!(raw.is_no_speech());
        assert!(!raw.has_speaker_tags());
        assert_eq!(raw.transcript, "");
    }

    #[test]
    fn blank_transcripts_are_skipped_in_join() {
        let response = RecognizeResponse {
            results: vec![
                SpeechRecognitionResult {
                    alternatives: vec![SpeechRecognitionAlternative {
                        transcript: "first part".into(),
                        ..Default::default()
                    }],
                },
                SpeechRecognitionResult {
                    alternatives: vec![SpeechRecognitionAlternative {
                        transcript: "   ".into(),
                        ..Default::default()
                    }],
                },
                SpeechRecognitionResult {
                    alternatives: vec![SpeechRecognitionAlternative {
                        transcript: "second part".into(),
                        ..Default::default()
                    }],
                },
            ],
        };

        let raw = RawRecognitionResult::from(response);
        assert_eq!(raw.transcript, "first part second part");
    }

    #[test]
    fn duration_strings_parse() {
        let word: WordInfo = serde_json::from_value(serde_json::json!({
            "word": "hi",
            "startTime": "3s",
            "endTime": "3.600s"
        }))
        .unwrap();

        assert_eq!(word.start_time, Some(3.0));
        assert_eq!(word.end_time, Some(3.6));
        assert_eq!(word.speaker_tag, None);
    }

    #[test]
    fn duration_parse_handles_suffix_and_garbage() {
        assert_eq!(duration_secs::parse("1.300s"), Some(1.3));
        assert_eq!(duration_secs::parse("42"), Some(42.0));
        assert_eq!(duration_secs::parse("soon"), None);
    }

    #[test]
    fn duration_serializes_with_suffix() {
        let word = WordInfo {
            word: "hi".into(),
            start_time: Some(1.25),
            end_time: Some(2.0),
            confidence: None,
            speaker_tag: Some(2),
        };

        let value = serde_json::to_value(&word).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "word": "hi",
                "startTime": "1.250s",
                "endTime": "2.000s",
                "speakerTag": 2
            })
        );
    }

    #[test]
    fn words_without_tags_are_not_diarized() {
        let raw = RawRecognitionResult {
            transcript: "plain text".into(),
            words: vec![WordInfo {
                word: "plain".into(),
                ..Default::default()
            }],
            confidence: None,
        };

        assert!(!raw.has_speaker_tags());
    }
}
