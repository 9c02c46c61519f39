use notula_speech_interface::RawRecognitionResult;

use crate::speaker::{Speaker, SpeakerMap};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptSegment {
    pub speaker_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiarizedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub speakers: Vec<Speaker>,
}

impl DiarizedTranscript {
    /// One `Speaker N: text` line per segment.
    pub fn render(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("Speaker {}: {}", s.speaker_id, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Rebuilds ordered per-speaker segments from a diarized recognition result.
pub fn reconstruct(result: &RawRecognitionResult) -> DiarizedTranscript {
    reconstruct_with(result, &SpeakerMap::from_words(&result.words))
}

/// The same walk with a caller-supplied mapping, for ID continuity across
/// calls via [`SpeakerRegistry`].
///
/// Words the provider attributed to nobody are dropped. When nothing at all
/// was attributed, the whole transcript is treated as a single voice rather
/// than losing it.
///
/// [`SpeakerRegistry`]: crate::SpeakerRegistry
pub fn reconstruct_with(
    result: &RawRecognitionResult,
    speakers: &SpeakerMap,
) -> DiarizedTranscript {
    if speakers.is_empty() {
        if result.transcript.is_empty() {
            return DiarizedTranscript::default();
        }

        return DiarizedTranscript {
            segments: vec![TranscriptSegment {
                speaker_id: "1".to_string(),
                text: result.transcript.clone(),
            }],
            speakers: vec![Speaker::numbered(1)],
        };
    }

    let mut segments = Vec::new();
    let mut current_tag: Option<i32> = None;
    let mut current_words: Vec<&str> = Vec::new();

    for word in &result.words {
        let text = word.word.trim();
        if text.is_empty() {
            continue;
        }
        let Some(tag) = word.speaker_tag else {
            continue;
        };

        if current_tag != Some(tag) {
            flush(&mut segments, current_tag, &current_words, speakers);
            current_words.clear();
            current_tag = Some(tag);
        }

        current_words.push(text);
    }
    flush(&mut segments, current_tag, &current_words, speakers);

    DiarizedTranscript {
        segments,
        speakers: speakers.roster(),
    }
}

fn flush(
    segments: &mut Vec<TranscriptSegment>,
    tag: Option<i32>,
    words: &[&str],
    speakers: &SpeakerMap,
) {
    let Some(tag) = tag else { return };
    if words.is_empty() {
        return;
    }
    let Some(speaker_id) = speakers.display_id(tag) else {
        return;
    };

    segments.push(TranscriptSegment {
        speaker_id,
        text: words.join(" "),
    });
}
