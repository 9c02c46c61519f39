use notula_transcript::Speaker;

/// What happened to one chunk. Drives the final status: any `Failed` among
/// non-failures makes the run partial, all-failed makes it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Success,
    NoSpeech,
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    #[strum(serialize = "complete")]
    Complete,
    #[strum(serialize = "partial")]
    Partial,
    #[strum(serialize = "failed")]
    Failed,
}

impl TranscriptionStatus {
    pub(crate) fn from_outcomes(outcomes: &[ChunkOutcome]) -> Self {
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, ChunkOutcome::Failed))
            .count();

        if failed == 0 {
            TranscriptionStatus::Complete
        } else if failed == outcomes.len() {
            TranscriptionStatus::Failed
        } else {
            TranscriptionStatus::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChunkFailure {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TranscriptionResult {
    pub status: TranscriptionStatus,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<Speaker>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ChunkFailure>,
}
