#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no audio data to transcribe")]
    EmptyAudio,
    #[error("transcoding failed: {0}")]
    Transcode(String),
    #[error(transparent)]
    Recognize(#[from] notula_speech_client::Error),
}

/// Maps pipeline errors to messages fit for end users.
pub fn format_user_friendly_error(error: &Error) -> String {
    use notula_speech_client::Error as Recognize;

    match error {
        Error::EmptyAudio => "The recording contains no audio data.".to_string(),
        Error::Transcode(_) => {
            "The audio could not be converted for transcription. Please try a different file."
                .to_string()
        }
        Error::Recognize(Recognize::Auth(_)) => {
            "Authentication failed. Please check your API key.".to_string()
        }
        Error::Recognize(Recognize::Permission(_)) => {
            "Access denied. Your API key may not have permission for speech recognition."
                .to_string()
        }
        Error::Recognize(Recognize::InvalidRequest(_)) => {
            "The service rejected the audio format. Please try a different file or encoding."
                .to_string()
        }
        Error::Recognize(Recognize::PollTimeout { .. }) => {
            "The transcription job took too long. Please try again with a shorter recording."
                .to_string()
        }
        Error::Recognize(_) => {
            "Could not reach the transcription service. Please check your connection and try again."
                .to_string()
        }
    }
}
