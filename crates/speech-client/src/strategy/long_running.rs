use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use notula_speech_interface::{
    Operation, RawRecognitionResult, RecognitionAudio, RecognitionConfig, RecognizeRequest,
};

use super::{
    LONG_RUNNING_RECOGNIZE_PATH, RecognizeFuture, RecognizeStrategy, endpoint, get_json, post_json,
};
use crate::error::Error;

/// Poll cadence for long-running jobs. The defaults bound the wait at about
/// five minutes: 30 polls, 10 seconds apart.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Asynchronous recognition for diarized audio.
///
/// Last link in the chain and only applied when diarization is requested:
/// submits the job, then polls the operations endpoint until it reports
/// `done` or the attempt budget runs out.
#[derive(Debug, Default)]
pub struct LongRunning {
    poll: PollPolicy,
}

impl LongRunning {
    pub fn new(poll: PollPolicy) -> Self {
        Self { poll }
    }

    async fn poll_until_done(
        &self,
        http: &reqwest::Client,
        api_base: &str,
        api_key: &str,
        name: &str,
    ) -> Result<RawRecognitionResult, Error> {
        for attempt in 1..=self.poll.max_attempts {
            tokio::time::sleep(self.poll.interval).await;

            let url = endpoint(api_base, &format!("operations/{name}"), api_key)?;
            let operation: Operation = match get_json(http, url).await {
                Ok(operation) => operation,
                Err(err) if err.is_terminal() => return Err(err),
                Err(err) => {
                    // A dropped poll does not kill the job; the attempt
                    // budget still bounds the total wait.
                    tracing::warn!(
                        operation = %name,
                        attempt,
                        error = %err,
                        "long_running_poll_failed"
                    );
                    continue;
                }
            };

            if !operation.done {
                tracing::debug!(operation = %name, attempt, "long_running_job_pending");
                continue;
            }

            if let Some(error) = operation.error {
                return Err(Error::OperationFailed {
                    code: error.code,
                    message: error.message,
                });
            }

            let response = operation.response.unwrap_or_default();
            return Ok(response.into());
        }

        Err(Error::PollTimeout {
            attempts: self.poll.max_attempts,
        })
    }
}

impl RecognizeStrategy for LongRunning {
    fn name(&self) -> &'static str {
        "long_running"
    }

    fn applies(&self, config: &RecognitionConfig) -> bool {
        config.diarization_enabled()
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
            let url = endpoint(api_base, LONG_RUNNING_RECOGNIZE_PATH, api_key)?;
            let request = RecognizeRequest {
                config: config.clone(),
                audio: RecognitionAudio {
                    content: BASE64.encode(audio),
                },
            };

            let submitted: Operation = post_json(http, url, &request).await?;
            if submitted.name.is_empty() {
                return Err(Error::UnexpectedResponse(
                    "job submission returned no operation name".to_string(),
                ));
            }

            tracing::info!(operation = %submitted.name, "long_running_job_submitted");
            self.poll_until_done(http, api_base, api_key, &submitted.name)
                .await
        })
    }
}
