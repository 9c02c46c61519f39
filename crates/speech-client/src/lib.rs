mod error;
mod strategy;

pub use error::Error;
pub use strategy::{
    DirectRest, LongRunning, PollPolicy, RecognizeFuture, RecognizeStrategy, StructuredSync,
};

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use notula_speech_interface::{RawRecognitionResult, RecognitionConfig};

pub const DEFAULT_API_BASE: &str = "https://speech.googleapis.com";

/// Same-strategy retry budget, applied before falling back to the next
/// strategy. Terminal errors skip it entirely.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub num_retries: usize,
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            num_retries: 1,
            max_delay_secs: 5,
        }
    }
}

pub struct RecognizeClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    retry: RetryPolicy,
    strategies: Vec<Box<dyn RecognizeStrategy>>,
}

#[derive(Default)]
pub struct RecognizeClientBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    retry: Option<RetryPolicy>,
    poll: Option<PollPolicy>,
}

impl RecognizeClientBuilder {
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

    pub fn build(self) -> RecognizeClient {
        let poll = self.poll.unwrap_or_default();

        RecognizeClient {
            http: reqwest::Client::new(),
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: self.api_key.unwrap_or_default(),
            retry: self.retry.unwrap_or_default(),
            strategies: vec![
                Box::new(StructuredSync),
                Box::new(DirectRest),
                Box::new(LongRunning::new(poll)),
            ],
        }
    }
}

impl RecognizeClient {
    pub fn builder() -> RecognizeClientBuilder {
        RecognizeClientBuilder::default()
    }

    /// Runs the fallback chain for one chunk of audio.
    ///
    /// Each applicable strategy gets its retry budget; on a terminal error
    /// the chain aborts, on anything else the next strategy is tried. The
    /// last error is returned when every strategy fails.
    pub async fn recognize(
        &self,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<RawRecognitionResult, Error> {
        if self.api_key.is_empty() {
            return Err(Error::Auth("no API key configured".to_string()));
        }

        let applicable: Vec<&dyn RecognizeStrategy> = self
            .strategies
            .iter()
            .filter(|s| s.applies(config))
            .map(|s| s.as_ref())
            .collect();

        let mut last_error: Option<Error> = None;

        for (attempt, strategy) in applicable.iter().enumerate() {
            match self.recognize_with_retry(*strategy, audio, config).await {
                Ok(result) => {
                    tracing::info!(
                        strategy = strategy.name(),
                        attempt = attempt + 1,
                        "recognition_succeeded"
                    );

                    return Ok(result);
                }
                Err(err) if err.is_terminal() => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %err,
                        "recognition_rejected"
                    );

                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        strategy = strategy.name(),
                        error = %err,
                        attempt = attempt + 1,
                        remaining_strategies = applicable.len() - attempt - 1,
                        "strategy_failed_trying_next"
                    );

                    last_error = Some(err);
                }
            }
        }

        tracing::error!(last_error = ?last_error, "all_strategies_failed");

        Err(last_error
            .unwrap_or_else(|| Error::Transient("no recognition strategy applies".to_string())))
    }

    async fn recognize_with_retry(
        &self,
        strategy: &dyn RecognizeStrategy,
        audio: &[u8],
        config: &RecognitionConfig,
    ) -> Result<RawRecognitionResult, Error> {
        let backoff = ExponentialBuilder::default()
            .with_jitter()
            .with_max_delay(Duration::from_secs(self.retry.max_delay_secs))
            .with_max_times(self.retry.num_retries);

        (|| async {
            strategy
                .recognize(&self.http, &self.api_base, &self.api_key, audio, config)
                .await
        })
        .retry(backoff)
        .notify(|err, dur| {
            tracing::warn!(
                strategy = strategy.name(),
                error = %err,
                retry_delay_ms = dur.as_millis(),
                "retrying_recognition"
            );
        })
        .when(|e| e.is_retryable())
        .await
    }
}
