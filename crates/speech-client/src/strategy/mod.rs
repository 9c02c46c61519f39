mod long_running;
mod rest;
mod structured;

pub use long_running::{LongRunning, PollPolicy};
pub use rest::DirectRest;
pub use structured::StructuredSync;

use std::future::Future;
use std::pin::Pin;

use notula_speech_interface::{RawRecognitionResult, RecognitionConfig};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, classify_status, error_detail};

pub type RecognizeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RawRecognitionResult, Error>> + Send + 'a>>;

/// One link in the recognition fallback chain.
///
/// Strategies are attempted in order until one succeeds or returns a
/// terminal error. All of them send the same `RecognitionConfig`; they only
/// differ in transport shape and response handling.
pub trait RecognizeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy can serve the given config.
    fn applies(&self, _config: &RecognitionConfig) -> bool {
        true
    }

    fn recognize<'a>(
        &'a self,
        http: &'a reqwest::Client,
        api_base: &'a str,
        api_key: &'a str,
        audio: &'a [u8],
        config: &'a RecognitionConfig,
    ) -> RecognizeFuture<'a>;
}

pub(crate) const SYNC_RECOGNIZE_PATH: &str = "speech:recognize";
pub(crate) const LONG_RUNNING_RECOGNIZE_PATH: &str = "speech:longrunningrecognize";

/// Builds `{api_base}/v1/{path}?key={api_key}`.
///
/// The key travels as a query parameter, so callers must never log the full
/// URL. Log the path instead.
pub(crate) fn endpoint(api_base: &str, path: &str, api_key: &str) -> Result<url::Url, Error> {
    let base = api_base.trim_end_matches('/');
    let mut url: url::Url = format!("{base}/v1/{path}").parse()?;
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url)
}

/// POSTs a JSON request and decodes a typed JSON response, mapping
/// non-success statuses through the error taxonomy.
pub(crate) async fn post_json<Req, Resp>(
    http: &reqwest::Client,
    url: url::Url,
    request: &Req,
) -> Result<Resp, Error>
where
    Req: Serialize + Sync,
    Resp: DeserializeOwned,
{
    let response = http.post(url).json(request).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, error_detail(&body)));
    }

    Ok(response.json::<Resp>().await?)
}

pub(crate) async fn get_json<Resp>(http: &reqwest::Client, url: url::Url) -> Result<Resp, Error>
where
    Resp: DeserializeOwned,
{
    let response = http.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, error_detail(&body)));
    }

    Ok(response.json::<Resp>().await?)
}
