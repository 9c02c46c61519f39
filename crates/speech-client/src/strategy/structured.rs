use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use notula_speech_interface::{
    RecognitionAudio, RecognitionConfig, RecognizeRequest, RecognizeResponse,
};

use super::{RecognizeFuture, RecognizeStrategy, SYNC_RECOGNIZE_PATH, endpoint, post_json};

/// Synchronous recognition through the typed request/response structs.
///
/// First link in the chain. Decoding is strict, so a response that drifts
/// from the documented shape fails here and falls through to [`DirectRest`],
/// which parses leniently.
///
/// [`DirectRest`]: super::DirectRest
#[derive(Debug, Default)]
pub struct StructuredSync;

impl RecognizeStrategy for StructuredSync {
    fn name(&self) -> &'static str {
        "structured_sync"
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
            let request = RecognizeRequest {
                config: config.clone(),
                audio: RecognitionAudio {
                    content: BASE64.encode(audio),
                },
            };

            let response: RecognizeResponse = post_json(http, url, &request).await?;
            Ok(response.into())
        })
    }
}
