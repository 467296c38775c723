use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use server_api::Generator;
use shared::protocol::{RecommendationInput, RecommendationOutput};
use url::Url;

/// Generation backend reached over HTTP.
///
/// `POST {base}/recommendations` takes the recommendation input and answers with
/// `{recommendations, reminder_needed}`. `POST {base}/speech` takes `{prompt}`
/// and answers with `{media}`, a base64 data URL of raw PCM.
pub struct HttpGenerator {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct SpeechResponse {
    media: String,
}

impl HttpGenerator {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid generation url: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build generation http client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn post(&self, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self.base_url.join(path)?;
        let request = self.http.post(url);
        Ok(match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn recommend(&self, input: &RecommendationInput) -> Result<RecommendationOutput> {
        let output = self
            .post("recommendations")?
            .json(input)
            .send()
            .await?
            .error_for_status()?
            .json::<RecommendationOutput>()
            .await
            .context("malformed recommendation response")?;
        Ok(output)
    }

    async fn synthesize(&self, prompt: &str) -> Result<Vec<u8>> {
        let response = self
            .post("speech")?
            .json(&SpeechRequest { prompt })
            .send()
            .await?
            .error_for_status()?
            .json::<SpeechResponse>()
            .await
            .context("malformed speech response")?;
        decode_media(&response.media)
    }
}

/// Decodes the payload of a `data:...;base64,` URL. A bare base64 string is accepted too.
pub(crate) fn decode_media(media: &str) -> Result<Vec<u8>> {
    let encoded = match media.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| anyhow!("data url has no payload"))?;
            if !meta.ends_with(";base64") {
                return Err(anyhow!("data url is not base64 encoded"));
            }
            payload
        }
        None => media,
    };
    STANDARD
        .decode(encoded.trim())
        .context("media payload is not valid base64")
}

#[cfg(test)]
#[path = "tests/generator_tests.rs"]
mod tests;
