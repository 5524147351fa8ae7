//! Caption request pipeline: re-encode an uploaded image as JPEG, POST it to
//! a hosted captioning model, and map the response into a caption string or a
//! classified failure.

use std::io::Cursor;

use image::DynamicImage;
use serde::Deserialize;
use thiserror::Error;

/// Hosted BLIP base captioning model on the HuggingFace Inference API.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/Salesforce/blip-image-captioning-base";

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum CaptionError {
    /// The decoded bitmap could not be serialized to the JPEG transport format.
    #[error("could not encode image as JPEG: {0}")]
    Encoding(#[from] image::ImageError),
    /// Network failure, or the endpoint answered with a non-2xx status.
    #[error("captioning request failed: {0}")]
    Transport(String),
    /// The body was not the expected JSON array of `generated_text` objects.
    #[error("unexpected captioning response: {0}")]
    ResponseFormat(String),
}

#[derive(Debug, Deserialize)]
struct ModelOutput {
    generated_text: String,
}

/// Client for the remote captioning endpoint. Stateless across calls: each
/// invocation owns its own buffer and response.
#[derive(Clone)]
pub struct Captioner {
    client: reqwest::Client,
    endpoint: String,
}

impl Default for Captioner {
    fn default() -> Self {
        Self::new()
    }
}

impl Captioner {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Point the pipeline at a different endpoint, e.g. a mock server in tests
    /// or a self-hosted deployment of the model.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Generate a caption for `image`, authorizing with the bearer `credential`.
    ///
    /// Issues exactly one POST with the JPEG bytes as the body. No retries.
    /// On success the caption is returned exactly as the model produced it,
    /// with no trimming or escaping, and is guaranteed non-empty.
    pub async fn generate_caption(
        &self,
        image: &DynamicImage,
        credential: &str,
    ) -> Result<String, CaptionError> {
        let mut jpeg = Vec::new();
        image.write_to(
            &mut Cursor::new(&mut jpeg),
            image::ImageOutputFormat::Jpeg(JPEG_QUALITY),
        )?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .body(jpeg)
            .send()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        let status = response.status();
        tracing::debug!(%status, "captioning endpoint responded");
        if !status.is_success() {
            return Err(CaptionError::Transport(format!(
                "endpoint returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        let outputs: Vec<ModelOutput> = serde_json::from_str(&body)
            .map_err(|e| CaptionError::ResponseFormat(format!("not a caption array: {e}")))?;

        let caption = outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| CaptionError::ResponseFormat("caption array was empty".into()))?;

        if caption.is_empty() {
            return Err(CaptionError::ResponseFormat("caption was empty".into()));
        }

        Ok(caption)
    }
}

/// Render the `<img>` snippet shown to the user.
///
/// Caption and filename are interpolated verbatim. Quotes and angle brackets
/// are NOT escaped, so the snippet is only safe for trusted captions and
/// filenames. Known risk, kept for output fidelity.
pub fn format_html(caption: &str, filename: &str) -> String {
    format!(r#"<img src="{filename}" alt="{caption}" />"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_html_matches_expected_snippet() {
        assert_eq!(
            format_html("A cat", "cat.png"),
            r#"<img src="cat.png" alt="A cat" />"#
        );
    }

    #[test]
    fn format_html_does_not_escape() {
        assert_eq!(
            format_html(r#"a "quoted" <tag>"#, "a b.png"),
            r#"<img src="a b.png" alt="a "quoted" <tag>" />"#
        );
    }
}
