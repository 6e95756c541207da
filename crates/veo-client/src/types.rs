//! Veo API request/response types.

use serde::{Deserialize, Serialize};

use veo_models::ReferenceImage;

use crate::provider::GenerationRequest;

/// `models/{model}:predictLongRunning` request.
#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<InlineImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_images: Vec<ReferenceImagePayload>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl From<&ReferenceImage> for InlineImage {
    fn from(image: &ReferenceImage) -> Self {
        Self {
            bytes_base64_encoded: image.to_base64(),
            mime_type: image.mime_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRef {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImagePayload {
    pub image: InlineImage,
    pub reference_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub aspect_ratio: String,
    pub resolution: String,
    pub sample_count: u32,
}

impl PredictRequest {
    /// Shape a validated generation request for the wire.
    ///
    /// A chained request sends only the prompt and the previous video.
    pub fn from_request(request: &GenerationRequest) -> Self {
        let mut instance = Instance {
            prompt: request.effective_prompt(),
            ..Default::default()
        };

        if let Some(previous) = &request.chain_input {
            instance.video = Some(VideoRef {
                uri: previous.uri.clone(),
            });
        } else {
            match request.mode {
                veo_models::VideoMode::TextToVideo => {}
                veo_models::VideoMode::ImageToVideo => {
                    instance.image = request.reference_assets.first().map(InlineImage::from);
                }
                veo_models::VideoMode::Interpolation => {
                    instance.image = request.reference_assets.first().map(InlineImage::from);
                    instance.last_frame = request.reference_assets.get(1).map(InlineImage::from);
                }
                veo_models::VideoMode::Consistency => {
                    instance.reference_images = request
                        .reference_assets
                        .iter()
                        .map(|image| ReferenceImagePayload {
                            image: InlineImage::from(image),
                            reference_type: "asset".to_string(),
                        })
                        .collect();
                }
            }
        }

        Self {
            instances: vec![instance],
            parameters: Parameters {
                aspect_ratio: request.aspect_ratio.provider_value().to_string(),
                resolution: request.effective_resolution().as_str().to_string(),
                sample_count: 1,
            },
        }
    }
}

/// Long-running operation as returned by submit and poll.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResponse>,
    #[serde(default)]
    pub error: Option<ApiStatus>,
}

impl Operation {
    /// URI of the first generated video, if any.
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()
            .map(|v| v.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

/// `google.rpc.Status` style error payload.
#[derive(Debug, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Error envelope on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use veo_models::{AspectRatio, Resolution, VideoHandle, VideoMode};

    fn request(mode: VideoMode, images: usize) -> GenerationRequest {
        GenerationRequest {
            mode,
            prompt: "waves".into(),
            negative_prompt: None,
            reference_assets: (0..images)
                .map(|i| ReferenceImage::new(format!("f{}", i), "image/png", vec![i as u8 + 1]))
                .collect(),
            chain_input: None,
            resolution: Resolution::R1080p,
            aspect_ratio: AspectRatio::SuperTall,
        }
    }

    #[test]
    fn test_interpolation_payload() {
        let body = serde_json::to_value(PredictRequest::from_request(&request(VideoMode::Interpolation, 2))).unwrap();
        let instance = &body["instances"][0];
        assert_eq!(instance["image"]["bytesBase64Encoded"], "AQ==");
        assert_eq!(instance["lastFrame"]["bytesBase64Encoded"], "Ag==");
        assert!(instance.get("referenceImages").is_none());
        assert_eq!(body["parameters"]["aspectRatio"], "9:16");
        assert_eq!(body["parameters"]["resolution"], "1080p");
    }

    #[test]
    fn test_consistency_payload() {
        let body = serde_json::to_value(PredictRequest::from_request(&request(VideoMode::Consistency, 3))).unwrap();
        let refs = body["instances"][0]["referenceImages"].as_array().unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0]["referenceType"], "asset");
    }

    #[test]
    fn test_chained_payload_uses_previous_video() {
        let mut req = request(VideoMode::TextToVideo, 0);
        req.chain_input = Some(VideoHandle::new("https://provider/files/prev"));
        let body = serde_json::to_value(PredictRequest::from_request(&req)).unwrap();
        assert_eq!(body["instances"][0]["video"]["uri"], "https://provider/files/prev");
        assert_eq!(body["parameters"]["resolution"], "720p");
    }

    #[test]
    fn test_operation_video_uri() {
        let op: Operation = serde_json::from_str(
            r#"{"name":"op/1","done":true,"response":{"generateVideoResponse":{"generatedSamples":[{"video":{"uri":"https://provider/files/v"}}]}}}"#,
        )
        .unwrap();
        assert_eq!(op.video_uri(), Some("https://provider/files/v"));

        let pending: Operation = serde_json::from_str(r#"{"name":"op/1"}"#).unwrap();
        assert!(!pending.done);
        assert!(pending.video_uri().is_none());
    }
}
