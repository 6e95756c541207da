//! Generation modes, output formats, reference images and video assets.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// How a job conditions the generated video.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum VideoMode {
    /// Prompt text only
    #[default]
    TextToVideo,
    /// Animate a single source frame
    ImageToVideo,
    /// Generate the motion between a first and a last frame
    Interpolation,
    /// Keep characters consistent with a set of reference assets
    Consistency,
}

impl VideoMode {
    pub const ALL: [VideoMode; 4] = [
        VideoMode::TextToVideo,
        VideoMode::ImageToVideo,
        VideoMode::Interpolation,
        VideoMode::Consistency,
    ];

    /// Snake-case name used in logs, metrics and history.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoMode::TextToVideo => "text_to_video",
            VideoMode::ImageToVideo => "image_to_video",
            VideoMode::Interpolation => "interpolation",
            VideoMode::Consistency => "consistency",
        }
    }

    /// Number of reference images a single job of this mode consumes,
    /// `None` when any count is accepted.
    pub fn required_references(&self) -> Option<usize> {
        match self {
            VideoMode::TextToVideo => None,
            VideoMode::ImageToVideo => Some(1),
            VideoMode::Interpolation => Some(2),
            VideoMode::Consistency => None,
        }
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "text_to_video" => Ok(VideoMode::TextToVideo),
            "image" | "image_to_video" => Ok(VideoMode::ImageToVideo),
            "interpolation" | "first_last" => Ok(VideoMode::Interpolation),
            "consistency" | "character" => Ok(VideoMode::Consistency),
            other => Err(format!("unknown video mode: {}", other)),
        }
    }
}

/// Output resolution requested from the provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    R720p,
    #[serde(rename = "1080p")]
    R1080p,
}

impl Resolution {
    /// Wire value sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::R720p => "720p",
            Resolution::R1080p => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "720p" => Ok(Resolution::R720p),
            "1080p" => Ok(Resolution::R1080p),
            other => Err(format!("unknown resolution: {}", other)),
        }
    }
}

/// Frame shape chosen by the user.
///
/// The provider only renders 16:9 and 9:16, so tall shapes collapse to
/// portrait and everything else to landscape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 16:9
    #[default]
    Landscape,
    /// 9:16
    Portrait,
    /// 1:1
    Square,
    /// 4:3
    Classic,
    /// 9:21
    SuperTall,
}

impl AspectRatio {
    /// Aspect ratio string accepted by the provider.
    pub fn provider_value(&self) -> &'static str {
        match self {
            AspectRatio::Portrait | AspectRatio::SuperTall => "9:16",
            AspectRatio::Landscape | AspectRatio::Square | AspectRatio::Classic => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratio = match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Classic => "4:3",
            AspectRatio::SuperTall => "9:21",
        };
        write!(f, "{}", ratio)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            "1:1" | "square" => Ok(AspectRatio::Square),
            "4:3" | "classic" => Ok(AspectRatio::Classic),
            "9:21" | "super_tall" => Ok(AspectRatio::SuperTall),
            other => Err(format!("unknown aspect ratio: {}", other)),
        }
    }
}

/// An image supplied as conditioning input.
///
/// The bytes are shared so job snapshots stay cheap to clone; they are not
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceImage {
    /// Display name (file stem)
    pub name: String,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Arc<Vec<u8>>,
}

impl ReferenceImage {
    /// Wrap raw image bytes.
    ///
    /// # Arguments
    /// * `name` - Display name, usually the file stem
    /// * `mime_type` - MIME type sent to the provider
    /// * `bytes` - Encoded image data
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL as produced by browser file readers.
    pub fn from_data_url(name: impl Into<String>, data_url: &str) -> ModelResult<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| ModelError::invalid_data_url("missing data: scheme"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ModelError::invalid_data_url("missing payload separator"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ModelError::invalid_data_url("only base64 payloads are supported"))?;
        let mime_type = if mime_type.is_empty() { "image/png" } else { mime_type };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ModelError::invalid_data_url(e.to_string()))?;

        Ok(Self::new(name, mime_type, bytes))
    }

    /// Base64 payload for the provider request body.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes.as_slice())
    }

    /// True when no image data was loaded.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Provider-side reference to a generated video.
///
/// This is what a chained job receives as conditioning input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct VideoHandle {
    pub uri: String,
}

impl VideoHandle {
    /// Wrap a provider URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Where the caller can read a finished video from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum AssetLocation {
    /// Downloaded to a local file
    Local(PathBuf),
    /// Remote URI, fetched on demand by the caller
    Remote(String),
}

impl AssetLocation {
    /// True when the video was saved to disk.
    pub fn is_local(&self) -> bool {
        matches!(self, AssetLocation::Local(_))
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetLocation::Local(path) => write!(f, "{}", path.display()),
            AssetLocation::Remote(uri) => write!(f, "{}", uri),
        }
    }
}

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VideoAsset {
    /// Handle for chaining into the next job
    pub handle: VideoHandle,
    /// Addressable copy for playback
    pub location: AssetLocation,
}

impl VideoAsset {
    /// Pair a provider handle with where the bytes ended up.
    pub fn new(handle: VideoHandle, location: AssetLocation) -> Self {
        Self { handle, location }
    }

    /// Address exposed to observers and history.
    pub fn url(&self) -> String {
        self.location.to_string()
    }
}
