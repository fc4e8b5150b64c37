use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use validator::Validate;

use crate::errors::ParameterError;

// ───── Constants ──────────────────────────────────────────────────────
pub const MAX_DIMENSION: u32 = 10_000;
const DEFAULT_WIDTH: u32 = 1000;
const DEFAULT_FILL_COLOR: &str = "#ffffff";

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9a-f]{3}|[0-9a-f]{6})$").expect("hex color pattern compiles")
});

// ───── Enumerations ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMode {
    #[default]
    Dimensions,
    AspectRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    Transparent,
    SolidColor,
    RemovedWithFill,
    Unchanged,
}

impl BackgroundMode {
    pub fn removes_background(self) -> bool {
        matches!(self, BackgroundMode::Transparent | BackgroundMode::RemovedWithFill)
    }

    pub fn requires_fill(self) -> bool {
        matches!(self, BackgroundMode::SolidColor | BackgroundMode::RemovedWithFill)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

// ───── Value types ────────────────────────────────────────────────────

/// A `W:H` ratio with both sides strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Height matching `base_width` under this ratio, rounded half to even.
    pub fn height_for(&self, base_width: u32) -> u32 {
        let exact = base_width as f64 / self.width as f64 * self.height as f64;
        (exact.round_ties_even() as u32).max(1)
    }
}

impl FromStr for AspectRatio {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParameterError::InvalidAspectRatio(s.to_string());

        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;

        if width == 0 || height == 0 {
            return Err(invalid());
        }

        Ok(AspectRatio { width, height })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Lowercase hex color without the leading `#`, 3 or 6 digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(raw: &str) -> Result<Self, ParameterError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed).to_ascii_lowercase();

        if HEX_COLOR_RE.is_match(&digits) {
            Ok(HexColor(digits))
        } else {
            Err(ParameterError::InvalidColor(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ───── Input & derived models ─────────────────────────────────────────

/// Choices made in the studio sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DisplayOptions {
    pub size_mode: SizeMode,

    #[validate(range(min = 1, max = MAX_DIMENSION, message = "Width must be between 1 and 10000"))]
    pub width: Option<u32>,

    #[validate(range(min = 1, max = MAX_DIMENSION, message = "Height must be between 1 and 10000"))]
    pub height: Option<u32>,

    pub aspect_ratio: Option<String>,

    /// Off when the user toggles "show original".
    pub remove_background: bool,

    pub background_mode: BackgroundMode,
    pub background_color: Option<String>,
    pub preserve_fine_edges: bool,
    pub output_format: OutputFormat,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            size_mode: SizeMode::Dimensions,
            width: Some(DEFAULT_WIDTH),
            height: None,
            aspect_ratio: None,
            remove_background: true,
            background_mode: BackgroundMode::Transparent,
            background_color: Some(DEFAULT_FILL_COLOR.to_string()),
            preserve_fine_edges: false,
            output_format: OutputFormat::Png,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformationDescriptor {
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub aspect_ratio: Option<AspectRatio>,
    pub background_mode: BackgroundMode,
    pub background_color: Option<HexColor>,
    pub preserve_fine_edges: bool,
    pub output_format: OutputFormat,
}

impl TransformationDescriptor {
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target_width.zip(self.target_height)
    }

    pub fn removes_background(&self) -> bool {
        self.background_mode.removes_background()
    }
}

impl Default for TransformationDescriptor {
    fn default() -> Self {
        TransformationDescriptor {
            target_width: None,
            target_height: None,
            aspect_ratio: None,
            background_mode: BackgroundMode::Unchanged,
            background_color: None,
            preserve_fine_edges: false,
            output_format: OutputFormat::Png,
        }
    }
}
