use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::new_validation_error;

const FALLBACK_NAME: &str = "image";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub id: String, // public id assigned by the upload service
    pub source_url: String,
    pub original_name: String,
    pub natural_width: Option<u32>,
    pub natural_height: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.natural_width.zip(self.natural_height)
    }
}

// ───── Upload widget payloads ───────────────────────────────────────

/// One asset as reported by the hosted upload widget.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadedAsset {
    #[validate(
        length(min = 1, max = 512, message = "public_id must be 1-512 characters"),
        custom(function = "validate_public_id")
    )]
    pub public_id: String,

    #[validate(url(message = "secure_url must be a valid URL"))]
    pub secure_url: String,

    #[serde(default)]
    pub original_filename: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

impl UploadedAsset {
    pub fn into_record(self, uploaded_at: DateTime<Utc>) -> ImageRecord {
        let original_name = self
            .original_filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| last_segment(&self.public_id));

        ImageRecord {
            id: self.public_id,
            source_url: self.secure_url,
            original_name,
            natural_width: self.width,
            natural_height: self.height,
            uploaded_at,
        }
    }
}

/// Batch results some widget versions report as parallel arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct ParallelUpload {
    pub public_id: Vec<String>,
    pub secure_url: Vec<String>,
    #[serde(default)]
    pub original_filename: Option<Vec<String>>,
    #[serde(default)]
    pub width: Option<Vec<u32>>,
    #[serde(default)]
    pub height: Option<Vec<u32>>,
}

impl ParallelUpload {
    fn into_assets(self) -> Result<Vec<UploadedAsset>, ValidationErrors> {
        if self.public_id.len() != self.secure_url.len() {
            let mut errors = ValidationErrors::new();
            errors.add(
                "secure_url",
                new_validation_error("length_mismatch", "public_id and secure_url must have the same length"),
            );
            return Err(errors);
        }

        let names = self.original_filename.unwrap_or_default();
        let widths = self.width.unwrap_or_default();
        let heights = self.height.unwrap_or_default();

        let assets = self
            .public_id
            .into_iter()
            .zip(self.secure_url)
            .enumerate()
            .map(|(i, (public_id, secure_url))| UploadedAsset {
                public_id,
                secure_url,
                original_filename: names.get(i).cloned(),
                width: widths.get(i).copied(),
                height: heights.get(i).copied(),
            })
            .collect();

        Ok(assets)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadPayload {
    Many(Vec<UploadedAsset>),
    One(UploadedAsset),
    Parallel(ParallelUpload),
}

/// Accepts the widget result either bare or wrapped in its `info` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadEnvelope {
    Wrapped { info: UploadPayload },
    Bare(UploadPayload),
}

impl UploadEnvelope {
    pub fn into_assets(self) -> Result<Vec<UploadedAsset>, ValidationErrors> {
        let payload = match self {
            UploadEnvelope::Wrapped { info } => info,
            UploadEnvelope::Bare(payload) => payload,
        };

        let assets = match payload {
            UploadPayload::Many(assets) => assets,
            UploadPayload::One(asset) => vec![asset],
            UploadPayload::Parallel(parallel) => parallel.into_assets()?,
        };

        for asset in &assets {
            asset.validate()?;
        }

        Ok(assets)
    }
}

/// Public ids are joined onto the delivery base, so relative segments
/// would escape the configured cloud.
pub fn validate_public_id(public_id: &str) -> Result<(), ValidationError> {
    if public_id.split('/').any(|segment| matches!(segment.trim(), "." | "..")) {
        return Err(new_validation_error(
            "public_id_relative_segment",
            "public_id must not contain '.' or '..' segments",
        ));
    }
    Ok(())
}

fn last_segment(public_id: &str) -> String {
    public_id
        .rsplit('/')
        .find(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assets(value: serde_json::Value) -> Vec<UploadedAsset> {
        serde_json::from_value::<UploadEnvelope>(value)
            .expect("payload should deserialize")
            .into_assets()
            .expect("payload should validate")
    }

    #[test]
    fn accepts_single_object() {
        let result = assets(json!({
            "public_id": "user_uploads/cat",
            "secure_url": "https://res.example.com/demo/image/upload/user_uploads/cat.jpg",
            "original_filename": "cat",
            "width": 640,
            "height": 480
        }));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].public_id, "user_uploads/cat");
        assert_eq!(result[0].width, Some(640));
    }

    #[test]
    fn accepts_array_of_objects_inside_info() {
        let result = assets(json!({
            "event": "success",
            "info": [
                { "public_id": "a", "secure_url": "https://cdn.example.com/a.png" },
                { "public_id": "b", "secure_url": "https://cdn.example.com/b.png" }
            ]
        }));

        let ids: Vec<_> = result.iter().map(|a| a.public_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn accepts_parallel_arrays() {
        let result = assets(json!({
            "info": {
                "public_id": ["x", "y"],
                "secure_url": ["https://cdn.example.com/x.png", "https://cdn.example.com/y.png"],
                "width": [10, 20]
            }
        }));

        assert_eq!(result.len(), 2);
        assert_eq!(result[1].public_id, "y");
        assert_eq!(result[1].width, Some(20));
        assert_eq!(result[1].height, None);
    }

    #[test]
    fn rejects_mismatched_parallel_arrays() {
        let envelope: UploadEnvelope = serde_json::from_value(json!({
            "public_id": ["x", "y"],
            "secure_url": ["https://cdn.example.com/x.png"]
        }))
        .unwrap();

        assert!(envelope.into_assets().is_err());
    }

    #[test]
    fn rejects_invalid_secure_url() {
        let envelope: UploadEnvelope = serde_json::from_value(json!({
            "public_id": "x",
            "secure_url": "not a url"
        }))
        .unwrap();

        assert!(envelope.into_assets().is_err());
    }

    #[test]
    fn rejects_relative_public_id_segments() {
        for public_id in ["../../../other/image/upload/x", "user_uploads/./cat", "..", "a/../b"] {
            let envelope: UploadEnvelope = serde_json::from_value(json!({
                "public_id": public_id,
                "secure_url": "https://cdn.example.com/x.png"
            }))
            .unwrap();

            assert!(envelope.into_assets().is_err(), "{public_id} should be rejected");
        }

        assert!(validate_public_id("user_uploads/cat.v2").is_ok());
    }

    #[test]
    fn record_name_falls_back_to_last_id_segment() {
        let asset = UploadedAsset {
            public_id: "user_uploads/holiday/beach".into(),
            secure_url: "https://cdn.example.com/beach.jpg".into(),
            original_filename: Some("   ".into()),
            width: None,
            height: None,
        };

        let record = asset.into_record(Utc::now());
        assert_eq!(record.original_name, "beach");
        assert_eq!(record.natural_size(), None);
    }

    #[test]
    fn record_prefers_original_filename() {
        let asset = UploadedAsset {
            public_id: "user_uploads/abc123".into(),
            secure_url: "https://cdn.example.com/abc123.jpg".into(),
            original_filename: Some("Summer Trip".into()),
            width: Some(800),
            height: Some(600),
        };

        let record = asset.into_record(Utc::now());
        assert_eq!(record.original_name, "Summer Trip");
        assert_eq!(record.natural_size(), Some((800, 600)));
    }
}
