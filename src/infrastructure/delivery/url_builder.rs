use url::Url;

use crate::entities::transformation::{BackgroundMode, TransformationDescriptor};

const THUMBNAIL_TRANSFORMATION: &str = "c_fill,g_auto,w_200,h_150/f_auto,q_auto";

/// Builds delivery URLs of the hosted image service:
/// `{base}/{cloud}/image/upload/{transformations}/{public_id}.{ext}`.
#[derive(Debug, Clone)]
pub struct DeliveryUrlBuilder {
    base: Url,
    lossy_quality: u8,
}

impl DeliveryUrlBuilder {
    pub fn new(delivery_base_url: &str, cloud_name: &str, lossy_quality: u8) -> Result<Self, url::ParseError> {
        let root = delivery_base_url.trim_end_matches('/');
        let cloud = cloud_name.trim_matches('/');
        let base = Url::parse(&format!("{root}/{cloud}/image/upload/"))?;

        Ok(DeliveryUrlBuilder { base, lossy_quality })
    }

    /// Transformation path for a descriptor, components separated by `/`.
    pub fn transformation(&self, descriptor: &TransformationDescriptor) -> String {
        let mut components: Vec<String> = Vec::new();
        let fill = descriptor.background_color.as_ref().map(|c| format!("b_rgb:{c}"));
        let padded = descriptor.background_mode == BackgroundMode::SolidColor;
        let mut fill_used = false;

        let mut size = Vec::new();
        let both_sides = descriptor.target_size().is_some();
        if descriptor.aspect_ratio.is_some() || both_sides {
            if padded {
                size.push("c_pad".to_string());
            } else {
                size.push("c_fill".to_string());
                size.push("g_auto".to_string());
            }
            if let Some(ratio) = descriptor.aspect_ratio {
                size.push(format!("ar_{ratio}"));
            }
        } else if descriptor.target_width.is_some() || descriptor.target_height.is_some() {
            size.push("c_limit".to_string());
        }
        if let Some(w) = descriptor.target_width {
            size.push(format!("w_{w}"));
        }
        if let Some(h) = descriptor.target_height {
            size.push(format!("h_{h}"));
        }
        if padded && !size.is_empty() {
            if let Some(fill) = &fill {
                size.push(fill.clone());
                fill_used = true;
            }
        }
        if !size.is_empty() {
            components.push(size.join(","));
        }

        if descriptor.removes_background() {
            if descriptor.preserve_fine_edges {
                components.push("e_background_removal:fineedges_y".to_string());
            } else {
                components.push("e_background_removal".to_string());
            }
        }

        if !fill_used {
            if let Some(fill) = fill {
                components.push(fill);
            }
        }

        if descriptor.output_format.is_lossy() {
            components.push(format!("q_{}", self.lossy_quality));
        }

        components.join("/")
    }

    pub fn rendition_url(&self, public_id: &str, descriptor: &TransformationDescriptor) -> Result<Url, url::ParseError> {
        let transformation = self.transformation(descriptor);
        let asset = format!("{}.{}", encode_public_id(public_id), descriptor.output_format.extension());

        let path = if transformation.is_empty() {
            asset
        } else {
            format!("{transformation}/{asset}")
        };

        self.base.join(&format!("./{path}"))
    }

    pub fn thumbnail_url(&self, public_id: &str) -> Result<Url, url::ParseError> {
        self.base
            .join(&format!("./{THUMBNAIL_TRANSFORMATION}/{}", encode_public_id(public_id)))
    }
}

/// Encodes each id segment. Empty and dot segments are dropped so the
/// result always stays under the upload path.
fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .filter(|segment| !matches!(segment.trim(), "" | "." | ".."))
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
