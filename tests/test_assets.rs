use serde_json::{json, Value};

/// Widget result for one asset in the default upload folder.
pub fn asset(name: &str, original_filename: &str) -> Value {
    json!({
        "public_id": format!("user_uploads/{}", name),
        "secure_url": format!("https://res.cloudinary.com/demo/image/upload/user_uploads/{}.jpg", name),
        "original_filename": original_filename,
        "width": 1200,
        "height": 800
    })
}

/// The `{ "info": [...] }` envelope the upload widget posts back.
pub fn widget_result(assets: Vec<Value>) -> Value {
    json!({ "info": assets })
}

pub fn sized_options(width: u32, height: u32) -> Value {
    json!({
        "size_mode": "dimensions",
        "width": width,
        "height": height,
        "remove_background": true,
        "background_mode": "transparent",
        "output_format": "png"
    })
}
