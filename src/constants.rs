use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Fill colors offered by the background picker, as (hex, label).
pub const PRESET_BACKGROUND_COLORS: [(&str, &str); 10] = [
    ("#ffffff", "White"),
    ("#000000", "Black"),
    ("#ff0000", "Red"),
    ("#00ff00", "Green"),
    ("#0000ff", "Blue"),
    ("#ffff00", "Yellow"),
    ("#ff00ff", "Pink"),
    ("#00ffff", "Cyan"),
    ("#808080", "Gray"),
    ("#800000", "Maroon"),
];

pub const UPLOAD_SOURCES: [&str; 5] = ["local", "url", "camera", "google_drive", "dropbox"];

pub const COMMON_ASPECT_RATIOS: [&str; 5] = ["1:1", "4:3", "3:2", "16:9", "9:16"];
