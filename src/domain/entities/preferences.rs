use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLayout {
    #[default]
    Grid,
    List,
}

/// View state of one studio session. Passed explicitly, never global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub dark_mode: bool,
    pub sidebar_open: bool,
    pub layout: GalleryLayout,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        ViewPreferences {
            dark_mode: false,
            sidebar_open: true,
            layout: GalleryLayout::Grid,
        }
    }
}
