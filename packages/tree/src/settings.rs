use serde::{Deserialize, Serialize};

/// Render-time parameters supplied alongside a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_font_family")]
    pub font_family: String,

    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,

    /// Content width in pixels
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    #[serde(default = "default_background_color")]
    pub background_color: String,
}

fn default_font_family() -> String {
    "Arial, Helvetica, sans-serif".to_string()
}

fn default_primary_color() -> String {
    "#2563eb".to_string()
}

fn default_secondary_color() -> String {
    "#64748b".to_string()
}

fn default_max_width() -> u32 {
    600
}

fn default_background_color() -> String {
    "#f4f4f5".to_string()
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            max_width: default_max_width(),
            background_color: default_background_color(),
        }
    }
}
