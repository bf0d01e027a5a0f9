use serde::Deserialize;

const LIGHT_BACKGROUND: &str = "white";
const LIGHT_STROKE: &str = "black";
const LIGHT_FAILURE: &str = "red";
const LIGHT_BADGE_FILL: &str = "lightblue";
const LIGHT_HEADER_FILL: &str = "lightgrey";
const LIGHT_ERROR_FILL: &str = "orangered";
const LIGHT_TRACE_FILL: &str = "lightgreen";
const LIGHT_TIMESTAMP: &str = "blue";

/// Diagram colors, keyed by role. Every field defaults, so a palette file
/// only needs to name the roles it overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct Palette {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_stroke")]
    pub stroke: String,
    #[serde(default = "default_failure")]
    pub failure: String,
    #[serde(default = "default_badge_fill")]
    pub badge_fill: String,
    #[serde(default = "default_header_fill")]
    pub header_fill: String,
    #[serde(default = "default_error_fill")]
    pub error_fill: String,
    #[serde(default = "default_trace_fill")]
    pub trace_fill: String,
    #[serde(default = "default_timestamp")]
    pub timestamp: String,
}

fn default_background() -> String {
    LIGHT_BACKGROUND.to_string()
}
fn default_stroke() -> String {
    LIGHT_STROKE.to_string()
}
fn default_failure() -> String {
    LIGHT_FAILURE.to_string()
}
fn default_badge_fill() -> String {
    LIGHT_BADGE_FILL.to_string()
}
fn default_header_fill() -> String {
    LIGHT_HEADER_FILL.to_string()
}
fn default_error_fill() -> String {
    LIGHT_ERROR_FILL.to_string()
}
fn default_trace_fill() -> String {
    LIGHT_TRACE_FILL.to_string()
}
fn default_timestamp() -> String {
    LIGHT_TIMESTAMP.to_string()
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

impl Palette {
    pub fn light() -> Self {
        Palette {
            background: LIGHT_BACKGROUND.to_string(),
            stroke: LIGHT_STROKE.to_string(),
            failure: LIGHT_FAILURE.to_string(),
            badge_fill: LIGHT_BADGE_FILL.to_string(),
            header_fill: LIGHT_HEADER_FILL.to_string(),
            error_fill: LIGHT_ERROR_FILL.to_string(),
            trace_fill: LIGHT_TRACE_FILL.to_string(),
            timestamp: LIGHT_TIMESTAMP.to_string(),
        }
    }

    pub fn dark() -> Self {
        Palette {
            background: "#1e1e2e".to_string(),
            stroke: "#cdd6f4".to_string(),
            failure: "#f38ba8".to_string(),
            badge_fill: "#313244".to_string(),
            header_fill: "#45475a".to_string(),
            error_fill: "#eba0ac".to_string(),
            trace_fill: "#a6e3a1".to_string(),
            timestamp: "#89b4fa".to_string(),
        }
    }

    pub fn from_builtin(name: &str) -> Result<Self, String> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::light()),
            "dark" => Ok(Self::dark()),
            other => Err(format!(
                "Unknown built-in palette '{}'. Available: light, dark",
                other
            )),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse palette TOML: {}", e))
    }
}
