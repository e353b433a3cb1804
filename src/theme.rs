use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Export theme for briefing documents
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub colors: ColorTheme,
    pub fonts: FontTheme,
    pub labels: LabelTheme,
    pub images: ImageTheme,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorTheme {
    /// Title, date line, region headings, TOC header row
    pub accent: String,

    /// Blockquotes
    pub quote_text: String,
    pub quote_border: String,

    /// Code blocks
    pub code_text: String,
    pub code_background: String,

    /// Links and external image references
    pub link: String,

    /// Horizontal rules
    pub rule: String,

    /// Classification header
    pub header_text: String,

    /// TOC header row text
    pub table_header_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontTheme {
    pub body: String,
    pub monospace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelTheme {
    pub title: String,
    pub classification: String,
    pub table_of_contents: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageTheme {
    /// Display size for embedded images, in pixels
    pub width: u32,
    pub height: u32,
}

impl Default for ColorTheme {
    fn default() -> Self {
        ColorTheme {
            accent: "009EDB".to_string(),       // UN Blue
            quote_text: "495057".to_string(),   // Slate Gray
            quote_border: "009EDB".to_string(), // UN Blue
            code_text: "D4D4D4".to_string(),    // Light Gray
            code_background: "1E1E1E".to_string(), // Near Black
            link: "0563C1".to_string(),         // Word Hyperlink Blue
            rule: "CCCCCC".to_string(),         // Silver
            header_text: "000000".to_string(),  // Black
            table_header_text: "FFFFFF".to_string(), // White
        }
    }
}

impl Default for FontTheme {
    fn default() -> Self {
        FontTheme {
            body: "Roboto".to_string(),
            monospace: "Courier New".to_string(),
        }
    }
}

impl Default for LabelTheme {
    fn default() -> Self {
        LabelTheme {
            title: "Morning Meeting Update".to_string(),
            classification: "INTERNAL | NOT FOR FURTHER DISTRIBUTION".to_string(),
            table_of_contents: "TABLE OF CONTENTS".to_string(),
        }
    }
}

impl Default for ImageTheme {
    fn default() -> Self {
        ImageTheme {
            width: 400,
            height: 300,
        }
    }
}

impl Theme {
    /// Load theme from config directory
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        // Return default theme if no config found
        Ok(Theme::default())
    }

    /// Load theme from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read theme file {}", path.display()))?;
        let theme: Theme = toml::from_str(&content)
            .with_context(|| format!("invalid theme file {}", path.display()))?;
        Ok(theme.normalized())
    }

    /// Save theme to config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let content = toml::to_string_pretty(self)?;
            fs::write(&config_path, content)?;
        }

        Ok(())
    }

    /// Get the path to the theme config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("briefing-docx").join("theme.toml"))
    }

    /// Initialize default theme file
    pub fn init_default() -> Result<()> {
        let theme = Theme::default();
        theme.save()?;
        Ok(())
    }

    /// Normalize every colour to the `RRGGBB` form Word expects
    ///
    /// Colours that are not valid hex fall back to the default value.
    pub fn normalized(mut self) -> Self {
        let defaults = ColorTheme::default();
        let c = &mut self.colors;
        for (value, fallback) in [
            (&mut c.accent, defaults.accent),
            (&mut c.quote_text, defaults.quote_text),
            (&mut c.quote_border, defaults.quote_border),
            (&mut c.code_text, defaults.code_text),
            (&mut c.code_background, defaults.code_background),
            (&mut c.link, defaults.link),
            (&mut c.rule, defaults.rule),
            (&mut c.header_text, defaults.header_text),
            (&mut c.table_header_text, defaults.table_header_text),
        ] {
            *value = Self::normalize_hex(value).unwrap_or(fallback);
        }
        self
    }

    /// Convert a hex colour string to upper-case `RRGGBB`
    pub fn normalize_hex(hex: &str) -> Option<String> {
        // Remove # if present
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }

        // Support both 6-character (RGB) and 8-character (RGBA) hex codes
        // For RGBA, A is ignored
        let rgb = match hex.len() {
            6 | 8 => &hex[0..6],
            3 => {
                // Short form #RGB
                let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                return Self::normalize_hex(&expanded);
            }
            _ => return None,
        };

        if rgb.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(rgb.to_ascii_uppercase())
        } else {
            None
        }
    }
}
