//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of bubble colours a theme provides (one per kind).
pub const BUBBLE_COLOURS: usize = 8;

const ONEDARK_BUBBLES: [&str; BUBBLE_COLOURS] = [
    "#E06C75", // red
    "#61AFEF", // blue
    "#98C379", // green
    "#E5C07B", // yellow
    "#C678DD", // magenta
    "#56B6C2", // cyan
    "#D19A66", // orange
    "#DCDFE4", // white
];

const HIGH_CONTRAST_BUBBLES: [&str; BUBBLE_COLOURS] = [
    "#FF0000", "#0088FF", "#00FF00", "#FFFF00", "#FF00FF", "#00FFFF", "#FF8800", "#FFFFFF",
];

/// Tol "bright"/"vibrant" hues; distinguishable without red/green.
const COLORBLIND_BUBBLES: [&str; BUBBLE_COLOURS] = [
    "#0077BB", "#EE7733", "#009988", "#CC3311", "#EE3377", "#BBBB00", "#33BBEE", "#BBBBBB",
];

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Bubble colours, indexed by kind.
    pub bubbles: [Color; BUBBLE_COLOURS],
    /// Board background.
    pub bg: Color,
    /// Background behind the selected group.
    pub selected_bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, stats).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (key hints).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

/// Hex literals in this module are known-good; fall back to grey rather than panic.
fn hex(s: &str) -> Color {
    parse_hex(s).unwrap_or(Color::Gray)
}

fn palette_colours(hexes: [&str; BUBBLE_COLOURS]) -> [Color; BUBBLE_COLOURS] {
    hexes.map(hex)
}

impl Theme {
    /// Hardcoded One Dark defaults (values from onedark.theme).
    pub fn onedark_default() -> Self {
        Self {
            bubbles: palette_colours(ONEDARK_BUBBLES),
            bg: hex("#282C34"),          // main_bg
            selected_bg: hex("#3E4452"), // selected_bg
            div_line: hex("#3F444F"),    // div_line
            main_fg: hex("#ABB2BF"),     // main_fg
            title: hex("#E5C07B"),       // title
            inactive_fg: hex("#5C6370"), // inactive_fg
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override bubble colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.bubbles = palette_colours(HIGH_CONTRAST_BUBBLES),
            crate::Palette::Colorblind => self.bubbles = palette_colours(COLORBLIND_BUBBLES),
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let defaults = Self::onedark_default();
        // Keys follow onedark.theme; bubbles borrow the graph colours.
        let keys: [&[&str]; BUBBLE_COLOURS] = [
            &["cpu_end", "temp_end"],
            &["cpu_box"],
            &["mem_box", "cpu_start"],
            &["cpu_mid"],
            &["net_box"],
            &["hi_fg", "proc_misc"],
            &["temp_mid", "used_mid"],
            &["main_fg"],
        ];
        let mut bubbles = defaults.bubbles;
        for (colour, candidates) in bubbles.iter_mut().zip(keys) {
            if let Some(c) = candidates.iter().find_map(|&k| get(k)) {
                *colour = c;
            }
        }
        Self {
            bubbles,
            bg: get("main_bg").unwrap_or(defaults.bg),
            selected_bg: get("selected_bg").unwrap_or(defaults.selected_bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Colour for a bubble kind.
    #[inline]
    pub fn bubble_color(&self, kind: u8) -> Color {
        self.bubbles[(kind as usize) % BUBBLE_COLOURS]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
        assert!(parse_hex("#é1").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_from_map_overrides_known_keys() {
        let map = parse_theme_file(
            r##"
# comment
theme[cpu_end]="#112233"
theme[selected_bg]='#445566'
theme[bogus]="#000000"
"##,
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.bubble_color(0), Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.selected_bg, Color::Rgb(0x44, 0x55, 0x66));
        assert_eq!(theme.bubble_color(1), Theme::onedark_default().bubbles[1]);
    }

    #[test]
    fn test_palettes_give_distinct_colours() {
        for palette in [
            crate::Palette::Normal,
            crate::Palette::HighContrast,
            crate::Palette::Colorblind,
        ] {
            let theme = Theme::default_for_palette(palette);
            for i in 0..BUBBLE_COLOURS {
                for j in i + 1..BUBBLE_COLOURS {
                    assert_ne!(theme.bubbles[i], theme.bubbles[j], "{palette:?} {i} {j}");
                }
            }
        }
    }

    #[test]
    fn test_missing_theme_file_uses_defaults() {
        let theme = Theme::load(Some(Path::new("/nonexistent/bubbles.theme")), crate::Palette::Normal)
            .unwrap();
        assert_eq!(theme.bg, Theme::onedark_default().bg);
    }
}
