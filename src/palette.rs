use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// An RGB color as sent to the client (0xRRGGBB)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ColorTag(pub u32);

/// Highlight used for the spangram regardless of color scheme
pub const SPANGRAM_COLOR: ColorTag = ColorTag(0xffeb3b);

/// Color schemes a player can pick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    Light,
    Midnight,
    Ocean,
    Sunset,
    Forest,
    Royal,
    Neon,
    #[default]
    Purple,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Palette {
    pub background: ColorTag,
    pub cell_fill: ColorTag,
    pub text: ColorTag,
    pub found_color: ColorTag,
    pub selection_color: ColorTag,
    pub line_color: ColorTag,
    pub hint_color: ColorTag,
}

impl Palette {
    const fn new(colors: [u32; 7]) -> Self {
        Self {
            background: ColorTag(colors[0]),
            cell_fill: ColorTag(colors[1]),
            text: ColorTag(colors[2]),
            found_color: ColorTag(colors[3]),
            selection_color: ColorTag(colors[4]),
            line_color: ColorTag(colors[5]),
            hint_color: ColorTag(colors[6]),
        }
    }
}

const PURPLE: Palette =
    Palette::new([0xf5f7fa, 0xe8ecf0, 0x2c3e50, 0x667eea, 0xcce7ff, 0xbdc3c7, 0xe74c3c]);

/// background, cell fill, text, found, selection, line, hint
pub static PALETTES: Lazy<HashMap<ColorScheme, Palette>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert(
        ColorScheme::Light,
        Palette::new([0xffffff, 0xf5f5f5, 0x000000, 0xd1d5db, 0xe5e7eb, 0x9ca3af, 0x6b7280]),
    );
    map.insert(
        ColorScheme::Midnight,
        Palette::new([0x0a0a0f, 0x1e293b, 0xe2e8f0, 0x334155, 0x475569, 0x64748b, 0xfbbf24]),
    );
    map.insert(
        ColorScheme::Ocean,
        Palette::new([0xe0f2fe, 0xbae6fd, 0x0c4a6e, 0x06b6d4, 0x7dd3fc, 0x38bdf8, 0xf97316]),
    );
    map.insert(
        ColorScheme::Sunset,
        Palette::new([0xfff7ed, 0xfed7aa, 0x7c2d12, 0xfb923c, 0xfef3c7, 0xfdba74, 0xdc2626]),
    );
    map.insert(
        ColorScheme::Forest,
        Palette::new([0xf0fdf4, 0xa7f3d0, 0x064e3b, 0x10b981, 0xd1fae5, 0x6ee7b7, 0xf59e0b]),
    );
    map.insert(
        ColorScheme::Royal,
        Palette::new([0xfaf5ff, 0xe9d5ff, 0x4c1d95, 0xa78bfa, 0xddd6fe, 0xc084fc, 0xf59e0b]),
    );
    map.insert(
        ColorScheme::Neon,
        Palette::new([0x0f0f23, 0x1a1a2e, 0x00ff88, 0xff00ff, 0x00ffff, 0xff00ff, 0xffff00]),
    );
    map.insert(ColorScheme::Purple, PURPLE);

    map
});

/// Look up the palette for a scheme
pub fn palette_for(scheme: ColorScheme) -> Palette {
    PALETTES.get(&scheme).copied().unwrap_or(PURPLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scheme_has_a_palette() {
        let schemes = [
            ColorScheme::Light,
            ColorScheme::Midnight,
            ColorScheme::Ocean,
            ColorScheme::Sunset,
            ColorScheme::Forest,
            ColorScheme::Royal,
            ColorScheme::Neon,
            ColorScheme::Purple,
        ];
        for scheme in schemes {
            assert!(PALETTES.contains_key(&scheme), "missing palette for {:?}", scheme);
        }
    }

    #[test]
    fn test_default_scheme_is_purple() {
        let palette = palette_for(ColorScheme::default());
        assert_eq!(palette.found_color, ColorTag(0x667eea));
        assert_eq!(palette.hint_color, ColorTag(0xe74c3c));
    }

    #[test]
    fn test_scheme_deserializes_from_snake_case() {
        let scheme: ColorScheme = serde_json::from_str("\"midnight\"").unwrap();
        assert_eq!(palette_for(scheme).background, ColorTag(0x0a0a0f));
    }
}
