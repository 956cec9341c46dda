//! Presentation presets for rendered charts

use std::collections::HashMap;

use lazy_static::lazy_static;
use plotters::style::RGBColor;

use crate::utils::ChartError;

/// Colours, fonts and stroke width applied to every panel of one chart.
/// Series colours are fixed by the renderer and not part of a preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    pub name: &'static str,
    pub background: RGBColor,
    pub foreground: RGBColor,
    pub grid: RGBColor,
    pub font: &'static str,
    pub title_size: f64,
    pub label_size: f64,
    pub line_width: u32,
}

const fn preset(
    name: &'static str,
    background: RGBColor,
    foreground: RGBColor,
    grid: RGBColor,
    line_width: u32,
) -> ChartStyle {
    ChartStyle {
        name,
        background,
        foreground,
        grid,
        font: "sans-serif",
        title_size: 22.0,
        label_size: 14.0,
        line_width,
    }
}

lazy_static! {
    static ref STYLE_PRESETS: HashMap<&'static str, ChartStyle> = {
        let presets = [
            preset("default", RGBColor(255, 255, 255), RGBColor(0, 0, 0), RGBColor(176, 176, 176), 2),
            preset("classic", RGBColor(255, 255, 255), RGBColor(0, 0, 0), RGBColor(0, 0, 0), 1),
            preset("ggplot", RGBColor(229, 229, 229), RGBColor(85, 85, 85), RGBColor(255, 255, 255), 2),
            preset("bmh", RGBColor(238, 238, 238), RGBColor(51, 51, 51), RGBColor(178, 178, 178), 2),
            preset("dark_background", RGBColor(0, 0, 0), RGBColor(255, 255, 255), RGBColor(128, 128, 128), 2),
            preset("fivethirtyeight", RGBColor(240, 240, 240), RGBColor(60, 60, 60), RGBColor(203, 203, 203), 3),
            preset("grayscale", RGBColor(255, 255, 255), RGBColor(0, 0, 0), RGBColor(191, 191, 191), 2),
            preset("seaborn", RGBColor(234, 234, 242), RGBColor(38, 38, 38), RGBColor(255, 255, 255), 2),
        ];
        presets.into_iter().map(|style| (style.name, style)).collect()
    };
}

impl ChartStyle {
    /// Resolve a preset by name
    pub fn preset(name: &str) -> Result<Self, ChartError> {
        STYLE_PRESETS
            .get(name)
            .copied()
            .ok_or_else(|| ChartError::InvalidStyle(name.to_string()))
    }

    /// Names of all known presets, sorted
    pub fn available() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = STYLE_PRESETS.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        preset("default", RGBColor(255, 255, 255), RGBColor(0, 0, 0), RGBColor(176, 176, 176), 2)
    }
}
