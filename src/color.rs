use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: sample name → Color32
// ---------------------------------------------------------------------------

/// Stable colour per sample, assigned in sample-index order.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(samples: &[String]) -> Self {
        let mapping = samples
            .iter()
            .cloned()
            .zip(generate_palette(samples.len()))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, sample: &str) -> Color32 {
        self.mapping.get(sample).copied().unwrap_or(Color32::GRAY)
    }
}
