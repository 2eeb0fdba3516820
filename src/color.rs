use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Diverging colour scale: low values cool, high values warm
// ---------------------------------------------------------------------------

const COLD_HUE: f32 = 220.0;
const WARM_HUE: f32 = 0.0;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Maps a value in `[trough, peak]` to a hue between blue and red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueColorScale {
    min: f64,
    max: f64,
}

impl ValueColorScale {
    pub fn new(trough: f64, peak: f64) -> Self {
        Self {
            min: trough.min(peak),
            max: trough.max(peak),
        }
    }

    /// Position of `value` within the scale, clamped to `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / range).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let t = self.fraction(value);
        hsl_to_color32(COLD_HUE + (WARM_HUE - COLD_HUE) * t, 0.75, 0.55)
    }
}

/// Colour of the fitted trend line.
pub fn trend_color() -> Color32 {
    hsl_to_color32(WARM_HUE, 0.85, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_clamped_and_flat_scales_sit_mid() {
        let scale = ValueColorScale::new(-0.5, 1.5);
        assert_eq!(scale.fraction(-0.5), 0.0);
        assert_eq!(scale.fraction(0.5), 0.5);
        assert_eq!(scale.fraction(9.0), 1.0);
        assert_eq!(ValueColorScale::new(1.0, 1.0).fraction(1.0), 0.5);
    }

    #[test]
    fn ends_are_blue_and_red() {
        let scale = ValueColorScale::new(0.0, 1.0);
        let cold = scale.color_for(0.0);
        let warm = scale.color_for(1.0);
        assert!(cold.b() > cold.r());
        assert!(warm.r() > warm.b());
    }
}
