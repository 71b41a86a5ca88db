use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;

// Bilinear, the same quality as a filtered platform bitmap scale
const SCALE_FILTER: FilterType = FilterType::Triangle;

/// How a source image is fitted to the screen before it is handed to the setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingMode {
    /// Forward the image as-is and let the platform setter center-crop it.
    #[default]
    CenterCrop,
    /// Preserve aspect ratio, pad the remainder with black.
    FitWithLetterbox,
    /// Scale to exactly the screen size, ignoring aspect ratio.
    Stretch,
}

impl ScalingMode {
    pub fn display_name(self) -> &'static str {
        match self {
            ScalingMode::CenterCrop => "Center Crop",
            ScalingMode::FitWithLetterbox => "Fit Screen",
            ScalingMode::Stretch => "Stretch",
        }
    }
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ScalingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crop" | "center-crop" => Ok(ScalingMode::CenterCrop),
            "fit" | "letterbox" => Ok(ScalingMode::FitWithLetterbox),
            "stretch" => Ok(ScalingMode::Stretch),
            other => Err(format!("unknown scaling mode '{}' (expected crop, fit or stretch)", other)),
        }
    }
}

/// Screen size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

pub fn scale_for_screen(image: DynamicImage, mode: ScalingMode, screen: ScreenSize) -> DynamicImage {
    match mode {
        ScalingMode::CenterCrop => image,
        ScalingMode::FitWithLetterbox => DynamicImage::ImageRgba8(fit_with_letterbox(&image, screen)),
        ScalingMode::Stretch => image.resize_exact(screen.width, screen.height, SCALE_FILTER),
    }
}

/// Size of the image after an aspect-preserving fit into `screen`.
pub fn fitted_size(width: u32, height: u32, screen: ScreenSize) -> (u32, u32) {
    let ratio_x = screen.width as f64 / width as f64;
    let ratio_y = screen.height as f64 / height as f64;
    let ratio = ratio_x.min(ratio_y);

    // Truncate like an integer cast of the scaled size, never below 1px or above the screen
    let new_width = ((width as f64 * ratio) as u32).clamp(1, screen.width.max(1));
    let new_height = ((height as f64 * ratio) as u32).clamp(1, screen.height.max(1));
    (new_width, new_height)
}

fn fit_with_letterbox(image: &DynamicImage, screen: ScreenSize) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fitted_size(width, height, screen);

    let scaled = imageops::resize(image, new_width, new_height, SCALE_FILTER);

    let mut canvas = RgbaImage::from_pixel(screen.width, screen.height, Rgba([0, 0, 0, 255]));
    let left = screen.width.saturating_sub(new_width) / 2;
    let top = screen.height.saturating_sub(new_height) / 2;
    imageops::overlay(&mut canvas, &scaled, left as i64, top as i64);

    log::debug!(
        "Letterboxed {}x{} -> {}x{} at ({}, {}) on {}",
        width, height, new_width, new_height, left, top, screen
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    #[test]
    fn test_fitted_size_wide_image_on_portrait_screen() {
        let screen = ScreenSize::new(100, 200);
        assert_eq!(fitted_size(200, 100, screen), (100, 50));
    }

    #[test]
    fn test_fitted_size_upscales_small_image() {
        let screen = ScreenSize::new(1080, 1920);
        assert_eq!(fitted_size(540, 960, screen), (1080, 1920));
    }

    #[test]
    fn test_fit_pads_with_black() {
        let white = solid(200, 100, [255, 255, 255, 255]);
        let screen = ScreenSize::new(100, 200);

        let out = scale_for_screen(white, ScalingMode::FitWithLetterbox, screen).to_rgba8();
        assert_eq!(out.dimensions(), (100, 200));

        // Inner image occupies rows 75..125
        for (x, y, pixel) in out.enumerate_pixels() {
            if (75..125).contains(&y) {
                assert_eq!(pixel.0, [255, 255, 255, 255], "inner pixel ({}, {})", x, y);
            } else {
                assert_eq!(pixel.0, [0, 0, 0, 255], "padding pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_fit_pillarbox_for_tall_image() {
        let red = solid(50, 400, [255, 0, 0, 255]);
        let screen = ScreenSize::new(300, 200);

        let out = scale_for_screen(red, ScalingMode::FitWithLetterbox, screen).to_rgba8();
        assert_eq!(out.dimensions(), (300, 200));
        // 25x200 centered: columns 137..162
        assert_eq!(out.get_pixel(0, 100).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(136, 100).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(150, 100).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(162, 100).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(299, 199).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_stretch_ignores_aspect_ratio() {
        let img = solid(37, 911, [10, 20, 30, 255]);
        let screen = ScreenSize::new(1080, 1920);

        let out = scale_for_screen(img, ScalingMode::Stretch, screen);
        assert_eq!(out.dimensions(), (1080, 1920));
    }

    #[test]
    fn test_center_crop_passes_through() {
        let img = solid(640, 480, [1, 2, 3, 255]);
        let out = scale_for_screen(img.clone(), ScalingMode::CenterCrop, ScreenSize::new(1080, 1920));
        assert_eq!(out, img);
    }

    #[test]
    fn test_parse_scaling_mode() {
        assert_eq!("fit".parse::<ScalingMode>().unwrap(), ScalingMode::FitWithLetterbox);
        assert_eq!("CROP".parse::<ScalingMode>().unwrap(), ScalingMode::CenterCrop);
        assert_eq!("stretch".parse::<ScalingMode>().unwrap(), ScalingMode::Stretch);
        assert!("zoom".parse::<ScalingMode>().is_err());
    }
}
