// Capability traits the core depends on, plus their default implementations
use anyhow::{bail, Context, Result};
use image::DynamicImage;

use crate::config::Config;
use crate::scaling::ScreenSize;
use crate::surface::SurfaceFlags;

/// Downloads raw image bytes
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reports the current screen size in pixels
pub trait ScreenMetricsProvider: Send + Sync {
    fn screen_size(&self) -> Result<ScreenSize>;
}

/// Region of the bitmap the platform should use, in bitmap pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Platform wallpaper facility
pub trait WallpaperSetter: Send + Sync {
    /// Whether `set_bitmap` can target individual surfaces
    fn supports_multiple_surfaces(&self) -> bool;

    /// Set the bitmap on every surface in `which` in a single call
    fn set_bitmap(
        &self,
        image: &DynamicImage,
        crop: Option<CropRect>,
        allow_backup: bool,
        which: SurfaceFlags,
    ) -> Result<()>;

    /// Set the bitmap as the current wallpaper, wherever the platform puts it
    fn set_current(&self, image: &DynamicImage) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

/// Short-lived, user-facing message about an apply attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Success, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { kind: NotificationKind::Failure, message: message.into() }
    }
}

/// Delivers notifications to wherever the user is looking
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

pub struct HttpImageFetcher;

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = attohttpc::get(url)
            .send()
            .with_context(|| format!("Failed to request {}", url))?;
        if !response.is_success() {
            bail!("{} returned {}", url, response.status());
        }
        let bytes = response.bytes().context("Failed to read image body")?;
        log::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Screen size taken from configuration, for hosts without a display query
pub struct FixedScreenMetrics {
    size: ScreenSize,
}

impl FixedScreenMetrics {
    pub fn new(size: ScreenSize) -> Self {
        Self { size }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ScreenSize::new(config.screen_width, config.screen_height))
    }
}

impl ScreenMetricsProvider for FixedScreenMetrics {
    fn screen_size(&self) -> Result<ScreenSize> {
        if self.size.width == 0 || self.size.height == 0 {
            bail!("configured screen size {} is empty", self.size);
        }
        Ok(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_metrics_rejects_empty_size() {
        assert!(FixedScreenMetrics::new(ScreenSize::new(0, 1920)).screen_size().is_err());
        assert_eq!(
            FixedScreenMetrics::new(ScreenSize::new(1080, 1920)).screen_size().unwrap(),
            ScreenSize::new(1080, 1920)
        );
    }
}
