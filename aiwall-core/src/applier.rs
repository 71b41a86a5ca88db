use image::DynamicImage;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::ApplyError;
use crate::scaling::{scale_for_screen, ScalingMode};
use crate::services::{ImageFetcher, Notification, Notifier, ScreenMetricsProvider, WallpaperSetter};
use crate::surface::TargetSurface;

/// One user selection: which image, how to scale it, where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRequest {
    pub image_url: String,
    pub scaling: ScalingMode,
    pub target: TargetSurface,
}

impl ApplyRequest {
    pub fn new(image_url: impl Into<String>, scaling: ScalingMode, target: TargetSurface) -> Self {
        Self { image_url: image_url.into(), scaling, target }
    }
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Applied { target: TargetSurface, scaling: ScalingMode },
    Failed(ApplyError),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }

    /// The message shown to the user for this outcome
    pub fn notification(&self) -> Notification {
        match self {
            ApplyOutcome::Applied { target, scaling } => Notification::success(format!(
                "Wallpaper set to {} with {} scaling",
                target, scaling
            )),
            ApplyOutcome::Failed(e) if e.is_load_failure() => Notification::failure("Failed to load image"),
            ApplyOutcome::Failed(e) => Notification::failure(format!("Error setting wallpaper: {}", e)),
        }
    }
}

/// Turns a selected image URL into an applied wallpaper.
#[derive(Clone)]
pub struct WallpaperApplier {
    fetcher: Arc<dyn ImageFetcher>,
    setter: Arc<dyn WallpaperSetter>,
    metrics: Arc<dyn ScreenMetricsProvider>,
}

impl WallpaperApplier {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        setter: Arc<dyn WallpaperSetter>,
        metrics: Arc<dyn ScreenMetricsProvider>,
    ) -> Self {
        Self { fetcher, setter, metrics }
    }

    /// Apply on a blocking worker so the caller's executor thread stays free.
    pub async fn apply(&self, request: &ApplyRequest) -> ApplyOutcome {
        let applier = self.clone();
        let request = request.clone();
        match tokio::task::spawn_blocking(move || applier.apply_blocking(&request)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Apply task failed: {}", e);
                ApplyOutcome::Failed(ApplyError::Task(e.to_string()))
            }
        }
    }

    /// Fire and forget: the outcome is reported through `notifier`.
    ///
    /// Must be called from within a tokio runtime. Concurrent calls are
    /// neither deduplicated nor serialized.
    pub fn spawn_apply(&self, request: ApplyRequest, notifier: Arc<dyn Notifier>) -> JoinHandle<ApplyOutcome> {
        let applier = self.clone();
        tokio::spawn(async move {
            let outcome = applier.apply(&request).await;
            notifier.notify(&outcome.notification());
            outcome
        })
    }

    pub fn apply_blocking(&self, request: &ApplyRequest) -> ApplyOutcome {
        match self.try_apply(request) {
            Ok(()) => {
                log::info!(
                    "Applied {} to {} with {} scaling",
                    request.image_url, request.target, request.scaling
                );
                ApplyOutcome::Applied { target: request.target, scaling: request.scaling }
            }
            Err(e) => {
                log::error!("Failed to apply wallpaper from {}: {}", request.image_url, e);
                ApplyOutcome::Failed(e)
            }
        }
    }

    fn try_apply(&self, request: &ApplyRequest) -> Result<(), ApplyError> {
        let bitmap = self.load_bitmap(&request.image_url)?;

        let screen = self
            .metrics
            .screen_size()
            .map_err(|e| ApplyError::ScreenMetrics(e.to_string()))?;

        let wallpaper = scale_for_screen(bitmap, request.scaling, screen);
        let which = request.target.flags();

        let result = if self.setter.supports_multiple_surfaces() {
            self.setter.set_bitmap(&wallpaper, None, true, which)
        } else {
            log::debug!("Setter has no per-surface support, setting current wallpaper");
            self.setter.set_current(&wallpaper)
        };
        result.map_err(|e| ApplyError::Setter(format!("{:#}", e)))
    }

    /// Download and decode into an owned RGBA raster that supports pixel access.
    fn load_bitmap(&self, url: &str) -> Result<DynamicImage, ApplyError> {
        let bytes = self.fetcher.fetch(url).map_err(|e| ApplyError::Fetch {
            url: url.to_string(),
            message: format!("{:#}", e),
        })?;
        let decoded = image::load_from_memory(&bytes)?;
        log::debug!("Decoded {}x{} image from {}", decoded.width(), decoded.height(), url);
        Ok(DynamicImage::ImageRgba8(decoded.into_rgba8()))
    }
}
