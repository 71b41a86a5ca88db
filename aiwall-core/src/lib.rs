// Core of aiwall: image search, scaling and wallpaper application.
// cli and any other front end should depend on this crate only.

pub mod applier;
pub mod config;
pub mod desktop;
pub mod error;
pub mod scaling;
pub mod search;
pub mod services;
pub mod surface;

pub use applier::{ApplyOutcome, ApplyRequest, WallpaperApplier};
pub use config::{Config, SearchConfig};
pub use desktop::{get_desktop_environment, DesktopWallpaperSetter};
pub use error::{ApplyError, SearchError};
pub use scaling::{scale_for_screen, ScalingMode, ScreenSize};
pub use search::{extract_image_urls, ImageResult, ImageSearchClient, SearchOutcome, SearchQuery};
pub use services::{
    CropRect, FixedScreenMetrics, HttpImageFetcher, ImageFetcher, Notification, NotificationKind,
    Notifier, ScreenMetricsProvider, WallpaperSetter,
};
pub use surface::{SurfaceFlags, TargetSurface};
