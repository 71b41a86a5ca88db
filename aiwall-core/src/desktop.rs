use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::services::{CropRect, WallpaperSetter};
use crate::surface::SurfaceFlags;

pub fn get_desktop_environment() -> String {
    detect_desktop_environment(|name| std::env::var(name).ok())
}

/// Classify the session from environment lookups, most specific hint first.
pub fn detect_desktop_environment<F>(var: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    const KNOWN: [&str; 14] = [
        "gnome", "unity", "cinnamon", "mate", "xfce4", "lxde", "fluxbox",
        "blackbox", "openbox", "icewm", "jwm", "afterstep", "trinity", "kde",
    ];

    if let Some(session) = var("DESKTOP_SESSION").map(|s| s.to_lowercase()) {
        if KNOWN.contains(&session.as_str()) {
            return session;
        }

        // Distro flavours name the session after themselves
        let flavour = match session.as_str() {
            s if s.contains("xfce") || s.starts_with("xubuntu") => Some("xfce4"),
            s if s.starts_with("ubuntustudio") || s.starts_with("kubuntu") => Some("kde"),
            s if s.starts_with("lubuntu") => Some("lxde"),
            s if s.starts_with("ubuntu") => Some("gnome"),
            _ => None,
        };
        if let Some(flavour) = flavour {
            return flavour.to_string();
        }
    }

    if var("KDE_FULL_SESSION").as_deref() == Some("true") {
        return "kde".to_string();
    }
    if var("GNOME_DESKTOP_SESSION_ID").is_some() {
        return "gnome".to_string();
    }

    "unknown".to_string()
}

/// Sets wallpapers on a desktop session.
///
/// The raster is written to `output_dir` first since desktop backends only
/// accept file paths. GNOME-family sessions expose separate background and
/// screensaver (lock) keys, so only they report multi-surface support.
pub struct DesktopWallpaperSetter {
    output_dir: PathBuf,
    desktop_env: String,
}

impl DesktopWallpaperSetter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            desktop_env: get_desktop_environment(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir())
    }

    pub fn with_desktop_environment(mut self, desktop_env: impl Into<String>) -> Self {
        self.desktop_env = desktop_env.into();
        self
    }

    fn is_gnome_family(&self) -> bool {
        matches!(self.desktop_env.as_str(), "gnome" | "unity" | "cinnamon")
    }

    /// Write the raster as PNG and return its path
    pub fn persist(&self, image: &DynamicImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        // Timestamp for humans, random suffix so concurrent applies never share a file
        let prefix = format!("wallpaper-{}-", Local::now().format("%Y%m%d-%H%M%S"));
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".png")
            .tempfile_in(&self.output_dir)
            .with_context(|| format!("Failed to create a file in {}", self.output_dir.display()))?;

        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .context("Failed to encode wallpaper as PNG")?;
        file.write_all(bytes.get_ref())
            .with_context(|| format!("Failed to write {}", file.path().display()))?;

        let (_, path) = file
            .keep()
            .map_err(|e| anyhow!("Failed to keep {}: {}", e.file.path().display(), e.error))?;
        log::debug!("Saved wallpaper raster to {}", path.display());
        Ok(path)
    }
}

impl WallpaperSetter for DesktopWallpaperSetter {
    fn supports_multiple_surfaces(&self) -> bool {
        self.is_gnome_family()
    }

    fn set_bitmap(
        &self,
        image: &DynamicImage,
        crop: Option<CropRect>,
        allow_backup: bool,
        which: SurfaceFlags,
    ) -> Result<()> {
        if crop.is_some() {
            log::warn!("Crop hints are not supported on {}, ignoring", self.desktop_env);
        }
        log::debug!("allow_backup={} has no desktop equivalent", allow_backup);

        let path = self.persist(image)?;
        let uri = format!("file://{}", path.to_string_lossy());

        if which.contains(SurfaceFlags::SYSTEM) {
            gsettings(&["set", "org.gnome.desktop.background", "picture-uri", &uri])?;
            // Newer GNOME reads a separate key in dark mode; older ones lack it
            if let Err(e) = gsettings(&["set", "org.gnome.desktop.background", "picture-uri-dark", &uri]) {
                log::debug!("picture-uri-dark not set: {}", e);
            }
            gsettings(&["set", "org.gnome.desktop.background", "picture-options", "zoom"])?;
        }
        if which.contains(SurfaceFlags::LOCK) {
            gsettings(&["set", "org.gnome.desktop.screensaver", "picture-uri", &uri])?;
            gsettings(&["set", "org.gnome.desktop.screensaver", "picture-options", "zoom"])?;
        }

        log::info!("Wallpaper set successfully to: {}", path.display());
        Ok(())
    }

    fn set_current(&self, image: &DynamicImage) -> Result<()> {
        let path = self.persist(image)?;
        let file_loc = path.to_string_lossy();

        // Use wallpaper crate for cross-platform wallpaper setting
        match wallpaper::set_from_path(&file_loc) {
            Ok(_) => {
                if let Err(e) = wallpaper::set_mode(wallpaper::Mode::Crop) {
                    log::debug!("Could not switch wallpaper mode to crop: {}", e);
                }
                log::info!("Wallpaper set successfully to: {}", file_loc);
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to set wallpaper: {}", e);

                // Fallback to platform-specific methods for Linux if wallpaper crate fails
                if cfg!(target_os = "linux") && set_wallpaper_linux_fallback(&path, &self.desktop_env)? {
                    return Ok(());
                }
                Err(anyhow!("Failed to set wallpaper: {}", e))
            }
        }
    }
}

fn gsettings(args: &[&str]) -> Result<()> {
    let output = Command::new("gsettings")
        .args(args)
        .output()
        .context("Failed to run gsettings")?;
    if !output.status.success() {
        bail!(
            "gsettings {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

fn set_wallpaper_linux_fallback(file_path: &Path, desktop_env: &str) -> Result<bool> {
    let file_loc = file_path.to_string_lossy();

    match desktop_env {
        "mate" => {
            let output = Command::new("gsettings")
                .args(["set", "org.mate.background", "picture-filename", &file_loc])
                .output()?;
            Ok(output.status.success())
        }
        "xfce4" => {
            // Every monitor's workspace0 image, then the primary monitor defaults
            let list_output = Command::new("xfconf-query")
                .args(["-c", "xfce4-desktop", "-l"])
                .output()?;

            if list_output.status.success() {
                let paths = String::from_utf8_lossy(&list_output.stdout);
                for path in paths.lines().filter(|line| line.contains("workspace0/last-image")) {
                    if !path.trim().is_empty() {
                        Command::new("xfconf-query")
                            .args(["-c", "xfce4-desktop", "-p", path.trim(), "-s", &file_loc])
                            .output()?;
                    }
                }
            }

            Command::new("xfconf-query")
                .args(["-c", "xfce4-desktop", "-p", "/backdrop/screen0/monitor0/image-path", "-s", &file_loc])
                .output()?;
            // 5 = zoomed
            Command::new("xfconf-query")
                .args(["-c", "xfce4-desktop", "-p", "/backdrop/screen0/monitor0/image-style", "-s", "5"])
                .output()?;

            let output = Command::new("xfdesktop").arg("--reload").output()?;
            Ok(output.status.success())
        }
        "lxde" => {
            let output = Command::new("pcmanfm")
                .arg("--set-wallpaper")
                .arg(file_loc.as_ref())
                .arg("--wallpaper-mode=crop")
                .output()?;
            Ok(output.status.success())
        }
        "fluxbox" | "jwm" | "openbox" | "afterstep" => {
            let output = Command::new("fbsetbg").arg(file_loc.as_ref()).output()?;
            Ok(output.status.success())
        }
        "icewm" => {
            let output = Command::new("icewmbg").arg(file_loc.as_ref()).output()?;
            Ok(output.status.success())
        }
        "blackbox" => {
            let output = Command::new("bsetbg")
                .args(["-full", &file_loc])
                .output()?;
            Ok(output.status.success())
        }
        "kde" | "trinity" => {
            // Plasma only takes a wallpaper through a D-Bus script
            log::error!("No command-line wallpaper fallback for {}", desktop_env);
            Ok(false)
        }
        _ => {
            log::error!("Desktop environment '{}' not supported", desktop_env);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::thread;

    fn detect(vars: &[(&str, &str)]) -> String {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        detect_desktop_environment(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_detect_desktop_environment() {
        assert_eq!(detect(&[("DESKTOP_SESSION", "XFCE4")]), "xfce4");
        assert_eq!(detect(&[("DESKTOP_SESSION", "xubuntu")]), "xfce4");
        assert_eq!(detect(&[("DESKTOP_SESSION", "kubuntu")]), "kde");
        assert_eq!(detect(&[("DESKTOP_SESSION", "lubuntu")]), "lxde");
        assert_eq!(detect(&[("DESKTOP_SESSION", "ubuntu-wayland")]), "gnome");
        assert_eq!(detect(&[("KDE_FULL_SESSION", "true")]), "kde");
        assert_eq!(detect(&[("GNOME_DESKTOP_SESSION_ID", "this-is-deprecated")]), "gnome");
        assert_eq!(detect(&[("DESKTOP_SESSION", "sway")]), "unknown");
        assert_eq!(detect(&[]), "unknown");
    }

    #[test]
    fn test_fallback_declines_without_a_command() {
        let path = Path::new("/tmp/wallpaper.png");
        // GNOME is handled through gsettings before any fallback runs
        assert!(!set_wallpaper_linux_fallback(path, "gnome").unwrap());
        assert!(!set_wallpaper_linux_fallback(path, "kde").unwrap());
        assert!(!set_wallpaper_linux_fallback(path, "trinity").unwrap());
        assert!(!set_wallpaper_linux_fallback(path, "unknown").unwrap());
    }

    #[test]
    fn test_multi_surface_only_on_gnome_family() {
        let dir = tempfile::tempdir().unwrap();
        let setter = DesktopWallpaperSetter::new(dir.path());

        assert!(setter.with_desktop_environment("gnome").supports_multiple_surfaces());
        let setter = DesktopWallpaperSetter::new(dir.path()).with_desktop_environment("xfce4");
        assert!(!setter.supports_multiple_surfaces());
    }

    #[test]
    fn test_persist_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let setter = DesktopWallpaperSetter::new(dir.path().join("out"));
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([9, 9, 9, 255])));

        let path = setter.persist(&image).unwrap();
        assert!(path.starts_with(dir.path().join("out")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let reloaded = image::open(&path).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (4, 3));
    }

    #[test]
    fn test_concurrent_persist_paths_differ() {
        let dir = tempfile::tempdir().unwrap();
        let setter = Arc::new(DesktopWallpaperSetter::new(dir.path()));

        let writers: Vec<_> = [[255, 0, 0, 255], [0, 0, 255, 255]]
            .into_iter()
            .map(|color| {
                let setter = Arc::clone(&setter);
                thread::spawn(move || {
                    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba(color)));
                    let paths: Vec<PathBuf> = (0..50).map(|_| setter.persist(&image).unwrap()).collect();
                    (color, paths)
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for writer in writers {
            let (color, paths) = writer.join().unwrap();
            for path in paths {
                assert!(seen.insert(path.clone()), "duplicate path {}", path.display());
                let reloaded = image::open(&path).unwrap().to_rgba8();
                assert_eq!(reloaded.get_pixel(4, 4).0, color, "{}", path.display());
            }
        }
        assert_eq!(seen.len(), 100);
    }
}
