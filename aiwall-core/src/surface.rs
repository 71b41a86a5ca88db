use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Platform wallpaper slot bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFlags(u32);

impl SurfaceFlags {
    pub const SYSTEM: SurfaceFlags = SurfaceFlags(1);
    pub const LOCK: SurfaceFlags = SurfaceFlags(2);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: SurfaceFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SurfaceFlags {
    type Output = SurfaceFlags;

    fn bitor(self, rhs: SurfaceFlags) -> SurfaceFlags {
        SurfaceFlags(self.0 | rhs.0)
    }
}

/// Which screen(s) receive the wallpaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSurface {
    #[default]
    Home,
    Lock,
    Both,
}

impl TargetSurface {
    pub fn flags(self) -> SurfaceFlags {
        match self {
            TargetSurface::Home => SurfaceFlags::SYSTEM,
            TargetSurface::Lock => SurfaceFlags::LOCK,
            TargetSurface::Both => SurfaceFlags::SYSTEM | SurfaceFlags::LOCK,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TargetSurface::Home => "Home Screen",
            TargetSurface::Lock => "Lock Screen",
            TargetSurface::Both => "Both Screens",
        }
    }
}

impl fmt::Display for TargetSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TargetSurface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "home" | "system" => Ok(TargetSurface::Home),
            "lock" => Ok(TargetSurface::Lock),
            "both" => Ok(TargetSurface::Both),
            other => Err(format!("unknown target surface '{}' (expected home, lock or both)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_per_target() {
        assert_eq!(TargetSurface::Home.flags(), SurfaceFlags::SYSTEM);
        assert_eq!(TargetSurface::Lock.flags(), SurfaceFlags::LOCK);

        let both = TargetSurface::Both.flags();
        assert_eq!(both.bits(), 3);
        assert!(both.contains(SurfaceFlags::SYSTEM));
        assert!(both.contains(SurfaceFlags::LOCK));
        assert!(!TargetSurface::Home.flags().contains(SurfaceFlags::LOCK));
    }

    #[test]
    fn test_parse_target() {
        assert_eq!("Lock".parse::<TargetSurface>().unwrap(), TargetSurface::Lock);
        assert_eq!(" both ".parse::<TargetSurface>().unwrap(), TargetSurface::Both);
        assert!("desk".parse::<TargetSurface>().is_err());
    }
}
