use std::{io::ErrorKind, path::Path};

use eyre::{Context, Result};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use tokio::fs::{read, remove_file};
use tracing::debug;

/// Reads a whole file, `None` if it does not exist
pub async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).wrap_err_with(|| format!("Read {}", path.display())),
    }
}

/// Removes an output left over from an earlier run
pub async fn remove_stale(path: &Path) -> Result<()> {
    match remove_file(path).await {
        Ok(()) => {
            debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).wrap_err_with(|| format!("Remove {}", path.display())),
    }
}

/// Sequential colour maps used for grouped bar series
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Colormap {
    #[default]
    Viridis,
    Plasma,
    RdYlBu,
    Greens,
}

impl Colormap {
    fn stops(&self) -> &'static [RGBColor] {
        match self {
            Colormap::Viridis => &[
                RGBColor(0x44, 0x01, 0x54),
                RGBColor(0x3b, 0x52, 0x8b),
                RGBColor(0x21, 0x91, 0x8c),
                RGBColor(0x5e, 0xc9, 0x62),
                RGBColor(0xfd, 0xe7, 0x25),
            ],
            Colormap::Plasma => &[
                RGBColor(0x0d, 0x08, 0x87),
                RGBColor(0x7e, 0x03, 0xa8),
                RGBColor(0xcc, 0x47, 0x78),
                RGBColor(0xf8, 0x95, 0x40),
                RGBColor(0xf0, 0xf9, 0x21),
            ],
            Colormap::RdYlBu => &[
                RGBColor(0xa5, 0x00, 0x26),
                RGBColor(0xf4, 0x6d, 0x43),
                RGBColor(0xfe, 0xe0, 0x90),
                RGBColor(0xe0, 0xf3, 0xf8),
                RGBColor(0x74, 0xad, 0xd1),
                RGBColor(0x31, 0x36, 0x95),
            ],
            Colormap::Greens => &[
                RGBColor(0xf7, 0xfc, 0xf5),
                RGBColor(0xc7, 0xe9, 0xc0),
                RGBColor(0x74, 0xc4, 0x76),
                RGBColor(0x23, 0x8b, 0x45),
                RGBColor(0x00, 0x44, 0x1b),
            ],
        }
    }

    /// Colour at `t` in `[0, 1]`, linearly interpolated between stops
    pub fn at(&self, t: f64) -> RGBColor {
        let stops = self.stops();
        let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = pos - lo as f64;
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (stops[lo], stops[hi]);
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }

    /// `n` evenly spaced colours from both ends of the map
    pub fn sample(&self, n: usize) -> Vec<RGBColor> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.0)],
            _ => (0..n)
                .map(|i| self.at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_span_the_map() {
        let colors = Colormap::Viridis.sample(3);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], RGBColor(0x44, 0x01, 0x54));
        assert_eq!(colors[1], RGBColor(0x21, 0x91, 0x8c));
        assert_eq!(colors[2], RGBColor(0xfd, 0xe7, 0x25));
        assert!(Colormap::Greens.sample(0).is_empty());
        assert_eq!(Colormap::Plasma.sample(1), vec![Colormap::Plasma.at(0.0)]);
    }

    #[test]
    fn interpolates_between_stops() {
        let mid = Colormap::Greens.at(0.125);
        assert_eq!(mid, RGBColor(0xdf, 0xf3, 0xdb));
    }

    #[tokio::test]
    async fn stale_outputs_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.png");
        std::fs::write(&path, b"png").unwrap();
        remove_stale(&path).await.unwrap();
        assert!(!path.exists());
        remove_stale(&path).await.unwrap();
        assert!(read_optional(&path).await.unwrap().is_none());
    }
}
