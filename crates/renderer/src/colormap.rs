//! Colormaps and value normalization.
//!
//! A [`Colormap`] turns raw cell values into RGBA colours in two steps:
//! values are normalized to `t` in [0, 1] with a [`Normalize`] range, then
//! looked up in a [`Palette`]. NaN and no-data cells get the bad colour.

use geo_common::{ColormapConfig, ColormapKind};
use tracing::debug;

use crate::RenderResult;

pub type Rgba = [u8; 4];

/// N discrete colours. `t` selects `colors[min(floor(t * N), N - 1)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedColormap {
    colors: Vec<Rgba>,
}

impl ListedColormap {
    /// Returns `None` when `colors` is empty.
    pub fn new(colors: Vec<Rgba>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn lookup(&self, t: f64) -> Rgba {
        let n = self.colors.len();
        let index = (t.clamp(0.0, 1.0) * n as f64).floor() as usize;
        self.colors[index.min(n - 1)]
    }
}

/// Piecewise-linear gradient over stops in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedColormap {
    stops: Vec<(f64, Rgba)>,
}

impl SegmentedColormap {
    /// Stops must be ascending; returns `None` for fewer than two.
    pub fn new(stops: Vec<(f64, Rgba)>) -> Option<Self> {
        if stops.len() < 2 || stops.windows(2).any(|w| w[1].0 <= w[0].0) {
            return None;
        }
        Some(Self { stops })
    }

    pub fn lookup(&self, t: f64) -> Rgba {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }

        // t is strictly inside the stop range, so a bracketing pair exists.
        let upper = self.stops.partition_point(|(v, _)| *v <= t);
        let (v0, c0) = self.stops[upper - 1];
        let (v1, c1) = self.stops[upper];
        lerp(c0, c1, (t - v0) / (v1 - v0))
    }
}

fn lerp(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = (a[i] as f64 + (b[i] as f64 - a[i] as f64) * t).round() as u8;
    }
    out
}

/// The lookup table half of a colormap.
#[derive(Debug, Clone, PartialEq)]
pub enum Palette {
    Listed(ListedColormap),
    Segmented(SegmentedColormap),
}

impl Palette {
    pub fn lookup(&self, t: f64) -> Rgba {
        match self {
            Palette::Listed(l) => l.lookup(t),
            Palette::Segmented(s) => s.lookup(t),
        }
    }
}

/// Linear normalization of `[vmin, vmax]` onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// Fill in whichever bound is missing from the finite, non-no-data
    /// values. With no such values the range defaults to [0, 1].
    pub fn autoscale(values: &[f32], nodata: Option<f64>, vmin: Option<f64>, vmax: Option<f64>) -> Self {
        if let (Some(lo), Some(hi)) = (vmin, vmax) {
            return Self::new(lo, hi);
        }

        let nodata = nodata.map(|v| v as f32);
        let (lo, hi) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && Some(*v) != nodata)
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .map(|(lo, hi)| (lo as f64, hi as f64))
            .unwrap_or((0.0, 1.0));

        Self::new(vmin.unwrap_or(lo), vmax.unwrap_or(hi))
    }

    /// A degenerate range maps everything to 0.
    pub fn apply(&self, value: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span == 0.0 {
            0.0
        } else {
            (value - self.vmin) / span
        }
    }
}

/// A palette with its configured range and bad colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    palette: Palette,
    vmin: Option<f64>,
    vmax: Option<f64>,
    bad: Rgba,
}

impl Colormap {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            vmin: None,
            vmax: None,
            bad: [0, 0, 0, 0],
        }
    }

    pub fn with_range(mut self, vmin: Option<f64>, vmax: Option<f64>) -> Self {
        self.vmin = vmin;
        self.vmax = vmax;
        self
    }

    pub fn with_bad_color(mut self, bad: Rgba) -> Self {
        self.bad = bad;
        self
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &ColormapConfig) -> RenderResult<Self> {
        config.validate()?;

        let palette = match &config.kind {
            ColormapKind::Listed(listed) => {
                let colors = listed
                    .colors
                    .iter()
                    .map(|c| c.try_to_rgba().map(|(r, g, b, a)| [r, g, b, a]))
                    .collect::<Result<Vec<_>, _>>()?;
                // validate() rejects empty lists
                Palette::Listed(ListedColormap { colors })
            }
            ColormapKind::Segmented(segmented) => {
                let stops = segmented
                    .stops
                    .iter()
                    .map(|s| s.color.try_to_rgba().map(|(r, g, b, a)| (s.value, [r, g, b, a])))
                    .collect::<Result<Vec<_>, _>>()?;
                Palette::Segmented(SegmentedColormap { stops })
            }
        };

        let (r, g, b, a) = config.bad_color.try_to_rgba()?;
        Ok(Self::new(palette)
            .with_range(config.vmin, config.vmax)
            .with_bad_color([r, g, b, a]))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn bad_color(&self) -> Rgba {
        self.bad
    }

    /// The normalization this colormap uses for `values`.
    pub fn normalize_for(&self, values: &[f32], nodata: Option<f64>) -> Normalize {
        Normalize::autoscale(values, nodata, self.vmin, self.vmax)
    }

    pub fn color(&self, value: f32, norm: &Normalize, nodata: Option<f64>) -> Rgba {
        if !value.is_finite() || nodata.is_some_and(|nd| value == nd as f32) {
            return self.bad;
        }
        self.palette.lookup(norm.apply(value as f64))
    }

    /// Colour every value, autoscaling missing bounds from the data.
    pub fn colorize(&self, values: &[f32], nodata: Option<f64>) -> Vec<Rgba> {
        let norm = self.normalize_for(values, nodata);
        debug!(vmin = norm.vmin, vmax = norm.vmax, cells = values.len(), "Colorizing values");
        values.iter().map(|&v| self.color(v, &norm, nodata)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::Color;

    fn listed(n: u8) -> ListedColormap {
        ListedColormap::new((0..n).map(|i| [i, i, i, 255]).collect()).unwrap()
    }

    #[test]
    fn test_listed_class_index() {
        // 11 classes over 0..=10 map class i to colour i.
        let cmap = Colormap::new(Palette::Listed(listed(11))).with_range(Some(0.0), Some(10.0));
        let values: Vec<f32> = (0..=10).map(|v| v as f32).collect();
        let colors = cmap.colorize(&values, None);
        for (i, c) in colors.iter().enumerate() {
            assert_eq!(c[0] as usize, i);
        }
    }

    #[test]
    fn test_listed_clamps_out_of_range() {
        let l = listed(3);
        assert_eq!(l.lookup(-0.5)[0], 0);
        assert_eq!(l.lookup(1.0)[0], 2);
        assert_eq!(l.lookup(7.0)[0], 2);
    }

    #[test]
    fn test_segmented_interpolates() {
        let s = SegmentedColormap::new(vec![(0.0, [0, 0, 0, 255]), (1.0, [200, 100, 0, 55])]).unwrap();
        assert_eq!(s.lookup(0.5), [100, 50, 0, 155]);
        assert_eq!(s.lookup(-1.0), [0, 0, 0, 255]);
        assert_eq!(s.lookup(2.0), [200, 100, 0, 55]);
    }

    #[test]
    fn test_segmented_picks_bracketing_stops() {
        let s = SegmentedColormap::new(vec![
            (0.0, [0, 0, 0, 255]),
            (0.5, [100, 0, 0, 255]),
            (1.0, [100, 100, 0, 255]),
        ])
        .unwrap();
        assert_eq!(s.lookup(0.5), [100, 0, 0, 255]);
        assert_eq!(s.lookup(0.75), [100, 50, 0, 255]);
    }

    #[test]
    fn test_segmented_rejects_unordered_stops() {
        assert!(SegmentedColormap::new(vec![(0.5, [0; 4]), (0.5, [0; 4])]).is_none());
        assert!(SegmentedColormap::new(vec![(0.0, [0; 4])]).is_none());
        assert!(ListedColormap::new(vec![]).is_none());
    }

    #[test]
    fn test_autoscale_ignores_nan_and_nodata() {
        let norm = Normalize::autoscale(&[f32::NAN, -9999.0, 2.0, 6.0], Some(-9999.0), None, None);
        assert_eq!(norm, Normalize::new(2.0, 6.0));

        let partial = Normalize::autoscale(&[2.0, 6.0], None, Some(0.0), None);
        assert_eq!(partial, Normalize::new(0.0, 6.0));

        let empty = Normalize::autoscale(&[f32::NAN], None, None, None);
        assert_eq!(empty, Normalize::new(0.0, 1.0));
    }

    #[test]
    fn test_degenerate_range_maps_to_zero() {
        let norm = Normalize::new(3.0, 3.0);
        assert_eq!(norm.apply(3.0), 0.0);
    }

    #[test]
    fn test_bad_color_for_nan_and_nodata() {
        let cmap = Colormap::new(Palette::Listed(listed(2))).with_bad_color([1, 2, 3, 4]);
        let colors = cmap.colorize(&[f32::NAN, 0.0, 1.0], Some(0.0));
        assert_eq!(colors[0], [1, 2, 3, 4]);
        assert_eq!(colors[1], [1, 2, 3, 4]);
        assert_eq!(colors[2], [1, 1, 1, 255]);
    }

    #[test]
    fn test_from_config() {
        let config = ColormapConfig::from_yaml(
            r##"
type: listed
colors: ["#ffffff00", "#006d2c"]
vmin: 0
vmax: 1
bad_color: "#ff0000"
"##,
        )
        .unwrap();
        let cmap = Colormap::from_config(&config).unwrap();
        assert_eq!(cmap.bad_color(), [255, 0, 0, 255]);
        let colors = cmap.colorize(&[0.0, 1.0], None);
        assert_eq!(colors, vec![[255, 255, 255, 0], [0, 109, 44, 255]]);
    }

    #[test]
    fn test_from_config_rejects_bad_color_string() {
        let mut config = ColormapConfig::from_yaml("type: listed\ncolors: ['#000000']").unwrap();
        config.bad_color = Color::hex("#zz");
        assert!(Colormap::from_config(&config).is_err());
    }
}
