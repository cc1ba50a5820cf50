//! Flat-shaded quad mesh rendering.
//!
//! A mesh is two row-major planes of target coordinates, one point per
//! cell. Quad (r, c) is spanned by points (r, c), (r, c+1), (r+1, c+1) and
//! (r+1, c) and is filled with the colour of value (r, c), so the last row
//! and column of values never show. Quads are filled with the same
//! centre-sampling rule as the rasterizer.

use geo_common::BoundingBox;
use projection::{CoordinateGrid, TransformedGrid};
use raster::scanline::fill_polygon;
use tracing::debug;

use crate::colormap::{Colormap, Rgba};
use crate::{png, RenderError, RenderResult};

/// Borrowed mesh coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Mesh<'a> {
    xx: &'a [f64],
    yy: &'a [f64],
    rows: usize,
    cols: usize,
}

impl<'a> Mesh<'a> {
    pub fn new(xx: &'a [f64], yy: &'a [f64], rows: usize, cols: usize) -> RenderResult<Self> {
        if xx.len() != rows * cols || yy.len() != rows * cols {
            return Err(RenderError::ShapeMismatch(format!(
                "mesh of {}x{} needs {} points per plane, got x={} y={}",
                rows,
                cols,
                rows * cols,
                xx.len(),
                yy.len()
            )));
        }
        Ok(Self { xx, yy, rows, cols })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn point(&self, row: usize, col: usize) -> (f64, f64) {
        let idx = row * self.cols + col;
        (self.xx[idx], self.yy[idx])
    }
}

impl<'a> From<&'a TransformedGrid> for Mesh<'a> {
    fn from(grid: &'a TransformedGrid) -> Self {
        let (rows, cols) = grid.shape();
        Self {
            xx: grid.xx(),
            yy: grid.yy(),
            rows,
            cols,
        }
    }
}

impl<'a> From<&'a CoordinateGrid> for Mesh<'a> {
    fn from(grid: &'a CoordinateGrid) -> Self {
        let (rows, cols) = grid.shape();
        Self {
            xx: grid.x_plane(),
            yy: grid.y_plane(),
            rows,
            cols,
        }
    }
}

/// The visible window in target coordinates and the output image size.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub bbox: BoundingBox,
    pub width: usize,
    pub height: usize,
    pub background: Rgba,
}

impl MapView {
    pub fn new(bbox: BoundingBox, width: usize, height: usize) -> RenderResult<Self> {
        bbox.validate()?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidView(format!(
                "image size {}x{} must be non-zero",
                width, height
            )));
        }
        Ok(Self {
            bbox,
            width,
            height,
            background: [0, 0, 0, 0],
        })
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    /// Map target coordinates to fractional pixel position (y down).
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.bbox.min_x) / self.bbox.width() * self.width as f64;
        let py = (self.bbox.max_y - y) / self.bbox.height() * self.height as f64;
        (px, py)
    }
}

/// An 8-bit RGBA canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: usize, height: usize, fill: Rgba) -> Self {
        let mut pixels = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            pixels.extend_from_slice(&fill);
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut Vec<u8> {
        &mut self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Composite `color` over the pixel (source-over).
    pub fn blend(&mut self, x: usize, y: usize, color: Rgba) {
        let i = (y * self.width + x) * 4;
        let dst = &mut self.pixels[i..i + 4];
        match color[3] {
            0 => {}
            255 => dst.copy_from_slice(&color),
            a => {
                let sa = a as f32 / 255.0;
                let da = dst[3] as f32 / 255.0;
                let out_a = sa + da * (1.0 - sa);
                for c in 0..3 {
                    let v = (color[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
                    dst[c] = v.round() as u8;
                }
                dst[3] = (out_a * 255.0).round() as u8;
            }
        }
    }

    /// Encode as PNG with optional `tEXt` entries.
    pub fn encode_png(&self, text: &[(&str, &str)]) -> RenderResult<Vec<u8>> {
        png::create_png_auto(&self.pixels, self.width, self.height, text)
    }
}

/// Render `values` (row-major, same shape as `mesh`) as flat-shaded quads.
pub fn render_mesh(
    mesh: &Mesh<'_>,
    values: &[f32],
    nodata: Option<f64>,
    colormap: &Colormap,
    view: &MapView,
) -> RenderResult<RgbaImage> {
    let (rows, cols) = mesh.shape();
    if values.len() != rows * cols {
        return Err(RenderError::ShapeMismatch(format!(
            "{} values for a {}x{} mesh",
            values.len(),
            rows,
            cols
        )));
    }

    let mut image = RgbaImage::new(view.width, view.height, view.background);
    if rows < 2 || cols < 2 {
        return Ok(image);
    }

    let colors = colormap.colorize(values, nodata);
    let mut quads = 0usize;
    let mut skipped = 0usize;
    let mut ring = Vec::with_capacity(4);

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let color = colors[r * cols + c];
            if color[3] == 0 {
                continue;
            }

            ring.clear();
            for (pr, pc) in [(r, c), (r, c + 1), (r + 1, c + 1), (r + 1, c)] {
                let (x, y) = mesh.point(pr, pc);
                ring.push(view.to_pixel(x, y));
            }
            if ring.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
                skipped += 1;
                continue;
            }

            fill_polygon(std::slice::from_ref(&ring), view.width, view.height, |px, py| {
                image.blend(px, py, color)
            });
            quads += 1;
        }
    }

    debug!(rows, cols, quads, skipped, width = view.width, height = view.height, "Rendered mesh");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::{ListedColormap, Palette};

    fn two_colors() -> Colormap {
        let palette = ListedColormap::new(vec![[0, 0, 0, 0], [255, 0, 0, 255]]).unwrap();
        Colormap::new(Palette::Listed(palette)).with_range(Some(0.0), Some(1.0))
    }

    fn unit_view(size: usize) -> MapView {
        MapView::new(BoundingBox::new(0.0, 0.0, 4.0, 4.0), size, size).unwrap()
    }

    #[test]
    fn test_view_rejects_empty_image() {
        assert!(MapView::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0, 10).is_err());
        assert!(MapView::new(BoundingBox::new(1.0, 0.0, 0.0, 1.0), 10, 10).is_err());
    }

    #[test]
    fn test_to_pixel_flips_y() {
        let view = unit_view(8);
        assert_eq!(view.to_pixel(0.0, 4.0), (0.0, 0.0));
        assert_eq!(view.to_pixel(4.0, 0.0), (8.0, 8.0));
        assert_eq!(view.to_pixel(1.0, 3.0), (2.0, 2.0));
    }

    #[test]
    fn test_single_quad_fills_its_area() {
        // 2x2 mesh: one quad covering world [1, 3] x [1, 3].
        let xx = [1.0, 3.0, 1.0, 3.0];
        let yy = [3.0, 3.0, 1.0, 1.0];
        let mesh = Mesh::new(&xx, &yy, 2, 2).unwrap();
        let view = unit_view(4).with_background([9, 9, 9, 255]);

        // Only value (0, 0) is drawn; the others belong to the dropped
        // last row and column.
        let image = render_mesh(&mesh, &[1.0, 0.0, 0.0, 0.0], None, &two_colors(), &view).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                let inside = (1..3).contains(&x) && (1..3).contains(&y);
                let expected = if inside { [255, 0, 0, 255] } else { [9, 9, 9, 255] };
                assert_eq!(image.get(x, y), Some(expected), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_transparent_class_keeps_background() {
        let xx = [0.0, 4.0, 0.0, 4.0];
        let yy = [4.0, 4.0, 0.0, 0.0];
        let mesh = Mesh::new(&xx, &yy, 2, 2).unwrap();
        let view = unit_view(4).with_background([169, 169, 169, 255]);

        let image = render_mesh(&mesh, &[0.0; 4], None, &two_colors(), &view).unwrap();
        assert!(image.pixels().chunks_exact(4).all(|p| p == [169, 169, 169, 255]));
    }

    #[test]
    fn test_non_finite_corners_are_skipped() {
        let xx = [0.0, f64::INFINITY, 0.0, 4.0];
        let yy = [4.0, 4.0, 0.0, 0.0];
        let mesh = Mesh::new(&xx, &yy, 2, 2).unwrap();
        let image = render_mesh(&mesh, &[1.0; 4], None, &two_colors(), &unit_view(4)).unwrap();
        assert!(image.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_shape_mismatch() {
        let xx = [0.0; 4];
        assert!(Mesh::new(&xx, &xx[..3], 2, 2).is_err());
        let mesh = Mesh::new(&xx, &xx, 2, 2).unwrap();
        assert!(matches!(
            render_mesh(&mesh, &[0.0; 3], None, &two_colors(), &unit_view(2)),
            Err(RenderError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_blend_half_alpha_over_opaque() {
        let mut image = RgbaImage::new(1, 1, [0, 0, 0, 255]);
        image.blend(0, 0, [255, 255, 255, 128]);
        let p = image.get(0, 0).unwrap();
        assert_eq!(p[3], 255);
        assert_eq!(p[0], 128);
    }
}
