//! Text overlays drawn onto a rendered map.

use image::ImageBuffer;
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::debug;

use crate::colormap::Rgba;
use crate::mesh::RgbaImage;
use crate::{RenderError, RenderResult};

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Gap between the top edge and the title, in pixels.
const TITLE_MARGIN: i32 = 4;

fn load_font() -> RenderResult<Font<'static>> {
    Font::try_from_bytes(FONT_DATA).ok_or_else(|| RenderError::Font("embedded font is unreadable".to_string()))
}

impl RgbaImage {
    /// Draw `title` centred along the top edge.
    ///
    /// Titles wider than the image are clipped. An empty title or a
    /// non-positive size draws nothing.
    pub fn draw_title(&mut self, title: &str, size: f32, color: Rgba) -> RenderResult<()> {
        if title.trim().is_empty() || size <= 0.0 {
            return Ok(());
        }
        let font = load_font()?;
        let scale = Scale::uniform(size);
        let (text_width, _) = text_size(scale, &font, title);
        let x = ((self.width() as i32 - text_width) / 2).max(0);

        let (width, height) = (self.width() as u32, self.height() as u32);
        let pixels = std::mem::take(self.pixels_mut());
        let mut canvas = ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::ShapeMismatch(format!("canvas is not {}x{} RGBA", width, height)))?;
        draw_text_mut(&mut canvas, image::Rgba(color), x, TITLE_MARGIN, scale, &font, title);
        *self.pixels_mut() = canvas.into_raw();

        debug!(title, size, x, "Drew title");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba = [0, 0, 0, 255];
    const CLEAR: Rgba = [255, 255, 255, 0];

    fn inked(image: &RgbaImage, rows: std::ops::Range<usize>) -> usize {
        rows.flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| image.get(x, y) != Some(CLEAR))
            .count()
    }

    #[test]
    fn test_title_is_drawn_in_top_band() {
        let mut image = RgbaImage::new(240, 80, CLEAR);
        image.draw_title("Areas of compromise", 16.0, BLACK).unwrap();
        assert!(inked(&image, 0..30) > 0);
        assert_eq!(inked(&image, 40..80), 0);
    }

    #[test]
    fn test_title_is_centred() {
        let mut image = RgbaImage::new(300, 40, CLEAR);
        image.draw_title("X", 20.0, BLACK).unwrap();
        let columns: Vec<usize> = (0..300)
            .filter(|&x| (0..40).any(|y| image.get(x, y) != Some(CLEAR)))
            .collect();
        let middle = (columns[0] + columns[columns.len() - 1]) / 2;
        assert!((140..=160).contains(&middle), "ink centred at {}", middle);
    }

    #[test]
    fn test_empty_title_draws_nothing() {
        let mut image = RgbaImage::new(50, 20, CLEAR);
        let before = image.clone();
        image.draw_title("  ", 16.0, BLACK).unwrap();
        image.draw_title("Title", 0.0, BLACK).unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn test_wide_title_is_clipped() {
        let mut image = RgbaImage::new(20, 20, CLEAR);
        image.draw_title("A title much wider than the canvas", 16.0, BLACK).unwrap();
        assert_eq!(image.pixels().len(), 20 * 20 * 4);
        assert!(inked(&image, 0..20) > 0);
    }
}
