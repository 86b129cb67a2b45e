//! Composites the active tier bitmap onto the visible surface.
//!
//! The transform is applied per draw call, so nothing carries over between
//! frames. An identity transform copies pixels directly.

use std::path::Path;

use artmap_core::{Error, RenderError, Size, Transform};
use image::RgbaImage;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8};
use tracing::trace;

use super::raster::{rgba_from_pixmap, Bitmap};

/// The visible raster surface.
#[derive(Debug)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn new(size: Size) -> Result<Self, RenderError> {
        Ok(Self {
            pixmap: Self::allocate(size)?,
        })
    }

    fn allocate(size: Size) -> Result<Pixmap, RenderError> {
        if !size.is_valid() {
            return Err(RenderError::InvalidSize {
                what: "surface".to_string(),
                width: size.width,
                height: size.height,
            });
        }
        let (width, height) = (size.width.ceil() as u32, size.height.ceil() as u32);
        Pixmap::new(width, height).ok_or(RenderError::RasterAllocation { width, height })
    }

    /// Reallocates the surface; contents are cleared.
    pub fn resize(&mut self, size: Size) -> Result<(), RenderError> {
        self.pixmap = Self::allocate(size)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        rgba_from_pixmap(self.pixmap.as_ref())
    }

    /// Writes the surface as an image; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        self.to_rgba_image()
            .save(path)
            .map_err(|e| Error::other(format!("Failed to save {}: {}", path.display(), e)))
    }
}

#[derive(Debug, Default)]
pub struct Renderer {
    frames: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Clears `surface` and draws `bitmap` at the origin under `transform`.
    /// Returns the frame number.
    pub fn render(&mut self, surface: &mut Surface, transform: Transform, bitmap: &Bitmap) -> u64 {
        surface.pixmap.fill(Color::TRANSPARENT);

        if transform.is_identity() {
            Self::copy_pixels(&mut surface.pixmap, bitmap);
        } else {
            let quality = if transform.k == 1.0 {
                FilterQuality::Nearest
            } else {
                FilterQuality::Bilinear
            };
            let paint = PixmapPaint {
                quality,
                ..PixmapPaint::default()
            };
            let k = transform.k as f32;
            let affine = tiny_skia::Transform::from_row(
                k,
                0.0,
                0.0,
                k,
                transform.x as f32,
                transform.y as f32,
            );
            surface
                .pixmap
                .draw_pixmap(0, 0, bitmap.as_pixmap(), &paint, affine, None);
        }

        self.frames += 1;
        trace!(
            "Frame {}: {} tier under {}",
            self.frames,
            bitmap.tier(),
            transform
        );
        self.frames
    }

    fn copy_pixels(dst: &mut Pixmap, bitmap: &Bitmap) {
        let src = bitmap.as_pixmap();
        let cols = src.width().min(dst.width()) as usize * 4;
        let rows = src.height().min(dst.height()) as usize;
        let src_stride = src.width() as usize * 4;
        let dst_stride = dst.width() as usize * 4;

        let src_data = src.data();
        let dst_data = dst.data_mut();
        for row in 0..rows {
            let s = row * src_stride;
            let d = row * dst_stride;
            dst_data[d..d + cols].copy_from_slice(&src_data[s..s + cols]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artmap_core::TierId;

    fn checker_bitmap(width: u32, height: u32) -> Bitmap {
        let mut raster = Pixmap::new(width, height).expect("allocates");
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    let idx = ((y * width + x) * 4) as usize;
                    raster.data_mut()[idx..idx + 4].copy_from_slice(&[10, 20, 30, 255]);
                }
            }
        }
        Bitmap::from_raster(TierId::Full, raster)
    }

    #[test]
    fn test_identity_reproduces_bitmap() {
        let bitmap = checker_bitmap(7, 5);
        let mut surface = Surface::new(Size::new(7.0, 5.0)).expect("surface");
        let mut renderer = Renderer::new();

        renderer.render(&mut surface, Transform::IDENTITY, &bitmap);
        for y in 0..5 {
            for x in 0..7 {
                assert_eq!(surface.pixel(x, y), bitmap.pixel(x, y), "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_translate_moves_content() {
        let mut raster = Pixmap::new(4, 4).expect("allocates");
        raster.fill(Color::from_rgba8(0, 255, 0, 255));
        let bitmap = Bitmap::from_raster(TierId::Full, raster);

        let mut surface = Surface::new(Size::new(10.0, 10.0)).expect("surface");
        let mut renderer = Renderer::new();
        renderer.render(&mut surface, Transform::new(5.0, 5.0, 1.0), &bitmap);

        assert_eq!(surface.pixel(1, 1).map(|p| p.alpha()), Some(0));
        assert_eq!(surface.pixel(6, 6).map(|p| p.green()), Some(255));
    }

    #[test]
    fn test_render_clears_previous_frame() {
        let mut raster = Pixmap::new(4, 4).expect("allocates");
        raster.fill(Color::from_rgba8(255, 0, 0, 255));
        let bitmap = Bitmap::from_raster(TierId::Full, raster);

        let mut surface = Surface::new(Size::new(8.0, 8.0)).expect("surface");
        let mut renderer = Renderer::new();
        renderer.render(&mut surface, Transform::IDENTITY, &bitmap);
        let frame = renderer.render(&mut surface, Transform::new(4.0, 4.0, 1.0), &bitmap);

        assert_eq!(frame, 2);
        assert_eq!(surface.pixel(0, 0).map(|p| p.alpha()), Some(0));
        assert_eq!(surface.pixel(5, 5).map(|p| p.red()), Some(255));
    }

    #[test]
    fn test_scaled_render_does_not_touch_bitmap() {
        let bitmap = checker_bitmap(8, 8);
        let before = bitmap.to_rgba_image();
        let mut surface = Surface::new(Size::new(4.0, 4.0)).expect("surface");
        Renderer::new().render(&mut surface, Transform::scaled(0.5), &bitmap);
        assert_eq!(bitmap.to_rgba_image(), before);
    }

    #[test]
    fn test_surface_resize() {
        let mut surface = Surface::new(Size::new(10.0, 10.0)).expect("surface");
        surface.resize(Size::new(20.5, 5.0)).expect("resizes");
        assert_eq!((surface.width(), surface.height()), (21, 5));
        assert!(surface.resize(Size::new(-1.0, 5.0)).is_err());
    }
}
