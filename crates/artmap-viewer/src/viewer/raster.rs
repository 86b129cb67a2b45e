//! Raster handles: decoded thumbnails and immutable tier bitmaps.
//!
//! Both wrap a premultiplied tiny-skia pixmap behind an `Arc`, so cloning a
//! handle never copies pixels.

use std::fmt;
use std::sync::Arc;

use artmap_core::{Size, TierId};
use image::{DynamicImage, RgbaImage};
use tiny_skia::{ColorU8, IntSize, Pixmap, PixmapRef, PremultipliedColorU8};

/// Converts straight-alpha RGBA into a premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let c = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size)
}

/// Converts a premultiplied pixmap back to straight-alpha RGBA.
pub fn rgba_from_pixmap(pixmap: PixmapRef) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    image
}

/// A decoded thumbnail ready to be drawn into a tier raster.
#[derive(Clone)]
pub struct Thumbnail {
    pixmap: Arc<Pixmap>,
}

impl Thumbnail {
    /// Wraps an existing pixmap.
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap: Arc::new(pixmap),
        }
    }

    /// Converts a decoded image. Returns `None` for zero-sized images.
    pub fn from_image(image: &DynamicImage) -> Option<Self> {
        pixmap_from_rgba(&image.to_rgba8()).map(Self::from_pixmap)
    }

    /// A single-colour thumbnail.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        let [r, g, b, a] = rgba;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        Some(Self::from_pixmap(pixmap))
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn as_pixmap(&self) -> PixmapRef<'_> {
        (*self.pixmap).as_ref()
    }
}

impl fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbnail({}x{})", self.width(), self.height())
    }
}

/// An immutable snapshot of one tier's raster.
#[derive(Clone)]
pub struct Bitmap {
    tier: TierId,
    pixmap: Arc<Pixmap>,
}

impl Bitmap {
    /// Takes ownership of a finished tier raster.
    pub(crate) fn from_raster(tier: TierId, raster: Pixmap) -> Self {
        Self {
            tier,
            pixmap: Arc::new(raster),
        }
    }

    pub fn tier(&self) -> TierId {
        self.tier
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

    pub fn as_pixmap(&self) -> PixmapRef<'_> {
        (*self.pixmap).as_ref()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Whether both handles refer to the same capture.
    pub fn same_capture(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixmap, &other.pixmap)
    }

    /// Straight-alpha copy for encoding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        rgba_from_pixmap(self.as_pixmap())
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bitmap({} tier, {}x{})",
            self.tier,
            self.width(),
            self.height()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_conversion_premultiplies() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([200, 100, 50, 0]));

        let pixmap = pixmap_from_rgba(&image).expect("non-empty");
        let opaque = pixmap.pixel(0, 0).expect("in bounds");
        assert_eq!((opaque.red(), opaque.alpha()), (255, 255));

        let clear = pixmap.pixel(1, 0).expect("in bounds");
        assert_eq!((clear.red(), clear.alpha()), (0, 0));

        let back = rgba_from_pixmap(pixmap.as_ref());
        assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_zero_sized_image_is_rejected() {
        assert!(pixmap_from_rgba(&RgbaImage::new(0, 4)).is_none());
        assert!(Thumbnail::solid(0, 0, [0, 0, 0, 255]).is_none());
    }

    #[test]
    fn test_bitmap_keeps_raster_contents() {
        let mut raster = Pixmap::new(4, 4).expect("allocates");
        raster.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));
        let bitmap = Bitmap::from_raster(TierId::Full, raster);

        let px = bitmap.pixel(1, 1).expect("in bounds");
        assert_eq!((px.red(), px.blue()), (0, 255));
        assert_eq!(bitmap.size(), Size::new(4.0, 4.0));

        let copy = bitmap.clone();
        assert!(copy.same_capture(&bitmap));
    }
}
