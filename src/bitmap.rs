use std::{ops::Range, path::Path};

use image::{GrayImage, Luma};
use ndarray::{s, Array1, Array2, Axis};
use tracing::instrument;

use crate::{error::Result, GlyphBox};

/// Sample value of background pixels. Anything else counts as ink.
pub const BACKGROUND: u8 = u8::MAX;

/// One binarized text line. Holds the source samples for rendering and a
/// `rows x columns` ink mask (1 = ink) for the projections.
#[derive(Debug, Clone)]
pub struct LineBitmap {
    image: GrayImage,
    ink: Array2<u32>,
}

impl LineBitmap {
    pub fn new(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let ink = Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
            u32::from(image.get_pixel(x as u32, y as u32).0[0] != BACKGROUND)
        });
        Self { image, ink }
    }

    /// Builds a bitmap from an ink predicate over `(column, row)`.
    pub fn from_fn(width: u32, height: u32, is_ink: impl Fn(u32, u32) -> bool) -> Self {
        let image = GrayImage::from_fn(width, height, |x, y| {
            if is_ink(x, y) {
                Luma([0])
            } else {
                Luma([BACKGROUND])
            }
        });
        Self::new(image)
    }

    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)?.into_luma8();
        log::debug!(
            "Loaded line bitmap {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Ink pixels per column over `columns`, all rows included.
    pub fn column_profile(&self, columns: Range<u32>) -> Array1<u32> {
        let columns = self.clamp(columns);
        self.ink.slice(s![.., columns]).sum_axis(Axis(0))
    }

    pub fn row_has_ink(&self, row: u32, columns: Range<u32>) -> bool {
        if row >= self.height() {
            return false;
        }
        let columns = self.clamp(columns);
        self.ink
            .slice(s![row as usize, columns])
            .iter()
            .any(|&value| value > 0)
    }

    /// Ink pixels inside the box, bottom row included.
    pub fn ink_count(&self, glyph: &GlyphBox) -> u32 {
        let columns = self.clamp(glyph.columns());
        let top = (glyph.row_top as usize).min(self.ink.nrows());
        let bottom = (glyph.row_bottom as usize + 1).clamp(top, self.ink.nrows());
        self.ink.slice(s![top..bottom, columns]).sum()
    }

    fn clamp(&self, columns: Range<u32>) -> Range<usize> {
        let width = self.ink.ncols();
        let start = (columns.start as usize).min(width);
        let end = (columns.end as usize).clamp(start, width);
        start..end
    }
}
