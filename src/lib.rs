pub mod bitmap;
mod error;
pub mod height;
pub mod merge;
pub mod output;
pub mod projection;
pub mod recut;
mod result;
pub mod shape;
pub mod stats;

use bitmap::LineBitmap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::instrument;

pub use error::{Result, SegmentError};
pub use result::*;

pub struct GlyphSegmenterBuilder {
    threads: usize,
    options: SegmentationOptions,
}

impl GlyphSegmenterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker threads for [`GlyphSegmenter::segment_lines`]. Zero lets rayon
    /// pick.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn options(mut self, options: SegmentationOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(skip(self))]
    pub fn build(self) -> Result<GlyphSegmenter> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|index| format!("glyphcut-{index}"))
            .build()?;
        log::debug!("Segmenter pool running {} threads", pool.current_num_threads());
        Ok(GlyphSegmenter {
            options: self.options,
            pool,
        })
    }
}

impl Default for GlyphSegmenterBuilder {
    fn default() -> Self {
        Self {
            threads: 0,
            options: SegmentationOptions::default(),
        }
    }
}

/// Runs the segmentation pipeline: projection cut, re-cut, merge and
/// classification. Each line is independent.
pub struct GlyphSegmenter {
    options: SegmentationOptions,
    pool: ThreadPool,
}

impl GlyphSegmenter {
    pub fn options(&self) -> &SegmentationOptions {
        &self.options
    }

    /// Segments one line, keeping the snapshot taken after every stage.
    #[instrument(skip_all, fields(width = bitmap.width(), height = bitmap.height()))]
    pub fn trace<'a>(&self, bitmap: &'a LineBitmap) -> SegmentationTrace<'a> {
        let options = &self.options;
        let cut = LineSegmentation::from_boxes(bitmap, projection::cut(bitmap, options), options);
        let recut = recut::recut(&cut, options);
        let merge = merge::merge(&recut, options);
        let classified = shape::classify(&merge, options);
        log::debug!(
            "Line segmented into {} boxes (mean glyph {}x{})",
            classified.len(),
            classified.mean_glyph_width(),
            classified.mean_glyph_height()
        );
        SegmentationTrace {
            cut,
            recut,
            merge,
            classified,
        }
    }

    pub fn segment<'a>(&self, bitmap: &'a LineBitmap) -> LineSegmentation<'a> {
        self.trace(bitmap).classified
    }

    /// Segments many lines in parallel. Results keep the input order.
    #[instrument(skip_all, fields(lines = bitmaps.len()))]
    pub fn segment_lines<'a>(&self, bitmaps: &'a [LineBitmap]) -> Vec<SegmentationTrace<'a>> {
        self.pool
            .install(|| bitmaps.par_iter().map(|bitmap| self.trace(bitmap)).collect())
    }
}

/// Tuned thresholds of the segmentation heuristics. The defaults were
/// calibrated on printed Chinese text lines.
#[derive(Debug, Clone, Copy)]
pub struct SegmentationOptions {
    /// Column runs this wide or narrower are dropped.
    pub min_run_width: u32,
    /// Boxes within this width and height are punctuation-sized.
    pub min_patch_width: u32,
    pub min_patch_height: u32,
    /// Narrow boxes at least this fraction of the line height are bars.
    pub bar_height_ratio: f32,
    /// Boxes no wider than this fraction of the line height are skipped
    /// when estimating the reference scale.
    pub min_glyph_width_ratio: f32,
    /// Re-cut boxes wider than this multiple of the mean height.
    pub recut_trigger: f32,
    /// Re-cut pieces wider than this multiple of the mean height again.
    pub recut_target: f32,
    pub max_density_threshold: u32,
    /// Minimum smaller/larger ratio of width and height for an ideograph.
    pub ideograph_aspect: f32,
    /// Minimum ratio of width and of height against the reference scale.
    pub ideograph_scale: f32,
    pub similarity: f32,
    /// Pixel margin for both the merge gap and vertical alignment.
    pub min_margin: u32,
    /// Similar boxes below this fraction of the mean height are never merged.
    pub short_glyph_ratio: f32,
    /// Gap, as a fraction of the mean height, isolating trailing punctuation.
    pub punctuation_gap_ratio: f32,
    pub propagate_ratio: f32,
    pub propagate_loose_width_ratio: f32,
    /// Background border around saved glyph crops.
    pub crop_padding: u32,
    /// Label leftover boxes as noise, small punctuation or alphanumeric.
    pub label_residuals: bool,
    pub noise_min_ink: u32,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        Self {
            min_run_width: 2,
            min_patch_width: 15,
            min_patch_height: 15,
            bar_height_ratio: 0.9,
            min_glyph_width_ratio: 0.6,
            recut_trigger: 4.0 / 3.0,
            recut_target: 5.0 / 4.0,
            max_density_threshold: 10,
            ideograph_aspect: 0.83,
            ideograph_scale: 0.8,
            similarity: 0.8,
            min_margin: 6,
            short_glyph_ratio: 0.9,
            punctuation_gap_ratio: 1.0 / 3.0,
            propagate_ratio: 0.8,
            propagate_loose_width_ratio: 0.5,
            crop_padding: 7,
            label_residuals: false,
            noise_min_ink: 4,
        }
    }
}
