use tracing::instrument;

use crate::{bitmap::LineBitmap, GlyphBox, SegmentationOptions};

/// Reference scale of a line: mean size of its typical glyphs. Both values
/// are always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStatistics {
    pub mean_height: u32,
    pub mean_width: u32,
}

impl LineStatistics {
    /// Averages boxes that look like full glyphs. Punctuation-sized boxes,
    /// thin vertical bars and boxes narrower than a fraction of the line
    /// height are left out. With no sample the bitmap size minus a 4 pixel
    /// border is used instead.
    #[instrument(level = "debug", skip_all, fields(boxes = boxes.len()))]
    pub fn estimate(
        bitmap: &LineBitmap,
        boxes: &[GlyphBox],
        options: &SegmentationOptions,
    ) -> Self {
        let rows = bitmap.height() as f32;
        let samples = boxes
            .iter()
            .filter(|glyph| is_reference_sample(glyph, rows, options))
            .collect::<Vec<_>>();

        if samples.is_empty() {
            let fallback = Self {
                mean_height: bitmap.height().saturating_sub(4).max(1),
                mean_width: bitmap.width().saturating_sub(4).max(1),
            };
            log::debug!("No reference glyphs, falling back to {fallback:?}");
            return fallback;
        }

        let count = samples.len() as u64;
        let height_sum = samples.iter().map(|it| u64::from(it.height())).sum::<u64>();
        let width_sum = samples.iter().map(|it| u64::from(it.width())).sum::<u64>();
        Self {
            mean_height: ((height_sum / count) as u32).max(1),
            mean_width: ((width_sum / count) as u32).max(1),
        }
    }
}

fn is_reference_sample(glyph: &GlyphBox, rows: f32, options: &SegmentationOptions) -> bool {
    let width = glyph.width();
    let height = glyph.height();
    let narrow = width <= options.min_patch_width;
    let punctuation = narrow && height <= options.min_patch_height;
    let bar = narrow && height as f32 >= options.bar_height_ratio * rows;
    let too_narrow = width as f32 <= options.min_glyph_width_ratio * rows;
    !(punctuation || bar || too_narrow)
}
