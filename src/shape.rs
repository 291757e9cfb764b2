use tracing::instrument;

use crate::{GlyphBox, GlyphType, LineSegmentation, SegmentationOptions};

/// Smaller over larger, so the result is in `0..=1`.
fn ratio(a: f32, b: f32) -> f32 {
    let larger = a.max(b);
    if larger <= 0.0 {
        return 0.0;
    }
    a.min(b) / larger
}

/// A Chinese ideograph is roughly square and roughly the line's reference
/// size.
pub fn is_ideograph_shape(glyph: &GlyphBox, reference: u32, options: &SegmentationOptions) -> bool {
    let width = glyph.width() as f32;
    let height = glyph.height() as f32;
    let reference = reference as f32;
    ratio(width, height) >= options.ideograph_aspect
        && ratio(width, reference) >= options.ideograph_scale
        && ratio(height, reference) >= options.ideograph_scale
}

/// Same size and same vertical placement, as in a run of digits or letters.
pub fn is_similar_shape(a: &GlyphBox, b: &GlyphBox, options: &SegmentationOptions) -> bool {
    if ratio(a.width() as f32, b.width() as f32) < options.similarity
        || ratio(a.height() as f32, b.height() as f32) < options.similarity
    {
        return false;
    }
    a.row_top.abs_diff(b.row_top) <= options.min_margin
        && a.row_bottom.abs_diff(b.row_bottom) <= options.min_margin
}

/// Final labelling pass. Boxes next to an ideograph that are close to the
/// line's mean width (or mean height with a looser width) become ideographs
/// too; this picks up tall narrow glyphs like 目 and flat ones like 一.
/// Promotions cascade left to right. With `label_residuals` the remaining
/// unclassified boxes are labelled by size and ink.
#[instrument(level = "debug", skip_all, fields(boxes = segmentation.len()))]
pub fn classify<'a>(
    segmentation: &LineSegmentation<'a>,
    options: &SegmentationOptions,
) -> LineSegmentation<'a> {
    let mean_height = segmentation.mean_glyph_height() as f32;
    let mean_width = segmentation.mean_glyph_width() as f32;
    let mut boxes = segmentation.boxes().to_vec();

    for index in 1..boxes.len().saturating_sub(1) {
        let glyph = boxes[index];
        if glyph.kind == GlyphType::Ideograph {
            continue;
        }
        let ratio_w = ratio(glyph.width() as f32, mean_width);
        let ratio_h = ratio(glyph.height() as f32, mean_height);
        let sized = ratio_w > options.propagate_ratio
            || (ratio_h > options.propagate_ratio
                && ratio_w > options.propagate_loose_width_ratio);
        let beside_ideograph = boxes[index - 1].kind == GlyphType::Ideograph
            || boxes[index + 1].kind == GlyphType::Ideograph;
        if sized && beside_ideograph {
            log::trace!("Promoting {:?} next to an ideograph", glyph.columns());
            boxes[index].kind = GlyphType::Ideograph;
        }
    }

    if options.label_residuals {
        let bitmap = segmentation.bitmap();
        for glyph in boxes.iter_mut().filter(|it| it.kind == GlyphType::Unclassified) {
            glyph.kind = if bitmap.ink_count(glyph) < options.noise_min_ink {
                GlyphType::Noise
            } else if glyph.width() <= options.min_patch_width
                && glyph.height() <= options.min_patch_height
            {
                GlyphType::SmallPunctuation
            } else {
                GlyphType::AlphanumericOrPunctuation
            };
        }
    }

    segmentation.relabelled(boxes)
}
