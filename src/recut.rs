use tracing::instrument;

use crate::{
    bitmap::LineBitmap, projection::ink_runs, GlyphBox, LineSegmentation, SegmentationOptions,
};

/// Splits boxes wider than `recut_trigger * mean height`, which usually hold
/// several glyphs glued together by touching strokes.
#[instrument(level = "debug", skip_all, fields(boxes = segmentation.len()))]
pub fn recut<'a>(
    segmentation: &LineSegmentation<'a>,
    options: &SegmentationOptions,
) -> LineSegmentation<'a> {
    let bitmap = segmentation.bitmap();
    let reference = segmentation.mean_glyph_height() as f32;
    let boxes = segmentation
        .boxes()
        .iter()
        .flat_map(|glyph| {
            if glyph.width() as f32 > reference * options.recut_trigger {
                recut_box(bitmap, *glyph, reference, 1, options)
            } else {
                vec![*glyph]
            }
        })
        .collect::<Vec<_>>();
    log::debug!(
        "Re-cut turned {} boxes into {}",
        segmentation.len(),
        boxes.len()
    );
    LineSegmentation::from_boxes(bitmap, boxes, options)
}

/// Cuts `glyph` wherever fewer than `threshold` ink pixels fill a column.
/// Pieces still wider than `recut_target * reference_scale` are cut again
/// with a threshold one higher. At `max_density_threshold` the box is
/// returned as is, and so is a box whose cut leaves no piece wide enough to
/// keep.
#[instrument(level = "trace", skip(bitmap, options))]
pub fn recut_box(
    bitmap: &LineBitmap,
    glyph: GlyphBox,
    reference_scale: f32,
    threshold: u32,
    options: &SegmentationOptions,
) -> Vec<GlyphBox> {
    if threshold >= options.max_density_threshold {
        log::trace!("Density threshold cap reached, keeping {:?}", glyph.columns());
        return vec![glyph];
    }

    let profile = bitmap.column_profile(glyph.columns());
    let mut pieces = Vec::new();
    for run in ink_runs(profile.view(), threshold) {
        let piece = GlyphBox::new(glyph.column_start + run.start, glyph.column_start + run.end);
        if piece.width() as f32 > reference_scale * options.recut_target {
            pieces.extend(recut_box(
                bitmap,
                piece,
                reference_scale,
                threshold + 1,
                options,
            ));
        } else if piece.width() > options.min_run_width {
            pieces.push(piece);
        }
    }

    if pieces.is_empty() {
        return vec![glyph];
    }
    if pieces.len() > 1 {
        log::trace!(
            "Split {:?} into {} pieces at density {threshold}",
            glyph.columns(),
            pieces.len()
        );
    }
    pieces
}
