use tracing::instrument;

use crate::{bitmap::LineBitmap, GlyphBox};

/// Finds the first and last ink rows inside the box's columns. A single-row
/// box gets `row_bottom = row_top + 1`; a box without ink keeps rows `0..1`.
#[instrument(level = "trace", skip(bitmap))]
pub fn resolve_height(bitmap: &LineBitmap, glyph: GlyphBox) -> GlyphBox {
    let columns = glyph.columns();
    let top = (0..bitmap.height()).find(|&row| bitmap.row_has_ink(row, columns.clone()));
    let bottom = (0..bitmap.height())
        .rev()
        .find(|&row| bitmap.row_has_ink(row, columns.clone()));

    let (top, bottom) = match (top, bottom) {
        (Some(top), Some(bottom)) => (top, bottom),
        _ => {
            log::trace!("Box {columns:?} has no ink, using a one-row extent");
            (0, 0)
        }
    };
    let bottom = if bottom <= top { top + 1 } else { bottom };
    glyph.with_rows(top, bottom)
}

pub fn resolve_heights(bitmap: &LineBitmap, boxes: &[GlyphBox]) -> Vec<GlyphBox> {
    boxes
        .iter()
        .map(|glyph| resolve_height(bitmap, *glyph))
        .collect()
}
