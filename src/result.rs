use std::ops::Range;

use crate::{
    bitmap::LineBitmap, height::resolve_heights, stats::LineStatistics, SegmentationOptions,
};

/// Classification of a glyph box. The discriminant is the code written to the
/// line record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GlyphType {
    #[default]
    Unclassified = 0,
    Ideograph = 1,
    AlphanumericOrPunctuation = 2,
    SmallPunctuation = 3,
    Noise = 4,
}

impl GlyphType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A candidate glyph region. `column_end` is exclusive, `row_bottom` is the
/// last ink row. Rows stay at zero until the height resolver has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphBox {
    pub column_start: u32,
    pub column_end: u32,
    pub row_top: u32,
    pub row_bottom: u32,
    pub kind: GlyphType,
}

impl GlyphBox {
    pub fn new(column_start: u32, column_end: u32) -> Self {
        Self {
            column_start,
            column_end,
            row_top: 0,
            row_bottom: 0,
            kind: GlyphType::Unclassified,
        }
    }

    pub fn with_rows(mut self, row_top: u32, row_bottom: u32) -> Self {
        self.row_top = row_top;
        self.row_bottom = row_bottom;
        self
    }

    pub fn with_kind(mut self, kind: GlyphType) -> Self {
        self.kind = kind;
        self
    }

    pub fn width(&self) -> u32 {
        self.column_end.saturating_sub(self.column_start)
    }

    pub fn height(&self) -> u32 {
        self.row_bottom.saturating_sub(self.row_top)
    }

    pub fn columns(&self) -> Range<u32> {
        self.column_start..self.column_end
    }

    /// Bounding union of two boxes. The kind is reset.
    pub fn union(&self, other: &GlyphBox) -> GlyphBox {
        GlyphBox {
            column_start: self.column_start.min(other.column_start),
            column_end: self.column_end.max(other.column_end),
            row_top: self.row_top.min(other.row_top),
            row_bottom: self.row_bottom.max(other.row_bottom),
            kind: GlyphType::Unclassified,
        }
    }

    /// Blank columns between this box and `next`; negative when they overlap.
    pub fn gap_to(&self, next: &GlyphBox) -> i64 {
        i64::from(next.column_start) - i64::from(self.column_end)
    }
}

/// Per-line working state: the bitmap, its reference scale and the ordered
/// boxes. Every pipeline stage takes one snapshot and returns a fresh one.
#[derive(Debug, Clone)]
pub struct LineSegmentation<'a> {
    bitmap: &'a LineBitmap,
    stats: LineStatistics,
    boxes: Vec<GlyphBox>,
}

impl<'a> LineSegmentation<'a> {
    /// Builds a snapshot after a structural change: heights are resolved and
    /// the line statistics recomputed over `boxes`.
    pub fn from_boxes(
        bitmap: &'a LineBitmap,
        boxes: Vec<GlyphBox>,
        options: &SegmentationOptions,
    ) -> Self {
        let boxes = resolve_heights(bitmap, &boxes);
        let stats = LineStatistics::estimate(bitmap, &boxes, options);
        Self {
            bitmap,
            stats,
            boxes,
        }
    }

    /// Replaces box labels without touching geometry, so the statistics carry
    /// over unchanged.
    pub(crate) fn relabelled(&self, boxes: Vec<GlyphBox>) -> Self {
        Self {
            bitmap: self.bitmap,
            stats: self.stats,
            boxes,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        bitmap: &'a LineBitmap,
        stats: LineStatistics,
        boxes: Vec<GlyphBox>,
    ) -> Self {
        Self {
            bitmap,
            stats,
            boxes,
        }
    }

    pub fn bitmap(&self) -> &'a LineBitmap {
        self.bitmap
    }

    pub fn stats(&self) -> LineStatistics {
        self.stats
    }

    pub fn mean_glyph_height(&self) -> u32 {
        self.stats.mean_height
    }

    pub fn mean_glyph_width(&self) -> u32 {
        self.stats.mean_width
    }

    pub fn boxes(&self) -> &[GlyphBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Snapshots of one line after each pipeline stage.
#[derive(Debug, Clone)]
pub struct SegmentationTrace<'a> {
    pub cut: LineSegmentation<'a>,
    pub recut: LineSegmentation<'a>,
    pub merge: LineSegmentation<'a>,
    pub classified: LineSegmentation<'a>,
}

impl<'a> SegmentationTrace<'a> {
    /// Stages that get a debug overlay, with their directory names.
    pub fn rendered_stages(&self) -> [(&'static str, &LineSegmentation<'a>); 3] {
        [
            ("cut", &self.cut),
            ("recut", &self.recut),
            ("merge", &self.merge),
        ]
    }
}
