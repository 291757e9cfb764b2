use tracing::instrument;

use crate::{
    shape::{is_ideograph_shape, is_similar_shape},
    GlyphBox, GlyphType, LineSegmentation, SegmentationOptions,
};

/// Outcome of looking at the boxes from one cursor position: the box to emit
/// and how many input boxes it consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDecision {
    pub glyph: GlyphBox,
    pub consumed: usize,
}

struct MergeContext<'o> {
    reference: u32,
    bitmap_height: u32,
    options: &'o SegmentationOptions,
}

impl MergeContext<'_> {
    fn is_ideograph(&self, glyph: &GlyphBox) -> bool {
        is_ideograph_shape(glyph, self.reference, self.options)
    }

    fn keep(&self, glyph: GlyphBox) -> MergeDecision {
        let glyph = if self.is_ideograph(&glyph) {
            glyph.with_kind(GlyphType::Ideograph)
        } else {
            glyph
        };
        MergeDecision { glyph, consumed: 1 }
    }

    /// Union of `boxes[cursor..cursor + count]` if it forms an ideograph.
    fn span(&self, boxes: &[GlyphBox], cursor: usize, count: usize) -> Option<MergeDecision> {
        let spanned = boxes.get(cursor..cursor + count)?;
        let (first, rest) = spanned.split_first()?;
        let union = rest.iter().fold(*first, |acc, it| acc.union(it));
        self.is_ideograph(&union).then(|| MergeDecision {
            glyph: union.with_kind(GlyphType::Ideograph),
            consumed: count,
        })
    }

    /// The reason a pairwise merge of `boxes[cursor]` and its right
    /// neighbour is refused, if any.
    fn pair_veto(
        &self,
        boxes: &[GlyphBox],
        cursor: usize,
        union: &GlyphBox,
    ) -> Option<&'static str> {
        let current = &boxes[cursor];
        let next = &boxes[cursor + 1];
        let options = self.options;

        if current.gap_to(next) >= i64::from(options.min_margin) {
            return Some("gap");
        }
        if self.is_ideograph(current) {
            return Some("already an ideograph");
        }
        if !self.is_ideograph(union) {
            return Some("union is not an ideograph");
        }
        let short = options.short_glyph_ratio * self.reference as f32;
        if is_similar_shape(current, next, options)
            && (current.height() as f32) < short
            && (next.height() as f32) < short
        {
            return Some("similar short pair");
        }
        if let Some(after) = boxes.get(cursor + 2) {
            let small = next.width() < options.min_patch_width
                && next.height() < options.min_patch_height;
            let low = next.row_top > self.bitmap_height / 2;
            let isolated = next.gap_to(after) as f32
                > options.punctuation_gap_ratio * self.reference as f32;
            if small && low && isolated {
                return Some("trailing punctuation");
            }
        }
        None
    }

    fn decide(&self, boxes: &[GlyphBox], cursor: usize) -> MergeDecision {
        let current = boxes[cursor];
        if cursor + 1 == boxes.len() {
            return self.keep(current);
        }
        if let Some(decision) = self
            .span(boxes, cursor, 3)
            .or_else(|| self.span(boxes, cursor, 4))
        {
            return decision;
        }

        let union = current.union(&boxes[cursor + 1]);
        match self.pair_veto(boxes, cursor, &union) {
            Some(reason) => {
                log::trace!("Not merging {:?}: {reason}", current.columns());
                self.keep(current)
            }
            None => MergeDecision {
                glyph: union.with_kind(GlyphType::Ideograph),
                consumed: 2,
            },
        }
    }
}

/// Fuses runs of 2 to 4 neighbouring boxes that together make one ideograph,
/// such as radicals split apart by the projection cut.
#[instrument(level = "debug", skip_all, fields(boxes = segmentation.len()))]
pub fn merge<'a>(
    segmentation: &LineSegmentation<'a>,
    options: &SegmentationOptions,
) -> LineSegmentation<'a> {
    let bitmap = segmentation.bitmap();
    let context = MergeContext {
        reference: segmentation.mean_glyph_height(),
        bitmap_height: bitmap.height(),
        options,
    };
    let boxes = segmentation.boxes();

    let mut merged = Vec::with_capacity(boxes.len());
    let mut cursor = 0;
    while cursor < boxes.len() {
        let decision = context.decide(boxes, cursor);
        if decision.consumed > 1 {
            log::debug!(
                "Merged {} boxes into {:?}",
                decision.consumed,
                decision.glyph.columns()
            );
        }
        merged.push(decision.glyph);
        cursor += decision.consumed;
    }

    LineSegmentation::from_boxes(bitmap, merged, options)
}
