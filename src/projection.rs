use std::ops::Range;

use ndarray::ArrayView1;
use tracing::instrument;

use crate::{bitmap::LineBitmap, GlyphBox, SegmentationOptions};

/// Maximal runs of the profile whose count is at least `min_count`, as index
/// ranges into the profile. Runs touching either end are closed there.
pub(crate) fn ink_runs(profile: ArrayView1<u32>, min_count: u32) -> Vec<Range<u32>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (index, &count) in profile.iter().enumerate() {
        match (start, count >= min_count) {
            (None, true) => start = Some(index as u32),
            (Some(run_start), false) => {
                runs.push(run_start..index as u32);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(run_start) = start {
        runs.push(run_start..profile.len() as u32);
    }
    runs
}

/// Initial vertical-projection cut. Every maximal run of columns containing
/// ink becomes an unclassified box; runs no wider than
/// `options.min_run_width` are dropped as specks. Rows are left unresolved.
#[instrument(level = "debug", skip(bitmap, options))]
pub fn cut(bitmap: &LineBitmap, options: &SegmentationOptions) -> Vec<GlyphBox> {
    let profile = bitmap.column_profile(0..bitmap.width());
    let boxes = ink_runs(profile.view(), 1)
        .into_iter()
        .filter(|run| run.len() as u32 > options.min_run_width)
        .map(|run| GlyphBox::new(run.start, run.end))
        .collect::<Vec<_>>();
    log::debug!(
        "Projection cut produced {} boxes over {} columns",
        boxes.len(),
        bitmap.width()
    );
    boxes
}
