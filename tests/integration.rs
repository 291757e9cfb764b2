use std::{fs, ops::Range};

use glyphcut::{
    bitmap::LineBitmap,
    output::{save_glyph_crops, save_overlay, RecordWriter},
    shape::is_similar_shape,
    GlyphSegmenterBuilder, GlyphType, LineSegmentation, SegmentationOptions,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Solid blocks given as `(columns, rows)` half-open ranges.
fn blocks(width: u32, height: u32, blocks: &[(Range<u32>, Range<u32>)]) -> LineBitmap {
    let blocks = blocks.to_vec();
    LineBitmap::from_fn(width, height, move |x, y| {
        blocks
            .iter()
            .any(|(columns, rows)| columns.contains(&x) && rows.contains(&y))
    })
}

fn columns(segmentation: &LineSegmentation) -> Vec<Range<u32>> {
    segmentation.boxes().iter().map(|it| it.columns()).collect()
}

fn assert_invariants(segmentation: &LineSegmentation) {
    assert!(segmentation.mean_glyph_height() > 0);
    assert!(segmentation.mean_glyph_width() > 0);
    for glyph in segmentation.boxes() {
        assert!(glyph.column_end > glyph.column_start, "{glyph:?}");
        assert!(glyph.row_bottom > glyph.row_top, "{glyph:?}");
    }
    assert!(segmentation
        .boxes()
        .windows(2)
        .all(|w| w[0].column_start < w[1].column_start));
}

#[test]
fn separated_blocks_give_exact_column_ranges() {
    init();
    let bitmap = blocks(70, 30, &[(5..25, 5..25), (40..60, 5..25)]);
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);

    assert_eq!(columns(&trace.cut), vec![5..25, 40..60]);
    assert_eq!(columns(&trace.classified), vec![5..25, 40..60]);
    assert!(trace
        .classified
        .boxes()
        .iter()
        .all(|it| it.kind == GlyphType::Ideograph));
}

#[test]
fn blank_line_yields_no_boxes() {
    init();
    let bitmap = LineBitmap::from_fn(80, 32, |_, _| false);
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let segmentation = segmenter.segment(&bitmap);
    assert!(segmentation.is_empty());
    assert_eq!(segmentation.mean_glyph_height(), 28);
    assert_eq!(segmentation.mean_glyph_width(), 76);
}

#[test]
fn glued_glyphs_are_recut() {
    init();
    // reference glyphs on both sides, a glued pair in the middle
    let bitmap = LineBitmap::from_fn(220, 40, |x, y| {
        let rows = (5..35).contains(&y);
        let glyphs = [10..40, 50..78, 82..112, 150..180]
            .iter()
            .any(|columns| columns.contains(&x));
        let bridge = (78..82).contains(&x) && y == 20;
        (glyphs && rows) || bridge
    });
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);

    assert_eq!(columns(&trace.cut), vec![10..40, 50..112, 150..180]);
    assert_eq!(columns(&trace.recut), vec![10..40, 50..78, 82..112, 150..180]);
    let limit = trace.cut.mean_glyph_height() as f32 * 5.0 / 4.0;
    assert!(trace.recut.boxes().iter().all(|it| it.width() as f32 <= limit));
    assert_invariants(&trace.recut);
}

#[test]
fn uniformly_dense_region_stays_whole() {
    init();
    let bitmap = blocks(260, 40, &[(10..40, 5..35), (60..150, 5..35), (200..230, 5..35)]);
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);
    assert!(trace.cut.boxes()[1].width() as f32 > 3.0 * 29.0 * 0.9);
    assert_eq!(columns(&trace.recut), vec![10..40, 60..150, 200..230]);
}

#[test]
fn three_strokes_merge_into_one_ideograph() {
    init();
    let bitmap = blocks(
        200,
        40,
        &[
            (10..40, 5..35),
            (50..58, 5..35),
            (61..69, 5..35),
            (72..80, 5..35),
            (100..130, 5..35),
        ],
    );
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);

    assert_eq!(trace.recut.len(), 5);
    assert_eq!(columns(&trace.merge), vec![10..40, 50..80, 100..130]);
    assert_eq!(trace.merge.boxes()[1].kind, GlyphType::Ideograph);
    assert_invariants(&trace.merge);
}

#[test]
fn similar_short_pair_is_not_merged() {
    init();
    let bitmap = blocks(
        200,
        40,
        &[(10..40, 5..35), (50..63, 8..34), (66..79, 8..34), (100..130, 5..35)],
    );
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);

    let pair = &trace.recut.boxes()[1..3];
    assert!(is_similar_shape(&pair[0], &pair[1], segmenter.options()));
    assert_eq!(columns(&trace.merge), vec![10..40, 50..63, 66..79, 100..130]);
}

#[test]
fn misaligned_pair_is_merged() {
    init();
    let bitmap = blocks(
        200,
        40,
        &[(10..40, 5..35), (50..63, 8..34), (66..79, 15..34), (100..130, 5..35)],
    );
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);
    assert_eq!(columns(&trace.merge), vec![10..40, 50..79, 100..130]);
}

#[test]
fn stage_invariants_hold_on_noisy_line() {
    init();
    let bitmap = LineBitmap::from_fn(400, 36, |x, y| {
        let seed = x.wrapping_mul(2654435761) ^ y.wrapping_mul(40503);
        (x % 37 < 29 && (4..32).contains(&y) && seed % 5 < 2) || (x % 90 < 3 && y == 18)
    });
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);
    for segmentation in [&trace.cut, &trace.recut, &trace.merge, &trace.classified] {
        assert_invariants(segmentation);
    }
    assert!(trace.merge.len() <= trace.recut.len());
    assert_eq!(columns(&segmenter.trace(&bitmap).cut), columns(&trace.cut));
}

#[test]
fn parallel_lines_keep_input_order() {
    init();
    let lines = (0..6)
        .map(|i| blocks(200, 30, &[(5..25, 5..25), (40 + i * 10..60 + i * 10, 5..25)]))
        .collect::<Vec<_>>();
    let segmenter = GlyphSegmenterBuilder::new()
        .threads(3)
        .build()
        .expect("Failed to build segmenter");
    let traces = segmenter.segment_lines(&lines);
    assert_eq!(traces.len(), 6);
    for (i, trace) in traces.iter().enumerate() {
        let i = i as u32;
        assert_eq!(columns(&trace.classified), vec![5..25, 40 + i * 10..60 + i * 10]);
    }
}

#[test]
fn record_file_holds_one_block_per_line() {
    init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("region.txt");
    let lines = [
        blocks(70, 30, &[(5..25, 5..25), (40..60, 5..25)]),
        blocks(70, 30, &[(10..30, 2..22)]),
    ];
    let segmenter = GlyphSegmenterBuilder::new().build().expect("Failed to build segmenter");

    let mut record = RecordWriter::create(&path).expect("Failed to create record");
    for (index, trace) in segmenter.segment_lines(&lines).iter().enumerate() {
        record.append(index, &trace.classified).expect("Failed to append");
    }
    record.finish().expect("Failed to flush record");

    let text = fs::read_to_string(&path).expect("Failed to read record");
    assert_eq!(text, "0\n5 5 25 24 1\n40 5 60 24 1\n\n1\n10 2 30 21 1\n\n");
}

#[test]
fn debug_outputs_are_written_per_stage() {
    init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let bitmap = blocks(70, 30, &[(5..25, 5..25), (40..60, 5..25)]);
    let options = SegmentationOptions::default();
    let segmenter = GlyphSegmenterBuilder::new()
        .options(options)
        .build()
        .expect("Failed to build segmenter");
    let trace = segmenter.trace(&bitmap);

    for (stage, segmentation) in trace.rendered_stages() {
        let path = save_overlay(segmentation, &dir.path().join(stage), 4)
            .expect("Failed to save overlay");
        assert_eq!(path, dir.path().join(stage).join("4.png"));
        assert!(path.exists());
    }

    let crops = dir.path().join("results").join("4");
    let count =
        save_glyph_crops(&trace.classified, &crops, &options).expect("Failed to save crops");
    assert_eq!(count, 2);
    let crop = image::open(crops.join("1.png")).expect("Failed to open crop").into_luma8();
    assert_eq!(crop.dimensions(), (20 + 14, 20 + 14));
}
