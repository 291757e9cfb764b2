//! Boundary outputs of a segmented line: debug overlays, glyph crops and the
//! line record read by the downstream recognizer.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use image::{imageops, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tracing::instrument;

use crate::{
    bitmap::BACKGROUND, error::Result, shape::is_ideograph_shape, GlyphBox, LineSegmentation,
    SegmentationOptions,
};

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of the line with a hollow rectangle drawn around every box.
pub fn render_overlay(segmentation: &LineSegmentation) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(segmentation.bitmap().image().clone()).to_rgb8();
    for glyph in segmentation.boxes() {
        let rect = Rect::at(glyph.column_start as i32, glyph.row_top as i32)
            .of_size(glyph.width().max(1), glyph.height() + 1);
        draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
    }
    canvas
}

/// Writes the overlay to `{dir}/{line_index}.png`, creating `dir`.
#[instrument(level = "debug", skip(segmentation))]
pub fn save_overlay(
    segmentation: &LineSegmentation,
    dir: &Path,
    line_index: usize,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{line_index}.png"));
    render_overlay(segmentation).save(&path)?;
    Ok(path)
}

/// The box's pixels, bottom ink row included, centred on a background canvas
/// with `padding` pixels on every side.
pub fn crop_glyph(segmentation: &LineSegmentation, glyph: &GlyphBox, padding: u32) -> GrayImage {
    let image = segmentation.bitmap().image();
    let x = glyph.column_start.min(image.width());
    let y = glyph.row_top.min(image.height());
    let width = glyph.width().min(image.width() - x);
    let height = (glyph.height() + 1).min(image.height() - y);
    log::trace!("Cropping glyph at ({x}, {y}) size {width}x{height}");
    let crop = imageops::crop_imm(image, x, y, width, height).to_image();

    let mut canvas = GrayImage::from_pixel(
        width + 2 * padding,
        height + 2 * padding,
        Luma([BACKGROUND]),
    );
    imageops::replace(&mut canvas, &crop, i64::from(padding), i64::from(padding));
    canvas
}

/// Saves every ideograph-shaped box as `{dir}/{count}.png`, numbered from
/// zero in line order. Returns how many crops were written.
#[instrument(level = "debug", skip(segmentation, options))]
pub fn save_glyph_crops(
    segmentation: &LineSegmentation,
    dir: &Path,
    options: &SegmentationOptions,
) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let reference = segmentation.mean_glyph_height();
    let mut count = 0;
    for glyph in segmentation
        .boxes()
        .iter()
        .filter(|it| is_ideograph_shape(it, reference, options))
    {
        crop_glyph(segmentation, glyph, options.crop_padding)
            .save(dir.join(format!("{count}.png")))?;
        count += 1;
    }
    Ok(count)
}

/// Writes one line block:
///
/// ```text
/// <line index>
/// <column start> <row top> <column end> <row bottom> <type code>
/// ...
/// <blank line>
/// ```
pub fn write_line_record<W: Write>(
    writer: &mut W,
    line_index: usize,
    segmentation: &LineSegmentation,
) -> std::io::Result<()> {
    writeln!(writer, "{line_index}")?;
    for glyph in segmentation.boxes() {
        writeln!(
            writer,
            "{} {} {} {} {}",
            glyph.column_start,
            glyph.row_top,
            glyph.column_end,
            glyph.row_bottom,
            glyph.kind.code()
        )?;
    }
    writeln!(writer)
}

/// Single appender for the record file. Lines must be appended in order.
pub struct RecordWriter {
    writer: BufWriter<File>,
}

impl RecordWriter {
    /// Creates or truncates the record file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Appends to an existing record file, creating it if needed.
    pub fn append_to(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, line_index: usize, segmentation: &LineSegmentation) -> Result<()> {
        write_line_record(&mut self.writer, line_index, segmentation)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
