use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{error::ErrorKind, Parser};
use glyphcut::{
    bitmap::LineBitmap,
    output::{save_glyph_crops, save_overlay, RecordWriter},
    GlyphSegmenterBuilder, SegmentationOptions,
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

const LINE_EXTENSIONS: &[&str] = &["png", "bmp", "jpg", "jpeg", "tif", "tiff"];

#[derive(Parser)]
#[command(name = "glyphcut", about = "Cut binarized text line images into glyph boxes")]
struct Cli {
    /// A line image, or a directory whose images (sorted by name) are the lines
    input: PathBuf,

    /// Directory receiving the record, overlays and crops
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Record file name, relative to the output directory
    #[arg(long, default_value = "region.txt")]
    record: PathBuf,

    /// Write per-stage overlays under cut/, recut/ and merge/
    #[arg(long)]
    debug: bool,

    /// Write padded ideograph crops under results/<line>/
    #[arg(long)]
    crops: bool,

    /// Label leftover boxes as noise, small punctuation or alphanumeric
    #[arg(long)]
    label_residuals: bool,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value = "0")]
    threads: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            eprintln!("Please specify the input image!");
            process::exit(-1);
        }
    };

    if let Err(err) = run(&cli) {
        log::error!("{err}");
        process::exit(-1);
    }
}

fn run(cli: &Cli) -> glyphcut::Result<()> {
    let options = SegmentationOptions {
        label_residuals: cli.label_residuals,
        ..Default::default()
    };
    let segmenter = GlyphSegmenterBuilder::new()
        .threads(cli.threads)
        .options(options)
        .build()?;

    let lines = line_paths(&cli.input)?
        .iter()
        .map(|path| LineBitmap::open(path))
        .collect::<glyphcut::Result<Vec<_>>>()?;
    log::debug!("Segmenting {} lines", lines.len());

    std::fs::create_dir_all(&cli.out_dir)?;
    let mut record = RecordWriter::create(&cli.out_dir.join(&cli.record))?;
    for (index, trace) in segmenter.segment_lines(&lines).iter().enumerate() {
        if cli.debug {
            for (stage, segmentation) in trace.rendered_stages() {
                save_overlay(segmentation, &cli.out_dir.join(stage), index)?;
            }
        }
        if cli.crops {
            let dir = cli.out_dir.join("results").join(index.to_string());
            let count = save_glyph_crops(&trace.classified, &dir, segmenter.options())?;
            log::debug!("Line {index}: saved {count} glyph crops");
        }
        record.append(index, &trace.classified)?;
    }
    record.finish()
}

fn line_paths(input: &Path) -> glyphcut::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut paths = std::fs::read_dir(input)?
        .map(|entry| entry.map(|it| it.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.retain(|path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| LINE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    });
    paths.sort();
    Ok(paths)
}
