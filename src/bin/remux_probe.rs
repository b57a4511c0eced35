use std::{fs, path::PathBuf};

use annexb_remux::{
    Codec, MediaSample, RemuxConfig, Remuxer, Result as RemuxResult, SampleWriter, VideoFormat,
    WriterStatus,
};
use anyhow::{Context, Result, bail};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Repackage an Annex-B elementary stream into length-prefixed samples")]
struct Args {
    #[arg(long, default_value = "h264")]
    codec: String,
    #[arg(long)]
    input: PathBuf,
    /// Write the concatenated length-prefixed samples here.
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 360)]
    max_frames: u64,
}

/// Stand-in for the platform container writer: collects the format
/// descriptor and the framed samples, always ready for more.
#[derive(Debug, Default)]
struct CollectingWriter {
    format: Option<VideoFormat>,
    data: Vec<u8>,
    samples: usize,
    finished: bool,
}

impl SampleWriter for CollectingWriter {
    fn open(&mut self, format: &VideoFormat) -> RemuxResult<()> {
        self.format = Some(format.clone());
        Ok(())
    }

    fn ready_for_more(&self) -> bool {
        !self.finished
    }

    fn append(&mut self, sample: MediaSample) -> RemuxResult<()> {
        self.data.extend_from_slice(&sample.data);
        self.samples += 1;
        Ok(())
    }

    fn finish(&mut self) -> RemuxResult<WriterStatus> {
        self.finished = true;
        Ok(WriterStatus::Completed)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let codec = parse_codec(&args.codec)?;
    let data = fs::read(&args.input)
        .with_context(|| format!("failed to read input stream: {}", args.input.display()))?;

    let mut config = RemuxConfig::new(codec);
    config.max_frames = args.max_frames;

    let mut writer = CollectingWriter::default();
    let summary = Remuxer::new(config)
        .run(&data, &mut writer)
        .context("remux run failed")?;

    if let Some(path) = &args.output {
        fs::write(path, &writer.data)
            .with_context(|| format!("failed to write samples: {}", path.display()))?;
    }

    if let Some(format) = &writer.format {
        println!("format: {format}");
    }
    println!(
        "units={} frames={} skipped={} unprocessed={} status={} sample_bytes={}",
        summary.units_scanned,
        summary.frames_written,
        summary.samples_skipped,
        summary.units_unprocessed,
        summary.writer_status,
        writer.data.len()
    );
    Ok(())
}

fn parse_codec(value: &str) -> Result<Codec> {
    match value {
        "h264" | "avc" => Ok(Codec::H264),
        "h265" | "hevc" => Ok(Codec::Hevc),
        other => bail!("unknown codec: {other} (expected h264 or h265)"),
    }
}
