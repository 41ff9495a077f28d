//! Remux CLI - copy a live stream into a fragmented container file.

use clap::Parser;
use remux_containers::registry;
use remux_pipeline::{RemuxConfig, RemuxEngine, RemuxSummary};
use std::path::PathBuf;
use tracing::debug;

/// Command-line arguments for the remux tool.
#[derive(Parser, Debug)]
#[command(name = "remux")]
#[command(version)]
#[command(about = "Copy a live stream into a fragmented container file without re-encoding")]
#[command(long_about = "Remux pulls compressed packets from a live source and copies them \n\
    into a fragmented destination container, repairing timestamps on the \n\
    way. The output is playable while still being written, so it can be \n\
    piped to a consumer.\n\n\
    EXAMPLES:\n    \
    remux -i rtsp://camera/live -o out.mp4\n    \
    remux -i rtsp://camera/live -o out.mp4 --frames 100\n    \
    remux -f rtsp -i rtsp://camera/live -o out.mp4 --json")]
struct Args {
    /// Source location (e.g. an rtsp:// URL)
    #[arg(short, long)]
    input: String,

    /// Destination file path
    #[arg(short, long)]
    output: PathBuf,

    /// Source format hint
    #[arg(short = 'f', long, default_value = "rtsp")]
    format: String,

    /// Destination format hint
    #[arg(long, default_value = "mp4")]
    output_format: String,

    /// Stop after this many copied units (0 = run until the source ends)
    #[arg(short = 'n', long, default_value = "0")]
    frames: u64,

    /// JSON summary output for programmatic parsing
    #[arg(long, conflicts_with = "verbose")]
    json: bool,

    /// Verbose logging output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    if !args.json {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(if args.verbose {
                tracing::Level::TRACE
            } else {
                tracing::Level::WARN
            })
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    registry::init();

    // The destination is always a local file reference.
    let destination = format!("file:{}", args.output.display());
    debug!(destination = %destination, "resolved destination location");

    let config = RemuxConfig::new(
        args.format.as_str(),
        args.input.as_str(),
        args.output_format.as_str(),
        destination,
    )
    .frame_budget(args.frames);

    match RemuxEngine::new(config).run() {
        Ok(summary) => {
            report(&args, &summary);
        }
        Err(e) => {
            println!("{e}");
            std::process::exit(1);
        }
    }
}

fn report(args: &Args, summary: &RemuxSummary) {
    if args.json {
        match serde_json::to_string(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                println!("failed to encode summary: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "copied {} units ({} bytes) to {}",
            summary.units_committed,
            summary.bytes_copied,
            args.output.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["remux", "-i", "rtsp://cam/live", "-o", "out.mp4"]);
        assert_eq!(args.format, "rtsp");
        assert_eq!(args.output_format, "mp4");
        assert_eq!(args.frames, 0);
        assert!(!args.json);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_frame_bound() {
        let args = Args::parse_from([
            "remux",
            "-i",
            "rtsp://cam/live",
            "-o",
            "out.mp4",
            "--frames",
            "100",
        ]);
        assert_eq!(args.frames, 100);
    }

    #[test]
    fn test_destination_is_file_reference() {
        let args = Args::parse_from(["remux", "-i", "rtsp://cam/live", "-o", "/tmp/out.mp4"]);
        let destination = format!("file:{}", args.output.display());
        assert_eq!(destination, "file:/tmp/out.mp4");
    }
}
