use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use std::path::{Path, PathBuf};

use pixload::{Channels, DecodeOptions, ImageInfo, Layout};

#[derive(Parser)]
#[command(name = "pixload")]
#[command(about = "Inspect and decode QOI, PNG, JPEG, HDR and other images", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true, default_value_t)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, default_value_t)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print header metadata as JSON, one object per line
    Info {
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print whether the image is stored as floating point
    IsHdr {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Decode to raw samples, or to PNG when the output ends in .png
    Decode(DecodeArgs),
}

#[derive(clap::Args)]
struct DecodeArgs {
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Output channels (0 = native, 1-4)
    #[arg(short, long, value_name = "N")]
    channels: Option<u8>,

    /// Decode to 32-bit float samples (little-endian)
    #[arg(long, default_value_t)]
    float: bool,

    /// Flip rows bottom-to-top
    #[arg(long, default_value_t)]
    flip: bool,

    /// JSON file with default decode options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct InfoLine<'a> {
    path: &'a Path,
    channel_count: u8,
    #[serde(flatten)]
    info: ImageInfo,
}

impl<'a> InfoLine<'a> {
    fn new(path: &'a Path, info: ImageInfo) -> Self {
        InfoLine {
            path,
            channel_count: info.channels.count() as u8,
            info,
        }
    }
}

#[derive(serde::Serialize)]
struct DecodeSummary<'a> {
    output: &'a Path,
    float: bool,
    #[serde(flatten)]
    layout: Layout,
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose, args.quiet);

    match args.command {
        Command::Info { inputs } => {
            for input in &inputs {
                let data = read_input(input)?;
                let info = pixload::info(&data)
                    .with_context(|| format!("Failed to read header of {}", input.display()))?;
                let line = InfoLine::new(input, info);
                println!("{}", serde_json::to_string(&line)?);
            }
        }
        Command::IsHdr { input } => {
            let data = read_input(&input)?;
            println!("{}", pixload::is_hdr(&data));
        }
        Command::Decode(decode) => run_decode(&decode)?,
    }

    Ok(())
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_options(path: &Path) -> Result<DecodeOptions> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid decode options in {}", path.display()))
}

fn build_options(args: &DecodeArgs) -> Result<DecodeOptions> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => DecodeOptions::default(),
    };

    if let Some(count) = args.channels {
        options.channels = Channels::desired(count.into())
            .map_err(|_| anyhow::anyhow!("Channels must be between 0 and 4"))?;
    }
    if args.flip {
        options.flip_vertically = true;
    }

    Ok(options)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn run_decode(args: &DecodeArgs) -> Result<()> {
    let options = build_options(args)?;
    let data = read_input(&args.input)?;

    log::info!(
        "Decoding: `{}` ({})",
        args.input.display(),
        pixload::container(&data)
    );

    let layout = if args.float {
        if is_png(&args.output) {
            log::warn!("Float output is written as raw samples, not PNG");
        }
        let img = pixload::decode_float(&data, &options).context("Failed to decode image")?;
        let bytes: Vec<u8> = img.pixels().iter().flat_map(|s| s.to_le_bytes()).collect();
        std::fs::write(&args.output, bytes).context("Failed to write output file")?;
        *img.layout()
    } else {
        let img = pixload::decode(&data, &options).context("Failed to decode image")?;
        if is_png(&args.output) {
            image::save_buffer(
                &args.output,
                img.pixels(),
                img.width(),
                img.height(),
                color_type(img.channels()),
            )
            .context("Failed to write PNG")?;
        } else {
            std::fs::write(&args.output, img.pixels()).context("Failed to write output file")?;
        }
        *img.layout()
    };

    log::info!("Done: {}", args.output.display());
    let summary = DecodeSummary {
        output: &args.output,
        float: args.float,
        layout,
    };
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}

fn color_type(channels: Channels) -> image::ExtendedColorType {
    match channels {
        Channels::Gray => image::ExtendedColorType::L8,
        Channels::GrayAlpha => image::ExtendedColorType::La8,
        Channels::Rgb => image::ExtendedColorType::Rgb8,
        Channels::Rgba => image::ExtendedColorType::Rgba8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_args(config: Option<PathBuf>, channels: Option<u8>, flip: bool) -> DecodeArgs {
        DecodeArgs {
            input: PathBuf::from("in.qoi"),
            output: PathBuf::from("out.raw"),
            channels,
            float: false,
            flip,
            config,
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"channels":"rgb","flip_vertically":true}"#).unwrap();

        let options = build_options(&decode_args(Some(path.clone()), None, false)).unwrap();
        assert_eq!(options.channels, Some(Channels::Rgb));
        assert!(options.flip_vertically);

        let options = build_options(&decode_args(Some(path), Some(0), false)).unwrap();
        assert_eq!(options.channels, None);
    }

    #[test]
    fn rejects_bad_channel_count() {
        assert!(build_options(&decode_args(None, Some(5), false)).is_err());
    }

    #[test]
    fn bad_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = build_options(&decode_args(Some(path), None, true)).unwrap_err();
        assert!(err.to_string().contains("Invalid decode options"));
    }

    #[test]
    fn info_line_carries_numeric_channels() {
        let mut header = b"qoif".to_vec();
        header.extend_from_slice(&3u32.to_be_bytes());
        header.extend_from_slice(&2u32.to_be_bytes());
        header.extend_from_slice(&[4, 0]);
        header.extend_from_slice(&pixload::QOI_PADDING);

        let info = pixload::info(&header).unwrap();
        let line = serde_json::to_value(InfoLine::new(Path::new("a.qoi"), info)).unwrap();
        assert_eq!(line["channel_count"], 4);
        assert_eq!(line["channels"], "rgba");
        assert_eq!(line["width"], 3);
    }

    #[test]
    fn png_extension_detection() {
        assert!(is_png(Path::new("out.PNG")));
        assert!(!is_png(Path::new("out.raw")));
        assert!(!is_png(Path::new("png")));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
