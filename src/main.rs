use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbrelay::imaging::{MozJpeg, Style};
use thumbrelay::{batch, config, output};

fn version_string() -> &'static str {
    let on_tag = env!("THUMBRELAY_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("THUMBRELAY_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

fn parse_style(token: &str) -> Result<Style, String> {
    Style::parse_strict(token)
        .ok_or_else(|| format!("unknown style '{token}' (expected yt, yt_fit, square or auto)"))
}

#[derive(Parser)]
#[command(name = "thumbrelay")]
#[command(about = "Telegram-compatible thumbnails: JPEG, at most 200 KiB, at most 320 px")]
#[command(long_about = "\
Telegram-compatible thumbnails: JPEG, at most 200 KiB, at most 320 px

Styles:
  yt       320x180, center crop (default)
  yt_fit   320x180, whole image over a blurred backdrop
  square   320x320, center crop
  auto     aspect preserved, longest side at most 320, never upscaled

Inputs may be JPEG, PNG, WebP, GIF (first frame), BMP, TIFF or AVIF.
EXIF orientation is applied before framing.

Run 'thumbrelay gen-config' to print a documented thumbrelay.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, default_value = "thumbrelay.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write <stem>-thumb.jpg for each input image
    Thumb {
        /// Input images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Framing style (defaults to `defaults.thumb_style` from config)
        #[arg(long, value_parser = parse_style)]
        style: Option<Style>,

        /// Write thumbnails here instead of next to each input
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock thumbrelay.toml with all options documented
    GenConfig,
    /// Load and validate the config file, then print the effective settings
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Thumb {
            inputs,
            style,
            out_dir,
            json,
        } => {
            let relay_config = load_and_init_logging(&cli.config)?;
            init_thread_pool(&relay_config.processing);
            let style = style.unwrap_or(relay_config.defaults.thumb_style);
            log::info!("generating {} thumbnail(s), style {style}", inputs.len());

            let results = batch::thumb_files(&MozJpeg, &inputs, out_dir.as_deref(), style);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::thumb_json(&results))?
                );
            } else {
                output::print_thumb_output(&results);
            }

            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} inputs failed", results.len()).into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig => {
            let relay_config = load_and_init_logging(&cli.config)?;
            output::print_config_check(&cli.config, &relay_config);
        }
    }

    Ok(())
}

/// Load the config, then start logging at its level (`RUST_LOG` wins).
fn load_and_init_logging(
    path: &std::path::Path,
) -> Result<config::RelayConfig, config::ConfigError> {
    let relay_config = config::load_config(path)?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(relay_config.logging.level.as_str()),
    )
    .init();
    Ok(relay_config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
