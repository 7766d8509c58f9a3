use clap::{Parser, Subcommand};
use respimg::batch::{self, BatchOutcome};
use respimg::engine::{Engine, FigureOptions, ImageRequest, PictureOptions};
use respimg::markup::DataAttributes;
use respimg::types::PictureSources;
use respimg::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fields shared by every render command.
#[derive(clap::Args, Clone)]
struct ImageArgs {
    /// Logical image path (omit to exercise fallback/default substitution)
    #[arg(long)]
    path: Option<String>,

    /// Filter for src and width/height
    #[arg(long)]
    filter: String,

    /// Srcset filters (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    srcset: Vec<String>,

    /// Placeholder filter for lazy images
    #[arg(long)]
    placeholder: Option<String>,

    #[arg(long, default_value = "")]
    alt: String,

    /// CSS classes on the <img>
    #[arg(long, default_value = "")]
    class: String,

    /// sizes attribute
    #[arg(long)]
    sizes: Option<String>,

    /// Fetch priority hint: low or high
    #[arg(long)]
    importance: Option<String>,

    /// data-* attribute on the <img>, as NAME=VALUE (repeatable)
    #[arg(long = "data", value_name = "NAME=VALUE")]
    data: Vec<String>,

    /// Long description, rendered hidden and linked via aria-describedby
    #[arg(long)]
    html_alt: Option<String>,
}

impl ImageArgs {
    fn into_request(self) -> Result<ImageRequest, String> {
        Ok(ImageRequest {
            path: self.path,
            filter: self.filter,
            placeholder_filter: self.placeholder,
            srcset_filters: self.srcset,
            alt: self.alt,
            class: self.class,
            sizes: self.sizes,
            importance: self.importance,
            data: parse_data(&self.data)?,
            html_alt: self.html_alt,
        })
    }
}

fn parse_data(pairs: &[String]) -> Result<DataAttributes, String> {
    let mut data = DataAttributes::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("data attribute '{pair}' must be NAME=VALUE"))?;
        data.insert(name, value);
    }
    Ok(data)
}

#[derive(Parser)]
#[command(name = "respimg")]
#[command(about = "Responsive image markup from named image filters")]
#[command(long_about = "\
Responsive image markup from named image filters

Renders <img>, <figure> and <picture> fragments with srcset, sizes,
width/height, lazy-loading attributes and accessible long descriptions.
Image renditions are not generated here: URLs point at
{cache_prefix}/{filter}/{path}, served by your image service.

Filters are defined in respimg.toml:

  [filters.thumb_small]
  thumbnail = { size = [320, 180] }   # size known without reading the image

  [filters.hero_xl]
  relative_resize = { widen = 1280 }  # size read from the source header

Run 'respimg gen-config' to generate a documented respimg.toml.
Set RUST_LOG=debug to see fallback substitutions and failed probes.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "respimg.toml", global = true)]
    config: PathBuf,

    /// Source image directory (overrides [source] root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render an <img>
    Img(ImageArgs),
    /// Render a <figure>
    Figure {
        #[command(flatten)]
        image: ImageArgs,
        /// Lazy-load the image (noscript fallback included)
        #[arg(long)]
        lazy: bool,
        #[arg(long, default_value = "")]
        figure_class: String,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long, default_value = "")]
        caption_class: String,
    },
    /// Render a <picture>
    Picture {
        #[command(flatten)]
        image: ImageArgs,
        /// Lazy-load the sources and image
        #[arg(long)]
        lazy: bool,
        #[arg(long, default_value = "")]
        picture_class: String,
        /// Sources as JSON: {"path": ["filter", ...]} or {"path": {"filters": [...], "media": "..."}}
        #[arg(long, default_value = "{}")]
        sources: String,
    },
    /// Print the srcset value for a path
    Srcset {
        #[arg(long)]
        path: Option<String>,
        /// Filters (repeatable or comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        filters: Vec<String>,
    },
    /// Render a JSON array of requests in parallel
    Batch {
        /// Requests file
        requests: PathBuf,
    },
    /// Validate the config and list filters
    Check,
    /// Print a stock respimg.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut engine_config = config::load_config(&cli.config)?;
    if let Some(root) = &cli.root {
        engine_config.source.root = root.to_string_lossy().into_owned();
    }

    match cli.command {
        Command::Check => {
            println!("==> Checking {}", cli.config.display());
            output::print_check_output(&engine_config, &engine_config.filter_registry());
            println!("==> Config is valid");
        }
        Command::Img(image) => {
            let engine = Engine::from_config(&engine_config);
            println!("{}", engine.render_img(&image.into_request()?)?);
        }
        Command::Figure {
            image,
            lazy,
            figure_class,
            caption,
            caption_class,
        } => {
            let engine = Engine::from_config(&engine_config);
            let request = image.into_request()?;
            let options = FigureOptions {
                class: figure_class,
                caption,
                caption_class,
                ..FigureOptions::default()
            };
            let html = if lazy {
                engine.render_figure_lazy(&request, &options)?
            } else {
                engine.render_figure(&request, &options)?
            };
            println!("{}", html);
        }
        Command::Picture {
            image,
            lazy,
            picture_class,
            sources,
        } => {
            let engine = Engine::from_config(&engine_config);
            let request = image.into_request()?;
            let sources: PictureSources = serde_json::from_str(&sources)?;
            let options = PictureOptions {
                class: picture_class,
                sources,
                ..PictureOptions::default()
            };
            let html = if lazy {
                engine.render_picture_lazy(&request, &options)?
            } else {
                engine.render_picture(&request, &options)?
            };
            println!("{}", html);
        }
        Command::Srcset { path, filters } => {
            let engine = Engine::from_config(&engine_config);
            println!("{}", engine.render_srcset(path.as_deref(), filters.as_slice())?);
        }
        Command::Batch { requests } => {
            init_thread_pool(&engine_config.processing);
            let engine = Engine::from_config(&engine_config);
            let items = batch::parse_batch(&std::fs::read_to_string(&requests)?)?;
            let outcomes = batch::render_batch(&engine, &items);
            let failed = outcomes
                .iter()
                .filter(|o| matches!(o, BatchOutcome::Error { .. }))
                .count();
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            eprintln!(
                "{}",
                output::format_batch_summary(outcomes.len(), failed, &engine.cache().stats())
            );
        }
        Command::GenConfig => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores; the config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
