use clap::{Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use structured_data::catalog::TypeCatalog;
use structured_data::config::{self, StructuredDataConfig};
use structured_data::engine::MarkupEngine;
use structured_data::marker::parse_marker;
use structured_data::{batch, output};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "structured-data")]
#[command(about = "Rewrite data-sd hints in HTML into schema.org Microdata or RDFa Lite")]
#[command(long_about = "\
Rewrite data-sd hints in HTML into schema.org Microdata or RDFa Lite

Templates carry terse markers instead of hand-written semantic markup:

  <article data-sd=\"Article\">
    <h1 data-sd=\"headline\">Title</h1>
    <span data-sd=\"author Person.name\">Jane</span>
  </article>

become

  <article itemscope itemtype='https://schema.org/Article'>
    <h1 itemprop='headline'>Title</h1>
    <span itemprop='author'>Jane</span>
  </article>

Marker syntax: \"[Type][.property] [FallbackType][.fallbackProperty]\".
A leading capital marks a type. The fallback is used when the property
doesn't belong to the current type.

Run 'structured-data gen-config' to generate a documented structured-data.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./structured-data.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Markup flavour: microdata or rdfa (overrides the config)
    #[arg(long, global = true)]
    semantic: Option<String>,

    /// Marker suffix to rewrite; repeat for several (replaces the configured list)
    #[arg(long = "suffix", global = true)]
    suffixes: Vec<String>,

    /// Log more on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite one document (stdin when no file is given)
    Rewrite {
        /// HTML file to rewrite
        file: Option<PathBuf>,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rewrite every matching file under a directory
    Site {
        /// Source directory
        dir: PathBuf,
        /// Mirror results into this directory instead of rewriting in place
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show how a single marker parses and renders
    Resolve {
        /// Marker value, e.g. "Article.author Person.name"
        marker: String,
        /// Current type before the marker is applied
        #[arg(long = "type")]
        type_name: Option<String>,
        /// Human content for the automatic layout
        #[arg(long)]
        content: Option<String>,
    },
    /// List known types, or show one type's ancestors and properties
    Types {
        /// Type to describe
        type_name: Option<String>,
    },
    /// Print a stock structured-data.toml with all options documented
    GenConfig,
}

/// Effective config plus the custom type table it names, if any.
struct Settings {
    config: StructuredDataConfig,
    catalog: Option<TypeCatalog>,
}

impl Settings {
    fn catalog(&self) -> &TypeCatalog {
        self.catalog.as_ref().unwrap_or_else(|| TypeCatalog::schema_org())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Rewrite { file, output } => {
            let settings = load_settings(&cli)?;
            let html = match file {
                Some(path) => fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let mut rewriter = batch::configured_rewriter(&settings.config, settings.catalog())?;
            let outcome = rewriter.rewrite_document(&html);
            info!("{} markers rewritten", outcome.edits.len());
            match output {
                Some(path) => fs::write(path, &outcome.html)?,
                None => print!("{}", outcome.html),
            }
        }
        Command::Site { dir, out } => {
            let settings = load_settings(&cli)?;
            init_thread_pool(&settings.config.processing);
            let report =
                batch::rewrite_tree(dir, out.as_deref(), &settings.config, settings.catalog())?;
            output::print_site_output(&report, out.as_deref());
        }
        Command::Resolve {
            marker,
            type_name,
            content,
        } => {
            let settings = load_settings(&cli)?;
            let semantic = settings.config.semantic()?;
            let mut engine = MarkupEngine::with_catalog(semantic, settings.catalog());
            if let Some(type_name) = type_name {
                engine.set_type(type_name);
            }
            let parsed = parse_marker(marker);
            let resolution = engine.resolve(&parsed, content.as_deref());
            output::print_resolve_output(marker, &parsed, semantic, &resolution);
        }
        Command::Types { type_name } => {
            let settings = load_settings(&cli)?;
            output::print_types_output(settings.catalog(), type_name.as_deref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Stock defaults, then the config file, then command-line flags.
///
/// A relative `catalog` path resolves against the config file's directory.
fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn Error>> {
    let (overlay, base) = match &cli.config {
        Some(file) => (
            Some(config::read_config_file(file)?),
            file.parent().map(Path::to_path_buf).unwrap_or_default(),
        ),
        None => {
            let cwd = std::env::current_dir()?;
            (config::load_raw_config(&cwd)?, cwd)
        }
    };

    let mut config = config::resolve_config(config::stock_defaults_value(), overlay)?;
    if let Some(semantic) = &cli.semantic {
        config.semantic = semantic.clone();
    }
    if !cli.suffixes.is_empty() {
        config.suffixes = cli.suffixes.clone();
    }
    config.validate()?;

    let catalog = match config.catalog_path(&base) {
        Some(path) => {
            info!("Loading type table {}", path.display());
            Some(TypeCatalog::load(&path)?)
        }
        None => None,
    };
    Ok(Settings { config, catalog })
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("structured_data=warn"),
            1 => EnvFilter::new("structured_data=info"),
            _ => EnvFilter::new("structured_data=debug"),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
