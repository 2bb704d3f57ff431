use clap::{Parser, Subcommand};
use grimoire::{config, output, site};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "grimoire")]
#[command(about = "Static site generator for Markdown notes")]
#[command(long_about = "\
Static site generator for Markdown notes

Your notes folder is the data source. Every .md file becomes a page, folders
become sidebar sections, and [[wiki links]] resolve by note name.

Content structure:

  content/
  ├── index.md                    # Landing page (index layout)
  ├── Getting Started.md          # Page → Getting Started.html
  ├── notes/
  │   ├── Rust Tips.md            # Page → notes/Rust Tips.html
  │   └── attachments/
  │       └── diagram.svg         # Media → static/media/diagram.svg
  ├── private/                    # Skipped (ignorePatterns)
  └── .obsidian/                  # Skipped (hidden)

Front matter (optional YAML between --- lines):
  title, date, tags, author, category, status, priority, description,
  aliases, created, modified, draft

Run 'grimoire gen-config' to print a config file with every option.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, default_value = config::CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Content directory (overrides `inputDir` from the config)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Render the whole site into the output directory
    Build {
        #[command(flatten)]
        input: InputArgs,
        /// Output directory (deleted and recreated)
        #[arg(short, long, default_value = "dist")]
        output: PathBuf,
        /// Publish notes marked `draft: true`
        #[arg(long)]
        drafts: bool,
        /// Do not probe remote image URLs
        #[arg(long)]
        offline: bool,
    },
    /// Show the notes that would be published
    List {
        #[command(flatten)]
        input: InputArgs,
        /// Include notes marked `draft: true`
        #[arg(long)]
        drafts: bool,
    },
    /// Delete the output directory
    Clean {
        #[command(flatten)]
        input: InputArgs,
        #[arg(short, long, default_value = "dist")]
        output: PathBuf,
    },
    /// Print a stock config file with every option
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            drafts,
            offline,
        } => {
            let site_config = config::load_config(&cli.config)?;
            init_thread_pool(&site_config.processing);
            let options = site::BuildOptions {
                input_dir: resolve_input(&input, &site_config),
                output_dir: output,
                include_drafts: drafts,
                offline,
            };
            let report = site::build(&site_config, &options)?;
            output::print_build_report(&report);
            if !report.is_clean() {
                log::warn!(
                    "{} file(s) failed; the rest of the site was built",
                    report.failures.len()
                );
            }
        }
        Command::List { input, drafts } => {
            let site_config = config::load_config(&cli.config)?;
            let source = resolve_input(&input, &site_config);
            let nodes = site::published_tree(&source, &site_config, drafts)?;
            output::print_tree_output(&nodes);
        }
        Command::Clean { input, output } => {
            let site_config = config::load_config(&cli.config)?;
            let source = resolve_input(&input, &site_config);
            if site::clean(&output, &source)? {
                println!("Removed {}", output.display());
            } else {
                println!("Nothing to clean at {}", output.display());
            }
        }
        Command::GenConfig => {
            println!("{}", config::stock_config_json());
        }
    }

    Ok(())
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

/// `--input` wins over the config's content directory.
fn resolve_input(args: &InputArgs, site_config: &config::SiteConfig) -> PathBuf {
    args.input
        .clone()
        .unwrap_or_else(|| site_config.content_root())
}
