// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

// Use library instead of local modules
use life_timeline::{
    config_from_query, export_config, list_config_files, load_config, render, render_year_ansi,
    resolve_timeline, resolve_year, save_config, share_url, today, Configuration, OutputFormat,
};

#[derive(Parser, Debug)]
#[command(name = "life-timeline")]
#[command(version, about = "Visualize a life as a grid of months colored by life periods")]
struct Cli {
    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, conflicts_with = "from_url")]
    config: Option<PathBuf>,

    /// Load the configuration from a share URL or its query string
    #[arg(long, global = true)]
    from_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    View,

    /// Render the month grid
    Render {
        #[arg(short, long, value_enum, default_value = "ansi")]
        format: Format,

        /// Date treated as "now" (YYYY-MM-DD, default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the day grid of one year's events
    Year {
        year: i32,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Export the configuration as life_timeline_config.yaml
    Export {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print a share URL carrying the configuration
    Share {
        #[arg(short, long, default_value = "http://localhost:3000/")]
        base: String,
    },

    /// Write the default template to a new file
    Init { path: PathBuf },

    /// Validate the configuration and print a summary
    Check,

    /// List configuration files in a directory
    List {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Ansi,
    Html,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ansi => OutputFormat::Ansi,
            Format::Html => OutputFormat::Html,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_source(&cli)?;

    match cli.command.unwrap_or(Command::View) {
        Command::View => run_ui_mode(config, cli.config)?,
        Command::Render {
            format,
            as_of,
            output,
        } => {
            let timeline = resolve_timeline(&config, as_of.unwrap_or_else(today));
            let text = render(&timeline, format.into())?;
            match output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("✓ Rendered {} months to {}", timeline.len(), path.display());
                }
                None => print!("{}", text),
            }
        }
        Command::Year { year, as_of } => {
            let view = resolve_year(&config, year, as_of.unwrap_or_else(today));
            print!("{}", render_year_ansi(&view));
        }
        Command::Export { dir } => {
            let path = export_config(&dir, &config)
                .with_context(|| format!("failed to export into {}", dir.display()))?;
            println!("✓ Exported configuration to {}", path.display());
        }
        Command::Share { base } => {
            println!("{}", share_url(&base, &config)?);
        }
        Command::Init { path } => run_init(&path)?,
        Command::Check => print_summary(&config),
        Command::List { dir } => run_list(&dir)?,
    }

    Ok(())
}

/// `--from-url`, then `--config`, then the built-in template.
fn load_source(cli: &Cli) -> Result<Configuration> {
    if let Some(url) = &cli.from_url {
        return match config_from_query(url).context("failed to load configuration from URL")? {
            Some(config) => Ok(config),
            None => bail!("URL has no `config` parameter"),
        };
    }

    match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => {
            log::info!("no configuration given, using the default template");
            Ok(Configuration::template())
        }
    }
}

fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    save_config(path, &Configuration::template())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("✓ Wrote template configuration to {}", path.display());
    Ok(())
}

fn print_summary(config: &Configuration) {
    println!("📋 {}", config.name);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Born:            {}", config.date_of_birth);
    println!(
        "  Life expectancy: {} years (until {})",
        config.life_expectancy_years,
        config.end_month()
    );
    println!("  Periods:         {}", config.periods.len());
    for period in &config.periods {
        println!("    {} {:<24} from {}", period.color, period.name, period.start);
    }
    let events: usize = config.yearly_events.values().map(Vec::len).sum();
    println!(
        "  Yearly events:   {} across {} years",
        events,
        config.yearly_events.len()
    );
    println!("\n✅ Configuration is valid");
}

fn run_list(dir: &Path) -> Result<()> {
    let files = list_config_files(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    if files.is_empty() {
        println!("No configuration files in {}", dir.display());
        return Ok(());
    }

    println!("📂 {} configuration files in {}", files.len(), dir.display());
    for path in files {
        match load_config(&path) {
            Ok(config) => println!("  ✓ {} - {}", path.display(), config.name),
            Err(e) => println!("  ❌ {} - {}", path.display(), e),
        }
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: Configuration, source: Option<PathBuf>) -> Result<()> {
    println!("🖥️  Loading Life Timeline UI...\n");
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(config, source, today());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: Configuration, _source: Option<PathBuf>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or render directly: life-timeline render --format html --output timeline.html");
    std::process::exit(1);
}
