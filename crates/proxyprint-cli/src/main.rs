//! `proxyprint` CLI - crop card scans and lay them out for printing.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxyprint_core::cropper::CropSettings;
use proxyprint_core::document::write_pdf;
use proxyprint_core::project::display_title;
use proxyprint_core::{
    layout, Cropper, Orientation, PageSize, PreviewCache, Project, Workspace,
};

/// Prepare trading-card scans for printing.
#[derive(Parser, Debug)]
#[command(name = "proxyprint")]
#[command(version, about, long_about = None)]
struct Args {
    /// Workspace directory holding `images/`, `config.toml` and `print.json`.
    #[arg(long, default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the image directories and a default config.
    Init,
    /// Crop new scans, refresh previews and update the card list.
    Crop,
    /// Generate missing previews.
    Previews,
    /// Show cards and quantities.
    List,
    /// Set how many copies of a card to print.
    Set {
        card: String,
        quantity: u32,
    },
    /// Print one more copy of a card.
    Add { card: String },
    /// Print one fewer copy of a card.
    Sub { card: String },
    /// Change page settings.
    Page {
        /// Letter, A4 or Legal.
        #[arg(long)]
        size: Option<PageSize>,
        /// Portrait or Landscape.
        #[arg(long)]
        orientation: Option<Orientation>,
        /// Bleed margin in millimeters, capped at 3.05.
        #[arg(long, value_name = "MM")]
        bleed: Option<String>,
        /// Output PDF name without extension.
        #[arg(long)]
        filename: Option<String>,
    },
    /// Lay out the cards and write the PDF.
    Render,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("proxyprint={log_level},proxyprint_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let ws = Workspace::new(&args.root);

    match &args.command {
        Command::Init => {
            let wrote = ws.init().context("Failed to initialize workspace")?;
            if wrote {
                println!("Created {}", ws.config_path().display());
            }
            println!("Put card scans in {}", ws.image_dir().display());
        }
        Command::Crop => crop(&ws)?,
        Command::Previews => {
            let mut cache = PreviewCache::load(ws.cache_path())?;
            let generated = cache
                .refresh(&ws.crop_dir())
                .context("Failed to refresh previews")?;
            println!("{generated} new previews");
        }
        Command::List => {
            let project = load_project(&ws)?;
            for (name, qty) in &project.cards {
                println!("{qty:>4}  {}", display_title(name));
            }
            println!(
                "{} cards, {} copies",
                project.cards.len(),
                project.total_cards()
            );
        }
        Command::Set { card, quantity } => {
            edit_project(&ws, |project| project.set_quantity(card, *quantity))?;
        }
        Command::Add { card } => {
            let qty = edit_project(&ws, |project| project.increment(card))?;
            println!("{card}: {qty}");
        }
        Command::Sub { card } => {
            let qty = edit_project(&ws, |project| project.decrement(card))?;
            println!("{card}: {qty}");
        }
        Command::Page {
            size,
            orientation,
            bleed,
            filename,
        } => {
            edit_project(&ws, |project| {
                if let Some(size) = size {
                    project.pagesize = *size;
                }
                if let Some(orientation) = orientation {
                    project.orient = *orientation;
                }
                if let Some(bleed) = bleed {
                    project.set_bleed_edge(bleed)?;
                }
                if let Some(filename) = filename {
                    project.filename.clone_from(filename);
                }
                Ok(())
            })?;
        }
        Command::Render => render(&ws)?,
    }

    Ok(())
}

fn load_project(ws: &Workspace) -> Result<Project> {
    Project::load(&ws.project_path()).context("Failed to load project")
}

fn edit_project<T>(
    ws: &Workspace,
    edit: impl FnOnce(&mut Project) -> proxyprint_core::Result<T>,
) -> Result<T> {
    let mut project = load_project(ws)?;
    let out = edit(&mut project)?;
    project
        .save(&ws.project_path())
        .context("Failed to save project")?;
    Ok(out)
}

fn crop(ws: &Workspace) -> Result<()> {
    let config = ws.load_config().context("Failed to load configuration")?;
    let lut = ws.load_lut(&config)?;
    let mut project = load_project(ws)?;

    let settings = CropSettings {
        max_dpi: config.max_dpi,
        color_lut: lut.as_ref(),
    };
    let report = Cropper::new(ws.image_dir(), ws.crop_dir(), settings)
        .run(project.bleed())
        .context("Failed to crop images")?;
    info!(
        "{} written, {} up to date, {} failed",
        report.written.len(),
        report.skipped,
        report.failed.len()
    );

    let mut cache = PreviewCache::load(ws.cache_path())?;
    cache
        .refresh(&ws.crop_dir())
        .context("Failed to refresh previews")?;

    let (added, removed) = project.reconcile(ws.cropped_names()?);
    if added > 0 || removed > 0 {
        info!("{added} cards added, {removed} removed");
    }
    project
        .save(&ws.project_path())
        .context("Failed to save project")?;
    Ok(())
}

fn render(ws: &Workspace) -> Result<()> {
    // Reload so edits to config.toml are caught before a long render.
    ws.load_config().context("Failed to load configuration")?;
    let project = load_project(ws)?;
    let bleed = project.bleed();

    let pages = layout(&project.cards, project.pagesize, project.orient, bleed)
        .context("Failed to lay out pages")?;
    let (width, height) = project.orient.apply(project.pagesize.points());
    let target = project.output_path(ws.root());
    let written = write_pdf(&pages, &ws.variant_dir(bleed), &target, width, height)
        .context("Failed to write PDF")?;

    println!("{}", written.display());
    Ok(())
}
