//! aikon CLI - composite and decompose icons from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use aikon_renderer::{
    BackgroundShape, CompositionProfile, IconComposer, LayerState, PaintKind, StrokeStyle,
};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// aikon - icon re-skinning compositor
#[derive(Parser)]
#[command(name = "aikon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite an icon onto a background
    Compose {
        /// Base icon (SVG file)
        icon: PathBuf,

        /// Overlay icon (SVG file)
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Composition profile (JSON)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Output file; `.png` rasterizes, anything else writes SVG.
        /// Prints SVG to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Raster size in pixels
        #[arg(short, long, default_value = "512")]
        size: u32,

        /// Animation progress between 0 and 1
        #[arg(long)]
        progress: Option<f64>,

        /// Background shape
        #[arg(long, value_enum)]
        shape: Option<BackgroundShape>,

        /// Background paint
        #[arg(long, value_enum)]
        background_paint: Option<PaintKind>,

        /// Background frame stroke style
        #[arg(long, value_enum)]
        frame_style: Option<StrokeStyle>,
    },

    /// List the pieces of an icon as JSON
    Pieces {
        /// Icon (SVG file)
        icon: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Compose {
            icon,
            overlay,
            profile,
            output,
            size,
            progress,
            shape,
            background_paint,
            frame_style,
        } => {
            let mut profile = match profile {
                Some(path) => CompositionProfile::from_json(&fs::read_to_string(path)?)?,
                None => CompositionProfile::new(),
            };
            profile.base.source = Some(fs::read_to_string(&icon)?.into());
            if let Some(path) = overlay {
                profile.overlay = LayerState::from_svg(fs::read_to_string(path)?);
            }
            if let Some(shape) = shape {
                profile.background.shape = shape;
            }
            if let Some(paint) = background_paint {
                profile.background.paint = paint;
            }
            if let Some(style) = frame_style {
                profile.background.stroke_style = style;
            }

            let mut composer = IconComposer::new(profile);
            match output {
                Some(path) if is_png(&path) => {
                    let image = composer
                        .rasterize(size, progress)
                        .ok_or("composite could not be rasterized")?;
                    image.save(&path)?;
                    tracing::info!(path = %path.display(), size, "wrote raster composite");
                }
                Some(path) => {
                    fs::write(&path, composer.render(progress))?;
                    tracing::info!(path = %path.display(), "wrote composite");
                }
                None => println!("{}", composer.render(progress)),
            }
        }

        Commands::Pieces { icon } => {
            let mut composer = IconComposer::new(
                CompositionProfile::new().with_base(LayerState::from_svg(fs::read_to_string(icon)?)),
            );
            let pieces = composer.pieces();
            tracing::debug!(count = pieces.len(), "decomposed icon");
            println!("{}", serde_json::to_string_pretty(&pieces)?);
        }
    }

    Ok(())
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
