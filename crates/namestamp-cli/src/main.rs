mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "namestamp",
    version,
    about = "Stamp roster names onto identifier spans in a PDF"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a PDF with the names from a roster spreadsheet
    Stamp {
        /// Path to the roster spreadsheet (xlsx or xls)
        roster: PathBuf,

        /// Path to the input PDF
        pdf: PathBuf,

        /// Where to write the stamped PDF
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: PathBuf,

        /// JSON style file; individual flags below override its values
        #[arg(long, value_name = "FILE")]
        style: Option<PathBuf>,

        /// Overlay font size in points
        #[arg(long, value_name = "PT")]
        font_size: Option<f32>,

        /// Overlay text color as #RRGGBB
        #[arg(long, value_name = "HEX")]
        text_color: Option<String>,

        /// Stamp background color as #RRGGBB
        #[arg(long, value_name = "HEX")]
        bg_color: Option<String>,

        /// Background opacity, 0 (transparent) to 1 (opaque)
        #[arg(long, value_name = "ALPHA")]
        bg_opacity: Option<f32>,

        /// Horizontal stamp offset in PDF units
        #[arg(long, value_name = "PTS")]
        x_offset: Option<f32>,

        /// Vertical stamp offset in PDF units (positive moves up)
        #[arg(long, value_name = "PTS")]
        y_offset: Option<f32>,

        /// Output format for the run summary: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Suppress per-page progress on stderr
        #[arg(short, long)]
        quiet: bool,
    },
    /// Load a roster spreadsheet and show its identifier mapping
    Roster {
        /// Path to the roster spreadsheet (xlsx or xls)
        roster: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// List every identifier with its names
        #[arg(long)]
        entries: bool,
    },
    /// List the text spans of a PDF with their origins
    Inspect {
        /// Path to the PDF
        pdf: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Only show spans that parse as identifiers
        #[arg(long)]
        ids_only: bool,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stamp {
            roster,
            pdf,
            out,
            style,
            font_size,
            text_color,
            bg_color,
            bg_opacity,
            x_offset,
            y_offset,
            output,
            quiet,
        } => commands::stamp::run(
            roster,
            pdf,
            out,
            style,
            commands::stamp::StyleOverrides {
                font_size,
                text_color,
                bg_color,
                bg_opacity,
                x_offset,
                y_offset,
            },
            &output,
            quiet,
        ),
        Commands::Roster {
            roster,
            output,
            entries,
        } => commands::roster::run(roster, &output, entries),
        Commands::Inspect {
            pdf,
            output,
            ids_only,
        } => commands::inspect::run(pdf, &output, ids_only),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
