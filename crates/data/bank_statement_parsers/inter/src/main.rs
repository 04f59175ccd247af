use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use inter_parser::{render, InterNoteParser};

/// Extracts trades from an Inter settlement note and spreads its costs per instrument.
#[derive(Debug, Parser)]
#[command(name = "inter_parser", version)]
struct Args {
    /// Settlement note workbook (.xlsx, .xls, .ods)
    file: PathBuf,

    /// Sheet holding the note (defaults to the layout's sheet name)
    #[arg(long)]
    sheet: Option<String>,

    /// Layout settings JSON (defaults to ./settings.json when present)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inter_parser=info,settings_loader=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut layout = settings_loader::load_settings_with_fallback(args.settings.as_ref())?;
    if let Some(sheet) = args.sheet {
        layout.sheet_name = sheet;
    }

    tracing::info!(file = %args.file.display(), sheet = %layout.sheet_name, "parsing note");

    let parser = InterNoteParser::with_layout(layout);
    let result = parser
        .parse_file(&args.file)
        .with_context(|| format!("Failed parsing {}", args.file.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.trades.is_empty() {
        println!("❌ No trades found.");
    }
    print!("{}", render::render_report(&result));
    println!(
        "📊 Note {} · aggregate cost R$ {:.2}",
        result.metadata.note_number, result.aggregate_cost
    );

    Ok(())
}
