use anyhow::{Context, Result};
use briefing_docx::briefing::{export_filename, resolve_entry_images};
use briefing_docx::inspect::validate_docx_file;
use briefing_docx::*;
use clap::{Parser, Subcommand};
use log::{LevelFilter, debug, info};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "briefing-docx")]
#[command(about = "Convert briefing content to Word documents")]
#[command(version)]
struct Cli {
    /// Theme file to use instead of the configured one
    #[arg(long, global = true)]
    theme: Option<PathBuf>,

    /// Increase log output (-v debug, -vv trace); RUST_LOG still applies
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one content file (HTML or TipTap JSON) to .docx
    Convert {
        input: PathBuf,

        /// Output file (defaults to the input name with .docx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ContentFormat::Auto)]
        format: ContentFormat,

        /// Print the converted paragraphs as JSON instead of writing a document
        #[arg(long)]
        dump: bool,
    },

    /// Export a daily briefing from a JSON array of entries
    Briefing {
        entries: PathBuf,

        /// Briefing date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Output file (defaults to "MM <yymmdd> <weekday> <day> <month>.docx")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave images out of the entry bodies
        #[arg(long)]
        no_images: bool,

        /// Print the document as a base64 data URI instead of writing a file
        #[arg(long)]
        attachment: bool,
    },

    /// Validate a .docx file and summarise its contents
    Check { file: PathBuf },

    /// Write the default theme to the config directory
    InitTheme,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Start logging
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    let theme = match &cli.theme {
        Some(path) => Theme::load_from(path)?,
        None => Theme::load()?,
    };

    match cli.command {
        Command::Convert {
            input,
            output,
            format,
            dump,
        } => convert(&theme, &input, output, format, dump).await,
        Command::Briefing {
            entries,
            date,
            output,
            no_images,
            attachment,
        } => briefing(&theme, &entries, &date, output, no_images, attachment).await,
        Command::Check { file } => check(&file),
        Command::InitTheme => {
            Theme::init_default()?;
            if let Some(path) = Theme::get_config_path() {
                println!("Theme written to {}", path.display());
            }
            Ok(())
        }
    }
}

async fn convert(
    theme: &Theme,
    input: &Path,
    output: Option<PathBuf>,
    format: ContentFormat,
    dump: bool,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let paragraphs = convert_content(&raw, format, theme)?;

    if dump {
        println!("{}", serde_json::to_string_pretty(&paragraphs)?);
        return Ok(());
    }

    let bytes = DocxWriter::new(theme).write_paragraphs(&paragraphs)?;
    let output = output.unwrap_or_else(|| input.with_extension("docx"));
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}

async fn briefing(
    theme: &Theme,
    entries_path: &Path,
    date: &str,
    output: Option<PathBuf>,
    no_images: bool,
    attachment: bool,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(entries_path)
        .await
        .with_context(|| format!("failed to read {}", entries_path.display()))?;
    let mut entries: Vec<BriefingEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid entries file {}", entries_path.display()))?;

    if !no_images {
        let base = entries_path.parent().unwrap_or(Path::new("."));
        let loaded = load_images(&entries, base).await;
        resolve_entry_images(&mut entries, |image| {
            loaded.get(&image.id).cloned().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no image file for this entry")
            })
        });
    }

    let exported_at = chrono::Local::now().naive_local();
    let document = BriefingAssembler::new(theme)
        .include_images(!no_images)
        .assemble(&entries, date, exported_at)?;
    let bytes = DocxWriter::new(theme).write(&document)?;

    if attachment {
        println!("{}", to_data_uri(&bytes));
        return Ok(());
    }

    let output = match output {
        Some(path) => path,
        None => PathBuf::from(export_filename(date)?),
    };
    tokio::fs::write(&output, bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!("exported {} entries", entries.len());
    println!("Wrote {}", output.display());
    Ok(())
}

/// Read every image file named by the entries, keyed by image id
async fn load_images(entries: &[BriefingEntry], base: &Path) -> HashMap<String, Vec<u8>> {
    let mut loaded = HashMap::new();

    for image in entries.iter().flat_map(|entry| entry.images.iter()) {
        let Some(path) = &image.path else {
            continue;
        };
        match tokio::fs::read(base.join(path)).await {
            Ok(bytes) => {
                loaded.insert(image.id.clone(), bytes);
            }
            Err(err) => debug!("could not read {}: {err}", path.display()),
        }
    }

    loaded
}

fn check(file: &Path) -> Result<()> {
    let summary = validate_docx_file(file)?;

    println!("{}: valid Word document", file.display());
    println!("  paragraphs: {}", summary.paragraphs.len());
    println!(
        "  tables:     {} ({} rows)",
        summary.tables, summary.table_rows
    );
    println!("  images:     {}", summary.images);
    println!("  hyperlinks: {}", summary.hyperlinks);
    println!(
        "  header:     {}",
        if summary.has_header { "yes" } else { "no" }
    );
    Ok(())
}
