use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use movielens_importer::{Importer, Table};
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "MovieLens data set importer")]
struct Args {
    /// Data set profile to download: "small" or "full"
    #[arg(short, long, default_value = "small")]
    dataset: String,
    /// Use this local archive instead of downloading a profile
    #[arg(short, long)]
    filename: Option<PathBuf>,
    /// Directory for downloaded archives (defaults to the OS temp dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download (or locate) the archive and print its local path
    Download,
    /// List the table files in the archive
    Tables,
    /// Print a table as JSON lines
    Read {
        table: String,
        /// Print the file content as-is instead of parsed rows
        #[arg(long)]
        raw: bool,
        /// Write imdbId as tt + seven digits
        #[arg(long)]
        normalize_imdb: bool,
        /// Stop after this many rows
        #[arg(long, conflicts_with = "raw")]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Importer::builder().dataset(&args.dataset);
    if let Some(path) = &args.filename {
        builder = builder.filename(path);
    }
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Command::Read {
        raw,
        normalize_imdb,
        ..
    } = &args.command
    {
        builder = builder.parse(!raw).normalize_imdb(*normalize_imdb);
    }
    let mut importer = builder.build().context("configuring importer")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &args.command {
        Command::Download => {
            let names = importer.table_names().context("loading archive")?;
            info!(tables = names.len(), "archive ready");
            writeln!(out, "{}", importer.archive_path()?.display())?;
        }
        Command::Tables => {
            for name in importer.table_names().context("loading archive")? {
                writeln!(out, "{}", name)?;
            }
        }
        Command::Read { table, limit, .. } => {
            let loaded = importer
                .read_table(table)
                .with_context(|| format!("reading {}", table))?;
            match loaded {
                Table::Raw(text) => out.write_all(text.as_bytes())?,
                Table::Rows(rows) => {
                    let take = limit.unwrap_or(rows.len());
                    for row in rows.iter().take(take) {
                        serde_json::to_writer(&mut out, row)?;
                        writeln!(out)?;
                    }
                }
            }
        }
    }

    out.flush()?;
    Ok(())
}
