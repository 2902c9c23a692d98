//! weightblob inspector
//!
//! Prints the header, the record table, checksum results or element values
//! of a blob file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use weightblob::{Config, StorageReader};

/// weightblob inspector
#[derive(Parser, Debug)]
#[command(name = "weightblob-inspect")]
#[command(about = "Inspect weightblob files")]
#[command(version)]
struct Args {
    /// Blob file to open
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show header fields
    Info,

    /// List every record
    List,

    /// Verify every payload checksum
    Verify,

    /// Print the values of one record
    Dump {
        /// Payload offset of the record
        #[arg(short, long)]
        offset: u64,

        /// Maximum number of values to print
        #[arg(short, long, default_value = "32")]
        limit: usize,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,weightblob=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> weightblob::Result<()> {
    let reader = StorageReader::open_with_config(&args.path, &Config::default())?;

    match &args.command {
        Commands::Info => {
            println!("path:       {}", reader.path().display());
            println!("version:    {}", reader.version()?);
            println!("encrypted:  {}", reader.is_encrypted()?);
            println!("records:    {}", reader.record_count()?);
            println!("file bytes: {}", reader.file_len()?);
        }

        Commands::List => {
            println!("{:>12}  {:<9} {:>12} {:>12}  {:>10}", "offset", "type", "elements", "bytes", "crc32");
            for record in reader.records()? {
                println!(
                    "{:>12}  {:<9} {:>12} {:>12}  {:#010x}",
                    record.offset,
                    record.data_type,
                    record.element_count,
                    record.byte_length,
                    record.payload_crc
                );
            }
        }

        Commands::Verify => {
            reader.verify()?;
            println!("ok: {} records verified", reader.record_count()?);
        }

        Commands::Dump { offset, limit } => {
            let span = reader.view_dyn(*offset)?;
            println!("{} x {}", span.data_type(), span.len());
            println!("[{}]", span.format_values(*limit).join(", "));
            if span.len() > *limit {
                println!("... {} more", span.len() - limit);
            }
        }
    }

    Ok(())
}
