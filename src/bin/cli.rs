//! segkv CLI
//!
//! Offline tooling over a data directory. Do not point it at a directory a
//! running server has open.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use segkv::codec::RecordIterator;
use segkv::storage::{segment_file_name, LEGACY_SEGMENT_NAME};
use segkv::{Config, Result, SegKvError, Store};

/// segkv CLI
#[derive(Parser, Debug)]
#[command(name = "segkv-cli")]
#[command(about = "Inspect and edit a segkv data directory")]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./segkv_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List segments with their size and key count
    Inspect,

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Print every record of one segment file in order
    Dump {
        /// Segment id
        id: u64,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Inspect => inspect(&args.data_dir),
        Commands::Get { key } => {
            let store = open_store(&args.data_dir)?;
            match store.get(key.as_bytes()) {
                Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
                Err(SegKvError::NotFound) => println!("(not found)"),
                Err(e) => return Err(e),
            }
            store.close()
        }
        Commands::Put { key, value } => {
            let store = open_store(&args.data_dir)?;
            store.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
            store.close()
        }
        Commands::Dump { id } => dump(&args.data_dir, id),
    }
}

fn open_store(dir: &Path) -> Result<Store> {
    let config = Config::builder().data_dir(dir).read_workers(1).build();
    Store::open(config)
}

fn inspect(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(SegKvError::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let store = open_store(dir)?;

    println!("data dir:      {}", store.data_dir().display());
    println!("segment limit: {} bytes", store.config().segment_size_limit);
    println!();
    println!("{:>6}  {:<20} {:>10} {:>8}", "ID", "FILE", "BYTES", "KEYS");
    for stats in store.segment_stats() {
        let name = stats
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:>6}  {:<20} {:>10} {:>8}{}",
            stats.id,
            name,
            stats.size,
            stats.keys,
            if stats.current { "  (current)" } else { "" }
        );
    }
    println!("total: {} bytes", store.size());

    store.close()
}

fn dump(dir: &Path, id: u64) -> Result<()> {
    let mut path = dir.join(segment_file_name(id));
    if id == 0 && !path.exists() {
        path = dir.join(LEGACY_SEGMENT_NAME);
    }

    let file = File::open(&path)?;
    let mut records = RecordIterator::new(BufReader::new(file));
    let mut count = 0u64;
    for record in &mut records {
        let (offset, entry) = record?;
        println!(
            "{:>10}  {}  ({} bytes)",
            offset,
            String::from_utf8_lossy(&entry.key),
            entry.value.len()
        );
        count += 1;
    }
    println!("{} records, {} bytes", count, records.offset());

    Ok(())
}
