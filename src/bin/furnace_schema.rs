//! furnace-schema: Infer a columnar schema definition from JSON examples
//!
//! Usage:
//!   # Read from file, output to stdout
//!   furnace-schema data.json
//!
//!   # Process NDJSON with compact output and a custom root name
//!   furnace-schema --ndjson events.jsonl --compact --root event
//!
//! The output can be passed back to `furnace-marshal --schema`.

use anyhow::{Context, Result};
use clap::Parser;
use furnace_marshal::SchemaBuilder;
use serde_json::Value;
use std::fs::File;
use std::io::{stdin, BufRead, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "furnace-schema")]
#[command(about = "Infer a columnar schema from JSON examples", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,

    /// Name of the root group
    #[arg(long, default_value = "root")]
    root: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let reader: Box<dyn BufRead> = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        ))
    } else {
        Box::new(BufReader::new(stdin()))
    };

    let mut builder = SchemaBuilder::new();

    if args.ndjson {
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line)?;
            builder.add_value(&value);
        }
    } else {
        let value: Value = serde_json::from_reader(reader).context("Failed to parse JSON")?;
        // A top-level array holds the examples
        match value {
            Value::Array(items) => items.iter().for_each(|item| builder.add_value(item)),
            other => builder.add_value(&other),
        }
    }

    if builder.sample_count() == 0 {
        warn!("no JSON objects found in input");
    }
    debug!(samples = builder.sample_count(), "building schema");

    let schema = builder.build(&args.root);

    let output = if args.compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };

    println!("{}", output);

    Ok(())
}
