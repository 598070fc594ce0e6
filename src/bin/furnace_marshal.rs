//! furnace-marshal: Shred JSON records into leaf columns with repetition and definition levels
//!
//! Usage:
//!   # Infer the schema from the input and print every column entry to stdout
//!   furnace-marshal data.json
//!
//!   # Read NDJSON from stdin with an explicit schema
//!   cat events.jsonl | furnace-marshal --ndjson --schema events.schema.json
//!
//!   # One .jsonl file per column
//!   furnace-marshal --ndjson events.jsonl --output-dir ./columns
//!
//!   # Only report column sizes
//!   furnace-marshal --ndjson events.jsonl --summary

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use furnace_marshal::{
    infer_schema, ColumnMap, ColumnWriter, JsonDecoder, MarshalConfig, Marshaler,
    SchemaDefinition, SchemaHandler, SingleWriter,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "furnace-marshal")]
#[command(about = "Shred nested JSON records into leaf columns", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one JSON object per line)
    #[arg(long)]
    ndjson: bool,

    /// Schema definition file; inferred from the input if omitted
    #[arg(long, value_name = "SCHEMA.json", conflicts_with = "sample_size")]
    schema: Option<String>,

    /// Number of records to sample for schema inference
    #[arg(long, default_value_t = 100)]
    sample_size: usize,

    /// Root name for an inferred schema
    #[arg(long, default_value = "root")]
    root: String,

    /// Output directory for one .jsonl file per column
    /// If omitted, writes to stdout as a single stream tagged with the column path
    #[arg(long, short = 'o')]
    output_dir: Option<String>,

    /// Print per-column counts instead of the column entries
    #[arg(long)]
    summary: bool,

    /// Initial node pool capacity
    #[arg(long)]
    pool_capacity: Option<usize>,

    /// Don't reserve column capacity for the whole batch up front
    #[arg(long)]
    no_presize: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = MarshalConfig::default();
    if let Some(capacity) = args.pool_capacity {
        config.pool_capacity = capacity;
    }
    config.presize_columns = !args.no_presize;

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        )) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };
    let documents = read_documents(reader, args.ndjson)?;
    if documents.is_empty() {
        warn!("no JSON documents found in input");
    }

    let schema = load_schema(&args, &documents)?;
    let records = JsonDecoder::new(&schema)
        .decode_all(&documents)
        .context("Failed to decode input against the schema")?;
    let columns = Marshaler::new(config).marshal(&records, &schema)?;
    info!(records = records.len(), columns = columns.len(), "marshaled input");

    if args.summary {
        print_summary(&columns)?;
    } else if let Some(output_dir) = &args.output_dir {
        let mut writer = ColumnWriter::new_file_writer(output_dir)?;
        writer.write_columns(&columns)?;
        writer.flush()?;
    } else {
        let mut writer = SingleWriter::new(std::io::stdout().lock());
        writer.write_columns(&columns)?;
        writer.flush()?;
    }

    Ok(())
}

fn load_schema(args: &Args, documents: &[Value]) -> Result<SchemaHandler> {
    let definition = match &args.schema {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read schema {}", path))?;
            serde_json::from_str::<SchemaDefinition>(&text)
                .with_context(|| format!("Invalid schema {}", path))?
        }
        None => {
            let sample = &documents[..documents.len().min(args.sample_size)];
            debug!(samples = sample.len(), "inferring schema");
            infer_schema(sample, &args.root)
        }
    };
    Ok(definition.into_handler()?)
}

/// Parse all documents, using SIMD-accelerated parsing for single documents and arrays
fn read_documents(reader: Box<dyn Read>, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content)?;

    if ndjson {
        return parse_lines(&content);
    }

    // simd-json parses in place, so keep the original bytes for the fallback
    let mut scratch = content.clone();
    match simd_json::to_owned_value(&mut scratch) {
        Ok(simd_json::OwnedValue::Array(arr)) => {
            // A top-level array is a stream of records
            let mut documents = Vec::with_capacity(arr.len());
            for elem in arr.iter() {
                let json_str = simd_json::to_string(elem)?;
                documents.push(serde_json::from_str(&json_str)?);
            }
            Ok(documents)
        }
        Ok(elem) => {
            let json_str = simd_json::to_string(&elem)?;
            Ok(vec![serde_json::from_str(&json_str)?])
        }
        Err(e) => {
            debug!(error = %e, "simd-json rejected input, falling back to line parsing");
            parse_lines(&content)
        }
    }
}

fn parse_lines(content: &[u8]) -> Result<Vec<Value>> {
    let content_str = String::from_utf8_lossy(content);
    let mut documents = Vec::new();
    for (number, line) in content_str.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
        documents.push(value);
    }
    Ok(documents)
}

fn print_summary(columns: &ColumnMap) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "{:<48} {:>8} {:>8} {:>8} {:>4} {:>4}",
        "column", "entries", "nulls", "rows", "d", "r"
    )?;
    for (path, column) in columns {
        writeln!(
            stdout,
            "{:<48} {:>8} {:>8} {:>8} {:>4} {:>4}",
            path,
            column.len(),
            column.null_count(),
            column.row_count(),
            column.max_definition_level,
            column.max_repetition_level
        )?;
    }
    Ok(())
}
