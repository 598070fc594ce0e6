use crate::marshal::sink::{Column, ColumnMap};
use crate::schema::PATH_DELIMITER;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One JSON object per column entry: value, definition level, repetition level
fn entry_row(column: &Column, i: usize) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert(
        "value".to_string(),
        column.values[i].as_ref().map_or(Value::Null, |v| v.to_json()),
    );
    row.insert("d".to_string(), Value::from(column.definition_levels[i]));
    row.insert("r".to_string(), Value::from(column.repetition_levels[i]));
    row
}

/// File name for a column path, e.g. `root/a/b` -> `root.a.b.jsonl`
pub fn column_file_name(path: &str) -> String {
    format!("{}.jsonl", path.replace(PATH_DELIMITER, "."))
}

/// Writes columns to JSON Lines files, one per leaf path
pub struct ColumnWriter {
    output_dir: PathBuf,
    writers: HashMap<String, BufWriter<File>>,
}

impl ColumnWriter {
    /// Create a new ColumnWriter that writes to files in a directory
    pub fn new_file_writer<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create output directory")?;

        Ok(ColumnWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            writers: HashMap::new(),
        })
    }

    /// Append every column's entries to its file
    pub fn write_columns(&mut self, columns: &ColumnMap) -> Result<()> {
        for (path, column) in columns {
            if !self.writers.contains_key(path) {
                let filename = self.output_dir.join(column_file_name(path));
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&filename)
                    .with_context(|| format!("Failed to open file: {}", filename.display()))?;
                self.writers.insert(path.clone(), BufWriter::new(file));
            }

            let Some(writer) = self.writers.get_mut(path) else {
                continue;
            };
            for i in 0..column.len() {
                let json = serde_json::to_string(&entry_row(column, i))
                    .context("Failed to serialize column entry")?;
                writeln!(writer, "{}", json)
                    .context("Failed to write column entry")?;
            }
        }
        Ok(())
    }

    /// Flush all writers
    pub fn flush(&mut self) -> Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush().context("Failed to flush writer")?;
        }
        Ok(())
    }
}

/// A simpler writer that writes all columns to a single output
pub struct SingleWriter<W: Write> {
    writer: W,
}

impl<W: Write> SingleWriter<W> {
    pub fn new(writer: W) -> Self {
        SingleWriter { writer }
    }

    pub fn write_columns(&mut self, columns: &ColumnMap) -> Result<()> {
        for (path, column) in columns {
            for i in 0..column.len() {
                let mut row = entry_row(column, i);
                row.insert("_column".to_string(), Value::String(path.clone()));

                let json = serde_json::to_string(&row)
                    .context("Failed to serialize column entry")?;
                writeln!(self.writer, "{}", json)
                    .context("Failed to write column entry")?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::marshal;
    use crate::schema::{PhysicalType, Repetition, SchemaDefinition};
    use crate::types::Value as Record;

    fn columns() -> ColumnMap {
        let schema = SchemaDefinition::root(
            "root",
            vec![
                SchemaDefinition::string("name", Repetition::Required),
                SchemaDefinition::leaf("age", PhysicalType::Int64, Repetition::Optional),
            ],
        )
        .into_handler()
        .unwrap();

        let records = vec![
            Record::record([
                ("name", Record::from("Alice")),
                ("age", Record::some(Record::Int64(30))),
            ]),
            Record::record([("name", Record::from("Bob")), ("age", Record::none())]),
        ];
        marshal(&records, &schema).unwrap()
    }

    #[test]
    fn test_single_writer() {
        let mut buffer = Vec::new();
        let mut writer = SingleWriter::new(&mut buffer);
        writer.write_columns(&columns()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["_column"], "root/age");
        assert_eq!(lines[0]["value"], 30);
        assert_eq!(lines[1]["value"], Value::Null);
        assert_eq!(lines[1]["d"], 0);
        assert_eq!(lines[3]["value"], "Bob");
    }

    #[test]
    fn test_column_file_name() {
        assert_eq!(column_file_name("root/tags/list/element"), "root.tags.list.element.jsonl");
    }
}
