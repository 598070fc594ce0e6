/// Quickstart example - the simplest possible usage
use furnace_marshal::{infer_schema, marshal, ColumnWriter, JsonDecoder};
use serde_json::json;

fn main() -> anyhow::Result<()> {
    println!("=== Furnace Marshal Quick Start ===\n");

    // Step 1: Your JSON data
    let my_data = vec![
        json!({
            "id": 1,
            "username": "alice",
            "posts": [
                {"title": "My First Post", "tags": ["intro", "welcome"]},
                {"title": "Second Post", "tags": []}
            ]
        }),
        json!({"id": 2, "username": "bob", "posts": []}),
    ];

    // Step 2: Infer a schema and look at the leaf columns it defines
    let schema = infer_schema(&my_data, "root").into_handler()?;
    println!("Leaf columns:");
    for path in schema.leaf_paths() {
        println!("  {}", path);
    }

    // Step 3: Decode the JSON into records and marshal them
    let records = JsonDecoder::new(&schema).decode_all(&my_data)?;
    let columns = marshal(&records, &schema)?;

    // Step 4: Look at what we got
    for (path, column) in &columns {
        println!(
            "\n{} (max d={}, max r={})",
            path, column.max_definition_level, column.max_repetition_level
        );
        for i in 0..column.len() {
            let value = column.values[i].as_ref().map(|v| v.to_json());
            println!(
                "  d={} r={} value={:?}",
                column.definition_levels[i], column.repetition_levels[i], value
            );
        }
    }

    // Step 5: Write to files
    println!("\nWriting to .jsonl files...");
    let mut writer = ColumnWriter::new_file_writer("columns")?;
    writer.write_columns(&columns)?;
    writer.flush()?;

    println!("\n✓ Done! Try:");
    println!("  cat columns/root.posts.list.element.tags.list.element.jsonl");

    Ok(())
}
