use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::emitter;
use crate::schema::ingest;

/// Execute the generate command: ingest the schema and emit the decoder
/// module. Both paths have fixed defaults so a bare `generate` works from
/// a project root.
pub fn execute(schema: PathBuf, name: String, output: Option<PathBuf>) -> Result<()> {
    let xml = fs::read_to_string(&schema)
        .with_context(|| format!("Failed to read schema: {}", schema.display()))?;

    let table = ingest::ingest_schema(&xml)
        .with_context(|| format!("Failed to ingest schema: {}", schema.display()))?;
    log::info!("ingested {} element definitions", table.len());

    let output_path = output.unwrap_or_else(|| PathBuf::from("build").join(format!("{name}.rs")));
    let module = emitter::render_module(&table, &name);
    emitter::writer::write_module(&output_path, &module)?;
    log::info!("wrote decoder module to {}", output_path.display());

    Ok(())
}
