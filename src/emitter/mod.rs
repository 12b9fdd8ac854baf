//! Renders the emitted decoder module: the generated lookup tables for one
//! element table, followed by the fixed runtime text spliced in verbatim.
//! The output depends only on `std`.

pub mod writer;

use std::fmt::Write as _;

use crate::schema::model::{ElementKind, ElementTable};

/// Render the complete decoder module for `table`. `label` names the schema
/// in the banner and is typically the module name.
pub fn render_module(table: &ElementTable, label: &str) -> String {
    let mut out = String::new();
    writeln!(out, "// {label}: a streaming EBML decoder emitted by ebmlgen.").ok();
    writeln!(
        out,
        "// Drive `Parser::parse` one byte at a time, then call `Parser::eof`"
    )
    .ok();
    writeln!(out, "// until it returns `Status::Ok`.").ok();
    writeln!(out).ok();
    out.push_str(&render_tables(table, label));
    writeln!(out).ok();
    out.push_str(include_str!("../runtime/vint.rs"));
    writeln!(out).ok();
    out.push_str(include_str!("../runtime/machine.rs"));
    out
}

/// Render the schema-dependent part: the type-name table and the ID
/// lookups, with one match arm per element in table insertion order.
pub fn render_tables(table: &ElementTable, label: &str) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "// Generated by ebmlgen from {label}. Do not edit by hand."
    )
    .ok();
    writeln!(out).ok();

    writeln!(
        out,
        "/// Spellings of the EBML element types, indexed by `ElementKind`."
    )
    .ok();
    writeln!(out, "pub const TYPE_NAMES: [&str; 8] = [").ok();
    let spellings: Vec<String> = ElementKind::SPELLINGS
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect();
    writeln!(out, "    {},", spellings.join(", ")).ok();
    writeln!(out, "];").ok();
    writeln!(out).ok();

    writeln!(out, "/// Element name for a known class ID.").ok();
    writeln!(out, "pub fn element_name(id: u64) -> Option<&'static str> {{").ok();
    writeln!(out, "    match id {{").ok();
    for def in table.iter() {
        writeln!(out, "        0x{:X} => Some(\"{}\"),", def.id, def.name).ok();
    }
    writeln!(out, "        _ => None,").ok();
    writeln!(out, "    }}").ok();
    writeln!(out, "}}").ok();
    writeln!(out).ok();

    writeln!(out, "/// Element type for a known class ID.").ok();
    writeln!(out, "pub fn element_kind(id: u64) -> Option<ElementKind> {{").ok();
    writeln!(out, "    match id {{").ok();
    for def in table.iter() {
        writeln!(
            out,
            "        0x{:X} => Some(ElementKind::{}),",
            def.id,
            kind_variant(def.kind)
        )
        .ok();
    }
    writeln!(out, "        _ => None,").ok();
    writeln!(out, "    }}").ok();
    writeln!(out, "}}").ok();
    out
}

fn kind_variant(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Master => "Master",
        ElementKind::UnsignedInteger => "UnsignedInteger",
        ElementKind::SignedInteger => "SignedInteger",
        ElementKind::Utf8 => "Utf8",
        ElementKind::String => "String",
        ElementKind::Date => "Date",
        ElementKind::Binary => "Binary",
        ElementKind::Float => "Float",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ingest::builtin_table;

    // The committed runtime tables are this renderer's own output for the
    // built-in schema; keep them in lockstep.
    #[test]
    fn test_committed_tables_match_renderer() {
        let table = builtin_table().unwrap();
        let rendered = render_tables(&table, "the built-in EBML schema");
        assert_eq!(rendered, include_str!("../runtime/tables.rs"));
    }

    #[test]
    fn test_module_contains_tables_and_runtime() {
        let table = builtin_table().unwrap();
        let module = render_module(&table, "ebml_decoder");
        assert!(module.contains("0x1A45DFA3 => Some(\"EBML\")"));
        assert!(module.contains("pub fn vint_length"));
        assert!(module.contains("pub struct Parser"));
        assert!(module.contains("pub fn parse(&mut self, byte: Byte) -> Status"));
        // the emitted module must not reach back into this crate
        assert!(!module.contains("crate::"));
    }

    #[test]
    fn test_redefined_element_is_emitted_once() {
        let mut table = builtin_table().unwrap();
        table
            .insert(crate::schema::model::ElementDefinition {
                name: "MyDocType".to_string(),
                path: crate::schema::model::ElementPath::root(),
                id: 0x4282,
                kind: ElementKind::String,
                range: crate::schema::model::Range::None,
            })
            .unwrap();
        let rendered = render_tables(&table, "test");
        assert!(rendered.contains("0x4282 => Some(\"MyDocType\")"));
        assert!(!rendered.contains("Some(\"DocType\"),"));
    }
}
