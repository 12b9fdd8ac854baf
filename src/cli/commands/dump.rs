use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::runtime::{ElementKind, Parser, Status};

/// Execute the dump command: drive a decoder over the document byte by
/// byte and print one line per boundary crossing.
pub fn execute(input: PathBuf) -> Result<()> {
    let data =
        fs::read(&input).with_context(|| format!("Failed to read file: {}", input.display()))?;

    let mut parser = Parser::new();
    for (i, &byte) in data.iter().enumerate() {
        match parser.parse(byte) {
            Status::Ok => {}
            Status::ElemStart => print_start(&parser),
            Status::ElemEnd => print_end(&parser),
            Status::Error => {
                parser.print();
                anyhow::bail!("decode error at byte {} of {}", i, input.display());
            }
        }
    }
    loop {
        match parser.eof() {
            Status::Ok => break,
            Status::ElemStart => print_start(&parser),
            Status::ElemEnd => print_end(&parser),
            Status::Error => {
                parser.print();
                anyhow::bail!("unterminated document: {}", input.display());
            }
        }
    }

    Ok(())
}

fn print_start(parser: &Parser) {
    let indent = "|".repeat(parser.this_depth.saturating_sub(1));
    println!(
        "{indent}+--{}--0x{:X}--{}--{}--",
        parser.name,
        parser.this_id,
        parser.kind.type_name(),
        parser.this_size
    );
}

fn print_end(parser: &Parser) {
    let indent = "|".repeat(parser.this_depth);
    match parser.kind {
        ElementKind::UnsignedInteger => println!("{indent}{}", parser.value),
        ElementKind::SignedInteger | ElementKind::Date => {
            println!("{indent}{}", parser.value as i64);
        }
        ElementKind::Float => println!("{indent}{}", parser.float_value),
        ElementKind::String | ElementKind::Utf8 => {
            println!("{indent}{}", String::from_utf8_lossy(parser.string_bytes()));
        }
        ElementKind::Master | ElementKind::Binary => {}
    }
}
