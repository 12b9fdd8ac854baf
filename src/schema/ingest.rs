use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;

use crate::error::{Result, SchemaError};
use crate::schema::model::{ElementDefinition, ElementKind, ElementTable, Range};
use crate::schema::path::parse_path;
use crate::schema::range::parse_range;

/// The standard EBML header elements and the two global elements, seeded
/// ahead of every user schema so user definitions sharing an ID replace
/// them. Tuples are (name, path, id, type, range) in schema spelling.
const BUILTIN_ELEMENTS: [(&str, &str, u64, &str, &str); 10] = [
    ("EBML", "\\EBML", 0x1A45DFA3, "master", ""),
    ("EBMLVersion", "\\EBML\\EBMLVersion", 0x4286, "uinteger", "not 0"),
    ("EBMLReadVersion", "\\EBML\\EBMLReadVersion", 0x42F7, "uinteger", "not 0"),
    ("EBMLMaxIDLength", "\\EBML\\EBMLMaxIDLength", 0x42F2, "uinteger", ">=4"),
    ("EBMLMaxSizeLength", "\\EBML\\EBMLMaxSizeLength", 0x42F3, "uinteger", "not 0"),
    ("DocType", "\\EBML\\DocType", 0x4282, "string", ""),
    ("DocTypeVersion", "\\EBML\\DocTypeVersion", 0x4287, "uinteger", "not 0"),
    ("DocTypeReadVersion", "\\EBML\\DocTypeReadVersion", 0x4285, "uinteger", "not 0"),
    ("CRC-32", "\\(1-\\)CRC-32", 0xBF, "binary", ""),
    ("Void", "\\(-\\)Void", 0xEC, "binary", ""),
];

/// The element table containing only the built-in definitions.
pub fn builtin_table() -> Result<ElementTable> {
    let mut table = ElementTable::new();
    for (name, path, id, kind, range) in BUILTIN_ELEMENTS {
        let draft = Draft {
            name: name.to_string(),
            path: path.to_string(),
            id: format!("{id:X}"),
            kind: kind.to_string(),
            range: range.to_string(),
        };
        normalize(draft, &mut table)?;
    }
    Ok(table)
}

/// Parse an EBML schema document into a normalized element table, seeded
/// with the built-in header and global elements.
pub fn ingest_schema(xml: &str) -> Result<ElementTable> {
    let mut table = builtin_table()?;

    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut draft: Option<Draft> = None;
    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.name().as_ref() == b"element" => {
                let mut d = Draft::default();
                collect_attributes(&e, &mut d);
                normalize(d, &mut table)?;
            }
            Event::Start(e) if e.name().as_ref() == b"element" => {
                let mut d = Draft::default();
                collect_attributes(&e, &mut d);
                draft = Some(d);
            }
            Event::End(e) if e.name().as_ref() == b"element" => {
                if let Some(d) = draft.take() {
                    normalize(d, &mut table)?;
                }
            }
            Event::Eof => break,
            // Other elements (EBMLSchema wrapper, documentation, ...) and
            // text content carry nothing the table needs.
            _ => {}
        }
    }
    Ok(table)
}

/// Raw `<element>` attribute text, accumulated before normalization. The
/// tokenizer may deliver attribute data in chunks, hence append semantics.
#[derive(Debug, Default)]
struct Draft {
    name: String,
    path: String,
    id: String,
    kind: String,
    range: String,
}

fn collect_attributes(e: &quick_xml::events::BytesStart<'_>, draft: &mut Draft) {
    for a in e.attributes().flatten() {
        let value = a
            .unescape_value()
            .ok()
            .map(|v| v.to_string())
            .unwrap_or_default();
        match a.key.as_ref() {
            b"name" => draft.name.push_str(&value),
            b"path" => draft.path.push_str(&value),
            b"id" => draft.id.push_str(&value),
            b"type" => draft.kind.push_str(&value),
            b"range" => draft.range.push_str(&value),
            _ => {}
        }
    }
}

fn normalize(draft: Draft, table: &mut ElementTable) -> Result<()> {
    let id_text = draft.id.trim();
    let digits = id_text
        .strip_prefix("0x")
        .or_else(|| id_text.strip_prefix("0X"))
        .unwrap_or(id_text);
    let id = u64::from_str_radix(digits, 16).map_err(|_| SchemaError::BadId {
        name: draft.name.clone(),
        text: draft.id.clone(),
    })?;

    let kind = ElementKind::from_spelling(draft.kind.trim()).ok_or_else(|| {
        SchemaError::UnknownType {
            name: draft.name.clone(),
            text: draft.kind.clone(),
        }
    })?;

    let path = parse_path(draft.path.trim())?;

    let range = parse_range(&draft.range);
    if range == Range::None && !draft.range.trim().is_empty() {
        log::debug!(
            "element '{}': unrecognized range '{}', treating as unconstrained",
            draft.name,
            draft.range
        );
    }

    table.insert(ElementDefinition {
        name: draft.name,
        path,
        id,
        kind,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::RangeScalar;

    #[test]
    fn test_builtin_table() {
        let table = builtin_table().unwrap();
        assert_eq!(table.len(), 10);

        let ebml = table.get(0x1A45DFA3).unwrap();
        assert_eq!(ebml.name, "EBML");
        assert_eq!(ebml.kind, ElementKind::Master);
        assert_eq!(ebml.path.depth(), 1);

        let doc_type = table.get(0x4282).unwrap();
        assert_eq!(doc_type.kind, ElementKind::String);

        let version = table.get(0x4286).unwrap();
        assert_eq!(
            version.range,
            Range::Excluded(RangeScalar::Unsigned(0))
        );

        let crc = table.get(0xBF).unwrap();
        assert!(crc.path.segments()[0].is_global());
    }

    #[test]
    fn test_ingest_appends_user_elements_in_order() {
        let xml = r#"<EBMLSchema docType="files">
            <element name="Files" path="\Files" id="0x1946696C" type="master"/>
            <element name="FileName" path="\Files\FileName" id="0x614E" type="utf-8">
              <documentation>The file name.</documentation>
            </element>
            <element name="MimeType" path="\Files\MimeType" id="0x464D" type="string" range=""/>
        </EBMLSchema>"#;
        let table = ingest_schema(xml).unwrap();

        assert_eq!(table.len(), 13);
        let names: Vec<&str> = table.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(&names[10..], &["Files", "FileName", "MimeType"]);
        assert_eq!(table.get(0x614E).unwrap().kind, ElementKind::Utf8);
    }

    #[test]
    fn test_ingest_redefinition_replaces_in_place() {
        let xml = r#"<EBMLSchema>
            <element name="MyDocType" path="\EBML\DocType" id="0x4282" type="string"/>
        </EBMLSchema>"#;
        let table = ingest_schema(xml).unwrap();

        assert_eq!(table.len(), 10);
        let names: Vec<&str> = table.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names[5], "MyDocType");
    }

    #[test]
    fn test_ingest_range_attribute() {
        let xml = r#"<EBMLSchema>
            <element name="Track" path="\Track" id="0xD7" type="uinteger" range="1-8"/>
        </EBMLSchema>"#;
        let table = ingest_schema(xml).unwrap();
        assert_eq!(
            table.get(0xD7).unwrap().range,
            Range::Between {
                lo: RangeScalar::Unsigned(1),
                lo_inclusive: true,
                hi: RangeScalar::Unsigned(8),
                hi_inclusive: true,
            }
        );
    }

    #[test]
    fn test_ingest_unknown_range_is_none() {
        let xml = r#"<EBMLSchema>
            <element name="X" path="\X" id="0x80" type="uinteger" range="whenever"/>
        </EBMLSchema>"#;
        let table = ingest_schema(xml).unwrap();
        assert_eq!(table.get(0x80).unwrap().range, Range::None);
    }

    #[test]
    fn test_ingest_bad_id_is_fatal() {
        let xml = r#"<e><element name="X" path="\X" id="zz" type="master"/></e>"#;
        let err = ingest_schema(xml).unwrap_err();
        assert!(matches!(err, SchemaError::BadId { .. }));
    }

    #[test]
    fn test_ingest_unknown_type_is_fatal() {
        let xml = r#"<e><element name="X" path="\X" id="0x80" type="vint"/></e>"#;
        let err = ingest_schema(xml).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
    }

    #[test]
    fn test_ingest_bad_path_is_fatal() {
        let xml = r#"<e><element name="X" path="X" id="0x80" type="master"/></e>"#;
        let err = ingest_schema(xml).unwrap_err();
        assert!(matches!(err, SchemaError::PathSyntax { .. }));
    }
}
