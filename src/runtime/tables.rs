// Generated by ebmlgen from the built-in EBML schema. Do not edit by hand.

/// Spellings of the EBML element types, indexed by `ElementKind`.
pub const TYPE_NAMES: [&str; 8] = [
    "master", "uinteger", "integer", "utf-8", "string", "date", "binary", "float",
];

/// Element name for a known class ID.
pub fn element_name(id: u64) -> Option<&'static str> {
    match id {
        0x1A45DFA3 => Some("EBML"),
        0x4286 => Some("EBMLVersion"),
        0x42F7 => Some("EBMLReadVersion"),
        0x42F2 => Some("EBMLMaxIDLength"),
        0x42F3 => Some("EBMLMaxSizeLength"),
        0x4282 => Some("DocType"),
        0x4287 => Some("DocTypeVersion"),
        0x4285 => Some("DocTypeReadVersion"),
        0xBF => Some("CRC-32"),
        0xEC => Some("Void"),
        _ => None,
    }
}

/// Element type for a known class ID.
pub fn element_kind(id: u64) -> Option<ElementKind> {
    match id {
        0x1A45DFA3 => Some(ElementKind::Master),
        0x4286 => Some(ElementKind::UnsignedInteger),
        0x42F7 => Some(ElementKind::UnsignedInteger),
        0x42F2 => Some(ElementKind::UnsignedInteger),
        0x42F3 => Some(ElementKind::UnsignedInteger),
        0x4282 => Some(ElementKind::String),
        0x4287 => Some(ElementKind::UnsignedInteger),
        0x4285 => Some(ElementKind::UnsignedInteger),
        0xBF => Some(ElementKind::Binary),
        0xEC => Some(ElementKind::Binary),
        _ => None,
    }
}
