use crate::error::{Result, SchemaError};

/// Upper bound on the number of element definitions a schema may declare.
pub const MAX_ELEMENTS: usize = 512;

/// Upper bound on the number of segments in an element path.
pub const MAX_PATH_DEPTH: usize = 8;

/// The eight EBML element types. The declaration order fixes the numeric
/// indices the emitted decoder reports (master = 0 .. float = 7) and the
/// layout of its type-name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Master,
    UnsignedInteger,
    SignedInteger,
    Utf8,
    String,
    Date,
    Binary,
    Float,
}

impl ElementKind {
    /// Schema attribute spellings, in index order.
    pub const SPELLINGS: [&'static str; 8] = [
        "master", "uinteger", "integer", "utf-8", "string", "date", "binary", "float",
    ];

    pub fn from_spelling(spelling: &str) -> Option<Self> {
        let all = [
            Self::Master,
            Self::UnsignedInteger,
            Self::SignedInteger,
            Self::Utf8,
            Self::String,
            Self::Date,
            Self::Binary,
            Self::Float,
        ];
        Self::SPELLINGS
            .iter()
            .position(|s| *s == spelling)
            .map(|i| all[i])
    }

    pub fn spelling(self) -> &'static str {
        Self::SPELLINGS[self as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One step of an element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `Name` or `+Name`; `recursive` means the element may nest within
    /// itself at this position.
    Named { name: String, recursive: bool },
    /// `(min-max\)`: the element may occur at any depth within the given
    /// bounds. An omitted minimum is 0, an omitted maximum is `u64::MAX`.
    Global { min: u64, max: u64 },
}

impl PathSegment {
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global { .. })
    }
}

/// A parsed element path. `\` alone is the root and has depth 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementPath {
    segments: Vec<PathSegment>,
}

impl ElementPath {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self> {
        if segments.len() > MAX_PATH_DEPTH {
            return Err(SchemaError::PathTooDeep {
                text: format!("{segments:?}"),
            });
        }
        Ok(Self { segments })
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// True when `self` could be the parent of `child`: `self` is a prefix
    /// of `child` one segment short, with all named segments matching
    /// pairwise (globals act as wildcards).
    pub fn is_parent_of(&self, child: &Self) -> bool {
        if self.depth() + 1 != child.depth() {
            return false;
        }
        self.segments
            .iter()
            .zip(child.segments.iter())
            .all(|(a, b)| match (a, b) {
                (
                    PathSegment::Named { name: a, .. },
                    PathSegment::Named { name: b, .. },
                ) => a == b,
                _ => true,
            })
    }
}

/// A numeric scalar inside a range constraint. The kind is decided per
/// token while parsing (see `schema::range`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeScalar {
    Unsigned(u64),
    Float(f64),
}

/// A parsed `range` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Range {
    /// No constraint (also the best-effort result for unrecognized text).
    #[default]
    None,
    /// Value must equal the scalar.
    Exact(RangeScalar),
    /// Value must not equal the scalar.
    Excluded(RangeScalar),
    Lower {
        bound: RangeScalar,
        inclusive: bool,
    },
    Upper {
        bound: RangeScalar,
        inclusive: bool,
    },
    Between {
        lo: RangeScalar,
        lo_inclusive: bool,
        hi: RangeScalar,
        hi_inclusive: bool,
    },
}

/// One normalized `<element>` definition. Immutable after ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefinition {
    pub name: String,
    pub path: ElementPath,
    pub id: u64,
    pub kind: ElementKind,
    pub range: Range,
}

/// The element table: id -> definition, insertion order preserved.
/// Inserting an id that is already present replaces the old definition in
/// place, which is how user schemas override the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    entries: Vec<ElementDefinition>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: ElementDefinition) -> Result<()> {
        if let Some(slot) = self.entries.iter_mut().find(|e| e.id == def.id) {
            *slot = def;
            return Ok(());
        }
        if self.entries.len() == MAX_ELEMENTS {
            return Err(SchemaError::TableFull);
        }
        self.entries.push(def);
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&ElementDefinition> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
