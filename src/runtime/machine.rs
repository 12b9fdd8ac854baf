// The streaming EBML decoder: an incremental state machine fed one byte at
// a time. Every decision is a comparison of the current byte offset against
// the open frames' id/size/body offsets, which keeps the machine flat and
// resumable after every byte. Elements are dispatched by class ID through
// `element_name`/`element_kind`, the schema-dependent part of the module.

use core::fmt;

/// Deepest element nesting the decoder accepts.
pub const MAX_STACK_SIZE: usize = 16;

/// Capacity of the string value buffer. A string body longer than this is
/// an error rather than a silent truncation.
pub const STRING_BUFFER_SIZE: usize = 1024;

const EVENT_QUEUE_SIZE: usize = 2 * MAX_STACK_SIZE;

/// The unit the decoder is fed in.
pub type Byte = u8;

/// Result of feeding one byte (or one `eof` call).
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Error = -1,
    Ok = 0,
    ElemStart = 1,
    ElemEnd = 2,
}

/// The eight EBML element types, in the table index order the type-name
/// table uses.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Master = 0,
    UnsignedInteger = 1,
    SignedInteger = 2,
    Utf8 = 3,
    String = 4,
    Date = 5,
    Binary = 6,
    Float = 7,
}

impl ElementKind {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn type_name(self) -> &'static str {
        TYPE_NAMES[self as usize]
    }
}

/// One open element: where its ID, size and body fields begin, plus the
/// accumulated ID bits (marker included) and body size (marker stripped).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub id_offset: u64,
    pub size_offset: u64,
    pub body_offset: u64,
    pub id: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Start,
    End,
}

// A queued boundary crossing. One byte can close several frames at once
// (nested elements ending on the same offset), but each call reports one
// event, so surplus events wait here with their observables snapshotted.
#[derive(Debug, Clone, Copy)]
struct Event {
    kind: EventKind,
    depth: usize,
    name: &'static str,
    elem_kind: ElementKind,
    id: u64,
    size: u64,
    value: u64,
    float_value: f64,
}

const EMPTY_EVENT: Event = Event {
    kind: EventKind::Start,
    depth: 0,
    name: "",
    elem_kind: ElementKind::Master,
    id: 0,
    size: 0,
    value: 0,
    float_value: 0.0,
};

/// The decoder. All state is inline and fixed-size; `parse` allocates
/// nothing and performs no I/O.
pub struct Parser {
    /// Offset of the most recently consumed byte; `None` before the first.
    offset: Option<u64>,
    /// Current nesting depth; 0 until the first element's ID byte arrives.
    pub depth: usize,
    /// One slot per open ancestor plus the element currently being read.
    pub frames: [Frame; MAX_STACK_SIZE],

    // Observables describing the element of the event just returned.
    pub this_depth: usize,
    pub name: &'static str,
    pub kind: ElementKind,
    pub this_id: u64,
    pub this_size: u64,
    pub value: u64,
    pub float_value: f64,
    pub string_buffer: [u8; STRING_BUFFER_SIZE],
    pub string_len: usize,

    cur_kind: ElementKind,
    acc: u64,
    failed: bool,
    events: [Event; EVENT_QUEUE_SIZE],
    event_head: usize,
    event_len: usize,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            offset: None,
            depth: 0,
            frames: [Frame::default(); MAX_STACK_SIZE],
            this_depth: 0,
            name: "",
            kind: ElementKind::Master,
            this_id: 0,
            this_size: 0,
            value: 0,
            float_value: 0.0,
            string_buffer: [0; STRING_BUFFER_SIZE],
            string_len: 0,
            cur_kind: ElementKind::Master,
            acc: 0,
            failed: false,
            events: [EMPTY_EVENT; EVENT_QUEUE_SIZE],
            event_head: 0,
            event_len: 0,
        }
    }

    /// Return the decoder to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The bytes of the string value of the element just closed.
    pub fn string_bytes(&self) -> &[u8] {
        &self.string_buffer[..self.string_len]
    }

    /// Feed one byte. Returns `ElemStart` when an element's body begins,
    /// `ElemEnd` when an element closes, `Ok` otherwise. After `Error` the
    /// decoder stays failed until `reset`.
    pub fn parse(&mut self, byte: Byte) -> Status {
        if self.failed {
            return Status::Error;
        }
        let offset = self.offset.map_or(0, |o| o + 1);
        self.offset = Some(offset);

        if self.depth == 0 {
            // document level: this byte begins the first top-level element
            if self.push_frame(offset, byte).is_err() {
                return self.fail();
            }
            return self.deliver();
        }

        let frame = self.frames[self.depth];
        let outcome = if offset < frame.size_offset {
            // ID VINT continuation
            self.frames[self.depth].id = (frame.id << 8) | u64::from(byte);
            Ok(())
        } else if offset == frame.size_offset {
            self.begin_size(offset, byte)
        } else if offset < frame.body_offset {
            // size VINT continuation
            self.frames[self.depth].size = (frame.size << 8) | u64::from(byte);
            if offset + 1 == frame.body_offset {
                self.finish_size()
            } else {
                Ok(())
            }
        } else if offset == frame.body_offset + frame.size {
            // the element ends here; this byte already belongs to the next
            // sibling's ID
            self.close_frames(offset)
                .and_then(|()| self.push_frame(offset, byte))
        } else if offset == frame.body_offset {
            self.begin_body(offset, byte)
        } else {
            self.accumulate(byte)
        };

        match outcome {
            Ok(()) => self.deliver(),
            Err(()) => self.fail(),
        }
    }

    /// Call after the last byte, repeatedly, until `Ok` or `Error`. Each
    /// call closes one frame whose declared end coincides with the end of
    /// input; a leftover frame with an explicit size is an error.
    pub fn eof(&mut self) -> Status {
        if self.failed {
            return Status::Error;
        }
        if self.event_len > 0 {
            return self.deliver();
        }
        if self.depth == 0 {
            return Status::Ok;
        }
        let consumed = self.offset.map_or(0, |o| o + 1);
        let frame = self.frames[self.depth];
        if frame.body_offset == 0 || frame.body_offset + frame.size != consumed {
            return self.fail();
        }
        let Some(kind) = element_kind(frame.id) else {
            return self.fail();
        };
        let name = element_name(frame.id).unwrap_or("");
        let (value, float_value) = self.final_value(kind, frame.size);
        let event = Event {
            kind: EventKind::End,
            depth: self.depth,
            name,
            elem_kind: kind,
            id: frame.id,
            size: frame.size,
            value,
            float_value,
        };
        if self.enqueue(event).is_err() {
            return self.fail();
        }
        self.depth -= 1;
        self.deliver()
    }

    /// Dump the decoder state for diagnostics.
    pub fn print(&self) {
        eprintln!("{self:#?}");
    }

    fn fail(&mut self) -> Status {
        self.failed = true;
        Status::Error
    }

    // Begin reading an element whose first ID byte is `byte` at `offset`,
    // one level below the current depth.
    fn push_frame(&mut self, offset: u64, byte: u8) -> Result<(), ()> {
        if self.depth + 1 == MAX_STACK_SIZE {
            return Err(());
        }
        let Some(len) = vint_length(byte) else {
            return Err(());
        };
        self.depth += 1;
        self.frames[self.depth] = Frame {
            id_offset: offset,
            size_offset: offset + len as u64,
            body_offset: 0,
            id: u64::from(byte),
            size: 0,
        };
        Ok(())
    }

    fn begin_size(&mut self, offset: u64, byte: u8) -> Result<(), ()> {
        let Some(len) = vint_length(byte) else {
            return Err(());
        };
        let body_offset = offset + len as u64;
        self.frames[self.depth].body_offset = body_offset;
        self.frames[self.depth].size = u64::from(vint_strip_marker(byte));
        if offset + 1 == body_offset {
            self.finish_size()
        } else {
            Ok(())
        }
    }

    // The size VINT is complete: validate it, and start zero-size leaves
    // here since no body byte will arrive for them.
    fn finish_size(&mut self) -> Result<(), ()> {
        let frame = self.frames[self.depth];
        let kind = element_kind(frame.id);
        if kind == Some(ElementKind::Master) {
            let size_len = (frame.body_offset - frame.size_offset) as usize;
            // unknown-size (all-ones) masters are not supported, and a
            // zero-size master cannot hold a single child
            if frame.size == 0 || vint_is_all_ones(frame.size, size_len) {
                return Err(());
            }
        }
        if self.depth >= 2 {
            let parent = self.frames[self.depth - 1];
            if frame.body_offset + frame.size > parent.body_offset + parent.size {
                return Err(());
            }
        }
        if frame.size == 0 {
            let Some(kind) = kind else {
                return Err(());
            };
            let name = element_name(frame.id).unwrap_or("");
            self.cur_kind = kind;
            self.acc = 0;
            if matches!(kind, ElementKind::String | ElementKind::Utf8) {
                self.string_len = 0;
            }
            self.enqueue(Event {
                kind: EventKind::Start,
                depth: self.depth,
                name,
                elem_kind: kind,
                id: frame.id,
                size: 0,
                value: 0,
                float_value: 0.0,
            })?;
        }
        Ok(())
    }

    // First body byte: look the element up, initialize its accumulator and
    // report ElemStart. Masters instead open a frame for their first child.
    fn begin_body(&mut self, offset: u64, byte: u8) -> Result<(), ()> {
        let frame = self.frames[self.depth];
        let Some(kind) = element_kind(frame.id) else {
            return Err(());
        };
        let name = element_name(frame.id).unwrap_or("");
        if kind == ElementKind::Master {
            self.enqueue(Event {
                kind: EventKind::Start,
                depth: self.depth,
                name,
                elem_kind: kind,
                id: frame.id,
                size: frame.size,
                value: 0,
                float_value: 0.0,
            })?;
            return self.push_frame(offset, byte);
        }
        match kind {
            ElementKind::UnsignedInteger
            | ElementKind::SignedInteger
            | ElementKind::Date
            | ElementKind::Float => self.acc = u64::from(byte),
            ElementKind::String | ElementKind::Utf8 => {
                self.acc = 0;
                self.string_len = 0;
                self.push_string_byte(byte)?;
            }
            ElementKind::Binary => self.acc = 0,
            ElementKind::Master => {}
        }
        self.cur_kind = kind;
        self.enqueue(Event {
            kind: EventKind::Start,
            depth: self.depth,
            name,
            elem_kind: kind,
            id: frame.id,
            size: frame.size,
            value: self.acc,
            float_value: 0.0,
        })
    }

    fn accumulate(&mut self, byte: u8) -> Result<(), ()> {
        match self.cur_kind {
            ElementKind::UnsignedInteger
            | ElementKind::SignedInteger
            | ElementKind::Date
            | ElementKind::Float => {
                self.acc = (self.acc << 8) | u64::from(byte);
                Ok(())
            }
            ElementKind::String | ElementKind::Utf8 => self.push_string_byte(byte),
            ElementKind::Master | ElementKind::Binary => Ok(()),
        }
    }

    fn push_string_byte(&mut self, byte: u8) -> Result<(), ()> {
        if self.string_len == STRING_BUFFER_SIZE {
            return Err(());
        }
        self.string_buffer[self.string_len] = byte;
        self.string_len += 1;
        Ok(())
    }

    // Close the frame ending at `offset`, and every enclosing frame whose
    // declared end falls on the same offset. One ElemEnd is queued per
    // closed frame; outer ones are necessarily masters.
    fn close_frames(&mut self, offset: u64) -> Result<(), ()> {
        let mut innermost = true;
        loop {
            let frame = self.frames[self.depth];
            let Some(kind) = element_kind(frame.id) else {
                return Err(());
            };
            let name = element_name(frame.id).unwrap_or("");
            let (value, float_value) = if innermost {
                self.final_value(kind, frame.size)
            } else {
                (0, 0.0)
            };
            self.enqueue(Event {
                kind: EventKind::End,
                depth: self.depth,
                name,
                elem_kind: kind,
                id: frame.id,
                size: frame.size,
                value,
                float_value,
            })?;
            self.depth -= 1;
            innermost = false;
            if self.depth == 0 {
                break;
            }
            let parent = self.frames[self.depth];
            if offset != parent.body_offset + parent.size {
                break;
            }
        }
        Ok(())
    }

    fn final_value(&self, kind: ElementKind, size: u64) -> (u64, f64) {
        match kind {
            ElementKind::UnsignedInteger => (self.acc, 0.0),
            ElementKind::SignedInteger | ElementKind::Date => (sign_extend(self.acc, size), 0.0),
            ElementKind::Float => (self.acc, assemble_float(self.acc, size)),
            _ => (0, 0.0),
        }
    }

    fn enqueue(&mut self, event: Event) -> Result<(), ()> {
        if self.event_len == EVENT_QUEUE_SIZE {
            return Err(());
        }
        let slot = (self.event_head + self.event_len) % EVENT_QUEUE_SIZE;
        self.events[slot] = event;
        self.event_len += 1;
        Ok(())
    }

    // Report the oldest queued event through the observable fields.
    fn deliver(&mut self) -> Status {
        if self.event_len == 0 {
            return Status::Ok;
        }
        let event = self.events[self.event_head];
        self.event_head = (self.event_head + 1) % EVENT_QUEUE_SIZE;
        self.event_len -= 1;
        self.this_depth = event.depth;
        self.name = event.name;
        self.kind = event.elem_kind;
        self.this_id = event.id;
        self.this_size = event.size;
        self.value = event.value;
        self.float_value = event.float_value;
        match event.kind {
            EventKind::Start => Status::ElemStart,
            EventKind::End => Status::ElemEnd,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("offset", &self.offset)
            .field("depth", &self.depth)
            .field("frames", &&self.frames[..=self.depth])
            .field("this_depth", &self.this_depth)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("float_value", &self.float_value)
            .field(
                "string",
                &core::str::from_utf8(self.string_bytes()).unwrap_or("<non-utf8>"),
            )
            .field("pending_events", &self.event_len)
            .field("failed", &self.failed)
            .finish()
    }
}

// Sign-extend a big-endian two's-complement value of `size` bytes.
fn sign_extend(value: u64, size: u64) -> u64 {
    if size == 0 || size >= 8 {
        return value;
    }
    let shift = 64 - 8 * size as u32;
    (((value << shift) as i64) >> shift) as u64
}

// Reinterpret accumulated big-endian bytes as IEEE-754. Bodies that are
// neither 4 nor 8 bytes are observed without interpretation.
fn assemble_float(bits: u64, size: u64) -> f64 {
    match size {
        4 => f64::from(f32::from_bits(bits as u32)),
        8 => f64::from_bits(bits),
        _ => 0.0,
    }
}
