//! The streaming decoder runtime. These sources double as the fixed text of
//! the emitted module: the emitter splices `vint.rs` and `machine.rs`
//! verbatim after the lookup tables it generates, and `tables.rs` is its
//! committed output for the built-in schema (kept in lockstep by an emitter
//! test). Everything here depends only on `std`.

include!("vint.rs");
include!("machine.rs");
include!("tables.rs");
