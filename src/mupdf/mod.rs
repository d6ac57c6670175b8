//! Low-level MuPDF wrapper
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. Every call here opens a fresh
//! document from the caller's bytes and drops it before returning, so no
//! MuPDF handle outlives the blocking task that created it.

mod render;

pub use render::rasterize;
