//! Core types for the gemwire Ruby-marshal toolkit.
//!
//! This crate provides the foundational pieces shared by the wire codec and
//! the host-facing layers:
//! - The tagged Ruby value model and its arena
//! - Symbol and object reference tables
//! - Host projection traits (`HostValue`, `HostObject`, `ClassFactory`)
//! - Error types
//! - Bounded repr buffers and the indented decode tracer

pub mod arena;
pub mod error;
pub mod host;
pub mod repr;
pub mod trace;
pub mod value;

// Re-export commonly used types at crate root
pub use arena::{RubyArena, ValueId};
pub use error::{DecodeError, EncodeError, ProjectError};
pub use host::{ClassFactory, HostObject, HostRef, HostValue};
pub use repr::ReprBuf;
pub use trace::Tracer;
pub use value::{RegisterKind, RubyValue};
