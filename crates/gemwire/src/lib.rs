//! gemwire: consume Ruby-serialized data without embedding Ruby.
//!
//! The crate decodes Marshal 4.8 documents (`.gemspec` dumps, gem indexes)
//! into host-native values through a caller-supplied class factory, encodes
//! value graphs back into the wire format, and evaluates the Gemfile DSL
//! subset under an environment.
//!
//! # Example
//!
//! ```
//! use gemwire::{decode, record::RecordFactory, HostValue, Options};
//!
//! // 04 08 69 0A is Marshal for the integer 5
//! let bytes: &[u8] = &[0x04, 0x08, 0x69, 0x0a];
//! let value = decode(bytes, &RecordFactory, &Options::default()).unwrap();
//! assert_eq!(value, HostValue::Int(5));
//! ```

pub mod record;

use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

pub use gemwire_core::{
    ClassFactory, DecodeError, EncodeError, HostObject, HostRef, HostValue, ProjectError,
    RubyArena, RubyValue, ValueId,
};
pub use gemwire_gemfile::{Environment, Gem, GemValue, Gemfile, GemfileError, Gemspec};
pub use gemwire_marshal::{lift_value, project, Decoder, Encoder, StringDedup};

/// Any error the crate can produce, for callers that mix the entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Gemfile(#[from] GemfileError),
}

/// Knobs shared by the decode and encode entry points.
#[derive(Clone, Debug)]
pub struct Options {
    /// Silence the decode/encode tracer.
    pub quiet: bool,
    /// Maximum value nesting before decoding fails.
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            quiet: false,
            max_depth: 256,
        }
    }
}

/// A decoded document: the arena owning every value plus the root.
///
/// Projection through [`Document::project`] is lazy and cached per value;
/// [`decode`] is the eager equivalent.
pub struct Document {
    arena: RubyArena,
    root: ValueId,
}

impl Document {
    pub fn root(&self) -> ValueId {
        self.root
    }

    pub fn arena(&self) -> &RubyArena {
        &self.arena
    }

    /// Project the root into a host value via `factory`.
    pub fn project(&self, factory: &dyn ClassFactory) -> Result<HostValue, ProjectError> {
        project(&self.arena, self.root, factory)
    }

    /// Re-encode this document byte-for-byte.
    pub fn encode<W: Write>(&self, sink: W, options: &Options) -> Result<(), EncodeError> {
        let mut encoder = Encoder::new(sink, options.quiet);
        encoder.encode(&self.arena, self.root)
    }

    /// Bounded textual form of the root, for diagnostics.
    pub fn repr(&self) -> String {
        self.arena.repr(self.root)
    }
}

/// Decode one serialized document without projecting it.
pub fn decode_document<R: Read>(source: R, options: &Options) -> Result<Document, Error> {
    let mut arena = RubyArena::new();
    let mut decoder = Decoder::new(source, options.quiet, options.max_depth);
    let root = decoder.decode(&mut arena)?;
    Ok(Document { arena, root })
}

/// Decode one serialized document and return its host projection.
pub fn decode<R: Read>(
    source: R,
    factory: &dyn ClassFactory,
    options: &Options,
) -> Result<HostValue, Error> {
    let document = decode_document(source, options)?;
    Ok(document.project(factory)?)
}

/// Encode a host value graph into the wire format.
///
/// The inverse class lookup happens through the [`HostObject`] contracts
/// (`class_name`, `dump`, `marshal_dump`, `attrs`) of the objects in the
/// graph.
pub fn encode<W: Write>(value: &HostValue, sink: W, options: &Options) -> Result<(), Error> {
    let mut arena = RubyArena::new();
    let root = lift_value(&mut arena, value);
    let mut encoder = Encoder::new(sink, options.quiet);
    encoder.encode(&arena, root)?;
    Ok(())
}

/// Parse a Gemfile under an environment.
pub fn gemfile_parse(
    path: impl AsRef<Path>,
    env: &Environment,
    options: &Options,
) -> Result<Gemfile, Error> {
    Ok(gemwire_gemfile::parse_with(path, env, options.quiet)?)
}
