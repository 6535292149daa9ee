//! Error types for decoding, encoding and host projection.

use thiserror::Error;

/// Errors raised while decoding a Marshal 4.8 document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("data does not start with the Marshal 4.8 signature")]
    BadSignature,

    #[error("byte source ended mid-value at offset {offset}")]
    Truncated { offset: u64 },

    #[error("unsupported marshal tag 0x{byte:02x} at offset {offset}")]
    UnsupportedTag { byte: u8, offset: u64 },

    #[error("{table} reference {index} out of range (table has {len} entries)")]
    BadRef {
        table: &'static str,
        index: i64,
        len: usize,
    },

    #[error("fixnum value does not fit any accepted width")]
    OverLongInt,

    #[error("negative length {value} at offset {offset}")]
    BadLength { value: i64, offset: u64 },

    #[error("class name must be a symbol, got {kind}")]
    BadClassName { kind: &'static str },

    #[error("string encoding ivar '{name}' carries an unsupported value")]
    EncodingUnsupported { name: String },

    #[error("instance variable '{key}' not applicable to {kind}")]
    UnsupportedIvar { kind: &'static str, key: String },

    #[error("value nesting exceeds the configured depth limit {limit}")]
    DepthExceeded { limit: u32 },

    #[error("read error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while encoding a document back into wire form.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("integer {value} exceeds the fixnum wire format")]
    OverLongInt { value: i64 },

    #[error("user-marshal value has no payload")]
    MissingPayload,

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while projecting decoded values into host objects.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("factory does not recognise class {class}")]
    UnknownClass { class: String },

    #[error("projection of {class} failed: {message}")]
    Failed { class: String, message: String },

    #[error("string is not valid UTF-8 despite its E flag")]
    InvalidUtf8,

    #[error("instance-variable key is not a symbol")]
    BadIvarKey,
}

impl ProjectError {
    /// Shorthand for a per-class failure message.
    pub fn failed(class: impl Into<String>, message: impl Into<String>) -> Self {
        ProjectError::Failed {
            class: class.into(),
            message: message.into(),
        }
    }
}
