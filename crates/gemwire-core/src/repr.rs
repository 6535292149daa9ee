//! Bounded textual forms for diagnostics.
//!
//! A [`ReprBuf`] is a scratch buffer with a hard size limit. Appends report
//! whether they fit; a caller that wants a suffix to survive truncation
//! (such as a closing bracket) reserves tail space up front.

use std::fmt;

use crate::arena::{RubyArena, ValueId};
use crate::value::RubyValue;

/// How many payload bytes a user-defined repr shows before eliding.
const MAX_PAYLOAD_BYTES: usize = 32;

/// A bounded scratch buffer for building reprs.
pub struct ReprBuf {
    data: String,
    size: usize,
    reserved: usize,
}

impl ReprBuf {
    /// Start a buffer holding at most `size` bytes.
    pub fn begin(size: usize) -> Self {
        Self {
            data: String::new(),
            size,
            reserved: 0,
        }
    }

    fn space(&self) -> usize {
        self.size.saturating_sub(self.data.len() + self.reserved)
    }

    /// Hold back `tail` bytes for a suffix.
    pub fn reserve_tail(&mut self, tail: usize) {
        self.reserved += tail;
    }

    pub fn unreserve(&mut self) {
        self.reserved = 0;
    }

    /// Append text; returns false (appending nothing) when it does not fit.
    pub fn push(&mut self, s: &str) -> bool {
        if s.len() > self.space() {
            return false;
        }
        self.data.push_str(s);
        true
    }

    pub fn push_fmt(&mut self, args: fmt::Arguments<'_>) -> bool {
        self.push(&args.to_string())
    }

    pub fn finish(self) -> String {
        self.data
    }
}

/// Append a bounded description of `id` to `out`.
///
/// Returns false when output was truncated; the buffer then already carries
/// a `...` marker where the elision happened.
pub fn describe(arena: &RubyArena, id: ValueId, out: &mut ReprBuf) -> bool {
    match arena.value(id) {
        RubyValue::True => out.push("true"),
        RubyValue::False => out.push("false"),
        RubyValue::Nil => out.push("nil"),
        RubyValue::Int(v) => out.push_fmt(format_args!("{}", v)),
        RubyValue::Symbol(bytes) => {
            out.push_fmt(format_args!(":{}", String::from_utf8_lossy(bytes)))
        }
        RubyValue::String { bytes, .. } => {
            out.push_fmt(format_args!("\"{}\"", String::from_utf8_lossy(bytes)))
        }
        RubyValue::Array(items) => describe_seq(arena, items, out),
        RubyValue::Hash(pairs) => describe_pairs(arena, pairs, "{", "}", out),
        RubyValue::Object { ivars, .. } => describe_object(arena, id, None, ivars, out),
        RubyValue::UserDefined { data, ivars, .. } => {
            describe_object(arena, id, Some(data), ivars, out)
        }
        RubyValue::UserMarshal { data, ivars, .. } => {
            let class = arena.class_name(id).unwrap_or_default();
            let mut ok = out.push_fmt(format_args!("{}(", class));
            if ok {
                if let Some(inner) = data {
                    ok = describe(arena, *inner, out);
                }
            }
            ok = ok && out.push(")");
            if ok && !ivars.is_empty() {
                ok = out.push("; ") && describe_pairs(arena, ivars, "{", "}", out);
            }
            ok
        }
    }
}

fn describe_seq(arena: &RubyArena, items: &[ValueId], out: &mut ReprBuf) -> bool {
    if items.is_empty() {
        return out.push("[]");
    }
    out.reserve_tail(", ...]".len());
    out.push("[");
    let mut shown = 0;
    for (i, item) in items.iter().enumerate() {
        if i != 0 && !out.push(", ") {
            break;
        }
        if !describe(arena, *item, out) {
            break;
        }
        shown += 1;
    }
    out.unreserve();
    let complete = shown == items.len();
    if !complete {
        out.push("...");
    }
    out.push("]");
    complete
}

fn describe_pairs(
    arena: &RubyArena,
    pairs: &[(ValueId, ValueId)],
    open: &str,
    close: &str,
    out: &mut ReprBuf,
) -> bool {
    out.reserve_tail(", ...".len() + close.len());
    out.push(open);
    let mut shown = 0;
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i != 0 && !out.push(", ") {
            break;
        }
        if !describe(arena, *key, out) || !out.push("=") || !describe(arena, *value, out) {
            break;
        }
        shown += 1;
    }
    out.unreserve();
    let complete = shown == pairs.len();
    if !complete {
        out.push("...");
    }
    out.push(close);
    complete
}

fn describe_object(
    arena: &RubyArena,
    id: ValueId,
    payload: Option<&[u8]>,
    ivars: &[(ValueId, ValueId)],
    out: &mut ReprBuf,
) -> bool {
    let class = arena.class_name(id).unwrap_or_default();
    let mut ok = out.push_fmt(format_args!("{}(", class));
    if ok {
        if let Some(bytes) = payload {
            ok = describe_payload(bytes, out);
        }
    }
    ok = ok && out.push(")");
    if ok && !ivars.is_empty() {
        ok = out.push("; ") && describe_pairs(arena, ivars, "{", "}", out);
    }
    ok
}

fn describe_payload(bytes: &[u8], out: &mut ReprBuf) -> bool {
    if !out.push("<") {
        return false;
    }
    let mut shown = 0;
    for (i, b) in bytes.iter().take(MAX_PAYLOAD_BYTES).enumerate() {
        if i != 0 && !out.push(" ") {
            break;
        }
        if !out.push_fmt(format_args!("{:02x}", b)) {
            break;
        }
        shown += 1;
    }
    if shown < bytes.len() {
        out.push("...");
    }
    out.push(">");
    shown == bytes.len()
}
