//! The value arena and its reference tables.
//!
//! A decoding or encoding context owns exactly one arena. Every value lives
//! in a slot; slots are never removed, and the symbol/object tables are
//! append-only for the lifetime of the context. Back-references on the wire
//! (`;` and `@`) resolve through those tables.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::DecodeError;
use crate::host::HostValue;
use crate::repr;
use crate::value::{RegisterKind, RubyValue};

/// Index of a value slot inside a [`RubyArena`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ValueId(u32);

impl ValueId {
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

struct Slot {
    value: RubyValue,
    projection: RefCell<Option<HostValue>>,
}

/// Owns all values of one decoding/encoding context.
#[derive(Default)]
pub struct RubyArena {
    slots: Vec<Slot>,
    symbols: Vec<ValueId>,
    objects: Vec<ValueId>,
    ephemerals: Vec<ValueId>,
    symbol_index: HashMap<Vec<u8>, ValueId>,
}

impl RubyArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value, appending it to the table its kind belongs to.
    pub fn insert(&mut self, value: RubyValue) -> ValueId {
        let id = ValueId(self.slots.len() as u32);
        match value.register_kind() {
            RegisterKind::Ephemeral => self.ephemerals.push(id),
            RegisterKind::Symbol => {
                self.symbols.push(id);
                if let RubyValue::Symbol(bytes) = &value {
                    self.symbol_index.entry(bytes.clone()).or_insert(id);
                }
            }
            RegisterKind::Object => self.objects.push(id),
        }
        self.slots.push(Slot {
            value,
            projection: RefCell::new(None),
        });
        id
    }

    /// Define a fresh symbol, unconditionally taking the next symbol index.
    ///
    /// The decoder must use this for tag `:` so that reference indices track
    /// emission order even if a document redefines the same byte string.
    pub fn define_symbol(&mut self, bytes: Vec<u8>) -> ValueId {
        self.insert(RubyValue::Symbol(bytes))
    }

    /// Look up a symbol by content, defining it only when missing.
    pub fn intern_symbol(&mut self, bytes: &[u8]) -> ValueId {
        if let Some(&id) = self.symbol_index.get(bytes) {
            return id;
        }
        self.define_symbol(bytes.to_vec())
    }

    pub fn value(&self, id: ValueId) -> &RubyValue {
        &self.slots[id.index()].value
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut RubyValue {
        &mut self.slots[id.index()].value
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Resolve a symbol-table index from a `;` reference.
    pub fn get_symbol(&self, index: i64) -> Option<ValueId> {
        let ix = usize::try_from(index).ok()?;
        self.symbols.get(ix).copied()
    }

    /// Resolve an object-table index from a `@` reference.
    pub fn get_object(&self, index: i64) -> Option<ValueId> {
        let ix = usize::try_from(index).ok()?;
        self.objects.get(ix).copied()
    }

    pub fn symbol_bytes(&self, id: ValueId) -> Option<&[u8]> {
        self.value(id).as_symbol()
    }

    pub fn string_bytes(&self, id: ValueId) -> Option<&[u8]> {
        self.value(id).as_string()
    }

    /// Class name of an object-like value, rendered lossily for messages.
    pub fn class_name(&self, id: ValueId) -> Option<String> {
        let class_id = match self.value(id) {
            RubyValue::Object { class_name, .. }
            | RubyValue::UserDefined { class_name, .. }
            | RubyValue::UserMarshal { class_name, .. } => *class_name,
            _ => return None,
        };
        self.symbol_bytes(class_id)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Append an element to an array value.
    pub fn push_element(&mut self, array: ValueId, item: ValueId) {
        if let RubyValue::Array(items) = self.value_mut(array) {
            items.push(item);
        }
    }

    /// Insert a key-value pair into a hash value.
    ///
    /// A pair whose key is structurally equal to an existing scalar key
    /// updates that pair in place, so the later value wins while order
    /// follows the first occurrence.
    pub fn hash_insert(&mut self, hash: ValueId, key: ValueId, value: ValueId) {
        let pos = match self.value(hash) {
            RubyValue::Hash(pairs) => pairs
                .iter()
                .position(|&(k, _)| self.values_eq(k, key)),
            _ => return,
        };
        if let RubyValue::Hash(pairs) = self.value_mut(hash) {
            match pos {
                Some(p) => pairs[p].1 = value,
                None => pairs.push((key, value)),
            }
        }
    }

    /// Structural equality for scalar values; aggregates compare by identity.
    pub fn values_eq(&self, a: ValueId, b: ValueId) -> bool {
        if a == b {
            return true;
        }
        match (self.value(a), self.value(b)) {
            (RubyValue::True, RubyValue::True)
            | (RubyValue::False, RubyValue::False)
            | (RubyValue::Nil, RubyValue::Nil) => true,
            (RubyValue::Int(x), RubyValue::Int(y)) => x == y,
            (RubyValue::Symbol(x), RubyValue::Symbol(y)) => x == y,
            (RubyValue::String { bytes: x, .. }, RubyValue::String { bytes: y, .. }) => x == y,
            _ => false,
        }
    }

    /// Apply an instance variable to a value.
    ///
    /// Strings accept `E` (boolean, the UTF-8 marker) and `encoding`; the
    /// object-like kinds accept any symbol key, replacing an existing entry
    /// with the same key. Applying the same key twice keeps the later value.
    pub fn set_ivar(
        &mut self,
        target: ValueId,
        key: ValueId,
        value: ValueId,
    ) -> Result<(), DecodeError> {
        let key_name = self.symbol_bytes(key).map(<[u8]>::to_vec);
        let kind = self.value(target).kind_name();

        match self.value(target) {
            RubyValue::String { .. } => {
                let name = key_name.ok_or(DecodeError::UnsupportedIvar {
                    kind,
                    key: "<non-symbol>".to_string(),
                })?;
                if name == b"E" {
                    let flag = match self.value(value) {
                        RubyValue::True => true,
                        RubyValue::False => false,
                        _ => {
                            return Err(DecodeError::EncodingUnsupported {
                                name: "E".to_string(),
                            })
                        }
                    };
                    if let RubyValue::String { utf8, .. } = self.value_mut(target) {
                        *utf8 = Some(flag);
                    }
                    Ok(())
                } else if name == b"encoding" {
                    let enc = self
                        .string_bytes(value)
                        .or_else(|| self.symbol_bytes(value))
                        .map(<[u8]>::to_vec)
                        .ok_or(DecodeError::EncodingUnsupported {
                            name: "encoding".to_string(),
                        })?;
                    if let RubyValue::String { encoding, .. } = self.value_mut(target) {
                        *encoding = Some(enc);
                    }
                    Ok(())
                } else {
                    Err(DecodeError::UnsupportedIvar {
                        kind,
                        key: String::from_utf8_lossy(&name).into_owned(),
                    })
                }
            }
            RubyValue::Object { .. }
            | RubyValue::UserDefined { .. }
            | RubyValue::UserMarshal { .. } => {
                let pos = self.value(target).ivars().and_then(|ivars| {
                    ivars.iter().position(|&(k, _)| {
                        k == key
                            || (key_name.is_some()
                                && self.symbol_bytes(k) == key_name.as_deref())
                    })
                });
                if let Some(ivars) = self.value_mut(target).ivars_mut() {
                    match pos {
                        Some(p) => ivars[p].1 = value,
                        None => ivars.push((key, value)),
                    }
                }
                Ok(())
            }
            _ => Err(DecodeError::UnsupportedIvar {
                kind,
                key: key_name
                    .map(|n| String::from_utf8_lossy(&n).into_owned())
                    .unwrap_or_else(|| "<non-symbol>".to_string()),
            }),
        }
    }

    /// Cached host projection for a value, if one exists.
    pub fn cached_projection(&self, id: ValueId) -> Option<HostValue> {
        self.slots[id.index()].projection.borrow().clone()
    }

    /// Remember the host projection of a value.
    pub fn cache_projection(&self, id: ValueId, projection: HostValue) {
        *self.slots[id.index()].projection.borrow_mut() = Some(projection);
    }

    /// Bounded textual form of a value, for diagnostics.
    pub fn repr(&self, id: ValueId) -> String {
        let mut buf = repr::ReprBuf::begin(256);
        repr::describe(self, id, &mut buf);
        buf.finish()
    }
}
