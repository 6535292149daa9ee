//! Lifting host values back into an arena for encoding.
//!
//! The inverse of projection: structural values map back directly, strings
//! coalesce through the dedup index, and host objects choose their wire kind
//! through the `dump`/`marshal_dump` contracts. Shared host objects lift to
//! a single arena value so the encoder can emit back-references for them.

use std::collections::HashMap;
use std::rc::Rc;

use gemwire_core::{HostRef, HostValue, RubyArena, RubyValue, ValueId};

use crate::dedup::StringDedup;

/// Lift one host value graph into `arena`, returning the root.
pub fn lift_value(arena: &mut RubyArena, value: &HostValue) -> ValueId {
    Lifter::new(arena).lift(value)
}

struct Lifter<'a> {
    arena: &'a mut RubyArena,
    strings: StringDedup,
    // host object identity -> lifted value
    seen: HashMap<*const (), ValueId>,
}

impl<'a> Lifter<'a> {
    fn new(arena: &'a mut RubyArena) -> Self {
        Self {
            arena,
            strings: StringDedup::new(),
            seen: HashMap::new(),
        }
    }

    fn lift(&mut self, value: &HostValue) -> ValueId {
        match value {
            HostValue::Null => self.arena.insert(RubyValue::Nil),
            HostValue::Bool(b) => self.arena.insert(RubyValue::bool(*b)),
            HostValue::Int(v) => self.arena.insert(RubyValue::Int(*v)),
            HostValue::Str(s) => self.lift_str(s),
            HostValue::Array(items) => {
                let lifted: Vec<ValueId> = items.iter().map(|item| self.lift(item)).collect();
                self.arena.insert(RubyValue::Array(lifted))
            }
            HostValue::Map(pairs) => {
                let lifted: Vec<(ValueId, ValueId)> = pairs
                    .iter()
                    .map(|(k, v)| (self.lift(k), self.lift(v)))
                    .collect();
                self.arena.insert(RubyValue::Hash(lifted))
            }
            HostValue::Object(host) => self.lift_object(host),
        }
    }

    fn lift_str(&mut self, s: &str) -> ValueId {
        let bytes = s.as_bytes();
        if let Some(existing) = self.strings.lookup(self.arena, bytes) {
            return existing;
        }
        // empty strings stay bare on the wire; everything else is marked
        // UTF-8 the way Ruby emits it
        let value = if bytes.is_empty() {
            RubyValue::string(bytes)
        } else {
            RubyValue::utf8_string(bytes)
        };
        let id = self.arena.insert(value);
        self.strings.insert(self.arena, id);
        id
    }

    fn lift_object(&mut self, host: &HostRef) -> ValueId {
        let identity = Rc::as_ptr(host) as *const ();
        if let Some(&existing) = self.seen.get(&identity) {
            return existing;
        }

        let (class_bytes, dumped, marshal_payload, attrs) = {
            let obj = host.borrow();
            (
                obj.class_name().as_bytes().to_vec(),
                obj.dump(),
                obj.marshal_dump(),
                obj.attrs(),
            )
        };
        let class_name = self.arena.intern_symbol(&class_bytes);

        let mut pending_payload = None;
        let id = if let Some(data) = dumped {
            self.arena.insert(RubyValue::UserDefined {
                class_name,
                data,
                ivars: Vec::new(),
            })
        } else if let Some(payload) = marshal_payload {
            pending_payload = Some(payload);
            self.arena.insert(RubyValue::UserMarshal {
                class_name,
                data: None,
                ivars: Vec::new(),
            })
        } else {
            self.arena.insert(RubyValue::Object {
                class_name,
                ivars: Vec::new(),
            })
        };

        // register before descending so self-referential objects terminate
        self.seen.insert(identity, id);

        if let Some(payload) = pending_payload {
            let lifted = self.lift(&payload);
            if let RubyValue::UserMarshal { data, .. } = self.arena.value_mut(id) {
                *data = Some(lifted);
            }
        }

        for (name, attr_value) in attrs {
            let key_name = if name.starts_with('@') {
                name
            } else {
                format!("@{}", name)
            };
            let key = self.arena.intern_symbol(key_name.as_bytes());
            let lifted = self.lift(&attr_value);
            if let Some(ivars) = self.arena.value_mut(id).ivars_mut() {
                ivars.push((key, lifted));
            }
        }

        id
    }
}
