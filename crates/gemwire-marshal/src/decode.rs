//! The decoder driver.
//!
//! Reads the signature and then one value, recursing through children.
//! Arrays, hashes and objects are registered before their children so that
//! back-reference indices match emission order; the `I` wrapper registers
//! only the value it wraps.

use std::io::Read;

use gemwire_core::{DecodeError, RubyArena, RubyValue, Tracer, ValueId};

use crate::fixnum::{read_byteseq, read_fixnum};
use crate::io::ByteReader;
use crate::SIGNATURE;

pub struct Decoder<R> {
    reader: ByteReader<R>,
    tracer: Tracer,
    max_depth: u32,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R, quiet: bool, max_depth: u32) -> Self {
        Self {
            reader: ByteReader::new(source),
            tracer: Tracer::new(quiet),
            max_depth,
        }
    }

    /// Decode one document into `arena`, returning the root value.
    pub fn decode(&mut self, arena: &mut RubyArena) -> Result<ValueId, DecodeError> {
        self.check_signature()?;
        self.tracer.line(format_args!("unmarshaling data"));
        self.next_value(arena, false)
    }

    fn check_signature(&mut self) -> Result<(), DecodeError> {
        for expected in SIGNATURE {
            let got = match self.reader.next_byte() {
                Ok(b) => b,
                Err(DecodeError::Truncated { .. }) => return Err(DecodeError::BadSignature),
                Err(e) => return Err(e),
            };
            if got != expected {
                return Err(DecodeError::BadSignature);
            }
        }
        Ok(())
    }

    fn next_value(&mut self, arena: &mut RubyArena, quiet: bool) -> Result<ValueId, DecodeError> {
        if self.tracer.depth() as u32 >= self.max_depth {
            return Err(DecodeError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.tracer.push(quiet);
        let result = self.next_value_inner(arena);
        if let Ok(id) = &result {
            if self.tracer.on() {
                self.tracer.line(format_args!(
                    "returning {}: {}",
                    arena.value(*id).kind_name(),
                    arena.repr(*id)
                ));
            }
        }
        self.tracer.pop();
        result
    }

    fn next_value_inner(&mut self, arena: &mut RubyArena) -> Result<ValueId, DecodeError> {
        let tag = self.reader.next_byte()?;
        match tag {
            b'T' => Ok(arena.insert(RubyValue::True)),
            b'F' => Ok(arena.insert(RubyValue::False)),
            b'0' => Ok(arena.insert(RubyValue::Nil)),
            b'i' => {
                let value = read_fixnum(&mut self.reader)?;
                Ok(arena.insert(RubyValue::Int(value)))
            }
            b':' => {
                let bytes = read_byteseq(&mut self.reader)?;
                self.tracer.line(format_args!(
                    "defined symbol #{} :{}",
                    arena.symbol_count(),
                    String::from_utf8_lossy(&bytes)
                ));
                Ok(arena.define_symbol(bytes))
            }
            b';' => {
                let index = read_fixnum(&mut self.reader)?;
                arena.get_symbol(index).ok_or(DecodeError::BadRef {
                    table: "symbol",
                    index,
                    len: arena.symbol_count(),
                })
            }
            b'@' => {
                let index = read_fixnum(&mut self.reader)?;
                arena.get_object(index).ok_or(DecodeError::BadRef {
                    table: "object",
                    index,
                    len: arena.object_count(),
                })
            }
            b'"' => {
                let bytes = read_byteseq(&mut self.reader)?;
                Ok(arena.insert(RubyValue::string(bytes)))
            }
            b'[' => {
                let count = self.read_count()?;
                self.tracer
                    .line(format_args!("decoding array with {} elements", count));
                let id = arena.insert(RubyValue::Array(Vec::with_capacity(count.min(4096))));
                for _ in 0..count {
                    let item = self.next_value(arena, false)?;
                    arena.push_element(id, item);
                }
                Ok(id)
            }
            b'{' => {
                let count = self.read_count()?;
                self.tracer
                    .line(format_args!("decoding hash with {} pairs", count));
                let id = arena.insert(RubyValue::Hash(Vec::with_capacity(count.min(4096))));
                for _ in 0..count {
                    let key = self.next_value(arena, false)?;
                    let value = self.next_value(arena, false)?;
                    arena.hash_insert(id, key, value);
                }
                Ok(id)
            }
            b'o' => {
                let class_name = self.class_symbol(arena)?;
                let id = arena.insert(RubyValue::Object {
                    class_name,
                    ivars: Vec::new(),
                });
                self.read_ivars(arena, id)?;
                Ok(id)
            }
            b'u' => {
                let class_name = self.class_symbol(arena)?;
                let id = arena.insert(RubyValue::UserDefined {
                    class_name,
                    data: Vec::new(),
                    ivars: Vec::new(),
                });
                let payload = read_byteseq(&mut self.reader)?;
                if let RubyValue::UserDefined { data, .. } = arena.value_mut(id) {
                    *data = payload;
                }
                Ok(id)
            }
            b'U' => {
                let class_name = self.class_symbol(arena)?;
                let id = arena.insert(RubyValue::UserMarshal {
                    class_name,
                    data: None,
                    ivars: Vec::new(),
                });
                let payload = self.next_value(arena, false)?;
                if let RubyValue::UserMarshal { data, .. } = arena.value_mut(id) {
                    *data = Some(payload);
                }
                Ok(id)
            }
            b'I' => {
                let inner = self.next_value(arena, false)?;
                self.read_ivars(arena, inner)?;
                Ok(inner)
            }
            byte => Err(DecodeError::UnsupportedTag {
                byte,
                offset: self.reader.offset(),
            }),
        }
    }

    fn read_count(&mut self) -> Result<usize, DecodeError> {
        let count = read_fixnum(&mut self.reader)?;
        usize::try_from(count).map_err(|_| DecodeError::BadLength {
            value: count,
            offset: self.reader.offset(),
        })
    }

    /// Decode the class-name value of `o`/`u`/`U`; it must be a symbol.
    fn class_symbol(&mut self, arena: &mut RubyArena) -> Result<ValueId, DecodeError> {
        let id = self.next_value(arena, true)?;
        match arena.value(id) {
            RubyValue::Symbol(_) => Ok(id),
            other => Err(DecodeError::BadClassName {
                kind: other.kind_name(),
            }),
        }
    }

    /// Decode a fixnum-counted run of key/value pairs and install each as an
    /// instance variable on `target`.
    fn read_ivars(&mut self, arena: &mut RubyArena, target: ValueId) -> Result<(), DecodeError> {
        let count = self.read_count()?;
        self.tracer.line(format_args!(
            "{} is followed by {} instance variables",
            arena.value(target).kind_name(),
            count
        ));
        for _ in 0..count {
            let key = self.next_value(arena, true)?;
            let value = self.next_value(arena, true)?;
            if self.tracer.on() {
                self.tracer.line(format_args!(
                    "  key={} value={}",
                    arena.repr(key),
                    arena.repr(value)
                ));
            }
            arena.set_ivar(target, key, value)?;
        }
        Ok(())
    }
}
