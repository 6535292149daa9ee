//! The encoder driver.
//!
//! Walks a value graph and emits its wire form, issuing `;`/`@`
//! back-references for values already seen. Marshal ids are assigned in the
//! order values are emitted, which is exactly the order the decoder would
//! register them when reading the output back.

use std::collections::HashMap;
use std::io::Write;

use gemwire_core::{EncodeError, RubyArena, RubyValue, Tracer, ValueId};

use crate::fixnum::{write_byteseq, write_fixnum};
use crate::io::ByteWriter;
use crate::SIGNATURE;

pub struct Encoder<W: Write> {
    writer: ByteWriter<W>,
    tracer: Tracer,
    // symbols dedup by content so equal byte strings share one definition
    symbol_ids: HashMap<Vec<u8>, u32>,
    object_ids: HashMap<ValueId, u32>,
    next_symbol_id: u32,
    next_object_id: u32,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W, quiet: bool) -> Self {
        Self {
            writer: ByteWriter::new(sink),
            tracer: Tracer::new(quiet),
            symbol_ids: HashMap::new(),
            object_ids: HashMap::new(),
            next_symbol_id: 0,
            next_object_id: 0,
        }
    }

    /// Emit one document and flush the sink.
    pub fn encode(&mut self, arena: &RubyArena, root: ValueId) -> Result<(), EncodeError> {
        self.writer.put_bytes(&SIGNATURE)?;
        self.next_value(arena, root)?;
        self.writer.flush()
    }

    fn next_value(&mut self, arena: &RubyArena, id: ValueId) -> Result<(), EncodeError> {
        if self.tracer.on() {
            self.tracer.line(format_args!(
                "marshal {}: {}",
                arena.value(id).kind_name(),
                arena.repr(id)
            ));
        }
        match arena.value(id) {
            RubyValue::True => self.writer.put_byte(b'T'),
            RubyValue::False => self.writer.put_byte(b'F'),
            RubyValue::Nil => self.writer.put_byte(b'0'),
            RubyValue::Int(value) => {
                self.writer.put_byte(b'i')?;
                write_fixnum(&mut self.writer, *value)
            }
            RubyValue::Symbol(bytes) => self.symbol(bytes),
            RubyValue::String {
                bytes,
                utf8,
                encoding,
            } => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                let ivar_count = utf8.is_some() as i64 + encoding.is_some() as i64;
                if ivar_count > 0 {
                    self.writer.put_byte(b'I')?;
                }
                self.writer.put_byte(b'"')?;
                write_byteseq(&mut self.writer, bytes)?;
                if ivar_count > 0 {
                    write_fixnum(&mut self.writer, ivar_count)?;
                    if let Some(flag) = utf8 {
                        self.symbol(b"E")?;
                        self.writer.put_byte(if *flag { b'T' } else { b'F' })?;
                    }
                    if let Some(name) = encoding {
                        self.symbol(b"encoding")?;
                        self.raw_string(name)?;
                    }
                }
                Ok(())
            }
            RubyValue::Array(items) => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                self.writer.put_byte(b'[')?;
                write_fixnum(&mut self.writer, items.len() as i64)?;
                for item in items {
                    self.next_value(arena, *item)?;
                }
                Ok(())
            }
            RubyValue::Hash(pairs) => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                self.writer.put_byte(b'{')?;
                write_fixnum(&mut self.writer, pairs.len() as i64)?;
                for (key, value) in pairs {
                    self.next_value(arena, *key)?;
                    self.next_value(arena, *value)?;
                }
                Ok(())
            }
            RubyValue::Object { class_name, ivars } => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                self.writer.put_byte(b'o')?;
                self.next_value(arena, *class_name)?;
                self.ivars(arena, ivars)
            }
            RubyValue::UserDefined {
                class_name,
                data,
                ivars,
            } => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                if !ivars.is_empty() {
                    self.writer.put_byte(b'I')?;
                }
                self.writer.put_byte(b'u')?;
                self.next_value(arena, *class_name)?;
                write_byteseq(&mut self.writer, data)?;
                if !ivars.is_empty() {
                    self.ivars(arena, ivars)?;
                }
                Ok(())
            }
            RubyValue::UserMarshal {
                class_name,
                data,
                ivars,
            } => {
                if self.object_ref(id)? {
                    return Ok(());
                }
                if !ivars.is_empty() {
                    self.writer.put_byte(b'I')?;
                }
                self.writer.put_byte(b'U')?;
                self.next_value(arena, *class_name)?;
                match data {
                    Some(payload) => self.next_value(arena, *payload)?,
                    None => return Err(EncodeError::MissingPayload),
                }
                if !ivars.is_empty() {
                    self.ivars(arena, ivars)?;
                }
                Ok(())
            }
        }
    }

    /// Emit a symbol, as a definition the first time and a `;` reference
    /// afterwards.
    fn symbol(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if let Some(&index) = self.symbol_ids.get(bytes) {
            self.writer.put_byte(b';')?;
            return write_fixnum(&mut self.writer, index as i64);
        }
        self.symbol_ids.insert(bytes.to_vec(), self.next_symbol_id);
        self.next_symbol_id += 1;
        self.writer.put_byte(b':')?;
        write_byteseq(&mut self.writer, bytes)
    }

    /// Emit a bare string that has no arena identity, consuming the object
    /// id the decoder would assign to it.
    fn raw_string(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.next_object_id += 1;
        self.writer.put_byte(b'"')?;
        write_byteseq(&mut self.writer, bytes)
    }

    /// Back-reference bookkeeping for object-kind values. Returns true when
    /// a `@` reference was written and the value needs no further output.
    fn object_ref(&mut self, id: ValueId) -> Result<bool, EncodeError> {
        if let Some(&index) = self.object_ids.get(&id) {
            self.writer.put_byte(b'@')?;
            write_fixnum(&mut self.writer, index as i64)?;
            return Ok(true);
        }
        self.object_ids.insert(id, self.next_object_id);
        self.next_object_id += 1;
        Ok(false)
    }

    fn ivars(&mut self, arena: &RubyArena, ivars: &[(ValueId, ValueId)]) -> Result<(), EncodeError> {
        write_fixnum(&mut self.writer, ivars.len() as i64)?;
        for (key, value) in ivars {
            self.next_value(arena, *key)?;
            self.next_value(arena, *value)?;
        }
        Ok(())
    }
}
