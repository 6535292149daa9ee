//! A generic host object for callers without bespoke classes.
//!
//! [`Record`] accepts every projection contract and remembers what it was
//! given, so any document can be decoded with [`RecordFactory`] and encoded
//! back without loss. Hosts with real types implement
//! [`HostObject`](gemwire_core::HostObject) themselves and only fall back to
//! this for classes they do not model.

use std::cell::RefCell;
use std::rc::Rc;

use gemwire_core::{ClassFactory, HostObject, HostRef, HostValue, ProjectError};

/// A class-shaped bag of attributes plus the load/dump payloads.
#[derive(Debug, Default)]
pub struct Record {
    class_name: String,
    attrs: Vec<(String, HostValue)>,
    data: Option<Vec<u8>>,
    marshal_data: Option<HostValue>,
}

impl Record {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&HostValue> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn marshal_data(&self) -> Option<&HostValue> {
        self.marshal_data.as_ref()
    }
}

impl HostObject for Record {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn set_attr(&mut self, name: &str, value: HostValue) -> Result<(), ProjectError> {
        if let Some(entry) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.attrs.push((name.to_string(), value));
        }
        Ok(())
    }

    fn load(&mut self, data: &[u8]) -> Result<(), ProjectError> {
        self.data = Some(data.to_vec());
        Ok(())
    }

    fn marshal_load(&mut self, data: HostValue) -> Result<(), ProjectError> {
        self.marshal_data = Some(data);
        Ok(())
    }

    fn attrs(&self) -> Vec<(String, HostValue)> {
        self.attrs.clone()
    }

    fn dump(&self) -> Option<Vec<u8>> {
        self.data.clone()
    }

    fn marshal_dump(&self) -> Option<HostValue> {
        self.marshal_data.clone()
    }
}

/// Factory that instantiates every class name as a [`Record`].
pub struct RecordFactory;

impl ClassFactory for RecordFactory {
    fn instantiate(&self, class_name: &str, _arg: Option<&HostValue>) -> Option<HostRef> {
        Some(Rc::new(RefCell::new(Record::new(class_name))))
    }
}
