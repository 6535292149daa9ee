//! End-to-end tests over the public API: decode, project, lift, encode and
//! Gemfile evaluation together.

use std::fs;

use gemwire::record::{Record, RecordFactory};
use gemwire::{
    decode, decode_document, encode, gemfile_parse, Environment, Error, HostObject, HostValue,
    Options, RubyValue,
};

fn quiet() -> Options {
    Options {
        quiet: true,
        ..Options::default()
    }
}

/// Marshal bytes of a gem-index-style document:
/// [["rake", Gem::Version(["13.0"])], ["json", Gem::Version(["2.6"])]]
fn gem_index_bytes() -> Vec<u8> {
    let mut bytes = vec![0x04, 0x08];
    bytes.push(b'[');
    bytes.push(0x07); // 2 entries
    for (i, (name, version)) in [("rake", "13.0"), ("json", "2.6")].iter().enumerate() {
        bytes.push(b'[');
        bytes.push(0x07); // [name, version]
        // I"<name>" with E=true
        bytes.extend([b'I', b'"']);
        bytes.push(name.len() as u8 + 5);
        bytes.extend(name.as_bytes());
        bytes.push(0x06);
        if i == 0 {
            bytes.extend([b':', 0x06, b'E']);
        } else {
            bytes.extend([b';', 0x00]);
        }
        bytes.push(b'T');
        // U:Gem::Version ["<version>"]
        bytes.push(b'U');
        if i == 0 {
            bytes.push(b':');
            bytes.push(b"Gem::Version".len() as u8 + 5);
            bytes.extend(b"Gem::Version");
        } else {
            bytes.extend([b';', 0x06]);
        }
        bytes.extend([b'[', 0x06, b'I', b'"']);
        bytes.push(version.len() as u8 + 5);
        bytes.extend(version.as_bytes());
        bytes.push(0x06);
        bytes.extend([b';', 0x00, b'T']);
    }
    bytes
}

#[test]
fn decode_projects_gem_index() {
    let bytes = gem_index_bytes();
    let value = decode(bytes.as_slice(), &RecordFactory, &quiet()).unwrap();

    let entries = value.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let first = entries[0].as_array().unwrap();
    assert_eq!(first[0].as_str(), Some("rake"));
    let version = first[1].as_object().unwrap().borrow();
    assert_eq!(version.class_name(), "Gem::Version");
    let payload = version.marshal_dump().unwrap();
    assert_eq!(payload.as_array().unwrap()[0].as_str(), Some("13.0"));
}

#[test]
fn document_round_trips_byte_for_byte() {
    let bytes = gem_index_bytes();
    let document = decode_document(bytes.as_slice(), &quiet()).unwrap();

    let mut out = Vec::new();
    document.encode(&mut out, &quiet()).unwrap();
    assert_eq!(out, bytes);
}

#[test]
fn projection_then_lift_round_trips() {
    let bytes = gem_index_bytes();
    let value = decode(bytes.as_slice(), &RecordFactory, &quiet()).unwrap();

    let mut out = Vec::new();
    encode(&value, &mut out, &quiet()).unwrap();

    // decoding the re-encoded form yields the same projection
    let again = decode(out.as_slice(), &RecordFactory, &quiet()).unwrap();
    let a = value.as_array().unwrap();
    let b = again.as_array().unwrap();
    assert_eq!(a.len(), b.len());
    assert_eq!(
        a[0].as_array().unwrap()[0].as_str(),
        b[0].as_array().unwrap()[0].as_str()
    );
}

#[test]
fn generic_object_projection_sets_attributes() {
    // o:Foo { @x = 5 }
    let bytes = [
        0x04, 0x08, 0x6f, 0x3a, 0x08, 0x46, 0x6f, 0x6f, 0x06, 0x3a, 0x07, 0x40, 0x78, 0x69, 0x0a,
    ];
    let value = decode(bytes.as_slice(), &RecordFactory, &quiet()).unwrap();
    let host = value.as_object().unwrap().borrow();
    assert_eq!(host.class_name(), "Foo");
    let attrs = host.attrs();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0].0, "x");
    assert_eq!(attrs[0].1, HostValue::Int(5));
}

#[test]
fn projection_is_cached_across_calls() {
    let bytes = [
        0x04, 0x08, 0x6f, 0x3a, 0x08, 0x46, 0x6f, 0x6f, 0x06, 0x3a, 0x07, 0x40, 0x78, 0x69, 0x0a,
    ];
    let document = decode_document(bytes.as_slice(), &quiet()).unwrap();
    let first = document.project(&RecordFactory).unwrap();
    let second = document.project(&RecordFactory).unwrap();
    // identical host object, by identity
    assert_eq!(first, second);
}

#[test]
fn unknown_class_surfaces_as_error() {
    struct NoFactory;
    impl gemwire::ClassFactory for NoFactory {
        fn instantiate(
            &self,
            _class_name: &str,
            _arg: Option<&HostValue>,
        ) -> Option<gemwire::HostRef> {
            None
        }
    }

    let bytes = [
        0x04, 0x08, 0x6f, 0x3a, 0x08, 0x46, 0x6f, 0x6f, 0x06, 0x3a, 0x07, 0x40, 0x78, 0x69, 0x0a,
    ];
    match decode(bytes.as_slice(), &NoFactory, &quiet()) {
        Err(Error::Project(gemwire::ProjectError::UnknownClass { class })) => {
            assert_eq!(class, "Foo")
        }
        other => panic!("expected UnknownClass, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn truncated_input_surfaces_as_error() {
    let bytes = [0x04, 0x08, 0x5b, 0x07, 0x69, 0x0a];
    assert!(matches!(
        decode_document(bytes.as_slice(), &quiet()),
        Err(Error::Decode(gemwire::DecodeError::Truncated { .. }))
    ));
}

#[test]
fn host_graph_encodes_through_record_contracts() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut spec = Record::new("Gem::Specification");
    spec.set_attr("name", HostValue::str("rake")).unwrap();
    spec.set_attr(
        "require_paths",
        HostValue::array(vec![HostValue::str("lib")]),
    )
    .unwrap();
    let value = HostValue::Object(Rc::new(RefCell::new(spec)));

    let mut bytes = Vec::new();
    encode(&value, &mut bytes, &quiet()).unwrap();

    let document = decode_document(bytes.as_slice(), &quiet()).unwrap();
    let arena = document.arena();
    assert_eq!(
        arena.class_name(document.root()).as_deref(),
        Some("Gem::Specification")
    );
    match arena.value(document.root()) {
        RubyValue::Object { ivars, .. } => {
            assert_eq!(ivars.len(), 2);
            assert_eq!(arena.symbol_bytes(ivars[0].0), Some(&b"@name"[..]));
        }
        other => panic!("expected object, got {:?}", other),
    }
}

#[test]
fn gemfile_and_marshal_work_together() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Gemfile");
    fs::write(
        &path,
        "source \"https://rubygems.org\"\ngem \"rake\", \">= 12\"\ngem \"rspec\", group: :test\n",
    )
    .unwrap();

    let env = Environment::new("3.1.0").with_group("test");
    let gemfile = gemfile_parse(&path, &env, &quiet()).unwrap();
    assert_eq!(gemfile.active_gems().count(), 2);

    // pretend the index answered with versions for the active gems
    let bytes = gem_index_bytes();
    let index = decode(bytes.as_slice(), &RecordFactory, &quiet()).unwrap();
    let names: Vec<_> = index
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry.as_array().unwrap()[0].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"rake".to_string()));
}
