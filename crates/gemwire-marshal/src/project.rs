//! Projection of decoded values into host objects.
//!
//! Each value caches its projection on the arena slot, so shared sub-values
//! project exactly once and repeated projections hand back the same host
//! object.

use std::rc::Rc;

use gemwire_core::{ClassFactory, HostRef, HostValue, ProjectError, RubyArena, RubyValue, ValueId};

/// Project `id` into a host value, consulting `factory` for named classes.
pub fn project(
    arena: &RubyArena,
    id: ValueId,
    factory: &dyn ClassFactory,
) -> Result<HostValue, ProjectError> {
    if let Some(cached) = arena.cached_projection(id) {
        return Ok(cached);
    }
    let projected = match arena.value(id) {
        RubyValue::True => HostValue::Bool(true),
        RubyValue::False => HostValue::Bool(false),
        RubyValue::Nil => HostValue::Null,
        RubyValue::Int(v) => HostValue::Int(*v),
        RubyValue::Symbol(bytes) => {
            HostValue::Str(Rc::from(String::from_utf8_lossy(bytes).as_ref()))
        }
        RubyValue::String { bytes, utf8, .. } => HostValue::Str(decode_text(bytes, *utf8)?),
        RubyValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(project(arena, *item, factory)?);
            }
            HostValue::array(out)
        }
        RubyValue::Hash(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                out.push((
                    project(arena, *key, factory)?,
                    project(arena, *value, factory)?,
                ));
            }
            HostValue::map(out)
        }
        RubyValue::Object { ivars, .. } => {
            let host = instantiate(arena, id, factory)?;
            apply_ivars(arena, ivars, &host, factory)?;
            HostValue::Object(host)
        }
        RubyValue::UserDefined { data, ivars, .. } => {
            let host = instantiate(arena, id, factory)?;
            host.borrow_mut().load(data)?;
            apply_ivars(arena, ivars, &host, factory)?;
            HostValue::Object(host)
        }
        RubyValue::UserMarshal { data, ivars, .. } => {
            let host = instantiate(arena, id, factory)?;
            let payload = match data {
                Some(inner) => project(arena, *inner, factory)?,
                None => HostValue::Null,
            };
            host.borrow_mut().marshal_load(payload)?;
            apply_ivars(arena, ivars, &host, factory)?;
            HostValue::Object(host)
        }
    };
    arena.cache_projection(id, projected.clone());
    Ok(projected)
}

fn instantiate(
    arena: &RubyArena,
    id: ValueId,
    factory: &dyn ClassFactory,
) -> Result<HostRef, ProjectError> {
    let class = arena
        .class_name(id)
        .ok_or_else(|| ProjectError::failed("<anonymous>", "value has no class name"))?;
    factory
        .instantiate(&class, None)
        .ok_or(ProjectError::UnknownClass { class })
}

fn apply_ivars(
    arena: &RubyArena,
    ivars: &[(ValueId, ValueId)],
    host: &HostRef,
    factory: &dyn ClassFactory,
) -> Result<(), ProjectError> {
    for (key, value) in ivars {
        let name_bytes = arena.symbol_bytes(*key).ok_or(ProjectError::BadIvarKey)?;
        let name = String::from_utf8_lossy(name_bytes);
        // ivar keys from real Ruby objects carry a leading @; strip it to
        // obtain the attribute name, tolerating keys without one
        let attr = name.strip_prefix('@').unwrap_or(&name);
        let projected = project(arena, *value, factory)?;
        host.borrow_mut().set_attr(attr, projected)?;
    }
    Ok(())
}

fn decode_text(bytes: &[u8], utf8: Option<bool>) -> Result<Rc<str>, ProjectError> {
    if utf8 == Some(true) {
        let s = std::str::from_utf8(bytes).map_err(|_| ProjectError::InvalidUtf8)?;
        Ok(Rc::from(s))
    } else {
        // no E flag: treat the bytes as latin-1
        let s: String = bytes.iter().map(|&b| b as char).collect();
        Ok(Rc::from(s.as_str()))
    }
}
