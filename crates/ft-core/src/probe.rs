//! Capability probes
//!
//! Every vendor accessor is fallible. These helpers fold an [`AccessResult`]
//! into an optional value: absent and failing members become `None`, while a
//! lost session is escalated to a fatal [`ExtractError`].

use ft_session::{AccessError, AccessResult, PropertyBag, PropertyValue};
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};

/// Fold an accessor result into an optional value
pub fn optional<T>(result: AccessResult<T>, what: &str) -> ExtractResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AccessError::Unsupported(_)) => Ok(None),
        Err(AccessError::Failed { member, message }) => {
            debug!("Skipping {} ({} failed: {})", what, member, message);
            Ok(None)
        }
        Err(AccessError::Disconnected(message)) => Err(ExtractError::Connection(message)),
    }
}

/// Like [`optional`], substituting the type's default
pub fn or_default<T: Default>(result: AccessResult<T>, what: &str) -> ExtractResult<T> {
    Ok(optional(result, what)?.unwrap_or_default())
}

/// Read the first supported member among `members`
///
/// Aliases cover member renames between vendor versions. A failing member
/// ends the search; only unsupported ones fall through to the next alias.
pub fn first_member<B: PropertyBag + ?Sized>(
    bag: &B,
    members: &[&str],
) -> ExtractResult<Option<PropertyValue>> {
    for member in members {
        match bag.get(member) {
            Err(AccessError::Unsupported(_)) => continue,
            result => return optional(result, member),
        }
    }
    Ok(None)
}

/// Read a member as f64
pub fn number<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<f64>> {
    Ok(optional(bag.get(member), member)?.and_then(|v| v.as_f64()))
}

/// Read a member as i64
pub fn integer<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<i64>> {
    Ok(optional(bag.get(member), member)?.and_then(|v| v.as_i64()))
}

/// Read a member as bool
pub fn flag<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<bool>> {
    Ok(optional(bag.get(member), member)?.and_then(|v| v.as_bool()))
}

/// Read a member as text; numbers are rendered, objects yield `None`
pub fn text<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<String>> {
    Ok(optional(bag.get(member), member)?.and_then(|v| match v {
        PropertyValue::Text(s) => Some(s),
        PropertyValue::Int(i) => Some(i.to_string()),
        PropertyValue::Float(f) => Some(f.to_string()),
        PropertyValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }))
}

/// Read a member as a numeric array
pub fn floats<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<Vec<f64>>> {
    Ok(optional(bag.get(member), member)?.and_then(|v| v.as_floats().map(<[f64]>::to_vec)))
}
