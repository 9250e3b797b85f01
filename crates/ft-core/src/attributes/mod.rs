//! Attribute extraction
//!
//! Pulls a category's schema attributes out of a feature's definition object,
//! then merges in the feature's driving parameters. Every member read is
//! guarded on its own, so one bad member never costs the rest of the map.

mod schema;

pub use schema::{AttributeSpec, ValueKind, end_condition_name, schema_for};

use std::collections::BTreeMap;

use ft_session::{FeatureHandle, PropertyBag, PropertyValue};
use tracing::debug;

use crate::classify::FeatureCategory;
use crate::config::ExtractConfig;
use crate::error::ExtractResult;
use crate::node::{Attribute, AttributeUnit, AttributeValue};
use crate::probe::{first_member, flag, optional, or_default, text};

/// Attribute map of one node
pub type AttributeMap = BTreeMap<String, Attribute>;

/// Extract schema attributes and parameters for a feature
pub fn extract_attributes(
    feature: &dyn FeatureHandle,
    category: FeatureCategory,
    config: &ExtractConfig,
) -> ExtractResult<AttributeMap> {
    let mut attributes = AttributeMap::new();

    let schema = schema_for(category);
    if !schema.is_empty()
        && let Some(data) = optional(feature.specific_feature_data(), "feature definition")?
    {
        for spec in schema {
            if let Some(raw) = first_member(&*data, spec.members)? {
                attributes.insert(spec.name.to_string(), normalize(raw, spec.kind, config));
            }
        }
    }

    if config.include_parameters {
        let parameters = or_default(feature.parameters(), "feature parameters")?;
        merge_parameters(&mut attributes, &parameters)?;
    }

    Ok(attributes)
}

/// Merge driving parameters without overwriting existing attributes
pub fn merge_parameters(
    attributes: &mut AttributeMap,
    parameters: &[Box<dyn PropertyBag>],
) -> ExtractResult<()> {
    for parameter in parameters {
        let Some(name) = text(&**parameter, "Name")? else {
            continue;
        };
        if attributes.contains_key(&name) {
            debug!("Parameter {} shadowed by schema attribute", name);
            continue;
        }
        let Some(value) = optional(parameter.get("Value"), "parameter value")? else {
            continue;
        };

        let mut attr = coerce(value);
        if let Some(units) = text(&**parameter, "Units")? {
            attr.unit = AttributeUnit::from(units);
        }
        attr.equation = text(&**parameter, "Equation")?.filter(|e| !e.is_empty());
        attr.is_linked = flag(&**parameter, "Linked")?;
        attributes.insert(name, attr);
    }
    Ok(())
}

/// Normalize a raw member value for the given kind
///
/// Values that do not fit the kind fall back to [`coerce`].
pub fn normalize(raw: PropertyValue, kind: ValueKind, config: &ExtractConfig) -> Attribute {
    let normalized = match kind {
        ValueKind::Length => finite(&raw).map(Attribute::length),
        ValueKind::Angle => finite(&raw).map(|v| Attribute::angle(v, config.angle_degrees)),
        ValueKind::Count => match &raw {
            PropertyValue::Floats(items) => Some(Attribute::count(items.len() as i64)),
            PropertyValue::Texts(items) => Some(Attribute::count(items.len() as i64)),
            other => other.as_i64().map(Attribute::count),
        },
        ValueKind::Flag => raw.as_bool().map(Attribute::flag),
        ValueKind::EndCondition => raw
            .as_i64()
            .map(|code| match end_condition_name(code) {
                Some(name) => Attribute::text(name),
                None => Attribute::new(AttributeValue::Integer(code), AttributeUnit::None),
            }),
        ValueKind::Code => raw
            .as_i64()
            .map(|code| Attribute::new(AttributeValue::Integer(code), AttributeUnit::None)),
        ValueKind::Text => None,
    };
    normalized.unwrap_or_else(|| coerce(raw))
}

fn finite(raw: &PropertyValue) -> Option<f64> {
    raw.as_f64().filter(|v| v.is_finite())
}

/// Kind-agnostic conversion that always yields a serializable attribute
///
/// Native object references and non-finite floats become text.
pub fn coerce(raw: PropertyValue) -> Attribute {
    let value = match raw {
        PropertyValue::Bool(v) => AttributeValue::Bool(v),
        PropertyValue::Int(v) => AttributeValue::Integer(v),
        PropertyValue::Float(v) if v.is_finite() => AttributeValue::Number(v),
        PropertyValue::Float(v) => AttributeValue::Text(v.to_string()),
        PropertyValue::Text(v) => AttributeValue::Text(v),
        PropertyValue::Floats(v) if v.iter().all(|x| x.is_finite()) => AttributeValue::Numbers(v),
        PropertyValue::Floats(v) => AttributeValue::Text(format!("{v:?}")),
        PropertyValue::Texts(v) => AttributeValue::Text(v.join(", ")),
        PropertyValue::Object(interface) => AttributeValue::Text(format!("<{interface}>")),
    };
    Attribute::new(value, AttributeUnit::None)
}
