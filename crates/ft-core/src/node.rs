//! Normalized feature tree nodes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::FeatureCategory;
use crate::references::FeatureReferences;
use crate::sketch::SketchDetail;

/// Unit tag attached to an attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeUnit {
    /// Meters
    Meter,
    /// Radians
    Radian,
    /// Plain count
    Count,
    /// Unitless
    None,
    /// Vendor-supplied unit label
    Other(String),
}

impl AttributeUnit {
    pub fn as_str(&self) -> &str {
        match self {
            AttributeUnit::Meter => "m",
            AttributeUnit::Radian => "rad",
            AttributeUnit::Count => "count",
            AttributeUnit::None => "none",
            AttributeUnit::Other(label) => label,
        }
    }
}

impl From<String> for AttributeUnit {
    fn from(label: String) -> Self {
        match label.as_str() {
            "m" => AttributeUnit::Meter,
            "rad" => AttributeUnit::Radian,
            "count" => AttributeUnit::Count,
            "none" | "" => AttributeUnit::None,
            _ => AttributeUnit::Other(label),
        }
    }
}

impl From<AttributeUnit> for String {
    fn from(unit: AttributeUnit) -> Self {
        unit.as_str().to_string()
    }
}

/// Attribute payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Numbers(Vec<f64>),
}

/// One extracted attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub value: AttributeValue,
    pub unit: AttributeUnit,
    /// Degrees mirror of an angle stored in radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrees: Option<f64>,
    /// Driving equation, for parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<String>,
    /// Link state, for parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_linked: Option<bool>,
}

impl Attribute {
    /// Create an attribute with no extras
    pub fn new(value: AttributeValue, unit: AttributeUnit) -> Self {
        Self {
            value,
            unit,
            degrees: None,
            equation: None,
            is_linked: None,
        }
    }

    pub fn length(meters: f64) -> Self {
        Self::new(AttributeValue::Number(meters), AttributeUnit::Meter)
    }

    /// Angle in radians, optionally mirrored in degrees
    ///
    /// The mirror is left out when it would overflow to infinity, so the
    /// attribute always serializes to valid JSON.
    pub fn angle(radians: f64, with_degrees: bool) -> Self {
        let mut attr = Self::new(AttributeValue::Number(radians), AttributeUnit::Radian);
        if with_degrees {
            attr.degrees = Some(radians.to_degrees()).filter(|d| d.is_finite());
        }
        attr
    }

    pub fn count(count: i64) -> Self {
        Self::new(AttributeValue::Integer(count), AttributeUnit::Count)
    }

    pub fn flag(value: bool) -> Self {
        Self::new(AttributeValue::Bool(value), AttributeUnit::None)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(AttributeValue::Text(value.into()), AttributeUnit::None)
    }

    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self.value {
            AttributeValue::Number(v) => Some(v),
            AttributeValue::Integer(v) => Some(v as f64),
            _ => None,
        }
    }
}

/// Error marker attached to a node whose extraction faulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeError {
    /// Accessor that raised
    pub member: String,
    pub message: String,
}

/// One modeling operation in the normalized tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureNode {
    pub name: String,
    pub type_raw: String,
    pub category: FeatureCategory,
    pub creation_order: usize,
    pub hierarchy_path: String,
    pub suppressed: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketch_detail: Option<SketchDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<FeatureReferences>,
    #[serde(default)]
    pub children: Vec<FeatureNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NodeError>,
}

impl FeatureNode {
    /// Whether extraction of this node faulted
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Pre-order iterator over this node and its descendants
    pub fn iter(&self) -> impl Iterator<Item = &FeatureNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Pre-order iterator over a whole forest
pub fn walk_forest(nodes: &[FeatureNode]) -> impl Iterator<Item = &FeatureNode> {
    nodes.iter().flat_map(FeatureNode::iter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn leaf(name: &str, path: &str) -> FeatureNode {
        FeatureNode {
            name: name.into(),
            type_raw: "ProfileFeature".into(),
            category: FeatureCategory::Sketch,
            creation_order: 0,
            hierarchy_path: path.into(),
            suppressed: false,
            attributes: BTreeMap::new(),
            dependencies: Vec::new(),
            sketch_detail: None,
            references: None,
            children: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_angle_keeps_radians() {
        let attr = Attribute::angle(std::f64::consts::FRAC_PI_2, true);
        assert_relative_eq!(attr.as_f64().unwrap(), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(attr.degrees.unwrap(), 90.0, epsilon = 1e-12);
        assert!(Attribute::angle(1.0, false).degrees.is_none());
    }

    #[test]
    fn test_huge_angle_drops_degrees() {
        let attr = Attribute::angle(1e308, true);
        assert_eq!(attr.value, AttributeValue::Number(1e308));
        assert!(attr.degrees.is_none());

        let json = serde_json::to_string(&attr).unwrap();
        assert!(!json.contains("null"));
        let parsed: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, attr);
    }

    #[test]
    fn test_attribute_json_shape() {
        let json = serde_json::to_value(Attribute::length(0.025)).unwrap();
        assert_eq!(json, serde_json::json!({"value": 0.025, "unit": "m"}));

        let json = serde_json::to_value(Attribute::count(6)).unwrap();
        assert_eq!(json, serde_json::json!({"value": 6, "unit": "count"}));
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(AttributeUnit::from("rad".to_string()), AttributeUnit::Radian);
        assert_eq!(
            AttributeUnit::from("mm".to_string()),
            AttributeUnit::Other("mm".into())
        );
        assert_eq!(String::from(AttributeUnit::Count), "count");
    }

    #[test]
    fn test_preorder_iteration() {
        let mut root = leaf("Boss", "1");
        let mut child = leaf("Sketch1", "1.1");
        child.children.push(leaf("Deep", "1.1.1"));
        root.children.push(child);
        root.children.push(leaf("Sketch2", "1.2"));

        let paths: Vec<_> = root.iter().map(|n| n.hierarchy_path.as_str()).collect();
        assert_eq!(paths, vec!["1", "1.1", "1.1.1", "1.2"]);
    }
}
