//! Document-level records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ft_session::PropertyValue;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::FeatureCategory;
use crate::constants::EXTRACTOR_VERSION;
use crate::node::{FeatureNode, walk_forest};

/// Run metadata; transient, excluded from structural comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub run_id: Uuid,
    pub extracted_at: DateTime<Utc>,
    pub extractor_version: String,
    /// Where the document came from (path or title)
    pub source: String,
}

impl ExtractionMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            extracted_at: Utc::now(),
            extractor_version: EXTRACTOR_VERSION.to_string(),
            source: source.into(),
        }
    }
}

/// Document length unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Millimeter,
    Centimeter,
    Meter,
    Inch,
    Foot,
    FootInch,
    Angstrom,
    Nanometer,
    Micron,
    Mil,
    Microinch,
    #[default]
    Unknown,
}

impl LengthUnit {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => LengthUnit::Millimeter,
            1 => LengthUnit::Centimeter,
            2 => LengthUnit::Meter,
            3 => LengthUnit::Inch,
            4 => LengthUnit::Foot,
            5 => LengthUnit::FootInch,
            6 => LengthUnit::Angstrom,
            7 => LengthUnit::Nanometer,
            8 => LengthUnit::Micron,
            9 => LengthUnit::Mil,
            10 => LengthUnit::Microinch,
            _ => LengthUnit::Unknown,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => LengthUnit::Millimeter,
            "cm" | "centimeter" | "centimeters" => LengthUnit::Centimeter,
            "m" | "meter" | "meters" => LengthUnit::Meter,
            "in" | "inch" | "inches" => LengthUnit::Inch,
            "ft" | "foot" | "feet" => LengthUnit::Foot,
            "ft-in" | "feet-inches" => LengthUnit::FootInch,
            "angstrom" | "angstroms" => LengthUnit::Angstrom,
            "nm" | "nanometer" | "nanometers" => LengthUnit::Nanometer,
            "um" | "micron" | "microns" => LengthUnit::Micron,
            "mil" | "mils" => LengthUnit::Mil,
            "uin" | "microinch" | "microinches" => LengthUnit::Microinch,
            _ => LengthUnit::Unknown,
        }
    }

    /// Decode a raw member value (code or label)
    pub fn from_value(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Text(label) => Self::from_label(label),
            other => other.as_i64().map(Self::from_code).unwrap_or_default(),
        }
    }
}

/// Document mass unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    Gram,
    Kilogram,
    Pound,
    #[default]
    Unknown,
}

impl MassUnit {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MassUnit::Gram,
            2 => MassUnit::Pound,
            _ => MassUnit::Unknown,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => MassUnit::Gram,
            "kg" | "kilogram" | "kilograms" => MassUnit::Kilogram,
            "lb" | "lbs" | "pound" | "pounds" => MassUnit::Pound,
            _ => MassUnit::Unknown,
        }
    }

    pub fn from_value(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::Text(label) => Self::from_label(label),
            other => other.as_i64().map(Self::from_code).unwrap_or_default(),
        }
    }
}

/// Unit system of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Units {
    pub length: LengthUnit,
    pub mass: MassUnit,
}

/// Assigned material
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Physical properties in SI units
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, f64>,
}

impl MaterialInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.database.is_none() && self.properties.is_empty()
    }
}

/// Material members read into [`MaterialInfo::properties`], with output keys
pub const MATERIAL_PROPERTIES: &[(&str, &str)] = &[
    ("Density", "density"),
    ("ElasticModulus", "elasticModulus"),
    ("PoissonRatio", "poissonRatio"),
    ("YieldStrength", "yieldStrength"),
    ("TensileStrength", "tensileStrength"),
    ("ThermalExpansionCoefficient", "thermalExpansionCoefficient"),
    ("ThermalConductivity", "thermalConductivity"),
    ("SpecificHeat", "specificHeat"),
];

/// One configuration of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationInfo {
    pub name: String,
    pub is_active: bool,
    /// Top-level features suppressed in this configuration
    #[serde(default)]
    pub suppressed_feature_names: Vec<String>,
}

/// Reference plane definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaneDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Vendor plane type code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<DVec3>,
    /// Plane equation constant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<f64>,
}

impl PlaneDefinition {
    /// Decode `[nx, ny, nz, ox, oy, oz, d]`; the constant is optional
    pub fn decode_params(&mut self, params: &[f64]) {
        if params.len() >= 6 && params[..6].iter().all(|v| v.is_finite()) {
            self.normal = Some(DVec3::new(params[0], params[1], params[2]));
            self.origin = Some(DVec3::new(params[3], params[4], params[5]));
        }
        self.constant = params.get(6).copied().filter(|v| v.is_finite());
    }
}

/// Reference axis definition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DVec3>,
}

impl AxisDefinition {
    /// Decode `[sx, sy, sz, ex, ey, ez]`
    pub fn decode_params(&mut self, params: &[f64]) {
        if params.len() >= 6 && params[..6].iter().all(|v| v.is_finite()) {
            self.start = Some(DVec3::new(params[0], params[1], params[2]));
            self.end = Some(DVec3::new(params[3], params[4], params[5]));
        }
    }

    pub fn direction(&self) -> Option<DVec3> {
        Some((self.end? - self.start?).normalize_or_zero())
    }
}

/// Reference geometry independent of the feature tree
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    #[serde(default)]
    pub planes: Vec<PlaneDefinition>,
    #[serde(default)]
    pub axes: Vec<AxisDefinition>,
}

/// Tree-wide counts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_features: usize,
    pub top_level_features: usize,
    pub suppressed_features: usize,
    pub failed_features: usize,
    pub sketch_count: usize,
    /// Count per category label
    pub by_category: BTreeMap<String, usize>,
}

impl Statistics {
    pub fn from_tree(tree: &[FeatureNode]) -> Self {
        let mut stats = Statistics {
            top_level_features: tree.len(),
            ..Default::default()
        };
        for node in walk_forest(tree) {
            stats.total_features += 1;
            if node.suppressed {
                stats.suppressed_features += 1;
            }
            if node.is_failed() {
                stats.failed_features += 1;
            }
            if node.category == FeatureCategory::Sketch {
                stats.sketch_count += 1;
            }
            *stats
                .by_category
                .entry(node.category.label().to_string())
                .or_default() += 1;
        }
        stats
    }
}
