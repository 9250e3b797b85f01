//! Sketch record types

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// Sketch plane placement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchPlane {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Vendor reference-entity type code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<SketchTransform>,
}

/// Model-to-sketch transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchTransform {
    pub rotation: DMat3,
    pub translation: DVec3,
    pub scale: f64,
}

impl SketchTransform {
    /// Decode a vendor transform array
    ///
    /// Layout: nine rotation values row by row, three translation values,
    /// then the scale. Trailing values are ignored.
    pub fn from_array(data: &[f64]) -> Option<Self> {
        if data.len() < 13 || data[..13].iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut rows = [0.0; 9];
        rows.copy_from_slice(&data[..9]);
        Some(Self {
            rotation: DMat3::from_cols_array(&rows).transpose(),
            translation: DVec3::new(data[9], data[10], data[11]),
            scale: data[12],
        })
    }

    /// Plane normal in model space (the rotated sketch Z axis)
    pub fn normal(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }
}

/// Geometric kind of a sketch segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SketchEntityKind {
    Line,
    Arc,
    Ellipse,
    Spline,
    Text,
    Parabola,
    Other(i64),
}

impl SketchEntityKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SketchEntityKind::Line,
            1 => SketchEntityKind::Arc,
            2 => SketchEntityKind::Ellipse,
            3 => SketchEntityKind::Spline,
            4 => SketchEntityKind::Text,
            5 => SketchEntityKind::Parabola,
            other => SketchEntityKind::Other(other),
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label.to_ascii_lowercase().as_str() {
            "line" => SketchEntityKind::Line,
            "arc" | "circle" => SketchEntityKind::Arc,
            "ellipse" => SketchEntityKind::Ellipse,
            "spline" => SketchEntityKind::Spline,
            "text" => SketchEntityKind::Text,
            "parabola" => SketchEntityKind::Parabola,
            _ => return None,
        })
    }
}

/// Dimension tolerance kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceKind {
    None,
    Basic,
    Bilateral,
    Limit,
    Symmetric,
    Min,
    Max,
    Other(i64),
}

impl ToleranceKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ToleranceKind::None,
            1 => ToleranceKind::Basic,
            2 => ToleranceKind::Bilateral,
            3 => ToleranceKind::Limit,
            4 => ToleranceKind::Symmetric,
            5 => ToleranceKind::Min,
            6 => ToleranceKind::Max,
            other => ToleranceKind::Other(other),
        }
    }
}

/// Geometric relation kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Horizontal,
    Vertical,
    Coincident,
    Tangent,
    Parallel,
    Perpendicular,
    Equal,
    Concentric,
    Collinear,
    Midpoint,
    Symmetric,
    Fixed,
    Other(String),
}

impl RelationKind {
    /// Match a vendor relation label such as `"swConstraintType_HORIZONTAL2D"`
    pub fn from_label(label: &str) -> Self {
        const NAMED: &[(&str, RelationKind)] = &[
            ("horizontal", RelationKind::Horizontal),
            ("vertical", RelationKind::Vertical),
            ("coincident", RelationKind::Coincident),
            ("tangent", RelationKind::Tangent),
            ("parallel", RelationKind::Parallel),
            ("perpendicular", RelationKind::Perpendicular),
            ("equal", RelationKind::Equal),
            ("concentric", RelationKind::Concentric),
            ("colinear", RelationKind::Collinear),
            ("collinear", RelationKind::Collinear),
            ("midpoint", RelationKind::Midpoint),
            ("symmetric", RelationKind::Symmetric),
            ("fixed", RelationKind::Fixed),
        ];
        let lowered = label.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(word, _)| lowered.contains(word))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| RelationKind::Other(label.to_string()))
    }
}

/// One sketch segment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchEntity {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SketchEntityKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<bool>,
}

/// One sketch dimension
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchDimension {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<ToleranceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driven: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

/// One geometric relation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchRelation {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RelationKind>,
    /// Ids of the participating entities
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// An entity referenced from outside the sketch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReference {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Owning feature or component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}
