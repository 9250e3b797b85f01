//! Feature references
//!
//! What a feature was built from beyond its parent list: the entities selected
//! when it was created, the planes it references, the geometric constraints on
//! its definition and, for fillets, the edges it rounds. Also carries the
//! vendor's dependent and child counts.

use ft_session::{FeatureHandle, PropertyBag};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::FeatureCategory;
use crate::error::ExtractResult;
use crate::probe::{integer, number, optional, or_default, text};

/// Selection type codes
const SELECTION_EDGE: i64 = 1;
const SELECTION_FACE: i64 = 2;
const SELECTION_VERTEX: i64 = 3;
const SELECTION_BODY: i64 = 6;
const SELECTION_SKETCH: i64 = 7;

/// Entities selected when the feature was created, by entity type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSet {
    pub faces: Vec<String>,
    pub edges: Vec<String>,
    pub vertices: Vec<String>,
    pub sketches: Vec<String>,
    pub bodies: Vec<String>,
}

impl SelectionSet {
    /// File a selection under its type code; unknown codes are dropped
    pub fn add(&mut self, code: i64, name: String) -> bool {
        let list = match code {
            SELECTION_EDGE => &mut self.edges,
            SELECTION_FACE => &mut self.faces,
            SELECTION_VERTEX => &mut self.vertices,
            SELECTION_BODY => &mut self.bodies,
            SELECTION_SKETCH => &mut self.sketches,
            _ => return false,
        };
        list.push(name);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
            && self.edges.is_empty()
            && self.vertices.is_empty()
            && self.sketches.is_empty()
            && self.bodies.is_empty()
    }
}

/// Geometric constraint held by a feature definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometricConstraint {
    /// Position in the native constraint list
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

/// One edge rounded by a fillet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilletEdge {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<i64>,
    /// Per-edge radius in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Reference record of one node
///
/// Counts are only recorded when positive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureReferences {
    #[serde(default)]
    pub selections: SelectionSet,
    /// Sketch plane first, then planes named by the definition's direction
    #[serde(default)]
    pub reference_planes: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<GeometricConstraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fillet_edges: Vec<FilletEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_count: Option<usize>,
}

impl FeatureReferences {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Extract a feature's references; `None` when the feature reports none
pub fn extract_references(
    feature: &dyn FeatureHandle,
    category: FeatureCategory,
) -> ExtractResult<Option<FeatureReferences>> {
    let mut references = FeatureReferences {
        reference_planes: sketch_plane(feature)?.into_iter().collect(),
        dependent_count: optional(feature.dependent_count(), "dependent count")?.filter(|&n| n > 0),
        children_count: optional(feature.children_count(), "children count")?.filter(|&n| n > 0),
        ..Default::default()
    };

    if let Some(data) = optional(feature.specific_feature_data(), "feature definition")? {
        for selection in or_default(data.items("Selections"), "selections")? {
            let (Some(code), Some(name)) = (integer(&*selection, "Type")?, text(&*selection, "Name")?)
            else {
                continue;
            };
            if !references.selections.add(code, name) {
                debug!("Ignoring selection of type {}", code);
            }
        }

        for direction in or_default(data.items("Direction"), "direction reference")? {
            if let Some(name) = text(&*direction, "Name")? {
                references.reference_planes.push(name);
            }
        }

        let constraints = or_default(data.items("Constraints"), "constraints")?;
        references.constraints = constraints
            .iter()
            .enumerate()
            .map(|(index, bag)| read_constraint(index, &**bag))
            .collect::<ExtractResult<_>>()?;

        if category == FeatureCategory::Fillet {
            let edges = or_default(data.items("Edges"), "fillet edges")?;
            references.fillet_edges = edges
                .iter()
                .enumerate()
                .map(|(index, bag)| read_edge(index, &**bag))
                .collect::<ExtractResult<_>>()?;
        }
    }

    Ok((!references.is_empty()).then_some(references))
}

fn sketch_plane(feature: &dyn FeatureHandle) -> ExtractResult<Option<String>> {
    match optional(feature.sketch(), "sketch")?.flatten() {
        Some(sketch) => text(&*sketch, "PlaneName"),
        None => Ok(None),
    }
}

fn read_constraint(index: usize, bag: &dyn PropertyBag) -> ExtractResult<GeometricConstraint> {
    let entities = optional(bag.get("Entities"), "constraint entities")?
        .and_then(|v| v.as_texts().map(<[String]>::to_vec))
        .unwrap_or_default();
    Ok(GeometricConstraint {
        index,
        kind: text(bag, "Type")?,
        name: text(bag, "Name")?,
        entities,
    })
}

fn read_edge(index: usize, bag: &dyn PropertyBag) -> ExtractResult<FilletEdge> {
    Ok(FilletEdge {
        index,
        id: integer(bag, "Id")?,
        edge_type: integer(bag, "Type")?,
        radius: number(bag, "Radius")?.filter(|r| r.is_finite()),
    })
}
