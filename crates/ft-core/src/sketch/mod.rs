//! Sketch sub-extraction
//!
//! Walks a sketch's plane, segments, dimensions, relations and external
//! references into a [`SketchDetail`]. Records keep their native index even
//! when only some of their fields could be read.

mod records;

pub use records::{
    ExternalReference, RelationKind, SketchDimension, SketchEntity, SketchEntityKind,
    SketchPlane, SketchRelation, SketchTransform, ToleranceKind,
};

use ft_session::{FeatureHandle, PropertyBag, PropertyValue, SketchHandle};
use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::ExtractResult;
use crate::probe::{first_member, flag, floats, integer, number, optional, or_default, text};

/// Constrained-status code reported for a fully defined sketch
const FULLY_CONSTRAINED: i64 = 3;

/// Nested record describing one sketch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane: Option<SketchPlane>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_defined: Option<bool>,
    #[serde(default)]
    pub entities: Vec<SketchEntity>,
    #[serde(default)]
    pub dimensions: Vec<SketchDimension>,
    #[serde(default)]
    pub relations: Vec<SketchRelation>,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
}

/// Extract the sketch a feature is or embeds
pub fn extract_sketch(feature: &dyn FeatureHandle) -> ExtractResult<Option<SketchDetail>> {
    match optional(feature.sketch(), "sketch")?.flatten() {
        Some(sketch) => Ok(Some(read_sketch(sketch.as_ref())?)),
        None => Ok(None),
    }
}

/// Read every part of a sketch handle
pub fn read_sketch(sketch: &dyn SketchHandle) -> ExtractResult<SketchDetail> {
    let entities = or_default(sketch.segments(), "sketch segments")?;
    let dimensions = or_default(sketch.dimensions(), "sketch dimensions")?;
    let relations = or_default(sketch.relations(), "sketch relations")?;
    let externals = or_default(sketch.external_entities(), "external references")?;

    Ok(SketchDetail {
        plane: read_plane(sketch)?,
        fully_defined: read_fully_defined(sketch)?,
        entities: collect(&entities, read_entity)?,
        dimensions: collect(&dimensions, read_dimension)?,
        relations: collect(&relations, read_relation)?,
        external_references: collect(&externals, read_external)?,
    })
}

fn collect<T>(
    bags: &[Box<dyn PropertyBag>],
    read: fn(usize, &dyn PropertyBag) -> ExtractResult<T>,
) -> ExtractResult<Vec<T>> {
    bags.iter()
        .enumerate()
        .map(|(index, bag)| read(index, bag.as_ref()))
        .collect()
}

fn read_plane(sketch: &dyn SketchHandle) -> ExtractResult<Option<SketchPlane>> {
    let plane = SketchPlane {
        name: text(sketch, "PlaneName")?,
        type_code: integer(sketch, "PlaneType")?,
        origin: point(sketch, "PlaneOrigin")?,
        transform: floats(sketch, "ModelToSketchTransform")?
            .and_then(|data| SketchTransform::from_array(&data)),
    };
    Ok((plane != SketchPlane::default()).then_some(plane))
}

fn read_fully_defined(sketch: &dyn SketchHandle) -> ExtractResult<Option<bool>> {
    if let Some(value) = flag(sketch, "FullyDefined")? {
        return Ok(Some(value));
    }
    Ok(integer(sketch, "ConstrainedStatus")?.map(|code| code == FULLY_CONSTRAINED))
}

fn point<B: PropertyBag + ?Sized>(bag: &B, member: &str) -> ExtractResult<Option<DVec3>> {
    Ok(floats(bag, member)?
        .filter(|v| v.len() >= 3 && v[..3].iter().all(|x| x.is_finite()))
        .map(|v| DVec3::new(v[0], v[1], v[2])))
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn read_entity(index: usize, bag: &dyn PropertyBag) -> ExtractResult<SketchEntity> {
    let kind = first_member(bag, &["Type", "SegmentType"])?.and_then(|v| match v {
        PropertyValue::Text(label) => SketchEntityKind::from_label(&label),
        other => other.as_i64().map(SketchEntityKind::from_code),
    });
    Ok(SketchEntity {
        index,
        id: text(bag, "Id")?,
        kind,
        start: point(bag, "StartPoint")?,
        end: point(bag, "EndPoint")?,
        center: point(bag, "CenterPoint")?,
        radius: finite(number(bag, "Radius")?),
        length: finite(number(bag, "Length")?),
        construction: flag(bag, "ConstructionGeometry")?,
    })
}

fn read_dimension(index: usize, bag: &dyn PropertyBag) -> ExtractResult<SketchDimension> {
    let name = match first_member(bag, &["FullName", "Name"])? {
        Some(PropertyValue::Text(name)) => Some(name),
        _ => None,
    };
    let value = first_member(bag, &["SystemValue", "Value"])?.and_then(|v| v.as_f64());
    Ok(SketchDimension {
        index,
        name,
        value: finite(value),
        tolerance: integer(bag, "ToleranceType")?.map(ToleranceKind::from_code),
        driven: flag(bag, "Driven")?,
        display_text: text(bag, "Text")?,
    })
}

fn read_relation(index: usize, bag: &dyn PropertyBag) -> ExtractResult<SketchRelation> {
    let kind = optional(bag.get("Type"), "relation type")?.map(|v| match v {
        PropertyValue::Text(label) => RelationKind::from_label(&label),
        PropertyValue::Int(code) => RelationKind::Other(code.to_string()),
        other => RelationKind::Other(other.type_name().to_string()),
    });
    let entities = optional(bag.get("Entities"), "relation entities")?
        .and_then(|v| v.as_texts().map(<[String]>::to_vec))
        .unwrap_or_default();
    Ok(SketchRelation {
        index,
        kind,
        entities,
        status: text(bag, "Status")?,
    })
}

fn read_external(index: usize, bag: &dyn PropertyBag) -> ExtractResult<ExternalReference> {
    Ok(ExternalReference {
        index,
        name: text(bag, "Name")?,
        kind: text(bag, "Type")?,
        owner: text(bag, "Owner")?,
    })
}
