//! Document assembly
//!
//! Wraps the walked feature tree with document-level context. Every
//! document-level field is read on its own; a failing accessor leaves that
//! field at its default and nothing else.

mod metadata;

pub use metadata::{
    AxisDefinition, ConfigurationInfo, ExtractionMetadata, LengthUnit, MATERIAL_PROPERTIES,
    MassUnit, MaterialInfo, PlaneDefinition, ReferenceGeometry, Statistics, Units,
};

use std::collections::BTreeMap;
use std::path::Path;

use ft_session::{CadSession, DocumentKind, FeatureRef, PropertyBag};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::ExtractConfig;
use crate::dependency::{RelationshipMap, relationship_map};
use crate::error::{ExtractError, ExtractResult};
use crate::node::FeatureNode;
use crate::probe::{floats, integer, number, optional, or_default, text};
use crate::walker::TreeWalker;

/// Whole-run output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionDocument {
    pub metadata: ExtractionMetadata,
    pub document_type: DocumentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub units: Units,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_info: Option<MaterialInfo>,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub configurations: Vec<ConfigurationInfo>,
    #[serde(default)]
    pub reference_geometry: ReferenceGeometry,
    #[serde(default)]
    pub feature_tree: Vec<FeatureNode>,
    #[serde(default)]
    pub feature_relationships: RelationshipMap,
    #[serde(default)]
    pub statistics: Statistics,
}

impl ExtractionDocument {
    /// Compare everything except the run metadata
    pub fn same_structure(&self, other: &Self) -> bool {
        self.document_type == other.document_type
            && self.title == other.title
            && self.path == other.path
            && self.units == other.units
            && self.material_info == other.material_info
            && self.custom_properties == other.custom_properties
            && self.configurations == other.configurations
            && self.reference_geometry == other.reference_geometry
            && self.feature_tree == other.feature_tree
            && self.feature_relationships == other.feature_relationships
            && self.statistics == other.statistics
    }

    /// Find a node by hierarchy path
    pub fn node_at(&self, path: &str) -> Option<&FeatureNode> {
        crate::node::walk_forest(&self.feature_tree).find(|n| n.hierarchy_path == path)
    }
}

/// Extract the session's document into an [`ExtractionDocument`]
#[instrument(skip_all)]
pub fn extract_document(
    session: &dyn CadSession,
    config: &ExtractConfig,
) -> ExtractResult<ExtractionDocument> {
    if !session.is_document_open() {
        return Err(ExtractError::NoOpenDocument);
    }

    let title = optional(session.document_title(), "document title")?;
    let properties = optional(session.document_properties(), "document properties")?;
    let path = match &properties {
        Some(bag) => text(&**bag, "PathName")?.filter(|p| !p.is_empty()),
        None => None,
    };

    let mut document_type = or_default(session.document_type(), "document type")?;
    if document_type == DocumentKind::Unknown
        && let Some(path) = &path
    {
        document_type = DocumentKind::from_path(Path::new(path));
    }

    info!(
        "Extracting {} {}",
        document_type,
        title.as_deref().unwrap_or("<untitled>")
    );

    let units = match &properties {
        Some(bag) => read_units(bag.as_ref())?,
        None => Units::default(),
    };
    let material_info = if document_type == DocumentKind::Part {
        read_material(session, properties.as_deref())?
    } else {
        None
    };
    let custom_properties = read_custom_properties(session)?;
    let configurations = if config.include_configurations {
        read_configurations(session)?
    } else {
        Vec::new()
    };
    let reference_geometry = read_reference_geometry(session)?;

    let feature_tree = TreeWalker::new(config).walk(session)?;
    let feature_relationships = relationship_map(&feature_tree);
    let statistics = Statistics::from_tree(&feature_tree);

    info!(
        "Extracted {} features ({} top level, {} failed, {} suppressed)",
        statistics.total_features,
        statistics.top_level_features,
        statistics.failed_features,
        statistics.suppressed_features
    );

    let source = path
        .clone()
        .or_else(|| title.clone())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(ExtractionDocument {
        metadata: ExtractionMetadata::new(source),
        document_type,
        title,
        path,
        units,
        material_info,
        custom_properties,
        configurations,
        reference_geometry,
        feature_tree,
        feature_relationships,
        statistics,
    })
}

fn read_units(properties: &dyn PropertyBag) -> ExtractResult<Units> {
    let length = optional(properties.get("LengthUnit"), "length unit")?;
    let mass = optional(properties.get("MassUnit"), "mass unit")?;
    Ok(Units {
        length: length.map(|v| LengthUnit::from_value(&v)).unwrap_or_default(),
        mass: mass.map(|v| MassUnit::from_value(&v)).unwrap_or_default(),
    })
}

fn read_material(
    session: &dyn CadSession,
    properties: Option<&dyn PropertyBag>,
) -> ExtractResult<Option<MaterialInfo>> {
    let mut material = MaterialInfo::default();
    if let Some(bag) = properties {
        material.name = text(bag, "MaterialName")?.filter(|n| !n.is_empty());
        material.database = text(bag, "MaterialDatabase")?.filter(|d| !d.is_empty());
    }
    if let Some(bag) = optional(session.material_properties(), "material properties")? {
        for (member, key) in MATERIAL_PROPERTIES {
            if let Some(value) = number(&*bag, member)?.filter(|v| v.is_finite()) {
                material.properties.insert(key.to_string(), value);
            }
        }
    }
    Ok((!material.is_empty()).then_some(material))
}

fn read_custom_properties(session: &dyn CadSession) -> ExtractResult<BTreeMap<String, String>> {
    let names = or_default(session.custom_property_names(), "custom property names")?;
    let mut properties = BTreeMap::new();
    for name in names {
        if let Some(value) = optional(session.custom_property(&name), "custom property")? {
            properties.insert(name, value);
        }
    }
    Ok(properties)
}

/// Top-level feature handles in native order
///
/// A broken sibling link ends the list early.
fn top_level_features(session: &dyn CadSession) -> ExtractResult<Vec<FeatureRef>> {
    let mut features = Vec::new();
    let mut cursor = optional(session.first_feature(), "first feature")?.flatten();
    while let Some(feature) = cursor {
        cursor = optional(feature.next_feature(), "next feature")?.flatten();
        features.push(feature);
    }
    Ok(features)
}

fn read_configurations(session: &dyn CadSession) -> ExtractResult<Vec<ConfigurationInfo>> {
    let Some(configurations) = optional(session.configurations(), "configurations")? else {
        return Ok(Vec::new());
    };
    let active = optional(session.active_configuration_name(), "active configuration")?;
    let features = top_level_features(session)?;

    let mut names = Vec::with_capacity(features.len());
    for feature in &features {
        names.push(optional(feature.name(), "feature name")?);
    }

    let mut infos = Vec::with_capacity(configurations.len());
    for configuration in &configurations {
        let Some(name) = optional(configuration.name(), "configuration name")? else {
            continue;
        };
        let mut suppressed = Vec::new();
        for (feature, feature_name) in features.iter().zip(&names) {
            let Some(feature_name) = feature_name else {
                continue;
            };
            // an unreadable state counts as not suppressed
            let state = optional(
                configuration.is_feature_suppressed(feature.as_ref()),
                "suppression state",
            )?;
            if state.unwrap_or(false) {
                suppressed.push(feature_name.clone());
            }
        }
        debug!("Configuration {} suppresses {} features", name, suppressed.len());
        infos.push(ConfigurationInfo {
            is_active: active.as_deref() == Some(name.as_str()),
            name,
            suppressed_feature_names: suppressed,
        });
    }
    Ok(infos)
}

fn read_reference_geometry(session: &dyn CadSession) -> ExtractResult<ReferenceGeometry> {
    let mut geometry = ReferenceGeometry::default();

    for bag in or_default(session.reference_planes(), "reference planes")? {
        let mut plane = PlaneDefinition {
            name: text(&*bag, "Name")?,
            type_code: integer(&*bag, "Type")?,
            ..Default::default()
        };
        if let Some(params) = floats(&*bag, "PlaneParams")? {
            plane.decode_params(&params);
        }
        geometry.planes.push(plane);
    }

    for bag in or_default(session.reference_axes(), "reference axes")? {
        let mut axis = AxisDefinition {
            name: text(&*bag, "Name")?,
            ..Default::default()
        };
        if let Some(params) = floats(&*bag, "AxisParams")? {
            axis.decode_params(&params);
        }
        geometry.axes.push(axis);
    }

    Ok(geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FeatureCategory;
    use approx::assert_relative_eq;
    use ft_session::{
        MemoryConfiguration, MemoryDocument, MemoryFeature, MemorySession, PropertyValue, members,
    };

    fn bracket() -> MemoryDocument {
        let mut doc = MemoryDocument::new("Bracket.SLDPRT", DocumentKind::Part)
            .with_property("PathName", PropertyValue::Text("C:/parts/Bracket.SLDPRT".into()))
            .with_property("LengthUnit", PropertyValue::Int(0))
            .with_property("MassUnit", PropertyValue::Int(1))
            .with_property("MaterialName", PropertyValue::Text("AISI 304".into()))
            .with_feature(MemoryFeature::new("Front Plane", "RefPlane"))
            .with_feature(
                MemoryFeature::new("Sketch1", "ProfileFeature").with_parents(["Front Plane"]),
            )
            .with_feature(
                MemoryFeature::new("Boss-Extrude1", "BossExtrude")
                    .with("Depth", PropertyValue::Float(0.01))
                    .with_parents(["Sketch1"]),
            )
            .with_feature(
                MemoryFeature::new("Fillet1", "Fillet")
                    .with("Radius", PropertyValue::Float(0.002))
                    .with_parents(["Boss-Extrude1"])
                    .suppressed(),
            );
        doc.material = members([
            ("Density", PropertyValue::Float(8000.0)),
            ("PoissonRatio", PropertyValue::Float(0.29)),
        ]);
        doc.custom_properties = vec![
            ("PartNo".into(), "BR-100".into()),
            ("Revision".into(), "B".into()),
        ];
        doc.configurations = vec![
            MemoryConfiguration::new("Default", Vec::<String>::new()),
            MemoryConfiguration::new("Simplified", ["Fillet1"]),
        ];
        doc.active_configuration = Some("Default".into());
        doc.reference_planes = vec![members([
            ("Name", PropertyValue::Text("Top Plane".into())),
            ("Type", PropertyValue::Int(4)),
            (
                "PlaneParams",
                PropertyValue::Floats(vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            ),
        ])];
        doc
    }

    #[test]
    fn test_full_document() {
        let session = MemorySession::new(bracket());
        let doc = extract_document(&session, &ExtractConfig::default()).unwrap();

        assert_eq!(doc.document_type, DocumentKind::Part);
        assert_eq!(doc.title.as_deref(), Some("Bracket.SLDPRT"));
        assert_eq!(doc.metadata.source, "C:/parts/Bracket.SLDPRT");
        assert_eq!(doc.units.length, LengthUnit::Millimeter);
        assert_eq!(doc.units.mass, MassUnit::Gram);

        let material = doc.material_info.as_ref().unwrap();
        assert_eq!(material.name.as_deref(), Some("AISI 304"));
        assert_relative_eq!(material.properties["density"], 8000.0);
        assert_eq!(material.properties.len(), 2);

        assert_eq!(doc.custom_properties["PartNo"], "BR-100");
        assert_eq!(doc.configurations.len(), 2);
        assert!(doc.configurations[0].is_active);
        assert_eq!(doc.configurations[1].suppressed_feature_names, vec!["Fillet1"]);
        let plane = &doc.reference_geometry.planes[0];
        assert_eq!(plane.normal, Some(glam::DVec3::Y));
        assert_eq!(plane.type_code, Some(4));

        assert_eq!(doc.feature_tree.len(), 4);
        assert_eq!(doc.feature_relationships.len(), 3);
        assert_eq!(doc.statistics.suppressed_features, 1);
        assert_eq!(doc.statistics.sketch_count, 1);
        assert_eq!(doc.statistics.by_category["extrude"], 1);
        assert_eq!(doc.node_at("4").unwrap().category, FeatureCategory::Fillet);
    }

    #[test]
    fn test_relationship_keys_are_nodes() {
        let session = MemorySession::new(bracket());
        let doc = extract_document(&session, &ExtractConfig::default()).unwrap();
        let names: Vec<_> = crate::node::walk_forest(&doc.feature_tree)
            .map(|n| n.name.clone())
            .collect();
        assert!(doc.feature_relationships.keys().all(|k| names.contains(k)));
        assert_eq!(doc.feature_relationships["Boss-Extrude1"], vec!["Sketch1"]);
    }

    #[test]
    fn test_idempotent_runs() {
        let session = MemorySession::new(bracket());
        let config = ExtractConfig::default();
        let first = extract_document(&session, &config).unwrap();
        let second = extract_document(&session, &config).unwrap();

        assert!(first.same_structure(&second));
        assert_ne!(first.metadata.run_id, second.metadata.run_id);
    }

    #[test]
    fn test_no_open_document() {
        let session = MemorySession::detached();
        assert_eq!(
            extract_document(&session, &ExtractConfig::default()).unwrap_err(),
            ExtractError::NoOpenDocument
        );
    }

    #[test]
    fn test_empty_document() {
        let session = MemorySession::new(MemoryDocument::new("Empty", DocumentKind::Part));
        let doc = extract_document(&session, &ExtractConfig::default()).unwrap();

        assert!(doc.feature_tree.is_empty());
        assert!(doc.feature_relationships.is_empty());
        assert_eq!(doc.statistics, Statistics::default());
        assert_eq!(doc.metadata.source, "Empty");
        assert!(!doc.metadata.extractor_version.is_empty());
        assert!(doc.material_info.is_none());
    }

    #[test]
    fn test_failing_fields_are_isolated() {
        let doc = bracket()
            .failing("Title")
            .failing("MassUnit")
            .failing("CustomProperty:Revision")
            .failing("Configurations");
        let session = MemorySession::new(doc);
        let doc = extract_document(&session, &ExtractConfig::default()).unwrap();

        assert!(doc.title.is_none());
        assert_eq!(doc.units.mass, MassUnit::Unknown);
        assert_eq!(doc.units.length, LengthUnit::Millimeter);
        assert_eq!(doc.custom_properties.len(), 1);
        assert!(doc.configurations.is_empty());
        assert_eq!(doc.feature_tree.len(), 4);
    }

    #[test]
    fn test_kind_inferred_from_path() {
        let doc = MemoryDocument::new("Robot", DocumentKind::Unknown)
            .with_property("PathName", PropertyValue::Text("/cad/Robot.SLDASM".into()));
        let session = MemorySession::new(doc);
        let doc = extract_document(&session, &ExtractConfig::default()).unwrap();
        assert_eq!(doc.document_type, DocumentKind::Assembly);
        assert!(doc.material_info.is_none());
    }

    #[test]
    fn test_plane_type_code() {
        let mut doc = MemoryDocument::new("Planes", DocumentKind::Part);
        doc.reference_planes = vec![
            members([
                ("Name", PropertyValue::Text("Offset Plane".into())),
                ("Type", PropertyValue::Int(2)),
            ]),
            members([("Name", PropertyValue::Text("Bare Plane".into()))]),
        ];
        let doc = extract_document(&MemorySession::new(doc), &ExtractConfig::default()).unwrap();
        let planes = &doc.reference_geometry.planes;
        assert_eq!(planes[0].type_code, Some(2));
        assert!(planes[1].type_code.is_none());

        let json = serde_json::to_value(&planes[0]).unwrap();
        assert_eq!(json["typeCode"], 2);
        assert!(serde_json::to_value(&planes[1]).unwrap().get("typeCode").is_none());
    }

    #[test]
    fn test_configurations_disabled() {
        let config = ExtractConfig {
            include_configurations: false,
            ..Default::default()
        };
        let session = MemorySession::new(bracket());
        let doc = extract_document(&session, &config).unwrap();
        assert!(doc.configurations.is_empty());
    }
}
