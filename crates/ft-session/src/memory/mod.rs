//! In-memory session
//!
//! Replays a recorded document snapshot through the session traits. Snapshots
//! are plain serde data (RON or JSON), so a captured document can be extracted
//! offline, and tests can inject faults member by member.

mod handles;

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::traits::{
    AccessError, AccessResult, CadApplication, CadSession, ConfigurationHandle, DocumentKind,
    FeatureRef, PropertyBag, PropertyValue,
};

use handles::{Arena, MemoryBag, MemoryConfigurationRef, MemoryFeatureRef};

/// Member-name → value table of one vendor object
pub type Members = BTreeMap<String, PropertyValue>;

/// A recorded document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryDocument {
    pub title: String,
    pub kind: DocumentKind,
    /// Document-level members (`PathName`, `LengthUnit`, `MassUnit`, `MaterialName`, ...)
    pub properties: Members,
    /// Custom properties as (name, resolved value), in native order
    pub custom_properties: Vec<(String, String)>,
    /// Material physical properties
    pub material: Members,
    pub configurations: Vec<MemoryConfiguration>,
    pub active_configuration: Option<String>,
    pub reference_planes: Vec<Members>,
    pub reference_axes: Vec<Members>,
    /// Top-level features in native order
    pub features: Vec<MemoryFeature>,
    /// Document-level members that raise when read
    pub failing: Vec<String>,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new(title: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            title: title.into(),
            kind,
            ..Self::default()
        }
    }

    /// Append a top-level feature
    pub fn with_feature(mut self, feature: MemoryFeature) -> Self {
        self.features.push(feature);
        self
    }

    /// Set a document-level member
    pub fn with_property(mut self, member: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(member.into(), value);
        self
    }

    /// Mark a document-level member as raising
    pub fn failing(mut self, member: impl Into<String>) -> Self {
        self.failing.push(member.into());
        self
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, SnapshotError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SnapshotError::Serialize(e.to_string()))
    }

    /// Save as RON, or JSON when the path ends in `.json`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialize(e.to_string()))?
        } else {
            self.to_ron_string()?
        };
        std::fs::write(path, content).map_err(|e| SnapshotError::Io(e.to_string()))
    }

    /// Load a RON or JSON snapshot (chosen by extension)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io(e.to_string()))?;
        if is_json(path) {
            serde_json::from_str(&content).map_err(|e| SnapshotError::Deserialize(e.to_string()))
        } else {
            ron::from_str(&content).map_err(|e| SnapshotError::Deserialize(e.to_string()))
        }
    }

    fn check(&self, member: &str) -> AccessResult<()> {
        if self.failing.iter().any(|m| m == member) {
            return Err(AccessError::failed(member, "injected fault"));
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// A recorded feature and its sub-feature chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryFeature {
    pub name: String,
    pub type_name: String,
    pub suppressed: bool,
    /// Names of declared parent features
    pub parents: Vec<String>,
    /// Members of the category-specific definition object
    pub data: Members,
    /// Driving parameters, one member table each
    pub parameters: Vec<Members>,
    pub sketch: Option<MemorySketch>,
    pub sub_features: Vec<MemoryFeature>,
    /// Object collections of the definition (`Selections`, `Edges`, ...)
    pub collections: BTreeMap<String, Vec<MemoryRecord>>,
    /// Recorded dependent count, when the vendor reports one
    pub dependent_count: Option<usize>,
    /// Members that raise when read (`Name`, `TypeName`, `Depth`, ...)
    pub failing: Vec<String>,
    /// Every content accessor raises
    pub corrupt: bool,
    /// Any accessor reports the session as lost
    pub disconnect: bool,
}

impl MemoryFeature {
    /// Create a feature with the given name and vendor type
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Set a definition member
    pub fn with(mut self, member: impl Into<String>, value: PropertyValue) -> Self {
        self.data.insert(member.into(), value);
        self
    }

    /// Set the declared parents
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Append a driving parameter
    pub fn with_parameter(mut self, parameter: Members) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Attach a sketch
    pub fn with_sketch(mut self, sketch: MemorySketch) -> Self {
        self.sketch = Some(sketch);
        self
    }

    /// Append an object to a definition collection
    pub fn with_item(mut self, collection: impl Into<String>, item: impl Into<MemoryRecord>) -> Self {
        self.collections
            .entry(collection.into())
            .or_default()
            .push(item.into());
        self
    }

    /// Record the vendor-reported dependent count
    pub fn with_dependent_count(mut self, count: usize) -> Self {
        self.dependent_count = Some(count);
        self
    }

    /// Append a sub-feature
    pub fn with_sub_feature(mut self, feature: MemoryFeature) -> Self {
        self.sub_features.push(feature);
        self
    }

    /// Mark the feature suppressed
    pub fn suppressed(mut self) -> Self {
        self.suppressed = true;
        self
    }

    /// Mark a member as raising
    pub fn failing(mut self, member: impl Into<String>) -> Self {
        self.failing.push(member.into());
        self
    }

    /// Make every content accessor raise
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }
}

/// A recorded sketch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySketch {
    /// Sketch-level members (`PlaneName`, `ModelToSketchTransform`, ...)
    pub properties: Members,
    pub segments: Vec<MemoryRecord>,
    pub dimensions: Vec<MemoryRecord>,
    pub relations: Vec<MemoryRecord>,
    pub external_entities: Vec<MemoryRecord>,
    /// Members or collections (`Segments`, `Dimensions`, ...) that raise
    pub failing: Vec<String>,
}

impl MemorySketch {
    /// Set a sketch-level member
    pub fn with(mut self, member: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(member.into(), value);
        self
    }

    /// Append a segment
    pub fn with_segment(mut self, segment: impl Into<MemoryRecord>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a dimension
    pub fn with_dimension(mut self, dimension: impl Into<MemoryRecord>) -> Self {
        self.dimensions.push(dimension.into());
        self
    }

    /// Append a relation
    pub fn with_relation(mut self, relation: impl Into<MemoryRecord>) -> Self {
        self.relations.push(relation.into());
        self
    }

    /// Append an external reference
    pub fn with_external(mut self, entity: impl Into<MemoryRecord>) -> Self {
        self.external_entities.push(entity.into());
        self
    }
}

/// One recorded vendor object inside a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRecord {
    pub members: Members,
    /// Members of this object that raise when read
    pub failing: Vec<String>,
}

impl MemoryRecord {
    /// Mark a member of this object as raising
    pub fn failing(mut self, member: impl Into<String>) -> Self {
        self.failing.push(member.into());
        self
    }
}

impl From<Members> for MemoryRecord {
    fn from(members: Members) -> Self {
        Self {
            members,
            failing: Vec::new(),
        }
    }
}

/// A recorded configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfiguration {
    pub name: String,
    /// Names of features suppressed in this configuration
    pub suppressed: Vec<String>,
    /// Members that raise (`Name`, `SuppressionState`)
    pub failing: Vec<String>,
}

impl MemoryConfiguration {
    /// Create a configuration with the given suppressed feature names
    pub fn new<I, S>(name: impl Into<String>, suppressed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            suppressed: suppressed.into_iter().map(Into::into).collect(),
            failing: Vec::new(),
        }
    }
}

/// Build a member table from pairs
pub fn members<I, S>(pairs: I) -> Members
where
    I: IntoIterator<Item = (S, PropertyValue)>,
    S: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// A session over a recorded document
#[derive(Clone)]
pub struct MemorySession {
    arena: Rc<Arena>,
    open: bool,
}

impl MemorySession {
    /// Attach to a recorded document
    pub fn new(document: MemoryDocument) -> Self {
        Self {
            arena: Rc::new(Arena::build(document)),
            open: true,
        }
    }

    /// A session with no document attached
    pub fn detached() -> Self {
        Self {
            arena: Rc::new(Arena::build(MemoryDocument::default())),
            open: false,
        }
    }

    /// Load a snapshot file and attach to it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Ok(Self::new(MemoryDocument::load(path)?))
    }

    /// Parse a RON snapshot and attach to it
    pub fn from_ron_str(content: &str) -> Result<Self, SnapshotError> {
        let document: MemoryDocument =
            ron::from_str(content).map_err(|e| SnapshotError::Deserialize(e.to_string()))?;
        Ok(Self::new(document))
    }

    /// The recorded document (features are held in the navigation arena)
    pub fn document(&self) -> &MemoryDocument {
        &self.arena.document
    }

    fn check(&self, member: &str) -> AccessResult<()> {
        if !self.open {
            return Err(AccessError::Disconnected("no document attached".into()));
        }
        self.arena.document.check(member)
    }
}

impl CadSession for MemorySession {
    fn is_document_open(&self) -> bool {
        self.open
    }

    fn document_type(&self) -> AccessResult<DocumentKind> {
        self.check("DocumentType")?;
        Ok(self.arena.document.kind)
    }

    fn document_title(&self) -> AccessResult<String> {
        self.check("Title")?;
        Ok(self.arena.document.title.clone())
    }

    fn first_feature(&self) -> AccessResult<Option<FeatureRef>> {
        self.check("FirstFeature")?;
        Ok(self
            .arena
            .head
            .map(|index| MemoryFeatureRef::boxed(&self.arena, index)))
    }

    fn document_properties(&self) -> AccessResult<Box<dyn PropertyBag>> {
        self.check("DocumentProperties")?;
        let doc = &self.arena.document;
        Ok(Box::new(MemoryBag::new(&doc.properties, &doc.failing)))
    }

    fn custom_property_names(&self) -> AccessResult<Vec<String>> {
        self.check("CustomPropertyNames")?;
        Ok(self
            .arena
            .document
            .custom_properties
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn custom_property(&self, name: &str) -> AccessResult<String> {
        self.check("CustomProperty")?;
        self.check(&format!("CustomProperty:{name}"))?;
        self.arena
            .document
            .custom_properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| AccessError::failed("CustomProperty", format!("no property {name}")))
    }

    fn material_properties(&self) -> AccessResult<Box<dyn PropertyBag>> {
        self.check("MaterialProperties")?;
        let doc = &self.arena.document;
        if doc.material.is_empty() {
            return Err(AccessError::unsupported("GetMaterialPropertyExtension"));
        }
        Ok(Box::new(MemoryBag::new(&doc.material, &doc.failing)))
    }

    fn configurations(&self) -> AccessResult<Vec<Box<dyn ConfigurationHandle>>> {
        self.check("Configurations")?;
        Ok(self
            .arena
            .document
            .configurations
            .iter()
            .map(|c| Box::new(MemoryConfigurationRef::new(c.clone())) as Box<dyn ConfigurationHandle>)
            .collect())
    }

    fn active_configuration_name(&self) -> AccessResult<String> {
        self.check("ActiveConfiguration")?;
        self.arena
            .document
            .active_configuration
            .clone()
            .ok_or_else(|| AccessError::unsupported("ActiveConfiguration"))
    }

    fn reference_planes(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.check("ReferencePlanes")?;
        Ok(bags(&self.arena.document.reference_planes, &[]))
    }

    fn reference_axes(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.check("ReferenceAxes")?;
        Ok(bags(&self.arena.document.reference_axes, &[]))
    }
}

pub(crate) fn bags(tables: &[Members], failing: &[String]) -> Vec<Box<dyn PropertyBag>> {
    tables
        .iter()
        .map(|t| Box::new(MemoryBag::new(t, failing)) as Box<dyn PropertyBag>)
        .collect()
}

pub(crate) fn record_bags(records: &[MemoryRecord]) -> Vec<Box<dyn PropertyBag>> {
    records
        .iter()
        .map(|r| Box::new(MemoryBag::new(&r.members, &r.failing)) as Box<dyn PropertyBag>)
        .collect()
}

/// An application that serves recorded documents
#[derive(Default)]
pub struct MemoryApplication {
    active: Option<MemoryDocument>,
}

impl MemoryApplication {
    /// Application with no active document
    pub fn new() -> Self {
        Self::default()
    }

    /// Application with the given document active
    pub fn with_active(document: MemoryDocument) -> Self {
        Self {
            active: Some(document),
        }
    }
}

impl CadApplication for MemoryApplication {
    fn name(&self) -> &str {
        "memory"
    }

    fn active_document(&self) -> AccessResult<Box<dyn CadSession>> {
        Ok(match &self.active {
            Some(doc) => Box::new(MemorySession::new(doc.clone())),
            None => Box::new(MemorySession::detached()),
        })
    }

    fn open_document(&self, path: &Path) -> AccessResult<Box<dyn CadSession>> {
        if !path.exists() {
            return Err(AccessError::failed(
                "OpenDocument",
                format!("file not found: {}", path.display()),
            ));
        }
        let document =
            MemoryDocument::load(path).map_err(|e| AccessError::failed("OpenDocument", e.to_string()))?;
        tracing::debug!(
            "Opened snapshot {} ({} top-level features)",
            path.display(),
            document.features.len()
        );
        Ok(Box::new(MemorySession::new(document)))
    }
}

/// Snapshot file errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
