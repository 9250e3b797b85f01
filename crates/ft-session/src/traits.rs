//! Session handle trait definitions
//!
//! These traits describe the read-only surface of an open CAD document that the
//! extraction pipeline walks. Vendor object models expose different members per
//! feature subtype and version, so every accessor is fallible.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for session accessor calls
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    /// The member does not exist on this object's concrete subtype or version
    #[error("Member not supported: {0}")]
    Unsupported(String),

    /// The member exists but the call raised
    #[error("Accessor {member} failed: {message}")]
    Failed { member: String, message: String },

    /// The session is gone; nothing further can be read through it
    #[error("Session disconnected: {0}")]
    Disconnected(String),
}

impl AccessError {
    /// Create an unsupported-member error
    pub fn unsupported(member: impl Into<String>) -> Self {
        AccessError::Unsupported(member.into())
    }

    /// Create a failed-call error
    pub fn failed(member: impl Into<String>, message: impl Into<String>) -> Self {
        AccessError::Failed {
            member: member.into(),
            message: message.into(),
        }
    }

    /// Check whether the member is simply absent on this object
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AccessError::Unsupported(_))
    }

    /// Check whether the session itself was lost
    pub fn is_disconnected(&self) -> bool {
        matches!(self, AccessError::Disconnected(_))
    }
}

/// Result type for session accessor calls
pub type AccessResult<T> = Result<T, AccessError>;

/// Kind of document held by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Part,
    Assembly,
    Drawing,
    #[default]
    Unknown,
}

impl DocumentKind {
    /// Map a vendor document type code (1 = part, 2 = assembly, 3 = drawing)
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DocumentKind::Part,
            2 => DocumentKind::Assembly,
            3 => DocumentKind::Drawing,
            _ => DocumentKind::Unknown,
        }
    }

    /// Infer the document kind from a file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("sldprt") | Some("prt") => DocumentKind::Part,
            Some("sldasm") | Some("asm") => DocumentKind::Assembly,
            Some("slddrw") | Some("drw") => DocumentKind::Drawing,
            _ => DocumentKind::Unknown,
        }
    }

    /// Lowercase label
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Part => "part",
            DocumentKind::Assembly => "assembly",
            DocumentKind::Drawing => "drawing",
            DocumentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A value read from a vendor object member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Floats(Vec<f64>),
    Texts(Vec<String>),
    /// A native object reference; carries the interface name only
    Object(String),
}

impl PropertyValue {
    /// Numeric view (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Integer view (floats with no fractional part are accepted)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Boolean view (0/1 integers are accepted, as COM variants often report them)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            PropertyValue::Int(0) => Some(false),
            PropertyValue::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric array view
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Text array view
    pub fn as_texts(&self) -> Option<&[String]> {
        match self {
            PropertyValue::Texts(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::Floats(_) => "floats",
            PropertyValue::Texts(_) => "texts",
            PropertyValue::Object(_) => "object",
        }
    }
}

/// Named-member access on an opaque vendor object
pub trait PropertyBag {
    /// Read a member by its vendor name
    fn get(&self, member: &str) -> AccessResult<PropertyValue>;

    /// Objects held by an object-valued or collection member
    fn items(&self, member: &str) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        Err(AccessError::unsupported(member))
    }
}

/// Owned handle to a feature in the session's feature graph
pub type FeatureRef = Box<dyn FeatureHandle>;

/// One node of the vendor feature graph
///
/// Sibling and sub-feature navigation mirrors the vendor API: a feature knows
/// its next sibling and the head of its own sub-feature chain.
pub trait FeatureHandle {
    /// Feature name (unique among siblings only)
    fn name(&self) -> AccessResult<String>;

    /// Literal vendor type name, e.g. `"RefPlane"`
    fn raw_type_name(&self) -> AccessResult<String>;

    /// Suppression state in the active configuration
    fn is_suppressed(&self) -> AccessResult<bool>;

    /// Next feature at the top level
    fn next_feature(&self) -> AccessResult<Option<FeatureRef>>;

    /// Head of this feature's sub-feature chain
    fn first_sub_feature(&self) -> AccessResult<Option<FeatureRef>>;

    /// Next feature within the enclosing sub-feature chain
    fn next_sub_feature(&self) -> AccessResult<Option<FeatureRef>>;

    /// Declared upstream dependencies
    fn parents(&self) -> AccessResult<Vec<FeatureRef>>;

    /// Category-specific definition object
    fn specific_feature_data(&self) -> AccessResult<Box<dyn PropertyBag>>;

    /// Driving parameters (dimensions) owned by the feature
    fn parameters(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        Err(AccessError::unsupported("Parameters"))
    }

    /// The sketch this feature is or embeds, if any
    fn sketch(&self) -> AccessResult<Option<Box<dyn SketchHandle>>> {
        Err(AccessError::unsupported("GetSketch"))
    }

    /// Number of features that depend on this one
    fn dependent_count(&self) -> AccessResult<usize> {
        Err(AccessError::unsupported("GetDependentCount"))
    }

    /// Number of child features
    fn children_count(&self) -> AccessResult<usize> {
        Err(AccessError::unsupported("GetChildrenCount"))
    }
}

/// A 2D sketch: plane members on the bag itself, plus its collections
pub trait SketchHandle: PropertyBag {
    /// Geometric segments in native order
    fn segments(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>>;

    /// Dimensions in native order
    fn dimensions(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>>;

    /// Geometric relations in native order
    fn relations(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>>;

    /// Entities referenced from outside the sketch
    fn external_entities(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        Err(AccessError::unsupported("GetExternalSketchEntities"))
    }
}

/// A named configuration of the document
pub trait ConfigurationHandle {
    /// Configuration name
    fn name(&self) -> AccessResult<String>;

    /// Whether `feature` is suppressed in this configuration
    fn is_feature_suppressed(&self, feature: &dyn FeatureHandle) -> AccessResult<bool>;
}

/// An open document in a CAD session
///
/// Callers must hold exclusive read access for the duration of one
/// extraction; the feature graph is assumed not to change underneath it.
pub trait CadSession {
    /// Whether a document is attached at all
    fn is_document_open(&self) -> bool;

    /// Kind of the attached document
    fn document_type(&self) -> AccessResult<DocumentKind>;

    /// Document title
    fn document_title(&self) -> AccessResult<String>;

    /// First top-level feature
    fn first_feature(&self) -> AccessResult<Option<FeatureRef>>;

    /// Document-level members (`PathName`, `LengthUnit`, `MassUnit`, `MaterialName`, ...)
    fn document_properties(&self) -> AccessResult<Box<dyn PropertyBag>>;

    /// Names of the document's custom properties
    fn custom_property_names(&self) -> AccessResult<Vec<String>>;

    /// Resolved value of one custom property
    fn custom_property(&self, name: &str) -> AccessResult<String>;

    /// Physical properties of the assigned material
    fn material_properties(&self) -> AccessResult<Box<dyn PropertyBag>>;

    /// All configurations in native order
    fn configurations(&self) -> AccessResult<Vec<Box<dyn ConfigurationHandle>>>;

    /// Name of the active configuration
    fn active_configuration_name(&self) -> AccessResult<String>;

    /// Reference planes independent of the feature tree
    fn reference_planes(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>>;

    /// Reference axes independent of the feature tree
    fn reference_axes(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        Err(AccessError::unsupported("GetRefAxes"))
    }
}

/// The owning CAD application: hands out document sessions
pub trait CadApplication {
    /// Application name
    fn name(&self) -> &str;

    /// The currently active document
    fn active_document(&self) -> AccessResult<Box<dyn CadSession>>;

    /// Open a document from disk
    fn open_document(&self, path: &Path) -> AccessResult<Box<dyn CadSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_from_code() {
        assert_eq!(DocumentKind::from_code(1), DocumentKind::Part);
        assert_eq!(DocumentKind::from_code(2), DocumentKind::Assembly);
        assert_eq!(DocumentKind::from_code(3), DocumentKind::Drawing);
        assert_eq!(DocumentKind::from_code(42), DocumentKind::Unknown);
    }

    #[test]
    fn test_document_kind_from_path() {
        assert_eq!(
            DocumentKind::from_path(Path::new("bracket.SLDPRT")),
            DocumentKind::Part
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("robot.sldasm")),
            DocumentKind::Assembly
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.txt")),
            DocumentKind::Unknown
        );
    }

    #[test]
    fn test_property_value_views() {
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(PropertyValue::Float(4.5).as_i64(), None);
        assert_eq!(PropertyValue::Int(1).as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(2).as_bool(), None);
        assert_eq!(PropertyValue::Text("x".into()).as_f64(), None);
        assert_eq!(PropertyValue::Object("IFace2".into()).type_name(), "object");
    }

    #[test]
    fn test_access_error_classes() {
        assert!(AccessError::unsupported("Depth").is_unsupported());
        assert!(!AccessError::failed("Depth", "boom").is_unsupported());
        assert!(AccessError::Disconnected("gone".into()).is_disconnected());
    }
}
