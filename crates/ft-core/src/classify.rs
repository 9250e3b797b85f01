//! Feature type classification
//!
//! Maps a vendor's literal type name onto a closed set of semantic categories.

use serde::{Deserialize, Serialize};

/// Semantic category of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Sketch,
    Extrude,
    Cut,
    Revolve,
    Fillet,
    Chamfer,
    Hole,
    Pattern,
    Mirror,
    Shell,
    Draft,
    Rib,
    Loft,
    Sweep,
    ReferencePlane,
    Axis,
    Mate,
    Generic,
}

impl FeatureCategory {
    /// All categories, in classification priority order
    pub const ALL: [FeatureCategory; 18] = [
        FeatureCategory::Sketch,
        FeatureCategory::Extrude,
        FeatureCategory::Cut,
        FeatureCategory::Revolve,
        FeatureCategory::Fillet,
        FeatureCategory::Chamfer,
        FeatureCategory::Hole,
        FeatureCategory::Pattern,
        FeatureCategory::Mirror,
        FeatureCategory::Shell,
        FeatureCategory::Draft,
        FeatureCategory::Rib,
        FeatureCategory::Loft,
        FeatureCategory::Sweep,
        FeatureCategory::ReferencePlane,
        FeatureCategory::Axis,
        FeatureCategory::Mate,
        FeatureCategory::Generic,
    ];

    /// Serialized label
    pub fn label(self) -> &'static str {
        match self {
            FeatureCategory::Sketch => "sketch",
            FeatureCategory::Extrude => "extrude",
            FeatureCategory::Cut => "cut",
            FeatureCategory::Revolve => "revolve",
            FeatureCategory::Fillet => "fillet",
            FeatureCategory::Chamfer => "chamfer",
            FeatureCategory::Hole => "hole",
            FeatureCategory::Pattern => "pattern",
            FeatureCategory::Mirror => "mirror",
            FeatureCategory::Shell => "shell",
            FeatureCategory::Draft => "draft",
            FeatureCategory::Rib => "rib",
            FeatureCategory::Loft => "loft",
            FeatureCategory::Sweep => "sweep",
            FeatureCategory::ReferencePlane => "reference_plane",
            FeatureCategory::Axis => "axis",
            FeatureCategory::Mate => "mate",
            FeatureCategory::Generic => "generic",
        }
    }

    /// Whether nodes of this category carry a sketch of their own
    pub fn is_sketch(self) -> bool {
        self == FeatureCategory::Sketch
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Keyword table; earlier rows win
const KEYWORDS: &[(FeatureCategory, &[&str])] = &[
    (FeatureCategory::Sketch, &["sketch", "profilefeature"]),
    (FeatureCategory::Extrude, &["extrude", "boss"]),
    (FeatureCategory::Cut, &["cut"]),
    (FeatureCategory::Revolve, &["revolve"]),
    (FeatureCategory::Fillet, &["fillet"]),
    (FeatureCategory::Chamfer, &["chamfer"]),
    (FeatureCategory::Hole, &["hole"]),
    (FeatureCategory::Pattern, &["pattern"]),
    (FeatureCategory::Mirror, &["mirror"]),
    (FeatureCategory::Shell, &["shell"]),
    (FeatureCategory::Draft, &["draft"]),
    (FeatureCategory::Rib, &["rib"]),
    (FeatureCategory::Loft, &["loft"]),
    (FeatureCategory::Sweep, &["sweep"]),
    (FeatureCategory::ReferencePlane, &["plane"]),
    (FeatureCategory::Axis, &["axis"]),
    (FeatureCategory::Mate, &["mate"]),
];

/// Classify a raw vendor type name
///
/// Case-insensitive substring match against [`KEYWORDS`], first hit wins.
/// `"CutExtrude"` is an extrude by this rule, not a cut.
pub fn classify(type_name: &str) -> FeatureCategory {
    let lowered = type_name.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map(|(category, _)| *category)
        .unwrap_or(FeatureCategory::Generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_types() {
        assert_eq!(classify("ProfileFeature"), FeatureCategory::Sketch);
        assert_eq!(classify("3DProfileFeature"), FeatureCategory::Sketch);
        assert_eq!(classify("Extrusion"), FeatureCategory::Generic);
        assert_eq!(classify("BossExtrude"), FeatureCategory::Extrude);
        assert_eq!(classify("Boss"), FeatureCategory::Extrude);
        assert_eq!(classify("ICE"), FeatureCategory::Generic);
        assert_eq!(classify("RevolvedCut"), FeatureCategory::Cut);
        assert_eq!(classify("Fillet"), FeatureCategory::Fillet);
        assert_eq!(classify("HoleWzd"), FeatureCategory::Hole);
        assert_eq!(classify("LPattern"), FeatureCategory::Pattern);
        assert_eq!(classify("RefPlane"), FeatureCategory::ReferencePlane);
        assert_eq!(classify("RefAxis"), FeatureCategory::Axis);
        assert_eq!(classify("MateCoincident"), FeatureCategory::Mate);
        assert_eq!(classify(""), FeatureCategory::Generic);
    }

    #[test]
    fn test_priority_order() {
        // both "sketch" and "pattern" appear; sketch ranks first
        assert_eq!(classify("SketchPattern"), FeatureCategory::Sketch);
        assert_eq!(classify("CutExtrude"), FeatureCategory::Extrude);
        assert_eq!(classify("MirrorPlane"), FeatureCategory::Mirror);
        assert_eq!(classify("FILLET"), FeatureCategory::Fillet);
    }

    #[test]
    fn test_labels_match_serde() {
        for category in FeatureCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
    }
}
