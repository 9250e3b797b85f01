//! Per-category attribute schemas

use crate::classify::FeatureCategory;

/// How a raw member value is normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Meters
    Length,
    /// Radians, optionally mirrored in degrees
    Angle,
    Count,
    Flag,
    Text,
    /// End-condition code decoded to its name
    EndCondition,
    /// Vendor enumeration code kept as an integer
    Code,
}

/// One schema attribute
#[derive(Debug, Clone, Copy)]
pub struct AttributeSpec {
    /// Output attribute name
    pub name: &'static str,
    /// Vendor members to try, in order
    pub members: &'static [&'static str],
    pub kind: ValueKind,
}

const fn spec(name: &'static str, members: &'static [&'static str], kind: ValueKind) -> AttributeSpec {
    AttributeSpec { name, members, kind }
}

use ValueKind::*;

const EXTRUDE: &[AttributeSpec] = &[
    spec("endCondition", &["EndCondition", "Type"], EndCondition),
    spec("depth", &["Depth", "D1"], Length),
    spec("depth2", &["Depth2", "D2"], Length),
    spec("draftAngle", &["DraftAngle"], Angle),
    spec("reverseDirection", &["ReverseDirection"], Flag),
    spec("bothDirections", &["BothDirections"], Flag),
    spec("mergeResult", &["Merge", "MergeResult"], Flag),
];

const CUT: &[AttributeSpec] = &[
    spec("endCondition", &["EndCondition", "Type"], EndCondition),
    spec("depth", &["Depth", "D1"], Length),
    spec("draftAngle", &["DraftAngle"], Angle),
    spec("reverseDirection", &["ReverseDirection"], Flag),
    spec("flipSideToCut", &["FlipSideToCut"], Flag),
    spec("draftOutward", &["DraftOutward"], Flag),
];

const REVOLVE: &[AttributeSpec] = &[
    spec("angle", &["Angle"], Angle),
    spec("angle2", &["Angle2", "SecondAngle"], Angle),
    spec("revolveType", &["Type", "RevolveType"], Code),
    spec("reverseDirection", &["ReverseDirection"], Flag),
];

const FILLET: &[AttributeSpec] = &[
    spec("radius", &["Radius", "DefaultRadius"], Length),
    spec("edgeCount", &["EdgeCount", "Edges"], Count),
    spec("fullRound", &["FullRound"], Flag),
    spec("filletType", &["Type", "FilletType"], Code),
    spec("propagateToTangent", &["PropagateToTangentFaces", "Propagate"], Flag),
];

const CHAMFER: &[AttributeSpec] = &[
    spec("distance", &["Distance", "EdgeChamferDistance"], Length),
    spec("angle", &["Angle", "EdgeChamferAngle"], Angle),
    spec("chamferType", &["Type", "ChamferType"], Code),
];

const HOLE: &[AttributeSpec] = &[
    spec("holeType", &["Type", "HoleType"], Code),
    spec("diameter", &["Diameter", "HoleDiameter"], Length),
    spec("depth", &["Depth", "HoleDepth"], Length),
    spec("endCondition", &["EndCondition"], EndCondition),
    spec("countersinkDiameter", &["CounterSinkDiameter"], Length),
    spec("countersinkAngle", &["CounterSinkAngle"], Angle),
    spec("counterboreDiameter", &["CounterBoreDiameter"], Length),
    spec("counterboreDepth", &["CounterBoreDepth"], Length),
    spec("threadDesignation", &["ThreadDesignation", "Fastener"], Text),
    spec("threadPitch", &["ThreadPitch"], Length),
];

const PATTERN: &[AttributeSpec] = &[
    spec("patternType", &["Type", "PatternType"], Code),
    spec("totalInstances", &["TotalInstances", "D1TotalInstances"], Count),
    spec("spacing", &["Spacing", "D1Spacing"], Length),
    spec("direction2Instances", &["D2TotalInstances"], Count),
    spec("direction2Spacing", &["D2Spacing"], Length),
    spec("equalSpacing", &["EqualSpacing"], Flag),
    spec("reverseDirection", &["ReverseDirection", "D1ReverseDirection"], Flag),
];

const MIRROR: &[AttributeSpec] = &[spec("featureCount", &["FeatureCount", "MirrorFeatures"], Count)];

const SHELL: &[AttributeSpec] = &[
    spec("thickness", &["Thickness"], Length),
    spec("outward", &["ShellOutward", "Outward"], Flag),
];

const DRAFT: &[AttributeSpec] = &[spec("angle", &["Angle", "DraftAngle"], Angle)];

const RIB: &[AttributeSpec] = &[
    spec("thickness", &["Thickness"], Length),
    spec("extrudeFrom", &["ExtrusionDirection", "ExtrudeFrom"], Code),
    spec("flipMaterialSide", &["FlipMaterialSide", "FlipSide"], Flag),
];

const LOFT: &[AttributeSpec] = &[
    spec("profileCount", &["ProfileCount", "Profiles"], Count),
    spec("closed", &["Close", "Closed"], Flag),
];

const SWEEP: &[AttributeSpec] = &[
    spec("twistType", &["TwistControlType", "TwistType"], Code),
    spec("twistAngle", &["TwistAngle"], Angle),
];

const REFERENCE_PLANE: &[AttributeSpec] = &[
    spec("offset", &["Distance", "Offset"], Length),
    spec("angle", &["Angle"], Angle),
    spec("flip", &["Flip", "ReversedReferenceDirection"], Flag),
];

const AXIS: &[AttributeSpec] = &[spec("axisType", &["Type", "AxisType"], Code)];

const MATE: &[AttributeSpec] = &[
    spec("mateType", &["Type", "MateType"], Code),
    spec("alignment", &["MateAlignment", "Alignment"], Code),
    spec("distance", &["Distance"], Length),
    spec("angle", &["Angle"], Angle),
    spec("flipped", &["Flipped", "Flip"], Flag),
];

/// Schema for a category; sketch and generic have none
pub fn schema_for(category: FeatureCategory) -> &'static [AttributeSpec] {
    match category {
        FeatureCategory::Extrude => EXTRUDE,
        FeatureCategory::Cut => CUT,
        FeatureCategory::Revolve => REVOLVE,
        FeatureCategory::Fillet => FILLET,
        FeatureCategory::Chamfer => CHAMFER,
        FeatureCategory::Hole => HOLE,
        FeatureCategory::Pattern => PATTERN,
        FeatureCategory::Mirror => MIRROR,
        FeatureCategory::Shell => SHELL,
        FeatureCategory::Draft => DRAFT,
        FeatureCategory::Rib => RIB,
        FeatureCategory::Loft => LOFT,
        FeatureCategory::Sweep => SWEEP,
        FeatureCategory::ReferencePlane => REFERENCE_PLANE,
        FeatureCategory::Axis => AXIS,
        FeatureCategory::Mate => MATE,
        FeatureCategory::Sketch | FeatureCategory::Generic => &[],
    }
}

/// Decode an end-condition code
pub fn end_condition_name(code: i64) -> Option<&'static str> {
    Some(match code {
        0 => "Blind",
        1 => "ThroughAll",
        2 => "UpToNext",
        3 => "UpToVertex",
        4 => "UpToSurface",
        5 => "OffsetFromSurface",
        6 => "MidPlane",
        7 => "UpToBody",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_schema_names_unique() {
        for category in FeatureCategory::ALL {
            let names: HashSet<_> = schema_for(category).iter().map(|s| s.name).collect();
            assert_eq!(names.len(), schema_for(category).len(), "{category}");
            assert!(schema_for(category).iter().all(|s| !s.members.is_empty()));
        }
    }

    #[test]
    fn test_schemaless_categories() {
        assert!(schema_for(FeatureCategory::Sketch).is_empty());
        assert!(schema_for(FeatureCategory::Generic).is_empty());
        assert_eq!(schema_for(FeatureCategory::Hole).len(), 10);
    }

    #[test]
    fn test_end_condition_names() {
        assert_eq!(end_condition_name(0), Some("Blind"));
        assert_eq!(end_condition_name(6), Some("MidPlane"));
        assert_eq!(end_condition_name(7), Some("UpToBody"));
        assert_eq!(end_condition_name(99), None);
    }
}
