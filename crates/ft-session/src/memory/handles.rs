//! Handles into a recorded document

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::traits::{
    AccessError, AccessResult, ConfigurationHandle, FeatureHandle, FeatureRef, PropertyBag,
    PropertyValue, SketchHandle,
};

use super::{
    MemoryConfiguration, MemoryDocument, MemoryFeature, MemoryRecord, MemorySketch, Members, bags,
    record_bags,
};

/// Flattened feature graph
///
/// Each feature owns one slot; `next` links siblings within the same chain and
/// `first_child` points at the head of the sub-feature chain.
pub(crate) struct Arena {
    pub document: MemoryDocument,
    pub head: Option<usize>,
    slots: Vec<Slot>,
    by_name: HashMap<String, usize>,
    /// Number of features naming each feature as a parent
    children: HashMap<String, usize>,
}

struct Slot {
    feature: MemoryFeature,
    next: Option<usize>,
    first_child: Option<usize>,
}

impl Arena {
    pub fn build(mut document: MemoryDocument) -> Self {
        let features = std::mem::take(&mut document.features);
        let mut slots = Vec::new();
        let head = push_chain(&mut slots, features);

        let mut by_name = HashMap::new();
        let mut children: HashMap<String, usize> = HashMap::new();
        for (index, slot) in slots.iter().enumerate() {
            by_name.entry(slot.feature.name.clone()).or_insert(index);
            let mut seen: Vec<&str> = Vec::new();
            for parent in &slot.feature.parents {
                if !seen.contains(&parent.as_str()) {
                    seen.push(parent);
                    *children.entry(parent.clone()).or_default() += 1;
                }
            }
        }

        Self {
            document,
            head,
            slots,
            by_name,
            children,
        }
    }
}

fn push_chain(slots: &mut Vec<Slot>, chain: Vec<MemoryFeature>) -> Option<usize> {
    let mut head = None;
    let mut prev: Option<usize> = None;
    for mut feature in chain {
        let children = std::mem::take(&mut feature.sub_features);
        let index = slots.len();
        slots.push(Slot {
            feature,
            next: None,
            first_child: None,
        });
        match prev {
            Some(p) => slots[p].next = Some(index),
            None => head = Some(index),
        }
        prev = Some(index);
        slots[index].first_child = push_chain(slots, children);
    }
    head
}

/// Feature handle backed by an arena slot
pub(crate) struct MemoryFeatureRef {
    arena: Rc<Arena>,
    index: usize,
}

impl MemoryFeatureRef {
    pub fn boxed(arena: &Rc<Arena>, index: usize) -> FeatureRef {
        Box::new(Self {
            arena: Rc::clone(arena),
            index,
        })
    }

    fn slot(&self) -> &Slot {
        &self.arena.slots[self.index]
    }

    fn feature(&self) -> &MemoryFeature {
        &self.slot().feature
    }

    fn link(&self, target: Option<usize>) -> Option<FeatureRef> {
        target.map(|index| Self::boxed(&self.arena, index))
    }

    /// Gate for navigation members
    fn reach(&self, member: &str) -> AccessResult<()> {
        let feature = self.feature();
        if feature.disconnect {
            return Err(AccessError::Disconnected(format!(
                "lost while reading {member} of {}",
                feature.name
            )));
        }
        if feature.failing.iter().any(|m| m == member) {
            return Err(AccessError::failed(member, "injected fault"));
        }
        Ok(())
    }

    /// Gate for content members
    fn read(&self, member: &str) -> AccessResult<()> {
        self.reach(member)?;
        if self.feature().corrupt {
            return Err(AccessError::failed(member, "feature definition is corrupt"));
        }
        Ok(())
    }
}

impl FeatureHandle for MemoryFeatureRef {
    fn name(&self) -> AccessResult<String> {
        self.read("Name")?;
        Ok(self.feature().name.clone())
    }

    fn raw_type_name(&self) -> AccessResult<String> {
        self.read("TypeName")?;
        Ok(self.feature().type_name.clone())
    }

    fn is_suppressed(&self) -> AccessResult<bool> {
        self.read("IsSuppressed")?;
        Ok(self.feature().suppressed)
    }

    fn next_feature(&self) -> AccessResult<Option<FeatureRef>> {
        self.reach("GetNextFeature")?;
        Ok(self.link(self.slot().next))
    }

    fn first_sub_feature(&self) -> AccessResult<Option<FeatureRef>> {
        self.reach("GetFirstSubFeature")?;
        Ok(self.link(self.slot().first_child))
    }

    fn next_sub_feature(&self) -> AccessResult<Option<FeatureRef>> {
        self.reach("GetNextSubFeature")?;
        Ok(self.link(self.slot().next))
    }

    fn parents(&self) -> AccessResult<Vec<FeatureRef>> {
        self.read("GetParents")?;
        Ok(self
            .feature()
            .parents
            .iter()
            .map(|name| match self.arena.by_name.get(name) {
                Some(&index) => Self::boxed(&self.arena, index),
                None => Box::new(DetachedFeature { name: name.clone() }) as FeatureRef,
            })
            .collect())
    }

    fn specific_feature_data(&self) -> AccessResult<Box<dyn PropertyBag>> {
        self.read("GetDefinition")?;
        let feature = self.feature();
        if feature.data.is_empty() && feature.collections.is_empty() {
            return Err(AccessError::unsupported("GetDefinition"));
        }
        Ok(Box::new(
            MemoryBag::new(&feature.data, &feature.failing).with_items(&feature.collections),
        ))
    }

    fn parameters(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.read("Parameters")?;
        let feature = self.feature();
        Ok(bags(&feature.parameters, &feature.failing))
    }

    fn sketch(&self) -> AccessResult<Option<Box<dyn SketchHandle>>> {
        self.read("GetSketch")?;
        Ok(self
            .feature()
            .sketch
            .as_ref()
            .map(|s| Box::new(MemorySketchRef { sketch: s.clone() }) as Box<dyn SketchHandle>))
    }

    fn dependent_count(&self) -> AccessResult<usize> {
        self.read("GetDependentCount")?;
        self.feature()
            .dependent_count
            .ok_or_else(|| AccessError::unsupported("GetDependentCount"))
    }

    fn children_count(&self) -> AccessResult<usize> {
        self.read("GetChildrenCount")?;
        let name = &self.feature().name;
        Ok(self.arena.children.get(name).copied().unwrap_or(0))
    }
}

/// A parent referenced by name that is not part of the recorded tree
struct DetachedFeature {
    name: String,
}

impl FeatureHandle for DetachedFeature {
    fn name(&self) -> AccessResult<String> {
        Ok(self.name.clone())
    }

    fn raw_type_name(&self) -> AccessResult<String> {
        Err(AccessError::unsupported("TypeName"))
    }

    fn is_suppressed(&self) -> AccessResult<bool> {
        Ok(false)
    }

    fn next_feature(&self) -> AccessResult<Option<FeatureRef>> {
        Ok(None)
    }

    fn first_sub_feature(&self) -> AccessResult<Option<FeatureRef>> {
        Ok(None)
    }

    fn next_sub_feature(&self) -> AccessResult<Option<FeatureRef>> {
        Ok(None)
    }

    fn parents(&self) -> AccessResult<Vec<FeatureRef>> {
        Ok(Vec::new())
    }

    fn specific_feature_data(&self) -> AccessResult<Box<dyn PropertyBag>> {
        Err(AccessError::unsupported("GetDefinition"))
    }
}

/// Member table with injected faults
pub(crate) struct MemoryBag {
    values: Members,
    failing: Vec<String>,
    items: BTreeMap<String, Vec<MemoryRecord>>,
}

impl MemoryBag {
    pub fn new(values: &Members, failing: &[String]) -> Self {
        Self {
            values: values.clone(),
            failing: failing.to_vec(),
            items: BTreeMap::new(),
        }
    }

    pub fn with_items(mut self, items: &BTreeMap<String, Vec<MemoryRecord>>) -> Self {
        self.items = items.clone();
        self
    }

    fn check(&self, member: &str) -> AccessResult<()> {
        if self.failing.iter().any(|m| m == member) {
            return Err(AccessError::failed(member, "injected fault"));
        }
        Ok(())
    }
}

impl PropertyBag for MemoryBag {
    fn get(&self, member: &str) -> AccessResult<PropertyValue> {
        self.check(member)?;
        self.values
            .get(member)
            .cloned()
            .ok_or_else(|| AccessError::unsupported(member))
    }

    fn items(&self, member: &str) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.check(member)?;
        self.items
            .get(member)
            .map(|records| record_bags(records))
            .ok_or_else(|| AccessError::unsupported(member))
    }
}

struct MemorySketchRef {
    sketch: MemorySketch,
}

impl MemorySketchRef {
    fn collection(&self, member: &str, records: &[MemoryRecord]) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        if self.sketch.failing.iter().any(|m| m == member) {
            return Err(AccessError::failed(member, "injected fault"));
        }
        Ok(record_bags(records))
    }
}

impl PropertyBag for MemorySketchRef {
    fn get(&self, member: &str) -> AccessResult<PropertyValue> {
        MemoryBag::new(&self.sketch.properties, &self.sketch.failing).get(member)
    }
}

impl SketchHandle for MemorySketchRef {
    fn segments(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.collection("Segments", &self.sketch.segments)
    }

    fn dimensions(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.collection("Dimensions", &self.sketch.dimensions)
    }

    fn relations(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.collection("Relations", &self.sketch.relations)
    }

    fn external_entities(&self) -> AccessResult<Vec<Box<dyn PropertyBag>>> {
        self.collection("ExternalEntities", &self.sketch.external_entities)
    }
}

pub(crate) struct MemoryConfigurationRef {
    config: MemoryConfiguration,
}

impl MemoryConfigurationRef {
    pub fn new(config: MemoryConfiguration) -> Self {
        Self { config }
    }

    fn check(&self, member: &str) -> AccessResult<()> {
        if self.config.failing.iter().any(|m| m == member) {
            return Err(AccessError::failed(member, "injected fault"));
        }
        Ok(())
    }
}

impl ConfigurationHandle for MemoryConfigurationRef {
    fn name(&self) -> AccessResult<String> {
        self.check("Name")?;
        Ok(self.config.name.clone())
    }

    fn is_feature_suppressed(&self, feature: &dyn FeatureHandle) -> AccessResult<bool> {
        self.check("SuppressionState")?;
        let name = feature.name()?;
        Ok(self.config.suppressed.contains(&name))
    }
}
