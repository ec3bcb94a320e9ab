//! Append-only interning of attribute sets
//!
//! Edge attributes and turn-cost attributes are stored raw in the tiles, but
//! routing only ever looks at a reduced set of them. A grouping function
//! reduces a raw set, the reduced set is sorted and interned, and the small
//! integer id is cached on the edge. Profiles can then be evaluated once per
//! id instead of once per edge.
//!
//! Ids are never reused or renumbered. Installing a new grouping function
//! bumps the version; tiles compare their cached version against it and
//! re-derive their ids lazily.

use butterfly_common::{Error, Result};
use butterfly_io::{ReadExt, WriteExt};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// A key/value attribute, typically an OSM tag.
pub type Attribute = (String, String);

/// Reduces a raw attribute set to the attributes routing cares about.
pub type GroupingFunction = Arc<dyn Fn(&[Attribute]) -> Vec<Attribute> + Send + Sync>;

/// Id of the empty attribute set.
pub const EMPTY_SET_ID: u32 = 0;

/// Grouping function that keeps every attribute.
pub fn identity() -> GroupingFunction {
    Arc::new(|attributes: &[Attribute]| attributes.to_vec())
}

/// Grouping function that keeps only attributes with one of the given keys.
pub fn keep_keys<I, S>(keys: I) -> GroupingFunction
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: FxHashSet<String> = keys.into_iter().map(Into::into).collect();
    Arc::new(move |attributes: &[Attribute]| {
        attributes
            .iter()
            .filter(|(k, _)| keys.contains(k))
            .cloned()
            .collect()
    })
}

/// Sort by key then value and drop exact duplicates.
pub fn canonicalize(mut attributes: Vec<Attribute>) -> Vec<Attribute> {
    attributes.sort();
    attributes.dedup();
    attributes
}

#[derive(Clone)]
pub struct AttributeSetIndex {
    version: u32,
    function: GroupingFunction,
    sets: Vec<Arc<[Attribute]>>,
    lookup: FxHashMap<Arc<[Attribute]>, u32>,
}

pub type EdgeTypeIndex = AttributeSetIndex;
pub type TurnCostTypeIndex = AttributeSetIndex;

impl AttributeSetIndex {
    /// Empty index using the identity grouping function at version 0.
    pub fn new() -> Self {
        Self::with_function(identity())
    }

    pub fn with_function(function: GroupingFunction) -> Self {
        let empty: Arc<[Attribute]> = Arc::from(Vec::new());
        let mut lookup = FxHashMap::default();
        lookup.insert(empty.clone(), EMPTY_SET_ID);

        Self {
            version: 0,
            function,
            sets: vec![empty],
            lookup,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of interned sets, the empty set included.
    pub fn count(&self) -> usize {
        self.sets.len()
    }

    /// Grouped and canonicalized form of a raw attribute set.
    pub fn group(&self, attributes: &[Attribute]) -> Vec<Attribute> {
        canonicalize((self.function)(attributes))
    }

    /// Id of the grouped set, interning it when it is new.
    pub fn get(&mut self, attributes: &[Attribute]) -> u32 {
        let grouped = self.group(attributes);
        if let Some(&id) = self.lookup.get(grouped.as_slice()) {
            return id;
        }

        let id = self.sets.len() as u32;
        let set: Arc<[Attribute]> = Arc::from(grouped);
        self.sets.push(set.clone());
        self.lookup.insert(set, id);
        id
    }

    /// Id of the grouped set if it was interned before, without interning.
    pub fn find(&self, attributes: &[Attribute]) -> Option<u32> {
        let grouped = self.group(attributes);
        self.lookup.get(grouped.as_slice()).copied()
    }

    pub fn get_by_id(&self, id: u32) -> Option<&[Attribute]> {
        self.sets.get(id as usize).map(|set| set.as_ref())
    }

    /// Same table, new grouping function, version + 1.
    pub fn next(&self, function: GroupingFunction) -> Self {
        Self {
            version: self.version + 1,
            function,
            sets: self.sets.clone(),
            lookup: self.lookup.clone(),
        }
    }

    /// Writes version, count and the sets as length-prefixed key/value pairs.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        writer.write_var_u32(self.version)?;
        writer.write_var_u32(self.sets.len() as u32)?;
        for set in &self.sets {
            write_attributes(writer, set)?;
        }
        Ok(())
    }

    /// Reads an index written by [`write_to`](Self::write_to).
    ///
    /// Grouping functions are code and not persisted; the index is restored
    /// with `function` and its stored version.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R, function: GroupingFunction) -> Result<Self> {
        let version = reader.read_var_u32()?;
        let count = reader.read_var_u32()?;

        let mut index = Self::with_function(function);
        index.version = version;
        for id in 0..count {
            let set = read_attributes(reader)?;
            if id == EMPTY_SET_ID {
                if !set.is_empty() {
                    return Err(Error::Format("type index entry 0 must be the empty set".into()));
                }
                continue;
            }
            let set: Arc<[Attribute]> = Arc::from(set);
            if index.lookup.insert(set.clone(), id).is_some() {
                return Err(Error::Format(format!("duplicate type index entry {id}")));
            }
            index.sets.push(set);
        }
        Ok(index)
    }
}

impl Default for AttributeSetIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AttributeSetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSetIndex")
            .field("version", &self.version)
            .field("count", &self.sets.len())
            .finish()
    }
}

pub(crate) fn write_attributes<W: Write + ?Sized>(writer: &mut W, attributes: &[Attribute]) -> Result<()> {
    writer.write_var_u32(attributes.len() as u32)?;
    for (key, value) in attributes {
        writer.write_string(key)?;
        writer.write_string(value)?;
    }
    Ok(())
}

pub(crate) fn read_attributes<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<Attribute>> {
    let len = reader.read_var_u32()?;
    let mut attributes = Vec::with_capacity(len.min(64) as usize);
    for _ in 0..len {
        let key = reader.read_string()?;
        let value = reader.read_string()?;
        attributes.push((key, value));
    }
    Ok(attributes)
}
