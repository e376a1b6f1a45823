use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::models::{Link, Record};

/// Short code -> record table that remembers insertion order.
///
/// Serializes as a single JSON object whose keys are the short codes, in the
/// order they were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, short_code: &str) -> bool {
        self.position(short_code).is_some()
    }

    pub fn get(&self, short_code: &str) -> Option<&Record> {
        self.position(short_code).map(|i| &self.links[i].record)
    }

    pub fn get_mut(&mut self, short_code: &str) -> Option<&mut Record> {
        let i = self.position(short_code)?;
        Some(&mut self.links[i].record)
    }

    /// First code (in insertion order) whose record points at `long_url`.
    pub fn code_for_url(&self, long_url: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.record.long_url == long_url)
            .map(|link| link.short_code.as_str())
    }

    /// Insert a record. An existing code is overwritten in place and keeps
    /// its position.
    pub fn insert(&mut self, short_code: String, record: Record) {
        match self.position(&short_code) {
            Some(i) => self.links[i].record = record,
            None => self.links.push(Link { short_code, record }),
        }
    }

    pub fn remove(&mut self, short_code: &str) -> Option<Record> {
        self.position(short_code)
            .map(|i| self.links.remove(i).record)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn to_vec(&self) -> Vec<Link> {
        self.iter().cloned().collect()
    }

    fn position(&self, short_code: &str) -> Option<usize> {
        self.links
            .iter()
            .position(|link| link.short_code == short_code)
    }
}

impl Serialize for LinkTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.links
                .iter()
                .map(|link| (&link.short_code, &link.record)),
        )
    }
}

impl<'de> Deserialize<'de> for LinkTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LinkTableVisitor)
    }
}

struct LinkTableVisitor;

impl<'de> Visitor<'de> for LinkTableVisitor {
    type Value = LinkTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of short codes to link records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LinkTable, A::Error> {
        let mut table = LinkTable::default();
        while let Some((short_code, record)) = access.next_entry::<String, Record>()? {
            table.insert(short_code, record);
        }
        Ok(table)
    }
}
