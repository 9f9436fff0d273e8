//! Inter-object dependency map.
//!
//! `instance → referenced → [dependent var index]`: when the object held in
//! `instance` reports a change of `referenced`, every dependent variable of
//! the class must be invalidated. A key equal to the class symbol itself
//! stands for `this` (a dependency on an inherited variable).

use bindc_tree::SymbolId;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMap {
    entries: IndexMap<SymbolId, IndexMap<SymbolId, Vec<usize>>>,
}

impl UpdateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: SymbolId, referenced: SymbolId, dependent: usize) {
        let deps = self
            .entries
            .entry(instance)
            .or_default()
            .entry(referenced)
            .or_default();
        if !deps.contains(&dependent) {
            deps.push(dependent);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn instances(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.entries.keys().copied()
    }

    pub fn contains_instance(&self, instance: SymbolId) -> bool {
        self.entries.contains_key(&instance)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &IndexMap<SymbolId, Vec<usize>>)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn dependents(&self, instance: SymbolId, referenced: SymbolId) -> &[usize] {
        self.entries
            .get(&instance)
            .and_then(|refs| refs.get(&referenced))
            .map_or(&[], Vec::as_slice)
    }
}
