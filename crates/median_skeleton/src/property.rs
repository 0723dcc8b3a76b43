//! Dynamically typed, dense per-tier property tables (C2).
//!
//! Each tier carries an ordered registry of property tables shadowing its packed vector. The
//! registry is type-erased in the spirit of `synthizer::object_pool::ObjectPool`'s
//! `Any + TypeId`-keyed slab map, but specialized to a dense array per property rather than a
//! sharded slab: what matters is that every table resizes/moves/destroys in lock-step with the
//! tier's packed vector, not how the erasure is implemented.

use std::any::{Any, TypeId};

/// Capability trait every property table implements so the owning tier can keep it in lock-step
/// without knowing the element type.
trait ErasedProperty: Any + Send + Sync {
    fn resize(&mut self, new_len: usize);
    fn move_element(&mut self, src: usize, dst: usize);
    fn truncate(&mut self, new_len: usize);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedColumn<T> {
    values: Vec<T>,
}

impl<T: Default + Send + Sync + 'static> ErasedProperty for TypedColumn<T> {
    fn resize(&mut self, new_len: usize) {
        self.values.resize_with(new_len, T::default);
    }

    fn move_element(&mut self, src: usize, dst: usize) {
        if src == dst {
            return;
        }
        self.values[dst] = std::mem::take(&mut self.values[src]);
    }

    fn truncate(&mut self, new_len: usize) {
        self.values.truncate(new_len);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Column {
    name: String,
    type_id: TypeId,
    table: Box<dyn ErasedProperty>,
}

/// Registry of user-defined property tables for one tier. Kept alongside (not instead of) the
/// tier's required built-in adjacency fields, which live directly on the element struct because
/// their schema is fixed by the topology manager rather than chosen by callers.
#[derive(Default)]
pub struct PropertyRegistry {
    columns: Vec<Column>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Register a new property of type `T` under `name`, default-initializing it for the
    /// `current_len` elements that already exist. Returns the property's index, stable for the
    /// lifetime of the tier.
    pub fn add<T: Default + Send + Sync + 'static>(
        &mut self,
        name: &str,
        current_len: usize,
    ) -> usize {
        let mut values = Vec::with_capacity(current_len);
        values.resize_with(current_len, T::default);
        let index = self.columns.len();
        self.columns.push(Column {
            name: name.to_string(),
            type_id: TypeId::of::<T>(),
            table: Box::new(TypedColumn { values }),
        });
        index
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn get<T: 'static>(&self, index: usize) -> Option<&[T]> {
        let column = self.columns.get(index)?;
        if column.type_id != TypeId::of::<T>() {
            return None;
        }
        column
            .table
            .as_any()
            .downcast_ref::<TypedColumn<T>>()
            .map(|c| c.values.as_slice())
    }

    pub fn get_mut<T: 'static>(&mut self, index: usize) -> Option<&mut [T]> {
        let column = self.columns.get_mut(index)?;
        if column.type_id != TypeId::of::<T>() {
            return None;
        }
        column
            .table
            .as_any_mut()
            .downcast_mut::<TypedColumn<T>>()
            .map(|c| c.values.as_mut_slice())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resize every column to `new_len`, the way [`crate::store::TierStore::reserve`] resizes the
    /// packed vector of built-in fields in the same step.
    pub(crate) fn resize_all(&mut self, new_len: usize) {
        for column in &mut self.columns {
            column.table.resize(new_len);
        }
    }

    pub(crate) fn move_all(&mut self, src: usize, dst: usize) {
        for column in &mut self.columns {
            column.table.move_element(src, dst);
        }
    }

    pub(crate) fn truncate_all(&mut self, new_len: usize) {
        for column in &mut self.columns {
            column.table.truncate(new_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_roundtrip() {
        let mut reg = PropertyRegistry::new();
        let idx = reg.add::<u32>("weight", 3);
        assert_eq!(reg.get::<u32>(idx).unwrap(), &[0, 0, 0]);
        reg.get_mut::<u32>(idx).unwrap()[1] = 42;
        assert_eq!(reg.get::<u32>(idx).unwrap(), &[0, 42, 0]);
    }

    #[test]
    fn wrong_type_returns_none() {
        let mut reg = PropertyRegistry::new();
        let idx = reg.add::<u32>("weight", 1);
        assert!(reg.get::<f32>(idx).is_none());
    }

    #[test]
    fn move_and_truncate_lock_step() {
        let mut reg = PropertyRegistry::new();
        let idx = reg.add::<u32>("tag", 3);
        reg.get_mut::<u32>(idx).unwrap().copy_from_slice(&[1, 2, 3]);
        reg.move_all(2, 0);
        assert_eq!(reg.get::<u32>(idx).unwrap()[0], 3);
        reg.truncate_all(2);
        assert_eq!(reg.get::<u32>(idx).unwrap().len(), 2);
    }

    #[test]
    fn new_columns_default_initialize_existing_indices() {
        let mut reg = PropertyRegistry::new();
        reg.resize_all(0);
        let idx = reg.add::<u32>("late", 5);
        assert_eq!(reg.get::<u32>(idx).unwrap(), &[0, 0, 0, 0, 0]);
    }
}
