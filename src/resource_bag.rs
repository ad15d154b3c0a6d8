//! # Resource Bag
//!
//! A mapping from opaque keys to opaque values, scoped to the lifetime of a
//! single `ProcessingContext`, with atomic get-or-create semantics. Backed
//! by `dashmap::DashMap`, whose `entry()` API gives
//! get-or-compute without a separate double-checked-lock dance — the
//! factory runs under the shard lock the entry holds, so it is called at
//! most once per key even under concurrent callers.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{LifecycleError, LifecycleResult};

/// An opaque resource key. Two call sites using the same string name but
/// different types never collide, since the `TypeId` of the stored value is
/// part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    name: String,
    type_id: TypeId,
}

impl ResourceKey {
    pub fn of<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

type AnyValue = Arc<dyn Any + Send + Sync>;

/// A concurrent, type-erased resource bag scoped to one `ProcessingContext`.
#[derive(Default)]
pub struct ResourceBag {
    values: DashMap<ResourceKey, AnyValue>,
}

impl fmt::Debug for ResourceBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBag")
            .field("len", &self.values.len())
            .finish()
    }
}

impl ResourceBag {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Store or replace a value under `name`.
    pub fn put<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) {
        let key = ResourceKey::of::<T>(name);
        self.values.insert(key, Arc::new(value));
    }

    /// Non-blocking read. Returns `None` if absent; `Err` if present under a
    /// different concrete type than `T` (which should not happen given
    /// `ResourceKey::of::<T>`'s type-scoping, but a caller could still
    /// construct a colliding key by hand).
    pub fn get<T: Any + Send + Sync + Clone>(
        &self,
        name: impl Into<String>,
    ) -> LifecycleResult<Option<T>> {
        let key = ResourceKey::of::<T>(name);
        match self.values.get(&key) {
            Some(entry) => entry
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| LifecycleError::resource_type_mismatch(key.to_string())),
            None => Ok(None),
        }
    }

    /// Returns the existing value for `name`, or computes and stores one via
    /// `factory`. `factory` runs at most once per key even under concurrent
    /// callers racing the same key.
    pub fn get_or_compute<T, F>(&self, name: impl Into<String>, factory: F) -> LifecycleResult<T>
    where
        T: Any + Send + Sync + Clone,
        F: FnOnce() -> T,
    {
        let key = ResourceKey::of::<T>(name);
        let entry = self
            .values
            .entry(key.clone())
            .or_insert_with(|| Arc::new(factory()) as AnyValue);
        entry
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| LifecycleError::resource_type_mismatch(key.to_string()))
    }

    /// Remove and return the previous value under `name`, if any.
    pub fn remove<T: Any + Send + Sync + Clone>(
        &self,
        name: impl Into<String>,
    ) -> LifecycleResult<Option<T>> {
        let key = ResourceKey::of::<T>(name);
        match self.values.remove(&key) {
            Some((_, value)) => value
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| LifecycleError::resource_type_mismatch(key.to_string())),
            None => Ok(None),
        }
    }
}
