//! Typed application attributes attached to parcels.
//!
//! Parcels carry a fixed set of physical attributes in the ledger.  Anything
//! else an application wants to track per parcel (lithology, tracer tag,
//! source catchment, …) is registered here as its own type instead of a
//! string-keyed field.
//!
//! Each component type `T` is stored as a `Vec<T>` behind a
//! `Box<dyn ComponentVec>` keyed by `TypeId`, always one element per parcel.
//! Components are static: they describe the parcel, not its per-step state,
//! so they are not part of the time series.
//!
//! ```rust
//! use nst_parcel::ComponentMap;
//!
//! #[derive(Default, Clone, Copy, PartialEq, Debug)]
//! enum Lithology { #[default] Granite, Basalt }
//!
//! let mut map = ComponentMap::new();
//! map.register::<Lithology>(3);
//! map.get_mut::<Lithology>().unwrap()[1] = Lithology::Basalt;
//! assert_eq!(map.get::<Lithology>().unwrap()[1], Lithology::Basalt);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;

// ── Trait object ──────────────────────────────────────────────────────────────

/// Type-erased per-parcel `Vec<T>`.
///
/// Sealed so external implementations cannot break the one-element-per-parcel
/// invariant.
pub trait ComponentVec: Send + Sync + 'static + sealed::Sealed {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow or shrink to `len`, filling new slots with `T::default()`.
    fn resize_default(&mut self, len: usize);

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

mod sealed {
    pub trait Sealed {}
}

/// A `Vec<T>` wrapped so it can be stored as `Box<dyn ComponentVec>`.
pub struct TypedComponentVec<T: Default + Send + Sync + 'static>(pub Vec<T>);

impl<T: Default + Send + Sync + 'static> sealed::Sealed for TypedComponentVec<T> {}

impl<T: Default + Send + Sync + 'static> ComponentVec for TypedComponentVec<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn resize_default(&mut self, len: usize) {
        self.0.resize_with(len, T::default);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ── ComponentMap ──────────────────────────────────────────────────────────────

/// Registry of application attribute arrays, one `Vec<T>` per type.
#[derive(Default)]
pub struct ComponentMap {
    map: HashMap<TypeId, Box<dyn ComponentVec>>,
}

impl ComponentMap {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Register `T` with `parcel_count` default values.  Registering the same
    /// type twice leaves the existing data alone.
    pub fn register<T: Default + Send + Sync + 'static>(&mut self, parcel_count: usize) {
        self.map.entry(TypeId::of::<T>()).or_insert_with(|| {
            let values: Vec<T> = std::iter::repeat_with(T::default).take(parcel_count).collect();
            Box::new(TypedComponentVec(values))
        });
    }

    /// Shared slice of component `T`, indexed by `ParcelId`.
    pub fn get<T: Default + Send + Sync + 'static>(&self) -> Option<&[T]> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|v| v.as_any().downcast_ref::<TypedComponentVec<T>>())
            .map(|v| v.0.as_slice())
    }

    /// Mutable slice of component `T`.  Length cannot change.
    pub fn get_mut<T: Default + Send + Sync + 'static>(&mut self) -> Option<&mut [T]> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.as_any_mut().downcast_mut::<TypedComponentVec<T>>())
            .map(|v| v.0.as_mut_slice())
    }

    /// Resize every registered array to `parcel_count`.
    pub(crate) fn resize_all(&mut self, parcel_count: usize) {
        for v in self.map.values_mut() {
            v.resize_default(parcel_count);
        }
    }

    pub fn type_count(&self) -> usize {
        self.map.len()
    }

    pub fn contains<T: Default + Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}
