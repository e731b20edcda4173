//! Handle-based collection types
//!
//! All long-lived engine objects are referenced through slot map keys rather
//! than indices or raw pointers. Keys stay cheap to copy, and a key whose slot
//! has been reclaimed simply stops resolving, which is how stale references
//! are detected throughout the engine.

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Opaque handle to one live scene instance
    pub struct InstanceKey;

    /// Opaque identity of a registered template
    pub struct TemplateKey;

    /// Opaque handle to a pool owned by the registry
    pub struct PoolKey;
}

/// Storage for scene instances
pub type InstanceMap<T> = SlotMap<InstanceKey, T>;

/// Storage for templates
pub type TemplateMap<T> = SlotMap<TemplateKey, T>;

/// Storage for pools
pub type PoolMap<T> = SlotMap<PoolKey, T>;
