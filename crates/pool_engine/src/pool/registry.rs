//! Pool registry — every map the pool system needs, in one owned context
//!
//! The registry is a plain constructible object; there is no process-wide
//! singleton. Whoever owns the registry owns the session, and `clear` is the
//! session-reset boundary that drops every entry before handles go stale.
//!
//! Lookup structure:
//! - name → pool: the primary map. On a display-name collision the first
//!   registration keeps the name; later pools stay reachable by identity.
//! - template identity → pool: secondary index consulted first when a
//!   template is in hand, so two templates sharing a display name never
//!   collapse into one pool.
//! - template identity → derived name: memoized so repeated registrations do
//!   not recompute names.
//! - instance identity → pool name: reverse map populated on acquire and
//!   removed on release; release finds the owning pool in O(1). When the
//!   entry is missing the deterministic `"<poolName>_<suffix>"` display-name
//!   convention is parsed as a fallback.

use std::collections::HashMap;

use crate::foundation::collections::{
    InstanceKey, PoolKey, PoolMap, SecondaryMap, SlotMap, TemplateKey,
};
use crate::pool::pool::Pool;
use crate::pool::settings::PoolSettings;
use crate::scene::SceneWorld;

/// Errors from pool registration and resolution
#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    /// The settings reference a template that is not registered
    #[error("template {0:?} is not registered")]
    MissingTemplate(TemplateKey),

    /// No explicit name was given and none could be derived
    #[error("no pool name could be resolved for template {0:?}")]
    UnresolvableName(TemplateKey),

    /// A named lookup did not match any pool
    #[error("no pool named \"{0}\" exists")]
    UnknownPool(String),
}

/// Owner of all pools and their lookup maps
#[derive(Default)]
pub struct PoolRegistry {
    pools: PoolMap<Pool>,
    names: HashMap<PoolKey, String>,
    by_name: HashMap<String, PoolKey>,
    by_template: HashMap<TemplateKey, PoolKey>,
    derived_names: HashMap<TemplateKey, String>,
    instance_owner: SecondaryMap<InstanceKey, String>,
}

impl PoolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            pools: SlotMap::with_key(),
            names: HashMap::new(),
            by_name: HashMap::new(),
            by_template: HashMap::new(),
            derived_names: HashMap::new(),
            instance_owner: SecondaryMap::new(),
        }
    }

    /// Resolve the pool name for a registration
    ///
    /// An explicit name in the settings wins; otherwise the name is derived
    /// from the template's display name and memoized per template identity.
    pub fn resolve_name(
        &mut self,
        world: &SceneWorld,
        settings: &PoolSettings,
    ) -> Result<String, PoolError> {
        if let Some(name) = &settings.name {
            return Ok(name.clone());
        }
        if let Some(cached) = self.derived_names.get(&settings.template) {
            return Ok(cached.clone());
        }

        let template = world
            .template(settings.template)
            .ok_or(PoolError::UnresolvableName(settings.template))?;
        let derived = derive_name(&template.display_name);
        self.derived_names
            .insert(settings.template, derived.clone());
        Ok(derived)
    }

    /// Look up a pool by name
    pub fn pool_key_by_name(&self, name: &str) -> Option<PoolKey> {
        self.by_name.get(name).copied()
    }

    /// Look up a pool by template identity
    ///
    /// This is consulted before any name-based path whenever a template is
    /// in hand.
    pub fn pool_key_for_template(&self, template: TemplateKey) -> Option<PoolKey> {
        self.by_template.get(&template).copied()
    }

    /// Insert a pool and index it by name and template identity
    ///
    /// A name already claimed by an earlier pool stays with that pool; the
    /// new pool remains reachable through its template identity.
    pub fn insert_pool(&mut self, name: String, pool: Pool) -> PoolKey {
        let template = pool.settings().template;
        debug_assert!(
            !self.by_template.contains_key(&template),
            "a pool already exists for this template identity"
        );

        let key = self.pools.insert(pool);
        self.by_template.insert(template, key);
        if let Some(holder) = self.by_name.get(&name) {
            log::warn!(
                "pool name \"{name}\" is already taken by {holder:?}; \
                 the new pool stays reachable by template identity only"
            );
        } else {
            self.by_name.insert(name.clone(), key);
        }
        self.names.insert(key, name);
        key
    }

    /// The name a pool was registered under
    pub fn name_of(&self, key: PoolKey) -> Option<&str> {
        self.names.get(&key).map(String::as_str)
    }

    /// Borrow a pool
    pub fn pool(&self, key: PoolKey) -> Option<&Pool> {
        self.pools.get(key)
    }

    /// Borrow a pool mutably
    pub fn pool_mut(&mut self, key: PoolKey) -> Option<&mut Pool> {
        self.pools.get_mut(key)
    }

    /// Borrow the whole pool table mutably (allocator tick path)
    pub fn pools_mut(&mut self) -> &mut PoolMap<Pool> {
        &mut self.pools
    }

    /// Number of registered pools
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Keys of all registered pools
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        self.pools.keys().collect()
    }

    /// Record which pool an acquired instance belongs to
    pub fn record_owner(&mut self, instance: InstanceKey, pool_name: &str) {
        self.instance_owner.insert(instance, pool_name.to_string());
    }

    /// The owning pool name recorded for an active instance
    pub fn owner_of(&self, instance: InstanceKey) -> Option<&str> {
        self.instance_owner.get(instance).map(String::as_str)
    }

    /// Drop the ownership record for a released instance
    pub fn remove_owner(&mut self, instance: InstanceKey) {
        self.instance_owner.remove(instance);
    }

    /// Recover an instance's pool by parsing its display-name convention
    ///
    /// Acquired instances are renamed `"<poolName>_<suffix>"`, so the owning
    /// pool can be recovered even when the direct mapping was lost across a
    /// session boundary.
    pub fn owner_by_name_convention(
        &self,
        world: &SceneWorld,
        instance: InstanceKey,
    ) -> Option<(String, PoolKey)> {
        let display = world.display_name(instance)?;
        let (prefix, _suffix) = display.rsplit_once('_')?;
        let key = self.pool_key_by_name(prefix)?;
        Some((prefix.to_string(), key))
    }

    /// Drop every pool, index, and cache entry
    ///
    /// Must run on a session reset so no map keeps pointing at destroyed
    /// handles.
    pub fn clear(&mut self) {
        self.pools.clear();
        self.names.clear();
        self.by_name.clear();
        self.by_template.clear();
        self.derived_names.clear();
        self.instance_owner.clear();
    }
}

/// Derive a pool name from a template display name
fn derive_name(display_name: &str) -> String {
    display_name.trim().replace(char::is_whitespace, "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeKind, Template, TemplateNode};

    fn template(world: &mut SceneWorld, display: &str) -> TemplateKey {
        world.add_template(Template::new(
            display,
            TemplateNode::new(display, NodeKind::Spatial),
        ))
    }

    #[test]
    fn explicit_name_wins_over_derivation() {
        let mut world = SceneWorld::new();
        let key = template(&mut world, "boom");
        let mut registry = PoolRegistry::new();

        let settings = PoolSettings::new(key, 2).with_name("explosions");
        let name = registry.resolve_name(&world, &settings).unwrap();
        assert_eq!(name, "explosions");
    }

    #[test]
    fn derived_names_are_memoized() {
        let mut world = SceneWorld::new();
        let key = template(&mut world, "muzzle flash");
        let mut registry = PoolRegistry::new();

        let settings = PoolSettings::new(key, 2);
        assert_eq!(registry.resolve_name(&world, &settings).unwrap(), "muzzle-flash");

        // Second resolution is served from the cache.
        assert_eq!(registry.resolve_name(&world, &settings).unwrap(), "muzzle-flash");
    }

    #[test]
    fn colliding_display_names_keep_separate_pools() {
        let mut world = SceneWorld::new();
        let first = template(&mut world, "boom");
        let second = template(&mut world, "boom");
        let mut registry = PoolRegistry::new();

        let first_key = registry.insert_pool("boom".into(), Pool::new(PoolSettings::new(first, 1)));
        let second_key =
            registry.insert_pool("boom".into(), Pool::new(PoolSettings::new(second, 1)));

        assert_ne!(first_key, second_key);
        assert_eq!(registry.pool_key_for_template(first), Some(first_key));
        assert_eq!(registry.pool_key_for_template(second), Some(second_key));
        // The name stays with the first claimant.
        assert_eq!(registry.pool_key_by_name("boom"), Some(first_key));
    }

    #[test]
    fn name_convention_fallback_recovers_the_owner() {
        let mut world = SceneWorld::new();
        let key = template(&mut world, "bolt");
        let mut registry = PoolRegistry::new();
        let pool_key = registry.insert_pool("bolt".into(), Pool::new(PoolSettings::new(key, 1)));

        let instance = world.instantiate(key, None).unwrap();
        world.set_display_name(instance, "bolt_3f9a2c");

        let (name, found) = registry
            .owner_by_name_convention(&world, instance)
            .expect("fallback resolves");
        assert_eq!(name, "bolt");
        assert_eq!(found, pool_key);
    }

    #[test]
    fn clear_wipes_every_map() {
        let mut world = SceneWorld::new();
        let key = template(&mut world, "bolt");
        let mut registry = PoolRegistry::new();
        registry.insert_pool("bolt".into(), Pool::new(PoolSettings::new(key, 1)));

        let instance = world.instantiate(key, None).unwrap();
        registry.record_owner(instance, "bolt");

        registry.clear();
        assert_eq!(registry.pool_count(), 0);
        assert!(registry.pool_key_by_name("bolt").is_none());
        assert!(registry.pool_key_for_template(key).is_none());
        assert!(registry.owner_of(instance).is_none());
    }
}
