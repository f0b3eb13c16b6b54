//! Junction state in the host's save file.
//!
//! Each persistent resource owns one named blob in the host's extension map.
//! The host never sees the junction types: it hands [`SaveableRegistry`] the
//! world and gets back (or passes in) `key -> bytes`.

use std::collections::BTreeMap;

use bevy::prelude::*;

/// A resource with a stable blob in the save file.
pub trait Saveable: Resource + Default {
    /// Extension-map key. Renaming it orphans existing saves.
    const SAVE_KEY: &'static str;

    /// `None` when there is nothing worth writing.
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// Decode a bitcode blob. A corrupt or outdated blob yields the default
/// value and a warning; a save never fails to load because of junctions.
pub fn decode_snapshot<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    bitcode::decode(bytes).unwrap_or_else(|e| {
        warn!(
            "Junction save blob '{}' ({} bytes) unreadable, using defaults: {}",
            key,
            bytes.len(),
            e
        );
        T::default()
    })
}

/// Monomorphized accessors for one registered resource type.
struct Persisted {
    key: &'static str,
    save: fn(&World) -> Option<Vec<u8>>,
    load: fn(&mut World, &[u8]),
    reset: fn(&mut World),
}

fn save_resource<T: Saveable>(world: &World) -> Option<Vec<u8>> {
    world.get_resource::<T>()?.save_to_bytes()
}

fn load_resource<T: Saveable>(world: &mut World, bytes: &[u8]) {
    world.insert_resource(T::load_from_bytes(bytes));
}

fn reset_resource<T: Saveable>(world: &mut World) {
    world.insert_resource(T::default());
}

/// Every persistent junction resource, in registration order.
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    persisted: Vec<Persisted>,
}

impl SaveableRegistry {
    /// Add `T`. Registering a key twice keeps the first entry and returns
    /// `false`.
    pub fn register<T: Saveable>(&mut self) -> bool {
        if self.persisted.iter().any(|p| p.key == T::SAVE_KEY) {
            warn!("Save key '{}' registered twice; keeping the first", T::SAVE_KEY);
            return false;
        }
        self.persisted.push(Persisted {
            key: T::SAVE_KEY,
            save: save_resource::<T>,
            load: load_resource::<T>,
            reset: reset_resource::<T>,
        });
        true
    }

    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        self.persisted
            .iter()
            .filter_map(|p| Some((p.key.to_string(), (p.save)(world)?)))
            .collect()
    }

    /// Restore every resource present in `extensions`. Keys this crate does
    /// not know are ignored; resources without a blob keep their value.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
        for persisted in &self.persisted {
            if let Some(bytes) = extensions.get(persisted.key) {
                (persisted.load)(world, bytes);
            }
        }
    }

    /// Return every registered resource to its default, as for a new map.
    pub fn reset_all(&self, world: &mut World) {
        for persisted in &self.persisted {
            (persisted.reset)(world);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.persisted.iter().map(|p| p.key)
    }
}

/// One-line registration from a plugin's `build`.
pub trait SaveableAppExt {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self;
}

impl SaveableAppExt for App {
    fn register_saveable<T: Saveable>(&mut self) -> &mut Self {
        self.init_resource::<SaveableRegistry>();
        self.world_mut()
            .resource_mut::<SaveableRegistry>()
            .register::<T>();
        self
    }
}
