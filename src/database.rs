// src/database.rs
//! `Database`: the top-level registry of named Collections plus the
//! persistence and plugin collaborators shared across them (spec §4.12).

use crate::collection::Collection;
use crate::config::CollectionConfig;
use crate::error::Result;
use crate::persistence::PersistenceBackend;
use crate::plugin::{Plugin, PluginRegistry};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CollectionOptions {
    pub config: CollectionConfig,
}

/// Owns every `Collection` by name, the persistence back-end used by
/// `save`/`load`, and the plugin registry dispatched at the documented
/// lifecycle points.
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    persistence: Box<dyn PersistenceBackend>,
    plugins: RwLock<PluginRegistry>,
}

impl Database {
    pub fn new(persistence: Box<dyn PersistenceBackend>) -> Result<Self> {
        let db = Database {
            collections: RwLock::new(HashMap::new()),
            persistence,
            plugins: RwLock::new(PluginRegistry::new()),
        };
        db.plugins.read().dispatch_init()?;
        Ok(db)
    }

    pub fn register_plugin(&self, plugin: Box<dyn Plugin>) {
        self.plugins.write().register(plugin);
    }

    /// Get-or-create a named collection. `options` only applies the first
    /// time a name is seen; later calls with different options are ignored,
    /// matching a get-or-create contract rather than a reconfigure one.
    pub fn collection(&self, name: &str, options: CollectionOptions) -> Result<Arc<Collection>> {
        if let Some(existing) = self.collections.read().get(name) {
            return Ok(existing.clone());
        }
        let mut collections = self.collections.write();
        if let Some(existing) = collections.get(name) {
            return Ok(existing.clone());
        }
        let created = Arc::new(Collection::new(name, options.config));
        collections.insert(name.to_string(), created.clone());
        drop(collections);
        self.plugins.read().dispatch_collection_create(name)?;
        Ok(created)
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    /// Snapshot every collection's documents into the persistence back-end
    /// wholesale (spec §6.1: `save` always writes a complete view).
    pub fn save(&self) -> Result<()> {
        let collections = self.collections.read();
        let mut snapshot = HashMap::with_capacity(collections.len());
        for (name, collection) in collections.iter() {
            let docs = collection.find(&crate::query::Query::new(), &Default::default())?;
            snapshot.insert(name.clone(), docs);
        }
        self.persistence.save(snapshot)
    }

    /// Replace every named collection's document set (and rebuild its
    /// indexes) from whatever the persistence back-end last saved.
    pub fn load(&self, options: CollectionOptions) -> Result<()> {
        let snapshot = self.persistence.load()?;
        for (name, docs) in snapshot {
            let collection = self.collection(&name, options.clone())?;
            let ids_to_clear: Vec<_> = collection
                .find(&crate::query::Query::new(), &Default::default())?
                .into_iter()
                .map(|d| d.id)
                .collect();
            if !ids_to_clear.is_empty() {
                collection.delete_batch(
                    ids_to_clear
                        .into_iter()
                        .map(|id| crate::query::Query::from_value(crate::value::Value::Object(
                            [("id".to_string(), id_to_value(&id))].into_iter().collect(),
                        )))
                        .collect(),
                )?;
            }
            let values: Vec<crate::value::Value> = docs.into_iter().map(|d| d.to_projection()).collect();
            collection.insert_batch(values)?;
        }
        Ok(())
    }

    pub fn close(&self) -> Result<()> {
        self.plugins.read().dispatch_destroy()?;
        self.persistence.close()
    }
}

fn id_to_value(id: &crate::value::DocumentId) -> crate::value::Value {
    match id {
        crate::value::DocumentId::String(s) => crate::value::Value::String(s.clone()),
        crate::value::DocumentId::Number(n) => crate::value::Value::Number(*n as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBackend;
    use serde_json::json;

    #[test]
    fn collection_is_created_once_and_reused_by_name() {
        let db = Database::new(Box::new(MemoryBackend::new())).unwrap();
        let a = db.collection("users", CollectionOptions::default()).unwrap();
        let b = db.collection("users", CollectionOptions::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn save_then_load_restores_documents_into_a_fresh_database() {
        let backend = Arc::new(MemoryBackend::new());
        let db1 = Database::new(Box::new(MemoryBackendHandle(backend.clone()))).unwrap();
        let users = db1.collection("users", CollectionOptions::default()).unwrap();
        users.insert(crate::value::Value::from_json(&json!({"id": "1", "name": "Alice"}))).unwrap();
        db1.save().unwrap();

        let db2 = Database::new(Box::new(MemoryBackendHandle(backend))).unwrap();
        db2.load(CollectionOptions::default()).unwrap();
        let users2 = db2.collection("users", CollectionOptions::default()).unwrap();
        assert_eq!(users2.len(), 1);
    }

    struct MemoryBackendHandle(Arc<MemoryBackend>);
    impl PersistenceBackend for MemoryBackendHandle {
        fn load(&self) -> Result<HashMap<String, Vec<crate::value::Document>>> {
            self.0.load()
        }
        fn save(&self, snapshot: HashMap<String, Vec<crate::value::Document>>) -> Result<()> {
            self.0.save(snapshot)
        }
    }

    #[test]
    fn drop_collection_removes_it_from_the_registry() {
        let db = Database::new(Box::new(MemoryBackend::new())).unwrap();
        db.collection("users", CollectionOptions::default()).unwrap();
        assert!(db.drop_collection("users"));
        assert!(db.collection_names().is_empty());
    }
}
