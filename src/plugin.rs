// src/plugin.rs
//! Plugin hooks (spec §6.2). A `Plugin` implements the subset of lifecycle
//! hooks it cares about; the engine calls them synchronously at the named
//! points and `onBefore*` hooks may substitute their input by returning a
//! replacement.

use crate::error::Result;
use crate::value::{Document, Value};

pub trait Plugin: Send + Sync {
    fn on_init(&self) -> Result<()> {
        Ok(())
    }

    fn on_collection_create(&self, _collection: &str) -> Result<()> {
        Ok(())
    }

    fn on_before_insert(&self, _collection: &str, doc: Value) -> Result<Value> {
        Ok(doc)
    }

    fn on_after_insert(&self, _collection: &str, _doc: &Document) -> Result<()> {
        Ok(())
    }

    fn on_before_query(&self, _collection: &str, query: Value) -> Result<Value> {
        Ok(query)
    }

    fn on_after_query(&self, _collection: &str, _results: &[Document]) -> Result<()> {
        Ok(())
    }

    fn on_before_update(&self, _collection: &str, query: Value, update: Value) -> Result<(Value, Value)> {
        Ok((query, update))
    }

    fn on_after_update(&self, _collection: &str, _count: usize) -> Result<()> {
        Ok(())
    }

    fn on_before_delete(&self, _collection: &str, query: Value) -> Result<Value> {
        Ok(query)
    }

    fn on_after_delete(&self, _collection: &str, _count: usize) -> Result<()> {
        Ok(())
    }

    fn on_destroy(&self) -> Result<()> {
        Ok(())
    }
}

/// A Database's plugin set, dispatched in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        PluginRegistry::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn dispatch_init(&self) -> Result<()> {
        for p in &self.plugins {
            p.on_init()?;
        }
        Ok(())
    }

    pub fn dispatch_collection_create(&self, collection: &str) -> Result<()> {
        for p in &self.plugins {
            p.on_collection_create(collection)?;
        }
        Ok(())
    }

    pub fn dispatch_before_insert(&self, collection: &str, mut doc: Value) -> Result<Value> {
        for p in &self.plugins {
            doc = p.on_before_insert(collection, doc)?;
        }
        Ok(doc)
    }

    pub fn dispatch_after_insert(&self, collection: &str, doc: &Document) -> Result<()> {
        for p in &self.plugins {
            p.on_after_insert(collection, doc)?;
        }
        Ok(())
    }

    pub fn dispatch_before_query(&self, collection: &str, mut query: Value) -> Result<Value> {
        for p in &self.plugins {
            query = p.on_before_query(collection, query)?;
        }
        Ok(query)
    }

    pub fn dispatch_after_query(&self, collection: &str, results: &[Document]) -> Result<()> {
        for p in &self.plugins {
            p.on_after_query(collection, results)?;
        }
        Ok(())
    }

    pub fn dispatch_before_update(&self, collection: &str, mut query: Value, mut update: Value) -> Result<(Value, Value)> {
        for p in &self.plugins {
            let (q, u) = p.on_before_update(collection, query, update)?;
            query = q;
            update = u;
        }
        Ok((query, update))
    }

    pub fn dispatch_after_update(&self, collection: &str, count: usize) -> Result<()> {
        for p in &self.plugins {
            p.on_after_update(collection, count)?;
        }
        Ok(())
    }

    pub fn dispatch_before_delete(&self, collection: &str, mut query: Value) -> Result<Value> {
        for p in &self.plugins {
            query = p.on_before_delete(collection, query)?;
        }
        Ok(query)
    }

    pub fn dispatch_after_delete(&self, collection: &str, count: usize) -> Result<()> {
        for p in &self.plugins {
            p.on_after_delete(collection, count)?;
        }
        Ok(())
    }

    pub fn dispatch_destroy(&self) -> Result<()> {
        for p in &self.plugins {
            p.on_destroy()?;
        }
        Ok(())
    }
}
