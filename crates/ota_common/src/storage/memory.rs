//! In-process object store with a call log and failure injection

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::ObjectStore;
use crate::error::{ReleaseError, Result};

const MEMORY_URL_BASE: &str = "memory://store";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read(String),
    Write(String),
    Exists(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: RefCell<BTreeMap<String, StoredObject>>,
    calls: RefCell<Vec<StoreCall>>,
    failing_reads: RefCell<BTreeSet<String>>,
    failing_writes: RefCell<BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a call
    pub fn insert(&self, key: &str, bytes: &[u8], content_type: &str) {
        self.objects.borrow_mut().insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.borrow().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn fail_reads_for(&self, key: &str) {
        self.failing_reads.borrow_mut().insert(key.to_string());
    }

    pub fn fail_writes_for(&self, key: &str) {
        self.failing_writes.borrow_mut().insert(key.to_string());
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.calls.borrow_mut().push(StoreCall::Read(key.to_string()));
        if self.failing_reads.borrow().contains(key) {
            return Err(ReleaseError::read_failed(key, "injected read failure"));
        }
        Ok(self.objects.borrow().get(key).map(|o| o.bytes.clone()))
    }

    fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        self.calls.borrow_mut().push(StoreCall::Write(key.to_string()));
        if self.failing_writes.borrow().contains(key) {
            return Err(ReleaseError::write_failed(key, "injected write failure"));
        }
        self.insert(key, bytes, content_type);
        Ok(format!("{}/{}", MEMORY_URL_BASE, key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.calls.borrow_mut().push(StoreCall::Exists(key.to_string()));
        Ok(self.objects.borrow().contains_key(key))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
