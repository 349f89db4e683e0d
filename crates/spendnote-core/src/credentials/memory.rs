//! In-process credential store

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{CredentialStore, Provider, Secret};
use crate::error::Result;

/// Credential store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: RwLock<HashMap<Provider, Secret>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one key
    pub fn with_key(provider: Provider, secret: Secret) -> Self {
        let store = Self::new();
        store
            .keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider, secret);
        store
    }
}

impl CredentialStore for MemoryStore {
    fn store(&self, provider: Provider, secret: &Secret) -> Result<()> {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider, secret.clone());
        Ok(())
    }

    fn get(&self, provider: Provider) -> Result<Option<Secret>> {
        Ok(self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider)
            .cloned())
    }

    fn delete(&self, provider: Provider) -> Result<()> {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&provider);
        Ok(())
    }
}
