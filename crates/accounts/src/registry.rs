//! Registry of activated accounts

use crate::{account::SmartAccount, error::AccountError};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::info;

/// Holds the accounts activated in this process, keyed by a caller-chosen id
///
/// The registry exclusively owns the activated accounts; lookups hand out shared handles.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Arc<dyn SmartAccount>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates an account under the given id, replacing any previous entry
    pub fn activate(&self, id: impl Into<String>, account: Arc<dyn SmartAccount>) {
        let id = id.into();
        info!(account = %id, address = ?account.address(), "account activated");
        self.accounts.write().insert(id, account);
    }

    /// Looks up an activated account
    pub fn get(&self, id: &str) -> Result<Arc<dyn SmartAccount>, AccountError> {
        self.accounts
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AccountError::UnknownAccount { id: id.into() })
    }
}
