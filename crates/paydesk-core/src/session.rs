//! Session values shared by several screens.
//!
//! The bearer token and the default company are read once from a store and
//! handed down explicitly, instead of each component reading global storage.

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub const TOKEN_KEY: &str = "token";
pub const DEFAULT_COMPANY_KEY: &str = "defaultCompany";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<String>,
    pub default_company: Option<String>,
}

impl SessionContext {
    pub fn load(store: &impl KeyValueStore) -> Self {
        Self {
            token: non_blank(store.get(TOKEN_KEY)),
            default_company: non_blank(store.get(DEFAULT_COMPANY_KEY)),
        }
    }

    /// Explicit values (e.g. from the environment) win over stored ones.
    pub fn with_overrides(mut self, token: Option<String>, default_company: Option<String>) -> Self {
        if let Some(token) = non_blank(token) {
            self.token = Some(token);
        }
        if let Some(company) = non_blank(default_company) {
            self.default_company = Some(company);
        }
        self
    }

    pub fn save(&self, store: &impl KeyValueStore) -> Result<(), StoreError> {
        match &self.token {
            Some(token) => store.set(TOKEN_KEY, token)?,
            None => store.remove(TOKEN_KEY)?,
        }
        match &self.default_company {
            Some(company) => store.set(DEFAULT_COMPANY_KEY, company)?,
            None => store.remove(DEFAULT_COMPANY_KEY)?,
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
