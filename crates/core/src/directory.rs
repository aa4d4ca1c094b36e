//! Physician directory seam.
//!
//! Display names of registered physicians come from an external colleague directory. The
//! engine only reads names for display and never validates assistant candidates against it.

use medico_uuid::UserId;
use std::collections::HashMap;

pub trait UserDirectory: Send + Sync {
    /// Display name of a registered physician, if the directory knows them.
    fn display_name(&self, user: UserId) -> Option<String>;
}

/// Fixed name table, loaded at startup or built in tests.
#[derive(Clone, Debug, Default)]
pub struct StaticUserDirectory {
    names: HashMap<UserId, String>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserId, name: impl Into<String>) -> Self {
        self.names.insert(user, name.into());
        self
    }
}

impl UserDirectory for StaticUserDirectory {
    fn display_name(&self, user: UserId) -> Option<String> {
        self.names.get(&user).cloned()
    }
}
