//! Session registry
//!
//! Maps opaque bearer tokens to accounts. Unknown or missing tokens get a
//! fresh token and a fresh account id; the caller persists the token with
//! the client (a cookie, in practice). Sessions live for the process
//! lifetime and are never destroyed.

use std::collections::HashMap;
use tracing::info;
use types::ids::{AccountId, SessionId};

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, AccountId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a token to an account, minting both when unknown
    ///
    /// Returns (session_id, account_id, created).
    pub fn resolve(&mut self, token: Option<&str>) -> (SessionId, AccountId, bool) {
        if let Some(token) = token {
            if let Some(account_id) = self.sessions.get(token) {
                return (SessionId::new(token), *account_id, false);
            }
        }

        let session_id = SessionId::generate();
        let account_id = AccountId::new();
        self.sessions
            .insert(session_id.as_str().to_string(), account_id);
        info!(account = %account_id, "created account for new session");
        (session_id, account_id, true)
    }

    /// Look up an existing session without creating one
    pub fn get(&self, token: &str) -> Option<AccountId> {
        self.sessions.get(token).copied()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
