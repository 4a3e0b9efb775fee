//! Admin allow-list management.
//!
//! Controls which chat users may reconfigure rosters and run assignments.

use rotabot_core::config::SecurityConfig;
use rotabot_core::types::Sender;
use std::collections::HashSet;

/// Allow-list of admin user ids and usernames.
pub struct Allowlist {
    user_ids: HashSet<i64>,
    usernames: HashSet<String>,
}

impl Allowlist {
    /// Create a new allowlist from security configuration.
    pub fn new(config: &SecurityConfig) -> Self {
        let mut list = Self {
            user_ids: HashSet::new(),
            usernames: HashSet::new(),
        };
        for entry in &config.admins {
            list.allow(entry);
        }
        if list.is_open() {
            tracing::warn!("⚠️ Admin allow-list is empty — every user may run /configure and /assign");
        }
        list
    }

    /// True when no admins are configured.
    pub fn is_open(&self) -> bool {
        self.user_ids.is_empty() && self.usernames.is_empty()
    }

    /// Check if a sender may run admin commands.
    pub fn is_allowed(&self, sender: &Sender) -> bool {
        if self.is_open() || self.user_ids.contains(&sender.id) {
            return true;
        }
        let allowed = sender
            .username
            .as_deref()
            .map(normalize_username)
            .is_some_and(|name| self.usernames.contains(&name));
        if !allowed {
            tracing::debug!(
                "Rejected admin command from {} ({})",
                sender.username.as_deref().unwrap_or("no username"),
                sender.id
            );
        }
        allowed
    }

    fn allow(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }
        match entry.parse::<i64>() {
            Ok(id) => {
                self.user_ids.insert(id);
            }
            Err(_) => {
                self.usernames.insert(normalize_username(entry));
            }
        }
    }

}

fn normalize_username(name: &str) -> String {
    name.trim().trim_start_matches('@').to_lowercase()
}
