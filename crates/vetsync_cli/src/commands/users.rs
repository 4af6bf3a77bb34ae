//! Users command implementation.

use super::open_existing;
use serde::Serialize;
use std::path::Path;
use vetsync_core::{DurableStore, OperationStatus};

/// Per-user summary.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// User id.
    pub user: String,
    /// Number of pets stored locally.
    pub pets: usize,
    /// Number of appointment requests stored locally.
    pub appointments: usize,
    /// Number of queued operations.
    pub queued: usize,
    /// Number of failed operations.
    pub failed: usize,
}

/// Runs the users command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let users = collect(&store);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&users)?),
        _ => print!("{}", render_text(&users)),
    }
    Ok(())
}

/// Summarizes every user with local state, ordered by id.
pub fn collect(store: &DurableStore) -> Vec<UserSummary> {
    store
        .users()
        .into_iter()
        .map(|user| {
            store.read(&user, |scope| UserSummary {
                user: user.to_string(),
                pets: scope.pets.len(),
                appointments: scope.appointments.len(),
                queued: scope.operations.len(),
                failed: scope.count_operations(OperationStatus::Failed),
            })
        })
        .collect()
}

fn render_text(users: &[UserSummary]) -> String {
    if users.is_empty() {
        return "No users\n".to_string();
    }
    let mut out = String::new();
    for u in users {
        out.push_str(&format!(
            "{:<24} pets={} appointments={} queued={} failed={}\n",
            u.user, u.pets, u.appointments, u.queued, u.failed
        ));
    }
    out
}
