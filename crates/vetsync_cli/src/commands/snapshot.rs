//! Snapshot command implementation.

use super::{open_existing, or_dash};
use std::path::Path;
use vetsync_core::ClientPortalSnapshot;
use vetsync_sync_protocol::UserId;

/// Runs the snapshot command.
pub fn run(path: &Path, user: &UserId, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let snapshot = store.snapshot(user);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        _ => print!("{}", render_text(user, &snapshot)),
    }
    Ok(())
}

fn render_text(user: &UserId, snapshot: &ClientPortalSnapshot) -> String {
    let mut out = format!("User: {user}\n");
    out.push_str(&format!(
        "Last synced: {}\n",
        snapshot
            .last_synced_at
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339())
    ));
    out.push_str(&format!(
        "Queued operations: {} ({} failed)\n",
        snapshot.pending_operations, snapshot.failed_operations
    ));

    out.push_str(&format!("\nPets ({}):\n", snapshot.pets.len()));
    for pet in &snapshot.pets {
        out.push_str(&format!(
            "  {}  {:<20} {:<10} {:<16} [{}]\n",
            pet.id,
            pet.name,
            pet.species,
            or_dash(pet.breed.as_deref()),
            pet.sync_state
        ));
    }

    out.push_str(&format!("\nAppointments ({}):\n", snapshot.appointments.len()));
    for view in &snapshot.appointments {
        let a = &view.appointment;
        let pet = view.pet.as_ref().map(|p| p.name.as_str());
        out.push_str(&format!(
            "  {}  {} {}  {:<20} {:<20} {} [{}]\n",
            a.id,
            a.preferred_date,
            a.preferred_time.format("%H:%M"),
            or_dash(pet),
            a.reason,
            a.status,
            a.sync_state
        ));
    }
    out
}
