//! Queue command implementation.

use super::{open_existing, or_dash};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use vetsync_core::{OperationStatus, PendingOperation};
use vetsync_sync_protocol::UserId;

/// Queued operation representation for output.
#[derive(Debug, Serialize)]
pub struct OperationInfo {
    /// Operation id.
    pub id: String,
    /// Entity kind.
    pub entity_kind: String,
    /// Entity id.
    pub entity_id: String,
    /// `pending` or `failed`.
    pub status: &'static str,
    /// Failed remote attempts since the last retry.
    pub attempt_count: u32,
    /// Last remote error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the operation was queued.
    pub created_at: DateTime<Utc>,
}

impl From<&PendingOperation> for OperationInfo {
    fn from(op: &PendingOperation) -> Self {
        Self {
            id: op.id.to_string(),
            entity_kind: op.entity_kind().to_string(),
            entity_id: op.entity_id().to_string(),
            status: match op.status {
                OperationStatus::Pending => "pending",
                OperationStatus::Failed => "failed",
            },
            attempt_count: op.attempt_count,
            last_error: op.last_error.clone(),
            created_at: op.created_at,
        }
    }
}

/// Runs the queue command.
pub fn run(
    path: &Path,
    user: &UserId,
    failed_only: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let ops = collect(&store.queue().peek_all(user), failed_only);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&ops)?),
        _ => print!("{}", render_text(&ops)),
    }
    Ok(())
}

/// Converts queued operations, oldest first.
pub fn collect(ops: &[PendingOperation], failed_only: bool) -> Vec<OperationInfo> {
    ops.iter()
        .filter(|op| !failed_only || op.status == OperationStatus::Failed)
        .map(OperationInfo::from)
        .collect()
}

fn render_text(ops: &[OperationInfo]) -> String {
    if ops.is_empty() {
        return "Queue is empty\n".to_string();
    }
    let mut out = String::new();
    for op in ops {
        out.push_str(&format!(
            "{}  {:<20} {}  {:<7} attempts={} error={}\n",
            op.created_at.to_rfc3339(),
            op.entity_kind,
            op.entity_id,
            op.status,
            op.attempt_count,
            or_dash(op.last_error.as_deref())
        ));
    }
    out.push_str(&format!("\nTotal: {} operations\n", ops.len()));
    out
}
