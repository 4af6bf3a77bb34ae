//! Select queries for reconciliation reads.

use crate::ids::UserId;

/// Sort direction for the `created_at` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// A `select ... where user_id = ? order by created_at` query.
///
/// Reconciliation only ever reads one user's rows of one collection, so the
/// query is deliberately narrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    /// Only rows owned by this user.
    pub user_id: UserId,
    /// Ordering of the result by `created_at`.
    pub order: SortOrder,
}

impl SelectQuery {
    /// Selects all rows owned by `user_id`, newest first.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            order: SortOrder::Descending,
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}
