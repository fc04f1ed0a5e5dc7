//! Optimistic-update lifecycle.
//!
//! Every mutating operation that applies a local change before the server
//! confirms it moves through this machine: the pre-mutation snapshot is held
//! while the call is in flight and restored on failure. `begin` refuses to
//! start while a mutation is already pending, which is the re-entrancy guard
//! the view-models rely on.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mutation<T> {
    #[default]
    Idle,
    Pending {
        snapshot: T,
    },
    Committed,
    RolledBack,
}

impl<T> Mutation<T> {
    /// Starts a mutation, capturing the pre-mutation snapshot. Returns
    /// `false` (and changes nothing) when one is already in flight.
    pub fn begin(&mut self, snapshot: T) -> bool {
        if self.is_pending() {
            return false;
        }
        *self = Self::Pending { snapshot };
        true
    }

    /// Marks the in-flight mutation as confirmed, dropping the snapshot.
    pub fn commit(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = Self::Committed;
        true
    }

    /// Aborts the in-flight mutation, handing back the snapshot to restore.
    pub fn roll_back(&mut self) -> Option<T> {
        match std::mem::replace(self, Self::RolledBack) {
            Self::Pending { snapshot } => Some(snapshot),
            previous => {
                *self = previous;
                None
            }
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}
