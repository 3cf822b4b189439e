//! Protocol-checked transaction state shared by transactional policies.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// `init` was called while a transaction was already open.
    InitWhileActive,
    /// `interact` (or another in-transaction call) without `init`.
    InteractWhileIdle,
    /// The policy is not attached to a part it can operate on.
    Unattached,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitWhileActive => "init_while_active",
            Self::InteractWhileIdle => "interact_while_idle",
            Self::Unattached => "unattached",
        }
    }
}

/// Policy lifecycle misuse. Fatal to the gesture, never to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolViolation {
    pub policy: &'static str,
    pub kind: ViolationKind,
}

impl ProtocolViolation {
    pub fn new(policy: &'static str, kind: ViolationKind) -> Self {
        Self { policy, kind }
    }
}

impl Display for ProtocolViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "protocol violation in policy `{}`: {}",
            self.policy,
            self.kind.as_str()
        )
    }
}

impl Error for ProtocolViolation {}

/// How a transaction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Produce the operation for the transient changes.
    Apply,
    /// Restore the pre-`init` state; produce nothing.
    Revert,
}

/// `Idle` (`None`) or `Active` with the snapshot taken at `init`.
#[derive(Debug)]
pub struct Transaction<S> {
    policy: &'static str,
    snapshot: Option<S>,
}

impl<S> Transaction<S> {
    pub const fn new(policy: &'static str) -> Self {
        Self {
            policy,
            snapshot: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Fails when a transaction is already open. Call before any side
    /// effect of `init`.
    pub fn ensure_idle(&self) -> Result<(), ProtocolViolation> {
        if self.is_active() {
            return Err(ProtocolViolation::new(
                self.policy,
                ViolationKind::InitWhileActive,
            ));
        }
        Ok(())
    }

    pub fn begin(&mut self, snapshot: S) -> Result<(), ProtocolViolation> {
        self.ensure_idle()?;
        self.snapshot = Some(snapshot);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<&S, ProtocolViolation> {
        self.snapshot.as_ref().ok_or(ProtocolViolation::new(
            self.policy,
            ViolationKind::InteractWhileIdle,
        ))
    }

    pub fn snapshot_mut(&mut self) -> Result<&mut S, ProtocolViolation> {
        let policy = self.policy;
        self.snapshot
            .as_mut()
            .ok_or(ProtocolViolation::new(policy, ViolationKind::InteractWhileIdle))
    }

    /// Closes the transaction. `None` when it was idle, which makes commit
    /// on an idle policy a no-op.
    pub fn finish(&mut self) -> Option<S> {
        self.snapshot.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{Transaction, ViolationKind};

    #[test]
    fn double_begin_is_a_violation() {
        let mut transaction = Transaction::new("sample");
        transaction.begin(1).expect("first begin");
        let err = transaction.begin(2).expect_err("second begin");
        assert_eq!(err.kind, ViolationKind::InitWhileActive);
        assert_eq!(transaction.snapshot().copied(), Ok(1));
    }

    #[test]
    fn idle_transactions_reject_interaction_and_finish_empty() {
        let mut transaction: Transaction<u8> = Transaction::new("sample");
        let err = transaction.snapshot_mut().expect_err("idle interaction");
        assert_eq!(err.kind, ViolationKind::InteractWhileIdle);
        assert_eq!(transaction.finish(), None);
    }
}
