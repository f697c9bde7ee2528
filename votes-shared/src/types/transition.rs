use super::{VoteDirection, VoteState};

/// Mutation the ledger must undergo for a `(user, post)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    /// Leave the ledger untouched.
    Keep,
    /// Create the entry with the given direction.
    Insert(VoteDirection),
    /// Flip an existing entry to the given direction.
    Update(VoteDirection),
    /// Delete the existing entry.
    Remove,
}

/// Decision taken by the vote state machine: what to write to the ledger and
/// how much the post aggregate moves.
///
/// `delta` is always the difference between the new and old ledger value of
/// the pair, so applying it keeps `points` equal to the ledger sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub action: LedgerAction,
    pub delta: i32,
}

impl VoteTransition {
    /// Transition for a vote request in `requested` direction.
    ///
    /// Requesting the direction already recorded is a no-op.
    pub fn for_vote(current: VoteState, requested: VoteDirection) -> Self {
        use VoteDirection::{Down, Up};
        use VoteState::{DownVoted, NoVote, UpVoted};

        match (current, requested) {
            (NoVote, direction) => Self::new(LedgerAction::Insert(direction), direction.value()),
            (UpVoted, Up) | (DownVoted, Down) => Self::unchanged(),
            (UpVoted, Down) => Self::new(LedgerAction::Update(Down), -2),
            (DownVoted, Up) => Self::new(LedgerAction::Update(Up), 2),
        }
    }

    /// Transition for a retraction request. Retracting nothing is a no-op.
    pub fn for_retraction(current: VoteState) -> Self {
        match current {
            VoteState::NoVote => Self::unchanged(),
            VoteState::UpVoted => Self::new(LedgerAction::Remove, -1),
            VoteState::DownVoted => Self::new(LedgerAction::Remove, 1),
        }
    }

    fn new(action: LedgerAction, delta: i32) -> Self {
        Self { action, delta }
    }

    fn unchanged() -> Self {
        Self::new(LedgerAction::Keep, 0)
    }

    /// Whether the transition writes anything at all.
    pub fn is_noop(&self) -> bool {
        self.action == LedgerAction::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteDirection::{Down, Up};
    use VoteState::{DownVoted, NoVote, UpVoted};

    fn value_of(state: VoteState) -> i32 {
        match state {
            NoVote => 0,
            UpVoted => 1,
            DownVoted => -1,
        }
    }

    fn state_after(state: VoteState, action: LedgerAction) -> VoteState {
        match action {
            LedgerAction::Keep => state,
            LedgerAction::Insert(d) | LedgerAction::Update(d) => Some(d).into(),
            LedgerAction::Remove => NoVote,
        }
    }

    #[test]
    fn test_first_votes_insert() {
        assert_eq!(
            VoteTransition::for_vote(NoVote, Up),
            VoteTransition { action: LedgerAction::Insert(Up), delta: 1 }
        );
        assert_eq!(
            VoteTransition::for_vote(NoVote, Down),
            VoteTransition { action: LedgerAction::Insert(Down), delta: -1 }
        );
    }

    #[test]
    fn test_switching_moves_by_two() {
        assert_eq!(
            VoteTransition::for_vote(UpVoted, Down),
            VoteTransition { action: LedgerAction::Update(Down), delta: -2 }
        );
        assert_eq!(
            VoteTransition::for_vote(DownVoted, Up),
            VoteTransition { action: LedgerAction::Update(Up), delta: 2 }
        );
    }

    #[test]
    fn test_repeating_a_vote_is_noop() {
        assert!(VoteTransition::for_vote(UpVoted, Up).is_noop());
        assert!(VoteTransition::for_vote(DownVoted, Down).is_noop());
        assert_eq!(VoteTransition::for_vote(UpVoted, Up).delta, 0);
    }

    #[test]
    fn test_retraction() {
        assert_eq!(
            VoteTransition::for_retraction(UpVoted),
            VoteTransition { action: LedgerAction::Remove, delta: -1 }
        );
        assert_eq!(
            VoteTransition::for_retraction(DownVoted),
            VoteTransition { action: LedgerAction::Remove, delta: 1 }
        );
        assert!(VoteTransition::for_retraction(NoVote).is_noop());
    }

    #[test]
    fn test_delta_matches_ledger_value_change() {
        for state in [NoVote, UpVoted, DownVoted] {
            for direction in [Up, Down] {
                let t = VoteTransition::for_vote(state, direction);
                let after = state_after(state, t.action);
                assert_eq!(value_of(after) - value_of(state), t.delta);
                assert_eq!(after, Some(direction).into());
            }
            let t = VoteTransition::for_retraction(state);
            assert_eq!(value_of(state_after(state, t.action)) - value_of(state), t.delta);
        }
    }
}
