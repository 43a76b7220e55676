//! # Vote Ledger
//!
//! Per post: at most one vote per user, plus a cached aggregate score that
//! must equal `(# upvotes) − (# downvotes)` after every transition. The
//! whole state machine lives in [`VoteLedger::cast`]; there is no other
//! arithmetic path to the counter.

use std::collections::{btree_map::Entry, BTreeMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two directions a voter can take on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    /// Contribution of a live vote of this kind to the aggregate score.
    pub fn weight(self) -> i64 {
        match self {
            VoteKind::Upvote => 1,
            VoteKind::Downvote => -1,
        }
    }
}

/// One voter's directional opinion on a post, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: VoteKind,
}

/// Which row of the transition table fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// First vote by this voter on this post.
    Added,
    /// Same kind repeated: the vote was toggled off.
    Removed,
    /// Opposite kind: the vote changed direction in place.
    Flipped,
}

impl CastOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CastOutcome::Added => "added",
            CastOutcome::Removed => "removed",
            CastOutcome::Flipped => "flipped",
        }
    }
}

/// Wire form of the ledger: the vote list plus the cached counter, exactly
/// as the client sees them on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerWire {
    #[serde(default)]
    votes: Vec<Vote>,
    #[serde(default)]
    vote_count: i64,
}

/// The vote set keyed by voter id, with the cached aggregate score.
///
/// Keyed lookup replaces the linear array scan of the original data model;
/// the observable behavior (and the serialized shape) is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LedgerWire", into = "LedgerWire")]
pub struct VoteLedger {
    by_voter: BTreeMap<Uuid, VoteKind>,
    score: i64,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrates a ledger from its stored parts. The stored count is
    /// trusted; every write path goes through [`cast`](Self::cast), which
    /// keeps it consistent. Duplicate entries for a voter collapse to the
    /// last one seen.
    pub fn from_parts(votes: Vec<Vote>, vote_count: i64) -> Self {
        let mut by_voter = BTreeMap::new();
        for vote in votes {
            by_voter.insert(vote.user_id, vote.kind);
        }
        Self {
            by_voter,
            score: vote_count,
        }
    }

    /// Applies one vote request. This is the exhaustive transition table:
    ///
    /// | existing | requested | action          | delta |
    /// |----------|-----------|-----------------|-------|
    /// | none     | up        | insert          | +1    |
    /// | none     | down      | insert          | −1    |
    /// | up       | up        | remove (toggle) | −1    |
    /// | up       | down      | flip in place   | −2    |
    /// | down     | down      | remove (toggle) | +1    |
    /// | down     | up        | flip in place   | +2    |
    ///
    /// The flip is a single in-place mutation, never remove-then-insert,
    /// so no intermediate state with a stale counter ever exists.
    pub fn cast(&mut self, voter: Uuid, kind: VoteKind) -> CastOutcome {
        let outcome = match self.by_voter.entry(voter) {
            Entry::Occupied(slot) if *slot.get() == kind => {
                slot.remove();
                self.score -= kind.weight();
                CastOutcome::Removed
            }
            Entry::Occupied(mut slot) => {
                slot.insert(kind);
                self.score += 2 * kind.weight();
                CastOutcome::Flipped
            }
            Entry::Vacant(slot) => {
                slot.insert(kind);
                self.score += kind.weight();
                CastOutcome::Added
            }
        };
        debug_assert_eq!(self.score, self.recount());
        outcome
    }

    /// The voter's current vote on this post, if any.
    pub fn vote_of(&self, voter: Uuid) -> Option<VoteKind> {
        self.by_voter.get(&voter).copied()
    }

    /// The cached aggregate score.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Number of live votes.
    pub fn len(&self) -> usize {
        self.by_voter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_voter.is_empty()
    }

    /// The live vote set in stable (voter-id) order.
    pub fn votes(&self) -> Vec<Vote> {
        self.by_voter
            .iter()
            .map(|(&user_id, &kind)| Vote { user_id, kind })
            .collect()
    }

    /// Recomputes the score from the live set. Used to check the cached
    /// counter invariant; never used as the write path.
    pub fn recount(&self) -> i64 {
        self.by_voter.values().map(|kind| kind.weight()).sum()
    }
}

impl From<LedgerWire> for VoteLedger {
    fn from(wire: LedgerWire) -> Self {
        VoteLedger::from_parts(wire.votes, wire.vote_count)
    }
}

impl From<VoteLedger> for LedgerWire {
    fn from(ledger: VoteLedger) -> Self {
        LedgerWire {
            vote_count: ledger.score(),
            votes: ledger.votes(),
        }
    }
}
