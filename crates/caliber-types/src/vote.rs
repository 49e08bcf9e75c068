use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{CollectorId, ItemId};

/// Direction of a cast vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// The other direction.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TypeError::EmptyDirection);
        }
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(TypeError::UnknownDirection(s.to_string())),
        }
    }
}

/// A voter's standing on one subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    #[default]
    None,
    Up,
    Down,
}

impl VoteState {
    /// The direction held in this state, if any.
    pub fn direction(&self) -> Option<VoteDirection> {
        match self {
            Self::None => None,
            Self::Up => Some(VoteDirection::Up),
            Self::Down => Some(VoteDirection::Down),
        }
    }
}

impl From<VoteDirection> for VoteState {
    fn from(direction: VoteDirection) -> Self {
        match direction {
            VoteDirection::Up => Self::Up,
            VoteDirection::Down => Self::Down,
        }
    }
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(direction: Option<VoteDirection>) -> Self {
        direction.map_or(Self::None, Self::from)
    }
}

/// The kind of item a vote is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    /// Helpfulness votes on a review or a reply.
    Review,
    /// Up/down votes on a post comment.
    Comment,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "review" | "rating" | "reply" => Ok(Self::Review),
            "comment" => Ok(Self::Comment),
            other => Err(TypeError::UnknownSubjectKind(other.to_string())),
        }
    }
}

/// A reference to a votable item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectRef {
    pub kind: SubjectKind,
    pub id: ItemId,
}

impl SubjectRef {
    pub fn new(kind: SubjectKind, id: ItemId) -> Self {
        Self { kind, id }
    }

    pub fn review(id: ItemId) -> Self {
        Self::new(SubjectKind::Review, id)
    }

    pub fn comment(id: ItemId) -> Self {
        Self::new(SubjectKind::Comment, id)
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id.short_id())
    }
}

/// A single vote row in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: CollectorId,
    pub subject: SubjectRef,
    pub direction: VoteDirection,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter: CollectorId, subject: SubjectRef, direction: VoteDirection) -> Self {
        Self {
            voter,
            subject,
            direction,
            cast_at: Utc::now(),
        }
    }
}

/// Cached up/down counts on a votable item.
///
/// Always equal to the number of vote rows for the subject, partitioned by
/// direction. Only [`TallyDelta`]s derived from a vote transition may move
/// them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteTallies {
    pub up: u64,
    pub down: u64,
}

impl VoteTallies {
    pub fn new(up: u64, down: u64) -> Self {
        Self { up, down }
    }

    /// Count vote rows by direction.
    pub fn count<'a, I>(votes: I) -> Self
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        votes.into_iter().fold(Self::default(), |mut acc, vote| {
            match vote.direction {
                VoteDirection::Up => acc.up += 1,
                VoteDirection::Down => acc.down += 1,
            }
            acc
        })
    }

    /// Up minus down.
    pub fn net(&self) -> i64 {
        self.up as i64 - self.down as i64
    }

    pub fn total(&self) -> u64 {
        self.up + self.down
    }

    /// Apply a delta, refusing to go below zero.
    pub fn apply(&self, delta: TallyDelta) -> Result<Self, TypeError> {
        Ok(Self {
            up: shift(self.up, delta.up, "up")?,
            down: shift(self.down, delta.down, "down")?,
        })
    }
}

fn shift(current: u64, delta: i64, direction: &'static str) -> Result<u64, TypeError> {
    current
        .checked_add_signed(delta)
        .ok_or(TypeError::TallyUnderflow {
            direction,
            current,
            delta,
        })
}

/// Signed change to a subject's tallies produced by one vote transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TallyDelta {
    pub up: i64,
    pub down: i64,
}

impl TallyDelta {
    pub const ZERO: Self = Self { up: 0, down: 0 };

    /// The delta that moves a voter's contribution from `before` to `after`.
    pub fn between(before: VoteState, after: VoteState) -> Self {
        let (up_before, down_before) = contribution(before);
        let (up_after, down_after) = contribution(after);
        Self {
            up: up_after - up_before,
            down: down_after - down_before,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

fn contribution(state: VoteState) -> (i64, i64) {
    match state {
        VoteState::None => (0, 0),
        VoteState::Up => (1, 0),
        VoteState::Down => (0, 1),
    }
}

/// A single mutation of the vote ledger, carrying the row state it expects
/// to find.
///
/// Stores apply the row change and [`VoteChange::delta`] to the subject's
/// cached tallies together, and refuse the change if the current row does
/// not match [`VoteChange::expected_before`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChange {
    /// No row existed; insert one.
    Insert(Vote),
    /// A row existed with `from`; flip it to `to` in place.
    Update {
        voter: CollectorId,
        subject: SubjectRef,
        from: VoteDirection,
        to: VoteDirection,
    },
    /// A row existed with `direction`; remove it.
    Delete {
        voter: CollectorId,
        subject: SubjectRef,
        direction: VoteDirection,
    },
}

impl VoteChange {
    pub fn voter(&self) -> CollectorId {
        match self {
            Self::Insert(vote) => vote.voter,
            Self::Update { voter, .. } | Self::Delete { voter, .. } => *voter,
        }
    }

    pub fn subject(&self) -> SubjectRef {
        match self {
            Self::Insert(vote) => vote.subject,
            Self::Update { subject, .. } | Self::Delete { subject, .. } => *subject,
        }
    }

    /// The voter's state the change was computed against.
    pub fn expected_before(&self) -> VoteState {
        match self {
            Self::Insert(_) => VoteState::None,
            Self::Update { from, .. } => (*from).into(),
            Self::Delete { direction, .. } => (*direction).into(),
        }
    }

    /// The voter's state once the change is applied.
    pub fn after(&self) -> VoteState {
        match self {
            Self::Insert(vote) => vote.direction.into(),
            Self::Update { to, .. } => (*to).into(),
            Self::Delete { .. } => VoteState::None,
        }
    }

    pub fn delta(&self) -> TallyDelta {
        TallyDelta::between(self.expected_before(), self.after())
    }
}
