use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{CollectorId, ItemId, PostId, WatchId};
use crate::vote::{SubjectKind, SubjectRef, VoteTallies};

/// A validated 1–5 star rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, TypeError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeError::InvalidStars(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// What a review is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum RatingTarget {
    /// A catalog watch.
    Watch(WatchId),
    /// A collector's public profile (their vault as a whole).
    Profile(CollectorId),
}

impl fmt::Display for RatingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watch(id) => write!(f, "watch:{}", id.short_id()),
            Self::Profile(id) => write!(f, "profile:{}", id.short_id()),
        }
    }
}

/// The capability shared by every threadable, votable item.
///
/// Reviews, review replies and post comments all implement this, so thread
/// assembly and vote toggling have exactly one implementation each.
pub trait Threadable {
    fn id(&self) -> ItemId;
    fn parent_id(&self) -> Option<ItemId>;
    fn author(&self) -> CollectorId;
    fn created_at(&self) -> DateTime<Utc>;
    fn tallies(&self) -> VoteTallies;
    fn subject_kind(&self) -> SubjectKind;

    /// The vote subject this item is addressed by.
    fn subject(&self) -> SubjectRef {
        SubjectRef::new(self.subject_kind(), self.id())
    }
}

/// A top-level star rating, or a text-only reply beneath one.
///
/// Exactly one of `parent` and `stars` is set: top-level reviews carry a
/// rating and no parent, replies carry a parent and never a rating.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ItemId,
    pub author: CollectorId,
    pub target: RatingTarget,
    pub parent: Option<ItemId>,
    pub stars: Option<Stars>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tallies: VoteTallies,
}

impl Review {
    /// A new top-level rating.
    pub fn rating(
        author: CollectorId,
        target: RatingTarget,
        stars: Stars,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            author,
            target,
            parent: None,
            stars: Some(stars),
            body: body.into(),
            created_at: Utc::now(),
            edited_at: None,
            tallies: VoteTallies::default(),
        }
    }

    /// A new reply beneath `parent`, inheriting its target.
    pub fn reply(author: CollectorId, parent: &Review, body: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            author,
            target: parent.target,
            parent: Some(parent.id),
            stars: None,
            body: body.into(),
            created_at: Utc::now(),
            edited_at: None,
            tallies: VoteTallies::default(),
        }
    }

    /// Top-level ratings are the only reviews that count towards averages.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Checks the rating/reply shape: ratings have stars, replies do not.
    pub fn check_shape(&self) -> Result<(), TypeError> {
        match (self.parent, self.stars) {
            (None, Some(_)) | (Some(_), None) => Ok(()),
            (None, None) => Err(TypeError::MalformedReview("top-level rating without stars")),
            (Some(_), Some(_)) => Err(TypeError::MalformedReview("reply carrying stars")),
        }
    }
}

impl Threadable for Review {
    fn id(&self) -> ItemId {
        self.id
    }

    fn parent_id(&self) -> Option<ItemId> {
        self.parent
    }

    fn author(&self) -> CollectorId {
        self.author
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn tallies(&self) -> VoteTallies {
        self.tallies
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Review
    }
}

/// A threaded comment on a social post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: ItemId,
    pub post: PostId,
    pub author: CollectorId,
    pub parent: Option<ItemId>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tallies: VoteTallies,
}

impl Comment {
    pub fn new(
        post: PostId,
        author: CollectorId,
        parent: Option<ItemId>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(),
            post,
            author,
            parent,
            body: body.into(),
            created_at: Utc::now(),
            tallies: VoteTallies::default(),
        }
    }
}

impl Threadable for Comment {
    fn id(&self) -> ItemId {
        self.id
    }

    fn parent_id(&self) -> Option<ItemId> {
        self.parent
    }

    fn author(&self) -> CollectorId {
        self.author
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn tallies(&self) -> VoteTallies {
        self.tallies
    }

    fn subject_kind(&self) -> SubjectKind {
        SubjectKind::Comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_accept_one_through_five() {
        for value in 1..=5 {
            assert_eq!(Stars::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn stars_reject_out_of_range() {
        assert_eq!(Stars::new(0), Err(TypeError::InvalidStars(0)));
        assert_eq!(Stars::new(6), Err(TypeError::InvalidStars(6)));
    }

    #[test]
    fn stars_deserialize_through_validation() {
        assert!(serde_json::from_str::<Stars>("4").is_ok());
        assert!(serde_json::from_str::<Stars>("9").is_err());
    }

    #[test]
    fn reply_inherits_target_and_has_no_stars() {
        let target = RatingTarget::Profile(CollectorId::new());
        let stars = Stars::new(4).unwrap();
        let rating = Review::rating(CollectorId::new(), target, stars, "clean vault");
        let reply = Review::reply(CollectorId::new(), &rating, "agreed");

        assert!(rating.is_top_level());
        assert!(!reply.is_top_level());
        assert_eq!(reply.target, target);
        assert_eq!(reply.parent, Some(rating.id));
        assert!(reply.stars.is_none());
        assert!(rating.check_shape().is_ok());
        assert!(reply.check_shape().is_ok());
    }

    #[test]
    fn malformed_shapes_are_detected() {
        let target = RatingTarget::Watch(WatchId::new());
        let mut rating = Review::rating(CollectorId::new(), target, Stars::new(3).unwrap(), "");
        rating.stars = None;
        assert!(matches!(rating.check_shape(), Err(TypeError::MalformedReview(_))));

        rating.parent = Some(ItemId::new());
        rating.stars = Some(Stars::new(2).unwrap());
        assert!(matches!(rating.check_shape(), Err(TypeError::MalformedReview(_))));
    }

    #[test]
    fn threadable_subjects_carry_their_kind() {
        let comment = Comment::new(PostId::new(), CollectorId::new(), None, "nice lume");
        assert_eq!(comment.subject(), SubjectRef::comment(comment.id));

        let target = RatingTarget::Watch(WatchId::new());
        let review = Review::rating(CollectorId::new(), target, Stars::new(5).unwrap(), "grail");
        assert_eq!(review.subject(), SubjectRef::review(review.id));
    }
}
