//! TOML fixtures describing a small collector community.
//!
//! ```toml
//! collectors = ["alice", "bob"]
//! posts = ["launch"]
//!
//! [[watches]]
//! key = "nautilus"
//! brand = "Patek Philippe"
//! category = "Sport"
//! complications = ["date"]
//!
//! [[holdings]]
//! collector = "alice"
//! watch = "nautilus"
//!
//! [[ratings]]
//! key = "bob-on-alice"
//! author = "bob"
//! target = "profile:alice"
//! stars = 4
//! body = "great eye"
//!
//! [[replies]]
//! key = "thanks"
//! author = "alice"
//! parent = "bob-on-alice"
//! body = "thank you"
//!
//! [[comments]]
//! key = "first"
//! author = "bob"
//! post = "launch"
//! body = "congrats"
//!
//! [[votes]]
//! voter = "alice"
//! item = "bob-on-alice"
//! direction = "up"
//!
//! [[votes]]
//! voter = "alice"
//! kind = "comment"
//! item = "first"
//! direction = "down"
//! ```
//!
//! Names and keys are local to the file; loading assigns fresh ids. Votes
//! default to `kind = "review"`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, Context};
use caliber_sdk::{
    Caliber, CollectorId, InMemoryCaliberStore, ItemId, PostId, RatingTarget, SubjectKind,
    WatchId,
};
use caliber_types::Watch;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
    pub collectors: Vec<String>,
    pub posts: Vec<String>,
    pub watches: Vec<WatchEntry>,
    pub holdings: Vec<HoldingEntry>,
    pub ratings: Vec<RatingEntry>,
    pub replies: Vec<ReplyEntry>,
    pub comments: Vec<CommentEntry>,
    pub votes: Vec<VoteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchEntry {
    pub key: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub complications: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoldingEntry {
    pub collector: String,
    pub watch: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingEntry {
    pub key: String,
    pub author: String,
    pub target: String,
    pub stars: u8,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyEntry {
    pub key: String,
    pub author: String,
    pub parent: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentEntry {
    pub key: String,
    pub author: String,
    pub post: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteEntry {
    pub voter: String,
    #[serde(default)]
    pub kind: Option<SubjectKind>,
    pub item: String,
    pub direction: String,
}

/// Entries that may answer another entry of the same list.
trait Parented {
    fn key(&self) -> &str;
    fn parent(&self) -> Option<&str>;
}

impl Parented for ReplyEntry {
    fn key(&self) -> &str {
        &self.key
    }

    fn parent(&self) -> Option<&str> {
        Some(&self.parent)
    }
}

impl Parented for CommentEntry {
    fn key(&self) -> &str {
        &self.key
    }

    fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// Order `entries` so each comes after its parent. Parents already in
/// `known` may be answered at any point.
fn parents_first<'e, E: Parented>(
    entries: &'e [E],
    known: &BTreeMap<String, ItemId>,
) -> anyhow::Result<Vec<&'e E>> {
    let mut placed: BTreeSet<&'e str> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(entries.len());
    let mut pending: Vec<&'e E> = entries.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();
        for entry in pending {
            match entry.parent() {
                Some(parent) if !known.contains_key(parent) && !placed.contains(parent) => {
                    waiting.push(entry);
                }
                _ => {
                    placed.insert(entry.key());
                    ordered.push(entry);
                }
            }
        }
        if let Some(stuck) = waiting.first().filter(|_| waiting.len() == before) {
            bail!("`{}` has no known parent", stuck.key());
        }
        pending = waiting;
    }
    Ok(ordered)
}

/// Where `caliber thread` reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadTarget {
    Rated(RatingTarget),
    Post(PostId),
}

/// Ids assigned to the fixture's names and keys.
#[derive(Debug, Default)]
pub struct Loaded {
    pub collectors: BTreeMap<String, CollectorId>,
    pub posts: BTreeMap<String, PostId>,
    pub watches: BTreeMap<String, WatchId>,
    pub reviews: BTreeMap<String, ItemId>,
    pub comments: BTreeMap<String, ItemId>,
}

impl Loaded {
    pub fn collector(&self, name: &str) -> anyhow::Result<CollectorId> {
        self.collectors
            .get(name)
            .copied()
            .with_context(|| format!("unknown collector `{name}`"))
    }

    pub fn post(&self, key: &str) -> anyhow::Result<PostId> {
        self.posts
            .get(key)
            .copied()
            .with_context(|| format!("unknown post `{key}`"))
    }

    pub fn watch(&self, key: &str) -> anyhow::Result<WatchId> {
        self.watches
            .get(key)
            .copied()
            .with_context(|| format!("unknown watch `{key}`"))
    }

    pub fn review(&self, key: &str) -> anyhow::Result<ItemId> {
        self.reviews
            .get(key)
            .copied()
            .with_context(|| format!("unknown rating or reply `{key}`"))
    }

    pub fn comment(&self, key: &str) -> anyhow::Result<ItemId> {
        self.comments
            .get(key)
            .copied()
            .with_context(|| format!("unknown comment `{key}`"))
    }

    /// Resolve `profile:NAME` or `watch:KEY`.
    pub fn target(&self, raw: &str) -> anyhow::Result<RatingTarget> {
        match raw.split_once(':') {
            Some(("profile", name)) => Ok(RatingTarget::Profile(self.collector(name)?)),
            Some(("watch", key)) => Ok(RatingTarget::Watch(self.watch(key)?)),
            _ => bail!("target `{raw}` must be `profile:NAME` or `watch:KEY`"),
        }
    }

    /// Resolve a rating target or `post:KEY`.
    pub fn thread_target(&self, raw: &str) -> anyhow::Result<ThreadTarget> {
        match raw.split_once(':') {
            Some(("post", key)) => Ok(ThreadTarget::Post(self.post(key)?)),
            Some(("profile" | "watch", _)) => self.target(raw).map(ThreadTarget::Rated),
            _ => bail!("thread target `{raw}` must be `profile:NAME`, `watch:KEY` or `post:KEY`"),
        }
    }

    /// Display name for an author, or its short id if the fixture never
    /// named it.
    pub fn name_of(&self, id: CollectorId) -> String {
        self.collectors
            .iter()
            .find(|(_, known)| **known == id)
            .map_or_else(|| id.short_id(), |(name, _)| name.clone())
    }
}

impl Fixture {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid fixture")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    /// Replay the fixture through the facade.
    ///
    /// Collectors and watches are registered directly with the store; every
    /// other entry goes through the same operations an application would
    /// use, so profile stats are synced as a side effect.
    pub fn apply(&self, app: &Caliber<InMemoryCaliberStore>) -> anyhow::Result<Loaded> {
        let mut loaded = Loaded::default();

        for name in &self.collectors {
            let id = CollectorId::new();
            if loaded.collectors.insert(name.clone(), id).is_some() {
                bail!("collector `{name}` listed twice");
            }
            app.store().insert_collector(id)?;
        }
        for key in &self.posts {
            if loaded.posts.insert(key.clone(), PostId::new()).is_some() {
                bail!("post `{key}` listed twice");
            }
        }
        for entry in &self.watches {
            let watch = Watch::new(&entry.brand, &entry.category)
                .with_complications(entry.complications.iter().cloned());
            if loaded.watches.insert(entry.key.clone(), watch.id).is_some() {
                bail!("watch `{}` listed twice", entry.key);
            }
            app.store().insert_watch(watch)?;
        }

        for entry in &self.holdings {
            app.add_holding(
                loaded.collector(&entry.collector)?,
                loaded.watch(&entry.watch)?,
            )
            .with_context(|| format!("holding {}/{}", entry.collector, entry.watch))?;
        }

        for entry in &self.ratings {
            let review = app
                .post_rating(
                    loaded.collector(&entry.author)?,
                    loaded.target(&entry.target)?,
                    entry.stars,
                    entry.body.as_str(),
                )
                .with_context(|| format!("rating `{}`", entry.key))?;
            loaded.reviews.insert(entry.key.clone(), review.id);
        }

        for entry in parents_first(&self.replies, &loaded.reviews).context("replies")? {
            let reply = app
                .post_reply(
                    loaded.collector(&entry.author)?,
                    loaded.review(&entry.parent)?,
                    entry.body.as_str(),
                )
                .with_context(|| format!("reply `{}`", entry.key))?;
            loaded.reviews.insert(entry.key.clone(), reply.id);
        }

        for entry in parents_first(&self.comments, &BTreeMap::new()).context("comments")? {
            let parent = entry
                .parent
                .as_deref()
                .map(|key| loaded.comment(key))
                .transpose()?;
            let comment = app
                .post_comment(
                    loaded.collector(&entry.author)?,
                    loaded.post(&entry.post)?,
                    parent,
                    entry.body.as_str(),
                )
                .with_context(|| format!("comment `{}`", entry.key))?;
            loaded.comments.insert(entry.key.clone(), comment.id);
        }

        for entry in &self.votes {
            let kind = entry.kind.unwrap_or(SubjectKind::Review);
            let item = match kind {
                SubjectKind::Review => loaded.review(&entry.item)?,
                SubjectKind::Comment => loaded.comment(&entry.item)?,
            };
            app.cast_vote(loaded.collector(&entry.voter)?, kind, item, &entry.direction)
                .with_context(|| format!("vote by {} on {kind} {}", entry.voter, entry.item))?;
        }

        debug!(
            collectors = loaded.collectors.len(),
            watches = loaded.watches.len(),
            reviews = loaded.reviews.len(),
            comments = loaded.comments.len(),
            "fixture loaded"
        );
        Ok(loaded)
    }
}
