use std::cmp::Reverse;
use std::collections::HashMap;
use std::slice;

use caliber_types::{ItemId, Threadable};
use serde::Serialize;
use tracing::{debug, warn};

/// A threadable item with its replies.
///
/// Reply chains have no depth limit, so every walk over a tree (including
/// drop) uses an explicit stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeNode<T> {
    pub item: T,
    /// Direct replies, oldest first.
    pub children: Vec<TreeNode<T>>,
}

impl<T: Threadable> TreeNode<T> {
    fn leaf(item: T) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.item.id()
    }

    /// Number of items in this subtree, including this one.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            size += 1;
            stack.extend(node.children.iter());
        }
        size
    }

    /// Number of replies at any depth below this node.
    pub fn reply_count(&self) -> usize {
        self.size() - 1
    }

    /// Longest path from this node to a leaf, counting edges.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        height
    }

    /// Find the node holding `id` in this subtree.
    pub fn find(&self, id: ItemId) -> Option<&TreeNode<T>> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

impl<T> Drop for TreeNode<T> {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Total number of items in a forest.
pub fn count_items<T: Threadable>(forest: &[TreeNode<T>]) -> usize {
    forest.iter().map(TreeNode::size).sum()
}

/// Assemble flat items into a forest.
///
/// Items with a duplicate id keep only their first occurrence.
pub fn build_forest<T, I>(items: I) -> Vec<TreeNode<T>>
where
    T: Threadable,
    I: IntoIterator<Item = T>,
{
    let mut index: HashMap<ItemId, T> = HashMap::new();
    let mut order: Vec<ItemId> = Vec::new();
    for item in items {
        let id = item.id();
        if index.contains_key(&id) {
            warn!(id = %id, "duplicate thread item ignored");
            continue;
        }
        order.push(id);
        index.insert(id, item);
    }

    let mut children: HashMap<ItemId, Vec<ItemId>> = HashMap::new();
    let mut root_ids: Vec<ItemId> = Vec::new();
    for id in &order {
        match index[id].parent_id() {
            Some(parent) if parent != *id && index.contains_key(&parent) => {
                children.entry(parent).or_default().push(*id);
            }
            _ => root_ids.push(*id),
        }
    }

    let mut roots: Vec<TreeNode<T>> = root_ids
        .into_iter()
        .filter_map(|id| attach(id, &mut index, &children))
        .collect();

    // Whatever is left reaches no root through its parents, so its parent
    // chain ends in a cycle. Promote the oldest item on that cycle; the rest
    // of the cycle and everything hanging off it attach beneath.
    for id in &order {
        if !index.contains_key(id) {
            continue;
        }
        let entry = cycle_entry(*id, &index);
        warn!(id = %entry, "parent cycle broken; promoting item to root");
        if let Some(node) = attach(entry, &mut index, &children) {
            roots.push(node);
        }
    }

    roots.sort_by_key(|node| Reverse(node.item.created_at()));
    debug!(
        roots = roots.len(),
        items = order.len(),
        "thread forest built"
    );
    roots
}

/// Oldest item on the parent cycle reached from `start`.
fn cycle_entry<T: Threadable>(start: ItemId, index: &HashMap<ItemId, T>) -> ItemId {
    let mut path: Vec<ItemId> = Vec::new();
    let mut seen: HashMap<ItemId, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&from) = seen.get(&current) {
            return path[from..]
                .iter()
                .copied()
                .min_by_key(|id| (index[id].created_at(), *id))
                .unwrap_or(current);
        }
        seen.insert(current, path.len());
        path.push(current);
        match index.get(&current).and_then(|item| item.parent_id()) {
            Some(parent) if index.contains_key(&parent) => current = parent,
            _ => return current,
        }
    }
}

/// Remove `id` and its unclaimed descendants from `index` as a tree.
///
/// Post-order over an explicit stack: a node is finished, sorted and handed
/// to its parent once all of its replies have been.
fn attach<T: Threadable>(
    id: ItemId,
    index: &mut HashMap<ItemId, T>,
    children: &HashMap<ItemId, Vec<ItemId>>,
) -> Option<TreeNode<T>> {
    let item = index.remove(&id)?;
    let mut stack = vec![(TreeNode::leaf(item), replies_of(children, id))];
    while let Some((_, pending)) = stack.last_mut() {
        let next = pending.find_map(|child| index.remove(child).map(|item| (*child, item)));
        if let Some((child, item)) = next {
            stack.push((TreeNode::leaf(item), replies_of(children, child)));
            continue;
        }

        let Some((mut node, _)) = stack.pop() else {
            break;
        };
        node.children.sort_by_key(|child| child.item.created_at());
        match stack.last_mut() {
            Some((parent, _)) => parent.children.push(node),
            None => return Some(node),
        }
    }
    None
}

fn replies_of(children: &HashMap<ItemId, Vec<ItemId>>, id: ItemId) -> slice::Iter<'_, ItemId> {
    children.get(&id).map(|ids| ids.iter()).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use caliber_types::{CollectorId, SubjectKind, VoteTallies};
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;

    /// Minimal threadable item.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) struct Item {
        pub id: ItemId,
        pub parent: Option<ItemId>,
        pub author: CollectorId,
        pub at: DateTime<Utc>,
    }

    impl Threadable for Item {
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
            self.at
        }
        fn tallies(&self) -> VoteTallies {
            VoteTallies::default()
        }
        fn subject_kind(&self) -> SubjectKind {
            SubjectKind::Comment
        }
    }

    pub(crate) fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    pub(crate) fn item(seconds: i64, parent: Option<ItemId>) -> Item {
        Item {
            id: ItemId::new(),
            parent,
            author: CollectorId::new(),
            at: at(seconds),
        }
    }

    fn ids<T: Threadable>(nodes: &[TreeNode<T>]) -> Vec<ItemId> {
        nodes.iter().map(TreeNode::id).collect()
    }

    fn collect_ids<T: Threadable>(nodes: &[TreeNode<T>], out: &mut Vec<ItemId>) {
        let mut stack: Vec<&TreeNode<T>> = nodes.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node.id());
            stack.extend(node.children.iter().rev());
        }
    }

    /// root -> 1 -> 2 -> ... -> `depth`, each reply one second newer.
    pub(crate) fn reply_chain(depth: usize) -> Vec<Item> {
        let mut items = vec![item(0, None)];
        for step in 1..=depth {
            let parent = items[step - 1].id;
            items.push(item(step as i64, Some(parent)));
        }
        items
    }

    // -----------------------------------------------------------------------
    // Shape
    // -----------------------------------------------------------------------

    #[test]
    fn empty_input_is_empty_forest() {
        let forest: Vec<TreeNode<Item>> = build_forest(Vec::new());
        assert!(forest.is_empty());
    }

    #[test]
    fn replies_nest_under_parents() {
        let root = item(0, None);
        let reply = item(10, Some(root.id));
        let nested = item(20, Some(reply.id));
        let forest = build_forest(vec![nested.clone(), reply.clone(), root.clone()]);

        assert_eq!(ids(&forest), vec![root.id]);
        assert_eq!(ids(&forest[0].children), vec![reply.id]);
        assert_eq!(ids(&forest[0].children[0].children), vec![nested.id]);
        assert_eq!(forest[0].reply_count(), 2);
        assert_eq!(forest[0].height(), 2);
        assert_eq!(forest[0].find(nested.id).map(TreeNode::id), Some(nested.id));
    }

    #[test]
    fn roots_newest_first_children_oldest_first() {
        let old_root = item(0, None);
        let new_root = item(100, None);
        let late = item(50, Some(old_root.id));
        let early = item(5, Some(old_root.id));
        let forest = build_forest(vec![
            old_root.clone(),
            late.clone(),
            new_root.clone(),
            early.clone(),
        ]);

        assert_eq!(ids(&forest), vec![new_root.id, old_root.id]);
        assert_eq!(ids(&forest[1].children), vec![early.id, late.id]);
    }

    #[test]
    fn orphan_reply_becomes_root() {
        let orphan = item(10, Some(ItemId::new()));
        let root = item(0, None);
        let forest = build_forest(vec![root.clone(), orphan.clone()]);
        assert_eq!(ids(&forest), vec![orphan.id, root.id]);
    }

    #[test]
    fn self_parent_becomes_root() {
        let mut looped = item(0, None);
        looped.parent = Some(looped.id);
        let forest = build_forest(vec![looped.clone()]);
        assert_eq!(ids(&forest), vec![looped.id]);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn two_cycle_is_broken_at_oldest_member() {
        let mut a = item(0, None);
        let mut b = item(10, None);
        a.parent = Some(b.id);
        b.parent = Some(a.id);
        let tail = item(20, Some(b.id));

        let forest = build_forest(vec![b.clone(), tail.clone(), a.clone()]);
        assert_eq!(count_items(&forest), 3);
        assert_eq!(ids(&forest), vec![a.id]);
        assert_eq!(ids(&forest[0].children), vec![b.id]);
        assert_eq!(ids(&forest[0].children[0].children), vec![tail.id]);
    }

    #[test]
    fn reply_hanging_off_cycle_stays_with_its_parent() {
        let mut a = item(10, None);
        let mut b = item(20, None);
        a.parent = Some(b.id);
        b.parent = Some(a.id);
        let tail = item(0, Some(b.id));

        let forest = build_forest(vec![tail.clone(), a.clone(), b.clone()]);
        assert_eq!(ids(&forest), vec![a.id]);
        assert_eq!(ids(&forest[0].children), vec![b.id]);
        assert_eq!(ids(&forest[0].children[0].children), vec![tail.id]);
    }

    #[test]
    fn separate_cycles_each_get_a_root() {
        let mut a = item(0, None);
        let mut b = item(5, None);
        a.parent = Some(b.id);
        b.parent = Some(a.id);
        let mut c = item(30, None);
        let mut d = item(20, None);
        let mut e = item(40, None);
        c.parent = Some(e.id);
        d.parent = Some(c.id);
        e.parent = Some(d.id);

        let forest = build_forest(vec![a.clone(), c.clone(), b.clone(), e.clone(), d.clone()]);
        assert_eq!(count_items(&forest), 5);
        assert_eq!(ids(&forest), vec![d.id, a.id]);
        assert_eq!(forest[0].height(), 2);
        assert_eq!(ids(&forest[0].children), vec![e.id]);
    }

    #[test]
    fn very_deep_chain_builds_and_drops() {
        const DEPTH: usize = 100_000;
        let items = reply_chain(DEPTH);
        let deepest = items[DEPTH].id;

        let forest = build_forest(items.into_iter().rev());
        assert_eq!(forest.len(), 1);
        assert_eq!(count_items(&forest), DEPTH + 1);
        assert_eq!(forest[0].height(), DEPTH);
        assert_eq!(forest[0].find(deepest).map(TreeNode::id), Some(deepest));
        assert!(forest[0].find(ItemId::new()).is_none());
        drop(forest);
    }

    #[test]
    fn very_deep_cycle_is_broken() {
        let mut items = reply_chain(50_000);
        let last = items[50_000].id;
        items[0].parent = Some(last);
        let root = items[0].id;

        let forest = build_forest(items);
        assert_eq!(ids(&forest), vec![root]);
        assert_eq!(forest[0].reply_count(), 50_000);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let first = item(0, None);
        let mut second = first.clone();
        second.at = at(99);
        let forest = build_forest(vec![first.clone(), second]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].item, first);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Items whose parents point at arbitrary earlier, later, missing or
    /// self positions.
    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        proptest::collection::vec((0i64..1_000, proptest::option::of(0usize..40)), 0..40)
            .prop_map(|raw| {
                let ids: Vec<ItemId> = raw.iter().map(|_| ItemId::new()).collect();
                raw.iter()
                    .enumerate()
                    .map(|(index, (seconds, parent))| Item {
                        id: ids[index],
                        parent: parent.map(|p| ids.get(p).copied().unwrap_or_else(ItemId::new)),
                        author: CollectorId::new(),
                        at: at(*seconds),
                    })
                    .collect()
            })
    }

    fn assert_sorted<T: Threadable>(nodes: &[TreeNode<T>]) -> Result<(), TestCaseError> {
        for pair in nodes.windows(2) {
            prop_assert!(pair[0].item.created_at() <= pair[1].item.created_at());
        }
        for node in nodes {
            assert_sorted(&node.children)?;
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn every_item_appears_exactly_once(items in arb_items()) {
            let expected: HashSet<ItemId> = items.iter().map(|i| i.id).collect();
            let forest = build_forest(items);
            let mut seen = Vec::new();
            collect_ids(&forest, &mut seen);
            prop_assert_eq!(seen.len(), expected.len());
            prop_assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
        }

        #[test]
        fn roots_descend_and_children_ascend(items in arb_items()) {
            let forest = build_forest(items);
            for pair in forest.windows(2) {
                prop_assert!(pair[0].item.created_at() >= pair[1].item.created_at());
            }
            for root in &forest {
                assert_sorted(&root.children)?;
            }
        }

        #[test]
        fn children_point_at_their_parent(items in arb_items()) {
            fn check(node: &TreeNode<Item>) -> Result<(), TestCaseError> {
                for child in &node.children {
                    prop_assert_eq!(child.item.parent, Some(node.id()));
                    check(child)?;
                }
                Ok(())
            }
            for root in &build_forest(items) {
                check(root)?;
            }
        }

        #[test]
        fn roots_with_present_parent_lie_on_a_cycle(items in arb_items()) {
            let parents: HashMap<ItemId, Option<ItemId>> =
                items.iter().rev().map(|i| (i.id, i.parent)).collect();
            for root in &build_forest(items) {
                let Some(mut cursor) = root.item.parent.filter(|p| parents.contains_key(p)) else {
                    continue;
                };
                let mut steps = 0;
                while cursor != root.id() && steps <= parents.len() {
                    match parents[&cursor] {
                        Some(next) if parents.contains_key(&next) => cursor = next,
                        _ => break,
                    }
                    steps += 1;
                }
                prop_assert_eq!(cursor, root.id());
            }
        }
    }
}
