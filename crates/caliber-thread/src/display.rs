use caliber_types::{ItemId, Threadable};
use serde::{Deserialize, Serialize};

use crate::forest::TreeNode;
use crate::pagination::ThreadViewState;

/// Presentation knobs for rendered threads.
///
/// ```toml
/// page_size = 3
/// max_indent = 4
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadDisplayConfig {
    /// Replies revealed per expand / show-more step.
    pub page_size: usize,
    /// Deepest indentation level drawn; deeper replies render flush with it.
    pub max_indent: usize,
}

impl ThreadDisplayConfig {
    pub const DEFAULT_PAGE_SIZE: usize = 3;
    pub const DEFAULT_MAX_INDENT: usize = 4;

    pub fn view_state(&self) -> ThreadViewState {
        ThreadViewState::new(self.page_size)
    }
}

impl Default for ThreadDisplayConfig {
    fn default() -> Self {
        Self {
            page_size: Self::DEFAULT_PAGE_SIZE,
            max_indent: Self::DEFAULT_MAX_INDENT,
        }
    }
}

/// One item in a flattened thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayRow<'a, T> {
    pub item: &'a T,
    /// Tree depth; roots are 0.
    pub depth: usize,
    /// Depth capped at the configured maximum.
    pub indent: usize,
    /// Direct replies beneath this item.
    pub replies: usize,
}

/// Flatten a forest in display order (pre-order) with capped indentation.
pub fn flatten_for_display<T>(
    forest: &[TreeNode<T>],
    max_indent: usize,
) -> Vec<DisplayRow<'_, T>> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&TreeNode<T>, usize)> =
        forest.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        rows.push(DisplayRow {
            item: &node.item,
            depth,
            indent: depth.min(max_indent),
            replies: node.children.len(),
        });
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    rows
}

/// A line of a paginated thread: an item or a reply-list affordance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadLine<'a, T> {
    Item(DisplayRow<'a, T>),
    /// Collapsed replies that can be opened.
    ViewReplies { parent: ItemId, count: usize, indent: usize },
    /// More replies past the revealed page.
    ShowMore { parent: ItemId, remaining: usize, indent: usize },
    /// Collapse an open reply list.
    Hide { parent: ItemId, indent: usize },
}

/// Lines of a forest as currently paged open.
///
/// All roots are shown. Each item's direct replies are revealed per its
/// [`RepliesView`](crate::RepliesView) in `state`.
pub fn visible_lines<'a, T: Threadable>(
    forest: &'a [TreeNode<T>],
    state: &ThreadViewState,
    config: &ThreadDisplayConfig,
) -> Vec<ThreadLine<'a, T>> {
    enum Pending<'a, T> {
        Node(&'a TreeNode<T>, usize),
        Line(ThreadLine<'a, T>),
    }

    let mut lines = Vec::new();
    let mut stack: Vec<Pending<'a, T>> =
        forest.iter().rev().map(|root| Pending::Node(root, 0)).collect();
    while let Some(next) = stack.pop() {
        let (node, depth) = match next {
            Pending::Node(node, depth) => (node, depth),
            Pending::Line(line) => {
                lines.push(line);
                continue;
            }
        };

        let total = node.children.len();
        lines.push(ThreadLine::Item(DisplayRow {
            item: &node.item,
            depth,
            indent: depth.min(config.max_indent),
            replies: total,
        }));
        if total == 0 {
            continue;
        }

        let parent = node.id();
        let indent = (depth + 1).min(config.max_indent);
        let view = state.view(parent);
        if view.is_collapsed() {
            lines.push(ThreadLine::ViewReplies {
                parent,
                count: total,
                indent,
            });
            continue;
        }

        // Pushed in reverse: revealed replies, then show-more, then hide.
        stack.push(Pending::Line(ThreadLine::Hide { parent, indent }));
        let remaining = view.remaining(total);
        if remaining > 0 {
            stack.push(Pending::Line(ThreadLine::ShowMore {
                parent,
                remaining,
                indent,
            }));
        }
        stack.extend(
            node.children
                .iter()
                .take(view.visible(total))
                .rev()
                .map(|child| Pending::Node(child, depth + 1)),
        );
    }
    lines
}
