//! Comment and reply tree assembly for Caliber.
//!
//! [`build_forest`] turns a flat list of [`Threadable`] items (reviews,
//! replies, post comments) into a rooted forest:
//!
//! - an item whose parent is present becomes that parent's child;
//! - an item whose parent is missing (deleted, never loaded) is a root;
//! - self-parented items and parent cycles are broken into roots, so every
//!   input item appears exactly once;
//! - roots are newest-first, children oldest-first.
//!
//! Display concerns sit on top of the tree without changing it:
//! [`flatten_for_display`] caps indentation depth, and [`ThreadViewState`]
//! tracks which reply lists are collapsed or paged open.
//!
//! [`Threadable`]: caliber_types::Threadable

pub mod display;
pub mod forest;
pub mod pagination;

pub use display::{flatten_for_display, visible_lines, DisplayRow, ThreadDisplayConfig, ThreadLine};
pub use forest::{build_forest, count_items, TreeNode};
pub use pagination::{RepliesView, ThreadViewState};
