use std::collections::HashMap;

use caliber_types::ItemId;
use serde::{Deserialize, Serialize};

/// How many of one item's direct replies are revealed.
///
/// Starts collapsed. `expand` reveals the first page, `show_more` reveals the
/// next, `hide` collapses again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliesView {
    revealed: usize,
}

impl RepliesView {
    pub fn collapsed() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self) -> bool {
        self.revealed == 0
    }

    pub fn expand(&mut self, page_size: usize) {
        if self.is_collapsed() {
            self.revealed = page_size.max(1);
        }
    }

    /// Reveal another page, never past `total`.
    pub fn show_more(&mut self, page_size: usize, total: usize) {
        self.revealed = (self.revealed + page_size.max(1)).min(total.max(self.revealed));
    }

    pub fn hide(&mut self) {
        self.revealed = 0;
    }

    pub fn visible(&self, total: usize) -> usize {
        self.revealed.min(total)
    }

    pub fn remaining(&self, total: usize) -> usize {
        total - self.visible(total)
    }
}

/// Per-item reply visibility for one rendered thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadViewState {
    page_size: usize,
    views: HashMap<ItemId, RepliesView>,
}

impl ThreadViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            views: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn view(&self, id: ItemId) -> RepliesView {
        self.views.get(&id).copied().unwrap_or_default()
    }

    pub fn expand(&mut self, id: ItemId) {
        let page_size = self.page_size;
        self.views.entry(id).or_default().expand(page_size);
    }

    pub fn show_more(&mut self, id: ItemId, total: usize) {
        let page_size = self.page_size;
        self.views.entry(id).or_default().show_more(page_size, total);
    }

    pub fn hide(&mut self, id: ItemId) {
        self.views.remove(&id);
    }

    /// Expanded items.
    pub fn expanded(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.views
            .iter()
            .filter(|(_, view)| !view.is_collapsed())
            .map(|(id, _)| *id)
    }
}

impl Default for ThreadViewState {
    fn default() -> Self {
        Self::new(crate::display::ThreadDisplayConfig::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_lifecycle() {
        let mut view = RepliesView::collapsed();
        assert!(view.is_collapsed());
        assert_eq!(view.visible(7), 0);

        view.expand(3);
        assert_eq!(view.visible(7), 3);
        assert_eq!(view.remaining(7), 4);

        view.show_more(3, 7);
        assert_eq!(view.visible(7), 6);

        view.show_more(3, 7);
        assert_eq!(view.visible(7), 7);
        assert_eq!(view.remaining(7), 0);

        view.hide();
        assert!(view.is_collapsed());
    }

    #[test]
    fn expand_twice_does_not_grow() {
        let mut view = RepliesView::collapsed();
        view.expand(3);
        view.expand(3);
        assert_eq!(view.visible(10), 3);
    }

    #[test]
    fn visible_is_capped_by_total() {
        let mut view = RepliesView::collapsed();
        view.expand(3);
        assert_eq!(view.visible(2), 2);
        assert_eq!(view.remaining(2), 0);
    }

    #[test]
    fn state_tracks_items_independently() {
        let a = ItemId::new();
        let b = ItemId::new();
        let mut state = ThreadViewState::new(2);

        state.expand(a);
        state.show_more(a, 5);
        assert_eq!(state.view(a).visible(5), 4);
        assert!(state.view(b).is_collapsed());
        assert_eq!(state.expanded().collect::<Vec<_>>(), vec![a]);

        state.hide(a);
        assert!(state.view(a).is_collapsed());
    }

    #[test]
    fn zero_page_size_still_pages() {
        let mut state = ThreadViewState::new(0);
        let id = ItemId::new();
        state.expand(id);
        assert_eq!(state.view(id).visible(5), 1);
    }
}
