#![forbid(unsafe_code)]

//! Row selection.
//!
//! [`SelectionState`] owns the selected id set and the range anchor. All
//! range math runs against the *currently rendered* id sequence passed in at
//! call time, never a snapshot, so expand/collapse between clicks is
//! honored.
//!
//! Selection is scoped to the loaded page. Ids that vanish after a data
//! refresh stay in the set, inert, until the host clears the selection.
//!
//! | Action | Effect | Anchor |
//! |--------|--------|--------|
//! | [`toggle`](SelectionState::toggle) | flip one id | set to the id |
//! | [`extend_range`](SelectionState::extend_range) | union anchor..=target | unchanged |
//! | [`select_all`](SelectionState::select_all) | all rendered, or clear | unchanged |

use std::collections::HashSet;

use crate::tree::RowId;

/// When the per-row checkbox is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckboxMode {
    /// Always drawn.
    #[default]
    AlwaysVisible,
    /// Drawn on the hovered row and on selected rows.
    OnHover,
    /// Never drawn; the checkbox column is omitted.
    Never,
}

impl CheckboxMode {
    /// Whether the checkbox column exists at all.
    #[inline]
    #[must_use]
    pub const fn has_column(self) -> bool {
        !matches!(self, CheckboxMode::Never)
    }

    /// Whether a row's checkbox is drawn.
    #[inline]
    #[must_use]
    pub const fn shows_for(self, hovered: bool, selected: bool) -> bool {
        match self {
            CheckboxMode::AlwaysVisible => true,
            CheckboxMode::OnHover => hovered || selected,
            CheckboxMode::Never => false,
        }
    }
}

/// Coarse selection state relative to the rendered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionStatus {
    Idle,
    PartiallySelected,
    AllSelected,
}

/// Visual state of the select-all checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectAllState {
    Unchecked,
    Indeterminate,
    Checked,
}

impl SelectAllState {
    /// Checkbox glyph.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            SelectAllState::Unchecked => "☐",
            SelectAllState::Indeterminate => "▣",
            SelectAllState::Checked => "☑",
        }
    }
}

/// Selected ids plus the range anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<RowId>,
    anchor: Option<RowId>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Last explicitly toggled id.
    #[must_use]
    pub fn anchor(&self) -> Option<&RowId> {
        self.anchor.as_ref()
    }

    /// Make `id` the range anchor without changing membership.
    pub fn set_anchor(&mut self, id: RowId) {
        self.anchor = Some(id);
    }

    /// Flip membership of `id` and make it the anchor. Returns the new
    /// membership.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        self.anchor = Some(id.clone());
        if self.selected.remove(id.as_str()) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    /// Union the inclusive range between the anchor's current position in
    /// `rendered` and `target` into the selection. Without a rendered
    /// anchor only `target` is selected, and it becomes the anchor.
    /// Out-of-range targets are ignored.
    pub fn extend_range(&mut self, rendered: &[RowId], target: usize) {
        let Some(target_id) = rendered.get(target) else {
            return;
        };
        let anchor_pos = self
            .anchor
            .as_ref()
            .and_then(|a| rendered.iter().position(|id| id == a));
        match anchor_pos {
            Some(a) => {
                let (lo, hi) = if a <= target { (a, target) } else { (target, a) };
                self.selected.extend(rendered[lo..=hi].iter().cloned());
            }
            None => {
                self.selected.insert(target_id.clone());
                self.anchor = Some(target_id.clone());
            }
        }
    }

    /// Select-all control: clears when the selection count already equals
    /// the rendered count, else selects exactly the rendered rows. Returns
    /// whether every rendered row is now selected.
    pub fn select_all(&mut self, rendered: &[RowId]) -> bool {
        if !rendered.is_empty() && self.selected.len() == rendered.len() {
            self.selected.clear();
            false
        } else {
            self.selected = rendered.iter().cloned().collect();
            !rendered.is_empty()
        }
    }

    /// Replace the selection programmatically.
    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.selected = ids.into_iter().collect();
    }

    /// Clear selection and anchor.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    #[must_use]
    pub fn status(&self, total_rendered: usize) -> SelectionStatus {
        match self.select_all_state(total_rendered) {
            SelectAllState::Unchecked => SelectionStatus::Idle,
            SelectAllState::Indeterminate => SelectionStatus::PartiallySelected,
            SelectAllState::Checked => SelectionStatus::AllSelected,
        }
    }

    /// Checked iff the count equals the rendered total (and there are rows);
    /// indeterminate for any other non-empty selection.
    #[must_use]
    pub fn select_all_state(&self, total_rendered: usize) -> SelectAllState {
        let n = self.selected.len();
        if n == 0 {
            SelectAllState::Unchecked
        } else if n == total_rendered {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }

    /// Selected ids: rendered order first, then stale ids sorted.
    #[must_use]
    pub fn ordered_ids(&self, rendered: &[RowId]) -> Vec<RowId> {
        let mut out: Vec<RowId> = rendered
            .iter()
            .filter(|id| self.selected.contains(id.as_str()))
            .cloned()
            .collect();
        let on_screen: HashSet<&str> = out.iter().map(RowId::as_str).collect();
        let mut stale: Vec<RowId> = self
            .selected
            .iter()
            .filter(|id| !on_screen.contains(id.as_str()))
            .cloned()
            .collect();
        stale.sort();
        out.extend(stale);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered_names(sel: &SelectionState, rendered: &[RowId]) -> Vec<String> {
        sel.ordered_ids(rendered)
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect()
    }

    fn rows(n: usize) -> Vec<RowId> {
        (0..n).map(|i| RowId::from(format!("r{i}"))).collect()
    }

    // ─── Toggle & range ───────────────────────────────────────────

    #[test]
    fn click_then_shift_click_selects_range() {
        let ids = rows(3);
        let mut sel = SelectionState::new();
        sel.toggle(&ids[0]);
        sel.extend_range(&ids, 2);
        assert_eq!(sel.ordered_ids(&ids), ids);
        assert_eq!(sel.anchor(), Some(&ids[0]));
    }

    #[test]
    fn range_is_unioned_not_replaced() {
        let ids = rows(6);
        let mut sel = SelectionState::new();
        sel.toggle(&ids[5]);
        sel.toggle(&ids[1]);
        sel.extend_range(&ids, 2);
        let got = ordered_names(&sel, &ids);
        assert_eq!(got, ["r1", "r2", "r5"]);
    }

    #[test]
    fn range_endpoints_commute() {
        let ids = rows(8);
        let mut forward = SelectionState::new();
        forward.toggle(&ids[3]);
        forward.extend_range(&ids, 6);
        forward.extend_range(&ids, 1);

        let mut backward = SelectionState::new();
        backward.toggle(&ids[3]);
        backward.extend_range(&ids, 1);
        backward.extend_range(&ids, 6);
        assert_eq!(forward, backward);
    }

    #[test]
    fn range_uses_anchor_position_at_click_time() {
        let mut ids = rows(5);
        let mut sel = SelectionState::new();
        sel.toggle(&ids[1]);
        // Rows inserted above the anchor (e.g. a parent expanded).
        ids.insert(0, RowId::from("new0"));
        ids.insert(0, RowId::from("new1"));
        sel.extend_range(&ids, 5);
        let got = ordered_names(&sel, &ids);
        assert_eq!(got, ["r1", "r2", "r3"]);
    }

    #[test]
    fn range_without_anchor_selects_target() {
        let ids = rows(4);
        let mut sel = SelectionState::new();
        sel.extend_range(&ids, 2);
        assert!(sel.contains("r2"));
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.anchor(), Some(&ids[2]));
        sel.extend_range(&ids, 99);
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn toggle_flips_and_moves_anchor() {
        let ids = rows(2);
        let mut sel = SelectionState::new();
        assert!(sel.toggle(&ids[0]));
        assert!(!sel.toggle(&ids[0]));
        assert!(sel.is_empty());
        assert_eq!(sel.anchor(), Some(&ids[0]));
    }

    // ─── Select all ───────────────────────────────────────────────

    #[test]
    fn select_all_toggles() {
        let ids = rows(3);
        let mut sel = SelectionState::new();
        sel.toggle(&ids[1]);
        assert_eq!(sel.select_all_state(3), SelectAllState::Indeterminate);
        assert!(sel.select_all(&ids));
        assert_eq!(sel.select_all_state(3), SelectAllState::Checked);
        assert_eq!(sel.status(3), SelectionStatus::AllSelected);
        assert!(!sel.select_all(&ids));
        assert_eq!(sel.status(3), SelectionStatus::Idle);
    }

    #[test]
    fn select_all_on_empty_page_is_noop() {
        let mut sel = SelectionState::new();
        assert!(!sel.select_all(&[]));
        assert_eq!(sel.select_all_state(0), SelectAllState::Unchecked);
    }

    #[test]
    fn stale_ids_keep_counting() {
        let ids = rows(2);
        let mut sel = SelectionState::new();
        sel.set_selected([RowId::from("old"), ids[0].clone()]);
        assert_eq!(sel.select_all_state(2), SelectAllState::Checked);
        let got = ordered_names(&sel, &ids);
        assert_eq!(got, ["r0", "old"]);
    }

    // ─── Checkbox modes ───────────────────────────────────────────

    #[test]
    fn checkbox_visibility() {
        assert!(CheckboxMode::AlwaysVisible.shows_for(false, false));
        assert!(CheckboxMode::OnHover.shows_for(true, false));
        assert!(CheckboxMode::OnHover.shows_for(false, true));
        assert!(!CheckboxMode::OnHover.shows_for(false, false));
        assert!(!CheckboxMode::Never.shows_for(true, true));
        assert!(!CheckboxMode::Never.has_column());
    }
}
