//! Route grid outcomes to host callbacks.
//!
//! [`GridState`](gridline_widgets::grid::GridState) reports what happened as
//! a list of [`GridOutcome`] values. Hosts implement [`GridHandler`] for the
//! callbacks they care about and hand each batch to [`dispatch`]. Every
//! method has a no-op default.

use gridline_core::event::MouseEvent;
use gridline_widgets::columns::ActiveColumnItem;
use gridline_widgets::grid::GridOutcome;
use gridline_widgets::sort::SortIntent;
use gridline_widgets::tree::RowId;

/// Host-side reactions to grid outcomes.
pub trait GridHandler {
    /// A leaf row was plain-clicked. `index` is its rendered position.
    fn row_activated(&mut self, row_id: &RowId, index: usize, event: &MouseEvent) {
        let _ = (row_id, index, event);
    }

    /// A row was expanded or collapsed. `None` means the toggle-all
    /// affordance was used.
    fn expansion_changed(&mut self, row_id: Option<&RowId>, expanded: bool) {
        let _ = (row_id, expanded);
    }

    /// Selected ids changed; rendered order first.
    fn selection_changed(&mut self, selected: &[RowId]) {
        let _ = selected;
    }

    /// The select-all control was used.
    fn select_all(&mut self, all_selected: bool) {
        let _ = all_selected;
    }

    /// The user asked for a different sort. The grid never sorts itself.
    fn sort_requested(&mut self, intent: &SortIntent) {
        let _ = intent;
    }

    /// Column order or visibility changed. The grid has already saved the
    /// layout through its store.
    fn columns_changed(&mut self, layout: &[ActiveColumnItem]) {
        let _ = layout;
    }

    /// The empty state's "Clear Filters" action was used.
    fn clear_filters(&mut self) {}
}

/// Deliver `outcomes` to `handler` in order. Returns how many were delivered.
pub fn dispatch<H, I>(handler: &mut H, outcomes: I) -> usize
where
    H: GridHandler + ?Sized,
    I: IntoIterator<Item = GridOutcome>,
{
    let mut delivered = 0;
    for outcome in outcomes {
        tracing::trace!(?outcome, "dispatching grid outcome");
        match outcome {
            GridOutcome::Activate {
                row_id,
                index,
                event,
            } => handler.row_activated(&row_id, index, &event),
            GridOutcome::ExpansionToggled { row_id, expanded } => {
                handler.expansion_changed(row_id.as_ref(), expanded);
            }
            GridOutcome::SelectionChanged(ids) => handler.selection_changed(&ids),
            GridOutcome::SelectAll(all) => handler.select_all(all),
            GridOutcome::Sort(intent) => handler.sort_requested(&intent),
            GridOutcome::LayoutChanged(layout) => handler.columns_changed(&layout),
            GridOutcome::ClearFilters => handler.clear_filters(),
        }
        delivered += 1;
    }
    delivered
}
