//! Property-based tests for layout persistence.
//!
//! 1. Whatever a grid saves is what the store loads back.
//! 2. A registry restored from any stored layout shows every schema column
//!    exactly once, and a second restore is a fixed point.

use std::collections::HashSet;
use std::sync::Arc;

use gridline_runtime::{LayoutRegistry, PersistentLayoutStore};
use gridline_widgets::columns::{ActiveColumnItem, ColumnDef, ColumnRegistry};
use gridline_widgets::stateful::{LayoutStore, StateKey};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const IDS: [&str; 6] = ["name", "latency", "model", "cost", "tokens", "ghost"];

fn schema() -> Vec<ColumnDef> {
    IDS[..5]
        .iter()
        .map(|id| ColumnDef::new(*id, id.to_uppercase()))
        .collect()
}

fn layout_strategy() -> impl Strategy<Value = Vec<ActiveColumnItem>> {
    prop::collection::vec(
        (prop::sample::select(IDS.to_vec()), any::<bool>())
            .prop_map(|(id, shown)| ActiveColumnItem::new(id, "label", shown)),
        0..10,
    )
}

#[derive(Debug, Clone)]
enum Op {
    Move(usize, usize),
    Toggle(usize),
    Remove(usize),
    Add(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, 0usize..6).prop_map(|(a, b)| Op::Move(a, b)),
        (0usize..5).prop_map(Op::Toggle),
        (0usize..6).prop_map(Op::Remove),
        (0usize..5).prop_map(Op::Add),
    ]
}

proptest! {
    #[test]
    fn store_returns_last_saved_layout(layouts in prop::collection::vec(layout_strategy(), 1..5)) {
        let store = PersistentLayoutStore::new(LayoutRegistry::in_memory().shared());
        let key = StateKey::new("t", "s");
        for layout in &layouts {
            store.save(&key, layout);
        }
        prop_assert_eq!(store.load(&key), layouts.last().cloned());
    }

    #[test]
    fn restore_is_complete_and_stable(stored in layout_strategy()) {
        let registry = LayoutRegistry::in_memory().shared();
        registry.set("t::s", stored);
        let store: Arc<dyn LayoutStore> = Arc::new(PersistentLayoutStore::new(Arc::clone(&registry)));

        let first = ColumnRegistry::with_store(schema(), StateKey::new("t", "s"), Arc::clone(&store));
        let seen: HashSet<&str> = first.active().iter().map(|c| c.id.as_str()).collect();
        prop_assert_eq!(first.active().len(), 5);
        prop_assert_eq!(seen.len(), 5);

        registry.set("t::s", first.active().to_vec());
        let second = ColumnRegistry::with_store(schema(), StateKey::new("t", "s"), store);
        prop_assert_eq!(first.active(), second.active());
    }

    #[test]
    fn mutations_persist_exactly(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let registry = LayoutRegistry::in_memory().shared();
        let store: Arc<dyn LayoutStore> = Arc::new(PersistentLayoutStore::new(Arc::clone(&registry)));
        let key = StateKey::new("t", "s");
        let mut columns = ColumnRegistry::with_store(schema(), key.clone(), Arc::clone(&store));
        let mut mutated = false;
        for op in ops {
            mutated |= match op {
                Op::Move(a, b) => columns.move_column(a, b),
                Op::Toggle(i) => {
                    let id = IDS[i];
                    let shown = columns.is_visible(id);
                    columns.set_shown(id, !shown)
                }
                Op::Remove(i) => columns.remove_column(i).is_some(),
                Op::Add(i) => columns.add_column(IDS[i]),
            };
        }
        if mutated {
            prop_assert_eq!(store.load(&key), Some(columns.active().to_vec()));
        } else {
            prop_assert_eq!(store.load(&key), None);
        }
    }
}
