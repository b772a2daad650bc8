//! Property-based tests for handler table invariants.

use std::sync::Arc;

use proptest::prelude::*;
use softclock::registry::{HandlerTable, TickHandler};
use softclock::{ClockError, MAX_HANDLERS};

fn handler() -> TickHandler {
    Arc::new(|_| {})
}

/// One step of a register/unregister workload.
#[derive(Debug, Clone)]
enum Op {
    Insert,
    RemoveKnown(usize),
    RemoveUnknown,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Insert),
        2 => (0usize..MAX_HANDLERS).prop_map(Op::RemoveKnown),
        1 => Just(Op::RemoveUnknown),
    ]
}

proptest! {
    /// The table tracks a shadow model exactly, and the high-water mark
    /// stays within its bounds at every step.
    #[test]
    fn test_table_matches_model(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut table = HandlerTable::new();
        let mut model: Vec<TickHandler> = Vec::new();

        for op in ops {
            match op {
                Op::Insert => {
                    let h = handler();
                    if model.len() < MAX_HANDLERS {
                        prop_assert!(table.insert(h.clone()).is_ok());
                        model.push(h);
                    } else {
                        prop_assert!(
                            matches!(
                                table.insert(h),
                                Err(ClockError::CapacityExceeded { .. })
                            ),
                            "expected Err(ClockError::CapacityExceeded)"
                        );
                    }
                }
                Op::RemoveKnown(pick) => {
                    if !model.is_empty() {
                        let h = model.remove(pick % model.len());
                        prop_assert!(table.remove(&h).is_ok());
                    }
                }
                Op::RemoveUnknown => {
                    prop_assert!(matches!(
                        table.remove(&handler()),
                        Err(ClockError::NotRegistered)
                    ));
                }
            }

            // Invariants that must hold after every operation.
            prop_assert_eq!(table.len(), model.len());
            prop_assert!(table.high_water() <= MAX_HANDLERS);
            prop_assert!(table.high_water() >= table.len());
            prop_assert_eq!(table.is_empty(), model.is_empty());
            prop_assert_eq!(table.high_water() == 0, model.is_empty());
            for h in &model {
                prop_assert!(table.contains(h));
            }
        }
    }

    /// Draining a table in arbitrary order always walks the high-water mark
    /// back to zero: no trailing empties can survive.
    #[test]
    fn test_mark_returns_to_zero_after_full_drain(
        count in 1..=MAX_HANDLERS,
        seed in any::<u64>(),
    ) {
        let mut table = HandlerTable::new();
        let mut handlers: Vec<TickHandler> = Vec::new();
        for _ in 0..count {
            let h = handler();
            prop_assert!(table.insert(h.clone()).is_ok());
            handlers.push(h);
        }

        // Cheap deterministic shuffle driven by the seed.
        let mut order: Vec<usize> = (0..count).collect();
        let mut state = seed | 1;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            order.swap(i, j);
        }

        for &pick in &order {
            prop_assert!(table.remove(&handlers[pick]).is_ok());
        }

        prop_assert!(table.is_empty());
        prop_assert_eq!(table.high_water(), 0);
    }

    /// Iteration yields exactly the registered set, in slot order, never
    /// touching slots past the mark.
    #[test]
    fn test_iteration_is_exact(present in prop::collection::vec(any::<bool>(), MAX_HANDLERS)) {
        let mut table = HandlerTable::new();
        let mut kept: Vec<TickHandler> = Vec::new();

        // Insert one handler per flag, then remove the `false` ones; the
        // survivors keep their original relative order.
        let mut all: Vec<TickHandler> = Vec::new();
        for _ in 0..MAX_HANDLERS {
            let h = handler();
            prop_assert!(table.insert(h.clone()).is_ok());
            all.push(h);
        }
        for (h, keep) in all.iter().zip(&present) {
            if *keep {
                kept.push(h.clone());
            } else {
                prop_assert!(table.remove(h).is_ok());
            }
        }

        let seen: Vec<usize> = table
            .iter()
            .map(|h| {
                kept.iter()
                    .position(|k| softclock::same_handler(k, h))
                    .unwrap_or(usize::MAX)
            })
            .collect();
        let expected: Vec<usize> = (0..kept.len()).collect();
        prop_assert_eq!(seen, expected);
    }
}
