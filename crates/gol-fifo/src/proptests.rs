use crate::{Capacity, Fifo, FifoError, Timeout, WaitPhase};
use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    Enqueue(u32),
    Dequeue,
    Len,
}

const MAX_OPS: usize = 128;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Enqueue),
        2 => Just(Op::Dequeue),
        1 => Just(Op::Len),
    ]
}

fn capacity_strategy() -> impl Strategy<Value = Capacity> {
    prop_oneof![
        Just(Capacity::Unbounded),
        // Small limits so the "full" path is hit often.
        (0usize..=4).prop_map(Capacity::Bounded),
    ]
}

fn run_against_model(capacity: Capacity, ops: &[Op]) -> TestCaseResult {
    let fifo = Fifo::create(capacity).unwrap();
    let mut model = VecDeque::new();

    for op in ops {
        match op {
            Op::Enqueue(v) => {
                let full = capacity.limit().is_some_and(|limit| model.len() >= limit);
                match fifo.enqueue(*v, Timeout::Immediate) {
                    Ok(()) => {
                        prop_assert!(!full, "enqueue succeeded on a full fifo");
                        model.push_back(*v);
                    }
                    Err(rejected) => {
                        prop_assert!(full, "enqueue rejected with free space");
                        prop_assert!(matches!(
                            rejected.error,
                            FifoError::Timeout(WaitPhase::Space)
                        ));
                        prop_assert_eq!(rejected.into_inner(), *v);
                    }
                }
            }
            Op::Dequeue => match fifo.dequeue(Timeout::Immediate) {
                Ok(v) => prop_assert_eq!(Some(v), model.pop_front()),
                Err(err) => {
                    prop_assert!(model.is_empty());
                    prop_assert!(matches!(err, FifoError::Timeout(WaitPhase::Data)));
                }
            },
            Op::Len => prop_assert_eq!(fifo.len(), model.len()),
        }

        if let Some(limit) = capacity.limit() {
            prop_assert!(fifo.len() <= limit);
        }
        prop_assert_eq!(fifo.waiting_consumers(), 0);
        prop_assert_eq!(fifo.waiting_producers(), 0);
    }

    prop_assert_eq!(fifo.destroy(), Vec::from(model));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn fifo_matches_vecdeque_model(
        capacity in capacity_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..MAX_OPS),
    ) {
        run_against_model(capacity, &ops)?;
    }
}
