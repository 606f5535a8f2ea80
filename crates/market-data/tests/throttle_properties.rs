//! Property-based tests for the throttle.
//!
//! These run on the host clock; small sleeps between operations make sure
//! time actually moves while the sequence is applied.

use proptest::prelude::*;
use std::time::Duration;

use coinwatch_market_data::Throttle;

#[derive(Clone, Debug)]
enum Op {
    Consume,
    BackOff,
    Pause(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Consume),
        2 => Just(Op::BackOff),
        1 => (0u64..3).prop_map(Op::Pause),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn next_allowed_never_moves_backward(
        min_ms in 0u64..20,
        backoff_ms in 0u64..20,
        ops in proptest::collection::vec(arb_op(), 1..40),
    ) {
        let throttle = Throttle::new(
            Duration::from_millis(min_ms),
            Duration::from_millis(backoff_ms),
        );
        let mut previous = throttle.next_allowed();

        for op in ops {
            match op {
                Op::Consume => {
                    throttle.try_consume();
                }
                Op::BackOff => throttle.back_off(),
                Op::Pause(ms) => std::thread::sleep(Duration::from_millis(ms)),
            }
            let current = throttle.next_allowed();
            prop_assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn refused_consume_changes_nothing(min_secs in 1u64..3600) {
        let throttle = Throttle::new(Duration::from_secs(min_secs), Duration::ZERO);
        prop_assert!(throttle.try_consume());

        let before = throttle.next_allowed();
        prop_assert!(!throttle.try_consume());
        prop_assert_eq!(throttle.next_allowed(), before);
    }
}
