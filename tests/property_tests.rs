//! Property-based тесты порядка вызова и отписки.

use std::sync::{Arc, Mutex};

use emitra::{define_event, Emitter};
use proptest::prelude::*;

define_event!(Ordered = "ordered", ());

const PROPTEST_CASES: u32 = 256;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// Порядок вызова совпадает со стабильной сортировкой по убыванию
    /// приоритета.
    #[test]
    fn prop_emit_order_is_stable_priority_sort(
        priorities in prop::collection::vec(-5i32..5, 0..40)
    ) {
        let emitter = Emitter::builder().max_listeners(0).build();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for (idx, p) in priorities.iter().copied().enumerate() {
            let calls = calls.clone();
            emitter.subscribe_with_priority::<Ordered, _>(
                move |_| calls.lock().unwrap().push(idx),
                p,
            );
        }
        emitter.emit::<Ordered>(&());

        let mut expected: Vec<usize> = (0..priorities.len()).collect();
        expected.sort_by_key(|&i| std::cmp::Reverse(priorities[i]));

        prop_assert_eq!(calls.lock().unwrap().clone(), expected);
    }

    /// После отписки произвольного подмножества остаются ровно
    /// неотписанные слушатели, в исходном порядке.
    #[test]
    fn prop_unsubscribe_subset(
        entries in prop::collection::vec((-3i32..3, any::<bool>()), 0..30)
    ) {
        let emitter = Emitter::builder().max_listeners(0).build();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let ids: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(idx, (p, _))| {
                let calls = calls.clone();
                emitter.subscribe_with_priority::<Ordered, _>(
                    move |_| calls.lock().unwrap().push(idx),
                    *p,
                )
            })
            .collect();

        for (id, (_, drop_it)) in ids.iter().zip(&entries) {
            if *drop_it {
                prop_assert!(emitter.unsubscribe(*id));
                prop_assert!(!emitter.unsubscribe(*id));
            }
        }
        emitter.emit::<Ordered>(&());

        let mut expected: Vec<usize> = (0..entries.len()).filter(|&i| !entries[i].1).collect();
        expected.sort_by_key(|&i| std::cmp::Reverse(entries[i].0));

        prop_assert_eq!(calls.lock().unwrap().clone(), expected);
        prop_assert_eq!(
            emitter.listener_count::<Ordered>(),
            entries.iter().filter(|(_, d)| !d).count()
        );
    }
}
