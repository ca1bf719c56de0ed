use proptest::prelude::*;
use upstatic_rank::{filter, CandidateStore};
use upstatic_suggest::Navigator;

#[derive(Debug, Clone)]
enum Op {
    Next,
    Previous,
    Clear,
    Hover(usize),
    Unhover(usize),
    Query(String),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Next),
        2 => Just(Op::Previous),
        1 => Just(Op::Clear),
        1 => (0usize..8).prop_map(Op::Hover),
        1 => (0usize..8).prop_map(Op::Unhover),
        2 => "[abc ]{0,3}".prop_map(Op::Query),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn active_is_always_visible(
        texts in prop::collection::vec("[abc ]{0,6}", 0..8),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let store = CandidateStore::build(texts);
        let mut nav = Navigator::new();
        nav.apply(&filter(&store, ""));

        for op in ops {
            let before = nav.active();
            match op {
                Op::Next => {
                    nav.move_next();
                }
                Op::Previous => {
                    nav.move_previous();
                    if before.is_none() {
                        prop_assert_eq!(nav.active(), None);
                    }
                }
                Op::Clear => {
                    nav.clear();
                }
                Op::Hover(index) => {
                    prop_assert_eq!(nav.hover(index), nav.is_visible(index));
                }
                Op::Unhover(index) => {
                    nav.unhover(index);
                }
                Op::Query(query) => {
                    nav.apply(&filter(&store, &query));
                }
            }

            let state = nav.state();
            if let Some(active) = state.active {
                prop_assert!(state.visible.contains(&active));
            }
            prop_assert_eq!(state.visible.len(), nav.ordering().len());
        }
    }

    #[test]
    fn moves_walk_the_ordering(texts in prop::collection::vec("[ab]{1,4}", 1..8)) {
        let store = CandidateStore::build(texts);
        let results = filter(&store, "a");
        let mut nav = Navigator::new();
        nav.apply(&results);

        let ordering: Vec<usize> = results.indices().collect();
        let mut walked = Vec::new();
        for _ in 0..ordering.len() {
            if let Some(active) = nav.move_next().active {
                walked.push(active);
            }
        }
        prop_assert_eq!(walked, ordering);
    }
}
