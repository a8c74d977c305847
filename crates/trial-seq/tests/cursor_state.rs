use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use serde_json::{json, Value};
use trial_core::{Condition, ConditionList, Method, RngHandle, TrialError};
use trial_seq::{CursorState, MemorySink, SequenceMatrix, Step, TrialCursor};

fn conditions(n: usize) -> ConditionList {
    ConditionList::new(
        (0..n)
            .map(|i| Condition::from_pairs(vec![("idx", json!(i))]).expect("condition"))
            .collect(),
    )
}

fn cursor(n_stim: usize, n_reps: usize, method: Method) -> TrialCursor {
    let mut rng = RngHandle::from_seed(2024);
    TrialCursor::build(conditions(n_stim), n_reps, method, &mut rng).expect("cursor")
}

fn idx(condition: &Condition) -> u64 {
    condition.get("idx").and_then(|v| v.as_u64()).expect("idx field")
}

#[test]
fn emits_exactly_n_total_trials_then_done() {
    for method in Method::ALL {
        let mut cursor = cursor(4, 3, method);
        let n_total = cursor.n_total();
        assert_eq!(n_total, 12);
        for _ in 0..n_total {
            assert!(!cursor.advance().is_done());
        }
        assert_eq!(cursor.advance(), Step::Done);
        assert!(cursor.is_finished());
        assert_eq!(cursor.advance(), Step::Done);
    }
}

#[test]
fn emitted_trials_follow_matrix_order() {
    let mut cursor = cursor(5, 2, Method::FullRandom);
    let expected = cursor.matrix().flatten();
    let mut seen = Vec::new();
    while let Step::Trial(condition) = cursor.advance() {
        assert_eq!(cursor.get_trial_index() as u64, idx(&condition));
        seen.push(idx(&condition) as usize);
    }
    assert_eq!(seen, expected);
}

#[test]
fn counters_keep_their_invariants() {
    let mut cursor = cursor(3, 2, Method::Random);
    assert_eq!(cursor.state(), CursorState::NotStarted);
    assert_eq!(cursor.this_n(), -1);
    assert_eq!(cursor.this_trial_n(), -1);
    assert_eq!(cursor.this_rep_n(), 0);
    assert!(!cursor.ran());
    assert!(cursor.trial().is_none());

    let n_total = cursor.n_total() as i64;
    let mut expected_n = 0;
    while let Step::Trial(_) = cursor.advance() {
        assert_eq!(cursor.state(), CursorState::Active);
        assert_eq!(cursor.this_n(), expected_n);
        assert_eq!(cursor.this_n() + cursor.n_remaining(), n_total - 1);
        assert_eq!(cursor.this_trial_n(), expected_n % 3);
        assert_eq!(cursor.this_rep_n(), expected_n / 3);
        assert_eq!(cursor.order(), Some(expected_n as usize));
        assert!(cursor.ran());
        expected_n += 1;
    }
    assert_eq!(cursor.state(), CursorState::Finished);
    assert!(cursor.trial().is_none());
}

#[test]
fn zero_repetitions_finish_immediately() {
    let mut cursor = cursor(3, 0, Method::Random);
    assert_eq!(cursor.advance(), Step::Done);
    assert_eq!(cursor.state(), CursorState::Finished);
    assert!(!cursor.ran());
}

#[test]
fn sentinel_list_runs_one_empty_trial_per_repetition() {
    let mut rng = RngHandle::from_seed(1);
    let mut cursor =
        TrialCursor::build(ConditionList::new(Vec::new()), 2, Method::Random, &mut rng).unwrap();
    assert_eq!(cursor.n_stim(), 1);
    assert!(cursor.get_attributes().is_empty());
    let trials: Vec<Condition> = cursor.by_ref().collect();
    assert_eq!(trials, vec![Condition::empty(), Condition::empty()]);
}

#[test]
fn future_trial_zero_matches_current() {
    let mut cursor = cursor(4, 2, Method::Random);
    while let Step::Trial(condition) = cursor.advance() {
        assert_eq!(cursor.get_future_trial(0), Some(cursor.get_current_trial()));
        assert_eq!(cursor.get_current_trial(), &condition);
    }
}

#[test]
fn future_trial_is_a_flat_lookup_in_list_order() {
    let matrix = SequenceMatrix::from_rows(Method::Random, 4, vec![vec![2, 0, 3, 1]]).unwrap();
    let mut cursor = TrialCursor::new(conditions(4), matrix).unwrap();
    cursor.advance();
    assert_eq!(cursor.get_trial_index(), 2);
    assert_eq!(idx(cursor.get_future_trial(1).unwrap()), 3);
    assert_eq!(idx(cursor.get_future_trial(-2).unwrap()), 0);
    assert_eq!(idx(cursor.get_earlier_trial(-1).unwrap()), 1);
    assert_eq!(idx(cursor.get_earlier_trial(1).unwrap()), 1);
    assert!(cursor.get_future_trial(-3).is_none());
    assert!(cursor.get_future_trial(2).is_none());
}

#[test]
fn future_trial_respects_remaining_count() {
    let matrix = SequenceMatrix::from_rows(Method::Sequential, 4, vec![vec![0, 1, 2, 3]]).unwrap();
    let mut cursor = TrialCursor::new(conditions(4), matrix).unwrap();
    cursor.advance();
    cursor.advance();
    assert_eq!(cursor.n_remaining(), 2);
    assert_eq!(idx(cursor.get_future_trial(2).unwrap()), 3);
    assert!(cursor.get_future_trial(3).is_none());
}

#[test]
fn set_trial_index_overrides_current_only() {
    let mut cursor = cursor(3, 1, Method::Sequential);
    cursor.advance();
    cursor.set_trial_index(2).expect("in range");
    assert_eq!(idx(cursor.get_current_trial()), 2);
    assert_eq!(cursor.this_n(), 0);
    assert_eq!(cursor.this_trial_n(), 0);

    let err = cursor.set_trial_index(3).unwrap_err();
    assert!(matches!(err, TrialError::Configuration(_)));
    assert_eq!(cursor.get_trial_index(), 2);
}

#[test]
fn add_data_forwards_to_sink_or_noops() {
    let mut bare = cursor(2, 1, Method::Sequential);
    bare.add_data("rt", json!(0.5));

    let sink = MemorySink::new();
    let mut cursor = cursor(2, 1, Method::Sequential).with_sink(Box::new(sink.clone()));
    cursor.advance();
    cursor.add_data("rt", json!(0.42));
    cursor.add_data("correct", json!(true));
    assert_eq!(
        sink.entries(),
        vec![
            ("rt".to_string(), json!(0.42)),
            ("correct".to_string(), json!(true))
        ]
    );
}

#[test]
fn closures_work_as_sinks() {
    let keys = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&keys);
    let mut cursor = cursor(2, 1, Method::Sequential).with_sink(Box::new(
        move |key: &str, _value: Value| recorded.borrow_mut().push(key.to_string()),
    ));
    cursor.add_data("resp", json!("left"));
    cursor.add_data("rt", json!(0.3));
    assert_eq!(*keys.borrow(), vec!["resp".to_string(), "rt".to_string()]);
}

#[test]
fn mismatched_matrix_is_rejected() {
    let matrix = SequenceMatrix::from_rows(Method::Sequential, 2, vec![vec![0, 1]]).unwrap();
    let err = TrialCursor::new(conditions(3), matrix).unwrap_err();
    assert_eq!(err.info().code, "matrix-shape-mismatch");
}

#[test]
fn snapshot_reports_position_and_trial() {
    let mut cursor = cursor(2, 2, Method::Sequential).with_name("practice");
    cursor.advance();
    cursor.advance();
    cursor.advance();
    let snapshot = cursor.snapshot();
    assert_eq!(snapshot.name, "practice");
    assert_eq!(snapshot.this_rep_n, 1);
    assert_eq!(snapshot.this_trial_n, 0);
    assert_eq!(snapshot.n_remaining, 1);
    assert_eq!(snapshot.order, Some(2));
    assert_eq!(snapshot.trial.as_ref().map(idx), Some(0));
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["state"], "active");
    assert_eq!(json["trial"]["idx"], 0);
}

#[test]
fn iterator_drains_all_trials() {
    let cursor = cursor(3, 4, Method::Random);
    assert_eq!(cursor.count(), 12);
}

#[test]
fn extreme_offsets_are_absent() {
    let mut cursor = cursor(3, 1, Method::Sequential);
    cursor.advance();
    cursor.advance();
    assert!(cursor.get_future_trial(i64::MAX).is_none());
    assert!(cursor.get_future_trial(i64::MIN).is_none());
    assert!(cursor.get_earlier_trial(i64::MAX).is_none());
    assert!(cursor.get_earlier_trial(i64::MIN).is_none());
    assert_eq!(idx(cursor.get_earlier_trial(1).unwrap()), 0);
}

proptest! {
    #[test]
    fn lookups_never_fault(offset in any::<i64>(), advances in 0usize..7) {
        let mut cursor = cursor(3, 2, Method::Random);
        for _ in 0..advances {
            cursor.advance();
        }
        if let Some(found) = cursor.get_future_trial(offset) {
            prop_assert!(offset <= cursor.n_remaining());
            prop_assert_eq!(
                idx(found) as i64,
                cursor.get_trial_index() as i64 + offset
            );
        }
        let _ = cursor.get_earlier_trial(offset);
    }
}
