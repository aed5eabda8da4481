//! Group scan behavior tests
//!
//! - Deep scan bound to A returns exactly A and its descendants, in order
//! - Shallow scan returns at most A
//! - Limits end the stream early and leave the cursor idle
//! - Rebinding A -> B -> A gives the same rows as a fresh cursor on A
//! - Cancellation stops the stream with a distinct error

mod common;

use common::{hkeys, TestDb};
use hkeyexec::executor::{collect_rows, Bindings, CursorState, ExecutionErrorCode};
use hkeyexec::operator::{GroupScan, Limit, Operator};
use hkeyexec::row::{HKey, Value};

fn scan_at(db: &TestDb, hkey: HKey, deep: bool) -> Vec<HKey> {
    let scan = GroupScan::positional(db.group(), 0, deep);
    let mut bindings = Bindings::for_plan(&scan);
    bindings.set(0, hkey).unwrap();
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();
    hkeys(&collect_rows(cursor.as_mut(), &bindings).unwrap())
}

// =============================================================================
// Full Scan
// =============================================================================

#[test]
fn test_full_scan_order() {
    let db = TestDb::new();
    let scan = GroupScan::full(db.group());
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();
    let rows = collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();

    assert_eq!(
        hkeys(&rows),
        vec![
            db.c(1),
            db.o(1, 10),
            db.i(1, 10, 100),
            db.i(1, 10, 101),
            db.o(1, 11),
            db.a(1, 1),
            db.c(2),
            db.o(2, 20),
            db.c(3),
        ]
    );
    for pair in rows.windows(2) {
        assert!(pair[0].hkey() < pair[1].hkey());
    }
}

// =============================================================================
// Positional Scans
// =============================================================================

#[test]
fn test_deep_scan_is_exactly_the_subtree() {
    let db = TestDb::new();
    let all = scan_at(&db, db.c(1), true);

    assert_eq!(
        all,
        vec![
            db.c(1),
            db.o(1, 10),
            db.i(1, 10, 100),
            db.i(1, 10, 101),
            db.o(1, 11),
            db.a(1, 1),
        ]
    );
    let root = db.c(1);
    assert!(all.iter().all(|k| root.is_prefix_of(k)));
}

#[test]
fn test_deep_scan_of_leaf_and_middle() {
    let db = TestDb::new();
    assert_eq!(
        scan_at(&db, db.o(1, 10), true),
        vec![db.o(1, 10), db.i(1, 10, 100), db.i(1, 10, 101)]
    );
    assert_eq!(scan_at(&db, db.c(3), true), vec![db.c(3)]);
}

#[test]
fn test_deep_scan_of_missing_row() {
    let db = TestDb::new();
    assert!(scan_at(&db, db.c(9), true).is_empty());
    assert!(scan_at(&db, db.o(2, 21), true).is_empty());
}

#[test]
fn test_shallow_scan_returns_at_most_one_row() {
    let db = TestDb::new();
    assert_eq!(scan_at(&db, db.o(1, 10), false), vec![db.o(1, 10)]);
    assert!(scan_at(&db, db.c(9), false).is_empty());
}

#[test]
fn test_rebind_round_trip_matches_fresh_cursor() {
    let db = TestDb::new();
    let scan = GroupScan::positional(db.group(), 0, true);
    let context = db.context();
    let mut cursor = scan.cursor(&db.adapter, &context).unwrap();
    let mut bindings = Bindings::new(1);

    bindings.set(0, db.c(1)).unwrap();
    let first_a = collect_rows(cursor.as_mut(), &bindings).unwrap();

    bindings.set(0, db.c(2)).unwrap();
    let b = collect_rows(cursor.as_mut(), &bindings).unwrap();
    assert_eq!(hkeys(&b), vec![db.c(2), db.o(2, 20)]);

    bindings.set(0, db.c(1)).unwrap();
    let second_a = collect_rows(cursor.as_mut(), &bindings).unwrap();
    assert_eq!(first_a, second_a);

    let mut fresh = scan.cursor(&db.adapter, &context).unwrap();
    assert_eq!(collect_rows(fresh.as_mut(), &bindings).unwrap(), second_a);
    assert_eq!(context.metrics().snapshot().rebinds, 4);
}

#[test]
fn test_positional_scan_requires_hkey_binding() {
    let db = TestDb::new();
    let scan = GroupScan::positional(db.group(), 0, true);
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();

    let err = cursor.open(&Bindings::new(1)).unwrap_err();
    assert_eq!(err.code(), ExecutionErrorCode::HkxBindingUnset);

    let mut bindings = Bindings::new(1);
    bindings.set(0, Value::Text("c1".to_string())).unwrap();
    let err = cursor.open(&bindings).unwrap_err();
    assert_eq!(err.code(), ExecutionErrorCode::HkxBindingType);

    let err = cursor.open(&Bindings::new(0)).unwrap_err();
    assert_eq!(err.code(), ExecutionErrorCode::HkxBindingOutOfRange);
    assert_eq!(cursor.state(), CursorState::Idle);
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn test_row_limit_stops_before_the_limiting_row() {
    let db = TestDb::new();
    let scan = GroupScan::full(db.group()).with_limit(Limit::rows(3));
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();

    cursor.open(&Bindings::new(0)).unwrap();
    let mut produced = Vec::new();
    while let Some(row) = cursor.next().unwrap() {
        produced.push(row);
    }
    assert_eq!(hkeys(&produced), vec![db.c(1), db.o(1, 10), db.i(1, 10, 100)]);
    assert_eq!(cursor.state(), CursorState::Idle);
}

#[test]
fn test_per_table_limit_ends_at_first_capped_overflow() {
    let db = TestDb::new();
    let order = db.order.table_id().unwrap();
    let scan = GroupScan::full(db.group()).with_limit(Limit::per_table([(order, 1)]));
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();
    let rows = collect_rows(cursor.as_mut(), &Bindings::new(0)).unwrap();

    // The second order row (o11) reaches the limit
    assert_eq!(
        hkeys(&rows),
        vec![db.c(1), db.o(1, 10), db.i(1, 10, 100), db.i(1, 10, 101)]
    );
}

#[test]
fn test_limit_with_positional_scan() {
    let db = TestDb::new();
    let scan = GroupScan::positional(db.group(), 0, true).with_limit(Limit::rows(2));
    let mut bindings = Bindings::new(1);
    bindings.set(0, db.o(1, 10)).unwrap();
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();

    let rows = collect_rows(cursor.as_mut(), &bindings).unwrap();
    assert_eq!(hkeys(&rows), vec![db.o(1, 10), db.i(1, 10, 100)]);
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancellation_after_n_rows() {
    let db = TestDb::new();
    let scan = GroupScan::full(db.group());
    let context = db.context();
    let mut cursor = scan.cursor(&db.adapter, &context).unwrap();

    cursor.open(&Bindings::new(0)).unwrap();
    for _ in 0..3 {
        assert!(cursor.next().unwrap().is_some());
    }
    context.cancellation_token().cancel();

    let err = cursor.next().unwrap_err();
    assert!(err.is_cancellation());
    assert_eq!(err.code(), ExecutionErrorCode::HkxQueryCanceled);
    assert!(!err.is_contract_violation());

    // No later row is ever produced
    assert!(cursor.next().is_err());
    cursor.open(&Bindings::new(0)).unwrap();
    assert!(cursor.next().unwrap_err().is_cancellation());
    assert_eq!(context.metrics().rows_produced(), 3);
}

#[test]
fn test_cancellation_is_shared_across_cursors() {
    let db = TestDb::new();
    let scan = GroupScan::full(db.group());
    let context = db.context();
    let mut a = scan.cursor(&db.adapter, &context).unwrap();
    let mut b = scan.cursor(&db.adapter, &context).unwrap();
    a.open(&Bindings::new(0)).unwrap();
    b.open(&Bindings::new(0)).unwrap();

    context.cancellation_token().cancel();
    assert!(a.next().unwrap_err().is_cancellation());
    assert!(b.next().unwrap_err().is_cancellation());
}

// =============================================================================
// Concurrent Writes
// =============================================================================

#[test]
fn test_rows_are_owned_and_survive_later_writes() {
    let db = TestDb::new();
    let scan = GroupScan::positional(db.group(), 0, true);
    let mut bindings = Bindings::new(1);
    bindings.set(0, db.c(2)).unwrap();
    let mut cursor = scan.cursor(&db.adapter, &db.context()).unwrap();

    cursor.open(&bindings).unwrap();
    let first = cursor.next().unwrap().unwrap();
    db.insert(&db.order, db.o(2, 19), 19);
    db.insert(&db.order, db.o(2, 21), 21);

    // The scan resumes after the last returned hkey
    let rest = {
        let mut rest = Vec::new();
        while let Some(row) = cursor.next().unwrap() {
            rest.push(row);
        }
        rest
    };
    assert_eq!(first.hkey(), Some(&db.c(2)));
    assert_eq!(hkeys(&rest), vec![db.o(2, 19), db.o(2, 20), db.o(2, 21)]);
    assert_eq!(first.values(), &[Value::Int(2)]);
}
