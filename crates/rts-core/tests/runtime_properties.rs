use proptest::collection::vec;
use proptest::prelude::any;
use proptest::prop_assert_eq;
use proptest::test_runner::{Config, TestCaseError, TestRunner};

use rts_core::bigint;
use rts_core::blob_iter;
use rts_core::principal::{self, crc8};
use rts_core::text;
use rts_core::{Heap, HeapChecker, HeapObject, RtsConfig, RtsError, Word};

fn heap() -> Heap {
    Heap::new(RtsConfig::new())
}

fn runner() -> TestRunner {
    TestRunner::new(Config { cases: 256, failure_persistence: None, ..Default::default() })
}

#[test]
fn principal_round_trip() {
    runner()
        .run(&vec(any::<u8>(), 0..64), |bytes| {
            let text = principal::encode_principal(&bytes);
            prop_assert_eq!(&text[..3], "ic:");
            prop_assert_eq!(text.len(), 3 + 2 * bytes.len() + 2);
            let back = principal::decode_principal(text.as_bytes()).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(back, bytes);
            Ok(())
        })
        .expect("round trip");
}

#[test]
fn flipped_checksum_is_rejected() {
    let text = principal::encode_principal(b"identity");
    let mut bad = text.into_bytes();
    let last = bad.len() - 1;
    bad[last] = if bad[last] == b'0' { b'1' } else { b'0' };
    assert_eq!(principal::decode_principal(&bad), Err(RtsError::PrincipalCrcMismatch));
}

#[test]
fn crc_of_empty_is_zero() {
    assert_eq!(crc8(&[]), 0);
    assert_eq!(principal::encode_principal(&[]), "ic:00");
}

#[test]
fn grouped_form_is_lowercase_and_hyphenated() {
    runner()
        .run(&vec(0u8..0x80, 0..64), |src| {
            let out = principal::group_base32(&src);
            let n = src.len();
            let expected_len = if n == 0 { 0 } else { n + (n - 1) / 5 };
            prop_assert_eq!(out.len(), expected_len);
            for (i, &c) in src.iter().enumerate() {
                prop_assert_eq!(out[i + i / 5], c.to_ascii_lowercase());
            }
            for k in (5..out.len()).step_by(6) {
                prop_assert_eq!(out[k], b'-');
            }
            Ok(())
        })
        .expect("grouping");
}

#[test]
fn grouping_seven_letters() {
    assert_eq!(principal::group_base32(b"ABCDEFG"), b"abcde-fg");
    assert_eq!(principal::group_base32(b"ABCDE"), b"abcde");
    assert_eq!(principal::group_base32(b""), b"");
}

#[test]
fn bignum_survives_collection_with_neighbours_reclaimed() {
    let mut heap = heap();
    let mut roots = Vec::new();
    for i in 0..10u32 {
        text::text_of_str(&mut heap, "filler").expect("text");
        let v = bigint::bigint_of_decimal(&mut heap, &format!("{}000000000000000000000000", i + 1)).expect("parse");
        if i % 2 == 0 {
            roots.push((i, heap.add_root(v)));
        }
    }
    let before = heap.object_count();
    let stats = heap.collect().expect("gc");
    assert!(stats.reclaimed_bytes > 0);
    assert!(heap.object_count() < before);
    HeapChecker::check(&heap).expect("check");

    for (i, id) in roots {
        let h = heap.root(id).expect("root");
        assert_eq!(
            bigint::bigint_to_decimal(&heap, h).expect("render"),
            format!("{}000000000000000000000000", i + 1)
        );
    }

    // a second collection moves nothing
    let again = heap.collect().expect("gc");
    assert_eq!(again.moved_objects, 0);
    assert_eq!(again.reclaimed_bytes, 0);
}

#[test]
fn reachable_graph_is_preserved() {
    let mut heap = heap();
    let n = bigint::bigint_of_i64(&mut heap, -42).expect("of_i64");
    let boxed = heap.alloc(HeapObject::MutBox(Word::Ptr(n))).expect("alloc");
    let s = text::text_of_str(&mut heap, "payload").expect("text");
    let it = blob_iter::blob_iter(&mut heap, s).expect("iter");
    let pair = heap
        .alloc(HeapObject::Variant { tag: 7, field: Word::Ptr(boxed) })
        .expect("alloc");
    let obj = heap
        .alloc(HeapObject::Object { hash: pair, fields: vec![Word::Ptr(it), Word::Scalar(9)] })
        .expect("alloc");
    heap.alloc_blob(500).expect("alloc");
    let root = heap.add_root(obj);

    heap.collect().expect("gc");
    let obj = heap.root(root).expect("root");
    let HeapObject::Object { hash, fields } = heap.get(obj).expect("object").clone() else {
        panic!("expected object");
    };
    let HeapObject::Variant { tag: 7, field } = heap.get(hash).expect("variant").clone() else {
        panic!("expected variant");
    };
    let boxed = field.as_ptr().expect("ptr");
    let HeapObject::MutBox(Word::Ptr(n)) = heap.get(boxed).expect("box").clone() else {
        panic!("expected box");
    };
    assert_eq!(bigint::bigint_to_i64_trap(&heap, n).expect("trap"), -42);

    let it = fields[0].as_ptr().expect("ptr");
    assert_eq!(blob_iter::blob_iter_next(&mut heap, it).expect("next"), b'p');
}
