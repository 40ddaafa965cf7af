use std::panic::{self, AssertUnwindSafe};

use proptest::prelude::any;
use proptest::prop_assert_eq;
use proptest::test_runner::{Config, TestRunner};

use rts_host::{PanicHost, RecordingHost, RtsConfig, Runtime};

fn runtime() -> Runtime<PanicHost> {
    Runtime::new(RtsConfig::new(), PanicHost)
}

fn runner() -> TestRunner {
    TestRunner::new(Config { cases: 256, failure_persistence: None, ..Default::default() })
}

fn decode(rt: &mut Runtime<PanicHost>, s: &str) -> Vec<u8> {
    let t = rt.text_of_str(s);
    let b = rt.blob_of_principal(t);
    rt.blob_bytes(b).to_vec()
}

#[test]
fn identity_round_trip() {
    let mut rt = runtime();
    let samples: [&[u8]; 5] = [&[], &[0], &[0xFF], &[1, 2, 3, 4, 5, 6, 7], &[0xDE, 0xAD, 0xBE, 0xEF]];
    for bytes in samples {
        let b = rt.heap_mut().alloc_blob_from(bytes).expect("alloc");
        let t = rt.principal_of_blob(b);
        let back = rt.blob_of_principal(t);
        assert_eq!(rt.blob_bytes(back), bytes);
    }
}

#[test]
fn case_insensitive_scheme() {
    let mut rt = runtime();
    assert_eq!(decode(&mut rt, "IC:ABCDE2"), vec![0xAB, 0xCD]);
    assert_eq!(decode(&mut rt, "Ic:0000"), vec![0x00]);
}

#[test]
#[should_panic(expected = "blob_of_principal: too short for an ic: URL")]
fn decode_too_short_traps() {
    let mut rt = runtime();
    decode(&mut rt, "ic:0");
}

#[test]
#[should_panic(expected = "blob_of_principal: Wrong URL scheme (not 'ic:')")]
fn decode_wrong_scheme_traps() {
    let mut rt = runtime();
    decode(&mut rt, "ix:0000");
}

#[test]
#[should_panic(expected = "blob_of_principal: Not all uppercase hex digit")]
fn decode_lowercase_hex_traps() {
    let mut rt = runtime();
    decode(&mut rt, "ic:abcde2");
}

#[test]
#[should_panic(expected = "blob_of_principal: Not an even number of hex digits")]
fn decode_odd_digits_traps() {
    let mut rt = runtime();
    decode(&mut rt, "ic:0AB00");
}

#[test]
#[should_panic(expected = "blob_of_principal: CRC-8 mismatch")]
fn decode_checksum_mismatch_traps() {
    let mut rt = runtime();
    decode(&mut rt, "IC:00AA");
}

#[test]
fn grouping_seven_bytes() {
    let mut rt = runtime();
    let src = rt.text_of_str("AAAAAAA");
    let g = rt.base32_to_principal(src);
    assert_eq!(rt.blob_bytes(g), b"aaaaa-aa");
}

#[test]
fn u32_wrap_round_trip() {
    runner()
        .run(&any::<u32>(), |x| {
            let mut rt = runtime();
            let h = rt.bigint_of_u32(x);
            prop_assert_eq!(rt.bigint_to_u32_wrap(h), x);
            prop_assert_eq!(rt.bigint_to_u32_trap(h), x);
            Ok(())
        })
        .expect("u32");
}

#[test]
fn i32_trap_round_trip() {
    runner()
        .run(&any::<i32>(), |x| {
            let mut rt = runtime();
            let h = rt.bigint_of_i32(x);
            prop_assert_eq!(rt.bigint_to_i32_trap(h), x);
            prop_assert_eq!(rt.bigint_to_i32_wrap(h), x);
            Ok(())
        })
        .expect("i32");
}

#[test]
fn i64_trap_round_trip() {
    runner()
        .run(&any::<i64>(), |x| {
            let mut rt = runtime();
            let h = rt.bigint_of_i64(x);
            prop_assert_eq!(rt.bigint_to_i64_trap(h), x);
            prop_assert_eq!(rt.bigint_to_i32_wrap(h), x as i32);
            prop_assert_eq!(rt.bigint_to_u64_wrap(h), x as u64);
            Ok(())
        })
        .expect("i64");
}

#[test]
fn trap_round_trip_at_the_extremes() {
    let mut rt = runtime();
    for x in [i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX] {
        let h = rt.bigint_of_i32(x);
        assert_eq!(rt.bigint_to_i32_trap(h), x);
    }
    for x in [i64::MIN, -1, i64::MAX] {
        let h = rt.bigint_of_i64(x);
        assert_eq!(rt.bigint_to_i64_trap(h), x);
    }
}

#[test]
fn i32_wrap_keeps_low_bits() {
    let mut rt = runtime();
    let cases = [
        ("-1", -1),
        ("2147483648", i32::MIN),
        ("4294967301", 5),
        ("-2147483649", i32::MAX),
    ];
    for (text, expected) in cases {
        let h = rt.bigint_of_decimal(text);
        assert_eq!(rt.bigint_to_i32_wrap(h), expected, "{}", text);
    }
}

#[test]
#[should_panic(expected = "bigint: invalid operand")]
fn div_by_zero_traps() {
    let mut rt = runtime();
    let a = rt.bigint_of_u32(7);
    let z = rt.bigint_of_u32(0);
    rt.bigint_div(a, z);
}

#[test]
#[should_panic(expected = "bigint: value does not fit in u32")]
fn pow_with_negative_exponent_traps() {
    let mut rt = runtime();
    let a = rt.bigint_of_u32(3);
    let e = rt.bigint_of_i32(-2);
    rt.bigint_pow(a, e);
}

#[test]
#[should_panic(expected = "bigint: value does not fit in u32")]
fn pow_with_wide_exponent_traps() {
    let mut rt = runtime();
    let a = rt.bigint_of_u32(1);
    let e = rt.bigint_of_u64(1 << 32);
    rt.bigint_pow(a, e);
}

#[test]
#[should_panic(expected = "bigint: value does not fit in i32")]
fn i32_trap_rejects_two_to_the_31() {
    let mut rt = runtime();
    let h = rt.bigint_of_u32(0x8000_0000);
    rt.bigint_to_i32_trap(h);
}

#[test]
fn recorded_trap_message_names_the_rule() {
    let host = RecordingHost::new();
    let mut rt = Runtime::new(RtsConfig::new(), host.clone());
    let a = rt.bigint_of_u32(1);
    let z = rt.bigint_of_u32(0);

    let result = panic::catch_unwind(AssertUnwindSafe(|| rt.bigint_rem(a, z)));
    assert!(result.is_err());
    assert_eq!(host.messages(), vec!["bigint: invalid operand".to_string()]);
}

#[test]
fn heap_exhaustion_traps_with_out_of_memory() {
    let host = RecordingHost::new();
    let config = RtsConfig::new().with_heap_limit(0x1_0000 + 1024);
    let mut rt = Runtime::new(config, host.clone());
    let a = rt.bigint_of_u32(2);
    let e = rt.bigint_of_u32(100_000);

    let result = panic::catch_unwind(AssertUnwindSafe(|| rt.bigint_pow(a, e)));
    assert!(result.is_err());
    let log = host.messages();
    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("out of memory"), "{}", log[0]);
}

#[test]
fn oversized_calloc_traps_with_out_of_memory() {
    let host = RecordingHost::new();
    let mut rt = Runtime::new(RtsConfig::new(), host.clone());
    let before = rt.heap().heap_pointer();

    let result = panic::catch_unwind(AssertUnwindSafe(|| rt.mp_calloc(0xFFFF_0000, 1)));
    assert!(result.is_err());
    let log = host.messages();
    assert_eq!(log.len(), 1);
    assert!(log[0].starts_with("out of memory"), "{}", log[0]);
    assert_eq!(rt.heap().heap_pointer(), before);
}

#[test]
fn arithmetic_through_the_boundary() {
    let mut rt = runtime();
    let a = rt.bigint_of_decimal("-123456789012345678901234567890");
    let b = rt.bigint_of_i64(1_000_000_007);
    let q = rt.bigint_div(a, b);
    let r = rt.bigint_rem(a, b);
    let back = rt.bigint_mul(q, b);
    let back = rt.bigint_add(back, r);
    assert!(rt.bigint_eq(back, a));
    assert!(rt.bigint_isneg(r) || rt.bigint_count_bits(r) == 0);

    let one = rt.bigint_of_u32(1);
    let big = rt.bigint_lsh(one, 64);
    assert_eq!(rt.bigint_to_u64_wrap(big), 0);
    assert_eq!(rt.bigint_to_decimal(big), "18446744073709551616");
    let neg = rt.bigint_neg(big);
    let abs = rt.bigint_abs(neg);
    assert!(rt.bigint_lt(neg, abs) && rt.bigint_ge(abs, big) && rt.bigint_le(neg, big));
    assert!(rt.bigint_gt(big, one));
    let diff = rt.bigint_sub(abs, big);
    assert_eq!(rt.bigint_count_bits(diff), 0);
}

#[test]
fn blob_iteration_through_the_boundary() {
    let mut rt = runtime();
    let b = rt.text_of_str("abc");
    let it = rt.blob_iter(b);
    let mut out = Vec::new();
    while !rt.blob_iter_done(it) {
        out.push(rt.blob_iter_next(it));
    }
    assert_eq!(out, b"abc");
}
