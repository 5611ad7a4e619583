///
/// # Accessor Tests Against the Heap Runtime
///
/// End-to-end checks of the accessor lifecycle: empty accessors for absent
/// arrays, element reads for every kind, exactly-once release on every exit
/// path, denied acquisition, and both byte transforms under the pin and copy
/// acquisition strategies.
///

use std::panic::{catch_unwind, AssertUnwindSafe};

use pinarray_core::{
    exception, AccessError, BinaryData, BooleanArrayAccessor, ByteArrayAccessor, ExceptionKind,
    LongArrayAccessor, ReleaseMode,
};
use pinarray_heap::{AcquireStrategy, HeapEnv, HeapTag, PinStats, RuntimeCall};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn heaps() -> [HeapEnv; 2] {
    [HeapEnv::new(AcquireStrategy::Pin), HeapEnv::new(AcquireStrategy::Copy)]
}

#[test]
fn test_absent_array_makes_no_runtime_calls() {
    init_tracing();
    let env = HeapEnv::default();
    {
        let bytes = ByteArrayAccessor::new(&env, None).unwrap();
        let bools = BooleanArrayAccessor::new(&env, None).unwrap();
        let longs = LongArrayAccessor::new(&env, None).unwrap();

        assert_eq!(bytes.size(), 0);
        assert!(bytes.data().is_null());
        assert_eq!(bools.size(), 0);
        assert!(bools.data().is_null());
        assert_eq!(longs.size(), 0);
        assert!(longs.data().is_null());
    }
    assert_eq!(env.stats(), PinStats::default());
    assert!(env.calls().is_empty());
}

#[test]
fn test_present_array_round_trip_all_kinds() {
    init_tracing();
    for env in heaps() {
        let bytes: Vec<i8> = (-64..64).collect();
        let longs = [i64::MIN, -1, 0, 1, i64::MAX];
        let bools = [true, false, false, true];

        let byte_arr = env.new_byte_array(&bytes).unwrap();
        let long_arr = env.new_long_array(&longs).unwrap();
        let bool_arr = env.new_boolean_array(&bools).unwrap();

        let b = ByteArrayAccessor::new(&env, Some(byte_arr)).unwrap();
        assert_eq!(b.size(), bytes.len());
        for (i, expected) in bytes.iter().enumerate() {
            assert_eq!(b[i], *expected, "byte {} under {:?}", i, env.strategy());
        }

        let l = LongArrayAccessor::new(&env, Some(long_arr)).unwrap();
        assert_eq!(l.size(), longs.len());
        assert_eq!(l.as_slice(), &longs);

        let z = BooleanArrayAccessor::new(&env, Some(bool_arr)).unwrap();
        assert_eq!(z.size(), bools.len());
        for (i, expected) in bools.iter().enumerate() {
            assert_eq!(z.get_bool(i), Some(*expected));
        }
        assert_eq!(z.get_bool(bools.len()), None);
    }
}

#[test]
fn test_release_happens_exactly_once_at_drop() {
    init_tracing();
    for env in heaps() {
        let arr = env.new_byte_array(&[1, 2, 3]).unwrap();

        let acc = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
        assert_eq!(env.stats().acquires, 1);
        assert_eq!(env.stats().releases, 0);
        assert_eq!(env.outstanding(), 1);

        drop(acc);
        assert_eq!(
            env.stats(),
            PinStats { acquires: 1, releases: 1, denied: 0, invalid_releases: 0 }
        );
        assert_eq!(env.outstanding(), 0);
        assert_eq!(
            env.calls(),
            vec![
                RuntimeCall::Acquire { tag: HeapTag::ByteArray, array_id: arr.id() },
                RuntimeCall::Release { tag: HeapTag::ByteArray, array_id: arr.id(), mode: ReleaseMode::Abort },
            ]
        );
    }
}

#[test]
fn test_moved_accessor_releases_once() {
    init_tracing();
    let env = HeapEnv::default();
    let arr = env.new_long_array(&[9]).unwrap();

    let accessors: Vec<_> = (0..3)
        .map(|_| LongArrayAccessor::new(&env, Some(arr)).unwrap())
        .collect();
    assert_eq!(env.pin_count(arr), 3);

    let kept = accessors.into_iter().next();
    assert_eq!(env.pin_count(arr), 1);
    drop(kept);

    assert_eq!(env.stats().acquires, 3);
    assert_eq!(env.stats().releases, 3);
    assert_eq!(env.outstanding(), 0);
}

#[test]
fn test_denied_acquisition_raises_illegal_argument() {
    init_tracing();
    exception::clear();
    let env = HeapEnv::default();
    let arr = env.new_byte_array(&[1, 2, 3]).unwrap();
    env.deny_acquire(arr);

    let err = ByteArrayAccessor::new(&env, Some(arr)).unwrap_err();
    assert_eq!(
        err,
        AccessError::AcquireFailed { operation: "GetByteArrayElements", array_id: arr.id() }
    );

    let pending = exception::take().expect("exception should be pending");
    assert_eq!(pending.kind, ExceptionKind::IllegalArgument);
    assert_eq!(pending.message, format!("GetByteArrayElements failed on {}.", arr.id()));

    let stats = env.stats();
    assert_eq!(stats.denied, 1);
    assert_eq!(stats.acquires, 0);
    assert_eq!(stats.releases, 0);
}

#[test]
fn test_wrong_kind_acquisition_fails() {
    init_tracing();
    exception::clear();
    let env = HeapEnv::default();
    let arr = env.new_byte_array(&[1]).unwrap();

    let err = LongArrayAccessor::new(&env, Some(arr)).unwrap_err();
    assert!(err.to_string().starts_with("GetLongArrayElements failed on"));
    assert_eq!(exception::pending_kind(), Some(ExceptionKind::IllegalArgument));
    assert_eq!(env.stats().releases, 0);
    exception::clear();
}

#[test]
fn test_binary_view_transform() {
    init_tracing();
    for env in heaps() {
        let source: Vec<i8> = vec![0, -1, 42, i8::MIN, i8::MAX];
        let arr = env.new_byte_array(&source).unwrap();
        let acc = ByteArrayAccessor::new(&env, Some(arr)).unwrap();

        let view: BinaryData = acc.transform();
        assert!(!view.is_null());
        assert_eq!(view.len(), source.len());
        assert_eq!(view.data(), acc.data().cast::<u8>());
        let expected: Vec<u8> = source.iter().map(|&b| b as u8).collect();
        assert_eq!(view.as_bytes(), expected.as_slice());
    }
}

#[test]
fn test_absent_array_transforms_to_empty() {
    init_tracing();
    let env = HeapEnv::default();
    let acc = ByteArrayAccessor::new(&env, None).unwrap();

    let view: BinaryData = acc.transform();
    assert!(view.is_null());
    assert_eq!(view.len(), 0);

    let owned: Vec<i8> = acc.transform();
    assert!(owned.is_empty());
}

#[test]
fn test_owned_copy_is_independent_of_source() {
    init_tracing();
    for env in heaps() {
        let arr = env.new_byte_array(&[10, 20, 30]).unwrap();

        let owned: Vec<i8> = {
            let acc = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
            let copy: Vec<i8> = acc.transform();
            assert_eq!(acc.as_slice(), &copy[..]);
            copy
        };
        assert!(env.write_byte(arr, 0, -99));
        assert!(env.write_byte(arr, 2, 0));

        assert_eq!(owned, vec![10, 20, 30]);
        assert_eq!(env.read_bytes(arr).unwrap(), vec![-99, 20, 0]);
        assert_eq!(env.outstanding(), 0);
    }
}

#[test]
fn test_pinned_store_is_not_written_under_live_view() {
    init_tracing();
    let env = HeapEnv::new(AcquireStrategy::Pin);
    let arr = env.new_byte_array(&[1, 2]).unwrap();
    {
        let acc = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
        let view: BinaryData = acc.transform();
        let bytes = view.as_bytes();

        assert!(!env.write_byte(arr, 0, 77));
        assert_eq!(bytes[0], 1);
    }
    assert!(env.write_byte(arr, 0, 77));
    assert_eq!(env.read_bytes(arr).unwrap(), vec![77, 2]);
}

#[test]
fn test_zero_length_arrays_balance() {
    init_tracing();
    for env in heaps() {
        let first = env.new_byte_array(&[]).unwrap();
        let second = env.new_byte_array(&[]).unwrap();
        {
            let outer = ByteArrayAccessor::new(&env, Some(first)).unwrap();
            {
                let inner = ByteArrayAccessor::new(&env, Some(second)).unwrap();
                let again = ByteArrayAccessor::new(&env, Some(first)).unwrap();
                assert_eq!(env.outstanding(), 3);
                assert!(inner.is_empty());
                assert!(again.is_empty());
            }
            assert_eq!(env.outstanding(), 1);
            assert_eq!(outer.size(), 0);
        }

        assert_eq!(env.outstanding(), 0);
        assert_eq!(env.stats(), PinStats { acquires: 3, releases: 3, denied: 0, invalid_releases: 0 });
    }
}

#[test]
fn test_owned_copy_can_cross_threads() {
    init_tracing();
    let env = HeapEnv::default();
    let arr = env.new_byte_array(&[1, 2, 3, 4]).unwrap();

    let owned: Vec<i8> = ByteArrayAccessor::new(&env, Some(arr)).unwrap().transform();
    let sum = std::thread::spawn(move || owned.iter().map(|&b| i64::from(b)).sum::<i64>())
        .join()
        .unwrap();
    assert_eq!(sum, 10);
    assert_eq!(env.outstanding(), 0);
}

fn checksum_rejecting_positive(env: &HeapEnv, arr: pinarray_heap::HeapArrayRef) -> Result<i64, String> {
    let acc = ByteArrayAccessor::new(env, Some(arr)).map_err(|e| e.to_string())?;
    let sum: i64 = acc.iter().map(|&b| i64::from(b)).sum();
    if sum > 0 {
        return Err(format!("checksum {} rejected", sum));
    }
    Ok(sum)
}

#[test]
fn test_release_on_early_error_return() {
    init_tracing();
    for env in heaps() {
        let arr = env.new_byte_array(&[1, 2, 3]).unwrap();

        let err = checksum_rejecting_positive(&env, arr).unwrap_err();
        assert_eq!(err, "checksum 6 rejected");
        assert_eq!(env.stats().acquires, 1);
        assert_eq!(env.stats().releases, 1);
        assert_eq!(env.outstanding(), 0);
    }
}

#[test]
fn test_release_on_panic_unwind() {
    init_tracing();
    for env in heaps() {
        let arr = env.new_long_array(&[1, 2, 3]).unwrap();

        let result = catch_unwind(AssertUnwindSafe(|| {
            let acc = LongArrayAccessor::new(&env, Some(arr)).unwrap();
            if acc.size() == 3 {
                panic!("failure while reading");
            }
        }));

        assert!(result.is_err());
        assert_eq!(env.stats().acquires, 1);
        assert_eq!(env.stats().releases, 1);
        assert_eq!(env.outstanding(), 0);
    }
}

#[test]
fn test_nested_accessors_over_same_array_balance() {
    init_tracing();
    for env in heaps() {
        let arr = env.new_byte_array(&[7, 8]).unwrap();
        {
            let outer = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
            {
                let inner = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
                assert_eq!(inner.as_slice(), outer.as_slice());
                assert_eq!(env.outstanding(), 2);
            }
            assert_eq!(env.outstanding(), 1);
        }
        assert_eq!(env.stats().acquires, 2);
        assert_eq!(env.stats().releases, 2);
        assert_eq!(env.stats().invalid_releases, 0);
    }
}

#[test]
fn test_release_never_writes_back() {
    init_tracing();
    let env = HeapEnv::new(AcquireStrategy::Copy);
    let arr = env.new_byte_array(&[1, 2, 3]).unwrap();
    {
        let acc = ByteArrayAccessor::new(&env, Some(arr)).unwrap();
        assert_eq!(acc.release_mode(), ReleaseMode::Abort);
        // The copy handed out differs from the store, so a write-back would be visible.
        assert!(env.write_byte(arr, 1, 0));
        assert_eq!(acc[1], 2);
    }
    assert_eq!(env.read_bytes(arr).unwrap(), vec![1, 0, 3]);
}
