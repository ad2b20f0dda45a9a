//! Identifier Codec Tests
//!
//! Tests for identifier invariants:
//! - String form parses back to an equal identifier
//! - Ordering is total within a variant
//! - Extras are kept or dropped as requested
//! - Snowflake generation requires a machine id

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, TimeZone, Utc};
use shardscan::config::KernelConfig;
use shardscan::uid::{
    to_radix, CachedCounterSource, CounterCache, LocalCounterSource, MemoryCounterCache, Uid,
    UidGenerator, UidVariant, MILLIS_PER_DAY,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn hash_uids() -> Vec<Uid> {
    let mut uids = Vec::new();
    for (i, content) in ["alpha", "beta", "gamma", "", "delta with spaces"].iter().enumerate() {
        uids.push(Uid::new_hash(content.as_bytes(), None, &[]));
        uids.push(Uid::new_hash(
            content.as_bytes(),
            Some(at(1_600_000_000 + i as i64 * 3_700)),
            &["doc", "7"],
        ));
    }
    uids
}

fn snowflake_uids() -> Vec<Uid> {
    let counters = LocalCounterSource::new();
    (0..10)
        .map(|i| {
            Uid::new_snowflake(Some(12), at(1_600_000_000 + i % 3), &counters, &["x"]).unwrap()
        })
        .collect()
}

// =============================================================================
// Round-trip Tests
// =============================================================================

/// Every generated identifier parses back to itself.
#[test]
fn test_parse_recovers_identifier() {
    for uid in hash_uids().into_iter().chain(snowflake_uids()) {
        let parsed = Uid::parse(&uid.to_string(), -1).unwrap();
        assert_eq!(parsed.cmp(&uid), Ordering::Equal, "{}", uid);
        assert_eq!(parsed.variant(), uid.variant());
        assert_eq!(parsed.time_of_day(), uid.time_of_day());
    }
}

/// Variant is recovered from shape alone.
#[test]
fn test_variant_from_shape() {
    let hash = Uid::new_hash(b"content", Some(at(0)), &["a", "b", "c"]);
    assert_eq!(Uid::parse(&hash.to_string(), -1).unwrap().variant(), UidVariant::HashBased);

    let snowflake = snowflake_uids().remove(0);
    assert_eq!(
        Uid::parse(&snowflake.to_string(), -1).unwrap().variant(),
        UidVariant::Snowflake
    );
}

/// Same content, timestamp and extras give the same string.
#[test]
fn test_hash_generation_deterministic() {
    let a = Uid::new_hash(b"record", Some(at(1_000)), &["e"]);
    let b = Uid::new_hash(b"record", Some(at(1_000)), &["e"]);
    assert_eq!(a.to_string(), b.to_string());
    assert_ne!(
        a.to_string(),
        Uid::new_hash(b"record", Some(at(1_001)), &["e"]).to_string()
    );
    assert_eq!(Uid::new_hash(b"record", None, &[]).time_of_day(), -1);
}

// =============================================================================
// Ordering Tests
// =============================================================================

/// Exactly one of <, =, > holds and the order is transitive.
#[test]
fn test_total_order_within_variant() {
    for uids in [hash_uids(), snowflake_uids()] {
        for a in &uids {
            for b in &uids {
                let forward = a.cmp(b);
                assert_eq!(forward.reverse(), b.cmp(a));
                assert_eq!(forward == Ordering::Equal, a == b);
                for c in &uids {
                    if a < b && b < c {
                        assert!(a < c);
                    }
                }
            }
        }
    }
}

/// Snowflake ids from one source sort in issue order.
#[test]
fn test_snowflake_issue_order() {
    let uids = snowflake_uids();
    let mut sorted = uids.clone();
    sorted.sort();
    assert_eq!(sorted, uids);
}

/// Absent sorts before present.
#[test]
fn test_compare_optional() {
    let uid = Uid::new_hash(b"x", None, &[]);
    assert_eq!(Uid::compare_optional(None, Some(&uid)), Ordering::Less);
    assert_eq!(Uid::compare_optional(Some(&uid), None), Ordering::Greater);
    assert_eq!(Uid::compare_optional(None, None), Ordering::Equal);
    assert_eq!(Uid::compare_optional(Some(&uid), Some(&uid)), Ordering::Equal);
}

// =============================================================================
// Extra Handling Tests
// =============================================================================

/// parse(s, 0) and parse_base(s) drop extras; parse(s, -1) keeps them.
#[test]
fn test_extra_part_limits() {
    let uid = Uid::new_hash(b"content", None, &["a", "b", "c"]);
    let s = uid.to_string();

    assert_eq!(Uid::parse(&s, 0).unwrap().extra(), None);
    assert_eq!(Uid::parse_base(&s).unwrap(), Uid::parse(&s, 0).unwrap());
    assert_eq!(Uid::parse(&s, -1).unwrap().extra(), Some("a.b.c"));
    assert_eq!(Uid::parse(&s, 2).unwrap().extra(), Some("a.b"));
    assert_eq!(Uid::parse(&s, 9).unwrap().extra(), Some("a.b.c"));
    assert_eq!(Uid::parse(&s, 0).unwrap().base_uid(), uid.base_uid());
}

/// Empty input is a format error.
#[test]
fn test_empty_input_rejected() {
    assert!(Uid::parse("", -1).unwrap_err().is_format());
}

/// Only the canonical string form parses, so parse then display is the identity.
#[test]
fn test_only_canonical_form_parses() {
    for uid in hash_uids().into_iter().chain(snowflake_uids()) {
        let s = uid.base_uid();
        assert_eq!(Uid::parse(&s, -1).unwrap().to_string(), s);

        let upper = s.to_uppercase();
        if upper != s {
            assert!(Uid::parse(&upper, -1).unwrap_err().is_format(), "{}", upper);
        }
    }
}

/// A time-of-day segment past the end of the day is a format error.
#[test]
fn test_time_of_day_out_of_range_rejected() {
    let uid = Uid::new_hash(b"content", None, &[]);
    for millis in [MILLIS_PER_DAY, 1_000_000_000, i32::MAX as i64] {
        let s = format!("+{}.{}", to_radix(millis), uid.base_uid());
        assert!(Uid::parse(&s, -1).unwrap_err().is_format(), "{}", s);
    }

    let s = format!("+1ru.{}", uid.base_uid());
    assert_eq!(Uid::parse(&s, -1).unwrap().time_of_day(), 36 * 36 + 27 * 36 + 30);
}

// =============================================================================
// Snowflake Configuration Tests
// =============================================================================

/// Missing or negative machine id fails before any id is issued.
#[test]
fn test_snowflake_requires_machine_id() {
    let counters = LocalCounterSource::new();
    for machine_id in [None, Some(-1)] {
        let err = Uid::new_snowflake(machine_id, at(0), &counters, &[]).unwrap_err();
        assert!(err.is_configuration());
    }
    let err = UidGenerator::snowflake(None, Arc::new(LocalCounterSource::new()))
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

/// Configuration drives the generator choice.
#[test]
fn test_generator_from_config() {
    let hash = UidGenerator::from_config(&KernelConfig::default(), None).unwrap();
    assert_eq!(hash.variant(), UidVariant::HashBased);

    let config = KernelConfig::from_json(
        r#"{"uid_type":"snowflake","machine_id":4,"snowflake_cache_enabled":true}"#,
    )
    .unwrap();
    assert!(UidGenerator::from_config(&config, None).is_err());

    let cache: Arc<dyn CounterCache> = Arc::new(MemoryCounterCache::new());
    let generator = UidGenerator::from_config(&config, Some(cache)).unwrap();
    assert_eq!(generator.variant(), UidVariant::Snowflake);
    let uid = generator.generate(b"x", Some(at(5)), &[]).unwrap();
    assert_eq!(uid.variant(), UidVariant::Snowflake);
}

// =============================================================================
// Counter Uniqueness Tests
// =============================================================================

/// Concurrent generation in one millisecond never collides.
#[test]
fn test_concurrent_snowflake_unique() {
    let counters = Arc::new(LocalCounterSource::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let counters = Arc::clone(&counters);
            thread::spawn(move || {
                (0..250)
                    .map(|_| {
                        Uid::new_snowflake(Some(1), at(42), counters.as_ref(), &[])
                            .unwrap()
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for uid in handle.join().unwrap() {
            assert!(seen.insert(uid));
        }
    }
    assert_eq!(seen.len(), 1000);
}

/// A restarted process sharing the cache never reuses an issued millisecond.
#[test]
fn test_cache_survives_restart_with_clock_rollback() {
    let cache = Arc::new(MemoryCounterCache::new());
    let first = CachedCounterSource::new(cache.clone());
    let before: Vec<Uid> = (0..3)
        .map(|_| Uid::new_snowflake(Some(2), at(100), &first, &[]).unwrap())
        .collect();
    drop(first);

    // Clock went backwards across the restart
    let restarted = CachedCounterSource::new(cache);
    let after = Uid::new_snowflake(Some(2), at(99), &restarted, &[]).unwrap();
    for uid in &before {
        assert!(after > *uid);
    }
}
