use super::*;
use crate::media::frame::{Frame, PixelFormat};

fn payload(v: u8, side: u32) -> Arc<MediaPayload> {
    Arc::new(MediaPayload::Image(
        Frame::filled(side, side, PixelFormat::L8, &[v]).unwrap(),
    ))
}

fn key(media: u64, steps: &[&str]) -> CacheKey {
    let prefix = steps
        .iter()
        .map(|s| StepSignature {
            operation: (*s).to_owned(),
            params: "{}".to_owned(),
        })
        .collect::<Vec<_>>();
    CacheKey::new(Fingerprint { hi: media, lo: 0 }, &prefix)
}

#[test]
fn get_after_put_and_prefix_sensitivity() {
    let cache = ResultCache::new(8, 1 << 20);
    cache.put(key(1, &["blur"]), payload(7, 2));

    assert_eq!(cache.get(&key(1, &["blur"])).unwrap().byte_len(), 4);
    assert!(cache.get(&key(1, &["blur", "noise"])).is_none());
    assert!(cache.get(&key(2, &["blur"])).is_none());

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 2, 1));
    assert_eq!(stats.bytes, 4);
}

#[test]
fn entry_budget_evicts_least_recently_used() {
    let cache = ResultCache::new(2, 1 << 20);
    cache.put(key(1, &["a"]), payload(1, 1));
    cache.put(key(1, &["b"]), payload(2, 1));
    // Touch "a" so "b" becomes the eviction candidate.
    assert!(cache.get(&key(1, &["a"])).is_some());
    cache.put(key(1, &["c"]), payload(3, 1));

    assert!(cache.contains(&key(1, &["a"])));
    assert!(!cache.contains(&key(1, &["b"])));
    assert!(cache.contains(&key(1, &["c"])));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn byte_budget_evicts_and_oversized_payloads_are_skipped() {
    let cache = ResultCache::new(100, 10);
    cache.put(key(1, &["a"]), payload(1, 2));
    cache.put(key(1, &["b"]), payload(2, 2));
    cache.put(key(1, &["c"]), payload(3, 2));
    let stats = cache.stats();
    assert!(stats.bytes <= 10);
    assert_eq!(stats.entries, 2);

    cache.put(key(1, &["huge"]), payload(4, 4));
    assert!(!cache.contains(&key(1, &["huge"])));
}

#[test]
fn replacing_a_key_keeps_byte_accounting() {
    let cache = ResultCache::new(4, 1 << 20);
    cache.put(key(1, &["a"]), payload(1, 2));
    cache.put(key(1, &["a"]), payload(9, 3));
    let stats = cache.stats();
    assert_eq!((stats.entries, stats.bytes), (1, 9));
    assert_eq!(
        cache.get(&key(1, &["a"])).unwrap().frames()[0].data()[0],
        9
    );
}

#[test]
fn clear_and_disabled() {
    let cache = ResultCache::new(4, 1 << 20);
    cache.put(key(1, &["a"]), payload(1, 1));
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.stats().bytes, 0);

    let off = ResultCache::disabled();
    off.put(key(1, &["a"]), payload(1, 1));
    assert!(!off.is_enabled());
    assert!(off.get(&key(1, &["a"])).is_none());
    assert_eq!(off.len(), 0);
}

#[test]
fn concurrent_puts_on_one_key_leave_one_entry() {
    let cache = Arc::new(ResultCache::new(8, 1 << 20));
    std::thread::scope(|s| {
        for v in 0..4u8 {
            let cache = Arc::clone(&cache);
            s.spawn(move || {
                for _ in 0..50 {
                    cache.put(key(1, &["a"]), payload(v, 2));
                    let _ = cache.get(&key(1, &["a"]));
                }
            });
        }
    });
    let stats = cache.stats();
    assert_eq!((stats.entries, stats.bytes), (1, 4));
}
