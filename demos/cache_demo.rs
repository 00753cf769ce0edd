/// Cache demonstration - shows LRU eviction and the byte budget in action
///
/// Run with: cargo run --example cache_demo
use bytes::Bytes;
use rustysquid::cache::{Artifact, ProxyCache, MAX_CACHE_SIZE, MAX_OBJECT_SIZE};

fn fake_artifact(body_len: usize) -> Artifact {
    let mut buf = b"HTTP/1.0 200 OK\r\n\r\n".to_vec();
    buf.extend(std::iter::repeat(b'x').take(body_len));
    let header_len = buf.len() - body_len;
    Artifact::new(Bytes::from(buf), header_len)
}

#[tokio::main]
async fn main() {
    println!("RustySquid Cache Demonstration");
    println!("==============================");

    println!("\nConfiguration:");
    println!("   MAX_OBJECT_SIZE: {} bytes", MAX_OBJECT_SIZE);
    println!("   MAX_CACHE_SIZE:  {} bytes", MAX_CACHE_SIZE);

    let cache = ProxyCache::new();

    println!("\nMiss then hit:");
    assert!(cache.lookup("http://example.com/a").await.is_none());
    println!("   miss on first lookup, as expected");
    cache
        .insert("http://example.com/a".to_string(), fake_artifact(1024))
        .await;
    assert!(cache.lookup("http://example.com/a").await.is_some());
    println!("   hit after insert");

    println!("\nOversize rejection:");
    cache
        .insert(
            "http://example.com/huge".to_string(),
            fake_artifact(MAX_OBJECT_SIZE + 1),
        )
        .await;
    assert!(cache.lookup("http://example.com/huge").await.is_none());
    println!("   object above MAX_OBJECT_SIZE was not cached");

    println!("\nLRU eviction:");
    let per_entry = MAX_CACHE_SIZE / 3;
    for name in ["a", "b", "c"] {
        cache
            .insert(format!("http://example.com/{name}"), fake_artifact(per_entry))
            .await;
    }
    // touch /a so /b becomes least recently used
    cache.lookup("http://example.com/a").await;
    cache
        .insert("http://example.com/d".to_string(), fake_artifact(per_entry))
        .await;

    println!(
        "   /a survives (recently touched): {}",
        cache.lookup("http://example.com/a").await.is_some()
    );
    println!(
        "   /b evicted (least recently used): {}",
        cache.lookup("http://example.com/b").await.is_none()
    );

    let stats = cache.stats().await;
    println!(
        "\nFinal stats: entries={} bytes_cached={} hits={} misses={} insertions={} evictions={}",
        stats.entries, stats.bytes_cached, stats.hits, stats.misses, stats.insertions, stats.evictions
    );
}
