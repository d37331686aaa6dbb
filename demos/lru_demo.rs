use std::num::NonZeroUsize;

use lru_arena::LruCache;

fn display(cache: &LruCache<i32, i32>) {
    let entries: Vec<_> = cache.iter().collect();
    let rendered: Vec<String> = entries
        .iter()
        .rev()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect();
    println!("cache (MRU -> LRU): {}", rendered.join(" "));
}

fn main() {
    let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());

    cache.insert(1, 1);
    cache.insert(2, 2);
    display(&cache);

    println!("get(1) = {:?}", cache.get(&1));
    display(&cache);

    // Full cache, so this evicts the least recently used key (2).
    cache.insert(3, 3);
    display(&cache);

    println!("get(2) = {:?}", cache.get(&2));

    cache.insert(4, 4);
    display(&cache);

    println!("get(1) = {:?}", cache.get(&1));
    println!("get(3) = {:?}", cache.get(&3));
    println!("get(4) = {:?}", cache.get(&4));
    display(&cache);
}
