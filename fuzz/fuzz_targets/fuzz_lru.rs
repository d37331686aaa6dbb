#![no_main]

use std::num::NonZeroUsize;

use libfuzzer_sys::fuzz_target;
use lru_arena::LruCache;

#[derive(Debug)]
enum CacheOperation {
    Insert(u16, u16),
    Get(u16),
    Peek(u16),
    Remove(u16),
    Pop,
    Clear,
    GetOrInsertWith(u16, u16),
    Iter,
}

impl<'a> arbitrary::Arbitrary<'a> for CacheOperation {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        match u.int_in_range(0..=7)? {
            0 => Ok(CacheOperation::Insert(u.arbitrary()?, u.arbitrary()?)),
            1 => Ok(CacheOperation::Get(u.arbitrary()?)),
            2 => Ok(CacheOperation::Peek(u.arbitrary()?)),
            3 => Ok(CacheOperation::Remove(u.arbitrary()?)),
            4 => Ok(CacheOperation::Pop),
            5 => Ok(CacheOperation::Clear),
            6 => Ok(CacheOperation::GetOrInsertWith(
                u.arbitrary()?,
                u.arbitrary()?,
            )),
            7 => Ok(CacheOperation::Iter),
            _ => unreachable!(),
        }
    }
}

/// Reference model, eviction order front to back (back is MRU).
struct Model {
    capacity: usize,
    entries: Vec<(u16, u16)>,
}

impl Model {
    fn position(&self, key: u16) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == key)
    }

    fn touch(&mut self, key: u16) {
        if let Some(index) = self.position(key) {
            let entry = self.entries.remove(index);
            self.entries.push(entry);
        }
    }

    fn insert(&mut self, key: u16, value: u16) {
        if let Some(index) = self.position(key) {
            self.entries.remove(index);
        }
        self.entries.push((key, value));
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }
}

fuzz_target!(|data: (u16, Vec<CacheOperation>)| {
    let (capacity_raw, operations) = data;

    let capacity = NonZeroUsize::new((capacity_raw % 4).max(1) as usize).unwrap();
    let mut cache = LruCache::<u16, u16>::new(capacity);
    let mut model = Model {
        capacity: capacity.get(),
        entries: Vec::new(),
    };

    for op in operations {
        match op {
            CacheOperation::Insert(key, value) => {
                let replaced = cache.insert(key, value);
                assert_eq!(
                    replaced,
                    model.position(key).map(|i| model.entries[i].1)
                );
                model.insert(key, value);
                assert_eq!(cache.peek(&key), Some(&value));
            }

            CacheOperation::Get(key) => {
                let result = cache.get(&key).copied();
                assert_eq!(result, model.position(key).map(|i| model.entries[i].1));
                model.touch(key);
            }

            CacheOperation::Peek(key) => {
                let result = cache.peek(&key).copied();
                assert_eq!(result, model.position(key).map(|i| model.entries[i].1));
            }

            CacheOperation::Remove(key) => {
                let removed = cache.remove(&key);
                let expected = model.position(key).map(|i| model.entries.remove(i).1);
                assert_eq!(removed, expected);
                assert!(!cache.contains_key(&key));
            }

            CacheOperation::Pop => {
                let popped = cache.pop();
                let expected = if model.entries.is_empty() {
                    None
                } else {
                    Some(model.entries.remove(0))
                };
                assert_eq!(popped, expected);
            }

            CacheOperation::Clear => {
                cache.clear();
                model.entries.clear();
                assert!(cache.is_empty());
            }

            CacheOperation::GetOrInsertWith(key, value) => {
                let result = *cache.get_or_insert_with(key, |_| value);
                match model.position(key) {
                    Some(index) => {
                        assert_eq!(result, model.entries[index].1);
                        model.touch(key);
                    }
                    None => {
                        assert_eq!(result, value);
                        model.insert(key, value);
                    }
                }
            }

            CacheOperation::Iter => {
                let entries: Vec<_> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                assert_eq!(entries, model.entries);
            }
        }

        assert!(cache.len() <= cache.capacity());
        assert_eq!(cache.capacity(), capacity.get());
        assert_eq!(cache.len(), model.entries.len());
        assert_eq!(cache.is_empty(), model.entries.is_empty());
        assert_eq!(
            cache.tail().map(|(k, v)| (*k, *v)),
            model.entries.first().copied()
        );
    }
});
