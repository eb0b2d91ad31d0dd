use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use todoc_api::endpoints::{
    chat::{ChatMessage, ChatSession},
    community::{Comment, Post},
    kids::Kid,
    records::Record,
};

/// An item that can live in a [`ListCache`]
pub trait CacheEntry: Clone {
    type Id: Copy + Ord + std::fmt::Debug;

    fn id(&self) -> Self::Id;

    /// Creation time; entries without one sort after those that have it
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// Newest first, ties and missing timestamps broken by descending id
fn newest_first<T: CacheEntry>(a: &T, b: &T) -> Ordering {
    let by_time = match (a.created_at(), b.created_at()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time.then_with(|| b.id().cmp(&a.id()))
}

/// Local copy of a server-side list.
///
/// Only server-confirmed results are applied. The order never depends on
/// when an item was inserted.
#[derive(Debug, Clone)]
pub struct ListCache<T: CacheEntry> {
    items: Vec<T>,
}

impl<T: CacheEntry> Default for ListCache<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: CacheEntry> ListCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.sort();
    }

    /// Insert, or replace an entry with the same id
    pub fn apply_created(&mut self, item: T) {
        match self.position(item.id()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
        self.sort();
    }

    /// Replace an existing entry; returns `false` if it is not cached
    pub fn apply_updated(&mut self, item: T) -> bool {
        let Some(index) = self.position(item.id()) else {
            tracing::debug!("Ignoring update for uncached entry {:?}", item.id());
            return false;
        };
        self.items[index] = item;
        self.sort();
        true
    }

    /// Edit an entry in place
    pub fn modify(&mut self, id: T::Id, f: impl FnOnce(&mut T)) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        f(&mut self.items[index]);
        self.sort();
        true
    }

    pub fn apply_deleted(&mut self, id: T::Id) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, id: T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn sort(&mut self) {
        self.items.sort_by(newest_first);
    }
}

impl CacheEntry for Kid {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl CacheEntry for Record {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl CacheEntry for ChatSession {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl CacheEntry for ChatMessage {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl CacheEntry for Post {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

impl CacheEntry for Comment {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: i64,
        at: Option<i64>,
        label: &'static str,
    }

    impl CacheEntry for Entry {
        type Id = i64;

        fn id(&self) -> i64 {
            self.id
        }

        fn created_at(&self) -> Option<DateTime<Utc>> {
            self.at.map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
        }
    }

    fn entry(id: i64, at: Option<i64>) -> Entry {
        Entry { id, at, label: "" }
    }

    fn ids(cache: &ListCache<Entry>) -> Vec<i64> {
        cache.items().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_replace_all_sorts_newest_first() {
        let mut cache = ListCache::new();
        cache.replace_all(vec![entry(1, Some(100)), entry(2, Some(300)), entry(3, Some(200))]);

        assert_eq!(ids(&cache), vec![2, 3, 1]);
    }

    #[test]
    fn test_created_item_lands_by_timestamp_not_insertion() {
        let mut cache = ListCache::new();
        cache.replace_all(vec![entry(1, Some(100)), entry(2, Some(300))]);

        // Server-confirmed but older than the newest entry
        cache.apply_created(entry(3, Some(200)));

        assert_eq!(ids(&cache), vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_and_missing_timestamps() {
        let mut cache = ListCache::new();
        cache.replace_all(vec![
            entry(1, None),
            entry(2, Some(100)),
            entry(3, Some(100)),
            entry(4, None),
        ]);

        assert_eq!(ids(&cache), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_apply_created_replaces_same_id() {
        let mut cache = ListCache::new();
        cache.apply_created(entry(1, Some(100)));
        cache.apply_created(Entry {
            id: 1,
            at: Some(100),
            label: "again",
        });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().label, "again");
    }

    #[test]
    fn test_apply_updated_ignores_unknown() {
        let mut cache = ListCache::new();
        cache.apply_created(entry(1, Some(100)));

        assert!(!cache.apply_updated(entry(9, Some(50))));
        assert!(cache.apply_updated(Entry {
            id: 1,
            at: Some(100),
            label: "edited",
        }));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().label, "edited");
    }

    #[test]
    fn test_apply_deleted() {
        let mut cache = ListCache::new();
        cache.replace_all(vec![entry(1, Some(100)), entry(2, Some(200))]);

        assert_eq!(cache.apply_deleted(1).map(|e| e.id), Some(1));
        assert_eq!(cache.apply_deleted(1), None);
        assert_eq!(ids(&cache), vec![2]);
    }

    #[test]
    fn test_modify_in_place() {
        let mut cache = ListCache::new();
        cache.apply_created(entry(1, Some(100)));

        assert!(cache.modify(1, |e| e.label = "liked"));
        assert!(!cache.modify(2, |e| e.label = "nope"));
        assert_eq!(cache.get(1).unwrap().label, "liked");
    }
}
