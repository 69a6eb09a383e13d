//! Bookkeeping of every key inserted during one generation run.

use std::collections::HashSet;

use crate::random::RandomSource;

/// One logical record of the table under test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Item {
    /// The key of the record.
    pub key: u64,
    /// The current value stored under the key.
    pub value: u64,
}

/// The population of keys modeled by a generation run.
///
/// `history` keeps items in insertion order so that a uniformly random item can be picked by
/// index. Items are only ever appended; updates overwrite the value in place but never move or
/// remove an item. `inserted_keys` holds every key ever inserted and backs the miss-lookup
/// guarantee.
#[derive(Debug, Default)]
pub struct Population {
    history: Vec<Item>,
    inserted_keys: HashSet<u64>,
}

impl Population {
    /// Creates an empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items inserted so far.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` if nothing has been inserted yet.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Returns `true` if `key` has ever been inserted.
    pub fn contains(&self, key: u64) -> bool {
        self.inserted_keys.contains(&key)
    }

    /// Appends a freshly inserted item.
    ///
    /// Returns `false` and leaves the population untouched if the key was inserted before.
    pub fn insert(&mut self, item: Item) -> bool {
        if !self.inserted_keys.insert(item.key) {
            return false;
        }
        self.history.push(item);
        true
    }

    /// Picks an item uniformly at random, or `None` if the population is empty.
    pub fn sample(&self, rng: &mut RandomSource) -> Option<Item> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history[rng.index(self.history.len())])
    }

    /// Picks an item uniformly at random and overwrites its value with a freshly drawn one.
    ///
    /// Returns the updated item, or `None` if the population is empty.
    pub fn update_random(&mut self, rng: &mut RandomSource) -> Option<Item> {
        if self.history.is_empty() {
            return None;
        }
        let index = rng.index(self.history.len());
        let item = &mut self.history[index];
        item.value = rng.key_or_value();
        Some(*item)
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends_and_tracks_keys() {
        let mut population = Population::new();
        assert!(population.is_empty());

        assert!(population.insert(Item { key: 1, value: 10 }));
        assert!(population.insert(Item { key: 2, value: 20 }));

        assert_eq!(population.len(), 2);
        assert!(population.contains(1));
        assert!(population.contains(2));
        assert!(!population.contains(3));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut population = Population::new();
        assert!(population.insert(Item { key: 1, value: 10 }));
        assert!(!population.insert(Item { key: 1, value: 99 }));

        assert_eq!(population.items(), &[Item { key: 1, value: 10 }]);
    }

    #[test]
    fn update_keeps_key_and_position() {
        let mut rng = RandomSource::from_seed(3);
        let mut population = Population::new();
        for key in 0..5 {
            population.insert(Item { key, value: 0 });
        }

        let updated = population.update_random(&mut rng).unwrap();
        assert_ne!(updated.value, 0);

        let keys: Vec<_> = population.items().iter().map(|item| item.key).collect();
        assert_eq!(keys, [0, 1, 2, 3, 4]);
        assert_eq!(population.items()[updated.key as usize], updated);
    }

    #[test]
    fn empty_population_yields_nothing() {
        let mut rng = RandomSource::from_seed(0);
        let mut population = Population::new();

        assert_eq!(population.sample(&mut rng), None);
        assert_eq!(population.update_random(&mut rng), None);
    }
}
