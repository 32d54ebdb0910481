use crate::key::{Index, Key};
use log::warn;

/// A simple vec arena of values of the same type.
///
/// Removed slots are kept on a free list and handed out again by `insert`,
/// which makes the arena double as the pool for recycled nodes and edges.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Key<T>>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity + 1);
        // Slot zero is never used.
        slots.push(None);
        Self {
            slots,
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - 1 - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// None if the arena ran out of addressable keys.
    pub fn try_insert(&mut self, value: T) -> Option<Key<T>> {
        if let Some(key) = self.free.pop() {
            self.slots[key.as_usize()] = Some(value);
            Some(key)
        } else {
            let index = Index::new(self.slots.len())?;
            self.slots.push(Some(value));
            Some(Key::new(index))
        }
    }

    /// Panics if the arena runs out of addressable keys, see `try_insert`.
    pub fn insert(&mut self, value: T) -> Key<T> {
        match self.try_insert(value) {
            Some(key) => key,
            None => panic!("Arena is out of keys"),
        }
    }

    pub fn contains(&self, key: Key<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: Key<T>) -> Option<&T> {
        self.slots.get(key.as_usize()).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, key: Key<T>) -> Option<&mut T> {
        self.slots
            .get_mut(key.as_usize())
            .and_then(|slot| slot.as_mut())
    }

    /// Frees and returns value if it exists.
    pub fn remove(&mut self, key: Key<T>) -> Option<T> {
        let value = self
            .slots
            .get_mut(key.as_usize())
            .and_then(|slot| slot.take());
        if value.is_some() {
            self.free.push(key);
        } else {
            warn!("Removing vacant arena slot {:?}", key);
        }
        value
    }

    /// Iterates occupied slots in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key<T>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, slot)| {
                let value = slot.as_ref()?;
                Some((Key::new(Index::new(i)?), value))
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = Key<T>> + '_ {
        self.iter().map(|(key, _)| key)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
