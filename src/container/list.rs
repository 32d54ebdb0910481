use super::{ContainerHost, ItemRun};
use crate::{
    arena::Arena,
    error::Result,
    manifest::ContainerType,
    model::{begin_offset_of, end_offset_of, Item, ItemKey},
    util::{check_capacity, check_index, check_insert_index, check_range, ensure_int_range},
};
use log::{debug, trace};
use std::{cell::Cell, ops::Range};

pub const DEFAULT_CAPACITY: usize = 10;

/// Items with smallest begin and largest end offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Boundary {
    first: Option<ItemKey>,
    last: Option<ItemKey>,
}

/// Array backed list of items.
///
/// Offsets are only tracked if the hosting layer declares a foundation layer,
/// otherwise they are reported as unset. Boundary items are found lazily by a
/// full scan and forgotten on every edit.
#[derive(Debug, Clone)]
pub struct ListStorage {
    items: Vec<ItemKey>,
    tracking: bool,
    boundary: Cell<Option<Boundary>>,
}

impl ListStorage {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            tracking: false,
            boundary: Cell::new(None),
        }
    }

    /// Pre filled storage, the only way of filling a static container.
    pub fn from_items(items: Vec<ItemKey>) -> Self {
        Self {
            items,
            tracking: false,
            boundary: Cell::new(None),
        }
    }

    pub fn add_notify(&mut self, host: &ContainerHost) -> Result<()> {
        check_capacity(self.items.len() as u64, 0)?;
        self.tracking = host.manifest().foundation_layer();
        self.invalidate();
        debug!(
            "Attached list storage with {} items, boundary tracking: {}",
            self.items.len(),
            self.tracking
        );
        Ok(())
    }

    pub fn remove_notify(&mut self, _: &ContainerHost) -> Result<()> {
        self.tracking = false;
        self.invalidate();
        Ok(())
    }

    pub fn container_type(&self) -> ContainerType {
        ContainerType::List
    }

    pub fn item_count(&self, _: &ContainerHost) -> u64 {
        self.len()
    }

    pub fn item_at(&self, _: &ContainerHost, index: u64) -> Result<ItemKey> {
        let i = ensure_int_range(index)?;
        check_index(index, self.len())?;
        Ok(self.items[i])
    }

    pub fn index_of_item(&self, _: &ContainerHost, item: ItemKey) -> Option<u64> {
        self.items
            .iter()
            .position(|&other| other == item)
            .map(|i| i as u64)
    }

    pub fn add_item(&mut self, _: &ContainerHost, index: u64, item: ItemKey) -> Result<()> {
        let i = Self::check_add(index, self.len(), 1)?;
        self.items.insert(i, item);
        self.invalidate();
        Ok(())
    }

    pub fn add_items(&mut self, _: &ContainerHost, index: u64, items: ItemRun<'_>) -> Result<()> {
        let i = Self::check_add(index, self.len(), items.len())?;
        let items = items.to_vec()?;
        self.items.splice(i..i, items);
        self.invalidate();
        Ok(())
    }

    pub fn remove_item(&mut self, _: &ContainerHost, index: u64) -> Result<ItemKey> {
        let i = Self::check_remove(index, self.len())?;
        let item = self.items.remove(i);
        self.invalidate();
        Ok(item)
    }

    pub fn remove_items(&mut self, _: &ContainerHost, range: Range<u64>) -> Result<Vec<ItemKey>> {
        let range = Self::check_remove_range(&range, self.len())?;
        let removed = self.items.drain(range).collect();
        self.invalidate();
        Ok(removed)
    }

    pub fn swap_items(&mut self, _: &ContainerHost, a: u64, b: u64) -> Result<()> {
        let (a, b) = Self::check_swap(a, b, self.len())?;
        self.items.swap(a, b);
        self.invalidate();
        Ok(())
    }

    pub fn begin_offset(&self, _: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let first = self.boundary(items)?.first?;
        begin_offset_of(items, first)
    }

    pub fn end_offset(&self, _: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let last = self.boundary(items)?.last?;
        end_offset_of(items, last)
    }

    pub fn is_dirty(&self, _: &ContainerHost) -> bool {
        false
    }

    pub fn recycle(&mut self) {
        if !self.items.is_empty() {
            debug!("Recycling list storage with {} items", self.items.len());
        }
        self.items.clear();
        self.items.shrink_to(DEFAULT_CAPACITY);
        self.tracking = false;
        self.invalidate();
    }

    pub fn revive(&mut self) -> bool {
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> u64 {
        self.items.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    // ********************* Checks shared with verifiers *********************

    /// Insert position for `additional` items at index.
    pub(crate) fn check_add(index: u64, len: u64, additional: u64) -> Result<usize> {
        let i = ensure_int_range(index)?;
        check_insert_index(index, len)?;
        check_capacity(len, additional)?;
        Ok(i)
    }

    pub(crate) fn check_remove(index: u64, len: u64) -> Result<usize> {
        let i = ensure_int_range(index)?;
        check_index(index, len)?;
        Ok(i)
    }

    pub(crate) fn check_remove_range(range: &Range<u64>, len: u64) -> Result<Range<usize>> {
        check_range(range, len)?;
        Ok(range.start as usize..range.end as usize)
    }

    pub(crate) fn check_swap(a: u64, b: u64, len: u64) -> Result<(usize, usize)> {
        Ok((Self::check_remove(a, len)?, Self::check_remove(b, len)?))
    }

    // ********************* Boundary *********************

    fn invalidate(&self) {
        if self.boundary.take().is_some() {
            trace!("List boundary invalidated");
        }
    }

    fn boundary(&self, items: &Arena<Item>) -> Option<Boundary> {
        if !self.tracking {
            return None;
        }
        if let Some(boundary) = self.boundary.get() {
            return Some(boundary);
        }

        let first = self
            .items
            .iter()
            .filter_map(|&key| Some((begin_offset_of(items, key)?, key)))
            .min_by_key(|&(offset, _)| offset)
            .map(|(_, key)| key);
        let last = self
            .items
            .iter()
            .filter_map(|&key| Some((end_offset_of(items, key)?, key)))
            .max_by_key(|&(offset, _)| offset)
            .map(|(_, key)| key);

        let boundary = Boundary { first, last };
        debug!("Recomputed list boundary over {} items", self.items.len());
        self.boundary.set(Some(boundary));
        Some(boundary)
    }
}

impl Default for ListStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        manifest::{ContainerManifest, ContainerType},
    };

    fn host(foundation: bool) -> ContainerHost {
        ContainerHost::new(
            ContainerManifest::new(ContainerType::List)
                .with_non_static(true)
                .with_foundation_layer(foundation),
        )
    }

    fn items(n: usize) -> (Arena<Item>, Vec<ItemKey>) {
        let mut arena = Arena::new();
        let keys = (0..n)
            .map(|i| arena.insert(Item::new().with_index(i as u64)))
            .collect();
        (arena, keys)
    }

    #[test]
    fn add_get() {
        let host = host(false);
        let (_, keys) = items(3);
        let mut storage = ListStorage::new();
        storage.add_notify(&host).unwrap();

        storage.add_item(&host, 0, keys[1]).unwrap();
        storage.add_item(&host, 0, keys[0]).unwrap();
        storage.add_item(&host, 2, keys[2]).unwrap();

        assert_eq!(storage.item_count(&host), 3);
        assert_eq!(storage.iter().collect::<Vec<_>>(), keys);
        assert_eq!(storage.index_of_item(&host, keys[2]), Some(2));
    }

    #[test]
    fn add_out_of_bounds() {
        let host = host(false);
        let (_, keys) = items(1);
        let mut storage = ListStorage::new();

        let error = storage.add_item(&host, 1, keys[0]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::IndexOutOfBounds);
        assert!(storage.is_empty());
    }

    #[test]
    fn index_overflow() {
        let host = host(false);
        let storage = ListStorage::new();

        let error = storage.item_at(&host, u64::MAX).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Overflow);
    }

    #[test]
    fn remove_at_count_fails() {
        let host = host(false);
        let (_, keys) = items(2);
        let mut storage = ListStorage::from_items(keys.clone());

        assert_eq!(
            storage.remove_item(&host, 2).unwrap_err().kind(),
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(storage.remove_item(&host, 1).unwrap(), keys[1]);
    }

    #[test]
    fn batch() {
        let host = host(false);
        let (_, keys) = items(5);
        let mut storage = ListStorage::from_items(vec![keys[0], keys[4]]);

        storage
            .add_items(&host, 1, ItemRun::Items(&keys[1..4]))
            .unwrap();
        assert_eq!(storage.iter().collect::<Vec<_>>(), keys);

        let removed = storage.remove_items(&host, 1..3).unwrap();
        assert_eq!(removed, vec![keys[1], keys[2]]);
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn batch_out_of_bounds_leaves_list() {
        let host = host(false);
        let (_, keys) = items(3);
        let mut storage = ListStorage::from_items(keys.clone());

        assert!(storage.remove_items(&host, 2..4).is_err());
        assert!(storage
            .add_items(&host, 4, ItemRun::Items(&keys[..1]))
            .is_err());
        assert_eq!(storage.iter().collect::<Vec<_>>(), keys);
    }

    #[test]
    fn swap() {
        let host = host(false);
        let (_, keys) = items(3);
        let mut storage = ListStorage::from_items(keys.clone());

        storage.swap_items(&host, 0, 2).unwrap();
        assert_eq!(
            storage.iter().collect::<Vec<_>>(),
            vec![keys[2], keys[1], keys[0]]
        );
        assert!(storage.swap_items(&host, 0, 3).is_err());
    }

    #[test]
    fn boundary_caching() {
        let host = host(true);
        let mut arena = Arena::new();
        let a = arena.insert(Item::new().with_offsets(5, 10));
        let b = arena.insert(Item::new().with_offsets(1, 3));
        let c = arena.insert(Item::new().with_offsets(7, 20));

        let mut storage = ListStorage::new();
        storage.add_notify(&host).unwrap();
        for (i, key) in [a, b, c].into_iter().enumerate() {
            storage.add_item(&host, i as u64, key).unwrap();
        }

        assert_eq!(storage.begin_offset(&host, &arena), Some(1));
        assert_eq!(storage.end_offset(&host, &arena), Some(20));

        storage.remove_item(&host, 1).unwrap();
        assert_eq!(storage.begin_offset(&host, &arena), Some(5));
        assert_eq!(storage.end_offset(&host, &arena), Some(20));
    }

    #[test]
    fn no_tracking_without_foundation() {
        let host = host(false);
        let mut arena = Arena::new();
        let a = arena.insert(Item::new().with_offsets(5, 10));

        let mut storage = ListStorage::from_items(vec![a]);
        storage.add_notify(&host).unwrap();

        assert!(!storage.is_tracking());
        assert_eq!(storage.begin_offset(&host, &arena), None);
    }

    #[test]
    fn recycle() {
        let host = host(true);
        let (_, keys) = items(4);
        let mut storage = ListStorage::from_items(keys);
        storage.add_notify(&host).unwrap();

        storage.recycle();
        assert!(storage.is_empty());
        assert!(!storage.is_tracking());
        assert!(storage.revive());
    }
}
