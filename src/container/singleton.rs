use super::{ContainerHost, ItemRun};
use crate::{
    arena::Arena,
    error::{Result, StorageError},
    manifest::ContainerType,
    model::{begin_offset_of, end_offset_of, Item, ItemKey},
};
use std::ops::Range;

/// Holds at most one item. Every index has to be 0.
#[derive(Debug, Clone, Default)]
pub struct SingletonStorage {
    item: Option<ItemKey>,
}

impl SingletonStorage {
    pub fn new() -> Self {
        Self { item: None }
    }

    pub fn with_item(item: ItemKey) -> Self {
        Self { item: Some(item) }
    }

    pub fn add_notify(&mut self, _: &ContainerHost) -> Result<()> {
        Ok(())
    }

    pub fn remove_notify(&mut self, _: &ContainerHost) -> Result<()> {
        Ok(())
    }

    pub fn container_type(&self) -> ContainerType {
        ContainerType::Singleton
    }

    pub fn item_count(&self, _: &ContainerHost) -> u64 {
        self.len()
    }

    pub fn item_at(&self, _: &ContainerHost, index: u64) -> Result<ItemKey> {
        match self.item {
            Some(item) if index == 0 => Ok(item),
            _ => Err(StorageError::out_of_bounds(index, self.len())),
        }
    }

    pub fn index_of_item(&self, _: &ContainerHost, item: ItemKey) -> Option<u64> {
        (self.item == Some(item)).then_some(0)
    }

    pub fn add_item(&mut self, _: &ContainerHost, index: u64, item: ItemKey) -> Result<()> {
        self.check_add(index, 1)?;
        self.item = Some(item);
        Ok(())
    }

    pub fn add_items(&mut self, _: &ContainerHost, index: u64, items: ItemRun<'_>) -> Result<()> {
        self.check_add(index, items.len())?;
        if let Some(&item) = items.to_vec()?.first() {
            self.item = Some(item);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, _: &ContainerHost, index: u64) -> Result<ItemKey> {
        self.check_remove(index)?;
        self.item
            .take()
            .ok_or_else(|| StorageError::illegal_state("singleton is empty"))
    }

    pub fn remove_items(&mut self, host: &ContainerHost, range: Range<u64>) -> Result<Vec<ItemKey>> {
        self.check_remove_range(&range)?;
        Ok(vec![self.remove_item(host, 0)?])
    }

    pub fn swap_items(&mut self, _: &ContainerHost, _: u64, _: u64) -> Result<()> {
        Err(StorageError::unsupported("swap on singleton storage"))
    }

    pub fn begin_offset(&self, _: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        begin_offset_of(items, self.item?)
    }

    pub fn end_offset(&self, _: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        end_offset_of(items, self.item?)
    }

    pub fn is_dirty(&self, _: &ContainerHost) -> bool {
        false
    }

    pub fn recycle(&mut self) {
        self.item = None;
    }

    pub fn revive(&mut self) -> bool {
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.item.iter().copied()
    }

    pub fn item(&self) -> Option<ItemKey> {
        self.item
    }

    pub fn len(&self) -> u64 {
        self.item.is_some() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    // ********************* Checks shared with verifiers *********************

    pub(crate) fn check_add(&self, index: u64, additional: u64) -> Result<()> {
        if index != 0 {
            return Err(StorageError::out_of_bounds(index, self.len()));
        }
        match additional {
            0 => Ok(()),
            1 if self.item.is_none() => Ok(()),
            1 => Err(StorageError::illegal_state("singleton is already occupied")),
            n => Err(StorageError::invalid_input(format!(
                "singleton can't hold {} items",
                n
            ))),
        }
    }

    pub(crate) fn check_remove(&self, index: u64) -> Result<()> {
        if index != 0 {
            Err(StorageError::out_of_bounds(index, self.len()))
        } else if self.item.is_none() {
            Err(StorageError::illegal_state("singleton is empty"))
        } else {
            Ok(())
        }
    }

    pub(crate) fn check_remove_range(&self, range: &Range<u64>) -> Result<()> {
        if range.start >= range.end {
            Err(StorageError::invalid_input(format!(
                "empty or reversed range {}..{}",
                range.start, range.end
            )))
        } else if range.end - range.start > 1 {
            Err(StorageError::invalid_input(
                "singleton can't remove more than one item",
            ))
        } else {
            self.check_remove(range.start)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, manifest::ContainerManifest};

    fn setup() -> (ContainerHost, ItemKey, ItemKey) {
        let host = ContainerHost::new(
            ContainerManifest::new(ContainerType::Singleton).with_non_static(true),
        );
        let mut arena = Arena::new();
        let x = arena.insert(Item::new());
        let y = arena.insert(Item::new());
        (host, x, y)
    }

    #[test]
    fn lifecycle() {
        let (host, x, y) = setup();
        let mut storage = SingletonStorage::new();

        storage.add_item(&host, 0, x).unwrap();
        assert_eq!(
            storage.add_item(&host, 0, y).unwrap_err().kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(storage.remove_item(&host, 0).unwrap(), x);
        assert!(storage.is_empty());
    }

    #[test]
    fn index_must_be_zero() {
        let (host, x, _) = setup();
        let mut storage = SingletonStorage::new();

        assert_eq!(
            storage.add_item(&host, 1, x).unwrap_err().kind(),
            ErrorKind::IndexOutOfBounds
        );
        storage.add_item(&host, 0, x).unwrap();
        assert!(storage.item_at(&host, 1).is_err());
        assert!(storage.remove_item(&host, 1).is_err());
        assert_eq!(storage.item_at(&host, 0).unwrap(), x);
    }

    #[test]
    fn remove_empty() {
        let (host, _, _) = setup();
        let mut storage = SingletonStorage::new();

        assert_eq!(
            storage.remove_item(&host, 0).unwrap_err().kind(),
            ErrorKind::IllegalState
        );
    }

    #[test]
    fn batch_of_two_fails() {
        let (host, x, y) = setup();
        let mut storage = SingletonStorage::new();

        let items = [x, y];
        assert_eq!(
            storage
                .add_items(&host, 0, ItemRun::Items(&items))
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );
        assert!(storage.is_empty());

        storage
            .add_items(&host, 0, ItemRun::Items(&items[..1]))
            .unwrap();
        assert!(storage.remove_items(&host, 0..2).is_err());
        assert_eq!(storage.remove_items(&host, 0..1).unwrap(), vec![x]);
    }

    #[test]
    fn swap_unsupported() {
        let (host, x, _) = setup();
        let mut storage = SingletonStorage::with_item(x);

        assert_eq!(
            storage.swap_items(&host, 0, 0).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
    }
}
