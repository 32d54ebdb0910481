use super::{ContainerHost, ItemRun, ListStorage};
use crate::{
    arena::Arena,
    error::{Result, StorageError},
    manifest::ContainerType,
    model::{Item, ItemKey},
};
use log::debug;
use std::ops::Range;

/// Static base container of `K` items followed by an editable augmentation.
///
/// Indices `[0, K)` address the wrapped base and are read only, indices
/// `[K, K + A)` address the augmentation.
#[derive(Debug, Clone, Default)]
pub struct AugmentedStorage {
    augmentation: ListStorage,
    wrapped: u64,
}

impl AugmentedStorage {
    pub fn new() -> Self {
        Self::with_capacity(super::list::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            augmentation: ListStorage::with_capacity(capacity),
            wrapped: 0,
        }
    }

    pub fn add_notify(&mut self, host: &ContainerHost) -> Result<()> {
        let base = host.base()?;
        if !base.is_static() {
            return Err(StorageError::invalid_input(
                "augmented base container is not static",
            ));
        }
        self.augmentation.add_notify(host)?;
        self.wrapped = base.item_count();
        debug!(
            "Attached augmented storage wrapping {} items with {} augmented",
            self.wrapped,
            self.augmentation.len()
        );
        Ok(())
    }

    pub fn remove_notify(&mut self, host: &ContainerHost) -> Result<()> {
        self.augmentation.remove_notify(host)?;
        self.wrapped = 0;
        Ok(())
    }

    /// Always a list, whatever the wrapped container is.
    pub fn container_type(&self) -> ContainerType {
        ContainerType::List
    }

    /// Number of items in the wrapped part.
    pub fn wrapped_count(&self) -> u64 {
        self.wrapped
    }

    pub fn augmentation(&self) -> &ListStorage {
        &self.augmentation
    }

    /// Global index into augmentation index.
    pub fn translate_and_check_edit_index(&self, index: u64) -> Result<u64> {
        if index < self.wrapped {
            Err(StorageError::out_of_bounds(
                index,
                self.wrapped + self.augmentation.len(),
            ))
        } else {
            Ok(index - self.wrapped)
        }
    }

    pub fn item_count(&self, _: &ContainerHost) -> u64 {
        self.wrapped + self.augmentation.len()
    }

    pub fn item_at(&self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        if index < self.wrapped {
            host.base()?.item_at(index)
        } else {
            self.augmentation
                .item_at(host, index - self.wrapped)
                .map_err(|error| match error {
                    StorageError::IndexOutOfBounds { .. } => {
                        StorageError::out_of_bounds(index, self.item_count(host))
                    }
                    error => error,
                })
        }
    }

    pub fn index_of_item(&self, host: &ContainerHost, item: ItemKey) -> Option<u64> {
        host.base()
            .ok()
            .and_then(|base| base.index_of_item(item))
            .or_else(|| {
                self.augmentation
                    .index_of_item(host, item)
                    .map(|i| i + self.wrapped)
            })
    }

    pub fn add_item(&mut self, host: &ContainerHost, index: u64, item: ItemKey) -> Result<()> {
        let local = self.translate_and_check_edit_index(index)?;
        self.augmentation.add_item(host, local, item)
    }

    pub fn add_items(&mut self, host: &ContainerHost, index: u64, items: ItemRun<'_>) -> Result<()> {
        let local = self.translate_and_check_edit_index(index)?;
        self.augmentation.add_items(host, local, items)
    }

    pub fn remove_item(&mut self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        let local = self.translate_and_check_edit_index(index)?;
        self.augmentation.remove_item(host, local)
    }

    pub fn remove_items(&mut self, host: &ContainerHost, range: Range<u64>) -> Result<Vec<ItemKey>> {
        let local = self.translate_range(&range)?;
        self.augmentation.remove_items(host, local)
    }

    pub fn swap_items(&mut self, host: &ContainerHost, a: u64, b: u64) -> Result<()> {
        let a = self.translate_and_check_edit_index(a)?;
        let b = self.translate_and_check_edit_index(b)?;
        self.augmentation.swap_items(host, a, b)
    }

    pub fn begin_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let wrapped = host.base().ok().and_then(|base| base.begin_offset(items));
        let augmented = self.augmentation.begin_offset(host, items);
        wrapped.into_iter().chain(augmented).min()
    }

    pub fn end_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let wrapped = host.base().ok().and_then(|base| base.end_offset(items));
        let augmented = self.augmentation.end_offset(host, items);
        wrapped.into_iter().chain(augmented).max()
    }

    pub fn is_dirty(&self, host: &ContainerHost) -> bool {
        self.augmentation.is_dirty(host)
    }

    pub fn recycle(&mut self) {
        self.augmentation.recycle();
        self.wrapped = 0;
    }

    pub fn revive(&mut self) -> bool {
        self.augmentation.revive()
    }

    pub(crate) fn translate_range(&self, range: &Range<u64>) -> Result<Range<u64>> {
        let start = self.translate_and_check_edit_index(range.start)?;
        Ok(start..range.end.saturating_sub(self.wrapped))
    }
}
