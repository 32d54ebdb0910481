use super::{AugmentedStorage, Container, ItemRun, ListStorage, SingletonStorage, SpanStorage};
use crate::model::ItemKey;
use std::ops::Range;

/// Answers whether an edit of a container would be accepted, without doing it.
///
/// Bound to one container, it holds a shared borrow of it until closed or dropped,
/// so the answers can't go stale. A `false` is never an error.
#[derive(Debug, Clone, Copy)]
pub enum ContainerEditVerifier<'a> {
    /// Static containers and storages that never change.
    Immutable,
    /// Plain bounds checks of a list.
    Default { container: &'a Container },
    Singleton { storage: &'a SingletonStorage },
    /// Boundary only growth of contiguous runs.
    Span {
        container: &'a Container,
        storage: &'a SpanStorage,
    },
    /// Bounds checks that also reject the wrapped range.
    Augmented { storage: &'a AugmentedStorage },
}

impl<'a> ContainerEditVerifier<'a> {
    pub fn is_allow_edits(&self) -> bool {
        !matches!(self, ContainerEditVerifier::Immutable)
    }

    pub fn can_add_item(&self, index: u64, item: ItemKey) -> bool {
        match *self {
            ContainerEditVerifier::Immutable => false,
            ContainerEditVerifier::Default { container } => {
                ListStorage::check_add(index, container.item_count(), 1).is_ok()
            }
            ContainerEditVerifier::Singleton { storage } => storage.check_add(index, 1).is_ok(),
            ContainerEditVerifier::Span { container, storage } => {
                storage.check_add(container.host(), index, item).is_ok()
            }
            ContainerEditVerifier::Augmented { storage } => storage
                .translate_and_check_edit_index(index)
                .and_then(|local| ListStorage::check_add(local, storage.augmentation().len(), 1))
                .is_ok(),
        }
    }

    pub fn can_add_items(&self, index: u64, items: ItemRun<'_>) -> bool {
        match *self {
            ContainerEditVerifier::Immutable => false,
            ContainerEditVerifier::Default { container } => {
                ListStorage::check_add(index, container.item_count(), items.len()).is_ok()
                    && items.validate().is_ok()
            }
            ContainerEditVerifier::Singleton { storage } => {
                storage.check_add(index, items.len()).is_ok() && items.validate().is_ok()
            }
            ContainerEditVerifier::Span { container, storage } => storage
                .check_add_items(container.host(), index, items)
                .is_ok(),
            ContainerEditVerifier::Augmented { storage } => {
                storage
                    .translate_and_check_edit_index(index)
                    .and_then(|local| {
                        ListStorage::check_add(local, storage.augmentation().len(), items.len())
                    })
                    .is_ok()
                    && items.validate().is_ok()
            }
        }
    }

    pub fn can_remove_item(&self, index: u64) -> bool {
        match *self {
            ContainerEditVerifier::Immutable => false,
            ContainerEditVerifier::Default { container } => {
                ListStorage::check_remove(index, container.item_count()).is_ok()
            }
            ContainerEditVerifier::Singleton { storage } => storage.check_remove(index).is_ok(),
            ContainerEditVerifier::Span { storage, .. } => storage.check_remove(index).is_ok(),
            ContainerEditVerifier::Augmented { storage } => storage
                .translate_and_check_edit_index(index)
                .and_then(|local| ListStorage::check_remove(local, storage.augmentation().len()))
                .is_ok(),
        }
    }

    pub fn can_remove_items(&self, range: Range<u64>) -> bool {
        match *self {
            ContainerEditVerifier::Immutable => false,
            ContainerEditVerifier::Default { container } => {
                ListStorage::check_remove_range(&range, container.item_count()).is_ok()
            }
            ContainerEditVerifier::Singleton { storage } => {
                storage.check_remove_range(&range).is_ok()
            }
            ContainerEditVerifier::Span { storage, .. } => {
                storage.check_remove_range(&range).is_ok()
            }
            ContainerEditVerifier::Augmented { storage } => storage
                .translate_range(&range)
                .and_then(|local| {
                    ListStorage::check_remove_range(&local, storage.augmentation().len())
                })
                .is_ok(),
        }
    }

    pub fn can_swap_items(&self, a: u64, b: u64) -> bool {
        match *self {
            ContainerEditVerifier::Immutable
            | ContainerEditVerifier::Singleton { .. }
            | ContainerEditVerifier::Span { .. } => false,
            ContainerEditVerifier::Default { container } => {
                ListStorage::check_swap(a, b, container.item_count()).is_ok()
            }
            ContainerEditVerifier::Augmented { storage } => {
                let len = storage.augmentation().len();
                storage
                    .translate_and_check_edit_index(a)
                    .and_then(|a| {
                        let b = storage.translate_and_check_edit_index(b)?;
                        ListStorage::check_swap(a, b, len)
                    })
                    .is_ok()
            }
        }
    }

    /// Releases the container.
    pub fn close(self) {}
}
