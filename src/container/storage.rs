use super::{
    AugmentedStorage, Container, ContainerEditVerifier, ContainerHost, ItemRun, ListStorage,
    SingletonStorage, SpanStorage, WrappingStorage,
};
use crate::{
    arena::Arena,
    error::Result,
    manifest::ContainerType,
    model::{Item, ItemKey},
};
use auto_enums::auto_enum;
use std::ops::Range;

/// Forwards a call to whichever strategy is inside of `ItemStorage`.
macro_rules! dispatch_item_storage {
    ($storage:expr, $s:ident => $call:expr) => {
        match $storage {
            ItemStorage::List($s) => $call,
            ItemStorage::Singleton($s) => $call,
            ItemStorage::Span($s) => $call,
            ItemStorage::Augmented($s) => $call,
            ItemStorage::Wrapping($s) => $call,
        }
    };
}

/// Storage strategy of a container.
///
/// Strategies don't know which container they serve, every call receives the
/// host of the container so they can look at its manifest and base containers.
#[derive(Debug, Clone)]
pub enum ItemStorage {
    List(ListStorage),
    Singleton(SingletonStorage),
    Span(SpanStorage),
    Augmented(AugmentedStorage),
    Wrapping(WrappingStorage),
}

impl ItemStorage {
    /// Binds to host. Sizing and validity checks happen here.
    pub fn add_notify(&mut self, host: &ContainerHost) -> Result<()> {
        dispatch_item_storage!(self, s => s.add_notify(host))
    }

    pub fn remove_notify(&mut self, host: &ContainerHost) -> Result<()> {
        dispatch_item_storage!(self, s => s.remove_notify(host))
    }

    pub fn container_type(&self) -> ContainerType {
        dispatch_item_storage!(self, s => s.container_type())
    }

    /// Type the storage takes on once attached to host.
    pub fn container_type_for(&self, host: &ContainerHost) -> Result<ContainerType> {
        match self {
            ItemStorage::Wrapping(s) => s.container_type_for(host),
            other => Ok(other.container_type()),
        }
    }

    pub fn item_count(&self, host: &ContainerHost) -> u64 {
        dispatch_item_storage!(self, s => s.item_count(host))
    }

    pub fn item_at(&self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        dispatch_item_storage!(self, s => s.item_at(host, index))
    }

    pub fn index_of_item(&self, host: &ContainerHost, item: ItemKey) -> Option<u64> {
        dispatch_item_storage!(self, s => s.index_of_item(host, item))
    }

    pub fn add_item(&mut self, host: &ContainerHost, index: u64, item: ItemKey) -> Result<()> {
        dispatch_item_storage!(self, s => s.add_item(host, index, item))
    }

    /// All or nothing.
    pub fn add_items(&mut self, host: &ContainerHost, index: u64, items: ItemRun<'_>) -> Result<()> {
        dispatch_item_storage!(self, s => s.add_items(host, index, items))
    }

    pub fn remove_item(&mut self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        dispatch_item_storage!(self, s => s.remove_item(host, index))
    }

    /// All or nothing.
    pub fn remove_items(&mut self, host: &ContainerHost, range: Range<u64>) -> Result<Vec<ItemKey>> {
        dispatch_item_storage!(self, s => s.remove_items(host, range))
    }

    pub fn swap_items(&mut self, host: &ContainerHost, a: u64, b: u64) -> Result<()> {
        dispatch_item_storage!(self, s => s.swap_items(host, a, b))
    }

    pub fn begin_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        dispatch_item_storage!(self, s => s.begin_offset(host, items))
    }

    pub fn end_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        dispatch_item_storage!(self, s => s.end_offset(host, items))
    }

    pub fn is_dirty(&self, host: &ContainerHost) -> bool {
        dispatch_item_storage!(self, s => s.is_dirty(host))
    }

    /// Erases every reference before going back to the pool.
    pub fn recycle(&mut self) {
        dispatch_item_storage!(self, s => s.recycle())
    }

    /// False if storage isn't usable after being taken from the pool.
    pub fn revive(&mut self) -> bool {
        dispatch_item_storage!(self, s => s.revive())
    }

    #[auto_enum(Iterator)]
    pub fn iter<'a>(&'a self, host: &'a ContainerHost) -> impl Iterator<Item = ItemKey> + 'a {
        match self {
            ItemStorage::List(s) => s.iter(),
            ItemStorage::Singleton(s) => s.iter(),
            ItemStorage::Span(s) => host.base().into_iter().flat_map(move |base| s.iter(base)),
            ItemStorage::Augmented(_) | ItemStorage::Wrapping(_) => (0..self.item_count(host))
                .filter_map(move |i| self.item_at(host, i).ok()),
        }
    }

    pub fn create_edit_verifier<'a>(&'a self, container: &'a Container) -> ContainerEditVerifier<'a> {
        match self {
            ItemStorage::List(_) => ContainerEditVerifier::Default { container },
            ItemStorage::Singleton(storage) => ContainerEditVerifier::Singleton { storage },
            ItemStorage::Span(storage) => ContainerEditVerifier::Span { container, storage },
            ItemStorage::Augmented(storage) => ContainerEditVerifier::Augmented { storage },
            ItemStorage::Wrapping(_) => ContainerEditVerifier::Immutable,
        }
    }
}

impl From<ListStorage> for ItemStorage {
    fn from(storage: ListStorage) -> Self {
        ItemStorage::List(storage)
    }
}

impl From<SingletonStorage> for ItemStorage {
    fn from(storage: SingletonStorage) -> Self {
        ItemStorage::Singleton(storage)
    }
}

impl From<SpanStorage> for ItemStorage {
    fn from(storage: SpanStorage) -> Self {
        ItemStorage::Span(storage)
    }
}

impl From<AugmentedStorage> for ItemStorage {
    fn from(storage: AugmentedStorage) -> Self {
        ItemStorage::Augmented(storage)
    }
}

impl From<WrappingStorage> for ItemStorage {
    fn from(storage: WrappingStorage) -> Self {
        ItemStorage::Wrapping(storage)
    }
}
