//! Ordered item collections and their storage strategies.
mod augmented;
pub(crate) mod list;
mod run;
mod singleton;
mod span;
mod storage;
mod verifier;
mod wrapping;

pub use augmented::AugmentedStorage;
pub use list::{ListStorage, DEFAULT_CAPACITY};
pub use run::ItemRun;
pub use singleton::SingletonStorage;
pub use span::SpanStorage;
pub use storage::ItemStorage;
pub use verifier::ContainerEditVerifier;
pub use wrapping::WrappingStorage;

use crate::{
    arena::Arena,
    error::{Result, StorageError},
    manifest::{ContainerManifest, ContainerType},
    model::{Item, ItemKey},
};
use getset::Getters;
use log::debug;
use std::{ops::Range, rc::Rc};

/// Everything about a container except its storage.
///
/// Passed to every storage call as context.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct ContainerHost {
    manifest: ContainerManifest,
    /// Containers this one depends on, all static.
    #[getset(skip)]
    base_containers: Vec<Rc<Container>>,
    #[getset(skip)]
    boundary_container: Option<Rc<Container>>,
}

impl ContainerHost {
    pub fn new(manifest: ContainerManifest) -> Self {
        Self {
            manifest,
            base_containers: Vec::new(),
            boundary_container: None,
        }
    }

    pub fn with_base_containers(mut self, base_containers: Vec<Rc<Container>>) -> Self {
        self.base_containers = base_containers;
        self
    }

    pub fn with_boundary_container(mut self, boundary: Rc<Container>) -> Self {
        self.boundary_container = Some(boundary);
        self
    }

    pub fn base_containers(&self) -> &[Rc<Container>] {
        &self.base_containers
    }

    /// First base container.
    pub fn base(&self) -> Result<&Rc<Container>> {
        self.base_containers
            .first()
            .ok_or_else(|| StorageError::illegal_state("container has no base container"))
    }

    pub fn boundary_container(&self) -> Option<&Rc<Container>> {
        self.boundary_container.as_ref()
    }
}

/// Ordered sequence of items backed by exactly one `ItemStorage`.
///
/// All calls are forwarded to the storage with the host as context.
#[derive(Debug, Clone)]
pub struct Container {
    host: ContainerHost,
    storage: Option<ItemStorage>,
}

impl Container {
    /// Container without storage.
    pub fn new(manifest: ContainerManifest) -> Self {
        Self::from_host(ContainerHost::new(manifest))
    }

    pub fn from_host(host: ContainerHost) -> Self {
        Self {
            host,
            storage: None,
        }
    }

    pub fn with_storage(manifest: ContainerManifest, storage: ItemStorage) -> Result<Self> {
        Self::new(manifest).attach(storage)
    }

    /// Builder form of `set_storage`.
    pub fn attach(mut self, storage: ItemStorage) -> Result<Self> {
        self.set_storage(storage)?;
        Ok(self)
    }

    pub fn host(&self) -> &ContainerHost {
        &self.host
    }

    pub fn manifest(&self) -> &ContainerManifest {
        self.host.manifest()
    }

    pub fn base_containers(&self) -> &[Rc<Container>] {
        self.host.base_containers()
    }

    pub fn boundary_container(&self) -> Option<&Rc<Container>> {
        self.host.boundary_container()
    }

    pub fn is_static(&self) -> bool {
        self.manifest().is_static()
    }

    pub fn storage(&self) -> Option<&ItemStorage> {
        self.storage.as_ref()
    }

    /// Attaches storage, returning the detached previous one.
    ///
    /// Storage type must be compatible with the declared container type.
    pub fn set_storage(&mut self, mut storage: ItemStorage) -> Result<Option<ItemStorage>> {
        let found = storage.container_type_for(&self.host)?;
        let declared = self.manifest().container_type();
        if !found.is_compatible_with(declared) {
            return Err(StorageError::invalid_input(format!(
                "storage of type {} can't serve container declared as {}",
                found, declared
            )));
        }
        storage.add_notify(&self.host)?;

        let previous = self.take_storage()?;
        debug!("Attached {} storage to {} container", found, declared);
        self.storage = Some(storage);
        Ok(previous)
    }

    /// Detaches current storage.
    pub fn take_storage(&mut self) -> Result<Option<ItemStorage>> {
        match self.storage.take() {
            Some(mut storage) => {
                storage.remove_notify(&self.host)?;
                Ok(Some(storage))
            }
            None => Ok(None),
        }
    }

    pub fn container_type(&self) -> Result<ContainerType> {
        Ok(self.attached()?.container_type())
    }

    /// Zero while no storage is attached.
    pub fn item_count(&self) -> u64 {
        self.storage
            .as_ref()
            .map_or(0, |storage| storage.item_count(&self.host))
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn item_at(&self, index: u64) -> Result<ItemKey> {
        self.attached()?.item_at(&self.host, index)
    }

    pub fn index_of_item(&self, item: ItemKey) -> Option<u64> {
        self.storage.as_ref()?.index_of_item(&self.host, item)
    }

    pub fn contains_item(&self, item: ItemKey) -> bool {
        self.index_of_item(item).is_some()
    }

    /// Items in order.
    pub fn items(&self) -> impl Iterator<Item = ItemKey> + '_ {
        self.storage
            .iter()
            .flat_map(move |storage| storage.iter(&self.host))
    }

    pub fn add_item(&mut self, index: u64, item: ItemKey) -> Result<()> {
        let (host, storage) = self.editable()?;
        storage.add_item(host, index, item)
    }

    pub fn add_items(&mut self, index: u64, items: ItemRun<'_>) -> Result<()> {
        let (host, storage) = self.editable()?;
        storage.add_items(host, index, items)
    }

    pub fn remove_item(&mut self, index: u64) -> Result<ItemKey> {
        let (host, storage) = self.editable()?;
        storage.remove_item(host, index)
    }

    pub fn remove_items(&mut self, range: Range<u64>) -> Result<Vec<ItemKey>> {
        let (host, storage) = self.editable()?;
        storage.remove_items(host, range)
    }

    pub fn swap_items(&mut self, a: u64, b: u64) -> Result<()> {
        let (host, storage) = self.editable()?;
        storage.swap_items(host, a, b)
    }

    pub fn begin_offset(&self, items: &Arena<Item>) -> Option<u64> {
        self.storage.as_ref()?.begin_offset(&self.host, items)
    }

    pub fn end_offset(&self, items: &Arena<Item>) -> Option<u64> {
        self.storage.as_ref()?.end_offset(&self.host, items)
    }

    pub fn is_dirty(&self) -> bool {
        self.storage
            .as_ref()
            .map_or(false, |storage| storage.is_dirty(&self.host))
    }

    /// Immutable for static containers.
    pub fn create_edit_verifier(&self) -> ContainerEditVerifier<'_> {
        match &self.storage {
            Some(storage) if !self.is_static() => storage.create_edit_verifier(self),
            _ => ContainerEditVerifier::Immutable,
        }
    }

    /// Recycles storage before the container goes back to the pool.
    pub fn recycle(&mut self) {
        if let Some(storage) = self.storage.as_mut() {
            storage.recycle();
        }
    }

    pub fn revive(&mut self) -> bool {
        self.storage.as_mut().map_or(false, ItemStorage::revive)
    }

    fn attached(&self) -> Result<&ItemStorage> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::illegal_state("no item storage attached"))
    }

    fn editable(&mut self) -> Result<(&ContainerHost, &mut ItemStorage)> {
        if self.manifest().is_static() {
            return Err(StorageError::unsupported("edit of static container"));
        }
        let storage = self
            .storage
            .as_mut()
            .ok_or_else(|| StorageError::illegal_state("no item storage attached"))?;
        Ok((&self.host, storage))
    }
}
