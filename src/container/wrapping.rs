use super::{ContainerHost, ItemRun};
use crate::{
    arena::Arena,
    error::{Result, StorageError},
    manifest::ContainerType,
    model::{Item, ItemKey},
};
use std::ops::Range;

/// Read through view of a static base container. Every mutation fails.
#[derive(Debug, Clone, Default)]
pub struct WrappingStorage {
    /// Type of the wrapped container, known once attached.
    container_type: Option<ContainerType>,
}

impl WrappingStorage {
    pub fn new() -> Self {
        Self {
            container_type: None,
        }
    }

    pub fn add_notify(&mut self, host: &ContainerHost) -> Result<()> {
        let base = host.base()?;
        if !base.is_static() {
            return Err(StorageError::invalid_input(
                "wrapped base container is not static",
            ));
        }
        self.container_type = Some(base.container_type()?);
        Ok(())
    }

    pub fn container_type_for(&self, host: &ContainerHost) -> Result<ContainerType> {
        host.base()?.container_type()
    }

    pub fn remove_notify(&mut self, _: &ContainerHost) -> Result<()> {
        self.container_type = None;
        Ok(())
    }

    /// Type of the wrapped container, a list until attached.
    pub fn container_type(&self) -> ContainerType {
        self.container_type.unwrap_or(ContainerType::List)
    }

    pub fn item_count(&self, host: &ContainerHost) -> u64 {
        host.base().map_or(0, |base| base.item_count())
    }

    pub fn item_at(&self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        host.base()?.item_at(index)
    }

    pub fn index_of_item(&self, host: &ContainerHost, item: ItemKey) -> Option<u64> {
        host.base().ok()?.index_of_item(item)
    }

    pub fn add_item(&mut self, _: &ContainerHost, _: u64, _: ItemKey) -> Result<()> {
        Err(StorageError::unsupported("add on wrapping storage"))
    }

    pub fn add_items(&mut self, _: &ContainerHost, _: u64, _: ItemRun<'_>) -> Result<()> {
        Err(StorageError::unsupported("add on wrapping storage"))
    }

    pub fn remove_item(&mut self, _: &ContainerHost, _: u64) -> Result<ItemKey> {
        Err(StorageError::unsupported("remove on wrapping storage"))
    }

    pub fn remove_items(&mut self, _: &ContainerHost, _: Range<u64>) -> Result<Vec<ItemKey>> {
        Err(StorageError::unsupported("remove on wrapping storage"))
    }

    pub fn swap_items(&mut self, _: &ContainerHost, _: u64, _: u64) -> Result<()> {
        Err(StorageError::unsupported("swap on wrapping storage"))
    }

    pub fn begin_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        host.base().ok()?.begin_offset(items)
    }

    pub fn end_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        host.base().ok()?.end_offset(items)
    }

    pub fn is_dirty(&self, host: &ContainerHost) -> bool {
        host.base().map_or(false, |base| base.is_dirty())
    }

    pub fn recycle(&mut self) {
        self.container_type = None;
    }

    pub fn revive(&mut self) -> bool {
        true
    }
}
