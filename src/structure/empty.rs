use super::{root::RootItem, StructureContext};
use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::{EdgeKey, ItemKey, Terminal},
};

/// Structure without any edges. Every node is its own island.
#[derive(Debug, Clone, Default)]
pub struct EmptyEdgeStorage {
    root: RootItem,
}

impl EmptyEdgeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_notify(&mut self, _: StructureContext<'_>) -> Result<()> {
        Ok(())
    }

    pub fn remove_notify(&mut self, _: StructureContext<'_>) -> Result<()> {
        Ok(())
    }

    pub fn structure_type(&self) -> StructureType {
        StructureType::Set
    }

    pub fn edge_count(&self) -> u64 {
        0
    }

    pub fn edge_at(&self, index: u64) -> Result<EdgeKey> {
        Err(StorageError::out_of_bounds(index, 0))
    }

    pub fn virtual_root(&self) -> &RootItem {
        &self.root
    }

    pub fn edge_at_of(&self, _: Terminal, index: u64, _: bool) -> Result<EdgeKey> {
        Err(StorageError::out_of_bounds(index, 0))
    }

    pub fn parent(&self, _: StructureContext<'_>, _: ItemKey) -> Result<Option<Terminal>> {
        Ok(None)
    }

    pub fn index_of_child(&self, _: StructureContext<'_>, _: ItemKey) -> Result<Option<u64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, structure::NodeInfo};

    #[test]
    fn no_edges() {
        let storage = EmptyEdgeStorage::new();
        assert_eq!(storage.edge_count(), 0);
        assert_eq!(
            storage.edge_at(0).unwrap_err().kind(),
            ErrorKind::IndexOutOfBounds
        );
        assert!(storage.virtual_root().is_empty());
        assert!(storage.virtual_root().check_add_outgoing(1).is_err());
    }
}
