use super::Structure;
use crate::{
    error::{Result, StorageError},
    model::EdgeKey,
};
use std::ops::Range;

/// Edges of a structure seen as a container of their own.
///
/// Edges are only ever edited through the structure, every mutator here fails.
#[derive(Debug, Clone, Copy)]
pub struct EdgeProxy<'a> {
    structure: &'a Structure,
}

impl<'a> EdgeProxy<'a> {
    pub fn new(structure: &'a Structure) -> Self {
        Self { structure }
    }

    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    pub fn item_count(&self) -> u64 {
        self.structure.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn item_at(&self, index: u64) -> Result<EdgeKey> {
        self.structure.edge_at(index)
    }

    pub fn index_of_item(&self, edge: EdgeKey) -> Option<u64> {
        self.structure.index_of_edge(edge)
    }

    pub fn contains_item(&self, edge: EdgeKey) -> bool {
        self.index_of_item(edge).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + 'a {
        self.structure.edge_keys()
    }

    pub fn add_item(&self, _: u64, _: EdgeKey) -> Result<()> {
        Err(StorageError::unsupported("edit of edge proxy"))
    }

    pub fn remove_item(&self, _: u64) -> Result<EdgeKey> {
        Err(StorageError::unsupported("edit of edge proxy"))
    }

    pub fn remove_items(&self, _: Range<u64>) -> Result<Vec<EdgeKey>> {
        Err(StorageError::unsupported("edit of edge proxy"))
    }

    pub fn swap_items(&self, _: u64, _: u64) -> Result<()> {
        Err(StorageError::unsupported("edit of edge proxy"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::Arena,
        container::ListStorage,
        error::ErrorKind,
        manifest::{ContainerManifest, ContainerType, StructureManifest, StructureType},
        model::{Item, Terminal},
        structure::GraphEdgeStorage,
    };

    #[test]
    fn mirrors_edges() {
        let mut arena = Arena::new();
        let n = (0..3).map(|_| arena.insert(Item::new())).collect::<Vec<_>>();
        let manifest = StructureManifest::new(
            ContainerManifest::new(ContainerType::List),
            StructureType::Graph,
        )
        .with_non_static(true);
        let mut graph = Structure::new(manifest)
            .attach(ListStorage::from_items(n.clone()).into())
            .unwrap()
            .attach_edges(GraphEdgeStorage::new().into())
            .unwrap();
        let a = graph.new_edge(n[0].into(), n[1].into()).unwrap();
        let b = graph.new_edge(n[1].into(), n[2].into()).unwrap();
        let c = graph.new_edge(Terminal::Root, n[2].into()).unwrap();
        graph.add_edges(0, &[a, b]).unwrap();

        let proxy = graph.edge_container();
        assert_eq!(proxy.item_count(), 2);
        assert_eq!(proxy.item_at(1).unwrap(), b);
        assert_eq!(proxy.index_of_item(a), Some(0));
        assert!(!proxy.contains_item(c));
        assert_eq!(proxy.iter().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(
            proxy.add_item(0, c).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(proxy.remove_item(0).unwrap_err().kind(), ErrorKind::Unsupported);
    }
}
