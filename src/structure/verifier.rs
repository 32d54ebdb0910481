use super::{EdgeStorage, FixedSizeChainStorage, Structure};
use crate::{
    container::{ContainerEditVerifier, ItemRun},
    model::{EdgeKey, ItemKey, Terminal},
};
use std::ops::Range;

/// Answers whether an edit of a structure would be accepted, without doing it.
///
/// Item edits are delegated to the verifier of the node container.
#[derive(Debug, Clone, Copy)]
pub enum StructureEditVerifier<'a> {
    Immutable,
    Compound {
        items: ContainerEditVerifier<'a>,
        structure: &'a Structure,
        storage: &'a EdgeStorage,
    },
    /// Slot checks of a fixed size chain, swaps are never legal.
    FixedSizeChain {
        items: ContainerEditVerifier<'a>,
        structure: &'a Structure,
        storage: &'a FixedSizeChainStorage,
    },
}

impl<'a> StructureEditVerifier<'a> {
    pub fn is_allow_edits(&self) -> bool {
        !matches!(self, StructureEditVerifier::Immutable)
    }

    /// Verifier for the items of the node container.
    pub fn items(&self) -> ContainerEditVerifier<'a> {
        match self {
            StructureEditVerifier::Immutable => ContainerEditVerifier::Immutable,
            StructureEditVerifier::Compound { items, .. }
            | StructureEditVerifier::FixedSizeChain { items, .. } => *items,
        }
    }

    // ********************* Items *********************

    pub fn can_add_item(&self, index: u64, item: ItemKey) -> bool {
        self.items().can_add_item(index, item)
    }

    pub fn can_add_items(&self, index: u64, items: ItemRun<'_>) -> bool {
        self.items().can_add_items(index, items)
    }

    pub fn can_remove_item(&self, index: u64) -> bool {
        self.items().can_remove_item(index)
    }

    pub fn can_remove_items(&self, range: Range<u64>) -> bool {
        self.items().can_remove_items(range)
    }

    pub fn can_swap_items(&self, a: u64, b: u64) -> bool {
        self.items().can_swap_items(a, b)
    }

    // ********************* Edges *********************

    pub fn can_add_edge(&self, index: u64, edge: EdgeKey) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { structure, storage, .. } => storage
                .check_add_edge(structure.context(), index, edge)
                .is_ok(),
            StructureEditVerifier::FixedSizeChain { structure, storage, .. } => {
                storage.check_add_edge(structure.context(), edge).is_ok()
            }
        }
    }

    pub fn can_add_edges(&self, index: u64, edges: &[EdgeKey]) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { structure, storage, .. } => storage
                .check_add_edges(structure.context(), index, edges)
                .is_ok(),
            StructureEditVerifier::FixedSizeChain { structure, storage, .. } => {
                storage.check_add_edges(structure.context(), edges).is_ok()
            }
        }
    }

    pub fn can_remove_edge(&self, index: u64) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { storage, .. } => storage.check_remove(index).is_ok(),
            StructureEditVerifier::FixedSizeChain { storage, .. } => {
                storage.check_remove(index).is_ok()
            }
        }
    }

    pub fn can_remove_edges(&self, range: Range<u64>) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { storage, .. } => {
                storage.check_remove_range(&range).is_ok()
            }
            StructureEditVerifier::FixedSizeChain { storage, .. } => {
                storage.check_remove_range(&range).is_ok()
            }
        }
    }

    pub fn can_swap_edges(&self, a: u64, b: u64) -> bool {
        match self {
            StructureEditVerifier::Compound { storage, .. } => storage.check_swap(a, b).is_ok(),
            StructureEditVerifier::Immutable | StructureEditVerifier::FixedSizeChain { .. } => false,
        }
    }

    pub fn can_set_terminal(&self, edge: EdgeKey, terminal: Terminal, is_source: bool) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { structure, storage, .. } => storage
                .check_set_terminal(structure.context(), edge, terminal, is_source)
                .is_ok(),
            StructureEditVerifier::FixedSizeChain { structure, storage, .. } => storage
                .check_set_terminal(structure.context(), edge, terminal, is_source)
                .is_ok(),
        }
    }

    /// Whether a new edge source -> target could be linked right now.
    pub fn can_create_edge(&self, source: Terminal, target: Terminal) -> bool {
        match self {
            StructureEditVerifier::Immutable => false,
            StructureEditVerifier::Compound { structure, storage, .. } => storage
                .check_link(structure.context(), source, target)
                .is_ok(),
            StructureEditVerifier::FixedSizeChain { structure, storage, .. } => storage
                .check_link(structure.context(), source, target)
                .is_ok(),
        }
    }

    /// Releases the structure.
    pub fn close(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::Arena,
        container::ListStorage,
        manifest::{ContainerManifest, ContainerType, StructureManifest, StructureType},
        model::Item,
        structure::{ChainEdgeStorage, EmptyEdgeStorage, GraphEdgeStorage, TreeEdgeStorage},
    };

    fn structure(
        container: ContainerManifest,
        ty: StructureType,
        nodes: &[ItemKey],
        edges: EdgeStorage,
    ) -> Structure {
        let manifest = StructureManifest::new(container.clone(), ty).with_non_static(true);
        Structure::new(manifest)
            .attach(ListStorage::from_items(nodes.to_vec()).into())
            .unwrap()
            .attach_edges(edges)
            .unwrap()
    }

    fn nodes(n: usize) -> Vec<ItemKey> {
        let mut arena = Arena::new();
        (0..n).map(|_| arena.insert(Item::new())).collect()
    }

    #[test]
    fn static_structure() {
        let n = nodes(2);
        let manifest = StructureManifest::new(
            ContainerManifest::new(ContainerType::List),
            StructureType::Graph,
        );
        let structure = Structure::new(manifest)
            .attach(ListStorage::from_items(n.clone()).into())
            .unwrap()
            .attach_edges(GraphEdgeStorage::new().into())
            .unwrap();

        let verifier = structure.create_edit_verifier();
        assert!(!verifier.is_allow_edits());
        assert!(!verifier.can_create_edge(n[0].into(), n[1].into()));
        assert!(!verifier.can_add_item(0, n[0]));
        verifier.close();
    }

    #[test]
    fn compound_delegates_items() {
        let n = nodes(2);
        let editable = ContainerManifest::new(ContainerType::List).with_non_static(true);
        let structure = structure(editable, StructureType::Tree, &n, TreeEdgeStorage::new().into());

        let verifier = structure.create_edit_verifier();
        assert!(verifier.can_add_item(2, n[0]));
        assert!(!verifier.can_add_item(3, n[0]));
        assert!(verifier.can_remove_items(0..2));

        let frozen = ContainerManifest::new(ContainerType::List);
        let structure = structure_with(frozen, &n);
        let verifier = structure.create_edit_verifier();
        assert!(verifier.is_allow_edits());
        assert!(!verifier.can_add_item(0, n[0]));
        assert!(verifier.can_create_edge(Terminal::Root, n[0].into()));
    }

    fn structure_with(container: ContainerManifest, n: &[ItemKey]) -> Structure {
        structure(container, StructureType::Tree, n, TreeEdgeStorage::new().into())
    }

    #[test]
    fn tree_edges() {
        let n = nodes(3);
        let mut tree = structure_with(ContainerManifest::new(ContainerType::List), &n);
        let e0 = tree.new_edge(Terminal::Root, n[0].into()).unwrap();
        let e1 = tree.new_edge(n[0].into(), n[1].into()).unwrap();
        let e2 = tree.new_edge(n[2].into(), n[1].into()).unwrap();
        tree.add_edges(0, &[e0, e1]).unwrap();

        let verifier = tree.create_edit_verifier();
        assert!(!verifier.can_add_edge(0, e1));
        assert!(!verifier.can_add_edge(0, e2));
        assert!(!verifier.can_add_edge(3, e2));
        assert!(!verifier.can_create_edge(Terminal::Root, n[2].into()));
        assert!(verifier.can_create_edge(n[0].into(), n[2].into()));
        assert!(!verifier.can_create_edge(n[2].into(), Terminal::Root));
        assert!(verifier.can_swap_edges(0, 1));
        assert!(!verifier.can_remove_edge(2));
        assert!(verifier.can_set_terminal(e1, n[2].into(), false));
        assert!(!verifier.can_set_terminal(e1, n[0].into(), false));
    }

    #[test]
    fn batch_agrees_with_add_edges() {
        let n = nodes(3);
        let mut chain = structure(
            ContainerManifest::new(ContainerType::List),
            StructureType::Chain,
            &n,
            ChainEdgeStorage::new().into(),
        );
        let a = chain.new_edge(n[0].into(), n[1].into()).unwrap();
        let b = chain.new_edge(n[0].into(), n[2].into()).unwrap();
        let c = chain.new_edge(n[1].into(), n[2].into()).unwrap();

        assert!(!chain.create_edit_verifier().can_add_edges(0, &[a, b]));
        assert!(chain.add_edges(0, &[a, b]).is_err());
        assert!(!chain.create_edit_verifier().can_add_edges(0, &[a, a]));
        assert!(chain.create_edit_verifier().can_add_edges(0, &[a, c]));
        assert!(chain.add_edges(0, &[a, c]).is_ok());
    }

    #[test]
    fn empty_structure() {
        let n = nodes(2);
        let structure = structure(
            ContainerManifest::new(ContainerType::List),
            StructureType::Set,
            &n,
            EmptyEdgeStorage::new().into(),
        );

        let verifier = structure.create_edit_verifier();
        assert!(!verifier.can_create_edge(n[0].into(), n[1].into()));
        assert!(!verifier.can_remove_edge(0));
        assert!(!verifier.can_swap_edges(0, 0));
    }

    #[test]
    fn fixed_chain_slots() {
        let n = nodes(3);
        let mut chain = structure(
            ContainerManifest::new(ContainerType::List),
            StructureType::Chain,
            &n,
            FixedSizeChainStorage::new().into(),
        );
        let e01 = chain.new_edge(n[0].into(), n[1].into()).unwrap();
        let e21 = chain.new_edge(n[2].into(), n[1].into()).unwrap();
        let e02 = chain.new_edge(n[0].into(), n[2].into()).unwrap();
        chain.add_edge(0, e01).unwrap();

        let verifier = chain.create_edit_verifier();
        assert!(matches!(verifier, StructureEditVerifier::FixedSizeChain { .. }));
        assert!(!verifier.can_add_edge(0, e21));
        assert!(!verifier.can_add_edge(0, e02));
        assert!(verifier.can_create_edge(Terminal::Root, n[0].into()));
        assert!(!verifier.can_create_edge(n[1].into(), n[1].into()));
        assert!(!verifier.can_create_edge(n[1].into(), Terminal::Root));
        assert!(!verifier.can_create_edge(n[1].into(), n[0].into()));
        assert!(verifier.can_create_edge(n[1].into(), n[2].into()));
        assert!(!verifier.can_swap_edges(0, 0));
        assert!(verifier.can_remove_edge(0));
        assert!(verifier.can_set_terminal(e01, n[2].into(), false));
        assert!(!verifier.can_set_terminal(e01, n[0].into(), false));
        assert!(!verifier.can_set_terminal(e01, Terminal::Root, false));
    }
}
