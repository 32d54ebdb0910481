use super::{
    EmptyEdgeStorage, FixedSizeChainStorage, ChainEdgeStorage, GraphEdgeStorage, RootItem,
    Structure, StructureContext, StructureEditVerifier, TreeEdgeStorage,
};
use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::{EdgeKey, ItemKey, Terminal},
    util::{check_index, check_range},
};
use auto_enums::auto_enum;
use std::ops::Range;

/// Forwards a call to the strategy inside of `EdgeStorage`.
///
/// The second form answers with `$empty` for the edgeless strategy.
macro_rules! dispatch_edge_storage {
    ($storage:expr, $s:ident => $call:expr) => {
        match $storage {
            EdgeStorage::Empty($s) => $call,
            EdgeStorage::Chain($s) => $call,
            EdgeStorage::Tree($s) => $call,
            EdgeStorage::Graph($s) => $call,
            EdgeStorage::FixedSizeChain($s) => $call,
        }
    };
    ($storage:expr, $s:ident => $call:expr, empty => $empty:expr) => {
        match $storage {
            EdgeStorage::Empty(_) => $empty,
            EdgeStorage::Chain($s) => $call,
            EdgeStorage::Tree($s) => $call,
            EdgeStorage::Graph($s) => $call,
            EdgeStorage::FixedSizeChain($s) => $call,
        }
    };
}

/// Strategy holding the edges of a structure.
#[derive(Debug, Clone)]
pub enum EdgeStorage {
    Empty(EmptyEdgeStorage),
    Chain(ChainEdgeStorage),
    Tree(TreeEdgeStorage),
    Graph(GraphEdgeStorage),
    FixedSizeChain(FixedSizeChainStorage),
}

impl EdgeStorage {
    pub fn add_notify(&mut self, ctx: StructureContext<'_>) -> Result<()> {
        dispatch_edge_storage!(self, s => s.add_notify(ctx))
    }

    pub fn remove_notify(&mut self, ctx: StructureContext<'_>) -> Result<()> {
        dispatch_edge_storage!(self, s => s.remove_notify(ctx))
    }

    pub fn structure_type(&self) -> StructureType {
        dispatch_edge_storage!(self, s => s.structure_type())
    }

    pub fn edge_count(&self) -> u64 {
        dispatch_edge_storage!(self, s => s.edge_count())
    }

    pub fn edge_at(&self, index: u64) -> Result<EdgeKey> {
        dispatch_edge_storage!(self, s => s.edge_at(index))
    }

    pub fn index_of_edge(&self, ctx: StructureContext<'_>, edge: EdgeKey) -> Option<u64> {
        match self {
            EdgeStorage::Empty(_) => None,
            EdgeStorage::Chain(s) => s.index_of_edge(edge),
            EdgeStorage::Tree(s) => s.index_of_edge(edge),
            EdgeStorage::Graph(s) => s.index_of_edge(edge),
            EdgeStorage::FixedSizeChain(s) => s.index_of_edge(ctx, edge),
        }
    }

    #[auto_enum(Iterator)]
    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        match self {
            EdgeStorage::Empty(_) => std::iter::empty(),
            EdgeStorage::Chain(s) => s.iter(),
            EdgeStorage::Tree(s) => s.iter(),
            EdgeStorage::Graph(s) => s.iter(),
            EdgeStorage::FixedSizeChain(s) => s.iter(),
        }
    }

    pub fn virtual_root(&self) -> &RootItem {
        dispatch_edge_storage!(self, s => s.virtual_root())
    }

    pub fn edge_count_of(&self, node: Terminal) -> u64 {
        dispatch_edge_storage!(self, s => s.edge_count_of(node), empty => 0)
    }

    pub fn edge_count_of_dir(&self, node: Terminal, incoming: bool) -> u64 {
        dispatch_edge_storage!(self, s => s.edge_count_of_dir(node, incoming), empty => 0)
    }

    pub fn edge_at_of(&self, node: Terminal, index: u64, incoming: bool) -> Result<EdgeKey> {
        dispatch_edge_storage!(self, s => s.edge_at_of(node, index, incoming))
    }

    // ********************* Mutation *********************

    pub fn add_edge(&mut self, ctx: StructureContext<'_>, index: u64, edge: EdgeKey) -> Result<()> {
        dispatch_edge_storage!(
            self,
            s => s.add_edge(ctx, index, edge),
            empty => Err(StorageError::unsupported("edges in empty structure"))
        )
    }

    /// All or nothing.
    pub fn add_edges(&mut self, ctx: StructureContext<'_>, index: u64, edges: &[EdgeKey]) -> Result<()> {
        dispatch_edge_storage!(
            self,
            s => s.add_edges(ctx, index, edges),
            empty => Err(StorageError::unsupported("edges in empty structure"))
        )
    }

    pub fn remove_edge(&mut self, ctx: StructureContext<'_>, index: u64) -> Result<EdgeKey> {
        dispatch_edge_storage!(
            self,
            s => s.remove_edge(ctx, index),
            empty => Err(StorageError::out_of_bounds(index, 0))
        )
    }

    /// All or nothing.
    pub fn remove_edges(&mut self, ctx: StructureContext<'_>, range: Range<u64>) -> Result<Vec<EdgeKey>> {
        match self {
            EdgeStorage::Empty(_) => check_range(&range, 0).map(|_| Vec::new()),
            EdgeStorage::Chain(s) => s.remove_edges(ctx, range),
            EdgeStorage::Tree(s) => s.remove_edges(ctx, range),
            EdgeStorage::Graph(s) => s.remove_edges(ctx, range),
            EdgeStorage::FixedSizeChain(s) => s.remove_edges(ctx, range),
        }
    }

    pub fn swap_edges(&mut self, ctx: StructureContext<'_>, a: u64, b: u64) -> Result<()> {
        dispatch_edge_storage!(
            self,
            s => s.swap_edges(ctx, a, b),
            empty => check_index(a, 0)
        )
    }

    /// Moves one end of an edge. Edges not linked here only get validated.
    pub fn set_terminal(
        &mut self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
        terminal: Terminal,
        is_source: bool,
    ) -> Result<()> {
        dispatch_edge_storage!(
            self,
            s => s.set_terminal(ctx, edge, terminal, is_source),
            empty => Err(StorageError::unsupported("edges in empty structure"))
        )
    }

    // ********************* Navigation *********************

    pub fn parent(&self, ctx: StructureContext<'_>, node: ItemKey) -> Result<Option<Terminal>> {
        dispatch_edge_storage!(self, s => s.parent(ctx, node))
    }

    pub fn index_of_child(&self, ctx: StructureContext<'_>, child: ItemKey) -> Result<Option<u64>> {
        dispatch_edge_storage!(self, s => s.index_of_child(ctx, child))
    }

    pub fn sibling_at(&self, ctx: StructureContext<'_>, node: ItemKey, index: u64) -> Result<ItemKey> {
        self.fixed_chain("sibling navigation")?.sibling_at(ctx, node, index)
    }

    pub fn height(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        self.fixed_chain("height")?.height(ctx, node)
    }

    pub fn depth(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        self.fixed_chain("depth")?.depth(ctx, node)
    }

    pub fn descendant_count(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        self.fixed_chain("descendant count")?.descendant_count(ctx, node)
    }

    // ********************* Life cycle *********************

    pub fn is_dirty(&self, ctx: StructureContext<'_>) -> bool {
        dispatch_edge_storage!(self, s => s.is_dirty(ctx), empty => false)
    }

    pub fn recycle(&mut self) {
        dispatch_edge_storage!(self, s => s.recycle(), empty => ())
    }

    pub fn revive(&mut self) -> bool {
        dispatch_edge_storage!(self, s => s.revive(), empty => true)
    }

    pub fn create_edit_verifier<'a>(&'a self, structure: &'a Structure) -> StructureEditVerifier<'a> {
        let items = structure.container().create_edit_verifier();
        match self {
            EdgeStorage::FixedSizeChain(storage) => StructureEditVerifier::FixedSizeChain {
                items,
                structure,
                storage,
            },
            storage => StructureEditVerifier::Compound {
                items,
                structure,
                storage,
            },
        }
    }

    // ********************* Checks shared with verifiers *********************

    pub(crate) fn check_add_edge(&self, ctx: StructureContext<'_>, index: u64, edge: EdgeKey) -> Result<()> {
        match self {
            EdgeStorage::Empty(_) => Err(StorageError::unsupported("edges in empty structure")),
            EdgeStorage::Chain(s) => s.check_insert(index, 1).and(s.check_add_edge(ctx, edge).map(drop)),
            EdgeStorage::Tree(s) => s.check_insert(index, 1).and(s.check_add_edge(ctx, edge).map(drop)),
            EdgeStorage::Graph(s) => s.check_insert(index, 1).and(s.check_add_edge(ctx, edge).map(drop)),
            EdgeStorage::FixedSizeChain(s) => s.check_add_edge(ctx, edge).map(drop),
        }
    }

    pub(crate) fn check_add_edges(&self, ctx: StructureContext<'_>, index: u64, edges: &[EdgeKey]) -> Result<()> {
        match self {
            EdgeStorage::Empty(_) => Err(StorageError::unsupported("edges in empty structure")),
            EdgeStorage::Chain(s) => s.check_add_edges(ctx, index, edges),
            EdgeStorage::Tree(s) => s.check_add_edges(ctx, index, edges),
            EdgeStorage::Graph(s) => s.check_add_edges(ctx, index, edges),
            EdgeStorage::FixedSizeChain(s) => s.check_add_edges(ctx, edges),
        }
    }

    pub(crate) fn check_link(&self, ctx: StructureContext<'_>, source: Terminal, target: Terminal) -> Result<()> {
        match self {
            EdgeStorage::Empty(_) => Err(StorageError::unsupported("edges in empty structure")),
            EdgeStorage::Chain(s) => s.check_link(ctx, source, target),
            EdgeStorage::Tree(s) => s.check_link(ctx, source, target),
            EdgeStorage::Graph(s) => s.check_link(ctx, source, target),
            EdgeStorage::FixedSizeChain(s) => s.check_link(ctx, source, target).map(drop),
        }
    }

    pub(crate) fn check_remove(&self, index: u64) -> Result<()> {
        dispatch_edge_storage!(self, s => s.check_remove(index).map(drop), empty => check_index(index, 0))
    }

    pub(crate) fn check_remove_range(&self, range: &Range<u64>) -> Result<()> {
        dispatch_edge_storage!(self, s => s.check_remove_range(range).map(drop), empty => check_range(range, 0))
    }

    pub(crate) fn check_swap(&self, a: u64, b: u64) -> Result<()> {
        match self {
            EdgeStorage::Empty(_) => check_index(a, 0),
            EdgeStorage::Chain(s) => s.check_swap(a, b).map(drop),
            EdgeStorage::Tree(s) => s.check_swap(a, b).map(drop),
            EdgeStorage::Graph(s) => s.check_swap(a, b).map(drop),
            EdgeStorage::FixedSizeChain(_) => Err(StorageError::unsupported("swap on fixed size chain")),
        }
    }

    pub(crate) fn check_set_terminal(
        &self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
        terminal: Terminal,
        is_source: bool,
    ) -> Result<()> {
        dispatch_edge_storage!(
            self,
            s => s.check_set_terminal(ctx, edge, terminal, is_source),
            empty => Err(StorageError::unsupported("edges in empty structure"))
        )
    }

    fn fixed_chain(&self, op: &'static str) -> Result<&FixedSizeChainStorage> {
        match self {
            EdgeStorage::FixedSizeChain(storage) => Ok(storage),
            _ => Err(StorageError::unsupported(op)),
        }
    }
}

impl From<EmptyEdgeStorage> for EdgeStorage {
    fn from(storage: EmptyEdgeStorage) -> Self {
        EdgeStorage::Empty(storage)
    }
}

impl From<ChainEdgeStorage> for EdgeStorage {
    fn from(storage: ChainEdgeStorage) -> Self {
        EdgeStorage::Chain(storage)
    }
}

impl From<TreeEdgeStorage> for EdgeStorage {
    fn from(storage: TreeEdgeStorage) -> Self {
        EdgeStorage::Tree(storage)
    }
}

impl From<GraphEdgeStorage> for EdgeStorage {
    fn from(storage: GraphEdgeStorage) -> Self {
        EdgeStorage::Graph(storage)
    }
}

impl From<FixedSizeChainStorage> for EdgeStorage {
    fn from(storage: FixedSizeChainStorage) -> Self {
        EdgeStorage::FixedSizeChain(storage)
    }
}
