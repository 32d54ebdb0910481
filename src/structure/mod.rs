//! Containers with edges between their items.
mod empty;
mod fixed_chain;
mod node_info;
mod node_map;
mod proxy;
mod root;
mod storage;
mod verifier;

pub use empty::EmptyEdgeStorage;
pub use fixed_chain::FixedSizeChainStorage;
pub use node_info::{ChainNodeInfo, GraphNodeInfo, LeafNodeInfo, NodeInfo, NodeInfoType, TreeNodeInfo};
pub use node_map::{ChainEdgeStorage, GraphEdgeStorage, NodeMapStorage, TreeEdgeStorage};
pub use proxy::EdgeProxy;
pub use root::RootItem;
pub use storage::EdgeStorage;
pub use verifier::StructureEditVerifier;

use crate::{
    arena::Arena,
    container::{Container, ContainerHost, ItemStorage},
    error::{Result, StorageError},
    manifest::{StructureManifest, StructureType},
    model::{Edge, EdgeKey, ItemKey, Terminal},
};
use log::debug;
use std::ops::{Deref, DerefMut, Range};

/// What an edge storage may look at while serving a structure.
#[derive(Debug, Clone, Copy)]
pub struct StructureContext<'a> {
    container: &'a Container,
    manifest: &'a StructureManifest,
    edges: &'a Arena<Edge>,
}

impl<'a> StructureContext<'a> {
    pub fn new(
        container: &'a Container,
        manifest: &'a StructureManifest,
        edges: &'a Arena<Edge>,
    ) -> Self {
        Self {
            container,
            manifest,
            edges,
        }
    }

    /// Node container of the structure.
    pub fn container(&self) -> &'a Container {
        self.container
    }

    pub fn manifest(&self) -> &'a StructureManifest {
        self.manifest
    }

    pub fn edges(&self) -> &'a Arena<Edge> {
        self.edges
    }

    pub fn edge(&self, edge: EdgeKey) -> Result<&'a Edge> {
        self.edges
            .get(edge)
            .ok_or_else(|| StorageError::invalid_input(format!("unknown edge {:?}", edge)))
    }

    /// Source and target of an edge that has both set.
    pub fn terminals(&self, edge: EdgeKey) -> Result<(Terminal, Terminal)> {
        self.edge(edge)?
            .terminals()
            .ok_or_else(|| StorageError::invalid_input(format!("{:?} has unset terminals", edge)))
    }
}

/// Container of nodes plus one edge storage and the edges it links.
///
/// Item operations go to the node container through `Deref`.
#[derive(Debug, Clone)]
pub struct Structure {
    container: Container,
    manifest: StructureManifest,
    edges: Arena<Edge>,
    edge_storage: Option<EdgeStorage>,
}

impl Structure {
    pub fn new(manifest: StructureManifest) -> Self {
        let container = Container::new(manifest.container().clone());
        Self::with_container(manifest, container)
    }

    /// Structure over nodes with base containers.
    pub fn from_host(manifest: StructureManifest, host: ContainerHost) -> Self {
        Self::with_container(manifest, Container::from_host(host))
    }

    fn with_container(manifest: StructureManifest, container: Container) -> Self {
        Self {
            container,
            manifest,
            edges: Arena::new(),
            edge_storage: None,
        }
    }

    /// Builder form of `set_storage` on the node container.
    pub fn attach(mut self, storage: ItemStorage) -> Result<Self> {
        self.container.set_storage(storage)?;
        Ok(self)
    }

    /// Builder form of `set_edge_storage`.
    pub fn attach_edges(mut self, storage: EdgeStorage) -> Result<Self> {
        self.set_edge_storage(storage)?;
        Ok(self)
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn structure_manifest(&self) -> &StructureManifest {
        &self.manifest
    }

    /// True if edges can't be edited.
    pub fn is_static_structure(&self) -> bool {
        self.manifest.is_static()
    }

    /// Every edge allocated by this structure, linked or not.
    pub fn edges(&self) -> &Arena<Edge> {
        &self.edges
    }

    pub fn edge(&self, edge: EdgeKey) -> Option<&Edge> {
        self.edges.get(edge)
    }

    pub fn edge_storage(&self) -> Option<&EdgeStorage> {
        self.edge_storage.as_ref()
    }

    pub fn context(&self) -> StructureContext<'_> {
        StructureContext::new(&self.container, &self.manifest, &self.edges)
    }

    /// Attaches edge storage, returning the detached previous one.
    ///
    /// Storage type must be compatible with the declared structure type.
    pub fn set_edge_storage(&mut self, mut storage: EdgeStorage) -> Result<Option<EdgeStorage>> {
        let found = storage.structure_type();
        let declared = self.manifest.structure_type();
        if !found.is_compatible_with(declared) {
            return Err(StorageError::invalid_input(format!(
                "edge storage of type {} can't serve structure declared as {}",
                found, declared
            )));
        }
        storage.add_notify(self.context())?;

        let previous = self.take_edge_storage()?;
        debug!("Attached {} edge storage to {} structure", found, declared);
        self.edge_storage = Some(storage);
        Ok(previous)
    }

    /// Detaches current edge storage.
    pub fn take_edge_storage(&mut self) -> Result<Option<EdgeStorage>> {
        match self.edge_storage.take() {
            Some(mut storage) => {
                let ctx = StructureContext::new(&self.container, &self.manifest, &self.edges);
                storage.remove_notify(ctx)?;
                Ok(Some(storage))
            }
            None => Ok(None),
        }
    }

    pub fn structure_type(&self) -> Result<StructureType> {
        Ok(self.attached()?.structure_type())
    }

    // ********************* Edges *********************

    /// Zero while no edge storage is attached.
    pub fn edge_count(&self) -> u64 {
        self.edge_storage.as_ref().map_or(0, EdgeStorage::edge_count)
    }

    pub fn edge_at(&self, index: u64) -> Result<EdgeKey> {
        self.attached()?.edge_at(index)
    }

    pub fn index_of_edge(&self, edge: EdgeKey) -> Option<u64> {
        self.edge_storage.as_ref()?.index_of_edge(self.context(), edge)
    }

    pub fn contains_edge(&self, edge: EdgeKey) -> bool {
        self.index_of_edge(edge).is_some()
    }

    /// Linked edges in storage order.
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edge_storage.iter().flat_map(|storage| storage.iter())
    }

    /// Read only view of the linked edges as a container.
    pub fn edge_container(&self) -> EdgeProxy<'_> {
        EdgeProxy::new(self)
    }

    pub fn virtual_root(&self) -> Result<&RootItem> {
        Ok(self.attached()?.virtual_root())
    }

    pub fn is_root(&self, node: Terminal) -> bool {
        node.is_root()
    }

    pub fn edge_count_of(&self, node: Terminal) -> u64 {
        self.edge_storage
            .as_ref()
            .map_or(0, |storage| storage.edge_count_of(node))
    }

    pub fn edge_count_of_dir(&self, node: Terminal, incoming: bool) -> u64 {
        self.edge_storage
            .as_ref()
            .map_or(0, |storage| storage.edge_count_of_dir(node, incoming))
    }

    pub fn edge_at_of(&self, node: Terminal, index: u64, incoming: bool) -> Result<EdgeKey> {
        self.attached()?.edge_at_of(node, index, incoming)
    }

    // ********************* Tree navigation *********************

    /// Source of the single incoming edge of node.
    pub fn parent(&self, node: ItemKey) -> Result<Option<Terminal>> {
        self.attached()?.parent(self.context(), node)
    }

    /// Position of the edge to `child` among the outgoing edges of its parent.
    pub fn index_of_child(&self, child: ItemKey) -> Result<Option<u64>> {
        self.attached()?.index_of_child(self.context(), child)
    }

    /// Child of the parent of `node` at index.
    pub fn sibling_at(&self, node: ItemKey, index: u64) -> Result<ItemKey> {
        self.attached()?.sibling_at(self.context(), node, index)
    }

    pub fn height(&self, node: Terminal) -> Result<u64> {
        self.attached()?.height(self.context(), node)
    }

    pub fn depth(&self, node: Terminal) -> Result<u64> {
        self.attached()?.depth(self.context(), node)
    }

    pub fn descendant_count(&self, node: Terminal) -> Result<u64> {
        self.attached()?.descendant_count(self.context(), node)
    }

    // ********************* Edge mutation *********************

    /// Allocates an edge, not yet linked into the storage.
    pub fn new_edge(&mut self, source: Terminal, target: Terminal) -> Result<EdgeKey> {
        if target.is_root() {
            return Err(StorageError::invalid_input(
                "virtual root can't be target of an edge",
            ));
        }
        self.edges
            .try_insert(Edge::new(source, target))
            .ok_or_else(|| StorageError::overflow(self.edges.len() as u64, u32::MAX as u64))
    }

    /// Frees an edge that isn't linked, handing it back for pooling.
    pub fn release_edge(&mut self, edge: EdgeKey) -> Result<Edge> {
        if self.contains_edge(edge) {
            return Err(StorageError::illegal_state(format!(
                "{:?} is still linked",
                edge
            )));
        }
        self.edges
            .remove(edge)
            .ok_or_else(|| StorageError::invalid_input(format!("unknown edge {:?}", edge)))
    }

    pub fn add_edge(&mut self, index: u64, edge: EdgeKey) -> Result<()> {
        let (ctx, storage) = self.editable()?;
        storage.add_edge(ctx, index, edge)
    }

    /// All or nothing.
    pub fn add_edges(&mut self, index: u64, edges: &[EdgeKey]) -> Result<()> {
        let (ctx, storage) = self.editable()?;
        storage.add_edges(ctx, index, edges)
    }

    pub fn remove_edge(&mut self, index: u64) -> Result<EdgeKey> {
        let (ctx, storage) = self.editable()?;
        storage.remove_edge(ctx, index)
    }

    /// All or nothing.
    pub fn remove_edges(&mut self, range: Range<u64>) -> Result<Vec<EdgeKey>> {
        let (ctx, storage) = self.editable()?;
        storage.remove_edges(ctx, range)
    }

    pub fn swap_edges(&mut self, a: u64, b: u64) -> Result<()> {
        let (ctx, storage) = self.editable()?;
        storage.swap_edges(ctx, a, b)
    }

    /// Moves one end of an edge to another node.
    pub fn set_terminal(&mut self, edge: EdgeKey, terminal: Terminal, is_source: bool) -> Result<()> {
        let (ctx, storage) = self.editable()?;
        storage.set_terminal(ctx, edge, terminal, is_source)?;
        self.edges
            .get_mut(edge)
            .ok_or_else(|| StorageError::invalid_input(format!("unknown edge {:?}", edge)))?
            .set_terminal(Some(terminal), is_source);
        Ok(())
    }

    // ********************* State *********************

    /// Node container or edge storage is inconsistent.
    pub fn is_dirty(&self) -> bool {
        self.container.is_dirty()
            || self
                .edge_storage
                .as_ref()
                .map_or(false, |storage| storage.is_dirty(self.context()))
    }

    /// Immutable for static structures.
    pub fn create_edit_verifier(&self) -> StructureEditVerifier<'_> {
        match &self.edge_storage {
            Some(storage) if !self.manifest.is_static() => storage.create_edit_verifier(self),
            _ => StructureEditVerifier::Immutable,
        }
    }

    pub fn recycle(&mut self) {
        self.container.recycle();
        if let Some(storage) = self.edge_storage.as_mut() {
            storage.recycle();
        }
        self.edges = Arena::new();
    }

    pub fn revive(&mut self) -> bool {
        let edges = self.edge_storage.as_mut().map_or(true, EdgeStorage::revive);
        self.container.revive() && edges
    }

    fn attached(&self) -> Result<&EdgeStorage> {
        self.edge_storage
            .as_ref()
            .ok_or_else(|| StorageError::illegal_state("no edge storage attached"))
    }

    fn editable(&mut self) -> Result<(StructureContext<'_>, &mut EdgeStorage)> {
        if self.manifest.is_static() {
            return Err(StorageError::unsupported("edge edit of static structure"));
        }
        let storage = self
            .edge_storage
            .as_mut()
            .ok_or_else(|| StorageError::illegal_state("no edge storage attached"))?;
        let ctx = StructureContext::new(&self.container, &self.manifest, &self.edges);
        Ok((ctx, storage))
    }
}

impl Deref for Structure {
    type Target = Container;

    fn deref(&self) -> &Self::Target {
        &self.container
    }
}

impl DerefMut for Structure {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.container
    }
}
