use super::{
    node_info::{ChainNodeInfo, GraphNodeInfo, NodeInfo, TreeNodeInfo},
    root::RootItem,
    StructureContext,
};
use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::{EdgeKey, ItemKey, Terminal},
    util::{check_capacity, check_index, check_insert_index, check_range, ensure_int_range},
};
use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use std::{mem, ops::Range};

pub type ChainEdgeStorage = NodeMapStorage<ChainNodeInfo>;
pub type TreeEdgeStorage = NodeMapStorage<TreeNodeInfo>;
pub type GraphEdgeStorage = NodeMapStorage<GraphNodeInfo>;

/// Flat edge list plus a lazily built map of node -> `NodeInfo`.
///
/// Insertion order of the list is the edge order of the structure. A node
/// gets an info with its first edge and loses it again with its last one,
/// unless empty infos are retained.
#[derive(Debug, Clone)]
pub struct NodeMapStorage<N> {
    edges: Vec<EdgeKey>,
    infos: AHashMap<ItemKey, N>,
    root: RootItem,
    retain_empty: bool,
}

impl<N: NodeInfo + Default> NodeMapStorage<N> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: Vec::with_capacity(capacity),
            infos: AHashMap::with_capacity(capacity),
            root: RootItem::Empty,
            retain_empty: false,
        }
    }

    /// Pre filled storage. Edges are linked when attached.
    pub fn from_edges(edges: Vec<EdgeKey>) -> Self {
        Self {
            edges,
            ..Self::new()
        }
    }

    /// Keeps infos of nodes whose last edge was removed.
    pub fn with_retained_nodes(mut self, retain: bool) -> Self {
        self.retain_empty = retain;
        self
    }

    pub fn add_notify(&mut self, ctx: StructureContext<'_>) -> Result<()> {
        self.root = RootItem::for_multi_root(ctx.manifest().multi_root());
        self.infos.clear();

        let edges = mem::take(&mut self.edges);
        for &edge in &edges {
            if let Err(error) = self.link_checked(ctx, self.edges.len(), edge) {
                self.edges = edges;
                self.infos.clear();
                self.root = RootItem::Empty;
                return Err(error);
            }
        }

        debug!(
            "Attached {} edge storage with {} edges over {} nodes",
            N::structure_type(),
            self.edges.len(),
            self.infos.len()
        );
        Ok(())
    }

    /// Drops the node map and the root, edges are kept and relinked on next attach.
    pub fn remove_notify(&mut self, _: StructureContext<'_>) -> Result<()> {
        self.infos.clear();
        self.root = RootItem::Empty;
        Ok(())
    }

    pub fn structure_type(&self) -> StructureType {
        N::structure_type()
    }

    pub fn edge_count(&self) -> u64 {
        self.edges.len() as u64
    }

    pub fn edge_at(&self, index: u64) -> Result<EdgeKey> {
        let i = ensure_int_range(index)?;
        check_index(index, self.edge_count())?;
        Ok(self.edges[i])
    }

    pub fn index_of_edge(&self, edge: EdgeKey) -> Option<u64> {
        self.edges
            .iter()
            .position(|&e| e == edge)
            .map(|i| i as u64)
    }

    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.iter().copied()
    }

    pub fn virtual_root(&self) -> &RootItem {
        &self.root
    }

    /// Info of node, None for nodes without edges.
    pub fn node_info(&self, node: ItemKey) -> Option<&N> {
        self.infos.get(&node)
    }

    /// Number of nodes that have an info.
    pub fn node_count(&self) -> u64 {
        self.infos.len() as u64
    }

    pub fn edge_count_of(&self, node: Terminal) -> u64 {
        self.info(node).map_or(0, |info| info.edge_count())
    }

    pub fn edge_count_of_dir(&self, node: Terminal, incoming: bool) -> u64 {
        self.info(node)
            .map_or(0, |info| info.edge_count_dir(incoming))
    }

    pub fn edge_at_of(&self, node: Terminal, index: u64, incoming: bool) -> Result<EdgeKey> {
        self.info(node)
            .ok_or_else(|| StorageError::out_of_bounds(index, 0))?
            .edge_at(index, incoming)
    }

    pub fn add_edge(&mut self, ctx: StructureContext<'_>, index: u64, edge: EdgeKey) -> Result<()> {
        self.check_insert(index, 1)?;
        self.link_checked(ctx, index as usize, edge)
    }

    /// All or nothing, edges linked before a failing one are unlinked again.
    pub fn add_edges(&mut self, ctx: StructureContext<'_>, index: u64, edges: &[EdgeKey]) -> Result<()> {
        self.check_insert(index, edges.len() as u64)?;
        let at = index as usize;
        for (n, &edge) in edges.iter().enumerate() {
            if let Err(error) = self.link_checked(ctx, at + n, edge) {
                self.rollback(ctx, at..at + n);
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, ctx: StructureContext<'_>, index: u64) -> Result<EdgeKey> {
        let i = self.check_remove(index)?;
        let edge = self.edges[i];
        let (source, target) = ctx.terminals(edge)?;
        self.check_linked(edge, source, target)?;
        self.detach(edge, source, target);
        self.edges.remove(i);
        Ok(edge)
    }

    pub fn remove_edges(&mut self, ctx: StructureContext<'_>, range: Range<u64>) -> Result<Vec<EdgeKey>> {
        let range = self.check_remove_range(&range)?;
        let removed = self.edges[range.clone()].to_vec();
        let terminals = removed
            .iter()
            .map(|&edge| -> Result<_> {
                let (source, target) = ctx.terminals(edge)?;
                self.check_linked(edge, source, target)?;
                Ok((source, target))
            })
            .collect::<Result<Vec<_>>>()?;
        for (&edge, (source, target)) in removed.iter().zip(terminals) {
            self.detach(edge, source, target);
        }
        self.edges.drain(range);
        Ok(removed)
    }

    pub fn swap_edges(&mut self, _: StructureContext<'_>, a: u64, b: u64) -> Result<()> {
        let (a, b) = self.check_swap(a, b)?;
        self.edges.swap(a, b);
        Ok(())
    }

    pub fn set_terminal(
        &mut self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
        terminal: Terminal,
        is_source: bool,
    ) -> Result<()> {
        self.check_set_terminal(ctx, edge, terminal, is_source)?;
        if !self.edges.contains(&edge) {
            return Ok(());
        }
        let old = ctx.terminals(edge).map(|(source, target)| {
            if is_source {
                source
            } else {
                target
            }
        })?;
        if old == terminal {
            return Ok(());
        }

        self.info_mut(old).remove_edge(edge, !is_source)?;
        self.evict(old);
        self.info_mut(terminal).add_edge(edge, !is_source)
    }

    /// Source of the incoming edge of node. Fails for graphs.
    pub fn parent(&self, ctx: StructureContext<'_>, node: ItemKey) -> Result<Option<Terminal>> {
        let parent_edge = match self.infos.get(&node) {
            Some(info) => info.parent_edge()?,
            None => N::default().parent_edge()?,
        };
        parent_edge
            .map(|edge| ctx.terminals(edge).map(|(source, _)| source))
            .transpose()
    }

    pub fn index_of_child(&self, ctx: StructureContext<'_>, child: ItemKey) -> Result<Option<u64>> {
        let parent_edge = match self.infos.get(&child) {
            Some(info) => info.parent_edge()?,
            None => N::default().parent_edge()?,
        };
        let Some(edge) = parent_edge else {
            return Ok(None);
        };
        let (parent, _) = ctx.terminals(edge)?;
        Ok(self
            .info(parent)
            .and_then(|info| info.index_of_edge(edge, false)))
    }

    /// Every node must have an info unless the structure may be partial.
    pub fn is_dirty(&self, ctx: StructureContext<'_>) -> bool {
        !ctx.manifest().partial() && self.node_count() != ctx.container().item_count()
    }

    pub fn recycle(&mut self) {
        if !self.edges.is_empty() {
            debug!("Recycling {} edge storage with {} edges", N::structure_type(), self.edges.len());
        }
        self.edges.clear();
        self.infos.clear();
        self.root = RootItem::Empty;
        self.retain_empty = false;
    }

    pub fn revive(&mut self) -> bool {
        true
    }

    // ********************* Checks shared with verifiers *********************

    /// Terminals of an edge that can be linked now.
    pub(crate) fn check_add_edge(&self, ctx: StructureContext<'_>, edge: EdgeKey) -> Result<(Terminal, Terminal)> {
        let (source, target) = ctx.terminals(edge)?;
        if self.edges.contains(&edge) {
            return Err(StorageError::illegal_state(format!(
                "{:?} is already linked",
                edge
            )));
        }
        self.check_link(ctx, source, target)?;
        Ok((source, target))
    }

    /// Whether an edge source --> target would fit.
    pub(crate) fn check_link(&self, ctx: StructureContext<'_>, source: Terminal, target: Terminal) -> Result<()> {
        if target.is_root() {
            return Err(StorageError::invalid_input(
                "virtual root can't be target of an edge",
            ));
        }
        if source == target && !ctx.manifest().loops() {
            return Err(StorageError::invalid_input(format!(
                "loop on {:?} isn't allowed",
                source
            )));
        }
        check_member(ctx, source)?;
        check_member(ctx, target)?;
        self.check_info(source, false)?;
        self.check_info(target, true)
    }

    /// Replays a batch on copies of the touched infos.
    pub(crate) fn check_add_edges(&self, ctx: StructureContext<'_>, index: u64, edges: &[EdgeKey]) -> Result<()>
    where
        N: Clone,
    {
        self.check_insert(index, edges.len() as u64)?;
        let mut root = self.root.clone();
        let mut touched = AHashMap::<ItemKey, N>::new();
        let mut batch = AHashSet::with_capacity(edges.len());

        for &edge in edges {
            let (source, target) = ctx.terminals(edge)?;
            if self.edges.contains(&edge) || !batch.insert(edge) {
                return Err(StorageError::illegal_state(format!(
                    "{:?} is already linked",
                    edge
                )));
            }
            if target.is_root() {
                return Err(StorageError::invalid_input(
                    "virtual root can't be target of an edge",
                ));
            }
            if source == target && !ctx.manifest().loops() {
                return Err(StorageError::invalid_input(format!(
                    "loop on {:?} isn't allowed",
                    source
                )));
            }
            for (node, incoming) in [(source, false), (target, true)] {
                check_member(ctx, node)?;
                match node {
                    Terminal::Root => root.add_edge(edge, incoming)?,
                    Terminal::Node(node) => touched
                        .entry(node)
                        .or_insert_with(|| self.infos.get(&node).cloned().unwrap_or_default())
                        .add_edge(edge, incoming)?,
                }
            }
        }
        Ok(())
    }

    pub(crate) fn check_insert(&self, index: u64, additional: u64) -> Result<()> {
        ensure_int_range(index)?;
        check_insert_index(index, self.edge_count())?;
        check_capacity(self.edge_count(), additional)
    }

    pub(crate) fn check_remove(&self, index: u64) -> Result<usize> {
        let i = ensure_int_range(index)?;
        check_index(index, self.edge_count())?;
        Ok(i)
    }

    pub(crate) fn check_remove_range(&self, range: &Range<u64>) -> Result<Range<usize>> {
        check_range(range, self.edge_count())?;
        Ok(range.start as usize..range.end as usize)
    }

    pub(crate) fn check_swap(&self, a: u64, b: u64) -> Result<(usize, usize)> {
        Ok((self.check_remove(a)?, self.check_remove(b)?))
    }

    pub(crate) fn check_set_terminal(
        &self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
        terminal: Terminal,
        is_source: bool,
    ) -> Result<()> {
        if !is_source && terminal.is_root() {
            return Err(StorageError::invalid_input(
                "virtual root can't be target of an edge",
            ));
        }
        let current = ctx.edge(edge)?;
        if current.terminal(!is_source) == Some(terminal) && !ctx.manifest().loops() {
            return Err(StorageError::invalid_input(format!(
                "loop on {:?} isn't allowed",
                terminal
            )));
        }
        if !self.edges.contains(&edge) || current.terminal(is_source) == Some(terminal) {
            return Ok(());
        }
        check_member(ctx, terminal)?;
        self.check_info(terminal, !is_source)
    }

    // ********************* Node map *********************

    fn info(&self, node: Terminal) -> Option<&dyn NodeInfo> {
        match node {
            Terminal::Root => Some(&self.root as &dyn NodeInfo),
            Terminal::Node(node) => self.infos.get(&node).map(|info| info as &dyn NodeInfo),
        }
    }

    fn info_mut(&mut self, node: Terminal) -> &mut dyn NodeInfo {
        match node {
            Terminal::Root => &mut self.root as &mut dyn NodeInfo,
            Terminal::Node(node) => self.infos.entry(node).or_default() as &mut dyn NodeInfo,
        }
    }

    fn check_info(&self, node: Terminal, incoming: bool) -> Result<()> {
        match node {
            Terminal::Root => self.root.check_add(incoming),
            Terminal::Node(node) => match self.infos.get(&node) {
                Some(info) => info.check_add(incoming),
                None => N::default().check_add(incoming),
            },
        }
    }

    fn link_checked(&mut self, ctx: StructureContext<'_>, at: usize, edge: EdgeKey) -> Result<()> {
        let (source, target) = self.check_add_edge(ctx, edge)?;
        self.info_mut(source).add_edge(edge, false)?;
        if let Err(error) = self.info_mut(target).add_edge(edge, true) {
            self.info_mut(source).remove_edge(edge, false)?;
            self.evict(source);
            return Err(error);
        }
        self.edges.insert(at, edge);
        Ok(())
    }

    fn unlink(&mut self, edge: EdgeKey, source: Terminal, target: Terminal) -> Result<()> {
        self.info_mut(source).remove_edge(edge, false)?;
        self.evict(source);
        self.info_mut(target).remove_edge(edge, true)?;
        self.evict(target);
        Ok(())
    }

    /// Fails unless both terminal infos hold the edge.
    fn check_linked(&self, edge: EdgeKey, source: Terminal, target: Terminal) -> Result<()> {
        for (node, incoming) in [(source, false), (target, true)] {
            let held = self
                .info(node)
                .map_or(false, |info| info.index_of_edge(edge, incoming).is_some());
            if !held {
                return Err(StorageError::illegal_state(format!(
                    "{:?} is missing from the infos of {:?}",
                    edge, node
                )));
            }
        }
        Ok(())
    }

    /// Unlinks an edge that passed `check_linked`.
    fn detach(&mut self, edge: EdgeKey, source: Terminal, target: Terminal) {
        if let Err(error) = self.unlink(edge, source, target) {
            warn!("Failed to unlink checked {:?}: {}", edge, error);
        }
    }

    fn rollback(&mut self, ctx: StructureContext<'_>, range: Range<usize>) {
        let linked = self.edges.drain(range).collect::<Vec<_>>();
        for edge in linked.into_iter().rev() {
            let result = ctx
                .terminals(edge)
                .and_then(|(source, target)| self.unlink(edge, source, target));
            if let Err(error) = result {
                warn!("Failed to unlink {:?} during rollback: {}", edge, error);
            }
        }
    }

    fn evict(&mut self, node: Terminal) {
        if self.retain_empty {
            return;
        }
        if let Terminal::Node(node) = node {
            if self.infos.get(&node).map_or(false, |info| info.is_empty()) {
                self.infos.remove(&node);
            }
        }
    }
}

impl<N: NodeInfo + Default> Default for NodeMapStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes have to be items of the node container.
fn check_member(ctx: StructureContext<'_>, node: Terminal) -> Result<()> {
    match node {
        Terminal::Node(item) if !ctx.container().contains_item(item) => Err(
            StorageError::invalid_input(format!("{:?} isn't a node of the structure", item)),
        ),
        _ => Ok(()),
    }
}
