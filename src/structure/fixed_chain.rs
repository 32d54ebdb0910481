use super::{node_info::NodeInfo, root::RootItem, StructureContext};
use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::{EdgeKey, ItemKey, Terminal},
    util::{check_capacity, check_index, check_range},
};
use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use std::{cell::OnceCell, mem, ops::Range};

/// Chains over a node set that is fixed once attached.
///
/// Node `i` of the container owns slots `edges[2i]` (incoming) and
/// `edges[2i + 1]` (outgoing). Edge order is the order of their target
/// nodes, so insertion indices are ignored. While every node has its
/// incoming edge the chain is complete and edge lookups are plain array
/// arithmetic.
#[derive(Debug, Clone, Default)]
pub struct FixedSizeChainStorage {
    positions: AHashMap<ItemKey, usize>,
    nodes: Vec<ItemKey>,
    edges: Vec<Option<EdgeKey>>,
    edge_count: u64,
    root: RootItem,
    /// `[2i]` depth and `[2i + 1]` height of node `i`.
    height_depth: OnceCell<Vec<u64>>,
    /// Edges to link on attach.
    pending: Vec<EdgeKey>,
}

impl FixedSizeChainStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre filled storage. Edges are linked when attached.
    pub fn with_edges(edges: Vec<EdgeKey>) -> Self {
        Self {
            pending: edges,
            ..Self::default()
        }
    }

    /// Sizes the slot arrays from the node container.
    pub fn add_notify(&mut self, ctx: StructureContext<'_>) -> Result<()> {
        let container = ctx.container();
        let manifest = ctx.manifest();
        if !container.is_static() {
            return Err(StorageError::invalid_input(
                "fixed size chain needs a static node container",
            ));
        }
        if manifest.partial() || manifest.loops() {
            return Err(StorageError::invalid_input(
                "fixed size chain can't serve partial structures or loops",
            ));
        }
        let node_count = container.item_count();
        if node_count == 0 {
            return Err(StorageError::invalid_input(
                "fixed size chain needs at least one node",
            ));
        }
        check_capacity(node_count, node_count)?;

        self.nodes = container.items().collect();
        self.positions = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();
        self.edges = vec![None; self.nodes.len() * 2];
        self.edge_count = 0;
        self.root = RootItem::for_multi_root(manifest.multi_root());
        self.invalidate();

        let pending = mem::take(&mut self.pending);
        if let Err(error) = self.add_edges(ctx, 0, &pending) {
            self.reset();
            self.pending = pending;
            return Err(error);
        }

        debug!(
            "Attached fixed size chain over {} nodes with {} edges",
            self.nodes.len(),
            self.edge_count
        );
        Ok(())
    }

    /// Keeps the linked edges for the next attach.
    pub fn remove_notify(&mut self, _: StructureContext<'_>) -> Result<()> {
        let linked = self.iter().collect();
        self.reset();
        self.pending = linked;
        Ok(())
    }

    pub fn structure_type(&self) -> StructureType {
        StructureType::Chain
    }

    pub fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }

    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    /// Every node has its incoming edge.
    pub fn is_complete_chain(&self) -> bool {
        !self.nodes.is_empty() && self.edge_count == self.node_count()
    }

    pub fn edge_at(&self, index: u64) -> Result<EdgeKey> {
        check_index(index, self.edge_count)?;
        if self.is_complete_chain() {
            self.edges[index as usize * 2]
                .ok_or_else(|| StorageError::illegal_state(format!("incoming slot {} is empty", index)))
        } else {
            self.iter()
                .nth(index as usize)
                .ok_or_else(|| StorageError::out_of_bounds(index, self.edge_count))
        }
    }

    pub fn index_of_edge(&self, ctx: StructureContext<'_>, edge: EdgeKey) -> Option<u64> {
        let target = self.linked_target(ctx, edge)?;
        if self.is_complete_chain() {
            Some(target as u64)
        } else {
            Some(self.incoming_slots().take(target).flatten().count() as u64)
        }
    }

    /// Linked edges by position of their target.
    pub fn iter(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.incoming_slots().flatten()
    }

    pub fn virtual_root(&self) -> &RootItem {
        &self.root
    }

    pub fn edge_count_of(&self, node: Terminal) -> u64 {
        self.edge_count_of_dir(node, true) + self.edge_count_of_dir(node, false)
    }

    pub fn edge_count_of_dir(&self, node: Terminal, incoming: bool) -> u64 {
        match node {
            Terminal::Root => self.root.edge_count_dir(incoming),
            Terminal::Node(node) => self
                .positions
                .get(&node)
                .map_or(0, |&p| self.slot(p, incoming).is_some() as u64),
        }
    }

    pub fn edge_at_of(&self, node: Terminal, index: u64, incoming: bool) -> Result<EdgeKey> {
        match node {
            Terminal::Root => self.root.edge_at(index, incoming),
            Terminal::Node(node) => {
                let slot = self.position(node)?;
                match self.slot(slot, incoming) {
                    Some(edge) if index == 0 => Ok(edge),
                    slot => Err(StorageError::out_of_bounds(index, slot.is_some() as u64)),
                }
            }
        }
    }

    /// Order is given by node positions, so `index` is ignored.
    pub fn add_edge(&mut self, ctx: StructureContext<'_>, _index: u64, edge: EdgeKey) -> Result<()> {
        let (source, target) = self.check_add_edge(ctx, edge)?;
        self.link(edge, source, target)
    }

    /// Validates every edge before linking any.
    pub fn add_edges(&mut self, ctx: StructureContext<'_>, _index: u64, edges: &[EdgeKey]) -> Result<()> {
        for (edge, source, target) in self.plan(ctx, edges)? {
            self.link(edge, source, target)?;
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, ctx: StructureContext<'_>, index: u64) -> Result<EdgeKey> {
        let edge = self.edge_at(index)?;
        self.unlink(ctx, edge)?;
        Ok(edge)
    }

    pub fn remove_edges(&mut self, ctx: StructureContext<'_>, range: Range<u64>) -> Result<Vec<EdgeKey>> {
        check_range(&range, self.edge_count)?;
        let planned = range
            .map(|i| -> Result<_> {
                let edge = self.edge_at(i)?;
                let (source, target) = self.check_unlink(ctx, edge)?;
                Ok((edge, source, target))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(planned
            .into_iter()
            .map(|(edge, source, target)| {
                self.detach(edge, source, target);
                edge
            })
            .collect())
    }

    pub fn swap_edges(&mut self, _: StructureContext<'_>, _: u64, _: u64) -> Result<()> {
        Err(StorageError::unsupported("swap on fixed size chain"))
    }

    pub fn set_terminal(
        &mut self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
        terminal: Terminal,
        is_source: bool,
    ) -> Result<()> {
        self.check_set_terminal(ctx, edge, terminal, is_source)?;
        if self.linked_target(ctx, edge).is_none() {
            return Ok(());
        }
        let (source, target) = ctx.terminals(edge)?;
        let old = if is_source { source } else { target };
        if old == terminal {
            return Ok(());
        }

        if is_source {
            match old {
                Terminal::Root => self.root.remove_edge(edge, false)?,
                Terminal::Node(node) => {
                    let p = self.position(node)?;
                    *self.slot_mut(p, false) = None;
                }
            }
            match terminal {
                Terminal::Root => self.root.add_edge(edge, false)?,
                Terminal::Node(node) => {
                    let p = self.position(node)?;
                    *self.slot_mut(p, false) = Some(edge);
                }
            }
        } else {
            let (old, new) = (self.terminal_position(old)?, self.terminal_position(terminal)?);
            *self.slot_mut(old, true) = None;
            *self.slot_mut(new, true) = Some(edge);
        }
        self.invalidate();
        Ok(())
    }

    // ********************* Navigation *********************

    pub fn parent(&self, ctx: StructureContext<'_>, node: ItemKey) -> Result<Option<Terminal>> {
        self.slot(self.position(node)?, true)
            .map(|edge| ctx.terminals(edge).map(|(source, _)| source))
            .transpose()
    }

    pub fn index_of_child(&self, ctx: StructureContext<'_>, child: ItemKey) -> Result<Option<u64>> {
        let Some(edge) = self.slot(self.position(child)?, true) else {
            return Ok(None);
        };
        Ok(match ctx.terminals(edge)?.0 {
            Terminal::Root => self.root.index_of_edge(edge, false),
            Terminal::Node(_) => Some(0),
        })
    }

    /// Child of the parent of `node` at index.
    pub fn sibling_at(&self, ctx: StructureContext<'_>, node: ItemKey, index: u64) -> Result<ItemKey> {
        let edge = self
            .slot(self.position(node)?, true)
            .ok_or_else(|| StorageError::illegal_state(format!("{:?} has no parent", node)))?;
        match ctx.terminals(edge)?.0 {
            Terminal::Root => {
                let sibling = self.root.edge_at(index, false)?;
                ctx.terminals(sibling)?
                    .1
                    .node()
                    .ok_or_else(|| StorageError::illegal_state("root edge targets root"))
            }
            Terminal::Node(_) => {
                check_index(index, 1)?;
                Ok(node)
            }
        }
    }

    /// Edges on the longest path down from node.
    pub fn height(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        match node {
            Terminal::Root => Ok(self
                .root_children(ctx)
                .map(|p| self.metrics(ctx)[p * 2 + 1] + 1)
                .max()
                .unwrap_or(0)),
            Terminal::Node(node) => Ok(self.metrics(ctx)[self.position(node)? * 2 + 1]),
        }
    }

    /// Edges on the path up to the root or the head of a detached chain.
    pub fn depth(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        match node {
            Terminal::Root => Ok(0),
            Terminal::Node(node) => Ok(self.metrics(ctx)[self.position(node)? * 2]),
        }
    }

    pub fn descendant_count(&self, ctx: StructureContext<'_>, node: Terminal) -> Result<u64> {
        match node {
            Terminal::Root => Ok(self
                .root_children(ctx)
                .map(|p| self.metrics(ctx)[p * 2 + 1] + 1)
                .sum()),
            // a chain node has exactly one descendant per level below it
            node => self.height(ctx, node),
        }
    }

    pub fn is_dirty(&self, _: StructureContext<'_>) -> bool {
        !self.is_complete_chain()
    }

    pub fn recycle(&mut self) {
        if self.edge_count > 0 {
            debug!("Recycling fixed size chain with {} edges", self.edge_count);
        }
        self.reset();
        self.pending.clear();
    }

    pub fn revive(&mut self) -> bool {
        true
    }

    // ********************* Checks shared with verifiers *********************

    /// Source and target positions of an edge that can be linked now.
    /// Source is None for the root.
    pub(crate) fn check_add_edge(
        &self,
        ctx: StructureContext<'_>,
        edge: EdgeKey,
    ) -> Result<(Option<usize>, usize)> {
        let (source, target) = ctx.terminals(edge)?;
        self.check_link(ctx, source, target)
    }

    pub(crate) fn check_link(
        &self,
        ctx: StructureContext<'_>,
        source: Terminal,
        target: Terminal,
    ) -> Result<(Option<usize>, usize)> {
        if target.is_root() {
            return Err(StorageError::invalid_input(
                "virtual root can't be target of an edge",
            ));
        }
        if source == target {
            return Err(StorageError::invalid_input(format!(
                "loop on {:?} in chain",
                source
            )));
        }
        let target = self.terminal_position(target)?;
        self.check_free(target, true)?;
        let source = match source {
            Terminal::Root => {
                self.root.check_add_outgoing(1)?;
                None
            }
            Terminal::Node(node) => {
                let p = self.position(node)?;
                self.check_free(p, false)?;
                self.check_acyclic(ctx, p, target, &AHashMap::new())?;
                Some(p)
            }
        };
        Ok((source, target))
    }

    pub(crate) fn check_add_edges(&self, ctx: StructureContext<'_>, edges: &[EdgeKey]) -> Result<()> {
        self.plan(ctx, edges).map(drop)
    }

    /// Slots a batch would occupy, no two edges may claim the same slot.
    fn plan(
        &self,
        ctx: StructureContext<'_>,
        edges: &[EdgeKey],
    ) -> Result<Vec<(EdgeKey, Option<usize>, usize)>> {
        let mut claimed = AHashSet::with_capacity(edges.len() * 2);
        let mut root_edges = 0;
        let mut plan = Vec::with_capacity(edges.len());
        let mut planned = AHashMap::new();

        for &edge in edges {
            let (source, target) = self.check_add_edge(ctx, edge)?;
            if !claimed.insert(target * 2) {
                return Err(StorageError::illegal_state(format!(
                    "batch links two edges into node {}",
                    target
                )));
            }
            match source {
                Some(p) if !claimed.insert(p * 2 + 1) => {
                    return Err(StorageError::illegal_state(format!(
                        "batch links two edges out of node {}",
                        p
                    )))
                }
                Some(p) => {
                    self.check_acyclic(ctx, p, target, &planned)?;
                    planned.insert(p, target);
                }
                None => root_edges += 1,
            }
            plan.push((edge, source, target));
        }
        self.root.check_add_outgoing(root_edges)?;
        Ok(plan)
    }

    pub(crate) fn check_remove(&self, index: u64) -> Result<()> {
        check_index(index, self.edge_count)
    }

    pub(crate) fn check_remove_range(&self, range: &Range<u64>) -> Result<()> {
        check_range(range, self.edge_count)
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
        if current.terminal(!is_source) == Some(terminal) {
            return Err(StorageError::invalid_input(format!(
                "loop on {:?} in chain",
                terminal
            )));
        }
        if self.linked_target(ctx, edge).is_none() || current.terminal(is_source) == Some(terminal) {
            return Ok(());
        }
        let p = match terminal {
            Terminal::Root => return self.root.check_add_outgoing(1),
            Terminal::Node(node) => self.position(node)?,
        };
        self.check_free(p, !is_source)?;
        match current.terminal(!is_source) {
            Some(Terminal::Node(other)) => {
                let other = self.position(other)?;
                let (source, target) = if is_source { (p, other) } else { (other, p) };
                self.check_acyclic(ctx, source, target, &AHashMap::new())
            }
            _ => Ok(()),
        }
    }

    /// Fails if following outgoing edges from `target` leads back to `source`.
    /// `planned` holds outgoing links of a batch that aren't in the slots yet.
    fn check_acyclic(
        &self,
        ctx: StructureContext<'_>,
        source: usize,
        target: usize,
        planned: &AHashMap<usize, usize>,
    ) -> Result<()> {
        let mut current = Some(target);
        for _ in 0..=self.nodes.len() {
            let p = match current {
                Some(p) => p,
                None => return Ok(()),
            };
            if p == source {
                return Err(StorageError::illegal_state(format!(
                    "edge from node {} to node {} closes a cycle",
                    source, target
                )));
            }
            current = planned
                .get(&p)
                .copied()
                .or_else(|| self.next_position(ctx, p));
        }
        Err(StorageError::illegal_state("chain already contains a cycle"))
    }

    fn next_position(&self, ctx: StructureContext<'_>, position: usize) -> Option<usize> {
        let (_, target) = ctx.terminals(self.slot(position, false)?).ok()?;
        self.positions.get(&target.node()?).copied()
    }

    // ********************* Slots *********************

    fn position(&self, node: ItemKey) -> Result<usize> {
        self.positions
            .get(&node)
            .copied()
            .ok_or_else(|| StorageError::invalid_input(format!("{:?} isn't a node of the chain", node)))
    }

    fn terminal_position(&self, terminal: Terminal) -> Result<usize> {
        match terminal {
            Terminal::Root => Err(StorageError::invalid_input("root has no slots")),
            Terminal::Node(node) => self.position(node),
        }
    }

    fn slot(&self, position: usize, incoming: bool) -> Option<EdgeKey> {
        self.edges[position * 2 + !incoming as usize]
    }

    fn slot_mut(&mut self, position: usize, incoming: bool) -> &mut Option<EdgeKey> {
        &mut self.edges[position * 2 + !incoming as usize]
    }

    fn check_free(&self, position: usize, incoming: bool) -> Result<()> {
        match self.slot(position, incoming) {
            Some(present) => Err(StorageError::illegal_state(format!(
                "node {} already has {} edge {:?}",
                position,
                super::node_info::direction(incoming),
                present
            ))),
            None => Ok(()),
        }
    }

    fn incoming_slots(&self) -> impl Iterator<Item = Option<EdgeKey>> + '_ {
        self.edges.iter().step_by(2).copied()
    }

    /// Target position of an edge that is linked here.
    fn linked_target(&self, ctx: StructureContext<'_>, edge: EdgeKey) -> Option<usize> {
        let (_, target) = ctx.terminals(edge).ok()?;
        let p = *self.positions.get(&target.node()?)?;
        (self.slot(p, true) == Some(edge)).then(|| p)
    }

    fn root_children<'a>(&'a self, ctx: StructureContext<'a>) -> impl Iterator<Item = usize> + 'a {
        self.root.edges().iter().filter_map(move |&edge| {
            let (_, target) = ctx.terminals(edge).ok()?;
            self.positions.get(&target.node()?).copied()
        })
    }

    fn link(&mut self, edge: EdgeKey, source: Option<usize>, target: usize) -> Result<()> {
        match source {
            Some(p) => *self.slot_mut(p, false) = Some(edge),
            None => self.root.add_edge(edge, false)?,
        }
        *self.slot_mut(target, true) = Some(edge);
        self.edge_count += 1;
        self.invalidate();
        Ok(())
    }

    fn unlink(&mut self, ctx: StructureContext<'_>, edge: EdgeKey) -> Result<()> {
        let (source, target) = self.check_unlink(ctx, edge)?;
        self.detach(edge, source, target);
        Ok(())
    }

    /// Slots an edge occupies, fails unless both of them hold it.
    fn check_unlink(&self, ctx: StructureContext<'_>, edge: EdgeKey) -> Result<(Option<usize>, usize)> {
        let (source, target) = ctx.terminals(edge)?;
        let target = self.terminal_position(target)?;
        let source = match source {
            Terminal::Root => None,
            Terminal::Node(node) => Some(self.position(node)?),
        };
        let held = self.slot(target, true) == Some(edge)
            && match source {
                Some(p) => self.slot(p, false) == Some(edge),
                None => self.root.edges().contains(&edge),
            };
        if !held {
            return Err(StorageError::illegal_state(format!(
                "{:?} isn't linked in its slots",
                edge
            )));
        }
        Ok((source, target))
    }

    fn detach(&mut self, edge: EdgeKey, source: Option<usize>, target: usize) {
        match source {
            Some(p) => *self.slot_mut(p, false) = None,
            None => {
                if let Err(error) = self.root.remove_edge(edge, false) {
                    warn!("Failed to detach {:?} from root: {}", edge, error);
                }
            }
        }
        *self.slot_mut(target, true) = None;
        self.edge_count -= 1;
        self.invalidate();
    }

    fn reset(&mut self) {
        self.positions.clear();
        self.nodes.clear();
        self.edges.clear();
        self.edge_count = 0;
        self.root = RootItem::Empty;
        self.invalidate();
    }

    // ********************* Height and depth *********************

    fn invalidate(&mut self) {
        self.height_depth.take();
    }

    fn metrics(&self, ctx: StructureContext<'_>) -> &[u64] {
        self.height_depth.get_or_init(|| self.compute_metrics(ctx))
    }

    /// Walks every chain from its head, without recursion.
    fn compute_metrics(&self, ctx: StructureContext<'_>) -> Vec<u64> {
        let n = self.nodes.len();
        let mut metrics = vec![0; n * 2];
        let mut visited = 0;
        let mut path = Vec::new();

        for head in 0..n {
            let offset = match self.slot(head, true) {
                None => 0,
                Some(edge) if matches!(ctx.terminals(edge), Ok((Terminal::Root, _))) => 1,
                Some(_) => continue,
            };

            path.clear();
            let mut current = Some(head);
            while let Some(p) = current {
                path.push(p);
                if path.len() > n {
                    break;
                }
                current = self.next_position(ctx, p);
            }

            let len = path.len() as u64;
            for (k, &p) in path.iter().enumerate() {
                metrics[p * 2] = k as u64 + offset;
                metrics[p * 2 + 1] = len - 1 - k as u64;
            }
            visited += path.len();
        }

        if visited != n {
            warn!("{} chain nodes are part of a cycle", n.saturating_sub(visited));
        }
        debug!("Computed height and depth of {} chain nodes", n);
        metrics
    }
}
