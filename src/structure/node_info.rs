use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::EdgeKey,
};
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeInfoType {
    /// At most one incoming and one outgoing edge.
    Chain,
    /// At most one incoming edge.
    Tree,
    Graph,
    /// Only the incoming slot.
    Leaf,
    /// Only outgoing edges.
    Root,
}

/// Edges touching one node.
///
/// Variants differ in how many edges they accept per direction. Adding
/// past the limit fails with illegal state.
pub trait NodeInfo: Debug {
    fn info_type(&self) -> NodeInfoType;

    /// Topology served by storages using this info.
    fn structure_type() -> StructureType
    where
        Self: Sized;

    fn edge_count_dir(&self, incoming: bool) -> u64;

    fn edge_count(&self) -> u64 {
        self.edge_count_dir(true) + self.edge_count_dir(false)
    }

    fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey>;

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64>;

    /// Fails if one more edge in direction wouldn't fit.
    fn check_add(&self, incoming: bool) -> Result<()>;

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()>;

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()>;

    /// Single incoming edge for chain and tree shapes.
    fn parent_edge(&self) -> Result<Option<EdgeKey>> {
        Err(StorageError::unsupported("parent of node in graph"))
    }
}

// ********************* Slot helpers *********************

fn slot_at(slot: Option<EdgeKey>, index: u64) -> Result<EdgeKey> {
    match slot {
        Some(edge) if index == 0 => Ok(edge),
        _ => Err(StorageError::out_of_bounds(index, slot.is_some() as u64)),
    }
}

fn slot_add(slot: &mut Option<EdgeKey>, edge: EdgeKey, what: &str) -> Result<()> {
    if let Some(present) = slot {
        return Err(StorageError::illegal_state(format!(
            "{} slot already taken by {:?}",
            what, present
        )));
    }
    *slot = Some(edge);
    Ok(())
}

fn slot_remove(slot: &mut Option<EdgeKey>, edge: EdgeKey) -> Result<()> {
    if *slot != Some(edge) {
        return Err(StorageError::illegal_state(format!(
            "{:?} isn't in slot {:?}",
            edge, slot
        )));
    }
    *slot = None;
    Ok(())
}

fn list_at(list: &[EdgeKey], index: u64) -> Result<EdgeKey> {
    usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i).copied())
        .ok_or_else(|| StorageError::out_of_bounds(index, list.len() as u64))
}

fn list_index(list: &[EdgeKey], edge: EdgeKey) -> Option<u64> {
    list.iter().position(|&e| e == edge).map(|i| i as u64)
}

fn list_remove(list: &mut Vec<EdgeKey>, edge: EdgeKey) -> Result<()> {
    let i = list
        .iter()
        .position(|&e| e == edge)
        .ok_or_else(|| StorageError::illegal_state(format!("{:?} isn't linked", edge)))?;
    list.remove(i);
    Ok(())
}

// ********************* Chain *********************

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainNodeInfo {
    incoming: Option<EdgeKey>,
    outgoing: Option<EdgeKey>,
}

impl ChainNodeInfo {
    fn slot(&self, incoming: bool) -> Option<EdgeKey> {
        if incoming {
            self.incoming
        } else {
            self.outgoing
        }
    }

    fn slot_mut(&mut self, incoming: bool) -> &mut Option<EdgeKey> {
        if incoming {
            &mut self.incoming
        } else {
            &mut self.outgoing
        }
    }
}

impl NodeInfo for ChainNodeInfo {
    fn info_type(&self) -> NodeInfoType {
        NodeInfoType::Chain
    }

    fn structure_type() -> StructureType {
        StructureType::Chain
    }

    fn edge_count_dir(&self, incoming: bool) -> u64 {
        self.slot(incoming).is_some() as u64
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey> {
        slot_at(self.slot(incoming), index)
    }

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64> {
        (self.slot(incoming) == Some(edge)).then(|| 0)
    }

    fn check_add(&self, incoming: bool) -> Result<()> {
        match self.slot(incoming) {
            Some(present) => Err(StorageError::illegal_state(format!(
                "chain node already has {} edge {:?}",
                direction(incoming),
                present
            ))),
            None => Ok(()),
        }
    }

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        slot_add(self.slot_mut(incoming), edge, direction(incoming))
    }

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        slot_remove(self.slot_mut(incoming), edge)
    }

    fn parent_edge(&self) -> Result<Option<EdgeKey>> {
        Ok(self.incoming)
    }
}

// ********************* Leaf *********************

/// Node that only ever receives an edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafNodeInfo {
    incoming: Option<EdgeKey>,
}

impl NodeInfo for LeafNodeInfo {
    fn info_type(&self) -> NodeInfoType {
        NodeInfoType::Leaf
    }

    fn structure_type() -> StructureType {
        StructureType::Tree
    }

    fn edge_count_dir(&self, incoming: bool) -> u64 {
        (incoming && self.incoming.is_some()) as u64
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey> {
        slot_at(if incoming { self.incoming } else { None }, index)
    }

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64> {
        (incoming && self.incoming == Some(edge)).then(|| 0)
    }

    fn check_add(&self, incoming: bool) -> Result<()> {
        if !incoming {
            Err(StorageError::illegal_state("leaf node can't have outgoing edges"))
        } else if let Some(present) = self.incoming {
            Err(StorageError::illegal_state(format!(
                "leaf node already has incoming edge {:?}",
                present
            )))
        } else {
            Ok(())
        }
    }

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        self.check_add(incoming)?;
        self.incoming = Some(edge);
        Ok(())
    }

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        if !incoming {
            return Err(StorageError::illegal_state(format!(
                "{:?} isn't linked to leaf",
                edge
            )));
        }
        slot_remove(&mut self.incoming, edge)
    }

    fn parent_edge(&self) -> Result<Option<EdgeKey>> {
        Ok(self.incoming)
    }
}

// ********************* Tree *********************

/// Tree node, stored as a leaf until its first outgoing edge arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNodeInfo {
    Leaf(LeafNodeInfo),
    Branch {
        incoming: Option<EdgeKey>,
        outgoing: Vec<EdgeKey>,
    },
}

impl Default for TreeNodeInfo {
    fn default() -> Self {
        TreeNodeInfo::Leaf(LeafNodeInfo::default())
    }
}

impl TreeNodeInfo {
    fn incoming(&self) -> Option<EdgeKey> {
        match self {
            TreeNodeInfo::Leaf(leaf) => leaf.incoming,
            TreeNodeInfo::Branch { incoming, .. } => *incoming,
        }
    }

    fn outgoing(&self) -> &[EdgeKey] {
        match self {
            TreeNodeInfo::Leaf(_) => &[],
            TreeNodeInfo::Branch { outgoing, .. } => outgoing,
        }
    }
}

impl NodeInfo for TreeNodeInfo {
    fn info_type(&self) -> NodeInfoType {
        match self {
            TreeNodeInfo::Leaf(_) => NodeInfoType::Leaf,
            TreeNodeInfo::Branch { .. } => NodeInfoType::Tree,
        }
    }

    fn structure_type() -> StructureType {
        StructureType::Tree
    }

    fn edge_count_dir(&self, incoming: bool) -> u64 {
        if incoming {
            self.incoming().is_some() as u64
        } else {
            self.outgoing().len() as u64
        }
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey> {
        if incoming {
            slot_at(self.incoming(), index)
        } else {
            list_at(self.outgoing(), index)
        }
    }

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64> {
        if incoming {
            (self.incoming() == Some(edge)).then(|| 0)
        } else {
            list_index(self.outgoing(), edge)
        }
    }

    fn check_add(&self, incoming: bool) -> Result<()> {
        match self.incoming() {
            Some(present) if incoming => Err(StorageError::illegal_state(format!(
                "tree node already has incoming edge {:?}",
                present
            ))),
            _ => Ok(()),
        }
    }

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        match self {
            TreeNodeInfo::Leaf(leaf) if incoming => leaf.add_edge(edge, true),
            TreeNodeInfo::Leaf(leaf) => {
                let parent = leaf.incoming;
                *self = TreeNodeInfo::Branch {
                    incoming: parent,
                    outgoing: vec![edge],
                };
                Ok(())
            }
            TreeNodeInfo::Branch { incoming: slot, .. } if incoming => {
                slot_add(slot, edge, "incoming")
            }
            TreeNodeInfo::Branch { outgoing, .. } => {
                outgoing.push(edge);
                Ok(())
            }
        }
    }

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        match self {
            TreeNodeInfo::Leaf(leaf) => leaf.remove_edge(edge, incoming),
            TreeNodeInfo::Branch { incoming: slot, .. } if incoming => slot_remove(slot, edge),
            TreeNodeInfo::Branch { incoming, outgoing } => {
                list_remove(outgoing, edge)?;
                if outgoing.is_empty() {
                    let parent = *incoming;
                    *self = TreeNodeInfo::Leaf(LeafNodeInfo { incoming: parent });
                }
                Ok(())
            }
        }
    }

    fn parent_edge(&self) -> Result<Option<EdgeKey>> {
        Ok(self.incoming())
    }
}

// ********************* Graph *********************

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphNodeInfo {
    incoming: Vec<EdgeKey>,
    outgoing: Vec<EdgeKey>,
}

impl GraphNodeInfo {
    fn list(&self, incoming: bool) -> &[EdgeKey] {
        if incoming {
            &self.incoming
        } else {
            &self.outgoing
        }
    }
}

impl NodeInfo for GraphNodeInfo {
    fn info_type(&self) -> NodeInfoType {
        NodeInfoType::Graph
    }

    fn structure_type() -> StructureType {
        StructureType::Graph
    }

    fn edge_count_dir(&self, incoming: bool) -> u64 {
        self.list(incoming).len() as u64
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey> {
        list_at(self.list(incoming), index)
    }

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64> {
        list_index(self.list(incoming), edge)
    }

    fn check_add(&self, _: bool) -> Result<()> {
        Ok(())
    }

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        if incoming {
            self.incoming.push(edge);
        } else {
            self.outgoing.push(edge);
        }
        Ok(())
    }

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        if incoming {
            list_remove(&mut self.incoming, edge)
        } else {
            list_remove(&mut self.outgoing, edge)
        }
    }
}

pub(crate) fn direction(incoming: bool) -> &'static str {
    if incoming {
        "incoming"
    } else {
        "outgoing"
    }
}
