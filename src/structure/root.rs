use super::node_info::{NodeInfo, NodeInfoType};
use crate::{
    error::{Result, StorageError},
    manifest::StructureType,
    model::EdgeKey,
};

/// Virtual root of a structure.
///
/// Never the target of an edge. Which variant serves a structure is decided
/// once when the edge storage is attached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RootItem {
    /// Accepts no edges at all.
    #[default]
    Empty,
    SingleEdge(Option<EdgeKey>),
    MultiEdge(Vec<EdgeKey>),
}

impl RootItem {
    /// Root for a structure that may or may not have several roots.
    pub fn for_multi_root(multi_root: bool) -> Self {
        if multi_root {
            RootItem::MultiEdge(Vec::new())
        } else {
            RootItem::SingleEdge(None)
        }
    }

    /// Fails unless `additional` more outgoing edges fit.
    pub fn check_add_outgoing(&self, additional: u64) -> Result<()> {
        match self {
            RootItem::Empty if additional > 0 => {
                Err(StorageError::unsupported("edges on empty root"))
            }
            RootItem::SingleEdge(slot) if slot.is_some() as u64 + additional > 1 => {
                Err(StorageError::illegal_state(format!(
                    "root already has edge {:?} and isn't multi root",
                    slot
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn edges(&self) -> &[EdgeKey] {
        match self {
            RootItem::Empty => &[],
            RootItem::SingleEdge(slot) => slot.as_ref().map_or(&[][..], std::slice::from_ref),
            RootItem::MultiEdge(edges) => edges,
        }
    }
}

impl NodeInfo for RootItem {
    fn info_type(&self) -> NodeInfoType {
        NodeInfoType::Root
    }

    fn structure_type() -> StructureType {
        StructureType::Set
    }

    fn edge_count_dir(&self, incoming: bool) -> u64 {
        if incoming {
            0
        } else {
            self.edges().len() as u64
        }
    }

    fn edge_at(&self, index: u64, incoming: bool) -> Result<EdgeKey> {
        let edges = if incoming { &[][..] } else { self.edges() };
        usize::try_from(index)
            .ok()
            .and_then(|i| edges.get(i).copied())
            .ok_or_else(|| StorageError::out_of_bounds(index, edges.len() as u64))
    }

    fn index_of_edge(&self, edge: EdgeKey, incoming: bool) -> Option<u64> {
        if incoming {
            return None;
        }
        self.edges()
            .iter()
            .position(|&e| e == edge)
            .map(|i| i as u64)
    }

    fn check_add(&self, incoming: bool) -> Result<()> {
        if incoming {
            return Err(StorageError::invalid_input(
                "virtual root can't be target of an edge",
            ));
        }
        self.check_add_outgoing(1)
    }

    fn add_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        self.check_add(incoming)?;
        match self {
            RootItem::Empty => Err(StorageError::unsupported("edges on empty root")),
            RootItem::SingleEdge(slot) => {
                *slot = Some(edge);
                Ok(())
            }
            RootItem::MultiEdge(edges) => {
                edges.push(edge);
                Ok(())
            }
        }
    }

    fn remove_edge(&mut self, edge: EdgeKey, incoming: bool) -> Result<()> {
        let missing = || StorageError::illegal_state(format!("{:?} isn't linked to root", edge));
        if incoming {
            return Err(missing());
        }
        match self {
            RootItem::Empty => Err(StorageError::unsupported("edges on empty root")),
            RootItem::SingleEdge(slot) if *slot == Some(edge) => {
                *slot = None;
                Ok(())
            }
            RootItem::SingleEdge(_) => Err(missing()),
            RootItem::MultiEdge(edges) => {
                let i = edges.iter().position(|&e| e == edge).ok_or_else(missing)?;
                edges.remove(i);
                Ok(())
            }
        }
    }

    fn parent_edge(&self) -> Result<Option<EdgeKey>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arena::Arena, error::ErrorKind, model::Edge};

    fn edges(n: usize) -> Vec<EdgeKey> {
        let mut arena = Arena::new();
        (0..n).map(|_| arena.insert(Edge::unbound())).collect()
    }

    #[test]
    fn empty_rejects_everything() {
        let e = edges(1);
        let mut root = RootItem::Empty;

        assert_eq!(
            root.add_edge(e[0], false).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert!(root.remove_edge(e[0], false).is_err());
        assert!(root.check_add_outgoing(0).is_ok());
    }

    #[test]
    fn single_edge() {
        let e = edges(2);
        let mut root = RootItem::for_multi_root(false);

        root.add_edge(e[0], false).unwrap();
        assert_eq!(
            root.add_edge(e[1], false).unwrap_err().kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(root.edge_at(0, false).unwrap(), e[0]);

        root.remove_edge(e[0], false).unwrap();
        assert!(root.is_empty());
        assert!(root.check_add_outgoing(2).is_err());
    }

    #[test]
    fn multi_edge() {
        let e = edges(4);
        let mut root = RootItem::for_multi_root(true);
        for &edge in &e {
            root.add_edge(edge, false).unwrap();
        }

        assert_eq!(root.edge_count(), 4);
        root.remove_edge(e[1], false).unwrap();
        assert_eq!(root.index_of_edge(e[2], false), Some(1));
    }

    #[test]
    fn never_a_target() {
        let e = edges(1);
        let mut root = RootItem::for_multi_root(true);
        assert_eq!(
            root.add_edge(e[0], true).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(root.edge_count_dir(true), 0);
    }
}
