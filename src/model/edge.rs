use super::{Item, ItemKey};
use crate::{arena::Arena, key::Key};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

pub type EdgeKey = Key<Edge>;

/// One end of an edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// Virtual root of the structure.
    Root,
    Node(ItemKey),
}

impl Terminal {
    pub fn node(self) -> Option<ItemKey> {
        match self {
            Terminal::Root => None,
            Terminal::Node(node) => Some(node),
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, Terminal::Root)
    }
}

impl From<ItemKey> for Terminal {
    fn from(node: ItemKey) -> Self {
        Terminal::Node(node)
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Root => write!(f, "<root>"),
            Terminal::Node(node) => write!(f, "{:?}", node),
        }
    }
}

/// Connects source --> target.
///
/// Terminals don't own nodes, they point into the node space of the
/// structure holding the edge.
#[derive(Clone, PartialEq, Eq)]
pub struct Edge {
    item: Item,
    source: Option<Terminal>,
    target: Option<Terminal>,
}

impl Edge {
    pub fn new(source: impl Into<Terminal>, target: impl Into<Terminal>) -> Self {
        Self {
            item: Item::new(),
            source: Some(source.into()),
            target: Some(target.into()),
        }
    }

    /// Edge with both terminals unset, dirty until they are.
    pub fn unbound() -> Self {
        Self {
            item: Item::new(),
            source: None,
            target: None,
        }
    }

    pub fn source(&self) -> Option<Terminal> {
        self.source
    }

    pub fn target(&self) -> Option<Terminal> {
        self.target
    }

    pub fn terminal(&self, is_source: bool) -> Option<Terminal> {
        if is_source {
            self.source
        } else {
            self.target
        }
    }

    /// Both terminals if set.
    pub fn terminals(&self) -> Option<(Terminal, Terminal)> {
        Some((self.source?, self.target?))
    }

    pub fn set_terminal(&mut self, terminal: Option<Terminal>, is_source: bool) {
        if is_source {
            self.source = terminal;
        } else {
            self.target = terminal;
        }
    }

    pub fn is_loop(&self) -> bool {
        self.source.is_some() && self.source == self.target
    }

    pub fn is_alive(&self) -> bool {
        self.item.is_alive() && self.terminals().is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.item.is_dirty() || self.terminals().is_none()
    }

    /// Smallest begin offset of the terminal nodes.
    /// None if a terminal is unset, the root, or has no offset.
    pub fn begin_offset(&self, items: &Arena<Item>) -> Option<u64> {
        let (source, target) = self.terminal_items(items)?;
        Some(source.begin_offset()?.min(target.begin_offset()?))
    }

    /// Largest end offset of the terminal nodes.
    pub fn end_offset(&self, items: &Arena<Item>) -> Option<u64> {
        let (source, target) = self.terminal_items(items)?;
        Some(source.end_offset()?.max(target.end_offset()?))
    }

    fn terminal_items<'a>(&self, items: &'a Arena<Item>) -> Option<(&'a Item, &'a Item)> {
        let (source, target) = self.terminals()?;
        Some((items.get(source.node()?)?, items.get(target.node()?)?))
    }

    pub fn recycle(&mut self) {
        self.item.recycle();
        self.source = None;
        self.target = None;
    }

    /// False if either terminal is still unset after refill.
    pub fn revive(&mut self) -> bool {
        let valid = self.terminals().is_some();
        self.item.mark_alive(valid);
        valid
    }
}

impl Deref for Edge {
    type Target = Item;

    fn deref(&self) -> &Self::Target {
        &self.item
    }
}

impl DerefMut for Edge {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.item
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({:?} --> {:?})", self.source, self.target)
    }
}
