//! Read-only type declarations and flags the storages consult at attach time.
use getset::{CopyGetters, Getters};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    List,
    Singleton,
    Span,
}

impl ContainerType {
    /// True if a storage of this type can serve a container declared as `declared`.
    ///
    /// Singletons and spans are restricted lists, and a singleton is a span of one.
    pub fn is_compatible_with(self, declared: ContainerType) -> bool {
        match declared {
            ContainerType::List => true,
            ContainerType::Span => matches!(self, ContainerType::Span | ContainerType::Singleton),
            ContainerType::Singleton => self == ContainerType::Singleton,
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerType::List => "LIST",
            ContainerType::Singleton => "SINGLETON",
            ContainerType::Span => "SPAN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureType {
    Set,
    Chain,
    Tree,
    Graph,
}

impl StructureType {
    /// True if a storage of this type can serve a structure declared as `declared`.
    pub fn is_compatible_with(self, declared: StructureType) -> bool {
        use StructureType::*;
        match declared {
            Graph => true,
            Tree => matches!(self, Tree | Chain | Set),
            Chain => matches!(self, Chain | Set),
            Set => self == Set,
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StructureType::Set => "SET",
            StructureType::Chain => "CHAIN",
            StructureType::Tree => "TREE",
            StructureType::Graph => "GRAPH",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ContainerManifest {
    container_type: ContainerType,
    /// Container content may be edited after it was loaded.
    non_static: bool,
    /// Hosting layer declares a foundation layer, so items carry offsets.
    foundation_layer: bool,
}

impl ContainerManifest {
    /// Static container without a foundation layer.
    pub fn new(container_type: ContainerType) -> Self {
        Self {
            container_type,
            non_static: false,
            foundation_layer: false,
        }
    }

    pub fn with_non_static(mut self, non_static: bool) -> Self {
        self.non_static = non_static;
        self
    }

    pub fn with_foundation_layer(mut self, foundation_layer: bool) -> Self {
        self.foundation_layer = foundation_layer;
        self
    }

    pub fn is_static(&self) -> bool {
        !self.non_static
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct StructureManifest {
    #[getset(get = "pub")]
    container: ContainerManifest,
    #[getset(get_copy = "pub")]
    structure_type: StructureType,
    /// Edges may be edited after the structure was loaded.
    /// Node set is governed by the container manifest.
    #[getset(get_copy = "pub")]
    non_static: bool,
    /// Virtual root may have more than one outgoing edge.
    #[getset(get_copy = "pub")]
    multi_root: bool,
    /// Not every node needs to be connected.
    #[getset(get_copy = "pub")]
    partial: bool,
    /// Self loops are allowed.
    #[getset(get_copy = "pub")]
    loops: bool,
}

impl StructureManifest {
    pub fn new(container: ContainerManifest, structure_type: StructureType) -> Self {
        Self {
            container,
            structure_type,
            non_static: false,
            multi_root: false,
            partial: false,
            loops: false,
        }
    }

    pub fn with_non_static(mut self, non_static: bool) -> Self {
        self.non_static = non_static;
        self
    }

    pub fn with_multi_root(mut self, multi_root: bool) -> Self {
        self.multi_root = multi_root;
        self
    }

    pub fn with_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    pub fn with_loops(mut self, loops: bool) -> Self {
        self.loops = loops;
        self
    }

    /// True if edges can't be edited.
    pub fn is_static(&self) -> bool {
        !self.non_static
    }
}
