//! # Goal
//! In memory storage for annotated corpus data: ordered containers of items
//! and structures that add edges between the items of a container.
//!
//! # Architecture
//! - Model - items and edges, living in arenas owned by the caller
//!   (items) or by the structure (edges), referenced through typed keys.
//! - Containers - a `Container` facade forwarding to exactly one `ItemStorage`
//!   strategy: list, singleton, span over a base container, augmented and
//!   wrapping proxies.
//! - Structures - a `Structure` facade over a node container forwarding edge
//!   operations to one `EdgeStorage` strategy: empty, chain/tree/graph node
//!   maps, or a fixed size chain.
//! - Verifiers - short lived borrows of a container or structure answering
//!   whether an edit would be accepted, always in agreement with the mutators.
//!
//! Storages never know which facade they serve. Every call receives the
//! facade's host or context so it can consult the manifest.
//!
//! Errors are reported by the operation that detected them, see [`error`].

//? Important decisions:
//? - Indices are u64 so a negative index can't be expressed.
//? - Integer backed storages stop at `util::MAX_ARRAY_SIZE` slots with an overflow error.
//? - Static containers and structures are filled before they are attached, afterwards
//?   their facades refuse every edit.

pub mod arena;
pub mod container;
pub mod error;
pub mod key;
pub mod manifest;
pub mod model;
pub mod structure;
pub mod util;

pub use container::{Container, ContainerEditVerifier, ContainerHost, ItemStorage};
pub use error::{ErrorKind, Result, StorageError};
pub use manifest::{ContainerManifest, ContainerType, StructureManifest, StructureType};
pub use model::{Edge, EdgeKey, Item, ItemKey, Terminal};
pub use structure::{EdgeStorage, Structure, StructureEditVerifier};
