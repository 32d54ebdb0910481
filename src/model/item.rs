use crate::{arena::Arena, key::Key};
use getset::CopyGetters;
use modular_bitfield::prelude::*;

pub type ItemKey = Key<Item>;

/// Lifecycle flags of an item.
#[bitfield]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemFlags {
    pub alive: bool,
    pub locked: bool,
    pub dirty: bool,
    #[skip]
    __: B5,
}

/// A node of a container.
///
/// Items are stored in an `Arena<Item>` owned by the corpus layer. Containers
/// only ever hold their `ItemKey`.
#[derive(Clone, Debug, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Item {
    /// Stable id assigned by the corpus, if any.
    id: Option<u64>,
    /// Position in the owning container, assigned by the owner.
    index: Option<u64>,
    begin_offset: Option<u64>,
    end_offset: Option<u64>,
    #[getset(skip)]
    flags: ItemFlags,
}

impl Item {
    /// Alive item without any fields set.
    pub fn new() -> Self {
        Self {
            id: None,
            index: None,
            begin_offset: None,
            end_offset: None,
            flags: ItemFlags::new().with_alive(true),
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_offsets(mut self, begin: u64, end: u64) -> Self {
        self.begin_offset = Some(begin);
        self.end_offset = Some(end);
        self
    }

    pub fn set_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    pub fn set_index(&mut self, index: Option<u64>) {
        self.index = index;
    }

    pub fn set_offsets(&mut self, begin: Option<u64>, end: Option<u64>) {
        self.begin_offset = begin;
        self.end_offset = end;
    }

    pub fn flags(&self) -> ItemFlags {
        self.flags
    }

    pub fn is_alive(&self) -> bool {
        self.flags.alive()
    }

    pub fn is_locked(&self) -> bool {
        self.flags.locked()
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.dirty()
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.flags.set_locked(locked);
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.flags.set_dirty(dirty);
    }

    /// Erases all state before the item goes back to the pool.
    pub fn recycle(&mut self) {
        *self = Self {
            flags: ItemFlags::new(),
            ..Self::new()
        };
    }

    /// Revalidates the item after it was refilled from the pool.
    ///
    /// False if the index is still unset, in which case the item stays dead.
    pub fn revive(&mut self) -> bool {
        let valid = self.index.is_some();
        self.mark_alive(valid);
        valid
    }

    pub(crate) fn mark_alive(&mut self, alive: bool) {
        self.flags.set_alive(alive);
        self.flags.set_dirty(!alive);
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

/// Begin offset of item in arena, None if it doesn't exist or has no offset.
pub fn begin_offset_of(items: &Arena<Item>, key: ItemKey) -> Option<u64> {
    items.get(key).and_then(Item::begin_offset)
}

/// End offset of item in arena, None if it doesn't exist or has no offset.
pub fn end_offset_of(items: &Arena<Item>, key: ItemKey) -> Option<u64> {
    items.get(key).and_then(Item::end_offset)
}
