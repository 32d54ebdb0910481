use super::Container;
use crate::{
    error::{Result, StorageError},
    model::ItemKey,
};
use std::ops::Range;

/// Sequence of items handed to batch insertions.
#[derive(Clone, Copy)]
pub enum ItemRun<'a> {
    /// Arbitrary items.
    Items(&'a [ItemKey]),
    /// Contiguous run of another container, `source[range]`.
    ///
    /// Span storages over `source` merge this without looking at the items.
    Range {
        source: &'a Container,
        range: (u64, u64),
    },
}

impl<'a> ItemRun<'a> {
    pub fn range(source: &'a Container, range: Range<u64>) -> Self {
        ItemRun::Range {
            source,
            range: (range.start, range.end),
        }
    }

    pub fn len(&self) -> u64 {
        match *self {
            ItemRun::Items(items) => items.len() as u64,
            ItemRun::Range {
                range: (start, end),
                ..
            } => end.saturating_sub(start),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails if range isn't within its source.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ItemRun::Items(_) => Ok(()),
            ItemRun::Range {
                source,
                range: (start, end),
            } => {
                if start > end {
                    Err(StorageError::invalid_input(format!(
                        "reversed range {}..{}",
                        start, end
                    )))
                } else if end > source.item_count() {
                    Err(StorageError::out_of_bounds(end, source.item_count()))
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn to_vec(&self) -> Result<Vec<ItemKey>> {
        self.validate()?;
        match *self {
            ItemRun::Items(items) => Ok(items.to_vec()),
            ItemRun::Range {
                source,
                range: (start, end),
            } => (start..end).map(|i| source.item_at(i)).collect(),
        }
    }
}

impl<'a> From<&'a [ItemKey]> for ItemRun<'a> {
    fn from(items: &'a [ItemKey]) -> Self {
        ItemRun::Items(items)
    }
}
