use super::{Container, ContainerHost, ItemRun};
use crate::{
    arena::Arena,
    error::{Result, StorageError},
    manifest::ContainerType,
    model::{begin_offset_of, end_offset_of, Item, ItemKey},
    util::{check_index, check_insert_index, check_range},
};
use log::debug;
use std::{ops::Range, ptr, rc::Rc};

/// Contiguous range `[begin, end]` of exactly one static base container.
///
/// Only the two bounds are stored. Edits can only grow or shrink the span
/// at either end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStorage {
    bounds: Option<(u64, u64)>,
}

impl SpanStorage {
    pub fn new() -> Self {
        Self { bounds: None }
    }

    /// Span over `base[range]`.
    pub fn with_range(range: Range<u64>) -> Self {
        Self {
            bounds: (range.start < range.end).then(|| (range.start, range.end - 1)),
        }
    }

    pub fn add_notify(&mut self, host: &ContainerHost) -> Result<()> {
        if host.base_containers().len() != 1 {
            return Err(StorageError::invalid_input(format!(
                "span requires exactly one base container, found {}",
                host.base_containers().len()
            )));
        }
        let base = host.base()?;
        if !base.is_static() {
            return Err(StorageError::invalid_input("span base container is not static"));
        }
        if let Some((_, end)) = self.bounds {
            check_index(end, base.item_count())?;
        }
        debug!("Attached span storage {:?}", self.bounds);
        Ok(())
    }

    pub fn remove_notify(&mut self, _: &ContainerHost) -> Result<()> {
        Ok(())
    }

    pub fn container_type(&self) -> ContainerType {
        ContainerType::Span
    }

    /// Inclusive bounds within the base container.
    pub fn bounds(&self) -> Option<(u64, u64)> {
        self.bounds
    }

    pub fn begin_index(&self) -> Option<u64> {
        self.bounds.map(|(begin, _)| begin)
    }

    pub fn end_index(&self) -> Option<u64> {
        self.bounds.map(|(_, end)| end)
    }

    pub fn len(&self) -> u64 {
        self.bounds.map_or(0, |(begin, end)| end - begin + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn item_count(&self, _: &ContainerHost) -> u64 {
        self.len()
    }

    pub fn item_at(&self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        check_index(index, self.len())?;
        let (begin, _) = self.bounds.ok_or_else(|| StorageError::out_of_bounds(index, 0))?;
        host.base()?.item_at(begin + index)
    }

    pub fn index_of_item(&self, host: &ContainerHost, item: ItemKey) -> Option<u64> {
        let (begin, end) = self.bounds?;
        let index = host.base().ok()?.index_of_item(item)?;
        (begin..=end).contains(&index).then(|| index - begin)
    }

    pub fn add_item(&mut self, host: &ContainerHost, index: u64, item: ItemKey) -> Result<()> {
        let base_index = self.check_add(host, index, item)?;
        self.merge(index, (base_index, base_index));
        Ok(())
    }

    pub fn add_items(&mut self, host: &ContainerHost, index: u64, items: ItemRun<'_>) -> Result<()> {
        if let Some(run) = self.check_add_items(host, index, items)? {
            self.merge(index, run);
        }
        Ok(())
    }

    pub fn remove_item(&mut self, host: &ContainerHost, index: u64) -> Result<ItemKey> {
        self.check_remove(index)?;
        let item = self.item_at(host, index)?;
        self.cut(index..index + 1);
        Ok(item)
    }

    pub fn remove_items(&mut self, host: &ContainerHost, range: Range<u64>) -> Result<Vec<ItemKey>> {
        self.check_remove_range(&range)?;
        let removed = range
            .clone()
            .map(|i| self.item_at(host, i))
            .collect::<Result<Vec<_>>>()?;
        self.cut(range);
        Ok(removed)
    }

    pub fn swap_items(&mut self, _: &ContainerHost, _: u64, _: u64) -> Result<()> {
        Err(StorageError::unsupported("swap on span storage"))
    }

    pub fn begin_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let (begin, _) = self.bounds?;
        begin_offset_of(items, host.base().ok()?.item_at(begin).ok()?)
    }

    pub fn end_offset(&self, host: &ContainerHost, items: &Arena<Item>) -> Option<u64> {
        let (_, end) = self.bounds?;
        end_offset_of(items, host.base().ok()?.item_at(end).ok()?)
    }

    pub fn is_dirty(&self, _: &ContainerHost) -> bool {
        false
    }

    pub fn recycle(&mut self) {
        self.bounds = None;
    }

    pub fn revive(&mut self) -> bool {
        self.bounds.map_or(true, |(begin, end)| begin <= end)
    }

    pub fn iter<'a>(&self, base: &'a Container) -> impl Iterator<Item = ItemKey> + 'a {
        let range = match self.bounds {
            Some((begin, end)) => begin..end + 1,
            None => 0..0,
        };
        range.filter_map(move |i| base.item_at(i).ok())
    }

    // ********************* Checks shared with verifiers *********************

    /// Base index of item if it can be added at index.
    pub(crate) fn check_add(&self, host: &ContainerHost, index: u64, item: ItemKey) -> Result<u64> {
        self.check_boundary_index(index)?;
        let base_index = host
            .base()?
            .index_of_item(item)
            .ok_or_else(|| StorageError::invalid_input(format!("{:?} is not in base container", item)))?;
        self.check_contiguous(index, (base_index, base_index))?;
        Ok(base_index)
    }

    /// Run in base index space covered by items, None for an empty run.
    pub(crate) fn check_add_items(
        &self,
        host: &ContainerHost,
        index: u64,
        items: ItemRun<'_>,
    ) -> Result<Option<(u64, u64)>> {
        self.check_boundary_index(index)?;
        items.validate()?;
        if items.is_empty() {
            return Ok(None);
        }

        let base = host.base()?;
        let run = match items {
            ItemRun::Range {
                source,
                range: (start, end),
            } if ptr::eq(source, Rc::as_ptr(base)) => (start, end - 1),
            _ => {
                // Every item must map to the next base index.
                let mut run: Option<(u64, u64)> = None;
                for item in items.to_vec()? {
                    let base_index = base.index_of_item(item).ok_or_else(|| {
                        StorageError::invalid_input(format!("{:?} is not in base container", item))
                    })?;
                    run = match run {
                        None => Some((base_index, base_index)),
                        Some((first, last)) if last + 1 == base_index => Some((first, base_index)),
                        Some(_) => {
                            return Err(StorageError::invalid_input(
                                "items don't form a contiguous run of base container",
                            ))
                        }
                    };
                }
                run.ok_or_else(|| StorageError::illegal_state("empty run"))?
            }
        };

        self.check_contiguous(index, run)?;
        Ok(Some(run))
    }

    pub(crate) fn check_remove(&self, index: u64) -> Result<()> {
        let len = self.len();
        check_index(index, len)?;
        if index != 0 && index != len - 1 {
            return Err(StorageError::invalid_input(format!(
                "can only remove first or last item of span, not {}",
                index
            )));
        }
        Ok(())
    }

    pub(crate) fn check_remove_range(&self, range: &Range<u64>) -> Result<()> {
        let len = self.len();
        check_range(range, len)?;
        if range.start != 0 && range.end != len {
            return Err(StorageError::invalid_input(format!(
                "can only remove prefix or suffix of span, not {}..{}",
                range.start, range.end
            )));
        }
        Ok(())
    }

    fn check_boundary_index(&self, index: u64) -> Result<()> {
        let len = self.len();
        check_insert_index(index, len)?;
        if index != 0 && index != len {
            return Err(StorageError::invalid_input(format!(
                "span can only grow at index 0 or {}, not {}",
                len, index
            )));
        }
        Ok(())
    }

    fn check_contiguous(&self, index: u64, (first, last): (u64, u64)) -> Result<()> {
        let Some((begin, end)) = self.bounds else {
            return Ok(());
        };
        let contiguous = if index == 0 {
            last + 1 == begin
        } else {
            first == end + 1
        };
        if contiguous {
            Ok(())
        } else {
            Err(StorageError::invalid_input(format!(
                "run [{}, {}] isn't contiguous with span [{}, {}] at index {}",
                first, last, begin, end, index
            )))
        }
    }

    // ********************* Bounds *********************

    /// Adds already checked run.
    fn merge(&mut self, index: u64, (first, last): (u64, u64)) {
        self.bounds = Some(match self.bounds {
            None => (first, last),
            Some((_, end)) if index == 0 => (first, end),
            Some((begin, _)) => (begin, last),
        });
    }

    /// Removes already checked prefix or suffix.
    fn cut(&mut self, range: Range<u64>) {
        let len = self.len();
        self.bounds = match self.bounds {
            Some(_) if range.end - range.start == len => None,
            Some((begin, end)) if range.start == 0 => Some((begin + range.end, end)),
            Some((begin, end)) => Some((begin, end - (range.end - range.start))),
            None => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::{ItemStorage, ListStorage},
        error::ErrorKind,
        manifest::ContainerManifest,
    };

    struct Setup {
        arena: Arena<Item>,
        base: Rc<Container>,
        host: ContainerHost,
        keys: Vec<ItemKey>,
        outsider: ItemKey,
    }

    fn setup(n: usize) -> Setup {
        let mut arena = Arena::new();
        let keys = (0..n)
            .map(|i| {
                let i = i as u64;
                arena.insert(Item::new().with_index(i).with_offsets(i * 2, i * 2 + 1))
            })
            .collect::<Vec<_>>();
        let outsider = arena.insert(Item::new());
        let base = Rc::new(
            Container::with_storage(
                ContainerManifest::new(ContainerType::List),
                ItemStorage::List(ListStorage::from_items(keys.clone())),
            )
            .unwrap(),
        );
        let host = ContainerHost::new(ContainerManifest::new(ContainerType::Span).with_non_static(true))
            .with_base_containers(vec![base.clone()]);
        Setup {
            arena,
            base,
            host,
            keys,
            outsider,
        }
    }

    #[test]
    fn grows_at_both_ends() {
        let Setup { host, keys, .. } = setup(6);
        let mut span = SpanStorage::new();
        span.add_notify(&host).unwrap();

        span.add_item(&host, 0, keys[2]).unwrap();
        span.add_item(&host, 1, keys[3]).unwrap();
        span.add_item(&host, 0, keys[1]).unwrap();

        assert_eq!(span.bounds(), Some((1, 3)));
        assert_eq!(span.item_count(&host), 3);
        assert_eq!(span.item_at(&host, 0).unwrap(), keys[1]);
        assert_eq!(span.index_of_item(&host, keys[3]), Some(2));
        assert_eq!(span.index_of_item(&host, keys[4]), None);
    }

    #[test]
    fn rejects_gaps_and_middle() {
        let Setup {
            host, keys, outsider, ..
        } = setup(6);
        let mut span = SpanStorage::with_range(2..4);
        span.add_notify(&host).unwrap();

        assert_eq!(
            span.add_item(&host, 2, keys[5]).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            span.add_item(&host, 1, keys[1]).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            span.add_item(&host, 3, keys[4]).unwrap_err().kind(),
            ErrorKind::IndexOutOfBounds
        );
        assert_eq!(
            span.add_item(&host, 0, outsider).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(span.bounds(), Some((2, 3)));
    }

    #[test]
    fn native_range_batch() {
        let Setup { base, host, .. } = setup(8);
        let mut span = SpanStorage::with_range(3..5);
        span.add_notify(&host).unwrap();

        span.add_items(&host, 2, ItemRun::range(&base, 5..8)).unwrap();
        span.add_items(&host, 0, ItemRun::range(&base, 0..3)).unwrap();
        assert_eq!(span.bounds(), Some((0, 7)));
    }

    #[test]
    fn arbitrary_batch() {
        let Setup { host, keys, .. } = setup(8);
        let mut span = SpanStorage::with_range(3..5);
        span.add_notify(&host).unwrap();

        let gap = [keys[5], keys[7]];
        assert!(span.add_items(&host, 2, ItemRun::Items(&gap)).is_err());
        assert_eq!(span.bounds(), Some((3, 4)));

        span.add_items(&host, 2, ItemRun::Items(&keys[5..7])).unwrap();
        assert_eq!(span.bounds(), Some((3, 6)));
    }

    #[test]
    fn removes_prefix_and_suffix() {
        let Setup { host, keys, .. } = setup(8);
        let mut span = SpanStorage::with_range(1..7);
        span.add_notify(&host).unwrap();

        assert_eq!(
            span.remove_item(&host, 2).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(span.remove_item(&host, 0).unwrap(), keys[1]);
        assert_eq!(span.remove_items(&host, 3..5).unwrap(), vec![keys[5], keys[6]]);
        assert!(span.remove_items(&host, 1..2).is_err());
        assert_eq!(span.bounds(), Some((2, 4)));

        span.remove_items(&host, 0..3).unwrap();
        assert!(span.is_empty());
    }

    #[test]
    fn offsets_from_bounds() {
        let Setup { arena, host, .. } = setup(4);
        let span = SpanStorage::with_range(1..3);

        assert_eq!(span.begin_offset(&host, &arena), Some(2));
        assert_eq!(span.end_offset(&host, &arena), Some(5));
        assert_eq!(SpanStorage::new().begin_offset(&host, &arena), None);
    }

    #[test]
    fn requires_static_base() {
        let base = Rc::new(Container::new(
            ContainerManifest::new(ContainerType::List).with_non_static(true),
        ));
        let host = ContainerHost::new(ContainerManifest::new(ContainerType::Span))
            .with_base_containers(vec![base]);

        assert_eq!(
            SpanStorage::new().add_notify(&host).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn range_past_base_fails_attach() {
        let Setup { host, .. } = setup(3);
        assert!(SpanStorage::with_range(1..5).add_notify(&host).is_err());
    }
}
