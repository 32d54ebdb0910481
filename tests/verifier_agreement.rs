use corpus_store::{
    arena::Arena,
    container::{
        AugmentedStorage, Container, ContainerHost, ItemRun, ListStorage, SingletonStorage,
        SpanStorage,
    },
    manifest::{ContainerManifest, ContainerType, StructureManifest, StructureType},
    model::{EdgeKey, Item, ItemKey, Terminal},
    structure::{
        ChainEdgeStorage, EdgeStorage, FixedSizeChainStorage, GraphEdgeStorage, Structure,
        TreeEdgeStorage,
    },
};
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::rc::Rc;

fn items(n: usize) -> Vec<ItemKey> {
    let mut arena = Arena::new();
    (0..n)
        .map(|i| arena.insert(Item::new().with_index(i as u64)))
        .collect()
}

fn editable(ty: ContainerType) -> ContainerManifest {
    ContainerManifest::new(ty).with_non_static(true)
}

fn static_list(keys: &[ItemKey]) -> Rc<Container> {
    Rc::new(
        Container::with_storage(
            ContainerManifest::new(ContainerType::List),
            ListStorage::from_items(keys.to_vec()).into(),
        )
        .unwrap(),
    )
}

fn arb_index() -> impl Strategy<Value = u64> {
    prop_oneof![
        8 => 0u64..12,
        1 => Just(u64::MAX),
        1 => Just(i32::MAX as u64),
    ]
}

// ********************* Containers *********************

#[derive(Debug, Clone)]
enum Edit {
    Add { index: u64, pick: usize },
    AddRun { index: u64, start: usize, len: usize },
    Remove(u64),
    RemoveRange(u64, u64),
    Swap(u64, u64),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (arb_index(), any::<usize>()).prop_map(|(index, pick)| Edit::Add { index, pick }),
        (arb_index(), any::<usize>(), 0usize..4)
            .prop_map(|(index, start, len)| Edit::AddRun { index, start, len }),
        arb_index().prop_map(Edit::Remove),
        (arb_index(), arb_index()).prop_map(|(a, b)| Edit::RemoveRange(a, b)),
        (arb_index(), arb_index()).prop_map(|(a, b)| Edit::Swap(a, b)),
    ]
}

/// Asks the verifier, then performs the edit and compares.
fn apply_checked(container: &mut Container, edit: &Edit, pool: &[ItemKey]) -> Result<(), TestCaseError> {
    let item = |pick: usize| pool[pick % pool.len()];
    let run = |start: usize, len: usize| {
        let start = start % pool.len();
        &pool[start..(start + len).min(pool.len())]
    };

    let expected = {
        let verifier = container.create_edit_verifier();
        match *edit {
            Edit::Add { index, pick } => verifier.can_add_item(index, item(pick)),
            Edit::AddRun { index, start, len } => {
                verifier.can_add_items(index, ItemRun::Items(run(start, len)))
            }
            Edit::Remove(index) => verifier.can_remove_item(index),
            Edit::RemoveRange(a, b) => verifier.can_remove_items(a..b),
            Edit::Swap(a, b) => verifier.can_swap_items(a, b),
        }
    };
    let count = container.item_count();
    let actual = match *edit {
        Edit::Add { index, pick } => container.add_item(index, item(pick)).is_ok(),
        Edit::AddRun { index, start, len } => container
            .add_items(index, ItemRun::Items(run(start, len)))
            .is_ok(),
        Edit::Remove(index) => container.remove_item(index).is_ok(),
        Edit::RemoveRange(a, b) => container.remove_items(a..b).is_ok(),
        Edit::Swap(a, b) => container.swap_items(a, b).is_ok(),
    };
    prop_assert_eq!(expected, actual, "{:?} on {} items", edit, count);
    if !actual {
        prop_assert_eq!(count, container.item_count());
    }
    Ok(())
}

proptest! {
    #[test]
    fn list_verifier_agrees(n in 0usize..6, edits in prop::collection::vec(arb_edit(), 1..24)) {
        let keys = items(n + 4);
        let (nodes, pool) = keys.split_at(n);
        let mut list = Container::with_storage(
            editable(ContainerType::List),
            ListStorage::from_items(nodes.to_vec()).into(),
        )
        .unwrap();

        for edit in &edits {
            apply_checked(&mut list, edit, pool)?;
        }
    }

    #[test]
    fn singleton_verifier_agrees(filled in any::<bool>(), edits in prop::collection::vec(arb_edit(), 1..16)) {
        let keys = items(2);
        let storage = if filled {
            SingletonStorage::with_item(keys[0])
        } else {
            SingletonStorage::new()
        };
        let mut singleton = Container::with_storage(editable(ContainerType::Singleton), storage.into()).unwrap();

        for edit in &edits {
            apply_checked(&mut singleton, edit, &keys[1..])?;
            prop_assert!(singleton.item_count() <= 1);
        }
    }

    #[test]
    fn span_stays_contiguous(
        (begin, end) in (0u64..9).prop_flat_map(|begin| (Just(begin), begin + 1..=10)),
        edits in prop::collection::vec(arb_edit(), 1..24),
    ) {
        let keys = items(10);
        let base = static_list(&keys);
        let mut span = Container::from_host(
            ContainerHost::new(editable(ContainerType::Span)).with_base_containers(vec![base.clone()]),
        )
        .attach(SpanStorage::with_range(begin..end).into())
        .unwrap();

        for edit in &edits {
            apply_checked(&mut span, edit, &keys)?;

            let covered = span.items().collect::<Vec<_>>();
            if let Some(&first) = covered.first() {
                let start = base.index_of_item(first).unwrap() as usize;
                prop_assert_eq!(&covered[..], &keys[start..start + covered.len()]);
            }
        }
    }

    #[test]
    fn augmented_translates(
        wrapped in 0usize..5,
        edits in prop::collection::vec(arb_edit(), 1..24),
    ) {
        let keys = items(wrapped + 4);
        let (base_keys, pool) = keys.split_at(wrapped);
        let base = static_list(base_keys);
        let mut augmented = Container::from_host(
            ContainerHost::new(editable(ContainerType::List)).with_base_containers(vec![base]),
        )
        .attach(AugmentedStorage::new().into())
        .unwrap();

        for edit in &edits {
            apply_checked(&mut augmented, edit, pool)?;

            prop_assert!(augmented.item_count() >= wrapped as u64);
            for (i, &key) in base_keys.iter().enumerate() {
                prop_assert_eq!(augmented.item_at(i as u64).unwrap(), key);
            }
            for i in wrapped as u64..augmented.item_count() {
                prop_assert!(pool.contains(&augmented.item_at(i).unwrap()));
            }
        }
    }
}

// ********************* Structures *********************

#[derive(Debug, Clone, Copy)]
enum Kind {
    Chain,
    Tree,
    Graph,
    FixedChain,
}

fn arb_kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Chain),
        Just(Kind::Tree),
        Just(Kind::Graph),
        Just(Kind::FixedChain),
    ]
}

fn structure(kind: Kind, nodes: &[ItemKey], multi_root: bool, loops: bool) -> Structure {
    let (ty, storage): (_, EdgeStorage) = match kind {
        Kind::Chain => (StructureType::Chain, ChainEdgeStorage::new().into()),
        Kind::Tree => (StructureType::Tree, TreeEdgeStorage::new().into()),
        Kind::Graph => (StructureType::Graph, GraphEdgeStorage::new().into()),
        Kind::FixedChain => (StructureType::Chain, FixedSizeChainStorage::new().into()),
    };
    let loops = loops && !matches!(kind, Kind::FixedChain);
    let manifest = StructureManifest::new(ContainerManifest::new(ContainerType::List), ty)
        .with_non_static(true)
        .with_multi_root(multi_root)
        .with_loops(loops);
    Structure::new(manifest)
        .attach(ListStorage::from_items(nodes.to_vec()).into())
        .unwrap()
        .attach_edges(storage)
        .unwrap()
}

#[derive(Debug, Clone)]
enum EdgeEdit {
    /// None stands for the virtual root.
    Link { index: u64, source: Option<usize>, target: usize },
    LinkBatch { index: u64, pairs: Vec<(Option<usize>, usize)> },
    Unlink(u64),
    UnlinkRange(u64, u64),
    Swap(u64, u64),
    Rewire { pick: usize, node: Option<usize>, is_source: bool },
}

fn arb_pair() -> impl Strategy<Value = (Option<usize>, usize)> {
    (prop::option::weighted(0.8, 0usize..6), 0usize..6)
}

fn arb_edge_edit() -> impl Strategy<Value = EdgeEdit> {
    prop_oneof![
        4 => (arb_index(), arb_pair())
            .prop_map(|(index, (source, target))| EdgeEdit::Link { index, source, target }),
        1 => (arb_index(), prop::collection::vec(arb_pair(), 0..4))
            .prop_map(|(index, pairs)| EdgeEdit::LinkBatch { index, pairs }),
        2 => arb_index().prop_map(EdgeEdit::Unlink),
        1 => (arb_index(), arb_index()).prop_map(|(a, b)| EdgeEdit::UnlinkRange(a, b)),
        1 => (arb_index(), arb_index()).prop_map(|(a, b)| EdgeEdit::Swap(a, b)),
        1 => (any::<usize>(), prop::option::weighted(0.8, 0usize..6), any::<bool>())
            .prop_map(|(pick, node, is_source)| EdgeEdit::Rewire { pick, node, is_source }),
    ]
}

fn terminal(nodes: &[ItemKey], node: Option<usize>) -> Terminal {
    node.map_or(Terminal::Root, |i| Terminal::Node(nodes[i % nodes.len()]))
}

fn apply_edge_checked(
    s: &mut Structure,
    nodes: &[ItemKey],
    created: &mut Vec<EdgeKey>,
    edit: &EdgeEdit,
) -> Result<(), TestCaseError> {
    let count = s.edge_count();
    let (expected, actual) = match edit {
        EdgeEdit::Link { index, source, target } => {
            let (source, target) = (terminal(nodes, *source), terminal(nodes, Some(*target)));
            let edge = s.new_edge(source, target).unwrap();
            created.push(edge);
            let verifier = s.create_edit_verifier();
            let expected = verifier.can_add_edge(*index, edge);
            prop_assert_eq!(
                verifier.can_create_edge(source, target),
                verifier.can_add_edge(count, edge)
            );
            (expected, s.add_edge(*index, edge).is_ok())
        }
        EdgeEdit::LinkBatch { index, pairs } => {
            let batch = pairs
                .iter()
                .map(|&(source, target)| {
                    s.new_edge(terminal(nodes, source), terminal(nodes, Some(target)))
                        .unwrap()
                })
                .collect::<Vec<_>>();
            created.extend(&batch);
            let expected = s.create_edit_verifier().can_add_edges(*index, &batch);
            (expected, s.add_edges(*index, &batch).is_ok())
        }
        EdgeEdit::Unlink(index) => {
            let expected = s.create_edit_verifier().can_remove_edge(*index);
            (expected, s.remove_edge(*index).is_ok())
        }
        EdgeEdit::UnlinkRange(a, b) => {
            let expected = s.create_edit_verifier().can_remove_edges(*a..*b);
            (expected, s.remove_edges(*a..*b).is_ok())
        }
        EdgeEdit::Swap(a, b) => {
            let expected = s.create_edit_verifier().can_swap_edges(*a, *b);
            (expected, s.swap_edges(*a, *b).is_ok())
        }
        EdgeEdit::Rewire { pick, node, is_source } => {
            if created.is_empty() {
                return Ok(());
            }
            let edge = created[pick % created.len()];
            let terminal = terminal(nodes, *node);
            let expected = s
                .create_edit_verifier()
                .can_set_terminal(edge, terminal, *is_source);
            (expected, s.set_terminal(edge, terminal, *is_source).is_ok())
        }
    };
    prop_assert_eq!(expected, actual, "{:?} on {} edges", edit, count);
    if !actual {
        prop_assert_eq!(count, s.edge_count());
    }
    Ok(())
}

/// Independent of the storage's own bookkeeping.
fn check_cardinality(s: &Structure, kind: Kind, nodes: &[ItemKey]) -> Result<(), TestCaseError> {
    let mut incoming = 0;
    for &node in nodes {
        let node = Terminal::Node(node);
        let (i, o) = (s.edge_count_of_dir(node, true), s.edge_count_of_dir(node, false));
        match kind {
            Kind::Chain | Kind::FixedChain => prop_assert!(i <= 1 && o <= 1),
            Kind::Tree => prop_assert!(i <= 1),
            Kind::Graph => {}
        }
        incoming += i;
    }
    prop_assert_eq!(incoming, s.edge_count());
    prop_assert_eq!(s.edge_count_of_dir(Terminal::Root, true), 0);
    Ok(())
}

proptest! {
    #[test]
    fn edge_verifier_agrees(
        kind in arb_kind(),
        n in 1usize..6,
        multi_root in any::<bool>(),
        loops in any::<bool>(),
        edits in prop::collection::vec(arb_edge_edit(), 1..32),
    ) {
        let nodes = items(n);
        let mut s = structure(kind, &nodes, multi_root, loops);
        let mut created = Vec::new();

        for edit in &edits {
            apply_edge_checked(&mut s, &nodes, &mut created, edit)?;
            check_cardinality(&s, kind, &nodes)?;
        }
    }

    #[test]
    fn fixed_chain_lookup_matches_scan(
        order in (2usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle()),
        cut in prop::collection::vec(any::<bool>(), 8),
    ) {
        let n = order.len();
        let nodes = items(n);
        let mut s = structure(Kind::FixedChain, &nodes, false, false);
        let chain = (0..n)
            .map(|i| {
                let source = if i == 0 { Terminal::Root } else { Terminal::Node(nodes[i - 1]) };
                s.new_edge(source, Terminal::Node(nodes[i])).unwrap()
            })
            .collect::<Vec<_>>();

        for &i in &order {
            prop_assert!(s.is_dirty());
            s.add_edge(0, chain[i]).unwrap();
        }
        prop_assert!(!s.is_dirty());
        for i in 0..n {
            prop_assert_eq!(s.edge_at(i as u64).unwrap(), chain[i]);
        }
        prop_assert_eq!(s.height(Terminal::Root).unwrap(), n as u64);
        prop_assert_eq!(s.depth(Terminal::Node(nodes[n - 1])).unwrap(), n as u64);

        for (&edge, _) in chain.iter().zip(&cut).filter(|&(_, &cut)| cut) {
            let index = s.index_of_edge(edge).unwrap();
            s.remove_edge(index).unwrap();
        }

        // incoming edges in node order
        let scan = nodes
            .iter()
            .filter_map(|&node| s.edge_at_of(Terminal::Node(node), 0, true).ok())
            .collect::<Vec<_>>();
        prop_assert_eq!(s.edge_count(), scan.len() as u64);
        for (i, &edge) in scan.iter().enumerate() {
            prop_assert_eq!(s.edge_at(i as u64).unwrap(), edge);
            prop_assert_eq!(s.index_of_edge(edge), Some(i as u64));
        }
        prop_assert!(s.edge_at(scan.len() as u64).is_err());
    }
}

// ********************* Random sequences *********************

#[test]
fn random_list_edits_follow_model() {
    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pool = items(32);
        let mut list = Container::with_storage(editable(ContainerType::List), ListStorage::new().into()).unwrap();
        let mut model: Vec<ItemKey> = Vec::new();

        for _ in 0..200 {
            let len = model.len() as u64;
            match rng.gen_range(0..4) {
                0 => {
                    let index = rng.gen_range(0..=len);
                    let item = pool[rng.gen_range(0..pool.len())];
                    list.add_item(index, item).unwrap();
                    model.insert(index as usize, item);
                }
                1 if len > 0 => {
                    let index = rng.gen_range(0..len);
                    assert_eq!(list.remove_item(index).unwrap(), model.remove(index as usize));
                }
                2 if len > 1 => {
                    let (a, b) = (rng.gen_range(0..len), rng.gen_range(0..len));
                    list.swap_items(a, b).unwrap();
                    model.swap(a as usize, b as usize);
                }
                3 if len > 0 => {
                    let start = rng.gen_range(0..len);
                    let end = rng.gen_range(start + 1..=len);
                    let removed = list.remove_items(start..end).unwrap();
                    assert_eq!(removed, model.drain(start as usize..end as usize).collect::<Vec<_>>());
                }
                _ => {}
            }
            assert_eq!(list.items().collect::<Vec<_>>(), model, "seed {}", seed);
        }
    }
}

#[test]
fn random_tree_edits_keep_single_parent() {
    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let nodes = items(8);
        let mut tree = structure(Kind::Tree, &nodes, true, false);

        for _ in 0..100 {
            let count = tree.edge_count();
            if count > 0 && rng.gen_bool(0.3) {
                let index = rng.gen_range(0..count);
                let edge = tree.remove_edge(index).unwrap();
                tree.release_edge(edge).unwrap();
                continue;
            }

            let source = if rng.gen_bool(0.2) {
                Terminal::Root
            } else {
                Terminal::Node(nodes[rng.gen_range(0..nodes.len())])
            };
            let target = Terminal::Node(nodes[rng.gen_range(0..nodes.len())]);
            let edge = tree.new_edge(source, target).unwrap();
            let allowed = tree.create_edit_verifier().can_add_edge(count, edge);
            assert_eq!(tree.add_edge(count, edge).is_ok(), allowed, "seed {}", seed);
            if !allowed {
                tree.release_edge(edge).unwrap();
            }

            for &node in &nodes {
                match tree.parent(node).unwrap() {
                    Some(parent) => {
                        let index = tree.index_of_child(node).unwrap().unwrap();
                        let edge = tree.edge_at_of(parent, index, false).unwrap();
                        assert_eq!(tree.edge(edge).unwrap().target(), Some(Terminal::Node(node)));
                    }
                    None => assert_eq!(tree.edge_count_of_dir(Terminal::Node(node), true), 0),
                }
            }
        }
    }
}
