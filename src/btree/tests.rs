use super::*;

type TestTree = BTree<i64, &'static str>;

fn leaf(entries: &[(i64, &'static str)]) -> Node<i64, &'static str> {
    Node::from_parts(3, entries.to_vec(), Vec::new())
}

fn internal(
    entries: &[(i64, &'static str)],
    children: Vec<Node<i64, &'static str>>,
) -> Node<i64, &'static str> {
    Node::from_parts(3, entries.to_vec(), children)
}

fn tree_with_root(root: Node<i64, &'static str>) -> TestTree {
    let mut tree = TestTree::new(root.capacity()).unwrap();
    tree.entry_count = tree_size(&root);
    tree.root = root;
    tree
}

fn tree_size<K, V>(node: &Node<K, V>) -> usize {
    node.size() + node.children().iter().map(|c| tree_size::<K, V>(c)).sum::<usize>()
}

/// Deterministic shuffle driven by a sine-based generator
fn shuffled(mut keys: Vec<i64>, mut seed: f64) -> Vec<i64> {
    let mut counter = keys.len();
    while counter > 0 {
        let x = seed.sin() * 10000.0;
        seed += 1.0;
        let index = ((x - x.floor()) * counter as f64) as usize;
        counter -= 1;
        keys.swap(counter, index);
    }
    keys
}

// ========== Construction ==========

#[test]
fn test_new_tree() {
    let tree = TestTree::new(5).unwrap();

    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.capacity(), 5);
    assert!(tree.root().is_leaf());
}

#[test]
fn test_invalid_capacity() {
    assert_eq!(
        TestTree::new(0).unwrap_err(),
        BTreeError::InvalidCapacity(0)
    );
}

#[test]
fn test_default_capacity() {
    let tree = TestTree::default();

    assert_eq!(tree.capacity(), DEFAULT_CAPACITY);
}

// ========== Find ==========

#[test]
fn test_find_in_empty_tree() {
    let tree = TestTree::new(5).unwrap();

    assert_eq!(tree.find(&1), None);
    assert!(tree.traverse(&1, None).is_empty());
}

#[test]
fn test_single_insert_and_find() {
    let mut tree = BTree::new(5).unwrap();
    tree.insert(1, 42).unwrap();

    assert_eq!(tree.find(&1), Some(&42));
    assert_eq!(tree.find(&2), None);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_inserts_up_to_capacity() {
    let mut tree = BTree::new(3).unwrap();
    tree.insert(1, 42).unwrap();
    tree.insert(2, 43).unwrap();
    tree.insert(3, 44).unwrap();

    assert_eq!(tree.find(&1), Some(&42));
    assert_eq!(tree.find(&2), Some(&43));
    assert_eq!(tree.find(&3), Some(&44));
    assert_eq!(tree.height(), 1);
    assert!(tree.root().is_full());
}

#[test]
fn test_insert_with_root_split() {
    let mut tree = BTree::new(3).unwrap();
    tree.insert(1, 42).unwrap();
    tree.insert(3, 44).unwrap();
    tree.insert(4, 45).unwrap();
    tree.insert(2, 43).unwrap();

    assert_eq!(tree.find(&2), Some(&43));
    assert_eq!(tree.height(), 2);

    let root = tree.root();
    assert_eq!(root.keys(), &[3]);
    assert_eq!(root.children()[0].keys(), &[1, 2]);
    assert_eq!(root.children()[1].keys(), &[4]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_find_in_internal_node() {
    let tree = tree_with_root(internal(
        &[(3, "c")],
        vec![leaf(&[(1, "a")]), leaf(&[(5, "e")])],
    ));

    assert_eq!(tree.find(&3), Some(&"c"));
    assert_eq!(tree.find(&5), Some(&"e"));
    assert_eq!(tree.find(&4), None);
    assert_eq!(tree.find(&0), None);
}

#[test]
fn test_shuffled_inserts_all_found() {
    let mut tree = BTree::new(5).unwrap();
    let keys = shuffled((0..500).collect(), 4242.0);

    for &key in &keys {
        tree.insert(key, key).unwrap();
    }

    assert_eq!(tree.len(), 500);
    for (ix, key) in keys.iter().enumerate() {
        assert_eq!(tree.find(key), Some(key), "failed key {} at {}", key, ix);
    }
    tree.check_invariants().unwrap();
}

// ========== Duplicate Keys ==========

#[test]
fn test_duplicate_keys_find_shallowest() {
    let mut tree = TestTree::new(5).unwrap();
    for value in ["a", "b", "c", "d", "e", "f"] {
        tree.insert(1, value).unwrap();
    }

    // The sixth insert splits the root and promotes "c"
    assert_eq!(tree.find(&1), Some(&"c"));
    assert_eq!(tree.len(), 6);
    tree.check_invariants().unwrap();
}

#[test]
fn test_duplicate_keys_traverse_in_insertion_order() {
    let mut tree = BTree::new(3).unwrap();
    for value in 0..20 {
        tree.insert(7, value).unwrap();
    }
    tree.insert(1, -1).unwrap();
    tree.insert(9, 100).unwrap();

    let values: Vec<i32> = tree.traverse(&7, None).into_iter().copied().collect();
    let mut expected: Vec<i32> = (0..20).collect();
    expected.push(100);

    assert_eq!(values, expected);
    tree.check_invariants().unwrap();
}

// ========== Traversal ==========

fn traversal_fixture() -> TestTree {
    tree_with_root(internal(
        &[(3, "c")],
        vec![leaf(&[(1, "a"), (2, "b")]), leaf(&[(4, "d"), (5, "e")])],
    ))
}

#[test]
fn test_traverse_fully() {
    let tree = traversal_fixture();

    assert_eq!(tree.traverse(&1, None), vec![&"a", &"b", &"c", &"d", &"e"]);
}

#[test]
fn test_traverse_partially() {
    let tree = traversal_fixture();

    assert_eq!(tree.traverse(&3, Some(2)), vec![&"c", &"d"]);
}

#[test]
fn test_traverse_budget_filled_by_child() {
    let tree = traversal_fixture();

    assert_eq!(tree.traverse(&0, Some(2)), vec![&"a", &"b"]);
    assert_eq!(tree.traverse(&0, Some(3)), vec![&"a", &"b", &"c"]);
}

#[test]
fn test_traverse_between_keys() {
    let tree = traversal_fixture();

    assert_eq!(tree.traverse(&2, None), vec![&"b", &"c", &"d", &"e"]);
    assert_eq!(tree.traverse(&6, None), Vec::<&&str>::new());
}

#[test]
fn test_traverse_zero_count() {
    let tree = traversal_fixture();

    assert!(tree.traverse(&1, Some(0)).is_empty());
}

#[test]
fn test_range_entries_from_large_tree() {
    let mut tree = BTree::new(4).unwrap();
    for i in (0..1000).rev() {
        tree.insert(i, i * 10).unwrap();
    }

    let entries = tree.range_entries(&500, Some(11));
    assert_eq!(entries.len(), 11);
    for (offset, (key, value)) in entries.into_iter().enumerate() {
        assert_eq!(*key, 500 + offset as i64);
        assert_eq!(*value, *key * 10);
    }
}

// ========== Splitting ==========

#[test]
fn test_split_root() {
    //   [123]           [2]
    //   [abc]   ->     /   \
    //                [1]   [3]
    let mut tree = tree_with_root(leaf(&[(1, "a"), (2, "b"), (3, "c")]));

    tree.split_root().unwrap();

    let root = tree.root();
    assert!(!root.is_leaf());
    assert_eq!(root.keys(), &[2]);
    assert_eq!(root.values(), &["b"]);
    assert_eq!(root.children()[0].keys(), &[1]);
    assert_eq!(root.children()[0].values(), &["a"]);
    assert_eq!(root.children()[1].keys(), &[3]);
    assert_eq!(root.children()[1].values(), &["c"]);
    assert_eq!(tree.height(), 2);
    tree.check_invariants().unwrap();
}

#[test]
fn test_split_leaf_child() {
    //      [26]                  [246]
    //   [1] [345] [7]   ->   [1] [3] [5] [7]
    let mut root = internal(
        &[(2, "b"), (6, "f")],
        vec![
            leaf(&[(1, "a")]),
            leaf(&[(3, "c"), (4, "d"), (5, "e")]),
            leaf(&[(7, "g")]),
        ],
    );

    TestTree::split_child(&mut root, 1).unwrap();

    assert_eq!(root.keys(), &[2, 4, 6]);
    assert_eq!(root.values(), &["b", "d", "f"]);
    let left = &root.children()[1];
    let right = &root.children()[2];
    assert!(left.is_leaf());
    assert!(right.is_leaf());
    assert_eq!(left.keys(), &[3]);
    assert_eq!(left.values(), &["c"]);
    assert_eq!(right.keys(), &[5]);
    assert_eq!(right.values(), &["e"]);
    assert_eq!(root.children()[3].keys(), &[7]);
}

#[test]
fn test_split_internal_child() {
    //             [2]                               [26]
    //      [0]          [468]        ->     [0]      [4]      [8]
    //   [-1] [1]    [3][5][7][9]         [-1] [1]  [3] [5]  [7] [9]
    let mut root = internal(
        &[(2, "b")],
        vec![
            internal(&[(0, "z")], vec![leaf(&[(-1, "y")]), leaf(&[(1, "a")])]),
            internal(
                &[(4, "d"), (6, "f"), (8, "h")],
                vec![
                    leaf(&[(3, "c")]),
                    leaf(&[(5, "e")]),
                    leaf(&[(7, "g")]),
                    leaf(&[(9, "i")]),
                ],
            ),
        ],
    );

    TestTree::split_child(&mut root, 1).unwrap();

    assert_eq!(root.keys(), &[2, 6]);
    assert_eq!(root.values(), &["b", "f"]);
    assert_eq!(root.children()[0].keys(), &[0]);
    let left = &root.children()[1];
    let right = &root.children()[2];
    assert_eq!(left.keys(), &[4]);
    assert_eq!(left.values(), &["d"]);
    assert_eq!(left.children().len(), 2);
    assert_eq!(right.keys(), &[8]);
    assert_eq!(right.values(), &["h"]);
    assert_eq!(right.children()[0].keys(), &[7]);
    assert_eq!(right.children()[1].keys(), &[9]);

    let tree = tree_with_root(root);
    tree.check_invariants().unwrap();
    let all: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
    assert_eq!(all, (-1..=9).collect::<Vec<_>>());
}

#[test]
fn test_failed_root_split_keeps_tree() {
    let mut tree = tree_with_root(leaf(&[]));

    assert!(tree.split_root().is_err());

    assert!(tree.root().is_leaf());
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.capacity(), 3);
    tree.check_invariants().unwrap();
}

#[test]
fn test_height_grows_only_on_root_split() {
    let mut tree = BTree::new(3).unwrap();
    let mut height = tree.height();

    for i in 0..200 {
        let root_was_full = tree.root().is_full();
        tree.insert(i, i).unwrap();

        let new_height = tree.height();
        if root_was_full {
            assert_eq!(new_height, height + 1, "insert {} after full root", i);
        } else {
            assert_eq!(new_height, height, "insert {} without full root", i);
        }
        height = new_height;
    }

    assert!(tree.height() >= 4);
}

#[test]
fn test_capacity_one() {
    let mut tree = BTree::new(1).unwrap();
    for i in [5, 1, 9, 3, 7, 2, 8] {
        tree.insert(i, i * 2).unwrap();
        tree.check_invariants().unwrap();
    }

    for i in [5, 1, 9, 3, 7, 2, 8] {
        assert_eq!(tree.find(&i), Some(&(i * 2)));
    }
    let keys: Vec<_> = tree.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![1, 2, 3, 5, 7, 8, 9]);
}

// ========== Validation and Display ==========

#[test]
fn test_check_invariants_detects_disorder() {
    let tree = tree_with_root(internal(
        &[(3, "c")],
        vec![leaf(&[(1, "a")]), leaf(&[(2, "b")])],
    ));

    assert!(matches!(
        tree.check_invariants(),
        Err(BTreeError::InvalidState(_))
    ));
}

#[test]
fn test_check_invariants_detects_missing_child() {
    let tree = tree_with_root(internal(
        &[(3, "c"), (6, "f")],
        vec![leaf(&[(1, "a")]), leaf(&[(4, "d")])],
    ));

    assert!(tree.check_invariants().is_err());
}

#[test]
fn test_check_invariants_detects_uneven_depth() {
    let tree = tree_with_root(internal(
        &[(3, "c")],
        vec![
            leaf(&[(1, "a")]),
            internal(&[(5, "e")], vec![leaf(&[(4, "d")]), leaf(&[(6, "f")])]),
        ],
    ));

    assert!(tree.check_invariants().is_err());
}

#[test]
fn test_iterator_matches_traverse() {
    let mut tree = BTree::new(4).unwrap();
    for i in shuffled((0..100).collect(), 17.0) {
        tree.insert(i, i + 1).unwrap();
    }

    let from_iter: Vec<_> = tree.iter().map(|(_, v)| v).collect();
    let from_traverse = tree.traverse(&i64::MIN, None);
    assert_eq!(from_iter, from_traverse);
    assert_eq!((&tree).into_iter().count(), 100);
}

#[test]
fn test_display_shape() {
    let tree = traversal_fixture();

    let rendered = tree.to_string();
    let lines: Vec<_> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "[(3, \"c\")]");
    assert_eq!(lines[1], "  [(1, \"a\"), (2, \"b\")]");
}

#[test]
fn test_serialize_shape() {
    let tree = traversal_fixture();

    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["root"]["keys"], serde_json::json!([3]));
    assert_eq!(json["root"]["children"][1]["values"], serde_json::json!(["d", "e"]));
    assert!(json["root"]["children"][0].get("children").is_none());
}
