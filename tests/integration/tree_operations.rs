use pathtree::{Collection, NodeCounts, NodeKind, PathTree, TreeError, TreePolicy};

#[test]
fn scope_path_creates_every_missing_scope() {
    let tree: PathTree<i32> = PathTree::new();
    let c = tree.create_scope_path("/a/b/c", None).unwrap();

    assert_eq!(tree.scope_count(), 3);
    assert_eq!(tree.value_count(), 0);
    assert_eq!(tree.name_of(c).unwrap(), "c");
    assert_eq!(tree.full_path(c).unwrap(), "/a/b/c");
}

#[test]
fn value_added_under_created_path_is_readable() {
    let tree = PathTree::new();
    tree.create_scope_path("/a/b/c", None).unwrap();
    tree.add_value("/a/b/c", "leaf", 42, None).unwrap();

    assert_eq!(tree.get("/a/b/c/leaf").unwrap(), 42);
    assert_eq!(tree.value_count(), 1);
    assert_eq!(tree.kind("/a/b/c/leaf").unwrap(), NodeKind::Value);
}

#[test]
fn duplicate_scope_leaves_counts_unchanged() {
    let tree: PathTree<i32> = PathTree::new();
    tree.create_scope_path("/a/b", None).unwrap();
    let serial = tree.serial_number();

    let err = tree.add_scope("/a", "b", None).unwrap_err();
    assert!(matches!(err, TreeError::Duplicate { ref name, .. } if name == "b"));
    assert_eq!(tree.scope_count(), 2);
    assert_eq!(tree.children("/a").unwrap(), vec!["b"]);
    assert_eq!(tree.serial_number(), serial);
}

#[test]
fn duplicate_across_kinds_is_rejected() {
    let tree = PathTree::new();
    tree.add_value("/", "name", 1, None).unwrap();
    assert!(matches!(
        tree.add_scope("/", "name", None),
        Err(TreeError::Duplicate { .. })
    ));
    assert_eq!(tree.len(), 1);
}

#[test]
fn removing_a_subtree_subtracts_its_nodes() {
    let tree = PathTree::new();
    tree.create_scope_path("/a/b/c", None).unwrap();
    tree.create_scope_path("/a/b/d", None).unwrap();
    tree.add_value("/a/b/c", "x", 1, None).unwrap();
    tree.add_value("/a/b", "y", 2, None).unwrap();
    tree.add_value("/a", "z", 3, None).unwrap();

    let before = tree.counts();
    let inside = tree.subtree_counts("/a/b").unwrap();
    assert_eq!(inside, NodeCounts { scopes: 3, values: 2 });

    let removed = tree.remove_node("/a/b").unwrap();
    assert_eq!(removed, inside);
    assert_eq!(tree.scope_count(), before.scopes - inside.scopes);
    assert_eq!(tree.value_count(), before.values - inside.values);
    assert!(!tree.exists("/a/b").unwrap());
    assert_eq!(tree.get("/a/z").unwrap(), 3);
}

#[test]
fn removing_missing_path_is_not_found() {
    let tree: PathTree<i32> = PathTree::new();
    tree.create_scope_path("/a", None).unwrap();
    assert!(matches!(
        tree.remove_node("/a/missing"),
        Err(TreeError::NotFound(_))
    ));
}

#[test]
fn created_paths_resolve_to_created_handles() {
    let tree = PathTree::new();
    let scope = tree.add_scope("/", "etc", Some("config root")).unwrap();
    let nested = tree.add_scope_at(scope, "net", None).unwrap();
    let value = tree.add_value_at(nested, "mtu", 1500u32, None).unwrap();

    assert_eq!(tree.resolve("/etc").unwrap(), scope);
    assert_eq!(tree.resolve("/etc/net").unwrap(), nested);
    assert_eq!(tree.resolve("/etc/net/mtu").unwrap(), value);
    assert_eq!(tree.get_by_id(value).unwrap(), 1500);
    assert!(tree.is_within(scope, value).unwrap());
    assert!(!tree.is_within(nested, scope).unwrap());
}

#[test]
fn path_syntax() {
    let tree = PathTree::new();
    tree.create_scope_path("/a/b", None).unwrap();
    tree.add_value("/a/b", "v", 1, None).unwrap();

    assert_eq!(tree.get("a/b/v").unwrap(), 1);
    assert_eq!(tree.resolve("/a/b/").unwrap(), tree.resolve("/a/b").unwrap());
    assert!(matches!(tree.resolve("/a//b"), Err(TreeError::Syntax { .. })));
    assert!(matches!(tree.resolve(""), Err(TreeError::Syntax { .. })));
    assert!(matches!(
        tree.add_value("/a", "bad/name", 2, None),
        Err(TreeError::Syntax { .. })
    ));
    assert!(matches!(
        tree.add_value("/a", "", 2, None),
        Err(TreeError::Syntax { .. })
    ));
}

#[test]
fn sibling_order_follows_policy() {
    let sorted: PathTree<i32> = PathTree::with_policy(TreePolicy::new(true, true));
    let unsorted: PathTree<i32> = PathTree::with_policy(TreePolicy::new(true, false));
    for name in ["delta", "alpha", "charlie", "bravo"] {
        sorted.add_scope("/", name, None).unwrap();
        unsorted.add_scope("/", name, None).unwrap();
    }
    assert_eq!(
        sorted.children("/").unwrap(),
        vec!["alpha", "bravo", "charlie", "delta"]
    );
    assert_eq!(
        unsorted.children("/").unwrap(),
        vec!["bravo", "charlie", "alpha", "delta"]
    );
}

#[test]
fn descriptions_can_be_set_and_cleared() {
    let tree: PathTree<i32> = PathTree::new();
    tree.add_scope("/", "s", None).unwrap();
    let serial = tree.serial_number();

    tree.set_description("/s", Some("described")).unwrap();
    assert_eq!(tree.description("/s").unwrap().as_deref(), Some("described"));
    tree.set_description("/s", None).unwrap();
    assert_eq!(tree.description("/s").unwrap(), None);
    assert_eq!(tree.serial_number(), serial);
}

#[test]
fn collection_contract() {
    let tree = PathTree::new();
    assert!(Collection::is_empty(&tree));
    tree.add_value("/", "one", 1, None).unwrap();
    tree.add_scope("/", "two", None).unwrap();
    assert_eq!(Collection::len(&tree), 2);
    assert!(matches!(tree.add(3), Err(TreeError::Unsupported(_))));

    let serial = Collection::serial_number(&tree);
    Collection::remove_all(&tree);
    assert_eq!(tree.counts(), NodeCounts::default());
    assert!(Collection::serial_number(&tree) > serial);
}

#[test]
fn serial_number_is_monotonic() {
    let tree = PathTree::new();
    let mut last = tree.serial_number();
    let mut check = |tree: &PathTree<i32>| {
        let now = tree.serial_number();
        assert!(now > last);
        last = now;
    };

    tree.create_scope_path("/a/b", None).unwrap();
    check(&tree);
    tree.add_value("/a", "v", 1, None).unwrap();
    check(&tree);
    tree.remove_node("/a/b").unwrap();
    check(&tree);
    tree.clear_scope("/a").unwrap();
    check(&tree);
    tree.add_value("/", "w", 2, None).unwrap();
    check(&tree);
    tree.remove_all();
    check(&tree);
}

#[test]
fn errors_are_recoverable_locally() {
    let tree: PathTree<i32> = PathTree::new();
    tree.add_scope("/", "a", None).unwrap();
    let err = tree.add_scope("/", "a", None).unwrap_err();
    assert!(err.is_recoverable());
    assert!(tree.add_scope("/", "b", None).is_ok());
}
