use pathtree::{NodeKind, PathTree, TreeCursor, TreeError};

fn sample() -> PathTree<i32> {
    let tree = PathTree::new();
    tree.create_scope_path("/a/b", Some("bee")).unwrap();
    tree.add_value("/a/b", "x", 1, None).unwrap();
    tree.add_value("/a", "y", 2, None).unwrap();
    tree.add_scope("/", "c", None).unwrap();
    tree.add_value("/", "d", 4, Some("dee")).unwrap();
    tree
}

fn walk(tree: &PathTree<i32>) -> Vec<(String, usize)> {
    let mut cursor = tree.cursor();
    let mut seen = Vec::new();
    if !cursor.is_valid() {
        return seen;
    }
    loop {
        seen.push((cursor.path().unwrap(), cursor.depth().unwrap()));
        if !cursor.advance().unwrap() {
            break;
        }
    }
    seen
}

#[test]
fn flat_cursor_visits_in_pre_order() {
    let tree = sample();
    let visited = walk(&tree);
    let expected = vec![
        ("/a".to_string(), 0),
        ("/a/b".to_string(), 1),
        ("/a/b/x".to_string(), 2),
        ("/a/y".to_string(), 1),
        ("/c".to_string(), 0),
        ("/d".to_string(), 0),
    ];
    assert_eq!(visited, expected);
    assert_eq!(visited.len(), tree.len());
}

#[test]
fn flat_cursor_on_empty_tree() {
    let tree: PathTree<i32> = PathTree::new();
    let mut cursor = tree.cursor();
    assert!(!cursor.is_valid());
    assert!(matches!(cursor.name(), Err(TreeError::CursorExhausted)));
    assert!(matches!(cursor.advance(), Err(TreeError::CursorExhausted)));
}

#[test]
fn flat_cursor_reports_kind_description_and_value() {
    let tree = sample();
    let mut cursor = tree.cursor();
    cursor.advance().unwrap();
    assert_eq!(cursor.name().unwrap(), "b");
    assert_eq!(cursor.kind().unwrap(), NodeKind::Scope);
    assert_eq!(cursor.description().unwrap().as_deref(), Some("bee"));
    assert!(matches!(cursor.value(), Err(TreeError::WrongKind { .. })));

    cursor.advance().unwrap();
    assert_eq!(cursor.kind().unwrap(), NodeKind::Value);
    assert_eq!(cursor.value().unwrap(), 1);
}

#[test]
fn cursor_mutable_access_does_not_invalidate() {
    let tree = sample();
    let mut cursor = tree.cursor();
    while cursor.name().unwrap() != "x" {
        cursor.advance().unwrap();
    }
    cursor.with_value_mut(|v| *v = 10).unwrap();
    assert!(cursor.is_valid());
    assert_eq!(cursor.value().unwrap(), 10);
    assert_eq!(tree.get("/a/b/x").unwrap(), 10);
}

#[test]
fn any_structural_change_invalidates_flat_cursor() {
    let tree = sample();
    let mut cursor = tree.cursor();
    cursor.advance().unwrap();

    // Unrelated to the cursor's position
    tree.add_value("/c", "z", 9, None).unwrap();

    assert!(!cursor.is_valid());
    assert!(matches!(cursor.name(), Err(TreeError::InvalidatedCursor { .. })));
    assert!(matches!(cursor.kind(), Err(TreeError::InvalidatedCursor { .. })));
    assert!(matches!(cursor.depth(), Err(TreeError::InvalidatedCursor { .. })));
    assert!(matches!(cursor.advance(), Err(TreeError::InvalidatedCursor { .. })));
    assert!(matches!(
        cursor.with_value_mut(|v| *v += 1),
        Err(TreeError::InvalidatedCursor { .. })
    ));

    cursor.reset().unwrap();
    assert!(cursor.is_valid());
    assert_eq!(cursor.path().unwrap(), "/a");
}

#[test]
fn non_structural_changes_keep_cursor_valid() {
    let tree = sample();
    let cursor = tree.cursor();
    tree.refresh_value("/d", 40, Some("forty")).unwrap();
    tree.set_description("/c", Some("sea")).unwrap();
    tree.with_value_mut("/a/y", |v| *v *= 2).unwrap();
    assert!(cursor.is_valid());
}

#[test]
fn advance_past_end_then_exhausted() {
    let tree: PathTree<i32> = PathTree::new();
    tree.add_value("/", "only", 1, None).unwrap();
    let mut cursor = tree.cursor();
    assert!(!cursor.advance().unwrap());
    assert!(!cursor.is_valid());
    assert!(matches!(cursor.advance(), Err(TreeError::CursorExhausted)));
    cursor.reset().unwrap();
    assert_eq!(cursor.name().unwrap(), "only");
}

#[test]
fn scoped_cursor_visits_direct_children_only() {
    let tree = sample();
    let mut cursor = tree.scoped_cursor("/a").unwrap();
    assert_eq!(cursor.scope(), tree.resolve("/a").unwrap());
    assert_eq!(cursor.scope_depth(), 1);

    let mut names = vec![cursor.name().unwrap()];
    while cursor.advance().unwrap() {
        names.push(cursor.name().unwrap());
    }
    assert_eq!(names, vec!["b", "y"]);
}

#[test]
fn scoped_cursor_rejects_value_anchor() {
    let tree = sample();
    assert!(matches!(
        tree.scoped_cursor("/d"),
        Err(TreeError::WrongKind { .. })
    ));
    assert!(matches!(
        tree.scoped_cursor("/nope"),
        Err(TreeError::NotFound(_))
    ));
}

#[test]
fn scoped_cursor_is_invalidated_and_reanchors() {
    let tree = sample();
    let mut cursor = tree.scoped_cursor("/a").unwrap();
    tree.add_value("/a", "a0", 0, None).unwrap();
    assert!(matches!(cursor.advance(), Err(TreeError::InvalidatedCursor { .. })));

    cursor.reset().unwrap();
    assert_eq!(cursor.name().unwrap(), "a0");
    assert_eq!(cursor.value().unwrap(), 0);
}

#[test]
fn scoped_cursor_on_empty_scope() {
    let tree = sample();
    let cursor = tree.scoped_cursor("/c").unwrap();
    assert!(!cursor.is_valid());
    assert!(matches!(cursor.id(), Err(TreeError::CursorExhausted)));
}
