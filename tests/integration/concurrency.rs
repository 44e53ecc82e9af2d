use pathtree::{PathTree, TreeCursor, TreeError};
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_writers_keep_counts_consistent() {
    let tree: Arc<PathTree<usize>> = Arc::new(PathTree::new());
    let threads = 8;
    let per_thread = 50;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let scope = format!("/workers/w{}", t);
                tree.create_scope_path(&scope, None).unwrap();
                for i in 0..per_thread {
                    tree.add_value(&scope, &format!("item{:03}", i), i, None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(tree.value_count(), threads * per_thread);
    // "workers" plus one scope per thread
    assert_eq!(tree.scope_count(), threads + 1);
    assert_eq!(tree.len(), tree.value_count() + tree.scope_count());
    assert_eq!(tree.get("/workers/w3/item049").unwrap(), 49);
}

#[test]
fn racing_inserts_of_one_name_admit_exactly_one() {
    let tree: Arc<PathTree<usize>> = Arc::new(PathTree::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || tree.add_value("/", "shared", t, None).is_ok())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(tree.len(), 1);
}

#[test]
fn readers_observe_invalidation_from_other_threads() {
    let tree: Arc<PathTree<usize>> = Arc::new(PathTree::new());
    tree.add_value("/", "a", 1, None).unwrap();

    let cursor = tree.cursor();
    assert!(cursor.is_valid());

    let writer = {
        let tree = Arc::clone(&tree);
        thread::spawn(move || tree.add_value("/", "b", 2, None).unwrap())
    };
    writer.join().unwrap();

    assert!(matches!(
        pathtree::TreeCursor::name(&cursor),
        Err(TreeError::InvalidatedCursor { .. })
    ));
}
