use crate::integration::support::{empty_drive, names, sample_drive};
use vhd::error::VfsErrorKind;

#[test]
fn failed_directory_write_leaves_no_node_behind() {
    let mut fx = empty_drive();
    let drive = fx.drive;
    let arena_before = fx.tree.arena_len();

    fx.catalog.fail_writes(true);
    let err = fx.tree.create_directory(drive, "b").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::BackingStoreFailure);
    assert!(names(&mut fx.tree, drive).is_empty());
    assert_eq!(fx.tree.arena_len(), arena_before);

    fx.catalog.fail_writes(false);
    fx.tree.create_directory(drive, "b").unwrap();
    assert_eq!(names(&mut fx.tree, drive), vec!["b"]);
}

#[test]
fn failed_move_write_leaves_tree_unchanged() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let x = fx.tree.resolve(drive, "a/x.txt").unwrap();
    let b = fx.tree.resolve(drive, "b").unwrap();

    fx.catalog.fail_writes(true);
    assert!(fx.tree.move_node(x, b, "x.txt").is_err());
    assert_eq!(fx.tree.full_path(x), "/d/a/x.txt");
    assert!(fx.tree.list_child_names(b).unwrap().is_empty());
}

#[test]
fn duplicate_names_are_rejected() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let a = fx.tree.resolve(drive, "a").unwrap();

    let err = fx.tree.create_file(a, "x.txt", "u9", "").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::AlreadyExists);
    let err = fx.tree.create_directory(drive, "a").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::AlreadyExists);
    assert_eq!(names(&mut fx.tree, a), vec!["x.txt"]);
    assert_eq!(names(&mut fx.tree, drive), vec!["a", "b"]);
}

#[test]
fn move_onto_existing_name_changes_nothing() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let a = fx.tree.resolve(drive, "a").unwrap();
    let b = fx.tree.resolve(drive, "b").unwrap();
    let other = fx.tree.create_file(b, "x.txt", "u2", "").unwrap();

    let err = fx.tree.move_node(other, a, "x.txt").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::AlreadyExists);
    assert_eq!(names(&mut fx.tree, a), vec!["x.txt"]);
    assert_eq!(names(&mut fx.tree, b), vec!["x.txt"]);
    let kept = fx.tree.resolve(drive, "a/x.txt").unwrap();
    assert_eq!(fx.tree.node(kept).as_file().unwrap().content_id, "u1");
}

#[test]
fn move_directory_into_sibling() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let a = fx.tree.resolve(drive, "a").unwrap();
    let b = fx.tree.resolve(drive, "b").unwrap();

    fx.tree.move_node(a, b, "a").unwrap();
    let moved = fx.tree.resolve(drive, "b/a").unwrap();
    assert_eq!(moved, a);
    assert!(fx.tree.resolve(drive, "b/a/x.txt").is_ok());
    let err = fx.tree.resolve(drive, "a").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::NotFound);
}

#[test]
fn move_into_own_descendant_is_invalid() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let a = fx.tree.resolve(drive, "a").unwrap();
    let inner = fx.tree.create_directory(a, "inner").unwrap();

    for target in [a, inner] {
        let err = fx.tree.move_node(a, target, "a").unwrap_err();
        assert_eq!(err.kind(), VfsErrorKind::InvalidOperation);
    }
    assert_eq!(fx.tree.full_path(inner), "/d/a/inner");
    assert_eq!(names(&mut fx.tree, drive), vec!["a", "b"]);
}

#[test]
fn structural_moves_are_invalid() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let root = fx.tree.root();
    let a = fx.tree.resolve(drive, "a").unwrap();

    assert_eq!(
        fx.tree.move_node(root, a, "r").unwrap_err().kind(),
        VfsErrorKind::InvalidOperation
    );
    assert_eq!(
        fx.tree.move_node(drive, a, "d").unwrap_err().kind(),
        VfsErrorKind::InvalidOperation
    );
    assert_eq!(
        fx.tree.move_node(a, root, "a").unwrap_err().kind(),
        VfsErrorKind::InvalidOperation
    );
    assert_eq!(
        fx.tree.move_node(a, drive, "..").unwrap_err().kind(),
        VfsErrorKind::PathSyntax
    );
}

#[test]
fn file_move_refreshes_updated_only() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let x = fx.tree.resolve(drive, "a/x.txt").unwrap();
    let before = fx.tree.node(x).as_file().unwrap().clone();

    fx.tree.move_node(x, drive, "y.txt").unwrap();
    let after = fx.tree.node(x).as_file().unwrap();
    assert_eq!(fx.tree.full_path(x), "/d/y.txt");
    assert_eq!(after.created, before.created);
    assert!(after.updated >= before.updated);
    assert_eq!(after.content_id, "u1");
}

#[test]
fn files_cannot_be_created_at_root() {
    let mut fx = empty_drive();
    let root = fx.tree.root();
    let err = fx.tree.create_file(root, "loose.txt", "u1", "").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::InvalidOperation);
    let err = fx.tree.create_directory(root, "loose").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::InvalidOperation);
}

#[test]
fn counts_follow_the_catalog() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let b = fx.tree.resolve(drive, "b").unwrap();
    fx.tree.create_file(b, "y.txt", "u2", "").unwrap();
    fx.tree.create_file(drive, "top.txt", "u3", "").unwrap();

    let a = fx.tree.resolve(drive, "a").unwrap();
    assert_eq!(fx.tree.count_descendant_files(a).unwrap(), 1);
    assert_eq!(fx.tree.count_descendant_files(drive).unwrap(), 3);
    let root = fx.tree.root();
    assert_eq!(fx.tree.count_descendant_files(root).unwrap(), 3);
}
