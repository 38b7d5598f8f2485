use crate::integration::support::sample_drive;
use vhd::error::VfsErrorKind;

#[test]
fn resolves_file_directory_and_missing_entries() {
    let mut fx = sample_drive();
    let drive = fx.drive;

    let x = fx.tree.resolve(drive, "a/x.txt").unwrap();
    assert_eq!(fx.tree.name(x), "x.txt");
    assert_eq!(fx.tree.node(x).as_file().unwrap().content_id, "u1");

    let a = fx.tree.resolve(drive, "a/").unwrap();
    assert_eq!(fx.tree.name(a), "a");
    assert!(fx.tree.is_directory(a));

    let err = fx.tree.resolve(drive, "a/missing").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::NotFound);
}

#[test]
fn absolute_paths_start_from_root() {
    let mut fx = sample_drive();
    let a = fx.tree.resolve(fx.drive, "a").unwrap();
    let x = fx.tree.resolve(a, "/d/a/x.txt").unwrap();
    assert_eq!(fx.tree.full_path(x), "/d/a/x.txt");
    assert_eq!(fx.tree.resolve(x, "/").unwrap(), fx.tree.root());
}

#[test]
fn dot_and_dot_dot_segments() {
    let mut fx = sample_drive();
    let a = fx.tree.resolve(fx.drive, "a").unwrap();
    assert_eq!(fx.tree.resolve(a, ".").unwrap(), a);
    assert_eq!(fx.tree.resolve(a, "..").unwrap(), fx.drive);
    assert_eq!(fx.tree.resolve(fx.drive, "..").unwrap(), fx.tree.root());

    let b = fx.tree.resolve(a, "../b").unwrap();
    assert_eq!(fx.tree.full_path(b), "/d/b");

    let root = fx.tree.root();
    let err = fx.tree.resolve(root, "..").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::InvalidOperation);
}

#[test]
fn type_constraints_on_the_final_segment() {
    let mut fx = sample_drive();
    let drive = fx.drive;

    let err = fx.tree.resolve_directory(drive, "a/x.txt").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::TypeMismatch);

    let err = fx.tree.resolve_file(drive, "a").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::TypeMismatch);

    let err = fx.tree.resolve(drive, "a/x.txt/").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::TypeMismatch);

    let err = fx.tree.resolve_file(drive, "a/x.txt/").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::PathSyntax);
}

#[test]
fn a_file_mid_path_is_an_error() {
    let mut fx = sample_drive();
    let err = fx.tree.check_path(fx.drive, "a/x.txt/y").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::TypeMismatch);
}

#[test]
fn check_path_tolerates_only_a_missing_leaf() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    assert_eq!(fx.tree.check_path(drive, "a/nothing").unwrap(), None);
    assert!(fx.tree.check_path(drive, "a/x.txt").unwrap().is_some());

    let err = fx.tree.check_path(drive, "zz/nothing").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::NotFound);
}

#[test]
fn resolve_parent_returns_the_unresolved_leaf() {
    let mut fx = sample_drive();
    let drive = fx.drive;

    let (parent, leaf) = fx.tree.resolve_parent(drive, "a/new.txt").unwrap();
    assert_eq!(fx.tree.full_path(parent), "/d/a");
    assert_eq!(leaf, "new.txt");

    let (parent, leaf) = fx.tree.resolve_parent(drive, "/top").unwrap();
    assert!(fx.tree.is_root(parent));
    assert_eq!(leaf, "top");

    let err = fx.tree.resolve_parent(drive, "a/..").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::PathSyntax);
}

#[test]
fn empty_path_is_a_syntax_error() {
    let mut fx = sample_drive();
    let err = fx.tree.resolve(fx.drive, "").unwrap_err();
    assert_eq!(err.kind(), VfsErrorKind::PathSyntax);
}
