use crate::integration::support::sample_drive;
use std::sync::Arc;
use tempfile::TempDir;
use vhd::catalog::flat::catalog_file_for;
use vhd::catalog::{Catalog, FlatFileCatalog, SledCatalog};
use vhd::error::VfsErrorKind;
use vhd::storage::{LocalStorage, Storage};
use vhd::vfs::{NodeId, VirtualTree};

fn drive_over(catalog: Arc<dyn Catalog>, temp_dir: &TempDir) -> (VirtualTree, NodeId) {
    let storage = Arc::new(LocalStorage::new(temp_dir.path().join("store"), 1024));
    let mut tree = VirtualTree::new();
    let drive = tree.add_drive("d", "", 1, storage, catalog).unwrap();
    (tree, drive)
}

#[test]
fn flatten_then_reload_gives_the_same_tree() {
    let mut fx = sample_drive();
    let drive = fx.drive;
    let b = fx.tree.resolve(drive, "b").unwrap();
    let deep = fx.tree.create_directory(b, "deep").unwrap();
    fx.tree.create_file(deep, "z.bin", "u7", "2").unwrap();

    let entries = fx.tree.flatten(drive).unwrap();
    let lines: Vec<String> = entries.iter().map(|e| e.to_line()).collect();
    let catalog = Arc::new(FlatFileCatalog::from_lines(1, &lines).unwrap());

    let temp_dir = TempDir::new().unwrap();
    let (mut reloaded, reloaded_drive) = drive_over(catalog, &temp_dir);
    let reloaded_lines: Vec<String> = reloaded
        .flatten(reloaded_drive)
        .unwrap()
        .iter()
        .map(|e| e.to_line())
        .collect();
    assert_eq!(reloaded_lines, lines);

    let z = reloaded.resolve_file(reloaded_drive, "b/deep/z.bin").unwrap();
    assert_eq!(reloaded.node(z).as_file().unwrap().content_id, "u7");
}

#[test]
fn flat_catalog_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = catalog_file_for(temp_dir.path(), "d");
    {
        let catalog = Arc::new(FlatFileCatalog::open([(1, path.clone())]).unwrap());
        let (mut tree, drive) = drive_over(catalog, &temp_dir);
        let docs = tree.create_directory(drive, "docs").unwrap();
        tree.create_file(docs, "cv.pdf", "u1", "").unwrap();
        tree.move_node(docs, drive, "papers").unwrap();
    }
    assert!(path.exists());

    let catalog = Arc::new(FlatFileCatalog::open([(1, path.clone())]).unwrap());
    let (mut tree, drive) = drive_over(catalog, &temp_dir);
    assert!(tree.resolve_file(drive, "papers/cv.pdf").is_ok());
    assert_eq!(
        tree.resolve(drive, "docs").unwrap_err().kind(),
        VfsErrorKind::NotFound
    );
}

#[test]
fn uploaded_file_downloads_after_flat_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = catalog_file_for(temp_dir.path(), "d");
    let storage = LocalStorage::new(temp_dir.path().join("store"), 1024);
    let local = temp_dir.path().join("photo.jpg");
    let content: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&local, &content).unwrap();
    let content_id = "5f0c7a2e-86d6-11ec-a8a3-0242ac120002";
    {
        let catalog = Arc::new(FlatFileCatalog::open([(1, path.clone())]).unwrap());
        let (mut tree, drive) = drive_over(catalog, &temp_dir);
        let metadata = storage.upload(&local, content_id).unwrap();
        assert_eq!(metadata, "3");
        tree.create_file(drive, "photo.jpg", content_id, &metadata).unwrap();
    }

    let catalog = Arc::new(FlatFileCatalog::open([(1, path)]).unwrap());
    let (mut tree, drive) = drive_over(catalog, &temp_dir);
    let photo = tree.resolve_file(drive, "photo.jpg").unwrap();
    let data = tree.node(photo).as_file().unwrap().clone();
    assert_eq!(data.metadata, "");

    let back = temp_dir.path().join("back.jpg");
    storage.download(&data.content_id, &data.metadata, &back).unwrap();
    assert_eq!(std::fs::read(&back).unwrap(), content);
    let stat = storage.remote_stat(&data.content_id, &data.metadata).unwrap();
    assert_eq!(stat.parts.len(), 3);
}

#[test]
fn sled_catalog_keeps_ids_across_moves() {
    let temp_dir = TempDir::new().unwrap();
    let db = temp_dir.path().join("catalog.sled");
    let moved_id;
    {
        let catalog = Arc::new(SledCatalog::new(&db).unwrap());
        let (mut tree, drive) = drive_over(catalog, &temp_dir);
        let a = tree.create_directory(drive, "a").unwrap();
        let b = tree.create_directory(drive, "b").unwrap();
        let x = tree.create_file(a, "x.txt", "u1", "1").unwrap();
        tree.move_node(x, b, "x.txt").unwrap();
        moved_id = tree.catalog_id(x);
    }

    let catalog = Arc::new(SledCatalog::new(&db).unwrap());
    let (mut tree, drive) = drive_over(catalog, &temp_dir);
    let x = tree.resolve_file(drive, "b/x.txt").unwrap();
    assert_eq!(tree.catalog_id(x), moved_id);
    let a = tree.resolve(drive, "a").unwrap();
    assert!(tree.list_child_names(a).unwrap().is_empty());
}

#[test]
fn duplicate_flat_entries_are_rejected() {
    let catalog = FlatFileCatalog::from_lines(1, &["/a/x.txt:u1", "/a/x.txt:u2"]);
    assert!(catalog.is_err());
}
