use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vhd::catalog::flat::catalog_file_for;
use vhd::catalog::{Catalog, FlatFileCatalog, MemoryCatalog};
use vhd::config::{DriveConfig, DriveType, VhdConfig};
use vhd::error::VfsErrorKind;
use vhd::session::Session;
use vhd::shell::{Outcome, Shell};
use vhd::storage::{LocalStorage, Storage};

struct Harness {
    shell: Shell,
    local: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self::with_catalog(|_| Arc::new(MemoryCatalog::new()))
    }

    fn with_catalog(make: impl FnOnce(&Path) -> Arc<dyn Catalog>) -> Self {
        let local = TempDir::new().unwrap();
        let config = VhdConfig {
            drives: vec![
                DriveConfig {
                    name: "d".to_string(),
                    id: 1,
                    drive_type: DriveType::Local,
                    location: local.path().join("store-d"),
                    description: "first".to_string(),
                },
                DriveConfig {
                    name: "e".to_string(),
                    id: 2,
                    drive_type: DriveType::Local,
                    location: local.path().join("store-e"),
                    description: "second".to_string(),
                },
            ],
            ..VhdConfig::default()
        };
        let session = Session::with_catalog(&config, make(local.path())).unwrap();
        let work = local.path().join("work");
        fs::create_dir_all(&work).unwrap();
        Self {
            shell: Shell::new(session, false, work),
            local,
        }
    }

    fn run(&mut self, line: &str) -> String {
        match self.shell.run_line(line) {
            Ok(Outcome::Continue(output)) => output,
            Ok(Outcome::Exit) => panic!("unexpected exit for {line}"),
            Err(e) => panic!("{line}: {e}"),
        }
    }

    fn fail(&mut self, line: &str) -> vhd::error::ApiError {
        self.shell.run_line(line).unwrap_err()
    }

    fn work(&self, name: &str) -> std::path::PathBuf {
        self.local.path().join("work").join(name)
    }
}

#[test]
fn put_then_get_round_trips_content() {
    let mut h = Harness::new();
    fs::write(h.work("notes.txt"), b"remember the milk").unwrap();
    h.run("mkdir /d/docs");

    let out = h.run("put notes.txt /d/docs");
    assert!(out.contains("Uploaded notes.txt"));

    fs::remove_file(h.work("notes.txt")).unwrap();
    let out = h.run("get /d/docs/notes.txt");
    assert!(out.contains("downloaded to file"));
    assert_eq!(fs::read(h.work("notes.txt")).unwrap(), b"remember the milk");

    // Non-interactive sessions never overwrite
    let err = h.fail("get /d/docs/notes.txt");
    assert!(err.to_string().contains("already exists locally"));
}

#[test]
fn put_folder_skips_hidden_entries_and_counts_failures() {
    let mut h = Harness::new();
    let album = h.work("album");
    fs::create_dir_all(album.join("inner")).unwrap();
    fs::write(album.join("one.jpg"), b"1").unwrap();
    fs::write(album.join(".DS_Store"), b"junk").unwrap();
    fs::write(album.join("inner").join("two.jpg"), b"22").unwrap();

    h.run("cd /d");
    h.run("put album");
    let cwd = h.shell.session().cwd;
    assert_eq!(h.shell.session_mut().tree.find(cwd, "jpg").unwrap().len(), 2);
    let listing = h.run("ls album");
    assert!(listing.starts_with("inner/"));
    assert!(listing.contains("one.jpg"));
    assert!(!listing.contains("DS_Store"));

    // Second upload collides with what is already there
    let out = h.run("put album");
    assert!(out.contains("Upload SKIPPED"));
    assert!(out.contains("Number of failures: 1"));
}

#[test]
fn put_checks_catalog_name_before_uploading() {
    let mut h = Harness::with_catalog(|dir| {
        let catalog = FlatFileCatalog::open([
            (1, catalog_file_for(dir, "d")),
            (2, catalog_file_for(dir, "e")),
        ])
        .unwrap();
        Arc::new(catalog)
    });
    fs::write(h.work("a:b.txt"), b"colon").unwrap();
    fs::write(h.work("ok.txt"), b"fine").unwrap();

    let out = h.run("put a:b.txt ok.txt /d");
    assert!(out.contains("Upload SKIPPED"));
    assert!(out.contains("Number of failures: 1"));
    assert!(out.contains("Uploaded ok.txt"));

    // Only the representable name reached storage
    let storage = LocalStorage::new(h.local.path().join("store-d"), 1024);
    assert_eq!(storage.list_all().unwrap().len(), 1);
    assert_eq!(h.run("ls /d").lines().count(), 1);
}

#[test]
fn put_rejects_ambiguous_last_argument() {
    let mut h = Harness::new();
    fs::write(h.work("a.txt"), b"a").unwrap();
    fs::create_dir_all(h.work("docs")).unwrap();
    h.run("mkdir /d/docs");
    h.run("cd /d");
    let err = h.fail("put a.txt docs");
    assert!(err
        .to_string()
        .contains("last arg is a local file/folder and a remote folder"));
}

#[test]
fn put_names_are_nfc_normalized() {
    let mut h = Harness::new();
    // "e" + combining acute accent
    let decomposed = "cafe\u{301}.txt";
    fs::write(h.work(decomposed), b"x").unwrap();
    h.run(&format!("put \"{}\" /d", decomposed));
    h.run("cd /d");
    assert!(h.run("info caf\u{e9}.txt").contains("Content id"));
}

#[test]
fn ls_lists_folders_first_with_counts() {
    let mut h = Harness::new();
    fs::write(h.work("z.txt"), b"z").unwrap();
    h.run("mkdir /d/music");
    h.run("put z.txt /d/music");
    h.run("put z.txt /d");

    let listing = h.run("ls /d");
    let lines: Vec<&str> = listing.lines().collect();
    assert!(lines[0].starts_with("music/"));
    assert!(lines[0].ends_with("1 file"));
    assert!(lines[1].starts_with("z.txt"));

    let root = h.run("ls /");
    assert!(root.lines().any(|l| l.starts_with("d/") && l.ends_with("2 files")));
    assert!(root.lines().any(|l| l.starts_with("e/") && l.ends_with("0 files")));
}

#[test]
fn mv_into_existing_folder_or_rename() {
    let mut h = Harness::new();
    h.run("drive d");
    h.run("mkdir a");
    h.run("mkdir b");
    h.run("mv a b");
    assert!(h.run("ls b").starts_with("a/"));

    h.run("mv b/a c");
    let listing = h.run("ls");
    assert!(listing.contains("c/"));
    assert!(!listing.contains("a/"));

    let err = h.fail("mv c /e/c");
    assert_eq!(err.vfs_kind(), Some(VfsErrorKind::InvalidOperation));
    assert!(err.to_string().starts_with("mv: "));

    // b/.. is the drive itself, which already holds c
    let err = h.fail("mv c b/..");
    assert_eq!(err.vfs_kind(), Some(VfsErrorKind::AlreadyExists));
}

#[test]
fn mkdir_at_root_cannot_create_a_drive() {
    let mut h = Harness::new();
    let err = h.fail("mkdir /newdrive");
    assert_eq!(err.to_string(), "mkdir: cannot create drive");
    let err = h.fail("mkdir /d/x/y");
    assert_eq!(err.vfs_kind(), Some(VfsErrorKind::NotFound));
}

#[test]
fn catalog_outline_and_flat_view() {
    let mut h = Harness::new();
    fs::write(h.work("f.txt"), b"f").unwrap();
    h.run("mkdir /d/a");
    h.run("mkdir /d/a/b");
    h.run("put f.txt /d/a/b");

    assert_eq!(h.run("catalog /d"), "a/\n  b/\n    f.txt\n");

    let flat = h.run("catalog /d/a --flat");
    let lines: Vec<&str> = flat.lines().collect();
    assert_eq!(lines[0], "/a/b");
    assert!(lines[1].starts_with("/a/b/f.txt:"));

    let err = h.fail("catalog / --flat");
    assert_eq!(err.vfs_kind(), Some(VfsErrorKind::InvalidOperation));
}

#[test]
fn drive_lists_and_switches() {
    let mut h = Harness::new();
    let table = h.run("drive");
    assert!(table.contains("first"));
    assert!(table.contains("second"));

    h.run("drive e");
    assert_eq!(h.shell.prompt(), "/e> ");
    assert_eq!(
        h.fail("drive nope").vfs_kind(),
        Some(VfsErrorKind::NotFound)
    );
}

#[test]
fn info_shows_remote_parts() {
    let mut h = Harness::new();
    fs::write(h.work("big.bin"), vec![7u8; 3000]).unwrap();
    h.run("put big.bin /d");
    let info = h.run("info /d/big.bin");
    assert!(info.contains("Storage:    local::"));
    assert!(info.contains("2 KiB"));
    assert!(info.contains("Metadata:   1"));
}

#[test]
fn hash_reports_blake3_of_local_file() {
    let mut h = Harness::new();
    fs::write(h.work("h.txt"), b"hello").unwrap();
    let out = h.run("hash h.txt");
    let expected = blake3::hash(b"hello").to_hex().to_string();
    assert!(out.contains(&expected));
    assert!(h.fail("hash missing.txt").to_string().starts_with("hash: "));
}

#[test]
fn help_lists_every_command() {
    let mut h = Harness::new();
    let help = h.run("help");
    for name in ["catalog", "cd", "drive", "exit", "get", "hash", "help", "info", "ls", "mkdir", "mv", "put"] {
        assert!(help.contains(name), "missing {name}");
    }
}
