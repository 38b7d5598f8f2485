//! Command table and handlers

use super::format::{
    format_drives_table, format_file_info, format_help_table, format_listing, format_outline,
    DriveRow, FileInfo, ListingEntry,
};
use super::Shell;
use crate::error::{ApiError, VfsError};
use crate::storage::local::hash_file;
use crate::storage::human_size;
use crate::vfs::NodeId;
use dialoguer::Confirm;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;
use walkdir::WalkDir;

pub type Handler = fn(&mut Shell, &[String]) -> Result<String, ApiError>;

pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub min_args: usize,
    /// `None` means no upper bound.
    pub max_args: Option<usize>,
    pub handler: Handler,
}

/// Every shell command, sorted by name.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "catalog",
        usage: "catalog [<folder>] [--flat]",
        help: "Show the catalog below a remote folder",
        min_args: 0,
        max_args: Some(2),
        handler: cmd_catalog,
    },
    CommandSpec {
        name: "cd",
        usage: "cd [<folder>]",
        help: "Change working remote folder",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_cd,
    },
    CommandSpec {
        name: "drive",
        usage: "drive [<name>]",
        help: "List drives, or switch to one",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_drive,
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        help: "Leave the shell",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_exit,
    },
    CommandSpec {
        name: "get",
        usage: "get <file>",
        help: "Download remote file to the local folder",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_get,
    },
    CommandSpec {
        name: "hash",
        usage: "hash <local-file>",
        help: "Show the blake3 digest of a local file",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_hash,
    },
    CommandSpec {
        name: "help",
        usage: "help",
        help: "List available commands",
        min_args: 0,
        max_args: Some(0),
        handler: cmd_help,
    },
    CommandSpec {
        name: "info",
        usage: "info <file>",
        help: "Show remote file information",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_info,
    },
    CommandSpec {
        name: "ls",
        usage: "ls [<folder>]",
        help: "List content of remote folder",
        min_args: 0,
        max_args: Some(1),
        handler: cmd_ls,
    },
    CommandSpec {
        name: "mkdir",
        usage: "mkdir <folder>",
        help: "Create remote folder",
        min_args: 1,
        max_args: Some(1),
        handler: cmd_mkdir,
    },
    CommandSpec {
        name: "mv",
        usage: "mv <folder/file> <folder/file>",
        help: "Move or rename remote folder or file",
        min_args: 2,
        max_args: Some(2),
        handler: cmd_mv,
    },
    CommandSpec {
        name: "put",
        usage: "put <local-file/folder> ... [<folder>]",
        help: "Upload local files to remote folder",
        min_args: 1,
        max_args: None,
        handler: cmd_put,
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

fn cmd_help(_shell: &mut Shell, _args: &[String]) -> Result<String, ApiError> {
    let mut rows: Vec<(&str, &str)> = COMMANDS.iter().map(|c| (c.usage, c.help)).collect();
    rows.sort_by_key(|(usage, _)| *usage);
    Ok(format_help_table(&rows))
}

// Handled by `Shell::run` before dispatch.
fn cmd_exit(_shell: &mut Shell, _args: &[String]) -> Result<String, ApiError> {
    Ok(String::new())
}

fn cmd_ls(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    let folder = match args.first() {
        Some(path) => session.tree.resolve_directory(session.cwd, path)?,
        None => session.cwd,
    };
    let tree = &mut session.tree;

    let mut folders = Vec::new();
    let mut files = Vec::new();
    for child in tree.children(folder)? {
        let name = tree.name(child).to_string();
        match tree.node(child).as_file() {
            Some(data) => files.push(ListingEntry::File {
                name,
                updated: data.updated,
            }),
            None => {
                let count = tree.count_descendant_files(child)?;
                folders.push(ListingEntry::Folder { name, files: count });
            }
        }
    }
    folders.extend(files);
    Ok(format_listing(&folders))
}

fn cmd_cd(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let path = args.first().map(String::as_str).unwrap_or("/");
    let session = shell.session_mut();
    session.cwd = session.tree.resolve_directory(session.cwd, path)?;
    Ok(String::new())
}

fn cmd_drive(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    match args.first() {
        Some(name) => {
            let drive = session.tree.drive_named(name).ok_or_else(|| VfsError::NotFound {
                name: name.clone(),
                parent: "/".to_string(),
            })?;
            session.cwd = drive;
            Ok(String::new())
        }
        None => {
            let rows: Vec<DriveRow> = session
                .tree
                .drives()
                .into_iter()
                .filter_map(|id| {
                    let node = session.tree.node(id);
                    node.as_drive().map(|data| DriveRow {
                        name: node.name().to_string(),
                        id: data.drive_id,
                        storage: data.storage.name(),
                        description: data.description.clone(),
                    })
                })
                .collect();
            Ok(format_drives_table(&rows))
        }
    }
}

fn cmd_info(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    let file = session.tree.resolve_file(session.cwd, &args[0])?;
    let tree = &session.tree;
    let data = tree
        .node(file)
        .as_file()
        .ok_or_else(|| VfsError::invalid(format!("{} is not a file", tree.full_path(file))))?;
    let info = FileInfo {
        path: tree.full_path(file),
        content_id: data.content_id.clone(),
        created: data.created,
        updated: data.updated,
        metadata: data.metadata.clone(),
    };
    let storage = drive_storage(shell, file)?;
    let remote = storage
        .remote_stat(&info.content_id, &info.metadata)
        .map_err(|e| e.to_string());
    Ok(format_file_info(&info, remote.as_ref().map_err(Clone::clone)))
}

fn cmd_get(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    let file = session.tree.resolve_file(session.cwd, &args[0])?;
    let name = session.tree.name(file).to_string();
    let (content_id, metadata) = match session.tree.node(file).as_file() {
        Some(data) => (data.content_id.clone(), data.metadata.clone()),
        None => return Err(VfsError::invalid(format!("{} is not a file", name)).into()),
    };

    let dest = shell.local_path(&name);
    if dest.exists() {
        if !shell.is_interactive() {
            return Err(ApiError::Usage(format!(
                "{} already exists locally",
                dest.display()
            )));
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("Overwrite {}?", dest.display()))
            .default(false)
            .interact()
            .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
        if !overwrite {
            return Ok("Download skipped".to_string());
        }
    }

    let storage = drive_storage(shell, file)?;
    storage.download(&content_id, &metadata, &dest)?;
    tracing::info!(content_id = %content_id, dest = %dest.display(), "downloaded");
    Ok(format!("UUID {} downloaded to file {}", content_id, dest.display()))
}

/// Progress lines and failure count of one `put`.
#[derive(Default)]
struct PutReport {
    lines: Vec<String>,
    uploads: usize,
    failures: usize,
}

impl PutReport {
    fn skipped(&mut self, err: ApiError) {
        self.failures += 1;
        self.lines.push(format!("Upload SKIPPED - {}", err));
    }
}

fn cmd_put(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let mut dest = shell.session().cwd;
    let mut sources = args;

    if let Some((last, rest)) = args.split_last().filter(|_| args.len() > 1) {
        let local_exists = shell.local_path(last).exists();
        let session = shell.session_mut();
        let remote = session.tree.resolve_directory(session.cwd, last);
        if local_exists {
            if remote.is_ok() {
                return Err(ApiError::Usage(
                    "last arg is a local file/folder and a remote folder".to_string(),
                ));
            }
        } else {
            dest = remote?;
            sources = rest;
        }
    }

    let mut report = PutReport::default();
    for source in sources {
        let path = shell.local_path(source);
        if let Err(e) = put_one(shell, &path, dest, &mut report) {
            report.skipped(e);
        }
    }
    if report.failures > 0 {
        report
            .lines
            .push(format!("\nNumber of failures: {}", report.failures));
    }
    Ok(report.lines.join("\n"))
}

fn put_one(shell: &mut Shell, source: &Path, dest: NodeId, report: &mut PutReport) -> Result<(), ApiError> {
    let raw = source
        .file_name()
        .ok_or_else(|| ApiError::Usage(format!("cannot upload {}", source.display())))?;
    let name: String = raw.to_string_lossy().nfc().collect();
    let tree = &mut shell.session_mut().tree;
    if tree.get_child(dest, &name)?.is_some() {
        return Err(VfsError::AlreadyExists {
            name,
            parent: tree.full_path(dest),
        }
        .into());
    }

    let metadata = std::fs::metadata(source)?;
    if metadata.is_dir() {
        if tree.is_root(dest) {
            return Err(VfsError::invalid("cannot create drive").into());
        }
        let folder = tree.create_directory(dest, &name)?;
        let entries = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.skipped(ApiError::Io(e.into()));
                    continue;
                }
            };
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if let Err(e) = put_one(shell, entry.path(), folder, report) {
                report.skipped(e);
            }
        }
        return Ok(());
    }

    // Before the upload, so a rejected name leaves no blob behind
    tree.check_new_file(dest, &name)?;
    let drive = tree
        .owning_drive(dest)
        .ok_or_else(|| VfsError::invalid(format!("no drive for folder: {}", tree.full_path(dest))))?;
    let storage = match tree.node(drive).as_drive() {
        Some(data) => data.storage.clone(),
        None => return Err(VfsError::invalid("no storage for drive").into()),
    };
    let content_id = Uuid::new_v4().to_string();

    if report.uploads > 0 {
        report.lines.push("-".repeat(40));
    }
    report.uploads += 1;
    let stored = storage.upload(source, &content_id)?;
    report.lines.push(format!(
        "Uploaded {} ({}) to UUID {}",
        name,
        human_size(metadata.len()),
        content_id
    ));
    shell
        .session_mut()
        .tree
        .create_file(dest, &name, &content_id, &stored)?;
    Ok(())
}

fn cmd_catalog(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let flat = args.iter().any(|a| a == "--flat");
    let paths: Vec<&String> = args.iter().filter(|a| *a != "--flat").collect();
    if paths.len() > 1 {
        return Err(ApiError::Usage("catalog takes at most one folder".to_string()));
    }

    let session = shell.session_mut();
    let start = match paths.first() {
        Some(path) => session.tree.resolve_directory(session.cwd, path)?,
        None => session.cwd,
    };
    let tree = &mut session.tree;

    if flat {
        let drive = tree
            .owning_drive(start)
            .ok_or_else(|| VfsError::invalid("catalog --flat needs a folder inside a drive"))?;
        let drive_path = tree.full_path(drive);
        let relative = tree.full_path(start)[drive_path.len()..].to_string();
        let lines: Vec<String> = tree
            .flatten(drive)?
            .into_iter()
            .filter(|entry| {
                relative.is_empty()
                    || entry
                        .path()
                        .strip_prefix(relative.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|entry| entry.to_line())
            .collect();
        return Ok(lines.join("\n"));
    }

    let lines: Vec<(usize, String, bool)> = tree
        .outline(start)?
        .into_iter()
        .map(|(depth, node)| (depth, tree.name(node).to_string(), !tree.is_file(node)))
        .collect();
    Ok(format_outline(&lines))
}

fn cmd_mkdir(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    let (parent, name) = session.tree.resolve_parent(session.cwd, &args[0])?;
    if session.tree.is_root(parent) {
        return Err(VfsError::invalid("cannot create drive").into());
    }
    session.tree.create_directory(parent, &name)?;
    Ok(String::new())
}

fn cmd_mv(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let session = shell.session_mut();
    let cwd = session.cwd;
    let tree = &mut session.tree;
    let source = tree.resolve(cwd, &args[0])?;
    match tree.check_path(cwd, &args[1])? {
        Some(target) if tree.is_directory(target) => {
            let name = tree.name(source).to_string();
            tree.move_node(source, target, &name)?;
        }
        _ => {
            let (parent, name) = tree.resolve_parent(cwd, &args[1])?;
            tree.move_node(source, parent, &name)?;
        }
    }
    Ok(String::new())
}

fn cmd_hash(shell: &mut Shell, args: &[String]) -> Result<String, ApiError> {
    let path = shell.local_path(&args[0]);
    let (size, digest) = hash_file(&path)?;
    Ok(format!("BLAKE3:  {}  ({})", digest, human_size(size)))
}

fn drive_storage(
    shell: &Shell,
    node: NodeId,
) -> Result<std::sync::Arc<dyn crate::storage::Storage>, ApiError> {
    let tree = &shell.session().tree;
    tree.owning_drive(node)
        .and_then(|drive| tree.node(drive).as_drive())
        .map(|data| data.storage.clone())
        .ok_or_else(|| VfsError::invalid(format!("no drive for {}", tree.full_path(node))).into())
}
