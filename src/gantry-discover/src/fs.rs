//! File-system port used by discovery and generation.
//!
//! All I/O performed by the walker, the scanner and the wrapper generator goes
//! through [`FileSystem`]. [`OsFileSystem`] talks to the real disk while
//! [`MemoryFileSystem`] keeps everything in memory so tests can build whole
//! trees without touching the disk.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    /// Symlinks, sockets and anything else the walker ignores.
    Other,
}

/// A single entry returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name of the entry (no directory component).
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// The only I/O surface of the command model compiler.
pub trait FileSystem {
    /// List the entries of a directory. Order is unspecified.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read the full contents of a file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write a file in a single call, replacing any previous contents.
    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        (**self).read_dir(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        (**self).write_file(path, contents, mode)
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                kind,
            ));
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a file path: {}", path.display()),
            )
        })?;

        // Write next to the target and rename so readers never see a partial file
        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(file_name);
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, contents)?;
        set_mode(&tmp_path, mode)?;
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// In-memory [`FileSystem`] for tests and dry runs.
///
/// Directories exist implicitly for every ancestor of a stored file; empty
/// directories can be added with [`MemoryFileSystem::add_dir`].
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
}

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    mode: u32,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that adds a file.
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        self.add_file(path, contents);
        self
    }

    /// Add (or replace) a file with mode `0o644`.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let path = normalize(path.as_ref());
        let mut state = self.state.write();
        state.add_ancestors(&path);
        state.files.insert(
            path,
            MemoryFile {
                contents: contents.as_ref().to_vec(),
                mode: 0o644,
            },
        );
    }

    /// Add an empty directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut state = self.state.write();
        state.add_ancestors(&path);
        state.dirs.insert(path);
    }

    /// Contents of a stored file as UTF-8, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = normalize(path.as_ref());
        self.state
            .read()
            .files
            .get(&path)
            .map(|f| String::from_utf8_lossy(&f.contents).into_owned())
    }

    /// Mode recorded for a stored file, if present.
    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        let path = normalize(path.as_ref());
        self.state.read().files.get(&path).map(|f| f.mode)
    }

    /// All stored file paths in sorted order.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.state.read().files.keys().cloned().collect()
    }
}

impl MemoryState {
    fn add_ancestors(&mut self, path: &Path) {
        let mut current = parent_of(path);
        while let Some(dir) = current {
            current = parent_of(&dir);
            self.dirs.insert(dir);
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = normalize(path);
        let state = self.state.read();
        if !state.is_dir(&path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            ));
        }

        let name_of = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter(|d| parent_of(d).as_deref() == Some(path.as_path()))
            .map(|d| DirEntry::new(name_of(d), EntryKind::Dir))
            .collect();
        entries.extend(
            state
                .files
                .keys()
                .filter(|f| parent_of(f).as_deref() == Some(path.as_path()))
                .map(|f| DirEntry::new(name_of(f), EntryKind::File)),
        );
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        self.state
            .read()
            .files
            .get(&path)
            .map(|f| f.contents.clone())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
    }

    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
        let path = normalize(path);
        let mut state = self.state.write();
        match parent_of(&path) {
            Some(parent) if state.is_dir(&parent) => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent directory missing for {}", path.display()),
                ));
            }
        }
        state.files.insert(
            path,
            MemoryFile {
                contents: contents.to_vec(),
                mode,
            },
        );
        Ok(())
    }
}

/// Parent of a normalized path, with `.` as the top of every relative path.
fn parent_of(path: &Path) -> Option<PathBuf> {
    if path == Path::new(".") {
        return None;
    }
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(parent) => Some(parent.to_path_buf()),
        None => None,
    }
}

/// Lexically normalize a path: drop `.` components and resolve `..`.
///
/// An empty result becomes `.` so the scan root of `"."` and `"./"` agree.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
