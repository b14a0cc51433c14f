//! Abstract file access for the object store readers.
//!
//! Every reader in the workspace (pack indexes, packfiles, loose objects,
//! refs, store discovery) goes through [`StoreIo`] instead of `std::fs`
//! directly, so the same parsing core serves the blocking API, the
//! non-blocking adapter, and in-memory test doubles.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Other,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name, lossily converted to UTF-8.
    pub name: String,
    pub kind: FileKind,
}

/// An open file supporting positioned reads. Dropping it closes the file.
pub trait RandomAccess: Send {
    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns fewer bytes than requested only at end of file.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

/// Byte-oriented file access: open, read, stat, readdir.
pub trait StoreIo: Send + Sync + fmt::Debug {
    /// Open a file for positioned reads.
    fn open(&self, path: &Path) -> io::Result<Box<dyn RandomAccess>>;

    /// Read a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List a directory. Order is unspecified.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Report what `path` points at, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<FileKind>;

    /// Read a whole file, mapping a missing file to `None`.
    fn read_optional(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match self.read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// List a directory, mapping a missing directory to an empty listing.
    fn read_dir_optional(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        match self.read_dir(path) {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// What `path` points at, or `None` when it cannot be stat'ed.
    fn kind_of(&self, path: &Path) -> Option<FileKind> {
        self.stat(path).ok()
    }
}

/// [`StoreIo`] over the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsIo;

struct FsFile {
    file: File,
}

impl RandomAccess for FsFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

fn kind_of_type(ft: fs::FileType) -> FileKind {
    if ft.is_dir() {
        FileKind::Dir
    } else if ft.is_file() {
        FileKind::File
    } else {
        FileKind::Other
    }
}

impl StoreIo for FsIo {
    fn open(&self, path: &Path) -> io::Result<Box<dyn RandomAccess>> {
        Ok(Box::new(FsFile {
            file: File::open(path)?,
        }))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // Symlinked ref directories are followed like git does.
            let kind = match entry.file_type()? {
                ft if ft.is_symlink() => match fs::metadata(entry.path()) {
                    Ok(meta) => kind_of_type(meta.file_type()),
                    Err(_) => FileKind::Other,
                },
                ft => kind_of_type(ft),
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> io::Result<FileKind> {
        Ok(kind_of_type(fs::metadata(path)?.file_type()))
    }
}

/// Sequential [`Read`] view over a [`RandomAccess`] starting at an offset.
///
/// Used to stream a zlib section of a packfile into a decoder without
/// knowing its compressed length up front.
pub struct ReadAt<'a> {
    file: &'a mut dyn RandomAccess,
    pos: u64,
}

impl<'a> ReadAt<'a> {
    pub fn new(file: &'a mut dyn RandomAccess, pos: u64) -> Self {
        Self { file, pos }
    }

    /// Current absolute position in the underlying file.
    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl Read for ReadAt<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}
