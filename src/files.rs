// logsleuth-analyzer - files.rs
//
// Ownership of the memory-mapped bytes behind a repo. A `FileSet` outlives
// every `LineRecord` that points into it; derived repos share the same
// `FileSet` via `Arc` rather than re-mapping or copying bytes.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use crate::flavor::Flavor;
use crate::util::error::{RepoError, Result as EngineResult};

/// One memory-mapped log file and the byte range within it that belongs to
/// each parsed line (populated by the flavor parser during construction).
#[derive(Debug)]
pub struct MappedFile {
    pub path: PathBuf,
    mmap: Mmap,
}

impl MappedFile {
    fn open(path: &Path) -> Result<Self, RepoError> {
        let file = File::open(path).map_err(|source| RepoError::NoSuchFile {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: the mapped file is treated as read-only for the lifetime of
        // this struct; nothing else in this process is expected to truncate
        // or rewrite log files out from under an open analysis session.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| RepoError::Mmap {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap[..]
    }
}

/// An ordered collection of memory-mapped files making up one flavor's
/// rotated log corpus, shared by reference among a repo and its derived
/// repos.
#[derive(Debug)]
pub struct FileSet {
    pub flavor: Flavor,
    pub files: Vec<MappedFile>,
}

impl FileSet {
    /// Maps a single explicit file, inferring no flavor-level file-name
    /// filtering or sorting (the caller picked exactly one file).
    pub fn from_file(path: &Path, flavor: Flavor) -> EngineResult<Arc<Self>> {
        let mapped = MappedFile::open(path)?;
        Ok(Arc::new(Self {
            flavor,
            files: vec![mapped],
        }))
    }

    /// Lists `dir`, filters and sorts candidate names per `flavor`'s rules,
    /// then maps each surviving file in that order. A file that fails to
    /// open or map is skipped rather than aborting the whole load, mirroring
    /// the source system's best-effort folder scan.
    pub fn from_folder(
        dir: &Path,
        flavor: Flavor,
        extra_name_filter: Option<&regex::Regex>,
    ) -> EngineResult<Arc<Self>> {
        if !dir.is_dir() {
            return Err(RepoError::NotADirectory {
                path: dir.to_path_buf(),
            }
            .into());
        }

        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map_err(|source| RepoError::NoSuchFile {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();

        if let Some(extra) = extra_name_filter {
            names.retain(|name| extra.is_match(name));
        }

        let ordered = crate::flavor::list_and_sort(&names, flavor);

        let files = ordered
            .iter()
            .filter_map(|name| MappedFile::open(&dir.join(name)).ok())
            .collect();

        Ok(Arc::new(Self { flavor, files }))
    }

    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    pub fn iter_files(&self) -> impl Iterator<Item = &MappedFile> {
        self.files.iter()
    }
}
