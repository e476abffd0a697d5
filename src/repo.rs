// logsleuth-analyzer - repo.rs
//
// LinesRepo: the façade tying a FileSet to its parsed LineRecord store, plus
// the tag-tree summary and the derived-repo construction used by commands
// that need to scope later operations (execute_command, export) to a
// sub-range or arbitrary subset of lines.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::files::FileSet;
use crate::flavor::Flavor;
use crate::model::{LineIndexRange, LineRecord};
use crate::util::error::{RepoError, Result as EngineResult};

/// A node in the dot-segment tag tree (`COMLib.Scheduler.Task` -> nested
/// `COMLib` -> `Scheduler` -> `Task` nodes, each counting lines at or below
/// it).
#[derive(Debug, Clone, serde::Serialize)]
pub struct TagNode {
    pub name: String,
    pub count: usize,
    pub descendants: Vec<TagNode>,
}

/// Renders a command invocation's parameters back into the single display
/// string the envelope's `command.params` field carries — `:N` for a
/// line-anchored invocation, otherwise `key=value` pairs in a stable order.
fn describe_command_params(anchor_line: Option<usize>, params: &crate::commands::CommandParams) -> String {
    if let Some(index) = anchor_line {
        return format!(":{index}");
    }
    let mut pairs: Vec<_> = params.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug)]
pub struct LinesRepo {
    files: Arc<FileSet>,
    lines: Vec<LineRecord>,
}

impl LinesRepo {
    /// Builds a repo from a single explicit file.
    pub fn init_from_file(path: &Path, flavor: Flavor) -> EngineResult<Self> {
        let files = FileSet::from_file(path, flavor)?;
        let lines = Self::build_lines(&files);
        Ok(Self { files, lines })
    }

    /// Builds a repo from every matching, flavor-sorted file in `dir`.
    pub fn init_from_folder(
        dir: &Path,
        flavor: Flavor,
        extra_name_filter: Option<&str>,
    ) -> EngineResult<Self> {
        let compiled = extra_name_filter
            .map(|pattern| {
                regex::Regex::new(pattern).map_err(|source| RepoError::InvalidFilterRegex {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;
        let files = FileSet::from_folder(dir, flavor, compiled.as_ref())?;
        let lines = Self::build_lines(&files);
        Ok(Self { files, lines })
    }

    fn build_lines(files: &FileSet) -> Vec<LineRecord> {
        let mut lines = Vec::new();
        for (index, file) in files.iter_files().enumerate() {
            let mut parsed = crate::flavor::process_file_data(file.bytes(), files.flavor, index as u32);
            lines.append(&mut parsed);
        }
        for (id, line) in lines.iter_mut().enumerate() {
            line.id = (id + 1) as u64;
        }
        lines
    }

    pub fn flavor(&self) -> Flavor {
        self.files.flavor
    }

    pub fn num_files(&self) -> usize {
        self.files.num_files()
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn full_range(&self) -> LineIndexRange {
        LineIndexRange::new(0, self.lines.len())
    }

    pub fn line(&self, index: usize) -> Option<&LineRecord> {
        self.lines.get(index)
    }

    /// Resolves the mapped bytes a given line's sections are offset into.
    pub fn bytes_for(&self, line: &LineRecord) -> &[u8] {
        self.files.files[line.file_index as usize].bytes()
    }

    /// A `line_tools::BytesOf` resolver bound to this repo's file set, for
    /// passing into the traversal primitives without threading `self`
    /// through every closure by hand.
    pub fn bytes_resolver<'a>(&'a self) -> impl Fn(&LineRecord) -> &'a [u8] + 'a {
        move |line: &LineRecord| self.bytes_for(line)
    }

    /// Finds the store index of the line with the given 1-based id via
    /// binary search; ids are assigned in ascending order at construction
    /// time so this holds for both root and derived repos.
    pub fn index_of_id(&self, id: u64) -> Option<usize> {
        self.lines.binary_search_by_key(&id, |l| l.id).ok()
    }

    /// Builds a new repo containing only the given line indices (by value,
    /// not by index range), re-numbering ids but keeping every record's
    /// original byte offsets and `file_index` intact, and sharing the same
    /// underlying `FileSet` so no bytes are copied or re-mapped.
    pub fn derive(&self, indices: &[usize]) -> EngineResult<Self> {
        let mut lines = Vec::with_capacity(indices.len());
        for &index in indices {
            let source = self.lines.get(index).ok_or(RepoError::LineIndexOutOfRange {
                index,
                num_lines: self.lines.len(),
            })?;
            lines.push(source.clone());
        }
        for (id, line) in lines.iter_mut().enumerate() {
            line.id = (id + 1) as u64;
        }
        Ok(Self {
            files: Arc::clone(&self.files),
            lines,
        })
    }

    /// Builds a new repo scoped to a contiguous index range; a thin wrapper
    /// over `derive` for the common "just a slice" case.
    pub fn derive_range(&self, range: LineIndexRange) -> EngineResult<Self> {
        let indices: Vec<usize> = (range.start..range.end.min(self.lines.len())).collect();
        self.derive(&indices)
    }

    /// Looks up and runs a named command under this repo's flavor's tag. An
    /// unknown command name (or a flavor with no registry at all) still
    /// produces an envelope, just one with `executed: false` and no
    /// `output`, never a panic or an error.
    pub fn execute_command(
        &self,
        name: &str,
        anchor_line: Option<usize>,
        params: &crate::commands::CommandParams,
    ) -> crate::commands::CommandResult {
        let registry = crate::commands::registry_for(self.flavor());
        let tag = registry.as_ref().map_or("", |r| r.tag);
        let mut result =
            crate::commands::CommandResult::new(tag, name, describe_command_params(anchor_line, params));

        let Some(registry) = registry else {
            return result;
        };
        let Some(command) = registry.commands.iter().find(|c| c.name == name) else {
            return result;
        };
        result.executed = (command.execute)(self, anchor_line, params, &mut result);
        result
    }

    /// Runs every inspector applicable to this repo's flavor.
    pub fn execute_inspections(&self) -> Vec<crate::inspectors::Finding> {
        crate::inspectors::run_all(self)
    }

    /// Builds a derived repo from a command's matched line indices — the
    /// `init_repo_from_command` external entry point: running a command and
    /// immediately scoping further operations (export, tag tree, a nested
    /// command) to just what it found.
    pub fn init_from_command(
        &self,
        name: &str,
        anchor_line: Option<usize>,
        params: &crate::commands::CommandParams,
    ) -> EngineResult<Option<Self>> {
        let result = self.execute_command(name, anchor_line, params);
        if !result.executed {
            return Ok(None);
        }
        let mut indices: Vec<usize> = result
            .lines_indices
            .iter()
            .flat_map(|group| group.indices.iter().copied())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        Ok(Some(self.derive(&indices)?))
    }

    /// The `init_repo_from_line_range` external entry point.
    pub fn init_from_line_range(&self, range: LineIndexRange) -> EngineResult<Self> {
        self.derive_range(range)
    }

    /// Builds the dot-segment tag tree summarising how many lines fall
    /// under each tag and its ancestors.
    pub fn tag_tree(&self) -> Vec<TagNode> {
        #[derive(Default)]
        struct Builder {
            count: usize,
            children: BTreeMap<String, Builder>,
        }

        let mut root = Builder::default();
        for line in &self.lines {
            let bytes = self.bytes_for(line);
            let tag = String::from_utf8_lossy(line.tag_str(bytes));
            if tag.is_empty() {
                continue;
            }
            let mut node = &mut root;
            for segment in tag.split('.') {
                node = node.children.entry(segment.to_string()).or_default();
                node.count += 1;
            }
        }

        fn into_nodes(builder: Builder) -> Vec<TagNode> {
            builder
                .children
                .into_iter()
                .map(|(name, child)| TagNode {
                    name,
                    count: child.count,
                    descendants: into_nodes(child),
                })
                .collect()
        }

        into_nodes(root)
    }
}
