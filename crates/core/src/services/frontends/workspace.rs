use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::analysis::{ParseError, SourceParser, SymbolService};
use crate::config::WorkspaceLayout;
use crate::model::{Position, Unit};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace root not found at {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to walk workspace: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Directories never searched for units.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

#[derive(Debug, Clone)]
struct DeclaredFunction {
    name: String,
    position: Position,
}

type DeclarationSlot = OnceLock<Vec<DeclaredFunction>>;

/// Symbol service and unit discovery for a Go module on disk.
///
/// Import paths under the `go.mod` module path map to directories below the
/// root; anything else is looked up under `vendor/`. Each package directory
/// is indexed once, on first lookup, by parsing its files, so declarations
/// inside comments or string literals are never mistaken for real ones.
pub struct GoWorkspace {
    layout: WorkspaceLayout,
    module_path: Option<String>,
    parser: Box<dyn SourceParser>,
    index: Mutex<HashMap<PathBuf, Arc<DeclarationSlot>>>,
}

impl fmt::Debug for GoWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoWorkspace")
            .field("root", &self.layout.root)
            .field("module_path", &self.module_path)
            .finish_non_exhaustive()
    }
}

impl GoWorkspace {
    /// Open the module rooted at `root` with the tree-sitter Go parser.
    #[cfg(feature = "go-frontend")]
    pub fn open(root: impl AsRef<Path>) -> Result<Self, WorkspaceError> {
        Self::open_with(root, super::GoParser)
    }

    /// Open the module rooted at `root`, parsing files with `parser`.
    pub fn open_with<P>(root: impl AsRef<Path>, parser: P) -> Result<Self, WorkspaceError>
    where
        P: SourceParser + 'static,
    {
        let layout = WorkspaceLayout::new(root);
        if !layout.root.is_dir() {
            return Err(WorkspaceError::MissingRoot(layout.root));
        }
        let module_path = if layout.go_mod_path.is_file() {
            let body = fs::read_to_string(&layout.go_mod_path).map_err(|source| {
                WorkspaceError::Io { path: layout.go_mod_path.clone(), source }
            })?;
            parse_module_path(&body)
        } else {
            None
        };
        Ok(Self {
            layout,
            module_path,
            parser: Box::new(parser),
            index: Mutex::new(HashMap::new()),
        })
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Module path declared in `go.mod`.
    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref()
    }

    /// Import path of the package whose files live in `dir`.
    pub fn module_for_dir(&self, dir: &Path) -> String {
        let rel = dir
            .strip_prefix(&self.layout.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default();
        match (&self.module_path, rel.is_empty()) {
            (Some(module), true) => module.clone(),
            (Some(module), false) => format!("{module}/{rel}"),
            (None, true) => ".".to_string(),
            (None, false) => rel,
        }
    }

    /// Directory holding the package imported as `module`.
    pub fn package_dir(&self, module: &str) -> Option<PathBuf> {
        let local = match &self.module_path {
            Some(own) if module == own.as_str() => Some(self.layout.root.clone()),
            Some(own) => module
                .strip_prefix(own.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| self.layout.root.join(rest)),
            None if module == "." => Some(self.layout.root.clone()),
            None => Some(self.layout.root.join(module)),
        };
        local
            .filter(|dir| dir.is_dir())
            .or_else(|| Some(self.layout.vendor_dir.join(module)).filter(|dir| dir.is_dir()))
    }

    /// Every `.go` file under the root, sorted by path.
    ///
    /// `vendor/`, `testdata/` and directories starting with `.` or `_` are
    /// skipped, as the Go tool does. Symlinks are not followed.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>, WorkspaceError> {
        let walker = WalkDir::new(&self.layout.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_go_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parse every discovered file. Files that fail to parse are returned
    /// separately so the caller can report them and carry on.
    pub fn parse_units(&self) -> Result<(Vec<Unit>, Vec<ParseError>), WorkspaceError> {
        let mut units = Vec::new();
        let mut failures = Vec::new();
        for file in self.discover_files()? {
            let dir = file.parent().unwrap_or(&self.layout.root);
            let module = self.module_for_dir(dir);
            match self.parser.parse_file(&file, &module) {
                Ok(unit) => units.push(unit),
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "skipping unparsable file");
                    failures.push(err);
                }
            }
        }
        Ok((units, failures))
    }

    fn declaration_slot(&self, dir: &Path) -> Arc<DeclarationSlot> {
        Arc::clone(self.index.lock().entry(dir.to_path_buf()).or_default())
    }

    /// Top-level functions declared by the `.go` files of `dir`, non-test
    /// files first. Files that fail to parse declare nothing.
    fn index_dir(&self, dir: &Path) -> Vec<DeclaredFunction> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_go_file(p))
            .collect();
        files.sort_by_key(|p| (crate::model::is_test_file(p), p.clone()));

        let module = self.module_for_dir(dir);
        let mut declared = Vec::new();
        for file in files {
            let unit = match self.parser.parse_file(&file, &module) {
                Ok(unit) => unit,
                Err(err) => {
                    tracing::debug!(file = %file.display(), error = %err, "file skipped while indexing");
                    continue;
                }
            };
            declared.extend(unit.functions.iter().filter(|f| !f.is_method()).map(|f| {
                DeclaredFunction { name: f.name.name.clone(), position: unit.position(f.name.pos) }
            }));
        }
        tracing::debug!(dir = %dir.display(), functions = declared.len(), "indexed package");
        declared
    }
}

impl SymbolService for GoWorkspace {
    fn locate(&self, module: &str, symbol: &str) -> Option<Position> {
        let dir = self.package_dir(module)?;
        let slot = self.declaration_slot(&dir);
        let declared = slot.get_or_init(|| self.index_dir(&dir));
        declared.iter().find(|d| d.name == symbol).map(|d| d.position.clone())
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| {
            name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&name)
        })
}

fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        let path = rest.trim().trim_matches('"');
        (!path.is_empty() && rest.starts_with(char::is_whitespace)).then(|| path.to_string())
    })
}
