use std::path::{Path, PathBuf};

use crate::config::SettingsFormat;

/// Logical layout of a Go workspace on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    /// Root directory of the workspace (where `go.mod` lives).
    pub root: PathBuf,
    /// Path to the module file.
    pub go_mod_path: PathBuf,
    /// Directory for vendored dependencies.
    pub vendor_dir: PathBuf,
    /// Settings file, YAML flavour.
    pub settings_yaml_path: PathBuf,
    /// Settings file, YAML flavour with the short extension.
    pub settings_yml_path: PathBuf,
    /// Settings file, JSON flavour.
    pub settings_json_path: PathBuf,
}

impl WorkspaceLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let go_mod_path = root.join("go.mod");
        let vendor_dir = root.join("vendor");
        let settings_yaml_path = root.join(".recovercheck.yaml");
        let settings_yml_path = root.join(".recovercheck.yml");
        let settings_json_path = root.join(".recovercheck.json");

        Self {
            root,
            go_mod_path,
            vendor_dir,
            settings_yaml_path,
            settings_yml_path,
            settings_json_path,
        }
    }

    /// Settings files in lookup order.
    pub fn settings_candidates(&self) -> [&Path; 3] {
        [&self.settings_yaml_path, &self.settings_yml_path, &self.settings_json_path]
    }

    /// Where `init-config` writes a settings file of the given format.
    pub fn settings_path(&self, format: SettingsFormat) -> &Path {
        match format {
            SettingsFormat::Yaml => &self.settings_yaml_path,
            SettingsFormat::Json => &self.settings_json_path,
        }
    }

    /// Render `path` relative to the root when it lives under it.
    pub fn relative_string(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}
