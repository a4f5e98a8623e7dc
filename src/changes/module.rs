use std::fmt;
use std::path::{Component, Path};

use log::debug;

use super::ChangeSet;
use crate::config_file::ModulesConfig;

/// A buildable module, relative to the project root (`.` is the root module)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath(String);

impl ModulePath {
    #[must_use]
    pub fn root() -> Self {
        ModulePath(".".to_string())
    }

    fn from_components(components: &[String]) -> Self {
        if components.is_empty() {
            Self::root()
        } else {
            ModulePath(components.join("/"))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Modules to rebuild, in the order their first change was seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSelection {
    modules: Vec<ModulePath>,
}

impl ModuleSelection {
    /// Add a module unless it is already selected.
    pub fn push(&mut self, module: ModulePath) {
        if !self.modules.contains(&module) {
            self.modules.push(module);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[must_use]
    pub fn modules(&self) -> &[ModulePath] {
        &self.modules
    }

    /// Comma separated list for Maven's `-pl`
    #[must_use]
    pub fn to_filter(&self) -> String {
        self.modules
            .iter()
            .map(ModulePath::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<ModulePath> for ModuleSelection {
    fn from_iter<I: IntoIterator<Item = ModulePath>>(iter: I) -> Self {
        let mut selection = ModuleSelection::default();
        for module in iter {
            selection.push(module);
        }
        selection
    }
}

/// Maps changed files onto the module owning them.
///
/// A path is cut at its first source marker component (`a/src/main/X.java`
/// belongs to `a`). A build descriptor belongs to its directory. Anything else
/// belongs to the nearest ancestor holding a build descriptor on disk, falling
/// back to the root module.
pub struct ModuleResolver<'a> {
    root: &'a Path,
    config: &'a ModulesConfig,
}

impl<'a> ModuleResolver<'a> {
    #[must_use]
    pub fn new(root: &'a Path, config: &'a ModulesConfig) -> Self {
        Self { root, config }
    }

    /// Owning module of a path relative to the project root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> ModulePath {
        let components: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if let Some(pos) = components
            .iter()
            .position(|c| *c == self.config.source_marker)
        {
            return ModulePath::from_components(&components[..pos]);
        }

        let Some((file, dirs)) = components.split_last() else {
            return ModulePath::root();
        };
        if *file == self.config.descriptor {
            return ModulePath::from_components(dirs);
        }

        for end in (1..=dirs.len()).rev() {
            let candidate = &dirs[..end];
            let descriptor = self
                .root
                .join(candidate.join("/"))
                .join(&self.config.descriptor);
            if descriptor.is_file() {
                return ModulePath::from_components(candidate);
            }
        }
        ModulePath::root()
    }

    /// Select the modules owning every path of `change_set`.
    #[must_use]
    pub fn select(&self, change_set: &ChangeSet) -> ModuleSelection {
        change_set
            .paths()
            .map(|path| {
                let module = self.resolve(path);
                debug!("{} -> {module}", path.display());
                module
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::{Change, ChangeKind, StatusCode};
    use std::path::PathBuf;

    fn resolve_path(root: &Path, config: &ModulesConfig, path: &str) -> ModulePath {
        ModuleResolver::new(root, config).resolve(Path::new(path))
    }

    fn modified(path: &str) -> Change {
        Change {
            status: StatusCode {
                index: None,
                worktree: Some(ChangeKind::Modified),
            },
            path: PathBuf::from(path),
            orig_path: None,
        }
    }

    fn resolve(path: &str) -> String {
        let config = ModulesConfig::default();
        resolve_path(Path::new("/nonexistent"), &config, path).to_string()
    }

    #[test]
    fn test_source_file_maps_to_module() {
        assert_eq!(resolve("moduleA/src/main/java/Foo.java"), "moduleA");
    }

    #[test]
    fn test_nested_module() {
        assert_eq!(
            resolve("parent/child/src/test/resources/x.properties"),
            "parent/child"
        );
    }

    #[test]
    fn test_first_source_marker_wins() {
        assert_eq!(resolve("a/src/main/resources/src/x.txt"), "a");
    }

    #[test]
    fn test_descriptor_maps_to_its_directory() {
        assert_eq!(resolve("moduleA/pom.xml"), "moduleA");
        assert_eq!(resolve("pom.xml"), ".");
    }

    #[test]
    fn test_root_level_file_maps_to_root() {
        assert_eq!(resolve("README.md"), ".");
        assert_eq!(resolve("src/main/java/Root.java"), ".");
    }

    #[test]
    fn test_marker_must_be_whole_component() {
        // `srcgen` is not a source marker; nothing on disk so the root wins
        assert_eq!(resolve("a/srcgen/x.java"), ".");
    }

    #[test]
    fn test_other_files_use_nearest_descriptor_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/docs")).unwrap();
        std::fs::write(dir.path().join("a/pom.xml"), "").unwrap();
        let config = ModulesConfig::default();
        let resolver = ModuleResolver::new(dir.path(), &config);
        assert_eq!(
            resolver.resolve(Path::new("a/b/docs/guide.adoc")).as_str(),
            "a"
        );
        std::fs::write(dir.path().join("a/b/pom.xml"), "").unwrap();
        assert_eq!(
            resolver.resolve(Path::new("a/b/docs/guide.adoc")).as_str(),
            "a/b"
        );
    }

    #[test]
    fn test_deleted_directory_falls_back_to_surviving_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pom.xml"), "").unwrap();
        let config = ModulesConfig::default();
        let resolver = ModuleResolver::new(dir.path(), &config);
        assert_eq!(resolver.resolve(Path::new("gone/notes.txt")).as_str(), ".");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_directory_is_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("a")
            .join(OsStr::from_bytes(b"caf\xe9"))
            .join("src/X.java");
        let config = ModulesConfig::default();
        let module = ModuleResolver::new(Path::new("/nonexistent"), &config).resolve(&path);
        assert_eq!(module.as_str(), "a/caf\u{fffd}");
    }

    #[test]
    fn test_custom_markers() {
        let config = ModulesConfig {
            source_marker: "lib".to_string(),
            descriptor: "build.gradle".to_string(),
        };
        let root = Path::new("/nonexistent");
        assert_eq!(resolve_path(root, &config, "core/lib/x.kt").as_str(), "core");
        assert_eq!(resolve_path(root, &config, "core/build.gradle").as_str(), "core");
    }

    #[test]
    fn test_selection_dedups_in_first_seen_order() {
        let config = ModulesConfig::default();
        let resolver = ModuleResolver::new(Path::new("/nonexistent"), &config);
        let set = ChangeSet {
            changes: vec![
                modified("b/src/main/java/B1.java"),
                modified("a/src/main/java/A1.java"),
                modified("b/src/test/java/B2.java"),
                modified("a/pom.xml"),
                modified("b/src/main/java/B3.java"),
            ],
        };
        let selection = resolver.select(&set);
        assert_eq!(selection.to_filter(), "b,a");
        assert_eq!(selection.modules().len(), 2);
    }

    #[test]
    fn test_module_and_root_descriptor() {
        let config = ModulesConfig::default();
        let resolver = ModuleResolver::new(Path::new("/nonexistent"), &config);
        let set = ChangeSet {
            changes: vec![
                modified("moduleA/src/main/java/Foo.java"),
                modified("pom.xml"),
            ],
        };
        assert_eq!(resolver.select(&set).to_filter(), "moduleA,.");
    }

    #[test]
    fn test_empty_change_set_selects_nothing() {
        let config = ModulesConfig::default();
        let resolver = ModuleResolver::new(Path::new("/nonexistent"), &config);
        let selection = resolver.select(&ChangeSet::default());
        assert!(selection.is_empty());
        assert_eq!(selection.to_filter(), "");
    }
}
