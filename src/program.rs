//! The set of files in one compilation.

use std::collections::{HashMap, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::CompilerOptions;
use crate::diagnostic::SourceFile;
use crate::error::Result;
use crate::file::{FileError, read_file};
use crate::language::{SourceKind, detect_kind};
use crate::parse::{AmbientModule, ModuleSummary, ParsedModule, parse_module};
use crate::paths::normalize;
use crate::resolve::{ModuleResolver, match_pattern};

/// A loaded, parsed file together with where its imports point
#[derive(Debug)]
pub struct ProgramFile {
    pub source: Arc<SourceFile>,
    pub kind: SourceKind,
    pub parsed: ParsedModule,
    /// Module specifier → resolved file, `None` when resolution failed
    resolutions: HashMap<String, Option<PathBuf>>,
}

impl ProgramFile {
    pub fn path(&self) -> &Path {
        &self.source.path
    }

    pub fn summary(&self) -> Option<&ModuleSummary> {
        self.parsed.summary.as_ref()
    }

    /// Resolved target of a module specifier used in this file
    pub fn resolution(&self, specifier: &str) -> Option<&Path> {
        self.resolutions.get(specifier)?.as_deref()
    }

    /// Whether semantic checks run on this file
    ///
    /// Declaration files and anything under `node_modules` are library code
    /// (`skipLibCheck`); JavaScript is never type checked.
    pub fn is_checked(&self) -> bool {
        !(self.kind.is_declaration() || self.kind.is_javascript() || in_node_modules(self.path()))
    }
}

fn in_node_modules(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, Component::Normal(name) if name == "node_modules"))
}

/// Every file reachable from the root files through module requests
#[derive(Debug, Default)]
pub struct Program {
    files: Vec<ProgramFile>,
    by_path: HashMap<PathBuf, usize>,
    missing_roots: Vec<PathBuf>,
    /// `declare module` names → (file index, ambient module index); the
    /// first declaration wins
    ambient: HashMap<String, (usize, usize)>,
}

impl Program {
    /// Load the root files and everything they import, transitively
    ///
    /// # Arguments
    /// * `root_file_names` - Files listed by the configuration
    /// * `options` - Compiler options driving module resolution
    ///
    /// # Returns
    /// * `Ok(Program)` - Files in load order; roots missing on disk are
    ///   recorded in `missing_roots` instead of failing
    /// * `Err(FixError::File)` - A file exists but could not be read
    pub fn load(root_file_names: &[PathBuf], options: &CompilerOptions) -> Result<Self> {
        let resolver = ModuleResolver::new(options);
        let mut program = Program::default();
        let mut queue: VecDeque<(PathBuf, bool)> = root_file_names
            .iter()
            .map(|root| (normalize(root), true))
            .collect();

        while let Some((path, is_root)) = queue.pop_front() {
            if program.by_path.contains_key(&path) {
                continue;
            }
            let Some(kind) = detect_kind(&path) else {
                warn!(path = %path.display(), "skipping file with unsupported extension");
                continue;
            };

            let content = match read_file(&path) {
                Ok(content) => content,
                Err(FileError::NotFound(missing)) => {
                    if is_root {
                        program.missing_roots.push(missing);
                    } else {
                        warn!(path = %missing.display(), "resolved file disappeared");
                    }
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let parsed = parse_module(&content.content, kind);
            let mut resolutions = HashMap::new();
            if let Some(summary) = &parsed.summary {
                for request in &summary.requests {
                    if resolutions.contains_key(&request.source) {
                        continue;
                    }
                    let target = resolver.resolve(&request.source, &path);
                    if let Some(target) = &target {
                        queue.push_back((target.clone(), false));
                    }
                    resolutions.insert(request.source.clone(), target);
                }
            }

            trace!(path = %path.display(), ?kind, requests = resolutions.len(), "loaded");
            program.by_path.insert(path.clone(), program.files.len());
            program.files.push(ProgramFile {
                source: SourceFile::new(path, content.content),
                kind,
                parsed,
                resolutions,
            });
        }

        program.index_ambient_modules();
        debug!(
            files = program.files.len(),
            missing = program.missing_roots.len(),
            ambient = program.ambient.len(),
            "program loaded"
        );
        Ok(program)
    }

    fn index_ambient_modules(&mut self) {
        for (file_index, file) in self.files.iter().enumerate() {
            let Some(summary) = file.summary() else { continue };
            for (module_index, module) in summary.ambient_modules.iter().enumerate() {
                self.ambient
                    .entry(module.name.clone())
                    .or_insert((file_index, module_index));
            }
        }
    }

    /// Files in load order, roots first
    pub fn files(&self) -> &[ProgramFile] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&ProgramFile> {
        self.by_path.get(path).map(|&index| &self.files[index])
    }

    /// The `declare module` block providing `name`
    ///
    /// Exact names win over wildcard patterns; among patterns the longest
    /// prefix before the `*` wins.
    pub fn ambient_module(&self, name: &str) -> Option<(&ProgramFile, &AmbientModule)> {
        let (file_index, module_index) = match self.ambient.get(name) {
            Some(&found) => found,
            None => self
                .ambient
                .iter()
                .filter(|(pattern, _)| pattern.contains('*'))
                .filter(|(pattern, _)| match_pattern(pattern, name).is_some())
                .max_by(|(a, _), (b, _)| {
                    let prefix = |pattern: &str| pattern.find('*').unwrap_or(0);
                    prefix(a).cmp(&prefix(b)).then_with(|| b.cmp(a))
                })
                .map(|(_, &found)| found)?,
        };
        let file = &self.files[file_index];
        let module = file.summary()?.ambient_modules.get(module_index)?;
        Some((file, module))
    }

    /// Root files that do not exist
    pub fn missing_roots(&self) -> &[PathBuf] {
        &self.missing_roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, text: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn loads_imports_transitively() {
        let dir = tempfile::tempdir().unwrap();
        let index = write(dir.path(), "index.ts", "import { a } from './a';");
        let a = write(dir.path(), "a.ts", "export * from './b';");
        let b = write(dir.path(), "b.ts", "export type T = 1;");
        write(dir.path(), "unused.ts", "export const x = 1;");

        let program = Program::load(&[index.clone()], &CompilerOptions::new()).unwrap();
        let paths: Vec<&Path> = program.files().iter().map(ProgramFile::path).collect();
        assert_eq!(paths, vec![index.as_path(), a.as_path(), b.as_path()]);
        assert_eq!(program.file(&index).unwrap().resolution("./a"), Some(a.as_path()));
    }

    #[test]
    fn missing_roots_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let present = write(dir.path(), "present.ts", "");
        let absent = dir.path().join("absent.ts");

        let program = Program::load(&[absent.clone(), present], &CompilerOptions::new()).unwrap();
        assert_eq!(program.missing_roots(), &[absent]);
        assert_eq!(program.files().len(), 1);
    }

    #[test]
    fn unresolved_requests_are_kept_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let index = write(dir.path(), "index.ts", "import { x } from './nowhere';");

        let program = Program::load(&[index.clone()], &CompilerOptions::new()).unwrap();
        let file = program.file(&index).unwrap();
        assert_eq!(file.resolution("./nowhere"), None);
        assert!(file.is_checked());
    }

    #[test]
    fn ambient_modules_by_name_and_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let shims = write(
            dir.path(),
            "shims.d.ts",
            "declare module 'http' { export interface IncomingMessage {} }\n\
             declare module '*.css';\n\
             declare module 'assets/*.css';",
        );
        write(dir.path(), "late.d.ts", "declare module 'http' {}");

        let roots = [shims.clone(), dir.path().join("late.d.ts")];
        let program = Program::load(&roots, &CompilerOptions::new()).unwrap();

        let (file, http) = program.ambient_module("http").unwrap();
        assert_eq!(file.path(), shims.as_path());
        assert!(http.body.is_some());
        assert_eq!(program.ambient_module("assets/logo.css").unwrap().1.name, "assets/*.css");
        assert_eq!(program.ambient_module("theme.css").unwrap().1.name, "*.css");
        assert!(program.ambient_module("fs").is_none());
    }

    #[test]
    fn library_files_are_not_checked() {
        let dir = tempfile::tempdir().unwrap();
        let index = write(dir.path(), "index.ts", "import { x } from 'lib';");
        let lib = write(dir.path(), "node_modules/lib/index.ts", "export const x = 1;");
        let decl = write(dir.path(), "types.d.ts", "export type T = 1;");

        let program = Program::load(&[index, decl.clone()], &CompilerOptions::new()).unwrap();
        assert!(!program.file(&lib).unwrap().is_checked());
        assert!(!program.file(&decl).unwrap().is_checked());
    }
}
