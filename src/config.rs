//! `tsconfig.json` resolution: options and the root file list.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::diagnostic::{
    self, CIRCULAR_EXTENDS, Diagnostic, EMPTY_FILES_LIST, FILE_NOT_FOUND, NO_INPUTS,
    OPTION_TYPE_MISMATCH, ROOT_NOT_OBJECT, SYNTAX_ERROR,
};
use crate::error::{FixError, Result};
use crate::file::{FileError, read_file};
use crate::jsonc;
use crate::language::{has_extension, strip_source_extension, supported_extensions};
use crate::paths::{absolutize, relative_to, to_slash};

/// Compiler options as a JSON object, keyed by option name
pub type CompilerOptions = Map<String, Value>;

/// Result of resolving a configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Absolute path of the configuration file
    pub config_path: PathBuf,
    /// Merged compiler options, path options made absolute
    pub options: CompilerOptions,
    /// Files to compile, in resolution order
    pub root_file_names: Vec<PathBuf>,
}

/// Directories `**` never descends into, and the default `exclude` list
const PACKAGE_DIRS: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

const BOOLEAN_OPTIONS: &[&str] = &[
    "allowJs",
    "checkJs",
    "skipLibCheck",
    "verbatimModuleSyntax",
    "isolatedModules",
    "preserveSymlinks",
];

/// Options resolved against the directory of the config declaring them
const PATH_OPTIONS: &[&str] = &["baseUrl", "rootDir", "outDir", "declarationDir", "tsBuildInfoFile"];
const PATH_LIST_OPTIONS: &[&str] = &["rootDirs", "typeRoots"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Read a boolean compiler option
pub fn option_bool(options: &CompilerOptions, name: &str) -> Option<bool> {
    options.get(name).and_then(Value::as_bool)
}

/// Read a string compiler option
pub fn option_str<'a>(options: &'a CompilerOptions, name: &str) -> Option<&'a str> {
    options.get(name).and_then(Value::as_str)
}

/// Resolve a configuration file into options and root files
///
/// # Arguments
/// * `path` - Configuration path, relative to `cwd` unless absolute
/// * `cwd` - Directory relative paths and diagnostics are resolved against
///
/// # Returns
/// * `Ok(ResolvedConfig)` - Options and root file names
/// * `Err(FixError::ConfigNotFound)` - Path does not exist
/// * `Err(FixError::ConfigInvalid)` - Syntax errors, bad option types, broken
///   `extends`, or no input files
pub fn resolve(path: &Path, cwd: &Path) -> Result<ResolvedConfig> {
    let config_path = absolutize(cwd, path);
    if !config_path.is_file() {
        return Err(FixError::ConfigNotFound(config_path));
    }

    let text = read_file(&config_path)?.content;
    let value = jsonc::parse(&text)
        .map_err(|err| FixError::ConfigInvalid(format_syntax_error(&config_path, cwd, &err)))?;

    let mut loader = Loader::default();
    loader.stack.push(config_path.clone());
    let layer = loader.layer_from_value(&config_path, value);
    let root_file_names = loader.root_files(&layer, &config_path);

    if !loader.errors.is_empty() {
        return Err(FixError::ConfigInvalid(diagnostic::format_diagnostics(
            &loader.errors,
            cwd,
        )));
    }

    debug!(
        config = %config_path.display(),
        files = root_file_names.len(),
        "resolved tsconfig"
    );

    Ok(ResolvedConfig {
        config_path,
        options: layer.options,
        root_file_names,
    })
}

/// `path(line,col): error TS1005: message` for a JSON syntax error
fn format_syntax_error(path: &Path, cwd: &Path, err: &serde_json::Error) -> String {
    let message = err.to_string();
    let message = message.split(" at line ").next().unwrap_or(&message);
    format!(
        "{}({},{}): error TS{}: {}\n",
        relative_to(path, cwd).display(),
        err.line(),
        err.column().max(1),
        SYNTAX_ERROR,
        message
    )
}

/// A list of `files`/`include`/`exclude` entries and the directory they are
/// relative to
#[derive(Debug, Clone)]
struct Specs {
    patterns: Vec<String>,
    base: PathBuf,
}

/// One configuration file with everything it extends merged in
#[derive(Debug, Default)]
struct ConfigLayer {
    options: CompilerOptions,
    files: Option<Specs>,
    include: Option<Specs>,
    exclude: Option<Specs>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`
    fn overlay(&mut self, other: ConfigLayer) {
        self.options.extend(other.options);
        if other.files.is_some() {
            self.files = other.files;
        }
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Default)]
struct Loader {
    errors: Vec<Diagnostic>,
    /// Configs currently being loaded, for cycle detection
    stack: Vec<PathBuf>,
}

impl Loader {
    fn error(&mut self, code: u32, message: String) {
        self.errors.push(Diagnostic::global(code, message));
    }

    fn layer_from_value(&mut self, path: &Path, value: Value) -> ConfigLayer {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut layer = ConfigLayer::default();

        let Value::Object(mut root) = value else {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            self.error(
                ROOT_NOT_OBJECT,
                format!("The root value of a '{}' file must be an object.", name),
            );
            return layer;
        };

        if let Some(extends) = root.remove("extends") {
            let specs = match extends {
                Value::String(spec) => vec![spec],
                Value::Array(items) => self.string_list("extends", Value::Array(items)),
                _ => {
                    self.type_mismatch("extends", "string or Array");
                    Vec::new()
                }
            };
            for spec in specs {
                if let Some(base) = self.load_extended(&spec, &dir) {
                    layer.overlay(base);
                }
            }
        }

        let mut own = ConfigLayer::default();
        match root.remove("compilerOptions") {
            Some(Value::Object(options)) => own.options = self.normalize_options(options, &dir),
            Some(Value::Null) | None => {}
            Some(_) => self.type_mismatch("compilerOptions", "object"),
        }
        for key in ["files", "include", "exclude"] {
            let Some(value) = root.remove(key) else { continue };
            let specs = Some(Specs {
                patterns: self.string_list(key, value),
                base: dir.clone(),
            });
            match key {
                "files" => own.files = specs,
                "include" => own.include = specs,
                _ => own.exclude = specs,
            }
        }

        layer.overlay(own);
        layer
    }

    fn load_extended(&mut self, spec: &str, dir: &Path) -> Option<ConfigLayer> {
        let Some(path) = resolve_extends(spec, dir) else {
            self.error(FILE_NOT_FOUND, format!("File '{}' not found.", spec));
            return None;
        };

        if self.stack.contains(&path) {
            let chain: Vec<String> = self
                .stack
                .iter()
                .chain(std::iter::once(&path))
                .map(|p| p.display().to_string())
                .collect();
            self.error(
                CIRCULAR_EXTENDS,
                format!("Circularity detected while resolving configuration: {}", chain.join(" -> ")),
            );
            return None;
        }

        let text = match read_file(&path) {
            Ok(content) => content.content,
            Err(FileError::NotFound(_)) => {
                self.error(FILE_NOT_FOUND, format!("File '{}' not found.", path.display()));
                return None;
            }
            Err(err) => {
                self.error(FILE_NOT_FOUND, err.to_string());
                return None;
            }
        };
        let value = match jsonc::parse(&text) {
            Ok(value) => value,
            Err(err) => {
                let message = err.to_string();
                self.error(SYNTAX_ERROR, format!("{}: {}", path.display(), message));
                return None;
            }
        };

        debug!(base = %path.display(), "loading extended tsconfig");
        self.stack.push(path.clone());
        let layer = self.layer_from_value(&path, value);
        self.stack.pop();
        Some(layer)
    }

    fn type_mismatch(&mut self, name: &str, expected: &str) {
        self.error(
            OPTION_TYPE_MISMATCH,
            format!("Compiler option '{}' requires a value of type {}.", name, expected),
        );
    }

    fn string_list(&mut self, name: &str, value: Value) -> Vec<String> {
        let Value::Array(items) = value else {
            self.type_mismatch(name, "Array");
            return Vec::new();
        };
        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => strings.push(s),
                _ => self.type_mismatch(name, "string"),
            }
        }
        strings
    }

    /// Type-check the options this tool consumes and make path options absolute
    fn normalize_options(&mut self, options: CompilerOptions, dir: &Path) -> CompilerOptions {
        let mut normalized = CompilerOptions::new();
        for (name, value) in options {
            if value.is_null() {
                continue;
            }
            let name_ref = name.as_str();
            if BOOLEAN_OPTIONS.contains(&name_ref) && !value.is_boolean() {
                self.type_mismatch(name_ref, "boolean");
                continue;
            }
            if PATH_OPTIONS.contains(&name_ref) {
                let Some(raw) = value.as_str() else {
                    self.type_mismatch(name_ref, "string");
                    continue;
                };
                let absolute = to_slash(&absolutize(dir, Path::new(raw)));
                normalized.insert(name, Value::String(absolute));
                continue;
            }
            if PATH_LIST_OPTIONS.contains(&name_ref) {
                let entries = self.string_list(name_ref, value);
                let absolute = entries
                    .iter()
                    .map(|entry| Value::String(to_slash(&absolutize(dir, Path::new(entry)))))
                    .collect();
                normalized.insert(name, Value::Array(absolute));
                continue;
            }
            if name_ref == "paths" {
                if !valid_paths(&value) {
                    self.type_mismatch("paths", "object");
                    continue;
                }
                normalized.insert(
                    "pathsBasePath".to_string(),
                    Value::String(to_slash(dir)),
                );
            }
            normalized.insert(name, value);
        }
        normalized
    }

    fn root_files(&mut self, layer: &ConfigLayer, config_path: &Path) -> Vec<PathBuf> {
        let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let allow_js = option_bool(&layer.options, "allowJs").unwrap_or(false);
        let extensions = supported_extensions(allow_js);

        let mut roots = Vec::new();
        let mut seen = HashSet::new();
        if let Some(files) = &layer.files {
            for file in &files.patterns {
                let path = absolutize(&files.base, Path::new(file));
                if seen.insert(path.clone()) {
                    roots.push(path);
                }
            }
        }

        let include = match (&layer.include, &layer.files) {
            (Some(include), _) => Some(include.clone()),
            (None, None) => Some(Specs {
                patterns: vec!["**/*".to_string()],
                base: config_dir.clone(),
            }),
            (None, Some(_)) => None,
        };

        let exclude = match &layer.exclude {
            Some(exclude) => exclude.clone(),
            None => {
                let mut patterns: Vec<String> =
                    PACKAGE_DIRS.iter().map(|dir| dir.to_string()).collect();
                for option in ["outDir", "declarationDir"] {
                    if let Some(dir) = option_str(&layer.options, option) {
                        patterns.push(dir.to_string());
                    }
                }
                Specs {
                    patterns,
                    base: config_dir.clone(),
                }
            }
        };
        let exclude_patterns: Vec<Pattern> = exclude
            .patterns
            .iter()
            .filter_map(|spec| compile_pattern(&exclude.base, spec))
            .collect();

        let mut wildcard_files = Vec::new();
        if let Some(include) = &include {
            for spec in &include.patterns {
                wildcard_files.extend(expand_include(
                    &include.base,
                    spec,
                    &extensions,
                    &exclude_patterns,
                ));
            }
        }
        for path in prefer_typescript(wildcard_files) {
            if seen.insert(path.clone()) {
                roots.push(path);
            }
        }

        if roots.is_empty() {
            let config = config_path.display();
            match (&layer.files, &layer.include) {
                (Some(files), None) if files.patterns.is_empty() => self.error(
                    EMPTY_FILES_LIST,
                    format!("The 'files' list in config file '{}' is empty.", config),
                ),
                _ => {
                    let include_json = serde_json::to_string(
                        &include.map(|specs| specs.patterns).unwrap_or_default(),
                    )
                    .unwrap_or_default();
                    let exclude_json = serde_json::to_string(&exclude.patterns).unwrap_or_default();
                    self.error(
                        NO_INPUTS,
                        format!(
                            "No inputs were found in config file '{}'. Specified 'include' paths were '{}' and 'exclude' paths were '{}'.",
                            config, include_json, exclude_json
                        ),
                    );
                }
            }
        }

        roots
    }
}

fn valid_paths(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(|targets| {
            targets
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string))
        }),
        _ => false,
    }
}

/// Locate the file an `extends` entry points to
fn resolve_extends(spec: &str, dir: &Path) -> Option<PathBuf> {
    let is_path = spec.starts_with("./")
        || spec.starts_with("../")
        || spec == "."
        || spec == ".."
        || Path::new(spec).is_absolute();

    if is_path {
        let candidate = absolutize(dir, Path::new(spec));
        if candidate.is_file() {
            return Some(candidate);
        }
        if !spec.ends_with(".json") {
            let with_json = PathBuf::from(format!("{}.json", candidate.display()));
            if with_json.is_file() {
                return Some(with_json);
            }
        }
        return None;
    }

    for ancestor in dir.ancestors() {
        let base = ancestor.join("node_modules").join(spec);
        let candidates = [
            base.clone(),
            PathBuf::from(format!("{}.json", base.display())),
            base.join("tsconfig.json"),
        ];
        if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
            return Some(found);
        }
    }
    None
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?'])
}

/// Split an absolute pattern path into its literal prefix and wildcard tail
fn split_literal_prefix(pattern: &Path) -> (PathBuf, Vec<String>) {
    let mut prefix = PathBuf::new();
    let mut tail = Vec::new();
    for component in pattern.components() {
        let segment = component.as_os_str().to_string_lossy().into_owned();
        if tail.is_empty() && !has_wildcard(&segment) {
            prefix.push(component.as_os_str());
        } else {
            tail.push(segment);
        }
    }
    (prefix, tail)
}

/// Compile an exclude spec into a glob pattern
fn compile_pattern(base: &Path, spec: &str) -> Option<Pattern> {
    let (prefix, tail) = split_pattern(base, spec, false, &[]);
    let mut pattern = Pattern::escape(&to_slash(&prefix));
    for segment in tail {
        pattern.push('/');
        pattern.push_str(&segment);
    }
    match Pattern::new(&pattern) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            warn!(spec, error = %err, "ignoring invalid pattern");
            None
        }
    }
}

/// Absolute literal prefix and wildcard segments of a spec
///
/// Include specs whose last segment names neither a wildcard nor a
/// supported file are directories and get `/**/*` appended.
fn split_pattern(
    base: &Path,
    spec: &str,
    is_include: bool,
    extensions: &[&str],
) -> (PathBuf, Vec<String>) {
    let absolute = absolutize(base, Path::new(spec));
    let (prefix, mut tail) = split_literal_prefix(&absolute);
    if is_include {
        let last_is_file = tail
            .last()
            .map(|last| has_wildcard(last))
            .unwrap_or_else(|| has_extension(&prefix, extensions));
        if !last_is_file {
            tail.push("**".to_string());
            tail.push("*".to_string());
        }
    }
    (prefix, tail)
}

/// Expand one `include` spec into matching files
fn expand_include(
    base: &Path,
    spec: &str,
    extensions: &[&str],
    exclude: &[Pattern],
) -> Vec<PathBuf> {
    let (prefix, tail) = split_pattern(base, spec, true, extensions);

    if tail.is_empty() {
        // A literal file name
        return if prefix.is_file() && !is_excluded(&prefix, exclude) {
            vec![prefix]
        } else {
            Vec::new()
        };
    }

    let mut pattern = Pattern::escape(&to_slash(&prefix));
    for segment in &tail {
        pattern.push('/');
        pattern.push_str(segment);
    }

    let entries = match glob::glob_with(&pattern, MATCH_OPTIONS) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(spec, error = %err, "ignoring invalid include pattern");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let Ok(path) = entry else { continue };
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }
        if in_package_dir(&path, &prefix) || is_excluded(&path, exclude) {
            continue;
        }
        files.push(path);
    }
    files.sort();
    files
}

/// Whether a wildcard match walked into `node_modules` and friends
fn in_package_dir(path: &Path, literal_prefix: &Path) -> bool {
    path.strip_prefix(literal_prefix)
        .map(|rest| {
            rest.components().any(|component| {
                PACKAGE_DIRS.contains(&component.as_os_str().to_string_lossy().as_ref())
            })
        })
        .unwrap_or(false)
}

fn is_excluded(path: &Path, exclude: &[Pattern]) -> bool {
    path.ancestors().any(|candidate| {
        exclude
            .iter()
            .any(|pattern| pattern.matches_path_with(candidate, MATCH_OPTIONS))
    })
}

/// Drop `.d.ts` and JavaScript files shadowed by a TypeScript sibling
///
/// `a.ts` wins over `a.tsx`, `a.d.ts`, `a.js` and `a.jsx` in the same
/// directory; order of the survivors is preserved.
fn prefer_typescript(files: Vec<PathBuf>) -> Vec<PathBuf> {
    const PRIORITY: &[(&str, &[&str])] = &[
        ("ts", &[".ts", ".tsx", ".d.ts", ".js", ".jsx"]),
        ("mts", &[".mts", ".d.mts", ".mjs"]),
        ("cts", &[".cts", ".d.cts", ".cjs"]),
    ];

    let key_of = |path: &Path| -> Option<(PathBuf, String, &'static str, usize)> {
        let name = path.file_name()?.to_str()?;
        let stem = strip_source_extension(name);
        let suffix = &name[stem.len()..];
        PRIORITY.iter().find_map(|(family, order)| {
            order
                .iter()
                .position(|ext| *ext == suffix)
                .map(|rank| {
                    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                    (dir, stem.to_string(), *family, rank)
                })
        })
    };

    let mut best: HashMap<(PathBuf, String, &'static str), usize> = HashMap::new();
    for file in &files {
        if let Some((dir, stem, family, rank)) = key_of(file) {
            let entry = best.entry((dir, stem, family)).or_insert(rank);
            *entry = (*entry).min(rank);
        }
    }

    files
        .into_iter()
        .filter(|file| match key_of(file) {
            Some((dir, stem, family, rank)) => best.get(&(dir, stem, family)) == Some(&rank),
            None => true,
        })
        .collect()
}
