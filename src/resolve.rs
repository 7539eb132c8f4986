//! Module resolution, bundler style (what `module: preserve` implies).

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::config::{CompilerOptions, option_bool, option_str};
use crate::language::{JS_EXTENSIONS, TS_EXTENSIONS, TS_MODULE_EXTENSIONS};
use crate::paths::{absolutize, normalize};

/// Conditions matched in a package's `exports`, in priority order
const EXPORT_CONDITIONS: &[&str] = &["types", "import", "default"];

/// The parts of a `package.json` that matter for finding types
#[derive(Debug, Default, Clone, Deserialize)]
struct PackageJson {
    types: Option<String>,
    typings: Option<String>,
    main: Option<String>,
    exports: Option<Value>,
}

/// Resolves module specifiers to files
#[derive(Debug)]
pub struct ModuleResolver {
    base_url: Option<PathBuf>,
    /// `paths` entries as (pattern, substitutions), longest prefix first
    paths: Vec<(String, Vec<String>)>,
    paths_base: Option<PathBuf>,
    allow_js: bool,
    type_roots: Option<Vec<PathBuf>>,
    types: Option<Vec<String>>,
    packages: RefCell<HashMap<PathBuf, Option<PackageJson>>>,
}

fn string_list(options: &CompilerOptions, name: &str) -> Option<Vec<String>> {
    options.get(name).and_then(Value::as_array).map(|items| {
        items.iter().filter_map(Value::as_str).map(str::to_string).collect()
    })
}

impl ModuleResolver {
    /// Build a resolver from (already normalized) compiler options
    pub fn new(options: &CompilerOptions) -> Self {
        let base_url = option_str(options, "baseUrl").map(PathBuf::from);
        // `paths` substitutions are relative to `baseUrl` when it is set
        let paths_base = base_url
            .clone()
            .or_else(|| option_str(options, "pathsBasePath").map(PathBuf::from));

        let mut paths: Vec<(String, Vec<String>)> = options
            .get("paths")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(pattern, targets)| {
                        let targets = targets
                            .as_array()
                            .map(|items| {
                                items.iter().filter_map(Value::as_str).map(str::to_string).collect()
                            })
                            .unwrap_or_default();
                        (pattern.clone(), targets)
                    })
                    .collect()
            })
            .unwrap_or_default();
        paths.sort_by_key(|(pattern, _)| {
            std::cmp::Reverse(pattern.split('*').next().map(str::len).unwrap_or(0))
        });

        Self {
            base_url,
            paths,
            paths_base,
            allow_js: option_bool(options, "allowJs").unwrap_or(false),
            type_roots: string_list(options, "typeRoots")
                .map(|roots| roots.into_iter().map(PathBuf::from).collect()),
            types: string_list(options, "types"),
            packages: RefCell::new(HashMap::new()),
        }
    }

    /// Entry files of the `@types` packages a compilation includes unimported
    ///
    /// Packages come from `typeRoots`, or every `node_modules/@types` above
    /// `config_dir`. `types`, when set, names the packages to take; otherwise
    /// all of them are. A package name found in an earlier root shadows later
    /// ones.
    pub fn automatic_type_packages(&self, config_dir: &Path) -> Vec<PathBuf> {
        let roots: Vec<PathBuf> = match &self.type_roots {
            Some(roots) => roots.clone(),
            None => config_dir
                .ancestors()
                .map(|dir| dir.join("node_modules").join("@types"))
                .collect(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();
        for root in roots.iter().filter(|root| root.is_dir()) {
            let names: Vec<String> = match &self.types {
                Some(types) => types.iter().map(|name| types_package_name(name)).collect(),
                None => {
                    let mut names: Vec<String> = fs::read_dir(root)
                        .into_iter()
                        .flatten()
                        .flatten()
                        .filter(|entry| entry.path().is_dir())
                        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                        .filter(|name| !name.starts_with('.'))
                        .collect();
                    names.sort();
                    names
                }
            };
            for name in names {
                if seen.contains(&name) {
                    continue;
                }
                if let Some(entry) = self.load_as_directory(&root.join(&name)) {
                    trace!(package = %name, entry = %entry.display(), "automatic type package");
                    entries.push(normalize(&entry));
                    seen.insert(name);
                }
            }
        }
        entries
    }

    /// Resolve `specifier` as imported from `containing_file`
    ///
    /// # Returns
    /// * `Some(path)` - Absolute, normalized path of the resolved file
    /// * `None` - Nothing on disk matches
    pub fn resolve(&self, specifier: &str, containing_file: &Path) -> Option<PathBuf> {
        let dir = containing_file.parent().unwrap_or_else(|| Path::new("/"));

        let resolved = if is_relative(specifier) || Path::new(specifier).is_absolute() {
            self.load_as_file_or_directory(&absolutize(dir, Path::new(specifier)))
        } else {
            self.resolve_paths(specifier)
                .or_else(|| {
                    self.base_url
                        .as_ref()
                        .and_then(|base| self.load_as_file_or_directory(&base.join(specifier)))
                })
                .or_else(|| self.resolve_node_modules(specifier, dir))
        };

        trace!(specifier, from = %containing_file.display(), resolved = ?resolved, "resolve");
        resolved.map(|path| normalize(&path))
    }

    fn resolve_paths(&self, specifier: &str) -> Option<PathBuf> {
        let base = self.paths_base.as_ref()?;
        for (pattern, targets) in &self.paths {
            let Some(captured) = match_pattern(pattern, specifier) else { continue };
            for target in targets {
                let substituted = target.replacen('*', captured, 1);
                if let Some(found) = self.load_as_file_or_directory(&base.join(substituted)) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = TS_EXTENSIONS.to_vec();
        if self.allow_js {
            extensions.extend_from_slice(&JS_EXTENSIONS[..2]);
        }
        extensions
    }

    fn load_as_file(&self, candidate: &Path) -> Option<PathBuf> {
        let raw = candidate.to_string_lossy();

        // `./x.js` may name `./x.ts`, `./x.mjs` may name `./x.mts`, ...
        for (js, ts) in [
            (".js", &[".ts", ".tsx", ".d.ts"][..]),
            (".jsx", &[".tsx", ".d.ts"][..]),
            (".mjs", &[".mts", ".d.mts"][..]),
            (".cjs", &[".cts", ".d.cts"][..]),
        ] {
            if let Some(stem) = raw.strip_suffix(js) {
                if let Some(found) = ts
                    .iter()
                    .map(|ext| PathBuf::from(format!("{}{}", stem, ext)))
                    .find(|path| path.is_file())
                {
                    return Some(found);
                }
            }
        }

        let has_known_extension = TS_EXTENSIONS
            .iter()
            .chain(TS_MODULE_EXTENSIONS)
            .chain(JS_EXTENSIONS)
            .any(|ext| raw.ends_with(ext));
        if has_known_extension && candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        self.extensions()
            .into_iter()
            .map(|ext| PathBuf::from(format!("{}{}", raw, ext)))
            .find(|path| path.is_file())
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        if let Some(package) = self.package_json(dir) {
            for entry in [&package.types, &package.typings, &package.main].into_iter().flatten() {
                let target = dir.join(entry);
                if let Some(found) = self.load_as_file(&target) {
                    return Some(found);
                }
                if target.is_dir() && target != dir {
                    if let Some(found) = self.load_index(&target) {
                        return Some(found);
                    }
                }
            }
        }
        self.load_index(dir)
    }

    fn load_index(&self, dir: &Path) -> Option<PathBuf> {
        self.load_as_file(&dir.join("index"))
    }

    fn load_as_file_or_directory(&self, candidate: &Path) -> Option<PathBuf> {
        self.load_as_file(candidate)
            .or_else(|| self.load_as_directory(candidate))
    }

    fn resolve_node_modules(&self, specifier: &str, from: &Path) -> Option<PathBuf> {
        let (package, subpath) = split_package_specifier(specifier);
        let types_name = types_package_name(package);
        for dir in from.ancestors() {
            let node_modules = dir.join("node_modules");
            if !node_modules.is_dir() {
                continue;
            }
            for package_dir in [
                node_modules.join(package),
                node_modules.join("@types").join(&types_name),
            ] {
                if let Some(found) = self.load_package(&package_dir, &subpath) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Load `subpath` (`.` or `./x`) of the package in `package_dir`
    ///
    /// A package with `exports` exposes only what `exports` lists.
    fn load_package(&self, package_dir: &Path, subpath: &str) -> Option<PathBuf> {
        if let Some(exports) = self.package_json(package_dir).and_then(|package| package.exports) {
            return self.resolve_exports(package_dir, &exports, subpath);
        }
        match subpath.strip_prefix("./") {
            Some(rest) => self.load_as_file_or_directory(&package_dir.join(rest)),
            None => self.load_as_file_or_directory(package_dir),
        }
    }

    fn resolve_exports(&self, package_dir: &Path, exports: &Value, subpath: &str) -> Option<PathBuf> {
        let subpaths = match exports {
            Value::Object(map) if map.keys().any(|key| key.starts_with('.')) => map,
            // A bare target or condition map stands for `{ ".": exports }`
            _ if subpath == "." => return self.resolve_export_target(package_dir, exports, ""),
            _ => return None,
        };

        if let Some(target) = subpaths.get(subpath) {
            return self.resolve_export_target(package_dir, target, "");
        }
        let (target, captured) = subpaths
            .iter()
            .filter(|(key, _)| key.contains('*'))
            .filter_map(|(key, target)| {
                match_pattern(key, subpath).map(|captured| (key, target, captured))
            })
            .max_by_key(|(key, _, _)| key.find('*').unwrap_or(0))
            .map(|(_, target, captured)| (target, captured))?;
        self.resolve_export_target(package_dir, target, captured)
    }

    fn resolve_export_target(&self, package_dir: &Path, target: &Value, captured: &str) -> Option<PathBuf> {
        match target {
            Value::String(path) => {
                let path = path.replace('*', captured);
                let relative = path.strip_prefix("./")?;
                self.load_as_file(&package_dir.join(relative))
            }
            Value::Array(alternatives) => alternatives
                .iter()
                .find_map(|alternative| self.resolve_export_target(package_dir, alternative, captured)),
            Value::Object(conditions) => EXPORT_CONDITIONS
                .iter()
                .filter_map(|condition| conditions.get(*condition))
                .find_map(|nested| self.resolve_export_target(package_dir, nested, captured)),
            _ => None,
        }
    }

    fn package_json(&self, dir: &Path) -> Option<PackageJson> {
        if let Some(cached) = self.packages.borrow().get(dir) {
            return cached.clone();
        }
        let package = fs::read_to_string(dir.join("package.json"))
            .ok()
            .and_then(|text| serde_json::from_str::<PackageJson>(&text).ok());
        self.packages
            .borrow_mut()
            .insert(dir.to_path_buf(), package.clone());
        package
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// `@scope/pkg/sub/path` → (`@scope/pkg`, `./sub/path`); a bare package
/// name has subpath `.`
fn split_package_specifier(specifier: &str) -> (&str, String) {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let split = specifier
        .match_indices('/')
        .nth(segments - 1)
        .map(|(index, _)| index);
    match split {
        Some(index) => (&specifier[..index], format!(".{}", &specifier[index..])),
        None => (specifier, ".".to_string()),
    }
}

/// Match `specifier` against a pattern with at most one `*`
///
/// Returns the text the `*` captured (empty for exact keys).
pub(crate) fn match_pattern<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    match pattern.split_once('*') {
        None => (pattern == specifier).then_some(""),
        Some((prefix, suffix)) => {
            if specifier.len() >= prefix.len() + suffix.len()
                && specifier.starts_with(prefix)
                && specifier.ends_with(suffix)
            {
                Some(&specifier[prefix.len()..specifier.len() - suffix.len()])
            } else {
                None
            }
        }
    }
}

/// `@scope/pkg/sub` → `scope__pkg/sub`, the `@types` naming convention
fn types_package_name(specifier: &str) -> String {
    match specifier.strip_prefix('@') {
        Some(scoped) => scoped.replacen('/', "__", 1),
        None => specifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    fn resolver(options: Value) -> ModuleResolver {
        ModuleResolver::new(options.as_object().unwrap())
    }

    #[test]
    fn relative_with_and_without_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "index.ts");
        let file = touch(dir.path(), "file.ts");
        let comp = touch(dir.path(), "comp.tsx");
        let decl = touch(dir.path(), "types.d.ts");
        let nested = touch(dir.path(), "lib/index.ts");
        let r = resolver(json!({}));

        assert_eq!(r.resolve("./file", &index), Some(file.clone()));
        assert_eq!(r.resolve("./file.js", &index), Some(file.clone()));
        assert_eq!(r.resolve("./file.ts", &index), Some(file));
        assert_eq!(r.resolve("./comp", &index), Some(comp));
        assert_eq!(r.resolve("./types", &index), Some(decl));
        assert_eq!(r.resolve("./lib", &index), Some(nested));
        assert_eq!(r.resolve("./missing", &index), None);
    }

    #[test]
    fn js_files_need_allow_js() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "index.ts");
        let js = touch(dir.path(), "legacy.js");

        assert_eq!(resolver(json!({})).resolve("./legacy", &index), None);
        assert_eq!(
            resolver(json!({ "allowJs": true })).resolve("./legacy", &index),
            Some(js)
        );
    }

    #[test]
    fn paths_mapping_and_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "src/index.ts");
        let button = touch(dir.path(), "src/components/button.ts");
        let util = touch(dir.path(), "src/util.ts");
        let base = dir.path().to_string_lossy().into_owned();
        let r = resolver(json!({
            "paths": { "@/*": ["*"], "@/components/*": ["components/*"] },
            "pathsBasePath": base,
            "baseUrl": format!("{}/src", base),
        }));

        assert_eq!(r.resolve("@/components/button", &index), Some(button));
        assert_eq!(r.resolve("@/util", &index), Some(util.clone()));
        assert_eq!(r.resolve("util", &index), Some(util));
    }

    #[test]
    fn paths_without_base_url_are_relative_to_their_config() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "src/index.ts");
        let types = touch(dir.path(), "src/types.ts");
        let r = resolver(json!({
            "paths": { "@/*": ["src/*"] },
            "pathsBasePath": dir.path().to_string_lossy(),
        }));

        assert_eq!(r.resolve("@/types", &index), Some(types));
    }

    #[test]
    fn package_exports_conditions_and_subpaths() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "src/index.ts");
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(
            dir.path().join("node_modules/pkg/package.json"),
            r#"{
                "main": "./lib/main.d.ts",
                "exports": {
                    ".": { "types": "./dist/types/index.d.ts", "default": "./dist/index.js" },
                    "./utils": { "import": { "types": "./dist/utils.d.ts" } },
                    "./features/*": "./dist/features/*.js",
                    "./package.json": "./package.json"
                }
            }"#,
        )
        .unwrap();
        let main = touch(dir.path(), "node_modules/pkg/dist/types/index.d.ts");
        let utils = touch(dir.path(), "node_modules/pkg/dist/utils.d.ts");
        let feature = touch(dir.path(), "node_modules/pkg/dist/features/a.d.ts");
        touch(dir.path(), "node_modules/pkg/lib/main.d.ts");
        let r = resolver(json!({}));

        assert_eq!(r.resolve("pkg", &index), Some(main));
        assert_eq!(r.resolve("pkg/utils", &index), Some(utils));
        assert_eq!(r.resolve("pkg/features/a", &index), Some(feature));
        assert_eq!(r.resolve("pkg/lib/main", &index), None);
    }

    #[test]
    fn package_exports_shorthand() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "index.ts");
        fs::create_dir_all(dir.path().join("node_modules/@scope/sugar")).unwrap();
        fs::write(
            dir.path().join("node_modules/@scope/sugar/package.json"),
            r#"{ "exports": { "types": "./index.d.ts", "default": "./index.js" } }"#,
        )
        .unwrap();
        let entry = touch(dir.path(), "node_modules/@scope/sugar/index.d.ts");
        let r = resolver(json!({}));

        assert_eq!(r.resolve("@scope/sugar", &index), Some(entry));
        assert_eq!(r.resolve("@scope/sugar/other", &index), None);
    }

    #[test]
    fn automatic_type_packages_from_type_roots() {
        let dir = tempfile::tempdir().unwrap();
        let node = touch(dir.path(), "node_modules/@types/node/index.d.ts");
        let jest = touch(dir.path(), "node_modules/@types/jest/index.d.ts");
        fs::create_dir_all(dir.path().join("node_modules/@types/empty")).unwrap();

        let all = resolver(json!({})).automatic_type_packages(dir.path());
        assert_eq!(all, vec![jest, node.clone()]);

        let only_node = resolver(json!({ "types": ["node"] })).automatic_type_packages(dir.path());
        assert_eq!(only_node, vec![node]);

        let custom = touch(dir.path(), "typings/shims/index.d.ts");
        let roots = resolver(json!({ "typeRoots": [dir.path().join("typings").to_string_lossy()] }))
            .automatic_type_packages(dir.path());
        assert_eq!(roots, vec![custom]);
    }

    #[test]
    fn node_modules_types() {
        let dir = tempfile::tempdir().unwrap();
        let index = touch(dir.path(), "src/index.ts");
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(
            dir.path().join("node_modules/pkg/package.json"),
            r#"{ "types": "./dist/main.d.ts" }"#,
        )
        .unwrap();
        let pkg = touch(dir.path(), "node_modules/pkg/dist/main.d.ts");
        let scoped = touch(dir.path(), "node_modules/@types/scope__lib/index.d.ts");
        let r = resolver(json!({}));

        assert_eq!(r.resolve("pkg", &index), Some(pkg));
        assert_eq!(r.resolve("@scope/lib", &index), Some(scoped));
        assert_eq!(r.resolve("absent", &index), None);
    }

    #[test]
    fn pattern_matching() {
        assert_eq!(match_pattern("@/*", "@/a/b"), Some("a/b"));
        assert_eq!(match_pattern("*.css", "x.css"), Some("x"));
        assert_eq!(match_pattern("exact", "exact"), Some(""));
        assert_eq!(match_pattern("@/*", "other"), None);
        assert_eq!(types_package_name("@scope/lib"), "scope__lib");
    }

    #[test]
    fn package_specifiers_split_into_name_and_subpath() {
        assert_eq!(split_package_specifier("pkg"), ("pkg", ".".to_string()));
        assert_eq!(split_package_specifier("pkg/a/b"), ("pkg", "./a/b".to_string()));
        assert_eq!(split_package_specifier("@s/pkg"), ("@s/pkg", ".".to_string()));
        assert_eq!(split_package_specifier("@s/pkg/a"), ("@s/pkg", "./a".to_string()));
    }
}
