//! Semantic checks over a loaded program.
//!
//! Resolves every import and export specifier to the declaration it finally
//! names. With `verbatimModuleSyntax`, value-style imports and re-exports of
//! types are reported.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::debug;

use crate::config::{CompilerOptions, option_bool};
use crate::diagnostic::{
    CANNOT_FIND_MODULE, CANNOT_FIND_NAME, Diagnostic, FILE_NOT_FOUND, NO_DEFAULT_EXPORT,
    NO_EXPORTED_MEMBER, SYNTAX_ERROR, TYPE_ONLY_ALIAS_IMPORT, TYPE_ONLY_ALIAS_REEXPORT,
    TYPE_ONLY_IMPORT, TYPE_ONLY_REEXPORT, sort_and_dedup,
};
use crate::parse::{
    ExportEntry, ExportEquals, ExportTarget, ImportBinding, Imported, Meaning, ModuleSummary,
};
use crate::paths::to_slash;
use crate::position::Span;
use crate::program::{Program, ProgramFile};

/// What a name resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    meaning: Meaning,
    /// Reached through `import type` / `export type` somewhere on the way
    type_only: bool,
}

impl Target {
    fn through_type_only(self, type_only: bool) -> Self {
        Target {
            meaning: self.meaning,
            type_only: self.type_only || type_only,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Found(Target),
    /// The module is known and does not provide the name
    Missing,
    /// Resolution stopped somewhere: an unresolved module, a parse failure or
    /// an `export =` the summary cannot see into
    Unknown,
}

impl Lookup {
    fn through_type_only(self, type_only: bool) -> Self {
        match self {
            Lookup::Found(target) => Lookup::Found(target.through_type_only(type_only)),
            other => other,
        }
    }
}

/// (file, ambient module name or empty, exported name)
type Visited = HashSet<(PathBuf, String, String)>;

/// A module names can be looked up in: a whole file or one of its
/// `declare module` blocks
#[derive(Debug, Clone, Copy)]
struct ModuleRef<'p> {
    /// Holds the text and the resolutions of nested specifiers
    file: &'p ProgramFile,
    summary: Option<&'p ModuleSummary>,
    ambient: Option<&'p str>,
}

impl<'p> ModuleRef<'p> {
    fn file(file: &'p ProgramFile) -> Self {
        ModuleRef {
            file,
            summary: file.summary(),
            ambient: None,
        }
    }

    fn visit_key(&self, name: &str) -> (PathBuf, String, String) {
        (
            self.file.path().to_path_buf(),
            self.ambient.unwrap_or_default().to_string(),
            name.to_string(),
        )
    }
}

/// Runs the checks for one program
pub struct Checker<'p> {
    program: &'p Program,
    verbatim_module_syntax: bool,
}

impl<'p> Checker<'p> {
    pub fn new(program: &'p Program, options: &CompilerOptions) -> Self {
        Self {
            program,
            verbatim_module_syntax: option_bool(options, "verbatimModuleSyntax").unwrap_or(false),
        }
    }

    /// Every diagnostic for the program, sorted and without duplicates
    pub fn check(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .program
            .missing_roots()
            .iter()
            .map(|path| {
                Diagnostic::global(FILE_NOT_FOUND, format!("File '{}' not found.", to_slash(path)))
            })
            .collect();

        for file in self.program.files() {
            self.check_file(file, &mut diagnostics);
        }

        sort_and_dedup(&mut diagnostics);
        debug!(count = diagnostics.len(), "checked program");
        diagnostics
    }

    fn check_file(&self, file: &'p ProgramFile, out: &mut Vec<Diagnostic>) {
        for issue in &file.parsed.issues {
            out.push(self.error(file, SYNTAX_ERROR, issue.span, issue.message.clone()));
        }

        if !file.is_checked() {
            return;
        }
        let Some(summary) = file.summary() else {
            return;
        };
        let module = ModuleRef::file(file);

        for request in &summary.requests {
            if self.module(module, &request.source).is_none() {
                out.push(self.error(
                    file,
                    CANNOT_FIND_MODULE,
                    request.span,
                    format!(
                        "Cannot find module '{}' or its corresponding type declarations.",
                        request.source
                    ),
                ));
            }
        }

        for binding in &summary.imports {
            self.check_import(module, binding, out);
        }

        for entry in &summary.exports {
            if let Some(span) = entry.span {
                self.check_export_specifier(module, entry, span, out);
            }
        }
    }

    fn check_import(&self, module: ModuleRef<'p>, binding: &ImportBinding, out: &mut Vec<Diagnostic>) {
        let file = module.file;
        let name = match &binding.imported {
            Imported::Named(name) => name.as_str(),
            Imported::Default => binding.local.as_str(),
            Imported::Namespace => return,
        };

        match self.resolve_import(module, binding, &mut Visited::new()) {
            Lookup::Missing => {
                let (code, message) = missing_export(&binding.source, &binding.imported);
                out.push(self.error(file, code, binding.span, message));
            }
            Lookup::Found(target) if self.verbatim_module_syntax && !binding.type_only => {
                if !target.meaning.value {
                    out.push(self.error(
                        file,
                        TYPE_ONLY_IMPORT,
                        binding.span,
                        format!(
                            "'{}' is a type and must be imported using a type-only import when 'verbatimModuleSyntax' is enabled.",
                            name
                        ),
                    ));
                } else if target.type_only {
                    out.push(self.error(
                        file,
                        TYPE_ONLY_ALIAS_IMPORT,
                        binding.span,
                        format!(
                            "'{}' resolves to a type-only declaration and must be imported using a type-only import when 'verbatimModuleSyntax' is enabled.",
                            name
                        ),
                    ));
                }
            }
            _ => {}
        }
    }

    fn check_export_specifier(
        &self,
        module: ModuleRef<'p>,
        entry: &ExportEntry,
        span: Span,
        out: &mut Vec<Diagnostic>,
    ) {
        let file = module.file;
        let mut visited = Visited::new();
        let (name, lookup) = match &entry.target {
            ExportTarget::Local(local) => (local, self.resolve_local(module, local, &mut visited)),
            ExportTarget::Remote { source, name } => {
                let lookup = match self.module(module, source) {
                    Some(target) => self.resolve_export(target, name, &mut visited),
                    None => Lookup::Unknown,
                };
                (name, lookup)
            }
            ExportTarget::Declared(_) | ExportTarget::Namespace { .. } => return,
        };

        match (lookup, &entry.target) {
            (Lookup::Missing, ExportTarget::Local(local)) => {
                out.push(self.error(
                    file,
                    CANNOT_FIND_NAME,
                    span,
                    format!("Cannot find name '{}'.", local),
                ));
            }
            (Lookup::Missing, ExportTarget::Remote { source, name }) => {
                let imported = if name == "default" {
                    Imported::Default
                } else {
                    Imported::Named(name.clone())
                };
                let (code, message) = missing_export(source, &imported);
                out.push(self.error(file, code, span, message));
            }
            (Lookup::Found(target), _) if self.verbatim_module_syntax && !entry.type_only => {
                if !target.meaning.value {
                    out.push(self.error(
                        file,
                        TYPE_ONLY_REEXPORT,
                        span,
                        "Re-exporting a type when 'verbatimModuleSyntax' is enabled requires using 'export type'.",
                    ));
                } else if target.type_only {
                    out.push(self.error(
                        file,
                        TYPE_ONLY_ALIAS_REEXPORT,
                        span,
                        format!(
                            "'{}' resolves to a type-only declaration and must be re-exported using a type-only re-export when 'verbatimModuleSyntax' is enabled.",
                            name
                        ),
                    ));
                }
            }
            _ => {}
        }
    }

    fn error(&self, file: &ProgramFile, code: u32, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::in_file(code, &file.source, span.start, span.length, message)
    }

    /// The module a specifier used in `from` names
    ///
    /// Files found by module resolution come first, then `declare module`
    /// blocks anywhere in the program.
    fn module(&self, from: ModuleRef<'p>, specifier: &str) -> Option<ModuleRef<'p>> {
        if let Some(file) = from
            .file
            .resolution(specifier)
            .and_then(|path| self.program.file(path))
        {
            return Some(ModuleRef::file(file));
        }
        let (file, ambient) = self.program.ambient_module(specifier)?;
        Some(ModuleRef {
            file,
            summary: ambient.body.as_ref(),
            ambient: Some(ambient.name.as_str()),
        })
    }

    /// Follow an import binding to the declaration it names
    fn resolve_import(&self, module: ModuleRef<'p>, binding: &ImportBinding, visited: &mut Visited) -> Lookup {
        let Some(target) = self.module(module, &binding.source) else {
            return Lookup::Unknown;
        };
        let lookup = match &binding.imported {
            Imported::Named(name) => self.resolve_export(target, name, visited),
            Imported::Default => self.resolve_export(target, "default", visited),
            Imported::Namespace => Lookup::Found(Target {
                meaning: Meaning::BOTH,
                type_only: false,
            }),
        };
        lookup.through_type_only(binding.type_only)
    }

    /// Resolve a name in the scope of `module`
    fn resolve_local(&self, module: ModuleRef<'p>, name: &str, visited: &mut Visited) -> Lookup {
        let Some(summary) = module.summary else {
            return Lookup::Unknown;
        };
        if let Some(&meaning) = summary.declarations.get(name) {
            return Lookup::Found(Target {
                meaning,
                type_only: false,
            });
        }
        match summary.imports.iter().find(|binding| binding.local == name) {
            Some(binding) => self.resolve_import(module, binding, visited),
            None => Lookup::Missing,
        }
    }

    /// Resolve a name exported by `export =`
    ///
    /// Only members of a namespace named by the assignment are known; any
    /// other shape may carry properties the summary cannot see.
    fn resolve_export_equals(&self, summary: &ModuleSummary, assignment: &ExportEquals, name: &str) -> Lookup {
        let ExportEquals::Name(target) = assignment else {
            return Lookup::Unknown;
        };
        if name == "default" {
            return Lookup::Unknown;
        }
        match summary
            .namespace_members
            .get(target)
            .and_then(|members| members.get(name))
        {
            Some(&meaning) => Lookup::Found(Target {
                meaning,
                type_only: false,
            }),
            None => Lookup::Unknown,
        }
    }

    /// Resolve an exported name of `module`
    ///
    /// Entries exporting the same name merge their meanings. `export *` is
    /// consulted only when no direct entry matches, and never for `default`.
    fn resolve_export(&self, module: ModuleRef<'p>, name: &str, visited: &mut Visited) -> Lookup {
        // A cycle contributes nothing
        if !visited.insert(module.visit_key(name)) {
            return Lookup::Missing;
        }
        let Some(summary) = module.summary else {
            return Lookup::Unknown;
        };
        if let Some(assignment) = &summary.export_equals {
            return self.resolve_export_equals(summary, assignment, name);
        }

        let mut found: Option<Target> = None;
        let mut unknown = false;
        for entry in summary.exports.iter().filter(|entry| entry.name == name) {
            let lookup = match &entry.target {
                ExportTarget::Declared(meaning) => Lookup::Found(Target {
                    meaning: *meaning,
                    type_only: false,
                }),
                ExportTarget::Local(local) => self.resolve_local(module, local, visited),
                ExportTarget::Remote { source, name } => match self.module(module, source) {
                    Some(target) => self.resolve_export(target, name, visited),
                    None => Lookup::Unknown,
                },
                ExportTarget::Namespace { source } => match self.module(module, source) {
                    Some(_) => Lookup::Found(Target {
                        meaning: Meaning::BOTH,
                        type_only: false,
                    }),
                    None => Lookup::Unknown,
                },
            };
            match lookup.through_type_only(entry.type_only) {
                Lookup::Found(target) => {
                    found = Some(match found {
                        Some(previous) => Target {
                            meaning: previous.meaning | target.meaning,
                            type_only: previous.type_only && target.type_only,
                        },
                        None => target,
                    });
                }
                Lookup::Unknown => unknown = true,
                Lookup::Missing => {}
            }
        }
        if let Some(target) = found {
            return Lookup::Found(target);
        }
        if unknown {
            return Lookup::Unknown;
        }

        if name != "default" {
            for star in &summary.star_exports {
                let Some(target) = self.module(module, &star.source) else {
                    unknown = true;
                    continue;
                };
                match self.resolve_export(target, name, visited) {
                    Lookup::Found(found) => {
                        return Lookup::Found(found.through_type_only(star.type_only));
                    }
                    Lookup::Unknown => unknown = true,
                    Lookup::Missing => {}
                }
            }
        }

        // CommonJS exports are invisible to the summary
        if unknown || module.file.kind.is_javascript() {
            Lookup::Unknown
        } else {
            Lookup::Missing
        }
    }
}

/// Code and message for an import of a name the module does not export
fn missing_export(source: &str, imported: &Imported) -> (u32, String) {
    match imported {
        Imported::Default => (
            NO_DEFAULT_EXPORT,
            format!("Module '\"{}\"' has no default export.", source),
        ),
        Imported::Named(name) => (
            NO_EXPORTED_MEMBER,
            format!("Module '\"{}\"' has no exported member '{}'.", source, name),
        ),
        Imported::Namespace => (
            NO_EXPORTED_MEMBER,
            format!("Module '\"{}\"' has no exported member '*'.", source),
        ),
    }
}
