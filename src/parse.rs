//! Parsing source files into the import/export summary the checker needs.
//!
//! Only top-level module structure is recorded: what each file declares, what
//! it imports from where, and what it exports under which name.

use std::collections::HashMap;
use std::ops::BitOr;

use swc_core::common::{BytePos, Span as SwcSpan, Spanned};
use swc_core::ecma::ast::{
    Decl, DefaultDecl, EsVersion, ExportSpecifier, Expr, ImportSpecifier, Module, ModuleDecl,
    ModuleExportName, ModuleItem, ObjectPatProp, Pat, Stmt, TsModuleDecl, TsModuleName,
    TsNamespaceBody,
};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{Parser, StringInput};

use crate::language::SourceKind;
use crate::position::Span;

/// swc positions start at 1; 0 is reserved for dummy spans
const BASE: BytePos = BytePos(1);

/// Which namespaces a symbol occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Meaning {
    pub value: bool,
    pub ty: bool,
}

impl Meaning {
    pub const VALUE: Meaning = Meaning { value: true, ty: false };
    pub const TYPE: Meaning = Meaning { value: false, ty: true };
    pub const BOTH: Meaning = Meaning { value: true, ty: true };
}

impl BitOr for Meaning {
    type Output = Meaning;

    fn bitor(self, rhs: Meaning) -> Meaning {
        Meaning {
            value: self.value || rhs.value,
            ty: self.ty || rhs.ty,
        }
    }
}

/// What an import binding pulls in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Imported {
    /// `import { name }` / `import { name as local }`
    Named(String),
    /// `import local from`
    Default,
    /// `import * as local from`
    Namespace,
}

/// One local binding introduced by an import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: Imported,
    pub source: String,
    /// `import type { .. }` or `import { type .. }`
    pub type_only: bool,
    /// The specifier, e.g. `a as b`
    pub span: Span,
}

/// Where an exported name comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Declared in this file with the given meaning
    Declared(Meaning),
    /// `export { local }` / `export default local`
    Local(String),
    /// `export { name } from 'source'`
    Remote { source: String, name: String },
    /// `export * as name from 'source'`
    Namespace { source: String },
}

/// One exported name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub name: String,
    pub target: ExportTarget,
    /// `export type { .. }` or `export { type .. }`
    pub type_only: bool,
    /// Export specifier span; `None` for declarations, which are never flagged
    pub span: Option<Span>,
}

/// `export * from 'source'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarExport {
    pub source: String,
    pub type_only: bool,
}

/// A module specifier string that must resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub source: String,
    /// The string literal, quotes included
    pub span: Span,
}

/// `export = expr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEquals {
    /// `export = Name`
    Name(String),
    /// Any other expression
    Expr,
}

/// `declare module "name" { .. }` in a script file
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientModule {
    /// Module name, possibly a pattern with one `*`
    pub name: String,
    /// `None` for the shorthand `declare module "name";`
    pub body: Option<ModuleSummary>,
}

/// Top-level module structure of one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSummary {
    /// Local declarations by name; merged declarations union their meaning
    pub declarations: HashMap<String, Meaning>,
    pub imports: Vec<ImportBinding>,
    pub exports: Vec<ExportEntry>,
    pub star_exports: Vec<StarExport>,
    /// Every specifier to resolve, those inside ambient modules included
    pub requests: Vec<ModuleRequest>,
    pub export_equals: Option<ExportEquals>,
    /// Exported members of each namespace declared at this level, merged
    /// across declarations
    pub namespace_members: HashMap<String, HashMap<String, Meaning>>,
    pub ambient_modules: Vec<AmbientModule>,
}

/// A syntax error reported by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub span: Span,
    pub message: String,
}

/// Outcome of parsing one file
#[derive(Debug)]
pub struct ParsedModule {
    /// `None` when the parser could not recover
    pub summary: Option<ModuleSummary>,
    pub issues: Vec<ParseIssue>,
}

fn to_span(span: SwcSpan, text_len: usize) -> Span {
    let start = (span.lo.0.saturating_sub(BASE.0) as usize).min(text_len);
    let end = (span.hi.0.saturating_sub(BASE.0) as usize).clamp(start, text_len);
    Span::new(start, end - start)
}

fn issue(err: swc_core::ecma::parser::error::Error, text_len: usize) -> ParseIssue {
    ParseIssue {
        span: to_span(err.span(), text_len),
        message: err.kind().msg().into_owned(),
    }
}

/// Parse a file and summarize its module structure
///
/// # Arguments
/// * `text` - Full file contents
/// * `kind` - Decides TypeScript/JSX/declaration parsing
///
/// # Returns
/// * `ParsedModule` with the summary (if parsing succeeded) and every
///   syntax error, recoverable ones included
pub fn parse_module(text: &str, kind: SourceKind) -> ParsedModule {
    let end = BytePos(BASE.0 + text.len() as u32);
    let lexer = Lexer::new(
        kind.syntax(),
        EsVersion::EsNext,
        StringInput::new(text, BASE, end),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let result = parser.parse_module();
    let mut issues: Vec<ParseIssue> = parser
        .take_errors()
        .into_iter()
        .map(|err| issue(err, text.len()))
        .collect();

    match result {
        Ok(module) => ParsedModule {
            summary: Some(summarize(&module, text.len(), kind.is_declaration())),
            issues,
        },
        Err(err) => {
            issues.push(issue(err, text.len()));
            ParsedModule {
                summary: None,
                issues,
            }
        }
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

/// Names bound by a (possibly destructuring) variable pattern
fn pattern_names(pat: &Pat, names: &mut Vec<String>) {
    match pat {
        Pat::Ident(binding) => names.push(binding.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pattern_names(elem, names);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pattern_names(&kv.value, names),
                    ObjectPatProp::Assign(assign) => names.push(assign.key.sym.to_string()),
                    ObjectPatProp::Rest(rest) => pattern_names(&rest.arg, names),
                }
            }
        }
        Pat::Rest(rest) => pattern_names(&rest.arg, names),
        Pat::Assign(assign) => pattern_names(&assign.left, names),
        _ => {}
    }
}

/// Whether a namespace body creates a runtime value
fn namespace_is_instantiated(body: Option<&TsNamespaceBody>) -> bool {
    match body {
        None => false,
        Some(TsNamespaceBody::TsNamespaceDecl(inner)) => {
            namespace_is_instantiated(Some(&*inner.body))
        }
        Some(TsNamespaceBody::TsModuleBlock(block)) => block.body.iter().any(|item| match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl_is_instantiated(decl),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                decl_is_instantiated(&export.decl)
            }
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => !import.type_only,
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => !named.type_only,
            _ => true,
        }),
    }
}

fn decl_is_instantiated(decl: &Decl) -> bool {
    match decl {
        Decl::TsInterface(_) | Decl::TsTypeAlias(_) => false,
        Decl::TsModule(module) => namespace_is_instantiated(module.body.as_ref()),
        _ => true,
    }
}

fn namespace_meaning(module: &TsModuleDecl) -> Meaning {
    if namespace_is_instantiated(module.body.as_ref()) {
        Meaning::BOTH
    } else {
        Meaning::TYPE
    }
}

fn merge_meaning(names: &mut HashMap<String, Meaning>, name: String, meaning: Meaning) {
    let entry = names.entry(name).or_default();
    *entry = *entry | meaning;
}

/// Exported members of a namespace body
///
/// In an ambient body every declaration counts as exported.
fn collect_namespace_members(
    body: Option<&TsNamespaceBody>,
    ambient: bool,
    members: &mut HashMap<String, Meaning>,
) {
    match body {
        None => {}
        // `namespace A.B { .. }` exports `B` from `A`
        Some(TsNamespaceBody::TsNamespaceDecl(inner)) => {
            let meaning = if namespace_is_instantiated(Some(&*inner.body)) {
                Meaning::BOTH
            } else {
                Meaning::TYPE
            };
            merge_meaning(members, inner.id.sym.to_string(), meaning);
        }
        Some(TsNamespaceBody::TsModuleBlock(block)) => {
            for item in &block.body {
                let decl = match item {
                    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
                    ModuleItem::Stmt(Stmt::Decl(decl)) if ambient => decl,
                    _ => continue,
                };
                for (name, meaning) in declared_names(decl) {
                    merge_meaning(members, name, meaning);
                }
            }
        }
    }
}

/// Names and meanings a declaration binds at module scope
fn declared_names(decl: &Decl) -> Vec<(String, Meaning)> {
    match decl {
        Decl::Class(class) => vec![(class.ident.sym.to_string(), Meaning::BOTH)],
        Decl::Fn(func) => vec![(func.ident.sym.to_string(), Meaning::VALUE)],
        Decl::Var(var) => {
            let mut names = Vec::new();
            for declarator in &var.decls {
                pattern_names(&declarator.name, &mut names);
            }
            names.into_iter().map(|name| (name, Meaning::VALUE)).collect()
        }
        Decl::TsInterface(interface) => vec![(interface.id.sym.to_string(), Meaning::TYPE)],
        Decl::TsTypeAlias(alias) => vec![(alias.id.sym.to_string(), Meaning::TYPE)],
        Decl::TsEnum(enumeration) => vec![(enumeration.id.sym.to_string(), Meaning::BOTH)],
        Decl::TsModule(module) => match &module.id {
            TsModuleName::Ident(ident) if !module.global => {
                vec![(ident.sym.to_string(), namespace_meaning(module))]
            }
            // `declare module "x"` and `declare global` bind nothing locally
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

struct Summarizer {
    summary: ModuleSummary,
    text_len: usize,
    /// Declaration file or `declare module` body
    ambient: bool,
    /// Inside a `declare module` body, where declarations export themselves
    implicit_exports: bool,
    /// Top level of a file without imports or exports
    script: bool,
}

impl Summarizer {
    fn new(text_len: usize, ambient: bool) -> Self {
        Summarizer {
            summary: ModuleSummary::default(),
            text_len,
            ambient,
            implicit_exports: false,
            script: false,
        }
    }

    fn span(&self, span: SwcSpan) -> Span {
        to_span(span, self.text_len)
    }

    fn declare(&mut self, name: String, meaning: Meaning) {
        merge_meaning(&mut self.summary.declarations, name, meaning);
    }

    fn item(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::ModuleDecl(decl) => self.module_decl(decl),
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.local_decl(decl),
            ModuleItem::Stmt(_) => {}
        }
    }

    fn local_decl(&mut self, decl: &Decl) {
        if let Decl::TsModule(module) = decl {
            if let TsModuleName::Str(name) = &module.id {
                // In a module file this is an augmentation, not a declaration
                if self.script {
                    self.ambient_module(name.value.to_string(), module);
                }
                return;
            }
            self.namespace(module);
        }
        for (name, meaning) in declared_names(decl) {
            self.declare(name.clone(), meaning);
            if self.implicit_exports {
                self.export(name, ExportTarget::Declared(meaning), false, None);
            }
        }
    }

    fn namespace(&mut self, module: &TsModuleDecl) {
        let TsModuleName::Ident(ident) = &module.id else {
            return;
        };
        if module.global {
            return;
        }
        let ambient = self.ambient || module.declare;
        let members = self
            .summary
            .namespace_members
            .entry(ident.sym.to_string())
            .or_default();
        collect_namespace_members(module.body.as_ref(), ambient, members);
    }

    fn ambient_module(&mut self, name: String, module: &TsModuleDecl) {
        let body = match &module.body {
            Some(TsNamespaceBody::TsModuleBlock(block)) => {
                let mut inner = Summarizer::new(self.text_len, true);
                inner.implicit_exports = true;
                for item in &block.body {
                    inner.item(item);
                }
                self.summary
                    .requests
                    .extend(inner.summary.requests.iter().cloned());
                Some(inner.summary)
            }
            _ => None,
        };
        self.summary.ambient_modules.push(AmbientModule { name, body });
    }

    fn request(&mut self, source: String, span: SwcSpan) {
        let span = self.span(span);
        self.summary.requests.push(ModuleRequest { source, span });
    }

    fn export(&mut self, name: String, target: ExportTarget, type_only: bool, span: Option<Span>) {
        self.summary.exports.push(ExportEntry {
            name,
            target,
            type_only,
            span,
        });
    }

    fn module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::Import(import) => {
                let source = import.src.value.to_string();
                if import.specifiers.is_empty() {
                    // Side-effect imports are never required to resolve
                    return;
                }
                self.request(source.clone(), import.src.span);
                for specifier in &import.specifiers {
                    let (local, imported, type_only, span) = match specifier {
                        ImportSpecifier::Named(named) => {
                            let imported = named
                                .imported
                                .as_ref()
                                .map(export_name)
                                .unwrap_or_else(|| named.local.sym.to_string());
                            (
                                named.local.sym.to_string(),
                                Imported::Named(imported),
                                named.is_type_only,
                                named.span,
                            )
                        }
                        ImportSpecifier::Default(default) => (
                            default.local.sym.to_string(),
                            Imported::Default,
                            false,
                            default.span,
                        ),
                        ImportSpecifier::Namespace(namespace) => (
                            namespace.local.sym.to_string(),
                            Imported::Namespace,
                            false,
                            namespace.span,
                        ),
                    };
                    let span = self.span(span);
                    self.summary.imports.push(ImportBinding {
                        local,
                        imported,
                        source: source.clone(),
                        type_only: import.type_only || type_only,
                        span,
                    });
                }
            }
            ModuleDecl::ExportDecl(export) => {
                if let Decl::TsModule(module) = &export.decl {
                    self.namespace(module);
                }
                for (name, meaning) in declared_names(&export.decl) {
                    self.declare(name.clone(), meaning);
                    self.export(name, ExportTarget::Declared(meaning), false, None);
                }
            }
            ModuleDecl::ExportNamed(named) => {
                let source = named.src.as_ref().map(|src| src.value.to_string());
                if let Some(src) = &named.src {
                    self.request(src.value.to_string(), src.span);
                }
                for specifier in &named.specifiers {
                    match specifier {
                        ExportSpecifier::Named(spec) => {
                            let orig = export_name(&spec.orig);
                            let exported = spec.exported.as_ref().map(export_name).unwrap_or_else(|| orig.clone());
                            let target = match &source {
                                Some(source) => ExportTarget::Remote {
                                    source: source.clone(),
                                    name: orig,
                                },
                                None => ExportTarget::Local(orig),
                            };
                            let span = Some(self.span(spec.span));
                            self.export(exported, target, named.type_only || spec.is_type_only, span);
                        }
                        ExportSpecifier::Namespace(spec) => {
                            if let Some(source) = &source {
                                self.export(
                                    export_name(&spec.name),
                                    ExportTarget::Namespace { source: source.clone() },
                                    named.type_only,
                                    None,
                                );
                            }
                        }
                        ExportSpecifier::Default(spec) => {
                            if let Some(source) = &source {
                                self.export(
                                    spec.exported.sym.to_string(),
                                    ExportTarget::Remote {
                                        source: source.clone(),
                                        name: "default".to_string(),
                                    },
                                    named.type_only,
                                    None,
                                );
                            }
                        }
                    }
                }
            }
            ModuleDecl::ExportDefaultDecl(default) => {
                let (name, meaning) = match &default.decl {
                    DefaultDecl::Class(class) => (class.ident.as_ref(), Meaning::BOTH),
                    DefaultDecl::Fn(func) => (func.ident.as_ref(), Meaning::VALUE),
                    DefaultDecl::TsInterfaceDecl(interface) => (Some(&interface.id), Meaning::TYPE),
                };
                if let Some(ident) = name {
                    self.declare(ident.sym.to_string(), meaning);
                }
                self.export("default".to_string(), ExportTarget::Declared(meaning), false, None);
            }
            ModuleDecl::ExportDefaultExpr(default) => {
                let target = match &*default.expr {
                    Expr::Ident(ident) => ExportTarget::Local(ident.sym.to_string()),
                    _ => ExportTarget::Declared(Meaning::VALUE),
                };
                self.export("default".to_string(), target, false, None);
            }
            ModuleDecl::ExportAll(all) => {
                self.request(all.src.value.to_string(), all.src.span);
                self.summary.star_exports.push(StarExport {
                    source: all.src.value.to_string(),
                    type_only: all.type_only,
                });
            }
            ModuleDecl::TsImportEquals(import) => {
                let name = import.id.sym.to_string();
                let meaning = if import.is_type_only { Meaning::TYPE } else { Meaning::BOTH };
                self.declare(name.clone(), meaning);
                if import.is_export {
                    self.export(name, ExportTarget::Declared(meaning), false, None);
                }
            }
            ModuleDecl::TsExportAssignment(assignment) => {
                self.summary.export_equals = Some(match &*assignment.expr {
                    Expr::Ident(ident) => ExportEquals::Name(ident.sym.to_string()),
                    _ => ExportEquals::Expr,
                });
            }
            _ => {}
        }
    }
}

/// Walk the top level of a parsed module
fn summarize(module: &Module, text_len: usize, ambient: bool) -> ModuleSummary {
    let mut summarizer = Summarizer::new(text_len, ambient);
    summarizer.script = !module
        .body
        .iter()
        .any(|item| matches!(item, ModuleItem::ModuleDecl(_)));

    for item in &module.body {
        summarizer.item(item);
    }

    summarizer.summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(text: &str) -> ModuleSummary {
        let parsed = parse_module(text, SourceKind::TypeScript);
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
        parsed.summary.unwrap()
    }

    #[test]
    fn import_specifier_spans_are_byte_offsets() {
        let text = "import { a, b as c, type d } from './file';";
        let s = summary(text);

        let spans: Vec<&str> = s
            .imports
            .iter()
            .take(2)
            .map(|i| &text[i.span.start..i.span.end()])
            .collect();
        assert_eq!(spans, vec!["a", "b as c"]);
        assert_eq!(s.imports[1].local, "c");
        assert_eq!(s.imports[1].imported, Imported::Named("b".to_string()));
        assert!(!s.imports[0].type_only);
        assert!(s.imports[2].type_only);
        assert_eq!(s.requests[0].source, "./file");
        assert_eq!(&text[s.requests[0].span.start..s.requests[0].span.end()], "'./file'");
    }

    #[test]
    fn type_only_import_declaration_marks_every_binding() {
        let s = summary("import type Def, { x } from './m';");
        assert!(s.imports.iter().all(|i| i.type_only));
        assert_eq!(s.imports[0].imported, Imported::Default);
    }

    #[test]
    fn declaration_meanings() {
        let s = summary(
            "interface I {}\n\
             type T = 1;\n\
             const { v, w: [x] } = o;\n\
             class C {}\n\
             enum E { A }\n\
             function f() {}\n\
             namespace OnlyTypes { export type X = 1; }\n\
             namespace Runtime { export const y = 1; }\n\
             interface C {}",
        );
        let meaning = |name: &str| s.declarations.get(name).copied();
        assert_eq!(meaning("I"), Some(Meaning::TYPE));
        assert_eq!(meaning("T"), Some(Meaning::TYPE));
        assert_eq!(meaning("v"), Some(Meaning::VALUE));
        assert_eq!(meaning("x"), Some(Meaning::VALUE));
        assert_eq!(meaning("C"), Some(Meaning::BOTH));
        assert_eq!(meaning("E"), Some(Meaning::BOTH));
        assert_eq!(meaning("f"), Some(Meaning::VALUE));
        assert_eq!(meaning("OnlyTypes"), Some(Meaning::TYPE));
        assert_eq!(meaning("Runtime"), Some(Meaning::BOTH));
    }

    #[test]
    fn export_forms() {
        let text = "export type a = 1;\n\
                    export { b, c as d };\n\
                    export type { e } from './e';\n\
                    export * from './all';\n\
                    export * as ns from './ns';\n\
                    export default Foo;";
        let s = summary(text);

        assert_eq!(s.exports[0].name, "a");
        assert_eq!(s.exports[0].target, ExportTarget::Declared(Meaning::TYPE));
        assert_eq!(s.exports[0].span, None);

        assert_eq!(s.exports[2].name, "d");
        assert_eq!(s.exports[2].target, ExportTarget::Local("c".to_string()));
        let span = s.exports[2].span.unwrap();
        assert_eq!(&text[span.start..span.end()], "c as d");

        assert_eq!(
            s.exports[3].target,
            ExportTarget::Remote { source: "./e".to_string(), name: "e".to_string() }
        );
        assert!(s.exports[3].type_only);

        assert_eq!(s.star_exports, vec![StarExport { source: "./all".to_string(), type_only: false }]);
        assert_eq!(s.exports[4].target, ExportTarget::Namespace { source: "./ns".to_string() });
        assert_eq!(s.exports[5].target, ExportTarget::Local("Foo".to_string()));

        let sources: Vec<&str> = s.requests.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["./e", "./all", "./ns"]);
    }

    #[test]
    fn side_effect_imports_are_not_requests() {
        let s = summary("import './polyfill';");
        assert!(s.requests.is_empty());
        assert!(s.imports.is_empty());
    }

    #[test]
    fn syntax_errors_are_reported() {
        let parsed = parse_module("import { from", SourceKind::TypeScript);
        assert!(!parsed.issues.is_empty());
        for issue in &parsed.issues {
            assert!(issue.span.end() <= "import { from".len());
        }
    }

    #[test]
    fn offsets_survive_multibyte_text() {
        let text = "// é\nimport { a } from './a';";
        let s = summary(text);
        let span = s.imports[0].span;
        assert_eq!(&text[span.start..span.end()], "a");
    }

    #[test]
    fn declaration_files_parse() {
        let parsed = parse_module(
            "export declare function f(): void;\nexport interface I {}",
            SourceKind::Declaration,
        );
        let s = parsed.summary.unwrap();
        assert_eq!(s.declarations.get("f"), Some(&Meaning::VALUE));
        assert_eq!(s.declarations.get("I"), Some(&Meaning::TYPE));
        assert_eq!(s.export_equals, None);
    }

    #[test]
    fn export_assignment_records_its_target() {
        let parsed = parse_module("declare const x: number;\nexport = x;", SourceKind::Declaration);
        assert_eq!(parsed.summary.unwrap().export_equals, Some(ExportEquals::Name("x".to_string())));

        let parsed = parse_module("export = { a: 1 };", SourceKind::Declaration);
        assert_eq!(parsed.summary.unwrap().export_equals, Some(ExportEquals::Expr));
    }

    #[test]
    fn namespace_members_of_commonjs_typings() {
        let parsed = parse_module(
            "export = React;\n\
             export as namespace React;\n\
             declare function React(): void;\n\
             declare namespace React {\n\
                 type FC = () => void;\n\
                 interface Props {}\n\
                 function useState(): void;\n\
                 namespace JSX { interface Element {} }\n\
             }\n\
             declare namespace React { const version: string; }",
            SourceKind::Declaration,
        );
        let s = parsed.summary.unwrap();
        let members = &s.namespace_members["React"];
        assert_eq!(members.get("FC"), Some(&Meaning::TYPE));
        assert_eq!(members.get("Props"), Some(&Meaning::TYPE));
        assert_eq!(members.get("useState"), Some(&Meaning::VALUE));
        assert_eq!(members.get("JSX"), Some(&Meaning::TYPE));
        assert_eq!(members.get("version"), Some(&Meaning::VALUE));
        assert_eq!(s.declarations.get("React"), Some(&Meaning::BOTH));
    }

    #[test]
    fn non_ambient_namespaces_list_only_exported_members() {
        let s = summary("namespace N { export type A = 1; type Hidden = 2; }");
        let members = &s.namespace_members["N"];
        assert_eq!(members.get("A"), Some(&Meaning::TYPE));
        assert_eq!(members.get("Hidden"), None);
    }

    #[test]
    fn ambient_modules_in_script_files() {
        let parsed = parse_module(
            "declare module 'http' {\n\
                 import { Emitter } from 'events';\n\
                 interface IncomingMessage {}\n\
                 export function createServer(): void;\n\
             }\n\
             declare module '*.css';",
            SourceKind::Declaration,
        );
        let s = parsed.summary.unwrap();
        assert_eq!(s.ambient_modules.len(), 2);

        let http = &s.ambient_modules[0];
        assert_eq!(http.name, "http");
        let body = http.body.as_ref().unwrap();
        let exported: Vec<(&str, &ExportTarget)> =
            body.exports.iter().map(|e| (e.name.as_str(), &e.target)).collect();
        assert_eq!(
            exported,
            vec![
                ("IncomingMessage", &ExportTarget::Declared(Meaning::TYPE)),
                ("createServer", &ExportTarget::Declared(Meaning::VALUE)),
            ]
        );
        assert_eq!(s.requests[0].source, "events");

        assert_eq!(s.ambient_modules[1], AmbientModule { name: "*.css".to_string(), body: None });
    }

    #[test]
    fn module_augmentations_are_not_ambient_modules() {
        let parsed = parse_module(
            "export {};\ndeclare module 'vue' { interface Props {} }",
            SourceKind::Declaration,
        );
        assert!(parsed.summary.unwrap().ambient_modules.is_empty());
    }
}
