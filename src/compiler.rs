//! The compiler adapter: resolved configuration in, diagnostics out.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::checker::Checker;
use crate::config::{CompilerOptions, ResolvedConfig};
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::program::Program;
use crate::resolve::ModuleResolver;

/// Anything that can turn a resolved configuration into diagnostics
///
/// Implementations must return the complete pre-emit diagnostic set, sorted
/// by file path and offset, so repeated runs on the same input agree.
pub trait Compiler {
    fn compile(&self, config: &ResolvedConfig) -> Result<Vec<Diagnostic>>;
}

/// Options every compilation runs with, whatever the configuration says
pub fn forced_options(options: &CompilerOptions) -> CompilerOptions {
    let mut forced = options.clone();
    forced.insert("skipLibCheck".to_string(), Value::Bool(true));
    forced.insert("module".to_string(), Value::String("preserve".to_string()));
    forced.insert("verbatimModuleSyntax".to_string(), Value::Bool(true));
    forced
}

/// Checks the project in-process with the built-in parser and checker
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCompiler;

impl Compiler for NativeCompiler {
    fn compile(&self, config: &ResolvedConfig) -> Result<Vec<Diagnostic>> {
        let options = forced_options(&config.options);
        let config_dir = config.config_path.parent().unwrap_or_else(|| Path::new("/"));
        let mut roots = config.root_file_names.clone();
        roots.extend(ModuleResolver::new(&options).automatic_type_packages(config_dir));

        let program = Program::load(&roots, &options)?;
        let diagnostics = Checker::new(&program, &options).check();

        info!(
            roots = config.root_file_names.len(),
            files = program.files().len(),
            diagnostics = diagnostics.len(),
            "compiled"
        );
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{TYPE_ONLY_IMPORT, TYPE_ONLY_REEXPORT};
    use serde_json::json;
    use std::fs;

    #[test]
    fn forced_options_override_configuration() {
        let options = json!({
            "verbatimModuleSyntax": false,
            "module": "commonjs",
            "strict": true
        });
        let forced = forced_options(options.as_object().unwrap());
        assert_eq!(forced["verbatimModuleSyntax"], json!(true));
        assert_eq!(forced["skipLibCheck"], json!(true));
        assert_eq!(forced["module"], json!("preserve"));
        assert_eq!(forced["strict"], json!(true));
    }

    #[test]
    fn compiles_with_verbatim_module_syntax_forced_on() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.ts");
        let file = dir.path().join("file.ts");
        fs::write(&index, "import { a } from './file';\nexport { a };").unwrap();
        fs::write(&file, "export type a = 1;").unwrap();

        let config = ResolvedConfig {
            config_path: dir.path().join("tsconfig.json"),
            options: json!({ "verbatimModuleSyntax": false }).as_object().unwrap().clone(),
            root_file_names: vec![index, file],
        };
        let codes: Vec<u32> = NativeCompiler
            .compile(&config)
            .unwrap()
            .iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, vec![TYPE_ONLY_IMPORT, TYPE_ONLY_REEXPORT]);
    }

    #[test]
    fn ambient_modules_resolve_bare_specifiers() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.ts");
        fs::write(
            &index,
            "import { IncomingMessage, createServer } from 'http';\nimport { Stats } from 'node:fs';",
        )
        .unwrap();
        let types = dir.path().join("node_modules/@types/node");
        fs::create_dir_all(&types).unwrap();
        fs::write(types.join("index.d.ts"), "").unwrap();
        fs::write(
            types.join("http.d.ts"),
            "declare module 'http' {\n\
                 interface IncomingMessage {}\n\
                 function createServer(): void;\n\
             }\n\
             declare module 'node:fs' { export class Stats {} }",
        )
        .unwrap();

        let config = ResolvedConfig {
            config_path: dir.path().join("tsconfig.json"),
            options: CompilerOptions::new(),
            root_file_names: vec![index, types.join("http.d.ts")],
        };
        let found: Vec<(u32, String)> = NativeCompiler
            .compile(&config)
            .unwrap()
            .iter()
            .map(|d| (d.code, d.span_text().to_string()))
            .collect();
        assert_eq!(found, vec![(TYPE_ONLY_IMPORT, "IncomingMessage".to_string())]);
    }

    #[test]
    fn type_packages_are_loaded_without_imports() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.ts");
        fs::write(&index, "import { IncomingMessage } from 'http';").unwrap();
        let types = dir.path().join("node_modules/@types/node");
        fs::create_dir_all(&types).unwrap();
        fs::write(
            types.join("index.d.ts"),
            "declare module 'http' { export interface IncomingMessage {} }",
        )
        .unwrap();

        let config = ResolvedConfig {
            config_path: dir.path().join("tsconfig.json"),
            options: CompilerOptions::new(),
            root_file_names: vec![index],
        };
        let codes: Vec<u32> = NativeCompiler
            .compile(&config)
            .unwrap()
            .iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, vec![TYPE_ONLY_IMPORT]);
    }

    #[test]
    fn empty_root_list_compiles_to_nothing() {
        let config = ResolvedConfig {
            config_path: "/p/tsconfig.json".into(),
            options: CompilerOptions::new(),
            root_file_names: Vec::new(),
        };
        assert!(NativeCompiler.compile(&config).unwrap().is_empty());
    }
}
