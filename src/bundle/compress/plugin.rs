//! Built-in in-process compressors.
//!
//! | Name                | Types     | Engine                                  |
//! |---------------------|-----------|-----------------------------------------|
//! | `minify`            | js, css   | oxc (default compress) / lightningcss   |
//! | `optimize`          | js        | oxc (smallest compress)                 |
//! | `optimize-advanced` | js        | oxc (smallest + top-level mangling)     |

use std::fs;
use std::path::PathBuf;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::ast::ast::{Program, Statement};
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use rustc_hash::FxHashSet;

use crate::bundle::BundleError;

/// A named in-process compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plugin {
    /// JS and CSS minifier.
    Minify,
    /// JS-only optimizing compiler.
    Optimize,
    /// JS-only optimizing compiler that also renames top-level bindings,
    /// keeping names declared in the extern files.
    OptimizeAdvanced,
}

impl Plugin {
    /// Look up a plugin by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "minify" => Some(Self::Minify),
            "optimize" => Some(Self::Optimize),
            "optimize-advanced" => Some(Self::OptimizeAdvanced),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Minify => "minify",
            Self::Optimize => "optimize",
            Self::OptimizeAdvanced => "optimize-advanced",
        }
    }

    /// Whether this plugin transforms content of `kind`.
    pub fn supports(self, kind: &str) -> bool {
        match self {
            Self::Minify => matches!(kind, "js" | "css"),
            Self::Optimize | Self::OptimizeAdvanced => kind == "js",
        }
    }

    /// Transform `input`, or return it unchanged for unsupported types.
    pub fn apply(
        self,
        input: &[u8],
        kind: &str,
        externs: &[PathBuf],
    ) -> Result<Vec<u8>, BundleError> {
        if !self.supports(kind) {
            return Ok(input.to_vec());
        }

        let source = std::str::from_utf8(input).map_err(|e| self.error(e))?;
        let output = match (self, kind) {
            (Self::Minify, "css") => minify_css(source).map_err(|e| self.error(e))?,
            (Self::Minify, _) => minify_js(source, CompressOptions::default(), false)
                .map_err(|e| self.error(e))?,
            (Self::Optimize, _) => minify_js(source, CompressOptions::smallest(), false)
                .map_err(|e| self.error(e))?,
            (Self::OptimizeAdvanced, _) => {
                let top_level = mangle_top_level(source, externs)?;
                minify_js(source, CompressOptions::smallest(), top_level)
                    .map_err(|e| self.error(e))?
            }
        };
        Ok(output.into_bytes())
    }

    fn error(self, message: impl ToString) -> BundleError {
        BundleError::Plugin {
            plugin: self.name(),
            message: message.to_string(),
        }
    }
}

/// Parse, compress, mangle and print a script.
fn minify_js(source: &str, compress: CompressOptions, top_level: bool) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(top_level),
            ..MangleOptions::default()
        }),
        compress: Some(compress),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Top-level bindings may be renamed only when none of them is declared
/// by an extern file.
fn mangle_top_level(source: &str, externs: &[PathBuf]) -> Result<bool, BundleError> {
    let reserved = extern_names(externs)?;
    let declared = declared_names(source).map_err(|e| Plugin::OptimizeAdvanced.error(e))?;
    Ok(declared.is_disjoint(&reserved))
}

/// Names declared at the top level of every extern file.
fn extern_names(externs: &[PathBuf]) -> Result<FxHashSet<String>, BundleError> {
    let mut names = FxHashSet::default();
    for path in externs {
        let source = fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?;
        let declared = declared_names(&source).map_err(|message| BundleError::Plugin {
            plugin: Plugin::OptimizeAdvanced.name(),
            message: format!("{}: {}", path.display(), message),
        })?;
        names.extend(declared);
    }
    Ok(names)
}

/// Top-level binding names declared by a script.
fn declared_names(source: &str) -> Result<FxHashSet<String>, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    Ok(collect_declared(&ret.program))
}

fn collect_declared(program: &Program<'_>) -> FxHashSet<String> {
    let mut names = FxHashSet::default();
    for statement in &program.body {
        match statement {
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    for ident in declarator.id.get_binding_identifiers() {
                        names.insert(ident.name.to_string());
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    names.insert(id.name.to_string());
                }
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    names.insert(id.name.to_string());
                }
            }
            _ => {}
        }
    }
    names
}
