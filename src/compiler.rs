//! Compiler driver
//!
//! Holds the binder name and the table of builders marked functions may
//! name, and runs transform plus emit for one function or a whole program.

use crate::builder::{Builder, SyncBuilder};
use crate::config::{Settings, DEFAULT_BINDER, DEFAULT_BUILDER_ROOT};
use crate::emit::{CompiledFunction, SourceEmitter};
use crate::error::CompileError;
use crate::runtime::AsyncBuilder;
use crate::syntax::visit::{walk_function, Visitor};
use crate::syntax::{Function, Printer, Program, Stmt};
use crate::transform::{self, NodeRef};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/* ===================== Builder table ===================== */

/// Builders by name, in registration order
#[derive(Clone, Default)]
pub struct BuilderTable {
    builders: IndexMap<String, Rc<dyn Builder>>,
}

impl BuilderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The async and sync builders
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(Rc::new(AsyncBuilder));
        table.register(Rc::new(SyncBuilder));
        table
    }

    /// Register `builder` under its own name, returning the one it replaces
    pub fn register(&mut self, builder: Rc<dyn Builder>) -> Option<Rc<dyn Builder>> {
        self.builders.insert(builder.name().to_string(), builder)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn Builder>> {
        self.builders.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }
}

impl fmt::Debug for BuilderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/* ===================== Configuration ===================== */

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Identifier whose calls are bind points
    pub binder: String,
    /// Expression emitted source resolves builders from
    pub builder_root: String,
    pub builders: BuilderTable,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            binder: DEFAULT_BINDER.to_string(),
            builder_root: DEFAULT_BUILDER_ROOT.to_string(),
            builders: BuilderTable::with_defaults(),
        }
    }
}

impl CompilerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            binder: settings.compiler.binder.clone(),
            builder_root: settings.compiler.builder_root.clone(),
            builders: BuilderTable::with_defaults(),
        }
    }
}

/* ===================== Compiler ===================== */

#[derive(Debug, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(CompilerConfig::from_settings(settings))
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Transform a function body with the configured binder
    pub fn transform(&self, body: &[Stmt]) -> Result<NodeRef, CompileError> {
        transform::transform(body, &self.config.binder)
    }

    fn builder_for<'f>(
        &self,
        function: &'f Function,
    ) -> Result<(&'f str, Rc<dyn Builder>), CompileError> {
        let name = function.compile.as_deref().ok_or(CompileError::NotCompiled)?;
        let builder = self
            .config
            .builders
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownBuilder {
                name: name.to_string(),
            })?;
        Ok((name, builder))
    }

    /// Compile a marked function into an in-memory callable
    pub fn compile_function(&self, function: &Function) -> Result<Rc<CompiledFunction>, CompileError> {
        let (name, builder) = self.builder_for(function)?;
        let root = self.transform(&function.body)?;
        debug!(
            function = function.id.as_deref().unwrap_or("<anonymous>"),
            builder = name,
            root = %root,
            "compiled function"
        );
        Ok(Rc::new(CompiledFunction::new(function, root, builder)))
    }

    /// Emit the compiled source text of a marked function. With `source`,
    /// unchanged fragments are re-sliced from it.
    pub fn emit_function(&self, function: &Function, source: Option<&str>) -> Result<String, CompileError> {
        Emission::new(self, source).function(function, 0)
    }

    /// Compile every marked function in `program`, returning how many there were
    pub fn check_program(&self, program: &Program) -> Result<usize, CompileError> {
        struct Marked<'ast> {
            functions: Vec<&'ast Function>,
        }

        impl<'ast> Visitor<'ast> for Marked<'ast> {
            fn visit_function(&mut self, function: &'ast Function) {
                if function.compile.is_some() {
                    self.functions.push(function);
                }
                walk_function(self, function);
            }
        }

        let mut marked = Marked {
            functions: Vec::new(),
        };
        for stmt in &program.body {
            marked.visit_stmt(stmt);
        }
        for function in &marked.functions {
            self.compile_function(function)?;
        }
        Ok(marked.functions.len())
    }

    /// Print `program` with every marked function replaced by its compiled form
    pub fn emit_program(&self, program: &Program, source: Option<&str>) -> Result<String, CompileError> {
        let emission = Emission::new(self, source);
        let hook = |function: &Function, indent: usize| emission.hook(function, indent);
        let mut printer = Printer::new().with_functions(&hook);
        printer.statements(&program.body);
        let text = printer.finish();
        match emission.error.take() {
            Some(error) => Err(error),
            None => Ok(text),
        }
    }
}

/// One source emission run; numbers builder variables and keeps the first
/// error a nested function hit
struct Emission<'c> {
    compiler: &'c Compiler,
    source: Option<&'c str>,
    next_id: Cell<usize>,
    error: RefCell<Option<CompileError>>,
}

impl<'c> Emission<'c> {
    fn new(compiler: &'c Compiler, source: Option<&'c str>) -> Self {
        Self {
            compiler,
            source,
            next_id: Cell::new(0),
            error: RefCell::new(None),
        }
    }

    fn function(&self, function: &Function, indent: usize) -> Result<String, CompileError> {
        let (name, _) = self.compiler.builder_for(function)?;
        let root = self.compiler.transform(&function.body)?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let hook = |nested: &Function, indent: usize| self.hook(nested, indent);
        let text = SourceEmitter::new(&self.compiler.config.builder_root, name, id)
            .with_source(self.source)
            .with_functions(&hook)
            .with_indent(indent)
            .emit(function, &root);
        match self.error.borrow().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(text),
        }
    }

    fn hook(&self, function: &Function, indent: usize) -> Option<String> {
        match self.function(function, indent) {
            Ok(text) => Some(text),
            Err(error) => {
                self.error.borrow_mut().get_or_insert(error);
                None
            }
        }
    }
}
