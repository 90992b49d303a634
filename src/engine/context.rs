//! Execution context and frame stack for the AST interpreter.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::build::order::BuildOrder;
use crate::dsl::version::LanguageVersion;
use crate::engine::construct::{Construct, Module, Root, Schema};
use crate::engine::pattern::PatternCache;

/// Evaluation scope a statement executes under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Root,
    Schema,
    Module,
    Deferred,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Global => "Global",
            Scope::Root => "Root",
            Scope::Schema => "Schema",
            Scope::Module => "Module",
            Scope::Deferred => "Deferred",
        };
        f.write_str(name)
    }
}

/// The construct a frame is bound to, owned by the frame while its body is
/// being interpreted and recovered when the frame pops.
#[derive(Debug)]
pub enum FrameConstruct {
    None,
    Root(Root),
    Module(Module),
}

/// One entry of the lexical nesting stack.
#[derive(Debug)]
pub struct ExecutionFrame {
    pub scope: Scope,
    pub construct: FrameConstruct,
}

/// All state of one interpretation pass over a description file: the
/// constructs declared so far, the frame stack, the include stack, and the
/// pass-local pattern cache.
#[derive(Debug)]
pub struct ExecutionContext {
    pub order: BuildOrder,
    pub filepath: PathBuf,
    pub declared_version: Option<LanguageVersion>,

    pub roots: BTreeMap<String, Root>,
    pub modules: BTreeMap<String, Module>,
    pub schemas: BTreeMap<String, Schema>,

    frames: Vec<ExecutionFrame>,
    include_stack: Vec<PathBuf>,
    pub patterns: PatternCache,
}

impl ExecutionContext {
    pub fn new(filepath: impl Into<PathBuf>, order: BuildOrder) -> Self {
        ExecutionContext {
            order,
            filepath: filepath.into(),
            declared_version: None,
            roots: BTreeMap::new(),
            modules: BTreeMap::new(),
            schemas: BTreeMap::new(),
            frames: vec![ExecutionFrame {
                scope: Scope::Global,
                construct: FrameConstruct::None,
            }],
            include_stack: Vec::new(),
            patterns: PatternCache::new(),
        }
    }

    pub fn push_frame(&mut self, scope: Scope, construct: FrameConstruct) {
        self.frames.push(ExecutionFrame { scope, construct });
    }

    pub fn pop_frame(&mut self) -> ExecutionFrame {
        // The global frame pushed at construction never pops; underflow is a
        // programmer error, not a user error.
        if self.frames.len() <= 1 {
            panic!("execution frame stack underflow");
        }
        self.frames.pop().expect("guarded by the underflow check")
    }

    pub fn frame(&self) -> &ExecutionFrame {
        self.frames.last().expect("frame stack is never empty")
    }

    pub fn scope(&self) -> Scope {
        self.frame().scope
    }

    /// The construct the current frame is bound to, if any.
    pub fn current_construct(&self) -> Option<&Construct> {
        match &self.frame().construct {
            FrameConstruct::None => None,
            FrameConstruct::Root(r) => Some(&r.construct),
            FrameConstruct::Module(m) => Some(&m.construct),
        }
    }

    pub fn current_construct_mut(&mut self) -> Option<&mut Construct> {
        match &mut self
            .frames
            .last_mut()
            .expect("frame stack is never empty")
            .construct
        {
            FrameConstruct::None => None,
            FrameConstruct::Root(r) => Some(&mut r.construct),
            FrameConstruct::Module(m) => Some(&mut m.construct),
        }
    }

    pub fn include_stack(&self) -> &[PathBuf] {
        &self.include_stack
    }

    pub fn push_include(&mut self, path: PathBuf) {
        self.include_stack.push(path);
    }

    pub fn pop_include(&mut self) {
        self.include_stack.pop();
    }
}
