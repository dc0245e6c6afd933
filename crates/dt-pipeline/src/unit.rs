use std::rc::Rc;

use dt_core::expr::ExprGroup;
use dt_core::runtime::Program;
use dt_core::{ItemArena, VarBinding, VarId};
use dt_emit::Aggregator;

/// Everything the parsing layer hands over for one package.
pub struct CompilationUnit {
    pub name: String,
    pub arena: ItemArena,
    pub groups: Vec<Rc<dyn ExprGroup>>,
    pub vars: Vec<(VarId, VarBinding)>,
    pub program: Program,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arena: ItemArena::new(),
            groups: Vec::new(),
            vars: Vec::new(),
            program: Program::default(),
        }
    }

    pub fn with_group(mut self, group: Rc<dyn ExprGroup>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_var(mut self, var: VarId, binding: VarBinding) -> Self {
        self.vars.push((var, binding));
        self
    }

    pub fn with_program(mut self, program: Program) -> Self {
        self.program = program;
        self
    }
}

/// Program with every comptime reference replaced by a settled item.
#[derive(Debug)]
pub struct ResolvedUnit {
    pub name: String,
    pub arena: ItemArena,
    pub program: Program,
}

#[derive(Debug)]
pub struct AggregatedUnit {
    pub name: String,
    pub arena: ItemArena,
    pub program: Program,
    pub aggregator: Aggregator,
}
