use dt_core::diagnostics::Diagnostic;
use dt_core::item::validate_known_items;
use dt_core::{info, CompContext, Error, Item, ItemArena, Resolution, Result};
use dt_emit::{emit_modules, Aggregator, EmitOptions, EmittedModules};

use crate::config::PipelineOptions;
use crate::error::{PipelineDiagnostics, PipelineError};
use crate::pipeline::{PipelineBuilder, PipelineStage};
use crate::unit::{AggregatedUnit, CompilationUnit, ResolvedUnit};

const STAGE_RESOLVE: &str = "resolve";
const STAGE_AGGREGATE: &str = "aggregate";
const STAGE_EMIT: &str = "emit";

/// Compile one unit into its primary and companion modules. Nothing is produced on failure.
pub fn compile(
    unit: CompilationUnit,
    options: &PipelineOptions,
) -> std::result::Result<EmittedModules, PipelineError> {
    let pipeline = PipelineBuilder::new()
        .add_stage(ResolveStage)
        .add_stage(AggregateStage)
        .add_stage(EmitStage {
            options: options.emit.clone(),
        })
        .build();
    let mut diagnostics = PipelineDiagnostics::default();
    pipeline.run(unit, &mut diagnostics, options)
}

fn stage_error(
    stage: &'static str,
    err: Error,
    diagnostics: &mut PipelineDiagnostics,
) -> PipelineError {
    diagnostics.push(Diagnostic::from(&err));
    PipelineError::from_core(stage, &err)
}

/// Runs the comptime fixed point, lowers the program and settles every placeholder.
pub struct ResolveStage;

impl ResolveStage {
    fn resolve(&self, unit: CompilationUnit, diagnostics: &mut PipelineDiagnostics) -> Result<ResolvedUnit> {
        let CompilationUnit {
            name,
            mut arena,
            groups,
            vars,
            mut program,
        } = unit;
        let mut ctx = CompContext::new();
        for group in groups {
            ctx.add_group(group);
        }
        for (var, binding) in vars {
            ctx.declare_var(var, binding);
        }
        let sweeps = ctx.resolve_all(&mut arena)?;
        program.lower_comptime(&ctx)?;

        let mut failure = None;
        program.iterate_nested_items(&mut |item| match ctx.settle(item) {
            Ok(settled) => settled,
            Err(err) => {
                failure.get_or_insert(err);
                None
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
        let mut roots = ctx.slot_items();
        roots.extend(program.items());
        let installed = ctx.install_resolved_items(&mut arena, &roots)?;

        check_known(&arena, &program.items())?;
        diagnostics.push(Diagnostic::info(format!(
            "{}: resolved in {} sweeps, {} placeholders installed",
            name, sweeps, installed
        )));
        info!("{}: resolved in {} sweeps", name, sweeps);
        Ok(ResolvedUnit {
            name,
            arena,
            program,
        })
    }
}

impl PipelineStage for ResolveStage {
    type SrcCtx = CompilationUnit;
    type DstCtx = ResolvedUnit;

    fn name(&self) -> &'static str {
        STAGE_RESOLVE
    }

    fn run(
        &self,
        context: CompilationUnit,
        diagnostics: &mut PipelineDiagnostics,
    ) -> std::result::Result<ResolvedUnit, PipelineError> {
        self.resolve(context, diagnostics)
            .map_err(|err| stage_error(STAGE_RESOLVE, err, diagnostics))
    }
}

/// Every item the program reaches must be known by now.
fn check_known(arena: &ItemArena, roots: &[Item]) -> Result<()> {
    let mut items = roots.to_vec();
    for r in arena.reachable(roots) {
        items.extend(arena.nests(r).into_iter().map(|nest| nest.child));
    }
    match validate_known_items(&items)? {
        Resolution::Resolved(()) => Ok(()),
        Resolution::Pending => {
            let stuck = items
                .iter()
                .find(|item| item.is_unknown())
                .map(ToString::to_string)
                .unwrap_or_default();
            Err(Error::unknown_item(format!("{} never resolved", stuck)))
        }
    }
}

/// Assigns identities to every composite the program reaches.
pub struct AggregateStage;

impl PipelineStage for AggregateStage {
    type SrcCtx = ResolvedUnit;
    type DstCtx = AggregatedUnit;

    fn name(&self) -> &'static str {
        STAGE_AGGREGATE
    }

    fn run(
        &self,
        context: ResolvedUnit,
        diagnostics: &mut PipelineDiagnostics,
    ) -> std::result::Result<AggregatedUnit, PipelineError> {
        let ResolvedUnit {
            name,
            arena,
            program,
        } = context;
        let mut aggregator = Aggregator::new();
        for item in program.items() {
            aggregator.add_root(&arena, &item);
        }
        let tracked = aggregator.compute_closure(&arena);
        diagnostics.push(Diagnostic::info(format!("{}: {} tracked items", name, tracked)));
        info!("{}: aggregated {} tracked items", name, tracked);
        Ok(AggregatedUnit {
            name,
            arena,
            program,
            aggregator,
        })
    }
}

/// Renders the primary and companion modules.
pub struct EmitStage {
    pub options: EmitOptions,
}

impl PipelineStage for EmitStage {
    type SrcCtx = AggregatedUnit;
    type DstCtx = EmittedModules;

    fn name(&self) -> &'static str {
        STAGE_EMIT
    }

    fn run(
        &self,
        context: AggregatedUnit,
        diagnostics: &mut PipelineDiagnostics,
    ) -> std::result::Result<EmittedModules, PipelineError> {
        let modules = emit_modules(
            &context.program,
            &context.arena,
            &context.aggregator,
            &self.options,
        )
        .map_err(|err| stage_error(STAGE_EMIT, err, diagnostics))?;
        if modules.patch_count > 0 {
            diagnostics.push(Diagnostic::info(format!(
                "{}: {} cyclic references patched after declaration",
                context.name, modules.patch_count
            )));
        }
        info!(
            "{}: emitted {} and {}",
            context.name, modules.primary_file, modules.support_file
        );
        Ok(modules)
    }
}
