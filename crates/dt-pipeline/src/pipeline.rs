use std::marker::PhantomData;

use crate::config::PipelineOptions;
use crate::error::{PipelineDiagnostics, PipelineError};

/// One step of compilation, consuming the previous stage's context.
pub trait PipelineStage: Send + Sync {
    type SrcCtx;
    type DstCtx;

    fn name(&self) -> &'static str;
    fn run(
        &self,
        context: Self::SrcCtx,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<Self::DstCtx, PipelineError>;
}

pub struct Pipeline<Src, Dst> {
    run: Box<
        dyn Fn(Src, &mut PipelineDiagnostics, &PipelineOptions) -> Result<Dst, PipelineError>
            + Send
            + Sync,
    >,
}

impl<Src, Dst> Pipeline<Src, Dst> {
    pub fn run(
        &self,
        context: Src,
        diagnostics: &mut PipelineDiagnostics,
        options: &PipelineOptions,
    ) -> Result<Dst, PipelineError> {
        (self.run)(context, diagnostics, options)
    }
}

pub struct PipelineBuilder<Src, Dst> {
    pipeline: Pipeline<Src, Dst>,
    _marker: PhantomData<(Src, Dst)>,
}

impl<Src> PipelineBuilder<Src, Src> {
    pub fn new() -> Self {
        let run = |context: Src,
                   _diagnostics: &mut PipelineDiagnostics,
                   _options: &PipelineOptions| Ok(context);
        Self {
            pipeline: Pipeline {
                run: Box::new(run),
            },
            _marker: PhantomData,
        }
    }
}

impl<Src, Mid> PipelineBuilder<Src, Mid> {
    pub fn add_stage<Next, S>(self, stage: S) -> PipelineBuilder<Src, Next>
    where
        S: PipelineStage<SrcCtx = Mid, DstCtx = Next> + 'static,
        Src: 'static,
        Mid: 'static,
        Next: 'static,
    {
        let name = stage.name();
        let previous = self.pipeline.run;
        let run = move |context: Src,
                        diagnostics: &mut PipelineDiagnostics,
                        options: &PipelineOptions| {
            let mid = previous(context, diagnostics, options)?;
            dt_core::info!("stage {} started", name);
            let result = stage.run(mid, diagnostics);
            diagnostics.emit_stage(name, options);
            match result {
                Ok(next) => Ok(next),
                Err(err) if err.stage == name => Err(err),
                Err(err) => Err(PipelineError {
                    stage: name,
                    ..err
                }),
            }
        };

        PipelineBuilder {
            pipeline: Pipeline {
                run: Box::new(run),
            },
            _marker: PhantomData,
        }
    }

    pub fn build(self) -> Pipeline<Src, Mid> {
        self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;
    struct Fail;

    impl PipelineStage for Double {
        type SrcCtx = u32;
        type DstCtx = u64;

        fn name(&self) -> &'static str {
            "double"
        }

        fn run(&self, context: u32, _: &mut PipelineDiagnostics) -> Result<u64, PipelineError> {
            Ok(context as u64 * 2)
        }
    }

    impl PipelineStage for Fail {
        type SrcCtx = u64;
        type DstCtx = u64;

        fn name(&self) -> &'static str {
            "fail"
        }

        fn run(&self, _: u64, _: &mut PipelineDiagnostics) -> Result<u64, PipelineError> {
            Err(PipelineError::new("inner", "boom"))
        }
    }

    #[test]
    fn stages_chain_in_order() {
        let pipeline = PipelineBuilder::new().add_stage(Double).build();
        let mut diagnostics = PipelineDiagnostics::default();
        let out = pipeline.run(21, &mut diagnostics, &PipelineOptions::default());
        assert_eq!(out, Ok(42));
    }

    #[test]
    fn errors_are_attributed_to_the_failing_stage() {
        let pipeline = PipelineBuilder::new()
            .add_stage(Double)
            .add_stage(Fail)
            .build();
        let mut diagnostics = PipelineDiagnostics::default();
        let err = pipeline
            .run(1, &mut diagnostics, &PipelineOptions::default())
            .unwrap_err();
        assert_eq!(err.stage, "fail");
        assert_eq!(err.message, "boom");
    }
}
