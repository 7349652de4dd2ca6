pub mod run;
pub mod spec;

pub use run::{optimize_plans, run_analysis, run_blends, run_sweeps, AnalysisRun};
pub use spec::{
    load_spec_from_path, resolve_analysis, validate, write_spec_to_path, AnalysisDefaults,
    AnalysisSpec, ModeSpec, ResolvedAnalysis, ResolvedMode, ResolvedSweep, SweepSpec,
};
