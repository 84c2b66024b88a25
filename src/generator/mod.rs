pub mod brief;
pub mod chart;
pub mod outlet;
pub mod prompt;
pub mod workflow;

pub use brief::{Brief, BriefComposer, PolicyBrief};
pub use chart::{ChartComposer, ChartSnippet, ChartSpec, NO_DATA_SENTINEL};
pub use outlet::{Presenter, Report, ReportSection};
pub use workflow::{BriefPipeline, BriefRequest, PipelineError, PipelineOutcome, PipelineRun};
