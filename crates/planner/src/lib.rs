//! HeaderProbe Planner
//!
//! Builds the response corpus, synthesizes browser test URLs from it, and
//! reconciles executed results into retry plans.

pub mod artifact;
pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod popups;
pub mod reconciler;
pub mod synth;
pub mod template;
pub mod test_url;

pub use artifact::{batches, RetryArtifact};
pub use chunker::{chunk_contiguous, IdRange};
pub use config::{CorpusConfig, HarnessConfig, HostConfig, PlanConfig, RepeatConfig, ValueListSource};
pub use corpus::{CorpusBuilder, CorpusReport};
pub use error::{Error, Result, TemplateError};
pub use index::ResponseIndex;
pub use popups::{bucket_popups, PopupBucket};
pub use reconciler::{ReconcileWarning, RepeatOptions, RepeatOutcome, RepeatReconciler};
pub use synth::{PlanOutcome, Synthesizer};
pub use template::{builtin_templates, ModeFilter, TestTemplate};
pub use test_url::TestPlanEntry;
