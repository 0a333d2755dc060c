pub mod collect;
pub mod creators;
pub mod error;
pub mod features;
pub mod merge;
mod table;

pub use collect::{collect_batch, collect_batches, BatchStats};
pub use creators::annotate_creator_history;
pub use error::PipelineError;
pub use features::preprocess_features;
pub use merge::{collapse_project_duplicates, merge_raw_exports};
