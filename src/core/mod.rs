pub mod etl;
pub mod patcher;
pub mod pipeline;
pub mod records;
pub mod sampler;
pub mod tagger;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
