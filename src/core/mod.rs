pub mod fetcher;
pub mod filter;
pub mod normalize;
pub mod region;
pub mod sync;

pub use crate::domain::model::{NormalizedChannel, NormalizedService, RegionContext};
pub use crate::domain::ports::{Collection, DocumentStore};
pub use crate::utils::error::Result;
