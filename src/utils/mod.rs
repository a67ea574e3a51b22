pub mod layout;
pub mod preprocess;
pub mod synthetic;

pub use layout::{scatter_groups, slide_ticks, ScatterGroup, SlideTick};
pub use preprocess::standardize;
pub use synthetic::{slide_blobs, BlobSpec};
