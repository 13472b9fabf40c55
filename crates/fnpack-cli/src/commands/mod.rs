mod build;

pub use build::{BuildOpts, build};
