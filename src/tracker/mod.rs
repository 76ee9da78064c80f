pub mod accumulator;
pub mod analysis;
pub mod cache;
pub mod clock;
pub mod fetcher;
pub mod normalizer;
pub mod service;
pub mod store;
pub mod trends;

pub use analysis::*;
pub use clock::*;
pub use fetcher::*;
pub use service::*;
pub use store::*;
pub use trends::*;
