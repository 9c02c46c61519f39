mod config;
mod operation;
mod recognize;

pub use config::*;
pub use operation::*;
pub use recognize::*;
