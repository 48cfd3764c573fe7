pub mod data;
pub mod datetime;
pub mod filename;
pub mod kind;

pub use data::*;
pub use datetime::*;
pub use filename::*;
pub use kind::*;
