pub mod compactor;
pub mod engine;
pub mod http;
pub mod journal;
pub mod limits;
pub mod model;
pub mod observability;
pub mod timeutil;
