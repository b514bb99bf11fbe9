//! Route handlers, one module per resource.
pub mod documents;
pub mod health;
pub mod pipeline;
pub mod projects;
