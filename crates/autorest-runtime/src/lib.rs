//! Catalog-gated request execution for autorest.
//!
//! [`Engine`] validates every request against the discovered catalog and
//! the access policy, then hands validated intents to a [`DataAdapter`].

pub mod adapter;
pub mod engine;
pub mod memory;

pub use adapter::{DataAdapter, RowPage};
pub use engine::Engine;
pub use memory::MemoryAdapter;
