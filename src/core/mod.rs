//! Private internals: process-wide runtime state, the backing adapter,
//! and per-scope pools.

pub(crate) mod adapter;
pub(crate) mod global;
pub(crate) mod pool;
