//! Weave deterministic, thread-safe disposal into compiled types
//!
//! Authors write a class with an empty `Dispose()` (and optionally `DisposeManaged` and
//! `DisposeUnmanaged` hooks); the weaver fills in the rest: an at-most-once disposal sequence,
//! disposal of the fields it owns, a finalizer when there is unmanaged state, and a guard that
//! makes every other method throw once the instance has been disposed.
//!
//!   - [`il`] models compiled code (type graph, instructions, method bodies, modules)
//!   - [`weave`] rewrites a module
//!   - [`interp`] runs method bodies, to observe woven types from the outside
//!   - [`samples`] builds sample modules covering each case the weaver handles

pub mod il;
pub mod interp;
pub mod samples;
pub mod util;
pub mod weave;
