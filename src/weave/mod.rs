//! Inject a thread-safe disposal state machine into types with an empty `Dispose`
//!
//! For every eligible class with an empty (or "not implemented") disposal entry point, the weaver
//!
//!   - adds a `disposeSignaled` field that the first caller into the disposal sequence atomically
//!     exchanges to `1` (everyone else returns straight away)
//!   - adds a `disposed` flag and a private `ThrowIfDisposed` guard reading it
//!   - rewrites the entry point according to the [`DisposalShape`] picked from the hooks the
//!     author declared (`DisposeManaged`, `DisposeUnmanaged`), attaching a finalizer when there is
//!     unmanaged state to release
//!   - prepends a call to the guard to every other instance method
//!
//! ### Example
//!
//! ```
//! use janitor::il::graph::{TypeGraph, TypeGraphArenas};
//! use janitor::samples::Samples;
//! use janitor::weave::{Diagnostics, ModuleWeaver, Settings};
//!
//! # fn weave() -> Result<(), janitor::weave::Error> {
//! let arenas = TypeGraphArenas::new();
//! let graph = TypeGraph::new(&arenas);
//! let mut samples = Samples::build(&graph)?;
//!
//! let weaver = ModuleWeaver::new(&graph, Settings::new()?);
//! let mut diagnostics = Diagnostics::new();
//! let report = weaver.execute(&mut samples.module, &mut diagnostics)?;
//!
//! assert!(!diagnostics.has_errors());
//! assert!(report.shape_of(samples.types.simple).is_some());
//! # Ok(())
//! # }
//! # weave().unwrap();
//! ```

mod cleaner;
mod diagnostics;
mod errors;
mod field_disposal;
mod guards;
mod module;
pub mod queries;
mod references;
mod settings;
mod shapes;
mod type_processor;

pub use cleaner::*;
pub use diagnostics::*;
pub use errors::*;
pub use module::*;
pub use references::*;
pub use settings::*;
pub use shapes::*;
pub use type_processor::{SynthesizedState, TypeProcessor};
