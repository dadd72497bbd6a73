//! Semantic representations of a module being woven
//!
//! This is the representation the weaver mutates. Declarations (names, signatures, flags) live in
//! the [type graph](crate::il::graph); what can change per definition lives here:
//!
//!   - __Module__ is represented using [`Module`] (assembly references and assembly markers)
//!   - __Type__ is represented using [`Type`]
//!   - __Method__ is represented using [`Method`] (the body)
//!   - __Field__ is represented using [`Field`]
//!   - __Custom attributes__ are represented using [`Marker`]
//!
//! In all of these cases, the definitions have an `id` field to query the type graph.

mod field;
mod marker;
mod method;
mod module;
mod type_def;

pub use field::*;
pub use marker::*;
pub use method::*;
pub use module::*;
pub use type_def::*;
