//! Manipulate compiled object-oriented code
//!
//! ### Simple example
//!
//! Consider the following class:
//!
//! ```csharp,ignore,no_run
//! public class Counter
//! {
//!     int count;
//!
//!     public int Next()
//!     {
//!         count = count + 1;
//!         return count;
//!     }
//! }
//! ```
//!
//! Building an analogous type definition can be done as follows:
//!
//! ```
//! use janitor::il::graph::*;
//! use janitor::il::model::{Method, Module, Type};
//! use janitor::il::code::{Instruction::*, MethodBody};
//! use janitor::il::*;
//!
//! # fn build_type() -> Result<(), Error> {
//! // Setup the type graph, add in the platform types
//! let arenas = TypeGraphArenas::new();
//! let graph = TypeGraph::new(&arenas);
//! let platform = graph.insert_platform_types();
//!
//! // Declare the type and its members in the graph
//! let counter = graph.add_type(TypeData::new(
//!     QualifiedName::from_string(String::from("Counter"))?,
//!     platform.types.object,
//!     TypeFlags::PUBLIC,
//! ));
//! let count = graph.add_field(FieldData::new(
//!     counter,
//!     MemberName::from_string(String::from("count"))?,
//!     platform.types.int32_ref(),
//!     FieldFlags::PRIVATE,
//! ));
//! let next = graph.add_method(
//!     MethodData::new(counter, MemberName::name("Next"), MethodFlags::PUBLIC)
//!         .returning(platform.types.int32_ref()),
//! );
//!
//! // Write the method body
//! let mut body = MethodBody::new();
//! body.push(LdArg(0));
//! body.push(LdArg(0));
//! body.push(LdFld(FieldRef::direct(count)));
//! body.push(LdcI4(1));
//! body.push(Add);
//! body.push(StFld(FieldRef::direct(count)));
//! body.push(LdArg(0));
//! body.push(LdFld(FieldRef::direct(count)));
//! body.push(Ret);
//! assert_eq!(verifier::verify_body(next, &body)?, 3);
//!
//! // Collect the definitions into a module
//! let mut counter_type = Type::new(counter);
//! counter_type.add_field(janitor::il::model::Field::new(count))?;
//! counter_type.add_method(Method::with_body(next, body))?;
//! let mut module = Module::new("Counter.dll");
//! module.add_type(counter_type);
//! # Ok(())
//! # }
//! # build_type().unwrap();
//! ```

mod access_flags;
pub mod code;
mod errors;
pub mod graph;
pub mod model;
mod names;
pub mod verifier;

pub use access_flags::*;
pub use errors::*;
pub use names::*;
