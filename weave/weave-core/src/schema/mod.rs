//! Schema Registry
//!
//! Object types, their fields and argument signatures, and the resolver
//! bound to each field.
//!
//! # Usage
//!
//! ```rust,ignore
//! let schema = SchemaBuilder::new()
//!     .register_object(
//!         ObjectType::new("Query").field(
//!             FieldDef::new("users", TypeRef::named_nn_list_nn("User"))
//!                 .argument(ArgumentDef::new("query", TypeRef::named("String")))
//!                 .resolve(|_root, args, ctx| async move { /* ... */ }),
//!         ),
//!     )
//!     .build()?;
//! ```

mod arguments;
mod object;
mod registry;
mod resolver;
mod scalar;
mod sdl;
mod types;
mod value;

pub use arguments::Arguments;
pub use object::{ArgumentDef, FieldDef, InputObjectType, ObjectType};
pub use registry::{Schema, SchemaBuildError, SchemaBuilder, TypeDef, QUERY_ROOT_DEFAULT};
pub use resolver::{FieldResolver, Resolved};
pub use scalar::ScalarType;
pub use types::TypeRef;
pub use value::InputValue;
