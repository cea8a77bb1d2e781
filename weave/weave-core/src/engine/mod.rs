//! Resolution Engine
//!
//! Turns a selection document into a result tree by invoking the resolvers
//! bound in a [`Schema`](crate::schema::Schema).

mod document;
mod error;
mod executor;
mod request;

pub use document::{
    parse, Directive, Document, FieldSelection, Fragment, Literal, Operation, OperationKind,
    Selection, SelectionSet, VariableDef,
};
pub use error::{
    ErrorExtensions, ErrorKind, FieldError, FieldResult, GraphQLError, Location, PathSegment,
    RequestError,
};
pub use executor::{execute, operation_kind};
pub use request::{Request, Response};
