//! FieldResolver - the function bound to one schema field
//!
//! TigerStyle: Resolvers receive an explicit (parent, arguments, context)
//! triple. All state access goes through the context.

use std::future::Future;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::arguments::Arguments;
use crate::engine::FieldResult;

/// What a resolver produced, before output completion.
///
/// `S` is the parent value type threaded through object fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<S> {
    /// No value
    Null,
    /// A scalar (checked against the field's scalar type)
    Value(Value),
    /// An object, resolved further by the selected subfields
    Object(S),
    /// A list, completed element by element
    List(Vec<Resolved<S>>),
}

impl<S> Resolved<S> {
    /// Scalar result.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Nullable scalar result.
    pub fn opt_value<T: Into<Value>>(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::value)
    }

    /// Nullable object result.
    pub fn opt_object(value: Option<S>) -> Self {
        value.map_or(Self::Null, Self::Object)
    }

    /// List of objects.
    pub fn objects(values: impl IntoIterator<Item = S>) -> Self {
        Self::List(values.into_iter().map(Self::Object).collect())
    }

    /// True for [`Resolved::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Computes one field's value.
#[async_trait]
pub trait FieldResolver<S, C>: Send + Sync {
    /// Resolve the field for `parent`.
    async fn resolve(&self, parent: &S, args: &Arguments, ctx: &C) -> FieldResult<Resolved<S>>;
}

type AsyncBody<S, C> =
    Box<dyn Fn(S, Arguments, C) -> BoxFuture<'static, FieldResult<Resolved<S>>> + Send + Sync>;

/// Adapter for async functions over owned inputs.
pub(crate) struct AsyncFn<S, C> {
    body: AsyncBody<S, C>,
}

impl<S, C> AsyncFn<S, C> {
    pub(crate) fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(S, Arguments, C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult<Resolved<S>>> + Send + 'static,
    {
        Self {
            body: Box::new(move |parent, args, ctx| f(parent, args, ctx).boxed()),
        }
    }
}

#[async_trait]
impl<S, C> FieldResolver<S, C> for AsyncFn<S, C>
where
    S: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    async fn resolve(&self, parent: &S, args: &Arguments, ctx: &C) -> FieldResult<Resolved<S>> {
        (self.body)(parent.clone(), args.clone(), ctx.clone()).await
    }
}

type SyncBody<S> = Box<dyn Fn(&S, &Arguments) -> FieldResult<Resolved<S>> + Send + Sync>;

/// Adapter for synchronous accessors (leaf fields read off the parent).
pub(crate) struct SyncFn<S> {
    body: SyncBody<S>,
}

impl<S> SyncFn<S> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&S, &Arguments) -> FieldResult<Resolved<S>> + Send + Sync + 'static,
    {
        Self { body: Box::new(f) }
    }
}

#[async_trait]
impl<S, C> FieldResolver<S, C> for SyncFn<S>
where
    S: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    async fn resolve(&self, parent: &S, args: &Arguments, _ctx: &C) -> FieldResult<Resolved<S>> {
        (self.body)(parent, args)
    }
}
