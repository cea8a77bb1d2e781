//! Basics - mock dataset schema
//!
//! TigerStyle: every write is gated by a validator check, every check runs
//! before the first write.
//!
//! ```text
//! type Query {
//!   users(query: String): [User!]!
//!   posts(query: String): [Post!]!
//!   comments: [Comment!]!
//!   me: User!
//!   post: Post!
//! }
//!
//! type Mutation {
//!   createUser(name: String!, email: String!, age: Int): User!
//!   createPost(title: String!, body: String!, published: Boolean!, author: ID!): Post!
//!   createComment(text: String!, author: ID!, post: ID!): Comment!
//! }
//! ```

use weave_core::constants::{
    COMMENT_TEXT_BYTES_MAX, POST_BODY_BYTES_MAX, POST_TITLE_BYTES_MAX, SEARCH_QUERY_BYTES_MAX,
    USER_NAME_BYTES_MAX,
};
use weave_core::schema::ArgumentDef;
use weave_core::storage::query;
use weave_core::validator::{self, check_length, ensure};
use weave_core::{
    Arguments, Comment, EntityKind, Field, FieldResult, Post, Predicate, Resolved,
    SchemaBuildError, TypeRef, User,
};

use super::{
    check_email, comment_author, comment_conflict, comment_leaf, comment_post, email_conflict,
    post_author, post_comments, post_leaf, reference_conflict, user_comments, user_leaf,
    user_posts, DemoField, DemoObject, DemoSchema, Node, Output, EMAIL_TAKEN, POST_UNAVAILABLE,
    USER_MISSING,
};
use crate::context::AppContext;

/// Identifier of the static `me` user.
pub const ME_ID: &str = "123456";

/// Identifier of the static `post` record.
pub const FEATURED_POST_ID: &str = "abc123";

/// Build the basics registry.
pub fn schema() -> Result<DemoSchema, SchemaBuildError> {
    DemoSchema::builder()
        .mutation("Mutation")
        .register_object(query_type())
        .register_object(mutation_type())
        .register_object(user_type())
        .register_object(post_type())
        .register_object(comment_type())
        .build()
}

// =============================================================================
// Types
// =============================================================================

fn query_type() -> DemoObject {
    DemoObject::new("Query")
        .field(
            DemoField::new("users", TypeRef::named_nn_list_nn("User"))
                .argument(ArgumentDef::new("query", TypeRef::named("String")))
                .description("Users whose name contains `query`, ignoring case")
                .resolve(users),
        )
        .field(
            DemoField::new("posts", TypeRef::named_nn_list_nn("Post"))
                .argument(ArgumentDef::new("query", TypeRef::named("String")))
                .description("Posts whose title or body contains `query`, ignoring case")
                .resolve(posts),
        )
        .field(DemoField::new("comments", TypeRef::named_nn_list_nn("Comment")).resolve(comments))
        .field(
            DemoField::new("me", TypeRef::named_nn("User"))
                .resolve_sync(|_, _| Ok(Resolved::Object(Node::User(me())))),
        )
        .field(
            DemoField::new("post", TypeRef::named_nn("Post"))
                .resolve_sync(|_, _| Ok(Resolved::Object(Node::Post(featured_post())))),
        )
}

fn mutation_type() -> DemoObject {
    DemoObject::new("Mutation")
        .field(
            DemoField::new("createUser", TypeRef::named_nn("User"))
                .argument(ArgumentDef::new("name", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("email", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("age", TypeRef::named("Int")))
                .resolve(create_user),
        )
        .field(
            DemoField::new("createPost", TypeRef::named_nn("Post"))
                .argument(ArgumentDef::new("title", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("body", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("published", TypeRef::named_nn("Boolean")))
                .argument(ArgumentDef::new("author", TypeRef::named_nn("ID")))
                .resolve(create_post),
        )
        .field(
            DemoField::new("createComment", TypeRef::named_nn("Comment"))
                .argument(ArgumentDef::new("text", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("author", TypeRef::named_nn("ID")))
                .argument(ArgumentDef::new("post", TypeRef::named_nn("ID")))
                .resolve(create_comment),
        )
}

fn user_type() -> DemoObject {
    DemoObject::new("User")
        .field(
            DemoField::new("id", TypeRef::named_nn("ID"))
                .resolve_sync(user_leaf(|u| Resolved::value(u.id.clone()))),
        )
        .field(
            DemoField::new("name", TypeRef::named_nn("String"))
                .resolve_sync(user_leaf(|u| Resolved::opt_value(u.name.clone()))),
        )
        .field(
            DemoField::new("email", TypeRef::named_nn("String"))
                .resolve_sync(user_leaf(|u| Resolved::value(u.email.clone()))),
        )
        .field(
            DemoField::new("age", TypeRef::named("Int"))
                .resolve_sync(user_leaf(|u| Resolved::opt_value(u.age))),
        )
        .field(DemoField::new("posts", TypeRef::named_nn_list_nn("Post")).resolve(user_posts))
        .field(
            DemoField::new("comments", TypeRef::named_nn_list_nn("Comment")).resolve(user_comments),
        )
}

fn post_type() -> DemoObject {
    DemoObject::new("Post")
        .field(
            DemoField::new("id", TypeRef::named_nn("ID"))
                .resolve_sync(post_leaf(|p| Resolved::value(p.id.clone()))),
        )
        .field(
            DemoField::new("title", TypeRef::named_nn("String"))
                .resolve_sync(post_leaf(|p| Resolved::value(p.title.clone()))),
        )
        .field(
            DemoField::new("body", TypeRef::named_nn("String"))
                .resolve_sync(post_leaf(|p| Resolved::opt_value(p.body.clone()))),
        )
        .field(
            DemoField::new("published", TypeRef::named_nn("Boolean"))
                .resolve_sync(post_leaf(|p| Resolved::value(p.published))),
        )
        .field(DemoField::new("author", TypeRef::named_nn("User")).resolve(post_author))
        .field(
            DemoField::new("comments", TypeRef::named_nn_list_nn("Comment")).resolve(post_comments),
        )
}

fn comment_type() -> DemoObject {
    DemoObject::new("Comment")
        .field(
            DemoField::new("id", TypeRef::named_nn("ID"))
                .resolve_sync(comment_leaf(|c| Resolved::value(c.id.clone()))),
        )
        .field(
            DemoField::new("text", TypeRef::named_nn("String"))
                .resolve_sync(comment_leaf(|c| Resolved::value(c.text.clone()))),
        )
        .field(DemoField::new("author", TypeRef::named_nn("User")).resolve(comment_author))
        .field(DemoField::new("post", TypeRef::named_nn("Post")).resolve(comment_post))
}

// =============================================================================
// Static records
// =============================================================================

/// The `me` user. Not held in the store.
#[must_use]
pub fn me() -> User {
    User::new(
        ME_ID.to_string(),
        Some("HadesGod".to_string()),
        "hadesgod@mail.com".to_string(),
        Some(29),
    )
}

/// The `post` record. Not held in the store, so its author does not resolve.
#[must_use]
pub fn featured_post() -> Post {
    Post::new(
        FEATURED_POST_ID.to_string(),
        "God's Bookds".to_string(),
        Some("HadesGod body".to_string()),
        true,
        ME_ID.to_string(),
    )
}

// =============================================================================
// Query resolvers
// =============================================================================

/// A present, non-empty search string.
fn search(args: &Arguments) -> FieldResult<Option<String>> {
    let needle = args.opt_string("query")?.filter(|q| !q.is_empty());
    if let Some(q) = &needle {
        check_length("query", q, SEARCH_QUERY_BYTES_MAX)?;
    }
    Ok(needle)
}

async fn users(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let predicate = match search(&args)? {
        Some(q) => Predicate::contains_ignore_case(Field::Name, q),
        None => Predicate::All,
    };

    let users = query::users(ctx.store(), predicate).await?;
    Ok(Resolved::objects(users.into_iter().map(Node::from)))
}

async fn posts(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let predicate = match search(&args)? {
        Some(q) => Predicate::Or(vec![
            Predicate::contains_ignore_case(Field::Title, q.as_str()),
            Predicate::contains_ignore_case(Field::Body, q),
        ]),
        None => Predicate::All,
    };

    let posts = query::posts(ctx.store(), predicate).await?;
    Ok(Resolved::objects(posts.into_iter().map(Node::from)))
}

async fn comments(_parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let comments = query::comments(ctx.store(), Predicate::All).await?;
    Ok(Resolved::objects(comments.into_iter().map(Node::from)))
}

// =============================================================================
// Mutation resolvers
// =============================================================================

async fn create_user(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let name = args.string("name")?;
    let email = args.string("email")?;
    let age = args.opt_int("age")?;

    check_length("name", &name, USER_NAME_BYTES_MAX)?;
    check_email(&email)?;

    let store = ctx.store();
    ensure(validator::email_unique(store, &email).await?, EMAIL_TAKEN)?;

    let id = store.next_id(EntityKind::User).await?;
    let user = User::new(id, Some(name), email, age);
    let stored = store.insert(user.into()).await.map_err(email_conflict)?;

    tracing::debug!(request_id = %ctx.request_id(), id = %stored.id(), "Created user");
    Ok(Resolved::Object(stored.into()))
}

async fn create_post(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let title = args.string("title")?;
    let body = args.string("body")?;
    let published = args.bool("published")?;
    let author = args.id("author")?;

    check_length("title", &title, POST_TITLE_BYTES_MAX)?;
    check_length("body", &body, POST_BODY_BYTES_MAX)?;

    let store = ctx.store();
    ensure(validator::user_exists(store, &author).await?, USER_MISSING)?;

    let id = store.next_id(EntityKind::Post).await?;
    let stored = store
        .insert(Post::new(id, title, Some(body), published, author).into())
        .await
        .map_err(|e| reference_conflict(e, USER_MISSING))?;

    tracing::debug!(request_id = %ctx.request_id(), id = %stored.id(), "Created post");
    Ok(Resolved::Object(stored.into()))
}

async fn create_comment(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let text = args.string("text")?;
    let author = args.id("author")?;
    let post = args.id("post")?;

    check_length("text", &text, COMMENT_TEXT_BYTES_MAX)?;

    let store = ctx.store();
    ensure(validator::user_exists(store, &author).await?, USER_MISSING)?;
    ensure(
        validator::post_exists_and_published(store, &post).await?,
        POST_UNAVAILABLE,
    )?;

    let id = store.next_id(EntityKind::Comment).await?;
    let stored = store
        .insert(Comment::new(id, text, author, post).into())
        .await
        .map_err(comment_conflict)?;

    tracing::debug!(request_id = %ctx.request_id(), id = %stored.id(), "Created comment");
    Ok(Resolved::Object(stored.into()))
}

// =============================================================================
// Tests
// =============================================================================
