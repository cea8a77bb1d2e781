//! Nexus - code-first schema over a relational store
//!
//! TigerStyle: integer identifiers on the wire, strings in the store.
//! Deletes are restricted: a user with posts or comments, or a post with
//! comments, cannot be deleted. Nothing cascades.
//!
//! ```text
//! type Query {
//!   allUsers(query: String): [User!]!
//!   allPost(query: String): [Post!]
//!   postById(id: Int): Post
//!   draftsByUser(userUniqueInput: UserUniqueInput!): [Post]
//!   comments: [Comment]
//! }
//!
//! type Mutation {
//!   signupUser(data: UserCreateInput!): User!
//!   deleteUser(id: Int!): User
//!   updateUser(id: Int!, name: String, email: String): User
//!   createDraft(data: PostCreateInput!, authorEmail: String!): Post
//!   togglePublishPost(id: Int!): Post
//!   deletePost(id: Int!): Post
//!   updatePost(id: Int!, title: String, body: String, published: Boolean): Post
//!   createComment(text: String!, postId: Int!, authorEmail: String!): Comment
//! }
//! ```

use weave_core::constants::{
    COMMENT_TEXT_BYTES_MAX, POST_BODY_BYTES_MAX, POST_TITLE_BYTES_MAX, SEARCH_QUERY_BYTES_MAX,
    USER_NAME_BYTES_MAX,
};
use weave_core::model::{PostPatch, UserPatch};
use weave_core::schema::{ArgumentDef, InputObjectType};
use weave_core::storage::query;
use weave_core::validator::{self, check_length, ensure};
use weave_core::{
    Arguments, Comment, EntityKind, EntityStore, Field, FieldError, FieldResult, Post, Predicate,
    Resolved, SchemaBuildError, StorageError, TypeRef, User,
};

use super::{
    check_email, comment_author, comment_conflict, comment_leaf, comment_post, email_conflict,
    post_author, post_comments, post_leaf, reference_conflict, user_comments, user_leaf,
    user_posts, DemoField, DemoObject, DemoSchema, Node, Output, EMAIL_TAKEN, POST_UNAVAILABLE,
    USER_MISSING,
};
use crate::context::AppContext;

/// Maximum number of posts created together with a user.
pub const SIGNUP_POSTS_COUNT_MAX: usize = 64;

const USER_NOT_FOUND: &str = "not found user";
const POST_NOT_FOUND: &str = "not found post";
const USER_IN_USE: &str = "user still has posts or comments";
const POST_IN_USE: &str = "post still has comments";

/// Build the nexus registry.
pub fn schema() -> Result<DemoSchema, SchemaBuildError> {
    DemoSchema::builder()
        .mutation("Mutation")
        .register_object(query_type())
        .register_object(mutation_type())
        .register_object(user_type())
        .register_object(post_type())
        .register_object(comment_type())
        .register_input(
            InputObjectType::new("UserUniqueInput")
                .field(ArgumentDef::new("id", TypeRef::named("Int")))
                .field(ArgumentDef::new("email", TypeRef::named("String"))),
        )
        .register_input(
            InputObjectType::new("PostCreateInput")
                .field(ArgumentDef::new("title", TypeRef::named_nn("String")))
                .field(ArgumentDef::new("body", TypeRef::named("String"))),
        )
        .register_input(
            InputObjectType::new("UserCreateInput")
                .field(ArgumentDef::new("email", TypeRef::named_nn("String")))
                .field(ArgumentDef::new("name", TypeRef::named("String")))
                .field(ArgumentDef::new(
                    "posts",
                    TypeRef::named_nn_list("PostCreateInput"),
                )),
        )
        .build()
}

// =============================================================================
// Types
// =============================================================================

fn query_type() -> DemoObject {
    DemoObject::new("Query")
        .field(
            DemoField::new("allUsers", TypeRef::named_nn_list_nn("User"))
                .argument(ArgumentDef::new("query", TypeRef::named("String")))
                .description("Users whose name or email contains `query`")
                .resolve(all_users),
        )
        .field(
            DemoField::new("allPost", TypeRef::named_nn_list("Post"))
                .argument(ArgumentDef::new("query", TypeRef::named("String")))
                .description("Posts whose title or body contains `query`")
                .resolve(all_post),
        )
        .field(
            DemoField::new("postById", TypeRef::named("Post"))
                .argument(ArgumentDef::new("id", TypeRef::named("Int")))
                .resolve(post_by_id),
        )
        .field(
            DemoField::new("draftsByUser", TypeRef::named_list("Post"))
                .argument(ArgumentDef::new(
                    "userUniqueInput",
                    TypeRef::named_nn("UserUniqueInput"),
                ))
                .description("Unpublished posts of the user found by id or email")
                .resolve(drafts_by_user),
        )
        .field(DemoField::new("comments", TypeRef::named_list("Comment")).resolve(comments))
}

fn mutation_type() -> DemoObject {
    let id_arg = || ArgumentDef::new("id", TypeRef::named_nn("Int"));

    DemoObject::new("Mutation")
        .field(
            DemoField::new("signupUser", TypeRef::named_nn("User"))
                .argument(ArgumentDef::new("data", TypeRef::named_nn("UserCreateInput")))
                .resolve(signup_user),
        )
        .field(
            DemoField::new("deleteUser", TypeRef::named("User"))
                .argument(id_arg())
                .resolve(delete_user),
        )
        .field(
            DemoField::new("updateUser", TypeRef::named("User"))
                .argument(id_arg())
                .argument(ArgumentDef::new("name", TypeRef::named("String")))
                .argument(ArgumentDef::new("email", TypeRef::named("String")))
                .resolve(update_user),
        )
        .field(
            DemoField::new("createDraft", TypeRef::named("Post"))
                .argument(ArgumentDef::new("data", TypeRef::named_nn("PostCreateInput")))
                .argument(ArgumentDef::new("authorEmail", TypeRef::named_nn("String")))
                .resolve(create_draft),
        )
        .field(
            DemoField::new("togglePublishPost", TypeRef::named("Post"))
                .argument(id_arg())
                .resolve(toggle_publish_post),
        )
        .field(
            DemoField::new("deletePost", TypeRef::named("Post"))
                .argument(id_arg())
                .resolve(delete_post),
        )
        .field(
            DemoField::new("updatePost", TypeRef::named("Post"))
                .argument(id_arg())
                .argument(ArgumentDef::new("title", TypeRef::named("String")))
                .argument(ArgumentDef::new("body", TypeRef::named("String")))
                .argument(ArgumentDef::new("published", TypeRef::named("Boolean")))
                .resolve(update_post),
        )
        .field(
            DemoField::new("createComment", TypeRef::named("Comment"))
                .argument(ArgumentDef::new("text", TypeRef::named_nn("String")))
                .argument(ArgumentDef::new("postId", TypeRef::named_nn("Int")))
                .argument(ArgumentDef::new("authorEmail", TypeRef::named_nn("String")))
                .resolve(create_comment),
        )
}

fn user_type() -> DemoObject {
    DemoObject::new("User")
        .field(DemoField::new("id", TypeRef::named_nn("Int")).resolve_sync(int_id))
        .field(
            DemoField::new("name", TypeRef::named("String"))
                .resolve_sync(user_leaf(|u| Resolved::opt_value(u.name.clone()))),
        )
        .field(
            DemoField::new("email", TypeRef::named_nn("String"))
                .resolve_sync(user_leaf(|u| Resolved::value(u.email.clone()))),
        )
        .field(DemoField::new("posts", TypeRef::named_nn_list_nn("Post")).resolve(user_posts))
        .field(
            DemoField::new("comments", TypeRef::named_nn_list_nn("Comment")).resolve(user_comments),
        )
}

fn post_type() -> DemoObject {
    DemoObject::new("Post")
        .field(DemoField::new("id", TypeRef::named_nn("Int")).resolve_sync(int_id))
        .field(
            DemoField::new("title", TypeRef::named_nn("String"))
                .resolve_sync(post_leaf(|p| Resolved::value(p.title.clone()))),
        )
        .field(
            DemoField::new("body", TypeRef::named("String"))
                .resolve_sync(post_leaf(|p| Resolved::opt_value(p.body.clone()))),
        )
        .field(
            DemoField::new("published", TypeRef::named_nn("Boolean"))
                .resolve_sync(post_leaf(|p| Resolved::value(p.published))),
        )
        .field(DemoField::new("author", TypeRef::named("User")).resolve(post_author))
        .field(
            DemoField::new("comments", TypeRef::named_nn_list_nn("Comment")).resolve(post_comments),
        )
}

fn comment_type() -> DemoObject {
    DemoObject::new("Comment")
        .field(DemoField::new("id", TypeRef::named_nn("Int")).resolve_sync(int_id))
        .field(
            DemoField::new("text", TypeRef::named_nn("String"))
                .resolve_sync(comment_leaf(|c| Resolved::value(c.text.clone()))),
        )
        .field(DemoField::new("author", TypeRef::named("User")).resolve(comment_author))
        .field(DemoField::new("post", TypeRef::named("Post")).resolve(comment_post))
}

// =============================================================================
// Identifiers
// =============================================================================

/// Stored identifiers are decimal strings; the wire carries integers.
fn int_id(node: &Node, _args: &Arguments) -> Output {
    let id = match node {
        Node::User(user) => &user.id,
        Node::Post(post) => &post.id,
        Node::Comment(comment) => &comment.id,
        Node::Root => return Err(FieldError::internal("root has no identifier")),
    };

    id.parse::<i64>()
        .map(Resolved::value)
        .map_err(|_| FieldError::internal(format!("identifier `{id}` is not an integer")))
}

fn store_id(id: i32) -> String {
    id.to_string()
}

fn found<T>(value: Option<T>, message: impl Into<String>) -> FieldResult<T> {
    value.ok_or_else(|| FieldError::not_found(message))
}

// =============================================================================
// Query resolvers
// =============================================================================

fn needle(args: &Arguments) -> FieldResult<String> {
    let needle = args.opt_string("query")?.unwrap_or_default();
    check_length("query", &needle, SEARCH_QUERY_BYTES_MAX)?;
    Ok(needle)
}

async fn all_users(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let needle = needle(&args)?;
    let predicate = Predicate::Or(vec![
        Predicate::contains(Field::Name, needle.as_str()),
        Predicate::contains(Field::Email, needle),
    ]);

    let users = query::users(ctx.store(), predicate).await?;
    Ok(Resolved::objects(users.into_iter().map(Node::from)))
}

async fn all_post(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let needle = needle(&args)?;
    let predicate = Predicate::Or(vec![
        Predicate::contains(Field::Title, needle.as_str()),
        Predicate::contains(Field::Body, needle),
    ]);

    let posts = query::posts(ctx.store(), predicate).await?;
    Ok(Resolved::objects(posts.into_iter().map(Node::from)))
}

async fn post_by_id(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let Some(id) = args.opt_int("id")? else {
        return Ok(Resolved::Null);
    };

    let post = query::post(ctx.store(), &store_id(id)).await?;
    Ok(Resolved::opt_object(post.map(Node::from)))
}

async fn drafts_by_user(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let unique = args.input("userUniqueInput")?;
    let id = unique.opt_int("id")?;
    let email = unique.opt_string("email")?;
    let store = ctx.store();

    // Both keys given must name the same user.
    let user = match (id, email) {
        (None, None) => {
            return Err(FieldError::argument(
                "userUniqueInput needs `id` or `email`",
            ));
        }
        (Some(id), email) => query::user(store, &store_id(id))
            .await?
            .filter(|user| email.as_ref().map_or(true, |e| &user.email == e)),
        (None, Some(email)) => query::user_by_email(store, &email).await?,
    };
    let Some(user) = user else {
        return Ok(Resolved::Null);
    };

    let drafts = query::posts(
        store,
        Predicate::And(vec![
            Predicate::eq(Field::AuthorId, user.id.as_str()),
            Predicate::eq(Field::Published, false),
        ]),
    )
    .await?;
    Ok(Resolved::objects(drafts.into_iter().map(Node::from)))
}

async fn comments(_parent: Node, _args: Arguments, ctx: AppContext) -> Output {
    let comments = query::comments(ctx.store(), Predicate::All).await?;
    Ok(Resolved::objects(comments.into_iter().map(Node::from)))
}

// =============================================================================
// Mutation resolvers
// =============================================================================

fn post_input(input: &Arguments) -> FieldResult<(String, Option<String>)> {
    let title = input.string("title")?;
    let body = input.opt_string("body")?;

    check_length("title", &title, POST_TITLE_BYTES_MAX)?;
    if let Some(body) = &body {
        check_length("body", body, POST_BODY_BYTES_MAX)?;
    }
    Ok((title, body))
}

async fn insert_draft(
    store: &dyn EntityStore,
    title: String,
    body: Option<String>,
    author_id: &str,
) -> FieldResult<Post> {
    let id = store.next_id(EntityKind::Post).await?;
    let record = store
        .insert(Post::new(id, title, body, false, author_id.to_string()).into())
        .await
        .map_err(|e| reference_conflict(e, USER_MISSING))?;

    record
        .into_post()
        .ok_or_else(|| FieldError::internal("store returned a non-post record"))
}

/// Undo a partially applied signup. Best effort: failures are logged.
async fn roll_back_signup(store: &dyn EntityStore, user_id: &str, post_ids: &[String]) {
    for post_id in post_ids.iter().rev() {
        if let Err(e) = store.delete(EntityKind::Post, post_id).await {
            tracing::warn!(error = %e, post_id = %post_id, "Signup rollback failed");
        }
    }
    if let Err(e) = store.delete(EntityKind::User, user_id).await {
        tracing::warn!(error = %e, user_id = %user_id, "Signup rollback failed");
    }
}

async fn signup_user(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let data = args.input("data")?;
    let email = data.string("email")?;
    let name = data.opt_string("name")?;
    let posts = data.inputs("posts")?;

    check_email(&email)?;
    if let Some(name) = &name {
        check_length("name", name, USER_NAME_BYTES_MAX)?;
    }
    ensure(
        posts.len() <= SIGNUP_POSTS_COUNT_MAX,
        format!("at most {SIGNUP_POSTS_COUNT_MAX} posts per signup"),
    )?;
    let drafts = posts
        .iter()
        .map(post_input)
        .collect::<FieldResult<Vec<_>>>()?;

    let store = ctx.store();
    ensure(validator::email_unique(store, &email).await?, EMAIL_TAKEN)?;

    let id = store.next_id(EntityKind::User).await?;
    let user = store
        .insert(User::new(id, name, email, None).into())
        .await
        .map_err(email_conflict)?;

    let mut created = Vec::with_capacity(drafts.len());
    for (title, body) in drafts {
        match insert_draft(store, title, body, user.id()).await {
            Ok(post) => created.push(post.id),
            Err(e) => {
                roll_back_signup(store, user.id(), &created).await;
                return Err(e);
            }
        }
    }

    tracing::debug!(
        request_id = %ctx.request_id(),
        id = %user.id(),
        posts = created.len(),
        "Signed up user"
    );
    Ok(Resolved::Object(user.into()))
}

async fn delete_user(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let id = store_id(args.int("id")?);
    let store = ctx.store();

    found(query::user(store, &id).await?, USER_NOT_FOUND)?;
    ensure(
        !validator::user_has_dependents(store, &id).await?,
        USER_IN_USE,
    )?;

    let removed = store
        .delete(EntityKind::User, &id)
        .await
        .map_err(|e| reference_conflict(e, USER_IN_USE))?;
    Ok(Resolved::Object(removed.into()))
}

async fn update_user(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let id = store_id(args.int("id")?);
    // Empty strings leave the field unchanged.
    let name = args.opt_string("name")?.filter(|s| !s.is_empty());
    let email = args.opt_string("email")?.filter(|s| !s.is_empty());
    let store = ctx.store();

    found(query::user(store, &id).await?, USER_NOT_FOUND)?;
    if let Some(name) = &name {
        check_length("name", name, USER_NAME_BYTES_MAX)?;
    }
    if let Some(email) = &email {
        check_email(email)?;
        ensure(
            validator::email_available_for(store, email, &id).await?,
            EMAIL_TAKEN,
        )?;
    }

    let patch = UserPatch {
        name,
        email,
        age: None,
    };
    let updated = store
        .update(EntityKind::User, &id, patch.into())
        .await
        .map_err(email_conflict)?;
    Ok(Resolved::Object(updated.into()))
}

async fn create_draft(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let (title, body) = post_input(&args.input("data")?)?;
    let author_email = args.string("authorEmail")?;
    let store = ctx.store();

    let author = query::user_by_email(store, &author_email).await?;
    let Some(author) = author else {
        return Err(FieldError::validation(USER_MISSING));
    };

    let post = insert_draft(store, title, body, &author.id).await?;
    Ok(Resolved::Object(post.into()))
}

async fn toggle_publish_post(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let id = args.int("id")?;
    let key = store_id(id);
    let store = ctx.store();

    // Flipped inside the store so concurrent toggles never read a stale flag.
    let toggled = store.toggle_published(&key).await.map_err(|e| match e {
        StorageError::NotFound { .. } => {
            FieldError::not_found(format!("Post with ID {id} does not exist in the database."))
        }
        other => other.into(),
    })?;
    Ok(Resolved::Object(toggled.into()))
}

async fn delete_post(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let id = store_id(args.int("id")?);
    let store = ctx.store();

    found(query::post(store, &id).await?, POST_NOT_FOUND)?;
    ensure(
        !validator::post_has_comments(store, &id).await?,
        POST_IN_USE,
    )?;

    let removed = store
        .delete(EntityKind::Post, &id)
        .await
        .map_err(|e| reference_conflict(e, POST_IN_USE))?;
    Ok(Resolved::Object(removed.into()))
}

async fn update_post(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let id = store_id(args.int("id")?);
    let title = args.opt_string("title")?.filter(|s| !s.is_empty());
    let body = args.opt_string("body")?.filter(|s| !s.is_empty());
    let published = args.opt_bool("published")?;
    let store = ctx.store();

    found(query::post(store, &id).await?, POST_NOT_FOUND)?;
    if let Some(title) = &title {
        check_length("title", title, POST_TITLE_BYTES_MAX)?;
    }
    if let Some(body) = &body {
        check_length("body", body, POST_BODY_BYTES_MAX)?;
    }

    let patch = PostPatch {
        title,
        body,
        published,
    };
    let updated = store.update(EntityKind::Post, &id, patch.into()).await?;
    Ok(Resolved::Object(updated.into()))
}

async fn create_comment(_parent: Node, args: Arguments, ctx: AppContext) -> Output {
    let text = args.string("text")?;
    let post_id = store_id(args.int("postId")?);
    let author_email = args.string("authorEmail")?;
    let store = ctx.store();

    check_length("text", &text, COMMENT_TEXT_BYTES_MAX)?;
    let Some(author) = query::user_by_email(store, &author_email).await? else {
        return Err(FieldError::validation(USER_MISSING));
    };
    ensure(
        validator::post_exists_and_published(store, &post_id).await?,
        POST_UNAVAILABLE,
    )?;

    let id = store.next_id(EntityKind::Comment).await?;
    let stored = store
        .insert(Comment::new(id, text, author.id, post_id).into())
        .await
        .map_err(comment_conflict)?;
    Ok(Resolved::Object(stored.into()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use crate::config::SchemaVariant;
    use serde_json::json;
    use weave_core::{ErrorKind, Request};

    async fn app() -> App {
        App::in_memory(SchemaVariant::Nexus, true).await.unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_integers() {
        let app = app().await;

        let response = app.run(&Request::new("{ postById(id: 2) { id author { id } } }")).await;

        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            Some(json!({"postById": {"id": 2, "author": {"id": 1}}}))
        );
    }

    #[tokio::test]
    async fn test_post_by_id_without_id_is_null() {
        let app = app().await;

        let response = app.run(&Request::new("{ postById { id } }")).await;

        assert!(response.is_ok());
        assert_eq!(response.data, Some(json!({"postById": null})));
    }

    #[tokio::test]
    async fn test_all_users_is_case_sensitive_over_name_and_email() {
        let app = app().await;

        let response = app
            .run(&Request::new(r#"{ allUsers(query: "God") { id } }"#))
            .await;
        assert_eq!(response.data, Some(json!({"allUsers": [{"id": 1}, {"id": 2}]})));

        let response = app
            .run(&Request::new(r#"{ allUsers(query: "kratos@") { id } }"#))
            .await;
        assert_eq!(response.data, Some(json!({"allUsers": []})));

        let response = app
            .run(&Request::new(r#"{ allUsers(query: "Kratos@") { email } }"#))
            .await;
        assert_eq!(
            response.data,
            Some(json!({"allUsers": [{"email": "Kratos@email.com"}]}))
        );
    }

    #[tokio::test]
    async fn test_signup_with_nested_posts() {
        let app = app().await;

        let response = app
            .run(
                &Request::new(
                    "mutation Signup($data: UserCreateInput!) {
                        signupUser(data: $data) { id name posts { title body published } }
                    }",
                )
                .with_variables(json!({"data": {
                    "email": "ada@x.com",
                    "name": "Ada",
                    "posts": [{"title": "Notes"}, {"title": "Engine", "body": "analytical"}]
                }})),
            )
            .await;

        assert!(response.is_ok(), "{:?}", response.errors);
        assert_eq!(
            response.data,
            Some(json!({"signupUser": {
                "id": 4,
                "name": "Ada",
                "posts": [
                    {"title": "Notes", "body": null, "published": false},
                    {"title": "Engine", "body": "analytical", "published": false}
                ]
            }}))
        );

        let drafts = app
            .run(&Request::new(
                r#"{ draftsByUser(userUniqueInput: {email: "ada@x.com"}) { title } }"#,
            ))
            .await;
        assert_eq!(
            drafts.data,
            Some(json!({"draftsByUser": [{"title": "Notes"}, {"title": "Engine"}]}))
        );
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let app = app().await;

        let response = app
            .run(&Request::new(
                r#"mutation { signupUser(data: {email: "Kratos@email.com"}) { id } }"#,
            ))
            .await;

        assert_eq!(response.data, Some(json!({"signupUser": null})));
        assert_eq!(response.errors[0].message, EMAIL_TAKEN);
        assert_eq!(app.store().count(EntityKind::User).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_drafts_by_user_lookup_rules() {
        let app = app().await;

        let by_id = app
            .run(&Request::new("{ draftsByUser(userUniqueInput: {id: 2}) { id } }"))
            .await;
        assert_eq!(by_id.data, Some(json!({"draftsByUser": [{"id": 3}]})));

        let mismatch = app
            .run(&Request::new(
                r#"{ draftsByUser(userUniqueInput: {id: 2, email: "hadesgod@email.com"}) { id } }"#,
            ))
            .await;
        assert_eq!(mismatch.data, Some(json!({"draftsByUser": null})));

        let empty = app
            .run(&Request::new("{ draftsByUser(userUniqueInput: {}) { id } }"))
            .await;
        assert_eq!(empty.errors[0].kind(), ErrorKind::Argument);
    }

    #[tokio::test]
    async fn test_update_user() {
        let app = app().await;

        let response = app
            .run(&Request::new(
                r#"mutation { updateUser(id: 3, name: "", email: "kratos@sparta.gr") { name email } }"#,
            ))
            .await;
        assert_eq!(
            response.data,
            Some(json!({"updateUser": {"name": "Kratos", "email": "kratos@sparta.gr"}}))
        );

        let taken = app
            .run(&Request::new(
                r#"mutation { updateUser(id: 3, email: "TitonGod@email.com") { id } }"#,
            ))
            .await;
        assert_eq!(taken.errors[0].message, EMAIL_TAKEN);

        let missing = app
            .run(&Request::new("mutation { updateUser(id: 99) { id } }"))
            .await;
        assert_eq!(missing.errors[0].kind(), ErrorKind::NotFound);
        assert_eq!(missing.errors[0].message, "not found user");
    }

    #[tokio::test]
    async fn test_toggle_publish_then_comment() {
        let app = app().await;

        let draft = app
            .run(&Request::new(
                r#"mutation { createComment(text: "x", postId: 3, authorEmail: "Kratos@email.com") { id } }"#,
            ))
            .await;
        assert_eq!(draft.errors[0].message, POST_UNAVAILABLE);

        let toggled = app
            .run(&Request::new("mutation { togglePublishPost(id: 3) { published } }"))
            .await;
        assert_eq!(
            toggled.data,
            Some(json!({"togglePublishPost": {"published": true}}))
        );

        let comment = app
            .run(&Request::new(
                r#"mutation { createComment(text: "x", postId: 3, authorEmail: "Kratos@email.com") { id post { id } author { name } } }"#,
            ))
            .await;
        assert_eq!(
            comment.data,
            Some(json!({"createComment": {"id": 5, "post": {"id": 3}, "author": {"name": "Kratos"}}}))
        );

        let missing = app
            .run(&Request::new("mutation { togglePublishPost(id: 42) { id } }"))
            .await;
        assert_eq!(
            missing.errors[0].message,
            "Post with ID 42 does not exist in the database."
        );
    }

    #[tokio::test]
    async fn test_deletes_are_restricted() {
        let app = app().await;

        let response = app.run(&Request::new("mutation { deleteUser(id: 3) { id } }")).await;
        assert_eq!(response.errors[0].kind(), ErrorKind::Validation);
        assert_eq!(app.store().count(EntityKind::User).await.unwrap(), 3);

        let response = app.run(&Request::new("mutation { deletePost(id: 1) { id } }")).await;
        assert_eq!(response.errors[0].message, "post still has comments");

        let response = app.run(&Request::new("mutation { deletePost(id: 77) { id } }")).await;
        assert_eq!(response.errors[0].kind(), ErrorKind::NotFound);
        assert_eq!(response.errors[0].message, "not found post");
    }

    #[tokio::test]
    async fn test_delete_retires_identifier() {
        let app = app().await;

        app.run(&Request::new(
            r#"mutation { signupUser(data: {email: "temp@x.com"}) { id } }"#,
        ))
        .await;
        let deleted = app.run(&Request::new("mutation { deleteUser(id: 4) { email } }")).await;
        assert_eq!(
            deleted.data,
            Some(json!({"deleteUser": {"email": "temp@x.com"}}))
        );

        let next = app
            .run(&Request::new(
                r#"mutation { signupUser(data: {email: "next@x.com"}) { id } }"#,
            ))
            .await;
        assert_eq!(next.data, Some(json!({"signupUser": {"id": 5}})));
    }

    #[tokio::test]
    async fn test_create_draft_and_update_post() {
        let app = app().await;

        let draft = app
            .run(&Request::new(
                r#"mutation { createDraft(data: {title: "Draft"}, authorEmail: "Kratos@email.com") { id published author { id } } }"#,
            ))
            .await;
        assert_eq!(
            draft.data,
            Some(json!({"createDraft": {"id": 4, "published": false, "author": {"id": 3}}}))
        );

        let updated = app
            .run(&Request::new(
                r#"mutation { updatePost(id: 4, body: "filled in", published: true) { title body published } }"#,
            ))
            .await;
        assert_eq!(
            updated.data,
            Some(json!({"updatePost": {"title": "Draft", "body": "filled in", "published": true}}))
        );

        let unknown_author = app
            .run(&Request::new(
                r#"mutation { createDraft(data: {title: "x"}, authorEmail: "ghost@x.com") { id } }"#,
            ))
            .await;
        assert_eq!(unknown_author.errors[0].message, USER_MISSING);
    }

    #[tokio::test]
    async fn test_create_comment_requires_author() {
        let app = app().await;

        let response = app
            .run(&Request::new(
                r#"mutation { createComment(text: "x", postId: 1, authorEmail: "ghost@x.com") { id } }"#,
            ))
            .await;

        assert_eq!(response.data, Some(json!({"createComment": null})));
        assert_eq!(response.errors[0].kind(), ErrorKind::Validation);
        assert_eq!(response.errors[0].message, USER_MISSING);
        assert_eq!(app.store().count(EntityKind::Comment).await.unwrap(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_cancel_out() {
        const TOGGLES: usize = 16;
        let app = app().await;

        let handles: Vec<_> = (0..TOGGLES)
            .map(|_| {
                let app = app.clone();
                tokio::spawn(async move {
                    app.run(&Request::new("mutation { togglePublishPost(id: 1) { id } }"))
                        .await
                })
            })
            .collect();
        for handle in handles {
            let response = handle.await.unwrap();
            assert!(response.is_ok(), "{:?}", response.errors);
        }

        let post = app.run(&Request::new("{ postById(id: 1) { published } }")).await;
        assert_eq!(
            post.data,
            Some(json!({"postById": {"published": true}}))
        );
    }
}
