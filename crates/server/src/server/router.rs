//! Axum router construction.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use super::{access, access::AccessTable, handlers, middleware, state::AppState};
use crate::auth::USER_ROLE;

/// Route paths. Each one is also the operation name in the [`AccessTable`].
pub mod ops {
    pub const REGISTER: &str = "/v1/auth/register";
    pub const LOGIN: &str = "/v1/auth/login";

    pub const ACCOUNTS_ADD: &str = "/v1/accounts/add";
    pub const ACCOUNTS_GET: &str = "/v1/accounts/get";
    pub const ACCOUNTS_SEARCH: &str = "/v1/accounts/search";
    pub const ACCOUNTS_REMOVE: &str = "/v1/accounts/remove";

    pub const CARDS_ADD: &str = "/v1/cards/add";
    pub const CARDS_GET: &str = "/v1/cards/get";
    pub const CARDS_SEARCH: &str = "/v1/cards/search";
    pub const CARDS_REMOVE: &str = "/v1/cards/remove";

    pub const NOTES_ADD: &str = "/v1/notes/add";
    pub const NOTES_GET: &str = "/v1/notes/get";
    pub const NOTES_SEARCH: &str = "/v1/notes/search";
    pub const NOTES_REMOVE: &str = "/v1/notes/remove";

    pub const FILES_ADD: &str = "/v1/files/add";
    pub const FILES_GET: &str = "/v1/files/get";
    pub const FILES_SEARCH: &str = "/v1/files/search";
    pub const FILES_REMOVE: &str = "/v1/files/remove";

    pub const SYNC_GET: &str = "/v1/sync/get";

    pub const HEALTH: &str = "/health";

    /// Every operation that requires an authenticated caller.
    pub const PROTECTED: [&str; 17] = [
        ACCOUNTS_ADD,
        ACCOUNTS_GET,
        ACCOUNTS_SEARCH,
        ACCOUNTS_REMOVE,
        CARDS_ADD,
        CARDS_GET,
        CARDS_SEARCH,
        CARDS_REMOVE,
        NOTES_ADD,
        NOTES_GET,
        NOTES_SEARCH,
        NOTES_REMOVE,
        FILES_ADD,
        FILES_GET,
        FILES_SEARCH,
        FILES_REMOVE,
        SYNC_GET,
    ];
}

/// Every protected operation is open to [`USER_ROLE`] and nothing else.
pub fn access_table() -> AccessTable {
    AccessTable::new(ops::PROTECTED.map(|op| (op, vec![USER_ROLE])))
}

/// Build the application [`Router`] with all routes and middleware attached.
///
/// `max_body_bytes` caps every request body, including base64 file content.
pub fn build(state: AppState, request_timeout: Duration, max_body_bytes: usize) -> Router {
    let routes = Router::new()
        .route(ops::REGISTER, post(handlers::auth::register))
        .route(ops::LOGIN, post(handlers::auth::login))
        .route(ops::ACCOUNTS_ADD, post(handlers::accounts::add))
        .route(ops::ACCOUNTS_GET, post(handlers::accounts::get))
        .route(ops::ACCOUNTS_SEARCH, post(handlers::accounts::search))
        .route(ops::ACCOUNTS_REMOVE, post(handlers::accounts::remove))
        .route(ops::CARDS_ADD, post(handlers::cards::add))
        .route(ops::CARDS_GET, post(handlers::cards::get))
        .route(ops::CARDS_SEARCH, post(handlers::cards::search))
        .route(ops::CARDS_REMOVE, post(handlers::cards::remove))
        .route(ops::NOTES_ADD, post(handlers::notes::add))
        .route(ops::NOTES_GET, post(handlers::notes::get))
        .route(ops::NOTES_SEARCH, post(handlers::notes::search))
        .route(ops::NOTES_REMOVE, post(handlers::notes::remove))
        .route(ops::FILES_ADD, post(handlers::files::add))
        .route(ops::FILES_GET, post(handlers::files::get))
        .route(ops::FILES_SEARCH, post(handlers::files::search))
        .route(ops::FILES_REMOVE, post(handlers::files::remove))
        .route(ops::SYNC_GET, post(handlers::sync::get))
        .route(ops::HEALTH, get(handlers::health))
        .route_layer(from_fn_with_state(state.clone(), access::authorize))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes));

    middleware::with_middleware(routes, request_timeout).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::TokenService;
    use crate::crypto::{test_key, BlobCipher, FieldCipher};
    use crate::server::access::AuthenticatedOwner;
    use crate::server::state::Backends;
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, HeaderValue, Request, StatusCode},
    };
    use axum_test::TestServer;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use common::protocol::{
        AccountItem, AccountSecret, ErrorResponse, FileSecret, LoginResponse, MutationResponse,
        RegisterResponse, SearchResponse, SyncResponse,
    };
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state_with(access: AccessTable) -> AppState {
        AppState::new(
            Backends::in_memory(),
            FieldCipher::new(test_key()),
            BlobCipher::new(test_key()),
            Arc::new(TokenService::new("router-test-key", Duration::from_secs(300)).unwrap()),
            access,
        )
    }

    fn test_state() -> AppState {
        test_state_with(access_table())
    }

    fn app(state: AppState) -> Router {
        build(state, middleware::REQUEST_TIMEOUT, middleware::MAX_BODY_BYTES)
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    async fn signed_in(server: &TestServer, login: &str) -> HeaderValue {
        let creds = json!({"login": login, "password": "P@ssWord!"});
        server
            .post(ops::REGISTER)
            .json(&creds)
            .await
            .assert_status_ok();
        let login: LoginResponse = server.post(ops::LOGIN).json(&creds).await.json();
        bearer(&login.token)
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = app(test_state());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app(test_state());
        let req = Request::builder()
            .uri(ops::HEALTH)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn every_protected_op_allows_only_user() {
        let table = access_table();
        for op in ops::PROTECTED {
            assert_eq!(table.allowed_roles(op), Some(&[USER_ROLE][..]), "{op}");
        }
        assert_eq!(table.allowed_roles(ops::LOGIN), None);
        assert_eq!(table.allowed_roles(ops::REGISTER), None);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let server = TestServer::new(app(test_state())).unwrap();
        let resp = server
            .post(ops::ACCOUNTS_SEARCH)
            .json(&json!({"limit": 10}))
            .await;
        resp.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(resp.json::<ErrorResponse>().code, "unauthenticated");
    }

    #[tokio::test]
    async fn forged_token_is_unauthenticated() {
        let server = TestServer::new(app(test_state())).unwrap();
        let foreign = TokenService::new("someone-else", Duration::from_secs(60)).unwrap();
        let token = foreign.generate(&Uuid::new_v4().to_string(), USER_ROLE);
        server
            .post(ops::NOTES_SEARCH)
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({"limit": 10}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_role_is_permission_denied() {
        let state = test_state();
        let token = state.tokens.generate(&Uuid::new_v4().to_string(), "auditor");
        let server = TestServer::new(app(state)).unwrap();
        let resp = server
            .post(ops::CARDS_SEARCH)
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({"limit": 10}))
            .await;
        resp.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(resp.json::<ErrorResponse>().code, "permission_denied");
    }

    #[tokio::test]
    async fn allowed_role_injects_token_subject() {
        let state = test_state_with(AccessTable::new([("/whoami", vec![USER_ROLE])]));
        let owner = Uuid::new_v4();
        let token = state.tokens.generate(&owner.to_string(), USER_ROLE);

        let app = Router::new()
            .route(
                "/whoami",
                post(|AuthenticatedOwner(id): AuthenticatedOwner| async move { id.to_string() }),
            )
            .route_layer(from_fn_with_state(state.clone(), access::authorize))
            .with_state(state);
        let server = TestServer::new(app).unwrap();

        let resp = server
            .post("/whoami")
            .add_header(AUTHORIZATION, HeaderValue::from_str(&token).unwrap())
            .await;
        resp.assert_status_ok();
        assert_eq!(resp.text(), owner.to_string());
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn handler_panic_becomes_internal_error() {
        let app = middleware::with_middleware(
            Router::new()
                .route("/boom", post(explode))
                .route("/fine", post(|| async { "ok" })),
            middleware::REQUEST_TIMEOUT,
        );
        let server = TestServer::new(app).unwrap();

        let resp = server.post("/boom").await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = resp.json();
        assert_eq!(body.code, "internal");
        assert!(!body.message.contains("exploded"));

        server.post("/fine").await.assert_status_ok();
    }

    #[tokio::test]
    async fn register_twice_conflicts_and_bad_password_is_rejected() {
        let server = TestServer::new(app(test_state())).unwrap();
        let creds = json!({"login": "alice", "password": "pw"});

        let registered: RegisterResponse = server.post(ops::REGISTER).json(&creds).await.json();
        assert!(Uuid::parse_str(&registered.user_id).is_ok());

        server
            .post(ops::REGISTER)
            .json(&creds)
            .await
            .assert_status(StatusCode::CONFLICT);
        server
            .post(ops::LOGIN)
            .json(&json!({"login": "alice", "password": "nope"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_argument() {
        let server = TestServer::new(app(test_state())).unwrap();
        let auth = signed_in(&server, "alice").await;
        let resp = server
            .post(ops::NOTES_ADD)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"name": 42}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<ErrorResponse>().code, "invalid_argument");
    }

    #[tokio::test]
    async fn account_lifecycle_end_to_end() {
        let server = TestServer::new(app(test_state())).unwrap();
        let auth = signed_in(&server, "alice").await;

        server
            .post(ops::SYNC_GET)
            .add_header(AUTHORIZATION, auth.clone())
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let added: MutationResponse = server
            .post(ops::ACCOUNTS_ADD)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({
                "login": "user",
                "server": "https://test.com",
                "password": "P@ssWord!",
            }))
            .await
            .json();

        let secret: AccountSecret = server
            .post(ops::ACCOUNTS_GET)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"id": added.id}))
            .await
            .json();
        assert_eq!(secret.login, "user");
        assert_eq!(secret.server, "https://test.com");
        assert_eq!(secret.password, "P@ssWord!");

        let found: SearchResponse<AccountItem> = server
            .post(ops::ACCOUNTS_SEARCH)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"substring": "test", "offset": 0, "limit": 100}))
            .await
            .json();
        assert_eq!(found.count, 1);
        assert_eq!(
            found.items,
            vec![AccountItem {
                id: added.id.clone(),
                login: "user".into(),
                server: "https://test.com".into(),
            }]
        );

        let after_add: SyncResponse = server
            .post(ops::SYNC_GET)
            .add_header(AUTHORIZATION, auth.clone())
            .await
            .json();

        server
            .post(ops::ACCOUNTS_REMOVE)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"id": added.id}))
            .await
            .assert_status_ok();

        let after_remove: SyncResponse = server
            .post(ops::SYNC_GET)
            .add_header(AUTHORIZATION, auth.clone())
            .await
            .json();
        assert!(after_remove.timestamp >= after_add.timestamp);

        server
            .post(ops::ACCOUNTS_GET)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"id": added.id}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn records_are_invisible_to_other_owners() {
        let server = TestServer::new(app(test_state())).unwrap();
        let alice = signed_in(&server, "alice").await;
        let bob = signed_in(&server, "bob").await;

        let added: MutationResponse = server
            .post(ops::NOTES_ADD)
            .add_header(AUTHORIZATION, alice.clone())
            .json(&json!({"name": "diary", "content": "dear diary"}))
            .await
            .json();

        let stolen = server
            .post(ops::NOTES_GET)
            .add_header(AUTHORIZATION, bob.clone())
            .json(&json!({"id": added.id}))
            .await;
        let missing = server
            .post(ops::NOTES_GET)
            .add_header(AUTHORIZATION, bob.clone())
            .json(&json!({"id": Uuid::new_v4().to_string()}))
            .await;
        stolen.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(stolen.text(), missing.text());

        server
            .post(ops::NOTES_REMOVE)
            .add_header(AUTHORIZATION, bob)
            .json(&json!({"id": added.id}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post(ops::NOTES_GET)
            .add_header(AUTHORIZATION, alice)
            .json(&json!({"id": added.id}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn file_round_trip_as_base64() {
        let server = TestServer::new(app(test_state())).unwrap();
        let auth = signed_in(&server, "alice").await;

        let added: MutationResponse = server
            .post(ops::FILES_ADD)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"name": "id_rsa", "content": "AAEC/w==", "meta": "laptop key"}))
            .await
            .json();

        let file: FileSecret = server
            .post(ops::FILES_GET)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"id": added.id}))
            .await
            .json();
        assert_eq!(file.content, vec![0, 1, 2, 255]);
        assert_eq!(file.meta, "laptop key");

        server
            .post(ops::FILES_ADD)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"name": "id_rsa", "content": "AA=="}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn zero_limit_search_is_rejected() {
        let server = TestServer::new(app(test_state())).unwrap();
        let auth = signed_in(&server, "alice").await;
        server
            .post(ops::CARDS_SEARCH)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"substring": "", "limit": 0}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multi_megabyte_file_fits_the_body_limit() {
        let server = TestServer::new(app(test_state())).unwrap();
        let auth = signed_in(&server, "alice").await;
        let content: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();

        let added: MutationResponse = server
            .post(ops::FILES_ADD)
            .add_header(AUTHORIZATION, auth.clone())
            .json(&json!({"name": "backup.tar", "content": STANDARD.encode(&content)}))
            .await
            .json();

        let file: FileSecret = server
            .post(ops::FILES_GET)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"id": added.id}))
            .await
            .json();
        assert_eq!(file.content.len(), content.len());
        assert!(file.content == content);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_the_handler() {
        let app = build(test_state(), middleware::REQUEST_TIMEOUT, 1024);
        let server = TestServer::new(app).unwrap();
        let auth = signed_in(&server, "alice").await;
        server
            .post(ops::FILES_ADD)
            .add_header(AUTHORIZATION, auth)
            .json(&json!({"name": "big.bin", "content": STANDARD.encode([7u8; 4096])}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
