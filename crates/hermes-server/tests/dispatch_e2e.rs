//! End-to-end tests driving the dispatcher with in-memory requests.

use bytes::Bytes;
use flate2::read::GzDecoder;
use hermes_authz::{AuthorizationRequest, SecurityScheme};
use hermes_core::{Body, HermesError, RequestContext, Service, SCOPE_ATTRIBUTE};
use hermes_router::ValidationError;
use hermes_server::{
    Decoration, Dispatcher, DispatcherBuilder, EndpointSpec, HttpResponse, ServerConfig, ServiceBuilder,
};
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

struct Users {
    ctx: RequestContext,
}

impl Service for Users {
    fn instantiate(ctx: RequestContext) -> Self {
        Self { ctx }
    }
}

impl Users {
    fn get(&self, id: i64) -> Result<User, HermesError> {
        Ok(User {
            id,
            name: format!("user {id}"),
        })
    }

    fn card(&self, id: i64) -> Result<String, HermesError> {
        Ok(format!("user {id}"))
    }

    fn search(&self, name: String, limit: i32) -> Result<Value, HermesError> {
        Ok(json!({ "name": name, "limit": limit }))
    }

    fn create(&self, user: Body<NewUser>) -> Result<User, HermesError> {
        Ok(User {
            id: 1,
            name: user.into_inner().name,
        })
    }

    fn remove(&self, _id: i64) -> Result<(), HermesError> {
        self.ctx.set_status(StatusCode::NO_CONTENT);
        Ok(())
    }

    fn boom(&self) -> Result<String, HermesError> {
        panic!("kaboom")
    }

    fn big(&self) -> Result<String, HermesError> {
        Ok("x".repeat(2048))
    }
}

struct Files;

impl Service for Files {
    fn instantiate(_ctx: RequestContext) -> Self {
        Files
    }
}

impl Files {
    fn read(&self, parts: Vec<String>) -> Result<Vec<String>, HermesError> {
        Ok(parts)
    }

    fn fixed(&self, x: String) -> Result<String, HermesError> {
        Ok(format!("fixed:{x}"))
    }

    fn other(&self, x: String) -> Result<String, HermesError> {
        Ok(format!("other:{x}"))
    }

    fn points(&self, values: Vec<f64>) -> Result<Vec<f64>, HermesError> {
        Ok(values)
    }
}

static REPORT_CALLS: AtomicUsize = AtomicUsize::new(0);

struct Reports;

impl Service for Reports {
    fn instantiate(_ctx: RequestContext) -> Self {
        Reports
    }
}

impl Reports {
    fn nested(&self) -> Result<Value, HermesError> {
        REPORT_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "owner": { "name": "ada" } }))
    }

    fn rows(&self) -> Result<Vec<String>, HermesError> {
        REPORT_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["a".into(), "b".into()])
    }

    fn flat(&self) -> Result<Value, HermesError> {
        Ok(json!({ "name": "ada", "tags": ["x", "y"] }))
    }
}

fn reports() -> ServiceBuilder<Reports> {
    let form = ["application/x-www-form-urlencoded"];
    ServiceBuilder::<Reports>::new("/reports")
        .produces(form)
        .endpoint("nested", EndpointSpec::get("/nested").output("map[string]Owner"), Reports::nested)
        .endpoint("rows", EndpointSpec::get("/rows").output("[]string"), Reports::rows)
        .endpoint("flat", EndpointSpec::get("/flat").output("Report"), Reports::flat)
}

struct Docs;

impl Service for Docs {
    fn instantiate(_ctx: RequestContext) -> Self {
        Docs
    }
}

impl Docs {
    fn get(&self, id: i64) -> Result<Value, HermesError> {
        Ok(json!({ "doc": id }))
    }
}

fn users() -> ServiceBuilder<Users> {
    ServiceBuilder::<Users>::new("/users")
        .endpoint("get", EndpointSpec::get("/{id:int}").output("User"), Users::get)
        .endpoint(
            "card",
            EndpointSpec::get("/{id:int}/card")
                .output("string")
                .produces(["application/json", "text/plain"]),
            Users::card,
        )
        .endpoint(
            "search",
            EndpointSpec::get("/search?{name:string}&{limit:int32}").output("map[string]string"),
            Users::search,
        )
        .endpoint("create", EndpointSpec::post("/").body("NewUser").output("User"), Users::create)
        .endpoint("remove", EndpointSpec::delete("/{id:int}"), Users::remove)
        .endpoint("boom", EndpointSpec::get("/boom").output("string"), Users::boom)
        .endpoint("big", EndpointSpec::get("/big").output("string").gzip(true), Users::big)
}

fn files() -> ServiceBuilder<Files> {
    ServiceBuilder::<Files>::new("/")
        .endpoint("read", EndpointSpec::get("/files/{...:string}").output("[]string"), Files::read)
        .endpoint("fixed", EndpointSpec::get("/a/fixed/{x:string}").output("string"), Files::fixed)
        .endpoint("other", EndpointSpec::get("/a/other/{x:string}").output("string"), Files::other)
        .endpoint("points", EndpointSpec::get("/points/{...:float64}").output("[]float64"), Files::points)
}

fn docs() -> ServiceBuilder<Docs> {
    ServiceBuilder::<Docs>::new("/docs").endpoint(
        "get",
        EndpointSpec::get("/{id:int}")
            .output("Doc")
            .security("oauth:[read[{id}]]"),
        Docs::get,
    )
}

fn oauth(builder: DispatcherBuilder, seen: Arc<Mutex<Vec<String>>>) -> DispatcherBuilder {
    builder
        .security_scheme("oauth", SecurityScheme::oauth2())
        .authorizer("oauth", move |req: &AuthorizationRequest<'_>| {
            seen.lock().unwrap().extend(req.scopes.iter().cloned());
            if req.credential != "good" {
                return false;
            }
            req.context.set_session_attribute(SCOPE_ATTRIBUTE, json!(["reader"]));
            true
        })
}

fn dispatcher() -> Dispatcher {
    oauth(Dispatcher::builder(), Arc::new(Mutex::new(Vec::new())))
        .service(users())
        .service(files())
        .service(docs())
        .service(reports())
        .build()
        .unwrap()
}

fn get(uri: &str) -> Request<Bytes> {
    Request::get(uri).body(Bytes::new()).unwrap()
}

async fn body_bytes(response: HttpResponse) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: HttpResponse) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_path_param_binds_typed_value() {
    let response = dispatcher().dispatch(get("/users/42")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_json(response).await, json!({ "id": 42, "name": "user 42" }));
}

#[tokio::test]
async fn test_wrongly_typed_path_value_is_400() {
    let response = dispatcher().dispatch(get("/users/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_variable_length_binds_declared_element_type() {
    let dispatcher = dispatcher();
    let response = dispatcher.dispatch(get("/points/1.5/2.0")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([1.5, 2.0]));

    let response = dispatcher.dispatch(get("/points/1.5/north")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unencodable_output_is_500_after_handler_ran() {
    let dispatcher = dispatcher();

    let response = dispatcher.dispatch(get("/reports/flat")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-www-form-urlencoded"
    );
    assert_eq!(&body_bytes(response).await[..], b"name=ada&tags=x&tags=y");

    for uri in ["/reports/nested", "/reports/rows"] {
        let before = REPORT_CALLS.load(Ordering::SeqCst);
        let response = dispatcher.dispatch(get(uri)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body_json(response).await["error"]["code"], "INTERNAL_ERROR", "{uri}");
        assert!(REPORT_CALLS.load(Ordering::SeqCst) > before, "{uri} handler did not run");
    }
}

#[tokio::test]
async fn test_unmatched_route_is_404() {
    let dispatcher = dispatcher();
    for uri in ["/accounts/abc", "/nothing/here", "/users/42/extra/segments"] {
        let response = dispatcher.dispatch(get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    let response = dispatcher.dispatch(get("/nothing")).await;
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_query_params_bind_zero_values() {
    let dispatcher = dispatcher();
    let response = dispatcher.dispatch(get("/users/search")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "name": "", "limit": 0 }));

    let response = dispatcher.dispatch(get("/users/search?limit=5&name=ada%20l")).await;
    assert_eq!(body_json(response).await, json!({ "name": "ada l", "limit": 5 }));
}

#[tokio::test]
async fn test_bad_query_is_400() {
    let dispatcher = dispatcher();
    let response = dispatcher.dispatch(get("/users/search?limit=lots")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = dispatcher.dispatch(get("/users/search?name=%zz")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_path_escape_is_400() {
    let response = dispatcher().dispatch(get("/files/a%zzb")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_binds_body_and_defaults_to_201() {
    let request = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(r#"{"name":"ada"}"#))
        .unwrap();
    let response = dispatcher().dispatch(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({ "id": 1, "name": "ada" }));
}

#[tokio::test]
async fn test_body_errors_are_400() {
    let dispatcher = dispatcher();

    let wrong_type = Request::post("/users")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Bytes::from("ada"))
        .unwrap();
    assert_eq!(dispatcher.dispatch(wrong_type).await.status(), StatusCode::BAD_REQUEST);

    let broken = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from("{"))
        .unwrap();
    assert_eq!(dispatcher.dispatch(broken).await.status(), StatusCode::BAD_REQUEST);

    let wrong_shape = Request::post("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(r#"[{"name":"ada"}]"#))
        .unwrap();
    assert_eq!(dispatcher.dispatch(wrong_shape).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_override_without_output() {
    let request = Request::delete("/users/3").body(Bytes::new()).unwrap();
    let response = dispatcher().dispatch(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!response.headers().contains_key(header::CONTENT_TYPE));
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_handler_panic_is_500() {
    let response = dispatcher().dispatch(get("/users/boom")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_variable_length_collects_trailing_segments() {
    let response = dispatcher().dispatch(get("/files/a/b/c")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["a", "b", "c"]));
}

#[tokio::test]
async fn test_differing_literals_route_apart() {
    let dispatcher = dispatcher();
    let fixed = dispatcher.dispatch(get("/a/fixed/1")).await;
    assert_eq!(body_json(fixed).await, json!("fixed:1"));
    let other = dispatcher.dispatch(get("/a/other/1")).await;
    assert_eq!(body_json(other).await, json!("other:1"));
}

#[tokio::test]
async fn test_security_interpolates_scopes() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = oauth(Dispatcher::builder(), Arc::clone(&seen))
        .service(docs())
        .build()
        .unwrap();

    let denied = dispatcher.dispatch(get("/docs/42")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let request = Request::get("/docs/42")
        .header(header::AUTHORIZATION, "Bearer good")
        .body(Bytes::new())
        .unwrap();
    let allowed = dispatcher.dispatch(request).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(body_json(allowed).await, json!({ "doc": 42 }));

    assert_eq!(seen.lock().unwrap().as_slice(), &["read[42]", "read[42]"]);
}

#[tokio::test]
async fn test_output_negotiation() {
    let dispatcher = dispatcher();

    let request = Request::get("/users/7/card")
        .header(header::ACCEPT, "text/plain")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_bytes(response).await, "user 7");

    let response = dispatcher.dispatch(get("/users/7/card")).await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_bytes(response).await, "\"user 7\"");
}

#[tokio::test]
async fn test_gzip_only_when_accepted() {
    let dispatcher = dispatcher();

    let plain = dispatcher.dispatch(get("/users/big")).await;
    assert!(!plain.headers().contains_key(header::CONTENT_ENCODING));

    let request = Request::get("/users/big")
        .header(header::ACCEPT_ENCODING, "gzip, deflate")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    let compressed = body_bytes(response).await;
    let mut decoded = String::new();
    GzDecoder::new(compressed.as_ref())
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, format!("\"{}\"", "x".repeat(2048)));

    let request = Request::get("/users/42")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(request).await;
    assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
}

#[tokio::test]
async fn test_cors_preflight_and_headers() {
    let dispatcher = Dispatcher::builder()
        .config(ServerConfig::builder().allow_origin("https://app.local").build())
        .service(users())
        .build()
        .unwrap();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/anything")
        .header(header::ORIGIN, "https://app.local")
        .body(Bytes::new())
        .unwrap();
    let response = dispatcher.dispatch(preflight).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.local"
    );
    assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));

    let response = dispatcher.dispatch(get("/users/1")).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.local"
    );
}

#[tokio::test]
async fn test_decorator_sees_base_url_and_scopes() {
    let dispatcher = oauth(Dispatcher::builder(), Arc::new(Mutex::new(Vec::new())))
        .decorator(|decoration: &Decoration<'_>, mut payload: Value| {
            payload["_base"] = json!(decoration.base_url);
            payload["_scopes"] = json!(decoration.scopes);
            payload["_mime"] = json!(decoration.mime);
            Ok(payload)
        })
        .service(docs())
        .build()
        .unwrap();

    let request = Request::get("/docs/5")
        .header(header::HOST, "api.local")
        .header(header::AUTHORIZATION, "Bearer good")
        .body(Bytes::new())
        .unwrap();
    let body = body_json(dispatcher.dispatch(request).await).await;
    assert_eq!(
        body,
        json!({
            "doc": 5,
            "_base": "http://api.local",
            "_scopes": ["reader"],
            "_mime": "application/json"
        })
    );
}

#[tokio::test]
async fn test_root_path_and_prefix_are_prepended() {
    let dispatcher = Dispatcher::builder()
        .config(ServerConfig::builder().root_path("/api").build())
        .service_on_path("/v1", users())
        .build()
        .unwrap();
    let response = dispatcher.dispatch(get("/api/v1/users/9")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(dispatcher.dispatch(get("/users/9")).await.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_path_security_summary() {
    let summary = dispatcher().path_security();
    let docs = summary
        .iter()
        .find(|entry| entry.path == "/docs/{id}")
        .unwrap();
    assert_eq!(docs.method, Method::GET);
    assert_eq!(docs.scopes, vec!["read[{id}]"]);
    let files = summary
        .iter()
        .find(|entry| entry.path == "/files/{...}")
        .unwrap();
    assert!(files.scopes.is_empty());
}

#[test]
fn test_handler_mismatch_is_rejected() {
    let err = Dispatcher::builder()
        .service(ServiceBuilder::<Files>::new("/x").endpoint(
            "fixed",
            EndpointSpec::get("/{id:int}").output("string"),
            Files::fixed,
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, ValidationError::HandlerMismatch { .. }), "{err}");
}

#[test]
fn test_unknown_scheme_is_rejected() {
    let err = Dispatcher::builder().service(docs()).build().unwrap_err();
    assert!(matches!(err, ValidationError::UnknownSecurityScheme { .. }), "{err}");
}

#[test]
fn test_unsupported_mime_is_rejected() {
    let err = Dispatcher::builder()
        .service(ServiceBuilder::<Files>::new("/x").endpoint(
            "fixed",
            EndpointSpec::get("/{x:string}")
                .output("string")
                .produces(["application/xml"]),
            Files::fixed,
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnsupportedMime { .. }), "{err}");
}

#[test]
fn test_duplicate_signature_is_rejected() {
    let err = Dispatcher::builder()
        .service(
            ServiceBuilder::<Files>::new("/x")
                .endpoint("fixed", EndpointSpec::get("/{x:string}").output("string"), Files::fixed)
                .endpoint("other", EndpointSpec::get("/{y:string}").output("string"), Files::other),
        )
        .build()
        .unwrap_err();
    assert!(
        matches!(
            err,
            ValidationError::DuplicateSignature { .. } | ValidationError::AmbiguousSignature { .. }
        ),
        "{err}"
    );
}

#[test]
fn test_duplicate_operation_is_rejected() {
    let err = Dispatcher::builder()
        .service(
            ServiceBuilder::<Files>::new("/x")
                .endpoint("fixed", EndpointSpec::get("/a/{x:string}").output("string"), Files::fixed)
                .endpoint("fixed", EndpointSpec::get("/b/{x:string}").output("string"), Files::other),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateOperation { .. }), "{err}");
}

#[tokio::test]
async fn test_basic_credentials_are_decoded() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let dispatcher = Dispatcher::builder()
        .security_scheme("basic", SecurityScheme::basic())
        .authorizer("basic", |req: &AuthorizationRequest<'_>| req.credential == "ada:secret")
        .service(ServiceBuilder::<Docs>::new("/docs").endpoint(
            "get",
            EndpointSpec::get("/{id:int}").output("Doc").security("basic"),
            Docs::get,
        ))
        .build()
        .unwrap();

    let request = Request::get("/docs/1")
        .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("ada:secret")))
        .body(Bytes::new())
        .unwrap();
    assert_eq!(dispatcher.dispatch(request).await.status(), StatusCode::OK);

    let request = Request::get("/docs/1")
        .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("ada:wrong")))
        .body(Bytes::new())
        .unwrap();
    assert_eq!(dispatcher.dispatch(request).await.status(), StatusCode::UNAUTHORIZED);
}
