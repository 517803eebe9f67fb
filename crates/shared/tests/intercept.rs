use http::StatusCode;
use shared::{
    config::WorkerConfig,
    intercept::{
        isolation::{EMBEDDER_POLICY, OPENER_POLICY},
        navigation, Interceptor, Policy,
    },
    lifecycle::{activate, install},
    memory::{MemoryEnvironment, MemoryRequest, MemoryResponse, Preload},
    model::{RequestMode, ResponseParts},
    WorkerError,
};
use tokio_test::block_on;

const SHELL: &str = "<html>shell</html>";

fn installed() -> MemoryEnvironment {
    let env = MemoryEnvironment::default();
    env.route("/index.html", MemoryResponse::ok(SHELL));
    block_on(install(&env, &WorkerConfig::default())).unwrap();
    env
}

fn interceptor() -> Interceptor {
    Interceptor::new(WorkerConfig::default())
}

fn assert_isolated(response: &MemoryResponse) {
    assert_eq!(response.header(&EMBEDDER_POLICY).as_deref(), Some("require-corp"));
    assert_eq!(response.header(&OPENER_POLICY).as_deref(), Some("same-origin"));
}

#[test]
fn test_priority_order() {
    assert_eq!(Policy::PRIORITY, [Policy::Navigation, Policy::HeaderRewrite]);

    let interceptor = interceptor();
    assert_eq!(interceptor.route(&MemoryRequest::navigate("/")), Policy::Navigation);
    for mode in [RequestMode::SameOrigin, RequestMode::NoCors, RequestMode::Cors] {
        let request = MemoryRequest::new(http::Method::GET, "/app.js", mode);
        assert_eq!(interceptor.route(&request), Policy::HeaderRewrite);
    }
}

#[test]
fn test_subresource_gets_isolation_headers() {
    let env = installed();
    env.route(
        "/app.js",
        MemoryResponse::new(StatusCode::OK, "console.log(1)"),
    );

    let response = block_on(interceptor().handle(&env, &MemoryRequest::subresource("/app.js")))
        .unwrap()
        .unwrap();

    assert_isolated(&response);
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "console.log(1)");
}

#[test]
fn test_conflicting_headers_overwritten() {
    let env = installed();
    env.route(
        "/worker.js",
        MemoryResponse::ok("w")
            .insert_header(EMBEDDER_POLICY, "credentialless")
            .insert_header(OPENER_POLICY, "same-origin-allow-popups"),
    );

    let response =
        block_on(interceptor().handle(&env, &MemoryRequest::subresource("/worker.js")))
            .unwrap()
            .unwrap();

    assert_isolated(&response);
}

#[test]
fn test_error_status_still_isolated() {
    let env = installed();

    let response = block_on(interceptor().handle(&env, &MemoryRequest::subresource("/gone.png")))
        .unwrap()
        .unwrap();

    assert_eq!(response.status, 404);
    assert_isolated(&response);
}

#[test]
fn test_subresource_failure_surfaces() {
    let env = installed();
    env.set_online(false);

    let err = block_on(interceptor().handle(&env, &MemoryRequest::subresource("/app.js")))
        .unwrap_err();

    assert!(matches!(err, WorkerError::Network(_)));
}

#[test]
fn test_subresource_never_falls_back() {
    let env = installed();
    env.abort("/data.json");

    let result = block_on(interceptor().handle(&env, &MemoryRequest::subresource("/data.json")));

    assert!(result.is_err());
}

#[test]
fn test_navigation_online_returns_network_body() {
    let env = installed();
    env.route("/settings", MemoryResponse::ok("live settings"));

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/settings")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), "live settings");
    assert_isolated(&response);
}

#[test]
fn test_navigation_offline_serves_cached_shell() {
    let env = installed();
    env.set_online(false);

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/devices")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), SHELL);
    assert_eq!(response.status, 200);
    assert_isolated(&response);
}

#[test]
fn test_navigation_abort_takes_fallback() {
    let env = installed();
    env.abort("/devices");

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/devices")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), SHELL);
}

#[test]
fn test_navigation_offline_without_install_yields_nothing() {
    let env = MemoryEnvironment::default();
    env.set_online(false);

    let response =
        block_on(interceptor().handle(&env, &MemoryRequest::navigate("/"))).unwrap();

    assert_eq!(response, None);
}

#[test]
fn test_navigation_offline_storage_unavailable_yields_nothing() {
    let env = installed();
    env.set_online(false);
    env.set_storage_available(false);

    let config = WorkerConfig::default();
    assert_eq!(block_on(navigation::offline_fallback(&env, &config)), None);
}

#[test]
fn test_navigation_prefers_preload() {
    let env = installed();
    block_on(activate(&env));
    env.route("/", MemoryResponse::ok("from network"));
    env.preload("/", Preload::Ready(MemoryResponse::ok("from preload")));
    let before = env.fetches().len();

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), "from preload");
    assert_isolated(&response);
    assert_eq!(env.fetches().len(), before);
}

#[test]
fn test_navigation_without_preload_goes_to_network() {
    let env = installed();
    block_on(activate(&env));
    env.route("/", MemoryResponse::ok("from network"));

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), "from network");
}

#[test]
fn test_failed_preload_takes_fallback() {
    let env = installed();
    block_on(activate(&env));
    env.route("/", MemoryResponse::ok("from network"));
    env.preload("/", Preload::Failed);

    let response = block_on(interceptor().handle(&env, &MemoryRequest::navigate("/")))
        .unwrap()
        .unwrap();

    assert_eq!(response.text(), SHELL);
}

#[test]
fn test_opaque_response_fails_request() {
    let env = installed();
    env.route("https://localhost/cdn/font.woff2", MemoryResponse::opaque());

    let request = MemoryRequest::new(http::Method::GET, "/cdn/font.woff2", RequestMode::NoCors);
    let err = block_on(interceptor().handle(&env, &request)).unwrap_err();

    assert!(matches!(err, WorkerError::Platform(_)));
}
