// ============================================================================
// Aula API - Router
// File: crates/aula-api/src/router.rs
// ============================================================================
//! Route table and the layers shared by every route

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers::{auth, orders, products, records, system, tasks};
use crate::middleware::request_logging;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/perfil", get(auth::profile));

    let system_routes = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health_check))
        .route("/metrics", get(system::metrics))
        .route("/estatisticas", get(tasks::statistics))
        .route("/sistema/limpar-sessoes", post(system::sweep_sessions));

    let report_routes = Router::new()
        .route("/estatisticas/produtos", get(products::statistics))
        .route("/categorias", get(products::categories))
        .route("/categorias/{categoria}", get(products::by_category))
        .route("/relatorios/vendas", get(orders::sales_report));

    let record_routes = Router::new()
        .route("/{collection}/{id}/concluir", patch(tasks::complete))
        .route("/{collection}", get(records::list).post(records::create))
        .route(
            "/{collection}/{id}",
            get(records::get)
                .put(records::update)
                .patch(records::update)
                .delete(records::delete),
        );

    Router::new()
        .merge(auth_routes)
        .merge(system_routes)
        .merge(report_routes)
        .merge(record_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::default().include_headers(false)),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::SystemClock;
    use aula_shared::config::AppConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        app_with(AppConfig::default_config().unwrap())
    }

    fn app_with(config: AppConfig) -> Router {
        build_router(AppState::build(config, Arc::new(SystemClock)).unwrap())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router) -> String {
        let response = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "admin@sistema.com", "senha": "123456"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_login_scenarios() {
        let app = app();

        let response = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "admin@sistema.com", "senha": "123456"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["expires_in"], 86_400);

        let response = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "admin@sistema.com", "senha": "errada"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["code"], 401);
        assert_eq!(body["error"], "AuthenticationError");

        let health = json_body(send(&app, Method::GET, "/health", None, None).await).await;
        assert_eq!(health["active_sessions"], 1);
        assert_eq!(health["collections"]["usuarios"], 1);
    }

    #[tokio::test]
    async fn test_login_body_validation() {
        let app = app();
        let response = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "not-an-email", "senha": "123456"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::POST, "/auth/login", None, Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_produtos_scenario() {
        let app = app();
        let token = login(&app).await;

        let response = send(
            &app,
            Method::POST,
            "/produtos",
            Some(&token),
            Some(json!({"nome": "Ana", "preco": 10})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["id"], 1);

        let listed = json_body(send(&app, Method::GET, "/produtos", None, None).await).await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], 1);
        assert_eq!(listed[0]["nome"], "Ana");
        assert_eq!(listed[0]["preco"], 10);

        let response = send(
            &app,
            Method::POST,
            "/produtos",
            Some(&token),
            Some(json!({"nome": "Ana", "preco": 10})),
        )
        .await;
        assert_eq!(json_body(response).await["id"], 2);
    }

    #[tokio::test]
    async fn test_record_lifecycle() {
        let app = app();
        let token = login(&app).await;

        let created = json_body(
            send(
                &app,
                Method::POST,
                "/produtos",
                Some(&token),
                Some(json!({"nome": "Bola", "preco": 50, "categoria": "Esportes"})),
            )
            .await,
        )
        .await;
        let uri = format!("/produtos/{}", created["id"]);

        let response =
            send(&app, Method::PATCH, &uri, Some(&token), Some(json!({"preco": 45.5}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = json_body(send(&app, Method::GET, &uri, None, None).await).await;
        assert_eq!(fetched["preco"], 45.5);
        assert_eq!(fetched["categoria"], "Esportes");

        let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let token = login(&app).await;

        let response = send(&app, Method::GET, "/livros", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::DELETE, "/livros/1", Some("bogus"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            Method::POST,
            "/produtos",
            None,
            Some(json!({"nome": "Bola", "preco": 5})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            Method::POST,
            "/produtos",
            Some(&token),
            Some(json!({"nome": "Bola", "preco": -5})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::GET, "/produtos?limit=muitos", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::GET, "/produtos/abc", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::POST,
            "/usuarios",
            None,
            Some(json!({"nome": "Bia", "email": "bia@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // admin is usuarios/1, so usuarios/2 belongs to someone else
        send(
            &app,
            Method::POST,
            "/usuarios",
            None,
            Some(json!({"nome": "Bia Reis", "email": "bia@x.com"})),
        )
        .await;
        let response = send(&app, Method::DELETE, "/usuarios/2", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_rejected() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/usuarios")
            .header(header::AUTHORIZATION, "Basic YWRtaW46MTIzNDU2")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"nome": "Bia Reis", "email": "bia@x.com"}).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let app = app();
        let token = login(&app).await;

        for _ in 0..2 {
            let response = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = send(&app, Method::GET, "/auth/perfil", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::POST, "/auth/logout", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_and_task_flow() {
        let app = app();
        let token = login(&app).await;

        let profile = json_body(send(&app, Method::GET, "/auth/perfil", Some(&token), None).await).await;
        assert_eq!(profile["id"], 1);
        assert_eq!(profile["email"], "admin@sistema.com");

        let task = json_body(
            send(
                &app,
                Method::POST,
                "/tarefas",
                Some(&token),
                Some(json!({"titulo": "Implementar API"})),
            )
            .await,
        )
        .await;
        assert_eq!(task["owner_id"], 1);
        let uri = format!("/tarefas/{}/concluir", task["id"]);

        let response = send(&app, Method::PATCH, &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["concluida"], true);

        let response = send(&app, Method::PATCH, &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let stats = json_body(send(&app, Method::GET, "/estatisticas", Some(&token), None).await).await;
        assert_eq!(stats["total_tarefas"], 1);
        assert_eq!(stats["tarefas_concluidas"], 1);
        assert_eq!(stats["taxa_conclusao"], 100.0);
    }

    #[tokio::test]
    async fn test_response_headers() {
        let app = app();
        let response = send(&app, Method::GET, "/health", None, None).await;
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-process-time"));
    }

    #[tokio::test]
    async fn test_admin_record_cannot_be_deleted() {
        let app = app();
        let token = login(&app).await;

        let response = send(&app, Method::DELETE, "/usuarios/1", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, Method::GET, "/auth/perfil", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        for email in ["admin@sistema.com", "ADMIN@Sistema.com"] {
            let response = send(
                &app,
                Method::POST,
                "/usuarios",
                None,
                Some(json!({"nome": "Outro Admin", "email": email})),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let token = login(&app).await;
        let profile = json_body(send(&app, Method::GET, "/auth/perfil", Some(&token), None).await).await;
        assert_eq!(profile["id"], 1);
    }

    #[tokio::test]
    async fn test_concluir_checks_collection_first() {
        let app = app();
        let token = login(&app).await;

        for uri in ["/livros/1/concluir", "/produtos/abc/concluir", "/produtos/1/concluir"] {
            let response = send(&app, Method::PATCH, uri, Some("bogus"), None).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }

        let response = send(&app, Method::PATCH, "/tarefas/abc/concluir", Some("bogus"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::PATCH, "/tarefas/1/concluir", Some("bogus"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::PATCH, "/tarefas/99/concluir", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_order_flow_and_sales_report() {
        let mut config = AppConfig::default_config().unwrap();
        config.orders.processing_delay_seconds = 0;
        let app = app_with(config);
        let token = login(&app).await;

        send(
            &app,
            Method::POST,
            "/produtos",
            Some(&token),
            Some(json!({"nome": "Livro", "preco": 29.9, "categoria": "Livros"})),
        )
        .await;

        let order = json!({
            "itens": [{"produto_id": 1, "quantidade": 2, "preco_unitario": 29.9}],
            "observacoes": "presente"
        });
        let response = send(&app, Method::POST, "/pedidos", None, Some(order.clone())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::POST, "/pedidos", Some(&token), Some(order)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let placed = json_body(response).await;
        assert_eq!(placed["total"], 59.8);
        assert_eq!(placed["status"], "Pendente");
        assert_eq!(placed["owner_id"], 1);

        let unknown_product = json!({
            "itens": [{"produto_id": 7, "quantidade": 1, "preco_unitario": 10}]
        });
        let response =
            send(&app, Method::POST, "/pedidos", Some(&token), Some(unknown_product)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut status = Value::Null;
        for _ in 0..50 {
            let order = json_body(send(&app, Method::GET, "/pedidos/1", None, None).await).await;
            status = order["status"].clone();
            if status == "Processado" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert_eq!(status, "Processado");

        let response = send(&app, Method::GET, "/relatorios/vendas", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let report =
            json_body(send(&app, Method::GET, "/relatorios/vendas", Some(&token), None).await).await;
        assert_eq!(report["resumo"]["total_pedidos"], 1);
        assert_eq!(report["resumo"]["total_vendas"], 59.8);
        assert_eq!(report["resumo"]["ticket_medio"], 59.8);
        assert_eq!(report["pedidos"][0]["id"], 1);

        let uri = "/relatorios/vendas?data_inicio=2000-01-01&data_fim=2000-01-31";
        let report = json_body(send(&app, Method::GET, uri, Some(&token), None).await).await;
        assert_eq!(report["periodo"]["inicio"], "2000-01-01");
        assert_eq!(report["resumo"]["total_pedidos"], 0);

        let uri = "/relatorios/vendas?data_inicio=ontem";
        let response = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let metrics = json_body(send(&app, Method::GET, "/metrics", None, None).await).await;
        assert_eq!(metrics["usuarios_cadastrados"], 1);
        assert_eq!(metrics["produtos_cadastrados"], 1);
        assert_eq!(metrics["pedidos_realizados"], 1);
    }

    #[tokio::test]
    async fn test_categories_and_product_statistics() {
        let app = app();
        let token = login(&app).await;
        for body in [
            json!({"nome": "Romance", "preco": 40, "categoria": "Livros", "estoque": 3}),
            json!({"nome": "Bola", "preco": 60, "categoria": "Esportes"}),
        ] {
            send(&app, Method::POST, "/produtos", Some(&token), Some(body)).await;
        }

        let categorias = json_body(send(&app, Method::GET, "/categorias", None, None).await).await;
        assert_eq!(categorias, json!(["Esportes", "Livros"]));

        let livros = json_body(send(&app, Method::GET, "/categorias/livros", None, None).await).await;
        assert_eq!(livros.as_array().unwrap().len(), 1);
        assert_eq!(livros[0]["nome"], "Romance");

        let response = send(&app, Method::GET, "/categorias/Casa", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let stats =
            json_body(send(&app, Method::GET, "/estatisticas/produtos", None, None).await).await;
        assert_eq!(stats["total_produtos"], 2);
        assert_eq!(stats["em_estoque"], 1);
        assert_eq!(stats["sem_estoque"], 1);
        assert_eq!(stats["preco_medio"], 50.0);
        assert_eq!(stats["produto_mais_caro"]["nome"], "Bola");
        assert_eq!(stats["categorias_disponiveis"], 2);
    }

    #[tokio::test]
    async fn test_sweep_endpoint() {
        let app = app();
        login(&app).await;
        let response = send(&app, Method::POST, "/sistema/limpar-sessoes", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["removed"], 0);
    }
}
