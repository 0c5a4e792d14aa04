use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, SET_COOKIE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use ecovision_core::{
    import_csv, merge_selections, resolve_combination_key, template_for, CatalogSet,
    ChartSetting, ChartSettingUpdate, DataCounts, ImportKind, Page, PageUpdate, Selections,
    Session, Store, VisualizationResult, DEFAULT_COMBINATION,
};

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::session::{expired_cookie, session_cookie, AdminSession};
use crate::storage::{
    sanitize_filename, timestamped_name, LocalStorage, StorageAdapter, PUBLIC_PREFIX,
};

pub struct AppState {
    pub store: Store,
    pub config: ServiceConfig,
    pub storage: Arc<dyn StorageAdapter>,
}

impl AppState {
    pub fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let store = Store::open(&config.database)
            .with_context(|| format!("failed to open {}", config.database.display()))?;
        fs::create_dir_all(&config.upload_dir)
            .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;
        let storage = Arc::new(LocalStorage::new(&config.upload_dir));
        Ok(Self {
            store,
            config,
            storage,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/api/variables", get(handle_variables))
        .route("/api/visualization", get(handle_visualization))
        .route("/api/visualization/combination", post(handle_combination))
        .route("/api/chart-settings", get(handle_chart_settings))
        .route("/api/pages/*slug", get(handle_page))
        .route("/api/admin/login", post(handle_login))
        .route("/api/admin/logout", post(handle_logout))
        .route("/api/admin/chart-settings", get(handle_admin_chart_settings))
        .route("/api/admin/chart-settings/:id", put(handle_update_chart_setting))
        .route("/api/admin/pages", get(handle_admin_pages))
        .route("/api/admin/pages/:id", put(handle_update_page))
        .route("/api/admin/data-counts", get(handle_data_counts))
        .route("/api/admin/csv-template", get(handle_csv_template))
        .route("/api/admin/csv-upload", post(handle_csv_upload))
        .route(
            "/api/admin/upload",
            post(handle_asset_upload).delete(handle_asset_delete),
        )
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> ecovision_core::Result<T> + Send + 'static,
{
    let store = state.store.clone();
    let value = task::spawn_blocking(move || f(&store))
        .await
        .map_err(AppError::internal)??;
    Ok(value)
}

async fn handle_variables(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CatalogSet>>, AppError> {
    let catalog = with_store(&state, |store| store.catalog()).await?;
    Ok(Json(catalog))
}

#[derive(Debug, Deserialize)]
struct VisualizationParams {
    combination: Option<String>,
}

async fn handle_visualization(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VisualizationParams>,
) -> Result<Json<Vec<VisualizationResult>>, AppError> {
    let key = params
        .combination
        .filter(|key| !key.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COMBINATION.to_string());
    let results = with_store(&state, move |store| store.results_for(&key)).await?;
    Ok(Json(results))
}

#[derive(Debug, Default, Deserialize)]
struct CombinationRequest {
    #[serde(default)]
    selections: Selections,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CombinationResponse {
    combination_key: &'static str,
    selections: Selections,
}

async fn handle_combination(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CombinationRequest>,
) -> Result<Json<CombinationResponse>, AppError> {
    let catalog = with_store(&state, |store| store.catalog()).await?;
    let selections = merge_selections(&catalog, &body.selections);
    let combination_key = resolve_combination_key(&catalog, &selections);
    Ok(Json(CombinationResponse {
        combination_key,
        selections,
    }))
}

async fn handle_chart_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChartSetting>>, AppError> {
    let settings = with_store(&state, |store| store.chart_settings()).await?;
    Ok(Json(settings))
}

async fn handle_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Page>, AppError> {
    let lookup = slug.trim_matches('/').to_string();
    let page = with_store(&state, move |store| store.published_page(&lookup)).await?;
    page.map(Json)
        .ok_or_else(|| AppError::not_found(format!("page {slug} not found")))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let ttl = state.config.session_ttl();
    let session: Session = with_store(&state, move |store| {
        store.login(body.email.trim(), &body.password, ttl)
    })
    .await?;
    info!(user = %session.user.email, "admin logged in");
    let cookie = session_cookie(
        &session.token,
        ttl.num_seconds(),
        state.config.secure_cookies,
    );
    Ok(([(SET_COOKIE, cookie)], Json(session)).into_response())
}

async fn handle_logout(
    State(state): State<Arc<AppState>>,
    AdminSession(session): AdminSession,
) -> Result<Response, AppError> {
    let token = session.token.clone();
    with_store(&state, move |store| store.close_session(&token)).await?;
    info!(user = %session.user.email, "admin logged out");
    Ok(([(SET_COOKIE, expired_cookie())], Json(json!({ "success": true }))).into_response())
}

async fn handle_admin_chart_settings(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
) -> Result<Json<Vec<ChartSetting>>, AppError> {
    let settings = with_store(&state, |store| store.chart_settings()).await?;
    Ok(Json(settings))
}

async fn handle_update_chart_setting(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<i64>,
    Json(update): Json<ChartSettingUpdate>,
) -> Result<Json<ChartSetting>, AppError> {
    let updated =
        with_store(&state, move |store| store.update_chart_setting(id, &update)).await?;
    updated
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("chart setting {id} not found")))
}

async fn handle_admin_pages(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
) -> Result<Json<Vec<Page>>, AppError> {
    let pages = with_store(&state, |store| store.pages()).await?;
    Ok(Json(pages))
}

async fn handle_update_page(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Path(id): Path<i64>,
    Json(update): Json<PageUpdate>,
) -> Result<Json<Page>, AppError> {
    let updated = with_store(&state, move |store| store.update_page(id, &update)).await?;
    updated
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("page {id} not found")))
}

async fn handle_data_counts(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
) -> Result<Json<DataCounts>, AppError> {
    let counts = with_store(&state, |store| store.data_counts()).await?;
    Ok(Json(counts))
}

#[derive(Debug, Deserialize)]
struct TemplateParams {
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn handle_csv_template(
    _session: AdminSession,
    Query(params): Query<TemplateParams>,
) -> Result<Response, AppError> {
    let kind: ImportKind = params
        .kind
        .as_deref()
        .ok_or_else(|| AppError::bad_request("missing template type"))?
        .parse()?;
    let template = template_for(kind);
    let headers = [
        (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", template.filename),
        ),
    ];
    Ok((headers, template.content).into_response())
}

#[derive(Debug, Serialize)]
struct CsvUploadResponse {
    success: bool,
    message: String,
    count: usize,
}

async fn handle_csv_upload(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> Result<Json<CsvUploadResponse>, AppError> {
    let form = read_form(&mut multipart).await?;
    let file = form.file.ok_or_else(|| AppError::bad_request("missing file"))?;
    let kind: ImportKind = form
        .fields
        .get("type")
        .map(String::as_str)
        .ok_or_else(|| AppError::bad_request("missing import type"))?
        .parse()?;
    let summary = with_store(&state, move |store| import_csv(store, kind, &file.data)).await?;
    Ok(Json(CsvUploadResponse {
        success: true,
        message: summary.message(),
        count: summary.count,
    }))
}

#[derive(Debug, Serialize)]
struct AssetUploadResponse {
    url: String,
    path: String,
}

async fn handle_asset_upload(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> Result<Json<AssetUploadResponse>, AppError> {
    let form = read_form(&mut multipart).await?;
    let file = form.file.ok_or_else(|| AppError::bad_request("missing file"))?;
    let original = file.filename.as_deref().unwrap_or("upload");
    let path = timestamped_name(Utc::now().timestamp_millis(), original);
    let storage = Arc::clone(&state.storage);
    let stored = path.clone();
    let url = task::spawn_blocking(move || storage.upload(&file.data, &stored))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)?;
    info!(path = %path, url = %url, "asset uploaded");
    Ok(Json(AssetUploadResponse { url, path }))
}

#[derive(Debug, Deserialize)]
struct AssetParams {
    path: String,
}

async fn handle_asset_delete(
    State(state): State<Arc<AppState>>,
    _session: AdminSession,
    Query(params): Query<AssetParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let path = params.path.trim().to_string();
    if path.is_empty() || path != sanitize_filename(&path) || path.chars().all(|c| c == '.') {
        return Err(AppError::bad_request(format!("invalid asset path {path:?}")));
    }
    let storage = Arc::clone(&state.storage);
    let target = path.clone();
    task::spawn_blocking(move || storage.delete(&target))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)?;
    info!(path = %path, "asset deleted");
    Ok(Json(json!({ "success": true })))
}

struct UploadedFile {
    data: Vec<u8>,
    filename: Option<String>,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::bad_request)?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().map(|s| s.to_string());
            let data = field.bytes().await.map_err(AppError::bad_request)?;
            form.file = Some(UploadedFile {
                data: data.to_vec(),
                filename,
            });
        } else if !name.is_empty() {
            let text = field.text().await.map_err(AppError::bad_request)?;
            form.fields.insert(name, text.trim().to_string());
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ecovision-test-boundary";

    struct Harness {
        _dir: TempDir,
        state: Arc<AppState>,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = ServiceConfig {
                database: dir.path().join("eco.sqlite"),
                upload_dir: dir.path().join("uploads"),
                ..Default::default()
            };
            let state = Arc::new(AppState::from_config(config).unwrap());
            Self { _dir: dir, state }
        }

        fn store(&self) -> &Store {
            &self.state.store
        }

        fn token(&self) -> String {
            self.store()
                .create_admin("admin@example.org", "secret", "Admin")
                .unwrap();
            self.store()
                .login("admin@example.org", "secret", chrono::Duration::hours(1))
                .unwrap()
                .token
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Response) {
            let response = router(Arc::clone(&self.state))
                .oneshot(request)
                .await
                .unwrap();
            (response.status(), response)
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart(parts: &[(&str, Option<&str>, &str)]) -> (String, Vec<u8>) {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            body.into_bytes(),
        )
    }

    fn upload_request(token: &str, uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let (content_type, body) = multipart(parts);
        Request::post(uri)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    const RESULTS_CSV: &str = "combinationKey,year,sccValue,temperature,damageCost,gdpLoss\n\
default,2030,52.8,1.3,145.2,1.1\n\
default,2025,45.2,1.1,120.5,0.8\n\
extreme,2025,99.0,,,\n";

    #[tokio::test]
    async fn admin_routes_require_session() {
        let harness = Harness::new();
        for uri in [
            "/api/admin/data-counts",
            "/api/admin/pages",
            "/api/admin/chart-settings",
            "/api/admin/csv-template?type=results",
        ] {
            let (status, _) = harness
                .send(Request::get(uri).body(Body::empty()).unwrap())
                .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
        let (status, _) = harness
            .send(
                Request::get("/api/admin/data-counts")
                    .header(header::COOKIE, "ecovision_session=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_sets_cookie_and_logout_ends_session() {
        let harness = Harness::new();
        harness
            .store()
            .create_admin("admin@example.org", "secret", "Admin")
            .unwrap();

        let bad = Request::post("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"admin@example.org","password":"nope"}"#))
            .unwrap();
        assert_eq!(harness.send(bad).await.0, StatusCode::UNAUTHORIZED);

        let good = Request::post("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"admin@example.org","password":"secret"}"#))
            .unwrap();
        let (status, response) = harness.send(good).await;
        assert_eq!(status, StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("ecovision_session="));
        assert!(cookie.contains("HttpOnly"));
        let body = json_body(response).await;
        assert_eq!(body["user"]["email"], "admin@example.org");
        assert!(body["user"].get("passwordHash").is_none());
        let token = body["token"].as_str().unwrap().to_string();

        let pair = cookie.split(';').next().unwrap().to_string();
        let counts = Request::get("/api/admin/data-counts")
            .header(header::COOKIE, pair.clone())
            .body(Body::empty())
            .unwrap();
        assert_eq!(harness.send(counts).await.0, StatusCode::OK);

        let logout = Request::post("/api/admin/logout")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(harness.send(logout).await.0, StatusCode::OK);

        let after = Request::get("/api/admin/data-counts")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap();
        assert_eq!(harness.send(after).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn csv_upload_replaces_results() {
        let harness = Harness::new();
        let token = harness.token();
        let request = upload_request(
            &token,
            "/api/admin/csv-upload",
            &[("type", None, "results"), ("file", Some("results.csv"), RESULTS_CSV)],
        );
        let (status, response) = harness.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 3);

        let (status, response) = harness
            .send(
                Request::get("/api/visualization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let rows = json_body(response).await;
        let years: Vec<i64> = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["year"].as_i64().unwrap())
            .collect();
        assert_eq!(years, vec![2025, 2030]);
        assert_eq!(harness.store().results_for("extreme").unwrap()[0].gdp_loss, None);
    }

    #[tokio::test]
    async fn csv_upload_rejects_bad_requests_without_touching_data() {
        let harness = Harness::new();
        let token = harness.token();
        ecovision_core::seed_demo(harness.store(), 1).unwrap();
        let before = harness.store().data_counts().unwrap();

        let cases: Vec<Vec<(&str, Option<&str>, &str)>> = vec![
            vec![("type", None, "results")],
            vec![("file", Some("r.csv"), RESULTS_CSV)],
            vec![("type", None, "users"), ("file", Some("r.csv"), RESULTS_CSV)],
            vec![
                ("type", None, "results"),
                ("file", Some("r.csv"), "combinationKey,year,sccValue,temperature,damageCost\ndefault,2025,1,1,1\n"),
            ],
            vec![
                ("type", None, "results"),
                ("file", Some("r.csv"), "combinationKey,year,sccValue,temperature,damageCost,gdpLoss\n"),
            ],
        ];
        for parts in cases {
            let request = upload_request(&token, "/api/admin/csv-upload", &parts);
            let (status, response) = harness.send(request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert!(body["error"].is_string());
        }
        assert_eq!(harness.store().data_counts().unwrap(), before);
    }

    #[tokio::test]
    async fn template_download_headers() {
        let harness = Harness::new();
        let token = harness.token();
        let request = Request::get("/api/admin/csv-template?type=variables")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, response) = harness.send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"variables_template.csv\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"setName,setDescription"));

        let missing = Request::get("/api/admin/csv-template")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(harness.send(missing).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn combination_follows_first_parameter() {
        let harness = Harness::new();
        ecovision_core::seed_demo(harness.store(), 3).unwrap();
        let catalog = harness.store().catalog().unwrap();
        let first = &catalog[0].sub_parameters[0];
        let body = json!({ "selections": { (first.parameter.id.to_string()): first.values[2].id } });
        let request = Request::post("/api/visualization/combination")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, response) = harness.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["combinationKey"], "high-damage");

        let empty = Request::post("/api/visualization/combination")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let body = json_body(harness.send(empty).await.1).await;
        assert_eq!(body["combinationKey"], "default");

        let (_, response) = harness
            .send(
                Request::get("/api/visualization?combination=high-damage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 81);
    }

    #[tokio::test]
    async fn chart_setting_updates() {
        let harness = Harness::new();
        let token = harness.token();
        ecovision_core::seed_demo(harness.store(), 3).unwrap();
        let id = harness.store().chart_settings().unwrap()[0].id;

        let update = |id: i64, body: &'static str| {
            Request::put(format!("/api/admin/chart-settings/{id}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap()
        };
        let (status, response) = harness
            .send(update(id, r#"{"title":"SCC path","unit":"USD/tCO2"}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "SCC path");
        assert_eq!(body["unit"], "USD/tCO2");

        assert_eq!(
            harness.send(update(id, r#"{"title":"  "}"#)).await.0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            harness.send(update(9999, r#"{"title":"x"}"#)).await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn only_published_pages_are_public() {
        let harness = Harness::new();
        let token = harness.token();
        ecovision_core::seed_demo(harness.store(), 3).unwrap();

        let (status, response) = harness
            .send(
                Request::get("/api/pages/about/methodology")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["slug"], "about/methodology");
        let id = page["id"].as_i64().unwrap();

        let hide = Request::put(format!("/api/admin/pages/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(r#"{"title":"Methodology","published":false}"#))
            .unwrap();
        let (status, response) = harness.send(hide).await;
        assert_eq!(status, StatusCode::OK);
        let hidden = json_body(response).await;
        assert_eq!(hidden["published"], false);
        assert_eq!(hidden["content"], page["content"]);
        assert!(hidden["content"].is_string());

        let (status, _) = harness
            .send(
                Request::get("/api/pages/about/methodology")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn asset_upload_is_served_then_deleted() {
        let harness = Harness::new();
        let token = harness.token();
        let request = upload_request(
            &token,
            "/api/admin/upload",
            &[("file", Some("my chart.png"), "fake-png")],
        );
        let (status, response) = harness.send(request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        let path = body["path"].as_str().unwrap().to_string();
        assert!(path.ends_with("-my_chart.png"));
        assert_eq!(body["url"], format!("/uploads/{path}"));

        let (status, response) = harness
            .send(
                Request::get(format!("/uploads/{path}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"fake-png");

        let delete = |query: String| {
            Request::delete(format!("/api/admin/upload?path={query}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(
            harness.send(delete("..%2Feco.sqlite".to_string())).await.0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(harness.send(delete(path.clone())).await.0, StatusCode::OK);
        let (status, _) = harness
            .send(
                Request::get(format!("/uploads/{path}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(harness.state.config.database.exists());
    }
}
