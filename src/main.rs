//! Batch Projector - HTTP server exposing the tree projections.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use batch_projector::config::{ConfigStore, ServerSettings, ViewConfig};
use batch_projector::documents::{
    documents_by_transaction, excel_data, verification_documents, DocumentsByTransaction, ExcelData,
    VerificationDocuments,
};
use batch_projector::hierarchy::{transaction_hierarchy, TransactionPayload};
use batch_projector::ids::{split_id, SplitId};
use batch_projector::keys::{key_item_by_id, parse_keys, KeyEntry};
use batch_projector::media::{batch_media_url, classification_media_url};
use batch_projector::naming::{to_camel_case, to_normal_case};
use batch_projector::pages::{index_nodes, parse_pages, root_node_list, IndexEntry, PageEntry, Position};
use batch_projector::search::{expand_nodes_by_type, search_nodes, SearchResult};
use batch_projector::tables::{parse_tables, Table};
use batch_projector::tree_store::{TreeStore, TreeSummary};
use batch_projector::vendors::{parse_vendors, VendorRecord};
use batch_projector::{flat_nodes, validate_tree, DisplayRecord, Node, NodeType, TreeError, ViewState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    trees: TreeStore,
    configs: Arc<ConfigStore>,
    settings: Arc<ServerSettings>,
}

type ApiError = (StatusCode, String);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "batch_projector=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ServerSettings::from_env()?;

    // Load view configs from filesystem
    let configs = ConfigStore::load_from_dir(&settings.config_dir)?;
    info!("Loaded {} configs: {:?}", configs.list().len(), configs.list());

    let state = AppState {
        trees: TreeStore::new(),
        configs: Arc::new(configs),
        settings: Arc::new(settings.clone()),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/configs", get(list_configs))
        .route("/configs/:name", put(put_config).get(get_config).delete(delete_config))
        .route("/media-url", get(media_url))
        .route("/classification-media-url", get(classification_url))
        .route("/ids/:id/split", get(get_split_id))
        .route("/labels/:label", get(get_label_cases))
        .route("/key-items/:key_item_id", post(find_key_item))
        .route("/trees", post(create_tree))
        .route("/trees/:id", get(get_tree).delete(delete_tree))
        .route("/trees/:id/summary", get(get_tree_summary))
        .route("/trees/:id/nodes/:node_id", get(get_node))
        .route("/trees/:id/flatten", post(flatten_tree))
        .route("/trees/:id/search", post(search_tree))
        .route("/trees/:id/expand", post(expand_tree))
        .route("/trees/:id/documents", get(get_documents))
        .route("/trees/:id/verification-documents", get(get_verification_documents))
        .route("/trees/:id/tables", get(get_tables))
        .route("/trees/:id/vendors", get(get_vendors))
        .route("/trees/:id/keys", get(get_keys))
        .route("/trees/:id/pages", get(get_pages))
        .route("/trees/:id/index", get(get_index))
        .route("/trees/:id/roots", get(get_roots))
        .route("/trees/:id/excel", get(get_excel_data))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!("Server listening on http://{}", settings.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List available configs.
async fn list_configs(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.configs.list())
}

/// Get a specific config.
async fn get_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ViewConfig>, StatusCode> {
    state.configs.get(&name).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Create or replace a config in memory. The path name wins over the body's.
async fn put_config(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(mut config): Json<ViewConfig>,
) -> Json<ViewConfig> {
    config.name = name;
    info!("Updated config {}", config.name);
    state.configs.insert(config.clone());
    Json(config)
}

async fn delete_config(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    if state.configs.remove(&name) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Deserialize)]
struct MediaQuery {
    batch_id: String,
    file_name: String,
    sub_path: Option<String>,
    #[serde(default)]
    dataset: bool,
}

#[derive(Serialize)]
struct MediaUrl {
    url: String,
}

/// Resolve a batch media URL against the configured backend.
async fn media_url(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> Result<Json<MediaUrl>, ApiError> {
    if state.settings.backend_url.is_empty() {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "BACKEND_URL is not configured".to_string()));
    }
    Ok(Json(MediaUrl {
        url: batch_media_url(
            &state.settings.backend_url,
            &query.batch_id,
            query.sub_path.as_deref(),
            &query.file_name,
            query.dataset,
        ),
    }))
}

#[derive(Deserialize)]
struct ClassificationQuery {
    file_path: String,
}

async fn classification_url(
    State(state): State<AppState>,
    Query(query): Query<ClassificationQuery>,
) -> Result<Json<MediaUrl>, ApiError> {
    if state.settings.backend_url.is_empty() {
        return Err((StatusCode::SERVICE_UNAVAILABLE, "BACKEND_URL is not configured".to_string()));
    }
    Ok(Json(MediaUrl {
        url: classification_media_url(&state.settings.backend_url, &query.file_path),
    }))
}

/// Decompose a hierarchical cell id into its ancestor ids.
async fn get_split_id(Path(id): Path<String>) -> Result<Json<SplitId>, ApiError> {
    split_id(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("Id has too few segments: {}", id)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabelCases {
    camel_case: String,
    normal_case: String,
}

async fn get_label_cases(Path(label): Path<String>) -> Json<LabelCases> {
    Json(LabelCases {
        camel_case: to_camel_case(&label),
        normal_case: to_normal_case(&label),
    })
}

/// Look up a key definition item (or one of its compound items) in the posted list.
async fn find_key_item(
    Path(key_item_id): Path<String>,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    key_item_by_id(&items, &key_item_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct CreateTreeQuery {
    #[serde(default)]
    transaction: bool,
    config: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TreeCreated {
    #[serde(flatten)]
    summary: TreeSummary,
    /// Ids to expand on first load, per the config's `expand_types`.
    expanded_ids: Vec<String>,
}

/// Upload a node array (or a transaction payload with `?transaction=true`).
async fn create_tree(
    State(state): State<AppState>,
    Query(query): Query<CreateTreeQuery>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TreeCreated>, ApiError> {
    let config = resolve_config(&state, query.config.as_deref())?;

    let nodes: Vec<Node> = if query.transaction {
        let payload: TransactionPayload = serde_json::from_value(body)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid transaction payload: {}", e)))?;
        transaction_hierarchy(&payload)
    } else {
        serde_json::from_value(body)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid node array: {}", e)))?
    };

    validate_tree(&nodes, state.settings.max_depth).map_err(tree_error)?;

    let expanded_ids = expand_nodes_by_type(&nodes, &config.expand_types);
    let summary = state.trees.store(nodes);
    info!("Stored tree {} ({} nodes)", summary.id, summary.node_count);

    Ok(Json(TreeCreated {
        summary,
        expanded_ids,
    }))
}

/// Get a stored tree.
async fn get_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Node>>, StatusCode> {
    state
        .trees
        .get(&id)
        .map(|nodes| Json((*nodes).clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_tree_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TreeSummary>, StatusCode> {
    state.trees.summary(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_tree(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.trees.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Get a specific node from a stored tree.
async fn get_node(
    State(state): State<AppState>,
    Path((id, node_id)): Path<(String, String)>,
) -> Result<Json<Node>, StatusCode> {
    let nodes = state.trees.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    find_node(&nodes, &node_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct FlattenQuery {
    config: Option<String>,
}

/// Project a stored tree into display records for the given UI state.
///
/// With `?config=<name>` the config's address-block keys and document sort
/// order replace the ones in the body.
async fn flatten_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FlattenQuery>,
    Json(mut view): Json<ViewState>,
) -> Result<Json<Vec<DisplayRecord>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    if let Some(name) = query.config.as_deref() {
        let config = resolve_config(&state, Some(name))?;
        view.address_block_keys = config.address_block_keys;
        view.document_sort_order = config.document_sort_order;
    }

    let records = flat_nodes(&nodes, &view, state.settings.max_depth).map_err(tree_error)?;
    Ok(Json(records))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

async fn search_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResult>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(search_nodes(&nodes, &request.query)))
}

#[derive(Deserialize)]
struct ExpandRequest {
    types: Vec<NodeType>,
}

async fn expand_tree(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExpandRequest>,
) -> Result<Json<Vec<String>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(expand_nodes_by_type(&nodes, &request.types)))
}

async fn get_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentsByTransaction>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(documents_by_transaction(&nodes)))
}

async fn get_verification_documents(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerificationDocuments>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(verification_documents(&nodes)))
}

async fn get_tables(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Table>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(parse_tables(&nodes)))
}

async fn get_vendors(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<VendorRecord>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(parse_vendors(&nodes)))
}

async fn get_keys(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<KeyEntry>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(parse_keys(&nodes)))
}

async fn get_pages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BTreeMap<String, PageEntry>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(parse_pages(&nodes)))
}

async fn get_index(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BTreeMap<String, IndexEntry>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(index_nodes(&nodes)))
}

/// Child positions per page, for each document and doc builder.
async fn get_roots(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BTreeMap<String, BTreeMap<String, Vec<Position>>>>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    Ok(Json(root_node_list(&nodes)))
}

async fn get_excel_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExcelData>, ApiError> {
    let nodes = load_tree(&state, &id)?;
    excel_data(&nodes)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Tree {} is empty", id)))
}

// ============================================================================
// Helper functions
// ============================================================================

fn load_tree(state: &AppState, id: &str) -> Result<Arc<Vec<Node>>, ApiError> {
    state
        .trees
        .get(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown tree: {}", id)))
}

fn resolve_config(state: &AppState, name: Option<&str>) -> Result<ViewConfig, ApiError> {
    match name {
        None => Ok(state.configs.default_config()),
        Some(name) => state.configs.get(name).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("Unknown config: {}. Available: {:?}", name, state.configs.list()),
            )
        }),
    }
}

fn tree_error(err: TreeError) -> ApiError {
    warn!("Rejected tree: {}", err);
    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
}

/// Recursively find a node by ID.
fn find_node<'a>(nodes: &'a [Node], node_id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id == node_id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, node_id) {
            return Some(found);
        }
    }
    None
}
