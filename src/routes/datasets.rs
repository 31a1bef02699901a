use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, ReportError},
    services::{
        analysis::{self, Coefficient, CorrelationResult, DatasetOverview, DescriptiveSummary},
        i18n::{Language, RenderOptions},
        ingest,
        report,
    },
    AppState,
};

const DEFAULT_TOKEN_PREVIEW: usize = 50;
const DEFAULT_TOP_TOKENS: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/datasets", post(upload_dataset))
        .route("/datasets/:id", get(get_overview))
        .route("/datasets/:id/columns/:column/descriptive", get(get_descriptive))
        .route("/datasets/:id/columns/:column/frequency", get(get_frequency))
        .route("/datasets/:id/columns/:column/tokens", get(get_tokens))
        .route("/datasets/:id/correlation", get(get_correlation))
        .route("/datasets/:id/correlation-matrix", get(get_correlation_matrix))
        .route("/datasets/:id/chi-square", get(get_chi_square))
        .route("/datasets/:id/report", get(get_report))
}

fn parse_language(raw: Option<&str>) -> Result<Language, AppError> {
    match raw {
        Some(code) => code
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("Unknown language: {}", code))),
        None => Ok(Language::default()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    session_id: String,
    file_name: String,
    overview: DatasetOverview,
}

async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LangQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let start = std::time::Instant::now();
    let lang = parse_language(query.lang.as_deref())?;

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidInput("The file field has no file name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, data));
        break;
    }
    let (file_name, data) = upload.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let df = ingest::load_dataset(&file_name, data).map_err(|e| AppError::ingest(e, lang))?;
    let classification = analysis::classify_columns(&df);
    tracing::info!(
        "Classified {}: {} numeric, {} categorical, {} text",
        file_name,
        classification.numeric.len(),
        classification.categorical.len(),
        classification.text.len()
    );
    if classification.numeric.is_empty() {
        tracing::warn!("{}: {}", file_name, crate::services::i18n::localize(lang, "no_numeric"));
    }

    let overview = analysis::dataset_overview(&df, &classification, state.config.preview_rows);
    let session = state.sessions.create(file_name, df, classification);
    tracing::info!("Upload processed in {:?}", start.elapsed());

    Ok(Json(UploadResponse {
        session_id: session.id.clone(),
        file_name: session.file_name.clone(),
        overview,
    }))
}

async fn get_overview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DatasetOverview>, AppError> {
    let session = state.sessions.get(&id)?;
    Ok(Json(analysis::dataset_overview(
        &session.dataset,
        &session.classification,
        state.config.preview_rows,
    )))
}

#[derive(Debug, Serialize)]
pub struct DescriptiveResponse {
    column: String,
    summary: DescriptiveSummary,
    interpretation: Option<&'static str>,
}

async fn get_descriptive(
    State(state): State<Arc<AppState>>,
    Path((id, column)): Path<(String, String)>,
    Query(query): Query<LangQuery>,
) -> Result<Json<DescriptiveResponse>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let session = state.sessions.get(&id)?;
    let summary = analysis::describe_column(&session.dataset, &column).map_err(|e| AppError::analysis(e, lang))?;

    Ok(Json(DescriptiveResponse {
        interpretation: summary.normality.interpretation(lang),
        column,
        summary,
    }))
}

async fn get_frequency(
    State(state): State<Arc<AppState>>,
    Path((id, column)): Path<(String, String)>,
    Query(query): Query<LangQuery>,
) -> Result<Json<analysis::FrequencyTable>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let session = state.sessions.get(&id)?;
    let table = analysis::column_frequencies(&session.dataset, &column).map_err(|e| AppError::analysis(e, lang))?;
    Ok(Json(table))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    lang: Option<String>,
    preview: Option<usize>,
    top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    column: String,
    total_tokens: usize,
    preview: Vec<String>,
    most_common: Vec<(String, usize)>,
}

async fn get_tokens(
    State(state): State<Arc<AppState>>,
    Path((id, column)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let session = state.sessions.get(&id)?;
    let tokens = analysis::column_tokens(&session.dataset, &column).map_err(|e| AppError::analysis(e, lang))?;

    let preview = query.preview.unwrap_or(DEFAULT_TOKEN_PREVIEW);
    let top = query.top.unwrap_or(DEFAULT_TOP_TOKENS);
    Ok(Json(TokenResponse {
        column,
        total_tokens: tokens.tokens.len(),
        preview: tokens.tokens.iter().take(preview).cloned().collect(),
        most_common: tokens.most_common(top).to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    lang: Option<String>,
    x: Option<String>,
    y: Option<String>,
    first: Option<String>,
    second: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("Missing query parameter: {}", name)))
}

#[derive(Debug, Serialize)]
pub struct CoefficientLabels {
    strength: &'static str,
    direction: &'static str,
}

impl CoefficientLabels {
    fn new(coefficient: &Coefficient, lang: Language) -> Self {
        Self {
            strength: coefficient.strength.label(lang),
            direction: coefficient.direction.label(lang),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    #[serde(flatten)]
    result: CorrelationResult,
    pearson_labels: CoefficientLabels,
    spearman_labels: CoefficientLabels,
}

async fn get_correlation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PairQuery>,
) -> Result<Json<CorrelationResponse>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let x = required(query.x, "x")?;
    let y = required(query.y, "y")?;
    let session = state.sessions.get(&id)?;

    let result = analysis::correlation_analysis(&session.dataset, &x, &y).map_err(|e| AppError::analysis(e, lang))?;
    Ok(Json(CorrelationResponse {
        pearson_labels: CoefficientLabels::new(&result.pearson, lang),
        spearman_labels: CoefficientLabels::new(&result.spearman, lang),
        result,
    }))
}

async fn get_correlation_matrix(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Json<analysis::CorrelationMatrix>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let session = state.sessions.get(&id)?;
    let matrix = analysis::correlation_matrix(&session.dataset, &session.classification.numeric)
        .map_err(|e| AppError::analysis(e, lang))?;
    Ok(Json(matrix))
}

async fn get_chi_square(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PairQuery>,
) -> Result<Json<analysis::ChiSquareResult>, AppError> {
    let lang = parse_language(query.lang.as_deref())?;
    let first = required(query.first, "first")?;
    let second = required(query.second, "second")?;
    let session = state.sessions.get(&id)?;

    let result = analysis::chi_square_test(&session.dataset, &first, &second).map_err(|e| AppError::analysis(e, lang))?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    lang: Option<String>,
    dark_mode: Option<bool>,
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let options = RenderOptions {
        language: parse_language(query.lang.as_deref())?,
        dark_mode: query.dark_mode.unwrap_or(false),
    };
    let session = state.sessions.get(&id)?;
    let generated_at = chrono::Local::now().naive_local();

    // chart rasterization and PDF encoding are CPU bound
    let charts = Arc::clone(&state.charts);
    let font = state.report_font.clone();
    let (report, pdf) = tokio::task::spawn_blocking(move || {
        let report = report::build_report(
            &session.dataset,
            &session.classification,
            &options,
            generated_at,
            charts.as_ref(),
        )?;
        let pdf = report.to_pdf(font.as_deref().map(Vec::as_slice))?;
        Ok::<_, ReportError>((report, pdf))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Report task failed: {}", e)))?
    .map_err(|e| AppError::report(e, options.language))?;
    tracing::info!("Report for session {}: {} pages, {} bytes", id, report.page_count(), pdf.len());

    let disposition = format!("attachment; filename=\"{}\"", report.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
