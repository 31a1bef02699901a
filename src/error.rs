use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

use crate::services::i18n::{localize, Language};

/// Recoverable, per-operation conditions raised by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column {0} is not numeric")]
    NotNumeric(String),
    #[error("column {0} has no valid values")]
    NoValidData(String),
    #[error("the same column was selected twice: {0}")]
    IdenticalColumnSelection(String),
    #[error("not enough overlapping data")]
    NotEnoughData,
}

impl AnalysisError {
    fn code(&self) -> &'static str {
        match self {
            AnalysisError::UnknownColumn(_) => "unknown_column",
            AnalysisError::NotNumeric(_) => "not_numeric",
            AnalysisError::NoValidData(_) => "no_valid_data",
            AnalysisError::IdenticalColumnSelection(_) => "identical_column_selection",
            AnalysisError::NotEnoughData => "not_enough_data",
        }
    }

    /// String-table key describing the condition to an end user.
    pub fn message_key(&self) -> &'static str {
        match self {
            AnalysisError::UnknownColumn(_) => "unknown_column",
            AnalysisError::NotNumeric(_) => "no_numeric",
            AnalysisError::NoValidData(_) => "no_valid_data",
            AnalysisError::IdenticalColumnSelection(_) => "select_two_diff_columns",
            AnalysisError::NotEnoughData => "not_enough_data",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("failed to parse CSV: {0}")]
    Csv(String),
    #[error("failed to read workbook: {0}")]
    Excel(String),
    #[error("the uploaded file contains no data")]
    EmptyDataset,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("chart rendering failed: {0}")]
    Chart(String),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("failed to load report font: {0}")]
    Font(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("{source}")]
    Ingest {
        source: IngestError,
        language: Language,
    },
    #[error("{source}")]
    Analysis {
        source: AnalysisError,
        language: Language,
    },
    #[error("{source}")]
    Report {
        source: ReportError,
        language: Language,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn analysis(source: AnalysisError, language: Language) -> Self {
        AppError::Analysis { source, language }
    }

    pub fn ingest(source: IngestError, language: Language) -> Self {
        AppError::Ingest { source, language }
    }

    pub fn report(source: ReportError, language: Language) -> Self {
        AppError::Report { source, language }
    }
}

impl From<AnalysisError> for AppError {
    fn from(source: AnalysisError) -> Self {
        AppError::analysis(source, Language::default())
    }
}

impl From<IngestError> for AppError {
    fn from(source: IngestError) -> Self {
        AppError::ingest(source, Language::default())
    }
}

impl From<ReportError> for AppError {
    fn from(source: ReportError) -> Self {
        AppError::report(source, Language::default())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.clone()),
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found", self.to_string()),
            AppError::Ingest {
                source: IngestError::UnsupportedFileType(_),
                language,
            } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_file_type",
                localize(*language, "invalid_file_type").to_string(),
            ),
            AppError::Ingest { source, .. } => (StatusCode::BAD_REQUEST, "ingestion_failed", source.to_string()),
            AppError::Analysis { source, language } => {
                let status = match source {
                    AnalysisError::UnknownColumn(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, source.code(), localize(*language, source.message_key()).to_string())
            }
            AppError::Report {
                source: ReportError::Analysis(source),
                language,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                source.code(),
                localize(*language, source.message_key()).to_string(),
            ),
            AppError::Report { source, .. } => (StatusCode::INTERNAL_SERVER_ERROR, "report_failed", source.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn report_analysis_errors_use_request_language() {
        let error = AppError::report(
            ReportError::Analysis(AnalysisError::IdenticalColumnSelection("age".into())),
            Language::Kr,
        );
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "identical_column_selection");
        assert_eq!(body["message"], localize(Language::Kr, "select_two_diff_columns"));
    }

    #[tokio::test]
    async fn unsupported_file_type_uses_request_language() {
        let error = AppError::ingest(IngestError::UnsupportedFileType("txt".into()), Language::Jp);
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["message"], localize(Language::Jp, "invalid_file_type"));

        let (_, body) = body_of(IngestError::UnsupportedFileType("txt".into()).into()).await;
        assert_eq!(body["message"], localize(Language::En, "invalid_file_type"));
    }
}
