//! Code format handlers.
//!
//! `{code_type}` accepts the slug (`purchase_order`), its kebab form
//! (`purchase-order`) or the numeric id.

use axum::extract::{Path, State};
use axum::Extension;
use serde::{Deserialize, Serialize};
use shopfront_core::{CodeFormat, CodeType};
use tracing::info;

use crate::auth::Claims;
use crate::error::ApiResult;
use crate::extract::Json;
use crate::AppState;

/// A format plus the code the next generation would hand out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFormatView {
    #[serde(flatten)]
    pub format: CodeFormat,
    pub next_code: String,
}

impl From<CodeFormat> for CodeFormatView {
    fn from(format: CodeFormat) -> Self {
        let next_code = format.preview_next();
        CodeFormatView { format, next_code }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCodeFormat {
    pub prefix: String,
    pub pad_length: i64,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<CodeFormatView>>> {
    let formats = state.db.code_formats().list().await?;
    Ok(Json(formats.into_iter().map(CodeFormatView::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(code_type): Path<String>,
) -> ApiResult<Json<CodeFormatView>> {
    let code_type: CodeType = code_type.parse()?;
    Ok(Json(state.db.code_formats().get(code_type).await?.into()))
}

/// `PUT /api/code-formats/{code_type}` (admin only). The counter is kept.
pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code_type): Path<String>,
    Json(request): Json<UpdateCodeFormat>,
) -> ApiResult<Json<CodeFormatView>> {
    claims.require_admin()?;
    let code_type: CodeType = code_type.parse()?;

    let format = state
        .db
        .code_formats()
        .update(code_type, &request.prefix, request.pad_length)
        .await?;

    info!(by = %claims.sub, code_type = %code_type, prefix = %format.prefix, "Code format changed");
    Ok(Json(format.into()))
}
