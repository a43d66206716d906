//! Request handlers.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Multipart, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tracing::info;

use crate::error::ApiError;
use crate::hash::route_prefix;
use crate::routes::build_listing;
use crate::server::AppState;
use crate::upload::{move_all, FilePayload};

/// Multipart field name the upload form uses.
pub const UPLOAD_FIELD: &str = "selected";

/// Well-known file name for the shared-clipboard convention.
pub const CLIPBOARD_FILE: &str = ".clipboard-tmp";

const RECEIVE_FORM_TEMPLATE: &str = include_str!("../assets/receive-form.html");
const SHARE_TEMPLATE: &str = include_str!("../assets/index.html");

/// 302 redirect. `Redirect::temporary` would emit a 307 and replay POSTs.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// GET / — redirect to the surface matching the configured mode.
pub async fn root(State(state): State<AppState>) -> Response {
    if state.config.receive {
        return found("/receive");
    }

    if state.config.clipboard {
        // the clipboard file lives next to the first shared path, so the
        // redirect always targets the parent's route, file or directory
        if let Some(first) = state.config.paths.first() {
            let parent = first.parent().unwrap_or(Path::new("/"));
            return found(&format!("{}/{CLIPBOARD_FILE}", route_prefix(parent)));
        }
    }

    // cache-busting query so browsers never serve a stale listing
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    found(&format!("/share?time={millis}"))
}

/// GET /receive — upload form with the share address substituted in.
pub async fn receive_form(State(state): State<AppState>) -> Html<String> {
    Html(RECEIVE_FORM_TEMPLATE.replacen("{shareAddress}", &state.config.share_address, 1))
}

/// GET /share — render the listing with fresh filesystem state.
pub async fn share(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let listing = build_listing(&state.config.paths)?;
    let json =
        serde_json::to_string(&listing).map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Html(SHARE_TEMPLATE.replacen("\"{pathList}\"", &json, 1)))
}

/// POST /upload — move every selected file into the first shared directory,
/// then hand the browser an alert summarizing the outcome.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut payloads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        payloads.push(FilePayload { name, data });
    }

    if payloads.is_empty() {
        return Err(ApiError::BadRequest("No files were received.".to_string()));
    }

    let report = move_all(&state.upload_dir, payloads).await;

    let shared: Vec<String> = report
        .succeeded
        .iter()
        .map(|o| o.target_path.display().to_string())
        .collect();
    let failed: Vec<String> = report
        .failed
        .iter()
        .map(|o| o.target_path.display().to_string())
        .collect();

    let mut feedback = String::new();
    if !shared.is_empty() {
        feedback.push_str(&format!("Shared at \\n {}", shared.join(",\\n")));
    }
    if !failed.is_empty() {
        if !feedback.is_empty() {
            feedback.push_str("\\n");
        }
        feedback.push_str(&format!("Sharing failed: \\n {}", failed.join(",\\n")));
    }
    let feedback = feedback.replace('\'', "\\'");

    Ok(Html(format!(
        "<script>\n  window.alert('{}');\n  window.location.href = '{}';\n</script>",
        feedback, state.config.post_upload_redirect_url
    ))
    .into_response())
}

/// Layer wrapped around every folder route: download logging, plus the
/// clipboard side effects when that mode is active.
pub async fn folder_access(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let full_path = req.uri().path().to_string();

    if let Some(entry) = state
        .routes
        .entries()
        .iter()
        .find(|entry| full_path.starts_with(entry.route_prefix.as_str()))
    {
        let rest = &full_path[entry.route_prefix.len()..];
        if !rest.is_empty() && rest != "/" {
            let name = rest.rsplit('/').next().unwrap_or_default();
            info!(
                success = true,
                r#type = "DOWNLOAD",
                name = %name,
                path = %full_path,
                "download"
            );
        }
    }

    // the hook runs on the request path, before the response is produced
    if state.config.clipboard {
        if let Some(hook) = state.hooks.on_clipboard_access.as_ref() {
            hook();
        }
    }

    let mut response = next.run(req).await;

    if state.config.clipboard {
        // the clipboard file is continuously rewritten text, whatever its name
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
    }
    response
}
