//! Roster upload
//!
//! `GET|POST /update`. Signed-in users get an upload form; a POST carrying
//! a `csvfile` part replaces the directory with the file's contents and
//! streams an HTML report while the import runs.

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::convert::Infallible;
use std::io::Cursor;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::import::{ImportEvent, Importer};
use crate::render;
use crate::AppState;

/// Multipart field carrying the roster
pub const CSV_FIELD: &str = "csvfile";

/// Buffered report events between the importer and a slow client
const REPORT_BUFFER: usize = 64;

/// GET|POST /update
pub async fn update(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    let Some(user) = state.auth.current_user(request.headers()) else {
        let return_to = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/update".to_string());
        let location = state.auth.login_url(&return_to)?;
        debug!("Unauthenticated update request, redirecting to login");
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    };

    if request.method() != Method::POST {
        return Ok(Html(render::update_form(&user)).into_response());
    }

    // Not a multipart body: same as a POST without a file
    let Ok(multipart) = Multipart::from_request(request, &state).await else {
        return Ok(Html(render::update_form(&user)).into_response());
    };
    let Some(csv) = read_csv_field(multipart).await? else {
        return Ok(Html(render::update_form(&user)).into_response());
    };

    info!(user = %user, bytes = csv.len(), "Receiving roster upload");

    let (event_tx, event_rx) = mpsc::channel(REPORT_BUFFER);
    let importer = Importer::with_events(state.store.clone(), state.import, event_tx);

    // Key scan and header failures happen before any output is sent
    let prepared = importer.prepare(Cursor::new(csv)).await?;
    debug!(
        existing = prepared.existing_count(),
        mapped_columns = prepared.columns().len(),
        "Import prepared"
    );

    tokio::spawn(async move {
        // Already reported on the event stream and logged by the importer
        if let Err(e) = prepared.run().await {
            debug!(user = %user, "Upload import ended early: {}", e);
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(report_stream(event_rx)),
    )
        .into_response())
}

async fn read_csv_field(mut multipart: Multipart) -> ApiResult<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(CSV_FIELD) {
            return Ok(Some(field.bytes().await?));
        }
    }
    Ok(None)
}

fn report_stream(
    mut event_rx: mpsc::Receiver<ImportEvent>,
) -> impl futures::Stream<Item = Result<String, Infallible>> {
    async_stream::stream! {
        yield Ok(render::REPORT_HEAD.to_string());
        while let Some(event) = event_rx.recv().await {
            yield Ok(render::report_event(&event));
        }
        yield Ok(render::REPORT_TAIL.to_string());
    }
}
