//! Marketplace routes.
//!
//! The collaborator side of the core contracts: every handler here is an
//! ordinary registration against [`Router`] and talks to storage purely
//! through [`CollectionStore`]. Payloads arrive as untyped JSON; each
//! handler narrows the fields it needs and answers with an envelope error
//! when they are missing, rather than trusting their presence.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use http::StatusCode;
use serde_json::{Map, Value, json};

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::store::{Collection, CollectionStore, record_id};

/// Builds the full route table: service endpoints plus the marketplace
/// surface. Registration order matters — the router is first-match-wins.
pub fn routes(store: Arc<CollectionStore>, treasury_address: String) -> Router {
    let treasury = Arc::new(treasury_address);

    Router::new()
        .get("/", identity)
        .get("/health", health)
        .get("/config/treasury", {
            let treasury = Arc::clone(&treasury);
            move |_req: Request| {
                let treasury = Arc::clone(&treasury);
                async move { Ok::<_, Error>(Response::json(&json!({ "address": &*treasury }))) }
            }
        })
        .get("/listings", list(Arc::clone(&store), Collection::Listings))
        .post(
            "/listings",
            create(Arc::clone(&store), Collection::Listings, "listing", &[("status", "open")]),
        )
        .get("/listings/:id", find_by_id(Arc::clone(&store), Collection::Listings))
        .get("/mints", list(Arc::clone(&store), Collection::Mints))
        .post("/mints", create(Arc::clone(&store), Collection::Mints, "mint", &[]))
        .get("/trade-history", list(Arc::clone(&store), Collection::TradeHistory))
        .get("/escrows", list(Arc::clone(&store), Collection::Escrows))
        .post(
            "/escrows",
            create(Arc::clone(&store), Collection::Escrows, "escrow", &[("status", "pending")]),
        )
        .post("/escrows/:id/accept", accept_escrow(Arc::clone(&store)))
        .get("/tents", list(Arc::clone(&store), Collection::Tents))
        .post("/tents", create(Arc::clone(&store), Collection::Tents, "tent", &[]))
}

// ── Service endpoints ─────────────────────────────────────────────────────────

async fn identity(_req: Request) -> Result<Response, Error> {
    Ok(Response::json(&json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn health(_req: Request) -> Result<Response, Error> {
    Ok(Response::json(&json!({
        "status": "healthy",
        "timestamp": now(),
    })))
}

// ── Generic collection handlers ───────────────────────────────────────────────

/// `GET` over a whole collection.
fn list(
    store: Arc<CollectionStore>,
    collection: Collection,
) -> impl Fn(Request) -> BoxFuture + Send + Sync + 'static {
    move |_req: Request| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            let records = store.read_all(collection).await?;
            Ok(Response::json(&records))
        })
    }
}

/// `POST` of a new record: requires a JSON object body, tags it with a
/// generated `<prefix>_<token>` id and a creation timestamp, applies any
/// missing `defaults`, and appends it.
fn create(
    store: Arc<CollectionStore>,
    collection: Collection,
    prefix: &'static str,
    defaults: &'static [(&'static str, &'static str)],
) -> impl Fn(Request) -> BoxFuture + Send + Sync + 'static {
    move |req: Request| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            let Some(mut record) = object_body(req) else {
                return Ok(Response::error(
                    StatusCode::BAD_REQUEST,
                    "expected a JSON object body",
                ));
            };
            record.insert("id".to_owned(), Value::String(record_id(prefix)));
            record.insert("createdAt".to_owned(), Value::String(now()));
            for (key, value) in defaults {
                record
                    .entry((*key).to_owned())
                    .or_insert_with(|| Value::String((*value).to_owned()));
            }
            let stored = store.append(collection, Value::Object(record)).await?;
            Ok(Response::builder().status(StatusCode::CREATED).json(&stored))
        })
    }
}

/// `GET /<collection>/:id` by the embedded `id` field.
fn find_by_id(
    store: Arc<CollectionStore>,
    collection: Collection,
) -> impl Fn(Request) -> BoxFuture + Send + Sync + 'static {
    move |req: Request| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            let id = req.param("id").unwrap_or_default().to_owned();
            let records = store.read_all(collection).await?;
            match records.into_iter().find(|r| r["id"] == json!(id)) {
                Some(record) => Ok(Response::json(&record)),
                None => Ok(Response::error(
                    StatusCode::NOT_FOUND,
                    &format!("{} not found: {id}", collection.name()),
                )),
            }
        })
    }
}

/// `POST /escrows/:id/accept`: flips the escrow to `accepted` and records
/// the trade. Two collection writes with no transaction between them — an
/// interrupted accept can leave the escrow flipped without its trade row.
fn accept_escrow(
    store: Arc<CollectionStore>,
) -> impl Fn(Request) -> BoxFuture + Send + Sync + 'static {
    move |req: Request| {
        let store = Arc::clone(&store);
        Box::pin(async move {
            let id = req.param("id").unwrap_or_default().to_owned();
            let mut escrows = store.read_all(Collection::Escrows).await?;
            let Some(escrow) = escrows
                .iter_mut()
                .filter_map(Value::as_object_mut)
                .find(|e| e.get("id").and_then(Value::as_str) == Some(id.as_str()))
            else {
                return Ok(Response::error(
                    StatusCode::NOT_FOUND,
                    &format!("escrow not found: {id}"),
                ));
            };

            escrow.insert("status".to_owned(), Value::String("accepted".to_owned()));
            escrow.insert("acceptedAt".to_owned(), Value::String(now()));
            let trade = json!({
                "id": record_id("trade"),
                "escrowId": id,
                "listingId": escrow.get("listingId").cloned().unwrap_or(Value::Null),
                "price": escrow.get("price").cloned().unwrap_or(Value::Null),
                "executedAt": now(),
            });
            let accepted = Value::Object(escrow.clone());

            store.write_all(Collection::Escrows, &escrows).await?;
            store.append(Collection::TradeHistory, trade).await?;
            Ok(Response::json(&accepted))
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Narrows the request body to a JSON object, or `None` for anything else.
fn object_body(req: Request) -> Option<Map<String, Value>> {
    match req.into_body() {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// RFC 3339 / ISO-8601 timestamp in UTC, millisecond precision.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
