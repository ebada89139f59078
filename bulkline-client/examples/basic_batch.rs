// Basic batching example
// Collects two requests, sends them as one combined call to a bulk
// endpoint, and prints each demultiplexed outcome.
//
// Expects a server exposing POST /_bulk on localhost:3000 that answers
// with newline-separated {"status": ..., "body": "..."} records.

use std::sync::Arc;

use anyhow::Result;
use bulkline_client::{BulkClient, HttpTransport, RequestSettings, SendOptions, SendOutcome};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let transport = HttpTransport::new("http://localhost:3000")?;
    let client = BulkClient::new(Arc::new(transport));

    let batch = client.collect(|| {
        client.dispatch(
            RequestSettings::put("/contacts/1")
                .data("name=Ada")
                .content_type("application/x-www-form-urlencoded")
                .on_success(|body, label, _| {
                    info!(%label, %body, "contact updated");
                })
                .on_error(|body, label, _| {
                    info!(%label, %body, "contact update failed");
                }),
        );
        client.dispatch(
            RequestSettings::get("/contacts?page=2").on_success(|body, _, _| {
                info!(%body, "contact page fetched");
            }),
        );
    });

    info!(requests = batch.len(), "collected batch");

    match batch.send(SendOptions::new()).await? {
        SendOutcome::Sent(reply) => info!(status = reply.status, "combined call finished"),
        SendOutcome::Empty => info!("nothing to send"),
        SendOutcome::Deferred => unreachable!("batch has no parent"),
    }

    Ok(())
}
