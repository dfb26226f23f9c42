// Prints the OpenAPI document as JSON.
// Usage: cargo run --bin openapi_export > openapi.json

use anyhow::{Context, Result};
use std::io::Write;
use utoipa::OpenApi;

use user_api::api::openapi::ApiDoc;

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write OpenAPI document")?;
    Ok(())
}
