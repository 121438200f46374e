use anyhow::Context;
use utoipa::OpenApi;
use wrapped_party_back::services::documentation::ApiDoc;

fn main() -> anyhow::Result<()> {
    let doc = ApiDoc::openapi();
    let json = doc
        .to_pretty_json()
        .context("serializing the OpenAPI document")?;
    println!("{json}");
    Ok(())
}
