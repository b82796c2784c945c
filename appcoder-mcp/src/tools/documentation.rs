use appcoder_retriever::retrieval::RetrievalEngine;
use appcoder_retriever::status::StatusReport;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RetrieveDocumentationRequest {
    #[schemars(description = "What the agent needs to know, in natural language")]
    pub user_query: String,
    #[schemars(
        description = "Platform to search: web, desktop, server, mobile (or react, electron, nodejs, nativescript). Omit to search every platform."
    )]
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListPagesRequest {
    #[schemars(description = "Platform to list. Omit to list pages of every platform.")]
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageContentRequest {
    #[schemars(description = "URL of the page, as returned by list_documentation_pages")]
    pub url: String,
}

/// Formatted documentation blocks, or the not-found sentence.
pub async fn retrieve_relevant_documentation(
    engine: &RetrievalEngine,
    request: RetrieveDocumentationRequest,
) -> String {
    info!(
        "Processing documentation retrieval: query='{}', platform={:?}",
        request.user_query, request.platform
    );
    engine
        .retrieve_documentation(&request.user_query, request.platform.as_deref())
        .await
}

/// Sorted `"Label: url"` entries.
pub async fn list_documentation_pages(
    engine: &RetrievalEngine,
    request: ListPagesRequest,
) -> Vec<String> {
    info!("Listing documentation pages: platform={:?}", request.platform);
    engine
        .list_documentation_pages(request.platform.as_deref())
        .await
}

/// The whole page, or the not-found sentence.
pub async fn get_page_content(engine: &RetrievalEngine, request: PageContentRequest) -> String {
    info!("Reading documentation page: {}", request.url);
    engine.get_page_content(&request.url).await
}

/// Store contents, failure counters and embedder statistics as text.
pub async fn status(engine: &RetrievalEngine) -> String {
    info!("Processing status request");
    let report = StatusReport::collect(engine).await;
    format!(
        "AppCoder MCP Server v{}\n\n{}",
        env!("CARGO_PKG_VERSION"),
        report.render_text()
    )
}
