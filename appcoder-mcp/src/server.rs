use crate::tools::documentation::{
    self, ListPagesRequest, PageContentRequest, RetrieveDocumentationRequest,
};
use anyhow::Result;
use appcoder_retriever::retrieval::RetrievalEngine;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    transport::io::stdio,
};
use tracing::info;

/// MCP server exposing the documentation retrieval operations as tools
#[derive(Clone)]
pub struct DocsMcpServer {
    engine: RetrievalEngine,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DocsMcpServer {
    /// Create a server answering from the given engine
    pub fn new(engine: RetrievalEngine) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Retrieve the documentation most relevant to a query, optionally for one platform (web/React, desktop/Electron, server/Node.js, mobile/NativeScript)"
    )]
    async fn retrieve_relevant_documentation(
        &self,
        params: Parameters<RetrieveDocumentationRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = documentation::retrieve_relevant_documentation(&self.engine, params.0).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "List the stored documentation pages as \"Label: url\" entries")]
    async fn list_documentation_pages(
        &self,
        params: Parameters<ListPagesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let pages = documentation::list_documentation_pages(&self.engine, params.0).await;
        Ok(CallToolResult::success(vec![Content::json(pages)?]))
    }

    #[tool(description = "Get the full content of a documentation page by URL")]
    async fn get_page_content(
        &self,
        params: Parameters<PageContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = documentation::get_page_content(&self.engine, params.0).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Show store contents per platform, read failure counters and embedding statistics"
    )]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        let text = documentation::status(&self.engine).await;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Serve the MCP server using stdio transport
    pub async fn serve_stdio(self) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        let server = self.serve(stdio()).await?;
        let quit_reason = server.waiting().await?;
        info!("MCP server quit: {:?}", quit_reason);
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for DocsMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "AppCoder documentation server - retrieves React, Electron, Node.js and NativeScript documentation for code generation"
                    .into(),
            ),
            ..Default::default()
        }
    }
}
