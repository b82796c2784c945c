//! Tool implementations for the appcoder MCP server
//!
//! The functions here are plain async functions over a [`RetrievalEngine`];
//! the server only adapts them to MCP call results.
//!
//! [`RetrievalEngine`]: appcoder_retriever::retrieval::RetrievalEngine

pub mod documentation;
