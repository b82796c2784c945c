//! End to end tests over an on-disk SQLite store wired through the process
//! context, the same way the binaries run.

mod common;

use anyhow::Result;
use appcoder_retriever::config::{AppConfig, AppContext};
use appcoder_retriever::partition::{Partition, PartitionOverride};
use appcoder_retriever::status::StatusReport;
use common::{chunk, heading_labels, pages};
use tempfile::tempdir;

async fn populated_context(config: AppConfig) -> Result<AppContext> {
    let context = AppContext::build(config).await?;
    let store = &context.store;
    store
        .upsert_chunks(Partition::Web, &pages("https://react.dev/learn", "Learn - React", 3))
        .await?;
    store
        .upsert_chunks(
            Partition::Desktop,
            &pages("https://electronjs.org/docs", "Electron Docs", 3),
        )
        .await?;
    store
        .upsert_chunks(Partition::Server, &pages("https://nodejs.org/api", "Node.js", 3))
        .await?;
    store
        .upsert_chunks(
            Partition::Mobile,
            &pages("https://docs.nativescript.org", "NativeScript", 3),
        )
        .await?;
    Ok(context)
}

#[tokio::test]
async fn test_fan_out_over_sqlite() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    let context = populated_context(config).await?;

    let text = context.engine.retrieve_documentation("routing", None).await;
    assert_eq!(
        heading_labels(&text),
        ["Web", "Web", "Desktop", "Desktop", "Server", "Server", "Mobile", "Mobile"]
    );
    assert_eq!(text.matches("\n\n---\n\n").count(), 7);
    Ok(())
}

#[tokio::test]
async fn test_named_platform_without_embeddings() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    let context = populated_context(config).await?;

    // rows were imported without embeddings; ranked search still returns them
    let text = context.engine.retrieve_documentation("hooks", Some("web")).await;
    assert_eq!(heading_labels(&text), ["Web", "Web", "Web"]);
    assert!(text.contains("Source: https://react.dev/learn/0"));

    let report = StatusReport::collect(&context.engine).await;
    assert_eq!(report.partitions[Partition::Web as usize].similarity_fallbacks, 0);
    Ok(())
}

#[tokio::test]
async fn test_dropped_table_is_isolated() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    let context = populated_context(config).await?;

    sqlx::query("DROP TABLE node_pages")
        .execute(context.store.pool())
        .await?;

    let text = context.engine.retrieve_documentation("streams", None).await;
    assert_eq!(
        heading_labels(&text),
        ["Web", "Web", "Desktop", "Desktop", "Mobile", "Mobile"]
    );

    assert_eq!(
        context
            .engine
            .retrieve_documentation("streams", Some("node"))
            .await,
        "No relevant documentation found for node."
    );

    let pages = context.engine.list_documentation_pages(None).await;
    assert_eq!(pages.len(), 9);
    assert!(pages.iter().all(|p| !p.starts_with("Server: ")));

    let report = StatusReport::collect(&context.engine).await;
    assert!(!report.is_healthy());
    let server = &report.partitions[Partition::Server as usize];
    assert_eq!(server.partition, Partition::Server);
    assert!(server.rows.is_none());
    assert!(server.read_failures >= 2);
    assert_eq!(report.total_rows(), 9);
    Ok(())
}

#[tokio::test]
async fn test_page_roundtrip_through_sqlite() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    let context = AppContext::build(config).await?;

    let url = "https://nodejs.org/api/fs.html";
    context
        .store
        .upsert_chunks(
            Partition::Server,
            &[
                chunk(url, 1, "File system - Node.js v22", "fs.readFile()"),
                chunk(url, 0, "File system - Node.js v22", "The node:fs module"),
            ],
        )
        .await?;

    assert_eq!(
        context.engine.get_page_content(url).await,
        format!("# File system (Server)\n\nSource: {url}\n\nThe node:fs module\n\nfs.readFile()")
    );
    Ok(())
}

#[tokio::test]
async fn test_configured_overrides_reach_the_engine() -> Result<()> {
    let dir = tempdir()?;
    let mut config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    config.partitions.insert(
        Partition::Web,
        PartitionOverride {
            table: Some("web_docs".into()),
            label: Some("React".into()),
            similarity_index: Some(false),
        },
    );
    config.retrieval.ranked_limit = 2;
    let context = populated_context(config).await?;

    let text = context.engine.retrieve_documentation("jsx", Some("web")).await;
    assert_eq!(heading_labels(&text), ["React", "React"]);

    // the table was created under its configured name
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM web_docs")
        .fetch_one(context.store.pool())
        .await?;
    assert_eq!(rows, 3);
    Ok(())
}

#[tokio::test]
async fn test_status_report_serialises() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig::default().with_database_path(dir.path().join("docs.db"));
    let context = populated_context(config).await?;
    context.engine.retrieve_documentation("x", None).await;

    let report = StatusReport::collect(&context.engine).await;
    assert!(report.is_healthy());
    assert_eq!(report.health.retrievals, 1);

    let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(json["partitions"][0]["table"], "react_pages");
    assert_eq!(json["partitions"][3]["pages"], 3);
    assert_eq!(json["embedding"]["dimension"], 1536);

    let text = report.render_text();
    assert!(text.contains("Desktop [desktop] Electron table=electron_pages similarity=yes: 3 chunks, 3 pages"));
    Ok(())
}
