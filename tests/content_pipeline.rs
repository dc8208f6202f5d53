use std::{fs, path::Path, sync::Arc};

use notebook::{
    application::{
        content::{ContentLoader, DocumentError},
        reload::ReloadService,
        render::{ComrakRenderService, RenderPipelineConfig, RenderService, SiteOrigin},
        repos::DocumentsRepo,
    },
    infra::db::SqliteRepositories,
};

struct Fixture {
    _dir: tempfile::TempDir,
    content: std::path::PathBuf,
    repos: Arc<SqliteRepositories>,
    reload: ReloadService,
}

async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let content = dir.path().join("content");
    fs::create_dir(&content).expect("content dir");

    let repos = Arc::new(
        SqliteRepositories::open(&dir.path().join("notebook.db"), 2)
            .await
            .expect("open store"),
    );
    let renderer = ComrakRenderService::new(RenderPipelineConfig::default()).expect("renderer");
    let origin = SiteOrigin::parse("https://example.com").expect("origin");
    let loader = ContentLoader::new(&content, Arc::new(renderer), origin);
    let reload = ReloadService::new(loader, repos.clone());

    Fixture {
        _dir: dir,
        content,
        repos,
        reload,
    }
}

fn write(root: &Path, name: &str, text: &str) {
    fs::write(root.join(name), text).expect("write fixture");
}

#[tokio::test]
async fn published_document_is_listed() {
    let fx = fixture().await;
    write(
        &fx.content,
        "2025-09-12-hello.md",
        "---\ntitle: \"Hello\"\ndraft: false\n---\n# Hi\n",
    );

    let summary = fx.reload.reload().await.expect("reload");
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, 0);

    let public = fx.repos.list_documents(false).await.expect("list");
    assert_eq!(public.len(), 1);
    let doc = &public[0];
    assert_eq!(doc.slug, "hello");
    assert_eq!(doc.title, "Hello");
    assert!(doc.rendered_body.contains("<h1>Hi</h1>"));
    assert_eq!(doc.raw_body, "# Hi\n");
}

#[tokio::test]
async fn draft_document_is_hidden_from_public_listing() {
    let fx = fixture().await;
    write(
        &fx.content,
        "2025-09-12-hello.md",
        "---\ntitle: \"Hello\"\ndraft: true\n---\n# Hi\n",
    );

    fx.reload.reload().await.expect("reload");

    assert!(fx.repos.list_documents(false).await.expect("public").is_empty());
    let all = fx.repos.list_documents(true).await.expect("all");
    assert_eq!(all.len(), 1);
    assert!(all[0].is_draft);
}

#[tokio::test]
async fn reload_replaces_documents_in_place() {
    let fx = fixture().await;
    write(&fx.content, "note.md", "---\ntitle: One\n---\nfirst\n");
    fx.reload.reload().await.expect("first reload");
    let first = fx
        .repos
        .find_by_slug("note")
        .await
        .expect("query")
        .expect("present");

    write(&fx.content, "note.md", "---\ntitle: Two\n---\nsecond\n");
    fx.reload.reload().await.expect("second reload");
    let second = fx
        .repos
        .find_by_slug("note")
        .await
        .expect("query")
        .expect("present");

    assert_eq!(second.title, "Two");
    assert_eq!(second.raw_body, "second\n");
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(fx.repos.list_documents(true).await.expect("list").len(), 1);
}

#[tokio::test]
async fn bad_files_are_skipped_and_reported() {
    let fx = fixture().await;
    write(&fx.content, "good.md", "fine\n");
    write(&fx.content, "open.md", "---\ntitle: never closed\n");
    write(&fx.content, "when.md", "---\ndate: invalid-date\n---\nbody\n");

    let report = fx.reload.loader().load_all().expect("walk");
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().any(|failure| matches!(
        failure.error,
        DocumentError::MalformedMetadata { .. }
    )));
    assert!(
        report
            .failures
            .iter()
            .any(|failure| matches!(failure.error, DocumentError::InvalidDate(_)))
    );

    let summary = fx.reload.reload().await.expect("reload");
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn external_links_and_code_are_processed() {
    let fx = fixture().await;
    write(
        &fx.content,
        "links.md",
        "[site](https://example.com/a) [away](https://elsewhere.net)\n\n```python\nprint('hi')\n```\n",
    );

    fx.reload.reload().await.expect("reload");
    let doc = fx
        .repos
        .find_by_slug("links")
        .await
        .expect("query")
        .expect("present");

    assert!(doc.rendered_body.contains(r#"<a href="https://example.com/a">site</a>"#));
    assert!(doc.rendered_body.contains(
        r#"<a href="https://elsewhere.net" target="_blank" rel="noopener noreferrer">away</a>"#
    ));
    assert!(doc.rendered_body.contains("data-language=\"python\""));
}

#[test]
fn rendering_the_same_body_twice_is_byte_identical() {
    let renderer = ComrakRenderService::new(RenderPipelineConfig::default()).expect("renderer");
    let request = notebook::application::render::RenderRequest::new(
        "same",
        "# T\n\n```rust\nlet a = 1;\n```\n\n| x |\n|---|\n| 1 |\n",
    );
    let first = renderer.render(&request).expect("first");
    let second = renderer.render(&request).expect("second");
    assert_eq!(first.html, second.html);
}
