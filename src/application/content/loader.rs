use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use metrics::{counter, histogram};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    application::render::{RenderRequest, RenderService, SiteOrigin},
    domain::{
        dates::{normalize_date, now_utc},
        entities::Document,
        slug::derive_slug,
    },
};

use super::{DocumentError, LoadError, split_front_matter};

const METRIC_DOCUMENTS_LOADED: &str = "notebook_documents_loaded_total";
const METRIC_DOCUMENTS_FAILED: &str = "notebook_documents_failed_total";
const METRIC_LOAD_MS: &str = "notebook_load_ms";

const DOCUMENT_EXTENSION: &str = "md";

/// A file that could not be turned into a document during a walk.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: DocumentError,
}

/// Outcome of one walk over the content root.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// Walks a content root and turns each markdown file into a [`Document`].
#[derive(Clone)]
pub struct ContentLoader {
    root: PathBuf,
    renderer: Arc<dyn RenderService>,
    site_origin: SiteOrigin,
}

impl ContentLoader {
    pub fn new(
        root: impl Into<PathBuf>,
        renderer: Arc<dyn RenderService>,
        site_origin: SiteOrigin,
    ) -> Self {
        Self {
            root: root.into(),
            renderer,
            site_origin,
        }
    }

    /// CSS for the active colorization theme.
    pub fn stylesheet(&self) -> &str {
        self.renderer.stylesheet()
    }

    /// Load every document under the root.
    ///
    /// Per-file failures are collected in the report. Only an unreadable root
    /// fails the call.
    pub fn load_all(&self) -> Result<LoadReport, LoadError> {
        let started_at = Instant::now();
        self.ensure_root_readable()?;

        let now = now_utc();
        let mut report = LoadReport::default();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(LoadError::RootUnreadable {
                            path: self.root.clone(),
                            source: err.into(),
                        });
                    }
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let error = DocumentError::Read(err.into());
                    record_failure(&mut report, path, error);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_document(entry.path()) {
                continue;
            }

            let path = entry.path();
            match self.load_file(path, now) {
                Ok(document) => {
                    if let Some(first) = claimed.get(&document.slug) {
                        let error = DocumentError::DuplicateSlug {
                            slug: document.slug.clone(),
                            first: first.clone(),
                        };
                        record_failure(&mut report, path.to_path_buf(), error);
                        continue;
                    }
                    debug!(
                        target = "application::content",
                        path = %path.display(),
                        slug = %document.slug,
                        "document loaded"
                    );
                    claimed.insert(document.slug.clone(), path.to_path_buf());
                    report.documents.push(document);
                }
                Err(error) => record_failure(&mut report, path.to_path_buf(), error),
            }
        }

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        counter!(METRIC_DOCUMENTS_LOADED).increment(report.documents.len() as u64);
        histogram!(METRIC_LOAD_MS).record(elapsed_ms);

        if report.documents.is_empty() {
            warn!(
                target = "application::content",
                root = %self.root.display(),
                failed = report.failures.len(),
                "content walk produced no documents"
            );
        } else {
            info!(
                target = "application::content",
                root = %self.root.display(),
                loaded = report.documents.len(),
                failed = report.failures.len(),
                elapsed_ms,
                "content walk complete"
            );
        }

        Ok(report)
    }

    /// Read and transform one file.
    pub fn load_file(&self, path: &Path, now: OffsetDateTime) -> Result<Document, DocumentError> {
        let raw = fs::read_to_string(path).map_err(DocumentError::Read)?;
        self.parse_document(&raw, path, now)
    }

    /// Transform raw document text that was read from `path`.
    pub fn parse_document(
        &self,
        raw: &str,
        path: &Path,
        now: OffsetDateTime,
    ) -> Result<Document, DocumentError> {
        let (meta, body) = split_front_matter(raw)?;

        let slug = derive_slug(path);
        if slug.is_empty() {
            return Err(DocumentError::EmptySlug);
        }

        let published_at = normalize_date(&meta.date, now)?;

        let request =
            RenderRequest::new(slug.as_str(), body).with_site_origin(self.site_origin.clone());
        let rendered = self.renderer.render(&request)?;

        let tags = meta
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();

        // A whitespace-only body renders to nothing, so it is stored as empty.
        let raw_body = if body.trim().is_empty() {
            String::new()
        } else {
            body.to_string()
        };

        Ok(Document {
            slug,
            title: meta.title,
            summary: meta.summary,
            rendered_body: rendered.html,
            raw_body,
            published_at,
            updated_at: now,
            is_draft: meta.draft,
            tags,
        })
    }

    fn ensure_root_readable(&self) -> Result<(), LoadError> {
        fs::read_dir(&self.root)
            .map(|_| ())
            .map_err(|source| LoadError::RootUnreadable {
                path: self.root.clone(),
                source,
            })
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
}

fn record_failure(report: &mut LoadReport, path: PathBuf, error: DocumentError) {
    warn!(
        target = "application::content",
        path = %path.display(),
        kind = error.kind(),
        error = %error,
        "document skipped"
    );
    counter!(METRIC_DOCUMENTS_FAILED, "kind" => error.kind()).increment(1);
    report.failures.push(LoadFailure { path, error });
}
