//! In-memory specialty knowledge base with keyword-overlap ranking.
//!
//! Documents live under `<root>/<specialty>/*.md` and `*.txt`. Each document
//! is split into passages at blank lines (long paragraphs are cut at
//! `MAX_PASSAGE_CHARS`) and indexed by its lowercase terms.

use async_trait::async_trait;
use glob::glob;
use interconsult_application::{KnowledgeError, KnowledgeRetriever, Passage};
use interconsult_domain::Specialty;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum passage length in characters
const MAX_PASSAGE_CHARS: usize = 1200;

/// Maximum file size loaded (2 MB)
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

static TERM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}\-]+").ok());

const STOPWORDS: [&str; 24] = [
    "the", "and", "for", "with", "what", "which", "are", "was", "were", "this", "that", "from",
    "into", "how", "should", "when", "does", "patient", "patients", "not", "but", "have", "has",
    "been",
];

#[derive(Error, Debug)]
pub enum KnowledgeLoadError {
    #[error("Knowledge base directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid knowledge base path pattern: {0}")]
    Pattern(String),
}

#[derive(Debug, Clone)]
struct IndexedPassage {
    source: String,
    content: String,
    terms: HashSet<String>,
}

/// Read-only after construction, so concurrent specialists share it freely.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    passages: HashMap<Specialty, Vec<IndexedPassage>>,
}

fn terms(text: &str) -> HashSet<String> {
    let words: Vec<&str> = match TERM.as_ref() {
        Some(re) => re.find_iter(text).map(|m| m.as_str()).collect(),
        None => text.split_whitespace().collect(),
    };
    words
        .into_iter()
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 3 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Split a document into passages at blank lines
fn split_passages(text: &str) -> Vec<String> {
    let mut passages = Vec::new();
    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let mut current = String::new();
        for line in paragraph.lines() {
            if !current.is_empty() && current.len() + line.len() > MAX_PASSAGE_CHARS {
                passages.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
        if !current.is_empty() {
            passages.push(current);
        }
    }
    passages
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's passages to a specialty
    pub fn with_document(mut self, specialty: Specialty, source: &str, text: &str) -> Self {
        self.add_document(specialty, source, text);
        self
    }

    fn add_document(&mut self, specialty: Specialty, source: &str, text: &str) {
        let entries = self.passages.entry(specialty).or_default();
        for content in split_passages(text) {
            entries.push(IndexedPassage {
                source: source.to_string(),
                terms: terms(&content),
                content,
            });
        }
    }

    /// Load every specialty directory found under `root`.
    ///
    /// Missing specialty directories are fine; unreadable files are skipped
    /// with a warning.
    pub fn load_dir(root: &Path) -> Result<Self, KnowledgeLoadError> {
        if !root.is_dir() {
            return Err(KnowledgeLoadError::NotFound(root.to_path_buf()));
        }
        let mut kb = Self::new();
        for specialty in Specialty::ALL {
            let dir = root.join(specialty.as_str());
            if !dir.is_dir() {
                continue;
            }
            for extension in ["md", "txt"] {
                let pattern = format!("{}/**/*.{}", dir.display(), extension);
                let entries = glob(&pattern).map_err(|e| KnowledgeLoadError::Pattern(e.to_string()))?;
                for path in entries.flatten() {
                    kb.load_file(specialty, &dir, &path);
                }
            }
        }
        info!(
            specialties = kb.passages.len(),
            passages = kb.passages.values().map(Vec::len).sum::<usize>(),
            "Loaded knowledge base from {}",
            root.display()
        );
        Ok(kb)
    }

    fn load_file(&mut self, specialty: Specialty, dir: &Path, path: &Path) {
        match fs::metadata(path) {
            Ok(meta) if meta.len() > MAX_FILE_SIZE => {
                warn!("Skipping {} ({} bytes, too large)", path.display(), meta.len());
                return;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return;
            }
            Ok(_) => {}
        }
        match fs::read_to_string(path) {
            Ok(text) => {
                let source = path
                    .strip_prefix(dir)
                    .unwrap_or(path)
                    .display()
                    .to_string();
                self.add_document(specialty, &source, &text);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    pub fn passage_count(&self, specialty: Specialty) -> usize {
        self.passages.get(&specialty).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.passages.values().all(Vec::is_empty)
    }

    /// Passages ranked by the share of query terms they contain
    pub fn rank(&self, specialty: Specialty, query: &str, top_k: usize) -> Vec<Passage> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }
        let Some(passages) = self.passages.get(&specialty) else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f32, &IndexedPassage)> = passages
            .iter()
            .enumerate()
            .filter_map(|(index, passage)| {
                let hits = query_terms.intersection(&passage.terms).count();
                (hits > 0).then(|| (index, hits as f32 / query_terms.len() as f32, passage))
            })
            .collect();
        // stable order for equal scores: load order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(top_k)
            .map(|(_, score, passage)| Passage {
                source: passage.source.clone(),
                content: passage.content.clone(),
                score,
            })
            .collect()
    }
}

#[async_trait]
impl KnowledgeRetriever for InMemoryKnowledgeBase {
    async fn retrieve(
        &self,
        specialty: Specialty,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<Passage>, KnowledgeError> {
        let passages = self.rank(specialty, query, top_k);
        debug!(specialty = %specialty, hits = passages.len(), "Knowledge base query");
        Ok(passages)
    }
}
