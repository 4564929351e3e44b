//! Staged field resolution.
//!
//! ```text
//! INIT → HASH_LOOKUP ─hit─→ done
//!             └─miss─→ TEXT_EXTRACTED → HEURISTIC → TEMPLATE → GENERATIVE → FINALIZE
//! ```
//! Each stage after HEURISTIC runs only while fields remain. FINALIZE fills
//! what is still missing with null and records the result in the hash cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::cache::{CacheStore, HashCache, TemplateCache};
use super::document::{cache_key, DocumentError, DocumentHandle, PositionedToken};
use super::generative::GenerativeBackend;
use super::heuristic::HeuristicMatcher;
use super::reducer;
use super::types::{
    is_meaningful, FieldMap, FieldSource, PipelineStage, Resolution, ResolutionResult, Schema,
};

pub struct Orchestrator {
    matcher: HeuristicMatcher,
    hash_cache: Arc<dyn HashCache>,
    templates: Arc<dyn TemplateCache>,
    backend: Box<dyn GenerativeBackend>,
}

impl Orchestrator {
    pub fn new(
        matcher: HeuristicMatcher,
        hash_cache: Arc<dyn HashCache>,
        templates: Arc<dyn TemplateCache>,
        backend: Box<dyn GenerativeBackend>,
    ) -> Self {
        Self {
            matcher,
            hash_cache,
            templates,
            backend,
        }
    }

    /// Built-in heuristics, with one store serving both caches.
    pub fn with_store(store: Arc<CacheStore>, backend: Box<dyn GenerativeBackend>) -> Self {
        Self::new(HeuristicMatcher::builtin(), store.clone(), store, backend)
    }

    /// Resolve every field of `schema` for one document.
    ///
    /// Never fails: a document that cannot be read yields an all-null
    /// result and leaves both caches untouched.
    pub fn resolve(&self, label: &str, document: &dyn DocumentHandle, schema: &Schema) -> Resolution {
        let mut run = Run::new(schema);
        tracing::info!(label, fields = schema.len(), "Starting resolution");

        // ── Stage 0: hash cache ──────────────────────────────
        run.enter(PipelineStage::HashLookup);
        let content_hash = match document.content_hash() {
            Ok(hash) => hash,
            Err(e) => return run.abort(label, "hash", &e),
        };
        let key = cache_key(&content_hash, schema);
        run.cache_key = Some(key.clone());

        if let Some(hit) = self.hash_cache.lookup(&key) {
            tracing::info!(label, key = %short(&key), "Hash cache hit");
            return run.into_hash_hit(hit);
        }

        // ── Document content ─────────────────────────────────
        let (text, tokens) = match read_content(document) {
            Ok(content) => content,
            Err(e) => return run.abort(label, "content", &e),
        };
        if text.trim().is_empty() {
            tracing::warn!(label, "Document has no text, returning nulls");
            return run.finish_unresolved();
        }
        run.enter(PipelineStage::TextExtracted);

        // ── Stage 1: heuristics ──────────────────────────────
        run.enter(PipelineStage::Heuristic);
        let output = self.matcher.extract(&tokens, &run.remaining);
        tracing::info!(label, found = output.found.len(), remaining = output.remaining.len(), "Heuristic stage done");
        run.absorb(output.found, output.remaining, FieldSource::Heuristic);

        // ── Stage 2: template cache ──────────────────────────
        if !run.remaining.is_empty() {
            run.enter(PipelineStage::Template);
            if label.is_empty() {
                tracing::debug!("No label, skipping template cache");
            } else {
                let output = self.templates.lookup_rules(label, &text, &run.remaining);
                tracing::info!(label, found = output.found.len(), remaining = output.remaining.len(), "Template stage done");
                run.absorb(output.found, output.remaining, FieldSource::Template);
            }
        }

        // ── Stage 3: generative ──────────────────────────────
        if !run.remaining.is_empty() {
            run.enter(PipelineStage::Generative);
            let context = reducer::reduce(label, &text, &run.remaining);

            match self.backend.extract(&context, &run.remaining) {
                Ok(answer) => {
                    let generated: FieldMap = answer
                        .into_iter()
                        .filter(|(field, value)| run.remaining.contains_key(field) && is_meaningful(value))
                        .collect();
                    tracing::info!(label, found = generated.len(), "Generative stage done");

                    if !label.is_empty() && !generated.is_empty() {
                        let learned = self.templates.learn(label, &generated);
                        tracing::debug!(label, learned, "Template rules learned");
                    }

                    let remaining: Schema = run
                        .remaining
                        .iter()
                        .filter(|(field, _)| !generated.contains_key(*field))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    run.absorb(generated, remaining, FieldSource::Generative);
                }
                Err(e) => {
                    tracing::warn!(label, error = %e, "Generative stage failed, leaving fields null");
                }
            }
        }

        // ── Finalize ─────────────────────────────────────────
        let resolution = run.finish_unresolved();
        self.hash_cache.store(&key, &resolution.values);
        tracing::info!(
            label,
            resolved = resolution.resolved_count(),
            total = resolution.values.len(),
            "Resolution finished"
        );
        resolution
    }
}

fn read_content(document: &dyn DocumentHandle) -> Result<(String, Vec<PositionedToken>), DocumentError> {
    let text = document.text()?;
    let tokens = document.tokens()?;
    Ok((text, tokens))
}

fn short(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

/// Mutable state of one resolution run.
struct Run<'a> {
    schema: &'a Schema,
    values: ResolutionResult,
    sources: BTreeMap<String, FieldSource>,
    remaining: Schema,
    stages: Vec<PipelineStage>,
    cache_key: Option<String>,
}

impl<'a> Run<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            values: ResolutionResult::new(),
            sources: BTreeMap::new(),
            remaining: schema.clone(),
            stages: vec![PipelineStage::Init],
            cache_key: None,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        tracing::debug!(stage = %stage, "Entering stage");
        self.stages.push(stage);
    }

    fn absorb(&mut self, found: FieldMap, remaining: Schema, source: FieldSource) {
        for (field, value) in found {
            self.sources.insert(field.clone(), source);
            self.values.insert(field, value);
        }
        self.remaining = remaining;
    }

    fn into_hash_hit(self, hit: ResolutionResult) -> Resolution {
        let values: ResolutionResult = self
            .schema
            .keys()
            .map(|field| (field.clone(), hit.get(field).cloned().unwrap_or(Value::Null)))
            .collect();
        let sources = values
            .iter()
            .map(|(field, value)| {
                let source = if value.is_null() { FieldSource::Unresolved } else { FieldSource::HashCache };
                (field.clone(), source)
            })
            .collect();
        Resolution {
            values,
            sources,
            stages: self.stages,
            cache_key: self.cache_key,
        }
    }

    /// Read failure: everything null, nothing cached.
    fn abort(mut self, label: &str, what: &str, error: &DocumentError) -> Resolution {
        tracing::warn!(label, step = what, error = %error, "Cannot read document, returning nulls");
        self.values.clear();
        self.sources.clear();
        self.cache_key = None;
        self.finish_unresolved()
    }

    /// Fill every field not yet resolved with null.
    fn finish_unresolved(mut self) -> Resolution {
        self.stages.push(PipelineStage::Finalize);
        for field in self.schema.keys() {
            if !self.values.contains_key(field) {
                self.values.insert(field.clone(), Value::Null);
                self.sources.insert(field.clone(), FieldSource::Unresolved);
            }
        }
        Resolution {
            values: self.values,
            sources: self.sources,
            stages: self.stages,
            cache_key: self.cache_key,
        }
    }
}
