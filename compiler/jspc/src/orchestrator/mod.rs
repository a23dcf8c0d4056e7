//! One precompilation run, start to finish.
//!
//! ```text
//! discover -> delta filter -> partition -> pool of workers -> aggregate
//!                                              |                  |
//!                                  shared ResolutionCache     merge fragments
//! ```
//!
//! The resolution cache is created at the start of [`Precompiler::run`] and
//! dropped when it returns; nothing carries over between runs except the
//! optional hash manifest.
//!
//! An incremental run compiles only changed pages, but every worker fragment
//! still declares the unchanged pages that worker would own in a full build,
//! using the declarations the manifest recorded. The merged descriptor
//! therefore always covers every page.

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use jspc_resolve::{ClassSource, Classpath, CompilationContext, ResolutionCache};
use rustc_hash::FxHashSet;

use crate::compile::UnitCompiler;
use crate::config::ResolvedConfig;
use crate::delta::{filter_changed, ChangeDetector, FullBuild, HashManifest};
use crate::discovery::{discover, FileSelector, SourceFile};
use crate::fragment::{remove_stale_fragments, write_fragment, FragmentMerger, ServletMapping};
use crate::partition::partition;
use crate::report::{aggregate, format_elapsed, BuildSummary};
use crate::worker::{run_worker, WorkerOptions, WorkerReport};
use crate::{pool, JspcError};

/// Drives discovery, parallel compilation, and the descriptor merge.
pub struct Precompiler {
    config: ResolvedConfig,
    compiler: Arc<dyn UnitCompiler>,
    class_source: Option<Arc<dyn ClassSource>>,
}

impl Precompiler {
    pub fn new(config: ResolvedConfig, compiler: Arc<dyn UnitCompiler>) -> Self {
        Precompiler {
            config,
            compiler,
            class_source: None,
        }
    }

    /// Resolve classes through `source` instead of the configured classpath.
    #[must_use]
    pub fn with_class_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.class_source = Some(source);
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run the whole pipeline once.
    ///
    /// Returns `Ok` with a failed summary when pages did not compile; `Err`
    /// only for failures that make the run itself meaningless.
    #[tracing::instrument(
        level = "info",
        skip(self),
        fields(project = %self.config.project_dir.display())
    )]
    pub fn run(&self) -> Result<BuildSummary, JspcError> {
        let start = Instant::now();
        let config = &self.config;
        config.log_settings();

        fs::create_dir_all(&config.generated_classes)
            .map_err(|e| JspcError::io("create", &config.generated_classes, e))?;

        let selector = FileSelector::new(config.includes.as_slice(), config.excludes.as_slice())?;
        let discovered = discover(&config.webapp_dir, &selector);
        tracing::debug!(
            "discovered {} file(s) under {}",
            discovered.len(),
            config.webapp_dir.display()
        );

        let mut manifest = config
            .incremental
            .then(|| HashManifest::load(&config.state_file));
        let detector: &dyn ChangeDetector = match &manifest {
            Some(manifest) => manifest,
            None => &FullBuild,
        };
        let files = filter_changed(discovered.clone(), detector);
        let carried = match &manifest {
            Some(manifest) => carried_mappings(manifest, &discovered, &files, config.threads),
            None => vec![Vec::new(); config.threads.max(1)],
        };

        remove_stale_fragments(&config.fragment_base, config.threads)?;

        let shards = partition(&files, config.threads);
        let shard_count = shards.len();
        tracing::info!(
            "Compiling {} file(s) with {} worker(s)",
            files.len(),
            shards.len()
        );
        for shard in &shards {
            tracing::info!("Number of files for worker {}: {}", shard.index, shard.len());
        }

        let cache = Arc::new(ResolutionCache::new());
        let source: Arc<dyn ClassSource> = match &self.class_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(Classpath::new(config.settings.classpath.clone())),
        };

        let outcomes = pool::run(config.threads, shards, |_, shard| {
            let mut ctx = CompilationContext::new(
                shard.index,
                config.settings.clone(),
                Arc::clone(&cache),
                Arc::clone(&source),
            );
            let options = WorkerOptions {
                stop_at_first_error: config.stop_at_first_error,
                fragment_path: config.fragment_path(shard.index),
                carried: carried[shard.index].clone(),
            };
            run_worker(&mut ctx, shard, self.compiler.as_ref(), &options)
        })?;
        // every worker has finished; the first fatal failure wins
        let reports = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;

        // workers with nothing to compile still declare their unchanged pages
        for (index, mappings) in carried.iter().enumerate().skip(shard_count) {
            if !mappings.is_empty() {
                write_fragment(&config.fragment_path(index), mappings)?;
            }
        }

        let mut summary = aggregate(&reports, cache.stats(), start.elapsed());

        if let Some(manifest) = manifest.as_mut() {
            update_manifest(manifest, &reports)?;
        }

        match (summary.is_success(), config.merge_fragment) {
            (true, true) => {
                let fragments = (0..config.threads)
                    .map(|index| config.fragment_path(index))
                    .collect();
                FragmentMerger::new(
                    config.web_xml.clone(),
                    config.merged_web_xml.clone(),
                    fragments,
                )
                .with_marker(config.insertion_marker.clone())
                .merge()?;
            }
            (true, false) => tracing::debug!("descriptor merge disabled"),
            (false, _) => tracing::debug!("build failed, descriptor not merged"),
        }

        summary.elapsed = start.elapsed();
        tracing::info!("Compilation completed in {}", format_elapsed(summary.elapsed));
        Ok(summary)
    }
}

/// Recorded declarations of the pages left out of this run, grouped by the
/// worker that owns them in a full build of `discovered`.
fn carried_mappings(
    manifest: &HashManifest,
    discovered: &[SourceFile],
    changed: &[SourceFile],
    threads: usize,
) -> Vec<Vec<ServletMapping>> {
    let changed: FxHashSet<&str> = changed.iter().map(|f| f.relative.as_str()).collect();
    let mut carried = vec![Vec::new(); threads.max(1)];
    for shard in partition(discovered, threads) {
        carried[shard.index] = shard
            .items
            .iter()
            .filter(|f| !changed.contains(f.relative.as_str()))
            .filter_map(|f| manifest.mapping(f).cloned())
            .collect();
    }
    let total: usize = carried.iter().map(Vec::len).sum();
    if total > 0 {
        tracing::debug!("carrying {total} declaration(s) of unchanged pages");
    }
    carried
}

/// Compiled pages become clean, failed pages stay dirty.
fn update_manifest(manifest: &mut HashManifest, reports: &[WorkerReport]) -> Result<(), JspcError> {
    manifest.record(reports.iter().flat_map(|r| {
        r.compiled
            .iter()
            .map(move |f| (f, r.mappings.get(&f.relative)))
    }));
    manifest.forget(reports.iter().flat_map(|r| &r.failed));
    manifest.save()
}
