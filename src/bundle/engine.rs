//! The bundle engine: dedup, assembly, compression and registration.
//!
//! # Build flow
//!
//! ```text
//! AssetSpec
//!    │ fingerprint = digest(sources)
//!    ├─ known fingerprint && !force ──────────────► reuse Bundle
//!    ├─ dev && no explicit name ──────────────────► unmerged Bundle
//!    ▼
//! assemble ─► digest(raw) ─► filename
//!    ▼
//! compression cache (key = content + settings + dev) ─► compress on miss
//!    ▼
//! register in OutputSet (+ remove_bundled) ─► store in registry
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::{debug, log};

use super::{
    AssetSpec, Bundle, BundleError, BundleRegistry, BundlerSettings, CompressContext, Compressor,
    ContentCache, Digest, OutputSet, RemoteFetcher, SourceRenderer, assemble, render_bundle,
};

/// Counters for the work actually performed during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Bundles whose sources were assembled.
    pub assembled: usize,
    /// Builds answered from the registry.
    pub reused: usize,
    /// Compression backend invocations.
    pub compressed: usize,
}

/// Builds bundles for one run.
pub struct Engine<R> {
    settings: BundlerSettings,
    cache: ContentCache,
    fetcher: RemoteFetcher,
    renderer: R,
    registry: BundleRegistry,
    stats: BuildStats,
}

impl<R: SourceRenderer> Engine<R> {
    pub fn new(settings: BundlerSettings, renderer: R) -> Self {
        let cache = ContentCache::new(&settings.cache_dir);
        Self {
            fetcher: RemoteFetcher::new(cache.clone()),
            cache,
            settings,
            renderer,
            registry: BundleRegistry::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn settings(&self) -> &BundlerSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn registry(&self) -> &BundleRegistry {
        &self.registry
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Build (or reuse) the bundle for `spec`.
    ///
    /// Merged bundles are registered in `outputs`. Only compression and
    /// cache-directory failures are errors; per-source failures are logged
    /// and leave a degraded bundle.
    pub fn build(
        &mut self,
        spec: &AssetSpec,
        outputs: &mut OutputSet,
    ) -> Result<Arc<Bundle>, BundleError> {
        let fingerprint = spec.fingerprint();

        if !spec.force
            && let Some(bundle) = self.registry.get(&fingerprint)
        {
            debug!("bundle"; "reusing {} for {} sources", fingerprint, spec.sources.len());
            self.stats.reused += 1;
            return Ok(bundle);
        }

        if self.settings.dev && spec.name.is_none() {
            let bundle = Arc::new(Bundle::unmerged(
                spec.sources.clone(),
                spec.kind.clone(),
                fingerprint,
                self.settings.base_path.clone(),
            ));
            self.registry.insert(Arc::clone(&bundle));
            return Ok(bundle);
        }

        let raw = assemble(spec, &self.renderer, &self.fetcher);
        self.stats.assembled += 1;

        let digest = Digest::of(&raw);
        let filename = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("{}.{}", digest.id(), spec.kind));
        let content = self.compress(&raw, digest, &spec.kind, &filename)?;

        let bundle = Arc::new(Bundle {
            sources: spec.sources.clone(),
            kind: spec.kind.clone(),
            filename,
            named: spec.name.is_some(),
            raw,
            content,
            digest,
            fingerprint,
            base: self.settings.base_path.clone(),
            nomerge: false,
        });

        outputs.register_bundle(Arc::clone(&bundle));
        if self.settings.remove_bundled {
            let removed = outputs.remove_sources(&self.settings.source_dir, &spec.sources);
            debug!("bundle"; "removed {} bundled sources from output", removed);
        }
        self.registry.insert(Arc::clone(&bundle));

        log!("bundle"; "{}{} ({} sources)", bundle.base, bundle.filename, spec.sources.len());
        debug!(
            "bundle"; "{}: {} bytes merged, {} written",
            bundle.digest, bundle.raw.len(), bundle.content.len()
        );
        Ok(bundle)
    }

    /// Markup referencing `bundle`.
    pub fn markup(&self, bundle: &Bundle) -> String {
        render_bundle(&self.settings, bundle)
    }

    /// Compress through the cache; `NoOp` bypasses the cache entirely.
    fn compress(
        &mut self,
        raw: &[u8],
        digest: Digest,
        kind: &str,
        filename: &str,
    ) -> Result<Vec<u8>, BundleError> {
        let compressor = Compressor::select(&self.settings, kind);
        if compressor.is_noop() {
            return Ok(raw.to_vec());
        }

        let key = self.settings.compression_key(digest);
        let entry = format!("{}.{}", key.id(), kind);
        let temp_dir = self.cache.ensure_dir()?.to_path_buf();
        let externs: Vec<PathBuf> = self.settings.externs();
        let ctx = CompressContext {
            kind,
            bundle: filename,
            temp_dir: &temp_dir,
            externs: &externs,
        };

        let stats = &mut self.stats;
        self.cache.get_or_put(&entry, || {
            stats.compressed += 1;
            debug!("bundle"; "compressing {}", filename);
            compressor.compress(raw, &ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::OutputFile;
    use crate::bundle::StaticFile;
    use crate::bundle::assemble::tests::MemoryRenderer;
    use std::fs;
    use tempfile::TempDir;

    fn engine(dir: &TempDir, files: &[(&str, &str)]) -> Engine<MemoryRenderer> {
        let settings = BundlerSettings::for_project(dir.path(), dir.path().join("src"));
        Engine::new(settings, MemoryRenderer::with(files))
    }

    fn engine_with(
        dir: &TempDir,
        files: &[(&str, &str)],
        configure: impl FnOnce(&mut BundlerSettings),
    ) -> Engine<MemoryRenderer> {
        let mut settings = BundlerSettings::for_project(dir.path(), dir.path().join("src"));
        configure(&mut settings);
        Engine::new(settings, MemoryRenderer::with(files))
    }

    fn spec(sources: &[&str], kind: &str) -> AssetSpec {
        AssetSpec::new(sources.iter().map(|s| s.to_string()).collect(), kind)
    }

    fn cache_entries(dir: &TempDir, ext: &str) -> usize {
        let Ok(read) = fs::read_dir(dir.path().join(crate::bundle::CACHE_DIR)) else {
            return 0;
        };
        read.filter_map(Result::ok)
            .filter(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.ends_with(ext) && !name.starts_with("remote.")
            })
            .count()
    }

    #[test]
    fn test_dedup_builds_once() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir, &[("a.js", "a();"), ("b.js", "b();")]);
        let mut outputs = OutputSet::new();
        let request = spec(&["a.js", "b.js"], "js");

        let first = engine.build(&request, &mut outputs).unwrap();
        let second = engine.build(&request, &mut outputs).unwrap();

        assert_eq!(first.filename, second.filename);
        assert_eq!(first.digest, second.digest);
        assert_eq!(first.relative_path(), second.relative_path());
        assert_eq!(engine.renderer().calls.get(), 2);
        assert_eq!(engine.stats().assembled, 1);
        assert_eq!(engine.stats().reused, 1);
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_default_filename_is_content_digest() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir, &[("a.css", "a{}")]);
        let bundle = engine
            .build(&spec(&["a.css"], "css"), &mut OutputSet::new())
            .unwrap();
        assert_eq!(bundle.raw, b"a{}\n");
        assert_eq!(
            bundle.filename,
            format!("{}.css", Digest::of(b"a{}\n").id())
        );
        assert_eq!(bundle.content, bundle.raw);
    }

    #[test]
    fn test_reordered_sources_are_distinct() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir, &[("a.js", "x"), ("b.js", "x")]);
        let mut outputs = OutputSet::new();

        let ab = engine.build(&spec(&["a.js", "b.js"], "js"), &mut outputs).unwrap();
        let ba = engine.build(&spec(&["b.js", "a.js"], "js"), &mut outputs).unwrap();

        assert_ne!(ab.fingerprint, ba.fingerprint);
        assert_eq!(ab.raw, ba.raw);
        assert_eq!(engine.stats().assembled, 2);
        assert_eq!(engine.registry().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_compression_cache_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, &[("a.js", "same"), ("b.js", "same")], |s| {
            s.compress.insert("js".into(), "tr a-z A-Z".into());
        });
        let mut outputs = OutputSet::new();

        // Distinct fingerprints, identical merged content
        let first = engine.build(&spec(&["a.js"], "js"), &mut outputs).unwrap();
        let second = engine.build(&spec(&["b.js"], "js"), &mut outputs).unwrap();

        assert_eq!(first.content, b"SAME\n");
        assert_eq!(second.content, b"SAME\n");
        assert_eq!(engine.stats().assembled, 2);
        assert_eq!(engine.stats().compressed, 1);
        assert_eq!(cache_entries(&dir, ".js"), 1);
    }

    #[test]
    fn test_compression_failure_is_fatal_and_not_cached() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, &[("a.js", "function (")], |s| {
            s.compress.insert("js".into(), "minify".into());
        });
        let mut outputs = OutputSet::new();

        let err = engine
            .build(&spec(&["a.js"], "js"), &mut outputs)
            .unwrap_err();
        assert!(matches!(err, BundleError::Plugin { .. }));
        assert!(outputs.is_empty());
        assert!(engine.registry().is_empty());
        assert_eq!(cache_entries(&dir, ".js"), 0);
    }

    #[test]
    fn test_dev_mode_references_sources() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, &[("a.js", "a();"), ("b.js", "b();")], |s| {
            s.dev = true;
            s.compress.insert("js".into(), "minify".into());
        });
        let mut outputs = OutputSet::new();

        let bundle = engine
            .build(&spec(&["a.js", "b.js"], "js"), &mut outputs)
            .unwrap();
        let markup = engine.markup(&bundle);

        assert_eq!(
            markup,
            "<script type='text/javascript' src='a.js'></script>\n\
             <script type='text/javascript' src='b.js'></script>\n"
        );
        assert!(bundle.nomerge);
        assert!(outputs.is_empty());
        assert_eq!(engine.renderer().calls.get(), 0);
        assert_eq!(engine.stats().compressed, 0);
    }

    #[test]
    fn test_dev_mode_named_bundle_is_merged_uncompressed() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, &[("a.js", "a ( );")], |s| {
            s.dev = true;
            s.compress.insert("js".into(), "minify".into());
        });
        let mut outputs = OutputSet::new();

        let bundle = engine
            .build(&spec(&["a.js"], "js").with_name("app.js").forced(), &mut outputs)
            .unwrap();
        assert!(!bundle.nomerge);
        assert_eq!(bundle.content, b"a ( );\n");
        assert_eq!(engine.stats().compressed, 0);
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_explicit_name_force_rebuild() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir, &[("a.js", "a();"), ("b.js", "b();")]);
        let mut outputs = OutputSet::new();

        let first = spec(&["a.js"], "js").with_name("app.js").forced();
        let second = spec(&["a.js", "b.js"], "js").with_name("app.js").forced();
        engine.build(&first, &mut outputs).unwrap();
        engine.build(&second, &mut outputs).unwrap();

        assert_eq!(engine.registry().len(), 1);
        let current = engine.registry().get_named("app.js").unwrap();
        assert_eq!(current.content, b"a();\nb();\n");
        assert_eq!(outputs.paths(), vec![PathBuf::from("bundles/app.js")]);
    }

    #[test]
    fn test_force_rebuilds_same_sources() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine(&dir, &[("a.js", "a();")]);
        let mut outputs = OutputSet::new();
        let request = spec(&["a.js"], "js").with_name("app.js").forced();

        engine.build(&request, &mut outputs).unwrap();
        engine.build(&request, &mut outputs).unwrap();
        assert_eq!(engine.stats().assembled, 2);
        assert_eq!(engine.registry().len(), 1);
        assert_eq!(outputs.len(), 1);
    }

    #[test]
    fn test_remove_bundled() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let mut engine = engine_with(&dir, &[("js/a.js", "a();")], |s| s.remove_bundled = true);
        let mut outputs = OutputSet::new();
        outputs.push(Arc::new(StaticFile::new(src.join("js/a.js"), "js/a.js")));
        outputs.push(Arc::new(StaticFile::new(src.join("js/b.js"), "js/b.js")));

        engine
            .build(&spec(&["/js/a.js"], "js"), &mut outputs)
            .unwrap();

        let paths = outputs.paths();
        assert!(!paths.contains(&PathBuf::from("js/a.js")));
        assert!(paths.contains(&PathBuf::from("js/b.js")));
    }

    #[test]
    fn test_markup_uses_server_url_and_base() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_with(&dir, &[("a.css", "a{}")], |s| {
            s.server_url = "https://cdn.example.com".into();
            s.base_path = "/assets/".into();
        });
        let bundle = engine
            .build(&spec(&["a.css"], "css").with_name("site.css"), &mut OutputSet::new())
            .unwrap();
        assert_eq!(
            engine.markup(&bundle),
            "<link rel='stylesheet' type='text/css' href='https://cdn.example.com/assets/site.css' />\n"
        );
    }
}
