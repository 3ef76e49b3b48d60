//! Bundle engine for web assets.
//!
//! Merges ordered lists of script and stylesheet sources (local files or
//! remote URLs) into content-addressed bundles, compresses them through a
//! disk cache, and renders the markup that references them.
//!
//! # Module Structure
//!
//! ```text
//! bundle/
//! ├── spec.rs       # AssetSpec, identifier helpers
//! ├── digest.rs     # blake3 Digest
//! ├── cache.rs      # ContentCache (get_or_put)
//! ├── remote.rs     # RemoteFetcher
//! ├── assemble.rs   # SourceRenderer, assemble()
//! ├── compress/     # NoOp / Command / Plugin backends
//! ├── settings.rs   # BundlerSettings
//! ├── markup.rs     # MarkupTemplate, render_bundle()
//! ├── registry.rs   # Bundle, BundleRegistry
//! ├── output.rs     # OutputFile, OutputSet
//! └── engine.rs     # Engine::build
//! ```

mod assemble;
mod cache;
mod compress;
mod digest;
mod engine;
mod error;
mod markup;
mod output;
mod registry;
mod remote;
mod settings;
mod spec;

pub use assemble::{SourceRenderer, assemble};
pub use cache::{CACHE_DIR, ContentCache};
pub use compress::{CommandTemplate, CompressContext, Compressor, Plugin};
pub use digest::Digest;
pub use engine::{BuildStats, Engine};
pub use error::{BundleError, FetchError, RenderError};
pub use markup::{
    MarkupTemplate, TemplateError, default_template, default_templates, render_bundle,
};
pub use output::{GeneratedFile, OutputFile, OutputSet, StaticFile, write_bytes};
pub use registry::{Bundle, BundleRegistry};
pub use remote::RemoteFetcher;
pub use settings::{BundlerSettings, DEFAULT_BASE_PATH, normalize_base_path};
pub use spec::{
    AssetSpec, canonical_url, is_remote, is_supported, local_path,
    split_identifier, type_of,
};
