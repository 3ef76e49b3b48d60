//! Configuration section definitions.
//!
//! | Module     | TOML Section                | Purpose                        |
//! |------------|-----------------------------|--------------------------------|
//! | `bundler`  | `[asset_bundler]`           | Bundle paths, markup, dev mode |
//! | `compress` | `[asset_bundler.compress]`  | Compression backends           |

mod bundler;
mod compress;

pub use bundler::{BundlerConfig, DevSignals};
pub use compress::CompressConfig;
