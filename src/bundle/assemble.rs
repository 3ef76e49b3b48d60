//! Merge the sources of a bundle into one buffer.

use std::path::Path;

use crate::log;

use super::{AssetSpec, RemoteFetcher, RenderError, is_remote, split_identifier};

/// Host capability: render a local source file within the site context.
pub trait SourceRenderer {
    /// Render `file` located in the site-relative directory `dir`.
    fn render(&self, dir: &Path, file: &str) -> Result<Vec<u8>, RenderError>;
}

/// Concatenate every source of `spec` in order.
///
/// Remote sources go through the fetcher, local ones through the host
/// renderer. A newline follows each contribution that does not already end
/// in one. Sources that fail to load contribute nothing.
pub fn assemble(
    spec: &AssetSpec,
    renderer: &dyn SourceRenderer,
    fetcher: &RemoteFetcher,
) -> Vec<u8> {
    let mut content = Vec::new();

    for source in &spec.sources {
        let part = if is_remote(source) {
            match fetcher.fetch(source, &spec.kind) {
                Some(part) => part,
                None => continue,
            }
        } else {
            let (dir, file) = split_identifier(source);
            match renderer.render(&dir, &file) {
                Ok(part) => part,
                Err(e) => {
                    log!("bundle"; "skipping {}: {}", source, e);
                    continue;
                }
            }
        };

        content.extend_from_slice(&part);
        if !part.ends_with(b"\n") {
            content.push(b'\n');
        }
    }

    content
}
