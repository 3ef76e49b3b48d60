//! Bundle tags in pages.
//!
//! ```text
//! {% bundle %}           literal source list, checked for existence
//! {% bundle_glob %}      glob patterns relative to the source
//! {% dev_assets %}       raw list, emitted only in dev mode
//! ```
//!
//! Each block body is a YAML sequence. Its entries are grouped by type and
//! every supported group is built into one bundle; the block is replaced by
//! the markup of those bundles.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml_ng::Value;

use crate::bundle::{
    AssetSpec, BundleError, Engine, OutputSet, SourceRenderer, is_remote, is_supported,
    local_path, type_of,
};
use crate::utils::path::is_contained;
use crate::{debug, log};

use super::scan::glob_sources;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\{%-?[[:space:]]*(bundle|bundle_glob|dev_assets)[[:space:]]*-?%\}(.*?)\{%-?[[:space:]]*end(bundle|bundle_glob|dev_assets)[[:space:]]*-?%\}",
    )
    .expect("valid bundle tag pattern")
});

/// The three block tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Bundle,
    BundleGlob,
    DevAssets,
}

impl TagKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bundle" => Some(Self::Bundle),
            "bundle_glob" => Some(Self::BundleGlob),
            "dev_assets" => Some(Self::DevAssets),
            _ => None,
        }
    }
}

/// Replace every bundle block in `html` with the markup of its bundles.
///
/// `page` names the page in diagnostics. Only bundle build failures are
/// errors; bad lists and missing sources are logged and skipped.
pub fn expand_tags<R: SourceRenderer>(
    html: &str,
    page: &str,
    engine: &mut Engine<R>,
    outputs: &mut OutputSet,
) -> Result<String, BundleError> {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for caps in TAG_RE.captures_iter(html) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let (open, close) = (&caps[1], &caps[3]);
        if open != close {
            log!("page"; "{}: `{{% {} %}}` closed by `end{}`, left as is", page, open, close);
            continue;
        }
        let Some(kind) = TagKind::from_name(open) else {
            continue;
        };

        out.push_str(&html[last..whole.start]);
        let entries = parse_list(&caps[2], page);
        let settings = engine.settings();
        let sources = collect_sources(kind, entries, page, &settings.source_dir, settings.dev);
        for (ty, group) in group_by_type(sources) {
            let bundle = engine.build(&AssetSpec::new(group, ty), outputs)?;
            out.push_str(&engine.markup(&bundle));
        }
        last = whole.end;
    }

    out.push_str(&html[last..]);
    Ok(out)
}

/// Parse a block body as a YAML list of strings.
///
/// Anything else is logged and yields an empty list.
fn parse_list(body: &str, page: &str) -> Vec<String> {
    let items = match serde_yaml_ng::from_str::<Value>(body) {
        Ok(Value::Sequence(items)) => items,
        Ok(_) => {
            log!("page"; "{}: bundle tag body is not a list", page);
            return Vec::new();
        }
        Err(e) => {
            log!("page"; "{}: cannot parse bundle list: {}", page, e);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            other => {
                log!("page"; "{}: ignoring non-string bundle entry {:?}", page, other);
                None
            }
        })
        .collect()
}

/// Resolve tag entries into ordered source identifiers.
fn collect_sources(
    kind: TagKind,
    entries: Vec<String>,
    page: &str,
    source_dir: &Path,
    dev: bool,
) -> Vec<String> {
    match kind {
        TagKind::Bundle => entries
            .into_iter()
            .filter(|entry| is_remote(entry) || local_exists(source_dir, entry, page))
            .collect(),
        TagKind::BundleGlob => entries
            .iter()
            .flat_map(|pattern| glob_sources(source_dir, pattern))
            .collect(),
        TagKind::DevAssets if dev => entries,
        TagKind::DevAssets => Vec::new(),
    }
}

/// Check a local entry exists and is not a dotfile, logging when it isn't.
fn local_exists(source_dir: &Path, identifier: &str, page: &str) -> bool {
    let relative = local_path(identifier);
    if !is_contained(relative) {
        log!("page"; "{}: bundle source `{}` is outside the site, skipping", page, identifier);
        return false;
    }
    let hidden = relative
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    if !hidden && source_dir.join(relative).is_file() {
        return true;
    }
    log!("page"; "{}: bundle source `{}` not found, skipping", page, identifier);
    false
}

/// Group identifiers by supported type, in first-seen type order.
fn group_by_type(sources: Vec<String>) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for source in sources {
        let Some(ty) = type_of(&source).filter(|ty| is_supported(ty)) else {
            debug!("page"; "ignoring `{}`: not a bundled type", source);
            continue;
        };
        match groups.iter_mut().find(|(kind, _)| *kind == ty) {
            Some((_, group)) => group.push(source),
            None => groups.push((ty, vec![source])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::BundlerSettings;
    use crate::site::SiteRenderer;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn engine(dir: &Path, dev: bool) -> Engine<SiteRenderer> {
        let mut settings = BundlerSettings::for_project(dir, dir);
        settings.dev = dev;
        Engine::new(settings, SiteRenderer::new(dir, Default::default()))
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("\n  - /js/a.js\n  - //cdn.example.com/b.js\n", "p"),
            vec!["/js/a.js", "//cdn.example.com/b.js"]
        );
        assert_eq!(parse_list("[a.js, b.css]", "p"), vec!["a.js", "b.css"]);
        assert!(parse_list("a.js", "p").is_empty());
        assert!(parse_list("", "p").is_empty());
        assert!(parse_list("- [unclosed", "p").is_empty());
    }

    #[test]
    fn test_group_by_type() {
        let groups = group_by_type(vec![
            "b.css".into(),
            "a.js".into(),
            "c.CSS".into(),
            "notes.txt".into(),
            "README".into(),
        ]);
        assert_eq!(
            groups,
            vec![
                ("css".to_string(), vec!["b.css".to_string(), "c.CSS".to_string()]),
                ("js".to_string(), vec!["a.js".to_string()]),
            ]
        );
    }

    #[test]
    fn test_expand_bundle_tag() {
        let dir = site(&[("js/a.js", "a();"), ("js/b.js", "b();"), ("css/s.css", "p{}")]);
        let mut engine = engine(dir.path(), false);
        let mut outputs = OutputSet::new();

        let html = "<head>\n{% bundle %}\n- /js/a.js\n- /css/s.css\n- /js/b.js\n{% endbundle %}\n</head>";
        let out = expand_tags(html, "index.html", &mut engine, &mut outputs).unwrap();

        assert!(out.starts_with("<head>\n<script type='text/javascript' src='/bundles/"));
        assert!(out.contains("<link"));
        assert!(out.ends_with("\n</head>"));
        assert!(!out.contains("{%"));
        assert_eq!(outputs.len(), 2);
        assert_eq!(engine.registry().len(), 2);
    }

    #[test]
    fn test_missing_sources_are_skipped() {
        let dir = site(&[("js/a.js", "a();"), ("js/.secret.js", "s();")]);
        let mut engine = engine(dir.path(), false);
        let mut outputs = OutputSet::new();

        let html = "{% bundle %}[/js/a.js, /js/missing.js, /js/.secret.js]{% endbundle %}";
        expand_tags(html, "index.html", &mut engine, &mut outputs).unwrap();

        let bundle = engine.registry().iter().next().unwrap();
        assert_eq!(bundle.sources, vec!["/js/a.js"]);
        assert_eq!(bundle.raw, b"a();\n");
    }

    #[test]
    fn test_sources_outside_site_are_skipped() {
        let outer = site(&[("secret.js", "s();"), ("site/js/a.js", "a();")]);
        let root = outer.path().join("site");
        let mut engine = engine(&root, false);
        let mut outputs = OutputSet::new();

        let html = "{% bundle %}[/js/a.js, ../secret.js, /js/../../secret.js]{% endbundle %}";
        expand_tags(html, "index.html", &mut engine, &mut outputs).unwrap();

        let bundle = engine.registry().iter().next().unwrap();
        assert_eq!(bundle.sources, vec!["/js/a.js"]);
        assert_eq!(bundle.raw, b"a();\n");
    }

    #[test]
    fn test_malformed_list_renders_nothing() {
        let dir = site(&[]);
        let mut engine = engine(dir.path(), false);
        let mut outputs = OutputSet::new();

        let out = expand_tags("x{% bundle %}a.js{% endbundle %}y", "p", &mut engine, &mut outputs)
            .unwrap();
        assert_eq!(out, "xy");
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_dev_assets() {
        let dir = site(&[]);
        let html = "{% dev_assets %}[/js/debug.js]{% enddev_assets %}";

        let mut outputs = OutputSet::new();
        let out = expand_tags(html, "p", &mut engine(dir.path(), false), &mut outputs).unwrap();
        assert_eq!(out, "");

        let out = expand_tags(html, "p", &mut engine(dir.path(), true), &mut outputs).unwrap();
        assert_eq!(
            out,
            "<script type='text/javascript' src='/js/debug.js'></script>\n"
        );
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_bundle_glob_tag() {
        let dir = site(&[("js/b.js", "b();"), ("js/a.js", "a();")]);
        let mut engine = engine(dir.path(), false);
        let mut outputs = OutputSet::new();

        expand_tags(
            "{% bundle_glob %}\n- js/*.js\n{% endbundle_glob %}",
            "p",
            &mut engine,
            &mut outputs,
        )
        .unwrap();
        let bundle = engine.registry().iter().next().unwrap();
        assert_eq!(bundle.sources, vec!["/js/a.js", "/js/b.js"]);
    }

    #[test]
    fn test_mismatched_tags_left_alone() {
        let dir = site(&[]);
        let mut engine = engine(dir.path(), false);
        let mut outputs = OutputSet::new();

        let html = "{% bundle %}[a.js]{% enddev_assets %}";
        let out = expand_tags(html, "p", &mut engine, &mut outputs).unwrap();
        assert_eq!(out, html);
    }
}
