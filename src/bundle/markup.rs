//! Markup templates for bundle references.
//!
//! A template is plain text with exactly one kind of placeholder,
//! `{{url}}` (inner whitespace allowed). Anything else inside `{{ }}` is
//! rejected at parse time so typos surface as configuration errors rather
//! than silently empty markup.

use std::fmt;

use thiserror::Error;

use super::{Bundle, BundlerSettings};
use crate::log;

/// Built-in templates, including the compiled-from variants.
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "js",
        "<script type='text/javascript' src='{{url}}'></script>\n",
    ),
    (
        "coffee",
        "<script type='text/coffeescript' src='{{url}}'></script>\n",
    ),
    (
        "css",
        "<link rel='stylesheet' type='text/css' href='{{url}}' />\n",
    ),
    (
        "less",
        "<link rel='stylesheet/less' type='text/css' href='{{url}}' />\n",
    ),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed `{{{{` at byte {0}")]
    Unclosed(usize),

    #[error("unknown variable `{0}`, only `url` is available")]
    UnknownVariable(String),

    #[error("expected a string, found {0}")]
    NotAString(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Url,
}

/// A parsed markup template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupTemplate {
    segments: Vec<Segment>,
}

impl MarkupTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or(TemplateError::Unclosed(offset + start))?;
            let name = after[..end].trim();
            if name != "url" {
                return Err(TemplateError::UnknownVariable(name.to_string()));
            }
            segments.push(Segment::Url);

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Substitute `url` into the template.
    pub fn render(&self, url: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Url => out.push_str(url),
            }
        }
        out
    }
}

impl fmt::Display for MarkupTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Url => f.write_str("{{url}}")?,
            }
        }
        Ok(())
    }
}

/// Built-in template for a type, if one exists.
pub fn default_template(kind: &str) -> Option<MarkupTemplate> {
    DEFAULT_TEMPLATES
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, source)| MarkupTemplate::parse(source).ok())
}

/// Every built-in template keyed by type.
pub fn default_templates() -> impl Iterator<Item = (&'static str, MarkupTemplate)> {
    DEFAULT_TEMPLATES.iter().filter_map(|(kind, source)| {
        MarkupTemplate::parse(source)
            .ok()
            .map(|template| (*kind, template))
    })
}

/// Markup referencing a bundle.
///
/// Merged bundles produce one reference to `server_url + base + filename`.
/// No-merge bundles produce one reference per original source identifier.
pub fn render_bundle(settings: &BundlerSettings, bundle: &Bundle) -> String {
    let Some(template) = settings.markup.get(&bundle.kind) else {
        log!("bundle"; "no markup template for type `{}`", bundle.kind);
        return String::new();
    };

    if bundle.nomerge {
        bundle
            .sources
            .iter()
            .map(|source| template.render(source))
            .collect()
    } else {
        template.render(&settings.bundle_url(&bundle.base, &bundle.filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let template = MarkupTemplate::parse("<script src='{{ url }}'></script>").unwrap();
        assert_eq!(
            template.render("/bundles/a.js"),
            "<script src='/bundles/a.js'></script>"
        );
        assert_eq!(template.to_string(), "<script src='{{url}}'></script>");
    }

    #[test]
    fn test_repeated_and_plain() {
        let template = MarkupTemplate::parse("{{url}}|{{url}}").unwrap();
        assert_eq!(template.render("u"), "u|u");
        assert_eq!(MarkupTemplate::parse("plain").unwrap().render("u"), "plain");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            MarkupTemplate::parse("<a href='{{url'>"),
            Err(TemplateError::Unclosed(9))
        );
        assert_eq!(
            MarkupTemplate::parse("{{ href }}"),
            Err(TemplateError::UnknownVariable("href".into()))
        );
    }

    #[test]
    fn test_default_templates() {
        let js = default_template("js").unwrap();
        assert_eq!(
            js.render("/a.js"),
            "<script type='text/javascript' src='/a.js'></script>\n"
        );
        assert!(default_template("less").is_some());
        assert!(default_template("coffee").is_some());
        assert!(default_template("txt").is_none());
        assert_eq!(default_templates().count(), 4);
    }
}
