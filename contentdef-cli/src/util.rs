use std::fs;
use std::path::Path;

use annotate_snippets::display_list::{DisplayList, FormatOptions};
use annotate_snippets::snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation};
use anyhow::{Context, Result};

use contentdef::{Diagnostic, EngineConfig};

/// Reads a file given on the command line.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed reading {:?}", path))
}

/// Reads a content file by its path relative to the content root.
pub(crate) fn read_content(config: &EngineConfig, file: &str) -> Option<String> {
    fs::read_to_string(config.content_path(file)).ok()
}

/// Prints diagnostics with the offending source line, `source_of` giving
/// the text of the file a diagnostic points into.
pub(crate) fn print_diagnostics<F>(diagnostics: &[Diagnostic], source_of: F)
where
    F: Fn(&str) -> Option<String>,
{
    for diagnostic in diagnostics {
        let text = source_of(&diagnostic.location.file);
        let line = text.as_ref().and_then(|text| {
            text.lines()
                .nth(diagnostic.location.line.saturating_sub(1))
                .map(|l| l.to_string())
        });
        match line {
            Some(line) => eprintln!("{}\n", format_diagnostic(diagnostic, &line)),
            None => eprintln!("{}", diagnostic),
        }
    }
}

fn format_diagnostic(diagnostic: &Diagnostic, line: &str) -> String {
    let message = diagnostic.kind.to_string();
    // trailing space leaves room for pointing past the end of the line
    let source = format!("{} ", line);
    let line_len = source.chars().count();
    let range_start = diagnostic.location.column.saturating_sub(1).min(line_len - 1);
    let range_end = (range_start + diagnostic.length.max(1)).min(line_len);

    let snippet = Snippet {
        title: Some(Annotation {
            label: Some(message.as_str()),
            id: None,
            annotation_type: AnnotationType::Error,
        }),
        footer: vec![],
        slices: vec![Slice {
            source: &source,
            line_start: diagnostic.location.line,
            origin: Some(&*diagnostic.location.file),
            fold: false,
            annotations: vec![SourceAnnotation {
                label: "",
                annotation_type: AnnotationType::Error,
                range: (range_start, range_end),
            }],
        }],
        opt: FormatOptions {
            color: true,
            ..Default::default()
        },
    };

    DisplayList::from(snippet).to_string()
}
