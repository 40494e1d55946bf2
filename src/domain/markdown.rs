//! Markdown extraction
//!
//! A document declares files with level-2 headings whose only content is a
//! code span, each followed by a fenced code block holding the file body:
//!
//! ````markdown
//! ---
//! vscode: true
//! ---
//!
//! ## `.prettierrc`
//!
//! ```json
//! { "semi": false }
//! ```
//! ````
//!
//! The optional YAML front matter may set `gitignore` and `vscode`.

use std::ops::Range;
use std::path::{Component, Path};

use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel, MetadataBlockKind, Options, Parser, Tag, TagEnd,
};

use super::format::{ExtractError, Extractor};
use super::record::{Extraction, Flags, Record};

/// Extractor for markdown documents
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownExtractor;

impl Extractor for MarkdownExtractor {
    fn extract(&self, content: &[u8], defaults: Flags) -> Result<Extraction, ExtractError> {
        let text = std::str::from_utf8(content).map_err(|e| {
            ExtractError::MalformedDocument(format!("document is not valid UTF-8: {}", e))
        })?;

        let mut flags = defaults;
        let mut pairing = Pairing::default();

        let mut metadata: Option<String> = None;
        let mut heading: Option<HeadingSpan> = None;
        let mut fence: Option<FenceBody> = None;

        let parser = Parser::new_ext(text, Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

        for (event, range) in parser.into_offset_iter() {
            match event {
                Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle)) => {
                    metadata = Some(String::new());
                }
                Event::End(TagEnd::MetadataBlock(_)) => {
                    if let Some(yaml) = metadata.take() {
                        flags = apply_front_matter(flags, &yaml);
                    }
                }

                Event::Start(Tag::Heading { level, .. }) => {
                    if level == HeadingLevel::H2 {
                        heading = Some(HeadingSpan::default());
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(name) = heading.take().and_then(HeadingSpan::into_name) {
                        pairing.name(&name)?;
                    }
                }

                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                    fence = Some(FenceBody::default());
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(body) = fence.take() {
                        pairing.content(body.bytes)?;
                    }
                }

                Event::Code(code) => {
                    if let Some(span) = heading.as_mut() {
                        span.code(&code);
                    }
                }
                Event::Text(chunk) => {
                    if let Some(yaml) = metadata.as_mut() {
                        yaml.push_str(&chunk);
                    } else if let Some(body) = fence.as_mut() {
                        body.push(text, &chunk, range);
                    } else if let Some(span) = heading.as_mut() {
                        span.text(&chunk);
                    }
                }
                _ => {
                    if let Some(span) = heading.as_mut() {
                        span.other();
                    }
                }
            }
        }

        Ok(Extraction {
            records: pairing.finish()?,
            flags,
        })
    }
}

/// Applies boolean `gitignore`/`vscode` keys from YAML front matter.
/// Anything unparsable or non-boolean leaves the flag untouched.
fn apply_front_matter(flags: Flags, yaml: &str) -> Flags {
    let value: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(_) => return flags,
    };

    let lookup = |key: &str| value.get(key).and_then(serde_yaml::Value::as_bool);
    flags.overlay(lookup("gitignore"), lookup("vscode"))
}

/// Bytes of a fenced code block as written in the source.
///
/// The parser hands out code lines with CRLF folded to LF, splitting each
/// such line into the text before `\r` and a lone `\n`. A gap of exactly
/// `\r` between two chunks is put back.
#[derive(Debug, Default)]
struct FenceBody {
    bytes: Vec<u8>,
    end: Option<usize>,
}

impl FenceBody {
    fn push(&mut self, source: &str, chunk: &str, range: Range<usize>) {
        if let Some(end) = self.end {
            if source.get(end..range.start) == Some("\r") {
                self.bytes.push(b'\r');
            }
        }
        self.bytes.extend_from_slice(chunk.as_bytes());
        self.end = Some(range.end);
    }
}

/// Inline content seen inside a level-2 heading
#[derive(Debug, Default)]
struct HeadingSpan {
    code: Option<String>,
    extra: bool,
}

impl HeadingSpan {
    fn code(&mut self, code: &str) {
        if self.code.is_some() {
            self.extra = true;
        } else {
            self.code = Some(code.to_string());
        }
    }

    fn text(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.extra = true;
        }
    }

    fn other(&mut self) {
        self.extra = true;
    }

    /// The heading is a name token only when a code span is its sole content
    fn into_name(self) -> Option<String> {
        if self.extra {
            None
        } else {
            self.code
        }
    }
}

/// The heading/code-block pairing automaton
#[derive(Debug, Default)]
struct Pairing {
    entries: Vec<(String, Option<Vec<u8>>)>,
}

impl Pairing {
    fn name(&mut self, name: &str) -> Result<(), ExtractError> {
        if let Some((last, content)) = self.entries.last() {
            if last == name {
                return Ok(());
            }
            if content.is_none() {
                return Err(missing_block(last));
            }
        }

        validate_name(name)?;

        if self.entries.iter().any(|(existing, _)| existing == name) {
            return Err(ExtractError::MalformedDocument(format!(
                "`{}` is declared more than once",
                name
            )));
        }

        self.entries.push((name.to_string(), None));
        Ok(())
    }

    fn content(&mut self, body: Vec<u8>) -> Result<(), ExtractError> {
        match self.entries.last_mut() {
            None => Err(ExtractError::MalformedDocument(format!(
                "there's no level-2 heading (## `path`) for this code block:\n{}",
                String::from_utf8_lossy(&body)
            ))),
            Some((_, content @ None)) => {
                *content = Some(body);
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    fn finish(self) -> Result<Vec<Record>, ExtractError> {
        self.entries
            .into_iter()
            .map(|(name, content)| match content {
                Some(content) => Ok(Record { name, content }),
                None => Err(missing_block(&name)),
            })
            .collect()
    }
}

fn missing_block(name: &str) -> ExtractError {
    ExtractError::MalformedDocument(format!("`{}` does not contain any code block", name))
}

/// Names must stay inside the project: relative, without `..`
fn validate_name(name: &str) -> Result<(), ExtractError> {
    let path = Path::new(name);
    let has_file = path.components().any(|c| matches!(c, Component::Normal(_)));
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if !has_file || escapes {
        return Err(ExtractError::MalformedDocument(format!(
            "`{}` is not a relative path inside the project",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(input: &str) -> Result<Extraction, ExtractError> {
        MarkdownExtractor.extract(input.as_bytes(), Flags::default())
    }

    fn is_malformed(result: Result<Extraction, ExtractError>) -> bool {
        matches!(result, Err(ExtractError::MalformedDocument(_)))
    }

    #[test]
    fn single_file() {
        let doc = extract("## `a.txt`\n\n```\nhello\n```\n").unwrap();

        assert_eq!(doc.records, vec![Record::new("a.txt", "hello\n")]);
        assert_eq!(doc.flags, Flags::default());
    }

    #[test]
    fn repeated_heading_is_a_continuation() {
        let doc = extract("## `b.txt`\n\n## `b.txt`\n\n```\nworld\n```\n").unwrap();

        assert_eq!(doc.records, vec![Record::new("b.txt", "world\n")]);
    }

    #[test]
    fn keeps_heading_order() {
        let input = r#"# Configs

## `z.json`

```json
{}
```

## `a/b.toml`

```toml
key = 1
```
"#;
        let doc = extract(input).unwrap();
        assert_eq!(doc.names(), vec!["z.json", "a/b.toml"]);
        assert_eq!(doc.records[1].content, b"key = 1\n");
    }

    #[test]
    fn content_is_kept_verbatim() {
        let input = "## `x.sh`\n\n```sh\n  indented\n\ttabbed  \n\n```\n";
        let doc = extract(input).unwrap();
        assert_eq!(doc.records[0].content, b"  indented\n\ttabbed  \n\n");
    }

    #[test]
    fn first_block_after_heading_wins() {
        let input = "## `a.txt`\n\n```\none\n```\n\ntext\n\n```\ntwo\n```\n";
        let doc = extract(input).unwrap();
        assert_eq!(doc.records, vec![Record::new("a.txt", "one\n")]);
    }

    #[test]
    fn empty_block_counts_as_content() {
        let doc = extract("## `empty`\n\n```\n```\n").unwrap();
        assert_eq!(doc.records, vec![Record::new("empty", "")]);
    }

    #[test]
    fn heading_without_block_fails() {
        assert!(is_malformed(extract("## `a.txt`\n\nno code here\n")));
    }

    #[test]
    fn heading_without_block_before_next_heading_fails() {
        let result = extract("## `a.txt`\n\n## `b.txt`\n\n```\nb\n```\n");
        match result {
            Err(ExtractError::MalformedDocument(message)) => assert!(message.contains("a.txt")),
            other => panic!("expected malformed document, got {:?}", other),
        }
    }

    #[test]
    fn block_before_any_heading_fails() {
        assert!(is_malformed(extract("```\norphan\n```\n\n## `a`\n\n```\nx\n```\n")));
    }

    #[test]
    fn non_consecutive_duplicate_fails() {
        let input = "## `a`\n\n```\n1\n```\n\n## `b`\n\n```\n2\n```\n\n## `a`\n\n```\n3\n```\n";
        assert!(is_malformed(extract(input)));
    }

    #[test]
    fn escaping_names_fail() {
        assert!(is_malformed(extract("## `../x`\n\n```\nx\n```\n")));
        assert!(is_malformed(extract("## `/etc/x`\n\n```\nx\n```\n")));
    }

    #[test]
    fn ignores_other_headings_and_indented_code() {
        let input = r#"# `title.txt`

### `deep.txt`

## Plain heading

## See `a.txt` here

    indented code is not a content token

## `real.txt`

```
real
```
"#;
        let doc = extract(input).unwrap();
        assert_eq!(doc.records, vec![Record::new("real.txt", "real\n")]);
    }

    #[test]
    fn tilde_fences_are_content_tokens() {
        let doc = extract("## `t`\n\n~~~\ntilde\n~~~\n").unwrap();
        assert_eq!(doc.records[0].content, b"tilde\n");
    }

    #[test]
    fn front_matter_overrides_flags() {
        let input = "---\ngitignore: false\nvscode: true\n---\n\n## `a`\n\n```\nx\n```\n";
        let doc = extract(input).unwrap();
        assert!(!doc.flags.gitignore);
        assert!(doc.flags.vscode);
    }

    #[test]
    fn non_boolean_front_matter_is_ignored() {
        let input = "---\ngitignore: \"no\"\nvscode: 1\n---\n\n## `a`\n\n```\nx\n```\n";
        let doc = extract(input).unwrap();
        assert_eq!(doc.flags, Flags::default());
    }

    #[test]
    fn front_matter_respects_caller_defaults() {
        let defaults = Flags {
            gitignore: false,
            vscode: true,
        };
        let doc = MarkdownExtractor
            .extract(b"## `a`\n\n```\nx\n```\n", defaults)
            .unwrap();
        assert_eq!(doc.flags, defaults);
    }

    #[test]
    fn invalid_utf8_fails() {
        let mut input = b"## `a.bin`\n\n```\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"```\n");

        let err = MarkdownExtractor.extract(&input, Flags::default()).unwrap_err();
        assert!(err.to_string().contains("not valid UTF-8"));
    }

    #[test]
    fn crlf_lines_are_kept() {
        let doc = extract("## `a.txt`\r\n\r\n```\r\nline1\r\nline2\r\n```\r\n").unwrap();
        assert_eq!(doc.records[0].content, b"line1\r\nline2\r\n");
    }

    #[test]
    fn mixed_line_endings_are_kept() {
        let doc = extract("## `run.bat`\n\n```bat\n@echo off\r\n\r\necho hi\nexit\r\n```\n").unwrap();
        assert_eq!(doc.records[0].content, b"@echo off\r\n\r\necho hi\nexit\r\n");
    }

    #[test]
    fn empty_document_has_no_records() {
        let doc = extract("").unwrap();
        assert!(doc.records.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn file_name() -> impl Strategy<Value = String> {
        "[a-z]{1,8}(\\.[a-z]{1,3})?"
    }

    fn body() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-zA-Z0-9 =:{}]{0,20}", 0..4)
            .prop_map(|lines| lines.iter().map(|l| format!("{}\n", l)).collect())
    }

    fn render(files: &[(String, String)], repeat_heading: bool) -> String {
        let mut doc = String::new();
        for (name, body) in files {
            doc.push_str(&format!("## `{}`\n\n", name));
            if repeat_heading {
                doc.push_str(&format!("## `{}`\n\n", name));
            }
            doc.push_str(&format!("```\n{}```\n\n", body));
        }
        doc
    }

    fn distinct(files: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut seen = std::collections::HashSet::new();
        files
            .into_iter()
            .filter(|(name, _)| seen.insert(name.clone()))
            .collect()
    }

    proptest! {
        #[test]
        fn well_formed_documents_round_trip(
            files in proptest::collection::vec((file_name(), body()), 0..6),
            repeat_heading in any::<bool>(),
        ) {
            let files = distinct(files);
            let doc = render(&files, repeat_heading);

            let extraction = MarkdownExtractor.extract(doc.as_bytes(), Flags::default()).unwrap();

            prop_assert_eq!(extraction.records.len(), files.len());
            for (record, (name, body)) in extraction.records.iter().zip(&files) {
                prop_assert_eq!(&record.name, name);
                prop_assert_eq!(&record.content, body.as_bytes());
            }
        }

        #[test]
        fn dangling_heading_always_fails(
            files in proptest::collection::vec((file_name(), body()), 0..4),
            dangling in "[a-z]{1,8}\\.dangling",
        ) {
            let files = distinct(files);
            let mut doc = render(&files, false);
            doc.push_str(&format!("## `{}`\n\ntrailing prose\n", dangling));

            let result = MarkdownExtractor.extract(doc.as_bytes(), Flags::default());
            prop_assert!(matches!(result, Err(ExtractError::MalformedDocument(_))));
        }
    }
}
