use crate::types::{Entry, PosterError, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// The only names a post format may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
}

impl FromStr for Field {
    type Err = PosterError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "title" => Ok(Field::Title),
            "link" => Ok(Field::Link),
            "summary" => Ok(Field::Summary),
            other => Err(PosterError::Format(format!(
                "unknown field {{{}}}, expected one of {{title}}, {{link}}, {{summary}}",
                other
            ))),
        }
    }
}

impl Field {
    fn value(self, entry: &Entry) -> &str {
        match self {
            Field::Title => &entry.title,
            Field::Link => &entry.link,
            Field::Summary => &entry.summary,
        }
    }
}

/// Substitute `{title}`, `{link}` and `{summary}` into `template`.
///
/// `{{` and `}}` produce literal braces. Literal `\n` sequences become
/// newlines once substitution is done.
pub fn render(entry: &Entry, template: &str) -> Result<String> {
    let mut out = String::with_capacity(template.len() + entry.title.len() + entry.link.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => {
                            return Err(PosterError::Format(format!(
                                "unexpected '{{' inside field {{{}",
                                name
                            )))
                        }
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(PosterError::Format(format!(
                                "unterminated field {{{}",
                                name
                            )))
                        }
                    }
                }
                out.push_str(name.parse::<Field>()?.value(entry));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(PosterError::Format(
                    "single '}' encountered, use '}}' for a literal brace".to_string(),
                ))
            }
            other => out.push(other),
        }
    }

    Ok(out.replace("\\n", "\n"))
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s-]").expect("separator pattern is valid"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("digits pattern is valid"))
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w_]").expect("non-word pattern is valid"))
}

/// Turn a raw feed category into a hashtag body, or `None` when nothing
/// usable is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let joined = separator_re().replace_all(raw.trim(), "_");
    let cleaned = non_word_re().replace_all(&joined, "");

    if cleaned.is_empty() || digits_re().is_match(&cleaned) {
        return None;
    }

    Some(cleaned.into_owned())
}

/// `" #one #two"` for the usable tags, in source order; empty when none survive.
pub fn hashtags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .map(|tag| format!(" #{}", tag))
        .collect()
}

/// The final text handed to a publisher.
pub fn compose(entry: &Entry, template: &str) -> Result<String> {
    let mut content = render(entry, template)?;
    content.push_str(&hashtags(&entry.tags));
    Ok(content.trim().to_string())
}

/// Reject a template before it is stored rather than on the first post.
pub fn validate_template(template: &str) -> Result<()> {
    let sample = Entry {
        id: "validation".to_string(),
        title: String::new(),
        link: String::new(),
        summary: String::new(),
        tags: Vec::new(),
        published_at: chrono::Utc::now(),
    };
    render(&sample, template).map(|_| ())
}
