//! Rewrites applied to WordprocessingML before it reaches the template engine.

/// Kinds of template tag recognised inside document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    /// `{{ ... }}`
    Expression,
    /// `{% ... %}`
    Statement,
    /// `{# ... #}`
    Comment,
}

impl TagKind {
    fn from_opener(c: char) -> Option<Self> {
        match c {
            '{' => Some(Self::Expression),
            '%' => Some(Self::Statement),
            '#' => Some(Self::Comment),
            _ => None,
        }
    }

    fn opener(self) -> char {
        match self {
            Self::Expression => '{',
            Self::Statement => '%',
            Self::Comment => '#',
        }
    }

    fn closer(self) -> char {
        match self {
            Self::Expression => '}',
            Self::Statement => '%',
            Self::Comment => '#',
        }
    }
}

/// Directives that replace their whole enclosing Word element with a plain statement tag.
///
/// Processed in this order so that a row directive wins over the paragraph it sits in.
const ELEMENT_DIRECTIVES: &[(&str, &str)] = &[("tr", "w:tr"), ("tc", "w:tc"), ("p", "w:p"), ("r", "w:r")];

/// Prepares one XML part for rendering.
///
/// 1. Template tags split across runs are re-joined: all XML markup between `{{`/`{%`/`{#`
///    and the matching close is removed.
/// 2. Inside tags, XML entities and Word's typographic quotes become plain characters.
/// 3. `{%p ... %}`, `{%tr ... %}`, `{%tc ... %}` and `{%r ... %}` replace the enclosing
///    `<w:p>`, `<w:tr>`, `<w:tc>` or `<w:r>` element with `{% ... %}`.
pub fn prepare_part(xml: &str) -> String {
    let joined = join_split_tags(xml);
    ELEMENT_DIRECTIVES
        .iter()
        .fold(joined, |acc, (marker, element)| collapse_directive(&acc, marker, element))
}

fn join_split_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let after_brace = &rest[pos + 1..];
        let after_markup = skip_markup(after_brace);

        let Some(kind) = after_markup.chars().next().and_then(TagKind::from_opener) else {
            out.push('{');
            rest = after_brace;
            continue;
        };

        match split_at_close(&after_markup[1..], kind) {
            Some((body, remainder)) => {
                out.push('{');
                out.push(kind.opener());
                out.push_str(&normalise_tag_body(&strip_markup(body)));
                out.push(kind.closer());
                out.push('}');
                rest = remainder;
            }
            None => {
                out.push('{');
                rest = after_brace;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Skips any run of `<...>` elements at the start of `s`.
fn skip_markup(mut s: &str) -> &str {
    while s.starts_with('<') {
        match s.find('>') {
            Some(end) => s = &s[end + 1..],
            None => break,
        }
    }
    s
}

/// Finds the close of a tag whose opener has already been consumed.
///
/// Returns the raw tag body and whatever follows the closing `}`.
fn split_at_close(body: &str, kind: TagKind) -> Option<(&str, &str)> {
    let closer = kind.closer();
    let mut search_from = 0;

    while let Some(found) = body[search_from..].find(closer) {
        let idx = search_from + found;
        let tail = skip_markup(&body[idx + 1..]);
        if tail.starts_with('}') {
            let after_close = body.len() - tail.len() + 1;
            return Some((&body[..idx], &body[after_close..]));
        }
        search_from = idx + 1;
    }

    None
}

fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_markup = false;
    for c in s.chars() {
        match c {
            '<' => in_markup = true,
            '>' if in_markup => in_markup = false,
            _ if !in_markup => out.push(c),
            _ => {}
        }
    }
    out
}

fn normalise_tag_body(body: &str) -> String {
    body.replace('\u{2018}', "'")
        .replace('\u{2019}', "'")
        .replace('\u{201C}', "\"")
        .replace('\u{201D}', "\"")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn collapse_directive(xml: &str, marker: &str, element: &str) -> String {
    let opener = format!("{{%{marker} ");
    let open_plain = format!("<{element}>");
    let open_attrs = format!("<{element} ");
    let close = format!("</{element}>");

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(tag_start) = rest.find(&opener) {
        let Some(tag_end) = rest[tag_start..].find("%}").map(|i| tag_start + i + 2) else {
            break;
        };

        let before = &rest[..tag_start];
        let element_start = before.rfind(&open_plain).max(before.rfind(&open_attrs));
        let element_end = rest[tag_end..]
            .find(&close)
            .map(|i| tag_end + i + close.len());

        match (element_start, element_end) {
            (Some(start), Some(end)) => {
                out.push_str(&rest[..start]);
                out.push_str("{%");
                // Keep everything after the marker: " if x %}"
                out.push_str(&rest[tag_start + opener.len() - 1..tag_end]);
                rest = &rest[end..];
            }
            _ => {
                tracing::warn!("{{%{} ... %}} directive outside a <{}> element", marker, element);
                out.push_str(&rest[..tag_end]);
                rest = &rest[tag_end..];
            }
        }
    }

    out.push_str(rest);
    out
}
