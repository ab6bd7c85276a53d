//! Final normalization pass over generated Go source.
//!
//! The emitters write unindented lines; this pass re-indents by delimiter depth, collapses
//! whitespace outside literals, normalizes blank lines, sorts import specs and aligns
//! struct fields, composite-literal keys and adjacent one-line function bodies. It also acts
//! as a syntax gate: unbalanced delimiters or unterminated literals mean the emitter produced
//! broken text.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// 1-based line in the unformatted buffer.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for FormatError {}

#[derive(Debug, Clone)]
struct Line {
    text: String,
    depth: usize,
    /// Inside a multi-line raw string or block comment; kept byte-for-byte.
    verbatim: bool,
}

impl Line {
    fn is_blank(&self) -> bool {
        !self.verbatim && self.text.is_empty()
    }
}

pub fn format_source(src: &str) -> Result<String, FormatError> {
    let lines = scan(src)?;
    let lines = sort_import_blocks(lines);
    let mut lines = normalize_blank_lines(lines);
    align_struct_fields(&mut lines);
    align_adjacent(&mut lines, keyed_element, |key, pad, value| {
        format!("{key}:{pad} {value}")
    });
    align_adjacent(&mut lines, one_line_func, |head, pad, body| {
        format!("{head}{pad} {body}")
    });

    let mut out = String::with_capacity(src.len());
    for l in &lines {
        if !l.verbatim && !l.text.is_empty() {
            for _ in 0..l.depth {
                out.push('\t');
            }
        }
        out.push_str(&l.text);
        out.push('\n');
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Carry {
    None,
    RawString,
    BlockComment,
}

fn scan(src: &str) -> Result<Vec<Line>, FormatError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut carry = Carry::None;
    let mut out = Vec::new();

    for (idx, raw) in src.lines().enumerate() {
        let lno = idx + 1;
        let chars: Vec<char> = raw.chars().collect();
        let mut i = 0;

        if carry != Carry::None {
            let closer = if carry == Carry::RawString { "`" } else { "*/" };
            match find(&chars, 0, closer) {
                Some(end) => {
                    // The literal ends on this line; the remainder is scanned normally.
                    i = end + closer.len();
                    carry = Carry::None;
                    if i >= chars.len() {
                        out.push(Line {
                            text: raw.to_string(),
                            depth: stack.len(),
                            verbatim: true,
                        });
                        continue;
                    }
                }
                None => {
                    out.push(Line {
                        text: raw.to_string(),
                        depth: stack.len(),
                        verbatim: true,
                    });
                    continue;
                }
            }
        }

        let verbatim_prefix: String = chars[..i].iter().collect();
        let mut text = verbatim_prefix.clone();
        let mut pending_space = false;
        let mut leading = verbatim_prefix.is_empty();
        let mut depth = stack.len();

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                pending_space = !text.is_empty();
                i += 1;
                continue;
            }
            if pending_space {
                text.push(' ');
                pending_space = false;
            }
            match c {
                '"' | '\'' => {
                    let end = find_quote_end(&chars, i, c).ok_or_else(|| FormatError {
                        line: lno,
                        message: format!("unterminated {} literal", literal_kind(c)),
                    })?;
                    text.extend(&chars[i..=end]);
                    i = end + 1;
                    leading = false;
                    continue;
                }
                '`' => {
                    match find(&chars, i + 1, "`") {
                        Some(end) => {
                            text.extend(&chars[i..=end]);
                            i = end + 1;
                        }
                        None => {
                            text.extend(&chars[i..]);
                            i = chars.len();
                            carry = Carry::RawString;
                        }
                    }
                    leading = false;
                    continue;
                }
                '/' if chars.get(i + 1) == Some(&'/') => {
                    let comment: String = chars[i..].iter().collect();
                    text.push_str(comment.trim_end());
                    break;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    match find(&chars, i + 2, "*/") {
                        Some(end) => {
                            text.extend(&chars[i..end + 2]);
                            i = end + 2;
                        }
                        None => {
                            text.extend(&chars[i..]);
                            i = chars.len();
                            carry = Carry::BlockComment;
                        }
                    }
                    leading = false;
                    continue;
                }
                '{' | '(' | '[' => {
                    stack.push((c, lno));
                    leading = false;
                }
                '}' | ')' | ']' => {
                    let want = match c {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == want => {}
                        Some((open, open_line)) => {
                            return Err(FormatError {
                                line: lno,
                                message: format!(
                                    "{c:?} does not close {open:?} opened on line {open_line}"
                                ),
                            })
                        }
                        None => {
                            return Err(FormatError {
                                line: lno,
                                message: format!("unexpected {c:?}"),
                            })
                        }
                    }
                    if leading {
                        depth = stack.len();
                    }
                }
                _ => leading = false,
            }
            text.push(c);
            i += 1;
        }

        out.push(Line {
            text,
            depth,
            verbatim: false,
        });
    }

    match carry {
        Carry::RawString => {
            return Err(FormatError {
                line: out.len(),
                message: "unterminated raw string literal".to_string(),
            })
        }
        Carry::BlockComment => {
            return Err(FormatError {
                line: out.len(),
                message: "unterminated block comment".to_string(),
            })
        }
        Carry::None => {}
    }
    if let Some((open, line)) = stack.pop() {
        return Err(FormatError {
            line,
            message: format!("{open:?} is never closed"),
        });
    }
    Ok(out)
}

fn literal_kind(quote: char) -> &'static str {
    if quote == '"' {
        "string"
    } else {
        "rune"
    }
}

fn find(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if from > chars.len() {
        return None;
    }
    chars[from..]
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .map(|p| p + from)
}

fn find_quote_end(chars: &[char], start: usize, quote: char) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn sort_import_blocks(mut lines: Vec<Line>) -> Vec<Line> {
    let mut i = 0;
    while i < lines.len() {
        if lines[i].verbatim || lines[i].text != "import (" {
            i += 1;
            continue;
        }
        let depth = lines[i].depth;
        let start = i + 1;
        let mut end = start;
        while end < lines.len() && !(lines[end].depth == depth && lines[end].text == ")") {
            end += 1;
        }
        let mut specs: Vec<Line> = lines[start..end]
            .iter()
            .filter(|l| !l.is_blank())
            .cloned()
            .collect();
        specs.sort_by(|a, b| import_path(&a.text).cmp(import_path(&b.text)));
        specs.dedup_by(|a, b| a.text == b.text);
        let n = specs.len();
        lines.splice(start..end, specs);
        i = start + n + 1;
    }
    lines
}

fn import_path(spec: &str) -> &str {
    match spec.find('"') {
        Some(q) => &spec[q..],
        None => spec,
    }
}

fn normalize_blank_lines(lines: Vec<Line>) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len());
    for l in lines {
        if l.is_blank() {
            let keep = match out.last() {
                None => false,
                Some(prev) => {
                    let opens = prev.text.ends_with('{') || prev.text.ends_with('(');
                    !prev.is_blank() && !(!prev.verbatim && opens)
                }
            };
            if keep {
                out.push(l);
            }
            continue;
        }
        if !l.verbatim && (l.text.starts_with('}') || l.text.starts_with(')')) {
            while out.last().is_some_and(Line::is_blank) {
                out.pop();
            }
        }
        out.push(l);
    }
    while out.last().is_some_and(Line::is_blank) {
        out.pop();
    }
    out
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
}

/// Pads runs of `name Type` lines inside `struct {` blocks so the types line up.
fn align_struct_fields(lines: &mut [Line]) {
    let mut i = 0;
    while i < lines.len() {
        if lines[i].verbatim || !lines[i].text.ends_with("struct {") {
            i += 1;
            continue;
        }
        let field_depth = lines[i].depth + 1;
        let mut j = i + 1;
        let mut run: Vec<usize> = Vec::new();
        while j < lines.len() && (lines[j].depth >= field_depth || lines[j].is_blank()) {
            let is_field = lines[j].depth == field_depth
                && !lines[j].verbatim
                && field_name(&lines[j].text).is_some();
            if is_field {
                run.push(j);
            } else {
                pad_run(lines, &run, field_name, &|name, pad, rest| {
                    format!("{name}{pad} {rest}")
                });
                run.clear();
            }
            j += 1;
        }
        pad_run(lines, &run, field_name, &|name, pad, rest| {
            format!("{name}{pad} {rest}")
        });
        i = j;
    }
}

fn field_name(text: &str) -> Option<(&str, &str)> {
    let (name, rest) = text.split_once(' ')?;
    if !is_ident(name) || rest.starts_with("//") {
        return None;
    }
    Some((name, rest))
}

/// Pads runs of adjacent, equally indented lines that `split` accepts so that their
/// second halves start in the same column.
fn align_adjacent(
    lines: &mut [Line],
    split: fn(&str) -> Option<(&str, &str)>,
    join: impl Fn(&str, &str, &str) -> String,
) {
    let mut run: Vec<usize> = Vec::new();
    for j in 0..lines.len() {
        let matches = !lines[j].verbatim && split(&lines[j].text).is_some();
        let continues = matches
            && run
                .last()
                .map_or(true, |&k| lines[k].depth == lines[j].depth && k + 1 == j);
        if !continues {
            pad_run(lines, &run, split, &join);
            run.clear();
            if !matches {
                continue;
            }
        }
        run.push(j);
    }
    pad_run(lines, &run, split, &join);
}

/// `key: value,` composite literal elements.
fn keyed_element(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once(": ")?;
    if !is_ident(key) || key == "default" || !text.ends_with(',') {
        return None;
    }
    Some((key, value))
}

/// A whole top-level `func ... { body }` on one line, split before the body's brace.
fn one_line_func(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with("func ") || !text.ends_with('}') {
        return None;
    }
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut depth = 0usize;
    let mut body_start = None;
    let mut i = 0;
    while i < chars.len() {
        let (pos, c) = chars[i];
        match c {
            '"' | '\'' | '`' => {
                i += 1;
                while i < chars.len() && chars[i].1 != c {
                    if chars[i].1 == '\\' && c != '`' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            '/' if chars.get(i + 1).map(|&(_, n)| n) == Some('/') => return None,
            '{' | '(' | '[' => {
                if depth == 0 && c == '{' {
                    body_start = Some(pos);
                }
                depth += 1;
            }
            '}' | ')' | ']' => depth = depth.checked_sub(1)?,
            _ => {}
        }
        i += 1;
    }
    let start = body_start.filter(|_| depth == 0)?;
    let head = text[..start].trim_end();
    if head.is_empty() {
        return None;
    }
    Some((head, &text[start..]))
}

fn pad_run(
    lines: &mut [Line],
    run: &[usize],
    split: fn(&str) -> Option<(&str, &str)>,
    join: &dyn Fn(&str, &str, &str) -> String,
) {
    if run.len() < 2 {
        return;
    }
    let width = run
        .iter()
        .filter_map(|&k| split(&lines[k].text).map(|(head, _)| head.chars().count()))
        .max()
        .unwrap_or(0);
    for &k in run {
        let rewritten = split(&lines[k].text).map(|(head, tail)| {
            let pad = " ".repeat(width - head.chars().count());
            join(head, &pad, tail)
        });
        if let Some(text) = rewritten {
            lines[k].text = text;
        }
    }
}
