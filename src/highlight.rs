//! Rule-based SQL syntax highlighting.
//!
//! The highlighter is a pure function over one block (editor line) of text:
//! it returns styled byte spans plus the block state to carry into the next
//! line. Rendering those spans is the terminal layer's job.

use regex::Regex;
use std::ops::Range;

/// SQLite reserved words and common type names.
///
/// Also used as the autocomplete dictionary.
pub const KEYWORDS: &[&str] = &[
    "abort",
    "action",
    "add",
    "after",
    "all",
    "alter",
    "analyze",
    "and",
    "as",
    "asc",
    "attach",
    "autoincrement",
    "before",
    "begin",
    "between",
    "binary",
    "blob",
    "bool",
    "boolean",
    "by",
    "cascade",
    "case",
    "cast",
    "char",
    "check",
    "collate",
    "column",
    "commit",
    "conflict",
    "constraint",
    "create",
    "cross",
    "currency",
    "current_date",
    "current_time",
    "current_timestamp",
    "database",
    "date",
    "default",
    "deferrable",
    "deferred",
    "delete",
    "desc",
    "detach",
    "distinct",
    "double",
    "drop",
    "each",
    "else",
    "end",
    "escape",
    "except",
    "exclusive",
    "exists",
    "explain",
    "fail",
    "float",
    "for",
    "foreign",
    "from",
    "full",
    "glob",
    "group",
    "having",
    "if",
    "ignore",
    "immediate",
    "in",
    "index",
    "indexed",
    "initially",
    "inner",
    "insert",
    "instead",
    "int",
    "integer",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "key",
    "left",
    "like",
    "limit",
    "match",
    "natural",
    "no",
    "not",
    "notnull",
    "null",
    "of",
    "offset",
    "on",
    "or",
    "order",
    "outer",
    "plan",
    "pragma",
    "primary",
    "query",
    "raise",
    "real",
    "references",
    "regexp",
    "reindex",
    "release",
    "rename",
    "replace",
    "restrict",
    "right",
    "rollback",
    "row",
    "savepoint",
    "select",
    "set",
    "smallint",
    "table",
    "temp",
    "temporary",
    "text",
    "then",
    "time",
    "timestamp",
    "to",
    "transaction",
    "trigger",
    "union",
    "unique",
    "update",
    "using",
    "vacuum",
    "values",
    "varchar",
    "view",
    "virtual",
    "when",
    "where",
];

const COMMENT_START: &str = "/*";
const COMMENT_END: &str = "*/";

/// Visual category of a span. The renderer decides the actual colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleId {
    Keyword,
    Number,
    DoubleQuoted,
    SingleQuoted,
    Function,
    Comment,
}

/// A styled byte range inside one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    /// Byte offset from the start of the block.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
    pub style: StyleId,
}

impl StyledSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// State carried from the end of one block into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Normal,
    /// An unterminated `/*` comment is still open.
    InComment,
}

impl BlockState {
    pub fn as_i32(self) -> i32 {
        match self {
            BlockState::Normal => 0,
            BlockState::InComment => 1,
        }
    }
}

impl From<i32> for BlockState {
    fn from(value: i32) -> Self {
        if value == 1 {
            BlockState::InComment
        } else {
            BlockState::Normal
        }
    }
}

/// A pattern and the style applied to each of its matches.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    pattern: Regex,
    /// Capture group that is styled; 0 styles the whole match.
    group: usize,
    style: StyleId,
}

impl HighlightRule {
    /// Compile a rule. Returns `None` for a malformed pattern.
    pub fn new(pattern: &str, style: StyleId) -> Option<Self> {
        Self::with_group(pattern, 0, style)
    }

    pub fn with_group(pattern: &str, group: usize, style: StyleId) -> Option<Self> {
        Regex::new(pattern).ok().map(|pattern| Self {
            pattern,
            group,
            style,
        })
    }

    pub fn style(&self) -> StyleId {
        self.style
    }

    fn collect(&self, text: &str, out: &mut Vec<StyledSpan>) {
        for caps in self.pattern.captures_iter(text) {
            if let Some(m) = caps.get(self.group)
                && !m.is_empty()
            {
                out.push(StyledSpan {
                    start: m.start(),
                    len: m.len(),
                    style: self.style,
                });
            }
        }
    }
}

/// Styled spans for one block and the state to hand to the next block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlight {
    /// Spans in application order; later spans win on overlap.
    pub spans: Vec<StyledSpan>,
    pub state: BlockState,
}

/// Ordered rule set for SQL text.
#[derive(Debug, Clone)]
pub struct Highlighter {
    rules: Vec<HighlightRule>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    /// Build the standard SQL rule set.
    pub fn new() -> Self {
        let keywords = format!(r"(?i)\b(?:{})\b", KEYWORDS.join("|"));
        let rules = [
            HighlightRule::new(&keywords, StyleId::Keyword),
            HighlightRule::new(r"[0-9]+", StyleId::Number),
            HighlightRule::new(r#""[^"]*""#, StyleId::DoubleQuoted),
            HighlightRule::new(r"'[^']*'", StyleId::SingleQuoted),
            HighlightRule::with_group(r"\b([A-Za-z0-9_]+)\(", 1, StyleId::Function),
        ];
        Self {
            rules: rules.into_iter().flatten().collect(),
        }
    }

    /// Build a highlighter from a custom rule list. Comment handling is always on.
    pub fn with_rules(rules: Vec<HighlightRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[HighlightRule] {
        &self.rules
    }

    /// Scan one block given the state the previous block ended in.
    pub fn highlight(&self, text: &str, previous: BlockState) -> Highlight {
        let mut spans = Vec::new();
        for rule in &self.rules {
            rule.collect(text, &mut spans);
        }
        let state = comment_spans(text, previous, &mut spans);
        Highlight { spans, state }
    }
}

/// Append block comment spans and return the block's terminal state.
fn comment_spans(text: &str, previous: BlockState, out: &mut Vec<StyledSpan>) -> BlockState {
    let (mut start, mut opened_here) = match previous {
        BlockState::InComment => (Some(0), false),
        BlockState::Normal => (text.find(COMMENT_START), true),
    };

    while let Some(begin) = start {
        // An opener never doubles as the closer: `/*/` stays open.
        let search_from = if opened_here {
            begin + COMMENT_START.len()
        } else {
            begin
        };
        match text[search_from..].find(COMMENT_END) {
            Some(rel) => {
                let end = search_from + rel + COMMENT_END.len();
                out.push(StyledSpan {
                    start: begin,
                    len: end - begin,
                    style: StyleId::Comment,
                });
                start = text[end..].find(COMMENT_START).map(|i| end + i);
                opened_here = true;
            }
            None => {
                if text.len() > begin {
                    out.push(StyledSpan {
                        start: begin,
                        len: text.len() - begin,
                        style: StyleId::Comment,
                    });
                }
                return BlockState::InComment;
            }
        }
    }
    BlockState::Normal
}

/// Flatten spans into contiguous runs covering all of `text`.
///
/// Each byte takes the style of the last span covering it.
pub fn paint(text: &str, spans: &[StyledSpan]) -> Vec<(Range<usize>, Option<StyleId>)> {
    let mut styles: Vec<Option<StyleId>> = vec![None; text.len()];
    for span in spans {
        let range = span.range();
        let end = range.end.min(text.len());
        for slot in &mut styles[range.start.min(end)..end] {
            *slot = Some(span.style);
        }
    }

    let mut runs = Vec::new();
    let mut run_start = 0;
    for i in 1..=styles.len() {
        if i == styles.len() || styles[i] != styles[run_start] {
            runs.push((run_start..i, styles[run_start]));
            run_start = i;
        }
    }
    runs
}

#[derive(Debug, Clone)]
struct CachedLine {
    text: String,
    incoming: BlockState,
    highlight: Highlight,
}

/// Per-line highlight cache for a whole document.
///
/// A line is rescanned only if its text or the state flowing into it changed.
#[derive(Debug, Clone, Default)]
pub struct DocumentHighlights {
    lines: Vec<CachedLine>,
}

impl DocumentHighlights {
    /// Bring the cache in line with `lines`. Returns how many lines were rescanned.
    pub fn update<S: AsRef<str>>(&mut self, highlighter: &Highlighter, lines: &[S]) -> usize {
        let mut rescanned = 0;
        let mut incoming = BlockState::Normal;
        for (idx, line) in lines.iter().enumerate() {
            let text = line.as_ref();
            let fresh = match self.lines.get(idx) {
                Some(cached) => cached.text == text && cached.incoming == incoming,
                None => false,
            };
            if !fresh {
                let cached = CachedLine {
                    text: text.to_string(),
                    incoming,
                    highlight: highlighter.highlight(text, incoming),
                };
                if idx < self.lines.len() {
                    self.lines[idx] = cached;
                } else {
                    self.lines.push(cached);
                }
                rescanned += 1;
            }
            incoming = self.lines[idx].highlight.state;
        }
        self.lines.truncate(lines.len());
        rescanned
    }

    pub fn line(&self, idx: usize) -> Option<&Highlight> {
        self.lines.get(idx).map(|l| &l.highlight)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn styled<'a>(text: &'a str, h: &Highlight, style: StyleId) -> Vec<&'a str> {
        h.spans
            .iter()
            .filter(|s| s.style == style)
            .map(|s| &text[s.range()])
            .collect()
    }

    #[test]
    fn test_keywords_case_insensitive_whole_word() {
        let hl = Highlighter::new();
        let text = "SELECT name FROM selection where x";
        let h = hl.highlight(text, BlockState::Normal);
        assert_eq!(styled(text, &h, StyleId::Keyword), vec!["SELECT", "FROM", "where"]);
    }

    #[test]
    fn test_numbers_and_strings() {
        let hl = Highlighter::new();
        let text = r#"insert into t values (42, 'abc', "q")"#;
        let h = hl.highlight(text, BlockState::Normal);
        assert_eq!(styled(text, &h, StyleId::Number), vec!["42"]);
        assert_eq!(styled(text, &h, StyleId::SingleQuoted), vec!["'abc'"]);
        assert_eq!(styled(text, &h, StyleId::DoubleQuoted), vec!["\"q\""]);
    }

    #[test]
    fn test_function_name_excludes_paren() {
        let hl = Highlighter::new();
        let text = "select count(*), my_fn(1) from t";
        let h = hl.highlight(text, BlockState::Normal);
        assert_eq!(styled(text, &h, StyleId::Function), vec!["count", "my_fn"]);
    }

    #[test]
    fn test_no_comment_markers_stays_normal() {
        let hl = Highlighter::new();
        let h = hl.highlight("select * from t -- not a block comment", BlockState::Normal);
        assert_eq!(h.state, BlockState::Normal);
        assert!(h.spans.iter().all(|s| s.style != StyleId::Comment));
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let hl = Highlighter::new();
        let text = "select 1 /* open select";
        let h = hl.highlight(text, BlockState::Normal);
        assert_eq!(h.state, BlockState::InComment);
        assert_eq!(styled(text, &h, StyleId::Comment), vec!["/* open select"]);
    }

    #[test]
    fn test_comment_continues_and_closes() {
        let hl = Highlighter::new();
        let text = "still comment */ select 1";
        let h = hl.highlight(text, BlockState::InComment);
        assert_eq!(h.state, BlockState::Normal);
        assert_eq!(styled(text, &h, StyleId::Comment), vec!["still comment */"]);
    }

    #[test]
    fn test_comment_closes_then_reopens() {
        let hl = Highlighter::new();
        let text = "x */ select /* a */ 1 /* b";
        let h = hl.highlight(text, BlockState::InComment);
        assert_eq!(h.state, BlockState::InComment);
        assert_eq!(
            styled(text, &h, StyleId::Comment),
            vec!["x */", "/* a */", "/* b"]
        );
    }

    #[test]
    fn test_opener_is_not_its_own_closer() {
        // Deliberate: the `*/` search starts past the `/*`, as SQLite's own
        // tokenizer does, so `/*/` does not close itself.
        let hl = Highlighter::new();
        let h = hl.highlight("/*/ still open", BlockState::Normal);
        assert_eq!(h.state, BlockState::InComment);
    }

    #[test]
    fn test_empty_block_inside_comment() {
        let hl = Highlighter::new();
        let h = hl.highlight("", BlockState::InComment);
        assert_eq!(h.state, BlockState::InComment);
        assert!(h.spans.is_empty());
    }

    #[test]
    fn test_comment_wins_over_keywords() {
        let hl = Highlighter::new();
        let text = "/* select 1 */";
        let h = hl.highlight(text, BlockState::Normal);
        let runs = paint(text, &h.spans);
        assert_eq!(runs, vec![(0..text.len(), Some(StyleId::Comment))]);
    }

    #[test]
    fn test_paint_covers_whole_text() {
        let hl = Highlighter::new();
        let text = "select a";
        let h = hl.highlight(text, BlockState::Normal);
        let runs = paint(text, &h.spans);
        assert_eq!(
            runs,
            vec![(0..6, Some(StyleId::Keyword)), (6..8, None)]
        );
    }

    #[test]
    fn test_paint_empty() {
        assert!(paint("", &[]).is_empty());
    }

    #[test]
    fn test_malformed_rule_is_dropped() {
        assert!(HighlightRule::new("(unclosed", StyleId::Keyword).is_none());
        let hl = Highlighter::with_rules(Vec::new());
        let h = hl.highlight("select 1", BlockState::Normal);
        assert!(h.spans.is_empty());
    }

    #[test]
    fn test_block_state_int_roundtrip() {
        assert_eq!(BlockState::from(1), BlockState::InComment);
        assert_eq!(BlockState::from(0), BlockState::Normal);
        assert_eq!(BlockState::from(-1), BlockState::Normal);
        assert_eq!(BlockState::InComment.as_i32(), 1);
    }

    #[test]
    fn test_document_propagates_state_forward() {
        let hl = Highlighter::new();
        let mut doc = DocumentHighlights::default();
        let lines = ["select 1 /* start", "middle select", "end */ select 2"];
        assert_eq!(doc.update(&hl, &lines), 3);
        assert_eq!(doc.line(0).unwrap().state, BlockState::InComment);
        assert_eq!(doc.line(1).unwrap().state, BlockState::InComment);
        assert_eq!(doc.line(2).unwrap().state, BlockState::Normal);
        let middle = doc.line(1).unwrap();
        assert_eq!(middle.spans.last().unwrap().style, StyleId::Comment);
    }

    #[test]
    fn test_document_rescans_only_changed_lines() {
        let hl = Highlighter::new();
        let mut doc = DocumentHighlights::default();
        let mut lines = vec!["select 1".to_string(), "from t".to_string(), "where x".to_string()];
        doc.update(&hl, &lines);
        assert_eq!(doc.update(&hl, &lines), 0);

        lines[2] = "where y".to_string();
        assert_eq!(doc.update(&hl, &lines), 1);

        // Opening a comment on line 0 changes the incoming state of every later line.
        lines[0] = "select 1 /*".to_string();
        assert_eq!(doc.update(&hl, &lines), 3);
        assert_eq!(doc.line(2).unwrap().state, BlockState::InComment);

        lines.pop();
        doc.update(&hl, &lines);
        assert_eq!(doc.len(), 2);
    }
}
