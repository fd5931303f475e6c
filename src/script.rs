//! Splitting editor text into individual SQL statements.

#[derive(Default)]
struct SplitState {
    in_single_quote: bool,
    in_double_quote: bool,
    in_bracket: bool,
    in_backtick: bool,
    in_line_comment: bool,
    in_block_comment: bool,
    /// `BEGIN ... END` nesting inside a `CREATE TRIGGER` body.
    block_depth: usize,
    /// Upper-cased words seen so far in the current statement, up to `TRIGGER`.
    head: Vec<String>,
    is_trigger: bool,
    token: String,
    /// Whether the current piece has anything besides comments and whitespace.
    has_code: bool,
}

impl SplitState {
    fn is_idle(&self) -> bool {
        !self.in_single_quote
            && !self.in_double_quote
            && !self.in_bracket
            && !self.in_backtick
            && !self.in_line_comment
            && !self.in_block_comment
    }

    fn flush_token(&mut self) {
        if self.token.is_empty() {
            return;
        }
        let upper = self.token.to_ascii_uppercase();
        self.token.clear();

        if !self.is_trigger && self.head.len() < 4 {
            // CREATE [TEMP|TEMPORARY] TRIGGER
            self.head.push(upper.clone());
            self.is_trigger = self.head.first().is_some_and(|w| w == "CREATE")
                && self.head.iter().skip(1).any(|w| w == "TRIGGER");
        }

        if self.is_trigger {
            match upper.as_str() {
                "BEGIN" => self.block_depth += 1,
                "END" => self.block_depth = self.block_depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn reset_statement(&mut self) {
        self.block_depth = 0;
        self.head.clear();
        self.is_trigger = false;
        self.token.clear();
        self.has_code = false;
    }
}

/// Split `text` on `;` terminators, ignoring those inside strings, quoted
/// identifiers, comments and trigger bodies. Returned statements are trimmed
/// and never empty; pieces holding only comments are dropped.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = SplitState::default();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if state.in_line_comment {
            current.push(ch);
            if ch == '\n' {
                state.in_line_comment = false;
            }
            continue;
        }
        if state.in_block_comment {
            current.push(ch);
            if ch == '*' && chars.peek() == Some(&'/') {
                current.push('/');
                chars.next();
                state.in_block_comment = false;
            }
            continue;
        }
        if state.in_single_quote {
            current.push(ch);
            if ch == '\'' {
                state.in_single_quote = false;
            }
            continue;
        }
        if state.in_double_quote {
            current.push(ch);
            if ch == '"' {
                state.in_double_quote = false;
            }
            continue;
        }
        if state.in_bracket {
            current.push(ch);
            if ch == ']' {
                state.in_bracket = false;
            }
            continue;
        }
        if state.in_backtick {
            current.push(ch);
            if ch == '`' {
                state.in_backtick = false;
            }
            continue;
        }

        debug_assert!(state.is_idle());
        if !ch.is_whitespace()
            && ch != ';'
            && !(ch == '-' && chars.peek() == Some(&'-'))
            && !(ch == '/' && chars.peek() == Some(&'*'))
        {
            state.has_code = true;
        }
        match ch {
            '-' if chars.peek() == Some(&'-') => {
                state.flush_token();
                state.in_line_comment = true;
                current.push(ch);
            }
            '/' if chars.peek() == Some(&'*') => {
                state.flush_token();
                state.in_block_comment = true;
                current.push('/');
                current.push('*');
                chars.next();
            }
            '\'' => {
                state.flush_token();
                state.in_single_quote = true;
                current.push(ch);
            }
            '"' => {
                state.flush_token();
                state.in_double_quote = true;
                current.push(ch);
            }
            '[' => {
                state.flush_token();
                state.in_bracket = true;
                current.push(ch);
            }
            '`' => {
                state.flush_token();
                state.in_backtick = true;
                current.push(ch);
            }
            ';' => {
                state.flush_token();
                if state.block_depth > 0 {
                    current.push(ch);
                } else {
                    if state.has_code {
                        push_statement(&mut statements, &current);
                    }
                    current.clear();
                    state.reset_statement();
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                state.token.push(c);
                current.push(c);
            }
            c => {
                state.flush_token();
                current.push(c);
            }
        }
    }

    if state.has_code {
        push_statement(&mut statements, &current);
    }
    statements
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}
