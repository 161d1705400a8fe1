//! Tokenizer for raw command lines.
//!
//! Splits a line into words the way a POSIX shell does:
//! - Whitespace-separated tokens
//! - Double-quoted strings: `"hello world"` → `hello world`
//! - Single-quoted strings: `'hello world'` → `hello world`
//! - Backslash escapes outside quotes and inside double quotes
//! - `#` is an ordinary character: `join #rust` → `join`, `#rust`
//!
//! The splitting itself is done by [`shlex`].

use shlex::Shlex;

/// Splits raw command lines into argument vectors.
///
/// Holds no state between calls, so a single instance can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Creates a new tokenizer.
    pub fn new() -> Self {
        Self
    }

    /// Tokenizes `line` into an argument vector.
    ///
    /// Empty or all-whitespace input yields an empty vector. An unterminated
    /// quote or a trailing backslash is an error and no tokens are returned.
    pub fn tokenize(&self, line: &str) -> Result<Vec<String>, TokenizeError> {
        let guarded = escape_comment_marks(line);
        let mut lexer = Shlex::new(&guarded);
        let tokens: Vec<String> = lexer.by_ref().collect();

        if lexer.had_error {
            return Err(TokenizeError::new(line));
        }

        Ok(tokens)
    }
}

/// Word separators as `shlex` sees them.
fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Backslash-escapes every unquoted `#` that starts a word.
///
/// `shlex` would otherwise read it as a comment and drop the rest of the
/// line. Quoting state is tracked so `#` inside quotes is left untouched.
fn escape_comment_marks(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut chars = line.chars();
    let mut word_start = true;

    while let Some(c) = chars.next() {
        match c {
            '#' if word_start => result.push_str("\\#"),
            '\\' => {
                result.push(c);
                result.extend(chars.next());
            }
            '\'' => {
                result.push(c);
                for q in chars.by_ref() {
                    result.push(q);
                    if q == '\'' {
                        break;
                    }
                }
            }
            '"' => {
                result.push(c);
                while let Some(q) = chars.next() {
                    result.push(q);
                    match q {
                        '\\' => result.extend(chars.next()),
                        '"' => break,
                        _ => {}
                    }
                }
            }
            _ => result.push(c),
        }
        word_start = is_separator(c);
    }

    result
}

/// Tokenize error with the offending line for helpful error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeError {
    /// The line that failed to tokenize.
    pub line: String,
}

impl TokenizeError {
    /// Creates a new tokenize error for `line`.
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "syntax error: unterminated quote or trailing escape in {:?}",
            self.line
        )
    }
}

impl std::error::Error for TokenizeError {}
