// src/core/reader.rs

use crate::constants::ARGUMENT_SEPARATOR;
use crate::core::errors::{SyntaxError, SyntaxErrorKind};

/// A cursor over one input line. Argument types read their tokens from it and
/// leave the cursor on the first byte they did not consume.
#[derive(Debug, Clone)]
pub struct StringReader<'a> {
    input: &'a str,
    cursor: usize,
}

/// Characters allowed in an unquoted word.
fn is_allowed_in_unquoted_string(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

fn is_allowed_number(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

impl<'a> StringReader<'a> {
    /// Creates a reader positioned at the start of `input`.
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    /// The whole input line.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The current byte offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor. Offsets past the end are clamped.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.input.len());
    }

    /// The input that has already been read.
    pub fn consumed(&self) -> &'a str {
        self.input.get(..self.cursor).unwrap_or_default()
    }

    /// The input that has not been read yet.
    pub fn remaining(&self) -> &'a str {
        self.input.get(self.cursor..).unwrap_or_default()
    }

    /// Returns `true` while there is input left.
    pub fn can_read(&self) -> bool {
        self.cursor < self.input.len()
    }

    /// The next character, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consumes one character.
    pub fn skip(&mut self) {
        if let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
        }
    }

    /// Consumes and returns one character.
    pub fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += c.len_utf8();
        Some(c)
    }

    /// Skips any whitespace at the cursor.
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.skip();
        }
    }

    /// Returns `true` if the cursor sits at the end of a token:
    /// end of input or the argument separator.
    pub fn at_token_end(&self) -> bool {
        matches!(self.peek(), None | Some(ARGUMENT_SEPARATOR))
    }

    /// Builds an error pointing at the current cursor.
    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::with_context(kind, self.input, self.cursor)
    }

    /// Builds an error pointing at `cursor`.
    pub fn error_at(&self, kind: SyntaxErrorKind, cursor: usize) -> SyntaxError {
        SyntaxError::with_context(kind, self.input, cursor)
    }

    // --- TOKEN READERS ---

    /// Reads up to the next separator (or the end of input).
    pub fn read_word(&mut self) -> &'a str {
        let start = self.cursor;
        while let Some(c) = self.peek() {
            if c == ARGUMENT_SEPARATOR {
                break;
            }
            self.skip();
        }
        self.input.get(start..self.cursor).unwrap_or_default()
    }

    /// Reads a run of characters allowed in unquoted strings.
    pub fn read_unquoted_string(&mut self) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(is_allowed_in_unquoted_string) {
            self.skip();
        }
        self.input.get(start..self.cursor).unwrap_or_default()
    }

    /// Reads a quoted string, handling `\"`, `\'` and `\\` escapes.
    pub fn read_quoted_string(&mut self) -> Result<String, SyntaxError> {
        let start = self.cursor;
        let quote = match self.peek() {
            Some(c) if is_quote(c) => c,
            _ => return Err(self.error(SyntaxErrorKind::ExpectedStartOfQuote)),
        };
        self.skip();

        let mut result = String::new();
        let mut escaped = false;
        while let Some(c) = self.read() {
            if escaped {
                if c == quote || c == '\\' {
                    result.push(c);
                    escaped = false;
                } else {
                    self.set_cursor(self.cursor - c.len_utf8());
                    return Err(self.error(SyntaxErrorKind::InvalidEscape(c)));
                }
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(result);
            } else {
                result.push(c);
            }
        }

        Err(self.error_at(SyntaxErrorKind::ExpectedEndOfQuote, start))
    }

    /// Reads a quoted string if the next character is a quote, otherwise an unquoted one.
    pub fn read_string(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(c) if is_quote(c) => self.read_quoted_string(),
            _ => Ok(self.read_unquoted_string().to_string()),
        }
    }

    /// Reads everything left on the line.
    pub fn read_remaining(&mut self) -> &'a str {
        let rest = self.remaining();
        self.cursor = self.input.len();
        rest
    }

    fn read_number_chars(&mut self) -> &'a str {
        let start = self.cursor;
        while self.peek().is_some_and(is_allowed_number) {
            self.skip();
        }
        self.input.get(start..self.cursor).unwrap_or_default()
    }

    /// Reads a 32-bit integer.
    pub fn read_int(&mut self) -> Result<i32, SyntaxError> {
        let start = self.cursor;
        let number = self.read_number_chars();
        if number.is_empty() {
            return Err(self.error(SyntaxErrorKind::ExpectedInt));
        }
        number.parse::<i32>().map_err(|_| {
            self.error_at(SyntaxErrorKind::InvalidInt(number.to_string()), start)
        })
    }

    /// Reads a 64-bit float.
    pub fn read_double(&mut self) -> Result<f64, SyntaxError> {
        let start = self.cursor;
        let number = self.read_number_chars();
        if number.is_empty() {
            return Err(self.error(SyntaxErrorKind::ExpectedDouble));
        }
        number.parse::<f64>().map_err(|_| {
            self.error_at(SyntaxErrorKind::InvalidDouble(number.to_string()), start)
        })
    }

    /// Reads `true` or `false`.
    pub fn read_boolean(&mut self) -> Result<bool, SyntaxError> {
        let start = self.cursor;
        let value = self.read_unquoted_string();
        match value {
            "" => Err(self.error(SyntaxErrorKind::ExpectedBool)),
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.error_at(SyntaxErrorKind::InvalidBool(other.to_string()), start)),
        }
    }
}
