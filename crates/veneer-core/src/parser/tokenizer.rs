//! Declaration tokenizer — converts interface declaration text into tokens
//!
//! Handles: the `interface` keyword, identifiers, string/integer/float/bool
//! literals, and the punctuation of the clause grammar (`::`, `<:`, `->`,
//! braces, parens, dot, comma, semicolon). Comments (`//`) are discarded.
//!
//! Guarantees:
//! - Deterministic: same input always produces same token stream
//! - Every error carries a line:column position

/// Token types for the declaration grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// The `interface` keyword
    Interface,

    // Literals
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),

    // Symbols
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    ColonColon, // ::
    Subtype,    // <:
    Arrow,      // ->

    // Other
    Identifier(String),
    Eof,
}

/// Position in source text for error reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token with source position
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenizer for interface declaration text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input text
    pub fn new(text: &str) -> Self {
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input into a stream of spanned tokens
    pub fn tokenize(&mut self) -> crate::Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    span: self.current_span(),
                });
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    // ── Whitespace & Comments ──────────────────────────────

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(ch) = self.peek() {
                if ch.is_ascii_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            // Line comments: //
            if self.peek() == Some('/') && self.peek_ahead(1) == Some('/') {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    // ── Main dispatch ──────────────────────────────────────

    fn next_token(&mut self) -> crate::Result<SpannedToken> {
        let span = self.current_span();
        let ch = match self.peek() {
            Some(c) => c,
            None => {
                return Ok(SpannedToken {
                    token: Token::Eof,
                    span,
                })
            }
        };

        match ch {
            '(' => self.single(Token::LParen, span),
            ')' => self.single(Token::RParen, span),
            '{' => self.single(Token::LBrace, span),
            '}' => self.single(Token::RBrace, span),
            ',' => self.single(Token::Comma, span),
            ';' => self.single(Token::Semicolon, span),
            '.' => self.single(Token::Dot, span),
            ':' => {
                if self.peek_ahead(1) == Some(':') {
                    self.advance();
                    self.advance();
                    Ok(SpannedToken {
                        token: Token::ColonColon,
                        span,
                    })
                } else {
                    Err(crate::Error::Definition(format!(
                        "unexpected character ':' at {} (did you mean '::'?)",
                        span
                    )))
                }
            }
            '<' => {
                if self.peek_ahead(1) == Some(':') {
                    self.advance();
                    self.advance();
                    Ok(SpannedToken {
                        token: Token::Subtype,
                        span,
                    })
                } else {
                    Err(crate::Error::Definition(format!(
                        "unexpected character '<' at {} (did you mean '<:'?)",
                        span
                    )))
                }
            }
            '-' => {
                if self.peek_ahead(1) == Some('>') {
                    self.advance();
                    self.advance();
                    Ok(SpannedToken {
                        token: Token::Arrow,
                        span,
                    })
                } else {
                    Err(crate::Error::Definition(format!(
                        "unexpected character '-' at {} (did you mean '->'?)",
                        span
                    )))
                }
            }
            '"' => self.read_string(span),
            c if c.is_ascii_digit() => self.read_number(span),
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier_or_keyword(span),
            _ => Err(crate::Error::Definition(format!(
                "unexpected character '{}' at {}",
                ch, span
            ))),
        }
    }

    fn single(&mut self, token: Token, span: Span) -> crate::Result<SpannedToken> {
        self.advance();
        Ok(SpannedToken { token, span })
    }

    // ── String literals ────────────────────────────────────

    fn read_string(&mut self, span: Span) -> crate::Result<SpannedToken> {
        self.advance(); // consume opening "
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(crate::Error::Definition(format!(
                        "unterminated string starting at {}",
                        span
                    )));
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(c) => {
                        return Err(crate::Error::Definition(format!(
                            "invalid escape sequence '\\{}' at {}",
                            c,
                            self.current_span()
                        )));
                    }
                    None => {
                        return Err(crate::Error::Definition(format!(
                            "unterminated escape sequence at {}",
                            self.current_span()
                        )));
                    }
                },
                Some(c) => value.push(c),
            }
        }

        Ok(SpannedToken {
            token: Token::StringLiteral(value),
            span,
        })
    }

    // ── Numbers ────────────────────────────────────────────

    fn read_number(&mut self, span: Span) -> crate::Result<SpannedToken> {
        let start = self.position;
        let mut has_dot = false;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();

        if has_dot {
            let val: f64 = text.parse().map_err(|_| {
                crate::Error::Definition(format!("invalid float '{}' at {}", text, span))
            })?;
            Ok(SpannedToken {
                token: Token::FloatLiteral(val),
                span,
            })
        } else {
            let val: i64 = text.parse().map_err(|_| {
                crate::Error::Definition(format!("invalid integer '{}' at {}", text, span))
            })?;
            Ok(SpannedToken {
                token: Token::IntegerLiteral(val),
                span,
            })
        }
    }

    // ── Identifiers & Keywords ─────────────────────────────

    fn read_identifier_or_keyword(&mut self, span: Span) -> crate::Result<SpannedToken> {
        let start = self.position;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();

        let token = match text.as_str() {
            "interface" => Token::Interface,
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            _ => Token::Identifier(text),
        };

        Ok(SpannedToken { token, span })
    }
}
