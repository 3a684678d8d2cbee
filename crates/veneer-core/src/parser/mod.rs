//! Declaration parser — tokenizer and recursive descent parser
//!
//! Converts interface declaration text into a `Declaration`: the display
//! name, the ordered type-variable list with optional supertype bounds, and
//! the raw requirement clauses. Clause *classification* (typed field vs.
//! untyped field vs. method vs. composition) is normalization's job; the
//! parser only captures syntactic shape.
//!
//! Grammar:
//!
//! ```text
//! declaration := "interface" Name "(" typevar ("," typevar)* ")" "{" clause* "}"
//! typevar     := Ident ("<:" expr)?
//! clause      := expr "." Ident ("::" expr)?                        // field
//!              | expr "(" args (";" Ident ("," Ident)*)? ")" ("->" expr)?  // call
//! arg         := "::" expr | Ident "::" expr | expr
//! expr        := Ident ("{" expr ("," expr)* "}")? | "(" exprs ")" | literal
//! ```
//!
//! # Guarantees
//! - Deterministic: same input always produces the same `Declaration`
//! - Atomic: any syntax error returns `Error::Definition` and nothing else
//!
//! # Errors
//! Returns `Error::Definition` with line:column for syntax violations.

pub mod tokenizer;

use crate::expr::{Expr, Literal};
use crate::{Error, Result};
use tokenizer::{Span, SpannedToken, Token, Tokenizer};

/// A parsed interface declaration, prior to clause classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub type_vars: Vec<TypeVar>,
    pub clauses: Vec<RawClause>,
}

/// A declared type variable with an optional supertype bound.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeVar {
    pub name: String,
    pub bound: Option<Expr>,
}

/// A requirement clause in syntactic form.
#[derive(Debug, Clone, PartialEq)]
pub enum RawClause {
    /// `owner.field` with an optional `:: Type` annotation.
    Field {
        owner: Expr,
        field: String,
        annotation: Option<Expr>,
    },
    /// `function(args; keywords) -> ret` — a bodiless call template.
    Call {
        function: Expr,
        args: Vec<Arg>,
        keywords: Vec<String>,
        ret: Option<Expr>,
    },
}

/// One argument inside a call-shaped clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// `::Type` or `name::Type` — a positional parameter annotation.
    Annotated(Option<String>, Expr),
    /// A bare expression (a parameter name, or a composition argument).
    Plain(Expr),
}

/// Parse declaration text into a `Declaration`.
///
/// # Errors
/// Returns `Error::Definition` for any syntax violation; parsing is atomic.
pub fn parse(input: &str) -> Result<Declaration> {
    let tokens = Tokenizer::new(input).tokenize()?;
    let mut parser = Parser::new(tokens);
    let decl = parser.parse_declaration()?;
    parser.expect_eof()?;
    Ok(decl)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    // ── Token helpers ──────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)].token
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        let idx = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn span(&self) -> Span {
        self.tokens[self.position.min(self.tokens.len() - 1)]
            .span
            .clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, context: &str) -> Result<()> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::Definition(format!(
                "expected {:?} in {} at {}, found {:?}",
                expected,
                context,
                self.span(),
                self.peek()
            )))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<String> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(Error::Definition(format!(
                "expected identifier in {} at {}, found {:?}",
                context,
                self.span(),
                other
            ))),
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        if self.peek() == &Token::Eof {
            Ok(())
        } else {
            Err(Error::Definition(format!(
                "unexpected trailing input at {}: {:?}",
                self.span(),
                self.peek()
            )))
        }
    }

    // ── Declaration ────────────────────────────────────────

    fn parse_declaration(&mut self) -> Result<Declaration> {
        self.expect(Token::Interface, "declaration")?;
        let name = self.expect_identifier("interface name")?;

        self.expect(Token::LParen, "type-variable list")?;
        let mut type_vars = Vec::new();
        if self.peek() != &Token::RParen {
            loop {
                type_vars.push(self.parse_type_var()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
                // Trailing comma before the closing paren is allowed.
                if self.peek() == &Token::RParen {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "type-variable list")?;

        self.expect(Token::LBrace, "interface body")?;
        let mut clauses = Vec::new();
        while self.peek() != &Token::RBrace {
            if self.peek() == &Token::Eof {
                return Err(Error::Definition(format!(
                    "unterminated interface body at {}",
                    self.span()
                )));
            }
            clauses.push(self.parse_clause()?);
        }
        self.expect(Token::RBrace, "interface body")?;

        Ok(Declaration {
            name,
            type_vars,
            clauses,
        })
    }

    fn parse_type_var(&mut self) -> Result<TypeVar> {
        let name = self.expect_identifier("type-variable list")?;
        let bound = if self.eat(&Token::Subtype) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(TypeVar { name, bound })
    }

    // ── Clauses ────────────────────────────────────────────

    fn parse_clause(&mut self) -> Result<RawClause> {
        let head = self.parse_expr()?;

        match self.peek() {
            Token::Dot => {
                self.advance();
                let field = self.expect_identifier("field clause")?;
                let annotation = if self.eat(&Token::ColonColon) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(RawClause::Field {
                    owner: head,
                    field,
                    annotation,
                })
            }
            Token::LParen => {
                self.advance();
                let (args, keywords) = self.parse_call_arguments()?;
                let ret = if self.eat(&Token::Arrow) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(RawClause::Call {
                    function: head,
                    args,
                    keywords,
                    ret,
                })
            }
            other => Err(Error::Definition(format!(
                "expected '.' or '(' after '{}' in requirement clause at {}, found {:?}",
                head,
                self.span(),
                other
            ))),
        }
    }

    fn parse_call_arguments(&mut self) -> Result<(Vec<Arg>, Vec<String>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();

        while self.peek() != &Token::RParen && self.peek() != &Token::Semicolon {
            args.push(self.parse_arg()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        if self.eat(&Token::Semicolon) {
            while self.peek() != &Token::RParen {
                keywords.push(self.expect_identifier("keyword-parameter block")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }

        self.expect(Token::RParen, "call clause")?;
        Ok((args, keywords))
    }

    fn parse_arg(&mut self) -> Result<Arg> {
        if self.eat(&Token::ColonColon) {
            return Ok(Arg::Annotated(None, self.parse_expr()?));
        }
        if let Token::Identifier(name) = self.peek().clone() {
            if self.peek_ahead(1) == &Token::ColonColon {
                self.advance(); // name
                self.advance(); // ::
                return Ok(Arg::Annotated(Some(name), self.parse_expr()?));
            }
        }
        Ok(Arg::Plain(self.parse_expr()?))
    }

    // ── Expressions ────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                if self.eat(&Token::LBrace) {
                    let mut params = Vec::new();
                    while self.peek() != &Token::RBrace {
                        params.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                    self.expect(Token::RBrace, "parametric type")?;
                    Ok(Expr::Apply {
                        head: Box::new(Expr::Symbol(name)),
                        args: params,
                    })
                } else {
                    Ok(Expr::Symbol(name))
                }
            }
            Token::LParen => {
                self.advance();
                let mut items = Vec::new();
                while self.peek() != &Token::RParen {
                    items.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RParen, "tuple expression")?;
                Ok(Expr::Tuple(items))
            }
            Token::StringLiteral(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(v)))
            }
            Token::IntegerLiteral(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(v)))
            }
            Token::FloatLiteral(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(v)))
            }
            Token::BooleanLiteral(v) => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(v)))
            }
            other => Err(Error::Definition(format!(
                "expected expression at {}, found {:?}",
                self.span(),
                other
            ))),
        }
    }
}
