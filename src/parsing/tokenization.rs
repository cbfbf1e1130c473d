use std::collections::VecDeque;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use phf::phf_map;

use crate::diag::{codes, Diagnostic};

#[derive(Clone, Debug)]
pub struct Token {
    pub loc: CodeLocation,
    pub info: TokenInfo,
}

impl Token {
    fn new(loc: CodeLocation, info: TokenInfo) -> Self {
        Self { loc, info }
    }

    pub fn is_end(&self) -> bool {
        matches!(self.info, TokenInfo::End)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeLocation {
    pub ln: usize,
    pub ch: usize,
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ln, self.ch)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenInfo {
    End,

    // Literals
    Ident(String),
    Int(i64),
    Str(String),

    // Delimiters
    Semicolon,
    Comma,
    Dot,
    ParenOpen,
    ParenClose,
    CurlyOpen,
    CurlyClose,
    SqrBracketOpen,
    SqrBracketClose,

    // Operators
    Plus,
    Dash,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,

    // Keywords
    Using,
    Namespace,
    Class,
    Static,
    Public,
    Private,
    Void,
    IntType,
    StringType,
    BoolType,
    Var,
    If,
    Else,
    While,
    Return,
    True,
    False,
}

static KEYWORDS: phf::Map<&'static str, TokenInfo> = phf_map! {
    "using" => TokenInfo::Using,
    "namespace" => TokenInfo::Namespace,
    "class" => TokenInfo::Class,
    "static" => TokenInfo::Static,
    "public" => TokenInfo::Public,
    "private" => TokenInfo::Private,
    "void" => TokenInfo::Void,
    "int" => TokenInfo::IntType,
    "string" => TokenInfo::StringType,
    "bool" => TokenInfo::BoolType,
    "var" => TokenInfo::Var,
    "if" => TokenInfo::If,
    "else" => TokenInfo::Else,
    "while" => TokenInfo::While,
    "return" => TokenInfo::Return,
    "true" => TokenInfo::True,
    "false" => TokenInfo::False,
};

impl TokenInfo {
    /// Human readable rendition for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenInfo::End => "end of file".into(),
            TokenInfo::Ident(name) => format!("identifier `{name}`"),
            TokenInfo::Int(_) => "integer literal".into(),
            TokenInfo::Str(_) => "string literal".into(),
            other => format!("`{}`", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            TokenInfo::End | TokenInfo::Ident(_) | TokenInfo::Int(_) | TokenInfo::Str(_) => "",
            TokenInfo::Semicolon => ";",
            TokenInfo::Comma => ",",
            TokenInfo::Dot => ".",
            TokenInfo::ParenOpen => "(",
            TokenInfo::ParenClose => ")",
            TokenInfo::CurlyOpen => "{",
            TokenInfo::CurlyClose => "}",
            TokenInfo::SqrBracketOpen => "[",
            TokenInfo::SqrBracketClose => "]",
            TokenInfo::Plus => "+",
            TokenInfo::Dash => "-",
            TokenInfo::Star => "*",
            TokenInfo::Slash => "/",
            TokenInfo::Percent => "%",
            TokenInfo::Bang => "!",
            TokenInfo::Assign => "=",
            TokenInfo::Eq => "==",
            TokenInfo::Ne => "!=",
            TokenInfo::Lt => "<",
            TokenInfo::Le => "<=",
            TokenInfo::Gt => ">",
            TokenInfo::Ge => ">=",
            TokenInfo::AndAnd => "&&",
            TokenInfo::OrOr => "||",
            TokenInfo::Using => "using",
            TokenInfo::Namespace => "namespace",
            TokenInfo::Class => "class",
            TokenInfo::Static => "static",
            TokenInfo::Public => "public",
            TokenInfo::Private => "private",
            TokenInfo::Void => "void",
            TokenInfo::IntType => "int",
            TokenInfo::StringType => "string",
            TokenInfo::BoolType => "bool",
            TokenInfo::Var => "var",
            TokenInfo::If => "if",
            TokenInfo::Else => "else",
            TokenInfo::While => "while",
            TokenInfo::Return => "return",
            TokenInfo::True => "true",
            TokenInfo::False => "false",
        }
    }
}

pub struct Tokenizer<'file> {
    source: Peekable<Chars<'file>>,
    cur_loc: CodeLocation,
    peeked: VecDeque<Token>,
}

impl<'file> Tokenizer<'file> {
    pub fn new(source: &'file str) -> Self {
        Self {
            source: source.chars().peekable(),
            cur_loc: CodeLocation { ln: 1, ch: 1 },
            peeked: VecDeque::new(),
        }
    }

    fn is_ident_begin(c: char) -> bool {
        c == '_' || c.is_alphabetic()
    }

    fn is_ident_cont(c: char) -> bool {
        Self::is_ident_begin(c) || c.is_ascii_digit()
    }

    fn peek_char(&mut self) -> char {
        self.source.peek().copied().unwrap_or('\0')
    }

    fn peek_char2(&mut self) -> char {
        let mut lookahead = self.source.clone();
        lookahead.next();
        lookahead.next().unwrap_or('\0')
    }

    fn next_char(&mut self) -> char {
        let c = self.source.next().unwrap_or('\0');
        match c {
            '\0' => {}
            '\n' => {
                self.cur_loc.ln += 1;
                self.cur_loc.ch = 1;
            }
            _ => self.cur_loc.ch += 1,
        }

        c
    }

    pub fn peek(&mut self, n: usize) -> Result<&Token, Diagnostic> {
        while self.peeked.len() <= n {
            let token = self.next_no_peeking()?;
            self.peeked.push_back(token);
        }

        Ok(&self.peeked[n])
    }

    pub fn next(&mut self) -> Result<Token, Diagnostic> {
        self.peeked
            .pop_front()
            .map(Ok)
            .unwrap_or_else(|| self.next_no_peeking())
    }

    fn next_no_peeking(&mut self) -> Result<Token, Diagnostic> {
        self.skip_whitespace();

        let c = self.peek_char();
        let token = match c {
            _ if c.is_ascii_digit() => self.tokenize_number()?,
            _ if Self::is_ident_begin(c) => self.tokenize_identifier_or_keyword(),
            '"' => self.tokenize_string()?,
            _ => self.tokenize_punctuation()?,
        };

        Ok(token)
    }

    fn skip_whitespace(&mut self) {
        loop {
            let c = self.peek_char();
            match c {
                '/' if self.peek_char2() == '/' => loop {
                    let c = self.next_char();
                    if c == '\n' || c == '\0' {
                        break;
                    }
                },
                c if c.is_whitespace() => _ = self.next_char(),
                _ => break,
            }
        }
    }

    fn tokenize_number(&mut self) -> Result<Token, Diagnostic> {
        let tok_loc = self.cur_loc;

        let mut word = String::new();
        while self.peek_char().is_ascii_digit() {
            word.push(self.next_char());
        }

        let n = word.parse().map_err(|_| {
            Diagnostic::error(
                codes::INVALID_NUMBER,
                format!("integer literal `{word}` is out of range"),
                Some(tok_loc),
            )
        })?;

        Ok(Token::new(tok_loc, TokenInfo::Int(n)))
    }

    fn tokenize_identifier_or_keyword(&mut self) -> Token {
        let tok_loc = self.cur_loc;

        let mut word = String::new();
        while Self::is_ident_cont(self.peek_char()) {
            word.push(self.next_char());
        }

        match KEYWORDS.get(word.as_str()) {
            Some(info) => Token::new(tok_loc, info.clone()),
            None => Token::new(tok_loc, TokenInfo::Ident(word)),
        }
    }

    fn tokenize_string(&mut self) -> Result<Token, Diagnostic> {
        let tok_loc = self.cur_loc;
        _ = self.next_char(); // opening quote

        let mut text = String::new();
        loop {
            match self.next_char() {
                '"' => break,
                '\0' | '\n' => {
                    return Err(Diagnostic::error(
                        codes::UNTERMINATED_STRING,
                        "unterminated string literal",
                        Some(tok_loc),
                    ))
                }
                '\\' => {
                    let escape_loc = self.cur_loc;
                    match self.next_char() {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        'r' => text.push('\r'),
                        '0' => text.push('\0'),
                        '"' => text.push('"'),
                        '\\' => text.push('\\'),
                        other => {
                            return Err(Diagnostic::error(
                                codes::INVALID_ESCAPE,
                                format!("unrecognized escape sequence `\\{other}`"),
                                Some(escape_loc),
                            ))
                        }
                    }
                }
                c => text.push(c),
            }
        }

        Ok(Token::new(tok_loc, TokenInfo::Str(text)))
    }

    fn tokenize_punctuation(&mut self) -> Result<Token, Diagnostic> {
        let tok_loc = self.cur_loc;

        let info = match self.next_char() {
            '\0' => TokenInfo::End,
            ';' => TokenInfo::Semicolon,
            ',' => TokenInfo::Comma,
            '.' => TokenInfo::Dot,
            '(' => TokenInfo::ParenOpen,
            ')' => TokenInfo::ParenClose,
            '{' => TokenInfo::CurlyOpen,
            '}' => TokenInfo::CurlyClose,
            '[' => TokenInfo::SqrBracketOpen,
            ']' => TokenInfo::SqrBracketClose,
            '+' => TokenInfo::Plus,
            '-' => TokenInfo::Dash,
            '*' => TokenInfo::Star,
            '/' => TokenInfo::Slash,
            '%' => TokenInfo::Percent,
            '!' => {
                if self.peek_char() == '=' {
                    _ = self.next_char();
                    TokenInfo::Ne
                } else {
                    TokenInfo::Bang
                }
            }
            '=' => {
                if self.peek_char() == '=' {
                    _ = self.next_char();
                    TokenInfo::Eq
                } else {
                    TokenInfo::Assign
                }
            }
            '<' => {
                if self.peek_char() == '=' {
                    _ = self.next_char();
                    TokenInfo::Le
                } else {
                    TokenInfo::Lt
                }
            }
            '>' => {
                if self.peek_char() == '=' {
                    _ = self.next_char();
                    TokenInfo::Ge
                } else {
                    TokenInfo::Gt
                }
            }
            '&' => {
                if self.peek_char() == '&' {
                    _ = self.next_char();
                    TokenInfo::AndAnd
                } else {
                    return Err(Diagnostic::error(
                        codes::INVALID_CHARACTER,
                        "unexpected character `&`",
                        Some(tok_loc),
                    ));
                }
            }
            '|' => {
                if self.peek_char() == '|' {
                    _ = self.next_char();
                    TokenInfo::OrOr
                } else {
                    return Err(Diagnostic::error(
                        codes::INVALID_CHARACTER,
                        "unexpected character `|`",
                        Some(tok_loc),
                    ));
                }
            }
            c => {
                return Err(Diagnostic::error(
                    codes::INVALID_CHARACTER,
                    format!("unexpected character `{c}`"),
                    Some(tok_loc),
                ))
            }
        };

        Ok(Token::new(tok_loc, info))
    }
}
