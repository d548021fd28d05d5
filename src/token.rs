use std::fmt;

use crate::diagnostic::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    // Literals and identifiers
    Ident,
    Int,
    Float,
    String,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Star,
    Slash,
    Less,
    Greater,
    Eq,
    NotEq,
    LessEq,
    GreaterEq,
    Or,
    And,

    // Delimiters
    Comma,
    Semicolon,
    Colon,
    Dot,
    Pipe,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Keywords
    Function,
    True,
    False,
    Null,
    If,
    Else,
    For,
    In,
    Return,
    Profile,
    Region,
}

impl TokenKind {
    /// Name used in parser messages and token dumps.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::String => "STRING",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::Or => "||",
            TokenKind::And => "&&",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Pipe => "|",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Function => "FUNCTION",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::Null => "NULL",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::For => "FOR",
            TokenKind::In => "IN",
            TokenKind::Return => "RETURN",
            TokenKind::Profile => "PROFILE",
            TokenKind::Region => "REGION",
        }
    }

    /// Tokens that may begin a statement; the parser resynchronizes on these.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::If
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Profile
                | TokenKind::Region
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an identifier to its keyword kind, or `Ident` when it is not reserved.
pub fn lookup_ident(ident: &str) -> TokenKind {
    match ident {
        "fn" => TokenKind::Function,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "return" => TokenKind::Return,
        "profile" => TokenKind::Profile,
        "region" => TokenKind::Region,
        _ => TokenKind::Ident,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(lookup_ident("fn"), TokenKind::Function);
        assert_eq!(lookup_ident("profile"), TokenKind::Profile);
        assert_eq!(lookup_ident("region"), TokenKind::Region);
        assert_eq!(lookup_ident("format"), TokenKind::Ident);
        assert_eq!(lookup_ident("Fn"), TokenKind::Ident);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TokenKind::Ident.to_string(), "IDENT");
        assert_eq!(TokenKind::Semicolon.to_string(), ";");
        assert_eq!(TokenKind::In.to_string(), "IN");
        assert_eq!(TokenKind::Function.to_string(), "FUNCTION");
    }
}
