use crate::token::{lookup_ident, Token, TokenKind};

/// Pull-based scanner. Each call to [`Lexer::next_token`] produces one token;
/// once the input is exhausted it keeps returning `EOF`.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.current(), self.peek()) {
                (Some(' ' | '\t' | '\r' | '\n'), _) => self.advance(),
                (Some('/'), Some('/')) => {
                    while !matches!(self.current(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.current().is_some_and(&pred) {
            self.advance();
        }
        self.chars[start..self.pos].iter().collect()
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);
        let ch = match self.current() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, "", line, column),
        };

        // Operators that may take a second character.
        let pair = match ch {
            '=' => Some(('=', TokenKind::Eq, TokenKind::Assign)),
            '!' => Some(('=', TokenKind::NotEq, TokenKind::Bang)),
            '<' => Some(('=', TokenKind::LessEq, TokenKind::Less)),
            '>' => Some(('=', TokenKind::GreaterEq, TokenKind::Greater)),
            '|' => Some(('|', TokenKind::Or, TokenKind::Pipe)),
            '&' => Some(('&', TokenKind::And, TokenKind::Illegal)),
            _ => None,
        };
        if let Some((second, double, single)) = pair {
            if self.peek() == Some(second) {
                self.advance();
                self.advance();
                return Token::new(double, format!("{}{}", ch, second), line, column);
            }
            self.advance();
            return Token::new(single, ch.to_string(), line, column);
        }

        let single = match ch {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            ':' => Some(TokenKind::Colon),
            '.' => Some(TokenKind::Dot),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Token::new(kind, ch.to_string(), line, column);
        }

        if ch == '"' {
            return self.read_string(line, column);
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            return Token::new(lookup_ident(&ident), ident, line, column);
        }

        if ch.is_ascii_digit() {
            return self.read_number(line, column);
        }

        self.advance();
        Token::new(TokenKind::Illegal, ch.to_string(), line, column)
    }

    fn read_number(&mut self, line: usize, column: usize) -> Token {
        let mut literal = self.take_while(|c| c.is_ascii_digit());
        let fractional = self.current() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit());
        if !fractional {
            return Token::new(TokenKind::Int, literal, line, column);
        }
        self.advance();
        literal.push('.');
        literal.push_str(&self.take_while(|c| c.is_ascii_digit()));
        Token::new(TokenKind::Float, literal, line, column)
    }

    // No escape sequences. A string that reaches end of input comes back as
    // ILLEGAL with the opening quote kept, so the parser can name the problem.
    fn read_string(&mut self, line: usize, column: usize) -> Token {
        self.advance();
        let content = self.take_while(|c| c != '"');
        if self.current().is_none() {
            return Token::new(TokenKind::Illegal, format!("\"{}", content), line, column);
        }
        self.advance();
        Token::new(TokenKind::String, content, line, column)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token up to and including the first `EOF`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
        }
        Some(token)
    }
}

/// Returns true when an ILLEGAL token is the remainder of an unclosed string.
pub fn is_unterminated_string(token: &Token) -> bool {
    token.is(TokenKind::Illegal) && token.literal.starts_with('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|tok| tok.kind).collect()
    }

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        Lexer::new(source).map(|tok| (tok.kind, tok.literal)).collect()
    }

    #[test]
    fn test_operators_and_delimiters() {
        assert_eq!(
            kinds("= + - ! * / < > == != <= >= , ; : . | ( ) { } [ ] && ||"),
            vec![
                TokenKind::Assign,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Bang,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::Dot,
                TokenKind::Pipe,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("fn true false null if else for in return profile region"),
            vec![
                TokenKind::Function,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::In,
                TokenKind::Return,
                TokenKind::Profile,
                TokenKind::Region,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            lex("foo _bar baz42"),
            vec![
                (TokenKind::Ident, "foo".to_string()),
                (TokenKind::Ident, "_bar".to_string()),
                (TokenKind::Ident, "baz42".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex("42 3.14 0"),
            vec![
                (TokenKind::Int, "42".to_string()),
                (TokenKind::Float, "3.14".to_string()),
                (TokenKind::Int, "0".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_trailing_dot_is_not_part_of_number() {
        assert_eq!(
            lex("5.foo"),
            vec![
                (TokenKind::Int, "5".to_string()),
                (TokenKind::Dot, ".".to_string()),
                (TokenKind::Ident, "foo".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
        assert_eq!(kinds("7."), vec![TokenKind::Int, TokenKind::Dot, TokenKind::Eof]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex(r#""hello world" "" "a\n""#),
            vec![
                (TokenKind::String, "hello world".to_string()),
                (TokenKind::String, String::new()),
                (TokenKind::String, "a\\n".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let tokens: Vec<Token> = Lexer::new("x = \"abc").collect();
        assert_eq!(tokens[2].kind, TokenKind::Illegal);
        assert_eq!(tokens[2].literal, "\"abc");
        assert!(is_unterminated_string(&tokens[2]));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "// leading\n// another\nx = 1; // trailing\n// end";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_slash_is_not_a_comment() {
        assert_eq!(kinds("a / b"), vec![TokenKind::Ident, TokenKind::Slash, TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn test_illegal_characters_continue() {
        assert_eq!(
            lex("@ # & x"),
            vec![
                (TokenKind::Illegal, "@".to_string()),
                (TokenKind::Illegal, "#".to_string()),
                (TokenKind::Illegal, "&".to_string()),
                (TokenKind::Ident, "x".to_string()),
                (TokenKind::Eof, String::new()),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens: Vec<Token> = Lexer::new("x = 5;\n  y = 10;").collect();
        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(
            positions,
            vec![(1, 1), (1, 3), (1, 5), (1, 6), (2, 3), (2, 5), (2, 7), (2, 9), (2, 10)]
        );
    }

    #[test]
    fn test_eof_repeats() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_full_program() {
        let source = r#"profile "prod";
fn add(a, b) { return a + b; }
fns = lambda.list(region: "us-east-1") | format table;"#;
        let kinds = kinds(source);
        assert_eq!(kinds.first(), Some(&TokenKind::Profile));
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
        assert!(!kinds.contains(&TokenKind::Illegal));
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Pipe).count(), 1);
    }
}
