// Hand-written lexer for DML
//
// Single pass over the source text. Whitespace and both comment forms are
// collected as trivia and attached to the following token rather than
// emitted. Unrecognized characters become Invalid tokens; the lexer never
// stops early and the stream always ends with an EOF token.

use crate::source::{Position, ZeroPosition, ZeroRange, ZeroSpan};
use std::path::{Path, PathBuf};

use super::{Token, TokenKind};

// Multi-character operators are matched longest-first; the table order is
// load-bearing.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::ShlAssign),
    (">>=", TokenKind::ShrAssign),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
    ("%=", TokenKind::PercentAssign),
    ("&=", TokenKind::AmpAssign),
    ("|=", TokenKind::PipeAssign),
    ("^=", TokenKind::CaretAssign),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::BangEq),
    ("<=", TokenKind::LtEq),
    (">=", TokenKind::GtEq),
    ("&&", TokenKind::AmpAmp),
    ("||", TokenKind::PipePipe),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("->", TokenKind::Arrow),
    ("::", TokenKind::ColonColon),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("!", TokenKind::Bang),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    (".", TokenKind::Dot),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("#", TokenKind::Hash),
    ("$", TokenKind::Dollar),
    ("@", TokenKind::At),
];

// Word directives carry a boundary check so `#iffy` stays `#` + identifier.
const DIRECTIVES: &[(&str, TokenKind, bool)] = &[
    ("#foreach", TokenKind::HashForeach, true),
    ("#select", TokenKind::HashSelect, true),
    ("#else", TokenKind::HashElse, true),
    ("#if", TokenKind::HashIf, true),
    ("#?", TokenKind::HashCond, false),
    ("#:", TokenKind::HashColon, false),
];

/// Lexer state
pub struct Lexer<'a> {
    source: &'a str,
    file: PathBuf,
    offset: usize,
    line: u32,
    column: u32,
    pending_trivia: Vec<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: impl Into<PathBuf>) -> Self {
        Self {
            source,
            file: file.into(),
            offset: 0,
            line: 0,
            column: 0,
            pending_trivia: Vec::new(),
        }
    }

    /// Tokenize the entire source, ending with an EOF token
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.position();
        let trivia = std::mem::take(&mut self.pending_trivia);

        let Some(ch) = self.peek() else {
            let mut token = Token::new(TokenKind::Eof, "", self.span_from(start));
            token.leading_trivia = trivia;
            return token;
        };

        let mut token = match ch {
            '#' => self.lex_hash(start),
            '%' if self.peek_nth(1) == Some('{') => self.lex_cblock(start),
            '"' => self.lex_string(start),
            '\'' => self.lex_char(start),
            '0'..='9' => self.lex_number(start),
            '.' if matches!(self.peek_nth(1), Some('0'..='9')) => self.lex_number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(start),
            _ => self.lex_operator(start),
        };
        token.leading_trivia = trivia;
        token
    }

    // --- Character operations ---

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Advance over a known-ASCII prefix
    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn position(&self) -> ZeroPosition {
        Position::new(self.line, self.column)
    }

    fn span_from(&self, start: ZeroPosition) -> ZeroSpan {
        ZeroSpan::in_file(&self.file, ZeroRange::new(start, self.position()))
    }

    // --- Trivia ---

    fn skip_trivia(&mut self) {
        let mut whitespace = String::new();
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    whitespace.push(c);
                    self.advance();
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    self.flush_whitespace(&mut whitespace);
                    self.skip_line_comment();
                }
                Some('/') if self.peek_nth(1) == Some('*') => {
                    self.flush_whitespace(&mut whitespace);
                    self.skip_block_comment();
                }
                _ => break,
            }
        }
        self.flush_whitespace(&mut whitespace);
    }

    fn flush_whitespace(&mut self, whitespace: &mut String) {
        if !whitespace.is_empty() {
            self.pending_trivia.push(std::mem::take(whitespace));
        }
    }

    fn skip_line_comment(&mut self) {
        let mut comment = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            comment.push(c);
            self.advance();
        }
        self.pending_trivia.push(comment);
    }

    fn skip_block_comment(&mut self) {
        let mut comment = String::new();
        // the opening /*
        comment.push(self.advance().unwrap_or('/'));
        comment.push(self.advance().unwrap_or('*'));
        while let Some(c) = self.peek() {
            if c == '*' && self.peek_nth(1) == Some('/') {
                comment.push('*');
                comment.push('/');
                self.advance_by(2);
                break;
            }
            comment.push(c);
            self.advance();
        }
        self.pending_trivia.push(comment);
    }

    // --- Token scanners ---

    fn lex_hash(&mut self, start: ZeroPosition) -> Token {
        for &(directive, kind, word) in DIRECTIVES {
            if self.rest().starts_with(directive) {
                let boundary_ok = !word
                    || !matches!(
                        self.rest()[directive.len()..].chars().next(),
                        Some(c) if c.is_ascii_alphanumeric() || c == '_'
                    );
                if boundary_ok {
                    self.advance_by(directive.len());
                    return Token::new(kind, directive, self.span_from(start));
                }
            }
        }
        self.advance();
        Token::new(TokenKind::Hash, "#", self.span_from(start))
    }

    fn lex_cblock(&mut self, start: ZeroPosition) -> Token {
        // skip %{
        self.advance_by(2);
        let mut body = String::new();
        while let Some(c) = self.peek() {
            if c == '%' && self.peek_nth(1) == Some('}') {
                self.advance_by(2);
                break;
            }
            body.push(c);
            self.advance();
        }
        Token::new(TokenKind::CBlock, body, self.span_from(start))
    }

    fn lex_string(&mut self, start: ZeroPosition) -> Token {
        self.advance();
        let value = self.lex_quoted('"');
        Token::new(TokenKind::StringLiteral, value, self.span_from(start))
    }

    fn lex_char(&mut self, start: ZeroPosition) -> Token {
        self.advance();
        let value = self.lex_quoted('\'');
        Token::new(TokenKind::CharLiteral, value, self.span_from(start))
    }

    /// Scan up to an unescaped closing quote, resolving the standard
    /// C-style escapes; unterminated literals end at EOF
    fn lex_quoted(&mut self, quote: char) -> String {
        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('b') => value.push('\u{0008}'),
                    Some('f') => value.push('\u{000c}'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some('\'') => value.push('\''),
                    Some(other) => value.push(other),
                    None => break,
                }
            } else {
                value.push(c);
                self.advance();
            }
        }
        value
    }

    fn lex_number(&mut self, start: ZeroPosition) -> Token {
        let mut text = String::new();
        let mut is_float = false;

        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x') | Some('X')) {
            text.push(self.advance().unwrap_or('0'));
            text.push(self.advance().unwrap_or('x'));
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        } else {
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else if c == '.' && matches!(self.peek_nth(1), Some('0'..='9')) && !is_float {
                    is_float = true;
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                is_float = true;
                text.push(self.advance().unwrap_or('e'));
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.advance().unwrap_or('+'));
                }
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        // u/l/f suffixes
        while let Some(c) = self.peek() {
            match c.to_ascii_lowercase() {
                'u' | 'l' => {
                    text.push(c);
                    self.advance();
                }
                'f' => {
                    is_float = true;
                    text.push(c);
                    self.advance();
                }
                _ => break,
            }
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        Token::new(kind, text, self.span_from(start))
    }

    fn lex_identifier(&mut self, start: ZeroPosition) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, self.span_from(start))
    }

    fn lex_operator(&mut self, start: ZeroPosition) -> Token {
        for &(op, kind) in OPERATORS {
            if self.rest().starts_with(op) {
                self.advance_by(op.len());
                return Token::new(kind, op, self.span_from(start));
            }
        }
        let ch = self.advance().unwrap_or('\0');
        Token::new(TokenKind::Invalid, ch.to_string(), self.span_from(start))
    }
}

/// Tokenize a source text; the stream always ends with EOF
pub fn tokenize(source: &str, file: impl AsRef<Path>) -> Vec<Token> {
    Lexer::new(source, file.as_ref()).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, "test.dml")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("dml device foo"),
            vec![
                TokenKind::Dml,
                TokenKind::Device,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 0x2A 3.14 1e10 2.5e-3 7u", "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[1].text, "0x2A");
        assert_eq!(tokens[2].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[3].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[4].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[5].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[5].text, "7u");
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\tb\"c""#, "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "a\tb\"c");
    }

    #[test]
    fn test_char_literal() {
        let tokens = tokenize(r"'\n' 'x'", "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[0].text, "\n");
        assert_eq!(tokens[1].text, "x");
    }

    #[test]
    fn test_operator_longest_match() {
        assert_eq!(
            kinds("<<= << <= <"),
            vec![
                TokenKind::ShlAssign,
                TokenKind::Shl,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("-> -- -"),
            vec![
                TokenKind::Arrow,
                TokenKind::MinusMinus,
                TokenKind::Minus,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_hash_directives() {
        assert_eq!(
            kinds("#if #else #foreach #select #? #: #"),
            vec![
                TokenKind::HashIf,
                TokenKind::HashElse,
                TokenKind::HashForeach,
                TokenKind::HashSelect,
                TokenKind::HashCond,
                TokenKind::HashColon,
                TokenKind::Hash,
                TokenKind::Eof
            ]
        );
        // word boundary: #iffy is not #if
        assert_eq!(
            kinds("#iffy"),
            vec![TokenKind::Hash, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn test_cblock() {
        let tokens = tokenize("%{ int x = 1; %} device", "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::CBlock);
        assert_eq!(tokens[0].text, " int x = 1; ");
        assert_eq!(tokens[1].kind, TokenKind::Device);
    }

    #[test]
    fn test_comments_are_trivia() {
        let tokens = tokenize("// header\ndevice /* inline */ foo;", "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::Device);
        assert!(tokens[0]
            .leading_trivia
            .iter()
            .any(|t| t.contains("header")));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert!(tokens[1]
            .leading_trivia
            .iter()
            .any(|t| t.contains("inline")));
    }

    #[test]
    fn test_invalid_character_does_not_halt() {
        let tokens = tokenize("device ` foo", "test.dml");
        assert_eq!(tokens[0].kind, TokenKind::Device);
        assert_eq!(tokens[1].kind, TokenKind::Invalid);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_positions_are_monotonic() {
        let source = "dml 1.4;\ndevice foo;\nbank b { }\n";
        let tokens = tokenize(source, "test.dml");
        for pair in tokens.windows(2) {
            assert!(pair[0].span.start() <= pair[1].span.start());
            assert!(pair[0].span.end() <= pair[1].span.start());
        }
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = tokenize("dml 1.4;\ndevice foo;\n", "test.dml");
        // `device` opens line 1 (zero-indexed)
        let device = tokens.iter().find(|t| t.kind == TokenKind::Device).unwrap();
        assert_eq!(device.span.start(), Position::new(1, 0));
        let name = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Identifier)
            .unwrap();
        assert_eq!(name.span.start(), Position::new(1, 7));
    }

    #[test]
    fn test_non_trivia_round_trip() {
        // concatenating token texts reproduces the non-trivia content
        let source = "device foo ; bank b { register r } // tail";
        let tokens = tokenize(source, "test.dml");
        let rebuilt: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt.join(" "), "device foo ; bank b { register r }");
    }
}
