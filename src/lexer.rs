use crate::error::{BufferId, LoopError, Span};
use crate::token::{Token, TokenKind, FIXED_TOKENS};

/// Tokenizes `source` as buffer 0.
///
/// On failure the tokens scanned before the error are returned next to it.
pub fn tokenize(source: &str) -> (Vec<Token>, Option<LoopError>) {
    tokenize_buffer(source, BufferId::default())
}

pub fn tokenize_buffer(source: &str, buffer: BufferId) -> (Vec<Token>, Option<LoopError>) {
    let mut lexer = Lexer::with_buffer(source.to_string(), buffer);
    match lexer.scan_tokens() {
        Ok(tokens) => (tokens, None),
        Err(error) => (lexer.tokens().to_vec(), Some(error)),
    }
}

pub struct Lexer {
    source: String,
    buffer: BufferId,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    fixed: Vec<(&'static str, TokenKind)>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        Self::with_buffer(source, BufferId::default())
    }

    pub fn with_buffer(source: String, buffer: BufferId) -> Self {
        let mut fixed = FIXED_TOKENS.to_vec();
        // Longest spelling wins: `<<=` before `<<` before `<`.
        fixed.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            source,
            buffer,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            fixed,
        }
    }

    /// Tokens scanned so far; after a failed scan this is the partial result.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LoopError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            Span::empty(self.buffer, self.source.len()),
        ));

        log::debug!("lexed {} tokens", self.tokens.len());
        Ok(self.tokens.clone())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn rest(&self) -> &str {
        &self.source[self.current..]
    }

    fn scan_token(&mut self) -> Result<(), LoopError> {
        if self.rest().starts_with("---") {
            return self.multi_line_comment();
        }
        if self.rest().starts_with("--") {
            while self.peek() != '\n' && !self.is_at_end() {
                self.advance();
            }
            return Ok(());
        }

        if let Some((text, kind)) = self.match_fixed() {
            self.current += text.len();
            self.add_token(kind);
            return Ok(());
        }

        let c = self.peek();
        match c {
            'a'..='z' | '_' => {
                self.identifier();
                self.add_token(TokenKind::Identifier);
            }
            'A'..='Z' => {
                self.identifier();
                let kind = if self.current - self.start > 1 {
                    TokenKind::UserDefined
                } else {
                    TokenKind::Generic
                };
                self.add_token(kind);
            }
            '0'..='9' => self.number(),
            '"' | '\'' | '`' => self.string(c)?,
            ' ' | '\t' | '\r' => {
                self.advance();
            }
            '\n' => {
                self.advance();
                self.add_token(TokenKind::Newline);
            }
            _ => {
                self.advance();
                return Err(LoopError::lex_error(
                    Span::new(self.buffer, self.start, self.current - self.start),
                    format!("unexpected token '{}'", c),
                ));
            }
        }

        Ok(())
    }

    /// Longest fixed spelling at the cursor. Word-like spellings must end at
    /// an identifier boundary so `index` stays one identifier.
    fn match_fixed(&self) -> Option<(&'static str, TokenKind)> {
        let rest = self.rest();
        self.fixed
            .iter()
            .find(|(text, _)| {
                if !rest.starts_with(text) {
                    return false;
                }
                let word_like = text.chars().all(|c| c.is_ascii_alphanumeric());
                !word_like || !rest[text.len()..].starts_with(is_identifier_char)
            })
            .copied()
    }

    fn multi_line_comment(&mut self) -> Result<(), LoopError> {
        self.current += 3;
        match self.rest().find("---") {
            Some(offset) => {
                self.current += offset + 3;
                Ok(())
            }
            None => Err(LoopError::lex_error(
                Span::new(self.buffer, self.start, 3),
                "unterminated multi-line comment".to_string(),
            )),
        }
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    fn peek_at(&self, ahead: usize) -> char {
        self.rest().chars().nth(ahead).unwrap_or('\0')
    }

    fn identifier(&mut self) {
        self.advance();
        while is_identifier_char(self.peek()) {
            self.advance();
        }
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Fractional part needs a digit after the dot, otherwise `1..2` and
        // `42.` keep their dots.
        if self.peek() == '.' && self.peek_at(1).is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if matches!(self.peek(), 'e' | 'E') {
            let digits_at = if self.peek_at(1) == '-' { 2 } else { 1 };
            if self.peek_at(digits_at).is_ascii_digit() {
                for _ in 0..digits_at {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        self.add_token(TokenKind::Number);
    }

    fn string(&mut self, quote: char) -> Result<(), LoopError> {
        self.advance();
        let mut content = String::new();

        loop {
            if self.is_at_end() {
                return Err(LoopError::lex_error(
                    Span::new(self.buffer, self.start, self.current - self.start),
                    "unterminated string".to_string(),
                ));
            }
            let c = self.advance();
            if c == quote {
                break;
            }
            if c == '\\' && self.peek() == quote {
                content.push(self.advance());
            } else {
                content.push(c);
            }
        }

        self.add_token_with_content(TokenKind::String, content);
        Ok(())
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_content(kind, text.to_string());
    }

    fn add_token_with_content(&mut self, kind: TokenKind, lexeme: String) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            Span::new(self.buffer, self.start, self.current - self.start),
        ));
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, error) = tokenize(source);
        assert!(error.is_none(), "unexpected lex error: {:?}", error);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn prefers_longest_operator() {
        assert_eq!(
            kinds("<<= << < <="),
            vec![
                TokenKind::ShiftLeftAssign,
                TokenKind::ShiftLeft,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("x := 1"),
            vec![
                TokenKind::Identifier,
                TokenKind::ColonAssign,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_respect_word_boundaries() {
        assert_eq!(
            kinds("if index elif2 in"),
            vec![
                TokenKind::If,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::In,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn type_names() {
        assert_eq!(
            kinds("T Point u8 f64"),
            vec![
                TokenKind::Generic,
                TokenKind::UserDefined,
                TokenKind::U8,
                TokenKind::F64,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        let (tokens, _) = tokenize("12 3.25 1e5 2.5E-3 42.");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["12", "3.25", "1e5", "2.5E-3", "42", ".", ""]);
    }

    #[test]
    fn numeric_suffix_is_a_separate_token() {
        assert_eq!(
            kinds("200u8"),
            vec![TokenKind::Number, TokenKind::U8, TokenKind::Eof]
        );
    }

    #[test]
    fn strings_with_all_delimiters() {
        let (tokens, error) = tokenize(r#""a\"b" 'c' `d`"#);
        assert!(error.is_none());
        assert_eq!(tokens[0].lexeme, "a\"b");
        assert_eq!(tokens[0].span.len, 6);
        assert_eq!(tokens[1].lexeme, "c");
        assert_eq!(tokens[2].lexeme, "d");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 -- note\n--- block\n spans --- 2"),
            vec![
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_comment_is_fatal() {
        let (tokens, error) = tokenize("1 --- never closed");
        let error = error.expect("expected an error");
        assert_eq!(error.message, "unterminated multi-line comment");
        assert_eq!(tokens.len(), 1);
    }

    #[test]
    fn unexpected_character_keeps_partial_tokens() {
        let (tokens, error) = tokenize("a + @");
        let error = error.expect("expected an error");
        assert!(error.message.contains("unexpected token"));
        assert_eq!(error.span.start, 4);
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Identifier, TokenKind::Plus]
        );
    }

    #[test]
    fn unterminated_string() {
        let (_, error) = tokenize("\"abc");
        assert_eq!(error.map(|e| e.message), Some("unterminated string".to_string()));
    }

    #[test]
    fn exactly_one_eof() {
        let (tokens, _) = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }
}
