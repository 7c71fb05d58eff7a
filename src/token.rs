use crate::error::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Base type names
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    F32,
    F64,
    Bool,
    Char,
    Str,
    /// Single uppercase letter, e.g. `T`
    Generic,
    /// Multi-character capitalised name, e.g. `Point`
    UserDefined,

    // Keywords
    If,
    Elif,
    Else,
    While,
    For,
    Loop,
    Ret,
    Break,
    Continue,
    Match,
    Comp,
    Type,
    Abs,
    Impl,
    Mod,
    Use,
    Import,
    As,
    From,
    Fn,
    Let,
    Mut,
    In,
    Is,
    And,
    Or,
    Not,
    True,
    False,
    NoneValue,
    SelfValue,
    Super,
    Except,
    New,
    Del,
    Exit,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    ColonAssign,
    Range,
    Plus,
    PlusAssign,
    Minus,
    MinusAssign,
    Star,
    StarAssign,
    Slash,
    SlashAssign,
    Percent,
    PercentAssign,
    Question,
    QuestionAssign,
    Bang,
    Tilde,
    TildeAssign,
    Ampersand,
    AmpersandAssign,
    Pipe,
    PipeAssign,
    Caret,
    CaretAssign,
    ShiftLeft,
    ShiftLeftAssign,
    ShiftRight,
    ShiftRightAssign,
    Hash,
    Dot,
    Comma,
    MapArrow,
    MatchArrow,
    EqualEqual,
    BangEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Assign,

    // Literals
    Number,
    String,
    Identifier,

    // Special
    Newline,
    Eof,
}

/// Every token with a fixed spelling. The lexer tries these longest first.
pub const FIXED_TOKENS: &[(&str, TokenKind)] = &[
    ("u8", TokenKind::U8),
    ("u16", TokenKind::U16),
    ("u32", TokenKind::U32),
    ("u64", TokenKind::U64),
    ("u128", TokenKind::U128),
    ("i8", TokenKind::I8),
    ("i16", TokenKind::I16),
    ("i32", TokenKind::I32),
    ("i64", TokenKind::I64),
    ("i128", TokenKind::I128),
    ("f32", TokenKind::F32),
    ("f64", TokenKind::F64),
    ("bool", TokenKind::Bool),
    ("char", TokenKind::Char),
    ("string", TokenKind::Str),
    ("if", TokenKind::If),
    ("elif", TokenKind::Elif),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("for", TokenKind::For),
    ("loop", TokenKind::Loop),
    ("ret", TokenKind::Ret),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("match", TokenKind::Match),
    ("comp", TokenKind::Comp),
    ("type", TokenKind::Type),
    ("abs", TokenKind::Abs),
    ("impl", TokenKind::Impl),
    ("mod", TokenKind::Mod),
    ("use", TokenKind::Use),
    ("import", TokenKind::Import),
    ("as", TokenKind::As),
    ("from", TokenKind::From),
    ("fn", TokenKind::Fn),
    ("let", TokenKind::Let),
    ("mut", TokenKind::Mut),
    ("in", TokenKind::In),
    ("is", TokenKind::Is),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("not", TokenKind::Not),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("none", TokenKind::NoneValue),
    ("self", TokenKind::SelfValue),
    ("super", TokenKind::Super),
    ("except", TokenKind::Except),
    ("new", TokenKind::New),
    ("del", TokenKind::Del),
    ("exit", TokenKind::Exit),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    (":", TokenKind::Colon),
    (":=", TokenKind::ColonAssign),
    ("..", TokenKind::Range),
    ("+", TokenKind::Plus),
    ("+=", TokenKind::PlusAssign),
    ("-", TokenKind::Minus),
    ("-=", TokenKind::MinusAssign),
    ("*", TokenKind::Star),
    ("*=", TokenKind::StarAssign),
    ("/", TokenKind::Slash),
    ("/=", TokenKind::SlashAssign),
    ("%", TokenKind::Percent),
    ("%=", TokenKind::PercentAssign),
    ("?", TokenKind::Question),
    ("?=", TokenKind::QuestionAssign),
    ("!", TokenKind::Bang),
    ("~", TokenKind::Tilde),
    ("~=", TokenKind::TildeAssign),
    ("&", TokenKind::Ampersand),
    ("&=", TokenKind::AmpersandAssign),
    ("|", TokenKind::Pipe),
    ("|=", TokenKind::PipeAssign),
    ("^", TokenKind::Caret),
    ("^=", TokenKind::CaretAssign),
    ("<<", TokenKind::ShiftLeft),
    ("<<=", TokenKind::ShiftLeftAssign),
    (">>", TokenKind::ShiftRight),
    (">>=", TokenKind::ShiftRightAssign),
    ("#", TokenKind::Hash),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    ("->", TokenKind::MapArrow),
    ("=>", TokenKind::MatchArrow),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::BangEqual),
    (">", TokenKind::Greater),
    (">=", TokenKind::GreaterEqual),
    ("<", TokenKind::Less),
    ("<=", TokenKind::LessEqual),
    ("=", TokenKind::Assign),
];

impl TokenKind {
    /// The fixed spelling of this kind, if it has one.
    pub fn text(&self) -> Option<&'static str> {
        FIXED_TOKENS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(text, _)| *text)
    }

    /// Tokens that are a complete value on their own.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Identifier
                | TokenKind::True
                | TokenKind::False
        )
    }

    pub fn is_unary_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Minus | TokenKind::Not | TokenKind::Tilde | TokenKind::Hash
        )
    }

    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Ampersand
                | TokenKind::Pipe
                | TokenKind::Caret
                | TokenKind::ShiftLeft
                | TokenKind::ShiftRight
                | TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::And
                | TokenKind::Or
        )
    }

    /// `:=`, `=` and the ten compound forms.
    pub fn is_assign_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::ColonAssign
                | TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
                | TokenKind::AmpersandAssign
                | TokenKind::PipeAssign
                | TokenKind::CaretAssign
                | TokenKind::ShiftLeftAssign
                | TokenKind::ShiftRightAssign
        )
    }

    pub fn is_open_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen | TokenKind::LeftBrace | TokenKind::LeftBracket
        )
    }

    pub fn is_close_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::RightParen | TokenKind::RightBrace | TokenKind::RightBracket
        )
    }

    pub fn is_type_name(&self) -> bool {
        matches!(
            self,
            TokenKind::U8
                | TokenKind::U16
                | TokenKind::U32
                | TokenKind::U64
                | TokenKind::U128
                | TokenKind::I8
                | TokenKind::I16
                | TokenKind::I32
                | TokenKind::I64
                | TokenKind::I128
                | TokenKind::F32
                | TokenKind::F64
                | TokenKind::Bool
                | TokenKind::Char
                | TokenKind::Str
                | TokenKind::Generic
                | TokenKind::UserDefined
        )
    }

    /// Whether a token of this kind can open an expression.
    pub fn starts_expression(&self) -> bool {
        self.is_value()
            || self.is_unary_operator()
            || matches!(self, TokenKind::LeftParen | TokenKind::If | TokenKind::Mut)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(text) = self.text() {
            return write!(f, "'{}'", text);
        }
        match self {
            TokenKind::Generic => write!(f, "generic type name"),
            TokenKind::UserDefined => write!(f, "type name"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of input"),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_assignments_are_distinct_kinds() {
        let compound = [
            TokenKind::PlusAssign,
            TokenKind::MinusAssign,
            TokenKind::StarAssign,
            TokenKind::SlashAssign,
            TokenKind::PercentAssign,
            TokenKind::AmpersandAssign,
            TokenKind::PipeAssign,
            TokenKind::CaretAssign,
            TokenKind::ShiftLeftAssign,
            TokenKind::ShiftRightAssign,
        ];
        for kind in compound {
            assert!(kind.is_assign_operator());
            assert!(!kind.is_binary_operator());
        }
    }

    #[test]
    fn classifies_shapes() {
        assert!(TokenKind::Identifier.is_value());
        assert!(TokenKind::Tilde.is_unary_operator());
        assert!(TokenKind::Minus.is_unary_operator());
        assert!(TokenKind::Minus.is_binary_operator());
        assert!(TokenKind::And.is_binary_operator());
        assert!(TokenKind::If.starts_expression());
        assert!(!TokenKind::RightBrace.starts_expression());
        assert!(TokenKind::LeftBrace.is_open_bracket());
        assert!(TokenKind::RightBracket.is_close_bracket());
        assert!(TokenKind::Generic.is_type_name());
    }

    #[test]
    fn displays_fixed_spelling() {
        assert_eq!(TokenKind::ShiftLeftAssign.to_string(), "'<<='");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
    }
}
