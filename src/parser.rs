use crate::ast::{AssignKind, BinaryOp, Conditional, Expr, Scope, UnaryOp, MAX_DEPTH};
use crate::error::{BufferId, LoopError, Span};
use crate::lexer;
use crate::token::{Token, TokenKind};
use crate::value::{Kind, Value};

/// Tokenizes and parses a whole program.
pub fn parse(source: &str) -> Result<Scope, LoopError> {
    let (tokens, error) = lexer::tokenize(source);
    if let Some(error) = error {
        return Err(error);
    }
    Parser::new(tokens).parse()
}

/// Binding power of infix operators; higher binds tighter.
fn binary_operator(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    let entry = match kind {
        TokenKind::EqualEqual => (BinaryOp::Equal, 1),
        TokenKind::BangEqual => (BinaryOp::NotEqual, 1),
        TokenKind::Greater => (BinaryOp::Greater, 1),
        TokenKind::GreaterEqual => (BinaryOp::GreaterEqual, 1),
        TokenKind::Less => (BinaryOp::Less, 1),
        TokenKind::LessEqual => (BinaryOp::LessEqual, 1),
        TokenKind::And => (BinaryOp::And, 1),
        TokenKind::Or => (BinaryOp::Or, 1),
        TokenKind::Plus => (BinaryOp::Add, 3),
        TokenKind::Minus => (BinaryOp::Subtract, 3),
        TokenKind::Star => (BinaryOp::Multiply, 4),
        TokenKind::Slash => (BinaryOp::Divide, 4),
        TokenKind::Percent => (BinaryOp::Modulo, 4),
        TokenKind::Ampersand => (BinaryOp::BitAnd, 5),
        TokenKind::Pipe => (BinaryOp::BitOr, 5),
        TokenKind::Caret => (BinaryOp::BitXor, 5),
        TokenKind::ShiftLeft => (BinaryOp::ShiftLeft, 6),
        TokenKind::ShiftRight => (BinaryOp::ShiftRight, 6),
        _ => return None,
    };
    Some(entry)
}

fn unary_operator(kind: TokenKind) -> Option<(UnaryOp, u8)> {
    match kind {
        TokenKind::Not => Some((UnaryOp::Not, 1)),
        TokenKind::Minus => Some((UnaryOp::Negate, 3)),
        TokenKind::Hash => Some((UnaryOp::AddressOf, 3)),
        TokenKind::Tilde => Some((UnaryOp::BitNot, 5)),
        _ => None,
    }
}

fn assign_kind(kind: TokenKind) -> Option<AssignKind> {
    match kind {
        TokenKind::ColonAssign => Some(AssignKind::Declare),
        TokenKind::Assign => Some(AssignKind::Assign),
        TokenKind::PlusAssign => Some(AssignKind::Add),
        TokenKind::MinusAssign => Some(AssignKind::Subtract),
        TokenKind::StarAssign => Some(AssignKind::Multiply),
        TokenKind::SlashAssign => Some(AssignKind::Divide),
        TokenKind::PercentAssign => Some(AssignKind::Modulo),
        TokenKind::AmpersandAssign => Some(AssignKind::BitAnd),
        TokenKind::PipeAssign => Some(AssignKind::BitOr),
        TokenKind::CaretAssign => Some(AssignKind::BitXor),
        TokenKind::ShiftLeftAssign => Some(AssignKind::ShiftLeft),
        TokenKind::ShiftRightAssign => Some(AssignKind::ShiftRight),
        _ => None,
    }
}

/// Kind selected by a type keyword written directly after a number.
fn literal_suffix(kind: TokenKind) -> Option<Kind> {
    match kind {
        TokenKind::I8 => Some(Kind::I8),
        TokenKind::I16 => Some(Kind::I16),
        TokenKind::I32 => Some(Kind::I32),
        TokenKind::I64 => Some(Kind::I64),
        TokenKind::U8 => Some(Kind::U8),
        TokenKind::U16 => Some(Kind::U16),
        TokenKind::U32 => Some(Kind::U32),
        TokenKind::U64 => Some(Kind::U64),
        TokenKind::F32 => Some(Kind::F32),
        TokenKind::F64 => Some(Kind::F64),
        _ => None,
    }
}

fn too_deep(span: Span) -> LoopError {
    LoopError::parse_error(
        span,
        format!("expression too deep: nesting exceeds {} levels", MAX_DEPTH),
    )
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Accepts any token sequence; a missing trailing EOF is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let eof_span = match tokens.last() {
                Some(last) => Span::empty(last.span.buffer, last.span.end()),
                None => Span::empty(BufferId::default(), 0),
            };
            tokens.push(Token::new(TokenKind::Eof, String::new(), eof_span));
        }

        Self {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses a whole program: one scope followed by end of input.
    pub fn parse(&mut self) -> Result<Scope, LoopError> {
        let program = self.parse_scope()?;
        self.skip_newlines();

        if !self.is_at_end() {
            let token = self.peek();
            return Err(LoopError::parse_error(
                token.span,
                format!("unexpected token '{}'", token.lexeme),
            ));
        }

        log::debug!("parsed {} top-level expressions", program.len());
        Ok(program)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, LoopError> {
        self.parse_with_precedence(0)
    }

    /// Parses expressions and nested `{ }` blocks until a token that can
    /// start neither. That token is left for the caller.
    pub fn parse_scope(&mut self) -> Result<Scope, LoopError> {
        self.skip_newlines();
        let empty_at = Span::empty(self.peek().span.buffer, self.peek().span.start);
        let mut exprs = Vec::new();

        loop {
            self.skip_newlines();
            let token = self.peek();
            if token.kind == TokenKind::LeftBrace {
                let open = token.span;
                let block = self.nested(open, |parser| {
                    parser.parse_braced_scope("to open a block")
                })?;
                exprs.push(Expr::Scope(block));
            } else if token.kind.starts_expression() {
                exprs.push(self.parse_expression()?);
            } else {
                break;
            }
        }

        Ok(Scope::new(exprs, empty_at))
    }

    fn parse_with_precedence(&mut self, min_precedence: u8) -> Result<Expr, LoopError> {
        let mut left = self.parse_atom()?;
        // Each operator folded in here wraps `left` one level deeper.
        let mut chain = 0;

        // A newline is not an operator, so it ends the expression here.
        while let Some((operator, precedence)) = binary_operator(self.peek().kind) {
            if precedence < min_precedence {
                break;
            }
            let operator_span = self.advance().span;
            chain += 1;
            if self.depth + chain > MAX_DEPTH {
                return Err(too_deep(operator_span));
            }
            let right = self.nested(operator_span, |parser| parser.parse_with_precedence(precedence + 1))?;
            left = Expr::binary(left, operator, right);
        }

        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Expr, LoopError> {
        self.skip_newlines();
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Eof => Err(LoopError::parse_error(
                self.error_span(),
                "unexpected end of input: expected expression".to_string(),
            )),
            TokenKind::Identifier if self.peek_next().kind.is_assign_operator() => {
                self.nested(token.span, |parser| parser.parse_assignment())
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::Mut => self.nested(token.span, |parser| parser.parse_mutable_declaration()),
            TokenKind::Number => self.parse_number(),
            TokenKind::String => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::string(token.lexeme, token.span),
                    span: token.span,
                })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::bool(token.kind == TokenKind::True, token.span),
                    span: token.span,
                })
            }
            TokenKind::LeftParen => self.nested(token.span, |parser| {
                parser.advance();
                let expr = parser.parse_expression()?;
                let close = parser
                    .consume_with_help(
                        TokenKind::RightParen,
                        "expected ')' after expression",
                        "Every '(' needs a matching ')'.".to_string(),
                    )?
                    .span;
                Ok(Expr::Paren {
                    expr: Box::new(expr),
                    span: token.span.to(&close),
                })
            }),
            TokenKind::If => self.nested(token.span, |parser| {
                parser.parse_if().map(Expr::Conditional)
            }),
            kind => match unary_operator(kind) {
                Some((operator, precedence)) => self.nested(token.span, |parser| {
                    parser.advance();
                    let operand = parser.parse_with_precedence(precedence + 1)?;
                    Ok(Expr::unary(operator, token.span, operand))
                }),
                None => Err(LoopError::parse_error(
                    token.span,
                    format!("expected expression, found {}", kind),
                )),
            },
        }
    }

    /// `name <op> value` for `:=`, `=` and the compound operators.
    fn parse_assignment(&mut self) -> Result<Expr, LoopError> {
        let name = self.advance().clone();
        let operator = self.advance().kind;
        let kind = match assign_kind(operator) {
            Some(kind) => kind,
            None => {
                return Err(LoopError::parse_error(
                    self.previous().span,
                    format!("expected assignment operator, found {}", operator),
                ))
            }
        };

        let value = self.parse_expression()?;
        let constant = kind == AssignKind::Declare;
        Ok(Expr::assignment(kind, name.lexeme, name.span, constant, value))
    }

    /// `mut name := value`
    fn parse_mutable_declaration(&mut self) -> Result<Expr, LoopError> {
        let keyword = self.advance().span;
        let name = self
            .consume_with_help(
                TokenKind::Identifier,
                "expected variable name after 'mut'",
                "Mutable bindings are declared as 'mut name := value'.".to_string(),
            )?
            .clone();
        self.consume_with_help(
            TokenKind::ColonAssign,
            "expected ':=' after variable name",
            "Mutable bindings are declared as 'mut name := value'.".to_string(),
        )?;

        let value = self.parse_expression()?;
        Ok(Expr::assignment(AssignKind::Declare, name.lexeme, keyword, false, value))
    }

    fn parse_number(&mut self) -> Result<Expr, LoopError> {
        let number = self.advance().clone();
        let mut span = number.span;
        let mut suffix = None;

        let next = self.peek();
        if next.kind.is_type_name() && next.span.start == number.span.end() {
            let next = next.clone();
            match literal_suffix(next.kind) {
                Some(kind) => {
                    self.advance();
                    span = number.span.to(&next.span);
                    suffix = Some(kind);
                }
                None => {
                    return Err(LoopError::parse_error_with_help(
                        next.span,
                        format!("unsupported literal suffix '{}'", next.lexeme),
                        "Numeric literals accept i8 to i64, u8 to u64, f32 and f64.".to_string(),
                    ))
                }
            }
        }

        let value = Value::from_number_literal(&number.lexeme, suffix, span)?;
        Ok(Expr::Literal { value, span })
    }

    /// Parses an `if` or `elif` rung and everything chained after it.
    fn parse_if(&mut self) -> Result<Conditional, LoopError> {
        let keyword = self.advance().span;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_braced_scope("after the condition")?;

        let next = if self.next_branch_is(TokenKind::Elif) {
            let elif = self.peek().span;
            Some(self.nested(elif, |parser| parser.parse_if())?)
        } else if self.next_branch_is(TokenKind::Else) {
            let else_span = self.advance().span;
            let else_branch = self.nested(else_span, |parser| parser.parse_braced_scope("after 'else'"))?;
            Some(Conditional::new_else(else_span, else_branch))
        } else {
            None
        };

        Ok(Conditional::new(keyword, condition, then_branch, next))
    }

    fn parse_braced_scope(&mut self, context: &str) -> Result<Scope, LoopError> {
        let open = self
            .consume_with_help(
                TokenKind::LeftBrace,
                &format!("expected '{{' {}", context),
                "Blocks are written as '{ ... }'.".to_string(),
            )?
            .span;
        let inner = self.parse_scope()?;
        let close = self
            .consume_with_help(
                TokenKind::RightBrace,
                "expected '}' to close block",
                "Every '{' needs a matching '}'.".to_string(),
            )?
            .span;
        Ok(Scope::braced(inner.exprs, open.to(&close)))
    }

    /// Moves to `kind` when it is the next token past any newlines;
    /// otherwise leaves the position untouched.
    fn next_branch_is(&mut self, kind: TokenKind) -> bool {
        let mut index = self.current;
        while self.tokens[index].kind == TokenKind::Newline {
            index += 1;
        }
        if self.tokens[index].kind == kind {
            self.current = index;
            true
        } else {
            false
        }
    }

    fn nested<T>(
        &mut self,
        span: Span,
        f: impl FnOnce(&mut Self) -> Result<T, LoopError>,
    ) -> Result<T, LoopError> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep(span));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// The current token, or at end of input the last real token.
    fn error_span(&self) -> Span {
        if !self.is_at_end() {
            return self.peek().span;
        }
        self.tokens[..self.current]
            .iter()
            .rev()
            .find(|t| t.kind != TokenKind::Newline)
            .map(|t| t.span)
            .unwrap_or(self.peek().span)
    }

    fn consume_with_help(&mut self, kind: TokenKind, message: &str, help: String) -> Result<&Token, LoopError> {
        self.skip_newlines();
        if self.check(kind) {
            return Ok(self.advance());
        }

        let found = self.peek().kind;
        let message = if found == TokenKind::Eof {
            format!("unexpected end of input: {}", message)
        } else {
            format!("{}, found {}", message, found)
        };
        Err(LoopError::parse_error_with_help(self.error_span(), message, help))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn program(source: &str) -> Scope {
        parse(source).unwrap_or_else(|e| panic!("'{}' failed to parse: {}", source, e))
    }

    fn single(source: &str) -> Expr {
        let mut scope = program(source);
        assert_eq!(scope.len(), 1, "expected one expression in '{}'", source);
        scope.exprs.remove(0)
    }

    fn error(source: &str) -> LoopError {
        match parse(source) {
            Ok(scope) => panic!("'{}' parsed unexpectedly: {:?}", source, scope),
            Err(e) => e,
        }
    }

    fn nested(open: &str, core: &str, close: &str, depth: usize) -> String {
        format!("{}{}{}", open.repeat(depth), core, close.repeat(depth))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        match single("1 + 2 * 3") {
            Expr::Binary {
                operator: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Binary {
                    operator: BinaryOp::Multiply,
                    ..
                }
            )),
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        match single("8 - 4 - 2") {
            Expr::Binary { left, .. } => assert!(matches!(
                *left,
                Expr::Binary {
                    operator: BinaryOp::Subtract,
                    ..
                }
            )),
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn unary_operand_binding() {
        // `-` takes a multiplicative operand; `not` stops before `==`.
        assert!(matches!(
            single("-2 * 3"),
            Expr::Unary {
                operator: UnaryOp::Negate,
                ..
            }
        ));
        assert!(matches!(
            single("not a == b"),
            Expr::Binary {
                operator: BinaryOp::Equal,
                ..
            }
        ));
    }

    #[test]
    fn spans_slice_back_to_source() {
        let source = "total := (1 + 2) * -y";
        let expr = single(source);
        assert_eq!(expr.span().slice(source), source);

        let Expr::Assignment { value, .. } = &expr else {
            panic!("expected assignment");
        };
        assert_eq!(value.span().slice(source), "(1 + 2) * -y");
        let Expr::Binary { left, right, .. } = value.as_ref() else {
            panic!("expected binary");
        };
        assert_eq!(left.span().slice(source), "(1 + 2)");
        assert_eq!(right.span().slice(source), "-y");
        let Expr::Paren { expr: inner, .. } = left.as_ref() else {
            panic!("expected paren");
        };
        assert_eq!(inner.span().slice(source), "1 + 2");
    }

    #[test]
    fn conditional_spans_cover_the_ladder() {
        let source = "if a { 1 } elif b { 2 } else { 3 }";
        let Expr::Conditional(conditional) = single(source) else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.span.slice(source), source);
        assert_eq!(conditional.then_branch.span.slice(source), "{ 1 }");

        let elif = conditional.next.as_ref().unwrap();
        assert_eq!(elif.span.slice(source), "elif b { 2 } else { 3 }");
        let otherwise = elif.next.as_ref().unwrap();
        assert_eq!(otherwise.span.slice(source), "else { 3 }");
        assert!(otherwise.next.is_none());
        assert!(matches!(*otherwise.condition, Expr::Literal { .. }));
    }

    #[test]
    fn ladder_may_continue_on_the_next_line() {
        let scope = program("if a {\n 1\n}\nelse {\n 2\n}\nc");
        assert_eq!(scope.len(), 2);
        let Expr::Conditional(conditional) = &scope.exprs[0] else {
            panic!("expected conditional");
        };
        assert!(conditional.next.is_some());
    }

    #[test]
    fn newlines_separate_expressions() {
        assert_eq!(program("a := 1\nb := 2\n\n").len(), 2);
        assert_eq!(program("1 +\n  2").len(), 1);
        assert_eq!(program("").len(), 0);
    }

    #[test]
    fn nested_blocks_are_scopes() {
        let source = "{ a := 1 { b } }";
        let Expr::Scope(outer) = single(source) else {
            panic!("expected scope");
        };
        assert_eq!(outer.span.slice(source), source);
        assert_eq!(outer.len(), 2);
        assert!(matches!(outer.exprs[1], Expr::Scope(_)));
    }

    #[test]
    fn declarations_record_constness() {
        assert!(matches!(
            single("x := 1"),
            Expr::Assignment {
                kind: AssignKind::Declare,
                constant: true,
                ..
            }
        ));
        let source = "mut x := 1";
        let expr = single(source);
        assert!(matches!(
            expr,
            Expr::Assignment {
                kind: AssignKind::Declare,
                constant: false,
                ..
            }
        ));
        assert_eq!(expr.span().slice(source), source);
        assert!(matches!(
            single("x >>= 2"),
            Expr::Assignment {
                kind: AssignKind::ShiftRight,
                ..
            }
        ));
    }

    #[test]
    fn typed_literals() {
        let source = "200u8";
        let Expr::Literal { value, span } = single(source) else {
            panic!("expected literal");
        };
        assert_eq!(value.kind(), Kind::U8);
        assert_eq!(span.slice(source), "200u8");

        assert!(error("1.5u8").message.contains("cannot have type u8"));
        assert!(error("1i128").message.starts_with("unsupported literal suffix"));
        assert!(error("5 i32").message.starts_with("unexpected token"));
    }

    #[test]
    fn errors_at_end_point_at_last_token() {
        let source = "(1 + 2";
        let err = error(source);
        assert!(err.message.starts_with("unexpected end of input"));
        assert_eq!(err.span.slice(source), "2");

        let err = error("x := ");
        assert!(err.message.starts_with("unexpected end of input"));
    }

    #[test]
    fn missing_tokens() {
        assert!(error("if true 1").message.starts_with("expected '{'"));
        assert!(error("if true { 1").message.contains("expected '}'"));
        assert!(error("mut := 3").message.starts_with("expected variable name"));
        assert!(error("1 + *").message.starts_with("expected expression"));
        assert_eq!(error("+ 1").message, "unexpected token '+'");
        assert_eq!(error("1 )").message, "unexpected token ')'");
    }

    #[test]
    fn nesting_limit() {
        assert!(parse(&nested("(", "1", ")", 100)).is_ok());
        assert!(error(&nested("(", "1", ")", 101)).message.starts_with("expression too deep"));
        assert!(parse(&nested("not ", "true", "", 100)).is_ok());
        assert!(error(&nested("~", "1", "", 101)).message.starts_with("expression too deep"));
        assert!(error(&nested("{", "1", "}", 101)).message.starts_with("expression too deep"));
    }

    #[test]
    fn binary_chains_count_toward_the_nesting_limit() {
        assert!(parse(&vec!["1"; 101].join(" + ")).is_ok());
        let err = error(&vec!["1"; 102].join(" + "));
        assert!(err.message.starts_with("expression too deep"));
        assert_eq!(err.kind, ErrorKind::ParseError);

        // Parentheses and the chain share one budget.
        let inside = format!("{}{}{}", "(".repeat(60), vec!["1"; 45].join(" * "), ")".repeat(60));
        assert!(error(&inside).message.starts_with("expression too deep"));
    }

    #[test]
    fn very_long_sums_are_rejected_without_building_them() {
        let source = vec!["1"; 200_000].join(" + ");
        let err = error(&source);
        assert!(err.message.starts_with("expression too deep"));
        assert_eq!(err.span.slice(&source), "+");
    }

    #[test]
    fn else_takes_a_synthesized_true_condition() {
        let source = "if a { 1 } else { 2 }";
        let Expr::Conditional(conditional) = single(source) else {
            panic!("expected conditional");
        };
        let otherwise = conditional.next.as_ref().unwrap();
        let Expr::Literal { value, span } = otherwise.condition.as_ref() else {
            panic!("expected literal condition");
        };
        assert_eq!(value.as_bool(), Some(true));
        assert_eq!(span.slice(source), "else");
    }

    #[test]
    fn accepts_pre_tokenized_input_without_eof() {
        let (mut tokens, _) = lexer::tokenize("1 + 2");
        tokens.pop();
        let mut parser = Parser::new(tokens);
        let expr = parser.parse_expression().unwrap();
        assert!(matches!(expr, Expr::Binary { .. }));
    }
}
