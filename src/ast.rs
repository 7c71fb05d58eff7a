use crate::error::Span;
use crate::value::Value;

/// Deepest expression nesting accepted by the parser and the evaluator.
pub const MAX_DEPTH: usize = 100;

/// Every node owns its children and carries a span covering its whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Value,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Paren {
        expr: Box<Expr>,
        span: Span,
    },
    Assignment {
        kind: AssignKind,
        name: String,
        /// Declared constness; only meaningful for `AssignKind::Declare`.
        constant: bool,
        value: Box<Expr>,
        span: Span,
    },
    Conditional(Conditional),
    Scope(Scope),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. } => span,
            Expr::Identifier { span, .. } => span,
            Expr::Unary { span, .. } => span,
            Expr::Binary { span, .. } => span,
            Expr::Paren { span, .. } => span,
            Expr::Assignment { span, .. } => span,
            Expr::Conditional(conditional) => &conditional.span,
            Expr::Scope(scope) => &scope.span,
        }
    }

    pub fn unary(operator: UnaryOp, operator_span: Span, operand: Expr) -> Self {
        let span = operator_span.to(operand.span());
        Expr::Unary {
            operator,
            operand: Box::new(operand),
            span,
        }
    }

    pub fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Self {
        let span = left.span().to(right.span());
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    pub fn assignment(kind: AssignKind, name: String, name_span: Span, constant: bool, value: Expr) -> Self {
        let span = name_span.to(value.span());
        Expr::Assignment {
            kind,
            name,
            constant,
            value: Box::new(value),
            span,
        }
    }
}

/// An ordered run of expressions. Scopes sequence evaluation; they do not
/// open a new set of bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub exprs: Vec<Expr>,
    pub span: Span,
}

impl Scope {
    /// `empty_at` is used as the span when there are no expressions.
    pub fn new(exprs: Vec<Expr>, empty_at: Span) -> Self {
        let span = if exprs.is_empty() {
            empty_at
        } else {
            let spans: Vec<Span> = exprs.iter().map(|e| *e.span()).collect();
            Span::encompass(&spans)
        };
        Self { exprs, span }
    }

    /// A `{ ... }` block; `span` covers both braces.
    pub fn braced(exprs: Vec<Expr>, span: Span) -> Self {
        Self { exprs, span }
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }
}

/// One rung of an `if` / `elif` / `else` ladder. `else` is a rung whose
/// condition is the literal `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Box<Expr>,
    pub then_branch: Scope,
    pub next: Option<Box<Conditional>>,
    pub span: Span,
}

impl Conditional {
    /// `keyword_span` is the span of the `if`, `elif` or `else` token.
    pub fn new(keyword_span: Span, condition: Expr, then_branch: Scope, next: Option<Conditional>) -> Self {
        let mut spans = vec![keyword_span, *condition.span(), then_branch.span];
        if let Some(ref next) = next {
            spans.push(next.span);
        }
        Self {
            span: Span::encompass(&spans),
            condition: Box::new(condition),
            then_branch,
            next: next.map(Box::new),
        }
    }

    /// The `true` condition is synthesized and borrows the `else` keyword's span.
    pub fn new_else(else_span: Span, then_branch: Scope) -> Self {
        let condition = Expr::Literal {
            value: Value::bool(true, else_span),
            span: else_span,
        };
        Self::new(else_span, condition, then_branch, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    BitNot,
    AddressOf,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "not",
            UnaryOp::BitNot => "~",
            UnaryOp::AddressOf => "#",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    /// `name := value`
    Declare,
    /// `name = value`
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

impl AssignKind {
    /// The binary operator a compound assignment applies.
    pub fn operator(&self) -> Option<BinaryOp> {
        match self {
            AssignKind::Declare | AssignKind::Assign => None,
            AssignKind::Add => Some(BinaryOp::Add),
            AssignKind::Subtract => Some(BinaryOp::Subtract),
            AssignKind::Multiply => Some(BinaryOp::Multiply),
            AssignKind::Divide => Some(BinaryOp::Divide),
            AssignKind::Modulo => Some(BinaryOp::Modulo),
            AssignKind::BitAnd => Some(BinaryOp::BitAnd),
            AssignKind::BitOr => Some(BinaryOp::BitOr),
            AssignKind::BitXor => Some(BinaryOp::BitXor),
            AssignKind::ShiftLeft => Some(BinaryOp::ShiftLeft),
            AssignKind::ShiftRight => Some(BinaryOp::ShiftRight),
        }
    }
}
