use crate::environment::Environment;
use crate::error::LoopError;
use crate::evaluator::Evaluator;
use crate::lexer;
use crate::parser::Parser;
use crate::token::TokenKind;
use crate::value::Value;

/// How the host renders diagnostics.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Name shown in reports; `None` for interactive input.
    pub filename: Option<String>,
    /// Plain context window instead of a colored report.
    pub plain_errors: bool,
}

impl RunOptions {
    pub fn report(&self, error: &LoopError, source: &str) {
        if self.plain_errors {
            eprint!("{}", error.context(source));
        } else {
            error.report(source, self.filename.as_deref());
        }
    }
}

/// Lexes, parses and evaluates `source` against `environment`.
pub fn evaluate_in(source: &str, environment: &mut Environment) -> Result<Option<Value>, LoopError> {
    let (tokens, error) = lexer::tokenize(source);
    if let Some(error) = error {
        log::debug!("lexing stopped after {} tokens", tokens.len());
        return Err(error);
    }

    let program = Parser::new(tokens).parse()?;
    Evaluator::new(environment).evaluate_program(&program)
}

/// Evaluates `source` in a fresh environment.
pub fn evaluate(source: &str) -> Result<Option<Value>, LoopError> {
    evaluate_in(source, &mut Environment::new())
}

/// Runs a whole source and reports any error before returning it.
pub fn run(source: &str, options: &RunOptions) -> Result<Option<Value>, LoopError> {
    let result = evaluate(source);
    if let Err(ref error) = result {
        options.report(error, source);
    }
    result
}

/// Numbered token listing. A lex error ends the listing and is returned
/// alongside the tokens scanned before it.
pub fn dump_tokens(source: &str) -> (String, Option<LoopError>) {
    let (tokens, error) = lexer::tokenize(source);
    let mut out = String::new();

    for (i, token) in tokens.iter().enumerate() {
        let line = match token.kind {
            TokenKind::Eof => "EOF".to_string(),
            TokenKind::Newline => "NEWLINE".to_string(),
            kind => format!("{:?} ('{}') at {}", kind, token.lexeme, token.span),
        };
        out.push_str(&format!("{}: {}\n", i + 1, line));
    }

    (out, error)
}
