//! Arithmetic calculator tool.
//!
//! Expressions are parsed with a small recursive-descent parser over a fixed
//! token set. Nothing outside the grammar is ever evaluated:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('**' unary)?
//! primary := NUMBER | '(' expr ')'
//! ```
//!
//! `**` binds tighter than unary minus and is right-associative, so `-2**2`
//! is `-4` and `2**3**2` is `512`. `%` takes the sign of the divisor.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{Tool, parameters_schema_for};

const MAX_EXPRESSION_LEN: usize = 1024;
const MAX_DEPTH: usize = 64;

/// Reasons an expression is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum CalcError {
    /// The expression is empty.
    #[error("empty expression")]
    Empty,
    /// The expression exceeds the length limit.
    #[error("expression is longer than {MAX_EXPRESSION_LEN} characters")]
    TooLong,
    /// A character outside the arithmetic grammar.
    #[error("unsupported character '{ch}' at position {pos}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset in the expression.
        pos: usize,
    },
    /// A malformed numeric literal.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    /// A token in a position the grammar does not allow.
    #[error("unexpected {0}")]
    UnexpectedToken(String),
    /// Input ended in the middle of an expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// Parentheses nested too deeply.
    #[error("expression nested deeper than {MAX_DEPTH} levels")]
    TooDeep,
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// The result overflowed or is not a real number.
    #[error("result is not a finite number")]
    NonFinite,
}

impl From<CalcError> for ToolError {
    fn from(err: CalcError) -> Self {
        Self::Execution(format!("Error: {err}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
}

impl Token {
    fn describe(self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Plus => "'+'".to_owned(),
            Self::Minus => "'-'".to_owned(),
            Self::Star => "'*'".to_owned(),
            Self::Slash => "'/'".to_owned(),
            Self::Percent => "'%'".to_owned(),
            Self::Pow => "'**'".to_owned(),
            Self::LParen => "'('".to_owned(),
            Self::RParen => "')'".to_owned(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let start = pos;
                let mut end = pos;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let cleaned = literal.replace('_', "");
                if literal.starts_with('_') || literal.ends_with('_') || cleaned.matches('.').count() > 1 {
                    return Err(CalcError::InvalidNumber(literal.to_owned()));
                }
                let value = cleaned
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.to_owned()))?;
                tokens.push(Token::Number(value));
            }
            '+' | '-' | '/' | '%' | '(' | ')' => {
                chars.next();
                tokens.push(match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            '*' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, c)| c == '*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            other => return Err(CalcError::UnexpectedChar { ch: other, pos }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                Token::Slash => value / rhs,
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.enter()?;
                let value = -self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.enter()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.pos += 1;
            self.enter()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            if base == 0.0 && exponent < 0.0 {
                return Err(CalcError::DivisionByZero);
            }
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.enter()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(CalcError::UnexpectedToken(other.describe())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.describe())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn format_number(value: f64) -> String {
    // Whole numbers print without a fractional part, like integer arithmetic would.
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        whole.to_string()
    } else {
        value.to_string()
    }
}

/// Evaluates an arithmetic expression and returns the result as text.
///
/// # Errors
///
/// Returns a [`CalcError`] for anything outside the arithmetic grammar,
/// division by zero, and non-finite results.
pub fn evaluate(expression: &str) -> Result<String, CalcError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }

    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(extra) = parser.peek() {
        return Err(CalcError::UnexpectedToken(extra.describe()));
    }
    if !value.is_finite() {
        return Err(CalcError::NonFinite);
    }

    // Avoid printing "-0".
    Ok(format_number(if value == 0.0 { 0.0 } else { value }))
}

/// Arguments for [`CalculatorTool`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CalculateArgs {
    /// A mathematical expression such as `200*7` or `5000/2*10`.
    #[serde(alias = "operation")]
    pub expression: String,
}

/// Tool that evaluates arithmetic expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    /// Create a new calculator tool.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    const NAME: &'static str = "calculate";
    type Args = CalculateArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        "Useful to perform any mathematical calculations, like sum, minus, multiplication, \
         division, etc. The input to this tool should be a mathematical expression, a couple \
         examples are `200*7` or `5000/2*10`."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema_for::<CalculateArgs>()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(evaluate(&args.expression)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod evaluate {
        use super::*;

        #[test]
        fn basic_arithmetic() {
            assert_eq!(evaluate("2+2").unwrap(), "4");
            assert_eq!(evaluate("200*7").unwrap(), "1400");
            assert_eq!(evaluate("5000/2*10").unwrap(), "25000");
            assert_eq!(evaluate("10/4").unwrap(), "2.5");
            assert_eq!(evaluate(" 7 - 10 ").unwrap(), "-3");
        }

        #[test]
        fn precedence_and_parentheses() {
            assert_eq!(evaluate("2+3*4").unwrap(), "14");
            assert_eq!(evaluate("(2+3)*4").unwrap(), "20");
            assert_eq!(evaluate("((1))").unwrap(), "1");
        }

        #[test]
        fn power_is_right_associative_and_binds_tighter_than_unary() {
            assert_eq!(evaluate("2**3**2").unwrap(), "512");
            assert_eq!(evaluate("-2**2").unwrap(), "-4");
            assert_eq!(evaluate("2**-1").unwrap(), "0.5");
        }

        #[test]
        fn modulo_follows_divisor_sign() {
            assert_eq!(evaluate("7%3").unwrap(), "1");
            assert_eq!(evaluate("-7%3").unwrap(), "2");
            assert_eq!(evaluate("7%-3").unwrap(), "-2");
        }

        #[test]
        fn decimals_and_separators() {
            assert_eq!(evaluate("1.5*2").unwrap(), "3");
            assert_eq!(evaluate(".5+.25").unwrap(), "0.75");
            assert_eq!(evaluate("1_000*3").unwrap(), "3000");
        }

        #[test]
        fn zero_is_unsigned() {
            assert_eq!(evaluate("-0").unwrap(), "0");
        }
    }

    mod rejects {
        use super::*;

        #[test]
        fn division_by_zero() {
            assert_eq!(evaluate("10/0"), Err(CalcError::DivisionByZero));
            assert_eq!(evaluate("10%0"), Err(CalcError::DivisionByZero));
            assert_eq!(evaluate("0**-1"), Err(CalcError::DivisionByZero));
        }

        #[test]
        fn code_is_never_evaluated() {
            assert!(matches!(
                evaluate("__import__('os')"),
                Err(CalcError::UnexpectedChar { ch: '_', pos: 0 })
            ));
            assert!(matches!(
                evaluate("abs(-1)"),
                Err(CalcError::UnexpectedChar { ch: 'a', .. })
            ));
            assert!(evaluate("2; 3").is_err());
        }

        #[test]
        fn malformed_expressions() {
            assert_eq!(evaluate(""), Err(CalcError::Empty));
            assert_eq!(evaluate("   "), Err(CalcError::Empty));
            assert_eq!(evaluate("2+"), Err(CalcError::UnexpectedEnd));
            assert_eq!(evaluate("(2+3"), Err(CalcError::UnexpectedEnd));
            assert!(matches!(evaluate("2 3"), Err(CalcError::UnexpectedToken(_))));
            assert!(matches!(evaluate(")"), Err(CalcError::UnexpectedToken(_))));
            assert!(matches!(evaluate("1.2.3"), Err(CalcError::InvalidNumber(_))));
            assert!(matches!(evaluate("2***3"), Err(CalcError::UnexpectedToken(_))));
        }

        #[test]
        fn limits() {
            assert_eq!(evaluate("10**400"), Err(CalcError::NonFinite));
            assert_eq!(evaluate(&"1+".repeat(600)), Err(CalcError::TooLong));
            let nested = format!("{}1{}", "(".repeat(100), ")".repeat(100));
            assert_eq!(evaluate(&nested), Err(CalcError::TooDeep));
        }
    }

    mod tool {
        use super::*;

        #[tokio::test]
        async fn call_json_returns_text() {
            let value = Tool::call_json(&CalculatorTool, serde_json::json!({"expression": "2+2"}))
                .await
                .unwrap();
            assert_eq!(value, Value::String("4".into()));
        }

        #[tokio::test]
        async fn failures_are_execution_errors() {
            let err = Tool::call_json(
                &CalculatorTool,
                serde_json::json!({"expression": "__import__('os')"}),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ToolError::Execution(_)));

            let err = Tool::call_json(&CalculatorTool, serde_json::json!({"expression": "10/0"}))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("division by zero"));
        }

        #[tokio::test]
        async fn accepts_operation_alias() {
            let value = Tool::call_json(&CalculatorTool, serde_json::json!({"operation": "3*3"}))
                .await
                .unwrap();
            assert_eq!(value, Value::String("9".into()));
        }

        #[test]
        fn definition_names_expression_parameter() {
            let def = Tool::definition(&CalculatorTool);
            assert_eq!(def.name, "calculate");
            assert!(def.parameters["properties"]["expression"].is_object());
        }
    }
}
