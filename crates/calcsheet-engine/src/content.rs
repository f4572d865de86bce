use crate::ast::Expr;
use crate::parser::{ParseError, Parser};

/// The typed value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// A formula keeps both the raw text (for re-editing and save/load
    /// fidelity) and the expression it parsed to
    Formula {
        raw: String,
        expr: Expr,
    },
}

impl Content {
    /// Classify raw user input into content.
    ///
    /// Empty or whitespace-only input is empty; input starting with '='
    /// must parse as a formula; anything that parses as a number is a
    /// number; everything else is text.
    pub fn classify(input: &str) -> Result<Content, ParseError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Ok(Content::Empty);
        }

        if trimmed.starts_with('=') {
            let expr = Parser::new(trimmed).parse()?;
            return Ok(Content::Formula {
                raw: trimmed.to_string(),
                expr,
            });
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            return Ok(Content::Number(n));
        }

        Ok(Content::Text(trimmed.to_string()))
    }

    /// The original, re-editable representation
    pub fn raw_content(&self) -> String {
        match self {
            Content::Empty => String::new(),
            Content::Text(s) => s.clone(),
            Content::Number(n) => format_number(*n),
            Content::Formula { raw, .. } => raw.clone(),
        }
    }

    /// Get the formula expression if this is a formula
    pub fn formula_expr(&self) -> Option<&Expr> {
        match self {
            Content::Formula { expr, .. } => Some(expr),
            _ => None,
        }
    }

    /// Check if this is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, Content::Formula { .. })
    }

    /// Check if this content is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }
}

/// Render a number without unnecessary decimals
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseErrorKind;

    #[test]
    fn test_classify_empty() {
        assert_eq!(Content::classify("").unwrap(), Content::Empty);
        assert_eq!(Content::classify("   ").unwrap(), Content::Empty);
    }

    #[test]
    fn test_classify_number() {
        assert_eq!(Content::classify("42").unwrap(), Content::Number(42.0));
        assert_eq!(Content::classify(" 3.5 ").unwrap(), Content::Number(3.5));
        assert_eq!(Content::classify("-7").unwrap(), Content::Number(-7.0));
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(
            Content::classify("hello").unwrap(),
            Content::Text("hello".to_string())
        );
        assert_eq!(
            Content::classify("12abc").unwrap(),
            Content::Text("12abc".to_string())
        );
    }

    #[test]
    fn test_classify_formula() {
        let content = Content::classify("=A1+1").unwrap();
        assert!(content.is_formula());
        assert_eq!(content.raw_content(), "=A1+1");
    }

    #[test]
    fn test_classify_bad_formula_fails() {
        let err = Content::classify("=A1+").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    }

    #[test]
    fn test_raw_content() {
        assert_eq!(Content::Empty.raw_content(), "");
        assert_eq!(Content::Number(2.5).raw_content(), "2.5");
        assert_eq!(Content::Number(4.0).raw_content(), "4");
        assert_eq!(Content::Text("hi".to_string()).raw_content(), "hi");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(25.0), "25");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
    }
}
