// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Splits a source line into tokens and classifies operands.

use crate::error::CompileError;
use cadence_scheduler::Value;

/// A raw token of a source line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// A bare word: keyword, literal, name or argument reference.
    Word(String),
    /// A quoted string with escapes already resolved.
    Str(String),
}

impl Token {
    pub(crate) fn text(&self) -> &str {
        match self {
            Token::Word(text) | Token::Str(text) => text,
        }
    }
}

/// A value position in a statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Literal(Value),
    /// A global looked up at run time.
    Global(String),
    /// `$`: every value of the last resumption.
    AllArgs,
    /// `$n`, 1-based.
    Arg(usize),
}

/// Tokenizes one line. `--` outside a string starts a comment.
pub(crate) fn tokenize(line: usize, text: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => break,
                    },
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(CompileError::UnterminatedString { line });
            }
            tokens.push(Token::Str(value));
            continue;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '"' {
                break;
            }
            word.push(c);
            chars.next();
        }
        if word.starts_with("--") {
            break;
        }
        if let Some(at) = word.find("--") {
            // `wait 1--comment`
            tokens.push(Token::Word(word[..at].to_owned()));
            break;
        }
        tokens.push(Token::Word(word));
    }

    Ok(tokens)
}

/// Returns `true` for a valid global name (letters, digits, `_` and `.`).
pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Classifies a token as an operand.
pub(crate) fn operand(line: usize, token: &Token) -> Result<Operand, CompileError> {
    let text = match token {
        Token::Str(value) => return Ok(Operand::Literal(Value::from(value.as_str()))),
        Token::Word(text) => text.as_str(),
    };
    let malformed = || CompileError::MalformedLiteral {
        line,
        text: text.to_owned(),
    };

    match text {
        "true" => return Ok(Operand::Literal(Value::Boolean(true))),
        "false" => return Ok(Operand::Literal(Value::Boolean(false))),
        "nil" => return Ok(Operand::Literal(Value::Nil)),
        "$" => return Ok(Operand::AllArgs),
        _ => {}
    }

    if let Some(index) = text.strip_prefix('$') {
        return match index.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Operand::Arg(n)),
            _ => Err(malformed()),
        };
    }

    let first = text.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() || first == '-' || first == '+' || first == '.' {
        return text
            .parse::<f64>()
            .map(|n| Operand::Literal(Value::Number(n)))
            .map_err(|_| malformed());
    }

    if is_name(text) {
        Ok(Operand::Global(text.to_owned()))
    } else {
        Err(malformed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_comments() {
        let tokens = tokenize(1, "wait 2 -- two seconds").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Word("wait".into()), Token::Word("2".into())]
        );
        assert!(tokenize(1, "   -- only a comment").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_keeps_dashes_inside_strings() {
        let tokens = tokenize(1, r#"print "a -- b\n""#).unwrap();
        assert_eq!(tokens[1], Token::Str("a -- b\n".into()));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            tokenize(4, r#"print "oops"#),
            Err(CompileError::UnterminatedString { line: 4 })
        );
    }

    #[test]
    fn test_operand_classification() {
        let op = |s: &str| operand(1, &Token::Word(s.into()));
        assert_eq!(op("-1.5"), Ok(Operand::Literal(Value::Number(-1.5))));
        assert_eq!(op("nil"), Ok(Operand::Literal(Value::Nil)));
        assert_eq!(op("$"), Ok(Operand::AllArgs));
        assert_eq!(op("$2"), Ok(Operand::Arg(2)));
        assert_eq!(op("RunService.Heartbeat"), Ok(Operand::Global("RunService.Heartbeat".into())));
        assert!(matches!(op("$0"), Err(CompileError::MalformedLiteral { .. })));
        assert!(matches!(op("1x"), Err(CompileError::MalformedLiteral { .. })));
        assert!(matches!(op("a#b"), Err(CompileError::MalformedLiteral { .. })));
    }
}
