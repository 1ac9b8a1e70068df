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

//! Turns source text into a flat list of statements with resolved jump targets.

use crate::error::CompileError;
use crate::lexer::{self, Operand, Token};
use cadence_scheduler::Value;

/// One compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Print(Vec<Operand>),
    Wait(Option<Operand>),
    Yield,
    Await(Operand),
    Fire(Operand, Vec<Operand>),
    Call(Operand, Vec<Operand>),
    Spawn(Operand, Vec<Operand>),
    Delay(Operand, Operand, Vec<Operand>),
    Set(String, Operand),
    Connect { signal: Operand, callback: Operand, once: bool },
    /// Runs the body `count` times; `end` is the index of the closing statement.
    Repeat { count: Operand, end: usize },
    Loop,
    End,
    Error(Vec<Operand>),
    Return(Vec<Operand>),
}

impl Stmt {
    fn suspends(&self) -> bool {
        matches!(self, Stmt::Wait(_) | Stmt::Yield | Stmt::Await(_))
    }
}

/// A compiled script: statements paired with their source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub(crate) label: String,
    pub(crate) stmts: Vec<(usize, Stmt)>,
}

impl Program {
    /// The chunk name the program was compiled under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of executable statements.
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// Returns `true` for a source with no statements.
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

struct OpenBlock {
    line: usize,
    index: usize,
    is_loop: bool,
    /// Set when the body is guaranteed to run at least once per entry.
    always_runs: bool,
    yields: bool,
}

/// A `loop` always runs its body; a `repeat` only with a literal count of at least one.
fn always_runs(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Loop => true,
        Stmt::Repeat {
            count: Operand::Literal(Value::Number(n)),
            ..
        } => *n >= 1.0 && n.is_finite(),
        _ => false,
    }
}

/// Compiles `source` into a [`Program`].
pub fn compile(label: &str, source: &str) -> Result<Program, CompileError> {
    let mut stmts: Vec<(usize, Stmt)> = Vec::new();
    let mut blocks: Vec<OpenBlock> = Vec::new();

    for (offset, text) in source.lines().enumerate() {
        let line = offset + 1;
        let tokens = lexer::tokenize(line, text)?;
        let Some((head, rest)) = tokens.split_first() else {
            continue;
        };
        let keyword = match head {
            Token::Word(word) => word.as_str(),
            Token::Str(text) => {
                return Err(CompileError::UnknownStatement {
                    line,
                    word: format!("\"{text}\""),
                })
            }
        };

        let stmt = parse_statement(line, keyword, rest)?;
        let index = stmts.len();
        match &stmt {
            Stmt::Repeat { .. } | Stmt::Loop => blocks.push(OpenBlock {
                line,
                index,
                is_loop: matches!(stmt, Stmt::Loop),
                always_runs: always_runs(&stmt),
                yields: false,
            }),
            Stmt::End => {
                let block = blocks
                    .pop()
                    .ok_or(CompileError::UnbalancedEnd { line })?;
                if block.is_loop && !block.yields {
                    return Err(CompileError::LoopNeverYields { line: block.line });
                }
                // A body that may be skipped cannot vouch for the enclosing block.
                if block.always_runs {
                    if let Some(parent) = blocks.last_mut() {
                        parent.yields |= block.yields;
                    }
                }
                if let (_, Stmt::Repeat { end, .. }) = &mut stmts[block.index] {
                    *end = index;
                }
            }
            other if other.suspends() => {
                if let Some(block) = blocks.last_mut() {
                    block.yields = true;
                }
            }
            _ => {}
        }
        stmts.push((line, stmt));
    }

    if let Some(block) = blocks.pop() {
        return Err(CompileError::UnclosedBlock { line: block.line });
    }

    log::trace!("Compiled '{}' into {} statements", label, stmts.len());
    Ok(Program {
        label: label.to_owned(),
        stmts,
    })
}

/// Operand cursor over the tokens following a keyword.
struct Operands<'a> {
    line: usize,
    statement: &'static str,
    tokens: &'a [Token],
}

impl<'a> Operands<'a> {
    fn required(&mut self, expected: &'static str) -> Result<Operand, CompileError> {
        let (first, rest) = self.tokens.split_first().ok_or(CompileError::MissingOperand {
            line: self.line,
            statement: self.statement,
            expected,
        })?;
        self.tokens = rest;
        lexer::operand(self.line, first)
    }

    fn optional(&mut self) -> Result<Option<Operand>, CompileError> {
        match self.tokens.split_first() {
            Some((first, rest)) => {
                self.tokens = rest;
                lexer::operand(self.line, first).map(Some)
            }
            None => Ok(None),
        }
    }

    fn name(&mut self, expected: &'static str) -> Result<String, CompileError> {
        let (first, rest) = self.tokens.split_first().ok_or(CompileError::MissingOperand {
            line: self.line,
            statement: self.statement,
            expected,
        })?;
        self.tokens = rest;
        match first {
            Token::Word(word) if lexer::is_name(word) => Ok(word.clone()),
            other => Err(CompileError::MalformedLiteral {
                line: self.line,
                text: other.text().to_owned(),
            }),
        }
    }

    fn rest(&mut self) -> Result<Vec<Operand>, CompileError> {
        let line = self.line;
        let operands = self
            .tokens
            .iter()
            .map(|token| lexer::operand(line, token))
            .collect();
        self.tokens = &[];
        operands
    }

    fn finish(&self) -> Result<(), CompileError> {
        match self.tokens.first() {
            Some(extra) => Err(CompileError::UnexpectedOperand {
                line: self.line,
                statement: self.statement,
                text: extra.text().to_owned(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_statement(line: usize, keyword: &str, rest: &[Token]) -> Result<Stmt, CompileError> {
    let statement: &'static str = match keyword {
        "print" => "print",
        "wait" => "wait",
        "yield" => "yield",
        "await" => "await",
        "fire" => "fire",
        "call" => "call",
        "spawn" => "spawn",
        "delay" => "delay",
        "set" => "set",
        "connect" => "connect",
        "once" => "once",
        "repeat" => "repeat",
        "loop" => "loop",
        "end" => "end",
        "error" => "error",
        "return" => "return",
        _ => {
            return Err(CompileError::UnknownStatement {
                line,
                word: keyword.to_owned(),
            })
        }
    };
    let mut ops = Operands {
        line,
        statement,
        tokens: rest,
    };

    let stmt = match statement {
        "print" => Stmt::Print(ops.rest()?),
        "wait" => Stmt::Wait(ops.optional()?),
        "yield" => Stmt::Yield,
        "await" => Stmt::Await(ops.required("a signal")?),
        "fire" => {
            let signal = ops.required("a signal")?;
            Stmt::Fire(signal, ops.rest()?)
        }
        "call" => {
            let function = ops.required("a function")?;
            Stmt::Call(function, ops.rest()?)
        }
        "spawn" => {
            let function = ops.required("a function")?;
            Stmt::Spawn(function, ops.rest()?)
        }
        "delay" => {
            let seconds = ops.required("a duration and a function")?;
            let function = ops.required("a function after the duration")?;
            Stmt::Delay(seconds, function, ops.rest()?)
        }
        "set" => {
            let name = ops.name("a name and a value")?;
            Stmt::Set(name, ops.required("a value after the name")?)
        }
        "connect" | "once" => {
            let signal = ops.required("a signal and a function")?;
            let callback = ops.required("a function after the signal")?;
            Stmt::Connect {
                signal,
                callback,
                once: statement == "once",
            }
        }
        "repeat" => Stmt::Repeat {
            count: ops.required("a count")?,
            end: 0,
        },
        "loop" => Stmt::Loop,
        "end" => Stmt::End,
        "error" => Stmt::Error(ops.rest()?),
        _ => Stmt::Return(ops.rest()?),
    };
    ops.finish()?;
    Ok(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_and_comments_are_skipped() {
        let program = compile("t", "\n-- header\nprint \"hi\"\n\n").unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program.stmts[0].0, 3);
    }

    #[test]
    fn test_repeat_records_its_end() {
        let program = compile("t", "repeat 3\n  print $1\nend\nreturn").unwrap();
        assert_eq!(
            program.stmts[0].1,
            Stmt::Repeat {
                count: Operand::Literal(Value::Number(3.0)),
                end: 2
            }
        );
    }

    #[test]
    fn test_nested_yield_satisfies_outer_loop() {
        let source = "loop\n  repeat 2\n    wait 1\n  end\nend";
        assert!(compile("t", source).is_ok());
    }

    #[test]
    fn test_yield_in_a_skippable_repeat_does_not_satisfy_loop() {
        for count in ["0", "-2", "$1", "limit", "0.5"] {
            let source = format!("loop\n  repeat {count}\n    wait\n  end\nend");
            assert_eq!(
                compile("t", &source).unwrap_err(),
                CompileError::LoopNeverYields { line: 1 },
                "repeat {count}"
            );
        }
    }

    #[test]
    fn test_yield_after_a_skippable_repeat_satisfies_loop() {
        let source = "loop\n  repeat $1\n    print 1\n  end\n  yield\nend";
        assert!(compile("t", source).is_ok());
    }

    #[test]
    fn test_nested_loop_vouches_for_the_outer_loop() {
        let source = "loop\n  repeat 1\n    loop\n      await Ping\n    end\n  end\nend";
        assert!(compile("t", source).is_ok());
    }

    #[test]
    fn test_loop_without_yield_is_rejected() {
        let err = compile("t", "print 1\nloop\n  print 2\nend").unwrap_err();
        assert_eq!(err, CompileError::LoopNeverYields { line: 2 });
    }

    #[test]
    fn test_block_errors() {
        assert_eq!(
            compile("t", "end").unwrap_err(),
            CompileError::UnbalancedEnd { line: 1 }
        );
        assert_eq!(
            compile("t", "wait\nrepeat 2\nwait").unwrap_err(),
            CompileError::UnclosedBlock { line: 2 }
        );
    }

    #[test]
    fn test_operand_errors() {
        assert!(matches!(
            compile("t", "await").unwrap_err(),
            CompileError::MissingOperand { line: 1, statement: "await", .. }
        ));
        assert!(matches!(
            compile("t", "yield now").unwrap_err(),
            CompileError::UnexpectedOperand { statement: "yield", .. }
        ));
        assert!(matches!(
            compile("t", "set 5 1").unwrap_err(),
            CompileError::MalformedLiteral { .. }
        ));
        assert_eq!(
            compile("t", "jump 3").unwrap_err(),
            CompileError::UnknownStatement {
                line: 1,
                word: "jump".into()
            }
        );
    }
}
