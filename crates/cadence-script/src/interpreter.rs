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

//! Executes a compiled [`Program`] as a resumable coroutine.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::ScriptError;
use cadence_scheduler::{Coroutine, Function, Outcome, ResumeCx, Value};
use cadence_signal::Signal;

use crate::compiler::{Program, Stmt};
use crate::lexer::Operand;

/// Lines written by `print`, shared between a loader and everything it compiled.
#[derive(Debug, Clone, Default)]
pub struct Output {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Output {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line.
    pub fn push(&self, line: String) {
        self.lines.borrow_mut().push(line);
    }

    /// A copy of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Removes and returns every line written so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

struct LoopFrame {
    /// Index of the first body statement.
    start: usize,
    /// Iterations left, `None` for `loop`.
    remaining: Option<u64>,
}

/// One running instance of a program.
pub struct Interpreter {
    program: Rc<Program>,
    output: Output,
    pc: usize,
    loops: Vec<LoopFrame>,
    /// Values of the most recent resumption, read through `$` and `$n`.
    args: Vec<Value>,
}

impl Interpreter {
    /// Creates an instance positioned at the first statement.
    pub fn new(program: Rc<Program>, output: Output) -> Self {
        Self {
            program,
            output,
            pc: 0,
            loops: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Wraps `program` into a function whose every call starts a fresh instance.
    pub fn function(program: Program, output: Output) -> Function {
        let name = program.label.clone();
        let program = Rc::new(program);
        Function::new(&name, move || {
            Interpreter::new(Rc::clone(&program), output.clone())
        })
    }

    fn fail(&self, line: usize, message: impl std::fmt::Display) -> Outcome {
        Outcome::Error(ScriptError::runtime(format!(
            "{}:{}: {}",
            self.program.label, line, message
        )))
    }

    fn eval(&self, cx: &ResumeCx<'_>, operand: &Operand) -> Value {
        match operand {
            Operand::Literal(value) => value.clone(),
            Operand::Global(name) => cx.global(name).unwrap_or_default(),
            Operand::AllArgs => self.args.first().cloned().unwrap_or_default(),
            Operand::Arg(n) => self.args.get(n - 1).cloned().unwrap_or_default(),
        }
    }

    fn eval_all(&self, cx: &ResumeCx<'_>, operands: &[Operand]) -> Vec<Value> {
        let mut values = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand {
                Operand::AllArgs => values.extend(self.args.iter().cloned()),
                other => values.push(self.eval(cx, other)),
            }
        }
        values
    }

    fn eval_function(&self, cx: &ResumeCx<'_>, operand: &Operand) -> Result<Function, String> {
        match self.eval(cx, operand) {
            Value::Function(function) => Ok(function),
            other => Err(format!("attempt to call a {} value", other.type_name())),
        }
    }

    fn eval_signal(&self, cx: &ResumeCx<'_>, operand: &Operand) -> Result<Signal, String> {
        let value = self.eval(cx, operand);
        Signal::from_value(&value).ok_or_else(|| format!("{} is not a signal", value.type_name()))
    }

    fn eval_number(&self, cx: &ResumeCx<'_>, operand: &Operand) -> Result<f64, String> {
        let value = self.eval(cx, operand);
        value
            .as_number()
            .ok_or_else(|| format!("number expected, got {}", value.type_name()))
    }

    /// Runs statements until one suspends, returns or fails.
    fn run(&mut self, cx: &mut ResumeCx<'_>) -> Outcome {
        let program = Rc::clone(&self.program);
        loop {
            let Some((line, stmt)) = program.stmts.get(self.pc) else {
                return Outcome::Return(Vec::new());
            };
            let line = *line;
            self.pc += 1;

            match stmt {
                Stmt::Print(operands) => {
                    let text = self
                        .eval_all(cx, operands)
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    log::info!("[{}] {}", program.label, text);
                    self.output.push(text);
                }
                Stmt::Wait(seconds) => {
                    let seconds = match seconds {
                        Some(operand) => match self.eval_number(cx, operand) {
                            Ok(seconds) => seconds,
                            Err(message) => return self.fail(line, message),
                        },
                        None => 0.0,
                    };
                    cx.wait(seconds);
                    return Outcome::Yield;
                }
                Stmt::Yield => return Outcome::Yield,
                Stmt::Await(operand) => match self.eval_signal(cx, operand) {
                    Ok(signal) => return signal.wait(cx),
                    Err(message) => return self.fail(line, message),
                },
                Stmt::Fire(operand, operands) => {
                    let signal = match self.eval_signal(cx, operand) {
                        Ok(signal) => signal,
                        Err(message) => return self.fail(line, message),
                    };
                    let args = self.eval_all(cx, operands);
                    signal.fire(cx.scheduler(), &args);
                }
                Stmt::Call(operand, operands) => {
                    let function = match self.eval_function(cx, operand) {
                        Ok(function) => function,
                        Err(message) => return self.fail(line, message),
                    };
                    let args = self.eval_all(cx, operands);
                    if let Err(err) = function.call(cx, args) {
                        return self.fail(line, err);
                    }
                }
                Stmt::Spawn(operand, operands) => {
                    let function = match self.eval_function(cx, operand) {
                        Ok(function) => function,
                        Err(message) => return self.fail(line, message),
                    };
                    let args = self.eval_all(cx, operands);
                    cx.spawn(function, args);
                }
                Stmt::Delay(seconds, operand, operands) => {
                    let seconds = match self.eval_number(cx, seconds) {
                        Ok(seconds) => seconds,
                        Err(message) => return self.fail(line, message),
                    };
                    let function = match self.eval_function(cx, operand) {
                        Ok(function) => function,
                        Err(message) => return self.fail(line, message),
                    };
                    let args = self.eval_all(cx, operands);
                    cx.delay(seconds, function, args);
                }
                Stmt::Set(name, operand) => {
                    let value = self.eval(cx, operand);
                    cx.set_global(name.as_str(), value);
                }
                Stmt::Connect {
                    signal,
                    callback,
                    once,
                } => {
                    let signal = match self.eval_signal(cx, signal) {
                        Ok(signal) => signal,
                        Err(message) => return self.fail(line, message),
                    };
                    let callback = self.eval(cx, callback);
                    let connected = if *once {
                        signal.once(cx.scheduler(), callback)
                    } else {
                        signal.connect(cx.scheduler(), callback)
                    };
                    if let Err(err) = connected {
                        return self.fail(line, err);
                    }
                }
                Stmt::Repeat { count, end } => {
                    let count = match self.eval_number(cx, count) {
                        Ok(count) => count,
                        Err(message) => return self.fail(line, message),
                    };
                    let count = if count.is_finite() { count.max(0.0).floor() as u64 } else { 0 };
                    if count == 0 {
                        self.pc = end + 1;
                    } else {
                        self.loops.push(LoopFrame {
                            start: self.pc,
                            remaining: Some(count),
                        });
                    }
                }
                Stmt::Loop => self.loops.push(LoopFrame {
                    start: self.pc,
                    remaining: None,
                }),
                Stmt::End => {
                    let Some(frame) = self.loops.last_mut() else {
                        return self.fail(line, "`end` outside of a block");
                    };
                    match frame.remaining {
                        None => self.pc = frame.start,
                        Some(left) if left > 1 => {
                            frame.remaining = Some(left - 1);
                            self.pc = frame.start;
                        }
                        Some(_) => {
                            self.loops.pop();
                        }
                    }
                }
                Stmt::Error(operands) => {
                    let message = self
                        .eval_all(cx, operands)
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(" ");
                    return self.fail(line, message);
                }
                Stmt::Return(operands) => return Outcome::Return(self.eval_all(cx, operands)),
            }
        }
    }
}

impl Coroutine for Interpreter {
    fn resume(&mut self, cx: &mut ResumeCx<'_>, args: Vec<Value>) -> Outcome {
        self.args = args;
        self.run(cx)
    }
}
