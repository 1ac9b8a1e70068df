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

//! Dynamically typed values exchanged between the host, scripts and signals.

use crate::context::{Coroutine, Outcome, ResumeCx};
use cadence_core::{ContextHandle, ScriptError};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A value living on an execution context's stack or in an environment.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Nil,
    /// A boolean.
    Boolean(bool),
    /// A double precision number. Elapsed-time arguments are numbers.
    Number(f64),
    /// An immutable string.
    String(Rc<str>),
    /// An invocable function.
    Function(Function),
    /// A reference to an execution context.
    Thread(ContextHandle),
    /// An opaque host object, such as a signal.
    Userdata(Rc<dyn Any>),
}

impl Value {
    /// The name of the value's type, as reported in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Thread(_) => "thread",
            Value::Userdata(_) => "userdata",
        }
    }

    /// Returns the number held by this value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string held by this value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the function held by this value, if any.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Downcasts a userdata value to a concrete host type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Userdata(data) => data.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Function(func) => write!(f, "Function({})", func.name()),
            Value::Thread(h) => write!(f, "Thread({h})"),
            Value::Userdata(_) => write!(f, "Userdata"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Function(func) => write!(f, "function: {}", func.name()),
            Value::Thread(h) => write!(f, "{h}"),
            Value::Userdata(data) => write!(f, "userdata: {:p}", Rc::as_ptr(data)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Thread(a), Value::Thread(b)) => a == b,
            (Value::Userdata(a), Value::Userdata(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<ContextHandle> for Value {
    fn from(h: ContextHandle) -> Self {
        Value::Thread(h)
    }
}

type Factory = dyn Fn() -> Box<dyn Coroutine>;

/// A named, cloneable recipe for a coroutine body.
///
/// Starting a function in a context instantiates a fresh body, so the same
/// function can run in any number of contexts at once.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    factory: Rc<Factory>,
}

impl Function {
    /// Creates a function whose body may suspend.
    ///
    /// `factory` is invoked once per start and must return a fresh body.
    pub fn new<F, C>(name: &str, factory: F) -> Self
    where
        F: Fn() -> C + 'static,
        C: Coroutine + 'static,
    {
        Self {
            name: Rc::from(name),
            factory: Rc::new(move || Box::new(factory()) as Box<dyn Coroutine>),
        }
    }

    /// Creates a native function that runs to completion in a single resume.
    pub fn from_fn<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut ResumeCx<'_>, Vec<Value>) -> Result<Vec<Value>, ScriptError> + 'static,
    {
        let f = Rc::new(f);
        Self::new(name, move || NativeBody {
            f: Rc::clone(&f),
            done: false,
        })
    }

    /// The name given at construction, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a fresh body for this function.
    pub fn instantiate(&self) -> Box<dyn Coroutine> {
        (self.factory)()
    }

    /// Runs the function to completion inside the caller's resume.
    ///
    /// A body that tries to suspend is an error: there is no context to park.
    pub fn call(&self, cx: &mut ResumeCx<'_>, args: Vec<Value>) -> Result<Vec<Value>, ScriptError> {
        let mut body = self.instantiate();
        match body.resume(cx, args) {
            Outcome::Return(values) => Ok(values),
            Outcome::Yield => Err(ScriptError::YieldAcrossBoundary),
            Outcome::Error(e) => Err(e),
        }
    }

    /// Returns `true` if both values are the same function object.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.factory, &other.factory)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

struct NativeBody<F> {
    f: Rc<F>,
    done: bool,
}

impl<F> Coroutine for NativeBody<F>
where
    F: Fn(&mut ResumeCx<'_>, Vec<Value>) -> Result<Vec<Value>, ScriptError>,
{
    fn resume(&mut self, cx: &mut ResumeCx<'_>, args: Vec<Value>) -> Outcome {
        if self.done {
            return Outcome::Error(ScriptError::runtime("cannot resume dead coroutine"));
        }
        self.done = true;
        match (self.f)(cx, args) {
            Ok(values) => Outcome::Return(values),
            Err(e) => Outcome::Error(e),
        }
    }
}
