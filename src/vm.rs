// File: src/vm.rs
//
// The Environment (operand stack + dictionary + error slot) and the Vm
// embedding facade around it. `Environment::run` is the executor: a
// trampoline loop over `(active block, instruction pointer)` with an
// explicit continuation stack, so that a tail call replaces the active
// block in place instead of growing a native call frame.

use std::rc::Rc;

use crate::bytecode::Operation;
use crate::dictionary::{Dictionary, Lookup, NativeFn};
use crate::errors::{ErrorKind, PebbleError};
use crate::stack::Stack;
use crate::value::{Block, Tag, Value};

/// The stack, dictionary, and error slot a native word sees and a script
/// runs against. One `Environment` belongs to exactly one `Vm`.
pub struct Environment {
    stack: Stack,
    dictionary: Dictionary,
    error: Option<PebbleError>,
}

impl Environment {
    fn new() -> Self {
        Self { stack: Stack::new(), dictionary: Dictionary::new(), error: None }
    }

    pub fn push(&mut self, v: Value) {
        self.stack.push(v);
    }

    pub fn pop_raw(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    pub fn pop_number(&mut self) -> Result<f64, ()> {
        if !self.expect1(Tag::Number) {
            return Err(());
        }
        match self.stack.pop() {
            Some(Value::Number(n)) => Ok(n),
            _ => unreachable!("expect1(Number) guaranteed a numeric top"),
        }
    }

    pub fn pop_string(&mut self) -> Result<Rc<String>, ()> {
        if !self.expect1(Tag::String) {
            return Err(());
        }
        match self.stack.pop() {
            Some(Value::Str(s)) => Ok(s),
            _ => unreachable!("expect1(String) guaranteed a string top"),
        }
    }

    pub fn pop_bool(&mut self) -> Result<bool, ()> {
        if !self.expect1(Tag::Boolean) {
            return Err(());
        }
        match self.stack.pop() {
            Some(Value::Bool(b)) => Ok(b),
            _ => unreachable!("expect1(Boolean) guaranteed a boolean top"),
        }
    }

    pub fn pop_block(&mut self) -> Result<Rc<Block>, ()> {
        if !self.expect1(Tag::Block) {
            return Err(());
        }
        match self.stack.pop() {
            Some(Value::Block(b)) => Ok(b),
            _ => unreachable!("expect1(Block) guaranteed a block top"),
        }
    }

    /// The tag of the top value, or `Any` if the stack is empty. Callers
    /// that need to distinguish "empty" from "any type" should check
    /// `self.len()` first, matching the reference's unguarded `peekType`.
    pub fn peek_type(&self) -> Tag {
        self.stack.top().map(Value::tag).unwrap_or(Tag::Any)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn def(&mut self, name: &str, block: Rc<Block>) {
        self.dictionary.define_block(name, block);
    }

    pub fn def_native(&mut self, name: &str, f: NativeFn) {
        self.dictionary.define_native(name, f);
    }

    /// Signals a runtime error from within a native word. Surfaces as
    /// `ErrorKind::Native` — internal VM checks (stack assertions,
    /// dictionary lookups) raise their own kinds directly via
    /// [`Environment::raise_error`] instead of going through this method.
    pub fn raise(&mut self, msg: impl Into<String>) {
        self.raise_error(PebbleError::new(ErrorKind::Native, msg.into()));
    }

    fn raise_error(&mut self, err: PebbleError) {
        self.error = Some(err);
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// The full structured error from the last failed `run`, if any —
    /// carries the `ErrorKind` a plain message string loses.
    pub fn error_detail(&self) -> Option<&PebbleError> {
        self.error.as_ref()
    }

    pub fn to_string_dump(&self) -> String {
        self.stack.to_display_string()
    }

    /// Depth ≥ 1 and top matches `a`.
    pub fn expect1(&mut self, a: Tag) -> bool {
        if self.stack.len() < 1 {
            self.raise_error(PebbleError::assertion("assertion failed: stack empty".to_string()));
            return false;
        }
        if !self.stack.satisfies1(a) {
            let found = self.stack.top().unwrap().tag();
            self.raise_error(PebbleError::assertion(format!(
                "assertion failed: expected ({}) but found: ({}).",
                a, found
            )));
            return false;
        }
        true
    }

    /// Depth ≥ 2; second-from-top matches `a`, top matches `b`.
    pub fn expect2(&mut self, a: Tag, b: Tag) -> bool {
        if self.stack.len() < 2 {
            self.raise_error(PebbleError::assertion(
                "assertion failed: not enough items on stack".to_string(),
            ));
            return false;
        }
        if !self.stack.satisfies2(a, b) {
            let found_top = self.stack.top().unwrap().tag();
            let found_second = self.stack.second().unwrap().tag();
            self.raise_error(PebbleError::assertion(format!(
                "assertion failed: expected ({}, {}) but found: ({}, {}).",
                b, a, found_top, found_second
            )));
            return false;
        }
        true
    }

    /// Depth ≥ 3; third matches `a`, second matches `b`, top matches `c`.
    pub fn expect3(&mut self, a: Tag, b: Tag, c: Tag) -> bool {
        if self.stack.len() < 3 {
            self.raise_error(PebbleError::assertion(
                "assertion failed: not enough items on stack".to_string(),
            ));
            return false;
        }
        if !self.stack.satisfies3(a, b, c) {
            let found_top = self.stack.top().unwrap().tag();
            let found_second = self.stack.second().unwrap().tag();
            let found_third = self.stack.third().unwrap().tag();
            self.raise_error(PebbleError::assertion(format!(
                "assertion failed: expected ({}, {}, {}) but found: ({}, {}, {}).",
                c, b, a, found_top, found_second, found_third
            )));
            return false;
        }
        true
    }

    pub fn expect_two_equal(&mut self) -> bool {
        if self.stack.len() < 2 {
            self.raise_error(PebbleError::assertion(
                "assertion failed: not enough items on stack".to_string(),
            ));
            return false;
        }
        if !self.stack.top_two_share_tag() {
            self.raise_error(PebbleError::assertion(format!(
                "Expected two equal types but found {} and {}",
                self.stack.top().unwrap().tag(),
                self.stack.second().unwrap().tag()
            )));
            return false;
        }
        true
    }

    pub fn expect_three_equal(&mut self) -> bool {
        if self.stack.len() < 3 {
            self.raise_error(PebbleError::assertion(
                "assertion failed: not enough items on stack".to_string(),
            ));
            return false;
        }
        if !self.stack.top_three_share_tag() {
            self.raise_error(PebbleError::assertion(format!(
                "Expected three equal types but found {}, {} and {}",
                self.stack.top().unwrap().tag(),
                self.stack.second().unwrap().tag(),
                self.stack.third().unwrap().tag()
            )));
            return false;
        }
        true
    }

    /// Runs `block` to completion (or to the first raised error). Returns
    /// `true` on a clean finish, `false` if an error was raised along the
    /// way — the caller should consult [`Environment::error`].
    pub fn run(&mut self, block: &Rc<Block>) -> bool {
        let mut active = Rc::clone(block);
        let mut ip: usize = 0;
        let mut continuations: Vec<(Rc<Block>, usize)> = Vec::new();

        loop {
            if self.error.is_some() {
                return false;
            }

            if ip >= active.ops.len() {
                match continuations.pop() {
                    Some((caller, saved_ip)) => {
                        active = caller;
                        ip = saved_ip;
                        continue;
                    }
                    None => return true,
                }
            }

            let op = active.ops[ip].clone();
            let is_tail = ip + 1 == active.ops.len();
            ip += 1;

            match op {
                Operation::Push(v) => self.stack.push(v),

                Operation::Plus => {
                    if !self.expect2(Tag::Number, Tag::Number) {
                        return false;
                    }
                    self.stack.add_top();
                }

                Operation::Minus => {
                    if !self.expect2(Tag::Number, Tag::Number) {
                        return false;
                    }
                    self.stack.sub_top();
                }

                Operation::Dup => {
                    if !self.expect1(Tag::Any) {
                        return false;
                    }
                    self.stack.dup_top();
                }

                Operation::Swap => {
                    if !self.expect2(Tag::Any, Tag::Any) {
                        return false;
                    }
                    self.stack.swap_top_two();
                }

                Operation::If => {
                    if !self.expect2(Tag::Boolean, Tag::Block) {
                        return false;
                    }
                    let callee = match self.stack.pop().unwrap() {
                        Value::Block(b) => b,
                        _ => unreachable!("expect2(Boolean, Block) guaranteed a block top"),
                    };
                    let cond = matches!(self.stack.pop().unwrap(), Value::Bool(true));
                    if cond {
                        if !is_tail {
                            continuations.push((Rc::clone(&active), ip));
                        }
                        active = callee;
                        ip = 0;
                    }
                }

                Operation::Call { hash, name } => match self.dictionary.lookup(hash) {
                    Lookup::Native(f) => f(self),
                    Lookup::Block(callee) => {
                        if !is_tail {
                            continuations.push((Rc::clone(&active), ip));
                        }
                        active = callee;
                        ip = 0;
                    }
                    Lookup::Miss => {
                        self.raise_error(PebbleError::lookup(&name));
                        return false;
                    }
                },
            }
        }
    }
}

/// The embeddable virtual machine: an [`Environment`] plus the parse step
/// that feeds it.
pub struct Vm {
    env: Environment,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self { env: Environment::new() }
    }

    /// Parses `source` into a fresh root block and runs it against this
    /// VM's persistent environment. Returns the environment on success so
    /// the caller can inspect the resulting stack; on parse or runtime
    /// failure returns `None` and stores the message for [`Vm::get_error`].
    pub fn eval(&mut self, source: &str) -> Option<&mut Environment> {
        self.env.error = None;
        match crate::parser::parse(source) {
            Ok(block) => {
                if self.env.run(&block) {
                    Some(&mut self.env)
                } else {
                    None
                }
            }
            Err(errors) => {
                if let Some(first) = errors.into_iter().next() {
                    self.env.error = Some(first);
                }
                None
            }
        }
    }

    pub fn def_native(&mut self, name: &str, f: NativeFn) {
        self.env.def_native(name, f);
    }

    pub fn get_error(&self) -> &str {
        self.env.error().unwrap_or("")
    }

    /// The full structured error from the last failed [`Vm::eval`], if any —
    /// used by the CLI and REPL to render the correct `ErrorKind` header
    /// instead of assuming every runtime failure is an assertion.
    pub fn get_error_detail(&self) -> Option<&PebbleError> {
        self.env.error_detail()
    }

    pub fn environment(&mut self) -> &mut Environment {
        &mut self.env
    }
}
