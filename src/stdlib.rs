// File: src/stdlib.rs
//
// Standard library words, installed over the embedding surface exactly as
// a host application would — the VM core has no special knowledge of any
// word defined here.

use crate::value::{Tag, Value};
use crate::vm::{Environment, Vm};

// `dup` and `swap` are not installed here: the parser lowers those two
// words directly to the `Operation::Dup`/`Operation::Swap` fast paths
// (see src/parser.rs), so a Call to either name is never actually
// produced for the dictionary to resolve.

fn word_true(env: &mut Environment) {
    env.push(Value::Bool(true));
}

fn word_false(env: &mut Environment) {
    env.push(Value::Bool(false));
}

fn word_plus(env: &mut Environment) {
    if !env.expect2(Tag::Number, Tag::Number) {
        return;
    }
    let top = env.pop_number().unwrap();
    let second = env.pop_number().unwrap();
    env.push(Value::Number(second + top));
}

fn word_minus(env: &mut Environment) {
    if !env.expect2(Tag::Number, Tag::Number) {
        return;
    }
    let top = env.pop_number().unwrap();
    let second = env.pop_number().unwrap();
    env.push(Value::Number(second - top));
}

fn word_mul(env: &mut Environment) {
    if !env.expect2(Tag::Number, Tag::Number) {
        return;
    }
    let top = env.pop_number().unwrap();
    let second = env.pop_number().unwrap();
    env.push(Value::Number(second * top));
}

fn word_div(env: &mut Environment) {
    if !env.expect2(Tag::Number, Tag::Number) {
        return;
    }
    let top = env.pop_number().unwrap();
    let second = env.pop_number().unwrap();
    env.push(Value::Number(second / top));
}

fn word_print(env: &mut Environment) {
    if !env.expect1(Tag::Any) {
        return;
    }
    let v = env.pop_raw().unwrap();
    print!("{}", v.print_repr());
}

fn word_cr(_env: &mut Environment) {
    println!();
}

fn word_dump(env: &mut Environment) {
    println!("{}", env.to_string_dump());
}

fn word_def(env: &mut Environment) {
    if !env.expect2(Tag::Block, Tag::String) {
        return;
    }
    let name = env.pop_string().unwrap();
    let block = env.pop_block().unwrap();
    env.def(&name, block);
}

fn word_equals(env: &mut Environment) {
    if !env.expect_two_equal() {
        return;
    }
    let top = env.pop_raw().unwrap();
    let second = env.pop_raw().unwrap();
    env.push(Value::Bool(second.equals_with_epsilon(&top)));
}

fn word_if(env: &mut Environment) {
    if !env.expect2(Tag::Boolean, Tag::Block) {
        return;
    }
    let block = env.pop_block().unwrap();
    let cond = env.pop_bool().unwrap();
    if cond {
        env.run(&block);
    }
}

/// Stack order resolved against the worked example in the testable
/// properties (`{ 1 } { 2 } true ifelse` → `[1]`), not a literal
/// left-to-right reading of the stack-effect notation: cond is pushed
/// last and sits on top, the else-block underneath it, the then-block at
/// the bottom.
fn word_ifelse(env: &mut Environment) {
    if !env.expect3(Tag::Block, Tag::Block, Tag::Boolean) {
        return;
    }
    let cond = env.pop_bool().unwrap();
    let else_block = env.pop_block().unwrap();
    let then_block = env.pop_block().unwrap();
    if cond {
        env.run(&then_block);
    } else {
        env.run(&else_block);
    }
}

fn word_repeat(env: &mut Environment) {
    if !env.expect2(Tag::Number, Tag::Block) {
        return;
    }
    let block = env.pop_block().unwrap();
    let n = env.pop_number().unwrap();
    block.bless();
    let mut i = 0;
    while (i as f64) < n {
        if !env.run(&block) {
            return;
        }
        i += 1;
    }
}

/// Installs every standard word onto `vm`. Called by the CLI/REPL before
/// evaluating user scripts; not installed by the VM itself.
pub fn install(vm: &mut Vm) {
    vm.def_native("true", word_true);
    vm.def_native("false", word_false);
    vm.def_native("+", word_plus);
    vm.def_native("-", word_minus);
    vm.def_native("*", word_mul);
    vm.def_native("/", word_div);
    vm.def_native(".", word_print);
    vm.def_native("cr", word_cr);
    vm.def_native("dump", word_dump);
    vm.def_native("def", word_def);
    vm.def_native("=", word_equals);
    vm.def_native("if", word_if);
    vm.def_native("ifelse", word_ifelse);
    vm.def_native("repeat", word_repeat);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifelse_true_branch_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("{ 1 } { 2 } true ifelse").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn ifelse_false_branch_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("{ 1 } { 2 } false ifelse").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn repeat_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        vm.environment().push(Value::Number(0.0));
        let env = vm.eval("5 { 1 + } repeat").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn def_then_call_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("{ 1 2 + } 'plus3' def plus3").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 3.0));
        let env = vm.eval("plus3").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn equals_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("1 2 =").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Bool(b)) if !b));
        let env = vm.eval("1 1 =").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Bool(b)) if b));
    }

    #[test]
    fn dup_string_scenario() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("'hello ''world''' dup").unwrap();
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn division_by_zero_yields_infinity_not_an_error() {
        let mut vm = Vm::new();
        install(&mut vm);
        let env = vm.eval("1 0 /").unwrap();
        assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n.is_infinite()));
    }
}
