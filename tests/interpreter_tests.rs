// Integration tests for the Pebble virtual machine.
//
// These run complete scripts through a fresh `Vm` with the standard
// library installed and check the resulting stack, mirroring the
// concrete scenarios in the specification.

use pebble::value::Value;
use pebble::vm::Vm;

fn new_vm() -> Vm {
    let mut vm = Vm::new();
    pebble::stdlib::install(&mut vm);
    vm
}

fn number_stack(vm: &mut Vm, source: &str) -> Vec<f64> {
    let env = vm.eval(source).expect("script should evaluate successfully");
    let mut values = Vec::new();
    while let Some(Value::Number(n)) = env.pop_raw() {
        values.push(n);
    }
    values.reverse();
    values
}

#[test]
fn addition() {
    let mut vm = new_vm();
    assert_eq!(number_stack(&mut vm, "1 2 +"), vec![3.0]);
}

#[test]
fn subtraction_is_second_minus_top() {
    let mut vm = new_vm();
    assert_eq!(number_stack(&mut vm, "3 4 -"), vec![-1.0]);
}

#[test]
fn string_dup_with_quote_escape() {
    let mut vm = new_vm();
    let env = vm.eval("'hello ''world''' dup").unwrap();
    assert_eq!(env.len(), 2);
}

#[test]
fn def_then_call_runs_and_reruns() {
    let mut vm = new_vm();
    assert_eq!(number_stack(&mut vm, "{ 1 2 + } 'plus3' def plus3"), vec![3.0]);
    assert_eq!(number_stack(&mut vm, "plus3 plus3"), vec![3.0, 3.0]);
}

#[test]
fn repeat_runs_block_n_times() {
    let mut vm = new_vm();
    vm.environment().push(Value::Number(0.0));
    assert_eq!(number_stack(&mut vm, "5 { 1 + } repeat"), vec![5.0]);
}

#[test]
fn equality_uses_epsilon_for_numbers() {
    let mut vm = new_vm();
    let env = vm.eval("1 2 =").unwrap();
    assert!(matches!(env.pop_raw(), Some(Value::Bool(false))));

    let env = vm.eval("1 1 =").unwrap();
    assert!(matches!(env.pop_raw(), Some(Value::Bool(true))));
}

#[test]
fn ifelse_picks_the_branch_matching_cond() {
    let mut vm = new_vm();
    assert_eq!(number_stack(&mut vm, "{ 1 } { 2 } true ifelse"), vec![1.0]);
    assert_eq!(number_stack(&mut vm, "{ 1 } { 2 } false ifelse"), vec![2.0]);
}

#[test]
fn unterminated_block_is_a_parse_failure() {
    let mut vm = new_vm();
    assert!(vm.eval("{").is_none());
    assert!(vm.get_error().contains("Unterminated block"));
}

#[test]
fn undefined_word_is_a_runtime_failure() {
    let mut vm = new_vm();
    assert!(vm.eval("bogus").is_none());
    assert!(vm.get_error().contains("Failed to look up"));
}

#[test]
fn parse_run_round_trip_is_deterministic() {
    let source = "1 2 + 3 *";
    let mut vm_a = new_vm();
    let mut vm_b = new_vm();
    assert_eq!(number_stack(&mut vm_a, source), number_stack(&mut vm_b, source));
}

#[test]
fn failed_assertion_leaves_the_stack_untouched() {
    let mut vm = new_vm();
    vm.environment().push(Value::Str(std::rc::Rc::new("x".to_string())));
    vm.environment().push(Value::Number(1.0));
    let before = vm.environment().len();
    assert!(vm.eval("+").is_none());
    assert_eq!(vm.environment().len(), before);
}

#[test]
fn self_recursive_definition_counts_down_to_zero() {
    // `x false =` is this test's stand-in for boolean negation (the
    // language has no dedicated `not` word): comparing against `false`
    // flips the operand, since equality on booleans is symmetric.
    let mut vm = new_vm();
    let source = "\
        { 1 - dup 0 = { } if dup 0 = false = { countdown } if } 'countdown' def";
    vm.eval(source).expect("definition should install cleanly");

    vm.environment().push(Value::Number(30.0));
    let env = vm.eval("countdown").expect("recursive countdown should terminate");
    assert!(matches!(env.pop_raw(), Some(Value::Number(n)) if n == 0.0));
}
