// File: src/parser.rs
//
// Single-pass lexer/parser: walks the source one character at a time,
// tracking the currently-open block and word/string accumulators, and
// emits operations directly into the block stack. There is no separate
// token stream — block nesting makes a two-pass lex-then-parse awkward
// for no benefit here, so both happen in the same sweep, as in the
// reference implementation.

use std::rc::Rc;

use crate::bytecode::Operation;
use crate::dictionary::hash_word;
use crate::errors::PebbleError;
use crate::value::{Block, Value};

struct Parser<'a> {
    source: &'a [u8],
    index: usize,
    within_string: bool,
    current_string: String,
    current_word: String,
    levels: Vec<Vec<Operation>>,
    errors: Vec<PebbleError>,
}

/// Parses `source` into a root [`Block`]. On success the block is ready to
/// hand to the VM; on failure returns every error collected during the walk.
pub fn parse(source: &str) -> Result<Rc<Block>, Vec<PebbleError>> {
    let mut parser = Parser {
        source: source.as_bytes(),
        index: 0,
        within_string: false,
        current_string: String::new(),
        current_word: String::new(),
        levels: vec![Vec::new()],
        errors: Vec::new(),
    };
    parser.run();

    if !parser.errors.is_empty() {
        return Err(parser.errors);
    }

    if parser.levels.len() > 1 {
        return Err(vec![PebbleError::parse(
            "Unterminated block".to_string(),
            parser.index,
        )]);
    }

    let ops = parser.levels.pop().unwrap_or_default();
    Ok(Rc::new(Block::new(ops)))
}

impl<'a> Parser<'a> {
    fn peek(&self) -> u8 {
        self.source.get(self.index).copied().unwrap_or(0)
    }

    fn next(&mut self) -> u8 {
        let c = self.peek();
        if self.index < self.source.len() {
            self.index += 1;
        }
        c
    }

    fn push_error(&mut self, msg: &str) {
        self.errors.push(PebbleError::parse(msg.to_string(), self.index));
    }

    fn top_level_mut(&mut self) -> &mut Vec<Operation> {
        self.levels.last_mut().expect("root level always present")
    }

    fn end_string(&mut self) {
        let s = std::mem::take(&mut self.current_string);
        self.top_level_mut().push(Operation::Push(Value::Str(Rc::new(s))));
    }

    fn end_word(&mut self) {
        let word = std::mem::take(&mut self.current_word);
        let op = match word.as_str() {
            "-" => Operation::Minus,
            "+" => Operation::Plus,
            "dup" => Operation::Dup,
            "swap" => Operation::Swap,
            _ if is_numeric(&word) => Operation::Push(Value::Number(string_to_f64(&word))),
            _ => Operation::Call { hash: hash_word(&word), name: Rc::from(word.as_str()) },
        };
        self.top_level_mut().push(op);
    }

    fn begin_block(&mut self) {
        self.levels.push(Vec::new());
    }

    fn end_block(&mut self) -> bool {
        if self.levels.len() <= 1 {
            return false;
        }
        let ops = self.levels.pop().unwrap();
        let block = Rc::new(Block::new(ops));
        self.top_level_mut().push(Operation::Push(Value::Block(block)));
        true
    }

    fn run(&mut self) {
        let mut comment_mode = false;

        while self.index < self.source.len() {
            let c = self.next();

            if c == b'#' {
                comment_mode = true;
            }
            if c == b'\n' || c == b'\r' {
                comment_mode = false;
            }
            if comment_mode {
                continue;
            }

            match c {
                b'\t' | b' ' | b'\n' | b'\r' => {
                    if self.within_string {
                        self.current_string.push(c as char);
                    } else if !self.current_word.is_empty() {
                        self.end_word();
                    }
                }
                b'\'' => {
                    if self.within_string && self.peek() == b'\'' {
                        self.current_string.push(self.next() as char);
                        continue;
                    }

                    if !self.current_word.is_empty() {
                        self.push_error("' not allowed in word name.");
                        continue;
                    }

                    self.within_string = !self.within_string;
                    if self.within_string {
                        self.current_string.clear();
                    } else {
                        self.end_string();
                    }
                }
                b'{' => {
                    if !self.within_string {
                        if !self.current_word.is_empty() {
                            self.push_error("{ not allowed in word name");
                        } else {
                            self.begin_block();
                        }
                    } else {
                        self.current_string.push('{');
                    }
                }
                b'}' => {
                    if !self.within_string {
                        if !self.current_word.is_empty() {
                            self.end_word();
                        }
                        if !self.end_block() {
                            self.push_error("Attempted to end a block that hasn't started.");
                        }
                    } else {
                        self.current_string.push('}');
                    }
                }
                _ => {
                    if self.within_string {
                        self.current_string.push(c as char);
                    } else {
                        self.current_word.push(c as char);
                    }
                }
            }

            if !self.errors.is_empty() {
                return;
            }
        }

        if !self.current_word.is_empty() {
            self.end_word();
        }
    }
}

/// A word is numeric iff non-empty, every character is a digit or `.`, and
/// at least one digit is present.
pub fn is_numeric(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let mut has_digits = false;
    for c in s.chars() {
        if c.is_ascii_digit() {
            has_digits = true;
        } else if c != '.' {
            return false;
        }
    }
    has_digits
}

fn string_to_f64(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_predicate_matches_spec_examples() {
        assert!(!is_numeric(""));
        assert!(!is_numeric("."));
        assert!(!is_numeric("-1"));
        assert!(is_numeric("1.2.3"));
        assert!(is_numeric("42"));
    }

    #[test]
    fn malformed_numeric_conversion_falls_back_to_zero() {
        assert_eq!(string_to_f64("1.2.3"), 0.0);
    }

    #[test]
    fn addition_source_parses_to_two_pushes_and_plus() {
        let block = parse("1 2 +").unwrap();
        assert_eq!(block.ops.len(), 3);
        assert!(matches!(block.ops[2], Operation::Plus));
    }

    #[test]
    fn string_escape_unescapes_doubled_quote() {
        let block = parse("'hello ''world'''").unwrap();
        match &block.ops[0] {
            Operation::Push(Value::Str(s)) => assert_eq!(s.as_str(), "hello 'world'"),
            other => panic!("expected a pushed string, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let result = parse("{");
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("Unterminated block")));
    }

    #[test]
    fn stray_close_brace_is_an_error() {
        let result = parse("}");
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("hasn't started")));
    }

    #[test]
    fn nested_block_becomes_a_push_of_block() {
        let block = parse("{ 1 }").unwrap();
        assert_eq!(block.ops.len(), 1);
        assert!(matches!(&block.ops[0], Operation::Push(Value::Block(_))));
    }
}
