// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Instruction tracing for the instrumented loop.

use ell_parser::{Code, Value};

use crate::assembler::instruction_text;

/// Stack values shown per traced instruction.
const STACK_PREVIEW: usize = 8;

/// Log one instruction about to execute, with the top of the stack.
pub fn instruction(code: &Code, pc: usize, stack: &[Value], depth: usize) {
    let (text, _) = instruction_text(code, pc);
    tracing::trace!(
        target: "ell::trace",
        function = %function_name(code),
        pc,
        depth,
        stack = %stack_preview(stack),
        "{}",
        text
    );
}

/// The name logged for `code`.
pub fn function_name(code: &Code) -> &str {
    if code.name.is_empty() { "<top>" } else { &code.name }
}

fn stack_preview(stack: &[Value]) -> String {
    let shown: Vec<String> = stack
        .iter()
        .take(STACK_PREVIEW)
        .map(|v| v.to_string())
        .collect();
    let mut text = format!("[{}", shown.join(" "));
    if stack.len() > STACK_PREVIEW {
        text.push_str(" ...");
    }
    text.push(']');
    text
}
