// ell-vm - Bytecode compiler and virtual machine for the Ell programming language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Channel primitives.
//!
//! Timeouts are in seconds: `0` polls, a negative value waits forever and a
//! positive value waits at most that long.

use ell_parser::{Channel, ErrorValue, Timeout, Value};

use super::{argument_error, number, wrong_type};

type Result = std::result::Result<Value, ErrorValue>;

/// Largest buffer a channel may have. The buffer is allocated up front.
pub const MAX_BUFSIZE: usize = 1 << 20;

/// `(channel name: "x" bufsize: n)`
pub(super) fn builtin_channel(args: &[Value]) -> Result {
    let name = args[0].to_text();
    let size = number(&args[1]);
    if !(0.0..=MAX_BUFSIZE as f64).contains(&size) || size.fract() != 0.0 {
        return Err(argument_error(format!(
            "channel: bufsize must be an integer from 0 to {}, got {}",
            MAX_BUFSIZE, args[1]
        )));
    }
    Ok(Value::Channel(Channel::new(name, size as usize)))
}

fn timeout(name: &str, value: &Value) -> std::result::Result<Timeout, ErrorValue> {
    match value {
        Value::Number(n) => Ok(Timeout::from_seconds(*n)),
        other => Err(argument_error(format!(
            "{}: timeout must be a number, got {}",
            name, other
        ))),
    }
}

/// `(send ch value [timeout])` returns whether the value was delivered.
pub(super) fn builtin_send(args: &[Value]) -> Result {
    let Value::Channel(ch) = &args[0] else {
        return Err(wrong_type("send", "<channel>", &args[0]));
    };
    let timeout = timeout("send", &args[2])?;
    Ok(Value::Boolean(ch.send(args[1].clone(), timeout)))
}

/// `(receive ch [timeout])` returns null on timeout or a closed channel.
pub(super) fn builtin_receive(args: &[Value]) -> Result {
    let Value::Channel(ch) = &args[0] else {
        return Err(wrong_type("receive", "<channel>", &args[0]));
    };
    let timeout = timeout("receive", &args[1])?;
    Ok(ch.receive(timeout).unwrap_or(Value::Null))
}

pub(super) fn builtin_close(args: &[Value]) -> Result {
    let Value::Channel(ch) = &args[0] else {
        return Err(wrong_type("close", "<channel>", &args[0]));
    };
    ch.close();
    Ok(Value::Null)
}
