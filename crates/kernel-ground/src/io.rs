//! `write`, `display`, `newline`, `read`, `eof-object?`, and the port
//! constructors/predicates (spec §6's external interface). The writer
//! itself lives in `kernel-syntax`; `kernel-port` builds the port heap
//! objects; this module is the ground-env surface that calls both.
//!
//! Grounded on `original_source/src/kwrite.c`/`kread.c`'s ground bindings
//! and `original_source/src/kport.c`'s `open-input-file` family.

use std::path::Path;

use kernel_gc::object::PortDirection;
use kernel_gc::{ErrorKind, KResult, ObjId, ObjKind, State, Value};

use crate::util::{bind_applicative, check_arity, list_args};

fn port_id(state: &mut State, v: Value, context: &str) -> KResult<ObjId> {
    match v {
        Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Port(_)) => Ok(id),
        _ => state.throw(ErrorKind::Type, format!("{context}: expected a port")),
    }
}

/// Writes `text` char-by-char to `port`'s backend if given, or to the
/// process's own stdout otherwise — there is no `current-output-port`
/// parameter object in this catalog (Non-goal: no dynamic port
/// parameterization), so "no port argument" always means the console.
fn write_text(state: &mut State, text: &str, port: Option<Value>) -> KResult<()> {
    match port {
        Some(p) => {
            let id = port_id(state, p, "write")?;
            let ObjKind::Port(port_obj) = state.heap.get_mut(id) else { unreachable!("checked in port_id") };
            for c in text.chars() {
                if port_obj.backend.write_char(c).is_err() {
                    return state.throw(ErrorKind::Io, "write: I/O error");
                }
            }
            Ok(())
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn write_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "write")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "write: expected 1 or 2 arguments");
    }
    let text = kernel_syntax::write(state, args[0]);
    write_text(state, &text, args.get(1).copied())?;
    state.apply_cc(Value::Inert);
    Ok(())
}

/// Like `write`, but strings render as their raw characters and
/// characters as themselves rather than in `read`-able `"..."`/`#\x`
/// syntax.
fn display_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "display")?;
    if args.is_empty() || args.len() > 2 {
        return state.throw(ErrorKind::Arity, "display: expected 1 or 2 arguments");
    }
    let text = match args[0] {
        Value::Ref(id) if matches!(state.heap.get(id), ObjKind::String(_)) => {
            let ObjKind::String(s) = state.heap.get(id) else { unreachable!() };
            s.chars.iter().collect::<String>()
        }
        Value::Char(c) => c.to_string(),
        other => kernel_syntax::write(state, other),
    };
    write_text(state, &text, args.get(1).copied())?;
    state.apply_cc(Value::Inert);
    Ok(())
}

fn newline_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "newline")?;
    if args.len() > 1 {
        return state.throw(ErrorKind::Arity, "newline: expected 0 or 1 arguments");
    }
    write_text(state, "\n", args.first().copied())?;
    state.apply_cc(Value::Inert);
    Ok(())
}

/// `(read port)`: reads and returns one datum, or the eof object at end
/// of input. Unlike `write`/`display`, this always requires an explicit
/// port — there's no interactive stdin port object in this catalog.
fn read_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "read")?;
    check_arity(state, &args, "read", 1)?;
    let id = port_id(state, args[0], "read")?;
    let mut text = String::new();
    loop {
        let ObjKind::Port(port_obj) = state.heap.get_mut(id) else { unreachable!("checked in port_id") };
        match port_obj.backend.read_char() {
            Ok(Some(c)) => text.push(c),
            Ok(None) => break,
            Err(_) => return state.throw(ErrorKind::Io, "read: I/O error"),
        }
    }
    let mut reader = kernel_syntax::Reader::new(state, &text, "read");
    match reader.read() {
        Ok(Some(v)) => {
            state.apply_cc(v);
            Ok(())
        }
        Ok(None) => {
            state.apply_cc(Value::Eof);
            Ok(())
        }
        Err(_) => state.throw(ErrorKind::Read, "read: malformed datum"),
    }
}

fn eof_object_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "eof-object?")?;
    check_arity(state, &args, "eof-object?", 1)?;
    state.apply_cc(Value::Bool(matches!(args[0], Value::Eof)));
    Ok(())
}

fn port_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "port?")?;
    check_arity(state, &args, "port?", 1)?;
    let is_port = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Port(_)));
    state.apply_cc(Value::Bool(is_port));
    Ok(())
}

fn input_port_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "input-port?")?;
    check_arity(state, &args, "input-port?", 1)?;
    let is_in = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Port(p) if p.direction == PortDirection::Input));
    state.apply_cc(Value::Bool(is_in));
    Ok(())
}

fn output_port_p(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "output-port?")?;
    check_arity(state, &args, "output-port?", 1)?;
    let is_out = matches!(args[0], Value::Ref(id) if matches!(state.heap.get(id), ObjKind::Port(p) if p.direction == PortDirection::Output));
    state.apply_cc(Value::Bool(is_out));
    Ok(())
}

fn close_port(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "close-port")?;
    check_arity(state, &args, "close-port", 1)?;
    let id = port_id(state, args[0], "close-port")?;
    let ObjKind::Port(p) = state.heap.get_mut(id) else { unreachable!("checked in port_id") };
    let _ = p.backend.close();
    p.open = false;
    state.apply_cc(Value::Inert);
    Ok(())
}

fn string_of(state: &mut State, v: Value, context: &str) -> KResult<String> {
    match v {
        Value::Ref(id) => match state.heap.get(id) {
            ObjKind::String(s) => Ok(s.chars.iter().collect()),
            _ => state.throw(ErrorKind::Type, format!("{context}: expected a string")),
        },
        _ => state.throw(ErrorKind::Type, format!("{context}: expected a string")),
    }
}

fn open_input_file_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "open-input-file")?;
    check_arity(state, &args, "open-input-file", 1)?;
    let path = string_of(state, args[0], "open-input-file")?;
    match kernel_port::open_input_file(state, Path::new(&path)) {
        Ok(v) => {
            state.apply_cc(v);
            Ok(())
        }
        Err(e) => state.throw(ErrorKind::Io, e.to_string()),
    }
}

fn open_output_file_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "open-output-file")?;
    check_arity(state, &args, "open-output-file", 1)?;
    let path = string_of(state, args[0], "open-output-file")?;
    match kernel_port::open_output_file(state, Path::new(&path), false) {
        Ok(v) => {
            state.apply_cc(v);
            Ok(())
        }
        Err(e) => state.throw(ErrorKind::Io, e.to_string()),
    }
}

fn open_input_string_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "open-input-string")?;
    check_arity(state, &args, "open-input-string", 1)?;
    let s = string_of(state, args[0], "open-input-string")?;
    let v = kernel_port::open_input_string(state, &s)?;
    state.apply_cc(v);
    Ok(())
}

fn open_output_string_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "open-output-string")?;
    if !args.is_empty() {
        return state.throw(ErrorKind::Arity, "open-output-string: expected no arguments");
    }
    let v = kernel_port::open_output_string(state)?;
    state.apply_cc(v);
    Ok(())
}

fn get_output_string_fn(state: &mut State, _x: &[Value], obj: Value, _denv: Value) -> KResult<()> {
    let args = list_args(state, obj, "get-output-string")?;
    check_arity(state, &args, "get-output-string", 1)?;
    match kernel_port::get_output_string(state, args[0]) {
        Some(text) => {
            let chars: Vec<char> = text.chars().collect();
            let s = state.alloc(ObjKind::String(kernel_gc::object::StringObj { chars, immutable: false }))?;
            state.apply_cc(s);
            Ok(())
        }
        None => state.throw(ErrorKind::Type, "get-output-string: expected a string output port"),
    }
}

pub fn install(state: &mut State, env: Value) -> KResult<()> {
    bind_applicative(state, env, "write", write_fn)?;
    bind_applicative(state, env, "display", display_fn)?;
    bind_applicative(state, env, "newline", newline_fn)?;
    bind_applicative(state, env, "read", read_fn)?;
    bind_applicative(state, env, "eof-object?", eof_object_p)?;
    bind_applicative(state, env, "port?", port_p)?;
    bind_applicative(state, env, "input-port?", input_port_p)?;
    bind_applicative(state, env, "output-port?", output_port_p)?;
    bind_applicative(state, env, "close-port", close_port)?;
    bind_applicative(state, env, "open-input-file", open_input_file_fn)?;
    bind_applicative(state, env, "open-output-file", open_output_file_fn)?;
    bind_applicative(state, env, "open-input-string", open_input_string_fn)?;
    bind_applicative(state, env, "open-output-string", open_output_string_fn)?;
    bind_applicative(state, env, "get-output-string", get_output_string_fn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), kernel_eval::eval_entry)
    }

    fn ground_env(st: &mut State) -> Value {
        let env = kernel_env::make_environment(st, vec![]).unwrap();
        crate::install(st, env).unwrap();
        env
    }

    fn run_text(st: &mut State, env: Value, text: &str) -> Value {
        let mut reader = kernel_syntax::Reader::new(st, text, "test");
        let form = reader.read().unwrap().expect("one datum");
        kernel_eval::run(st, form, env).unwrap()
    }

    #[test]
    fn write_then_read_round_trips_through_a_string_port() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! out (open-output-string))");
        run_text(&mut st, env, "(write (list 1 2 3) out)");
        let text = run_text(&mut st, env, "(get-output-string out)");
        let ObjKind::String(s) = st.heap.get(text.as_ref_id().unwrap()) else { panic!("expected a string") };
        let written: String = s.chars.iter().collect();
        run_text(&mut st, env, &format!("($define! in (open-input-string {:?}))", written));
        let datum = run_text(&mut st, env, "(read in)");
        let items = st.list_to_vec(datum).unwrap();
        assert_eq!(items, vec![Value::Fixint(1), Value::Fixint(2), Value::Fixint(3)]);
    }

    #[test]
    fn read_past_end_returns_eof() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! in (open-input-string \"\"))");
        let result = run_text(&mut st, env, "(read in)");
        assert_eq!(result, Value::Eof);
        assert_eq!(run_text(&mut st, env, "(eof-object? (read in))"), Value::Bool(true));
    }

    #[test]
    fn port_predicates() {
        let mut st = test_state();
        let env = ground_env(&mut st);
        run_text(&mut st, env, "($define! out (open-output-string))");
        assert_eq!(run_text(&mut st, env, "(port? out)"), Value::Bool(true));
        assert_eq!(run_text(&mut st, env, "(output-port? out)"), Value::Bool(true));
        assert_eq!(run_text(&mut st, env, "(input-port? out)"), Value::Bool(false));
    }
}
