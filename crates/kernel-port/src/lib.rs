//! Port backends (spec §6's external interface): file, string, and
//! bytevector I/O behind `kernel-gc::object::PortBackend`. This crate only
//! builds the `Port` heap object; `kernel-ground`'s `open-input-file` and
//! friends are the combiners that call into it.

pub mod bytevector_port;
pub mod error;
pub mod file;
pub mod string_port;

use std::path::Path;

use kernel_gc::object::{Port, PortDirection, PortKind};
use kernel_gc::{KResult, ObjKind, State, Value};

use crate::bytevector_port::{BytevectorInputPort, BytevectorOutputPort};
use crate::error::PortError;
use crate::file::FilePort;
use crate::string_port::{StringInputPort, StringOutputPort};

fn make_port(state: &mut State, direction: PortDirection, kind: PortKind, backend: Box<dyn kernel_gc::object::PortBackend>) -> KResult<Value> {
    state.alloc(ObjKind::Port(Port { direction, kind, open: true, name: None, backend }))
}

pub fn open_input_file(state: &mut State, path: &Path) -> Result<Value, PortError> {
    let backend = FilePort::open_read(path)?;
    Ok(make_port(state, PortDirection::Input, PortKind::Textual, Box::new(backend))?)
}

pub fn open_output_file(state: &mut State, path: &Path, append: bool) -> Result<Value, PortError> {
    let backend = FilePort::open_write(path, append)?;
    Ok(make_port(state, PortDirection::Output, PortKind::Textual, Box::new(backend))?)
}

pub fn open_input_string(state: &mut State, s: &str) -> KResult<Value> {
    make_port(state, PortDirection::Input, PortKind::Textual, Box::new(StringInputPort::new(s)))
}

pub fn open_output_string(state: &mut State) -> KResult<Value> {
    make_port(state, PortDirection::Output, PortKind::Textual, Box::new(StringOutputPort::default()))
}

pub fn open_input_bytevector(state: &mut State, bytes: Vec<u8>) -> KResult<Value> {
    make_port(state, PortDirection::Input, PortKind::Binary, Box::new(BytevectorInputPort::new(bytes)))
}

pub fn open_output_bytevector(state: &mut State) -> KResult<Value> {
    make_port(state, PortDirection::Output, PortKind::Binary, Box::new(BytevectorOutputPort::default()))
}

/// Pulls the accumulated text out of a port built by [`open_output_string`].
/// Returns `None` for any other port kind.
pub fn get_output_string(state: &mut State, port: Value) -> Option<String> {
    let Value::Ref(id) = port else { return None };
    match state.heap.get_mut(id) {
        ObjKind::Port(p) => p.backend.as_any_mut().downcast_mut::<StringOutputPort>().map(|s| s.buffer.clone()),
        _ => None,
    }
}

/// Pulls the accumulated bytes out of a port built by
/// [`open_output_bytevector`]. Returns `None` for any other port kind.
pub fn get_output_bytevector(state: &mut State, port: Value) -> Option<Vec<u8>> {
    let Value::Ref(id) = port else { return None };
    match state.heap.get_mut(id) {
        ObjKind::Port(p) => p.backend.as_any_mut().downcast_mut::<BytevectorOutputPort>().map(|s| s.buffer.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_gc::GcConfig;

    fn test_state() -> State {
        State::new(GcConfig::default(), |_s, _x, _o, _e| Ok(()))
    }

    #[test]
    fn string_output_port_round_trips_through_get_output_string() {
        let mut st = test_state();
        let port = open_output_string(&mut st).unwrap();
        if let Value::Ref(id) = port {
            if let ObjKind::Port(p) = st.heap.get_mut(id) {
                p.backend.write_char('h').unwrap();
                p.backend.write_char('i').unwrap();
            }
        }
        assert_eq!(get_output_string(&mut st, port), Some("hi".to_string()));
    }

    #[test]
    fn string_input_port_reads_back_what_it_was_built_with() {
        let mut st = test_state();
        let port = open_input_string(&mut st, "ab").unwrap();
        if let Value::Ref(id) = port {
            if let ObjKind::Port(p) = st.heap.get_mut(id) {
                assert_eq!(p.backend.read_char().unwrap(), Some('a'));
            }
        }
    }
}
