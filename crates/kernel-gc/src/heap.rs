//! Bump-linked allocation over a slot table, with a free list standing in
//! for the slots sweep has reclaimed (spec §4.1: "Bump-linked allocation
//! of boxed objects").

use crate::config::GcConfig;
use crate::error::GcError;
use crate::object::ObjKind;
use crate::tracer::{Color, Phase};
use crate::value::{ObjId, Value};

pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) color: Color,
    /// `None` only for a slot currently on the free list.
    pub(crate) kind: Option<ObjKind>,
}

/// Everything the collector needs to find and reclaim boxed objects.
/// Root bookkeeping (spec's two root-stack flavors) lives in
/// [`crate::root::RootStack`], layered on top rather than in here, so the
/// heap itself only knows about slots and colors.
pub struct Heap {
    pub(crate) slots: Vec<Slot>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) config: GcConfig,
    pub(crate) phase: Phase,
    pub(crate) bytes_since_gc: usize,
    pub(crate) live_count: usize,
}

impl Heap {
    pub fn new(config: GcConfig) -> Self {
        Heap {
            slots: Vec::new(),
            free_list: Vec::new(),
            config,
            phase: Phase::Idle,
            bytes_since_gc: 0,
            live_count: 0,
        }
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// `alloc` never returns an error to a caller that can't handle it
    /// (spec §4.1): every construction site in `kernel-eval`/`kernel-ground`
    /// propagates `GcError::OutOfMemory` with `?`, which unwinds through
    /// the same error path ordinary Kernel errors take.
    pub fn alloc(&mut self, kind: ObjKind) -> Result<Value, GcError> {
        self.bytes_since_gc += approx_size(&kind);
        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.color = self.phase.allocation_color();
            slot.kind = Some(kind);
            ObjId::new(index, slot.generation)
        } else {
            if self.slots.len() >= self.config.max_objects {
                return Err(GcError::OutOfMemory {
                    requested: 1,
                    limit: self.config.max_objects,
                });
            }
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, color: self.phase.allocation_color(), kind: Some(kind) });
            ObjId::new(index, 0)
        };
        self.live_count += 1;
        Ok(Value::Ref(id))
    }

    pub fn get(&self, id: ObjId) -> &ObjKind {
        let slot = &self.slots[id.index()];
        debug_assert_eq!(slot.generation, id.generation, "stale ObjId: use-after-free");
        slot.kind.as_ref().expect("live ObjId points at a freed slot")
    }

    pub fn get_mut(&mut self, id: ObjId) -> &mut ObjKind {
        let slot = &mut self.slots[id.index()];
        debug_assert_eq!(slot.generation, id.generation, "stale ObjId: use-after-free");
        slot.kind.as_mut().expect("live ObjId points at a freed slot")
    }

    pub(crate) fn color(&self, id: ObjId) -> Color {
        self.slots[id.index()].color
    }

    pub(crate) fn set_color(&mut self, id: ObjId, color: Color) {
        self.slots[id.index()].color = color;
    }

    /// Write barrier for `set-car!`/`set-cdr!` (spec §4.1): mutating a
    /// black object to point at a white one during marking would let the
    /// mutator hide a live object from the collector, so re-gray the
    /// parent to force it back through the marking queue.
    pub fn write_barrier(&mut self, parent: ObjId) {
        if matches!(self.phase, Phase::Marking { .. }) && self.color(parent) == Color::Black {
            self.set_color(parent, Color::Gray);
            if let Phase::Marking { gray } = &mut self.phase {
                gray.push_back(parent);
            }
        }
    }

    pub(crate) fn reclaim(&mut self, index: u32) {
        self.slots[index as usize].kind = None;
        self.free_list.push(index);
        self.live_count -= 1;
    }
}

fn approx_size(kind: &ObjKind) -> usize {
    match kind {
        ObjKind::String(s) => 32 + s.chars.len() * 4,
        ObjKind::Bytevector(b) => 32 + b.bytes.len(),
        ObjKind::Vector(v) => 32 + v.items.len() * 16,
        ObjKind::Bigint(_) | ObjKind::Bigrat(_) => 64,
        _ => 48,
    }
}
