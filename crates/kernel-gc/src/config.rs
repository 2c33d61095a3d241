//! Collector tuning. klisp hardcodes its thresholds; we keep the same
//! handful of knobs but make them constructible so `kernel-driver` can
//! expose them as CLI flags (`--gc-step-bytes`, …) without the collector
//! itself needing to know about `clap`.

#[derive(Debug, Clone)]
pub struct GcConfig {
    /// Bytes allocated since the last completed cycle before `should_step`
    /// starts asking for collector work.
    pub step_threshold_bytes: usize,
    /// Objects marked or swept per call to `Heap::step` — the "small work
    /// budget" of spec §4.1.
    pub mark_work_per_step: usize,
    /// Hard ceiling on live+free slots; `alloc` fails past this rather
    /// than growing without bound.
    pub max_objects: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        GcConfig {
            step_threshold_bytes: 256 * 1024,
            mark_work_per_step: 512,
            max_objects: 4_000_000,
        }
    }
}
