use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    domain::value::PixelBuffer,
    exec::pool::BufferPool,
    foundation::core::Size2,
    foundation::error::CompositorResult,
    shader::program::Program,
};

/// Kinds of derived buffers the Context precomputes and shares per size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DerivedBufferKind {
    /// Per-pixel `[x + 0.5, y + 0.5, 0, 1]` coordinate grid.
    CoordinateGrid,
}

/// Execution counters exposed for callers and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecStats {
    /// Operations executed.
    pub operations: u64,
    /// Resampling realizations that materialized a new buffer.
    pub realizations: u64,
    /// Fused programs served from the shader cache.
    pub shader_cache_hits: u64,
    /// Fused programs built (and cached) on demand.
    pub shader_cache_misses: u64,
}

/// Per-evaluation shared state: the shader program cache, the derived-buffer
/// library, the buffer pool, and the diagnostics channel.
///
/// One Context serves one in-flight graph evaluation at a time; the caches
/// survive [`Context::reset`] so repeated evaluations of identical subgraphs
/// reuse compiled programs and parked buffers. Dropping the Context releases
/// everything.
pub struct Context {
    render_size: Size2,
    programs: HashMap<String, Rc<Program>>,
    derived: HashMap<(Size2, DerivedBufferKind), Rc<PixelBuffer>>,
    pub(crate) pool: BufferPool,
    pub(crate) stats: ExecStats,
    diagnostics: Vec<String>,
}

impl Context {
    /// Context for the given active output resolution.
    pub fn new(render_size: Size2) -> Self {
        Self {
            render_size,
            programs: HashMap::new(),
            derived: HashMap::new(),
            pool: BufferPool::new(),
            stats: ExecStats::default(),
            diagnostics: Vec::new(),
        }
    }

    /// The active output resolution, the domain of source-type operations.
    pub fn render_size(&self) -> Size2 {
        self.render_size
    }

    /// Clear per-frame state (diagnostics, stats). Compiled programs, derived
    /// buffers, and parked pool buffers are kept for the next evaluation.
    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.stats = ExecStats::default();
    }

    /// Attach a human-readable, non-fatal status message.
    pub fn push_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "compositor diagnostic");
        self.diagnostics.push(message);
    }

    /// Messages accumulated since the last reset. Advisory only; never
    /// affects the validity of returned results.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Counters accumulated since the last reset.
    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    /// The buffer pool (exposed for allocation accounting in tests).
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Fetch or build the compiled program for a group listing.
    pub(crate) fn program_for(
        &mut self,
        source: &str,
        build: impl FnOnce() -> CompositorResult<Program>,
    ) -> CompositorResult<Rc<Program>> {
        if let Some(program) = self.programs.get(source) {
            self.stats.shader_cache_hits += 1;
            return Ok(program.clone());
        }
        let program = Rc::new(build()?);
        self.stats.shader_cache_misses += 1;
        self.programs.insert(source.to_string(), program.clone());
        Ok(program)
    }

    /// Shared coordinate grid for `size`, built once per size.
    pub(crate) fn coordinate_grid(&mut self, size: Size2) -> Rc<PixelBuffer> {
        let key = (size, DerivedBufferKind::CoordinateGrid);
        if let Some(grid) = self.derived.get(&key) {
            return grid.clone();
        }
        let mut data = self.pool.acquire(size);
        let width = size.width as usize;
        for (y, row) in data.chunks_mut(width).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                *px = [x as f32 + 0.5, y as f32 + 0.5, 0.0, 1.0];
            }
        }
        let grid = Rc::new(PixelBuffer::from_pool(size, data));
        self.derived.insert(key, grid.clone());
        grid
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/context.rs"]
mod tests;
