//! A node-graph compositing execution engine.
//!
//! The engine turns a user-authored DAG of image-processing nodes into an
//! efficient execution plan over pixel buffers: runs of per-pixel nodes are
//! fused into single shader programs, heterogeneous image domains are
//! reconciled by explicit realization (resampling), and buffer lifetimes are
//! reference-counted against a per-Context pool.
//!
//! # Pipeline overview
//!
//! 1. **Compile**: `NodeGraph -> Plan` (operations in topological order, with
//!    fused shader groups and per-input domain policies)
//! 2. **Execute**: `Plan + Context + ExternalInputs -> map of output results`
//!    (single-threaded walk issuing row-parallel pixel work)
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: compilation is pure and stable for a given
//!   graph; generated program listings double as shader-cache keys.
//! - **No globals**: every cache (programs, derived buffers, pooled storage)
//!   is owned by an explicit [`Context`].
//! - **Invalidity is data**: a zero-size domain marks a result invalid and
//!   propagates to the sinks; execution never aborts over it.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod compile;
mod domain;
mod exec;
mod foundation;
mod graph;
mod shader;

pub use compile::plan::{InputBinding, InputSource, OpId, OpKind, Operation, Plan, compile};
pub use domain::domain::{DOMAIN_EPSILON, Domain, compute_domain};
pub use domain::realize::{materialize, realize};
pub use domain::value::{Interpolation, PixelBuffer, RealizeOptions, Value, ValueKind};
pub use exec::context::{Context, DerivedBufferKind, ExecStats};
pub use exec::pool::BufferPool;
pub use exec::scheduler::{ExternalInputs, execute};
pub use foundation::core::{NodeId, PIXEL_WHITE, PIXEL_ZERO, Pixel, Size2};
pub use foundation::error::{CompositorError, CompositorResult};
pub use graph::kinds::{InputDecl, NodeClass, NodeDescriptor, NodeKind};
pub use graph::model::{Link, Node, NodeGraph};
