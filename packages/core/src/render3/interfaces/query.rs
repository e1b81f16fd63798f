//! Query Interfaces
//!
//! Corresponds to packages/core/src/render3/interfaces/query.ts
//!
//! Query bookkeeping itself is compiled into the query functions; the
//! runtime only guarantees when they run (content queries before content
//! hooks, view queries after child refresh) and whether the
//! static variants run during creation.

use crate::render3::errors::Result;
use crate::render3::interfaces::definition::RenderFlags;
use crate::render3::interfaces::injector::InstanceHandle;
use crate::render3::state::ViewRuntime;

/// View query function from the component definition. Runs in create mode
/// during the creation pass and in update mode per the refresh ordering.
pub type ViewQueriesFn = fn(&mut ViewRuntime, RenderFlags, &InstanceHandle) -> Result<()>;

/// Content query function registered by a directive; the `usize` is the
/// absolute directive slot index the query belongs to.
pub type ContentQueriesFn = fn(&mut ViewRuntime, RenderFlags, usize) -> Result<()>;
