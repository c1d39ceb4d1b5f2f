#![doc(html_root_url = "https://docs.rs/morph-reconcile/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Bookkeeping for incremental template rendering.
//!
//! Dynamic regions of an output tree are [`RenderNode`]s in a [`MorphTree`].
//! Each render pass against a node goes through [`render_and_cleanup`], which records what the pass touched in a [`RenderState`]
//! and afterwards destroys what it didn't: unyielded keyed items, replaced morph lists, or the node's stale content.
//!
//! [`Block`]s render a template into a node the first time and revalidate the last result in place afterwards.
//! All host behaviour (output-tree mutation, lifecycle and scope hooks) is supplied through an [`Env`].

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod block;
pub mod cleanup;
#[cfg(feature = "web")]
pub mod dom;
pub mod env;
mod error;
pub mod keyed;
pub mod morph;
pub mod render_state;

pub use block::{block_for, render_fn, Block, BlockOptions, RenderArgs, RenderFn, YieldTo};
pub use cleanup::{clear_morph, clear_morph_list, destroy_morph};
pub use env::{CompiledTemplate, Env, RenderResult};
pub use error::{Error, Result};
pub use keyed::ItemCursor;
pub use morph::{Key, MorphId, MorphList, MorphTree, RenderNode};
pub use render_state::{render_and_cleanup, Outcome, RenderState};
