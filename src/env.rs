//! The capability bundle every render-node operation receives explicitly.

use crate::{
	block::Block,
	morph::{MorphId, MorphTree, RenderNode},
	Result,
};
use std::rc::Rc;

/// A compiled template, as far as this crate is concerned.
pub trait CompiledTemplate {
	/// Number of block parameters the template expects.
	fn arity(&self) -> usize;
}

/// Handle to what a template render produced, kept on the [`RenderNode`] for in-place re-renders.
pub trait RenderResult<E: Env>: Clone {
	/// Re-renders in place with new bindings. Scopes are not rebuilt.
	///
	/// # Errors
	///
	/// Whatever the render layer reports.
	fn revalidate_with(
		&self,
		env: &mut E,
		tree: &mut MorphTree<E>,
		self_value: Option<E::Value>,
		call_args: &[E::Value],
		visitor: &mut E::Visitor,
	) -> Result<()>;
}

/// Host environment: output-tree primitives, lifecycle hooks and scope hooks.
///
/// Lifecycle hooks default to no-ops.
/// Any `Err` propagates straight to the caller and skips the cleanup steps that would have followed it.
pub trait Env: Sized {
	/// Output-tree state owned by a single [`RenderNode`].
	type Content;
	type Scope;
	/// `self` bindings, block arguments and yielded values.
	type Value: Clone;
	type ShadowOptions: Clone;
	type Template: CompiledTemplate;
	type Rendered: RenderResult<Self>;
	type Visitor;

	// Output tree.

	/// Releases the output-tree state owned by `node`, leaving it empty but in place.
	///
	/// # Errors
	///
	/// Output-tree failure.
	fn clear(&mut self, node: &mut RenderNode<Self>) -> Result<()>;

	/// Removes `node`'s (cleared) region from the output tree altogether.
	///
	/// # Errors
	///
	/// Output-tree failure.
	fn destroy(&mut self, node: &mut RenderNode<Self>) -> Result<()>;

	/// Called after `item` was created as a keyed list item, in front of `before` or at the end of its list.
	///
	/// The item isn't rendered yet. Hosts that keep list items in a shared output region set up `item`'s content here.
	///
	/// # Errors
	///
	/// Output-tree failure.
	fn insert_item(&mut self, _tree: &mut MorphTree<Self>, _item: MorphId, _before: Option<MorphId>) -> Result<()> {
		Ok(())
	}

	/// Called after the existing list item `item` was moved in front of `before`, or to the end of its list.
	///
	/// Hosts mirror the new order in the output tree here.
	///
	/// # Errors
	///
	/// Output-tree failure.
	fn move_item(&mut self, _tree: &mut MorphTree<Self>, _item: MorphId, _before: Option<MorphId>) -> Result<()> {
		Ok(())
	}

	// Lifecycle.

	/// # Errors
	///
	/// Hook failure.
	fn will_cleanup_tree(&mut self, _node: &RenderNode<Self>, _destroy_self: bool) -> Result<()> {
		Ok(())
	}

	/// # Errors
	///
	/// Hook failure.
	fn cleanup_render_node(&mut self, _node: &RenderNode<Self>) -> Result<()> {
		Ok(())
	}

	/// # Errors
	///
	/// Hook failure.
	fn destroy_render_node(&mut self, _node: &RenderNode<Self>) -> Result<()> {
		Ok(())
	}

	/// # Errors
	///
	/// Hook failure.
	fn did_cleanup_tree(&mut self, _node: &RenderNode<Self>, _destroy_self: bool) -> Result<()> {
		Ok(())
	}

	// Scopes.

	fn create_fresh_scope(&mut self) -> Self::Scope;

	fn create_child_scope(&mut self, parent: &Self::Scope) -> Self::Scope;

	/// # Errors
	///
	/// Hook failure.
	fn bind_shadow_scope(&mut self, parent: Option<&Self::Scope>, scope: &mut Self::Scope, options: Option<&Self::ShadowOptions>) -> Result<()>;

	/// # Errors
	///
	/// Hook failure.
	fn bind_self(&mut self, scope: &mut Self::Scope, self_value: Self::Value) -> Result<()>;

	/// Makes `block` available to nested helpers under `name`, or as the default yield target if `name` is [`None`].
	///
	/// # Errors
	///
	/// Hook failure.
	fn bind_block(&mut self, scope: &mut Self::Scope, block: &Rc<Block<Self>>, name: Option<&str>) -> Result<()>;
}
