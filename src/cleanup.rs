//! Teardown of render nodes and morph lists.
//!
//! Cleanup of a node's descendants always completes before the node's own [`Env::clear`] runs.

use crate::{
	morph::{MorphId, MorphTree},
	Env, Error, Result,
};
use tracing::{instrument, trace, trace_span, warn};

/// Cleans up `id` and everything it owns, leaving it inert.
///
/// In order: [`Env::will_cleanup_tree`], [`Env::cleanup_render_node`], [`Env::destroy_render_node`] (only iff `destroy_self`),
/// cleanup-then-destroy hooks for every owned descendant, [`Env::clear`] and finally [`Env::did_cleanup_tree`].
///
/// Afterwards, the node's `last_result`, `last_yielded` and child nodes are gone and all descendants are freed.
/// The node itself stays allocated. Use [`destroy_morph`] to get rid of it.
///
/// # Errors
///
/// [`Error::Destroyed`](`crate::Error::Destroyed`) if `id` is stale, otherwise the first failing hook.
/// A failure leaves the subtree partially cleaned up.
#[instrument(skip(tree, env))]
pub fn clear_morph<E: Env>(tree: &mut MorphTree<E>, id: MorphId, env: &mut E, destroy_self: bool) -> Result<()> {
	env.will_cleanup_tree(tree.node(id)?, destroy_self)?;
	env.cleanup_render_node(tree.node(id)?)?;
	if destroy_self {
		env.destroy_render_node(tree.node(id)?)?;
	}

	let children = tree.owned_children(id)?;
	let descendants = visit_subtrees(tree, children, env)?;

	env.clear(tree.node_mut(id)?)?;
	env.did_cleanup_tree(tree.node(id)?, destroy_self)?;

	for descendant in descendants {
		tree.free(descendant)?;
	}
	tree.node_mut(id)?.reset();
	Ok(())
}

/// Runs the cleanup and destroy hooks on `roots` and everything they own, depth-first.
///
/// Returns the visited nodes, so that they can be freed once their owner is cleared.
fn visit_subtrees<E: Env>(tree: &MorphTree<E>, roots: Vec<MorphId>, env: &mut E) -> Result<Vec<MorphId>> {
	let mut stack = roots;
	let mut visited = Vec::with_capacity(stack.len());
	while let Some(child) = stack.pop() {
		let node = match tree.get(child) {
			Some(node) => node,
			None => {
				trace!("Skipping already destroyed child {}.", child);
				continue;
			}
		};
		env.cleanup_render_node(node)?;
		env.destroy_render_node(node)?;
		stack.extend(tree.owned_children(child)?);
		visited.push(child);
	}
	Ok(visited)
}

/// Releases `id`'s template output (child nodes and [`Env::clear`]) while keeping its morph list.
///
/// For nodes that switch from a plain render to keyed items.
pub(crate) fn release_template_output<E: Env>(tree: &mut MorphTree<E>, id: MorphId, env: &mut E) -> Result<()> {
	let roots = tree.node(id)?.child_nodes().map(<[MorphId]>::to_vec).unwrap_or_default();
	let descendants = visit_subtrees(tree, roots, env)?;

	env.clear(tree.node_mut(id)?)?;

	for descendant in descendants {
		tree.free(descendant)?;
	}
	tree.node_mut(id)?.clear_child_nodes();
	Ok(())
}

/// Removes `id` from the output tree and from the arena. Its handle goes stale.
///
/// If `id` is an item of a [`MorphList`](`crate::MorphList`), it's unlinked and its key unregistered in the same step.
/// This does not run any cleanup hooks, so [`clear_morph`] it first.
///
/// # Errors
///
/// - [`Error::Destroyed`](`crate::Error::Destroyed`) if `id` is already stale, which also makes destroying twice an error,
/// - [`Error::NotCleared`](`crate::Error::NotCleared`) if `id` still owns child nodes or list items and
/// - [`Env::destroy`] failure.
#[instrument(skip(tree, env))]
pub fn destroy_morph<E: Env>(tree: &mut MorphTree<E>, id: MorphId, env: &mut E) -> Result<()> {
	let node = tree.node(id)?;
	if node.child_nodes().is_some() || node.morph_list().map_or(false, |list| !list.is_empty()) {
		return Err(Error::NotCleared(id));
	}
	if let (Some(owner), Some(key)) = (node.parent_morph_list(), node.key().cloned()) {
		if tree.get(owner).and_then(|owner| owner.morph_map().get(&key)) == Some(&id) {
			tree.unregister_key(owner, &key);
		}
	}
	tree.unlink(id)?;
	env.destroy(tree.node_mut(id)?)?;
	tree.free(id)?;
	Ok(())
}

/// Unregisters, clears and destroys one item of `owner`'s list.
pub(crate) fn prune_item<E: Env>(tree: &mut MorphTree<E>, owner: MorphId, item: MorphId, env: &mut E) -> Result<()> {
	if let Some(key) = tree.node(item)?.key().cloned() {
		tree.unregister_key(owner, &key);
	}
	clear_morph(tree, item, env, true)?;
	destroy_morph(tree, item, env)
}

/// Destroys every item of `owner`'s [`MorphList`](`crate::MorphList`) and detaches the list from `owner`.
///
/// # Errors
///
/// [`Error::Destroyed`](`crate::Error::Destroyed`) if `owner` or a linked item is stale, otherwise the first failing hook.
#[instrument(skip(tree, env))]
pub fn clear_morph_list<E: Env>(tree: &mut MorphTree<E>, owner: MorphId, env: &mut E) -> Result<()> {
	let mut item = tree.node(owner)?.morph_list().and_then(|list| list.first_child_morph());
	while let Some(current) = item {
		let span = trace_span!("Clearing list item", item = %current);
		let _enter = span.enter();

		item = tree.node(current)?.next_morph();
		prune_item(tree, owner, current, env)?;
	}

	let owner = tree.node_mut(owner)?;
	if !owner.morph_map().is_empty() {
		warn!("{} key(s) were left in the key map of a cleared morph list.", owner.morph_map().len());
	}
	owner.reset_morph_list();
	Ok(())
}
