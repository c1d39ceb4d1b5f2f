//! Keyed iteration: reuses list items by key across render passes, so that pruning only destroys what went away.

use crate::{
	cleanup::release_template_output,
	morph::{Key, MorphId, MorphList, MorphTree},
	render_state::RenderState,
	Env, Error, Result,
};
use tracing::{instrument, trace, warn};

/// Walks a parent's [`MorphList`] in step with the keys yielded during one render pass.
///
/// Items are reused by key and moved into yield order. New keys get new items.
/// Whatever isn't yielded is left for [`render_and_cleanup`](`crate::render_and_cleanup`) to prune.
#[derive(Debug, Clone, Copy)]
pub struct ItemCursor {
	parent: MorphId,
	current: Option<MorphId>,
}

impl ItemCursor {
	/// Positions a new cursor at the first item of `parent`'s list.
	///
	/// # Errors
	///
	/// Iff `parent` is stale.
	pub fn new<E: Env>(tree: &MorphTree<E>, parent: MorphId) -> Result<Self> {
		Ok(Self {
			parent,
			current: tree.node(parent)?.morph_list().and_then(MorphList::first_child_morph),
		})
	}

	#[must_use]
	pub fn parent(&self) -> MorphId {
		self.parent
	}

	/// Yields `key` as the next item, returning the render node to render it into.
	///
	/// This also marks the parent's list for pruning and takes the parent's default clear.
	/// If the parent had no list yet, whatever a previous plain render left in it (child nodes and content) is released first.
	/// Inserted and moved items are reported through [`Env::insert_item`] and [`Env::move_item`].
	///
	/// # Errors
	///
	/// [`Error::DuplicateKey`] if `key` was already yielded in this pass (counted in [`RenderState::collisions`]).
	/// The list is left as is in that case.
	/// Otherwise whatever a hook reports.
	#[instrument(skip_all, fields(parent = %self.parent))]
	pub fn yield_item<E: Env>(&mut self, tree: &mut MorphTree<E>, env: &mut E, state: &mut RenderState<E>, key: impl Into<Key>) -> Result<MorphId> {
		let key = key.into();
		let parent = self.parent;
		if tree.ensure_morph_list(parent)? {
			let node = tree.node(parent)?;
			if node.child_nodes().is_some() || node.content.is_some() {
				trace!("Releasing plain render output before the first keyed item.");
				release_template_output(tree, parent, env)?;
			}
		}
		state.morph_list_to_prune = Some(parent);
		state.morph_to_clear = None;

		if state.handled_morphs.contains_key(&key) {
			let count = state.record_collision(key.clone());
			warn!("A key was yielded {} extra time(s) during one render pass.", count);
			return Err(Error::DuplicateKey { parent, key });
		}

		let found = tree.node(parent)?.morph_map().get(&key).copied();
		let item = match found {
			Some(found) if Some(found) == self.current => {
				self.current = tree.node(found)?.next_morph();
				found
			}
			Some(found) => {
				trace!("Moving item {} into place.", found);
				tree.move_keyed(parent, found, self.current)?;
				env.move_item(tree, found, self.current)?;
				found
			}
			None => {
				let item = tree.insert_keyed(parent, key.clone(), self.current)?;
				env.insert_item(tree, item, self.current)?;
				item
			}
		};

		state.handled_morphs.insert(key, item);
		Ok(item)
	}
}
