use crate::{
	cleanup::{clear_morph, clear_morph_list, prune_item},
	morph::{Key, MorphId, MorphTree},
	Env, Result,
};
use hashbrown::HashMap;
use tracing::{instrument, trace, trace_span};

/// What a render body did about cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// Run the default prune/clear steps.
	Cleanup,
	/// The render body diffed its output itself. No default cleanup runs.
	Handled,
}

/// Bookkeeping for one render pass against one target render node.
///
/// Construct one right before [`render_and_cleanup`] and drop it afterwards.
pub struct RenderState<E: Env> {
	/// Owner of a previous pass's [`MorphList`](`crate::MorphList`) that is destroyed wholesale after this pass.
	pub morph_list_to_clear: Option<MorphId>,

	/// Owner of a [`MorphList`](`crate::MorphList`) whose items not in [`handled_morphs`](`RenderState::handled_morphs`) are destroyed after this pass.
	pub morph_list_to_prune: Option<MorphId>,

	/// The keys yielded during this pass.
	pub handled_morphs: HashMap<Key, MorphId>,

	/// Keys yielded more than once during this pass, with their surplus count.
	pub collisions: Option<HashMap<Key, u32>>,

	/// Cleared after the pass unless a render body takes it. Defaults to the target itself.
	pub morph_to_clear: Option<MorphId>,

	pub shadow_options: Option<E::ShadowOptions>,
}

impl<E: Env> RenderState<E> {
	#[must_use]
	pub fn new(target: MorphId) -> Self {
		Self {
			morph_list_to_clear: None,
			morph_list_to_prune: None,
			handled_morphs: HashMap::new(),
			collisions: None,
			morph_to_clear: Some(target),
			shadow_options: None,
		}
	}

	/// For passes that replace the keyed iteration owned by `list_owner` with something else entirely.
	#[must_use]
	pub fn with_list_to_clear(target: MorphId, list_owner: MorphId) -> Self {
		Self {
			morph_list_to_clear: Some(list_owner),
			..Self::new(target)
		}
	}

	/// Notes that `key` was yielded again this pass and returns how often that has happened so far.
	pub fn record_collision(&mut self, key: Key) -> u32 {
		let count = self.collisions.get_or_insert_with(HashMap::new).entry(key).or_insert(0);
		*count += 1;
		*count
	}
}

/// Runs `render_body` against `target`, then tears down whatever the pass didn't touch.
///
/// Unless `render_body` returns [`Outcome::Handled`], cleanup runs in this order:
///
/// 1. Items of [`morph_list_to_prune`](`RenderState::morph_list_to_prune`) whose key isn't in
///    [`handled_morphs`](`RenderState::handled_morphs`) are unregistered, cleared and destroyed.
///    All other items are left alone.
/// 2. [`morph_list_to_clear`](`RenderState::morph_list_to_clear`) is destroyed completely and detached.
/// 3. [`morph_to_clear`](`RenderState::morph_to_clear`), if still set, is cleared (but not destroyed).
///
/// # Errors
///
/// Errors from `render_body` and from cleanup propagate immediately.
/// The remaining steps are skipped, which may leave the output tree partially updated.
#[instrument(skip(tree, env, state, shadow_options, render_body))]
pub fn render_and_cleanup<E, F>(
	tree: &mut MorphTree<E>,
	target: MorphId,
	env: &mut E,
	state: &mut RenderState<E>,
	shadow_options: Option<E::ShadowOptions>,
	render_body: F,
) -> Result<()>
where
	E: Env,
	F: FnOnce(&mut E, &mut MorphTree<E>, &mut RenderState<E>) -> Result<Outcome>,
{
	state.collisions = None;
	state.shadow_options = shadow_options;

	if render_body(env, tree, state)? == Outcome::Handled {
		trace!("Render body handled cleanup itself.");
		return Ok(());
	}

	if let Some(owner) = state.morph_list_to_prune {
		let span = trace_span!("Pruning", %owner, handled = state.handled_morphs.len());
		let _enter = span.enter();

		let mut item = tree.node(owner)?.morph_list().and_then(|list| list.first_child_morph());
		while let Some(current) = item {
			let node = tree.node(current)?;
			item = node.next_morph();

			let handled = node.key().map_or(false, |key| state.handled_morphs.contains_key(key));
			if !handled {
				if cfg!(feature = "dangerous-logging") {
					trace!(key = ?node.key(), "Pruning unhandled item {}.", current);
				} else {
					trace!("Pruning unhandled item {}.", current);
				}
				prune_item(tree, owner, current, env)?;
			}
		}
	}

	if let Some(owner) = state.morph_list_to_clear {
		clear_morph_list(tree, owner, env)?;
	}

	if let Some(to_clear) = state.morph_to_clear {
		clear_morph(tree, to_clear, env, false)?;
	}

	Ok(())
}
