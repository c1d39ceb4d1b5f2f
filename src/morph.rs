//! The render node arena.
//!
//! Render nodes (morphs) live in a [`MorphTree`] and refer to each other only through [`MorphId`] handles.
//! Keyed children form an intrusive doubly-linked [`MorphList`] through their `prev_morph`/`next_morph` fields,
//! mirrored by the owner's key map. Both are only ever updated together, by the same [`MorphTree`] method.

use crate::{Env, Error, Result};
use core::{borrow::Borrow, fmt};
use hashbrown::HashMap;
use slotmap::{new_key_type, Key as _, SlotMap};
use std::rc::Rc;
use tracing::{instrument, trace};

new_key_type! {
	/// Generational handle to a [`RenderNode`] in a [`MorphTree`].
	///
	/// Once the node is destroyed, the handle goes stale and is rejected with [`Error::Destroyed`],
	/// even if the slot is later reused for a new node.
	pub struct MorphId;
}

impl fmt::Display for MorphId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:?}", self.data())
	}
}

/// Identity of a render node among its siblings in a [`MorphList`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for Key {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Key {
	fn from(key: &str) -> Self {
		Self(key.into())
	}
}

impl From<String> for Key {
	fn from(key: String) -> Self {
		Self(key.into())
	}
}

/// Head of the keyed children of a [`RenderNode`].
///
/// The links themselves are stored on the items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MorphList {
	first_child_morph: Option<MorphId>,
	last_child_morph: Option<MorphId>,
	len: usize,
}

impl MorphList {
	#[must_use]
	pub fn first_child_morph(&self) -> Option<MorphId> {
		self.first_child_morph
	}

	#[must_use]
	pub fn last_child_morph(&self) -> Option<MorphId> {
		self.last_child_morph
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.len
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// One dynamic, independently re-renderable region of the output tree.
pub struct RenderNode<E: Env> {
	id: MorphId,
	key: Option<Key>,

	/// The result of the last successful render, which is revalidated in place on subsequent renders.
	pub last_result: Option<E::Rendered>,

	/// Whatever was last yielded into this node, for idempotence checks by the render layer.
	pub last_yielded: Option<E::Value>,

	/// Output-tree state owned by this node. Released through [`Env::clear`] and [`Env::destroy`].
	pub content: Option<E::Content>,

	child_nodes: Option<Vec<MorphId>>,
	morph_list: Option<MorphList>,
	morph_map: HashMap<Key, MorphId>,

	prev_morph: Option<MorphId>,
	next_morph: Option<MorphId>,
	parent_morph_list: Option<MorphId>,
}

impl<E: Env> RenderNode<E> {
	fn new(id: MorphId, key: Option<Key>) -> Self {
		Self {
			id,
			key,
			last_result: None,
			last_yielded: None,
			content: None,
			child_nodes: None,
			morph_list: None,
			morph_map: HashMap::new(),
			prev_morph: None,
			next_morph: None,
			parent_morph_list: None,
		}
	}

	#[must_use]
	pub fn id(&self) -> MorphId {
		self.id
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	/// Whether this node has a render result that can be revalidated.
	#[must_use]
	pub fn is_rendered(&self) -> bool {
		self.last_result.is_some()
	}

	/// Render nodes created by this node's template, if any.
	#[must_use]
	pub fn child_nodes(&self) -> Option<&[MorphId]> {
		self.child_nodes.as_deref()
	}

	#[must_use]
	pub fn morph_list(&self) -> Option<&MorphList> {
		self.morph_list.as_ref()
	}

	/// Key → item mapping for [`morph_list`](`RenderNode::morph_list`).
	#[must_use]
	pub fn morph_map(&self) -> &HashMap<Key, MorphId> {
		&self.morph_map
	}

	#[must_use]
	pub fn prev_morph(&self) -> Option<MorphId> {
		self.prev_morph
	}

	#[must_use]
	pub fn next_morph(&self) -> Option<MorphId> {
		self.next_morph
	}

	/// The owner of the [`MorphList`] this node is an item of.
	#[must_use]
	pub fn parent_morph_list(&self) -> Option<MorphId> {
		self.parent_morph_list
	}

	/// Makes the node inert after cleanup. Owned descendants must already have been freed.
	pub(crate) fn reset(&mut self) {
		self.last_result = None;
		self.last_yielded = None;
		self.child_nodes = None;
		self.reset_morph_list();
	}

	pub(crate) fn clear_child_nodes(&mut self) {
		self.child_nodes = None;
	}

	pub(crate) fn reset_morph_list(&mut self) {
		self.morph_list = None;
		self.morph_map.clear();
	}
}

impl<E: Env> fmt::Debug for RenderNode<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderNode")
			.field("id", &self.id)
			.field("key", &self.key)
			.field("rendered", &self.is_rendered())
			.field("child_nodes", &self.child_nodes)
			.field("morph_list", &self.morph_list)
			.field("prev_morph", &self.prev_morph)
			.field("next_morph", &self.next_morph)
			.field("parent_morph_list", &self.parent_morph_list)
			.finish()
	}
}

/// Owning arena of [`RenderNode`]s.
pub struct MorphTree<E: Env> {
	nodes: SlotMap<MorphId, RenderNode<E>>,
}

impl<E: Env> Default for MorphTree<E> {
	fn default() -> Self {
		Self::new()
	}
}

impl<E: Env> fmt::Debug for MorphTree<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.nodes.values()).finish()
	}
}

impl<E: Env> MorphTree<E> {
	#[must_use]
	pub fn new() -> Self {
		Self { nodes: SlotMap::with_key() }
	}

	/// Number of live render nodes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	#[must_use]
	pub fn contains(&self, id: MorphId) -> bool {
		self.nodes.contains_key(id)
	}

	#[must_use]
	pub fn get(&self, id: MorphId) -> Option<&RenderNode<E>> {
		self.nodes.get(id)
	}

	#[must_use]
	pub fn get_mut(&mut self, id: MorphId) -> Option<&mut RenderNode<E>> {
		self.nodes.get_mut(id)
	}

	/// # Errors
	///
	/// Iff `id` is stale.
	pub fn node(&self, id: MorphId) -> Result<&RenderNode<E>> {
		self.get(id).ok_or(Error::Destroyed(id))
	}

	/// # Errors
	///
	/// Iff `id` is stale.
	pub fn node_mut(&mut self, id: MorphId) -> Result<&mut RenderNode<E>> {
		self.get_mut(id).ok_or(Error::Destroyed(id))
	}

	fn alloc(&mut self, key: Option<Key>) -> MorphId {
		self.nodes.insert_with_key(|id| RenderNode::new(id, key))
	}

	/// Removes the node from the arena. Its handle goes stale.
	///
	/// Links pointing at the node are not touched.
	pub(crate) fn free(&mut self, id: MorphId) -> Result<RenderNode<E>> {
		let node = self.nodes.remove(id).ok_or(Error::Destroyed(id))?;
		trace!("Freed render node {}.", id);
		Ok(node)
	}

	/// Creates a free-standing render node, usually the root of a render.
	pub fn create_morph(&mut self) -> MorphId {
		self.alloc(None)
	}

	/// Creates a render node owned by `parent`'s template content.
	///
	/// # Errors
	///
	/// Iff `parent` is stale.
	pub fn create_child(&mut self, parent: MorphId) -> Result<MorphId> {
		self.node(parent)?;
		let id = self.alloc(None);
		self.node_mut(parent)?.child_nodes.get_or_insert_with(Vec::new).push(id);
		Ok(id)
	}

	/// Gives `owner` an empty [`MorphList`] if it doesn't have one yet.
	///
	/// Returns whether the list was created by this call.
	///
	/// # Errors
	///
	/// Iff `owner` is stale.
	pub fn ensure_morph_list(&mut self, owner: MorphId) -> Result<bool> {
		let owner = self.node_mut(owner)?;
		if owner.morph_list.is_some() {
			return Ok(false);
		}
		owner.morph_list = Some(MorphList::default());
		Ok(true)
	}

	/// Iterates over the items of `owner`'s [`MorphList`] in order.
	///
	/// # Errors
	///
	/// Iff `owner` is stale.
	pub fn morph_list(&self, owner: MorphId) -> Result<MorphListIter<'_, E>> {
		Ok(MorphListIter {
			tree: self,
			next: self.node(owner)?.morph_list.and_then(|list| list.first_child_morph),
		})
	}

	/// Creates a keyed item in `owner`'s [`MorphList`], in front of `before` or at the end.
	///
	/// The key map is updated in the same step.
	///
	/// # Errors
	///
	/// - [`Error::Destroyed`] if `owner` or `before` is stale,
	/// - [`Error::NotInList`] if `before` isn't an item of `owner`'s list and
	/// - [`Error::KeyExists`] if `key` is already taken.
	#[instrument(skip_all, fields(%owner))]
	pub fn insert_keyed(&mut self, owner: MorphId, key: impl Into<Key>, before: Option<MorphId>) -> Result<MorphId> {
		let key = key.into();
		if self.node(owner)?.morph_map.contains_key(&key) {
			return Err(Error::KeyExists { owner, key });
		}
		if let Some(before) = before {
			self.check_item(owner, before)?;
		}

		let item = self.alloc(Some(key.clone()));
		self.link(owner, item, before)?;
		self.node_mut(owner)?.morph_map.insert(key, item);
		trace!("Inserted keyed render node {}.", item);
		Ok(item)
	}

	/// Moves an existing item of `owner`'s [`MorphList`] in front of `before`, or to the end.
	///
	/// # Errors
	///
	/// - [`Error::Destroyed`] if any of the handles is stale and
	/// - [`Error::NotInList`] if `item` or `before` aren't items of `owner`'s list.
	#[instrument(skip_all, fields(%owner, %item))]
	pub fn move_keyed(&mut self, owner: MorphId, item: MorphId, before: Option<MorphId>) -> Result<()> {
		self.check_item(owner, item)?;
		if let Some(before) = before {
			if before == item {
				return Ok(());
			}
			self.check_item(owner, before)?;
		}
		if self.node(item)?.next_morph == before {
			return Ok(());
		}

		self.unlink(item)?;
		self.link(owner, item, before)
	}

	/// Removes `key` from `owner`'s key map, returning the item it pointed to.
	pub(crate) fn unregister_key(&mut self, owner: MorphId, key: &Key) -> Option<MorphId> {
		self.get_mut(owner).and_then(|owner| owner.morph_map.remove(key))
	}

	fn check_item(&self, owner: MorphId, item: MorphId) -> Result<()> {
		if self.node(item)?.parent_morph_list == Some(owner) {
			Ok(())
		} else {
			Err(Error::NotInList { owner, item })
		}
	}

	fn list_mut(&mut self, owner: MorphId) -> Result<&mut MorphList> {
		Ok(self.node_mut(owner)?.morph_list.get_or_insert_with(MorphList::default))
	}

	fn link(&mut self, owner: MorphId, item: MorphId, before: Option<MorphId>) -> Result<()> {
		let prev = match before {
			Some(before) => self.node(before)?.prev_morph,
			None => self.list_mut(owner)?.last_child_morph,
		};

		{
			let node = self.node_mut(item)?;
			node.prev_morph = prev;
			node.next_morph = before;
			node.parent_morph_list = Some(owner);
		}
		match prev {
			Some(prev) => self.node_mut(prev)?.next_morph = Some(item),
			None => self.list_mut(owner)?.first_child_morph = Some(item),
		}
		match before {
			Some(before) => self.node_mut(before)?.prev_morph = Some(item),
			None => self.list_mut(owner)?.last_child_morph = Some(item),
		}
		self.list_mut(owner)?.len += 1;
		Ok(())
	}

	/// Detaches `item` from whichever [`MorphList`] it's in. No-op for nodes that aren't list items.
	pub(crate) fn unlink(&mut self, item: MorphId) -> Result<()> {
		let (owner, prev, next) = {
			let node = self.node_mut(item)?;
			let owner = match node.parent_morph_list.take() {
				Some(owner) => owner,
				None => return Ok(()),
			};
			(owner, node.prev_morph.take(), node.next_morph.take())
		};

		if let Some(prev) = prev {
			self.node_mut(prev)?.next_morph = next;
		}
		if let Some(next) = next {
			self.node_mut(next)?.prev_morph = prev;
		}
		if let Some(list) = self.get_mut(owner).and_then(|owner| owner.morph_list.as_mut()) {
			if prev.is_none() {
				list.first_child_morph = next;
			}
			if next.is_none() {
				list.last_child_morph = prev;
			}
			list.len -= 1;
		}
		Ok(())
	}

	/// The render nodes directly owned by `id`: template children first, then list items.
	pub(crate) fn owned_children(&self, id: MorphId) -> Result<Vec<MorphId>> {
		let node = self.node(id)?;
		let mut children = node.child_nodes.clone().unwrap_or_default();
		children.extend(self.morph_list(id)?);
		Ok(children)
	}
}

/// In-order iterator over the items of a [`MorphList`].
pub struct MorphListIter<'a, E: Env> {
	tree: &'a MorphTree<E>,
	next: Option<MorphId>,
}

impl<'a, E: Env> Iterator for MorphListIter<'a, E> {
	type Item = MorphId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = self.tree.get(current).and_then(|node| node.next_morph);
		Some(current)
	}
}
