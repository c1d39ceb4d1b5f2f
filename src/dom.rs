//! DOM-backed render node content.
//!
//! A [`DomRange`] is the natural [`Env::Content`](`crate::Env::Content`) for a browser render target:
//! Implement [`Env::clear`](`crate::Env::clear`) with [`DomRange::clear`] and [`Env::destroy`](`crate::Env::destroy`) with [`DomRange::remove`].

use crate::{Error, Result};
use tracing::{error, instrument, trace};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

/// A run of adjacent sibling [***Node***](https://developer.mozilla.org/en-US/docs/Web/API/Node)s owned by one render node.
///
/// The range is never empty: Without content, it holds a single placeholder comment that marks its position.
#[derive(Debug, Clone)]
pub struct DomRange {
	parent: Node,
	first: Node,
	last: Node,
}

impl DomRange {
	/// Creates an empty range at the end of `parent`.
	///
	/// # Errors
	///
	/// Iff the DOM refuses the placeholder.
	#[instrument]
	pub fn append_to(parent: &Node, document: &Document) -> Result<Self> {
		let placeholder: Node = document.create_comment("").into();
		parent.append_child(&placeholder).map_err(dom_error)?;
		Ok(Self {
			parent: parent.clone(),
			first: placeholder.clone(),
			last: placeholder,
		})
	}

	#[must_use]
	pub fn parent_node(&self) -> &Node {
		&self.parent
	}

	#[must_use]
	pub fn first_node(&self) -> &Node {
		&self.first
	}

	#[must_use]
	pub fn last_node(&self) -> &Node {
		&self.last
	}

	/// Replaces the range's content with `nodes`, in place.
	///
	/// # Errors
	///
	/// Iff a DOM operation fails. The range may be left partially updated.
	#[instrument(skip(nodes), fields(nodes.len = nodes.len()))]
	pub fn set_content(&mut self, document: &Document, nodes: &[Node]) -> Result<()> {
		let next_sibling = self.last.next_sibling();
		self.remove_nodes()?;

		let (first, last) = match (nodes.first(), nodes.last()) {
			(Some(first), Some(last)) => {
				for node in nodes {
					self.parent.insert_before(node, next_sibling.as_ref()).map_err(dom_error)?;
				}
				(first.clone(), last.clone())
			}
			_ => {
				let placeholder: Node = document.create_comment("").into();
				self.parent.insert_before(&placeholder, next_sibling.as_ref()).map_err(dom_error)?;
				(placeholder.clone(), placeholder)
			}
		};
		self.first = first;
		self.last = last;
		Ok(())
	}

	/// Moves the whole range in front of `reference`, or to the end of its parent.
	///
	/// Use this to mirror [`Env::move_item`](`crate::Env::move_item`) with `reference` set to the next item's first node.
	///
	/// # Errors
	///
	/// Iff a DOM operation fails. The range may be left split up.
	#[instrument(skip(self))]
	pub fn move_before(&self, reference: Option<&Node>) -> Result<()> {
		let mut nodes = vec![self.first.clone()];
		while !nodes[nodes.len() - 1].is_same_node(Some(&self.last)) {
			match nodes[nodes.len() - 1].next_sibling() {
				Some(next) => nodes.push(next),
				None => break,
			}
		}
		for node in &nodes {
			self.parent.insert_before(node, reference).map_err(dom_error)?;
		}
		Ok(())
	}

	/// Empties the range, leaving only a placeholder behind.
	///
	/// # Errors
	///
	/// Iff a DOM operation fails.
	pub fn clear(&mut self, document: &Document) -> Result<()> {
		trace!("Clearing DOM range.");
		self.set_content(document, &[])
	}

	/// Detaches the whole range, placeholder included.
	///
	/// # Errors
	///
	/// Iff a DOM operation fails.
	pub fn remove(self) -> Result<()> {
		trace!("Removing DOM range.");
		self.remove_nodes()
	}

	fn remove_nodes(&self) -> Result<()> {
		let mut current = Some(self.first.clone());
		while let Some(node) = current {
			current = if node.is_same_node(Some(&self.last)) { None } else { node.next_sibling() };
			self.parent.remove_child(&node).map_err(dom_error)?;
		}
		Ok(())
	}
}

fn dom_error(error: JsValue) -> Error {
	let message = error
		.dyn_ref::<js_sys::Error>()
		.map_or_else(|| format!("{:?}", error), |error| String::from(error.message()));
	error!("DOM operation failed: {}", message);
	Error::Dom(message)
}
