use crate::morph::{Key, MorphId};
use std::error::Error as StdError;

/// Errors surfaced by render-node bookkeeping.
///
/// Apart from [`Error::Hook`] (and [`Error::Dom`] with the `"web"` feature), every variant is a contract violation by the caller.
/// None of them are recovered from internally: Cleanup that was still pending when one of them surfaced is skipped,
/// which can leave the affected subtree partially torn down. Treat that subtree as unusable.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	#[error("render node {0} was destroyed")]
	Destroyed(MorphId),

	#[error("render node {0} still owns child nodes or list items and must be cleared before it's destroyed")]
	NotCleared(MorphId),

	#[error("render node {item} is not an item of the morph list owned by {owner}")]
	NotInList { owner: MorphId, item: MorphId },

	#[error("the morph list owned by {owner} already contains key {key:?}")]
	KeyExists { owner: MorphId, key: Key },

	#[error("key {key:?} was yielded into {parent} more than once during one render pass")]
	DuplicateKey { parent: MorphId, key: Key },

	/// A hook provided by an [`Env`](`crate::Env`) failed.
	#[error("render hook failed")]
	Hook(#[source] Box<dyn StdError + 'static>),

	#[cfg(feature = "web")]
	#[error("DOM operation failed: {0}")]
	Dom(String),
}

impl Error {
	/// Wraps a hook's own error type.
	pub fn hook(error: impl Into<Box<dyn StdError + 'static>>) -> Self {
		Self::Hook(error.into())
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
