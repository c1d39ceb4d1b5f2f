use crate::{
	env::{CompiledTemplate, RenderResult},
	morph::{MorphId, MorphTree},
	render_state::{render_and_cleanup, Outcome, RenderState},
	Env, Result,
};
use std::{collections::BTreeMap, fmt, rc::Rc};
use tracing::{instrument, trace};

/// What a template render function receives besides its template, environment and scope.
pub struct RenderArgs<'a, E: Env> {
	pub render_node: MorphId,
	pub call_args: &'a [E::Value],
}

/// Renders `template` into `args.render_node`.
pub type RenderFn<E> = Rc<dyn Fn(&<E as Env>::Template, &mut E, &mut MorphTree<E>, &mut <E as Env>::Scope, RenderArgs<'_, E>) -> Result<<E as Env>::Rendered>>;

/// Wraps a closure as [`RenderFn`], pinning down its signature.
#[must_use]
pub fn render_fn<E, F>(render: F) -> RenderFn<E>
where
	E: Env,
	F: Fn(&E::Template, &mut E, &mut MorphTree<E>, &mut E::Scope, RenderArgs<'_, E>) -> Result<E::Rendered> + 'static,
{
	Rc::new(render)
}

/// Nested block(s) a [`Block`] makes available to its body.
pub enum YieldTo<E: Env> {
	/// The default yield target.
	Single(Rc<Block<E>>),
	/// Named blocks, bound in name order.
	Named(BTreeMap<String, Rc<Block<E>>>),
}

/// Bindings captured when a [`Block`] is created.
pub struct BlockOptions<E: Env> {
	/// Captured parent scope. Without one, each render starts from a fresh scope.
	pub scope: Option<E::Scope>,
	/// Default `self`, used when [`Block::invoke`] receives none.
	pub self_value: Option<E::Value>,
	pub options: Option<E::ShadowOptions>,
	pub yield_to: Option<YieldTo<E>>,
}

impl<E: Env> Default for BlockOptions<E> {
	fn default() -> Self {
		Self {
			scope: None,
			self_value: None,
			options: None,
			yield_to: None,
		}
	}
}

/// A template bound to its render function and captured bindings.
pub struct Block<E: Env> {
	render: RenderFn<E>,
	template: Rc<E::Template>,
	options: BlockOptions<E>,
}

impl<E: Env> fmt::Debug for Block<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Block").field("arity", &self.arity()).finish_non_exhaustive()
	}
}

/// Shorthand for [`Block::new`].
#[must_use]
pub fn block_for<E: Env>(render: RenderFn<E>, template: Rc<E::Template>, options: BlockOptions<E>) -> Block<E> {
	Block::new(render, template, options)
}

impl<E: Env> Block<E> {
	#[must_use]
	pub fn new(render: RenderFn<E>, template: Rc<E::Template>, options: BlockOptions<E>) -> Self {
		Self { render, template, options }
	}

	/// Number of block parameters the template expects.
	#[must_use]
	pub fn arity(&self) -> usize {
		self.template.arity()
	}

	#[must_use]
	pub fn template(&self) -> &Rc<E::Template> {
		&self.template
	}

	#[must_use]
	pub fn options(&self) -> &BlockOptions<E> {
		&self.options
	}

	/// Renders this block into `target`.
	///
	/// If `target` was rendered before, its last result is revalidated with the new `self_value`, `call_args` and `visitor`.
	/// No scope or [`RenderState`] is built in that case.
	///
	/// Otherwise a new scope is derived, shadow options, `self` and nested blocks are bound into it,
	/// and the template is rendered through [`render_and_cleanup`].
	///
	/// `self_value` of [`None`] falls back to [`BlockOptions::self_value`].
	/// [`Some`] is always bound, even if it holds a null-like value.
	///
	/// # Errors
	///
	/// [`Error::Destroyed`](`crate::Error::Destroyed`) if `target` is stale, otherwise whatever a hook or the render function reports.
	#[allow(clippy::too_many_arguments)]
	#[instrument(skip(self, env, tree, call_args, self_value, parent_scope, visitor))]
	pub fn invoke(
		&self,
		env: &mut E,
		tree: &mut MorphTree<E>,
		call_args: &[E::Value],
		self_value: Option<E::Value>,
		target: MorphId,
		parent_scope: Option<&E::Scope>,
		visitor: &mut E::Visitor,
	) -> Result<()> {
		if let Some(last_result) = tree.node(target)?.last_result.clone() {
			trace!("Revalidating.");
			return last_result.revalidate_with(env, tree, self_value, call_args, visitor);
		}

		let mut state = RenderState::new(target);
		let mut scope = match &self.options.scope {
			Some(scope) => env.create_child_scope(scope),
			None => env.create_fresh_scope(),
		};

		env.bind_shadow_scope(parent_scope, &mut scope, self.options.options.as_ref())?;

		if let Some(self_value) = self_value.or_else(|| self.options.self_value.clone()) {
			env.bind_self(&mut scope, self_value)?;
		}

		self.bind_blocks(env, &mut scope)?;

		let render = &self.render;
		let template = &self.template;
		render_and_cleanup(tree, target, env, &mut state, None, move |env, tree, state| {
			state.morph_to_clear = None;
			let rendered = render(&**template, env, tree, &mut scope, RenderArgs { render_node: target, call_args })?;
			tree.node_mut(target)?.last_result = Some(rendered);
			Ok(Outcome::Cleanup)
		})
	}

	fn bind_blocks(&self, env: &mut E, scope: &mut E::Scope) -> Result<()> {
		match &self.options.yield_to {
			None => Ok(()),
			Some(YieldTo::Single(block)) => env.bind_block(scope, block, None),
			Some(YieldTo::Named(blocks)) => blocks.iter().try_for_each(|(name, block)| env.bind_block(scope, block, Some(name.as_str()))),
		}
	}
}
