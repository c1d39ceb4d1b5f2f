#![allow(dead_code)]

use morph_reconcile::{render_fn, Block, BlockOptions, CompiledTemplate, Env, Error, MorphId, MorphTree, RenderArgs, RenderNode, RenderResult, Result};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	Null,
	Str(String),
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Str(value.to_owned())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
	pub id: usize,
	pub parent: Option<usize>,
}

pub struct Template {
	pub arity: usize,
	pub text: &'static str,
}

impl CompiledTemplate for Template {
	fn arity(&self) -> usize {
		self.arity
	}
}

#[derive(Debug, Clone)]
pub struct Rendered {
	pub node: MorphId,
}

impl RenderResult<TestEnv> for Rendered {
	fn revalidate_with(
		&self,
		env: &mut TestEnv,
		_tree: &mut MorphTree<TestEnv>,
		self_value: Option<Value>,
		call_args: &[Value],
		visitor: &mut Vec<MorphId>,
	) -> Result<()> {
		env.events.push(Event::Revalidate {
			node: self.node,
			self_value,
			call_args: call_args.to_vec(),
		});
		visitor.push(self.node);
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	WillCleanup(MorphId, bool),
	Cleanup(MorphId),
	DestroyHook(MorphId),
	Clear(MorphId),
	Destroy(MorphId),
	DidCleanup(MorphId, bool),
	FreshScope(usize),
	ChildScope { parent: usize, scope: usize },
	BindShadow { parent: Option<usize>, scope: usize, options: Option<String> },
	BindSelf { scope: usize, value: Value },
	BindBlock { scope: usize, name: Option<String>, arity: usize },
	Render { node: MorphId, scope: usize, call_args: Vec<Value> },
	Revalidate { node: MorphId, self_value: Option<Value>, call_args: Vec<Value> },
	InsertItem { item: MorphId, before: Option<MorphId> },
	MoveItem { item: MorphId, before: Option<MorphId> },
}

#[derive(Debug, thiserror::Error)]
#[error("injected hook failure")]
pub struct InjectedFailure;

/// Records every hook call. Content is the rendered text of a node.
#[derive(Default)]
pub struct TestEnv {
	pub events: Vec<Event>,
	pub fail_cleanup_of: Option<MorphId>,
	next_scope: usize,
}

impl TestEnv {
	pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
		self.events.iter().filter(|event| predicate(event)).count()
	}

	pub fn position(&self, event: &Event) -> usize {
		self.events
			.iter()
			.position(|e| e == event)
			.unwrap_or_else(|| panic!("{:?} not recorded in {:#?}", event, self.events))
	}

	pub fn take_events(&mut self) -> Vec<Event> {
		std::mem::take(&mut self.events)
	}

	fn new_scope(&mut self, parent: Option<usize>) -> Scope {
		let id = self.next_scope;
		self.next_scope += 1;
		Scope { id, parent }
	}
}

impl Env for TestEnv {
	type Content = String;
	type Scope = Scope;
	type Value = Value;
	type ShadowOptions = String;
	type Template = Template;
	type Rendered = Rendered;
	type Visitor = Vec<MorphId>;

	fn clear(&mut self, node: &mut RenderNode<Self>) -> Result<()> {
		node.content = None;
		self.events.push(Event::Clear(node.id()));
		Ok(())
	}

	fn destroy(&mut self, node: &mut RenderNode<Self>) -> Result<()> {
		self.events.push(Event::Destroy(node.id()));
		Ok(())
	}

	fn insert_item(&mut self, tree: &mut MorphTree<Self>, item: MorphId, before: Option<MorphId>) -> Result<()> {
		assert!(!tree.node(item)?.is_rendered());
		self.events.push(Event::InsertItem { item, before });
		Ok(())
	}

	fn move_item(&mut self, _tree: &mut MorphTree<Self>, item: MorphId, before: Option<MorphId>) -> Result<()> {
		self.events.push(Event::MoveItem { item, before });
		Ok(())
	}

	fn will_cleanup_tree(&mut self, node: &RenderNode<Self>, destroy_self: bool) -> Result<()> {
		self.events.push(Event::WillCleanup(node.id(), destroy_self));
		Ok(())
	}

	fn cleanup_render_node(&mut self, node: &RenderNode<Self>) -> Result<()> {
		if self.fail_cleanup_of == Some(node.id()) {
			return Err(Error::hook(InjectedFailure));
		}
		self.events.push(Event::Cleanup(node.id()));
		Ok(())
	}

	fn destroy_render_node(&mut self, node: &RenderNode<Self>) -> Result<()> {
		self.events.push(Event::DestroyHook(node.id()));
		Ok(())
	}

	fn did_cleanup_tree(&mut self, node: &RenderNode<Self>, destroy_self: bool) -> Result<()> {
		self.events.push(Event::DidCleanup(node.id(), destroy_self));
		Ok(())
	}

	fn create_fresh_scope(&mut self) -> Scope {
		let scope = self.new_scope(None);
		self.events.push(Event::FreshScope(scope.id));
		scope
	}

	fn create_child_scope(&mut self, parent: &Scope) -> Scope {
		let scope = self.new_scope(Some(parent.id));
		self.events.push(Event::ChildScope {
			parent: parent.id,
			scope: scope.id,
		});
		scope
	}

	fn bind_shadow_scope(&mut self, parent: Option<&Scope>, scope: &mut Scope, options: Option<&String>) -> Result<()> {
		self.events.push(Event::BindShadow {
			parent: parent.map(|parent| parent.id),
			scope: scope.id,
			options: options.cloned(),
		});
		Ok(())
	}

	fn bind_self(&mut self, scope: &mut Scope, self_value: Value) -> Result<()> {
		self.events.push(Event::BindSelf { scope: scope.id, value: self_value });
		Ok(())
	}

	fn bind_block(&mut self, scope: &mut Scope, block: &Rc<Block<Self>>, name: Option<&str>) -> Result<()> {
		self.events.push(Event::BindBlock {
			scope: scope.id,
			name: name.map(str::to_owned),
			arity: block.arity(),
		});
		Ok(())
	}
}

/// A block that writes its template text into the render node.
pub fn text_block(text: &'static str, options: BlockOptions<TestEnv>) -> Block<TestEnv> {
	Block::new(
		render_fn(|template: &Template, env: &mut TestEnv, tree: &mut MorphTree<TestEnv>, scope: &mut Scope, args: RenderArgs<'_, TestEnv>| {
			env.events.push(Event::Render {
				node: args.render_node,
				scope: scope.id,
				call_args: args.call_args.to_vec(),
			});
			tree.node_mut(args.render_node)?.content = Some(template.text.to_owned());
			Ok(Rendered { node: args.render_node })
		}),
		Rc::new(Template { arity: 0, text }),
		options,
	)
}

/// Gives `node` content and a render result, as if a block had rendered into it.
pub fn fake_render(tree: &mut MorphTree<TestEnv>, node: MorphId, text: &str) {
	let node_ref = tree.node_mut(node).unwrap();
	node_ref.content = Some(text.to_owned());
	node_ref.last_result = Some(Rendered { node });
	node_ref.last_yielded = Some(Value::from(text));
}
