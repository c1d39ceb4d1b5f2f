use morph_reconcile::{clear_morph, clear_morph_list, destroy_morph, Error, MorphTree};

mod common;
use common::{fake_render, Event, TestEnv};

#[test]
fn clear_runs_hooks_children_first() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let root = tree.create_morph();
	let first = tree.create_child(root).unwrap();
	let second = tree.create_child(root).unwrap();
	let grandchild = tree.create_child(first).unwrap();
	fake_render(&mut tree, root, "root");

	clear_morph(&mut tree, root, &mut env, false).unwrap();

	assert_eq!(
		env.events,
		vec![
			Event::WillCleanup(root, false),
			Event::Cleanup(root),
			Event::Cleanup(second),
			Event::DestroyHook(second),
			Event::Cleanup(first),
			Event::DestroyHook(first),
			Event::Cleanup(grandchild),
			Event::DestroyHook(grandchild),
			Event::Clear(root),
			Event::DidCleanup(root, false),
		]
	);

	let root_node = tree.node(root).unwrap();
	assert!(root_node.last_result.is_none());
	assert!(root_node.last_yielded.is_none());
	assert!(root_node.child_nodes().is_none());
	assert!(root_node.content.is_none());

	assert_eq!(tree.len(), 1);
	for child in [first, second, grandchild] {
		assert!(!tree.contains(child));
	}
}

#[test]
fn destroy_self_runs_destroy_hook_on_the_node() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();
	let root = tree.create_morph();

	clear_morph(&mut tree, root, &mut env, true).unwrap();

	assert_eq!(
		env.events,
		vec![
			Event::WillCleanup(root, true),
			Event::Cleanup(root),
			Event::DestroyHook(root),
			Event::Clear(root),
			Event::DidCleanup(root, true),
		]
	);
}

#[test]
fn destroying_twice_is_rejected() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();
	let root = tree.create_morph();
	fake_render(&mut tree, root, "content");

	clear_morph(&mut tree, root, &mut env, true).unwrap();
	destroy_morph(&mut tree, root, &mut env).unwrap();

	assert!(matches!(destroy_morph(&mut tree, root, &mut env), Err(Error::Destroyed(id)) if id == root));
	assert!(matches!(clear_morph(&mut tree, root, &mut env, true), Err(Error::Destroyed(id)) if id == root));

	assert_eq!(env.count(|event| *event == Event::Clear(root)), 1);
	assert_eq!(env.count(|event| *event == Event::Destroy(root)), 1);
	assert!(tree.is_empty());
}

#[test]
fn stale_handles_do_not_alias_reused_slots() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let old = tree.create_morph();
	destroy_morph(&mut tree, old, &mut env).unwrap();
	let new = tree.create_morph();

	assert_ne!(old, new);
	assert!(tree.get(old).is_none());
	assert!(tree.get(new).is_some());
}

#[test]
fn clear_morph_list_destroys_every_item() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let parent = tree.create_morph();
	let a = tree.insert_keyed(parent, "a", None).unwrap();
	let b = tree.insert_keyed(parent, "b", None).unwrap();
	let nested = tree.create_child(b).unwrap();

	clear_morph_list(&mut tree, parent, &mut env).unwrap();

	for item in [a, b] {
		assert_eq!(env.count(|event| *event == Event::DestroyHook(item)), 1);
		assert_eq!(env.count(|event| *event == Event::Clear(item)), 1);
		assert_eq!(env.count(|event| *event == Event::Destroy(item)), 1);
		assert!(!tree.contains(item));
	}
	assert_eq!(env.count(|event| *event == Event::DestroyHook(nested)), 1);
	assert!(env.position(&Event::Destroy(a)) < env.position(&Event::WillCleanup(b, true)));

	let parent_node = tree.node(parent).unwrap();
	assert!(parent_node.morph_list().is_none());
	assert!(parent_node.morph_map().is_empty());
	assert_eq!(tree.len(), 1);
}

#[test]
fn clearing_an_owner_frees_its_list_items() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let parent = tree.create_morph();
	let a = tree.insert_keyed(parent, "a", None).unwrap();

	clear_morph(&mut tree, parent, &mut env, false).unwrap();

	assert!(!tree.contains(a));
	assert!(tree.node(parent).unwrap().morph_list().is_none());
	assert!(tree.node(parent).unwrap().morph_map().is_empty());
	assert_eq!(tree.len(), 1);
}

#[test]
fn failing_hook_aborts_cleanup() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let root = tree.create_morph();
	let child = tree.create_child(root).unwrap();
	fake_render(&mut tree, root, "root");
	env.fail_cleanup_of = Some(child);

	assert!(matches!(clear_morph(&mut tree, root, &mut env, false), Err(Error::Hook(_))));

	assert_eq!(env.count(|event| matches!(event, Event::Clear(_))), 0);
	assert_eq!(env.count(|event| matches!(event, Event::DidCleanup(..))), 0);
	// Partially torn down: nothing was reset or freed yet.
	assert!(tree.node(root).unwrap().last_result.is_some());
	assert!(tree.contains(child));
}

#[test]
fn destroying_an_uncleared_node_is_rejected() {
	let mut env = TestEnv::default();
	let mut tree = MorphTree::new();

	let parent = tree.create_morph();
	let child = tree.create_child(parent).unwrap();
	let owner = tree.create_morph();
	let item = tree.insert_keyed(owner, "a", None).unwrap();

	assert!(matches!(destroy_morph(&mut tree, parent, &mut env), Err(Error::NotCleared(id)) if id == parent));
	assert!(matches!(destroy_morph(&mut tree, owner, &mut env), Err(Error::NotCleared(id)) if id == owner));
	assert!(env.events.is_empty());
	assert!(tree.contains(child));
	assert!(tree.contains(item));

	for node in [parent, owner] {
		clear_morph(&mut tree, node, &mut env, true).unwrap();
		destroy_morph(&mut tree, node, &mut env).unwrap();
	}
	assert!(tree.is_empty());
}
