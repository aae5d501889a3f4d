//! Merges a permission's bundle with its optional condition tree.
//!
//! Rules, applied per composite:
//! - a child present in both: composites merge recursively, otherwise the
//!   condition's node replaces the bundle's (a condition subtree that replaces
//!   a bundle leaf brings all of its children along)
//! - a child present only in the bundle is inherited unchanged
//! - a child present only in the condition is an inconsistent grant and fails
//!   the whole resolution

use crate::bundle::{GrantTree, Node, NodeId, join_path};
use grantstack_model::{MarshalError, MarshalResult};
use std::collections::BTreeMap;
use tracing::debug;

/// Produces the effective grant tree for a bundle and optional condition.
///
/// Without a condition the result is a copy of the bundle.
///
/// # Errors
///
/// Returns [`MarshalError::InconsistentConditionReference`] with the dotted
/// path of the first condition child the bundle lacks. No partial tree is
/// returned.
pub fn resolve(bundle: &GrantTree, condition: Option<&GrantTree>) -> MarshalResult<GrantTree> {
    let mut effective = GrantTree::new();
    let root = effective.root();
    match condition {
        None => inherit_children(&mut effective, root, bundle, bundle.root()),
        Some(condition) => merge(
            &mut effective,
            root,
            bundle,
            bundle.root(),
            condition,
            condition.root(),
            "",
        )?,
    }
    Ok(effective)
}

fn inherit_children(out: &mut GrantTree, parent: NodeId, source: &GrantTree, source_id: NodeId) {
    if let Node::Composite(children) = source.node(source_id) {
        for (name, child) in children {
            out.graft(parent, name, source, *child);
        }
    }
}

fn merge(
    out: &mut GrantTree,
    parent: NodeId,
    bundle: &GrantTree,
    bundle_id: NodeId,
    condition: &GrantTree,
    condition_id: NodeId,
    path: &str,
) -> MarshalResult<()> {
    let (Node::Composite(granted), Node::Composite(narrowed)) =
        (bundle.node(bundle_id), condition.node(condition_id))
    else {
        return Ok(());
    };

    if let Some(unknown) = narrowed.keys().find(|name| !granted.contains_key(*name)) {
        return Err(MarshalError::InconsistentConditionReference {
            path: join_path(path, unknown),
        });
    }

    for (name, &bundle_child) in granted {
        let Some(&condition_child) = narrowed.get(name) else {
            out.graft(parent, name, bundle, bundle_child);
            continue;
        };

        match (bundle.node(bundle_child), condition.node(condition_child)) {
            (Node::Composite(_), Node::Composite(_)) => {
                let id = out.attach(parent, name, Node::Composite(BTreeMap::new()));
                merge(
                    out,
                    id,
                    bundle,
                    bundle_child,
                    condition,
                    condition_child,
                    &join_path(path, name),
                )?;
            }
            _ => {
                debug!("Condition overrides `{}`", join_path(path, name));
                out.graft(parent, name, condition, condition_child);
            }
        }
    }
    Ok(())
}
