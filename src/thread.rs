//! Turns the flat, approved, time-ordered comment list of a post into a
//! forest of owned reply nodes.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    comment::Comment,
    store::{ContentStore, StoreError},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            children: Vec::new(),
        }
    }
}

/// One row of a depth-first walk over a thread.
#[derive(Debug, Clone, Copy)]
pub struct ThreadEntry<'a> {
    pub depth: usize,
    pub comment: &'a Comment,
}

impl ThreadEntry<'_> {
    /// Left margin used by the templates, in rem.
    pub fn indent(&self) -> usize {
        self.depth.min(6) * 2
    }
}

/// Fetches the approved comments of `post_id` and nests them.
pub async fn load_thread(
    store: &dyn ContentStore,
    post_id: &str,
) -> Result<Vec<CommentNode>, StoreError> {
    let comments = store.approved_comments(post_id).await?;
    Ok(build_tree(comments))
}

/// Nests `comments` under their parents.
///
/// A comment whose parent is not in the list (still pending moderation, or
/// gone) becomes a root rather than disappearing. Roots and siblings keep
/// the input order. Comments caught in a parent cycle are promoted to roots,
/// so every input comment is placed exactly once.
pub fn build_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let index: HashMap<&str, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    let mut parents: Vec<Option<usize>> = comments
        .iter()
        .map(|c| {
            c.parent_id
                .as_deref()
                .and_then(|p| index.get(p).copied())
        })
        .collect();
    drop(index);

    break_cycles(&mut parents);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    // Preorder from the roots; assembling it backwards finishes every child
    // before its parent.
    let mut order = Vec::with_capacity(comments.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }

    let mut slots: Vec<Option<CommentNode>> = comments
        .into_iter()
        .map(|c| Some(CommentNode::leaf(c)))
        .collect();
    for &i in order.iter().rev() {
        let kids: Vec<CommentNode> = children[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(node) = slots[i].as_mut() {
            node.children = kids;
        }
    }

    roots.iter().filter_map(|&r| slots[r].take()).collect()
}

/// Clears the parent link of every comment that lies on a parent cycle.
fn break_cycles(parents: &mut [Option<usize>]) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unseen,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unseen; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    // `i` closes a loop: everything on the path from `i` on.
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        for &member in &path[pos..] {
                            parents[member] = None;
                        }
                    }
                    break;
                }
                Mark::Unseen => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    cursor = parents[i];
                }
            }
        }
        for i in path.drain(..) {
            marks[i] = Mark::Done;
        }
    }
}

/// Depth-first preorder walk, the order a thread is read in.
pub fn flatten(roots: &[CommentNode]) -> Vec<ThreadEntry<'_>> {
    let mut entries = Vec::new();
    let mut stack: Vec<(usize, &CommentNode)> = roots.iter().rev().map(|n| (0, n)).collect();
    while let Some((depth, node)) = stack.pop() {
        entries.push(ThreadEntry {
            depth,
            comment: &node.comment,
        });
        stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
    }
    entries
}
