use crate::error::{Error, Result};
use crate::models::Comment;

/// Nesting deeper than this is taken as a malformed tree rather than a real
/// conversation.
pub const MAX_DEPTH: u32 = 1024;

/// A comment with its replies still attached, in server order.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub comment: Comment,
    pub children: Vec<TreeNode>,
}

/// Flattens a reply tree into a single depth-annotated sequence.
///
/// Pre-order depth-first: each comment comes immediately before all of its
/// descendants, and a whole subtree before the next sibling subtree. Sibling
/// and child order are kept exactly as supplied; sorting is a property of
/// which tree was fetched, not of flattening. An empty forest flattens to an
/// empty sequence.
pub fn flatten(roots: Vec<TreeNode>) -> Result<Vec<Comment>> {
    let mut out = Vec::new();
    let mut stack: Vec<(TreeNode, u32)> = roots.into_iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            return Err(Error::MalformedTree(format!(
                "comment {} nested deeper than {MAX_DEPTH}",
                node.comment.fullname
            )));
        }
        let TreeNode { mut comment, children } = node;
        comment.depth = depth;
        out.push(comment);
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Distinguished, VoteState};

    fn comment(fullname: &str) -> Comment {
        Comment {
            fullname: fullname.into(),
            author: "a".into(),
            body: String::new(),
            score: 0,
            vote: VoteState::None,
            created_utc: 0,
            edited_utc: None,
            depth: 0,
            is_submitter: false,
            distinguished: Distinguished::None,
            score_hidden: false,
        }
    }

    fn node(fullname: &str, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            comment: comment(fullname),
            children,
        }
    }

    #[test]
    fn empty_forest_flattens_to_empty_sequence() {
        assert!(flatten(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn preorder_with_depths() {
        // a
        // ├── b
        // │   └── c
        // └── d
        // e
        let roots = vec![
            node("a", vec![node("b", vec![node("c", vec![])]), node("d", vec![])]),
            node("e", vec![]),
        ];
        let flat = flatten(roots).unwrap();
        let got: Vec<(&str, u32)> = flat.iter().map(|c| (c.fullname.as_str(), c.depth)).collect();
        assert_eq!(
            got,
            vec![("a", 0), ("b", 1), ("c", 2), ("d", 1), ("e", 0)]
        );
    }

    #[test]
    fn sibling_order_is_preserved_verbatim() {
        let roots = vec![
            node("z", vec![]),
            node("m", vec![]),
            node("a", vec![]),
        ];
        let flat = flatten(roots).unwrap();
        let names: Vec<&str> = flat.iter().map(|c| c.fullname.as_str()).collect();
        assert_eq!(names, vec!["z", "m", "a"]);
    }

    #[test]
    fn pathological_nesting_is_rejected_whole() {
        let mut tree = node("leaf", vec![]);
        for i in 0..=MAX_DEPTH {
            tree = node(&format!("n{i}"), vec![tree]);
        }
        match flatten(vec![tree]) {
            Err(Error::MalformedTree(_)) => {}
            other => panic!("expected MalformedTree, got {other:?}"),
        }
    }
}
