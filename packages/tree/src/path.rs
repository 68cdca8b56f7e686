//! # Path Addressing
//!
//! Positional string addresses into a tree:
//!
//! ```text
//! path    := segment ('.' segment)*
//! segment := name ('[' index ']')?
//! ```
//!
//! The first segment is always `root`. Every following segment is
//! `children[i]`, selecting the zero-based child `i` of the node addressed
//! so far. `root.children[0].children[1]` is the second child of the
//! first child of the root.
//!
//! Paths shift whenever siblings are inserted or removed. Ids are the
//! stable address; paths are for click targets, AI requests and debugging.

use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use std::fmt;
use std::str::FromStr;

pub const ROOT_SEGMENT: &str = "root";
pub const CHILDREN_SEGMENT: &str = "children";

/// One `name[index]` segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

/// Parsed, well-formed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Child positions below the root
    positions: Vec<usize>,
}

impl Path {
    pub fn root() -> Self {
        Self {
            positions: Vec::new(),
        }
    }

    pub fn from_positions(positions: Vec<usize>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn child(&self, index: usize) -> Self {
        let mut positions = self.positions.clone();
        positions.push(index);
        Self { positions }
    }

    pub fn is_root(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn segments(&self) -> Vec<Segment> {
        std::iter::once(Segment {
            name: ROOT_SEGMENT.to_string(),
            index: None,
        })
        .chain(self.positions.iter().map(|&index| Segment {
            name: CHILDREN_SEGMENT.to_string(),
            index: Some(index),
        }))
        .collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT_SEGMENT)?;
        for index in &self.positions {
            write!(f, ".{}[{}]", CHILDREN_SEGMENT, index)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TreeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut positions = Vec::new();

        for (i, raw) in input.split('.').enumerate() {
            let segment = parse_segment(input, raw)?;

            if i == 0 {
                if segment.name != ROOT_SEGMENT || segment.index.is_some() {
                    return Err(TreeError::syntax(input, "path must start with 'root'"));
                }
                continue;
            }

            match (segment.name.as_str(), segment.index) {
                (CHILDREN_SEGMENT, Some(index)) => positions.push(index),
                (CHILDREN_SEGMENT, None) => {
                    return Err(TreeError::syntax(input, "'children' needs an index"));
                }
                (name, _) => {
                    return Err(TreeError::syntax(input, format!("unknown segment '{}'", name)));
                }
            }
        }

        Ok(Self { positions })
    }
}

fn parse_segment(path: &str, raw: &str) -> TreeResult<Segment> {
    let (name, index) = match raw.find('[') {
        Some(open) => {
            let rest = &raw[open + 1..];
            let digits = rest
                .strip_suffix(']')
                .ok_or_else(|| TreeError::syntax(path, format!("unclosed index in '{}'", raw)))?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TreeError::syntax(path, format!("bad index in '{}'", raw)));
            }
            let index = digits
                .parse::<usize>()
                .map_err(|_| TreeError::syntax(path, format!("index out of range in '{}'", raw)))?;
            (&raw[..open], Some(index))
        }
        None => (raw, None),
    };

    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(TreeError::syntax(path, format!("bad segment name '{}'", raw)));
    }

    Ok(Segment {
        name: name.to_string(),
        index,
    })
}

/// Resolve a parsed path; `None` when any position is out of range
pub fn resolve_path<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
    path.positions()
        .iter()
        .try_fold(root, |node, &index| node.children().get(index))
}

pub(crate) fn resolve_path_mut<'a>(root: &'a mut Node, positions: &[usize]) -> Option<&'a mut Node> {
    let mut node = root;
    for &index in positions {
        node = node.children.as_mut()?.get_mut(index)?;
    }
    Some(node)
}

/// Read-side lookup. Malformed and unresolvable paths are both `None`.
pub fn resolve<'a>(root: &'a Node, path: &str) -> Option<&'a Node> {
    let parsed = path.parse::<Path>().ok()?;
    resolve_path(root, &parsed)
}

/// Mutation-side lookup. Anything that does not land on a node is
/// [`TreeError::PathInvalid`].
pub fn resolve_for_mutation<'a>(root: &'a Node, path: &str) -> TreeResult<(Path, &'a Node)> {
    let parsed = path.parse::<Path>().map_err(|e| match e {
        TreeError::PathSyntax { reason, .. } => TreeError::invalid(path, reason),
        other => other,
    })?;

    let mut node = root;
    let mut walked = Path::root();
    for &index in parsed.positions() {
        let count = node.children().len();
        node = node.children().get(index).ok_or_else(|| {
            TreeError::invalid(
                path,
                format!("{} has {} children, no index {}", walked, count, index),
            )
        })?;
        walked = walked.child(index);
    }

    Ok((parsed, node))
}

/// Child positions of the first node (pre-order) carrying `id`
pub fn position_of(root: &Node, id: &str) -> Option<Vec<usize>> {
    fn search(node: &Node, id: &str, trail: &mut Vec<usize>) -> bool {
        if node.id == id {
            return true;
        }
        for (index, child) in node.children().iter().enumerate() {
            trail.push(index);
            if search(child, id, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    let mut trail = Vec::new();
    search(root, id, &mut trail).then_some(trail)
}

/// Canonical path string of the first node (pre-order) carrying `id`
pub fn path_of(root: &Node, id: &str) -> Option<String> {
    position_of(root, id).map(|positions| Path::from_positions(positions).to_string())
}
