use crate::node::Node;
use crc32fast::Hasher;
use std::collections::HashSet;

/// Generate a document seed from a document name using CRC32
pub fn get_document_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential id generator for nodes within a document
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(document_name: &str) -> Self {
        Self {
            seed: get_document_seed(document_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    /// Generate `amount` ids, none of which already occurs in `tree`
    pub fn fresh_for(&mut self, tree: &Node, amount: usize) -> Vec<String> {
        let taken: HashSet<&str> = tree.ids().into_iter().collect();
        let mut ids = Vec::with_capacity(amount);
        while ids.len() < amount {
            let id = self.new_id();
            if !taken.contains(id.as_str()) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_seed_generation() {
        assert_eq!(get_document_seed("welcome"), get_document_seed("welcome"));
        assert_ne!(get_document_seed("welcome"), get_document_seed("newsletter"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new("welcome");

        let id1 = gen.new_id();
        let id2 = gen.new_id();

        assert!(id1.ends_with("-1"));
        assert!(id2.ends_with("-2"));
        assert!(id1.starts_with(gen.seed()));
    }

    #[test]
    fn test_fresh_ids_skip_existing() {
        let tree = Node::new("s-1", "Container")
            .with_children(vec![Node::new("s-2", "Text"), Node::new("s-4", "Text")]);
        let mut gen = IdGenerator::from_seed("s");

        assert_eq!(gen.fresh_for(&tree, 2), vec!["s-3".to_string(), "s-5".to_string()]);
    }
}
