use super::{NodeId, Tree, TreeNode};
use crate::error::{ClockError, ClockResult};

struct RawNode {
    children: Vec<usize>,
    name: Option<String>,
    length: Option<f64>,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    raw: Vec<RawNode>,
}

/// Parse a Newick tree.
///
/// Leaves are numbered `0..n` in order of appearance; internal nodes follow in
/// post-order, so the root always carries the highest id. Missing branch
/// lengths read as `0.0`. Internal node labels are accepted and dropped.
pub fn parse_newick(input: &str) -> ClockResult<Tree> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        raw: Vec::new(),
    };

    let root_raw = parser.subtree()?;
    parser.skip_ws();
    if parser.peek() == Some(b';') {
        parser.pos += 1;
    }
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("unexpected trailing input"));
    }

    // Raw order already lists every internal node after its children.
    let raw = parser.raw;
    let mut new_id = vec![0; raw.len()];
    let mut next = 0;
    for (i, node) in raw.iter().enumerate() {
        if node.children.is_empty() {
            new_id[i] = next;
            next += 1;
        }
    }
    for (i, node) in raw.iter().enumerate() {
        if !node.children.is_empty() {
            new_id[i] = next;
            next += 1;
        }
    }

    let mut nodes: Vec<TreeNode> = (0..raw.len())
        .map(|_| TreeNode {
            parent: None,
            children: None,
            length: 0.0,
            taxon: None,
        })
        .collect();

    for (i, node) in raw.into_iter().enumerate() {
        let id: NodeId = new_id[i];
        let children = match node.children.as_slice() {
            [] => None,
            [l, r] => Some((new_id[*l], new_id[*r])),
            kids => {
                return Err(ClockError::Tree(format!(
                    "Newick node with {} children; only binary trees are supported",
                    kids.len()
                )))
            }
        };
        if let Some((l, r)) = children {
            nodes[l].parent = Some(id);
            nodes[r].parent = Some(id);
        }
        nodes[id].children = children;
        nodes[id].length = node.length.unwrap_or(0.0);
        nodes[id].taxon = node.name;
    }

    debug_assert_eq!(new_id[root_raw], nodes.len() - 1);
    Tree::assemble(nodes)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, msg: &str) -> ClockError {
        ClockError::Tree(format!("Newick parse error at byte {}: {}", self.pos, msg))
    }

    /// Parse one subtree, tracking unclosed parentheses on an explicit stack.
    fn subtree(&mut self) -> ClockResult<usize> {
        // children collected so far for each unclosed '('
        let mut open: Vec<Vec<usize>> = Vec::new();
        loop {
            self.skip_ws();
            while self.peek() == Some(b'(') {
                self.pos += 1;
                open.push(Vec::new());
                self.skip_ws();
            }
            let mut node = self.finish_node(Vec::new())?;

            loop {
                let Some(children) = open.last_mut() else {
                    return Ok(node);
                };
                children.push(node);
                self.skip_ws();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                        break;
                    }
                    Some(b')') => {
                        self.pos += 1;
                        let children = std::mem::take(children);
                        open.pop();
                        node = self.finish_node(children)?;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }
    }

    /// Read the label and length that follow a leaf or a closing ')'.
    fn finish_node(&mut self, children: Vec<usize>) -> ClockResult<usize> {
        let name = self.label()?;
        if children.is_empty() && name.is_none() {
            return Err(self.error("leaf without a taxon name"));
        }
        let length = self.length()?;

        self.raw.push(RawNode {
            children,
            name,
            length,
        });
        Ok(self.raw.len() - 1)
    }

    fn label(&mut self) -> ClockResult<Option<String>> {
        self.skip_ws();
        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let mut out = String::new();
            loop {
                match self.peek() {
                    None => return Err(self.error("unterminated quoted label")),
                    Some(b'\'') => {
                        self.pos += 1;
                        // '' inside a quoted label is a literal quote
                        if self.peek() == Some(b'\'') {
                            out.push('\'');
                            self.pos += 1;
                        } else {
                            break;
                        }
                    }
                    Some(_) => {
                        let rest = &self.bytes[self.pos..];
                        let len = rest
                            .iter()
                            .position(|&b| b == b'\'')
                            .unwrap_or(rest.len());
                        out.push_str(&String::from_utf8_lossy(&rest[..len]));
                        self.pos += len;
                    }
                }
            }
            return Ok(Some(out));
        }

        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b',' | b':' | b';') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            Ok(None)
        } else {
            Ok(Some(
                String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned(),
            ))
        }
    }

    fn length(&mut self) -> ClockResult<Option<f64>> {
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Ok(None);
        }
        self.pos += 1;
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]);
        text.parse::<f64>()
            .map(Some)
            .map_err(|_| self.error(&format!("invalid branch length '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_leaves_first_root_last() {
        let tree = parse_newick("((A:1,B:2):0.5,(C:3,D:4):0.25);").unwrap();
        assert_eq!(tree.node_count(), 7);
        assert_eq!(tree.root(), 6);
        for (id, name) in ["A", "B", "C", "D"].iter().enumerate() {
            assert_eq!(tree.taxon(id), Some(*name));
        }
        assert_eq!(tree.children(4), Some((0, 1)));
        assert_eq!(tree.children(5), Some((2, 3)));
        assert_eq!(tree.children(6), Some((4, 5)));
        assert_eq!(tree.branch_length(1), 2.0);
        assert_eq!(tree.branch_length(5), 0.25);
    }

    #[test]
    fn test_keeps_appearance_order_of_children() {
        let tree = parse_newick("(((A,B),C),D);").unwrap();
        // A0 B1 C2 D3, (A,B)=4, ((A,B),C)=5, root=6
        assert_eq!(tree.children(5), Some((4, 2)));
        assert_eq!(tree.children(6), Some((5, 3)));
    }

    #[test]
    fn test_quoted_labels_and_whitespace() {
        let tree = parse_newick(" ( 'Homo sapiens' : 1.5 , 'it''s' :2e-1 ) root ;").unwrap();
        assert_eq!(tree.taxon(0), Some("Homo sapiens"));
        assert_eq!(tree.taxon(1), Some("it's"));
        assert!((tree.branch_length(1) - 0.2).abs() < 1e-12);
        assert_eq!(tree.taxon(2), None);
    }

    #[test]
    fn test_missing_lengths_default_to_zero() {
        let tree = parse_newick("(A,B)").unwrap();
        assert_eq!(tree.branch_length(0), 0.0);
    }

    #[test]
    fn test_rejects_polytomy() {
        assert!(parse_newick("(A,B,C);").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_newick("((A,B);").is_err());
        assert!(parse_newick("(A,B);x").is_err());
        assert!(parse_newick("(A:abc,B);").is_err());
        assert!(parse_newick("(,B);").is_err());
        assert!(parse_newick("((((A,B),C);").is_err());
    }

    fn caterpillar(leaves: usize) -> String {
        let mut out = "(".repeat(leaves - 1);
        out.push_str("T0:1");
        for i in 1..leaves {
            out.push_str(&format!(",T{}:1)", i));
            if i < leaves - 1 {
                out.push_str(":1");
            }
        }
        out.push(';');
        out
    }

    #[test]
    fn test_deep_caterpillar() {
        let tree = parse_newick(&caterpillar(50_000)).unwrap();
        assert_eq!(tree.leaf_count(), 50_000);
        assert_eq!(tree.node_count(), 99_999);
        assert_eq!(tree.root(), 99_998);
        assert_eq!(tree.children(50_000), Some((0, 1)));
        assert_eq!(tree.children(99_998), Some((99_997, 49_999)));
        assert_eq!(tree.post_order().len(), 99_999);
    }
}
