use std::fmt::{Display, Formatter};
use crate::lexer::Lexeme;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Opcode {
    Inc,
    Dec,
    Left,
    Right,
    Input,
    Output,
    Up,
    Down,
    Call,
    Return,
    Syscall,
}

impl Opcode {
    pub fn from_lexeme(lexeme: Lexeme) -> Option<Opcode> {
        match lexeme {
            Lexeme::Inc => Some(Opcode::Inc),
            Lexeme::Dec => Some(Opcode::Dec),
            Lexeme::Left => Some(Opcode::Left),
            Lexeme::Right => Some(Opcode::Right),
            Lexeme::Input => Some(Opcode::Input),
            Lexeme::Output => Some(Opcode::Output),
            Lexeme::Up => Some(Opcode::Up),
            Lexeme::Down => Some(Opcode::Down),
            Lexeme::Call => Some(Opcode::Call),
            Lexeme::Return => Some(Opcode::Return),
            Lexeme::Syscall => Some(Opcode::Syscall),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Opcode::Inc => '+',
            Opcode::Dec => '-',
            Opcode::Left => '<',
            Opcode::Right => '>',
            Opcode::Input => ',',
            Opcode::Output => '.',
            Opcode::Up => '^',
            Opcode::Down => 'v',
            Opcode::Call => ':',
            Opcode::Return => ';',
            Opcode::Syscall => '%',
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Function,
    Loop,
    LoopHeader,
    LoopBody,
    LoopFooter,
    Action(Opcode),
}

/// Index of a node inside its [`Ast`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Program tree stored as an arena.
///
/// Node 0 is the root; its children are the top-level functions in line
/// order. Children keep insertion order and are never reordered. Once built,
/// the tree is only handed out by shared reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    pub fn new() -> Self {
        Ast {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    /// The function table: root's children in source order.
    pub fn functions(&self) -> &[NodeId] {
        self.children(NodeId::ROOT)
    }

    pub fn function(&self, index: usize) -> Option<NodeId> {
        self.functions().get(index).copied()
    }

    /// Nodes in the arena, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions().len()
    }

    /// True when the program defines no functions.
    pub fn is_empty(&self) -> bool {
        self.function_count() == 0
    }

    /// Appends a node under `parent`. Returns `None` if `parent` does not
    /// exist or the arena cannot grow.
    pub(crate) fn push_child(&mut self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        let id = NodeId(self.nodes.len());
        self.nodes.try_reserve(1).ok()?;
        let node = self.nodes.get_mut(parent.0)?;
        node.children.try_reserve(1).ok()?;
        node.children.push(id);
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        Some(id)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Root => f.write_str("root"),
            NodeKind::Function => f.write_str("function"),
            NodeKind::Loop => f.write_str("loop"),
            NodeKind::LoopHeader => f.write_str("loop-header"),
            NodeKind::LoopBody => f.write_str("loop-body"),
            NodeKind::LoopFooter => f.write_str("loop-footer"),
            NodeKind::Action(opcode) => write!(f, "action '{}'", opcode.symbol()),
        }
    }
}

/// Renders the tree one node per line, children indented under their parent.
impl Display for Ast {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if depth > 0 {
                write!(f, "{}└── ", "    ".repeat(depth - 1))?;
            }
            match node.kind {
                NodeKind::Function => {
                    let index = self.functions().iter().position(|&other| other == id).unwrap_or_default();
                    writeln!(f, "{} #{index}", node.kind)?;
                }
                kind => writeln!(f, "{kind}")?,
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        Ok(())
    }
}
