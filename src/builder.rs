use log::debug;
use thiserror::Error;
use crate::ast::{Ast, NodeId, NodeKind, Opcode};
use crate::lexer::Lexeme;
use crate::syntax::State;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum TreeBuildError {
    #[error("a {wanted} cannot be placed under a {found}")]
    Misplaced { wanted: NodeKind, found: NodeKind },
    #[error("{lexeme} is not an action")]
    NotAnAction { lexeme: Lexeme },
    #[error("cursor has no parent to ascend to")]
    NoParent,
    #[error("line ended with the cursor inside a {found}")]
    Unclosed { found: NodeKind },
    #[error("tree cannot grow past {nodes} nodes")]
    Exhausted { nodes: usize },
}

/// Builds the [`Ast`] from the (state, lexeme) pairs the analyzer accepts.
///
/// A single cursor marks the node being filled. Actions are appended as
/// leaves without moving it; functions, loops and loop bodies are entered.
#[derive(Debug)]
pub struct TreeBuilder {
    ast: Ast,
    cursor: NodeId,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        let ast = Ast::new();
        let cursor = ast.root();
        TreeBuilder { ast, cursor }
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn apply(&mut self, state: State, lexeme: Lexeme) -> Result<(), TreeBuildError> {
        match state {
            State::Function => {
                self.expect(NodeKind::Function, &[NodeKind::Root])?;
                self.open(NodeKind::Function)?;
                debug!("function #{} opened", self.ast.function_count() - 1);
            }
            State::Symbol => {
                let opcode = Opcode::from_lexeme(lexeme).ok_or(TreeBuildError::NotAnAction { lexeme })?;
                let kind = NodeKind::Action(opcode);
                self.expect(kind, &[NodeKind::Function, NodeKind::LoopBody])?;
                self.append(kind)?;
            }
            State::Loop => {
                self.expect(NodeKind::Loop, &[NodeKind::Function, NodeKind::LoopBody])?;
                self.open(NodeKind::Loop)?;
            }
            State::LoopStart => {
                self.expect(NodeKind::LoopHeader, &[NodeKind::Loop])?;
                self.append(NodeKind::LoopHeader)?;
                self.open(NodeKind::LoopBody)?;
            }
            State::LoopEnd => {
                self.expect(NodeKind::LoopFooter, &[NodeKind::LoopBody])?;
                self.ascend()?;
                self.append(NodeKind::LoopFooter)?;
                self.ascend()?;
            }
            State::Delimiter => match self.cursor_kind() {
                NodeKind::Root => {}
                NodeKind::Function => self.ascend()?,
                found => return Err(TreeBuildError::Unclosed { found }),
            },
            State::Start
            | State::End
            | State::FunctionBody
            | State::Construct
            | State::Comment
            | State::CommentStart
            | State::Error => {}
        }
        Ok(())
    }

    /// Hands out the finished tree. The cursor must be back at the root.
    pub fn finish(self) -> Result<Ast, TreeBuildError> {
        match self.cursor_kind() {
            NodeKind::Root => {
                debug!("tree built with {} nodes and {} functions", self.ast.node_count(), self.ast.function_count());
                Ok(self.ast)
            }
            found => Err(TreeBuildError::Unclosed { found }),
        }
    }

    fn cursor_kind(&self) -> NodeKind {
        self.ast.kind(self.cursor).unwrap_or(NodeKind::Root)
    }

    fn expect(&self, wanted: NodeKind, contexts: &[NodeKind]) -> Result<(), TreeBuildError> {
        let found = self.cursor_kind();
        if contexts.contains(&found) {
            Ok(())
        } else {
            Err(TreeBuildError::Misplaced { wanted, found })
        }
    }

    fn append(&mut self, kind: NodeKind) -> Result<NodeId, TreeBuildError> {
        self.ast
            .push_child(self.cursor, kind)
            .ok_or(TreeBuildError::Exhausted { nodes: self.ast.node_count() })
    }

    fn open(&mut self, kind: NodeKind) -> Result<(), TreeBuildError> {
        self.cursor = self.append(kind)?;
        Ok(())
    }

    /// Only reached from a `Function` or `LoopBody` cursor, both of which
    /// always have a parent.
    fn ascend(&mut self) -> Result<(), TreeBuildError> {
        self.cursor = self.ast.parent(self.cursor).ok_or(TreeBuildError::NoParent)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{NodeKind, Opcode};
    use crate::builder::{TreeBuildError, TreeBuilder};
    use crate::lexer::{Lexeme, Lexer};
    use crate::syntax::{Analyzer, State};

    fn build(program: &str) -> TreeBuilder {
        let mut lexer = Lexer::new(program.as_bytes());
        let mut analyzer = Analyzer::new();
        let mut builder = TreeBuilder::new();
        while !analyzer.is_finished() {
            if analyzer.needs_lexeme() {
                lexer.advance().unwrap();
            }
            let state = analyzer.step(lexer.current()).unwrap();
            builder.apply(state, lexer.current()).unwrap();
        }
        builder
    }

    fn kinds(builder: &TreeBuilder, children: &[crate::ast::NodeId]) -> Vec<NodeKind> {
        children.iter().map(|&id| builder.ast().kind(id).unwrap()).collect()
    }

    #[test]
    fn functions_per_line() {
        let builder = build("+\n\n- comment\n comment only\n[]\n");
        let ast = builder.finish().unwrap();
        assert_eq!(ast.functions().len(), 3);
        let first = ast.function(0).unwrap();
        assert_eq!(ast.children(first).iter().map(|&id| ast.kind(id).unwrap()).collect::<Vec<_>>(), vec![NodeKind::Action(Opcode::Inc)]);
    }

    #[test]
    fn loop_shape() {
        let builder = build("+[-]>\n");
        let function = builder.ast().function(0).unwrap();
        let children = builder.ast().children(function);
        assert_eq!(kinds(&builder, children), vec![NodeKind::Action(Opcode::Inc), NodeKind::Loop, NodeKind::Action(Opcode::Right)]);
        let looped = builder.ast().children(children[1]);
        assert_eq!(kinds(&builder, looped), vec![NodeKind::LoopHeader, NodeKind::LoopBody, NodeKind::LoopFooter]);
        assert_eq!(kinds(&builder, builder.ast().children(looped[1])), vec![NodeKind::Action(Opcode::Dec)]);
        assert_eq!(builder.cursor(), builder.ast().root());
    }

    // A `]` closes exactly one loop and leaves a single footer behind.
    #[test]
    fn nested_loop_close_appends_one_footer() {
        let builder = build("[[+]-]\n");
        let ast = builder.finish().unwrap();
        let function = ast.function(0).unwrap();
        assert_eq!(ast.children(function).len(), 1);
        let outer = ast.children(function)[0];
        let outer_body = ast.children(outer)[1];
        let body_kinds = ast.children(outer_body).iter().map(|&id| ast.kind(id).unwrap()).collect::<Vec<_>>();
        assert_eq!(body_kinds, vec![NodeKind::Loop, NodeKind::Action(Opcode::Dec)]);
        assert_eq!(ast.to_string().matches("loop-footer").count(), 2);
    }

    #[test]
    fn last_line_without_newline() {
        let ast = build("++").finish().unwrap();
        assert_eq!(ast.functions().len(), 1);
        assert_eq!(ast.children(ast.function(0).unwrap()).len(), 2);
    }

    #[test]
    fn structural_mismatches() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.apply(State::Symbol, Lexeme::Inc), Err(TreeBuildError::Misplaced { wanted: NodeKind::Action(Opcode::Inc), found: NodeKind::Root }));
        assert_eq!(builder.apply(State::LoopEnd, Lexeme::LoopEnd), Err(TreeBuildError::Misplaced { wanted: NodeKind::LoopFooter, found: NodeKind::Root }));
        builder.apply(State::Function, Lexeme::Inc).unwrap();
        assert_eq!(builder.apply(State::Symbol, Lexeme::Unknown), Err(TreeBuildError::NotAnAction { lexeme: Lexeme::Unknown }));
        assert_eq!(builder.apply(State::Function, Lexeme::Inc), Err(TreeBuildError::Misplaced { wanted: NodeKind::Function, found: NodeKind::Function }));
        builder.apply(State::Loop, Lexeme::LoopStart).unwrap();
        assert_eq!(builder.apply(State::Delimiter, Lexeme::Delimiter), Err(TreeBuildError::Unclosed { found: NodeKind::Loop }));
        assert_eq!(builder.finish(), Err(TreeBuildError::Unclosed { found: NodeKind::Loop }));
    }

    #[test]
    fn comments_leave_tree_alone() {
        let mut builder = TreeBuilder::new();
        builder.apply(State::Function, Lexeme::Inc).unwrap();
        let cursor = builder.cursor();
        let before = builder.ast().node_count();
        builder.apply(State::CommentStart, Lexeme::Comment).unwrap();
        builder.apply(State::Comment, Lexeme::LoopStart).unwrap();
        builder.apply(State::Comment, Lexeme::Unknown).unwrap();
        assert_eq!((builder.cursor(), builder.ast().node_count()), (cursor, before));
    }

    #[test]
    fn root_cannot_ascend() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.ascend(), Err(TreeBuildError::NoParent));
        assert_eq!(builder.cursor(), builder.ast().root());
        builder.apply(State::Function, Lexeme::Inc).unwrap();
        builder.ascend().unwrap();
        assert_eq!(builder.ascend(), Err(TreeBuildError::NoParent));
    }
}
