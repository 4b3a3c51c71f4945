//! Per-function control-flow graph construction.
//!
//! Grounded on `compiler/src/cfg.cpp`'s `CFGBuilder`: a function body is
//! threaded into basic blocks by walking its statements in reverse, from the
//! implicit exit block back to the entry, so every block already knows its
//! successor(s) by the time it is created. `if`/`while` conditions that fold
//! to a compile-time constant (via `constexpr.rs`) mark the dead branch's
//! edge as unreachable rather than omitting it — the branch still appears in
//! the graph (useful for `-cfg-dump`), it just carries `reachable: false`.
//!
//! One simplification from the original: each leaf statement gets its own
//! block rather than runs of straight-line statements sharing one block.
//! The resulting graph has more blocks but identical edges and reachability,
//! and is simpler to build and to serialise for `-cfg-dump`.
//!
//! `For` and `defer` bodies are treated as opaque leaves, matching
//! `resolved.rs`'s note that `insert_stmt` in the original never recurses
//! into a `ResolvedForStmt`.

use crate::resolved::{ResolvedBlock, ResolvedStmt, ResolvedStmtKind};
use crate::source::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A short, dump-friendly description of the statement a block carries.
/// Not reparseable; purely diagnostic (unlike `printer::print_file`, which
/// emits real saplang source).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlockStmt {
    pub location: SourceLocation,
    pub label: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CfgEdge {
    pub target: BlockId,
    pub reachable: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    /// `None` for the synthetic exit block.
    pub stmt: Option<BlockStmt>,
    pub successors: Vec<CfgEdge>,
}

/// A function's control-flow graph: `entry` is where execution begins,
/// `exit` is a single synthetic sink every `return` (and fallthrough) edge
/// eventually reaches.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Cfg {
    pub entry: BlockId,
    pub exit: BlockId,
    pub blocks: Vec<BasicBlock>,
}

impl Cfg {
    /// Blocks reachable from `entry` by following only `reachable: true`
    /// edges — the set the "unreachable statement" diagnostic and dead-code
    /// elimination in a real backend would both consult.
    #[must_use]
    pub fn reachable_blocks(&self) -> Vec<BlockId> {
        let mut seen = vec![false; self.blocks.len()];
        let mut stack = vec![self.entry];
        let mut order = Vec::new();
        while let Some(id) = stack.pop() {
            if seen[id.index()] {
                continue;
            }
            seen[id.index()] = true;
            order.push(id);
            for edge in &self.blocks[id.index()].successors {
                if edge.reachable {
                    stack.push(edge.target);
                }
            }
        }
        order
    }
}

struct Builder {
    blocks: Vec<BasicBlock>,
    exit: BlockId,
}

impl Builder {
    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock { id, stmt: None, successors: Vec::new() });
        id
    }

    fn add_edge(&mut self, from: BlockId, to: BlockId, reachable: bool) {
        self.blocks[from.index()].successors.push(CfgEdge { target: to, reachable });
    }

    fn insert_block(&mut self, block: &ResolvedBlock, succ: BlockId, reachable: bool) -> BlockId {
        let mut current = succ;
        for stmt in block.statements.iter().rev() {
            current = self.insert_stmt(stmt, current, reachable);
        }
        current
    }

    fn insert_stmt(&mut self, stmt: &ResolvedStmt, succ: BlockId, reachable: bool) -> BlockId {
        match &stmt.kind {
            ResolvedStmtKind::Return(_) => {
                let id = self.new_block();
                self.blocks[id.index()].stmt = Some(BlockStmt { location: stmt.location.clone(), label: "return".to_string() });
                self.add_edge(id, self.exit, reachable);
                id
            }
            ResolvedStmtKind::Block(inner) => self.insert_block(inner, succ, reachable),
            ResolvedStmtKind::If { condition, then_block, else_block } => {
                let folded = condition.constant.and_then(|c| c.as_bool());
                let then_reachable = reachable && folded != Some(false);
                let else_reachable = reachable && folded != Some(true);
                let then_entry = self.insert_block(then_block, succ, then_reachable);
                let else_entry = match else_block {
                    Some(b) => self.insert_block(b, succ, else_reachable),
                    None => succ,
                };
                let id = self.new_block();
                self.blocks[id.index()].stmt = Some(BlockStmt { location: stmt.location.clone(), label: "if".to_string() });
                self.add_edge(id, then_entry, then_reachable);
                self.add_edge(id, else_entry, else_reachable);
                id
            }
            ResolvedStmtKind::While { condition, body } => {
                let folded = condition.constant.and_then(|c| c.as_bool());
                let cond_id = self.new_block();
                let body_reachable = reachable && folded != Some(false);
                let body_entry = self.insert_block(body, cond_id, body_reachable);
                self.blocks[cond_id.index()].stmt = Some(BlockStmt { location: stmt.location.clone(), label: "while".to_string() });
                self.add_edge(cond_id, body_entry, body_reachable);
                // The loop-exit edge is unreachable only when the condition
                // folds to a constant `true` (an infinite loop never falls through).
                self.add_edge(cond_id, succ, reachable && folded != Some(true));
                cond_id
            }
            ResolvedStmtKind::Decl(_) => self.leaf(stmt, succ, reachable, "decl"),
            ResolvedStmtKind::Assignment { .. } => self.leaf(stmt, succ, reachable, "assignment"),
            ResolvedStmtKind::Expr(_) => self.leaf(stmt, succ, reachable, "expr"),
            // Opaque per resolved.rs's grounding note: no sub-CFG for the
            // loop body is built, matching the original's stubbed `for`.
            ResolvedStmtKind::For { .. } => self.leaf(stmt, succ, reachable, "for"),
        }
    }

    fn leaf(&mut self, stmt: &ResolvedStmt, succ: BlockId, reachable: bool, label: &str) -> BlockId {
        let id = self.new_block();
        self.blocks[id.index()].stmt = Some(BlockStmt { location: stmt.location.clone(), label: label.to_string() });
        self.add_edge(id, succ, reachable);
        id
    }
}

/// Builds the control-flow graph for one function body.
#[must_use]
pub fn build(body: &ResolvedBlock) -> Cfg {
    let mut builder = Builder { blocks: Vec::new(), exit: BlockId(0) };
    let exit = builder.new_block();
    builder.exit = exit;
    let entry = builder.insert_block(body, exit, true);
    Cfg { entry, exit, blocks: builder.blocks }
}

#[cfg(test)]
mod tests {
    use super::build;
    use crate::resolved::{ResolvedBlock, ResolvedExpr, ResolvedExprKind, ResolvedStmt, ResolvedStmtKind};
    use crate::source::SourceFile;
    use crate::types::Type;
    use crate::value::ConstantValue;

    fn loc() -> crate::source::SourceLocation {
        SourceFile::new("t.sl", "").location_at(1, 1, 0)
    }

    fn const_bool_expr(value: bool) -> ResolvedExpr {
        ResolvedExpr {
            location: loc(),
            ty: Type::bool_(),
            constant: Some(ConstantValue::Bool(value)),
            kind: ResolvedExprKind::Literal(ConstantValue::Bool(value)),
        }
    }

    #[test]
    fn straight_line_return_reaches_exit() {
        let body = ResolvedBlock {
            statements: vec![ResolvedStmt { location: loc(), kind: ResolvedStmtKind::Return(None) }],
        };
        let cfg = build(&body);
        assert_eq!(cfg.blocks.len(), 2); // return block + exit
        let reachable = cfg.reachable_blocks();
        assert!(reachable.contains(&cfg.entry));
        assert!(reachable.contains(&cfg.exit));
    }

    #[test]
    fn constant_false_condition_marks_then_branch_unreachable() {
        let then_block = ResolvedBlock {
            statements: vec![ResolvedStmt { location: loc(), kind: ResolvedStmtKind::Return(None) }],
        };
        let body = ResolvedBlock {
            statements: vec![ResolvedStmt {
                location: loc(),
                kind: ResolvedStmtKind::If { condition: const_bool_expr(false), then_block, else_block: None },
            }],
        };
        let cfg = build(&body);
        let if_block = &cfg.blocks[cfg.entry.index()];
        let then_edge = if_block.successors.iter().find(|e| e.target != cfg.exit).unwrap();
        assert!(!then_edge.reachable);
    }

    #[test]
    fn infinite_while_marks_exit_edge_unreachable() {
        let body = ResolvedBlock {
            statements: vec![ResolvedStmt {
                location: loc(),
                kind: ResolvedStmtKind::While { condition: const_bool_expr(true), body: ResolvedBlock::default() },
            }],
        };
        let cfg = build(&body);
        let while_block = &cfg.blocks[cfg.entry.index()];
        assert!(while_block.successors.iter().any(|e| !e.reachable));
    }
}
