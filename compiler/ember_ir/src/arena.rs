//! Arena allocation for the flat AST.
//!
//! All nodes of one script live in contiguous vectors. Children are `ExprId`
//! indices and child lists are `ExprRange`s into side tables, so a parsed
//! script is a handful of allocations that are dropped together.

use std::fmt;

use crate::ast::{
    Expr, FunctionDef, FunctionId, MapEntry, Param, TemplatePart, TryClause, TryId,
};
use crate::{ExprId, ExprRange};

#[inline]
fn index_u32(len: usize) -> u32 {
    // Sources are limited to u32::MAX bytes by `Span`, and every node covers
    // at least one byte, so table lengths fit.
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Contiguous storage for every node of one script.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ExprArena {
    exprs: Vec<Expr>,
    expr_lists: Vec<ExprId>,
    params: Vec<Param>,
    map_entries: Vec<MapEntry>,
    template_parts: Vec<TemplatePart>,
    functions: Vec<FunctionDef>,
    tries: Vec<TryClause>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 node per 6 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 6;
        ExprArena {
            exprs: Vec::with_capacity(estimated),
            expr_lists: Vec::with_capacity(estimated / 2),
            ..Self::default()
        }
    }

    // ===== Expressions =====

    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(index_u32(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Iterate over every node in allocation order.
    pub fn exprs(&self) -> impl Iterator<Item = (ExprId, &Expr)> {
        self.exprs
            .iter()
            .enumerate()
            .map(|(i, e)| (ExprId::new(index_u32(i)), e))
    }

    // ===== Expression lists =====

    pub fn alloc_expr_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len();
        self.expr_lists.extend(exprs);
        ExprRange::new(index_u32(start), index_u32(self.expr_lists.len() - start))
    }

    #[inline]
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.to_range()]
    }

    // ===== Parameters =====

    pub fn alloc_params(&mut self, params: impl IntoIterator<Item = Param>) -> ExprRange {
        let start = self.params.len();
        self.params.extend(params);
        ExprRange::new(index_u32(start), index_u32(self.params.len() - start))
    }

    #[inline]
    pub fn get_params(&self, range: ExprRange) -> &[Param] {
        &self.params[range.to_range()]
    }

    // ===== Map entries =====

    pub fn alloc_map_entries(&mut self, entries: impl IntoIterator<Item = MapEntry>) -> ExprRange {
        let start = self.map_entries.len();
        self.map_entries.extend(entries);
        ExprRange::new(index_u32(start), index_u32(self.map_entries.len() - start))
    }

    #[inline]
    pub fn get_map_entries(&self, range: ExprRange) -> &[MapEntry] {
        &self.map_entries[range.to_range()]
    }

    // ===== Template parts =====

    pub fn alloc_template_parts(
        &mut self,
        parts: impl IntoIterator<Item = TemplatePart>,
    ) -> ExprRange {
        let start = self.template_parts.len();
        self.template_parts.extend(parts);
        ExprRange::new(
            index_u32(start),
            index_u32(self.template_parts.len() - start),
        )
    }

    #[inline]
    pub fn get_template_parts(&self, range: ExprRange) -> &[TemplatePart] {
        &self.template_parts[range.to_range()]
    }

    // ===== Functions =====

    pub fn alloc_function(&mut self, function: FunctionDef) -> FunctionId {
        let id = FunctionId(index_u32(self.functions.len()));
        self.functions.push(function);
        id
    }

    #[inline]
    #[track_caller]
    pub fn get_function(&self, id: FunctionId) -> &FunctionDef {
        &self.functions[id.index()]
    }

    // ===== Try clauses =====

    pub fn alloc_try(&mut self, clause: TryClause) -> TryId {
        let id = TryId(index_u32(self.tries.len()));
        self.tries.push(clause);
        id
    }

    #[inline]
    #[track_caller]
    pub fn get_try(&self, id: TryId) -> &TryClause {
        &self.tries[id.index()]
    }

    /// Discard nodes allocated after `mark`.
    ///
    /// Used by the parser to roll back a speculative parse. Only valid while
    /// nothing allocated before the mark refers to the discarded nodes.
    pub fn truncate(&mut self, mark: ArenaMark) {
        self.exprs.truncate(mark.exprs);
        self.expr_lists.truncate(mark.expr_lists);
        self.params.truncate(mark.params);
        self.map_entries.truncate(mark.map_entries);
        self.template_parts.truncate(mark.template_parts);
        self.functions.truncate(mark.functions);
        self.tries.truncate(mark.tries);
    }

    /// Snapshot of every table length, for `truncate`.
    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            exprs: self.exprs.len(),
            expr_lists: self.expr_lists.len(),
            params: self.params.len(),
            map_entries: self.map_entries.len(),
            template_parts: self.template_parts.len(),
            functions: self.functions.len(),
            tries: self.tries.len(),
        }
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprArena")
            .field("exprs", &self.exprs.len())
            .field("functions", &self.functions.len())
            .field("tries", &self.tries.len())
            .finish_non_exhaustive()
    }
}

/// Table lengths at a point in time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArenaMark {
    exprs: usize,
    expr_lists: usize,
    params: usize,
    map_entries: usize,
    template_parts: usize,
    functions: usize,
    tries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::Span;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = ExprArena::new();
        let one = arena.alloc_expr(Expr::new(ExprKind::Int(1), Span::new(0, 1)));
        let two = arena.alloc_expr(Expr::new(ExprKind::Int(2), Span::new(2, 3)));
        let list = arena.alloc_expr_list([one, two]);

        assert_eq!(arena.get_expr(one).kind, ExprKind::Int(1));
        assert_eq!(arena.get_expr_list(list), &[one, two]);
        assert_eq!(arena.expr_count(), 2);
    }

    #[test]
    fn test_truncate_rolls_back() {
        let mut arena = ExprArena::new();
        arena.alloc_expr(Expr::new(ExprKind::Null, Span::DUMMY));
        let mark = arena.mark();
        let a = arena.alloc_expr(Expr::new(ExprKind::Bool(true), Span::DUMMY));
        arena.alloc_expr_list([a]);
        arena.truncate(mark);

        assert_eq!(arena.expr_count(), 1);
        assert_eq!(arena.mark(), mark);
    }
}
