//! Grammar productions, split by level.
//!
//! - `stmt`: statements, blocks, pragmas, annotations
//! - `expr`: operators from assignment down to postfix
//! - `primary`: literals, identifiers, lambdas, collection literals

mod expr;
mod primary;
mod stmt;
