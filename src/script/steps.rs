//! The traversal step vocabulary.
//!
//! Every method is a thin delegation to one of the four append
//! primitives on [`Traversal`]; names that collide with Rust keywords
//! carry a trailing underscore (`in_`, `as_`, `loop_`). The wire name
//! stays in the engine's camelCase.

use super::query::{Args, Traversal};

impl Traversal {
    // --- Transform ---

    pub fn both(&self, args: impl Into<Args>) -> Traversal {
        self.step("both", args.into())
    }

    pub fn both_e(&self, args: impl Into<Args>) -> Traversal {
        self.step("bothE", args.into())
    }

    pub fn both_v(&self, args: impl Into<Args>) -> Traversal {
        self.step("bothV", args.into())
    }

    pub fn cap(&self, args: impl Into<Args>) -> Traversal {
        self.step("cap", args.into())
    }

    pub fn gather(&self, args: impl Into<Args>) -> Traversal {
        self.step("gather", args.into())
    }

    pub fn id(&self) -> Traversal {
        self.step("id", Args::default())
    }

    pub fn in_(&self, args: impl Into<Args>) -> Traversal {
        self.step("in", args.into())
    }

    pub fn in_e(&self, args: impl Into<Args>) -> Traversal {
        self.step("inE", args.into())
    }

    pub fn in_v(&self, args: impl Into<Args>) -> Traversal {
        self.step("inV", args.into())
    }

    pub fn property(&self, args: impl Into<Args>) -> Traversal {
        self.step("property", args.into())
    }

    pub fn label(&self) -> Traversal {
        self.step("label", Args::default())
    }

    pub fn map(&self, args: impl Into<Args>) -> Traversal {
        self.step("map", args.into())
    }

    pub fn memoize(&self, args: impl Into<Args>) -> Traversal {
        self.step("memoize", args.into())
    }

    pub fn order(&self, args: impl Into<Args>) -> Traversal {
        self.step("order", args.into())
    }

    pub fn out(&self, args: impl Into<Args>) -> Traversal {
        self.step("out", args.into())
    }

    pub fn out_e(&self, args: impl Into<Args>) -> Traversal {
        self.step("outE", args.into())
    }

    pub fn out_v(&self, args: impl Into<Args>) -> Traversal {
        self.step("outV", args.into())
    }

    pub fn path(&self, args: impl Into<Args>) -> Traversal {
        self.step("path", args.into())
    }

    pub fn scatter(&self) -> Traversal {
        self.step("scatter", Args::default())
    }

    pub fn select(&self, args: impl Into<Args>) -> Traversal {
        self.step("select", args.into())
    }

    pub fn transform(&self, args: impl Into<Args>) -> Traversal {
        self.step("transform", args.into())
    }

    // --- Filter ---

    /// `[i]` element subscript.
    pub fn index(&self, i: impl ToString) -> Traversal {
        self.subscript(&i.to_string())
    }

    /// `[i..j]` range subscript; the caller supplies the range text.
    pub fn range(&self, range: impl ToString) -> Traversal {
        self.subscript(&range.to_string())
    }

    pub fn and_(&self, args: impl Into<Args>) -> Traversal {
        self.pipe_step("and", args.into())
    }

    pub fn or_(&self, args: impl Into<Args>) -> Traversal {
        self.pipe_step("or", args.into())
    }

    pub fn back(&self, args: impl Into<Args>) -> Traversal {
        self.step("back", args.into())
    }

    pub fn dedup(&self, args: impl Into<Args>) -> Traversal {
        self.step("dedup", args.into())
    }

    pub fn except(&self, queries: &[Traversal]) -> Traversal {
        self.collection_step("except", queries)
    }

    pub fn filter(&self, args: impl Into<Args>) -> Traversal {
        self.step("filter", args.into())
    }

    pub fn has(&self, args: impl Into<Args>) -> Traversal {
        self.step("has", args.into())
    }

    pub fn has_not(&self, args: impl Into<Args>) -> Traversal {
        self.step("hasNot", args.into())
    }

    pub fn interval(&self, args: impl Into<Args>) -> Traversal {
        self.step("interval", args.into())
    }

    pub fn random(&self, args: impl Into<Args>) -> Traversal {
        self.step("random", args.into())
    }

    pub fn retain(&self, queries: &[Traversal]) -> Traversal {
        self.collection_step("retain", queries)
    }

    pub fn simple_path(&self) -> Traversal {
        self.step("simplePath", Args::default())
    }

    // --- Side effect ---

    pub fn as_(&self, args: impl Into<Args>) -> Traversal {
        self.step("as", args.into())
    }

    pub fn group_by(&self, args: impl Into<Args>) -> Traversal {
        self.step("groupBy", args.into())
    }

    pub fn group_count(&self, args: impl Into<Args>) -> Traversal {
        self.step("groupCount", args.into())
    }

    pub fn optional(&self, args: impl Into<Args>) -> Traversal {
        self.step("optional", args.into())
    }

    pub fn side_effect(&self, args: impl Into<Args>) -> Traversal {
        self.step("sideEffect", args.into())
    }

    pub fn link_both(&self, args: impl Into<Args>) -> Traversal {
        self.step("linkBoth", args.into())
    }

    pub fn link_in(&self, args: impl Into<Args>) -> Traversal {
        self.step("linkIn", args.into())
    }

    pub fn link_out(&self, args: impl Into<Args>) -> Traversal {
        self.step("linkOut", args.into())
    }

    // --- Branch ---

    pub fn copy_split(&self, args: impl Into<Args>) -> Traversal {
        self.pipe_step("copySplit", args.into())
    }

    pub fn exhaust_merge(&self) -> Traversal {
        self.step("exhaustMerge", Args::default())
    }

    pub fn fair_merge(&self) -> Traversal {
        self.step("fairMerge", Args::default())
    }

    /// `ifThenElse('{cond}','{then}','{else}')` — the closure arguments
    /// are classified like any other, so they trail the parentheses.
    pub fn if_then_else(&self, args: impl Into<Args>) -> Traversal {
        self.step("ifThenElse", args.into())
    }

    pub fn loop_(&self, args: impl Into<Args>) -> Traversal {
        self.step("loop", args.into())
    }

    // --- Terminal ---

    pub fn count(&self) -> Traversal {
        self.step("count", Args::default())
    }

    pub fn iterate(&self) -> Traversal {
        self.step("iterate", Args::default())
    }

    pub fn next(&self, args: impl Into<Args>) -> Traversal {
        self.step("next", args.into())
    }

    pub fn to_list(&self) -> Traversal {
        self.step("toList", Args::default())
    }

    pub fn put(&self, args: impl Into<Args>) -> Traversal {
        self.pipe_step("put", args.into())
    }

    pub fn get_property_keys(&self) -> Traversal {
        self.step("getPropertyKeys", Args::default())
    }

    pub fn set_property(&self, args: impl Into<Args>) -> Traversal {
        self.step("setProperty", args.into())
    }

    pub fn get_property(&self, args: impl Into<Args>) -> Traversal {
        self.step("getProperty", args.into())
    }
}
