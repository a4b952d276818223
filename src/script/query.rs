//! The query value: an accumulated traversal script.
//!
//! A `Traversal` is immutable in effect — every chained step clones the
//! receiver and returns a new value with one more segment appended, so
//! independent chains never observe each other. The script is always the
//! root anchor followed by `.method(args)` and `[subscript]` segments in
//! call order.

use std::sync::Arc;

use serde_json::Value;

use crate::config::GraphConfig;

use super::arg::{classify, value_literal, Arg};

/// Ordered step-argument list.
///
/// Step methods take `impl Into<Args>`: a single value, a tuple of up to
/// five values, a `Vec<Arg>`, or `()` for no arguments.
#[derive(Debug, Clone, Default)]
pub struct Args(pub Vec<Arg>);

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args(Vec::new())
    }
}

impl From<Arg> for Args {
    fn from(a: Arg) -> Self {
        Args(vec![a])
    }
}

impl From<Vec<Arg>> for Args {
    fn from(v: Vec<Arg>) -> Self {
        Args(v)
    }
}

macro_rules! impl_args_from_single {
    ($($t:ty),+) => {
        $(impl From<$t> for Args {
            fn from(v: $t) -> Self {
                Args(vec![v.into()])
            }
        })+
    };
}

impl_args_from_single!(&str, String, i32, i64, f64, bool, Value, Traversal, &Traversal);

macro_rules! impl_args_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Arg>),+> From<($($name,)+)> for Args {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Args(vec![$($name.into()),+])
            }
        }
    };
}

impl_args_from_tuple!(A, B);
impl_args_from_tuple!(A, B, C);
impl_args_from_tuple!(A, B, C, D);
impl_args_from_tuple!(A, B, C, D, E);

/// An accumulated traversal script rooted at the graph anchor `g`.
#[derive(Debug, Clone)]
pub struct Traversal {
    config: Arc<GraphConfig>,
    script: String,
}

impl Traversal {
    /// Fresh query value holding only the root anchor.
    pub(crate) fn root(config: Arc<GraphConfig>) -> Self {
        Self {
            config,
            script: "g".to_string(),
        }
    }

    /// The textual traversal script accumulated so far.
    pub fn script(&self) -> &str {
        &self.script
    }

    fn extend(&self, segment: String) -> Traversal {
        Traversal {
            config: self.config.clone(),
            script: format!("{}{}", self.script, segment),
        }
    }

    /// Append `.name(a,b,...)` with each argument classified
    /// independently. Closure fragments are out-of-band script suffixes:
    /// they land after the closing parenthesis, not inside it.
    pub(crate) fn step(&self, name: &str, args: Args) -> Traversal {
        let mut inline = Vec::new();
        let mut suffix = String::new();
        for arg in args.0 {
            let classified = classify(arg, &self.config);
            if classified.is_closure() {
                suffix.push_str(&classified.render());
            } else {
                inline.push(classified.render());
            }
        }
        self.extend(format!(".{}({}){}", name, inline.join(","), suffix))
    }

    /// Append `[i]` or `[i..j]` verbatim. No classification: the caller
    /// owns syntactic correctness of the subscript text.
    pub(crate) fn subscript(&self, text: &str) -> Traversal {
        self.extend(format!("[{}]", text))
    }

    /// Append `.name(sub1,sub2,...)` where sub-traversals embed their own
    /// scripts and plain values are classified as usual.
    pub(crate) fn pipe_step(&self, name: &str, args: Args) -> Traversal {
        let rendered: Vec<String> = args
            .0
            .into_iter()
            .map(|arg| classify(arg, &self.config).render())
            .collect();
        self.extend(format!(".{}({})", name, rendered.join(",")))
    }

    /// Append `.name([sub1,sub2,...])` — every element must already be a
    /// query value; only its script is embedded.
    pub(crate) fn collection_step(&self, name: &str, queries: &[Traversal]) -> Traversal {
        let scripts: Vec<&str> = queries.iter().map(|q| q.script()).collect();
        self.extend(format!(".{}([{}])", name, scripts.join(",")))
    }

    /// Append an index lookup: `.idx(<name>)` plus, when an index
    /// specification is given, the nested bracket list `[[key:value]]`.
    pub(crate) fn index_lookup(&self, name: Arg, spec: Option<&Value>) -> Traversal {
        let base = self.step("idx", Args(vec![name]));
        let Some(Value::Object(map)) = spec else {
            return base;
        };
        let entries: Vec<String> = map
            .iter()
            .map(|(k, v)| format!("{}:{}", k, value_literal(v, &self.config)))
            .collect();
        base.extend(format!("[[{}]]", entries.join(",")))
    }
}
