//! Script-assembly tests across the step vocabulary.

use std::sync::Arc;

use serde_json::json;

use crate::config::GraphConfig;

use super::query::Traversal;
use super::Arg;

fn g() -> Traversal {
    Traversal::root(Arc::new(GraphConfig::default()))
}

#[test]
fn test_transform_steps() {
    assert_eq!(g().out("knows").script(), "g.out('knows')");
    assert_eq!(g().in_("knows").script(), "g.in('knows')");
    assert_eq!(g().both_e(()).script(), "g.bothE()");
    assert_eq!(g().out_v(()).in_v(()).script(), "g.outV().inV()");
    assert_eq!(g().id().script(), "g.id()");
    assert_eq!(g().label().script(), "g.label()");
    assert_eq!(g().gather(()).scatter().script(), "g.gather().scatter()");
    assert_eq!(g().select(("a", "b")).script(), "g.select('a','b')");
}

#[test]
fn test_filter_steps() {
    assert_eq!(
        g().has(("name", "T.eq", "marko")).script(),
        "g.has('name',T.eq,'marko')"
    );
    assert_eq!(
        g().has_not(("age", "T.gte", 30)).script(),
        "g.hasNot('age',T.gte,30)"
    );
    assert_eq!(g().dedup(()).script(), "g.dedup()");
    assert_eq!(g().interval(("weight", 0.3, 0.9)).script(), "g.interval('weight',0.3,0.9)");
    assert_eq!(g().random(0.5).script(), "g.random(0.5)");
    assert_eq!(g().simple_path().script(), "g.simplePath()");
    assert_eq!(g().back(1).script(), "g.back(1)");
}

#[test]
fn test_subscripts() {
    assert_eq!(g().out(()).index(3).script(), "g.out()[3]");
    assert_eq!(g().out(()).range("0..5").script(), "g.out()[0..5]");
}

#[test]
fn test_pipe_combinators() {
    let sub_a = g().has(("id", "T.eq", 9));
    let sub_b = g().has(("weight", "T.lt", 0.6));
    assert_eq!(
        g().and_((sub_a.clone(), sub_b.clone())).script(),
        "g.and(g.has('id',T.eq,9),g.has('weight',T.lt,0.6))"
    );
    assert_eq!(
        g().or_(vec![Arg::from(sub_a), Arg::from(sub_b)]).script(),
        "g.or(g.has('id',T.eq,9),g.has('weight',T.lt,0.6))"
    );
}

#[test]
fn test_collection_combinators() {
    let members = vec![g().out(1), g().out(2)];
    assert_eq!(
        g().retain(&members).script(),
        "g.retain([g.out(1),g.out(2)])"
    );
    assert_eq!(
        g().except(&members).script(),
        "g.except([g.out(1),g.out(2)])"
    );
}

#[test]
fn test_side_effect_steps() {
    assert_eq!(g().as_("here").script(), "g.as('here')");
    assert_eq!(g().group_count(()).script(), "g.groupCount()");
    assert_eq!(
        g().group_by(("{it}", "{it.out}")).script(),
        "g.groupBy(){it}{it.out}"
    );
    assert_eq!(g().side_effect("{x = it}").script(), "g.sideEffect(){x = it}");
    assert_eq!(g().link_out(("knows", "marko")).script(), "g.linkOut('knows','marko')");
}

#[test]
fn test_branch_steps() {
    assert_eq!(
        g().if_then_else(("{it.name=='josh'}", "{it.age}", "{it.name}"))
            .script(),
        "g.ifThenElse(){it.name=='josh'}{it.age}{it.name}"
    );
    assert_eq!(g().loop_((1, "{it.loops < 3}")).script(), "g.loop(1){it.loops < 3}");
    assert_eq!(g().exhaust_merge().script(), "g.exhaustMerge()");
    assert_eq!(g().fair_merge().script(), "g.fairMerge()");
    assert_eq!(
        g().copy_split((g().out(()), g().in_(()))).script(),
        "g.copySplit(g.out(),g.in())"
    );
}

#[test]
fn test_terminal_steps() {
    assert_eq!(g().count().script(), "g.count()");
    assert_eq!(g().iterate().script(), "g.iterate()");
    assert_eq!(g().to_list().script(), "g.toList()");
    assert_eq!(g().get_property_keys().script(), "g.getPropertyKeys()");
    assert_eq!(
        g().set_property(("age", 30)).script(),
        "g.setProperty('age',30)"
    );
    assert_eq!(g().get_property("age").script(), "g.getProperty('age')");
}

#[test]
fn test_structured_argument_in_step() {
    assert_eq!(
        g().has(json!({"name": "marko", "age": 29})).script(),
        // serde_json maps iterate in sorted key order
        r#"g.has(["age":29,"name":"marko"])"#
    );
}

#[test]
fn test_segments_accumulate_in_call_order() {
    let q = g()
        .out("knows")
        .has(("age", "T.gt", 21))
        .dedup(())
        .index(0);
    assert_eq!(q.script(), "g.out('knows').has('age',T.gt,21).dedup()[0]");
}
