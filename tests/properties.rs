//! Property tests for the guard/value-summary algebra.

use proptest::prelude::*;

use symvs::guard::{Guard, GuardCtx};
use symvs::summary::{PrimitiveVS, ValueSummary};

/// A small boolean formula over four named bits, evaluated against a fresh
/// context per test case.
#[derive(Debug, Clone)]
enum Expr {
    True,
    False,
    Bit(usize),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(Expr::True),
        Just(Expr::False),
        (0..4usize).prop_map(Expr::Bit),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|e| Expr::Not(Box::new(e))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Expr::Or(Box::new(a), Box::new(b))),
        ]
    })
}

fn eval(expr: &Expr, bits: &[Guard], ctx: &GuardCtx) -> Guard {
    match expr {
        Expr::True => ctx.tt(),
        Expr::False => ctx.ff(),
        Expr::Bit(i) => bits[*i].clone(),
        Expr::Not(e) => eval(e, bits, ctx).not(),
        Expr::And(a, b) => eval(a, bits, ctx).and(&eval(b, bits, ctx)),
        Expr::Or(a, b) => eval(a, bits, ctx).or(&eval(b, bits, ctx)),
    }
}

/// A three-way summary over a disjoint, exhaustive partition.
fn sample_summary(ctx: &GuardCtx) -> PrimitiveVS<i64> {
    let parts = ctx.choice_partition(3);
    let mut out = PrimitiveVS::empty(ctx);
    for (i, g) in parts.into_iter().enumerate() {
        out = out.merge(&PrimitiveVS::new(i as i64, g));
    }
    out
}

proptest! {
    #[test]
    fn guard_algebra_laws(e1 in expr_strategy(), e2 in expr_strategy(), e3 in expr_strategy()) {
        let ctx = GuardCtx::new();
        let bits: Vec<_> = (0..4).map(|_| ctx.fresh_bit()).collect();
        let (a, b, c) = (eval(&e1, &bits, &ctx), eval(&e2, &bits, &ctx), eval(&e3, &bits, &ctx));

        // De Morgan, distributivity, double negation, excluded middle.
        prop_assert_eq!(a.and(&b).not(), a.not().or(&b.not()));
        prop_assert_eq!(a.and(&b.or(&c)), a.and(&b).or(&a.and(&c)));
        prop_assert_eq!(a.not().not(), a.clone());
        prop_assert!(a.or(&a.not()).is_true());
        prop_assert!(a.and(&a.not()).is_false());

        // `implies` agrees with the combinators.
        prop_assert_eq!(a.implies(&b), a.and(&b.not()).is_false());
    }

    #[test]
    fn restriction_is_idempotent(e in expr_strategy()) {
        let ctx = GuardCtx::new();
        let bits: Vec<_> = (0..4).map(|_| ctx.fresh_bit()).collect();
        let g = eval(&e, &bits, &ctx);
        let s = sample_summary(&ctx);

        prop_assert_eq!(s.restrict(&g).restrict(&g), s.restrict(&g));
    }

    #[test]
    fn restriction_composes(e1 in expr_strategy(), e2 in expr_strategy()) {
        let ctx = GuardCtx::new();
        let bits: Vec<_> = (0..4).map(|_| ctx.fresh_bit()).collect();
        let g1 = eval(&e1, &bits, &ctx);
        let g2 = eval(&e2, &bits, &ctx);
        let s = sample_summary(&ctx);

        prop_assert_eq!(s.restrict(&g1).restrict(&g2), s.restrict(&g1.and(&g2)));
    }

    #[test]
    fn restriction_shrinks_universe(e in expr_strategy()) {
        let ctx = GuardCtx::new();
        let bits: Vec<_> = (0..4).map(|_| ctx.fresh_bit()).collect();
        let g = eval(&e, &bits, &ctx);
        let s = sample_summary(&ctx);

        let narrowed = s.restrict(&g);
        prop_assert!(narrowed.universe().implies(&s.universe().and(&g)));
        // The sample summary is exhaustive, so here the bound is tight.
        prop_assert_eq!(narrowed.universe(), s.universe().and(&g));
    }

    #[test]
    fn restriction_preserves_disjointness(e in expr_strategy()) {
        let ctx = GuardCtx::new();
        let bits: Vec<_> = (0..4).map(|_| ctx.fresh_bit()).collect();
        let g = eval(&e, &bits, &ctx);
        let s = sample_summary(&ctx).restrict(&g);

        let cases = s.guarded_values();
        for (i, a) in cases.iter().enumerate() {
            for b in &cases[i + 1..] {
                prop_assert!(a.guard.and(&b.guard).is_false());
            }
            // No case survives with a false guard.
            prop_assert!(!a.guard.is_false());
        }
    }
}
