// tests/derivation.rs
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use symbios_flora::{FloraError, LSystem, Production, Symbol, parse_word, presets};

fn atoms(s: &str) -> Vec<Symbol> {
    s.chars().map(Symbol::atom).collect()
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

#[test]
fn test_algae_sequence() {
    let mut lsystem = presets::algae();
    let mut rng = rng();

    assert_eq!(lsystem.render(), "A");
    let expected = ["AB", "ABA", "ABAAB", "ABAABABA"];
    for want in expected {
        assert_eq!(lsystem.perform_derivation_step(&mut rng).unwrap(), want);
    }
    assert_eq!(lsystem.generation(), 4);
}

#[test]
fn test_branch_symbols_are_passengers() {
    let mut lsystem = presets::fractal_plant();
    let mut rng = rng();

    assert_eq!(
        lsystem.perform_derivation_step(&mut rng).unwrap(),
        "F[+X][-X]FX"
    );
    assert_eq!(
        lsystem.perform_derivation_step(&mut rng).unwrap(),
        "FF[+F[+X][-X]FX][-F[+X][-X]FX]FFF[+X][-X]FX"
    );
    let third = lsystem.perform_derivation_step(&mut rng).unwrap();
    assert_eq!(
        third,
        "FFFF[+FF[+F[+X][-X]FX][-F[+X][-X]FX]FFF[+X][-X]FX]\
         [-FF[+F[+X][-X]FX][-F[+X][-X]FX]FFF[+X][-X]FX]\
         FFFFFF[+F[+X][-X]FX][-F[+X][-X]FX]FFF[+X][-X]FX"
    );
    assert_eq!(third.matches('X').count(), 27);
}

#[test]
fn test_parametric_increment() {
    let mut lsystem = LSystem::new(parse_word("B(0)").unwrap()).with_production(Production::new(
        [Symbol::pattern('B', ["x"])],
        [Symbol::expr('B', ["x"], |v| vec![v["x"] + 1.0])],
    ));
    let mut rng = rng();

    for i in 1..=10 {
        let rendered = lsystem.perform_derivation_step(&mut rng).unwrap();
        assert_eq!(rendered, format!("B({}.0)", i));
    }
    assert_eq!(lsystem.render(), "B(10.0)");
}

#[test]
fn test_maximal_munch_prefers_longest_window() {
    let mut lsystem = LSystem::new(atoms("ABA"))
        .with_production(Production::new(atoms("A"), atoms("X")))
        .with_production(Production::new(atoms("AB"), atoms("Y")))
        .with_production(Production::new(atoms("B"), atoms("Z")));

    assert_eq!(lsystem.perform_derivation_step(&mut rng()).unwrap(), "YX");
}

#[test]
fn test_conditions_select_production() {
    let mut lsystem = LSystem::new(parse_word("A(1)A(5)").unwrap())
        .with_production(
            Production::new([Symbol::pattern('A', ["t"])], atoms("S")).when(|v| v["t"] < 3.0),
        )
        .with_production(
            Production::new([Symbol::pattern('A', ["t"])], atoms("L")).when(|v| v["t"] >= 3.0),
        );

    assert_eq!(lsystem.perform_derivation_step(&mut rng()).unwrap(), "SL");
}

#[test]
fn test_pattern_successor_copies_bound_values() {
    let mut lsystem = LSystem::new(parse_word("A(2,3)").unwrap()).with_production(Production::new(
        [Symbol::pattern('A', ["x", "y"])],
        [Symbol::pattern('A', ["y", "x"])],
    ));

    assert_eq!(
        lsystem.perform_derivation_step(&mut rng()).unwrap(),
        "A(3.0,2.0)"
    );
}

#[test]
fn test_derivation_is_deterministic_for_seed() {
    let run = |seed: u64| {
        let mut lsystem = presets::leafy_tree();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        lsystem.derive(5, &mut rng).unwrap()
    };

    assert_eq!(run(11), run(11));
    assert_eq!(run(12), run(12));
}

#[test]
fn test_stochastic_choice_uses_both_branches() {
    let grammar = || {
        LSystem::new(atoms("A"))
            .with_production(Production::new(atoms("A"), atoms("B")).with_probability(0.5))
            .with_production(Production::new(atoms("A"), atoms("C")).with_probability(0.5))
    };

    let mut seen_b = false;
    let mut seen_c = false;
    for seed in 0..64 {
        let mut lsystem = grammar();
        match lsystem
            .perform_derivation_step(&mut ChaCha8Rng::seed_from_u64(seed))
            .unwrap()
            .as_str()
        {
            "B" => seen_b = true,
            "C" => seen_c = true,
            other => panic!("unexpected word {other}"),
        }
    }
    assert!(seen_b && seen_c);
}

#[test]
fn test_bad_probabilities_fail_before_drawing() {
    let mut lsystem = LSystem::new(atoms("A"))
        .with_production(Production::new(atoms("A"), atoms("B")).with_probability(0.4))
        .with_production(Production::new(atoms("A"), atoms("C")).with_probability(0.5));

    let mut used = rng();
    let err = lsystem.perform_derivation_step(&mut used).unwrap_err();
    match err {
        FloraError::AmbiguousProduction {
            candidates, total, ..
        } => {
            assert_eq!(candidates, 2);
            assert!((total.unwrap() - 0.9).abs() < 1e-9);
        }
        other => panic!("unexpected error {other}"),
    }

    // No draw was made: the stream is still at its start.
    assert_eq!(used.next_u64(), rng().next_u64());
    assert_eq!(lsystem.render(), "A");
    assert_eq!(lsystem.generation(), 0);
}

#[test]
fn test_out_of_range_probabilities_are_ambiguous() {
    // 1.3 + -0.4 sums to 0.9; neither weight is a probability.
    let mut lsystem = LSystem::new(atoms("A"))
        .with_production(Production::new(atoms("A"), atoms("B")).with_probability(1.3))
        .with_production(Production::new(atoms("A"), atoms("C")).with_probability(-0.4));

    let mut used = rng();
    assert!(matches!(
        lsystem.perform_derivation_step(&mut used),
        Err(FloraError::AmbiguousProduction { candidates: 2, .. })
    ));
    assert_eq!(used.next_u64(), rng().next_u64());

    // Out-of-range weights are rejected even when they sum to 1.
    let mut lsystem = LSystem::new(atoms("A"))
        .with_production(Production::new(atoms("A"), atoms("B")).with_probability(1.5))
        .with_production(Production::new(atoms("A"), atoms("C")).with_probability(-0.5));
    assert!(matches!(
        lsystem.perform_derivation_step(&mut rng()),
        Err(FloraError::AmbiguousProduction { .. })
    ));
    assert_eq!(lsystem.render(), "A");
}

#[test]
fn test_missing_probability_is_ambiguous() {
    let mut lsystem = LSystem::new(atoms("A"))
        .with_production(Production::new(atoms("A"), atoms("B")).with_probability(1.0))
        .with_production(Production::new(atoms("A"), atoms("C")));

    assert!(matches!(
        lsystem.perform_derivation_step(&mut rng()),
        Err(FloraError::AmbiguousProduction { total: None, .. })
    ));
}

#[test]
fn test_no_match_reports_state_and_position() {
    let mut lsystem = LSystem::new(atoms("AQA"))
        .with_production(Production::new(atoms("A"), atoms("AA")));

    let err = lsystem.perform_derivation_step(&mut rng()).unwrap_err();
    match err {
        FloraError::NoMatchingProduction {
            state,
            position,
            window,
        } => {
            assert_eq!(state, "AQA");
            assert_eq!(position, 1);
            assert_eq!(window, "Q");
        }
        other => panic!("unexpected error {other}"),
    }
    // The failed step leaves the word alone.
    assert_eq!(lsystem.render(), "AQA");
}

#[test]
fn test_missing_variable_is_fatal() {
    let mut lsystem = LSystem::new(parse_word("B(1)").unwrap()).with_production(Production::new(
        [Symbol::pattern('B', ["x"])],
        [Symbol::expr('B', ["y"], |v| vec![v["y"]])],
    ));

    assert!(matches!(
        lsystem.perform_derivation_step(&mut rng()),
        Err(FloraError::MissingVariable { symbol: 'B', .. })
    ));
}

#[test]
fn test_derive_range_and_reset() {
    let mut lsystem = presets::algae();
    let mut rng = rng();

    lsystem.derive_range(3..=3, &mut rng).unwrap();
    assert_eq!(lsystem.generation(), 3);
    assert_eq!(lsystem.render(), "ABAAB");

    lsystem.reset();
    assert_eq!(lsystem.render(), "A");
    assert_eq!(lsystem.generation(), 0);

    lsystem.derive_range(2..=6, &mut rng).unwrap();
    assert!((2..=6).contains(&lsystem.generation()));
}
