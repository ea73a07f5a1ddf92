use proptest::prelude::*;
use sdk::errors::{EngineError, GaugeErrorExt};
use sdk::types::{normalize_score, ChoiceLabel, ChoiceSet, Evaluation};

// Every error variant yields a non-empty, static user hint that never echoes
// the raw message it was built from.
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-zA-Z0-9 ]{12,40}") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::InvalidPlan(error_str.clone()),
            EngineError::collaborator("question source", error_str.clone()),
            EngineError::LLMProvider(error_str.clone()),
            EngineError::SessionNotFound(error_str.clone()),
            EngineError::SessionBusy(error_str.clone()),
            EngineError::Network(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            prop_assert!(!hint.contains(error_str.as_str()));
        }
    }
}

// Normalized scores always land in [0, 1], whatever the judge returned.
proptest! {
    #[test]
    fn test_normalized_score_in_unit_range(raw in proptest::num::f64::ANY) {
        let score = Evaluation::with_score(raw, false).normalized().overall_score;
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_unit_scores_pass_through(raw in 0.0f64..=1.0) {
        prop_assert_eq!(normalize_score(raw), raw);
    }

    #[test]
    fn test_ten_point_scores_are_rescaled(raw in 1.0001f64..=10.0) {
        let score = normalize_score(raw);
        prop_assert!((score - raw / 10.0).abs() < 1e-12);
    }
}

// Choice sets built from any four non-empty options carry a label on every
// option and keep the requested correct answer.
proptest! {
    #[test]
    fn test_choice_set_labels_every_option(
        options in proptest::collection::vec("[a-z][a-z0-9 =()]{0,20}", 4),
        correct in 0usize..4
    ) {
        let label = ChoiceLabel::ALL[correct];
        let set = ChoiceSet::from_parts(options, &label.to_string()).unwrap();

        prop_assert_eq!(set.correct, label);
        for (option, expected) in set.options.iter().zip(ChoiceLabel::ALL) {
            let first = option.chars().next().map(|c| c.to_ascii_uppercase());
            prop_assert_eq!(first, Some(expected.as_char()));
        }
    }
}
