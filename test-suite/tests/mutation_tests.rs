//! Property-Based Mutation Tests
//!
//! Generated pages must validate, and every mutation of a generated page must
//! be rejected with the error class the mutation promises.

use pdfcop::parser::ContentParser;
use pdfcop_test_suite::corpus::ContentCorpus;
use pdfcop_test_suite::generators::{ContentBuilder, Mutation};
use pdfcop_test_suite::utils::preview;
use proptest::prelude::*;

fn page_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0usize..20, 0usize..20, any::<bool>()).prop_map(|(paths, lines, text_first)| {
        let paths = ContentBuilder::page_with_paths(paths);
        let text = ContentBuilder::page_with_text(lines);
        let (first, second) = if text_first {
            (text, paths)
        } else {
            (paths, text)
        };
        let mut content = first.build();
        content.extend_from_slice(&second.build());
        content
    })
}

fn mutation_strategy() -> impl Strategy<Value = Mutation> {
    prop::sample::select(Mutation::all().to_vec())
}

proptest! {
    #[test]
    fn prop_generated_pages_are_valid(content in page_strategy()) {
        let result = ContentParser::parse(&content);
        prop_assert!(result.is_ok(), "{}: {:?}", preview(&content), result.err());
    }

    #[test]
    fn prop_mutations_are_rejected(content in page_strategy(), mutation in mutation_strategy()) {
        if let Some(mutated) = mutation.apply(&content) {
            let error = ContentParser::parse(&mutated);
            prop_assert!(error.is_err(), "{mutation:?} accepted: {}", preview(&mutated));
            let kind = error.err().map(|e| e.kind());
            prop_assert_eq!(kind, Some(mutation.expected_error()), "{:?}", mutation);
        }
    }
}

#[test]
fn test_mutating_valid_corpus_fixtures() {
    let corpus = ContentCorpus::builtin();
    let mut applied = 0;
    for fixture in corpus.iter().filter(|f| f.expects_valid()) {
        let options = fixture.profile.options();
        for mutation in [Mutation::UnknownOperator, Mutation::TrailingOperands] {
            let Some(mutated) = mutation.apply(&fixture.content) else {
                continue;
            };
            applied += 1;
            let result = ContentParser::parse_with_options(&mutated, options.clone());
            assert!(
                result.is_err(),
                "{} with {mutation:?}: {}",
                fixture.name,
                preview(&mutated)
            );
        }
    }
    assert!(applied > 20);
}
