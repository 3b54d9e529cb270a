use std::collections::HashSet;

use typo_detector::spell_check::onnx::{EncodedInput, ScoreKind, TokenScores};
use typo_detector::{
    AnnotationStrategy, DetectionError, DetectorOptions, HfTokenizer, SubwordTokenizer,
    TokenClassifier, TypoDetector,
};

const TOKENIZER_JSON: &str = r###"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": { "type": "BertPreTokenizer" },
    "post_processor": { "type": "BertProcessing", "sep": ["[SEP]", 3], "cls": ["[CLS]", 2] },
    "decoder": null,
    "model": {
        "type": "WordPiece",
        "unk_token": "[UNK]",
        "continuing_subword_prefix": "##",
        "max_input_chars_per_word": 100,
        "vocab": {
            "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
            "This": 4, "is": 5, "a": 6, "sm": 7, "##ple": 8, "test": 9, ".": 10,
            "teh": 11, "cat": 12, "and": 13, "dog": 14, "fine": 15, "day": 16
        }
    }
}"###;

const SM: i64 = 7;
const PLE: i64 = 8;
const TEH: i64 = 11;

/// Scores every position as correct except the scripted ones
enum ScriptedClassifier {
    /// Flag every position holding one of these token ids
    Ids(HashSet<i64>),
    /// Flag these encoded positions (sentinel at 0)
    Positions(HashSet<usize>),
}

impl TokenClassifier for ScriptedClassifier {
    fn classify(&self, input: &EncodedInput) -> Result<TokenScores, DetectionError> {
        let rows: Vec<Vec<f32>> = input
            .input_ids
            .iter()
            .enumerate()
            .map(|(position, id)| {
                let flagged = match self {
                    ScriptedClassifier::Ids(ids) => ids.contains(id),
                    ScriptedClassifier::Positions(positions) => positions.contains(&position),
                };
                if flagged {
                    vec![0.1, 0.9]
                } else {
                    vec![0.95, 0.05]
                }
            })
            .collect();
        TokenScores::from_rows(&rows, ScoreKind::Probabilities)
    }
}

fn detector(
    classifier: ScriptedClassifier,
    annotation: AnnotationStrategy,
) -> TypoDetector<HfTokenizer, ScriptedClassifier> {
    let tokenizer = HfTokenizer::from_json(TOKENIZER_JSON).unwrap();
    let options = DetectorOptions {
        annotation,
        ..DetectorOptions::default()
    };
    TypoDetector::new(tokenizer, classifier, options)
}

#[test]
fn test_misspelled_word_split_into_pieces_is_highlighted() {
    let detector = detector(
        ScriptedClassifier::Ids(HashSet::from([SM, PLE])),
        AnnotationStrategy::Positional,
    );

    let (original, annotated) = detector.detect("This is a smple test.").unwrap();
    assert_eq!(original, "This is a smple test.");
    assert_eq!(annotated, "This is a <i>smple</i> test.");
}

#[test]
fn test_literal_annotation_marks_every_occurrence() {
    // only the first "teh" (encoded position 1) is flagged
    let detector = detector(
        ScriptedClassifier::Positions(HashSet::from([1])),
        AnnotationStrategy::Literal,
    );

    let (_, annotated) = detector.detect("teh cat and teh dog").unwrap();
    assert_eq!(annotated, "<i>teh</i> cat and <i>teh</i> dog");
}

#[test]
fn test_positional_annotation_marks_flagged_occurrence_only() {
    let detector = detector(
        ScriptedClassifier::Positions(HashSet::from([1])),
        AnnotationStrategy::Positional,
    );

    let (_, annotated) = detector.detect("teh cat and teh dog").unwrap();
    assert_eq!(annotated, "<i>teh</i> cat and teh dog");
}

#[test]
fn test_both_occurrences_flagged_report_two_words() {
    let detector = detector(
        ScriptedClassifier::Ids(HashSet::from([TEH])),
        AnnotationStrategy::Positional,
    );

    let detection = detector.analyze("teh cat and teh dog").unwrap();
    let indexes: Vec<usize> = detection.typos.iter().map(|span| span.word_index).collect();
    assert_eq!(indexes, vec![0, 3]);
    assert_eq!(detection.annotated, "<i>teh</i> cat and <i>teh</i> dog");
}

#[test]
fn test_clean_sentence_is_unchanged() {
    let detector = detector(ScriptedClassifier::Ids(HashSet::new()), AnnotationStrategy::Positional);

    let (original, annotated) = detector.detect("a fine day.").unwrap();
    assert_eq!(original, annotated);
}

#[test]
fn test_empty_sentence() {
    let detector = detector(ScriptedClassifier::Ids(HashSet::new()), AnnotationStrategy::Positional);

    let (original, annotated) = detector.detect("").unwrap();
    assert!(original.is_empty());
    assert!(annotated.is_empty());
}

#[test]
fn test_report_serializes_to_json() {
    let detector = detector(
        ScriptedClassifier::Ids(HashSet::from([SM, PLE])),
        AnnotationStrategy::Positional,
    );

    let detection = detector.analyze("This is a smple test.").unwrap();
    let json = serde_json::to_value(&detection).unwrap();
    assert_eq!(json["typos"][0]["word"], "smple");
    assert_eq!(json["typos"][0]["word_index"], 3);
}

#[test]
fn test_tokenizer_and_encoding_agree_on_length() {
    let tokenizer = HfTokenizer::from_json(TOKENIZER_JSON).unwrap();
    let sentence = "This is a smple test.";
    let tokens = tokenizer.tokenize(sentence).unwrap();
    let encoded = tokenizer.encode(sentence).unwrap();
    assert_eq!(encoded.len(), tokens.len() + 2);
}
