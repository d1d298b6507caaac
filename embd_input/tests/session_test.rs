mod common;
use common::{
    BOS_TOKEN, CallKind, EMBEDDING_WIDTH, RecordingModel, VOCABULARY_SIZE,
    build_bounded_session, build_decoding_config, build_recorded_session,
    build_session, random_embeddings,
};
use embd_input::{
    sampling::Sampler,
    session::{
        Session,
        config::DecodingConfig,
        parameter::{
            ContextLength, Penalties, PrefillStepSize, SamplingMethod,
            SamplingSeed,
        },
        types::{EmbeddingBatch, Error, Segment},
    },
};

#[test]
fn test_position_is_sum_of_segment_lengths() {
    let (mut session, calls) = build_recorded_session(
        RecordingModel::new(),
        build_decoding_config(false, PrefillStepSize::Default),
    );
    let segments = vec![
        Segment::text("abc"),
        Segment::embeddings(random_embeddings(4, EMBEDDING_WIDTH, 1)),
        Segment::text("de"),
    ];
    session.evaluate_segments(&segments).unwrap();

    assert_eq!(session.position(), 9);
    let calls = calls.borrow();
    let starts: Vec<usize> =
        calls.iter().map(|call| call.position_start).collect();
    let kinds: Vec<CallKind> = calls.iter().map(|call| call.kind).collect();
    assert_eq!(starts, vec![0, 3, 7]);
    assert_eq!(
        kinds,
        vec![CallKind::Tokens, CallKind::Embeddings, CallKind::Tokens]
    );
    assert_eq!(session.history(), &[97, 98, 99, 100, 101]);
    assert!(session.logits().is_some());
}

#[test]
fn test_bos_is_added_to_first_text_only() {
    let mut session = Session::new(
        Box::new(RecordingModel::new()),
        Box::new(common::CharEncoder),
        build_decoding_config(true, PrefillStepSize::Default),
    );
    session.evaluate_text("ab").unwrap();
    session.evaluate_text("cd").unwrap();

    assert_eq!(session.position(), 5);
    assert_eq!(session.history()[0], BOS_TOKEN);
    assert_eq!(
        session.history().iter().filter(|&&token| token == BOS_TOKEN).count(),
        1
    );
}

#[test]
fn test_bos_is_not_added_after_embeddings() {
    let mut session = Session::new(
        Box::new(RecordingModel::new()),
        Box::new(common::CharEncoder),
        build_decoding_config(true, PrefillStepSize::Default),
    );
    session
        .evaluate_embeddings(&EmbeddingBatch::new(random_embeddings(
            2,
            EMBEDDING_WIDTH,
            3,
        )))
        .unwrap();
    session.evaluate_text("ab").unwrap();

    assert_eq!(session.position(), 4);
    assert_eq!(session.history(), &[97, 98]);
}

#[test]
fn test_dimension_mismatch_commits_nothing() {
    let (mut session, calls) = build_recorded_session(
        RecordingModel::new(),
        build_decoding_config(false, PrefillStepSize::Default),
    );
    session.evaluate_text("abc").unwrap();

    let mut vectors = random_embeddings(4, EMBEDDING_WIDTH, 2);
    vectors[2].pop();
    let result = session.evaluate_embeddings(&EmbeddingBatch::new(vectors));

    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            index: 2,
            expected: EMBEDDING_WIDTH,
            actual: 7,
        })
    ));
    assert_eq!(session.position(), 3);
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn test_invalid_token_does_not_advance() {
    let mut session = build_session(RecordingModel::new());
    session.evaluate_text("abc").unwrap();

    let result = session.evaluate_token(VOCABULARY_SIZE as u32);
    assert!(matches!(
        result,
        Err(Error::InvalidToken {
            vocabulary_size: VOCABULARY_SIZE,
            ..
        })
    ));
    assert_eq!(session.position(), 3);

    session.evaluate_token(120).unwrap();
    assert_eq!(session.position(), 4);
}

#[test]
fn test_context_overflow_leaves_position_unchanged() {
    let mut session = Session::new(
        Box::new(RecordingModel::new()),
        Box::new(common::CharEncoder),
        DecodingConfig::new(
            ContextLength::Custom(16),
            PrefillStepSize::Default,
            SamplingSeed::Custom(42),
            false,
        ),
    );
    assert_eq!(session.capacity(), 16);
    session.evaluate_text("abcdefghij").unwrap();

    let batch = EmbeddingBatch::new(random_embeddings(7, EMBEDDING_WIDTH, 4));
    let result = session.evaluate_embeddings(&batch);
    assert!(matches!(
        result,
        Err(Error::ContextOverflow {
            position: 10,
            requested: 7,
            capacity: 16,
        })
    ));
    assert_eq!(session.position(), 10);

    let batch = EmbeddingBatch::new(random_embeddings(6, EMBEDDING_WIDTH, 4));
    session.evaluate_embeddings(&batch).unwrap();
    assert_eq!(session.position(), 16);
}

#[test]
fn test_text_overflow_leaves_position_unchanged() {
    let mut session = build_bounded_session(RecordingModel::new(), 6);
    session.evaluate_text("abcd").unwrap();

    let result = session.evaluate_text("xyz");
    assert!(matches!(
        result,
        Err(Error::ContextOverflow {
            position: 4,
            requested: 3,
            capacity: 6,
        })
    ));
    assert_eq!(session.position(), 4);
    assert_eq!(session.history(), &[97, 98, 99, 100]);
}

#[test]
fn test_token_overflow_at_full_capacity() {
    let mut session = build_bounded_session(RecordingModel::new(), 4);
    session.evaluate_text("abcd").unwrap();

    let result = session.evaluate_token(101);
    assert!(matches!(
        result,
        Err(Error::ContextOverflow {
            position: 4,
            requested: 1,
            capacity: 4,
        })
    ));
    assert_eq!(session.position(), 4);
}

#[test]
fn test_sample_before_evaluation_fails() {
    let session = build_session(RecordingModel::new());
    let mut sampler = Sampler::new(session.sampling_seed());
    let result = session.sample(
        &mut sampler,
        &SamplingMethod::Greedy,
        &Penalties::disabled(),
    );
    assert!(matches!(result, Err(Error::EmptyLogits)));
}

#[test]
fn test_empty_segments_are_rejected() {
    let mut session = build_session(RecordingModel::new());
    assert!(matches!(
        session.evaluate_text(""),
        Err(Error::EmptySegment)
    ));
    assert!(matches!(
        session.evaluate_embeddings(&EmbeddingBatch::default()),
        Err(Error::EmptySegment)
    ));
    assert_eq!(session.position(), 0);
}

#[test]
fn test_empty_text_is_rejected_before_bos() {
    let (mut session, calls) = build_recorded_session(
        RecordingModel::new(),
        build_decoding_config(true, PrefillStepSize::Default),
    );
    assert!(matches!(
        session.evaluate_text(""),
        Err(Error::EmptySegment)
    ));
    assert_eq!(session.position(), 0);
    assert!(calls.borrow().is_empty());

    session.evaluate_text("a").unwrap();
    assert_eq!(session.history(), &[BOS_TOKEN, 97]);
}

#[test]
fn test_tokenization_failure_commits_nothing() {
    let mut session = build_session(RecordingModel::new());
    let result = session.evaluate_text("caf\u{e9}");
    assert!(matches!(result, Err(Error::Tokenization { .. })));
    assert_eq!(session.position(), 0);
}

#[test]
fn test_prefill_is_split_into_steps() {
    let (mut session, calls) = build_recorded_session(
        RecordingModel::new(),
        build_decoding_config(false, PrefillStepSize::Custom(4)),
    );
    session.evaluate_text("abcdefghij").unwrap();
    session
        .evaluate_embeddings(&EmbeddingBatch::new(random_embeddings(
            5,
            EMBEDDING_WIDTH,
            5,
        )))
        .unwrap();

    let calls = calls.borrow();
    let spans: Vec<(usize, usize)> = calls
        .iter()
        .map(|call| (call.position_start, call.count))
        .collect();
    assert_eq!(spans, vec![(0, 4), (4, 4), (8, 2), (10, 4), (14, 1)]);
    assert_eq!(session.position(), 15);
    assert_eq!(session.model_runs(), 5);
}

#[test]
fn test_model_failure_is_reported() {
    let mut session =
        build_session(RecordingModel::new().with_fail_at(3));
    session.evaluate_text("abc").unwrap();
    let result = session.evaluate_text("d");
    assert!(matches!(result, Err(Error::Evaluation { .. })));
    assert_eq!(session.position(), 3);
}

#[test]
fn test_decode() {
    let session = build_session(RecordingModel::new());
    assert_eq!(session.decode(104).unwrap(), "h");
    assert!(matches!(
        session.decode(500),
        Err(Error::UnableToDecodeText { .. })
    ));
}

#[test]
fn test_reset_clears_state() {
    let (mut session, calls) = build_recorded_session(
        RecordingModel::new(),
        build_decoding_config(false, PrefillStepSize::Default),
    );
    session.evaluate_text("abc").unwrap();
    session.reset();

    assert_eq!(session.position(), 0);
    assert!(session.logits().is_none());
    assert!(session.history().is_empty());
    assert!(calls.borrow().is_empty());

    session.evaluate_text("xy").unwrap();
    assert_eq!(session.position(), 2);
    assert_eq!(calls.borrow()[0].position_start, 0);
}
