// tests/turn_pipeline_test.rs
// End-to-end turn state machine behavior with scripted engine doubles: stage
// ordering, per-stage abort semantics, client notices, and the rule that the
// history grows only after a fully completed turn.

mod common;

use std::sync::Arc;

use common::{
    RecordingSink, ScriptedDecoder, ScriptedProvider, ScriptedStt, ScriptedTts,
    generator_with_providers,
};
use sawt_backend::api::ws::{STATUS_NOT_UNDERSTOOD, TurnAbort, TurnOutcome, TurnPipeline};
use sawt_backend::llm::LlmProvider;
use sawt_backend::session::SessionContext;

const PCM: &[u8] = &[0u8; 320];
const REPLY_AUDIO: &[u8] = &[1u8, 2, 3, 4];

fn happy_pipeline(provider: Arc<ScriptedProvider>) -> TurnPipeline {
    TurnPipeline::new(
        ScriptedDecoder::ok(PCM),
        ScriptedStt::transcribing("I feel a bit tired today"),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![
            provider as Arc<dyn LlmProvider>,
        ])),
    )
}

#[tokio::test]
async fn empty_frame_is_a_noop() {
    let pipeline = happy_pipeline(ScriptedProvider::replying("primary", "hello"));
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline.run_turn(&[], &mut session, &mut sink).await.unwrap();

    assert!(matches!(outcome, TurnOutcome::Idle));
    assert!(sink.audio.is_empty());
    assert!(sink.statuses.is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn completed_turn_sends_audio_and_commits_history() {
    let provider = ScriptedProvider::replying("primary", "هلا، خذ نفس عميق");
    let pipeline = happy_pipeline(provider.clone());
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Completed { transcript, reply } => {
            assert_eq!(transcript, "I feel a bit tired today");
            assert_eq!(reply, "هلا، خذ نفس عميق");
        }
        other => panic!("expected completed turn, got {:?}", other),
    }
    assert_eq!(sink.audio.len(), 1);
    assert_eq!(sink.audio[0].as_ref(), REPLY_AUDIO);
    assert!(sink.statuses.is_empty());

    // Exactly one user/assistant pair was committed.
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[0].content, "I feel a bit tired today");
    assert_eq!(session.history()[1].content, "هلا، خذ نفس عميق");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn decode_failure_aborts_silently() {
    let pipeline = TurnPipeline::new(
        ScriptedDecoder::failing("bad container"),
        ScriptedStt::transcribing("unused"),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![])),
    );
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::Aborted(TurnAbort::Decode(_))));
    // The client hears nothing about a decode failure.
    assert!(sink.audio.is_empty());
    assert!(sink.statuses.is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn empty_transcript_sends_retry_notice() {
    let pipeline = TurnPipeline::new(
        ScriptedDecoder::ok(PCM),
        ScriptedStt::silent(),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![])),
    );
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Aborted(TurnAbort::EmptyTranscript)
    ));
    assert_eq!(sink.statuses, vec![STATUS_NOT_UNDERSTOOD.to_string()]);
    assert!(sink.audio.is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn transcription_failure_sends_retry_notice() {
    let pipeline = TurnPipeline::new(
        ScriptedDecoder::ok(PCM),
        ScriptedStt::failing("engine timeout"),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![])),
    );
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Aborted(TurnAbort::Transcription(_))
    ));
    assert_eq!(sink.statuses, vec![STATUS_NOT_UNDERSTOOD.to_string()]);
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn synthesis_failure_leaves_history_untouched() {
    let provider = ScriptedProvider::replying("primary", "a reply");
    let pipeline = TurnPipeline::new(
        ScriptedDecoder::ok(PCM),
        ScriptedStt::transcribing("I feel a bit tired today"),
        ScriptedTts::failing("voice engine down"),
        Arc::new(generator_with_providers(vec![
            provider.clone() as Arc<dyn LlmProvider>
        ])),
    );
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        TurnOutcome::Aborted(TurnAbort::Synthesis(_))
    ));
    // The reply was generated but never committed.
    assert_eq!(provider.call_count(), 1);
    assert!(sink.audio.is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn transport_failure_terminates_with_error_and_no_commit() {
    let pipeline = happy_pipeline(ScriptedProvider::replying("primary", "a reply"));
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::with_dead_transport();

    let result = pipeline.run_turn(&[9u8; 64], &mut session, &mut sink).await;

    assert!(result.is_err());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn high_risk_keyword_resolves_turn_without_model_call() {
    let provider = ScriptedProvider::replying("primary", "never used");
    let pipeline = TurnPipeline::new(
        ScriptedDecoder::ok(PCM),
        ScriptedStt::transcribing("Sometimes I want to kill myself"),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![
            provider.clone() as Arc<dyn LlmProvider>
        ])),
    );
    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let outcome = pipeline
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Completed { reply, .. } => assert_eq!(reply, "HIGH SCRIPT"),
        other => panic!("expected completed turn, got {:?}", other),
    }
    assert_eq!(provider.call_count(), 0);
    assert_eq!(sink.audio.len(), 1);
    // The scripted exchange still enters the history like any other turn.
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[1].content, "HIGH SCRIPT");
}

#[tokio::test]
async fn aborted_turn_does_not_poison_the_next_one() {
    let provider = ScriptedProvider::replying("primary", "all good now");
    let failing = TurnPipeline::new(
        ScriptedDecoder::failing("bad container"),
        ScriptedStt::transcribing("unused"),
        ScriptedTts::synthesizing(REPLY_AUDIO),
        Arc::new(generator_with_providers(vec![])),
    );
    let working = happy_pipeline(provider);

    let mut session = SessionContext::new(40);
    let mut sink = RecordingSink::new();

    let first = failing
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();
    assert!(matches!(first, TurnOutcome::Aborted(_)));

    let second = working
        .run_turn(&[9u8; 64], &mut session, &mut sink)
        .await
        .unwrap();
    assert!(matches!(second, TurnOutcome::Completed { .. }));
    assert_eq!(session.history().len(), 2);
}
