//! Judging and oracle orchestration against scripted stub models: defensive
//! parsing, presentation orders, multi-model fan-out, and score joins,
//! with no network anywhere.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use verdict_data::{
    ResultRow, ResultTable, Sample, SamplePayload, ServiceResults, Task, JUDGE_SCORE_COLUMN,
};
use verdict_judge::{
    generate_oracle, judge_services, ChatModel, ChatRequest, ClientError, JudgeModel,
    OracleOutput, PresentationOrders,
};

/// Stub model driven by a closure over the request prompt.
struct ScriptedModel<F>(F);

impl<F> ChatModel for ScriptedModel<F>
where
    F: Fn(&ChatRequest) -> Result<String, ClientError> + Send + Sync,
{
    fn complete(&self, request: &ChatRequest) -> Result<String, ClientError> {
        (self.0)(request)
    }
}

fn scripted<F>(name: &str, script: F) -> JudgeModel
where
    F: Fn(&ChatRequest) -> Result<String, ClientError> + Send + Sync + 'static,
{
    JudgeModel::with_client(name, "stub-model", Arc::new(ScriptedModel(script)))
}

fn speech_samples(n: u32) -> Vec<Sample> {
    (1..=n)
        .map(|id| Sample {
            id,
            reference_text: format!("utterance number {id}"),
            payload: SamplePayload::Audio(PathBuf::from(format!("wav/{id:04}.wav"))),
        })
        .collect()
}

fn service_table(prefix: &str, outputs: &[&str]) -> ResultTable {
    let mut table = ResultTable::new();
    for (i, output) in outputs.iter().enumerate() {
        table.push(
            ResultRow::new(format!("{prefix}_{:04}", i + 1), *output)
                .with_score(JUDGE_SCORE_COLUMN, 0.0),
        );
    }
    table
}

fn two_service_results(dir: &std::path::Path) -> ServiceResults {
    let mut results = ServiceResults::new();
    results.push(
        "alpha_stt",
        dir.join("alpha_stt.csv"),
        service_table("alpha_stt", &["utterance number 1", "utterance number 2"]),
    );
    results.push(
        "beta_stt",
        dir.join("beta_stt.csv"),
        service_table("beta_stt", &["utterance one", "utterance two"]),
    );
    results
}

fn valid_reply(alpha: f64, beta: f64) -> String {
    format!(
        r#"{{"llm_transcript": "the judge transcript", "scores": {{"alpha_stt": {alpha}, "beta_stt": {beta}}}}}"#
    )
}

#[test]
fn test_parse_failure_degrades_only_the_failing_sample() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(2);

    // Sample 2's listing contains "utterance two"; reply with junk there.
    let judge = scripted("gpt_audio", |request: &ChatRequest| {
        if request.prompt.contains("utterance two") {
            Ok("I will not be returning JSON today.".to_string())
        } else {
            Ok(valid_reply(9.5, 6.0))
        }
    });

    let reports = judge_services(
        &mut results,
        &samples,
        &[judge],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap();

    assert_eq!(reports.len(), 1);
    let rows = &reports[0].rows;
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].llm_transcript, "the judge transcript");
    assert_eq!(rows[0].scores["alpha_stt"], 9.5);
    assert_eq!(rows[0].scores["beta_stt"], 6.0);

    assert_eq!(rows[1].llm_transcript, "n/a");
    assert_eq!(rows[1].scores["alpha_stt"], -1.0);
    assert_eq!(rows[1].scores["beta_stt"], -1.0);
}

#[test]
fn test_transport_failure_degrades_to_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(2);

    let judge = scripted("gpt_audio", |request: &ChatRequest| {
        if request.prompt.contains("utterance two") {
            Err(ClientError::MalformedResponse("boom".to_string()))
        } else {
            Ok(valid_reply(8.0, 8.0))
        }
    });

    let reports = judge_services(
        &mut results,
        &samples,
        &[judge],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap();

    let rows = &reports[0].rows;
    assert_eq!(rows[0].scores["alpha_stt"], 8.0);
    assert_eq!(rows[1].scores["alpha_stt"], -1.0);
    assert_eq!(rows[1].llm_transcript, "n/a");
}

#[test]
fn test_out_of_range_and_missing_scores_become_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(1);

    // Score for beta is out of range; alpha is missing entirely.
    let judge = scripted("gpt_audio", |_request: &ChatRequest| {
        Ok(r#"{"llm_transcript": "t", "scores": {"beta_stt": 42.0}}"#.to_string())
    });

    let reports = judge_services(
        &mut results,
        &samples,
        &[judge],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap();

    let row = &reports[0].rows[0];
    assert_eq!(row.scores["alpha_stt"], -1.0);
    assert_eq!(row.scores["beta_stt"], -1.0);
}

#[test]
fn test_scores_joined_back_onto_result_tables() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(2);

    let judge = scripted("gpt_audio", |_request: &ChatRequest| Ok(valid_reply(9.0, 4.5)));

    judge_services(
        &mut results,
        &samples,
        &[judge],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap();

    // In-memory tables carry the recreated column...
    let alpha = &results.get("alpha_stt").unwrap().table;
    assert_eq!(alpha.score_columns(), vec![JUDGE_SCORE_COLUMN]);
    assert_eq!(alpha.rows()[0].score(JUDGE_SCORE_COLUMN), Some(9.0));

    // ...and the persisted files match.
    let reloaded = ResultTable::read_csv(&dir.path().join("beta_stt.csv")).unwrap();
    assert_eq!(reloaded.rows()[1].score(JUDGE_SCORE_COLUMN), Some(4.5));

    // The per-model report exists with the canonical name.
    assert!(dir.path().join("speech_judge_gpt_audio.csv").exists());
}

#[test]
fn test_exhaustive_orders_run_every_permutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(1);
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_in_script = Arc::clone(&calls);
    let judge = scripted("gpt_audio", move |_request: &ChatRequest| {
        calls_in_script.fetch_add(1, Ordering::SeqCst);
        Ok(valid_reply(7.0, 7.0))
    });

    let reports = judge_services(
        &mut results,
        &samples,
        &[judge],
        Task::Stt,
        PresentationOrders::Exhaustive,
        dir.path(),
    )
    .unwrap();

    // Two services: 2 permutations, one judge call per sample per order.
    assert_eq!(reports.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(reports[0].order, vec!["alpha_stt", "beta_stt"]);
    assert_eq!(reports[1].order, vec!["beta_stt", "alpha_stt"]);
    assert_eq!(reports[0].order_index, 0);

    assert!(dir.path().join("speech_judge_gpt_audio.csv").exists());
    assert!(dir.path().join("speech_judge_gpt_audio_order1.csv").exists());
}

#[test]
fn test_multi_model_fanout_writes_suffixed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = two_service_results(dir.path());
    let samples = speech_samples(1);

    let first = scripted("gpt_audio", |_r: &ChatRequest| Ok(valid_reply(9.0, 9.0)));
    let second = scripted("gpt_mini", |_r: &ChatRequest| Ok(valid_reply(3.0, 3.0)));

    judge_services(
        &mut results,
        &samples,
        &[first, second],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap();

    let alpha = &results.get("alpha_stt").unwrap().table;
    assert_eq!(
        alpha.score_columns(),
        vec![
            JUDGE_SCORE_COLUMN,
            "llm_judge_score_gpt_audio",
            "llm_judge_score_gpt_mini"
        ]
    );
    assert_eq!(alpha.rows()[0].score("llm_judge_score_gpt_audio"), Some(9.0));
    assert_eq!(alpha.rows()[0].score("llm_judge_score_gpt_mini"), Some(3.0));

    assert!(dir.path().join("speech_judge_gpt_audio.csv").exists());
    assert!(dir.path().join("speech_judge_gpt_mini.csv").exists());
}

#[test]
fn test_judging_nothing_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut results = ServiceResults::new();
    let judge = scripted("gpt_audio", |_r: &ChatRequest| Ok(valid_reply(5.0, 5.0)));

    let err = judge_services(
        &mut results,
        &speech_samples(1),
        &[judge],
        Task::Stt,
        PresentationOrders::Single,
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, verdict_judge::JudgeError::NoResults));
}

#[test]
fn test_oracle_parse_fallback_and_caching() {
    let dir = tempfile::tempdir().unwrap();
    let samples = speech_samples(2);
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_in_script = Arc::clone(&calls);
    let oracle = scripted("gpt_audio", move |request: &ChatRequest| {
        calls_in_script.fetch_add(1, Ordering::SeqCst);
        if request
            .audio
            .as_ref()
            .is_some_and(|a| a.path.ends_with("0002.wav"))
        {
            Ok("not json at all".to_string())
        } else {
            Ok(r#"{"llm_oracle": "a clean transcript"}"#.to_string())
        }
    });

    let output = generate_oracle(
        &samples,
        std::slice::from_ref(&oracle),
        Task::Stt,
        false,
        false,
        dir.path(),
    )
    .unwrap();

    let table = match &output {
        OracleOutput::Single(table) => table,
        OracleOutput::PerModel(_) => panic!("expected single-table mode"),
    };
    assert_eq!(table.rows()[0].llm_oracle, "a clean transcript");
    assert_eq!(table.rows()[1].llm_oracle, "n/a");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Second run with use_existing must load the file, not call the model.
    let cached = generate_oracle(
        &samples,
        std::slice::from_ref(&oracle),
        Task::Stt,
        false,
        true,
        dir.path(),
    )
    .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cached.primary().unwrap(), table);
}

#[test]
fn test_oracle_translation_prompts_with_source_text() {
    let dir = tempfile::tempdir().unwrap();
    let samples = vec![Sample {
        id: 1,
        reference_text: "reprise de la session".to_string(),
        payload: SamplePayload::SourceText("resumption of the session".to_string()),
    }];

    let oracle = scripted("gpt_mini", |request: &ChatRequest| {
        assert!(request.prompt.contains("resumption of the session"));
        assert!(request.audio.is_none());
        Ok(r#"{"llm_oracle": "reprise de la session"}"#.to_string())
    });

    let output = generate_oracle(
        &samples,
        std::slice::from_ref(&oracle),
        Task::Translation,
        false,
        false,
        dir.path(),
    )
    .unwrap();

    let table = output.primary().unwrap();
    assert_eq!(table.rows()[0].llm_oracle, "reprise de la session");
    assert!(dir.path().join("language_oracle.csv").exists());
}

#[test]
fn test_oracle_multi_model_shape() {
    let dir = tempfile::tempdir().unwrap();
    let samples = speech_samples(1);

    let first = scripted("gpt_audio", |_r: &ChatRequest| {
        Ok(r#"{"llm_oracle": "first transcript"}"#.to_string())
    });
    let second = scripted("gpt_mini", |_r: &ChatRequest| {
        Ok(r#"{"llm_oracle": "second transcript"}"#.to_string())
    });

    let output = generate_oracle(
        &samples,
        &[first, second],
        Task::Stt,
        true,
        false,
        dir.path(),
    )
    .unwrap();

    match output {
        OracleOutput::PerModel(tables) => {
            assert_eq!(tables.len(), 2);
            assert_eq!(tables[0].0, "gpt_audio");
            assert_eq!(tables[0].1.rows()[0].llm_oracle, "first transcript");
            assert_eq!(tables[1].1.rows()[0].llm_oracle, "second transcript");
        }
        OracleOutput::Single(_) => panic!("expected per-model mode"),
    }

    assert!(dir.path().join("speech_oracle_gpt_audio.csv").exists());
    assert!(dir.path().join("speech_oracle_gpt_mini.csv").exists());
}
