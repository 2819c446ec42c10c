use fenrir_ai::scripted_provider::{ScriptedProvider, ScriptedReply};
use fenrir_ai::{KeywordParseError, TutorPipeline};
use fenrir_core::{AnalysisRequest, ConceptStore, FenrirError};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn quadratic_store() -> Arc<ConceptStore> {
    Arc::new(ConceptStore::from_sources(
        object(json!({
            "quadratic_equations": {
                "definition": "An equation of the form ax²+bx+c=0",
                "examples": ["x²=4 has roots ±2"]
            }
        })),
        object(json!({"concept_A": {"definition": "first concept"}})),
    ))
}

/// Decode the `{"instruction", "input"}` payload a stage sent to the model.
fn payload(prompt: &str) -> Value {
    serde_json::from_str(prompt).expect("prompt payload is JSON")
}

#[tokio::test]
async fn end_to_end_quadratic_scenario() {
    let feedback = "Hello! Great effort.\n1. Analysis conclusion\n...";
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Text("```json\n[\"quadratic_equations\"]\n```".into()),
        ScriptedReply::Text(feedback.into()),
    ]));
    let pipeline = TutorPipeline::new(provider.clone(), quadratic_store());
    let request = AnalysisRequest::new("Solve x²=4", "x=2").expect("request");

    let outcome = pipeline.analyze(&request).await.expect("analysis");

    assert_eq!(outcome.result.text, feedback);
    assert_eq!(outcome.result.keywords, vec!["quadratic_equations"]);
    assert_eq!(outcome.context.matches("#### ").count(), 1);
    assert!(outcome.context.contains("#### quadratic_equations"));
    assert!(outcome.warnings().is_empty());

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);

    let stage1 = payload(&prompts[0]);
    let instruction = stage1["instruction"].as_str().expect("instruction");
    assert!(instruction.contains("quadratic_equations"));
    assert!(instruction.contains("concept_A"));
    assert!(stage1["input"]
        .as_str()
        .expect("input")
        .contains("Solve x²=4"));

    let stage2 = payload(&prompts[1]);
    let input = stage2["input"].as_str().expect("input");
    assert!(input.starts_with(&outcome.context));
    assert!(input.contains("### Problem\nSolve x²=4"));
    assert!(input.ends_with("### Student's solution\nx=2"));
}

#[tokio::test]
async fn non_json_keywords_degrade_to_no_context() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Text("not json".into()),
        ScriptedReply::Text("Feedback without concepts".into()),
    ]));
    let pipeline = TutorPipeline::new(provider.clone(), quadratic_store());
    let request = AnalysisRequest::new("Solve x²=4", "x=2").expect("request");

    let outcome = pipeline.analyze(&request).await.expect("analysis proceeds");

    assert_eq!(outcome.result.text, "Feedback without concepts");
    assert!(outcome.result.keywords.is_empty());
    assert_eq!(outcome.context, "");
    assert!(matches!(
        outcome.extraction.diagnostic(),
        Some(KeywordParseError::InvalidJson(_))
    ));
    assert_eq!(outcome.warnings().len(), 1);

    let stage2 = payload(&provider.prompts()[1]);
    assert!(stage2["input"]
        .as_str()
        .expect("input")
        .starts_with("\n\n---\n\n### Problem"));
}

#[tokio::test]
async fn stage_one_transport_error_is_recoverable() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Failure("connection reset".into()),
        ScriptedReply::Text("Feedback".into()),
    ]));
    let pipeline = TutorPipeline::new(provider, quadratic_store());
    let request = AnalysisRequest::new("p", "s").expect("request");

    let outcome = pipeline.analyze(&request).await.expect("analysis proceeds");
    assert!(matches!(
        outcome.extraction.diagnostic(),
        Some(KeywordParseError::Model(m)) if m.contains("connection reset")
    ));
    assert_eq!(outcome.result.text, "Feedback");
}

#[tokio::test]
async fn unknown_keywords_are_skipped_in_context() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Text(r#"["concept_A", "concept_B"]"#.into()),
        ScriptedReply::Text("Feedback".into()),
    ]));
    let pipeline = TutorPipeline::new(provider, quadratic_store());
    let request = AnalysisRequest::new("p", "s").expect("request");

    let outcome = pipeline.analyze(&request).await.expect("analysis");
    assert_eq!(outcome.context.matches("#### ").count(), 1);
    assert!(outcome.context.contains("#### concept_A"));
    assert!(!outcome.context.contains("concept_B"));
}

#[tokio::test]
async fn stage_two_failure_surfaces_an_error() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Text(r#"["concept_A"]"#.into()),
        ScriptedReply::Failure("403 permission denied".into()),
    ]));
    let pipeline = TutorPipeline::new(provider, quadratic_store());
    let request = AnalysisRequest::new("p", "s").expect("request");

    let err = pipeline.analyze(&request).await.unwrap_err();
    assert!(matches!(err, FenrirError::Synthesis(ref m) if m.contains("permission denied")));
}

#[tokio::test]
async fn empty_feedback_is_a_failure_not_a_result() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Text("[]".into()),
        ScriptedReply::Text("   ".into()),
    ]));
    let pipeline = TutorPipeline::new(provider, quadratic_store());
    let request = AnalysisRequest::new("p", "s").expect("request");

    assert!(matches!(
        pipeline.analyze(&request).await,
        Err(FenrirError::Synthesis(_))
    ));
}
