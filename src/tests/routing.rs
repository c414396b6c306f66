//! End-to-end routing: corpus file → vectorized index → router decisions.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::context::{EmployeeContext, LeaveBalance, LeaveType};
use crate::corpus;
use crate::router::{QueryRouter, RoutingDecision, FAIL_SAFE_MESSAGE};
use crate::semantic::embeddings::EmbeddingProvider;
use crate::semantic::{CorpusDoc, DocumentIndex};
use crate::tests::TableProvider;

const SICK_LEAVE_PASSAGE: &str =
    "To apply for sick leave, submit Form HR-12 with a medical certificate";
const TRAVEL_PASSAGE: &str =
    "Business travel must be approved by the department head two weeks in advance";

fn employee_context() -> EmployeeContext {
    let mut ctx = EmployeeContext::default();
    ctx.employee.name = "A. Example".to_string();
    ctx.employee.manager_name = "Jane Doe".to_string();

    for (code, desc, balance) in [
        ("AL", "Annual Leave", 10.0),
        ("SL", "Sick Leave", 5.0),
        ("CL", "Casual Leave", 2.0),
    ] {
        ctx.leave_types.push(LeaveType {
            code: code.to_string(),
            desc: desc.to_string(),
            ..Default::default()
        });
        ctx.leave_balances.insert(
            code.to_string(),
            LeaveBalance {
                balance,
                ..Default::default()
            },
        );
    }
    ctx
}

fn seed_provider() -> TableProvider {
    // The sick-leave passage sits close to the sick-leave question; the
    // travel passage is nearly orthogonal to it.
    TableProvider::new(&[
        (SICK_LEAVE_PASSAGE, vec![0.96, 0.28, 0.0]),
        (TRAVEL_PASSAGE, vec![0.0, 0.2, 0.98]),
        ("How do I apply for sick leave?", vec![1.0, 0.0, 0.0]),
        ("asdkjalksdj", vec![0.05, 0.99, 0.05]),
    ])
}

async fn vectorized_index(provider: &TableProvider) -> DocumentIndex {
    let docs = vec![
        CorpusDoc {
            text: SICK_LEAVE_PASSAGE.to_string(),
            metadata: {
                let mut m = BTreeMap::new();
                m.insert("source".to_string(), "Leave Policy".to_string());
                m.insert("section".to_string(), "Sick Leave".to_string());
                m
            },
        },
        CorpusDoc {
            text: TRAVEL_PASSAGE.to_string(),
            metadata: BTreeMap::new(),
        },
    ];
    DocumentIndex::build(docs, provider).await.unwrap()
}

/// Corpus vectorized offline, saved, reloaded, and queried: the full
/// pipeline the embed-corpus command and the daemon share.
#[tokio::test]
async fn vectorize_save_load_and_route() {
    let provider = seed_provider();
    let index = vectorized_index(&provider).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    corpus::save_prebuilt(&index, &path).unwrap();

    let loaded = corpus::load_prebuilt(&path, provider.model_id()).unwrap();
    assert_eq!(loaded.len(), 2);

    let router = QueryRouter::new(Arc::new(provider), SearchConfig::default());
    let decision = router
        .route("How do I apply for sick leave?", &employee_context(), &loaded)
        .await;

    match decision {
        RoutingDecision::Document(hits) => {
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].text, SICK_LEAVE_PASSAGE);
            assert_eq!(hits[0].metadata["section"], "Sick Leave");
        }
        other => panic!("expected document answer, got {other:?}"),
    }
}

#[tokio::test]
async fn structured_questions_skip_the_provider_entirely() {
    let seed = seed_provider();
    let index = vectorized_index(&seed).await;

    let provider = Arc::new(TableProvider::new(&[]));
    let router = QueryRouter::new(provider.clone(), SearchConfig::default());
    let ctx = employee_context();

    let decision = router.route("Who is my manager?", &ctx, &index).await;
    match decision {
        RoutingDecision::Structured(answer) => assert_eq!(answer, "Jane Doe"),
        other => panic!("expected structured answer, got {other:?}"),
    }

    let decision = router.route("What is my leave balance?", &ctx, &index).await;
    assert!(matches!(decision, RoutingDecision::Clarify(_)));

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn gibberish_gets_the_fail_safe_message() {
    let provider = seed_provider();
    let index = vectorized_index(&provider).await;

    let router = QueryRouter::new(Arc::new(seed_provider()), SearchConfig::default());
    let decision = router
        .route("asdkjalksdj", &employee_context(), &index)
        .await;

    match decision {
        RoutingDecision::Failsafe(message) => assert_eq!(message, FAIL_SAFE_MESSAGE),
        other => panic!("expected fail-safe, got {other:?}"),
    }
}

#[tokio::test]
async fn routing_is_deterministic_across_repeated_calls() {
    let provider = seed_provider();
    let index = vectorized_index(&provider).await;
    let router = QueryRouter::new(Arc::new(seed_provider()), SearchConfig::default());
    let ctx = employee_context();

    let first = router
        .route("How do I apply for sick leave?", &ctx, &index)
        .await;
    let first = serde_json::to_value(&first).unwrap();

    for _ in 0..5 {
        let again = router
            .route("How do I apply for sick leave?", &ctx, &index)
            .await;
        assert_eq!(serde_json::to_value(&again).unwrap(), first);
    }
}

#[tokio::test]
async fn threshold_is_honored_from_config() {
    let provider = seed_provider();
    let index = vectorized_index(&provider).await;
    let ctx = employee_context();

    // With an impossible threshold even the close passage is rejected.
    let strict = SearchConfig {
        score_threshold: 0.999,
        ..Default::default()
    };
    let router = QueryRouter::new(Arc::new(seed_provider()), strict);
    let decision = router
        .route("How do I apply for sick leave?", &ctx, &index)
        .await;
    assert!(matches!(decision, RoutingDecision::Failsafe(_)));

    // With a permissive threshold even gibberish finds a passage.
    let lax = SearchConfig {
        score_threshold: -1.0,
        ..Default::default()
    };
    let router = QueryRouter::new(Arc::new(seed_provider()), lax);
    let decision = router.route("asdkjalksdj", &ctx, &index).await;
    assert!(matches!(decision, RoutingDecision::Document(_)));
}
