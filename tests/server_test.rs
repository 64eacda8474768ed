
use docqa_server::{
    DocQaServer, ResolvedContext, ServerError, Upload,
    error::GENERIC_FAILURE_MESSAGE,
    resolver::ResolveError,
    server::AskRequest,
};
use std::sync::Arc;
use test_helpers::{StubModel, text_upload};

fn ask(question: &str) -> AskRequest {
    AskRequest {
        question: question.to_string(),
        upload: None,
    }
}

fn ask_with_file(question: &str, name: &str, content: &str) -> AskRequest {
    AskRequest {
        question: question.to_string(),
        upload: Some(text_upload(name, content)),
    }
}

fn setup() -> (Arc<StubModel>, DocQaServer) {
    let model = Arc::new(StubModel::new());
    let server = DocQaServer::new(model.clone());
    (model, server)
}

#[tokio::test]
async fn test_general_question_without_documents() {
    let (model, server) = setup();

    let answer = server.ask(ask("What is the speed of light?")).await.unwrap();

    assert_eq!(
        model.last_context(),
        Some(ResolvedContext::General("What is the speed of light?".to_string()))
    );
    assert!(answer.answer.contains("What is the speed of light?"));
}

#[tokio::test]
async fn test_upload_becomes_active_context() {
    let (model, server) = setup();

    server
        .ask(ask_with_file("summarize", "a.txt", "Rust Ownership\nBorrowing rules"))
        .await
        .unwrap();

    assert_eq!(
        model.last_context(),
        Some(ResolvedContext::Document(
            "Rust Ownership\nBorrowing rules".to_string()
        ))
    );

    let listing = server.documents().await;
    assert_eq!(listing.documents.len(), 1);
    assert_eq!(listing.documents[0].topic, "rust ownership");
    assert_eq!(listing.active, Some(listing.documents[0].id));
}

#[tokio::test]
async fn test_first_file_switch_persists_across_requests() {
    let (model, server) = setup();

    for (name, content) in [("1.txt", "alpha\nD1"), ("2.txt", "beta\nD2"), ("3.txt", "gamma\nD3")] {
        server.ask(ask_with_file("ok", name, content)).await.unwrap();
    }

    server.ask(ask("what does the first file say?")).await.unwrap();
    assert_eq!(model.last_context().unwrap().text(), "alpha\nD1");

    server.ask(ask("tell me more")).await.unwrap();
    assert_eq!(model.last_context().unwrap().text(), "alpha\nD1");
}

#[tokio::test]
async fn test_both_files_combines_first_two_uploads() {
    let (model, server) = setup();

    for (name, content) in [("1.txt", "alpha\nD1"), ("2.txt", "beta\nD2"), ("3.txt", "gamma\nD3")] {
        server.ask(ask_with_file("ok", name, content)).await.unwrap();
    }

    server.ask(ask("how do both files differ?")).await.unwrap();
    assert_eq!(
        model.last_context(),
        Some(ResolvedContext::PairComparison(
            "First File:\nalpha\nD1\n\nSecond File:\nbeta\nD2".to_string()
        ))
    );
    assert!(server.documents().await.compare_mode);
}

#[tokio::test]
async fn test_topic_comparison_round_trip() {
    let (model, server) = setup();

    server
        .ask(ask_with_file("ok", "chain.txt", "Introduction to Blockchain Technology\nblocks"))
        .await
        .unwrap();
    server
        .ask(ask_with_file("ok", "food.txt", "French Cooking\nbutter"))
        .await
        .unwrap();

    server
        .ask(ask("Compare the file about blockchain with the file about cooking"))
        .await
        .unwrap();

    let context = model.last_context().unwrap();
    assert!(matches!(context, ResolvedContext::TopicComparison(_)));
    let text = context.text();
    assert!(text.contains("introduction to blockchain technology"));
    assert!(text.contains("french cooking"));
    assert!(text.find("blocks").unwrap() < text.find("butter").unwrap());
}

#[tokio::test]
async fn test_unavailable_comparison_skips_completion() {
    let (model, server) = setup();

    server
        .ask(ask_with_file("ok", "chain.txt", "Blockchain\nblocks"))
        .await
        .unwrap();
    assert_eq!(model.completion_count(), 1);

    let err = server
        .ask(ask("compare the file about blockchain and the file about astronomy"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServerError::Resolve(ResolveError::ComparisonUnavailable { .. })
    ));
    assert!(err.is_client_error());
    assert_eq!(model.completion_count(), 1);
}

#[tokio::test]
async fn test_comparison_can_use_the_file_uploaded_with_it() {
    let (model, server) = setup();

    server
        .ask(ask_with_file("ok", "a.txt", "Astronomy\nstars"))
        .await
        .unwrap();
    server
        .ask(ask_with_file(
            "compare the file about astronomy and the file about geology",
            "b.txt",
            "Geology\nrocks",
        ))
        .await
        .unwrap();

    assert!(matches!(
        model.last_context(),
        Some(ResolvedContext::TopicComparison(_))
    ));
    assert_eq!(server.documents().await.documents.len(), 2);
}

#[tokio::test]
async fn test_completion_failure_is_a_processing_failure() {
    let model = Arc::new(StubModel::failing_completion());
    let server = DocQaServer::new(model.clone());

    let err = server.ask(ask("hello?")).await.unwrap_err();
    assert!(matches!(err, ServerError::Llm(_)));
    assert!(!err.is_client_error());
    assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_topic_failure_aborts_before_ingest() {
    let model = Arc::new(StubModel::failing_topic());
    let server = DocQaServer::new(model.clone());

    let err = server
        .ask(ask_with_file("summarize", "a.txt", "Some Topic\nbody"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServerError::Llm(_)));
    assert!(server.documents().await.documents.is_empty());
    assert_eq!(model.completion_count(), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_are_all_stored() {
    let (_model, server) = setup();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .ask(ask_with_file(
                        "ok",
                        &format!("{i}.txt"),
                        &format!("topic {i}\nbody {i}"),
                    ))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listing = server.documents().await;
    assert_eq!(listing.documents.len(), 8);
    assert!(listing.active.is_some());
}

#[tokio::test]
async fn test_prepare_document_extracts_off_the_runtime() {
    let (_model, server) = setup();

    let document = server
        .prepare_document(&text_upload("a.txt", "Marine Biology\nwhales"))
        .await
        .unwrap();
    assert_eq!(document.topic, "marine biology");
    assert_eq!(document.content, "Marine Biology\nwhales");
}

#[tokio::test]
async fn test_broken_pdf_is_a_processing_failure() {
    let (model, server) = setup();

    let request = AskRequest {
        question: "summarize".to_string(),
        upload: Some(Upload::new(
            Some("broken.pdf".to_string()),
            Some("application/pdf".to_string()),
            b"not a pdf at all".to_vec(),
        )),
    };
    let err = server.ask(request).await.unwrap_err();

    assert!(matches!(err, ServerError::DocLoader(_)));
    assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);
    assert!(server.documents().await.documents.is_empty());
    assert_eq!(model.completion_count(), 0);
}
