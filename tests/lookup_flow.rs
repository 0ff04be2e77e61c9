//! End-to-end lookup tests: keystrokes go through the suggestion engine and
//! a real `ArxivClient` talking to a mock arXiv endpoint.
//!
//! These run in real time with a short debounce window.

use arxiv_getter::feed::ArxivClient;
use arxiv_getter::note::NoteWriter;
use arxiv_getter::suggest::{SuggestConfig, SuggestionEngine, SuggestionEvent, SuggestionHandle};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEBOUNCE: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(5);

const RAG_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <link href="http://arxiv.org/api/query?search_query%3Did%3A2005.11401v4" rel="self" type="application/atom+xml"/>
  <title type="html">ArXiv Query: search_query=id:2005.11401v4&amp;id_list=&amp;start=0&amp;max_results=10</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <updated>2024-03-01T00:00:00-05:00</updated>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">1</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2005.11401v4</id>
    <updated>2021-04-12T15:42:18Z</updated>
    <published>2020-05-22T17:34:24Z</published>
    <title>Retrieval-Augmented Generation for Knowledge-Intensive NLP Tasks</title>
    <summary>Large pre-trained language models have been shown to store factual
knowledge in their parameters.</summary>
    <author>
      <name>Patrick Lewis</name>
    </author>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">Accepted at NeurIPS 2020</arxiv:comment>
    <link href="http://arxiv.org/abs/2005.11401v4" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2005.11401v4" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query</title>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">0</opensearch:totalResults>
</feed>"#;

const API_ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=id:quantum gravity</title>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_quantum gravity</id>
    <title>Error</title>
    <summary>incorrect id format for quantum gravity</summary>
    <updated>2024-03-01T00:00:00-05:00</updated>
    <link href="http://arxiv.org/api/errors#incorrect_id_format_for_quantum gravity" rel="alternate" type="text/html"/>
    <author><name>arXiv api core</name></author>
  </entry>
</feed>"#;

fn single_entry_feed(id: &str, title: &str) -> String {
    format!(
        r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/{id}</id>
    <updated>2019-01-01T00:00:00Z</updated>
    <published>2019-01-01T00:00:00Z</published>
    <title>{title}</title>
    <summary>Abstract.</summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
  </entry>
</feed>"#
    )
}

fn start_engine(server: &MockServer) -> (SuggestionHandle, mpsc::Receiver<SuggestionEvent>) {
    start_engine_with(server, false)
}

fn start_engine_with(
    server: &MockServer,
    free_text: bool,
) -> (SuggestionHandle, mpsc::Receiver<SuggestionEvent>) {
    let client = ArxivClient::new(reqwest::Client::new())
        .with_endpoint(format!("{}/api/query", server.uri()));
    let (tx, rx) = mpsc::channel(16);
    let config = SuggestConfig {
        debounce: DEBOUNCE,
        limit: 10,
        free_text,
    };
    (SuggestionEngine::spawn(Arc::new(client), config, tx), rx)
}

async fn next_event(rx: &mut mpsc::Receiver<SuggestionEvent>) -> SuggestionEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a suggestion")
        .expect("engine stopped")
}

async fn assert_quiet(rx: &mut mpsc::Receiver<SuggestionEvent>, window: Duration) {
    if let Ok(Some(event)) = tokio::time::timeout(window, rx.recv()).await {
        panic!("Unexpected suggestion: {:?}", event);
    }
}

#[tokio::test]
async fn test_pasted_url_resolves_to_paper() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "id:2005.11401v4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RAG_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("https://arxiv.org/abs/2005.11401v4");

    let SuggestionEvent::Results(articles) = next_event(&mut rx).await else {
        panic!("Expected results");
    };
    assert_eq!(articles.len(), 1);
    let rag = &articles[0];
    assert_eq!(
        rag.title,
        "Retrieval-Augmented Generation for Knowledge-Intensive NLP Tasks"
    );
    assert_eq!(rag.authors, vec!["Patrick Lewis".to_string()]);
    assert_eq!(rag.pdf.as_deref(), Some("http://arxiv.org/pdf/2005.11401v4"));
    assert_eq!(rag.id, "http://arxiv.org/abs/2005.11401v4");

    handle.close().await;
}

#[tokio::test]
async fn test_typing_burst_sends_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "id:rag"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RAG_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("r");
    handle.input("ra");
    handle.input("rag");

    assert!(matches!(next_event(&mut rx).await, SuggestionEvent::Results(_)));
    assert_quiet(&mut rx, Duration::from_millis(200)).await;

    handle.close().await;
    // MockServer verifies `expect(1)` on drop
}

#[tokio::test]
async fn test_slow_stale_response_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("search_query", "id:slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(single_entry_feed("1111.11111v1", "Slow paper"))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("search_query", "id:fast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(single_entry_feed("2222.22222v1", "Fast paper")),
        )
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("slow");
    // Let the first lookup go out before typing again
    tokio::time::sleep(DEBOUNCE * 3).await;
    handle.input("fast");

    let SuggestionEvent::Results(articles) = next_event(&mut rx).await else {
        panic!("Expected results");
    };
    assert_eq!(articles[0].title, "Fast paper");
    assert_eq!(articles[0].authors, vec!["Ada Lovelace", "Alan Turing"]);

    // The slow response lands later and must not replace the list
    assert_quiet(&mut rx, Duration::from_millis(900)).await;
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(2));

    handle.close().await;
}

#[tokio::test]
async fn test_free_text_search_is_opt_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("search_query", "all:retrieval augmented"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RAG_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine_with(&server, true);
    handle.input("retrieval augmented");

    assert!(matches!(next_event(&mut rx).await, SuggestionEvent::Results(_)));
    handle.close().await;
}

#[tokio::test]
async fn test_api_error_for_unmatched_text_reports_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("search_query", "id:quantum gravity"))
        .respond_with(ResponseTemplate::new(200).set_body_string(API_ERROR_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("quantum gravity");

    assert_eq!(
        next_event(&mut rx).await,
        SuggestionEvent::NoResults {
            query: "quantum gravity".into()
        }
    );
    handle.close().await;
}

#[tokio::test]
async fn test_whitespace_input_is_queried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("search_query", "id:   "))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_FEED))
        .expect(1)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("   ");

    assert_eq!(
        next_event(&mut rx).await,
        SuggestionEvent::NoResults { query: "   ".into() }
    );
    handle.close().await;
}

#[tokio::test]
async fn test_empty_feed_reports_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_FEED))
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("9999.99999");

    assert_eq!(
        next_event(&mut rx).await,
        SuggestionEvent::NoResults {
            query: "9999.99999".into()
        }
    );
    handle.close().await;
}

#[tokio::test]
async fn test_server_error_reports_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("quantum");

    assert!(matches!(
        next_event(&mut rx).await,
        SuggestionEvent::NoResults { .. }
    ));
    handle.close().await;
}

#[tokio::test]
async fn test_cleared_input_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RAG_FEED))
        .expect(0)
        .mount(&server)
        .await;

    let (handle, mut rx) = start_engine(&server);
    handle.input("2");
    handle.input("");

    assert_eq!(next_event(&mut rx).await, SuggestionEvent::Cleared);
    assert_quiet(&mut rx, Duration::from_millis(200)).await;
    handle.close().await;
}

#[tokio::test]
async fn test_suggestion_becomes_note() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RAG_FEED))
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join("arxiv_getter_lookup_flow_note");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("paper-template.md"),
        "# {{title}}\n\n{{#each authors}}- {{this}}\n{{/each}}{{url}}\n",
    )
    .unwrap();

    let (handle, mut rx) = start_engine(&server);
    handle.input("https://arxiv.org/pdf/2005.11401v4.pdf");
    let SuggestionEvent::Results(articles) = next_event(&mut rx).await else {
        panic!("Expected results");
    };
    handle.close().await;

    let writer = NoteWriter::new(&dir, "paper-template", "{{id}}");
    let path = writer.create(&articles[0]).await.unwrap();
    assert_eq!(path, dir.join("2005.11401.md"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "# Retrieval-Augmented Generation for Knowledge-Intensive NLP Tasks\n\n\
         - Patrick Lewis\nhttp://arxiv.org/abs/2005.11401v4\n"
    );

    // Second attempt must not clobber the existing note
    assert!(writer.create(&articles[0]).await.is_err());
    std::fs::remove_dir_all(&dir).ok();
}
