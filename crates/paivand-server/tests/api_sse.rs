mod common;

use common::test_state;
use paivand_server::app;
use paivand_types::{Locale, Message, MessageKind, PersonaId};
use tokio::net::TcpListener;

fn sample_message() -> Message {
    Message {
        id: "m-1".to_string(),
        sender_persona_id: PersonaId::Brian,
        original_text: Some("Hi there".to_string()),
        original_locale: Some(Locale::En),
        translated_text: Some("سلام".to_string()),
        translated_locale: Some(Locale::Fa),
        tone_adjusted_text: Some("عزیزم سلام ❤️".to_string()),
        translation_provider: Some("ollama".to_string()),
        audio_url: None,
        transcription_text: None,
        transcription_confidence: None,
        kind: MessageKind::Text,
        created_at: "2026-01-01T10:00:00Z".to_string(),
        media: Vec::new(),
        reactions: Vec::new(),
    }
}

#[tokio::test]
async fn event_stream_delivers_published_events() {
    let state = test_state(vec![], None);
    let events_tx = state.events_tx.clone();

    let router = app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let mut response = client
        .get(format!("{}/events/stream", server_url))
        .send()
        .await
        .expect("failed to connect to SSE stream");
    assert!(response.status().is_success());

    // Wait a bit for the subscription to be established.
    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

    events_tx
        .send(paivand_types::ChatEvent::MessageCreated(sample_message()))
        .expect("no subscribers on the event channel");

    let chunk = response
        .chunk()
        .await
        .expect("failed to read chunk")
        .expect("stream closed");
    let chunk_str = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(chunk_str.contains("event: message_created"));
    assert!(chunk_str.contains("data:"));
    assert!(chunk_str.contains("\"id\":\"m-1\""));
}
