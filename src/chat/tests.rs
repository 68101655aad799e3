use super::*;

fn user(content: &str) -> ChatMessage {
    ChatMessage::new(Role::User, content)
}

fn assistant(content: &str) -> ChatMessage {
    ChatMessage::new(Role::Assistant, content)
}

fn system(content: &str) -> ChatMessage {
    ChatMessage::new(Role::System, content)
}

#[test]
fn test_role_wire_names_are_lowercase() {
    assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(
        serde_json::to_string(&Role::Assistant).unwrap(),
        "\"assistant\""
    );

    let msg: ChatMessage = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
    assert_eq!(msg, user("hi"));
}

#[test]
fn test_user_context_accepts_partial_payloads() {
    let ctx: UserContext = serde_json::from_str(r#"{"userName":"Asha"}"#).unwrap();
    assert_eq!(ctx.user_name.as_deref(), Some("Asha"));
    assert!(ctx.user_id.is_none());
    assert!(ctx.mood_history.is_empty());
    assert!(ctx.latest_mood().is_none());
}

#[test]
fn test_latest_mood_is_last_entry() {
    let ctx = UserContext {
        mood_history: vec!["calm".into(), "anxious".into()],
        ..Default::default()
    };
    assert_eq!(ctx.latest_mood(), Some("anxious"));
}

#[test]
fn test_normalize_merges_preamble_into_first_user_turn() {
    let normalized = normalize(&[user("I feel anxious")], None);

    assert_eq!(normalized.turns.len(), 1);
    assert_eq!(normalized.turns[0].role, PromptRole::User);
    assert!(normalized.turns[0].text.contains("mental-wellness companion"));
    assert!(normalized.turns[0].text.ends_with("I feel anxious"));
    assert!(!normalized.personalized);
}

#[test]
fn test_normalize_merges_caller_system_messages() {
    let normalized = normalize(
        &[system("Answer in Spanish."), user("Hola")],
        None,
    );

    assert_eq!(normalized.turns.len(), 1);
    assert!(normalized.turns[0].text.contains("Answer in Spanish."));
    assert!(normalized.turns[0].text.ends_with("Hola"));
}

#[test]
fn test_normalize_maps_assistant_to_model_role() {
    let normalized = normalize(
        &[user("hi"), assistant("hello"), user("how are you")],
        None,
    );

    assert_eq!(normalized.turns.len(), 3);
    assert_eq!(normalized.turns[1].role, PromptRole::Model);
    assert_eq!(normalized.turns[1].text, "hello");
    // Only the first user turn carries the preamble.
    assert_eq!(normalized.turns[2].text, "how are you");
}

#[test]
fn test_normalize_personalizes_from_context() {
    let ctx = UserContext {
        user_name: Some("Asha".into()),
        mood_history: vec!["stressed".into()],
        ..Default::default()
    };
    let normalized = normalize(&[user("hi")], Some(&ctx));

    assert!(normalized.personalized);
    assert!(normalized.turns[0].text.contains("Asha"));
    assert!(normalized.turns[0].text.contains("stressed"));
}

#[test]
fn test_normalize_empty_context_is_not_personalized() {
    let ctx = UserContext::default();
    let normalized = normalize(&[user("hi")], Some(&ctx));
    assert!(!normalized.personalized);
}

#[test]
fn test_normalize_without_user_turn_synthesizes_one() {
    let normalized = normalize(&[assistant("welcome back")], None);

    assert_eq!(normalized.turns.len(), 2);
    assert_eq!(normalized.turns[0].role, PromptRole::User);
    assert!(normalized.turns[0].text.contains("mental-wellness companion"));
    assert_eq!(normalized.turns[1].role, PromptRole::Model);
}
