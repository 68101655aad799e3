use super::*;
use crate::chat::UserContext;

fn ctx(name: Option<&str>, moods: &[&str]) -> UserContext {
    UserContext {
        user_id: None,
        user_name: name.map(String::from),
        mood_history: moods.iter().map(|m| m.to_string()).collect(),
    }
}

#[test]
fn test_seeded_generator_is_deterministic() {
    let a = FallbackGenerator::with_seed(7);
    let b = FallbackGenerator::with_seed(7);
    let context = ctx(Some("Asha"), &["anxious"]);

    for _ in 0..10 {
        assert_eq!(a.chat_reply(Some(&context)), b.chat_reply(Some(&context)));
    }
}

#[test]
fn test_reply_includes_user_name() {
    let generator = FallbackGenerator::with_seed(1);
    let context = ctx(Some("Asha"), &[]);

    let reply = generator.chat_reply(Some(&context));
    assert!(reply.starts_with("Asha, "), "got: {reply}");
}

#[test]
fn test_reply_without_context_is_generic_and_capitalized() {
    let generator = FallbackGenerator::with_seed(2);
    let reply = generator.chat_reply(None);

    assert!(!reply.is_empty());
    assert!(reply.chars().next().unwrap().is_uppercase());
}

#[test]
fn test_blank_name_is_ignored() {
    let generator = FallbackGenerator::with_seed(3);
    let context = ctx(Some("   "), &[]);

    // A blank name means no "name, " prefix: the reply starts like an
    // anonymous one, with the line's first letter capitalized.
    let reply = generator.chat_reply(Some(&context));
    assert!(!reply.starts_with("   ,"), "got: {reply}");
    assert!(reply.chars().next().unwrap().is_uppercase());
}

#[test]
fn test_mood_selects_matching_pool() {
    let generator = FallbackGenerator::with_seed(4);

    // Draw repeatedly; every anxious-mood reply must come from the anxious pool.
    let context = ctx(None, &["calm", "anxious"]);
    for _ in 0..20 {
        let reply = generator.chat_reply(Some(&context));
        let matched = ANXIOUS_LINES
            .iter()
            .any(|line| reply.eq_ignore_ascii_case(&capitalize_first(line)));
        assert!(matched, "reply not from anxious pool: {reply}");
    }
}

#[test]
fn test_unknown_mood_falls_back_to_generic_pool() {
    let generator = FallbackGenerator::with_seed(5);
    let context = ctx(None, &["curious"]);

    let reply = generator.chat_reply(Some(&context));
    let matched = GENERIC_LINES
        .iter()
        .any(|line| reply.eq_ignore_ascii_case(&capitalize_first(line)));
    assert!(matched, "reply not from generic pool: {reply}");
}

#[test]
fn test_selection_covers_multiple_candidates() {
    let generator = FallbackGenerator::with_seed(6);
    let mut seen = std::collections::HashSet::new();

    for _ in 0..100 {
        seen.insert(generator.chat_reply(None));
    }

    // Uniform selection over 4 generic lines should hit more than one in
    // 100 draws.
    assert!(seen.len() > 1);
}

#[test]
fn test_tts_message_is_from_tts_pool() {
    let generator = FallbackGenerator::with_seed(8);
    let message = generator.tts_message();
    assert!(TTS_LINES.contains(&message.as_str()));
}

#[test]
fn test_mood_pool_keyword_mapping() {
    assert_eq!(mood_pool(Some("Anxious")), ANXIOUS_LINES);
    assert_eq!(mood_pool(Some("a bit worried")), ANXIOUS_LINES);
    assert_eq!(mood_pool(Some("sad")), SAD_LINES);
    assert_eq!(mood_pool(Some("stressed out")), STRESSED_LINES);
    assert_eq!(mood_pool(Some("angry")), ANGRY_LINES);
    assert_eq!(mood_pool(Some("lonely")), LONELY_LINES);
    assert_eq!(mood_pool(Some("fine")), GENERIC_LINES);
    assert_eq!(mood_pool(None), GENERIC_LINES);
}
