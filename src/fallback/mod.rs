//! Supportive canned responses for exhausted or failed upstream calls.
//!
//! Product rule: a user in a mental-health context never sees a raw error.
//! Whenever the provider is unreachable, rate limited past the retry bound,
//! or misconfigured, the gateway substitutes a plausible supportive message
//! and returns it as a normal success with a `fallback: true` marker.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chat::UserContext;

/// Mood-keyed candidate pools. Lines read naturally after an optional
/// leading name ("Asha, it sounds like...").
const ANXIOUS_LINES: &[&str] = &[
    "it sounds like a lot is weighing on you right now. Let's slow things down together: breathe in for four counts, hold for four, and out for six.",
    "anxiety can feel overwhelming, but this moment will pass. Try naming five things you can see around you right now; grounding helps more than it seems.",
    "when worry spirals, it can help to write the thought down and ask yourself how likely it really is. Would you like to try that together?",
];

const SAD_LINES: &[&str] = &[
    "I'm sorry things feel heavy today. You don't have to carry it alone, and it's okay to take things one small step at a time.",
    "sadness deserves room too. Be gentle with yourself today; maybe a short walk or a warm drink could offer a small moment of comfort.",
    "thank you for sharing how you feel. Even naming sadness takes courage, and reaching out like this is a real step.",
];

const STRESSED_LINES: &[&str] = &[
    "it sounds like the pressure has been building. Could you set down just one thing for the next hour? Small pauses genuinely help.",
    "stress piles up quietly. A two-minute stretch or a few slow breaths can give your mind room to reset before the next task.",
    "when everything feels urgent, almost nothing truly is. Pick the single most important thing and let the rest wait a little.",
];

const ANGRY_LINES: &[&str] = &[
    "anger usually points at something that matters to you. Before acting on it, try a slow breath and ask what it's protecting.",
    "it's okay to feel frustrated. Stepping away for a few minutes, even just to get water, can take the edge off before you respond.",
];

const LONELY_LINES: &[&str] = &[
    "feeling disconnected is hard. Is there one person, even someone you haven't spoken to in a while, you could send a short message to today?",
    "loneliness is painful, and it doesn't mean anything is wrong with you. Small connections count, even a brief chat or a shared walk.",
];

const GENERIC_LINES: &[&str] = &[
    "I'm here with you. Whatever you're carrying right now, you don't have to sort it out all at once.",
    "thank you for checking in. Taking a moment for yourself like this matters more than it might feel.",
    "whatever today has looked like, be kind to yourself about it. Small steps are still steps.",
    "I'm having a little trouble gathering my thoughts, but I'm still here. How are you feeling in your body right now?",
];

const TTS_LINES: &[&str] = &[
    "My voice is resting for a moment, but my words are still here for you.",
    "I couldn't speak that aloud just now; please read it at your own pace instead.",
];

/// Picks supportive canned responses, personalized from request context.
///
/// Selection is uniform among the applicable pool; the RNG is seedable so
/// tests are deterministic. Cloning shares the RNG.
#[derive(Clone)]
pub struct FallbackGenerator {
    rng: Arc<Mutex<StdRng>>,
}

impl FallbackGenerator {
    /// Creates a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Creates a deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Synthesizes a chat reply from whatever context is available: the
    /// user's display name and most recent mood label when present,
    /// otherwise a generic supportive message.
    pub fn chat_reply(&self, ctx: Option<&UserContext>) -> String {
        let mood = ctx.and_then(|c| c.latest_mood());
        let pool = mood_pool(mood);
        let line = self.pick(pool);

        match ctx
            .and_then(|c| c.user_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            Some(name) => format!("{name}, {line}"),
            None => capitalize_first(line),
        }
    }

    /// Short supportive text substituted when TTS synthesis fails.
    pub fn tts_message(&self) -> String {
        self.pick(TTS_LINES).to_string()
    }

    fn pick<'a>(&self, pool: &[&'a str]) -> &'a str {
        let index = self.rng.lock().random_range(0..pool.len());
        pool[index]
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FallbackGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackGenerator").finish()
    }
}

/// Maps a mood label onto a candidate pool by keyword.
fn mood_pool(mood: Option<&str>) -> &'static [&'static str] {
    let Some(mood) = mood else {
        return GENERIC_LINES;
    };
    let mood = mood.to_lowercase();

    if mood.contains("anxi") || mood.contains("worri") || mood.contains("nervous") {
        ANXIOUS_LINES
    } else if mood.contains("sad") || mood.contains("down") || mood.contains("depress") {
        SAD_LINES
    } else if mood.contains("stress") || mood.contains("overwhelm") || mood.contains("burn") {
        STRESSED_LINES
    } else if mood.contains("ang") || mood.contains("frustrat") || mood.contains("irrit") {
        ANGRY_LINES
    } else if mood.contains("lone") || mood.contains("isolat") || mood.contains("alone") {
        LONELY_LINES
    } else {
        GENERIC_LINES
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
