/// Shortest elapsed time used as a WPM denominator (one millisecond).
pub const MIN_ELAPSED_SECS: f64 = 0.001;

/// Characters that make up one "word" in WPM math.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Clamp an elapsed duration so it can safely divide.
pub fn guard_elapsed(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > MIN_ELAPSED_SECS {
        seconds
    } else {
        MIN_ELAPSED_SECS
    }
}

/// Words per minute: (units / 5) / minutes
pub fn wpm(correct_units: usize, seconds: f64) -> f64 {
    let minutes = guard_elapsed(seconds) / 60.0;
    (correct_units as f64 / CHARS_PER_WORD) / minutes
}

/// Final accuracy for text sessions, derived from the coarse error count
pub fn error_accuracy(error_count: u32, reference_len: usize) -> f64 {
    let penalty = error_count as f64 / reference_len.max(1) as f64 * 100.0;
    (100.0 - penalty).clamp(0.0, 100.0)
}

/// Live accuracy: share of typed positions that match the reference
pub fn positional_accuracy(typed: &str, reference: &str) -> f64 {
    let typed_len = typed.chars().count();
    let correct = typed
        .chars()
        .zip(reference.chars())
        .filter(|(t, r)| t == r)
        .count();
    (correct as f64 / typed_len.max(1) as f64 * 100.0).clamp(0.0, 100.0)
}

/// Keystroke accuracy for the word game. No keystrokes counts as perfect.
pub fn keystroke_accuracy(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (correct as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Points for a completed game word, longer words are worth more
pub fn points_for_word(word: &str) -> u32 {
    (word.chars().count() as u32 / 3).max(1)
}
