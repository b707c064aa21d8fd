use rand::Rng;

use super::payload::CallbackPayload;

/// A labeled emoji offered as a captcha choice.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub label: &'static str,
    pub symbol: &'static str,
}

const DEFAULT_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry { label: "Dolphin", symbol: "🐬" },
    CatalogEntry { label: "Robot", symbol: "🤖" },
    CatalogEntry { label: "Sun", symbol: "☀" },
    CatalogEntry { label: "Heart", symbol: "❤" },
    CatalogEntry { label: "Poop", symbol: "💩" },
    CatalogEntry { label: "Brain", symbol: "🧠" },
    CatalogEntry { label: "Ghost", symbol: "👻" },
    CatalogEntry { label: "Pumpkin", symbol: "🎃" },
    CatalogEntry { label: "Panda", symbol: "🐼" },
];

/// Fixed catalog of labeled emoji used for challenges.
#[derive(Debug, Clone)]
pub struct EmojiCatalog {
    // Invariant: never empty (only constructed from DEFAULT_ENTRIES).
    entries: &'static [CatalogEntry],
}

impl Default for EmojiCatalog {
    fn default() -> Self {
        Self { entries: DEFAULT_ENTRIES }
    }
}

impl EmojiCatalog {
    pub fn entries(&self) -> &[CatalogEntry] {
        self.entries
    }

    /// Uniformly random target for a fresh challenge.
    fn pick_target(&self) -> &CatalogEntry {
        let idx = rand::thread_rng().gen_range(0..self.entries.len());
        &self.entries[idx]
    }
}

/// A one-shot captcha: the label to ask for plus the full keyboard of
/// choices, each carrying an encoded response payload.
///
/// A fresh random target is chosen every time a challenge is issued,
/// including reissues after a failed attempt.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub target_label: String,
    pub target_symbol: String,
    pub user_id: i64,
    pub username: String,
    pub choices: Vec<ChallengeChoice>,
}

#[derive(Debug, Clone)]
pub struct ChallengeChoice {
    pub symbol: String,
    pub callback_data: String,
}

impl Challenge {
    pub fn issue(catalog: &EmojiCatalog, user_id: i64, username: &str) -> Self {
        let target = catalog.pick_target();

        let choices = catalog
            .entries()
            .iter()
            .map(|entry| ChallengeChoice {
                symbol: entry.symbol.to_string(),
                callback_data: CallbackPayload {
                    correct: target.symbol.to_string(),
                    chosen: entry.symbol.to_string(),
                    user_id,
                    username: username.to_string(),
                }
                .encode(),
            })
            .collect();

        Self {
            target_label: target.label.to_string(),
            target_symbol: target.symbol.to_string(),
            user_id,
            username: username.to_string(),
            choices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_nine_entries() {
        assert_eq!(EmojiCatalog::default().entries().len(), 9);
    }

    #[test]
    fn challenge_presents_full_catalog() {
        let catalog = EmojiCatalog::default();
        let challenge = Challenge::issue(&catalog, 42, "alice");

        assert_eq!(challenge.choices.len(), catalog.entries().len());
        for (choice, entry) in challenge.choices.iter().zip(catalog.entries()) {
            assert_eq!(choice.symbol, entry.symbol);
        }
    }

    #[test]
    fn target_comes_from_catalog() {
        let catalog = EmojiCatalog::default();
        let challenge = Challenge::issue(&catalog, 42, "alice");

        assert!(catalog
            .entries()
            .iter()
            .any(|e| e.label == challenge.target_label && e.symbol == challenge.target_symbol));
    }

    #[test]
    fn exactly_one_choice_is_correct() {
        let challenge = Challenge::issue(&EmojiCatalog::default(), 42, "alice");

        let correct = challenge
            .choices
            .iter()
            .map(|c| CallbackPayload::decode(&c.callback_data).unwrap())
            .filter(|p| p.is_correct())
            .count();
        assert_eq!(correct, 1);
    }

    #[test]
    fn choices_carry_identity_and_username() {
        let challenge = Challenge::issue(&EmojiCatalog::default(), 42, "a_b");

        for choice in &challenge.choices {
            let payload = CallbackPayload::decode(&choice.callback_data).unwrap();
            assert_eq!(payload.user_id, 42);
            assert_eq!(payload.username, "a_b");
            assert_eq!(payload.correct, challenge.target_symbol);
            assert_eq!(payload.chosen, choice.symbol);
        }
    }
}
