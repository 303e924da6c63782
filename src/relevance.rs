//! Keyword relevance filter for headlines.

/// Keywords used when the settings file does not override them.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "футбол", "матч", "гол", "трансфер", "лига", "кубок", "чемпионат",
    "рпл", "апл", "лч", "реал", "бавария", "барселона", "спартак", "зенит",
    "тренер", "состав", "сборная", "турнир", "хоккей", "теннис",
];

/// Case-insensitive substring match against a fixed keyword set.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// True iff any keyword occurs in `text`, ignoring case.
    pub fn is_relevant(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}
