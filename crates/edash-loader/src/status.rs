//! User-facing status line: idle → loading → success | error
//!
//! Messages are localized (Dutch / English). While a load runs the trigger is
//! disabled; after an error it is enabled again for a retry.

use edash_core::types::Locale;
use edash_core::EdashError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Success(String),
    /// Message may contain HTML (identity mismatch link)
    Error(String),
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    status: LoadStatus,
    locale: Locale,
}

impl StatusLine {
    pub fn new(locale: Locale) -> Self {
        Self {
            status: LoadStatus::Idle,
            locale,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn message(&self) -> Option<String> {
        match &self.status {
            LoadStatus::Idle => None,
            LoadStatus::Loading => Some(loading_message(self.locale).to_string()),
            LoadStatus::Success(msg) | LoadStatus::Error(msg) => Some(msg.clone()),
        }
    }

    /// Whether the load trigger should be enabled.
    pub fn can_retry(&self) -> bool {
        matches!(self.status, LoadStatus::Idle | LoadStatus::Error(_))
    }

    pub fn set_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn set_success(&mut self, diagrams: usize) {
        self.status = LoadStatus::Success(success_message(diagrams, self.locale));
    }

    pub fn set_error(&mut self, err: &EdashError) {
        self.status = LoadStatus::Error(user_message(err, self.locale));
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

fn loading_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Nl => "Gegevens worden geladen…",
        Locale::En => "Loading data…",
    }
}

fn success_message(diagrams: usize, locale: Locale) -> String {
    match (locale, diagrams) {
        (Locale::Nl, 1) => "Gegevens geladen (1 diagram).".into(),
        (Locale::Nl, n) => format!("Gegevens geladen ({n} diagrammen)."),
        (Locale::En, 1) => "Data loaded (1 diagram).".into(),
        (Locale::En, n) => format!("Data loaded ({n} diagrams)."),
    }
}

/// Localized text for a load failure.
pub fn user_message(err: &EdashError, locale: Locale) -> String {
    match (err, locale) {
        (EdashError::Fetch(detail), Locale::Nl) => format!("Kan het bestand niet laden: {detail}"),
        (EdashError::Fetch(detail), Locale::En) => format!("Cannot load file: {detail}"),
        (EdashError::Authentication, Locale::Nl) => {
            "Onjuist wachtwoord. Probeer het opnieuw.".into()
        }
        (EdashError::Authentication, Locale::En) => "Incorrect password. Please try again.".into(),
        (EdashError::Format(detail), Locale::Nl) => {
            format!("Het bestand heeft een ongeldig formaat: {detail}")
        }
        (EdashError::Format(detail), Locale::En) => format!("The file has an invalid format: {detail}"),
        (EdashError::Incomplete(detail), Locale::Nl) => {
            format!("Geen volledig diagram in de gegevens: {detail}")
        }
        (EdashError::Incomplete(detail), Locale::En) => {
            format!("No complete diagram in the data: {detail}")
        }
        // Already bilingual HTML
        (EdashError::IdentityMismatch { detail, .. }, _) => detail.clone(),
        (other, Locale::Nl) => format!("Er is een fout opgetreden: {other}"),
        (other, Locale::En) => format!("An error occurred: {other}"),
    }
}
