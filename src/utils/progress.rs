//! Progress reporting for the indexing pass; a no-op when the `progress`
//! feature is disabled or no bar is attached.

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Byte-based progress for one indexing run
#[derive(Clone, Default)]
pub struct IndexProgress {
    #[cfg(feature = "progress")]
    bar: Option<ProgressBar>,
}

impl IndexProgress {
    /// Progress that reports nothing
    pub fn hidden() -> Self {
        Self::default()
    }

    /// A terminal bar; the indexing run sets its length to the bytes it
    /// will actually read
    #[cfg(feature = "progress")]
    pub fn bar() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar.set_message("Indexing...");
        Self { bar: Some(bar) }
    }

    #[cfg(not(feature = "progress"))]
    pub fn bar() -> Self {
        Self::default()
    }

    pub fn set_total(&self, _bytes: u64) {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            bar.set_length(_bytes);
        }
    }

    pub fn advance(&self, _bytes: u64) {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            bar.inc(_bytes);
        }
    }

    pub fn finish(&self, _msg: String) {
        #[cfg(feature = "progress")]
        if let Some(bar) = &self.bar {
            bar.finish_with_message(_msg);
        }
    }

    /// `(position, length)` of the attached bar
    #[cfg(all(test, feature = "progress"))]
    pub(crate) fn counts(&self) -> Option<(u64, Option<u64>)> {
        self.bar.as_ref().map(|bar| (bar.position(), bar.length()))
    }
}
