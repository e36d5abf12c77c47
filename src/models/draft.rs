//! Per-session submission draft.
//!
//! The draft is the not-yet-submitted form state: a county and an ordered
//! list of searches, one of which may be open for editing. It lives in
//! the user's session and is discarded on submit or on explicit clear.

use serde::{Deserialize, Serialize};

use super::ValidationError;
use super::query::{Query, SearchQuery};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDraft {
    pub county: String,
    pub searches: Vec<SearchQuery>,
    /// Index into `searches` of the search open in the edit form.
    pub editing: Option<usize>,
}

impl SubmissionDraft {
    /// Session key the draft is stored under.
    pub const SESSION_KEY: &'static str = "submission_draft";

    pub fn set_county(&mut self, county: &str) {
        self.county = county.trim().to_string();
    }

    /// Appends `search`, or replaces the search being edited and closes
    /// the edit form.
    pub fn add_search(&mut self, search: SearchQuery) -> Result<(), ValidationError> {
        search.validate()?;
        match self.editing.take() {
            Some(index) if index < self.searches.len() => self.searches[index] = search,
            _ => self.searches.push(search),
        }
        Ok(())
    }

    pub fn begin_edit(&mut self, index: usize) -> Result<&SearchQuery, ValidationError> {
        let search = self
            .searches
            .get(index)
            .ok_or(ValidationError::NoSuchSearch(index))?;
        self.editing = Some(index);
        Ok(search)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Removes the search at `index`, keeping `editing` on the same search
    /// (or clearing it when that search is the one removed).
    pub fn remove_search(&mut self, index: usize) -> Result<SearchQuery, ValidationError> {
        if index >= self.searches.len() {
            return Err(ValidationError::NoSuchSearch(index));
        }
        let removed = self.searches.remove(index);
        self.editing = match self.editing {
            Some(editing) if editing == index => None,
            Some(editing) if editing > index => Some(editing - 1),
            other => other,
        };
        Ok(removed)
    }

    #[must_use]
    pub fn editing_search(&self) -> Option<&SearchQuery> {
        self.editing.and_then(|index| self.searches.get(index))
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.county.is_empty() && !self.searches.is_empty()
    }

    /// Builds the pending query this draft describes. The draft itself is
    /// left untouched so a failed submission can be retried.
    pub fn to_query(&self) -> Result<Query, ValidationError> {
        Query::new(self.county.clone(), self.searches.clone())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
