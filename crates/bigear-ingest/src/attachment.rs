use bigear_core::{Attachment, CandidatePost};

#[must_use]
pub fn has_attachment(candidate: &CandidatePost) -> bool {
    !candidate.attachments.is_empty()
}

/// Index of the first photo attachment, if any.
#[must_use]
pub fn first_photo(candidate: &CandidatePost) -> Option<usize> {
    candidate.attachments.iter().position(Attachment::is_photo)
}
