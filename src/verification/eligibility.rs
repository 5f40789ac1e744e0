use crate::{
    error::Result,
    storage::{Database, Fingerprint, Offence},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metadata of a freshly uploaded verification image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub image_name: String,
    pub image_size: u64,
}

impl UploadedImage {
    pub fn new(image_name: impl Into<String>, image_size: u64) -> Self {
        Self {
            image_name: image_name.into(),
            image_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    Eligible,
    NoFingerprint,
    ImageMismatch,
    HasOffences,
}

impl Verdict {
    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Eligible => "Verification successful! You are eligible for clearance.",
            Verdict::NoFingerprint => {
                "No fingerprint record found. Please register your fingerprint first."
            }
            Verdict::ImageMismatch => {
                "Image verification failed. Uploaded image doesn't match your fingerprint record."
            }
            Verdict::HasOffences => {
                "Clearance denied. You have pending offences that must be resolved first."
            }
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub image_match: bool,
    pub has_offences: bool,
    pub is_eligible: bool,
    pub verdict: Verdict,
}

/// Compare an uploaded image against the stored fingerprint and check for offences.
///
/// The user is eligible only if the image name and byte size both match the
/// stored record and there are no offences. Without a stored fingerprint the
/// user is never eligible.
pub fn check_eligibility(
    fingerprint: Option<&Fingerprint>,
    offences: &[Offence],
    upload: &UploadedImage,
) -> Eligibility {
    let has_offences = !offences.is_empty();

    let Some(fingerprint) = fingerprint else {
        return Eligibility {
            image_match: false,
            has_offences,
            is_eligible: false,
            verdict: Verdict::NoFingerprint,
        };
    };

    let image_match = fingerprint.image_name.as_deref() == Some(upload.image_name.as_str())
        && fingerprint.image_size == Some(upload.image_size);
    let is_eligible = image_match && !has_offences;

    let verdict = if is_eligible {
        Verdict::Eligible
    } else if !image_match {
        Verdict::ImageMismatch
    } else {
        Verdict::HasOffences
    };

    Eligibility {
        image_match,
        has_offences,
        is_eligible,
        verdict,
    }
}

/// Read access to the records the eligibility check needs
#[cfg_attr(test, mockall::automock)]
pub trait RecordLookup {
    fn fingerprint_for_user(&self, user_id: i64) -> Result<Option<Fingerprint>>;
    fn offences_for_user(&self, user_id: i64) -> Result<Vec<Offence>>;
}

impl RecordLookup for Database {
    fn fingerprint_for_user(&self, user_id: i64) -> Result<Option<Fingerprint>> {
        self.get_fingerprint_by_user(user_id)
    }

    fn offences_for_user(&self, user_id: i64) -> Result<Vec<Offence>> {
        self.get_offences_by_user(user_id)
    }
}

pub struct EligibilityChecker<'a, L: RecordLookup> {
    records: &'a L,
}

impl<'a, L: RecordLookup> EligibilityChecker<'a, L> {
    pub fn new(records: &'a L) -> Self {
        Self { records }
    }

    /// Load the user's fingerprint and offences and run the check
    pub fn check(&self, user_id: i64, upload: &UploadedImage) -> Result<Eligibility> {
        let fingerprint = self.records.fingerprint_for_user(user_id)?;
        let offences = self.records.offences_for_user(user_id)?;

        let eligibility = check_eligibility(fingerprint.as_ref(), &offences, upload);

        debug!(
            "User {} eligibility: match={}, offences={}, eligible={}",
            user_id, eligibility.image_match, offences.len(), eligibility.is_eligible
        );

        Ok(eligibility)
    }
}
