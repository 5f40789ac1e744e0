pub mod eligibility;

pub use eligibility::{
    check_eligibility, Eligibility, EligibilityChecker, RecordLookup, UploadedImage, Verdict,
};
