pub mod assignment;
pub mod eligibility;
pub mod geofence;
pub mod matching;
pub mod reminder;
