pub mod assignment;
pub mod delay_report;
pub mod driver;
pub mod geofence;
pub mod location;
pub mod trip;
