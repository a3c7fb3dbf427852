pub mod location_fix;
pub mod raw_fix;
pub mod track_session;
