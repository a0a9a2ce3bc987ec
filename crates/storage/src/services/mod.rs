pub mod comments;
pub mod contests;
pub mod photos;
pub mod ranking;
pub mod registration;
pub mod voting;
