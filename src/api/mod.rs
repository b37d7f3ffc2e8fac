pub mod events;
pub mod od_request;
pub mod students;
