pub mod meetings;
pub mod tasks;
