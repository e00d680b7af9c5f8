pub mod check;
pub mod dispatch;
pub mod extract_users;
pub mod generate;
pub mod sample;
