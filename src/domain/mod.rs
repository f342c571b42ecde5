pub mod email;
pub mod seen;
